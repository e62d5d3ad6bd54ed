use secp256k1::{
    ecdsa::{RecoverableSignature, RecoveryId},
    Message, SecretKey, SECP256K1,
};

use crate::{
    consts::{PERSONAL_MESSAGE_PREFIX, SIGNATURE_SIZE},
    errors::Error,
    hashlock::keccak256_concat,
    Address, Broker,
};

/// A recoverable ECDSA signature, serialized as `r || s || v`.
pub type Signature = [u8; SIGNATURE_SIZE];

/// Describes an object capable of checking that a signature over a message
/// was produced by a given address.
pub trait SigVerifier {
    /// Returns `Ok(true)` if `sig` is a signature over `msg` by `addr`, or by
    /// some signer authorized to act on behalf of `addr`.
    ///
    /// Returns an error if no signer can be recovered from `sig`.
    fn verify(&self, addr: &Address, sig: &[u8], msg: &[u8; 32]) -> Result<bool, Error>;
}

impl<V: SigVerifier + ?Sized> SigVerifier for &V {
    fn verify(&self, addr: &Address, sig: &[u8], msg: &[u8; 32]) -> Result<bool, Error> {
        (**self).verify(addr, sig, msg)
    }
}

/// Hash a 32-byte message with the personal-message prefix:
///
/// ```not_rust
/// keccak256("\x19Ethereum Signed Message:\n" || "32" || msg)
/// ```
pub fn personal_hash(msg: &[u8; 32]) -> [u8; 32] {
    let len = msg.len().to_string();
    keccak256_concat([PERSONAL_MESSAGE_PREFIX, len.as_bytes(), msg.as_slice()])
}

/// Recover the address which produced `sig` over the personal hash of `msg`.
pub fn recover_signer(sig: &[u8], msg: &[u8; 32]) -> Result<Address, Error> {
    if sig.len() != SIGNATURE_SIZE {
        return Err(Error::MalformedSignature(secp256k1::Error::InvalidSignature));
    }

    // Only one byte encoding of each signature is accepted: `v` must be a raw
    // recovery id and `s` must be in the lower half of the curve order. The
    // winning test hashes the signature bytes, so any alternate encoding would
    // give the recipient another draw on the same ticket.
    let recovery_id = RecoveryId::from_i32(i32::from(sig[SIGNATURE_SIZE - 1]))?;
    let signature = RecoverableSignature::from_compact(&sig[..SIGNATURE_SIZE - 1], recovery_id)?;

    let standard = signature.to_standard();
    let mut normalized = standard;
    normalized.normalize_s();
    if normalized != standard {
        return Err(Error::MalformedSignature(secp256k1::Error::InvalidSignature));
    }

    let message = Message::from_digest(personal_hash(msg));
    let pubkey = SECP256K1.recover_ecdsa(&message, &signature)?;
    Ok(Address::from_pubkey(&pubkey))
}

/// Sign the personal hash of `msg`. The recovery byte of the output is `0` or `1`.
pub fn sign_personal(seckey: &SecretKey, msg: &[u8; 32]) -> Signature {
    let message = Message::from_digest(personal_hash(msg));
    let (recovery_id, compact) = SECP256K1
        .sign_ecdsa_recoverable(&message, seckey)
        .serialize_compact();

    let mut sig = [0u8; SIGNATURE_SIZE];
    sig[..SIGNATURE_SIZE - 1].copy_from_slice(&compact);
    sig[SIGNATURE_SIZE - 1] = recovery_id.to_i32() as u8;
    sig
}

/// A [`SigVerifier`] which accepts signatures from the claimed address itself,
/// or from any signer the [`Broker`] has approved for that address.
#[derive(Debug, Clone)]
pub struct BrokerSigVerifier<B> {
    broker: B,
}

impl<B: Broker> BrokerSigVerifier<B> {
    pub fn new(broker: B) -> Self {
        BrokerSigVerifier { broker }
    }
}

impl<B: Broker> SigVerifier for BrokerSigVerifier<B> {
    fn verify(&self, addr: &Address, sig: &[u8], msg: &[u8; 32]) -> Result<bool, Error> {
        let recovered = recover_signer(sig, msg)?;
        if recovered == *addr {
            return Ok(true);
        }

        let approved = self.broker.is_approved_signer(addr, &recovered)?;
        tracing::debug!(
            owner = %addr,
            signer = %recovered,
            approved,
            "checked delegate signer"
        );
        Ok(approved)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::{errors::BrokerError, hashlock::keccak256, Ticket};

    use secp256k1::PublicKey;
    use std::cell::Cell;

    /// Reports a fixed approval answer and counts queries.
    struct StubBroker {
        approved: bool,
        queries: Cell<usize>,
    }

    impl StubBroker {
        fn new(approved: bool) -> Self {
            StubBroker {
                approved,
                queries: Cell::new(0),
            }
        }
    }

    impl Broker for StubBroker {
        fn is_approved_signer(&self, _: &Address, _: &Address) -> Result<bool, BrokerError> {
            self.queries.set(self.queries.get() + 1);
            Ok(self.approved)
        }

        fn is_used_ticket(&self, _: &Ticket) -> Result<bool, BrokerError> {
            Ok(false)
        }
    }

    struct FailingBroker;

    impl Broker for FailingBroker {
        fn is_approved_signer(&self, _: &Address, _: &Address) -> Result<bool, BrokerError> {
            Err(BrokerError::new("ledger unreachable"))
        }

        fn is_used_ticket(&self, _: &Ticket) -> Result<bool, BrokerError> {
            Err(BrokerError::new("ledger unreachable"))
        }
    }

    /// Replace `s` with `n - s` and flip the recovery parity. The result recovers
    /// the same public key as `sig`.
    pub(crate) fn negate_s(sig: &Signature) -> Signature {
        const CURVE_ORDER: [u8; 32] = [
            0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF,
            0xFF, 0xFE, 0xBA, 0xAE, 0xDC, 0xE6, 0xAF, 0x48, 0xA0, 0x3B, 0xBF, 0xD2, 0x5E, 0x8C,
            0xD0, 0x36, 0x41, 0x41,
        ];

        let mut out = *sig;
        let mut borrow = 0i16;
        for i in (0..32).rev() {
            let mut diff = i16::from(CURVE_ORDER[i]) - i16::from(sig[32 + i]) - borrow;
            borrow = 0;
            if diff < 0 {
                diff += 256;
                borrow = 1;
            }
            out[32 + i] = diff as u8;
        }
        out[64] ^= 1;
        out
    }

    fn keypair(byte: u8) -> (SecretKey, Address) {
        let seckey = SecretKey::from_slice(&[byte; 32]).unwrap();
        let addr = Address::from_pubkey(&PublicKey::from_secret_key(SECP256K1, &seckey));
        (seckey, addr)
    }

    #[test]
    fn personal_hash_prefix() {
        let msg = [0xAB; 32];
        let mut payload = Vec::new();
        payload.extend_from_slice(b"\x19Ethereum Signed Message:\n32");
        payload.extend_from_slice(&msg);
        assert_eq!(personal_hash(&msg), keccak256(&payload));
        assert_ne!(personal_hash(&msg), keccak256(&msg));
    }

    #[test]
    fn recover_direct_signer() {
        let (seckey, addr) = keypair(0x11);
        let msg = keccak256(b"ticket");
        let sig = sign_personal(&seckey, &msg);
        assert!(sig[64] <= 1);
        assert_eq!(recover_signer(&sig, &msg).unwrap(), addr);

        // Recovery bytes offset by 27 are not accepted.
        let mut legacy = sig;
        legacy[64] += 27;
        assert!(matches!(
            recover_signer(&legacy, &msg),
            Err(Error::MalformedSignature(_))
        ));

        // A different message recovers some other address.
        let other = keccak256(b"other");
        assert_ne!(recover_signer(&sig, &other).unwrap(), addr);
    }

    #[test]
    fn recover_malformed_signatures() {
        let (seckey, _) = keypair(0x11);
        let msg = keccak256(b"ticket");
        let sig = sign_personal(&seckey, &msg);

        assert!(matches!(
            recover_signer(&sig[..64], &msg),
            Err(Error::MalformedSignature(_))
        ));

        let mut bad_v = sig;
        bad_v[64] = 4;
        assert!(matches!(
            recover_signer(&bad_v, &msg),
            Err(Error::MalformedSignature(_))
        ));

        // r = 0 is never a valid signature component.
        let mut zero_r = sig;
        zero_r[..32].fill(0);
        assert!(matches!(
            recover_signer(&zero_r, &msg),
            Err(Error::MalformedSignature(_))
        ));
    }

    #[test]
    fn recover_rejects_high_s() {
        let (seckey, addr) = keypair(0x11);
        let msg = keccak256(b"ticket");
        let sig = sign_personal(&seckey, &msg);

        let high_s = negate_s(&sig);
        assert_ne!(high_s, sig);
        assert!(matches!(
            recover_signer(&high_s, &msg),
            Err(Error::MalformedSignature(_))
        ));
        assert_eq!(recover_signer(&sig, &msg).unwrap(), addr);
    }

    #[test]
    fn verify_direct_signer_skips_broker() {
        let (seckey, addr) = keypair(0x11);
        let msg = keccak256(b"ticket");
        let sig = sign_personal(&seckey, &msg);

        let broker = StubBroker::new(false);
        let verifier = BrokerSigVerifier::new(&broker);
        assert!(verifier.verify(&addr, &sig, &msg).unwrap());
        assert_eq!(broker.queries.get(), 0);
    }

    #[test]
    fn verify_delegate_signer() {
        let (_, owner) = keypair(0x11);
        let (delegate_key, _) = keypair(0x22);
        let msg = keccak256(b"ticket");
        let sig = sign_personal(&delegate_key, &msg);

        let approving = StubBroker::new(true);
        assert!(BrokerSigVerifier::new(&approving)
            .verify(&owner, &sig, &msg)
            .unwrap());
        assert_eq!(approving.queries.get(), 1);

        let refusing = StubBroker::new(false);
        assert!(!BrokerSigVerifier::new(&refusing)
            .verify(&owner, &sig, &msg)
            .unwrap());
        assert_eq!(refusing.queries.get(), 1);
    }

    #[test]
    fn verify_propagates_broker_failure() {
        let (_, owner) = keypair(0x11);
        let (delegate_key, delegate) = keypair(0x22);
        let msg = keccak256(b"ticket");
        let sig = sign_personal(&delegate_key, &msg);

        let verifier = BrokerSigVerifier::new(FailingBroker);
        assert!(matches!(
            verifier.verify(&owner, &sig, &msg),
            Err(Error::BrokerQuery(_))
        ));

        // A direct match never reaches the broker.
        assert!(verifier.verify(&delegate, &sig, &msg).unwrap());
    }
}
