use secp256k1::SecretKey;
use serde::{Deserialize, Serialize};

use crate::{
    consts::{ADDRESS_SIZE, FLAT_TICKET_SIZE, UINT256_SIZE},
    hashlock::keccak256,
    serialization,
    sigverifier::{sign_personal, Signature},
    Address, U256,
};

/// The terms a recipient offers to a sender before any tickets are issued.
///
/// The recipient keeps the preimage of `recipient_rand_hash` secret until it
/// redeems a winning ticket. Senders build every ticket for this recipient
/// from these parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketParams {
    /// The address which receives payment if a ticket wins.
    pub recipient: Address,

    /// The value paid out by a winning ticket.
    pub face_value: U256,

    /// A ticket wins with probability `win_prob / 2^256`.
    pub win_prob: U256,

    /// The commitment to the recipient's secret.
    #[serde(with = "serialization::byte_array")]
    pub recipient_rand_hash: [u8; 32],
}

/// A probabilistic payment from `sender` to `recipient`.
///
/// The expected value of a ticket is `face_value * win_prob / 2^256`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Ticket {
    pub recipient: Address,
    pub sender: Address,
    pub face_value: U256,
    pub win_prob: U256,

    /// Distinguishes tickets issued under the same recipient secret.
    pub sender_nonce: u64,

    #[serde(with = "serialization::byte_array")]
    pub recipient_rand_hash: [u8; 32],
}

impl Ticket {
    pub fn new(params: &TicketParams, sender: Address, sender_nonce: u64) -> Ticket {
        Ticket {
            recipient: params.recipient,
            sender,
            face_value: params.face_value,
            win_prob: params.win_prob,
            sender_nonce,
            recipient_rand_hash: params.recipient_rand_hash,
        }
    }

    /// Encode the ticket's fields into the fixed-width byte layout which is hashed:
    ///
    /// ```not_rust
    /// recipient (20) || sender (20) || face_value (32) || win_prob (32)
    ///   || sender_nonce (32) || recipient_rand_hash (32)
    /// ```
    ///
    /// All integers are big-endian and left-padded with zeros.
    pub fn flatten(&self) -> [u8; FLAT_TICKET_SIZE] {
        let mut buf = [0u8; FLAT_TICKET_SIZE];
        let mut i = 0;

        let mut put = |bytes: &[u8]| {
            buf[i..i + bytes.len()].copy_from_slice(bytes);
            i += bytes.len();
        };

        put(self.recipient.as_bytes());
        put(self.sender.as_bytes());
        put(&self.face_value.to_be_bytes());
        put(&self.win_prob.to_be_bytes());
        put(&U256::from(self.sender_nonce).to_be_bytes());
        put(&self.recipient_rand_hash);

        debug_assert_eq!(i, 2 * ADDRESS_SIZE + 4 * UINT256_SIZE);
        buf
    }

    /// The deterministic content digest of the ticket. This is the message
    /// which senders sign.
    pub fn hash(&self) -> [u8; 32] {
        keccak256(&self.flatten())
    }

    /// Sign the ticket hash with the given key. The key must belong to the
    /// sender, or to a delegate signer the broker has approved for the sender.
    pub fn sign(&self, seckey: &SecretKey) -> Signature {
        sign_personal(seckey, &self.hash())
    }
}
