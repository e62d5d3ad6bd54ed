use secp256k1::PublicKey;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::{consts::ADDRESS_SIZE, hashlock::keccak256};

/// A 20-byte account identifier derived from a secp256k1 public key.
///
/// Ticket senders, recipients, and delegate signers are all identified by
/// their address. Equality is byte-exact.
#[derive(Debug, Clone, Copy, Default, Ord, PartialOrd, Hash, Eq, PartialEq)]
pub struct Address([u8; ADDRESS_SIZE]);

impl Address {
    /// The all-zero address, which never identifies a valid ticket sender.
    pub const ZERO: Address = Address([0; ADDRESS_SIZE]);

    pub const fn new(bytes: [u8; ADDRESS_SIZE]) -> Address {
        Address(bytes)
    }

    /// Derive the address controlled by a public key: the last 20 bytes of the
    /// Keccak-256 hash of the uncompressed point, without its `0x04` tag byte.
    pub fn from_pubkey(pubkey: &PublicKey) -> Address {
        let uncompressed = pubkey.serialize_uncompressed();
        let hash = keccak256(&uncompressed[1..]);
        let mut bytes = [0u8; ADDRESS_SIZE];
        bytes.copy_from_slice(&hash[32 - ADDRESS_SIZE..]);
        Address(bytes)
    }

    pub fn is_zero(&self) -> bool {
        *self == Address::ZERO
    }

    pub const fn as_bytes(&self) -> &[u8; ADDRESS_SIZE] {
        &self.0
    }
}

impl From<[u8; ADDRESS_SIZE]> for Address {
    fn from(bytes: [u8; ADDRESS_SIZE]) -> Address {
        Address(bytes)
    }
}

impl From<&PublicKey> for Address {
    fn from(pubkey: &PublicKey) -> Address {
        Address::from_pubkey(pubkey)
    }
}

impl AsRef<[u8]> for Address {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl std::fmt::Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl std::str::FromStr for Address {
    type Err = hex::FromHexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut bytes = [0u8; ADDRESS_SIZE];
        hex::decode_to_slice(s.strip_prefix("0x").unwrap_or(s), &mut bytes)?;
        Ok(Address(bytes))
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, ser: S) -> Result<S::Ok, S::Error> {
        serdect::array::serialize_hex_lower_or_bin(&self.0, ser)
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Address, D::Error> {
        let mut bytes = [0u8; ADDRESS_SIZE];
        serdect::array::deserialize_hex_or_bin(&mut bytes, deserializer)?;
        Ok(Address(bytes))
    }
}
