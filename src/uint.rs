use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::consts::UINT256_SIZE;

/// A 256-bit unsigned integer, stored as 32 big-endian bytes.
///
/// Because the storage is big-endian and fixed-width, the derived lexicographic
/// ordering of the bytes is exactly the numeric ordering of the integers.
#[derive(Debug, Clone, Copy, Default, Ord, PartialOrd, Hash, Eq, PartialEq)]
pub struct U256([u8; UINT256_SIZE]);

impl U256 {
    /// The integer zero.
    pub const ZERO: U256 = U256([0; UINT256_SIZE]);

    /// The largest representable integer, `2^256 - 1`.
    pub const MAX: U256 = U256([0xFF; UINT256_SIZE]);

    pub const fn from_be_bytes(bytes: [u8; UINT256_SIZE]) -> U256 {
        U256(bytes)
    }

    pub const fn to_be_bytes(&self) -> [u8; UINT256_SIZE] {
        self.0
    }

    /// Parse a big-endian byte slice of arbitrary length, left-padding it with zeros.
    ///
    /// Returns `None` if the value does not fit into 256 bits. Leading zero
    /// bytes beyond the 32nd are permitted.
    pub fn from_be_slice(bytes: &[u8]) -> Option<U256> {
        let first_nonzero = bytes.iter().position(|&b| b != 0).unwrap_or(bytes.len());
        let significant = &bytes[first_nonzero..];
        if significant.len() > UINT256_SIZE {
            return None;
        }
        let mut out = [0u8; UINT256_SIZE];
        out[UINT256_SIZE - significant.len()..].copy_from_slice(significant);
        Some(U256(out))
    }

    /// Returns `2^exp`, or `None` if `exp >= 256`.
    pub fn pow2(exp: u32) -> Option<U256> {
        if exp >= 256 {
            return None;
        }
        let mut out = [0u8; UINT256_SIZE];
        out[UINT256_SIZE - 1 - (exp / 8) as usize] = 1 << (exp % 8);
        Some(U256(out))
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0; UINT256_SIZE]
    }
}

impl From<u64> for U256 {
    fn from(n: u64) -> U256 {
        let mut out = [0u8; UINT256_SIZE];
        out[UINT256_SIZE - 8..].copy_from_slice(&n.to_be_bytes());
        U256(out)
    }
}

impl From<u128> for U256 {
    fn from(n: u128) -> U256 {
        let mut out = [0u8; UINT256_SIZE];
        out[UINT256_SIZE - 16..].copy_from_slice(&n.to_be_bytes());
        U256(out)
    }
}

impl From<[u8; UINT256_SIZE]> for U256 {
    fn from(bytes: [u8; UINT256_SIZE]) -> U256 {
        U256(bytes)
    }
}

impl From<U256> for [u8; UINT256_SIZE] {
    fn from(n: U256) -> [u8; UINT256_SIZE] {
        n.0
    }
}

impl AsRef<[u8]> for U256 {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// Formats as 64 lowercase hex digits.
impl std::fmt::Display for U256 {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

/// Parses a big-endian hex string of up to 64 digits, with or without a `0x` prefix.
impl std::str::FromStr for U256 {
    type Err = hex::FromHexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s.strip_prefix("0x").unwrap_or(s);
        if digits.len() > 2 * UINT256_SIZE {
            return Err(hex::FromHexError::InvalidStringLength);
        }

        let bytes = if digits.len() % 2 == 1 {
            hex::decode(format!("0{}", digits))?
        } else {
            hex::decode(digits)?
        };

        U256::from_be_slice(&bytes).ok_or(hex::FromHexError::InvalidStringLength)
    }
}

impl Serialize for U256 {
    fn serialize<S: Serializer>(&self, ser: S) -> Result<S::Ok, S::Error> {
        serdect::array::serialize_hex_lower_or_bin(&self.0, ser)
    }
}

impl<'de> Deserialize<'de> for U256 {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<U256, D::Error> {
        let mut bytes = [0u8; UINT256_SIZE];
        serdect::array::deserialize_hex_or_bin(&mut bytes, deserializer)?;
        Ok(U256(bytes))
    }
}
