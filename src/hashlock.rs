//! This module contains the hash function used throughout the ticket protocol,
//! along with utilities for constructing recipient secrets and their commitments.

use sha3::Digest as _;

use crate::{consts::UINT256_SIZE, U256};

/// Compute the Keccak-256 hash of some input data.
pub fn keccak256(input: &[u8]) -> [u8; 32] {
    sha3::Keccak256::new().chain_update(input).finalize().into()
}

/// Compute the Keccak-256 hash of the concatenation of several byte slices.
pub fn keccak256_concat<'a>(inputs: impl IntoIterator<Item = &'a [u8]>) -> [u8; 32] {
    inputs
        .into_iter()
        .fold(sha3::Keccak256::new(), |hasher, input| hasher.chain_update(input))
        .finalize()
        .into()
}

/// A secret chosen by a ticket recipient. Senders only ever see its hash,
/// the `recipient_rand_hash` embedded in each ticket. The recipient reveals
/// it when redeeming a winning ticket.
pub type RecipientRand = U256;

/// Generate a random [`RecipientRand`] from a secure RNG.
pub fn recipient_rand_random<R: rand::RngCore + rand::CryptoRng>(rng: &mut R) -> RecipientRand {
    let mut bytes = [0u8; UINT256_SIZE];
    rng.fill_bytes(&mut bytes);
    U256::from_be_bytes(bytes)
}

/// Parse a [`RecipientRand`] from a big-endian hex string of up to 32 bytes.
pub fn recipient_rand_from_hex(s: &str) -> Result<RecipientRand, hex::FromHexError> {
    s.parse()
}

/// Compute the commitment to a recipient secret which is placed in tickets.
///
/// The secret is always left-padded to 32 bytes before hashing.
pub fn recipient_rand_hash(recipient_rand: &RecipientRand) -> [u8; 32] {
    keccak256(&recipient_rand.to_be_bytes())
}
