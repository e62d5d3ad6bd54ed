/// The serialized length of an [`Address`][crate::Address].
pub const ADDRESS_SIZE: usize = 20;

/// The serialized length of a 256-bit unsigned integer or digest.
pub const UINT256_SIZE: usize = 32;

/// The serialized length of a recoverable ECDSA signature: `r || s || v`.
pub const SIGNATURE_SIZE: usize = 65;

/// Prepended to every message before it is hashed for signing or recovery.
/// The decimal length of the message follows the prefix.
pub const PERSONAL_MESSAGE_PREFIX: &[u8] = b"\x19Ethereum Signed Message:\n";

/// The length of [`Ticket::flatten`][crate::Ticket::flatten] output.
pub(crate) const FLAT_TICKET_SIZE: usize = 2 * ADDRESS_SIZE + 4 * UINT256_SIZE;
