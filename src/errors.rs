use crate::Address;

/// An error returned by a [`Broker`][crate::Broker] when a registry query
/// could not be answered, e.g. because the ledger was unreachable.
#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct BrokerError(Box<dyn std::error::Error + Send + Sync>);

impl BrokerError {
    pub fn new(err: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> BrokerError {
        BrokerError(err.into())
    }
}

/// The reasons a ticket or signature can be rejected.
///
/// None of these are fatal. Callers decide whether to discard the ticket,
/// penalize the counterparty, or disconnect.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The signer could not be recovered from the signature.
    #[error("malformed signature: {0}")]
    MalformedSignature(#[source] secp256k1::Error),

    #[error("broker query failed: {0}")]
    BrokerQuery(#[from] BrokerError),

    #[error("invalid ticket recipient {actual}, expected {expected}")]
    WrongRecipient { expected: Address, actual: Address },

    #[error("invalid ticket sender")]
    InvalidSender,

    #[error("invalid preimage provided for hash commitment recipient_rand_hash")]
    InvalidPreimage,

    #[error("ticket has already been used")]
    TicketAlreadyUsed,

    #[error("invalid sender signature over ticket hash")]
    InvalidSignature,
}

impl From<secp256k1::Error> for Error {
    fn from(e: secp256k1::Error) -> Self {
        Error::MalformedSignature(e)
    }
}
