//! Validation of probabilistic micropayment tickets.
//!
//! A payer (the _sender_) pays a payee (the _recipient_) with tickets which
//! only redeem for their face value with a small probability, so that many
//! cheap off-chain ticket exchanges amortize a few on-chain settlements.
//!
//! 1. The recipient picks a secret [`RecipientRand`] and hands the sender
//!    [`TicketParams`] containing its hash.
//! 2. The sender builds [`Ticket`]s from those parameters and signs each
//!    [`Ticket::hash`] with its own key, or with a delegate key approved
//!    by the [`Broker`].
//! 3. The recipient checks each ticket with [`Validator::is_valid_ticket`]
//!    and then [`Validator::is_winning_ticket`]. Winning tickets are redeemed
//!    through the broker, which reveals the recipient's secret.
//!
//! Since the sender never learns the recipient's secret before signing, and
//! the recipient committed to that secret before the ticket was signed,
//! neither party can predict or grind the outcome of a ticket.

pub(crate) mod consts;
pub(crate) mod errors;
pub(crate) mod serialization;

mod address;
mod broker;
mod sigverifier;
mod ticket;
mod uint;
mod validator;

pub mod hashlock;

pub use hex;
pub use secp256k1;

pub use address::Address;
pub use broker::{Broker, LocalBroker};
pub use consts::{ADDRESS_SIZE, PERSONAL_MESSAGE_PREFIX, SIGNATURE_SIZE, UINT256_SIZE};
pub use errors::{BrokerError, Error};
pub use hashlock::RecipientRand;
pub use sigverifier::{
    personal_hash, recover_signer, sign_personal, BrokerSigVerifier, SigVerifier, Signature,
};
pub use ticket::{Ticket, TicketParams};
pub use uint::U256;
pub use validator::{is_winning_digest, is_winning_ticket, BrokerValidator, Validator};
