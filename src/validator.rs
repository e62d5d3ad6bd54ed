use tracing::{debug, trace};

use crate::{
    errors::Error,
    hashlock::{keccak256_concat, recipient_rand_hash, RecipientRand},
    Address, Broker, SigVerifier, Ticket, U256,
};

/// Describes an object capable of validating tickets.
pub trait Validator {
    /// Checks if a ticket is valid for redemption by this validator's address.
    fn is_valid_ticket(
        &self,
        ticket: &Ticket,
        sig: &[u8],
        recipient_rand: &RecipientRand,
    ) -> Result<(), Error>;

    /// Checks if a ticket won.
    ///
    /// This does not check whether the ticket is valid, which is done using
    /// [`is_valid_ticket`][Validator::is_valid_ticket].
    fn is_winning_ticket(&self, ticket: &Ticket, sig: &[u8], recipient_rand: &RecipientRand)
        -> bool;
}

/// A [`Validator`] which consults a [`Broker`] for the set of already used
/// tickets, and a [`SigVerifier`] for sender signatures.
///
/// Holds no mutable state, so one instance may serve any number of threads
/// provided its collaborators are `Sync`.
#[derive(Debug, Clone)]
pub struct BrokerValidator<B, V> {
    addr: Address,
    broker: B,
    sig_verifier: V,
}

impl<B: Broker, V: SigVerifier> BrokerValidator<B, V> {
    pub fn new(addr: Address, broker: B, sig_verifier: V) -> Self {
        BrokerValidator {
            addr,
            broker,
            sig_verifier,
        }
    }

    /// Every check except the signature, cheapest first.
    fn check_ticket_fields(
        &self,
        ticket: &Ticket,
        recipient_rand: &RecipientRand,
    ) -> Result<(), Error> {
        if ticket.recipient != self.addr {
            debug!(recipient = %ticket.recipient, "rejecting ticket for another recipient");
            return Err(Error::WrongRecipient {
                expected: self.addr,
                actual: ticket.recipient,
            });
        }

        if ticket.sender.is_zero() {
            debug!("rejecting ticket with zero sender");
            return Err(Error::InvalidSender);
        }

        if recipient_rand_hash(recipient_rand) != ticket.recipient_rand_hash {
            debug!(sender = %ticket.sender, "rejecting ticket with invalid recipient_rand preimage");
            return Err(Error::InvalidPreimage);
        }

        if self.broker.is_used_ticket(ticket)? {
            debug!(
                sender = %ticket.sender,
                nonce = ticket.sender_nonce,
                "rejecting replayed ticket"
            );
            return Err(Error::TicketAlreadyUsed);
        }

        Ok(())
    }
}

impl<B: Broker, V: SigVerifier> Validator for BrokerValidator<B, V> {
    fn is_valid_ticket(
        &self,
        ticket: &Ticket,
        sig: &[u8],
        recipient_rand: &RecipientRand,
    ) -> Result<(), Error> {
        self.check_ticket_fields(ticket, recipient_rand)?;

        if !self.sig_verifier.verify(&ticket.sender, sig, &ticket.hash())? {
            debug!(sender = %ticket.sender, "rejecting ticket with invalid signature");
            return Err(Error::InvalidSignature);
        }

        trace!(sender = %ticket.sender, nonce = ticket.sender_nonce, "ticket is valid");
        Ok(())
    }

    /// A ticket wins if `keccak256(sig || recipient_rand) < ticket.win_prob`,
    /// with `recipient_rand` left-padded to 32 bytes.
    fn is_winning_ticket(
        &self,
        ticket: &Ticket,
        sig: &[u8],
        recipient_rand: &RecipientRand,
    ) -> bool {
        let won = is_winning_ticket(ticket, sig, recipient_rand);
        trace!(sender = %ticket.sender, nonce = ticket.sender_nonce, won, "checked ticket");
        won
    }
}

/// The stateless winning test behind [`Validator::is_winning_ticket`].
pub fn is_winning_ticket(ticket: &Ticket, sig: &[u8], recipient_rand: &RecipientRand) -> bool {
    let digest = keccak256_concat([sig, recipient_rand.to_be_bytes().as_slice()]);
    is_winning_digest(&U256::from_be_bytes(digest), &ticket.win_prob)
}

/// Strict unsigned comparison of a ticket digest against its win threshold.
pub fn is_winning_digest(digest: &U256, win_prob: &U256) -> bool {
    digest < win_prob
}
