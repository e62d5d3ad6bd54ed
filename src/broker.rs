use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::sync::{Arc, Mutex, RwLock};

use crate::{
    errors::{BrokerError, Error},
    Address, Ticket,
};

/// The registry of approved delegate signers and already-redeemed tickets.
///
/// Validation only ever reads from a broker. Marking a ticket as used happens
/// outside of validation, when the ticket is redeemed. Implementations MUST
/// make the redemption-time check-and-mark of a ticket atomic across concurrent
/// callers, otherwise two redemptions of the same ticket could both observe it
/// as unused and both succeed.
pub trait Broker {
    /// Returns true if `candidate` is authorized to sign tickets on behalf of `owner`.
    fn is_approved_signer(&self, owner: &Address, candidate: &Address)
        -> Result<bool, BrokerError>;

    /// Returns true if the ticket has already been redeemed.
    fn is_used_ticket(&self, ticket: &Ticket) -> Result<bool, BrokerError>;
}

impl<B: Broker + ?Sized> Broker for &B {
    fn is_approved_signer(
        &self,
        owner: &Address,
        candidate: &Address,
    ) -> Result<bool, BrokerError> {
        (**self).is_approved_signer(owner, candidate)
    }

    fn is_used_ticket(&self, ticket: &Ticket) -> Result<bool, BrokerError> {
        (**self).is_used_ticket(ticket)
    }
}

impl<B: Broker + ?Sized> Broker for Arc<B> {
    fn is_approved_signer(
        &self,
        owner: &Address,
        candidate: &Address,
    ) -> Result<bool, BrokerError> {
        (**self).is_approved_signer(owner, candidate)
    }

    fn is_used_ticket(&self, ticket: &Ticket) -> Result<bool, BrokerError> {
        (**self).is_used_ticket(ticket)
    }
}

impl<B: Broker + ?Sized> Broker for Box<B> {
    fn is_approved_signer(
        &self,
        owner: &Address,
        candidate: &Address,
    ) -> Result<bool, BrokerError> {
        (**self).is_approved_signer(owner, candidate)
    }

    fn is_used_ticket(&self, ticket: &Ticket) -> Result<bool, BrokerError> {
        (**self).is_used_ticket(ticket)
    }
}

/// An in-memory [`Broker`] for local deployments and tests.
///
/// Used tickets are identified by [`Ticket::hash`].
#[derive(Debug, Default)]
pub struct LocalBroker {
    approved_signers: RwLock<BTreeMap<Address, BTreeSet<Address>>>,
    used_tickets: Mutex<HashSet<[u8; 32]>>,
}

impl LocalBroker {
    pub fn new() -> LocalBroker {
        LocalBroker::default()
    }

    /// Authorize `signer` to sign tickets on behalf of `owner`.
    pub fn approve_signer(&self, owner: Address, signer: Address) {
        let mut approved = self
            .approved_signers
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        approved.entry(owner).or_default().insert(signer);
    }

    /// Remove a previously approved signer. Returns false if it was not approved.
    pub fn revoke_signer(&self, owner: &Address, signer: &Address) -> bool {
        let mut approved = self
            .approved_signers
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let Some(signers) = approved.get_mut(owner) else {
            return false;
        };
        let removed = signers.remove(signer);
        if signers.is_empty() {
            approved.remove(owner);
        }
        removed
    }

    /// Mark a ticket as used, failing with [`Error::TicketAlreadyUsed`] if it
    /// was already redeemed. The check and the mark happen under one lock, so
    /// of several concurrent redemptions of the same ticket exactly one succeeds.
    pub fn redeem_ticket(&self, ticket: &Ticket) -> Result<(), Error> {
        let mut used = self
            .used_tickets
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        if !used.insert(ticket.hash()) {
            return Err(Error::TicketAlreadyUsed);
        }
        tracing::debug!(sender = %ticket.sender, nonce = ticket.sender_nonce, "ticket redeemed");
        Ok(())
    }
}

impl Broker for LocalBroker {
    fn is_approved_signer(
        &self,
        owner: &Address,
        candidate: &Address,
    ) -> Result<bool, BrokerError> {
        let approved = self
            .approved_signers
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        Ok(approved
            .get(owner)
            .is_some_and(|signers| signers.contains(candidate)))
    }

    fn is_used_ticket(&self, ticket: &Ticket) -> Result<bool, BrokerError> {
        let used = self
            .used_tickets
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        Ok(used.contains(&ticket.hash()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::U256;

    use std::thread;

    fn ticket(nonce: u64) -> Ticket {
        Ticket {
            recipient: Address::new([1; 20]),
            sender: Address::new([2; 20]),
            face_value: U256::from(100u64),
            win_prob: U256::MAX,
            sender_nonce: nonce,
            recipient_rand_hash: [0; 32],
        }
    }

    #[test]
    fn signer_approval_lifecycle() {
        let broker = LocalBroker::new();
        let owner = Address::new([1; 20]);
        let delegate = Address::new([2; 20]);

        assert!(!broker.is_approved_signer(&owner, &delegate).unwrap());

        broker.approve_signer(owner, delegate);
        assert!(broker.is_approved_signer(&owner, &delegate).unwrap());
        // Approval is directional.
        assert!(!broker.is_approved_signer(&delegate, &owner).unwrap());

        assert!(broker.revoke_signer(&owner, &delegate));
        assert!(!broker.revoke_signer(&owner, &delegate));
        assert!(!broker.is_approved_signer(&owner, &delegate).unwrap());
    }

    #[test]
    fn redeem_marks_ticket_used() {
        let broker = LocalBroker::new();
        assert!(!broker.is_used_ticket(&ticket(1)).unwrap());

        broker.redeem_ticket(&ticket(1)).unwrap();
        assert!(broker.is_used_ticket(&ticket(1)).unwrap());
        assert!(!broker.is_used_ticket(&ticket(2)).unwrap());

        assert!(matches!(
            broker.redeem_ticket(&ticket(1)),
            Err(Error::TicketAlreadyUsed)
        ));
    }

    #[test]
    fn concurrent_redemption_succeeds_once() {
        let broker = Arc::new(LocalBroker::new());
        let t = ticket(5);

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let broker = Arc::clone(&broker);
                let t = t.clone();
                thread::spawn(move || broker.redeem_ticket(&t).is_ok())
            })
            .collect();

        let successes = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|&ok| ok)
            .count();
        assert_eq!(successes, 1);
    }

    #[test]
    fn forwarding_impls() {
        let broker = Arc::new(LocalBroker::new());
        broker.redeem_ticket(&ticket(1)).unwrap();

        let by_ref: &LocalBroker = &broker;
        let boxed: Box<dyn Broker> = Box::new(Arc::clone(&broker));
        assert!(by_ref.is_used_ticket(&ticket(1)).unwrap());
        assert!(boxed.is_used_ticket(&ticket(1)).unwrap());
        assert!(Broker::is_used_ticket(&broker, &ticket(1)).unwrap());
    }
}
