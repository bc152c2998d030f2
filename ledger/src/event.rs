//! Events emitted by committed ledger transitions.

use buidl_types::{AccountId, TokenAmount};
use serde::Serialize;

/// A committed change that observers can subscribe to via the [`EventBus`].
///
/// Rejected operations emit nothing.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum LedgerEvent {
    /// Value moved. `from` is `None` for a mint, `to` is `None` for a burn.
    Transfer {
        from: Option<AccountId>,
        to: Option<AccountId>,
        amount: TokenAmount,
    },
    /// An allowance was set, or reduced by a delegated transfer.
    /// `amount` is the allowance now in force.
    Approval {
        owner: AccountId,
        spender: AccountId,
        amount: TokenAmount,
    },
}

pub type EventListener = Box<dyn Fn(&LedgerEvent) + Send + Sync>;

/// Fans out the events of each committed ledger operation.
///
/// An operation publishes all of its events as one batch after commit, so a
/// delegated transfer's `Transfer` and `Approval` reach every listener
/// back to back and in order. Listeners run inline while the ledger is held;
/// they must not call back into the ledger.
#[derive(Default)]
pub struct EventBus {
    listeners: Vec<EventListener>,
    published: u64,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, listener: EventListener) {
        self.listeners.push(listener);
    }

    /// Deliver one committed operation's events to every listener.
    pub fn publish(&mut self, batch: &[LedgerEvent]) {
        for event in batch {
            for listener in &self.listeners {
                listener(event);
            }
        }
        self.published += batch.len() as u64;
    }

    /// Events published since the ledger was created, whether or not
    /// anyone was listening.
    pub fn published(&self) -> u64 {
        self.published
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    fn mint_event() -> LedgerEvent {
        LedgerEvent::Transfer {
            from: None,
            to: Some(AccountId::new("0xowner")),
            amount: TokenAmount::new(10),
        }
    }

    fn approval_event() -> LedgerEvent {
        LedgerEvent::Approval {
            owner: AccountId::new("0xowner"),
            spender: AccountId::new("0xspender"),
            amount: TokenAmount::new(4),
        }
    }

    #[test]
    fn batch_reaches_each_listener_in_order() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut bus = EventBus::new();
        for id in ["a", "b"] {
            let seen = Arc::clone(&seen);
            bus.subscribe(Box::new(move |event| {
                seen.lock().unwrap().push((id, event.clone()));
            }));
        }

        bus.publish(&[mint_event(), approval_event()]);

        assert_eq!(
            *seen.lock().unwrap(),
            vec![
                ("a", mint_event()),
                ("b", mint_event()),
                ("a", approval_event()),
                ("b", approval_event()),
            ]
        );
        assert_eq!(bus.published(), 2);
        assert_eq!(bus.listener_count(), 2);
    }

    #[test]
    fn publishing_without_listeners_still_counts() {
        let mut bus = EventBus::default();
        bus.publish(&[mint_event()]);
        bus.publish(&[]);
        assert_eq!(bus.published(), 1);
    }

    #[test]
    fn events_serialize_with_snake_case_tag() {
        let value = serde_json::to_value(LedgerEvent::Approval {
            owner: AccountId::new("0xo"),
            spender: AccountId::new("0xs"),
            amount: TokenAmount::new(7),
        })
        .unwrap();
        assert_eq!(
            value,
            serde_json::json!({"event": "approval", "owner": "0xo", "spender": "0xs", "amount": 7})
        );

        let value = serde_json::to_value(mint_event()).unwrap();
        assert_eq!(value["event"], "transfer");
        assert!(value["from"].is_null());
    }
}
