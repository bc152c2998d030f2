//! Opaque account identifier.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A token holder.
///
/// Typically an address string such as `0xf39F...`, but the ledger attaches no
/// meaning to it beyond equality and hashing.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(String);

impl AccountId {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Return the raw identifier string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for AccountId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for AccountId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn equality_is_exact_string_equality() {
        let a = AccountId::new("0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266");
        let b = AccountId::from("0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266");
        let c = AccountId::from("0x70997970C51812dc3A010C7d01b50e0d17dc79C8".to_string());
        assert_eq!(a, b);
        assert_ne!(a, c);

        let set: HashSet<_> = [a.clone(), b, c].into_iter().collect();
        assert_eq!(set.len(), 2);
        assert!(set.contains(&a));
    }

    #[test]
    fn serializes_as_plain_string() {
        let id = AccountId::new("0xabc");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"0xabc\"");
        let back: AccountId = serde_json::from_str("\"0xabc\"").unwrap();
        assert_eq!(back, id);
        assert_eq!(id.to_string(), "0xabc");
        assert_eq!(id.as_str(), "0xabc");
    }
}
