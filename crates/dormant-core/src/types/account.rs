//! Account view exposed by the account directory.

use serde::{Deserialize, Serialize};

use super::id::AccountId;

/// An account as seen through the host's account directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Account identity.
    pub id: AccountId,
    /// Display name.
    #[serde(default)]
    pub full_name: String,
    /// Free-text status field; `None` when never set.
    #[serde(default)]
    pub status: Option<String>,
}

impl Account {
    /// Create an account with no status.
    pub fn new(id: AccountId, full_name: impl Into<String>) -> Self {
        Self {
            id,
            full_name: full_name.into(),
            status: None,
        }
    }

    /// Builder-style status setter.
    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }

    /// The status if it is set and non-empty.
    pub fn visible_status(&self) -> Option<&str> {
        self.status.as_deref().filter(|s| !s.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_visible_status_hides_empty() {
        let id = AccountId::new();
        assert_eq!(Account::new(id, "Ada").visible_status(), None);
        assert_eq!(Account::new(id, "Ada").with_status("").visible_status(), None);
        assert_eq!(
            Account::new(id, "Ada").with_status("dormant").visible_status(),
            Some("dormant")
        );
    }
}
