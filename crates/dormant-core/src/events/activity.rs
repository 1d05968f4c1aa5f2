//! Activity events reported by the host application.

use serde::{Deserialize, Serialize};

use crate::types::AccountId;

/// Kind of change operation performed by an account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    /// New commits or revisions were pushed.
    Push,
    /// A new revision was uploaded for review.
    Upload,
    /// A review comment or vote was added.
    Review,
    /// A vote or reviewer was removed.
    ReviewRemoved,
    /// A change was submitted or merged.
    Submit,
    /// A change was abandoned.
    Abandon,
    /// An abandoned change was restored.
    Restore,
    /// Change metadata (topic, hashtags, assignee) was edited.
    Edit,
}

/// An observation of account activity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ActivityEvent {
    /// An account logged in.
    Login {
        /// The account that logged in.
        account_id: AccountId,
    },
    /// An auditable action, possibly anonymous.
    Audit {
        /// The acting account, if identified.
        account_id: Option<AccountId>,
        /// The audited action name.
        action: String,
    },
    /// An HTTP request, possibly anonymous.
    HttpRequest {
        /// The requesting account, if identified.
        account_id: Option<AccountId>,
        /// Request path.
        path: String,
    },
    /// A change operation.
    Change {
        /// The acting account.
        account_id: AccountId,
        /// What kind of change.
        kind: ChangeKind,
    },
    /// A per-account record was rewritten.
    RecordUpdated {
        /// The account that performed the update.
        account_id: AccountId,
        /// The account whose record was updated, if the record is per-account.
        record_owner: Option<AccountId>,
    },
}

impl ActivityEvent {
    /// The account responsible for the event, if any.
    pub fn actor(&self) -> Option<AccountId> {
        match self {
            Self::Login { account_id }
            | Self::Change { account_id, .. }
            | Self::RecordUpdated { account_id, .. } => Some(*account_id),
            Self::Audit { account_id, .. } | Self::HttpRequest { account_id, .. } => *account_id,
        }
    }

    /// Short event name for logging.
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::Login { .. } => "login",
            Self::Audit { .. } => "audit",
            Self::HttpRequest { .. } => "http_request",
            Self::Change { .. } => "change",
            Self::RecordUpdated { .. } => "record_updated",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_actor_of_anonymous_audit_is_none() {
        let event = ActivityEvent::Audit {
            account_id: None,
            action: "GET /config".to_string(),
        };
        assert_eq!(event.actor(), None);
    }

    #[test]
    fn test_actor_of_change() {
        let id = AccountId::new();
        let event = ActivityEvent::Change {
            account_id: id,
            kind: ChangeKind::Review,
        };
        assert_eq!(event.actor(), Some(id));
        assert_eq!(event.event_type(), "change");
    }

    #[test]
    fn test_serde_tagging() {
        let id = AccountId::new();
        let json = serde_json::to_value(ActivityEvent::Login { account_id: id }).unwrap();
        assert_eq!(json["type"], "login");
        assert_eq!(json["account_id"], id.to_string());
    }
}
