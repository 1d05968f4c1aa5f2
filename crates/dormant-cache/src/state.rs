//! Active/dormant status transitions.

use tracing::info;

use dormant_core::config::DormantSettings;
use dormant_core::result::AppResult;
use dormant_core::types::AccountId;
use dormant_storage::DurableRecordStore;

/// What a status check decided for one account.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// The account is active but was not believed active.
    Activate,
    /// The account is no longer active but was believed active.
    Deactivate,
    /// Belief and state agree.
    Hold,
}

/// Maps active/dormant decisions onto the account status field.
#[derive(Debug, Clone)]
pub struct StatusStateMachine {
    dormant_status: String,
    default_status: String,
}

impl StatusStateMachine {
    /// Build from resolved settings.
    pub fn new(settings: &DormantSettings) -> Self {
        Self {
            dormant_status: settings.dormant_status.clone(),
            default_status: settings.default_status.clone(),
        }
    }

    /// Decide the transition from the current activity and whether the
    /// account is in the active set.
    pub fn decide(is_active: bool, in_active_set: bool) -> Transition {
        match (is_active, in_active_set) {
            (true, false) => Transition::Activate,
            (false, true) => Transition::Deactivate,
            _ => Transition::Hold,
        }
    }

    /// Whether `status` is the dormant status.
    pub fn is_dormant_status(&self, status: Option<&str>) -> bool {
        status == Some(self.dormant_status.as_str())
    }

    /// Write the status a transition requires, if any. Returns whether a
    /// durable write happened.
    pub async fn apply(
        &self,
        store: &DurableRecordStore,
        id: AccountId,
        transition: Transition,
    ) -> AppResult<bool> {
        match transition {
            Transition::Hold => Ok(false),
            Transition::Activate => {
                let status = store.read_status(id).await?;
                if !self.is_dormant_status(status.as_deref()) {
                    return Ok(false);
                }
                store.write_status(id, &self.default_status).await?;
                info!(account_id = %id, "Account is active again");
                Ok(true)
            }
            Transition::Deactivate => {
                let status = store.read_status(id).await?;
                if self.is_dormant_status(status.as_deref()) {
                    return Ok(false);
                }
                store.write_status(id, &self.dormant_status).await?;
                info!(account_id = %id, "Account became dormant");
                Ok(true)
            }
        }
    }
}
