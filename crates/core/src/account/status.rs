//! Account status states and administrative transitions.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Account status.
///
/// Transfers require both parties to be `Active`. `Frozen` accounts can
/// be restored by an administrator; `Closed` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AccountStatus {
    /// Account can send and receive transfers.
    Active,
    /// Account is administratively frozen; no transfers in or out.
    Frozen,
    /// Account is closed permanently; no transfers, no reopening.
    Closed,
}

/// Errors for administrative status transitions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LifecycleError {
    /// Freeze requested but the account is already frozen.
    #[error("account is already frozen")]
    AlreadyFrozen,

    /// Unfreeze requested but the account is not frozen.
    #[error("account is not frozen (current status: {0})")]
    NotFrozen(AccountStatus),

    /// The account is closed; no status transition is possible.
    #[error("account is closed")]
    Closed,
}

impl AccountStatus {
    /// Returns true if the account may participate in transfers.
    #[must_use]
    pub const fn is_transactable(self) -> bool {
        matches!(self, Self::Active)
    }

    /// Administrative freeze transition.
    ///
    /// # Errors
    ///
    /// Returns `AlreadyFrozen` if the account is frozen, `Closed` if the
    /// account is closed (terminal).
    pub const fn freeze(self) -> Result<Self, LifecycleError> {
        match self {
            Self::Active => Ok(Self::Frozen),
            Self::Frozen => Err(LifecycleError::AlreadyFrozen),
            Self::Closed => Err(LifecycleError::Closed),
        }
    }

    /// Administrative unfreeze transition.
    ///
    /// # Errors
    ///
    /// Returns `NotFrozen` unless the account is currently frozen.
    pub const fn unfreeze(self) -> Result<Self, LifecycleError> {
        match self {
            Self::Frozen => Ok(Self::Active),
            Self::Active => Err(LifecycleError::NotFrozen(Self::Active)),
            Self::Closed => Err(LifecycleError::Closed),
        }
    }
}

impl std::fmt::Display for AccountStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Active => write!(f, "ACTIVE"),
            Self::Frozen => write!(f, "FROZEN"),
            Self::Closed => write!(f, "CLOSED"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_active_is_transactable() {
        assert!(AccountStatus::Active.is_transactable());
        assert!(!AccountStatus::Frozen.is_transactable());
        assert!(!AccountStatus::Closed.is_transactable());
    }

    #[test]
    fn test_freeze_active() {
        assert_eq!(AccountStatus::Active.freeze(), Ok(AccountStatus::Frozen));
    }

    #[test]
    fn test_freeze_frozen_rejected() {
        assert_eq!(
            AccountStatus::Frozen.freeze(),
            Err(LifecycleError::AlreadyFrozen)
        );
    }

    #[test]
    fn test_unfreeze_frozen() {
        assert_eq!(AccountStatus::Frozen.unfreeze(), Ok(AccountStatus::Active));
    }

    #[test]
    fn test_unfreeze_active_rejected() {
        assert_eq!(
            AccountStatus::Active.unfreeze(),
            Err(LifecycleError::NotFrozen(AccountStatus::Active))
        );
    }

    #[test]
    fn test_closed_is_terminal() {
        assert_eq!(AccountStatus::Closed.freeze(), Err(LifecycleError::Closed));
        assert_eq!(
            AccountStatus::Closed.unfreeze(),
            Err(LifecycleError::Closed)
        );
    }

    #[test]
    fn test_freeze_unfreeze_round_trip() {
        let frozen = AccountStatus::Active.freeze().unwrap();
        let restored = frozen.unfreeze().unwrap();
        assert_eq!(restored, AccountStatus::Active);
    }

    #[test]
    fn test_display() {
        assert_eq!(AccountStatus::Active.to_string(), "ACTIVE");
        assert_eq!(AccountStatus::Frozen.to_string(), "FROZEN");
        assert_eq!(AccountStatus::Closed.to_string(), "CLOSED");
    }
}
