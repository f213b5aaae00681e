//! Account repository for account database operations.
//!
//! This repository is the only writer of `Account.status`; the
//! freeze/unfreeze transitions are validated by the core lifecycle rules
//! before anything is written.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, Set,
};
use uuid::Uuid;

use tally_core::account::{AccountStatus, LifecycleError};

use crate::entities::accounts;

/// Error types for account operations.
#[derive(Debug, thiserror::Error)]
pub enum AccountError {
    /// Account not found.
    #[error("Account not found: {0}")]
    NotFound(Uuid),

    /// Freeze requested but the account is already frozen.
    #[error("Account {0} is already frozen")]
    AlreadyFrozen(Uuid),

    /// Unfreeze requested but the account is not frozen.
    #[error("Account {0} is not frozen (current status: {1})")]
    NotFrozen(Uuid, AccountStatus),

    /// The account is closed; its status is terminal.
    #[error("Account {0} is closed")]
    Closed(Uuid),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl AccountError {
    fn from_lifecycle(account_id: Uuid, err: LifecycleError) -> Self {
        match err {
            LifecycleError::AlreadyFrozen => Self::AlreadyFrozen(account_id),
            LifecycleError::NotFrozen(status) => Self::NotFrozen(account_id, status),
            LifecycleError::Closed => Self::Closed(account_id),
        }
    }
}

/// Account repository for CRUD and lifecycle operations.
#[derive(Debug, Clone)]
pub struct AccountRepository {
    db: DatabaseConnection,
}

impl AccountRepository {
    /// Creates a new account repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Opens a new active account for a user.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub async fn create(
        &self,
        user_id: Uuid,
        currency: String,
    ) -> Result<accounts::Model, AccountError> {
        let now = Utc::now().into();

        let account = accounts::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(user_id),
            currency: Set(currency),
            status: Set(AccountStatus::Active.into()),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let created = account.insert(&self.db).await?;
        Ok(created)
    }

    /// Finds an account by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_id(
        &self,
        account_id: Uuid,
    ) -> Result<Option<accounts::Model>, AccountError> {
        let account = accounts::Entity::find_by_id(account_id)
            .one(&self.db)
            .await?;
        Ok(account)
    }

    /// Lists all accounts owned by a user.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<accounts::Model>, AccountError> {
        let accounts = accounts::Entity::find()
            .filter(accounts::Column::UserId.eq(user_id))
            .all(&self.db)
            .await?;
        Ok(accounts)
    }

    /// Returns the IDs of all accounts owned by a user.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn ids_for_user(&self, user_id: Uuid) -> Result<Vec<Uuid>, AccountError> {
        let accounts = self.list_for_user(user_id).await?;
        Ok(accounts.into_iter().map(|a| a.id).collect())
    }

    /// Administratively freezes an account.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the account does not exist, `AlreadyFrozen`
    /// if it is frozen, or `Closed` if its status is terminal.
    pub async fn freeze(&self, account_id: Uuid) -> Result<accounts::Model, AccountError> {
        self.transition(account_id, AccountStatus::freeze).await
    }

    /// Administratively unfreezes an account.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the account does not exist or `NotFrozen`
    /// unless it is currently frozen.
    pub async fn unfreeze(&self, account_id: Uuid) -> Result<accounts::Model, AccountError> {
        self.transition(account_id, AccountStatus::unfreeze).await
    }

    /// Applies a core lifecycle transition as a guarded single-row update.
    async fn transition<F>(
        &self,
        account_id: Uuid,
        transition: F,
    ) -> Result<accounts::Model, AccountError>
    where
        F: Fn(AccountStatus) -> Result<AccountStatus, LifecycleError>,
    {
        let account = accounts::Entity::find_by_id(account_id)
            .one(&self.db)
            .await?
            .ok_or(AccountError::NotFound(account_id))?;

        let current: AccountStatus = account.status.clone().into();
        let next =
            transition(current).map_err(|e| AccountError::from_lifecycle(account_id, e))?;

        let mut active: accounts::ActiveModel = account.into();
        active.status = Set(next.into());
        active.updated_at = Set(Utc::now().into());

        let updated = active.update(&self.db).await?;
        Ok(updated)
    }
}
