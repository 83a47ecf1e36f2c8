use async_trait::async_trait;
use thiserror::Error;

use crate::schemas::{Expense, Group, Member, Settlement};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("group not found")]
    GroupNotFound,

    #[error("store backend failure: {0}")]
    Backend(String),
}

/// Durable home of groups and their ledgers.
///
/// `load_group` must return one consistent snapshot of a group's ledger,
/// and every write must be a single atomic operation that also bumps the
/// group's `ledger_version`. Both implementations get this from the
/// one-document-per-group layout: a read is one lookup, a write is one
/// document update, so a reader can never observe half of an entry's
/// effects.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Create the group unless a group with this id already exists.
    /// Returns whether it was created.
    async fn create_group(&self, group: Group) -> Result<bool, StoreError>;

    /// One consistent snapshot of the group and its full ledger.
    async fn load_group(&self, group_id: &str) -> Result<Group, StoreError>;

    /// Add a member unless already present. Returns whether it was added.
    async fn add_member(&self, group_id: &str, member: Member) -> Result<bool, StoreError>;

    async fn append_expense(&self, group_id: &str, expense: Expense) -> Result<(), StoreError>;

    /// Remove an expense by id. Returns whether anything was removed.
    async fn remove_expense(&self, group_id: &str, expense_id: &str) -> Result<bool, StoreError>;

    async fn append_settlement(
        &self,
        group_id: &str,
        settlement: Settlement,
    ) -> Result<(), StoreError>;

    /// Every group the user is a member of.
    async fn groups_for_user(&self, user_id: &str) -> Result<Vec<Group>, StoreError>;
}
