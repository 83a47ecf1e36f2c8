use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use crate::schemas::{Expense, Group, Member, Settlement};
use crate::store::{LedgerStore, StoreError};

/// In-memory ledger store for tests and local development.
///
/// Group entries are only touched under the write lock, which gives the
/// same per-group atomicity the document store provides.
#[derive(Debug, Default)]
pub struct MemoryLedgerStore {
    groups: RwLock<HashMap<String, Group>>,
}

impl MemoryLedgerStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn poisoned() -> StoreError {
        StoreError::Backend("lock poisoned".to_string())
    }
}

#[async_trait]
impl LedgerStore for MemoryLedgerStore {
    async fn create_group(&self, group: Group) -> Result<bool, StoreError> {
        let mut groups = self.groups.write().map_err(|_| Self::poisoned())?;
        if groups.contains_key(&group.id) {
            return Ok(false);
        }
        groups.insert(group.id.clone(), group);
        Ok(true)
    }

    async fn load_group(&self, group_id: &str) -> Result<Group, StoreError> {
        let groups = self.groups.read().map_err(|_| Self::poisoned())?;
        groups
            .get(group_id)
            .cloned()
            .ok_or(StoreError::GroupNotFound)
    }

    async fn add_member(&self, group_id: &str, member: Member) -> Result<bool, StoreError> {
        let mut groups = self.groups.write().map_err(|_| Self::poisoned())?;
        let group = groups.get_mut(group_id).ok_or(StoreError::GroupNotFound)?;
        if group.is_member(&member.id) {
            return Ok(false);
        }
        group.members.push(member);
        Ok(true)
    }

    async fn append_expense(&self, group_id: &str, expense: Expense) -> Result<(), StoreError> {
        let mut groups = self.groups.write().map_err(|_| Self::poisoned())?;
        let group = groups.get_mut(group_id).ok_or(StoreError::GroupNotFound)?;
        group.expenses.push(expense);
        group.ledger_version += 1;
        Ok(())
    }

    async fn remove_expense(&self, group_id: &str, expense_id: &str) -> Result<bool, StoreError> {
        let mut groups = self.groups.write().map_err(|_| Self::poisoned())?;
        let group = groups.get_mut(group_id).ok_or(StoreError::GroupNotFound)?;
        let before = group.expenses.len();
        group.expenses.retain(|expense| expense.id != expense_id);
        if group.expenses.len() == before {
            return Ok(false);
        }
        group.ledger_version += 1;
        Ok(true)
    }

    async fn append_settlement(
        &self,
        group_id: &str,
        settlement: Settlement,
    ) -> Result<(), StoreError> {
        let mut groups = self.groups.write().map_err(|_| Self::poisoned())?;
        let group = groups.get_mut(group_id).ok_or(StoreError::GroupNotFound)?;
        group.settlements.push(settlement);
        group.ledger_version += 1;
        Ok(())
    }

    async fn groups_for_user(&self, user_id: &str) -> Result<Vec<Group>, StoreError> {
        let groups = self.groups.read().map_err(|_| Self::poisoned())?;
        Ok(groups
            .values()
            .filter(|group| group.is_member(user_id))
            .cloned()
            .collect())
    }
}
