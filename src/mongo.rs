use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{bson::doc, options::UpdateOptions, Client, Collection};

use crate::schemas::{Expense, Group, Member, Settlement};
use crate::store::{LedgerStore, StoreError};

const DATABASE: &str = "SplitLedger";
const GROUPS: &str = "Groups";

/// MongoDB-backed ledger store.
///
/// Each group is one document, so `find_one` is a consistent snapshot and
/// each `$push`/`$pull` paired with the `$inc` on `ledgerVersion` is a
/// single atomic update.
#[derive(Clone)]
pub struct MongoLedgerStore {
    groups: Collection<Group>,
}

impl MongoLedgerStore {
    pub fn new(client: &Client) -> Self {
        Self {
            groups: client.database(DATABASE).collection(GROUPS),
        }
    }
}

fn backend(err: impl ToString) -> StoreError {
    StoreError::Backend(err.to_string())
}

#[async_trait]
impl LedgerStore for MongoLedgerStore {
    async fn create_group(&self, group: Group) -> Result<bool, StoreError> {
        // Upsert with $setOnInsert so two concurrent creates cannot end up
        // with two documents for the same id.
        let document = bson::to_bson(&group).map_err(backend)?;
        let result = self
            .groups
            .update_one(
                doc! { "id": &group.id },
                doc! { "$setOnInsert": document },
                UpdateOptions::builder().upsert(true).build(),
            )
            .await
            .map_err(backend)?;
        Ok(result.matched_count == 0)
    }

    async fn load_group(&self, group_id: &str) -> Result<Group, StoreError> {
        self.groups
            .find_one(doc! { "id": group_id }, None)
            .await
            .map_err(backend)?
            .ok_or(StoreError::GroupNotFound)
    }

    async fn add_member(&self, group_id: &str, member: Member) -> Result<bool, StoreError> {
        let document = bson::to_bson(&member).map_err(backend)?;
        let result = self
            .groups
            .update_one(
                doc! { "id": group_id, "members.id": { "$ne": &member.id } },
                doc! { "$push": { "members": document } },
                None,
            )
            .await
            .map_err(backend)?;
        Ok(result.modified_count > 0)
    }

    async fn append_expense(&self, group_id: &str, expense: Expense) -> Result<(), StoreError> {
        let document = bson::to_bson(&expense).map_err(backend)?;
        let result = self
            .groups
            .update_one(
                doc! { "id": group_id },
                doc! {
                    "$push": { "expenses": document },
                    "$inc": { "ledgerVersion": 1 },
                },
                None,
            )
            .await
            .map_err(backend)?;
        if result.matched_count == 0 {
            return Err(StoreError::GroupNotFound);
        }
        Ok(())
    }

    async fn remove_expense(&self, group_id: &str, expense_id: &str) -> Result<bool, StoreError> {
        // The filter requires the expense to still be present so the
        // version is only bumped when something is actually removed.
        let result = self
            .groups
            .update_one(
                doc! { "id": group_id, "expenses.id": expense_id },
                doc! {
                    "$pull": { "expenses": { "id": expense_id } },
                    "$inc": { "ledgerVersion": 1 },
                },
                None,
            )
            .await
            .map_err(backend)?;
        Ok(result.modified_count > 0)
    }

    async fn append_settlement(
        &self,
        group_id: &str,
        settlement: Settlement,
    ) -> Result<(), StoreError> {
        let document = bson::to_bson(&settlement).map_err(backend)?;
        let result = self
            .groups
            .update_one(
                doc! { "id": group_id },
                doc! {
                    "$push": { "settlements": document },
                    "$inc": { "ledgerVersion": 1 },
                },
                None,
            )
            .await
            .map_err(backend)?;
        if result.matched_count == 0 {
            return Err(StoreError::GroupNotFound);
        }
        Ok(())
    }

    async fn groups_for_user(&self, user_id: &str) -> Result<Vec<Group>, StoreError> {
        let cursor = self
            .groups
            .find(doc! { "members.id": user_id }, None)
            .await
            .map_err(backend)?;
        cursor.try_collect().await.map_err(backend)
    }
}
