use chrono::Utc;
use uuid::Uuid;

use crate::cache::BalanceCache;
use crate::error::ApiError;
use crate::schemas::{Expense, UserId};
use crate::store::LedgerStore;

/// Validate and append a new expense. The caller is the payer. First
/// failed check wins; on success the group's cached balance view is
/// invalidated before returning.
pub async fn record_expense(
    store: &dyn LedgerStore,
    cache: &BalanceCache,
    group_id: &str,
    payer: &str,
    description: String,
    amount: i64,
    participants: Vec<UserId>,
) -> Result<Expense, ApiError> {
    if amount <= 0 {
        return Err(ApiError::InvalidAmount);
    }
    if participants.is_empty() {
        return Err(ApiError::InvalidExpense);
    }
    let participants = dedup(participants);

    let group = store.load_group(group_id).await?;
    if !group.is_member(payer) {
        return Err(ApiError::NotAMember(payer.to_string()));
    }
    for participant in &participants {
        if !group.is_member(participant) {
            return Err(ApiError::NotAMember(participant.clone()));
        }
    }

    let expense = Expense {
        id: Uuid::new_v4().to_string(),
        description,
        amount,
        payer: payer.to_string(),
        participants,
        created_at: Utc::now(),
    };
    store.append_expense(group_id, expense.clone()).await?;
    cache.invalidate(group_id);
    Ok(expense)
}

/// Hard-delete an expense, payer-only. Balances are recomputed from the
/// remaining ledger on the next query; nothing tries to "undo" related
/// settlements.
pub async fn delete_expense(
    store: &dyn LedgerStore,
    cache: &BalanceCache,
    group_id: &str,
    expense_id: &str,
    caller: &str,
) -> Result<(), ApiError> {
    let group = store.load_group(group_id).await?;
    let expense = group
        .expenses
        .iter()
        .find(|expense| expense.id == expense_id)
        .ok_or(ApiError::NotFound)?;
    if expense.payer != caller {
        return Err(ApiError::NotExpensePayer);
    }

    let removed = store.remove_expense(group_id, expense_id).await?;
    cache.invalidate(group_id);
    if !removed {
        // Lost a race with another delete of the same expense.
        return Err(ApiError::NotFound);
    }
    Ok(())
}

/// Participants form a set; keep the first occurrence of each id.
fn dedup(participants: Vec<UserId>) -> Vec<UserId> {
    let mut seen = std::collections::HashSet::new();
    participants
        .into_iter()
        .filter(|participant| seen.insert(participant.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use crate::memory::MemoryLedgerStore;
    use crate::schemas::{Group, Member};

    use super::*;

    async fn store_with_group() -> MemoryLedgerStore {
        let store = MemoryLedgerStore::new();
        let group = Group {
            id: "g1".to_string(),
            name: "trip".to_string(),
            members: vec![
                Member {
                    id: "alice".to_string(),
                    name: "Alice".to_string(),
                },
                Member {
                    id: "bob".to_string(),
                    name: "Bob".to_string(),
                },
            ],
            expenses: vec![],
            settlements: vec![],
            ledger_version: 0,
        };
        store.create_group(group).await.unwrap();
        store
    }

    #[actix_web::test]
    async fn rejects_non_positive_amounts_first() {
        let store = store_with_group().await;
        let cache = BalanceCache::new();
        // Amount is checked before anything else, even a bad group id.
        let err = record_expense(&store, &cache, "nope", "alice", "x".into(), 0, vec![])
            .await
            .unwrap_err();
        assert_eq!(err, ApiError::InvalidAmount);
    }

    #[actix_web::test]
    async fn rejects_empty_participants() {
        let store = store_with_group().await;
        let cache = BalanceCache::new();
        let err = record_expense(&store, &cache, "g1", "alice", "x".into(), 100, vec![])
            .await
            .unwrap_err();
        assert_eq!(err, ApiError::InvalidExpense);
    }

    #[actix_web::test]
    async fn rejects_non_member_participants() {
        let store = store_with_group().await;
        let cache = BalanceCache::new();
        let err = record_expense(
            &store,
            &cache,
            "g1",
            "alice",
            "x".into(),
            100,
            vec!["alice".to_string(), "mallory".to_string()],
        )
        .await
        .unwrap_err();
        assert_eq!(err, ApiError::NotAMember("mallory".to_string()));
    }

    #[actix_web::test]
    async fn duplicate_participants_collapse() {
        let store = store_with_group().await;
        let cache = BalanceCache::new();
        let expense = record_expense(
            &store,
            &cache,
            "g1",
            "alice",
            "dinner".into(),
            1000,
            vec!["alice".to_string(), "bob".to_string(), "bob".to_string()],
        )
        .await
        .unwrap();
        assert_eq!(expense.participants, vec!["alice", "bob"]);
    }

    #[actix_web::test]
    async fn only_the_payer_can_delete() {
        let store = store_with_group().await;
        let cache = BalanceCache::new();
        let expense = record_expense(
            &store,
            &cache,
            "g1",
            "alice",
            "dinner".into(),
            1000,
            vec!["alice".to_string(), "bob".to_string()],
        )
        .await
        .unwrap();

        let err = delete_expense(&store, &cache, "g1", &expense.id, "bob")
            .await
            .unwrap_err();
        assert_eq!(err, ApiError::NotExpensePayer);

        delete_expense(&store, &cache, "g1", &expense.id, "alice")
            .await
            .unwrap();
        assert!(store.load_group("g1").await.unwrap().expenses.is_empty());
    }

    #[actix_web::test]
    async fn deleting_an_unknown_expense_is_not_found() {
        let store = store_with_group().await;
        let cache = BalanceCache::new();
        let err = delete_expense(&store, &cache, "g1", "missing", "alice")
            .await
            .unwrap_err();
        assert_eq!(err, ApiError::NotFound);
    }
}
