use chrono::Utc;
use uuid::Uuid;

use crate::cache::BalanceCache;
use crate::error::ApiError;
use crate::schemas::Settlement;
use crate::store::LedgerStore;

/// Validate and append a new settlement. The caller is the paying side.
///
/// Checks run in a fixed order and the first failure wins: positive
/// amount, then membership of both parties, then no self-payment. A
/// settlement that exceeds the actual debt, or one between members with no
/// direct debt at all, is accepted on purpose: any member may pay any
/// other member, the ledger records it, and an overpayment simply shows up
/// as a reversed balance on the next query. That keeps this path O(1)
/// instead of re-deriving the debt graph on every write.
pub async fn record_settlement(
    store: &dyn LedgerStore,
    cache: &BalanceCache,
    group_id: &str,
    from: &str,
    to: &str,
    amount: i64,
) -> Result<Settlement, ApiError> {
    if amount <= 0 {
        return Err(ApiError::InvalidAmount);
    }

    let group = store.load_group(group_id).await?;
    if !group.is_member(from) {
        return Err(ApiError::NotAMember(from.to_string()));
    }
    if !group.is_member(to) {
        return Err(ApiError::NotAMember(to.to_string()));
    }
    if from == to {
        return Err(ApiError::InvalidSettlement);
    }

    let settlement = Settlement {
        id: Uuid::new_v4().to_string(),
        from: from.to_string(),
        to: to.to_string(),
        amount,
        created_at: Utc::now(),
    };
    store.append_settlement(group_id, settlement.clone()).await?;
    cache.invalidate(group_id);
    Ok(settlement)
}
