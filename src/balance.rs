use std::collections::HashMap;

use crate::error::ApiError;
use crate::money::equal_share;
use crate::schemas::{Expense, Group, UserId};

pub type Balances = HashMap<UserId, i64>;

/// Fold one ledger snapshot into a net balance per member.
///
/// Positive means the group owes them, negative means they owe the group.
/// Every entry contributes matched credit/debit pairs in exact minor
/// units, so the result sums to zero by construction. Balances are always
/// recomputed from the ledger, never patched incrementally, which is what
/// makes expense deletion safe.
pub fn compute_balances(group: &Group) -> Balances {
    let mut balances: Balances = group
        .members
        .iter()
        .map(|member| (member.id.clone(), 0))
        .collect();

    for expense in &group.expenses {
        if expense.participants.is_empty() {
            continue;
        }
        // Credit the payer the full amount, debit every participant their
        // share. A payer who also participates nets out automatically.
        *balances.entry(expense.payer.clone()).or_default() += expense.amount;
        let (share, remainder) = equal_share(expense.amount, expense.participants.len());
        for participant in &expense.participants {
            *balances.entry(participant.clone()).or_default() -= share;
        }
        if remainder > 0 {
            *balances.entry(remainder_assignee(expense).clone()).or_default() -= remainder;
        }
    }

    for settlement in &group.settlements {
        // The payer discharged debt; the amount owed to the receiver
        // shrinks by the same amount.
        *balances.entry(settlement.from.clone()).or_default() += settlement.amount;
        *balances.entry(settlement.to.clone()).or_default() -= settlement.amount;
    }

    balances
}

/// The one participant who absorbs the integer-division remainder: the
/// payer when they take part in the expense, otherwise the participant
/// with the smallest id. Deterministic so recomputations always agree.
fn remainder_assignee(expense: &Expense) -> &UserId {
    expense
        .participants
        .iter()
        .find(|participant| **participant == expense.payer)
        .unwrap_or_else(|| {
            expense
                .participants
                .iter()
                .min()
                .expect("participants checked non-empty")
        })
}

/// Defensive conservation check. A nonzero sum can only come from a logic
/// or data defect, so it is surfaced as a fatal error instead of a result.
pub fn check_zero_sum(balances: &Balances) -> Result<(), ApiError> {
    let sum: i64 = balances.values().sum();
    if sum != 0 {
        return Err(ApiError::InvariantViolation);
    }
    Ok(())
}
