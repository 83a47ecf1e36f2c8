use std::cmp::Ordering;
use std::collections::BinaryHeap;

use serde::Serialize;

use crate::balance::Balances;
use crate::schemas::UserId;

/// A suggested transfer: `from` pays `to` to move both toward zero.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Exchange {
    pub from: UserId,
    pub to: UserId,
    pub amount: i64,
}

/// Remaining magnitude of one side of the debt graph. Ordered so the heap
/// pops the largest amount first, with ties broken by member id ascending
/// to keep the output stable.
#[derive(Clone, Debug, PartialEq, Eq)]
struct Remaining {
    amount: i64,
    id: UserId,
}

impl Ord for Remaining {
    fn cmp(&self, other: &Self) -> Ordering {
        self.amount
            .cmp(&other.amount)
            .then_with(|| other.id.cmp(&self.id))
    }
}

impl PartialOrd for Remaining {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Replace the full pairwise debt graph with a short list of transfers
/// that zero every balance.
///
/// Greedy largest-pair netting: repeatedly match the largest creditor with
/// the largest debtor and transfer the smaller of the two remainders. This
/// emits at most `nonzero members - 1` transfers. It is a heuristic, not a
/// proven minimum — the exactly-minimal transfer count is NP-hard — but it
/// is deterministic: the same balance map always yields the same ordered
/// output.
pub fn simplify(balances: &Balances) -> Vec<Exchange> {
    let mut creditors = BinaryHeap::new();
    let mut debtors = BinaryHeap::new();
    for (id, &balance) in balances {
        if balance > 0 {
            creditors.push(Remaining {
                amount: balance,
                id: id.clone(),
            });
        } else if balance < 0 {
            debtors.push(Remaining {
                amount: -balance,
                id: id.clone(),
            });
        }
    }

    let mut exchanges = Vec::new();
    while let (Some(mut creditor), Some(mut debtor)) = (creditors.pop(), debtors.pop()) {
        let amount = creditor.amount.min(debtor.amount);
        exchanges.push(Exchange {
            from: debtor.id.clone(),
            to: creditor.id.clone(),
            amount,
        });
        creditor.amount -= amount;
        debtor.amount -= amount;
        if creditor.amount > 0 {
            creditors.push(creditor);
        }
        if debtor.amount > 0 {
            debtors.push(debtor);
        }
    }

    exchanges
}
