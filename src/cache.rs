use std::collections::HashMap;
use std::sync::RwLock;

use crate::balance::Balances;

struct CachedBalances {
    ledger_version: i64,
    balances: Balances,
}

/// Memoized balance views keyed by `(group id, ledger version)`.
///
/// A lookup only hits when the cached version matches the version of the
/// snapshot being served, so a slow reader that computed against an older
/// ledger can never have its result served after a write. Every write path
/// additionally invalidates the group's entry. On a poisoned lock the
/// cache degrades to a miss; correctness never depends on it.
#[derive(Default)]
pub struct BalanceCache {
    entries: RwLock<HashMap<String, CachedBalances>>,
}

impl BalanceCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lookup(&self, group_id: &str, ledger_version: i64) -> Option<Balances> {
        let entries = self.entries.read().ok()?;
        let cached = entries.get(group_id)?;
        if cached.ledger_version != ledger_version {
            return None;
        }
        Some(cached.balances.clone())
    }

    pub fn store(&self, group_id: &str, ledger_version: i64, balances: Balances) {
        let Ok(mut entries) = self.entries.write() else {
            return;
        };
        match entries.get(group_id) {
            // Never replace a fresher entry with a stale recomputation.
            Some(cached) if cached.ledger_version > ledger_version => {}
            _ => {
                entries.insert(
                    group_id.to_string(),
                    CachedBalances {
                        ledger_version,
                        balances,
                    },
                );
            }
        }
    }

    pub fn invalidate(&self, group_id: &str) {
        let Ok(mut entries) = self.entries.write() else {
            return;
        };
        entries.remove(group_id);
    }
}
