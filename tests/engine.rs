//! End-to-end ledger scenarios over the in-memory store.

use splitledger::balance::{check_zero_sum, compute_balances};
use splitledger::cache::BalanceCache;
use splitledger::exchange::{simplify, Exchange};
use splitledger::expense::{delete_expense, record_expense};
use splitledger::memory::MemoryLedgerStore;
use splitledger::schemas::{Group, Member};
use splitledger::settlement::record_settlement;
use splitledger::store::LedgerStore;

fn member(id: &str, name: &str) -> Member {
    Member {
        id: id.to_string(),
        name: name.to_string(),
    }
}

async fn group_of(store: &MemoryLedgerStore, id: &str, members: Vec<Member>) {
    let group = Group {
        id: id.to_string(),
        name: id.to_string(),
        members,
        expenses: vec![],
        settlements: vec![],
        ledger_version: 0,
    };
    store.create_group(group).await.unwrap();
}

#[actix_web::test]
async fn one_expense_between_two_people() {
    let store = MemoryLedgerStore::new();
    let cache = BalanceCache::new();
    group_of(
        &store,
        "trip",
        vec![member("alice", "Alice"), member("bob", "Bob")],
    )
    .await;

    record_expense(
        &store,
        &cache,
        "trip",
        "alice",
        "hotel".into(),
        1000,
        vec!["alice".into(), "bob".into()],
    )
    .await
    .unwrap();

    let group = store.load_group("trip").await.unwrap();
    let balances = compute_balances(&group);
    assert_eq!(balances["alice"], 500);
    assert_eq!(balances["bob"], -500);
    assert_eq!(
        simplify(&balances),
        vec![Exchange {
            from: "bob".to_string(),
            to: "alice".to_string(),
            amount: 500,
        }]
    );
}

#[actix_web::test]
async fn settling_up_empties_the_suggestions() {
    let store = MemoryLedgerStore::new();
    let cache = BalanceCache::new();
    group_of(
        &store,
        "trip",
        vec![member("alice", "Alice"), member("bob", "Bob")],
    )
    .await;

    record_expense(
        &store,
        &cache,
        "trip",
        "alice",
        "hotel".into(),
        1000,
        vec!["alice".into(), "bob".into()],
    )
    .await
    .unwrap();
    record_settlement(&store, &cache, "trip", "bob", "alice", 500)
        .await
        .unwrap();

    let group = store.load_group("trip").await.unwrap();
    let balances = compute_balances(&group);
    assert_eq!(balances["alice"], 0);
    assert_eq!(balances["bob"], 0);
    assert!(simplify(&balances).is_empty());
}

#[actix_web::test]
async fn three_way_expense_produces_two_transfers() {
    let store = MemoryLedgerStore::new();
    let cache = BalanceCache::new();
    group_of(
        &store,
        "flat",
        vec![member("a", "A"), member("b", "B"), member("c", "C")],
    )
    .await;

    record_expense(
        &store,
        &cache,
        "flat",
        "a",
        "rent".into(),
        900,
        vec!["a".into(), "b".into(), "c".into()],
    )
    .await
    .unwrap();

    let group = store.load_group("flat").await.unwrap();
    let balances = compute_balances(&group);
    assert_eq!(balances["a"], 600);
    assert_eq!(balances["b"], -300);
    assert_eq!(balances["c"], -300);

    let exchanges = simplify(&balances);
    assert_eq!(exchanges.len(), 2);
    assert_eq!(exchanges.iter().map(|e| e.amount).sum::<i64>(), 600);
    // Equal debtor magnitudes fall back to id order.
    assert_eq!(exchanges[0].from, "b");
    assert_eq!(exchanges[1].from, "c");
}

#[actix_web::test]
async fn deletion_after_a_settlement_recomputes_from_whats_left() {
    let store = MemoryLedgerStore::new();
    let cache = BalanceCache::new();
    group_of(
        &store,
        "trip",
        vec![member("alice", "Alice"), member("bob", "Bob")],
    )
    .await;

    let expense = record_expense(
        &store,
        &cache,
        "trip",
        "alice",
        "hotel".into(),
        1000,
        vec!["alice".into(), "bob".into()],
    )
    .await
    .unwrap();
    record_settlement(&store, &cache, "trip", "bob", "alice", 500)
        .await
        .unwrap();

    // The settlement stays; only the expense goes away.
    delete_expense(&store, &cache, "trip", &expense.id, "alice")
        .await
        .unwrap();

    let group = store.load_group("trip").await.unwrap();
    assert!(group.expenses.is_empty());
    assert_eq!(group.settlements.len(), 1);

    let balances = compute_balances(&group);
    check_zero_sum(&balances).unwrap();
    assert_eq!(balances["alice"], -500);
    assert_eq!(balances["bob"], 500);
}

#[actix_web::test]
async fn long_running_ledger_stays_zero_sum() {
    let store = MemoryLedgerStore::new();
    let cache = BalanceCache::new();
    group_of(
        &store,
        "house",
        vec![
            member("a", "A"),
            member("b", "B"),
            member("c", "C"),
            member("d", "D"),
        ],
    )
    .await;

    let expenses = [
        ("a", 1001, vec!["a", "b", "c"]),
        ("b", 333, vec!["a", "b", "c", "d"]),
        ("c", 7, vec!["d"]),
        ("d", 9999, vec!["a", "d"]),
    ];
    let mut recorded = Vec::new();
    for (payer, amount, participants) in expenses {
        let expense = record_expense(
            &store,
            &cache,
            "house",
            payer,
            "stuff".into(),
            amount,
            participants.into_iter().map(String::from).collect(),
        )
        .await
        .unwrap();
        recorded.push(expense);

        let group = store.load_group("house").await.unwrap();
        check_zero_sum(&compute_balances(&group)).unwrap();
    }

    record_settlement(&store, &cache, "house", "b", "a", 250)
        .await
        .unwrap();
    delete_expense(&store, &cache, "house", &recorded[1].id, "b")
        .await
        .unwrap();

    let group = store.load_group("house").await.unwrap();
    let balances = compute_balances(&group);
    check_zero_sum(&balances).unwrap();

    // Simplification settles exactly what the ledger says is open.
    let mut settled = balances.clone();
    for exchange in simplify(&balances) {
        *settled.get_mut(&exchange.from).unwrap() += exchange.amount;
        *settled.get_mut(&exchange.to).unwrap() -= exchange.amount;
    }
    assert!(settled.values().all(|&v| v == 0));
}

#[actix_web::test]
async fn cached_and_fresh_balances_agree() {
    let store = MemoryLedgerStore::new();
    let cache = BalanceCache::new();
    group_of(
        &store,
        "trip",
        vec![member("alice", "Alice"), member("bob", "Bob")],
    )
    .await;

    // Mirrors the serving path: fill on miss, trust on version hit.
    let via_cache = |group: &Group| {
        if let Some(balances) = cache.lookup(&group.id, group.ledger_version) {
            return balances;
        }
        let balances = compute_balances(group);
        cache.store(&group.id, group.ledger_version, balances.clone());
        balances
    };

    let expense = record_expense(
        &store,
        &cache,
        "trip",
        "alice",
        "hotel".into(),
        1000,
        vec!["alice".into(), "bob".into()],
    )
    .await
    .unwrap();

    let group = store.load_group("trip").await.unwrap();
    assert_eq!(via_cache(&group), compute_balances(&group));
    // Second read hits the cache and must still agree.
    assert_eq!(via_cache(&group), compute_balances(&group));

    record_settlement(&store, &cache, "trip", "bob", "alice", 300)
        .await
        .unwrap();
    let group = store.load_group("trip").await.unwrap();
    assert_eq!(via_cache(&group), compute_balances(&group));

    delete_expense(&store, &cache, "trip", &expense.id, "alice")
        .await
        .unwrap();
    let group = store.load_group("trip").await.unwrap();
    assert_eq!(via_cache(&group), compute_balances(&group));

    // A stale cache entry for an old version is never served.
    assert_eq!(cache.lookup("trip", 0), None);
}
