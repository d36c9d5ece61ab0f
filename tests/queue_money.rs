// tests/queue_money.rs
use serde_json::json;

use server_relay::money::{categorize, money_text, parse_money};
use server_relay::BoundedQueue;

#[test]
fn overfull_queue_holds_the_last_cap_pushes_in_order() {
    for cap in [1usize, 3, 200] {
        let q = BoundedQueue::with_capacity(cap);
        let total = cap * 3 + 1;
        for i in 0..total {
            q.push(i);
            assert!(q.len() <= cap);
        }
        let expected: Vec<usize> = (total - cap..total).collect();
        assert_eq!(q.snapshot(), expected, "cap={cap}");
    }
}

#[test]
fn pop_then_snapshot_never_shows_popped() {
    let q = BoundedQueue::with_capacity(4);
    for i in 0..4 {
        q.push(i);
    }
    while let Some(x) = q.pop_front() {
        assert!(!q.snapshot().contains(&x));
    }
    assert!(q.snapshot().is_empty());
}

#[test]
fn money_examples() {
    assert_eq!(parse_money("12.5m"), 12_500_000.0);
    assert_eq!(parse_money("900k"), 900_000.0);
    assert_eq!(parse_money("$250000"), 250_000.0);
    assert_eq!(parse_money("garbage"), 0.0);
    assert_eq!(parse_money(""), 0.0);
}

#[test]
fn categorize_spreads_magnitudes() {
    let items = vec![
        json!({ "money": 500_000 }),
        json!({ "money": 5_000_000 }),
        json!({ "money": 50_000_000 }),
        json!({ "money": 500_000_000 }),
    ];
    let cats = categorize(items, |v| money_text(v.get("money")));
    assert_eq!(cats.one_to_ten_m, vec![json!({ "money": 5_000_000 })]);
    assert_eq!(cats.ten_to_hundred_m, vec![json!({ "money": 50_000_000 })]);
    assert_eq!(cats.hundred_m_plus, vec![json!({ "money": 500_000_000 })]);
}
