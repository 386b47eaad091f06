//! MultiMap behaviour

use std::sync::Arc;

use stratakv::Range;

use crate::harness::{MultiMapUnderTest, TestStore};

fn s(v: &str) -> String {
    v.to_string()
}

fn strings(vs: &[&str]) -> Vec<String> {
    vs.iter().map(|v| v.to_string()).collect()
}

async fn tags(store: &TestStore) -> Box<dyn MultiMapUnderTest<String, String>> {
    let multi = store.multi_map::<String, String>("tags").unwrap();
    for (k, v) in [("b", "1"), ("a", "1"), ("c", "1"), ("b", "2"), ("a", "2"), ("d", "1")] {
        multi.set(s(k), s(v)).await.unwrap();
    }
    multi
}

conformance!(
    values_kept_in_insertion_order,
    duplicate_values_are_distinct_associations,
    delete_value_removes_oldest_match,
    delete_value_of_missing_pair_is_noop,
    delete_removes_every_association,
    get_returns_oldest_value,
    set_if_not_exists_only_for_fresh_key,
    keys_are_distinct,
    keys_limit_counts_distinct_keys,
    entries_walk_every_association,
    ranges_cover_all_values_of_bound_key,
    concurrent_appends_keep_every_value,
);

durable_conformance!(multi_map_survives_reopen);

async fn values_kept_in_insertion_order(store: TestStore) {
    let multi = store.multi_map::<String, String>("m").unwrap();
    multi.set(s("foo"), s("bar")).await.unwrap();
    multi.set(s("foo"), s("baz")).await.unwrap();
    assert_eq!(multi.get_values(s("foo")).await.unwrap(), strings(&["bar", "baz"]));
}

async fn duplicate_values_are_distinct_associations(store: TestStore) {
    let multi = store.multi_map::<String, i64>("m").unwrap();
    for v in [7, 7, 3, 7] {
        multi.set(s("k"), v).await.unwrap();
    }
    assert_eq!(multi.get_values(s("k")).await.unwrap(), vec![7, 7, 3, 7]);
}

async fn delete_value_removes_oldest_match(store: TestStore) {
    let multi = store.multi_map::<String, String>("m").unwrap();
    multi.set(s("foo"), s("bar")).await.unwrap();
    multi.set(s("foo"), s("baz")).await.unwrap();
    assert!(multi.delete_value(s("foo"), s("bar")).await.unwrap());
    assert_eq!(multi.get_values(s("foo")).await.unwrap(), strings(&["baz"]));

    multi.set(s("foo"), s("x")).await.unwrap();
    multi.set(s("foo"), s("baz")).await.unwrap();
    assert!(multi.delete_value(s("foo"), s("baz")).await.unwrap());
    assert_eq!(
        multi.get_values(s("foo")).await.unwrap(),
        strings(&["x", "baz"]),
        "only the oldest matching association goes"
    );
}

async fn delete_value_of_missing_pair_is_noop(store: TestStore) {
    let multi = store.multi_map::<String, String>("m").unwrap();
    multi.set(s("foo"), s("bar")).await.unwrap();
    assert!(!multi.delete_value(s("foo"), s("nope")).await.unwrap());
    assert!(!multi.delete_value(s("nokey"), s("bar")).await.unwrap());
    assert_eq!(multi.get_values(s("foo")).await.unwrap(), strings(&["bar"]));
}

async fn delete_removes_every_association(store: TestStore) {
    let multi = tags(&store).await;
    assert_eq!(multi.delete(s("a")).await.unwrap(), 2);
    assert!(!multi.has(s("a")).await.unwrap());
    assert!(multi.get_values(s("a")).await.unwrap().is_empty());
    assert_eq!(multi.get_values(s("b")).await.unwrap(), strings(&["1", "2"]));
    assert_eq!(multi.delete(s("a")).await.unwrap(), 0);
}

async fn get_returns_oldest_value(store: TestStore) {
    let multi = tags(&store).await;
    assert_eq!(multi.get(s("b")).await.unwrap(), Some(s("1")));
    multi.delete_value(s("b"), s("1")).await.unwrap();
    assert_eq!(multi.get(s("b")).await.unwrap(), Some(s("2")));
    assert_eq!(multi.get(s("zzz")).await.unwrap(), None);
}

async fn set_if_not_exists_only_for_fresh_key(store: TestStore) {
    let multi = store.multi_map::<String, String>("m").unwrap();
    assert!(multi.set_if_not_exists(s("k"), s("first")).await.unwrap());
    assert!(!multi.set_if_not_exists(s("k"), s("second")).await.unwrap());
    multi.set(s("k"), s("third")).await.unwrap();
    assert_eq!(
        multi.get_values(s("k")).await.unwrap(),
        strings(&["first", "third"])
    );
}

async fn keys_are_distinct(store: TestStore) {
    let multi = tags(&store).await;
    assert_eq!(
        multi.keys(Range::all()).await.unwrap(),
        strings(&["a", "b", "c", "d"])
    );
    assert_eq!(
        multi.keys(Range::all().reverse()).await.unwrap(),
        strings(&["d", "c", "b", "a"])
    );
}

async fn keys_limit_counts_distinct_keys(store: TestStore) {
    let multi = tags(&store).await;
    assert_eq!(
        multi.keys(Range::all().limit(2)).await.unwrap(),
        strings(&["a", "b"])
    );
    assert_eq!(
        multi.keys(Range::all().start("b").limit(2)).await.unwrap(),
        strings(&["b", "c"])
    );
    assert_eq!(
        multi.values(Range::all().limit(2)).await.unwrap().len(),
        2,
        "values count associations"
    );
}

async fn entries_walk_every_association(store: TestStore) {
    let multi = tags(&store).await;
    let entries = multi.entries(Range::all().end("c")).await.unwrap();
    assert_eq!(
        entries,
        vec![
            (s("a"), s("1")),
            (s("a"), s("2")),
            (s("b"), s("1")),
            (s("b"), s("2")),
        ]
    );
}

async fn ranges_cover_all_values_of_bound_key(store: TestStore) {
    let multi = tags(&store).await;
    assert_eq!(
        multi.values(Range::all().end("b").reverse()).await.unwrap(),
        strings(&["2", "1", "2", "1"]),
        "a descending end bound includes every value of that key"
    );
    assert_eq!(
        multi.keys(Range::all().start("b").end("c").reverse()).await.unwrap(),
        strings(&["c"])
    );
    assert_eq!(
        multi.keys(Range::all().start("b").reverse()).await.unwrap(),
        strings(&["d", "c"])
    );
}

async fn concurrent_appends_keep_every_value(store: TestStore) {
    let store = Arc::new(store);
    let tasks: Vec<_> = (0..8i64)
        .map(|i| {
            let store = Arc::clone(&store);
            tokio::spawn(async move {
                let multi = store.multi_map::<String, i64>("race").unwrap();
                for j in 0..4 {
                    multi.set(s("k"), i * 10 + j).await.unwrap();
                }
            })
        })
        .collect();
    for task in tasks {
        task.await.unwrap();
    }
    let multi = store.multi_map::<String, i64>("race").unwrap();
    let mut values = multi.get_values(s("k")).await.unwrap();
    values.sort_unstable();
    let expected: Vec<i64> = (0..8).flat_map(|i| (0..4).map(move |j| i * 10 + j)).collect();
    assert_eq!(values, expected);
}

async fn multi_map_survives_reopen(store: TestStore) {
    {
        let multi = store.multi_map::<i64, String>("durable").unwrap();
        multi.set(1, s("a")).await.unwrap();
        multi.set(1, s("b")).await.unwrap();
        multi.set(2, s("c")).await.unwrap();
        multi.delete_value(1, s("a")).await.unwrap();
    }
    let store = store.reopen();
    let multi = store.multi_map::<i64, String>("durable").unwrap();
    assert_eq!(multi.get_values(1).await.unwrap(), strings(&["b"]));
    multi.set(1, s("d")).await.unwrap();
    assert_eq!(multi.get_values(1).await.unwrap(), strings(&["b", "d"]));
    assert_eq!(multi.keys(Range::all()).await.unwrap(), vec![1, 2]);
}
