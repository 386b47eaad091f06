//! OrderedMap behaviour

use stratakv::{Key, Msgpack, Range};

use crate::harness::{MapUnderTest, TestStore};

fn s(v: &str) -> String {
    v.to_string()
}

fn strings(vs: &[&str]) -> Vec<String> {
    vs.iter().map(|v| v.to_string()).collect()
}

async fn letters(store: &TestStore) -> Box<dyn MapUnderTest<String, String>> {
    let map = store.map::<String, String>("letters").unwrap();
    for k in ["c", "a", "d", "b"] {
        map.set(s(k), k.to_uppercase()).await.unwrap();
    }
    map
}

conformance!(
    set_then_get,
    set_overwrites,
    delete_then_get_is_absent,
    delete_absent_is_noop,
    set_if_not_exists_first_wins,
    has_and_size,
    forward_ranges,
    reverse_ranges,
    limit_applies_after_direction,
    inverted_range_is_empty,
    tuple_keys_iterate_in_tuple_order,
    integer_keys_iterate_numerically,
    entries_of_unwritten_map_is_empty,
    values_follow_key_order,
    key_shape_is_enforced,
    reopened_handle_sees_data,
    structured_values,
);

durable_conformance!(map_survives_reopen);

async fn set_then_get(store: TestStore) {
    let map = store.map::<String, String>("m").unwrap();
    map.set(s("k"), s("v")).await.unwrap();
    assert_eq!(map.get(s("k")).await.unwrap(), Some(s("v")));
    assert_eq!(map.get(s("other")).await.unwrap(), None);
}

async fn set_overwrites(store: TestStore) {
    let map = store.map::<String, i64>("m").unwrap();
    map.set(s("k"), 1).await.unwrap();
    map.set(s("k"), 2).await.unwrap();
    assert_eq!(map.get(s("k")).await.unwrap(), Some(2));
    assert_eq!(map.size().await.unwrap(), 1, "overwrite must not add an entry");
}

async fn delete_then_get_is_absent(store: TestStore) {
    let map = store.map::<String, String>("m").unwrap();
    map.set(s("k"), s("v")).await.unwrap();
    assert!(map.delete(s("k")).await.unwrap());
    assert_eq!(map.get(s("k")).await.unwrap(), None);
}

async fn delete_absent_is_noop(store: TestStore) {
    let map = store.map::<String, String>("m").unwrap();
    assert!(!map.delete(s("never")).await.unwrap());
    map.set(s("k"), s("v")).await.unwrap();
    assert!(!map.delete(s("never")).await.unwrap());
    assert_eq!(map.size().await.unwrap(), 1);
}

async fn set_if_not_exists_first_wins(store: TestStore) {
    let map = store.map::<String, String>("m").unwrap();
    assert!(map.set_if_not_exists(s("k"), s("v1")).await.unwrap());
    assert!(!map.set_if_not_exists(s("k"), s("v2")).await.unwrap());
    assert_eq!(map.get(s("k")).await.unwrap(), Some(s("v1")));

    map.delete(s("k")).await.unwrap();
    assert!(
        map.set_if_not_exists(s("k"), s("v3")).await.unwrap(),
        "a deleted key counts as absent"
    );
}

async fn has_and_size(store: TestStore) {
    let map = letters(&store).await;
    assert!(map.has(s("a")).await.unwrap());
    assert!(!map.has(s("z")).await.unwrap());
    assert_eq!(map.size().await.unwrap(), 4);
}

async fn forward_ranges(store: TestStore) {
    let map = letters(&store).await;
    assert_eq!(map.keys(Range::all()).await.unwrap(), strings(&["a", "b", "c", "d"]));
    assert_eq!(
        map.keys(Range::all().start("b").end("c")).await.unwrap(),
        strings(&["b"])
    );
    assert_eq!(
        map.keys(Range::all().start("b")).await.unwrap(),
        strings(&["b", "c", "d"])
    );
    assert_eq!(map.keys(Range::all().end("c")).await.unwrap(), strings(&["a", "b"]));
    assert_eq!(
        map.keys(Range::all().start("b").limit(1)).await.unwrap(),
        strings(&["b"])
    );
    assert_eq!(
        map.keys(Range::all().start("bb").end("cc")).await.unwrap(),
        strings(&["c"]),
        "bounds need not be present keys"
    );
}

async fn reverse_ranges(store: TestStore) {
    let map = letters(&store).await;
    assert_eq!(
        map.keys(Range::all().reverse()).await.unwrap(),
        strings(&["d", "c", "b", "a"])
    );
    assert_eq!(
        map.keys(Range::all().start("b").end("c").reverse()).await.unwrap(),
        strings(&["c"])
    );
    assert_eq!(
        map.keys(Range::all().end("b").reverse()).await.unwrap(),
        strings(&["b", "a"])
    );
    assert_eq!(
        map.keys(Range::all().start("b").reverse()).await.unwrap(),
        strings(&["d", "c"])
    );
}

async fn limit_applies_after_direction(store: TestStore) {
    let map = letters(&store).await;
    assert_eq!(
        map.keys(Range::all().limit(2)).await.unwrap(),
        strings(&["a", "b"])
    );
    assert_eq!(
        map.keys(Range::all().reverse().limit(2)).await.unwrap(),
        strings(&["d", "c"])
    );
    assert!(map.keys(Range::all().limit(0)).await.unwrap().is_empty());
}

async fn inverted_range_is_empty(store: TestStore) {
    let map = letters(&store).await;
    assert!(map.keys(Range::all().start("c").end("b")).await.unwrap().is_empty());
    assert!(map.keys(Range::all().start("b").end("b")).await.unwrap().is_empty());
}

async fn tuple_keys_iterate_in_tuple_order(store: TestStore) {
    let map = store.map::<(i64, String), String>("tuples").unwrap();
    map.set((5, s("bar")), s("second")).await.unwrap();
    map.set((0, s("foo")), s("first")).await.unwrap();
    map.set((5, s("")), s("between")).await.unwrap();
    let keys = map.keys(Range::all()).await.unwrap();
    assert_eq!(keys, vec![(0, s("foo")), (5, s("")), (5, s("bar"))]);

    let from_five = map.values(Range::all().start((5, s("")))).await.unwrap();
    assert_eq!(from_five, strings(&["between", "second"]));
}

async fn integer_keys_iterate_numerically(store: TestStore) {
    let map = store.map::<i64, i64>("ints").unwrap();
    for k in [10, -3, 9, 0, i64::MIN, i64::MAX, 100] {
        map.set(k, k).await.unwrap();
    }
    let keys = map.keys(Range::all()).await.unwrap();
    assert_eq!(keys, vec![i64::MIN, -3, 0, 9, 10, 100, i64::MAX]);
    let keys = map.keys(Range::all().start(-3).end(10)).await.unwrap();
    assert_eq!(keys, vec![-3, 0, 9]);
}

async fn entries_of_unwritten_map_is_empty(store: TestStore) {
    let map = store.map::<String, String>("fresh").unwrap();
    assert!(map.entries(Range::all()).await.unwrap().is_empty());
    assert!(map.keys(Range::all().reverse()).await.unwrap().is_empty());
    assert_eq!(map.size().await.unwrap(), 0);
}

async fn values_follow_key_order(store: TestStore) {
    let map = letters(&store).await;
    assert_eq!(
        map.values(Range::all()).await.unwrap(),
        strings(&["A", "B", "C", "D"])
    );
    assert_eq!(
        map.entries(Range::all().reverse().limit(1)).await.unwrap(),
        vec![(s("d"), s("D"))]
    );
}

async fn key_shape_is_enforced(store: TestStore) {
    let map = store.map::<Key, String>("dynamic").unwrap();
    map.set(Key::single("a").push(1i64), s("ok")).await.unwrap();
    map.set(Key::single("b").push(2i64), s("ok")).await.unwrap();

    let err = map.set(Key::single(1i64).push("a"), s("bad")).await.unwrap_err();
    assert!(err.is_invalid_argument(), "unexpected error: {}", err);
    let err = map.get(Key::single("a")).await.unwrap_err();
    assert!(err.is_invalid_argument());

    let typed = store.map::<i64, String>("dynamic").unwrap();
    assert!(typed.set(7, s("bad")).await.unwrap_err().is_invalid_argument());
    assert_eq!(map.size().await.unwrap(), 2, "rejected writes store nothing");
}

async fn reopened_handle_sees_data(store: TestStore) {
    let first = store.map::<String, String>("shared").unwrap();
    first.set(s("k"), s("v")).await.unwrap();
    let second = store.map::<String, String>("shared").unwrap();
    assert_eq!(second.get(s("k")).await.unwrap(), Some(s("v")));
    second.delete(s("k")).await.unwrap();
    assert!(!first.has(s("k")).await.unwrap());
}

async fn structured_values(store: TestStore) {
    let map = store.map::<String, Msgpack<Vec<i64>>>("structured").unwrap();
    map.set(s("primes"), Msgpack(vec![2, 3, 5])).await.unwrap();
    let got = map.get(s("primes")).await.unwrap().map(Msgpack::into_inner);
    assert_eq!(got, Some(vec![2, 3, 5]));
}

async fn map_survives_reopen(store: TestStore) {
    {
        let map = store.map::<(i64, String), String>("durable").unwrap();
        map.set((1, s("a")), s("x")).await.unwrap();
        map.set((2, s("b")), s("y")).await.unwrap();
        map.delete((1, s("a"))).await.unwrap();
    }
    let store = store.reopen();
    let map = store.map::<(i64, String), String>("durable").unwrap();
    assert_eq!(map.entries(Range::all()).await.unwrap(), vec![((2, s("b")), s("y"))]);
    let err = store
        .map::<String, String>("durable")
        .unwrap()
        .set(s("k"), s("v"))
        .await
        .unwrap_err();
    assert!(err.is_invalid_argument(), "recorded shape survives reopen");
}
