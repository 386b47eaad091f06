//! Collection conformance suite
//!
//! Every behavioural test is written once against the views in
//! [`harness`] and instantiated for a synchronous and an asynchronous
//! store. Durability tests additionally run against a file-backed store
//! that is closed and reopened mid-test.
//!
//! ## Running Tests
//!
//! ```bash
//! # Everything
//! cargo test --test conformance
//!
//! # One collection kind
//! cargo test --test conformance multi_map::
//!
//! # Async mode only
//! cargo test --test conformance async_store
//! ```

/// Instantiate each check for an in-memory sync and async store
macro_rules! conformance {
    ($($check:ident),* $(,)?) => {
        $(
            mod $check {
                use crate::harness::TestStore;
                use stratakv::AccessMode;

                #[tokio::test]
                async fn sync_store() {
                    super::$check(TestStore::ephemeral(AccessMode::Sync)).await;
                }

                #[tokio::test]
                async fn async_store() {
                    super::$check(TestStore::ephemeral(AccessMode::Async)).await;
                }
            }
        )*
    };
}

/// Instantiate each check for a file-backed sync and async store
macro_rules! durable_conformance {
    ($($check:ident),* $(,)?) => {
        $(
            mod $check {
                use crate::harness::TestStore;
                use stratakv::AccessMode;

                #[tokio::test]
                async fn sync_store() {
                    super::$check(TestStore::durable(AccessMode::Sync)).await;
                }

                #[tokio::test]
                async fn async_store() {
                    super::$check(TestStore::durable(AccessMode::Async)).await;
                }
            }
        )*
    };
}

mod harness;

mod map;
mod multi_map;
