mod common;

use std::time::Duration;

use common::MockStore;
use keva::{Session, SessionError};

#[tokio::test]
async fn test_key_readable_before_ttl_and_gone_after() {
    // GIVEN
    let store = MockStore::start(None).await;
    let mut session = Session::open(store.config()).await.unwrap();
    session.set("ephemeral", "bar", Some(Duration::from_millis(150))).await.unwrap();

    // WHEN: read well before the deadline
    let before = session.get("ephemeral").await.unwrap();

    // THEN
    assert_eq!(before, "bar");

    // WHEN: the time-to-live has elapsed
    tokio::time::sleep(Duration::from_millis(300)).await;
    let after = session.get("ephemeral").await;

    // THEN
    assert!(matches!(after, Err(SessionError::NotFound)));
}

#[tokio::test]
async fn test_hello_scenario_with_ten_second_ttl() {
    // GIVEN
    let store = MockStore::start(None).await;
    let mut session = Session::open(store.config()).await.unwrap();

    // WHEN
    session.set("mykey", "Hello, Redis from Go!", Some(Duration::from_secs(10))).await.unwrap();

    // THEN: an immediate read is well inside the ttl
    assert_eq!(session.get("mykey").await.unwrap(), "Hello, Redis from Go!");
}
