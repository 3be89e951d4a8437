//! Delivery specs
//!
//! Ordering, wildcard fan-out, metadata pass-through and unsubscribe.

use crate::prelude::*;

#[tokio::test]
async fn handlers_on_one_pattern_run_in_subscription_order() {
    for _ in 0..10 {
        let h = Harness::new();
        let seen = Deliveries::new();
        h.bus.subscribe("user.created", seen.handler("h1")).unwrap();
        h.bus.subscribe("user.created", seen.handler("h2")).unwrap();

        h.publish("user.created").await;
        h.drain().await;

        similar_asserts::assert_eq!(seen.all(), vec!["h1:user.created", "h2:user.created"]);
    }
}

#[tokio::test]
async fn subscription_order_spans_patterns() {
    let h = Harness::new();
    let seen = Deliveries::new();
    h.bus.subscribe("**", seen.handler("all")).unwrap();
    h.bus.subscribe("user.*", seen.handler("users")).unwrap();
    h.bus.subscribe("user.created", seen.handler("exact")).unwrap();

    h.publish("user.created").await;
    h.drain().await;

    similar_asserts::assert_eq!(
        seen.all(),
        vec!["all:user.created", "users:user.created", "exact:user.created"]
    );
}

#[tokio::test]
async fn subscriber_receives_payloads_in_publish_order() {
    let h = Harness::new();
    let received = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&received);
    h.bus
        .subscribe(
            "test.*",
            handler_fn("collector", move |env: Arc<Envelope<Value>>| {
                let sink = Arc::clone(&sink);
                async move {
                    sink.lock().unwrap().push(env.payload()["data"].clone());
                    HandlerResult::Ok(())
                }
            }),
        )
        .unwrap();

    for data in ["d1", "d2"] {
        let env = Envelope::new("test.integration", "agg-1", json!({ "data": data })).unwrap();
        h.bus.publish(env).await.unwrap();
    }
    h.drain().await;

    similar_asserts::assert_eq!(*received.lock().unwrap(), vec![json!("d1"), json!("d2")]);
}

#[tokio::test]
async fn double_wildcard_delivers_exactly_once() {
    let h = Harness::new();
    let seen = Deliveries::new();
    h.bus.subscribe("test.**", seen.handler("deep")).unwrap();

    h.publish("test.a.b").await;
    h.drain().await;

    similar_asserts::assert_eq!(seen.all(), vec!["deep:test.a.b"]);
}

#[tokio::test]
async fn metadata_arrives_value_for_value() {
    let h = Harness::new();
    let observed = Arc::new(Mutex::new(None));
    let slot = Arc::clone(&observed);
    h.bus
        .subscribe(
            "user.*",
            handler_fn("meta", move |env: Arc<Envelope<Value>>| {
                let slot = Arc::clone(&slot);
                async move {
                    *slot.lock().unwrap() = env.metadata().cloned();
                    HandlerResult::Ok(())
                }
            }),
        )
        .unwrap();

    let metadata = Metadata::new().with_user_id("u1").with_correlation_id("c1");
    h.bus
        .publish(envelope("user.created").with_metadata(metadata.clone()))
        .await
        .unwrap();
    h.drain().await;

    similar_asserts::assert_eq!(observed.lock().unwrap().clone(), Some(metadata));
}

#[tokio::test]
async fn unmatched_topic_is_logged_at_debug() {
    let h = Harness::new();
    h.publish("nobody.listens").await;
    h.drain().await;

    let records = h.logger.with_message("no subscribers for topic");
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].level, LogLevel::Debug);
    assert_eq!(records[0].field("topic"), Some("nobody.listens"));
}

#[tokio::test]
async fn unsubscribe_stops_later_deliveries() {
    let h = Harness::new();
    let seen = Deliveries::new();
    let handle = h.bus.subscribe("a.*", seen.handler("x")).unwrap();

    h.publish("a.first").await;
    settle().await;
    assert!(h.bus.unsubscribe(&handle));
    h.publish("a.second").await;
    h.drain().await;

    similar_asserts::assert_eq!(seen.for_label("x"), vec!["x:a.first"]);
}

#[tokio::test]
async fn subscription_table_lists_patterns_and_handlers() {
    let seen = Deliveries::new();
    let bus: EventBus = EventBus::builder()
        .logger(RecordingLogger::new())
        .subscribe("user.*", seen.handler("welcome"))
        .subscribe("**", seen.handler("audit"))
        .build()
        .unwrap();

    let table: Vec<_> = bus
        .subscriptions()
        .into_iter()
        .map(|s| (s.pattern, s.handler))
        .collect();
    similar_asserts::assert_eq!(
        table,
        vec![
            ("user.*".to_string(), "welcome".to_string()),
            ("**".to_string(), "audit".to_string()),
        ]
    );
    bus.shutdown_default().await.unwrap();
}
