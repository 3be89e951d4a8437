//! Handler isolation specs

use crate::prelude::*;
use evt_bus::HandlerCause;

fn failing(label: &'static str) -> impl evt_bus::EventHandler<Value> {
    handler_fn(label, |_env: Arc<Envelope<Value>>| async {
        HandlerResult::Err("write failed".into())
    })
}

fn panicking(label: &'static str) -> impl evt_bus::EventHandler<Value> {
    handler_fn(label, |env: Arc<Envelope<Value>>| async move {
        if env.aggregate_id().is_empty() {
            return HandlerResult::Ok(());
        }
        panic!("handler lost its mind")
    })
}

#[tokio::test]
async fn failing_handler_does_not_block_siblings() {
    let h = Harness::new();
    let seen = Deliveries::new();
    h.bus.subscribe("order.*", seen.handler("before")).unwrap();
    h.bus.subscribe("order.placed", failing("broken")).unwrap();
    h.bus.subscribe("order.*", seen.handler("after")).unwrap();

    h.publish("order.placed").await;
    h.drain().await;

    similar_asserts::assert_eq!(seen.all(), vec!["before:order.placed", "after:order.placed"]);

    let errors = h.sink.errors();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].handler, "broken");
    assert_eq!(errors[0].pattern, "order.placed");
    assert_eq!(errors[0].topic, "order.placed");
    assert_eq!(errors[0].cause, HandlerCause::Failed("write failed".to_string()));
}

#[tokio::test]
async fn panicking_handler_is_reported_and_contained() {
    let h = Harness::new();
    let seen = Deliveries::new();
    h.bus.subscribe("**", panicking("wild")).unwrap();
    h.bus.subscribe("**", seen.handler("calm")).unwrap();

    h.publish("a.b").await;
    h.publish("c.d").await;
    h.drain().await;

    similar_asserts::assert_eq!(seen.all(), vec!["calm:a.b", "calm:c.d"]);

    let errors = h.sink.errors();
    assert_eq!(errors.len(), 2);
    for error in &errors {
        assert_eq!(
            error.cause,
            HandlerCause::Panicked("handler lost its mind".to_string())
        );
    }
}

#[tokio::test]
async fn one_error_per_failing_invocation() {
    let h = Harness::new();
    h.bus.subscribe("job.*", failing("f1")).unwrap();
    h.bus.subscribe("**", failing("f2")).unwrap();

    for _ in 0..3 {
        h.publish("job.run").await;
    }
    h.drain().await;

    assert_eq!(h.sink.errors().len(), 6);
    let metrics = h.bus.metrics();
    assert_eq!(metrics.handler_errors, 6);
    assert_eq!(metrics.delivered, 0);
}
