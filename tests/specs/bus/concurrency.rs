//! Concurrent publisher specs
//!
//! Many producers on a multi-threaded runtime; nothing is lost or
//! delivered twice.

use crate::prelude::*;
use std::collections::BTreeSet;

const PRODUCERS: u64 = 8;
const PER_PRODUCER: u64 = 250;

async fn publish_from_many_tasks(workers: usize) {
    let h = Harness::with_config(BusConfig {
        capacity: 64,
        workers,
        backpressure: BackpressurePolicy::Block,
        block_timeout: Duration::from_secs(10),
        ..BusConfig::default()
    });

    let received = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&received);
    h.bus
        .subscribe(
            "load.*",
            handler_fn("counter", move |env: Arc<Envelope<Value>>| {
                let sink = Arc::clone(&sink);
                async move {
                    let producer = env.payload()["producer"].as_u64().unwrap_or(u64::MAX);
                    let seq = env.payload()["seq"].as_u64().unwrap_or(u64::MAX);
                    sink.lock().unwrap().push((producer, seq));
                    HandlerResult::Ok(())
                }
            }),
        )
        .unwrap();

    let producers: Vec<_> = (0..PRODUCERS)
        .map(|producer| {
            let bus = h.bus.clone();
            tokio::spawn(async move {
                for seq in 0..PER_PRODUCER {
                    let env = Envelope::new(
                        "load.tick",
                        format!("producer-{producer}"),
                        json!({ "producer": producer, "seq": seq }),
                    )
                    .unwrap();
                    bus.publish(env).await.unwrap();
                }
            })
        })
        .collect();
    for producer in producers {
        producer.await.unwrap();
    }

    let report = h.bus.shutdown(Duration::from_secs(10)).await.unwrap();
    assert!(report.drained);
    assert_eq!(report.undelivered, 0);

    let total = PRODUCERS * PER_PRODUCER;
    let received = received.lock().unwrap().clone();
    assert_eq!(received.len() as u64, total);
    let distinct: BTreeSet<_> = received.iter().copied().collect();
    assert_eq!(distinct.len() as u64, total);

    let metrics = h.bus.metrics();
    assert_eq!(metrics.published, total);
    assert_eq!(metrics.delivered, total);
    assert_eq!(metrics.dropped, 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_publishers_single_worker() {
    publish_from_many_tasks(1).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_publishers_two_workers() {
    publish_from_many_tasks(2).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn single_worker_keeps_each_producers_order() {
    let h = Harness::new();
    let seen = Deliveries::new();
    h.bus.subscribe("**", seen.handler("ordered")).unwrap();

    let producers: Vec<_> = ["left", "right"]
        .into_iter()
        .map(|side| {
            let bus = h.bus.clone();
            tokio::spawn(async move {
                for i in 0..50 {
                    bus.publish(envelope(&format!("{side}.item{i}"))).await.unwrap();
                }
            })
        })
        .collect();
    for producer in producers {
        producer.await.unwrap();
    }
    h.drain().await;

    for side in ["left", "right"] {
        let prefix = format!("ordered:{side}.");
        let order: Vec<String> = seen
            .all()
            .into_iter()
            .filter(|d| d.starts_with(&prefix))
            .collect();
        let expected: Vec<String> = (0..50).map(|i| format!("{prefix}item{i}")).collect();
        similar_asserts::assert_eq!(order, expected);
    }
}
