//! Concurrent producers and readers against one engine.

use std::sync::Arc;
use std::thread;
use tokenmeter_aggregator::clock::ManualClock;
use tokenmeter_aggregator::config::EngineConfig;
use tokenmeter_aggregator::sink::{sample_value, PrometheusSink};
use tokenmeter_aggregator::AggregationEngine;
use tokenmeter_shared::utils::time::secs_to_nanos;

const THREADS: u64 = 8;
const CALLS_PER_THREAD: u64 = 50;
const PROMPT: u64 = 3;
const GENERATED: u64 = 7;

fn engine(config: &EngineConfig) -> (Arc<AggregationEngine>, Arc<PrometheusSink>) {
    let sink = Arc::new(PrometheusSink::new().expect("sink"));
    let engine = AggregationEngine::new(config, sink.clone())
        .expect("engine")
        .with_clock(Arc::new(ManualClock::new(secs_to_nanos(1_700_000_000))));
    (Arc::new(engine), sink)
}

#[test]
fn concurrent_ingest_loses_no_updates() {
    let (engine, sink) = engine(&EngineConfig::default());

    thread::scope(|s| {
        for _ in 0..THREADS {
            let engine = engine.clone();
            s.spawn(move || {
                for _ in 0..CALLS_PER_THREAD {
                    engine.record_inference("gpu-shared", "llama-7b", PROMPT, GENERATED, Some("A100"), None);
                }
            });
        }
        // Readers racing the producers must always see a consistent snapshot.
        let reader = engine.clone();
        s.spawn(move || {
            for _ in 0..200 {
                if let Some(snap) = reader.get_gpu_metrics("gpu-shared") {
                    assert_eq!(snap.tokens_total, snap.events_retained as u64 * (PROMPT + GENERATED));
                }
            }
        });
    });

    let calls = THREADS * CALLS_PER_THREAD;
    let labels = [("gpu_uuid", "gpu-shared"), ("model_id", "llama-7b")];
    assert_eq!(
        sample_value(sink.registry(), "tokens_prompt_total", &labels),
        Some((calls * PROMPT) as f64)
    );
    assert_eq!(
        sample_value(sink.registry(), "tokens_generated_total", &labels),
        Some((calls * GENERATED) as f64)
    );

    let snap = engine.get_gpu_metrics("gpu-shared").expect("recorded gpu");
    assert_eq!(snap.events_retained as u64, calls);
    assert_eq!(snap.tokens_total, calls * (PROMPT + GENERATED));
    // Every event shares one timestamp, so the rate is tokens over the 1s floor.
    assert_eq!(snap.current_tps, Some((calls * (PROMPT + GENERATED)) as f64));
    assert!(snap.cost_per_mtoken.is_some());
}

#[test]
fn concurrent_ingest_across_gpus_stays_bounded() {
    let config = EngineConfig {
        history_capacity: 64,
        ..EngineConfig::default()
    };
    let (engine, sink) = engine(&config);

    thread::scope(|s| {
        for t in 0..THREADS {
            let engine = engine.clone();
            s.spawn(move || {
                let gpu = format!("gpu-{}", t % 4);
                for _ in 0..CALLS_PER_THREAD {
                    engine.record_inference(&gpu, "gpt-3.5", PROMPT, GENERATED, None, None);
                }
            });
        }
    });

    let all = engine.get_all_gpu_metrics();
    assert_eq!(all.len(), 4);
    for snap in &all {
        assert_eq!(snap.events_retained, 64);
        let labels = [("gpu_uuid", snap.gpu_uuid.as_str())];
        // Two threads per GPU.
        assert_eq!(
            sample_value(sink.registry(), "tokens_prompt_total", &labels),
            Some((2 * CALLS_PER_THREAD * PROMPT) as f64)
        );
    }
    assert!(engine.get_gpu_metrics("gpu-9").is_none());
}
