use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering::{Acquire, Release};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tokio::time::{timeout, Instant};

use ring_pipes::{atomic_mut, Consumer, LineSource, Pipeline, PipelineBuilder, PipelineError};

const INTERVAL: Duration = Duration::from_secs(12);

/// Input is fed through a channel so tests decide when it ends: sending `None` ends it.
fn channel_producer(builder: PipelineBuilder) -> (PipelineBuilder, UnboundedSender<Option<i32>>) {
    let (input_tx, input_rx) = unbounded_channel::<Option<i32>>();
    let input_rx = atomic_mut(input_rx);

    let builder = builder.with_producer(move || {
        let input_rx = input_rx.clone();
        async move {
            let next = input_rx.lock().await.recv().await;
            next.flatten()
        }
    });
    (builder, input_tx)
}

fn channel_consumer(builder: PipelineBuilder) -> (PipelineBuilder, UnboundedReceiver<i32>) {
    let (output_tx, output_rx) = unbounded_channel();
    let builder = builder.with_consumer(move |value: i32| {
        let _ = output_tx.send(value);
    });
    (builder, output_rx)
}

async fn receive(output_rx: &mut UnboundedReceiver<i32>, n: usize) -> Vec<i32> {
    let mut values = Vec::with_capacity(n);
    while values.len() < n {
        values.push(output_rx.recv().await.expect("output closed early"));
    }
    values
}

/// Check the whole chain on mixed input.
///
/// Here's the effective layout:
///
///     producer -> negative-filter -> three-filter -> ring buffer -> consumer
///
#[tokio::test(start_paused = true)]
async fn survivors_are_flushed_in_order_after_drain_interval() {
    let builder = Pipeline::builder().with_drain_interval(INTERVAL);
    let (builder, input_tx) = channel_producer(builder);
    let (builder, mut output_rx) = channel_consumer(builder);
    let pipeline = builder.build().unwrap();

    let start = Instant::now();
    for value in [-1, 0, 3, 9, 4, -6, 15] {
        input_tx.send(Some(value)).unwrap();
    }

    assert_eq!(receive(&mut output_rx, 3).await, vec![3, 9, 15]);
    assert!(start.elapsed() >= INTERVAL, "flushed before the drain interval");

    input_tx.send(None).unwrap();
    pipeline.wait().await;

    assert_eq!(output_rx.recv().await, None, "consumer was not shut down");
}

#[tokio::test(start_paused = true)]
async fn only_the_newest_values_survive_a_full_buffer() {
    let builder = Pipeline::builder().with_capacity(3);
    let (builder, input_tx) = channel_producer(builder);
    let (builder, mut output_rx) = channel_consumer(builder);
    let pipeline = builder.build().unwrap();

    for value in [3, 6, 9, 12, 15] {
        input_tx.send(Some(value)).unwrap();
    }

    assert_eq!(receive(&mut output_rx, 3).await, vec![9, 12, 15]);

    input_tx.send(None).unwrap();
    pipeline.wait().await;
}

#[tokio::test(start_paused = true)]
async fn values_keep_flowing_across_several_flushes() {
    let builder = Pipeline::builder().with_pipe_capacity(4);
    let (builder, input_tx) = channel_producer(builder);
    let (builder, mut output_rx) = channel_consumer(builder);
    let pipeline = builder.build().unwrap();

    for batch in [vec![1, 3, 5], vec![-3, 6], vec![7, 8], vec![9, 0, 12]] {
        let expected: Vec<i32> = batch
            .iter()
            .copied()
            .filter(|v| *v > 0 && v % 3 == 0)
            .collect();
        for value in batch {
            input_tx.send(Some(value)).unwrap();
        }

        if expected.is_empty() {
            // Let a drain pass with nothing to flush
            tokio::time::sleep(INTERVAL).await;
        } else {
            assert_eq!(receive(&mut output_rx, expected.len()).await, expected);
        }
    }

    input_tx.send(None).unwrap();
    pipeline.wait().await;
    assert_eq!(output_rx.recv().await, None);
}

#[tokio::test(start_paused = true)]
async fn end_of_input_drops_unflushed_values() {
    let builder = Pipeline::builder();
    let (builder, input_tx) = channel_producer(builder);
    let (builder, mut output_rx) = channel_consumer(builder);
    let pipeline = builder.build().unwrap();

    for value in [3, 6, 9] {
        input_tx.send(Some(value)).unwrap();
    }
    input_tx.send(None).unwrap();

    timeout(INTERVAL / 2, pipeline.wait())
        .await
        .expect("pipeline did not shut down at end of input");
    assert_eq!(output_rx.recv().await, None);
}

#[tokio::test]
async fn consumer_is_notified_when_pipeline_ends() {
    struct Finished(Arc<AtomicBool>);

    impl Consumer for Finished {
        fn consume(&mut self, _: i32) {}

        fn finish(&mut self) {
            self.0.store(true, Release);
        }
    }

    let finished = Arc::new(AtomicBool::new(false));
    let mut remaining = 3;

    Pipeline::builder()
        .with_producer(move || {
            remaining -= 1;
            let value = (remaining > 0).then_some(remaining * 3);
            async move { value }
        })
        .with_consumer(Finished(finished.clone()))
        .build()
        .unwrap()
        .wait()
        .await;

    assert!(finished.load(Acquire), "consumer was not told the input ended");
}

#[tokio::test(start_paused = true)]
async fn line_source_feeds_the_pipeline() {
    // Malformed lines are skipped; the pipeline ends at the blank line
    let source = atomic_mut(LineSource::new("-3\nabc\n3\n4.5\n27\n".as_bytes()));
    let (gate_tx, gate_rx) = unbounded_channel::<()>();
    let gate_rx = atomic_mut(gate_rx);

    let builder = Pipeline::builder().with_producer(move || {
        let source = source.clone();
        let gate_rx = gate_rx.clone();
        async move {
            let next = source.lock().await.next_value().await;
            if next.is_none() {
                // Hold the end of input back until the test has seen the flush
                gate_rx.lock().await.recv().await;
            }
            next
        }
    });
    let (builder, mut output_rx) = channel_consumer(builder);
    let pipeline = builder.build().unwrap();

    assert_eq!(receive(&mut output_rx, 2).await, vec![3, 27]);

    gate_tx.send(()).unwrap();
    pipeline.wait().await;
}

#[tokio::test]
async fn build_reports_missing_stages() {
    let no_producer = Pipeline::builder().with_consumer(|_: i32| {}).build();
    assert!(matches!(no_producer, Err(PipelineError::NoProducer)));

    let no_consumer = Pipeline::builder().with_producer(|| async { None }).build();
    assert!(matches!(no_consumer, Err(PipelineError::NoConsumer)));
}

#[tokio::test]
async fn build_reports_invalid_configuration() {
    let result = Pipeline::builder()
        .with_drain_interval(Duration::ZERO)
        .with_producer(|| async { None })
        .with_consumer(|_: i32| {})
        .build();

    let err = result.unwrap_err();
    assert!(matches!(err, PipelineError::Config(_)));
    assert_eq!(
        err.to_string(),
        "configuration error: drain interval must be greater than zero"
    );
}
