use std::sync::Arc;
use std::time::Duration;

use itertools::Itertools;
use tokio::select;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info, trace};

use crate::filter::{Filter, Verdict};
use crate::io::{PipeReader, PipeWriter};
use crate::pipeline::ProducerFn;
use crate::ring::RingBuffer;
use crate::sink::Consumer;
use crate::sync::{Terminate, TerminateSignal};
use crate::PipelineError;

/// Create a new worker that produces values until there are no more to produce.
///
/// The producer owns the pipeline's only [Terminate]: once the input ends (or the first pipe is
/// closed) the pipe is closed and every other stage is told to terminate.
pub(crate) async fn new_detached_producer(
    mut producer: ProducerFn,
    writer: PipeWriter,
    terminate: Terminate,
) {
    let mut signal = terminate.subscribe();
    info!(pipe = writer.get_pipe_id(), "producer started");

    while let Some(value) = (*producer)().await {
        trace!(value, "produced");
        if let Err(e) = writer.write(value, &mut signal).await {
            debug!(error = %e, "producer stopped forwarding");
            break;
        }
    }

    drop(writer);
    info!("end of input, terminating pipeline");
    terminate.trigger();
}

/// Create a new worker that forwards the values accepted by `filter`.
///
/// The worker ends when termination is observed or its input is closed, and its output is
/// closed exactly once, when the worker ends.
pub(crate) async fn new_detached_filter(
    filter: Box<dyn Filter>,
    mut reader: PipeReader,
    writer: PipeWriter,
    mut signal: TerminateSignal,
) {
    let stage = filter.name();
    info!(
        stage,
        input = reader.get_pipe_id(),
        output = writer.get_pipe_id(),
        "filter started"
    );

    loop {
        select! {
            biased;

            _ = signal.terminated() => {
                debug!(stage, "termination observed");
                break;
            }

            value = reader.read() => {
                let Some(value) = value else {
                    debug!(stage, "input closed");
                    break;
                };

                match filter.verdict(value) {
                    Verdict::Pass => {
                        trace!(stage, value, "passed");
                        if let Err(e) = writer.write(value, &mut signal).await {
                            debug!(stage, value, error = %e, "dropped in-flight value");
                            break;
                        }
                    }
                    Verdict::Reject(reason) => {
                        info!(stage, value, %reason, "value rejected");
                    }
                }
            }
        }
    }
}

/// Create a new worker that pushes every value it reads into `buffer`.
///
/// This is the ingesting half of the buffering stage; see [new_detached_drainer] for the other.
pub(crate) async fn new_detached_ingester(
    buffer: Arc<RingBuffer>,
    mut reader: PipeReader,
    mut signal: TerminateSignal,
) {
    info!(
        input = reader.get_pipe_id(),
        capacity = buffer.capacity(),
        "ingester started"
    );

    loop {
        select! {
            biased;

            _ = signal.terminated() => {
                debug!("termination observed");
                break;
            }

            value = reader.read() => match value {
                Some(value) => {
                    trace!(value, "buffered");
                    buffer.push(value);
                }
                None => {
                    debug!("input closed");
                    break;
                }
            },
        }
    }
}

/// Create a new worker that empties `buffer` every `interval` and forwards what it held.
///
/// This is the draining half of the buffering stage. It runs until termination is observed or
/// the output is closed, and closes its output when it ends so the consumer can finish.
pub(crate) async fn new_detached_drainer(
    buffer: Arc<RingBuffer>,
    interval: Duration,
    writer: PipeWriter,
    mut signal: TerminateSignal,
) {
    info!(output = writer.get_pipe_id(), ?interval, "drainer started");

    let mut ticker = interval_at(Instant::now() + interval, interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        select! {
            biased;

            _ = signal.terminated() => {
                debug!("termination observed");
                break;
            }

            _ = ticker.tick() => {
                let Some(values) = buffer.drain() else {
                    trace!("nothing to drain");
                    continue;
                };
                debug!(count = values.len(), values = %values.iter().join(" "), "drained buffer");

                for value in values {
                    match writer.write(value, &mut signal).await {
                        Ok(()) => {}
                        Err(PipelineError::Terminated) => {
                            debug!(value, "termination observed mid-flush");
                            return;
                        }
                        Err(e) => {
                            debug!(error = %e, "output closed");
                            return;
                        }
                    }
                }
            }
        }
    }
}

/// Create a new worker that hands every value it reads to `consumer`.
///
/// [Consumer::finish] is called once the input is closed.
pub(crate) async fn new_detached_consumer(mut consumer: Box<dyn Consumer>, mut reader: PipeReader) {
    info!(input = reader.get_pipe_id(), "consumer started");

    while let Some(value) = reader.read().await {
        consumer.consume(value);
    }

    debug!("input closed");
    consumer.finish();
}

/// Create a new worker that resolves once the pipeline is told to terminate.
pub(crate) async fn new_detached_waiter(mut signal: TerminateSignal) {
    signal.terminated().await;
    info!("shutdown requested");
}
