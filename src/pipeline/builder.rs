use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinSet;
use tracing::{info, info_span, Instrument};

use crate::error::{PipelineError, Result};
use crate::filter::{Filter, MultipleOfThreeFilter, NegativeFilter};
use crate::io::pipe;
use crate::pipeline::workers::{
    new_detached_consumer, new_detached_drainer, new_detached_filter, new_detached_ingester,
    new_detached_producer, new_detached_waiter,
};
use crate::pipeline::*;
use crate::ring::RingBuffer;
use crate::sink::Consumer;
use crate::sync::Terminate;

/// Ring buffer capacity used unless configured otherwise.
pub const DEFAULT_CAPACITY: usize = 10;

/// Time between two drains of the ring buffer, unless configured otherwise.
pub const DEFAULT_DRAIN_INTERVAL: Duration = Duration::from_secs(12);

/// Number of values a pipe holds before its writer waits, unless configured otherwise.
pub const DEFAULT_PIPE_CAPACITY: usize = 1;

/// Largest accepted ring buffer capacity.
pub const MAX_CAPACITY: usize = 1 << 20;

/// Largest accepted time between two drains of the ring buffer (one year).
pub const MAX_DRAIN_INTERVAL: Duration = Duration::from_secs(365 * 24 * 60 * 60);

/// Largest accepted number of values held by a pipe.
pub const MAX_PIPE_CAPACITY: usize = 1 << 16;

/// Fixed parameters of a pipeline, set before it is built.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct PipelineConfig {
    /// Maximum number of values held by the ring buffer before the oldest is evicted.
    pub capacity: usize,
    /// Time between two drains of the ring buffer.
    pub drain_interval: Duration,
    /// Number of values each pipe between two stages can hold.
    pub pipe_capacity: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            drain_interval: DEFAULT_DRAIN_INTERVAL,
            pipe_capacity: DEFAULT_PIPE_CAPACITY,
        }
    }
}

impl PipelineConfig {
    /// Check that every value is usable.
    ///
    /// # Errors
    ///
    /// [PipelineError::Config] if any of the values is zero or above its maximum
    /// ([MAX_CAPACITY], [MAX_DRAIN_INTERVAL], [MAX_PIPE_CAPACITY]).
    pub fn validate(&self) -> Result<()> {
        if self.capacity == 0 {
            return Err(PipelineError::Config(
                "ring buffer capacity must be greater than zero".to_string(),
            ));
        }
        if self.capacity > MAX_CAPACITY {
            return Err(PipelineError::Config(format!(
                "ring buffer capacity must be at most {MAX_CAPACITY}"
            )));
        }
        if self.drain_interval.is_zero() {
            return Err(PipelineError::Config(
                "drain interval must be greater than zero".to_string(),
            ));
        }
        if self.drain_interval > MAX_DRAIN_INTERVAL {
            return Err(PipelineError::Config(format!(
                "drain interval must be at most {}s",
                MAX_DRAIN_INTERVAL.as_secs()
            )));
        }
        if self.pipe_capacity == 0 {
            return Err(PipelineError::Config(
                "pipe capacity must be greater than zero".to_string(),
            ));
        }
        if self.pipe_capacity > MAX_PIPE_CAPACITY {
            return Err(PipelineError::Config(format!(
                "pipe capacity must be at most {MAX_PIPE_CAPACITY}"
            )));
        }
        Ok(())
    }
}

/// Used to construct a [Pipeline].
///
/// Can be created using [Pipeline::builder].
#[derive(Default)]
pub struct PipelineBuilder {
    config: PipelineConfig,
    producer: Option<ProducerFn>,
    consumer: Option<Box<dyn Consumer>>,
}

impl PipelineBuilder {
    /// Replace the whole configuration.
    pub fn with_config(mut self, config: PipelineConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the maximum number of values the ring buffer holds.
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.config.capacity = capacity;
        self
    }

    /// Set the time between two drains of the ring buffer.
    pub fn with_drain_interval(mut self, interval: Duration) -> Self {
        self.config.drain_interval = interval;
        self
    }

    /// Set how many values each pipe between two stages can hold.
    pub fn with_pipe_capacity(mut self, capacity: usize) -> Self {
        self.config.pipe_capacity = capacity;
        self
    }

    /// Register the stage that feeds values into the pipeline.
    ///
    /// The task function is called for every value. The pipeline keeps going while it returns
    /// [Some], so a producer that never returns [None] keeps the pipeline alive forever. Returning
    /// [None] means the input has ended and shuts the whole pipeline down.
    ///
    /// Registering a second producer replaces the first.
    pub fn with_producer<F, Fut>(mut self, task: F) -> Self
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = Option<i32>> + Send + 'static,
    {
        self.producer = Some(boxed_producer(task));
        self
    }

    /// Register the stage that receives the values flushed out of the ring buffer.
    ///
    /// Registering a second consumer replaces the first.
    pub fn with_consumer(mut self, consumer: impl Consumer) -> Self {
        self.consumer = Some(Box::new(consumer));
        self
    }

    /// Start every stage and return the running pipeline.
    ///
    /// This spawns the stage tasks, so it must be called from within a tokio runtime.
    ///
    /// # Errors
    ///
    /// 1. No producer or no consumer was registered.
    /// 2. The configuration is invalid, see [PipelineConfig::validate].
    pub fn build(self) -> Result<Pipeline> {
        let producer = self.producer.ok_or(PipelineError::NoProducer)?;
        let consumer = self.consumer.ok_or(PipelineError::NoConsumer)?;
        let config = self.config;
        config.validate()?;

        info!(
            capacity = config.capacity,
            drain_interval = ?config.drain_interval,
            pipe_capacity = config.pipe_capacity,
            "starting pipeline"
        );

        let terminate = Terminate::new();
        let mut workers = JoinSet::new();

        let (source_w, mut upstream) = pipe("source", config.pipe_capacity);

        let filters: [Box<dyn Filter>; 2] =
            [Box::new(NegativeFilter), Box::new(MultipleOfThreeFilter)];
        for filter in filters {
            let name = filter.name();
            let (writer, reader) = pipe(name, config.pipe_capacity);
            workers.spawn(
                new_detached_filter(filter, upstream, writer, terminate.subscribe())
                    .instrument(info_span!("filter", stage = name)),
            );
            upstream = reader;
        }

        let buffer = Arc::new(RingBuffer::new(config.capacity));
        let (flushed_w, flushed_r) = pipe("flushed", config.pipe_capacity);
        workers.spawn(
            new_detached_ingester(buffer.clone(), upstream, terminate.subscribe())
                .instrument(info_span!("ingester")),
        );
        workers.spawn(
            new_detached_drainer(
                buffer,
                config.drain_interval,
                flushed_w,
                terminate.subscribe(),
            )
            .instrument(info_span!("drainer")),
        );
        workers.spawn(
            new_detached_consumer(consumer, flushed_r).instrument(info_span!("consumer")),
        );

        let waiter = tokio::spawn(
            new_detached_waiter(terminate.subscribe()).instrument(info_span!("waiter")),
        );

        // The producer takes the trigger, so it is spawned last.
        workers.spawn(
            new_detached_producer(producer, source_w, terminate).instrument(info_span!("producer")),
        );

        Ok(Pipeline { waiter, workers })
    }
}
