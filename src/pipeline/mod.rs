use std::future::Future;
use std::panic;
use std::pin::Pin;

use tokio::select;
use tokio::task::{JoinError, JoinHandle, JoinSet};

pub use builder::*;

mod builder;
mod workers;

type ProducerFuture = Pin<Box<dyn Future<Output = Option<i32>> + Send + 'static>>;
type ProducerFn = Box<dyn FnMut() -> ProducerFuture + Send + 'static>;

/// Box a user-provided producer so it can be stored next to the other stages.
fn boxed_producer<F, Fut>(mut task: F) -> ProducerFn
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = Option<i32>> + Send + 'static,
{
    Box::new(move || Box::pin(task()))
}

/// A running pipeline of integer stages.
///
/// Values flow like this, each arrow being a pipe and each stage running in its own task:
///
/// ```text
/// producer -> negative-filter -> three-filter -> ingester ~> ring buffer ~> drainer -> consumer
/// ```
///
/// The ingester and the drainer share the ring buffer; the drainer empties it once per drain
/// interval. The producer is the only stage that can end the pipeline: when it runs out of input,
/// it closes its pipe and triggers the termination signal shared by all the other stages. Values
/// still sitting in the ring buffer at that point are dropped.
///
/// # Examples
///
/// ```
/// use std::sync::{Arc, Mutex};
/// use std::time::Duration;
/// use ring_pipes::{atomic_mut, Pipeline};
///
/// #[tokio::main(flavor = "current_thread")]
/// async fn main() {
///     let inputs = atomic_mut(vec![-1, 0, 3, 9, 4, -6, 15].into_iter());
///     let received = Arc::new(Mutex::new(Vec::new()));
///     let task_received = received.clone();
///
///     Pipeline::builder()
///         .with_drain_interval(Duration::from_millis(10))
///         .with_producer(move || {
///             let inputs = inputs.clone();
///             async move {
///                 let next = inputs.lock().await.next();
///                 if next.is_none() {
///                     // Leave time for one flush before ending the input
///                     tokio::time::sleep(Duration::from_millis(50)).await;
///                 }
///                 next
///             }
///         })
///         .with_consumer(move |value: i32| task_received.lock().unwrap().push(value))
///         .build()
///         .expect("failed to build pipeline")
///         .wait()
///         .await;
///
///     assert_eq!(*received.lock().unwrap(), vec![3, 9, 15]);
/// }
/// ```
#[derive(Debug)]
pub struct Pipeline {
    waiter: JoinHandle<()>,
    workers: JoinSet<()>,
}

impl Pipeline {
    /// Create a new pipeline builder.
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::default()
    }

    /// Wait for the pipeline to shut down.
    ///
    /// This first waits until the termination signal fires, which happens once the producer runs
    /// out of input, and then for every stage to unwind. Once terminated, no stage waits on
    /// anything but the termination signal, so the second step is short.
    ///
    /// If a stage panics, the panic is resumed here as soon as it happens, even if the input has
    /// not ended yet.
    pub async fn wait(mut self) {
        loop {
            select! {
                result = &mut self.waiter => {
                    check_join_result(result);
                    break;
                }
                Some(result) = self.workers.join_next() => check_join_result(result),
            }
        }

        while let Some(result) = self.workers.join_next().await {
            check_join_result(result);
        }
    }
}

fn check_join_result<T>(result: Result<T, JoinError>) {
    if let Err(e) = result {
        if e.is_panic() {
            panic::resume_unwind(e.into_panic())
        }
    }
}
