//!
//! Ring Pipes runs a stream of integers through a fixed chain of concurrent stages:
//!
//! 1. a filter dropping negative values,
//! 2. a filter dropping zero and anything that is not a multiple of 3,
//! 3. a bounded [RingBuffer] that keeps the newest values and is flushed on a timer,
//! 4. a [Consumer] receiving every flushed value.
//!
//! Every stage runs in its own task and all of them share one termination signal, which the
//! producer triggers when its input ends.
//!
//! ```
//! use std::time::Duration;
//! use tokio::sync::mpsc::unbounded_channel;
//! use ring_pipes::{atomic_mut, Pipeline};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() {
//!     // Skip through the 12 second drain interval instead of waiting for it
//!     tokio::time::pause();
//!
//!     // Values typed by a user, `None` standing for the empty line that ends the input.
//!     let (input_tx, input_rx) = unbounded_channel::<Option<i32>>();
//!     let input_rx = atomic_mut(input_rx);
//!     let (output_tx, mut output_rx) = unbounded_channel();
//!
//!     let pipeline = Pipeline::builder()
//!         .with_capacity(10)
//!         .with_drain_interval(Duration::from_secs(12))
//!         .with_producer(move || {
//!             let input_rx = input_rx.clone();
//!             async move {
//!                 let next = input_rx.lock().await.recv().await;
//!                 next.flatten()
//!             }
//!         })
//!         .with_consumer(move |value: i32| {
//!             let _ = output_tx.send(value);
//!         })
//!         .build()
//!         .expect("failed to build pipeline");
//!
//!     for value in [-1, 0, 3, 9, 4, -6, 15] {
//!         input_tx.send(Some(value)).unwrap();
//!     }
//!
//!     // The survivors come out together once the drain interval has passed
//!     assert_eq!(output_rx.recv().await, Some(3));
//!     assert_eq!(output_rx.recv().await, Some(9));
//!     assert_eq!(output_rx.recv().await, Some(15));
//!
//!     input_tx.send(None).unwrap();
//!     pipeline.wait().await;
//! }
//! ```
//!
#![warn(missing_docs)]

pub use error::{PipelineError, Result};
pub use filter::{Filter, MultipleOfThreeFilter, NegativeFilter, Rejection, Verdict};
pub use pipeline::*;
pub use ring::RingBuffer;
pub use sink::{Consumer, LineSink};
pub use source::{parse_line, Line, LineSource};
pub use sync::{Terminate, TerminateSignal};
pub use util::*;

mod error;
mod filter;
mod io;
mod pipeline;
mod ring;
mod sink;
mod source;
mod sync;
mod util;
