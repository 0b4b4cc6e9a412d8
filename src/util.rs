use std::sync::Arc;
use tokio::sync::Mutex;

/// Less-verbose way to create an [`Arc<Mutex<T>>`] instance.
///
/// This is useful for giving state to a producer registered with
/// [crate::PipelineBuilder::with_producer]: the producer is called once per value, and every
/// future it returns must own what it uses, so the state is shared through the [Arc] and locked
/// for the duration of each call.
///
/// # Examples
///
/// ```
/// use ring_pipes::atomic_mut;
///
/// #[tokio::main(flavor = "current_thread")]
/// async fn main() {
///     let remaining = atomic_mut(vec![3, 2, 1]);
///     let mut producer = move || {
///         let remaining = remaining.clone();
///         async move {
///             let mut remaining = remaining.lock().await;
///             remaining.pop()
///         }
///     };
///
///     assert_eq!(producer().await, Some(1));
///     assert_eq!(producer().await, Some(2));
/// }
/// ```
pub fn atomic_mut<T>(initial_value: T) -> Arc<Mutex<T>> {
    Arc::new(Mutex::new(initial_value))
}
