use tokio::select;
use tokio::sync::mpsc::{channel, Receiver, Sender};

use crate::error::{PipelineError, Result};
use crate::sync::TerminateSignal;

/// Create both ends of a new pipe.
///
/// The pipe is identified by `name` plus a random suffix so that logs from concurrent pipelines
/// can be told apart. At most `capacity` values can be in flight before writers wait.
pub(crate) fn pipe(name: &str, capacity: usize) -> (PipeWriter, PipeReader) {
    let pipe_id = format!("{}-{}", name, uuid::Uuid::new_v4());
    let (tx, rx) = channel(capacity);
    (
        PipeWriter {
            pipe_id: pipe_id.clone(),
            tx,
        },
        PipeReader { pipe_id, rx },
    )
}

/// Defines an end to a pipe that allows values to be received from.
#[derive(Debug)]
pub(crate) struct PipeReader {
    pipe_id: String,
    rx: Receiver<i32>,
}

impl PipeReader {
    pub(crate) fn get_pipe_id(&self) -> &str {
        &self.pipe_id
    }

    /// Receive the next value, or [None] once every writer is gone and the pipe is empty.
    pub(crate) async fn read(&mut self) -> Option<i32> {
        self.rx.recv().await
    }
}

/// Defines an end to a pipe that allows values to be sent through.
///
/// The pipe closes when the writer is dropped.
#[derive(Debug)]
pub(crate) struct PipeWriter {
    pipe_id: String,
    tx: Sender<i32>,
}

impl PipeWriter {
    pub(crate) fn get_pipe_id(&self) -> &str {
        &self.pipe_id
    }

    /// Send a value through the pipe unless termination is observed first.
    ///
    /// A send that is waiting for room in the pipe is abandoned as soon as `signal` fires, and
    /// termination wins if both are ready.
    ///
    /// # Errors
    ///
    /// * [PipelineError::Terminated] if termination was observed before the value was sent.
    /// * [PipelineError::PipeClosed] if the reading end is gone.
    pub(crate) async fn write(&self, value: i32, signal: &mut TerminateSignal) -> Result<()> {
        select! {
            biased;

            _ = signal.terminated() => Err(PipelineError::Terminated),
            sent = self.tx.send(value) => {
                sent.map_err(|_| PipelineError::PipeClosed(self.pipe_id.clone()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::time::timeout;

    use super::*;
    use crate::sync::Terminate;

    #[test]
    fn test_pipe_ids_are_unique_per_pipe() {
        let (w1, r1) = pipe("numbers", 1);
        let (w2, _r2) = pipe("numbers", 1);

        assert_eq!(w1.get_pipe_id(), r1.get_pipe_id());
        assert!(w1.get_pipe_id().starts_with("numbers-"));
        assert_ne!(w1.get_pipe_id(), w2.get_pipe_id());
    }

    #[tokio::test]
    async fn test_write_then_read_preserves_order() {
        let terminate = Terminate::new();
        let mut signal = terminate.subscribe();
        let (writer, mut reader) = pipe("pipe", 4);

        for value in [3, 1, 2] {
            writer.write(value, &mut signal).await.unwrap();
        }
        drop(writer);

        assert_eq!(reader.read().await, Some(3));
        assert_eq!(reader.read().await, Some(1));
        assert_eq!(reader.read().await, Some(2));
        assert_eq!(reader.read().await, None);
    }

    #[tokio::test]
    async fn test_write_to_closed_pipe_fails() {
        let terminate = Terminate::new();
        let mut signal = terminate.subscribe();
        let (writer, reader) = pipe("pipe", 1);
        drop(reader);

        let result = writer.write(1, &mut signal).await;
        assert!(matches!(result, Err(PipelineError::PipeClosed(id)) if id.starts_with("pipe-")));
    }

    #[tokio::test]
    async fn test_write_after_termination_is_not_sent() {
        let terminate = Terminate::new();
        let mut signal = terminate.subscribe();
        let (writer, mut reader) = pipe("pipe", 1);

        terminate.trigger();
        let result = writer.write(1, &mut signal).await;
        drop(writer);

        assert!(matches!(result, Err(PipelineError::Terminated)));
        assert_eq!(reader.read().await, None);
    }

    #[tokio::test]
    async fn test_blocked_write_is_abandoned_on_termination() {
        let terminate = Terminate::new();
        let mut signal = terminate.subscribe();
        let (writer, mut reader) = pipe("pipe", 1);

        writer.write(1, &mut signal).await.unwrap();

        let blocked = tokio::spawn(async move {
            let result = writer.write(2, &mut signal).await;
            (writer, result)
        });
        tokio::task::yield_now().await;
        terminate.trigger();

        let (writer, result) = timeout(Duration::from_secs(1), blocked)
            .await
            .expect("blocked write did not observe termination")
            .unwrap();
        drop(writer);

        assert!(matches!(result, Err(PipelineError::Terminated)));
        assert_eq!(reader.read().await, Some(1));
        assert_eq!(reader.read().await, None);
    }
}
