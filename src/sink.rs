use std::io::Write;

use tracing::warn;

/// Receives the values that come out of the end of a pipeline.
///
/// [Consumer::consume] is called once per value, in the order the values were flushed from the
/// ring buffer. [Consumer::finish] is called once after the last value, when the pipeline has shut
/// down.
///
/// Any `FnMut(i32)` closure is a consumer.
pub trait Consumer: Send + 'static {
    /// Handle one value.
    fn consume(&mut self, value: i32);

    /// Called when no more values will arrive.
    fn finish(&mut self) {}
}

impl<F> Consumer for F
where
    F: FnMut(i32) + Send + 'static,
{
    fn consume(&mut self, value: i32) {
        self(value)
    }
}

/// A consumer that writes each value on its own line.
#[derive(Debug)]
pub struct LineSink<W> {
    writer: W,
}

impl<W: Write + Send + 'static> LineSink<W> {
    /// Create a sink writing to `writer`.
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Take back the inner writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write + Send + 'static> Consumer for LineSink<W> {
    fn consume(&mut self, value: i32) {
        if let Err(e) = writeln!(self.writer, "{value}").and_then(|_| self.writer.flush()) {
            warn!(error = %e, value, "failed to write value");
        }
    }

    fn finish(&mut self) {
        if let Err(e) = self.writer.flush() {
            warn!(error = %e, "failed to flush output");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_sink_writes_one_value_per_line() {
        let mut sink = LineSink::new(Vec::new());
        sink.consume(3);
        sink.consume(-9);
        sink.finish();

        assert_eq!(String::from_utf8(sink.into_inner()).unwrap(), "3\n-9\n");
    }

    #[test]
    fn test_closure_is_a_consumer() {
        let (tx, rx) = std::sync::mpsc::channel();
        let mut consumer = move |value: i32| tx.send(value).unwrap();
        consumer.consume(1);
        consumer.consume(2);
        consumer.finish();
        drop(consumer);

        assert_eq!(rx.iter().collect::<Vec<_>>(), vec![1, 2]);
    }
}
