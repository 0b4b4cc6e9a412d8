use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader, Lines};
use tracing::{error, info, warn};

use crate::error::{PipelineError, Result};

/// A single line of producer input, once interpreted.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum Line {
    /// A value to feed into the pipeline.
    Value(i32),
    /// The empty line that ends the input.
    End,
}

/// Interpret one line of input.
///
/// Surrounding whitespace is ignored. A blank line marks the end of input.
///
/// # Errors
///
/// [PipelineError::MalformedInput] if the line is neither blank nor a 32-bit integer.
pub fn parse_line(line: &str) -> Result<Line> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(Line::End);
    }

    line.parse()
        .map(Line::Value)
        .map_err(|source| PipelineError::MalformedInput {
            line: line.to_string(),
            source,
        })
}

/// Reads integers line by line from an async reader.
///
/// Malformed lines are reported and skipped; they never end the input. The input ends at the first
/// blank line or at end of file.
///
/// # Examples
///
/// ```
/// use ring_pipes::LineSource;
///
/// #[tokio::main(flavor = "current_thread")]
/// async fn main() {
///     let mut source = LineSource::new("3\nthree\n-6\n\n9\n".as_bytes());
///
///     assert_eq!(source.next_value().await, Some(3));
///     assert_eq!(source.next_value().await, Some(-6));
///     assert_eq!(source.next_value().await, None);
///     assert_eq!(source.malformed(), 1);
/// }
/// ```
#[derive(Debug)]
pub struct LineSource<R> {
    lines: Lines<BufReader<R>>,
    malformed: usize,
    ended: bool,
}

impl<R: AsyncRead + Unpin> LineSource<R> {
    /// Create a source reading from `reader`.
    pub fn new(reader: R) -> Self {
        Self {
            lines: BufReader::new(reader).lines(),
            malformed: 0,
            ended: false,
        }
    }

    /// Read the next value, skipping malformed lines.
    ///
    /// Returns [None] once the input has ended, and keeps doing so afterwards.
    pub async fn next_value(&mut self) -> Option<i32> {
        while !self.ended {
            let line = match self.lines.next_line().await {
                Ok(Some(line)) => line,
                Ok(None) => {
                    info!("input reached end of file");
                    self.ended = true;
                    break;
                }
                Err(e) => {
                    error!(error = %e, "failed to read input");
                    self.ended = true;
                    break;
                }
            };

            match parse_line(&line) {
                Ok(Line::Value(value)) => return Some(value),
                Ok(Line::End) => {
                    info!("received empty line, ending input");
                    self.ended = true;
                }
                Err(e) => {
                    self.malformed += 1;
                    warn!(error = %e, "skipping malformed input");
                }
            }
        }
        None
    }

    /// Number of malformed lines skipped so far.
    pub fn malformed(&self) -> usize {
        self.malformed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_line_values() {
        assert_eq!(parse_line("42").unwrap(), Line::Value(42));
        assert_eq!(parse_line("  -7 \r").unwrap(), Line::Value(-7));
        assert_eq!(parse_line("+3").unwrap(), Line::Value(3));
        assert_eq!(parse_line("2147483647").unwrap(), Line::Value(i32::MAX));
    }

    #[test]
    fn test_parse_line_end() {
        assert_eq!(parse_line("").unwrap(), Line::End);
        assert_eq!(parse_line("   \t").unwrap(), Line::End);
    }

    #[test]
    fn test_parse_line_malformed() {
        for line in ["abc", "1.5", "2147483648", "1 2"] {
            let err = parse_line(line).unwrap_err();
            assert!(
                matches!(&err, PipelineError::MalformedInput { line: l, .. } if l == line),
                "unexpected error for {line:?}: {err}"
            );
        }
    }

    #[tokio::test]
    async fn test_source_skips_malformed_lines() {
        let mut source = LineSource::new("1\nx\n2\n99999999999\n3\n".as_bytes());

        assert_eq!(source.next_value().await, Some(1));
        assert_eq!(source.next_value().await, Some(2));
        assert_eq!(source.next_value().await, Some(3));
        assert_eq!(source.malformed(), 2);
    }

    #[tokio::test]
    async fn test_source_ends_at_blank_line() {
        let mut source = LineSource::new("5\n\n6\n".as_bytes());

        assert_eq!(source.next_value().await, Some(5));
        assert_eq!(source.next_value().await, None);
        // Nothing after the blank line is read
        assert_eq!(source.next_value().await, None);
    }

    #[tokio::test]
    async fn test_source_ends_at_eof() {
        let mut source = LineSource::new("8".as_bytes());

        assert_eq!(source.next_value().await, Some(8));
        assert_eq!(source.next_value().await, None);
    }
}
