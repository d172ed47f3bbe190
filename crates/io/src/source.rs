//! JSON-lines transaction source.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use async_trait::async_trait;
use futures::stream;
use tokio::fs::File;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing::debug;

use unnest_core::error::{SourceError, SourceResult};
use unnest_core::models::Transaction;
use unnest_core::ports::{TransactionSource, TransactionStream};

/// Where transactions are read from.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Input {
    #[default]
    Stdin,
    File(PathBuf),
}

impl FromStr for Input {
    type Err = std::convert::Infallible;

    /// `-` means standard input.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "-" => Self::Stdin,
            path => Self::File(PathBuf::from(path)),
        })
    }
}

impl fmt::Display for Input {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stdin => f.write_str("stdin"),
            Self::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Reads one JSON-encoded [`Transaction`] per line.
///
/// Blank lines are ignored. A line that does not decode yields a
/// [`SourceError::Decode`] item carrying its 1-based line number, and
/// reading continues.
#[derive(Debug, Clone)]
pub struct JsonLinesSource {
    input: Input,
}

impl JsonLinesSource {
    pub fn new(input: Input) -> Self {
        Self { input }
    }
}

#[async_trait]
impl TransactionSource for JsonLinesSource {
    async fn open(&self) -> SourceResult<TransactionStream> {
        debug!(input = %self.input, "Opening transaction input");
        match &self.input {
            Input::Stdin => Ok(transaction_stream(BufReader::new(tokio::io::stdin()))),
            Input::File(path) => {
                let file = File::open(path).await?;
                Ok(transaction_stream(BufReader::new(file)))
            }
        }
    }

    fn describe(&self) -> String {
        self.input.to_string()
    }
}

/// Decode a JSON-lines reader into a transaction stream.
pub fn transaction_stream<R>(reader: R) -> TransactionStream
where
    R: AsyncBufRead + Unpin + Send + 'static,
{
    let lines = reader.lines();
    Box::pin(stream::unfold((lines, 0u64), |(mut lines, mut line)| async move {
        loop {
            line += 1;
            match lines.next_line().await {
                Ok(Some(text)) => {
                    let text = text.trim();
                    if text.is_empty() {
                        continue;
                    }
                    let item = serde_json::from_str::<Transaction>(text).map_err(|e| {
                        SourceError::Decode {
                            line,
                            message: e.to_string(),
                        }
                    });
                    return Some((item, (lines, line)));
                }
                Ok(None) => return None,
                Err(e) => return Some((Err(SourceError::Io(e)), (lines, line))),
            }
        }
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;
    use std::io::Cursor;

    fn line(index: u32) -> String {
        format!(
            r#"{{"block_number":7,"block_hash":"0x{}","index":{},"call":{{"module":"system","method":"remark","args":{{"remark":"0x00"}}}}}}"#,
            "22".repeat(32),
            index
        )
    }

    #[tokio::test]
    async fn test_reads_transactions_in_order() {
        let input = format!("{}\n\n{}\n", line(0), line(1));
        let items: Vec<_> = transaction_stream(Cursor::new(input)).collect().await;

        assert_eq!(items.len(), 2);
        let ids: Vec<String> = items
            .into_iter()
            .map(|item| item.unwrap().extrinsic_id())
            .collect();
        assert_eq!(ids, vec!["7-0", "7-1"]);
    }

    // Test critique: une ligne invalide n'interrompt pas la lecture
    #[tokio::test]
    async fn test_bad_line_is_reported_and_skipped() {
        let input = format!("{}\nnot json\n{}\n", line(0), line(2));
        let items: Vec<_> = transaction_stream(Cursor::new(input)).collect().await;

        assert_eq!(items.len(), 3);
        assert!(items[0].is_ok());
        assert!(matches!(items[1], Err(SourceError::Decode { line: 2, .. })));
        assert!(items[2].is_ok());
    }

    #[tokio::test]
    async fn test_missing_file() {
        let source = JsonLinesSource::new(Input::File("/nonexistent/unnest.jsonl".into()));
        assert!(matches!(source.open().await, Err(SourceError::Io(_))));
        assert_eq!(source.describe(), "/nonexistent/unnest.jsonl");
    }

    #[test]
    fn test_parse_input() {
        assert_eq!("-".parse::<Input>().unwrap(), Input::Stdin);
        assert_eq!(
            "txs.jsonl".parse::<Input>().unwrap(),
            Input::File(PathBuf::from("txs.jsonl"))
        );
        assert_eq!(Input::Stdin.to_string(), "stdin");
    }
}
