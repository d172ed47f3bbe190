//! JSON-lines call record sink.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use async_trait::async_trait;
use tokio::fs::File;
use tokio::io::{AsyncWrite, AsyncWriteExt, BufWriter};
use tokio::sync::Mutex;
use tracing::trace;

use unnest_core::error::{SinkError, SinkResult};
use unnest_core::models::CallRecord;
use unnest_core::ports::CallSink;

/// Where call records are written.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Output {
    #[default]
    Stdout,
    File(PathBuf),
}

impl FromStr for Output {
    type Err = std::convert::Infallible;

    /// `-` means standard output.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "-" => Self::Stdout,
            path => Self::File(PathBuf::from(path)),
        })
    }
}

impl fmt::Display for Output {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stdout => f.write_str("stdout"),
            Self::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Boxed writer used when the output is chosen at runtime.
pub type DynWriter = Box<dyn AsyncWrite + Unpin + Send>;

/// Writes one JSON-encoded [`CallRecord`] per line.
pub struct JsonLinesSink<W: AsyncWrite + Unpin + Send> {
    writer: Mutex<BufWriter<W>>,
}

impl<W: AsyncWrite + Unpin + Send> JsonLinesSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(BufWriter::new(writer)),
        }
    }

    /// Flush and return the underlying writer.
    pub async fn into_inner(self) -> SinkResult<W> {
        let mut writer = self.writer.into_inner();
        writer.flush().await?;
        Ok(writer.into_inner())
    }
}

impl JsonLinesSink<DynWriter> {
    /// Open `output`, truncating an existing file.
    pub async fn open(output: &Output) -> SinkResult<Self> {
        let writer: DynWriter = match output {
            Output::Stdout => Box::new(tokio::io::stdout()),
            Output::File(path) => Box::new(File::create(path).await?),
        };
        Ok(Self::new(writer))
    }
}

#[async_trait]
impl<W: AsyncWrite + Unpin + Send> CallSink for JsonLinesSink<W> {
    async fn write(&self, records: &[CallRecord]) -> SinkResult<()> {
        let mut buf = Vec::new();
        for record in records {
            serde_json::to_writer(&mut buf, record)
                .map_err(|e| SinkError::Serialization(e.to_string()))?;
            buf.push(b'\n');
        }

        let mut writer = self.writer.lock().await;
        writer.write_all(&buf).await?;
        trace!(records = records.len(), bytes = buf.len(), "Records written");
        Ok(())
    }

    async fn flush(&self) -> SinkResult<()> {
        self.writer.lock().await.flush().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;
    use unnest_core::models::{AccountId, BlockHash, CallArgs, LevelId};

    fn record(level_id: LevelId) -> CallRecord {
        CallRecord {
            extrinsic_id: "5-1".into(),
            block_number: 5,
            block_hash: BlockHash([0x33; 32]),
            timestamp: None,
            level_id,
            module: "system".into(),
            method: "remark".into(),
            args: CallArgs::default(),
            signer: Some(AccountId([1; 32])),
            dispatch_error: None,
            dispatch_info: None,
            events: Vec::new(),
            delegation: Vec::new(),
        }
    }

    #[tokio::test]
    async fn test_writes_one_line_per_record() {
        let sink = JsonLinesSink::new(Vec::new());
        sink.write(&[record(LevelId::root()), record(LevelId::root().child(0))])
            .await
            .unwrap();
        sink.write(&[]).await.unwrap();

        let bytes = sink.into_inner().await.unwrap();
        let text = String::from_utf8(bytes).unwrap();
        let lines: Vec<Value> = text
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();

        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["level_id"], "0");
        assert_eq!(lines[1]["level_id"], "0.0");
        assert_eq!(lines[1]["signer"], format!("0x{}", "01".repeat(32)));
    }

    // Test critique: les enregistrements écrits se relisent à l'identique
    #[tokio::test]
    async fn test_records_read_back() {
        let sink = JsonLinesSink::new(Vec::new());
        let expected = record(LevelId::root().child(3));
        sink.write(std::slice::from_ref(&expected)).await.unwrap();

        let bytes = sink.into_inner().await.unwrap();
        let decoded: CallRecord = serde_json::from_slice(bytes.trim_ascii_end()).unwrap();
        assert_eq!(decoded, expected);
    }

    #[test]
    fn test_parse_output() {
        assert_eq!("-".parse::<Output>().unwrap(), Output::Stdout);
        assert_eq!(Output::File("out.jsonl".into()).to_string(), "out.jsonl");
    }
}
