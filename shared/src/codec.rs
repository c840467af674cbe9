//! Streaming codec for [`Message`] envelopes.
//!
//! Records are newline-delimited JSON objects, so a connection is a plain
//! byte stream with one envelope per line.

use crate::protocol::Message;
use serde_json::Value;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader};

/// Upper bound on a single encoded record.
pub const MAX_FRAME_LEN: usize = 1024 * 1024;

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("connection closed")]
    Closed,

    #[error("record exceeds {} bytes", MAX_FRAME_LEN)]
    FrameTooLong,

    #[error("record is not valid JSON: {0}")]
    Syntax(#[source] serde_json::Error),

    #[error("record has no message_type")]
    NotAnEnvelope,

    #[error("unknown message_type {0:?}")]
    UnknownMessageType(String),

    #[error("invalid {message_type} payload: {source}")]
    InvalidPayload {
        message_type: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to encode message: {0}")]
    Encode(#[source] serde_json::Error),
}

impl CodecError {
    /// Fatal errors leave the stream in an unknown state; the connection
    /// must be dropped. Non-fatal ones only invalidate a single record.
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            CodecError::UnknownMessageType(_) | CodecError::InvalidPayload { .. }
        )
    }
}

/// Serializes a message into a single newline-terminated record.
pub fn encode_message(message: &Message) -> Result<Vec<u8>, CodecError> {
    let mut bytes = serde_json::to_vec(message).map_err(CodecError::Encode)?;
    bytes.push(b'\n');
    Ok(bytes)
}

/// Parses one record. The envelope is checked before the payload so a
/// bad payload can be told apart from a broken stream.
pub fn decode_message(record: &str) -> Result<Message, CodecError> {
    let value: Value = serde_json::from_str(record).map_err(CodecError::Syntax)?;
    let message_type = value
        .get("message_type")
        .and_then(Value::as_str)
        .ok_or(CodecError::NotAnEnvelope)?
        .to_string();

    match message_type.as_str() {
        "init" | "state" | "action" => {
            // Parse the text again rather than the Value: numeric map keys
            // such as player ids only deserialize on the direct path.
            serde_json::from_str(record).map_err(|source| CodecError::InvalidPayload {
                message_type,
                source,
            })
        }
        _ => Err(CodecError::UnknownMessageType(message_type)),
    }
}

pub struct MessageReader<R> {
    reader: BufReader<R>,
    line: String,
}

impl<R: AsyncRead + Unpin> MessageReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            reader: BufReader::new(inner),
            line: String::new(),
        }
    }

    /// Waits for the next complete record and decodes it.
    pub async fn next_message(&mut self) -> Result<Message, CodecError> {
        loop {
            self.line.clear();
            let mut limited = (&mut self.reader).take(MAX_FRAME_LEN as u64 + 1);
            let read = limited.read_line(&mut self.line).await?;
            if read == 0 {
                return Err(CodecError::Closed);
            }
            let content = self.line.strip_suffix('\n').unwrap_or(&self.line);
            if content.len() > MAX_FRAME_LEN {
                return Err(CodecError::FrameTooLong);
            }

            let record = self.line.trim();
            if record.is_empty() {
                continue;
            }
            return decode_message(record);
        }
    }
}

pub struct MessageWriter<W> {
    writer: W,
}

impl<W: AsyncWrite + Unpin> MessageWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub async fn send(&mut self, message: &Message) -> Result<(), CodecError> {
        let bytes = encode_message(message)?;
        self.send_encoded(&bytes).await
    }

    /// Writes a record produced by [`encode_message`]. Lets one encoding
    /// be fanned out to many connections.
    pub async fn send_encoded(&mut self, record: &[u8]) -> Result<(), CodecError> {
        self.writer.write_all(record).await?;
        self.writer.flush().await?;
        Ok(())
    }
}
