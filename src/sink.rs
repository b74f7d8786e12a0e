//! Record Sink
//!
//! Extracted data leaves the tap as a stream of JSON messages, one per
//! line:
//!
//! ```text
//! {"type":"SCHEMA","stream":"page_query","schema":{...},"key_properties":["page","query"],"bookmark_properties":["timestamp"]}
//! {"type":"RECORD","stream":"page_query","record":{...},"time_extracted":"2021-01-06T10:00:00.000000Z"}
//! {"type":"STATE","value":{"bookmarks":{...}}}
//! ```

use crate::state::TapState;
use crate::stream::Record;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use std::io::{self, Write};
use thiserror::Error;

/// Destination for schema, record and state messages
pub trait Sink {
    /// Announce the schema of a stream before its records
    fn write_schema(
        &mut self,
        stream_id: &str,
        schema: &Value,
        key_properties: &[String],
        bookmark_properties: &[String],
    ) -> Result<(), SinkError>;

    /// Emit one record
    fn write_record(
        &mut self,
        stream_id: &str,
        record: &Record,
        time_extracted: DateTime<Utc>,
    ) -> Result<(), SinkError>;

    /// Persist the state (checkpoint)
    fn write_state(&mut self, state: &TapState) -> Result<(), SinkError>;

    /// Signal that no more messages follow for this run
    fn flush(&mut self) -> Result<(), SinkError> {
        Ok(())
    }
}

/// Wire message
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "UPPERCASE")]
pub enum Message<'a> {
    Schema {
        stream: &'a str,
        schema: &'a Value,
        key_properties: &'a [String],
        #[serde(skip_serializing_if = "<[String]>::is_empty")]
        bookmark_properties: &'a [String],
    },
    Record {
        stream: &'a str,
        record: &'a Record,
        time_extracted: String,
    },
    State {
        value: &'a Value,
    },
}

/// Writes one JSON message per line
pub struct JsonLinesSink<W: Write> {
    writer: W,
    messages_written: u64,
}

impl JsonLinesSink<io::Stdout> {
    /// Sink writing to standard output
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> JsonLinesSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            messages_written: 0,
        }
    }

    /// Number of messages written so far
    pub fn messages_written(&self) -> u64 {
        self.messages_written
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    fn write_message(&mut self, message: &Message<'_>) -> Result<(), SinkError> {
        serde_json::to_writer(&mut self.writer, message)?;
        self.writer.write_all(b"\n")?;
        self.messages_written += 1;
        Ok(())
    }
}

impl<W: Write> Sink for JsonLinesSink<W> {
    fn write_schema(
        &mut self,
        stream_id: &str,
        schema: &Value,
        key_properties: &[String],
        bookmark_properties: &[String],
    ) -> Result<(), SinkError> {
        self.write_message(&Message::Schema {
            stream: stream_id,
            schema,
            key_properties,
            bookmark_properties,
        })
    }

    fn write_record(
        &mut self,
        stream_id: &str,
        record: &Record,
        time_extracted: DateTime<Utc>,
    ) -> Result<(), SinkError> {
        self.write_message(&Message::Record {
            stream: stream_id,
            record,
            time_extracted: format_time_extracted(time_extracted),
        })
    }

    fn write_state(&mut self, state: &TapState) -> Result<(), SinkError> {
        self.write_message(&Message::State {
            value: state.as_value(),
        })?;
        // State marks a consistent point; make sure it reaches the reader
        self.writer.flush()?;
        Ok(())
    }

    fn flush(&mut self) -> Result<(), SinkError> {
        self.writer.flush()?;
        Ok(())
    }
}

/// RFC 3339 UTC timestamp with microseconds
fn format_time_extracted(time: DateTime<Utc>) -> String {
    time.format("%Y-%m-%dT%H:%M:%S%.6fZ").to_string()
}

/// Errors that can occur while writing messages
#[derive(Error, Debug)]
pub enum SinkError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
