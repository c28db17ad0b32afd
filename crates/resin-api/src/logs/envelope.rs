// Log payload decoding
//
// A raw subscription payload is a PubNub subscribe response:
//
//     [ <messages>, "<timetoken>", ... ]
//
// where `<messages>` is the log batch, an array of published messages, each
// of which is itself an array of log entries `{ "m": "<line>", ... }`.
// Lines come out in outer-array order, then inner-array order.
//
// Decoding is all-or-nothing per payload: a single malformed entry drops the
// whole payload. Entry errors are collected rather than stopping at the first
// one, so the report shows everything wrong with the payload.

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

/// A single log entry as published by a device.
#[derive(Debug, Deserialize)]
struct LogEntry {
    #[serde(rename = "m")]
    message: String,
}

/// Why a payload could not be decoded. Never fatal to a stream.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The transport envelope is not a JSON array.
    #[error("malformed transport envelope: {0}")]
    Envelope(#[source] serde_json::Error),

    /// The transport envelope is an empty array.
    #[error("transport envelope carries no log batch")]
    MissingBatch,

    /// The batch is not an array of arrays.
    #[error("malformed log batch: {0}")]
    Batch(#[source] serde_json::Error),

    /// One or more entries failed the entry schema.
    #[error("{} malformed log entries: {}", .0.len(), describe(.0))]
    Entries(Vec<EntryError>),
}

/// A schema violation at `batch[outer][inner]`.
#[derive(Debug, Error)]
pub enum EntryError {
    #[error("[{outer}][{inner}] is not an object")]
    NotAnObject { outer: usize, inner: usize },

    #[error("[{outer}][{inner}]: {source}")]
    Invalid {
        outer: usize,
        inner: usize,
        #[source]
        source: serde_json::Error,
    },
}

fn describe(errors: &[EntryError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Decode a raw transport payload into log lines.
pub fn decode_payload(raw: &[u8]) -> Result<Vec<String>, DecodeError> {
    let batch = unwrap_envelope(raw)?;
    let batch = Vec::<Vec<Value>>::deserialize(batch).map_err(DecodeError::Batch)?;
    decode_entries(batch)
}

/// Decode an already-unwrapped log batch (`[[{"m": ...}, ...], ...]`).
pub fn decode_batch(batch: &[u8]) -> Result<Vec<String>, DecodeError> {
    let batch: Vec<Vec<Value>> = serde_json::from_slice(batch).map_err(DecodeError::Batch)?;
    decode_entries(batch)
}

/// Strip the transport envelope, returning the log batch.
pub fn unwrap_envelope(raw: &[u8]) -> Result<Value, DecodeError> {
    let envelope: Vec<Value> = serde_json::from_slice(raw).map_err(DecodeError::Envelope)?;
    envelope.into_iter().next().ok_or(DecodeError::MissingBatch)
}

fn decode_entries(batch: Vec<Vec<Value>>) -> Result<Vec<String>, DecodeError> {
    let mut lines = Vec::with_capacity(batch.iter().map(Vec::len).sum());
    let mut errors = Vec::new();

    for (outer, message) in batch.into_iter().enumerate() {
        for (inner, entry) in message.into_iter().enumerate() {
            if !entry.is_object() {
                errors.push(EntryError::NotAnObject { outer, inner });
                continue;
            }
            match LogEntry::deserialize(entry) {
                Ok(entry) => lines.push(entry.message),
                Err(source) => errors.push(EntryError::Invalid {
                    outer,
                    inner,
                    source,
                }),
            }
        }
    }

    if errors.is_empty() {
        Ok(lines)
    } else {
        Err(DecodeError::Entries(errors))
    }
}
