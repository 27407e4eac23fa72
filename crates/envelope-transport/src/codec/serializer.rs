//! Envelope wire codec
//!
//! ## Format
//!
//! ```text
//! {"event_id":"…","sdk":{"name":"…","version":"…"}}
//! {"type":"event","length":41,"content_type":"application/json"}
//! <41 payload bytes>
//! {"type":"attachment","length":3,"content_type":"text/plain","filename":"a.txt"}
//! <3 payload bytes>
//! ```
//!
//! One compact JSON header record, then per item a newline, a compact JSON
//! item header, a newline and exactly `length` raw bytes. No padding and no
//! trailing delimiter, so envelopes can be streamed.
//!
//! ## Invariants
//!
//! - Encoding is deterministic: equal envelopes give identical bytes.
//! - Encoding fails only on an item whose header length disagrees with its
//!   payload.
//! - `deserialize(serialize(e))` equals `e` item for item.

use std::io::{self, Write};

use serde::Deserialize;
use shared_types::{
    Envelope, EnvelopeHeader, Item, ItemHeader, ItemType, ModelError, CONTENT_TYPE_OCTET_STREAM,
};

use crate::error::SerializationError;

/// Check every item's declared length against its payload.
///
/// Items built through `Item`'s constructors always pass. The check is the
/// encoder's precondition, run before any byte is written.
pub fn verify(envelope: &Envelope) -> Result<(), SerializationError> {
    for (index, item) in envelope.items().iter().enumerate() {
        let declared = item.header().length;
        let actual = item.payload().len() as u64;
        if declared != actual {
            return Err(SerializationError::LengthMismatch {
                index,
                declared,
                actual,
            });
        }
    }
    Ok(())
}

/// Encode an envelope into a fresh buffer.
pub fn serialize(envelope: &Envelope) -> Result<Vec<u8>, SerializationError> {
    let payload_bytes: usize = envelope.items().iter().map(|i| i.payload().len()).sum();
    let mut out = Vec::with_capacity(payload_bytes + 128 * (envelope.len() + 1));
    write_envelope(envelope, &mut out)?;
    Ok(out)
}

/// Stream an envelope into `writer`.
///
/// The envelope is verified before the first byte is written.
pub fn write_envelope<W: Write>(
    envelope: &Envelope,
    mut writer: W,
) -> Result<(), SerializationError> {
    verify(envelope)?;

    serde_json::to_writer(&mut writer, envelope.header())?;
    for item in envelope.items() {
        writer.write_all(b"\n").map_err(io_error)?;
        serde_json::to_writer(&mut writer, item.header())?;
        writer.write_all(b"\n").map_err(io_error)?;
        writer.write_all(item.payload()).map_err(io_error)?;
    }
    writer.flush().map_err(io_error)
}

/// Item header as found on the wire, where `length` and `content_type` are
/// optional.
#[derive(Deserialize)]
struct WireItemHeader {
    #[serde(rename = "type")]
    item_type: ItemType,
    length: Option<u64>,
    content_type: Option<String>,
    filename: Option<String>,
}

/// Decode an envelope.
///
/// An item header without `length` takes its payload up to the next newline
/// or the end of input. A single trailing newline is accepted.
pub fn deserialize(bytes: &[u8]) -> Result<Envelope, SerializationError> {
    let (header_end, mut pos) = match find_newline(bytes, 0) {
        Some(end) => (end, end + 1),
        None => (bytes.len(), bytes.len()),
    };
    let header: EnvelopeHeader = serde_json::from_slice(&bytes[..header_end])
        .map_err(|e| SerializationError::Malformed(format!("envelope header: {e}")))?;

    let mut items = Vec::new();
    while pos < bytes.len() {
        let index = items.len();
        let line_end = find_newline(bytes, pos).ok_or_else(|| {
            SerializationError::Malformed(format!("item {index}: header is not newline-terminated"))
        })?;
        let wire: WireItemHeader = serde_json::from_slice(&bytes[pos..line_end])
            .map_err(|e| SerializationError::Malformed(format!("item {index} header: {e}")))?;
        pos = line_end + 1;

        let payload_end = match wire.length {
            Some(length) => {
                let available = (bytes.len() - pos) as u64;
                if length > available {
                    return Err(SerializationError::Truncated {
                        expected: length,
                        available,
                    });
                }
                // Bounded by `available`, so it fits in usize.
                pos + length as usize
            }
            None => find_newline(bytes, pos).unwrap_or(bytes.len()),
        };
        let payload = bytes[pos..payload_end].to_vec();
        pos = payload_end;

        if pos < bytes.len() {
            if bytes[pos] != b'\n' {
                return Err(SerializationError::Malformed(format!(
                    "item {index}: payload not followed by a newline"
                )));
            }
            pos += 1;
        }

        items.push(decode_item(index, wire, payload)?);
    }

    Ok(Envelope::new(header, items))
}

/// Pair a wire header with its payload, filling in the lenient defaults.
fn decode_item(
    index: usize,
    wire: WireItemHeader,
    payload: Vec<u8>,
) -> Result<Item, SerializationError> {
    let header = ItemHeader {
        item_type: wire.item_type,
        length: wire.length.unwrap_or(payload.len() as u64),
        content_type: wire
            .content_type
            .unwrap_or_else(|| CONTENT_TYPE_OCTET_STREAM.to_string()),
        filename: wire.filename,
    };
    Item::from_parts(header, payload).map_err(|err| match err {
        ModelError::LengthMismatch { declared, actual } => SerializationError::LengthMismatch {
            index,
            declared,
            actual,
        },
        other => SerializationError::Malformed(format!("item {index}: {other}")),
    })
}

fn find_newline(bytes: &[u8], from: usize) -> Option<usize> {
    bytes[from..]
        .iter()
        .position(|&b| b == b'\n')
        .map(|offset| from + offset)
}

fn io_error(err: io::Error) -> SerializationError {
    SerializationError::Encode(err.to_string())
}
