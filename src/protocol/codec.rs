//! Protocol codec
//!
//! Encoding and decoding functions for the wire protocol.
//!
//! Every message is a 1-byte tag, a 4-byte big-endian payload length, and
//! the payload. Decoding is fully length-checked: malformed or truncated
//! input produces `LatticeError::Protocol`, never a panic.

use std::io::{Read, Write};

use bytes::{Buf, BufMut};

use crate::error::{LatticeError, Result};
use crate::schema::{Field, FieldType, Schema};

use super::{Command, Response, ResponseType};

/// Header size: 1 byte tag + 4 bytes length
pub const HEADER_SIZE: usize = 5;

/// Maximum payload size (16 MB)
pub const MAX_PAYLOAD_SIZE: u32 = 16 * 1024 * 1024;

/// Maximum aggregate nesting depth accepted off the wire
const MAX_FIELD_NESTING: usize = 16;

// =============================================================================
// Length-prefixed primitives
// =============================================================================

fn put_lp_bytes(buf: &mut Vec<u8>, bytes: &[u8]) {
    buf.put_u32(bytes.len() as u32);
    buf.put_slice(bytes);
}

fn get_lp_bytes(buf: &mut &[u8]) -> Result<Vec<u8>> {
    if buf.remaining() < 4 {
        return Err(LatticeError::Protocol(
            "truncated length prefix".to_string(),
        ));
    }

    let len = buf.get_u32() as usize;
    if buf.remaining() < len {
        return Err(LatticeError::Protocol(format!(
            "length prefix {} exceeds remaining {} bytes",
            len,
            buf.remaining()
        )));
    }

    let bytes = buf[..len].to_vec();
    buf.advance(len);
    Ok(bytes)
}

fn get_lp_string(buf: &mut &[u8]) -> Result<String> {
    String::from_utf8(get_lp_bytes(buf)?)
        .map_err(|_| LatticeError::Protocol("string is not valid UTF-8".to_string()))
}

fn get_u32(buf: &mut &[u8], what: &str) -> Result<u32> {
    if buf.remaining() < 4 {
        return Err(LatticeError::Protocol(format!("truncated {what}")));
    }
    Ok(buf.get_u32())
}

// =============================================================================
// Schema Encoding/Decoding
// =============================================================================

fn type_tag(ty: &FieldType) -> u8 {
    match ty {
        FieldType::Bool => 0x00,
        FieldType::UInt8 => 0x01,
        FieldType::UInt16 => 0x02,
        FieldType::UInt32 => 0x03,
        FieldType::UInt64 => 0x04,
        FieldType::Int8 => 0x05,
        FieldType::Int16 => 0x06,
        FieldType::Int32 => 0x07,
        FieldType::Int64 => 0x08,
        FieldType::Float32 => 0x09,
        FieldType::Float64 => 0x0A,
        FieldType::String { .. } => 0x0B,
        FieldType::Aggregate(_) => 0x0C,
    }
}

fn encode_fields(buf: &mut Vec<u8>, fields: &[Field]) {
    buf.put_u32(fields.len() as u32);

    for field in fields {
        put_lp_bytes(buf, field.name.as_bytes());
        buf.put_u8(type_tag(&field.ty));

        match &field.ty {
            FieldType::String { capacity } => buf.put_u32(*capacity as u32),
            FieldType::Aggregate(members) => encode_fields(buf, members),
            _ => {}
        }
    }
}

fn decode_fields(buf: &mut &[u8], depth: usize) -> Result<Vec<Field>> {
    if depth > MAX_FIELD_NESTING {
        return Err(LatticeError::Protocol(format!(
            "aggregate nesting exceeds {MAX_FIELD_NESTING} levels"
        )));
    }

    let count = get_u32(buf, "field count")? as usize;

    // Each field takes at least a name prefix and a tag byte
    if count * 5 > buf.remaining() {
        return Err(LatticeError::Protocol(format!(
            "field count {} exceeds remaining payload",
            count
        )));
    }

    let mut fields = Vec::with_capacity(count);

    for _ in 0..count {
        let name = get_lp_string(buf)?;

        if !buf.has_remaining() {
            return Err(LatticeError::Protocol("truncated field type tag".to_string()));
        }

        let tag = buf.get_u8();
        let ty = match tag {
            0x00 => FieldType::Bool,
            0x01 => FieldType::UInt8,
            0x02 => FieldType::UInt16,
            0x03 => FieldType::UInt32,
            0x04 => FieldType::UInt64,
            0x05 => FieldType::Int8,
            0x06 => FieldType::Int16,
            0x07 => FieldType::Int32,
            0x08 => FieldType::Int64,
            0x09 => FieldType::Float32,
            0x0A => FieldType::Float64,
            0x0B => FieldType::String {
                capacity: get_u32(buf, "string capacity")? as usize,
            },
            0x0C => FieldType::Aggregate(decode_fields(buf, depth + 1)?),
            _ => {
                return Err(LatticeError::Protocol(format!(
                    "unknown field type tag: 0x{:02x}",
                    tag
                )))
            }
        };

        fields.push(Field::new(name, ty));
    }

    Ok(fields)
}

/// Append a serialized schema to `buf`
pub fn encode_schema(buf: &mut Vec<u8>, schema: &Schema) {
    encode_fields(buf, schema.fields());
    buf.put_u32(schema.key_field_index());
}

/// Decode a serialized schema, advancing `buf` past it
///
/// The decoded schema goes through `Schema::new`, so anything that passes
/// here satisfies the engine's construction invariants.
pub fn decode_schema(buf: &mut &[u8]) -> Result<Schema> {
    let fields = decode_fields(buf, 0)?;
    let key_field_index = get_u32(buf, "key field index")?;

    Schema::new(fields, key_field_index)
        .map_err(|e| LatticeError::Protocol(format!("rejected schema: {e}")))
}

// =============================================================================
// Command Encoding/Decoding
// =============================================================================

/// Encode a command to bytes
///
/// Format: tag (1) + payload_len (4) + payload
pub fn encode_command(command: &Command) -> Vec<u8> {
    let tag = command.command_type() as u8;

    let mut payload = Vec::new();
    match command {
        Command::RegisterSchema { name, schema } => {
            put_lp_bytes(&mut payload, name.as_bytes());
            encode_schema(&mut payload, schema);
        }
        Command::CreateCollection { name, schema_name } => {
            put_lp_bytes(&mut payload, name.as_bytes());
            put_lp_bytes(&mut payload, schema_name.as_bytes());
        }
        Command::GetSchema { name } | Command::GetCollectionSchema { name } => {
            put_lp_bytes(&mut payload, name.as_bytes());
        }
        Command::Get { collection, key } | Command::Delete { collection, key } => {
            put_lp_bytes(&mut payload, collection.as_bytes());
            payload.put_slice(key);
        }
        Command::Put { collection, record } => {
            put_lp_bytes(&mut payload, collection.as_bytes());
            payload.put_slice(record);
        }
        Command::Ping => {}
    }

    frame(tag, &payload)
}

/// Decode a command from a complete framed message
pub fn decode_command(bytes: &[u8]) -> Result<Command> {
    let (tag, mut payload) = check_frame(bytes)?;

    match tag {
        0x01 => {
            let name = get_lp_string(&mut payload)?;
            let schema = decode_schema(&mut payload)?;
            Ok(Command::RegisterSchema { name, schema })
        }
        0x02 => {
            let name = get_lp_string(&mut payload)?;
            let schema_name = get_lp_string(&mut payload)?;
            Ok(Command::CreateCollection { name, schema_name })
        }
        0x03 => Ok(Command::GetSchema {
            name: get_lp_string(&mut payload)?,
        }),
        0x04 => Ok(Command::GetCollectionSchema {
            name: get_lp_string(&mut payload)?,
        }),
        0x05 => {
            let collection = get_lp_string(&mut payload)?;
            Ok(Command::Get {
                collection,
                key: payload.to_vec(),
            })
        }
        0x06 => {
            let collection = get_lp_string(&mut payload)?;
            Ok(Command::Put {
                collection,
                record: payload.to_vec(),
            })
        }
        0x07 => {
            let collection = get_lp_string(&mut payload)?;
            Ok(Command::Delete {
                collection,
                key: payload.to_vec(),
            })
        }
        0x08 => Ok(Command::Ping),
        _ => Err(LatticeError::Protocol(format!(
            "unknown command tag: 0x{:02x}",
            tag
        ))),
    }
}

// =============================================================================
// Response Encoding/Decoding
// =============================================================================

/// Encode a response to bytes
///
/// Format: tag (1) + payload_len (4) + payload
pub fn encode_response(response: &Response) -> Vec<u8> {
    let tag = response.response_type() as u8;

    let mut payload = Vec::new();
    match response {
        Response::Success | Response::NotFound | Response::InvalidCommand | Response::Pong => {}
        Response::Error { message } => payload.put_slice(message.as_bytes()),
        Response::Found { record } => payload.put_slice(record),
        Response::Schema { schema } => encode_schema(&mut payload, schema),
    }

    frame(tag, &payload)
}

/// Decode a response from a complete framed message
pub fn decode_response(bytes: &[u8]) -> Result<Response> {
    let (tag, mut payload) = check_frame(bytes)?;

    match tag {
        t if t == ResponseType::Success as u8 => Ok(Response::Success),
        t if t == ResponseType::NotFound as u8 => Ok(Response::NotFound),
        t if t == ResponseType::InvalidCommand as u8 => Ok(Response::InvalidCommand),
        t if t == ResponseType::Error as u8 => Ok(Response::Error {
            message: String::from_utf8_lossy(payload).into_owned(),
        }),
        t if t == ResponseType::Found as u8 => Ok(Response::Found {
            record: payload.to_vec(),
        }),
        t if t == ResponseType::Schema as u8 => Ok(Response::Schema {
            schema: decode_schema(&mut payload)?,
        }),
        t if t == ResponseType::Pong as u8 => Ok(Response::Pong),
        _ => Err(LatticeError::Protocol(format!(
            "unknown response tag: 0x{:02x}",
            tag
        ))),
    }
}

// =============================================================================
// Framing
// =============================================================================

fn frame(tag: u8, payload: &[u8]) -> Vec<u8> {
    let mut message = Vec::with_capacity(HEADER_SIZE + payload.len());
    message.put_u8(tag);
    message.put_u32(payload.len() as u32);
    message.put_slice(payload);
    message
}

/// Validate a framed message and split it into tag + payload
fn check_frame(bytes: &[u8]) -> Result<(u8, &[u8])> {
    if bytes.len() < HEADER_SIZE {
        return Err(LatticeError::Protocol(format!(
            "incomplete header: expected {} bytes, got {}",
            HEADER_SIZE,
            bytes.len()
        )));
    }

    let tag = bytes[0];
    let payload_len = u32::from_be_bytes([bytes[1], bytes[2], bytes[3], bytes[4]]) as usize;

    if payload_len > MAX_PAYLOAD_SIZE as usize {
        return Err(LatticeError::Protocol(format!(
            "payload too large: {} bytes (max {})",
            payload_len, MAX_PAYLOAD_SIZE
        )));
    }

    let total_len = HEADER_SIZE + payload_len;
    if bytes.len() < total_len {
        return Err(LatticeError::Protocol(format!(
            "incomplete payload: expected {} bytes, got {}",
            total_len,
            bytes.len()
        )));
    }

    Ok((tag, &bytes[HEADER_SIZE..total_len]))
}

// =============================================================================
// Stream-based I/O helpers
// =============================================================================

fn read_message<R: Read>(reader: &mut R) -> Result<Vec<u8>> {
    let mut header = [0u8; HEADER_SIZE];
    reader.read_exact(&mut header)?;

    let payload_len = u32::from_be_bytes([header[1], header[2], header[3], header[4]]) as usize;

    if payload_len > MAX_PAYLOAD_SIZE as usize {
        return Err(LatticeError::Protocol(format!(
            "payload too large: {} bytes (max {})",
            payload_len, MAX_PAYLOAD_SIZE
        )));
    }

    let mut message = vec![0u8; HEADER_SIZE + payload_len];
    message[..HEADER_SIZE].copy_from_slice(&header);
    if payload_len > 0 {
        reader.read_exact(&mut message[HEADER_SIZE..])?;
    }

    Ok(message)
}

/// Read a complete command from a stream
///
/// Blocks until a complete command is received or an error occurs
pub fn read_command<R: Read>(reader: &mut R) -> Result<Command> {
    decode_command(&read_message(reader)?)
}

/// Write a command to a stream
pub fn write_command<W: Write>(writer: &mut W, command: &Command) -> Result<()> {
    writer.write_all(&encode_command(command))?;
    writer.flush()?;
    Ok(())
}

/// Read a complete response from a stream
pub fn read_response<R: Read>(reader: &mut R) -> Result<Response> {
    decode_response(&read_message(reader)?)
}

/// Write a response to a stream
pub fn write_response<W: Write>(writer: &mut W, response: &Response) -> Result<()> {
    writer.write_all(&encode_response(response))?;
    writer.flush()?;
    Ok(())
}
