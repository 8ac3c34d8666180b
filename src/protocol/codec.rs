//! Protocol codec
//!
//! Encoding and decoding functions for the wire protocol.
//!
//! ## Wire Format
//!
//! ### Request (Command) Format
//! ```text
//! ┌──────────┬──────────┬─────────────────────────────┐
//! │ Cmd (1)  │ Len (4)  │         Payload             │
//! └──────────┴──────────┴─────────────────────────────┘
//! ```
//!
//! ### Payload by Command Type
//! Every field is `field_len (4 bytes, BE) + bytes`.
//! - GET_LOG: loc, date
//! - PUT_LOG: loc, date, body
//! - YEAR:    loc, year
//! - WEEK:    loc, day
//! - KEYS:    loc
//! - SCAN:    loc, prefix
//! - PING:    empty
//!
//! ### Response Format
//! ```text
//! ┌──────────┬──────────┬─────────────────────────────┐
//! │Status(1) │ Len (4)  │         Payload             │
//! └──────────┴──────────┴─────────────────────────────┘
//! ```

use std::io::{Read, Write};

use bytes::{Buf, BufMut, BytesMut};

use super::{Command, CommandType, Response, Status};
use crate::error::{Result, SigninError};

/// Header size: 1 byte command/status + 4 bytes length
pub const HEADER_SIZE: usize = 5;

/// Maximum payload size (16 MB)
pub const MAX_PAYLOAD_SIZE: u32 = 16 * 1024 * 1024;

// =============================================================================
// Command Encoding/Decoding
// =============================================================================

/// Encode a command to bytes
///
/// Format: cmd_type (1) + payload_len (4) + payload
pub fn encode_command(command: &Command) -> Vec<u8> {
    let fields: Vec<&[u8]> = match command {
        Command::GetLog { loc, date } => vec![loc.as_bytes(), date.as_bytes()],
        Command::PutLog { loc, date, body } => vec![loc.as_bytes(), date.as_bytes(), body],
        Command::Year { loc, year } => vec![loc.as_bytes(), year.as_bytes()],
        Command::Week { loc, day } => vec![loc.as_bytes(), day.as_bytes()],
        Command::Keys { loc } => vec![loc.as_bytes()],
        Command::Scan { loc, prefix } => vec![loc.as_bytes(), prefix.as_bytes()],
        Command::Ping => Vec::new(),
    };

    let payload_len: usize = fields.iter().map(|f| 4 + f.len()).sum();

    let mut message = BytesMut::with_capacity(HEADER_SIZE + payload_len);
    message.put_u8(command.command_type() as u8);
    message.put_u32(payload_len as u32);
    for field in fields {
        message.put_u32(field.len() as u32);
        message.put_slice(field);
    }

    message.to_vec()
}

/// Decode a command from bytes
pub fn decode_command(bytes: &[u8]) -> Result<Command> {
    let (cmd_type, payload) = split_frame(bytes, "command")?;

    let cmd_type = CommandType::from_byte(cmd_type).ok_or_else(|| {
        SigninError::Protocol(format!("Unknown command type: 0x{:02x}", cmd_type))
    })?;

    let mut fields = decode_fields(payload, cmd_type.field_count())?.into_iter();
    let fields = &mut fields;

    Ok(match cmd_type {
        CommandType::GetLog => Command::GetLog {
            loc: text_field(fields, "loc")?,
            date: text_field(fields, "date")?,
        },
        CommandType::PutLog => {
            let loc = text_field(fields, "loc")?;
            let date = text_field(fields, "date")?;
            // Body stays raw; the service parses it as JSON
            let body = fields.next().unwrap_or_default();
            Command::PutLog { loc, date, body }
        }
        CommandType::Year => Command::Year {
            loc: text_field(fields, "loc")?,
            year: text_field(fields, "year")?,
        },
        CommandType::Week => Command::Week {
            loc: text_field(fields, "loc")?,
            day: text_field(fields, "day")?,
        },
        CommandType::Keys => Command::Keys { loc: text_field(fields, "loc")? },
        CommandType::Scan => Command::Scan {
            loc: text_field(fields, "loc")?,
            prefix: text_field(fields, "prefix")?,
        },
        CommandType::Ping => Command::Ping,
    })
}

fn text_field(fields: &mut impl Iterator<Item = Vec<u8>>, name: &str) -> Result<String> {
    let field = fields.next().unwrap_or_default();
    String::from_utf8(field)
        .map_err(|_| SigninError::Protocol(format!("{} is not valid UTF-8", name)))
}

/// Split a payload into exactly `expected` length-prefixed fields
fn decode_fields(mut payload: &[u8], expected: usize) -> Result<Vec<Vec<u8>>> {
    let mut fields = Vec::with_capacity(expected);

    for index in 0..expected {
        if payload.remaining() < 4 {
            return Err(SigninError::Protocol(format!(
                "Missing length of field {} of {}",
                index + 1,
                expected
            )));
        }
        let len = payload.get_u32() as usize;
        if payload.remaining() < len {
            return Err(SigninError::Protocol(format!(
                "Incomplete field {}: expected {} bytes, got {}",
                index + 1,
                len,
                payload.remaining()
            )));
        }
        fields.push(payload[..len].to_vec());
        payload.advance(len);
    }

    if payload.has_remaining() {
        return Err(SigninError::Protocol(format!(
            "Unexpected {} trailing bytes after {} fields",
            payload.remaining(),
            expected
        )));
    }

    Ok(fields)
}

// =============================================================================
// Response Encoding/Decoding
// =============================================================================

/// Encode a response to bytes
///
/// Format: status (1) + payload_len (4) + payload
pub fn encode_response(response: &Response) -> Vec<u8> {
    let payload = response.payload.as_deref().unwrap_or(&[]);

    let mut message = BytesMut::with_capacity(HEADER_SIZE + payload.len());
    message.put_u8(response.status as u8);
    message.put_u32(payload.len() as u32);
    message.put_slice(payload);

    message.to_vec()
}

/// Decode a response from bytes
pub fn decode_response(bytes: &[u8]) -> Result<Response> {
    let (status_byte, payload) = split_frame(bytes, "response")?;

    let status = match status_byte {
        0x00 => Status::Ok,
        0x01 => Status::BadRequest,
        0x02 => Status::Error,
        _ => {
            return Err(SigninError::Protocol(format!(
                "Unknown response status: 0x{:02x}",
                status_byte
            )))
        }
    };

    let payload = if payload.is_empty() {
        None
    } else {
        Some(payload.to_vec())
    };

    Ok(Response { status, payload })
}

/// Validate a frame header and return (type byte, payload)
fn split_frame<'a>(bytes: &'a [u8], what: &str) -> Result<(u8, &'a [u8])> {
    if bytes.len() < HEADER_SIZE {
        return Err(SigninError::Protocol(format!(
            "Incomplete {} header: expected {} bytes, got {}",
            what,
            HEADER_SIZE,
            bytes.len()
        )));
    }

    let mut header = &bytes[..HEADER_SIZE];
    let kind = header.get_u8();
    let payload_len = check_payload_len(header.get_u32(), what)?;

    let total_len = HEADER_SIZE + payload_len;
    if bytes.len() < total_len {
        return Err(SigninError::Protocol(format!(
            "Incomplete {} payload: expected {} bytes, got {}",
            what,
            total_len,
            bytes.len()
        )));
    }

    Ok((kind, &bytes[HEADER_SIZE..total_len]))
}

fn check_payload_len(len: u32, what: &str) -> Result<usize> {
    if len > MAX_PAYLOAD_SIZE {
        return Err(SigninError::Protocol(format!(
            "{} payload too large: {} bytes (max {})",
            what, len, MAX_PAYLOAD_SIZE
        )));
    }
    Ok(len as usize)
}

// =============================================================================
// Stream-based I/O helpers
// =============================================================================

/// Read one length-prefixed frame (header + payload) from a stream
fn read_frame<R: Read>(reader: &mut R, what: &str) -> Result<Vec<u8>> {
    let mut header = [0u8; HEADER_SIZE];
    reader.read_exact(&mut header)?;

    let payload_len = check_payload_len(
        u32::from_be_bytes([header[1], header[2], header[3], header[4]]),
        what,
    )?;

    let mut frame = vec![0u8; HEADER_SIZE + payload_len];
    frame[..HEADER_SIZE].copy_from_slice(&header);
    if payload_len > 0 {
        reader.read_exact(&mut frame[HEADER_SIZE..])?;
    }

    Ok(frame)
}

/// Read a complete command from a stream
///
/// Blocks until a complete command is received or an error occurs
pub fn read_command<R: Read>(reader: &mut R) -> Result<Command> {
    let frame = read_frame(reader, "command")?;
    decode_command(&frame)
}

/// Write a command to a stream
pub fn write_command<W: Write>(writer: &mut W, command: &Command) -> Result<()> {
    let bytes = encode_command(command);
    writer.write_all(&bytes)?;
    writer.flush()?;
    Ok(())
}

/// Read a complete response from a stream
pub fn read_response<R: Read>(reader: &mut R) -> Result<Response> {
    let frame = read_frame(reader, "response")?;
    decode_response(&frame)
}

/// Write a response to a stream
pub fn write_response<W: Write>(writer: &mut W, response: &Response) -> Result<()> {
    let bytes = encode_response(response);
    writer.write_all(&bytes)?;
    writer.flush()?;
    Ok(())
}
