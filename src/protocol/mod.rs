//! Protocol Module
//!
//! Defines the wire protocol for client-server communication.
//!
//! ## Protocol Format (V1 - Simple Binary)
//!
//! ### Request Format
//! ```text
//! ┌──────────┬──────────┬─────────────────────────────┐
//! │ Cmd (1)  │ Len (4)  │         Payload             │
//! └──────────┴──────────┴─────────────────────────────┘
//! ```
//! The payload is a fixed number of fields per command, each written as
//! `field_len (4) + bytes`.
//!
//! ### Commands
//! - 0x01: GET_LOG  - Fields: loc, date
//! - 0x02: PUT_LOG  - Fields: loc, date, json body
//! - 0x03: YEAR     - Fields: loc, year
//! - 0x04: WEEK     - Fields: loc, day
//! - 0x05: KEYS     - Fields: loc
//! - 0x06: SCAN     - Fields: loc, prefix
//! - 0x07: PING     - No fields
//!
//! ### Response Format
//! ```text
//! ┌──────────┬──────────┬─────────────────────────────┐
//! │Status(1) │ Len (4)  │      Payload (JSON)         │
//! └──────────┴──────────┴─────────────────────────────┘
//! ```
//!
//! ### Status Codes
//! - 0x00: OK
//! - 0x01: BAD_REQUEST
//! - 0x02: ERROR

mod command;
mod response;
mod codec;

pub use command::{Command, CommandType};
pub use response::{Response, Status};
pub use codec::{
    decode_command, decode_response, encode_command, encode_response, read_command,
    read_response, write_command, write_response, HEADER_SIZE, MAX_PAYLOAD_SIZE,
};
