//! Response definitions
//!
//! Represents responses to clients.

use serde::{Deserialize, Serialize};

use crate::error::{Result, SigninError};

/// Response status codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Status {
    Ok = 0x00,
    BadRequest = 0x01,
    Error = 0x02,
}

/// Body of a non-OK response
#[derive(Debug, Serialize, Deserialize)]
struct ErrorBody {
    msg: String,
}

/// A response to send to client
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    /// Status code
    pub status: Status,

    /// Optional JSON payload (reply for OK, `{"msg": ..}` otherwise)
    pub payload: Option<Vec<u8>>,
}

impl Response {
    /// Create an OK response with optional payload
    pub fn ok(payload: Option<Vec<u8>>) -> Self {
        Self {
            status: Status::Ok,
            payload,
        }
    }

    /// Create an OK response carrying a value as JSON
    pub fn json<T: Serialize>(value: &T) -> Result<Self> {
        let payload =
            serde_json::to_vec(value).map_err(|e| SigninError::Serialization(e.to_string()))?;
        Ok(Self::ok(Some(payload)))
    }

    /// Create a BAD_REQUEST response
    pub fn bad_request(message: &str) -> Self {
        Self::with_message(Status::BadRequest, message)
    }

    /// Create an ERROR response
    pub fn error(message: &str) -> Self {
        Self::with_message(Status::Error, message)
    }

    /// Map a failed command to a response
    pub fn from_error(err: &SigninError) -> Self {
        if err.is_input_error() {
            Self::bad_request(&err.to_string())
        } else {
            Self::error(&err.to_string())
        }
    }

    /// The `msg` of an error payload
    pub fn message(&self) -> Option<String> {
        let payload = self.payload.as_deref()?;
        serde_json::from_slice::<ErrorBody>(payload)
            .ok()
            .map(|body| body.msg)
    }

    /// Payload length in bytes
    pub fn payload_len(&self) -> usize {
        self.payload.as_ref().map_or(0, Vec::len)
    }

    fn with_message(status: Status, message: &str) -> Self {
        let body = ErrorBody {
            msg: message.to_string(),
        };
        // Serializing a struct of one String cannot fail
        let payload = serde_json::to_vec(&body).unwrap_or_default();
        Self {
            status,
            payload: Some(payload),
        }
    }
}
