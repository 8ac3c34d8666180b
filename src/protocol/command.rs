//! Command definitions
//!
//! Represents commands from clients. Parameters travel as raw strings and
//! are validated by the service, not by the codec.

/// Command types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum CommandType {
    GetLog = 0x01,
    PutLog = 0x02,
    Year = 0x03,
    Week = 0x04,
    Keys = 0x05,
    Scan = 0x06,
    Ping = 0x07,
}

impl CommandType {
    pub fn from_byte(byte: u8) -> Option<Self> {
        Some(match byte {
            0x01 => CommandType::GetLog,
            0x02 => CommandType::PutLog,
            0x03 => CommandType::Year,
            0x04 => CommandType::Week,
            0x05 => CommandType::Keys,
            0x06 => CommandType::Scan,
            0x07 => CommandType::Ping,
            _ => return None,
        })
    }

    /// Number of payload fields the command carries
    pub fn field_count(self) -> usize {
        match self {
            CommandType::GetLog => 2,
            CommandType::PutLog => 3,
            CommandType::Year => 2,
            CommandType::Week => 2,
            CommandType::Keys => 1,
            CommandType::Scan => 2,
            CommandType::Ping => 0,
        }
    }
}

/// A parsed command
///
/// An empty `loc` means the client named no location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Read one day's record
    GetLog { loc: String, date: String },

    /// Replace one day's record with a JSON body
    PutLog { loc: String, date: String, body: Vec<u8> },

    /// Year statistics
    Year { loc: String, year: String },

    /// Records of the week around a day
    Week { loc: String, day: String },

    /// Every key of a location
    Keys { loc: String },

    /// Raw entries under a key prefix
    Scan { loc: String, prefix: String },

    /// Ping (health check)
    Ping,
}

impl Command {
    /// Get the command type
    pub fn command_type(&self) -> CommandType {
        match self {
            Command::GetLog { .. } => CommandType::GetLog,
            Command::PutLog { .. } => CommandType::PutLog,
            Command::Year { .. } => CommandType::Year,
            Command::Week { .. } => CommandType::Week,
            Command::Keys { .. } => CommandType::Keys,
            Command::Scan { .. } => CommandType::Scan,
            Command::Ping => CommandType::Ping,
        }
    }

    /// Location code named by the command, if any
    pub fn location(&self) -> Option<&str> {
        let loc = match self {
            Command::GetLog { loc, .. }
            | Command::PutLog { loc, .. }
            | Command::Year { loc, .. }
            | Command::Week { loc, .. }
            | Command::Keys { loc }
            | Command::Scan { loc, .. } => loc.as_str(),
            Command::Ping => return None,
        };
        (!loc.is_empty()).then_some(loc)
    }
}
