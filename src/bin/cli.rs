//! signlog CLI Client
//!
//! Command-line interface for a running signlog server.

use std::net::TcpStream;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use serde_json::json;
use signlog::protocol::{read_response, write_command, Command, Status};

/// signlog CLI
#[derive(Parser, Debug)]
#[command(name = "signlog-cli")]
#[command(about = "CLI for the signlog sign-in service")]
struct Args {
    /// Server address
    #[arg(short, long, default_value = "127.0.0.1:8900")]
    server: String,

    /// Location code
    #[arg(short, long, default_value = "")]
    loc: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Show one day's record
    Get {
        /// Date as Y-M-D
        date: String,
    },

    /// Replace one day's record
    Put {
        /// Date as Y-M-D
        date: String,

        /// Names signed in (comma separated)
        #[arg(long, value_delimiter = ',', default_value = "")]
        names: Vec<String>,

        /// Tags (comma separated)
        #[arg(long, value_delimiter = ',', default_value = "")]
        tags: Vec<String>,

        #[arg(long, default_value = "")]
        comment: String,

        #[arg(long)]
        cup_size: Option<i64>,
    },

    /// Year statistics
    Year { year: String },

    /// Records of the week containing a day (YYYY-MM-DD)
    Week { day: String },

    /// List every key of the location
    Keys,

    /// Dump entries under a key prefix
    Scan { prefix: String },

    /// Ping the server
    Ping,
}

fn build_command(loc: String, command: Commands) -> Command {
    match command {
        Commands::Get { date } => Command::GetLog { loc, date },
        Commands::Put {
            date,
            names,
            tags,
            comment,
            cup_size,
        } => {
            let non_empty = |v: Vec<String>| v.into_iter().filter(|s| !s.is_empty()).collect::<Vec<_>>();
            let mut body = json!({
                "names": non_empty(names),
                "tags": non_empty(tags),
                "comment": comment,
            });
            if let Some(cup_size) = cup_size {
                body["cup_size"] = json!(cup_size);
            }
            Command::PutLog {
                loc,
                date,
                body: body.to_string().into_bytes(),
            }
        }
        Commands::Year { year } => Command::Year { loc, year },
        Commands::Week { day } => Command::Week { loc, day },
        Commands::Keys => Command::Keys { loc },
        Commands::Scan { prefix } => Command::Scan { loc, prefix },
        Commands::Ping => Command::Ping,
    }
}

fn main() -> ExitCode {
    let args = Args::parse();
    let command = build_command(args.loc, args.command);

    let mut stream = match TcpStream::connect(&args.server) {
        Ok(stream) => stream,
        Err(e) => {
            eprintln!("cannot connect to {}: {}", args.server, e);
            return ExitCode::FAILURE;
        }
    };

    let response = write_command(&mut stream, &command).and_then(|_| read_response(&mut stream));
    let response = match response {
        Ok(response) => response,
        Err(e) => {
            eprintln!("request failed: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match response.status {
        Status::Ok => {
            let payload = response.payload.unwrap_or_default();
            match serde_json::from_slice::<serde_json::Value>(&payload) {
                Ok(value) => println!(
                    "{}",
                    serde_json::to_string_pretty(&value).unwrap_or_else(|_| value.to_string())
                ),
                Err(_) => println!("{}", String::from_utf8_lossy(&payload)),
            }
            ExitCode::SUCCESS
        }
        status => {
            let msg = response.message().unwrap_or_default();
            eprintln!("{:?}: {}", status, msg);
            ExitCode::FAILURE
        }
    }
}
