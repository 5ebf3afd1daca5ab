//! Operator console on the host's stdin
//!
//! One command per line:
//!
//! ```text
//! register <username> <password>
//! login <username> <password>
//! words
//! pick <0-2>
//! draw <prevX> <prevY> <x> <y> <color> <width>
//! restart
//! stats
//! ```

use crate::error::ConsoleError;
use log::{error, warn};
use shared::{timestamp_millis, Stroke};
use std::str::FromStr;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

/// An action requested by the operator of the host
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostCommand {
    Register {
        username: String,
        password: String,
        timestamp: i64,
    },
    Login {
        username: String,
        password: String,
    },
    RequestWords,
    Pick(usize),
    Draw(Stroke),
    Restart,
    Stats,
}

/// Parses one console line; `timestamp` salts a new account's password
pub fn parse_command(line: &str, timestamp: i64) -> Result<HostCommand, ConsoleError> {
    let mut args = line.split_whitespace();
    let command = args.next().ok_or(ConsoleError::Empty)?;

    match command {
        "register" => Ok(HostCommand::Register {
            username: word(&mut args, "register", "username")?,
            password: word(&mut args, "register", "password")?,
            timestamp,
        }),
        "login" => Ok(HostCommand::Login {
            username: word(&mut args, "login", "username")?,
            password: word(&mut args, "login", "password")?,
        }),
        "words" => Ok(HostCommand::RequestWords),
        "pick" => Ok(HostCommand::Pick(number(&mut args, "pick", "index")?)),
        "draw" => Ok(HostCommand::Draw(Stroke {
            prev_x: number(&mut args, "draw", "prevX")?,
            prev_y: number(&mut args, "draw", "prevY")?,
            x: number(&mut args, "draw", "x")?,
            y: number(&mut args, "draw", "y")?,
            color: number(&mut args, "draw", "color")?,
            width: number(&mut args, "draw", "width")?,
        })),
        "restart" => Ok(HostCommand::Restart),
        "stats" => Ok(HostCommand::Stats),
        other => Err(ConsoleError::UnknownCommand(other.to_string())),
    }
}

fn word<'a>(
    args: &mut impl Iterator<Item = &'a str>,
    command: &'static str,
    argument: &'static str,
) -> Result<String, ConsoleError> {
    args.next()
        .map(str::to_string)
        .ok_or(ConsoleError::MissingArgument { command, argument })
}

fn number<'a, T: FromStr>(
    args: &mut impl Iterator<Item = &'a str>,
    command: &'static str,
    argument: &'static str,
) -> Result<T, ConsoleError> {
    let value = args
        .next()
        .ok_or(ConsoleError::MissingArgument { command, argument })?;
    value.parse().map_err(|_| ConsoleError::InvalidNumber {
        argument,
        value: value.to_string(),
    })
}

/// Reads stdin line by line and forwards parsed commands until EOF
pub async fn read_commands(commands: mpsc::UnboundedSender<HostCommand>) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        match lines.next_line().await {
            Ok(Some(line)) => match parse_command(&line, timestamp_millis()) {
                Ok(command) => {
                    if commands.send(command).is_err() {
                        break;
                    }
                }
                Err(ConsoleError::Empty) => {}
                Err(e) => warn!("{}", e),
            },
            Ok(None) => break,
            Err(e) => {
                error!("Failed to read console input: {}", e);
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_account_commands() {
        assert_eq!(
            parse_command("register alice secret", 99),
            Ok(HostCommand::Register {
                username: "alice".to_string(),
                password: "secret".to_string(),
                timestamp: 99,
            })
        );
        assert_eq!(
            parse_command("  login alice secret  ", 0),
            Ok(HostCommand::Login {
                username: "alice".to_string(),
                password: "secret".to_string(),
            })
        );
    }

    #[test]
    fn test_parse_round_commands() {
        assert_eq!(parse_command("words", 0), Ok(HostCommand::RequestWords));
        assert_eq!(parse_command("pick 2", 0), Ok(HostCommand::Pick(2)));
        assert_eq!(parse_command("restart", 0), Ok(HostCommand::Restart));
        assert_eq!(parse_command("stats", 0), Ok(HostCommand::Stats));
        assert_eq!(
            parse_command("draw 10 20 -5 40 16711680 3", 0),
            Ok(HostCommand::Draw(Stroke {
                prev_x: 10,
                prev_y: 20,
                x: -5,
                y: 40,
                color: 16711680,
                width: 3,
            }))
        );
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(parse_command("   ", 0), Err(ConsoleError::Empty));
        assert_eq!(
            parse_command("dance", 0),
            Err(ConsoleError::UnknownCommand("dance".to_string()))
        );
        assert_eq!(
            parse_command("login alice", 0),
            Err(ConsoleError::MissingArgument {
                command: "login",
                argument: "password",
            })
        );
        assert_eq!(
            parse_command("pick one", 0),
            Err(ConsoleError::InvalidNumber {
                argument: "index",
                value: "one".to_string(),
            })
        );
        assert_eq!(
            parse_command("draw 1 2 3", 0),
            Err(ConsoleError::MissingArgument {
                command: "draw",
                argument: "y",
            })
        );
    }
}
