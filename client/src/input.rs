//! Player input from stdin: slash commands and chat lines

use crate::error::InputError;
use log::error;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

/// One action requested by the player
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayerInput {
    Login { username: String, password: String },
    Register { username: String, password: String },
    Chat(String),
}

/// Turns a typed line into an action; anything not starting with `/` is chat
///
/// Chat text is sent as typed, surrounding whitespace included. Blank lines
/// yield `None`.
pub fn parse_line(line: &str) -> Result<Option<PlayerInput>, InputError> {
    if line.trim().is_empty() {
        return Ok(None);
    }

    let Some(command) = line.strip_prefix('/') else {
        return Ok(Some(PlayerInput::Chat(line.to_string())));
    };

    let mut args = command.split_whitespace();
    match args.next() {
        Some("login") => {
            let (username, password) = credentials(&mut args, "/login")?;
            Ok(Some(PlayerInput::Login { username, password }))
        }
        Some("register") => {
            let (username, password) = credentials(&mut args, "/register")?;
            Ok(Some(PlayerInput::Register { username, password }))
        }
        Some(other) => Err(InputError::UnknownCommand(other.to_string())),
        None => Err(InputError::UnknownCommand(String::new())),
    }
}

fn credentials<'a>(
    args: &mut impl Iterator<Item = &'a str>,
    command: &'static str,
) -> Result<(String, String), InputError> {
    let username = args.next().ok_or(InputError::MissingArgument {
        command,
        argument: "username",
    })?;
    let password = args.next().ok_or(InputError::MissingArgument {
        command,
        argument: "password",
    })?;
    Ok((username.to_string(), password.to_string()))
}

/// Forwards stdin lines to the client loop until EOF
pub async fn read_lines(lines_tx: mpsc::UnboundedSender<String>) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                if lines_tx.send(line).is_err() {
                    break;
                }
            }
            Ok(None) => break,
            Err(e) => {
                error!("Failed to read input: {}", e);
                break;
            }
        }
    }
}
