//! Typed messages and their `;;;`-separated text encoding
//!
//! Fields are positional and never escaped. A free-text field that contains
//! the separator shifts every later field; for `Chat` the text is cut at the
//! first separator and the remainder is dropped.

use crate::error::ProtocolError;
use crate::framing;
use crate::{FIELD_SEPARATOR, FRAME_END, FRAME_START};
use std::str::FromStr;

const LOGIN_FAILED: &str = "LoginFailed";
const USER_CREATED: &str = "UserCreatedSuccessfully";
const USER_CREATION_FAILED: &str = "UserCreationFailed";

/// True for names that cannot round-trip through the wire format
///
/// `LoginFailed` stands for a rejected login in `UserLoginResponse`, and the
/// framing and separator tokens would split the name across fields or frames.
pub fn is_reserved_username(username: &str) -> bool {
    username == LOGIN_FAILED
        || username.contains(FIELD_SEPARATOR)
        || username.contains(FRAME_START)
        || username.contains(FRAME_END)
}

/// One relayed line segment, in canvas-relative coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stroke {
    pub prev_x: i32,
    pub prev_y: i32,
    pub x: i32,
    pub y: i32,
    /// Packed ARGB color as a signed 32-bit value
    pub color: i32,
    pub width: i32,
}

/// Public view of an account returned on successful login
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountSummary {
    pub username: String,
    pub score: u32,
    pub created_at: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    Chat {
        username: String,
        text: String,
    },
    Draw(Stroke),
    ValidateUserLogin {
        correlation_id: u32,
        username: String,
        password: String,
    },
    /// `account` is `None` when the credentials were rejected
    UserLoginResponse {
        correlation_id: u32,
        account: Option<AccountSummary>,
    },
    CreateUser {
        correlation_id: u32,
        username: String,
        password: String,
        timestamp: i64,
    },
    UserCreatedResponse {
        correlation_id: u32,
        created: bool,
    },
    UserHeartbeat {
        username: String,
    },
    ConnectedUsers(Vec<String>),
    RequestUserStats {
        username: String,
    },
    UserStats {
        username: String,
        score: u32,
        rank: i64,
    },
    Gamestart,
    Winner {
        username: String,
    },
    Topscores(Vec<(String, u32)>),
}

impl Message {
    /// The type tag that leads the payload
    pub fn kind(&self) -> &'static str {
        match self {
            Message::Chat { .. } => "Chat",
            Message::Draw(_) => "Draw",
            Message::ValidateUserLogin { .. } => "ValidateUserLogin",
            Message::UserLoginResponse { .. } => "UserLoginResponse",
            Message::CreateUser { .. } => "CreateUser",
            Message::UserCreatedResponse { .. } => "UserCreatedResponse",
            Message::UserHeartbeat { .. } => "UserHeartbeat",
            Message::ConnectedUsers(_) => "ConnectedUsers",
            Message::RequestUserStats { .. } => "RequestUserStats",
            Message::UserStats { .. } => "UserStats",
            Message::Gamestart => "Gamestart",
            Message::Winner { .. } => "Winner",
            Message::Topscores(_) => "Topscores",
        }
    }

    /// Parses a payload (without sentinels) into a message
    pub fn decode(payload: &str) -> Result<Self, ProtocolError> {
        let mut parts = payload.split(FIELD_SEPARATOR);
        let tag = match parts.next() {
            Some(tag) if !tag.is_empty() => tag,
            _ => return Err(ProtocolError::Empty),
        };
        let rest: Vec<&str> = parts.collect();

        let message = match tag {
            "Chat" => {
                let f = Fields::new("Chat", &rest);
                Message::Chat {
                    username: f.text(0)?,
                    text: f.text(1)?,
                }
            }
            "Draw" => {
                let f = Fields::new("Draw", &rest);
                Message::Draw(Stroke {
                    prev_x: f.number(0, "prevX")?,
                    prev_y: f.number(1, "prevY")?,
                    x: f.number(2, "x")?,
                    y: f.number(3, "y")?,
                    color: f.number(4, "color")?,
                    width: f.number(5, "strokeWidth")?,
                })
            }
            "ValidateUserLogin" => {
                let f = Fields::new("ValidateUserLogin", &rest);
                Message::ValidateUserLogin {
                    correlation_id: f.number(0, "correlationId")?,
                    username: f.text(1)?,
                    password: f.text(2)?,
                }
            }
            "UserLoginResponse" => {
                let f = Fields::new("UserLoginResponse", &rest);
                let correlation_id = f.number(0, "correlationId")?;
                let username = f.text(1)?;
                let account = if username == LOGIN_FAILED {
                    None
                } else {
                    Some(AccountSummary {
                        username,
                        score: f.number(2, "score")?,
                        created_at: f.number(3, "createdTimestamp")?,
                    })
                };
                Message::UserLoginResponse {
                    correlation_id,
                    account,
                }
            }
            "CreateUser" => {
                let f = Fields::new("CreateUser", &rest);
                Message::CreateUser {
                    correlation_id: f.number(0, "correlationId")?,
                    username: f.text(1)?,
                    password: f.text(2)?,
                    timestamp: f.number(3, "timestamp")?,
                }
            }
            "UserCreatedResponse" => {
                let f = Fields::new("UserCreatedResponse", &rest);
                let correlation_id = f.number(0, "correlationId")?;
                let created = match f.raw(1)? {
                    USER_CREATED => true,
                    USER_CREATION_FAILED => false,
                    other => {
                        return Err(ProtocolError::MalformedField {
                            field: "status",
                            value: other.to_string(),
                        })
                    }
                };
                Message::UserCreatedResponse {
                    correlation_id,
                    created,
                }
            }
            "UserHeartbeat" => Message::UserHeartbeat {
                username: Fields::new("UserHeartbeat", &rest).text(0)?,
            },
            "ConnectedUsers" => {
                Message::ConnectedUsers(rest.iter().map(|name| name.to_string()).collect())
            }
            "RequestUserStats" => Message::RequestUserStats {
                username: Fields::new("RequestUserStats", &rest).text(0)?,
            },
            "UserStats" => {
                let f = Fields::new("UserStats", &rest);
                Message::UserStats {
                    username: f.text(0)?,
                    score: f.number(1, "score")?,
                    rank: f.number(2, "rank")?,
                }
            }
            "Gamestart" => Message::Gamestart,
            "Winner" => Message::Winner {
                username: Fields::new("Winner", &rest).text(0)?,
            },
            "Topscores" => {
                if rest.len() % 2 != 0 {
                    return Err(ProtocolError::UnpairedField { kind: "Topscores" });
                }
                let mut scores: Vec<(String, u32)> = Vec::with_capacity(rest.len() / 2);
                for pair in rest.chunks(2) {
                    let score = pair[1]
                        .parse::<u32>()
                        .map_err(|_| ProtocolError::MalformedField {
                            field: "score",
                            value: pair[1].to_string(),
                        })?;
                    scores.push((pair[0].to_string(), score));
                }
                Message::Topscores(scores)
            }
            other => return Err(ProtocolError::UnknownType(other.to_string())),
        };

        Ok(message)
    }

    /// Builds the payload (without sentinels)
    pub fn encode(&self) -> String {
        let mut fields: Vec<String> = vec![self.kind().to_string()];

        match self {
            Message::Chat { username, text } => {
                fields.push(username.clone());
                fields.push(text.clone());
            }
            Message::Draw(stroke) => {
                fields.extend(
                    [
                        stroke.prev_x,
                        stroke.prev_y,
                        stroke.x,
                        stroke.y,
                        stroke.color,
                        stroke.width,
                    ]
                    .iter()
                    .map(|v| v.to_string()),
                );
            }
            Message::ValidateUserLogin {
                correlation_id,
                username,
                password,
            } => {
                fields.push(correlation_id.to_string());
                fields.push(username.clone());
                fields.push(password.clone());
            }
            Message::UserLoginResponse {
                correlation_id,
                account,
            } => {
                fields.push(correlation_id.to_string());
                match account {
                    Some(account) => {
                        fields.push(account.username.clone());
                        fields.push(account.score.to_string());
                        fields.push(account.created_at.to_string());
                    }
                    None => {
                        fields.push(LOGIN_FAILED.to_string());
                        fields.push("0".to_string());
                        fields.push("0".to_string());
                    }
                }
            }
            Message::CreateUser {
                correlation_id,
                username,
                password,
                timestamp,
            } => {
                fields.push(correlation_id.to_string());
                fields.push(username.clone());
                fields.push(password.clone());
                fields.push(timestamp.to_string());
            }
            Message::UserCreatedResponse {
                correlation_id,
                created,
            } => {
                fields.push(correlation_id.to_string());
                let status = if *created {
                    USER_CREATED
                } else {
                    USER_CREATION_FAILED
                };
                fields.push(status.to_string());
            }
            Message::UserHeartbeat { username }
            | Message::RequestUserStats { username }
            | Message::Winner { username } => fields.push(username.clone()),
            Message::ConnectedUsers(users) => fields.extend(users.iter().cloned()),
            Message::UserStats {
                username,
                score,
                rank,
            } => {
                fields.push(username.clone());
                fields.push(score.to_string());
                fields.push(rank.to_string());
            }
            Message::Gamestart => {}
            Message::Topscores(scores) => {
                for (username, score) in scores {
                    fields.push(username.clone());
                    fields.push(score.to_string());
                }
            }
        }

        fields.join(FIELD_SEPARATOR)
    }

    /// Builds the full wire frame, sentinels included
    pub fn to_frame(&self) -> String {
        framing::wrap(&self.encode())
    }
}

/// Positional field access with typed errors
struct Fields<'a, 'b> {
    kind: &'static str,
    parts: &'b [&'a str],
}

impl<'a, 'b> Fields<'a, 'b> {
    fn new(kind: &'static str, parts: &'b [&'a str]) -> Self {
        Self { kind, parts }
    }

    fn raw(&self, index: usize) -> Result<&'a str, ProtocolError> {
        self.parts
            .get(index)
            .copied()
            .ok_or(ProtocolError::MissingField {
                kind: self.kind,
                index,
            })
    }

    fn text(&self, index: usize) -> Result<String, ProtocolError> {
        self.raw(index).map(str::to_string)
    }

    fn number<T: FromStr>(&self, index: usize, field: &'static str) -> Result<T, ProtocolError> {
        let raw = self.raw(index)?;
        raw.parse().map_err(|_| ProtocolError::MalformedField {
            field,
            value: raw.to_string(),
        })
    }
}
