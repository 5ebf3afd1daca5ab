//! Client-side view of the game and the messages it sends
//!
//! Replies from the host are broadcast to every client, so each client
//! tags its requests with a random correlation id and ignores responses
//! carrying anyone else's.

use crate::error::InputError;
use crate::input::PlayerInput;
use log::{debug, info};
use rand::Rng;
use shared::{AccountSummary, Message, Stroke};
use std::fmt;

/// Correlation ids are drawn from this range once per client session
pub const CORRELATION_ID_RANGE: std::ops::Range<u32> = 1_000_000..10_000_000;

/// Something the player should be shown
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientEvent {
    Chat { username: String, text: String },
    Stroke(Stroke),
    RoundStarted,
    Winner { username: String, is_self: bool },
    LoggedIn(AccountSummary),
    LoginFailed,
    Registered,
    RegistrationFailed,
    Stats { score: u32, rank: i64 },
}

impl fmt::Display for ClientEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClientEvent::Chat { username, text } => write!(f, "{}: {}", username, text),
            ClientEvent::Stroke(s) => write!(
                f,
                "~ stroke ({}, {}) -> ({}, {}) color {} width {}",
                s.prev_x, s.prev_y, s.x, s.y, s.color, s.width
            ),
            ClientEvent::RoundStarted => write!(f, "A new round has started, start guessing!"),
            ClientEvent::Winner { username, is_self } => {
                if *is_self {
                    write!(f, "You guessed the word!")
                } else {
                    write!(f, "{} guessed the word!", username)
                }
            }
            ClientEvent::LoggedIn(account) => write!(
                f,
                "Logged in as {} with {} points",
                account.username, account.score
            ),
            ClientEvent::LoginFailed => write!(f, "Login failed: wrong username or password"),
            ClientEvent::Registered => write!(f, "Account created, you can now /login"),
            ClientEvent::RegistrationFailed => write!(f, "Account creation failed: name taken"),
            ClientEvent::Stats { score, rank } => write!(f, "Score {} (rank {})", score, rank),
        }
    }
}

pub struct ClientSession {
    correlation_id: u32,
    account: Option<AccountSummary>,
    stats: Option<(u32, i64)>,
    roster: Vec<String>,
    leaderboard: Vec<(String, u32)>,
    /// Strokes of the current round, in arrival order
    canvas: Vec<Stroke>,
    outbox: Vec<Message>,
}

impl ClientSession {
    pub fn new<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self::with_correlation_id(rng.gen_range(CORRELATION_ID_RANGE))
    }

    pub fn with_correlation_id(correlation_id: u32) -> Self {
        Self {
            correlation_id,
            account: None,
            stats: None,
            roster: Vec::new(),
            leaderboard: Vec::new(),
            canvas: Vec::new(),
            outbox: Vec::new(),
        }
    }

    pub fn correlation_id(&self) -> u32 {
        self.correlation_id
    }

    pub fn username(&self) -> Option<&str> {
        self.account.as_ref().map(|a| a.username.as_str())
    }

    pub fn is_logged_in(&self) -> bool {
        self.account.is_some()
    }

    /// Latest (score, rank) reported for this account
    pub fn stats(&self) -> Option<(u32, i64)> {
        self.stats
    }

    pub fn roster(&self) -> &[String] {
        &self.roster
    }

    pub fn leaderboard(&self) -> &[(String, u32)] {
        &self.leaderboard
    }

    pub fn canvas(&self) -> &[Stroke] {
        &self.canvas
    }

    /// Takes every message queued for the host since the last drain
    pub fn drain_outbox(&mut self) -> Vec<Message> {
        std::mem::take(&mut self.outbox)
    }

    /// Queues the message(s) for a player action
    pub fn apply_input(&mut self, input: PlayerInput, timestamp: i64) -> Result<(), InputError> {
        match input {
            PlayerInput::Login { username, password } => {
                self.outbox.push(Message::ValidateUserLogin {
                    correlation_id: self.correlation_id,
                    username,
                    password,
                });
            }
            PlayerInput::Register { username, password } => {
                self.outbox.push(Message::CreateUser {
                    correlation_id: self.correlation_id,
                    username,
                    password,
                    timestamp,
                });
            }
            PlayerInput::Chat(text) => {
                let username = self.username().ok_or(InputError::NotLoggedIn)?.to_string();
                self.outbox.push(Message::Chat { username, text });
            }
        }
        Ok(())
    }

    /// Per-tick heartbeat while logged in
    pub fn tick(&mut self) {
        if let Some(username) = self.username() {
            let username = username.to_string();
            self.outbox.push(Message::UserHeartbeat { username });
        }
    }

    /// Applies one message from the host, returning what to show the player
    pub fn handle_message(&mut self, message: Message) -> Option<ClientEvent> {
        match message {
            Message::Chat { username, text } => Some(ClientEvent::Chat { username, text }),

            Message::Draw(stroke) => {
                self.canvas.push(stroke);
                Some(ClientEvent::Stroke(stroke))
            }

            Message::Gamestart => {
                self.canvas.clear();
                Some(ClientEvent::RoundStarted)
            }

            Message::Winner { username } => {
                self.request_stats();
                let is_self = self.username() == Some(username.as_str());
                Some(ClientEvent::Winner { username, is_self })
            }

            Message::UserLoginResponse {
                correlation_id,
                account,
            } if correlation_id == self.correlation_id => match account {
                Some(account) => {
                    info!("Logged in as {}", account.username);
                    self.account = Some(account.clone());
                    self.request_stats();
                    Some(ClientEvent::LoggedIn(account))
                }
                None => Some(ClientEvent::LoginFailed),
            },

            Message::UserCreatedResponse {
                correlation_id,
                created,
            } if correlation_id == self.correlation_id => Some(if created {
                ClientEvent::Registered
            } else {
                ClientEvent::RegistrationFailed
            }),

            Message::UserStats {
                username,
                score,
                rank,
            } if self.username() == Some(username.as_str()) => {
                self.stats = Some((score, rank));
                Some(ClientEvent::Stats { score, rank })
            }

            Message::ConnectedUsers(roster) => {
                self.roster = roster;
                None
            }

            Message::Topscores(leaderboard) => {
                self.leaderboard = leaderboard;
                None
            }

            other => {
                debug!("Ignoring {} message", other.kind());
                None
            }
        }
    }

    fn request_stats(&mut self) {
        if let Some(username) = self.username() {
            let username = username.to_string();
            self.outbox.push(Message::RequestUserStats { username });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn alice() -> AccountSummary {
        AccountSummary {
            username: "alice".to_string(),
            score: 600,
            created_at: 1715000000000,
        }
    }

    fn logged_in() -> ClientSession {
        let mut session = ClientSession::with_correlation_id(1234567);
        session.handle_message(Message::UserLoginResponse {
            correlation_id: 1234567,
            account: Some(alice()),
        });
        session.drain_outbox();
        session
    }

    #[test]
    fn test_correlation_id_range() {
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..100 {
            let id = ClientSession::new(&mut rng).correlation_id();
            assert!(CORRELATION_ID_RANGE.contains(&id));
        }
    }

    #[test]
    fn test_login_request_uses_correlation_id() {
        let mut session = ClientSession::with_correlation_id(1234567);
        session
            .apply_input(
                PlayerInput::Login {
                    username: "alice".to_string(),
                    password: "pw".to_string(),
                },
                0,
            )
            .unwrap();

        assert_eq!(
            session.drain_outbox(),
            vec![Message::ValidateUserLogin {
                correlation_id: 1234567,
                username: "alice".to_string(),
                password: "pw".to_string(),
            }]
        );
    }

    #[test]
    fn test_login_response_requests_stats() {
        let mut session = ClientSession::with_correlation_id(1234567);

        let event = session.handle_message(Message::UserLoginResponse {
            correlation_id: 1234567,
            account: Some(alice()),
        });

        assert_eq!(event, Some(ClientEvent::LoggedIn(alice())));
        assert_eq!(session.username(), Some("alice"));
        assert_eq!(
            session.drain_outbox(),
            vec![Message::RequestUserStats {
                username: "alice".to_string(),
            }]
        );
    }

    #[test]
    fn test_foreign_responses_are_ignored() {
        let mut session = ClientSession::with_correlation_id(1234567);

        assert_eq!(
            session.handle_message(Message::UserLoginResponse {
                correlation_id: 7654321,
                account: Some(alice()),
            }),
            None
        );
        assert_eq!(
            session.handle_message(Message::UserCreatedResponse {
                correlation_id: 7654321,
                created: true,
            }),
            None
        );
        assert!(!session.is_logged_in());
        assert!(session.drain_outbox().is_empty());
    }

    #[test]
    fn test_failed_login_and_registration() {
        let mut session = ClientSession::with_correlation_id(5);

        assert_eq!(
            session.handle_message(Message::UserLoginResponse {
                correlation_id: 5,
                account: None,
            }),
            Some(ClientEvent::LoginFailed)
        );
        assert_eq!(
            session.handle_message(Message::UserCreatedResponse {
                correlation_id: 5,
                created: false,
            }),
            Some(ClientEvent::RegistrationFailed)
        );
    }

    #[test]
    fn test_chat_requires_login() {
        let mut session = ClientSession::with_correlation_id(5);
        assert_eq!(
            session.apply_input(PlayerInput::Chat("hi".to_string()), 0),
            Err(InputError::NotLoggedIn)
        );

        let mut session = logged_in();
        session
            .apply_input(PlayerInput::Chat("tree".to_string()), 0)
            .unwrap();
        assert_eq!(
            session.drain_outbox(),
            vec![Message::Chat {
                username: "alice".to_string(),
                text: "tree".to_string(),
            }]
        );
    }

    #[test]
    fn test_heartbeat_only_when_logged_in() {
        let mut session = ClientSession::with_correlation_id(5);
        session.tick();
        assert!(session.drain_outbox().is_empty());

        let mut session = logged_in();
        session.tick();
        assert_eq!(
            session.drain_outbox(),
            vec![Message::UserHeartbeat {
                username: "alice".to_string(),
            }]
        );
    }

    #[test]
    fn test_winner_refreshes_stats() {
        let mut session = logged_in();

        let event = session.handle_message(Message::Winner {
            username: "bob".to_string(),
        });
        assert_eq!(
            event,
            Some(ClientEvent::Winner {
                username: "bob".to_string(),
                is_self: false,
            })
        );
        assert_eq!(
            session.drain_outbox(),
            vec![Message::RequestUserStats {
                username: "alice".to_string(),
            }]
        );

        session.handle_message(Message::UserStats {
            username: "bob".to_string(),
            score: 200,
            rank: 1,
        });
        assert_eq!(session.stats(), None);

        session.handle_message(Message::UserStats {
            username: "alice".to_string(),
            score: 600,
            rank: 2,
        });
        assert_eq!(session.stats(), Some((600, 2)));
    }

    #[test]
    fn test_round_start_clears_canvas() {
        let mut session = logged_in();
        let stroke = Stroke {
            prev_x: 0,
            prev_y: 0,
            x: 10,
            y: 10,
            color: 255,
            width: 2,
        };

        session.handle_message(Message::Draw(stroke));
        session.handle_message(Message::Draw(stroke));
        assert_eq!(session.canvas().len(), 2);

        assert_eq!(
            session.handle_message(Message::Gamestart),
            Some(ClientEvent::RoundStarted)
        );
        assert!(session.canvas().is_empty());
    }

    #[test]
    fn test_roster_and_leaderboard_updates() {
        let mut session = ClientSession::with_correlation_id(5);

        assert_eq!(
            session.handle_message(Message::ConnectedUsers(vec!["bob".to_string()])),
            None
        );
        assert_eq!(
            session.handle_message(Message::Topscores(vec![("bob".to_string(), 400)])),
            None
        );
        assert_eq!(session.roster(), ["bob".to_string()]);
        assert_eq!(session.leaderboard(), [("bob".to_string(), 400)]);
    }
}
