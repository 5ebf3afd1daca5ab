//! Message dispatch and the host-side game session
//!
//! [`Session`] owns every piece of authoritative state: accounts, the word
//! corpus, presence, and the round. The network loop feeds it decoded client
//! frames and host console commands; everything the session wants broadcast
//! is queued in an outbox that the loop drains and sends to every client.

use crate::console::HostCommand;
use crate::error::{HostError, RoundError};
use crate::presence::PresenceTracker;
use crate::round::{Resolution, Round};
use crate::users::{Persistence, UserList};
use crate::words::{WordEntry, WordList};
use log::{debug, error, info, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;
use shared::{AccountSummary, Message};
use std::fmt;
use std::time::Instant;

/// Default number of leaderboard rows broadcast each tick
pub const DEFAULT_TOP_SCORES: usize = 3;

/// What a successful host command produced, for the operator's console
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostFeedback {
    Registered(String),
    LoggedIn { account: AccountSummary, rank: i64 },
    Candidates(Vec<String>),
    RoundStarted(String),
    StrokeRelayed,
    Stats { username: String, score: u32, rank: i64 },
}

impl fmt::Display for HostFeedback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HostFeedback::Registered(username) => write!(f, "Registered account {}", username),
            HostFeedback::LoggedIn { account, rank } => write!(
                f,
                "Logged in as {} (score {}, rank {})",
                account.username, account.score, rank
            ),
            HostFeedback::Candidates(labels) => {
                write!(f, "Pick a word:")?;
                for (i, label) in labels.iter().enumerate() {
                    write!(f, " [{}] {}", i, label)?;
                }
                Ok(())
            }
            HostFeedback::RoundStarted(label) => write!(f, "Round started, draw '{}'", label),
            HostFeedback::StrokeRelayed => write!(f, "Stroke relayed"),
            HostFeedback::Stats {
                username,
                score,
                rank,
            } => write!(f, "{}: score {}, rank {}", username, score, rank),
        }
    }
}

pub struct Session {
    users: UserList,
    words: WordList,
    presence: PresenceTracker,
    round: Round,
    /// Account logged in on the host; the only one allowed to drive the round
    drawing_authority: Option<String>,
    rng: StdRng,
    top_scores: usize,
    outbox: Vec<Message>,
}

impl Session {
    pub fn new(users: UserList, words: WordList, top_scores: usize) -> Self {
        Self::with_rng(users, words, top_scores, StdRng::from_entropy())
    }

    /// Same as [`new`](Self::new) with a caller-provided random source
    pub fn with_rng(users: UserList, words: WordList, top_scores: usize, rng: StdRng) -> Self {
        Self {
            users,
            words,
            presence: PresenceTracker::default(),
            round: Round::new(),
            drawing_authority: None,
            rng,
            top_scores,
            outbox: Vec::new(),
        }
    }

    pub fn users(&self) -> &UserList {
        &self.users
    }

    pub fn round(&self) -> &Round {
        &self.round
    }

    pub fn presence(&self) -> &PresenceTracker {
        &self.presence
    }

    pub fn drawing_authority(&self) -> Option<&str> {
        self.drawing_authority.as_deref()
    }

    /// Takes every message queued for broadcast since the last drain
    pub fn drain_outbox(&mut self) -> Vec<Message> {
        std::mem::take(&mut self.outbox)
    }

    /// Decodes one frame payload and dispatches it; undecodable payloads are dropped
    pub fn handle_payload(&mut self, payload: &str, now: Instant) {
        match Message::decode(payload) {
            Ok(message) => self.handle_message(message, now),
            Err(e) => warn!("Dropping undecodable message: {}", e),
        }
    }

    /// Reacts to one message received from a client
    pub fn handle_message(&mut self, message: Message, now: Instant) {
        debug!("Dispatching {}", message.kind());

        match message {
            Message::Chat { username, text } => {
                let resolution = self.round.evaluate_guess(&username, &text, now);
                // echo first so the guess shows up before the winner
                self.outbox.push(Message::Chat { username, text });
                if let Some(resolution) = resolution {
                    self.resolve(resolution);
                }
            }

            Message::ValidateUserLogin {
                correlation_id,
                username,
                password,
            } => {
                let account = match self.users.validate_login(&username, &password) {
                    Ok(user) => {
                        info!("User {} logged in", username);
                        Some(user.summary())
                    }
                    Err(e) => {
                        info!("Login for {} rejected: {}", username, e);
                        None
                    }
                };
                self.outbox.push(Message::UserLoginResponse {
                    correlation_id,
                    account,
                });
            }

            Message::CreateUser {
                correlation_id,
                username,
                password,
                timestamp,
            } => {
                let created = match self.users.register(&username, &password, timestamp) {
                    Ok(persistence) => {
                        info!("Created account {}", username);
                        log_persistence(persistence, "new account");
                        true
                    }
                    Err(e) => {
                        info!("Account creation rejected: {}", e);
                        false
                    }
                };
                self.outbox.push(Message::UserCreatedResponse {
                    correlation_id,
                    created,
                });
            }

            Message::UserHeartbeat { username } => self.presence.heartbeat(&username),

            Message::RequestUserStats { username } => match self.users.get(&username) {
                Some(user) => {
                    let score = user.score;
                    let rank = self.users.rank(&username);
                    self.outbox.push(Message::UserStats {
                        username,
                        score,
                        rank,
                    });
                }
                None => debug!("Stats requested for unknown user {}", username),
            },

            other => warn!("Ignoring {} message sent by a client", other.kind()),
        }
    }

    /// Runs one operator command typed on the host
    pub fn handle_host(
        &mut self,
        command: HostCommand,
        now: Instant,
    ) -> Result<HostFeedback, HostError> {
        match command {
            HostCommand::Register {
                username,
                password,
                timestamp,
            } => {
                let persistence = self.users.register(&username, &password, timestamp)?;
                log_persistence(persistence, "new account");
                Ok(HostFeedback::Registered(username))
            }

            HostCommand::Login { username, password } => {
                if let Some(current) = &self.drawing_authority {
                    return Err(HostError::AlreadyLoggedIn(current.clone()));
                }
                let account = self.users.validate_login(&username, &password)?.summary();
                let rank = self.users.rank(&username);
                info!("Host is drawing as {}", username);
                self.drawing_authority = Some(username);
                Ok(HostFeedback::LoggedIn { account, rank })
            }

            HostCommand::RequestWords => {
                self.require_authority()?;
                let candidates = self.round.request_words(&self.words, &mut self.rng)?;
                Ok(HostFeedback::Candidates(labels(&candidates)))
            }

            HostCommand::Restart => {
                self.require_authority()?;
                let candidates = self.round.restart(&self.words, &mut self.rng)?;
                Ok(HostFeedback::Candidates(labels(&candidates)))
            }

            HostCommand::Pick(index) => {
                self.require_authority()?;
                let word = self.round.choose(index, now)?;
                self.outbox.push(Message::Gamestart);
                Ok(HostFeedback::RoundStarted(word.label().to_string()))
            }

            HostCommand::Draw(stroke) => {
                self.require_authority()?;
                let stroke = self.round.relay_stroke(stroke)?;
                self.outbox.push(Message::Draw(stroke));
                Ok(HostFeedback::StrokeRelayed)
            }

            HostCommand::Stats => {
                let username = self.require_authority()?.to_string();
                let score = self.users.get(&username).map_or(0, |user| user.score);
                let rank = self.users.rank(&username);
                Ok(HostFeedback::Stats {
                    username,
                    score,
                    rank,
                })
            }
        }
    }

    /// Per-tick housekeeping: presence aging plus roster and leaderboard broadcasts
    pub fn tick(&mut self) {
        if let Some(host) = &self.drawing_authority {
            self.presence.heartbeat(host);
        }

        let roster = self.presence.tick();
        self.outbox.push(Message::ConnectedUsers(roster));

        let top = self
            .users
            .top(self.top_scores)
            .into_iter()
            .map(|user| (user.username.clone(), user.score))
            .collect();
        self.outbox.push(Message::Topscores(top));
    }

    fn require_authority(&self) -> Result<&str, HostError> {
        self.drawing_authority
            .as_deref()
            .ok_or(HostError::Round(RoundError::NoDrawingAuthority))
    }

    /// Credits both parties for a finished round and announces the winner
    fn resolve(&mut self, resolution: Resolution) {
        match self
            .users
            .award_points(&resolution.winner, resolution.guesser_award)
        {
            Some(persistence) => log_persistence(persistence, "guesser score"),
            None => warn!(
                "Winner {} has no account, guess points not credited",
                resolution.winner
            ),
        }

        match &self.drawing_authority {
            Some(drawer) => {
                if let Some(persistence) = self.users.award_points(drawer, resolution.drawer_award)
                {
                    log_persistence(persistence, "drawer score");
                }
                info!(
                    "{} earned {} points for drawing '{}' (rank {})",
                    drawer,
                    resolution.drawer_award,
                    resolution.word.label(),
                    self.users.rank(drawer)
                );
            }
            None => warn!("Round resolved without a drawing account"),
        }

        self.outbox.push(Message::Winner {
            username: resolution.winner,
        });
    }
}

fn labels(candidates: &[WordEntry]) -> Vec<String> {
    candidates.iter().map(|w| w.label().to_string()).collect()
}

fn log_persistence(persistence: Persistence, what: &str) {
    if let Persistence::MemoryOnly(e) = persistence {
        error!("Failed to persist {}, keeping it in memory only: {}", what, e);
    }
}
