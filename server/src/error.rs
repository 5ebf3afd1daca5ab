use thiserror::Error;

/// A call to the durable user/word store failed
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("failed to prepare database directory: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum UserError {
    #[error("user '{0}' already exists")]
    DuplicateUser(String),

    #[error("'{0}' cannot be used as a username")]
    ReservedName(String),

    /// Covers both an unknown username and a wrong password
    #[error("invalid username or password")]
    AuthFailure,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum WordError {
    #[error("word corpus has {available} entries, at least {required} are needed")]
    CorpusTooSmall { available: usize, required: usize },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RoundError {
    #[error("cannot {action} while the round is {state}")]
    InvalidTransition {
        action: &'static str,
        state: &'static str,
    },

    #[error("no word candidate at index {0}")]
    NoSuchCandidate(usize),

    #[error("no drawing account is logged in on the host")]
    NoDrawingAuthority,

    #[error(transparent)]
    Words(#[from] WordError),
}

/// A host console command could not be carried out
#[derive(Debug, Error, PartialEq, Eq)]
pub enum HostError {
    #[error(transparent)]
    User(#[from] UserError),

    #[error(transparent)]
    Round(#[from] RoundError),

    #[error("'{0}' is already logged in as the drawing account")]
    AlreadyLoggedIn(String),
}

/// A console line did not parse into a host command
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConsoleError {
    #[error("empty command")]
    Empty,

    #[error("unknown command '{0}'")]
    UnknownCommand(String),

    #[error("'{command}' needs a {argument} argument")]
    MissingArgument {
        command: &'static str,
        argument: &'static str,
    },

    #[error("'{value}' is not a valid {argument}")]
    InvalidNumber {
        argument: &'static str,
        value: String,
    },
}
