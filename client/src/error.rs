use thiserror::Error;

/// The connection to the host is unusable; the client reconnects on the next tick
#[derive(Debug, Error)]
pub enum ConnectivityError {
    #[error("failed to connect to {addr}: {source}")]
    Connect {
        addr: String,
        source: std::io::Error,
    },

    #[error("timed out connecting to {addr}")]
    ConnectTimeout { addr: String },

    #[error("connect task failed: {0}")]
    ConnectTask(tokio::task::JoinError),

    #[error("not connected")]
    NotConnected,

    #[error("connection closed by host")]
    Closed,

    #[error("read failed: {0}")]
    Read(std::io::Error),

    #[error("write failed: {0}")]
    Write(std::io::Error),
}

/// A line typed by the player could not be turned into an action
#[derive(Debug, Error, PartialEq, Eq)]
pub enum InputError {
    #[error("'{command}' needs a {argument}")]
    MissingArgument {
        command: &'static str,
        argument: &'static str,
    },

    #[error("unknown command '{0}'")]
    UnknownCommand(String),

    #[error("log in before chatting")]
    NotLoggedIn,
}
