use crate::error::ConnectivityError;
use crate::input::parse_line;
use crate::session::{ClientEvent, ClientSession};
use log::{debug, info, warn};
use shared::{timestamp_millis, FrameBuffer, Message};
use std::fmt;
use std::io::ErrorKind;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval, timeout, MissedTickBehavior};

const READ_BUFFER_SIZE: usize = 4096;
const CONNECT_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStatus {
    Connected,
    Disconnected,
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionStatus::Connected => write!(f, "Connected"),
            ConnectionStatus::Disconnected => write!(f, "Disconnected"),
        }
    }
}

pub struct Client {
    server_addr: String,
    stream: Option<TcpStream>,
    /// Connect attempt running in the background while the loop keeps ticking
    pending_connect: Option<JoinHandle<Result<TcpStream, ConnectivityError>>>,
    frames: FrameBuffer,
    session: ClientSession,
    tick_duration: Duration,
    /// Set once a reconnect failure has been reported, to avoid logging every tick
    reported_offline: bool,
}

impl Client {
    pub fn new(server_addr: &str, session: ClientSession, tick_duration: Duration) -> Self {
        Client {
            server_addr: server_addr.to_string(),
            stream: None,
            pending_connect: None,
            frames: FrameBuffer::new(),
            session,
            tick_duration,
            reported_offline: false,
        }
    }

    pub fn status(&self) -> ConnectionStatus {
        if self.stream.is_some() {
            ConnectionStatus::Connected
        } else {
            ConnectionStatus::Disconnected
        }
    }

    pub fn session(&self) -> &ClientSession {
        &self.session
    }

    /// Starts a connect attempt, or picks up the stream once one has finished
    async fn connect(&mut self) -> Result<(), ConnectivityError> {
        let handle = match self.pending_connect.take() {
            Some(handle) if handle.is_finished() => handle,
            Some(handle) => {
                self.pending_connect = Some(handle);
                return Ok(());
            }
            None => {
                let addr = self.server_addr.clone();
                self.pending_connect = Some(tokio::spawn(open_stream(addr)));
                return Ok(());
            }
        };

        let stream = handle.await.map_err(ConnectivityError::ConnectTask)??;

        info!("Status: {} to {}", ConnectionStatus::Connected, self.server_addr);
        // a fresh connection never continues a half-received frame
        self.frames = FrameBuffer::new();
        self.stream = Some(stream);
        self.reported_offline = false;
        Ok(())
    }

    fn disconnect(&mut self, reason: &ConnectivityError) {
        if self.stream.take().is_some() {
            warn!("Status: {} ({})", ConnectionStatus::Disconnected, reason);
        }
    }

    /// Drains whatever the socket has buffered without waiting
    fn poll_incoming(&mut self) -> Result<Vec<Message>, ConnectivityError> {
        let stream = self.stream.as_ref().ok_or(ConnectivityError::NotConnected)?;
        let mut buffer = [0u8; READ_BUFFER_SIZE];

        loop {
            match stream.try_read(&mut buffer) {
                Ok(0) => return Err(ConnectivityError::Closed),
                Ok(len) => self.frames.push(&buffer[..len]),
                Err(e) if e.kind() == ErrorKind::WouldBlock => break,
                Err(e) => return Err(ConnectivityError::Read(e)),
            }
        }

        let mut messages = Vec::new();
        for frame in self.frames.frames() {
            match frame.map_err(|e| e.to_string()).and_then(|payload| {
                Message::decode(&payload).map_err(|e| e.to_string())
            }) {
                Ok(message) => messages.push(message),
                Err(e) => debug!("Dropping message from host: {}", e),
            }
        }
        Ok(messages)
    }

    async fn send_outbox(&mut self) -> Result<(), ConnectivityError> {
        let outgoing = self.session.drain_outbox();
        let stream = match self.stream.as_mut() {
            Some(stream) => stream,
            None => {
                if !outgoing.is_empty() {
                    warn!("Not connected, {} message(s) not sent", outgoing.len());
                }
                return Ok(());
            }
        };

        for message in outgoing {
            stream
                .write_all(message.to_frame().as_bytes())
                .await
                .map_err(ConnectivityError::Write)?;
        }
        Ok(())
    }

    fn handle_line(&mut self, line: &str) {
        let input = match parse_line(line) {
            Ok(Some(input)) => input,
            Ok(None) => return,
            Err(e) => {
                println!("{}", e);
                return;
            }
        };

        if let Err(e) = self.session.apply_input(input, timestamp_millis()) {
            println!("{}", e);
        }
    }

    fn show(&self, event: &ClientEvent) {
        println!("{}", event);
    }

    /// One pass of the client loop: reconnect, read, react, heartbeat, send
    async fn tick(&mut self) {
        if self.stream.is_none() {
            if let Err(e) = self.connect().await {
                if !self.reported_offline {
                    warn!("Status: {} ({}), retrying", ConnectionStatus::Disconnected, e);
                    self.reported_offline = true;
                }
            }
        }

        if self.stream.is_some() {
            match self.poll_incoming() {
                Ok(messages) => {
                    for message in messages {
                        if let Some(event) = self.session.handle_message(message) {
                            self.show(&event);
                        }
                    }
                }
                Err(e) => self.disconnect(&e),
            }
        }

        if self.stream.is_some() {
            self.session.tick();
        }

        if let Err(e) = self.send_outbox().await {
            self.disconnect(&e);
        }
    }

    /// Runs until stdin closes
    pub async fn run(&mut self, mut lines: mpsc::UnboundedReceiver<String>) {
        let mut tick_interval = interval(self.tick_duration);
        tick_interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        println!("Type /register <name> <password> or /login <name> <password>");

        loop {
            tokio::select! {
                line = lines.recv() => match line {
                    Some(line) => self.handle_line(&line),
                    None => {
                        info!("Input closed, exiting");
                        break;
                    }
                },

                _ = tick_interval.tick() => self.tick().await,
            }
        }

        // flush anything typed just before EOF
        if let Err(e) = self.send_outbox().await {
            debug!("Final send failed: {}", e);
        }
    }
}

async fn open_stream(addr: String) -> Result<TcpStream, ConnectivityError> {
    match timeout(CONNECT_TIMEOUT, TcpStream::connect(&addr)).await {
        Ok(Ok(stream)) => Ok(stream),
        Ok(Err(source)) => Err(ConnectivityError::Connect { addr, source }),
        Err(_) => Err(ConnectivityError::ConnectTimeout { addr }),
    }
}
