//! Server network layer: TCP connections and the single-threaded game loop
//!
//! Each accepted connection gets a reader task that reassembles frames and
//! a writer task fed by a bounded per-client queue. A client whose queue
//! fills up is not keeping pace with the broadcasts and gets disconnected.
//! Only the main loop touches the
//! [`Session`]; it reacts to frames and host commands as they arrive, runs
//! housekeeping on every tick and broadcasts whatever the session queued.

use crate::console::HostCommand;
use crate::session::Session;
use log::{debug, error, info, warn};
use shared::FrameBuffer;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};

const READ_BUFFER_SIZE: usize = 4096;
/// Frames buffered per client before it is considered stalled
pub const OUTGOING_QUEUE_CAPACITY: usize = 256;

/// Messages sent from connection tasks to the main loop
#[derive(Debug)]
pub enum ServerMessage {
    ClientConnected {
        client_id: u32,
        addr: SocketAddr,
        outgoing: mpsc::Sender<String>,
        writer: JoinHandle<()>,
    },
    FrameReceived {
        client_id: u32,
        payload: String,
    },
    ConnectionClosed {
        client_id: u32,
    },
}

/// Main loop's end of one connection
struct ClientHandle {
    outgoing: mpsc::Sender<String>,
    writer: JoinHandle<()>,
}

pub struct Server {
    listener: Arc<TcpListener>,
    session: Session,
    tick_duration: Duration,
    /// Outgoing frame queue for every open connection
    clients: HashMap<u32, ClientHandle>,

    server_tx: mpsc::UnboundedSender<ServerMessage>,
    server_rx: mpsc::UnboundedReceiver<ServerMessage>,
}

impl Server {
    pub async fn bind(
        addr: &str,
        session: Session,
        tick_duration: Duration,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let listener = Arc::new(TcpListener::bind(addr).await?);
        info!("Server listening on {}", listener.local_addr()?);

        let (server_tx, server_rx) = mpsc::unbounded_channel();

        Ok(Server {
            listener,
            session,
            tick_duration,
            clients: HashMap::new(),
            server_tx,
            server_rx,
        })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn client_count(&self) -> usize {
        self.clients.len()
    }

    /// Spawns the task that accepts connections and starts their reader/writer tasks
    fn spawn_acceptor(&self) {
        let listener = Arc::clone(&self.listener);
        let server_tx = self.server_tx.clone();

        tokio::spawn(async move {
            let mut next_id: u32 = 1;

            loop {
                match listener.accept().await {
                    Ok((stream, addr)) => {
                        let client_id = next_id;
                        next_id = next_id.wrapping_add(1);
                        info!("Client {} connected from {}", client_id, addr);

                        let (reader, writer) = stream.into_split();
                        let (outgoing_tx, outgoing_rx) = mpsc::channel(OUTGOING_QUEUE_CAPACITY);
                        let writer = tokio::spawn(write_frames(client_id, writer, outgoing_rx));

                        // registered before the reader starts so frames never beat it
                        if server_tx
                            .send(ServerMessage::ClientConnected {
                                client_id,
                                addr,
                                outgoing: outgoing_tx,
                                writer,
                            })
                            .is_err()
                        {
                            break;
                        }

                        tokio::spawn(read_frames(client_id, reader, server_tx.clone()));
                    }
                    Err(e) => {
                        error!("Error accepting connection: {}", e);
                        tokio::time::sleep(Duration::from_millis(10)).await;
                    }
                }
            }
        });
    }

    fn handle_server_message(&mut self, message: ServerMessage) {
        match message {
            ServerMessage::ClientConnected {
                client_id,
                addr,
                outgoing,
                writer,
            } => {
                debug!("Registering client {} ({})", client_id, addr);
                self.clients
                    .insert(client_id, ClientHandle { outgoing, writer });
            }
            ServerMessage::FrameReceived { client_id, payload } => {
                debug!("Client {} sent: {}", client_id, payload);
                self.session.handle_payload(&payload, Instant::now());
            }
            ServerMessage::ConnectionClosed { client_id } => {
                info!("Client {} disconnected", client_id);
                self.clients.remove(&client_id);
            }
        }
    }

    fn handle_command(&mut self, command: HostCommand) {
        match self.session.handle_host(command, Instant::now()) {
            Ok(feedback) => info!("{}", feedback),
            Err(e) => warn!("Host command failed: {}", e),
        }
    }

    /// Sends every queued message to every connected client
    ///
    /// Never waits on a client: one whose queue is full is disconnected.
    fn flush(&mut self) {
        for message in self.session.drain_outbox() {
            let frame = message.to_frame();
            self.clients
                .retain(|client_id, client| match client.outgoing.try_send(frame.clone()) {
                    Ok(()) => true,
                    Err(TrySendError::Full(_)) => {
                        warn!("Dropping client {}: not keeping up with broadcasts", client_id);
                        // closes the socket's write half along with the task
                        client.writer.abort();
                        false
                    }
                    Err(TrySendError::Closed(_)) => {
                        debug!("Dropping client {}: writer has stopped", client_id);
                        false
                    }
                });
        }
    }

    /// Main server loop; host commands stop being read once `commands` closes
    pub async fn run(&mut self, mut commands: mpsc::UnboundedReceiver<HostCommand>) {
        self.spawn_acceptor();

        let mut tick_interval = interval(self.tick_duration);
        tick_interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut console_open = true;

        info!("Server started successfully");

        loop {
            tokio::select! {
                message = self.server_rx.recv() => match message {
                    Some(message) => self.handle_server_message(message),
                    None => {
                        info!("Server shutting down");
                        break;
                    }
                },

                command = commands.recv(), if console_open => match command {
                    Some(command) => self.handle_command(command),
                    None => {
                        debug!("Host console closed");
                        console_open = false;
                    }
                },

                _ = tick_interval.tick() => self.session.tick(),
            }

            self.flush();
        }
    }
}

/// Reads a connection until EOF, forwarding every complete frame to the main loop
pub async fn read_frames<R: AsyncRead + Unpin>(
    client_id: u32,
    mut reader: R,
    server_tx: mpsc::UnboundedSender<ServerMessage>,
) {
    let mut frames = FrameBuffer::new();
    let mut buffer = [0u8; READ_BUFFER_SIZE];

    loop {
        match reader.read(&mut buffer).await {
            Ok(0) => break,
            Ok(len) => {
                frames.push(&buffer[..len]);
                for frame in frames.frames() {
                    match frame {
                        Ok(payload) => {
                            if server_tx
                                .send(ServerMessage::FrameReceived { client_id, payload })
                                .is_err()
                            {
                                return;
                            }
                        }
                        Err(e) => warn!("Client {} sent a bad frame: {}", client_id, e),
                    }
                }
            }
            Err(e) => {
                warn!("Error reading from client {}: {}", client_id, e);
                break;
            }
        }
    }

    let _ = server_tx.send(ServerMessage::ConnectionClosed { client_id });
}

/// Writes queued frames to a connection until the queue closes or a write fails
pub async fn write_frames<W: AsyncWrite + Unpin>(
    client_id: u32,
    mut writer: W,
    mut outgoing: mpsc::Receiver<String>,
) {
    while let Some(frame) = outgoing.recv().await {
        if let Err(e) = writer.write_all(frame.as_bytes()).await {
            debug!("Error writing to client {}: {}", client_id, e);
            break;
        }
    }
}
