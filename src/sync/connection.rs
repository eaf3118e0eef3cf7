//! Single-writer device connection
//!
//! One actor thread owns the TCP stream. Everything else talks to it through
//! a command channel, so handshakes, reconnects and frame writes never
//! interleave.

use std::io::{BufRead, BufReader, Write};
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{bounded, unbounded, Receiver, Sender};
use log::{debug, info, warn};
use parking_lot::RwLock;

use super::protocol::{Frame, PONG};
use crate::config::CassetteConfig;
use crate::error::{CassetteError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Discovering,
    Handshaking,
    Connected,
}

/// Where and how patiently to connect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionConfig {
    pub addr: String,
    pub handshake_attempts: u32,
    pub handshake_delay: Duration,
    pub connect_timeout: Duration,
    pub pong_timeout: Duration,
}

impl ConnectionConfig {
    pub fn from_config(config: &CassetteConfig) -> Self {
        Self {
            addr: config.bridge_addr(),
            handshake_attempts: config.handshake_attempts,
            handshake_delay: config.handshake_delay(),
            connect_timeout: config.connect_timeout(),
            pong_timeout: config.pong_timeout(),
        }
    }
}

enum Command {
    Handshake(Sender<Result<()>>),
    Send(Frame),
    Flush(Sender<()>),
    Disconnect,
    Shutdown,
}

/// Handle to the connection actor.
pub struct Connection {
    commands: Sender<Command>,
    state: Arc<RwLock<ConnectionState>>,
    handle: Option<JoinHandle<()>>,
}

impl Connection {
    pub fn spawn(config: ConnectionConfig) -> Result<Self> {
        let (commands, inbox) = unbounded();
        let state = Arc::new(RwLock::new(ConnectionState::Disconnected));

        let mut actor = Actor {
            config,
            stream: None,
            state: state.clone(),
        };
        let handle = thread::Builder::new()
            .name("cassette-sync".to_string())
            .spawn(move || actor.run(inbox))?;

        Ok(Self {
            commands,
            state,
            handle: Some(handle),
        })
    }

    pub fn state(&self) -> ConnectionState {
        *self.state.read()
    }

    pub fn is_connected(&self) -> bool {
        self.state() == ConnectionState::Connected
    }

    /// Mark the connection as looking for a device. No effect once connected.
    pub fn mark_discovering(&self) {
        let mut state = self.state.write();
        if *state == ConnectionState::Disconnected {
            *state = ConnectionState::Discovering;
        }
    }

    /// Run the ping/pong handshake, blocking until it succeeds or the
    /// attempts run out.
    pub fn handshake(&self) -> Result<()> {
        let (reply, result) = bounded(1);
        self.commands
            .send(Command::Handshake(reply))
            .map_err(|_| CassetteError::BridgeClosed)?;
        result.recv().map_err(|_| CassetteError::BridgeClosed)?
    }

    /// Queue a frame. Frames sent while disconnected are dropped.
    pub fn send(&self, frame: Frame) {
        if self.commands.send(Command::Send(frame)).is_err() {
            debug!("Connection actor is gone, frame dropped");
        }
    }

    /// Block until every frame queued so far has been handled.
    pub fn flush(&self) {
        let (done, wait) = bounded(1);
        if self.commands.send(Command::Flush(done)).is_ok() {
            let _ = wait.recv();
        }
    }

    pub fn disconnect(&self) {
        let _ = self.commands.send(Command::Disconnect);
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        let _ = self.commands.send(Command::Shutdown);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

struct Actor {
    config: ConnectionConfig,
    stream: Option<TcpStream>,
    state: Arc<RwLock<ConnectionState>>,
}

impl Actor {
    fn run(&mut self, inbox: Receiver<Command>) {
        for command in inbox.iter() {
            match command {
                Command::Handshake(reply) => {
                    let result = self.handshake();
                    let _ = reply.send(result);
                }
                Command::Send(frame) => self.send(&frame),
                Command::Flush(done) => {
                    let _ = done.send(());
                }
                Command::Disconnect => {
                    self.stream = None;
                    self.set_state(ConnectionState::Disconnected);
                }
                Command::Shutdown => break,
            }
        }
        debug!("Connection actor stopped");
    }

    fn set_state(&self, state: ConnectionState) {
        *self.state.write() = state;
    }

    fn resolve(&self) -> Result<SocketAddr> {
        self.config
            .addr
            .to_socket_addrs()?
            .next()
            .ok_or_else(|| CassetteError::ConnectionFailed {
                reason: format!("cannot resolve {}", self.config.addr),
            })
    }

    fn connect(&self) -> Result<TcpStream> {
        let addr = self.resolve()?;
        let stream = TcpStream::connect_timeout(&addr, self.config.connect_timeout).map_err(|e| {
            CassetteError::ConnectionFailed {
                reason: format!("{}: {}", addr, e),
            }
        })?;
        stream.set_nodelay(true)?;
        Ok(stream)
    }

    fn ping(&self, stream: &mut TcpStream) -> Result<bool> {
        stream.write_all(Frame::Ping.to_line()?.as_bytes())?;
        stream.set_read_timeout(Some(self.config.pong_timeout))?;

        let mut reply = String::new();
        BufReader::new(&*stream).read_line(&mut reply)?;
        stream.set_read_timeout(None)?;
        Ok(reply.trim() == PONG)
    }

    fn handshake(&mut self) -> Result<()> {
        self.stream = None;
        self.set_state(ConnectionState::Handshaking);

        let attempts = self.config.handshake_attempts;
        for attempt in 1..=attempts {
            match self.connect() {
                Ok(mut stream) => match self.ping(&mut stream) {
                    Ok(true) => {
                        info!("Device answered on {} (attempt {})", self.config.addr, attempt);
                        self.stream = Some(stream);
                        self.set_state(ConnectionState::Connected);
                        return Ok(());
                    }
                    Ok(false) => debug!("Handshake attempt {}: unexpected reply", attempt),
                    Err(e) => debug!("Handshake attempt {}: {}", attempt, e),
                },
                Err(e) => debug!("Handshake attempt {}: {}", attempt, e),
            }
            if attempt < attempts {
                thread::sleep(self.config.handshake_delay);
            }
        }

        warn!("Device did not answer after {} attempts", attempts);
        self.set_state(ConnectionState::Discovering);
        Err(CassetteError::HandshakeFailed { attempts })
    }

    fn write(stream: &mut TcpStream, line: &str) -> Result<()> {
        stream
            .write_all(line.as_bytes())
            .map_err(|e| CassetteError::SendFailed {
                reason: e.to_string(),
            })
    }

    fn send(&mut self, frame: &Frame) {
        let Some(stream) = self.stream.as_mut() else {
            debug!("Not connected, dropping {} frame", frame.action());
            return;
        };

        let line = match frame.to_line() {
            Ok(line) => line,
            Err(e) => {
                warn!("Cannot encode {} frame: {}", frame.action(), e);
                return;
            }
        };

        let Err(e) = Self::write(stream, &line) else {
            return;
        };
        debug!("{}, reconnecting", e);

        let retried = self
            .connect()
            .and_then(|mut stream| Self::write(&mut stream, &line).map(|_| stream));
        match retried {
            Ok(stream) => self.stream = Some(stream),
            Err(e) => {
                warn!("Dropped {} frame: {}", frame.action(), e);
                self.stream = None;
                self.set_state(ConnectionState::Discovering);
            }
        }
    }
}
