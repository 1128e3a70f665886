use std::collections::HashMap;
use std::io::{self, Read, Write};
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use log::{debug, info, trace, warn};
use mio::net::TcpListener;
use mio::{Events, Interest, Poll, Token};

use crate::channel::Channel;
use crate::client::Client;
use crate::commands;
use crate::config::Config;
use crate::constants::{MAX_INPUT_BUFFER, READ_CHUNK_SIZE};
use crate::errors::{RunError, SetupError};
use crate::message;
use crate::replies::origin_prefix;

const LISTENER_TOKEN: Token = Token(0);
const EVENTS_CAPACITY: usize = 1024;

/// The core IRC server. Owns the listening socket, every client
/// connection, and the channel registry. Runs single-threaded, driven
/// entirely by one `mio::Poll` readiness loop — nothing here blocks
/// except the call to `poll()` itself.
pub struct Server {
    port: u16,
    password: String,
    config: Config,

    poll: Poll,
    events: Events,
    listener: Option<TcpListener>,

    clients: HashMap<Token, Client>,
    channels: HashMap<String, Channel>,
    next_token: usize,

    stop_requested: Arc<AtomicBool>,
}

impl Server {
    pub fn new(port: u16, password: String) -> io::Result<Self> {
        Ok(Server {
            port,
            password,
            config: Config::default(),
            poll: Poll::new()?,
            events: Events::with_capacity(EVENTS_CAPACITY),
            listener: None,
            clients: HashMap::new(),
            channels: HashMap::new(),
            next_token: 1,
            stop_requested: Arc::new(AtomicBool::new(false)),
        })
    }

    pub fn with_config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    /// A clone of the stop flag, suitable for registering with
    /// `signal_hook::flag::register` from the CLI wrapper so that SIGINT/
    /// SIGTERM request an orderly shutdown instead of killing the process
    /// mid-broadcast.
    pub fn stop_flag(&self) -> Arc<AtomicBool> {
        self.stop_requested.clone()
    }

    /// Binds the listener and registers it with the poller. Any failure
    /// here is a setup error: the caller is expected to report it and
    /// exit non-zero rather than enter the event loop.
    pub fn setup(&mut self) -> Result<(), SetupError> {
        let bind_addr = format!("{}:{}", self.config.network.bind_address, self.port);
        let addr: SocketAddr = bind_addr
            .parse()
            .map_err(|_| SetupError::Bind {
                port: self.port,
                source: io::Error::new(io::ErrorKind::InvalidInput, "invalid bind address"),
            })?;

        let std_listener = std::net::TcpListener::bind(addr).map_err(|source| SetupError::Bind {
            port: self.port,
            source,
        })?;
        std_listener
            .set_nonblocking(true)
            .map_err(|source| SetupError::Bind {
                port: self.port,
                source,
            })?;
        // std::net::TcpListener::bind doesn't expose a backlog argument;
        // LISTEN_BACKLOG documents the intended value for operators who
        // tune it at the OS level instead.
        let mut listener = TcpListener::from_std(std_listener);
        self.poll
            .registry()
            .register(&mut listener, LISTENER_TOKEN, Interest::READABLE)
            .map_err(SetupError::Register)?;

        info!("listening on {bind_addr}");
        self.listener = Some(listener);
        Ok(())
    }

    /// The listener's bound address. Mainly useful in tests that bind to
    /// port 0 and need to discover which port the OS actually assigned.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.listener.as_ref().and_then(|l| l.local_addr().ok())
    }

    /// Requests shutdown. Safe to call from within the loop (e.g. a test
    /// harness) or from outside it after cloning `stop_flag()`.
    pub fn stop(&mut self) {
        self.stop_requested.store(true, Ordering::SeqCst);
        if let Some(mut listener) = self.listener.take() {
            let _ = self.poll.registry().deregister(&mut listener);
        }
    }

    /// Runs the event loop until `stop()` is called or a non-recoverable
    /// poll error occurs. Accepts are processed before client I/O each
    /// iteration; reads are processed before writes for a given client in
    /// the same iteration.
    pub fn run(&mut self) -> Result<(), RunError> {
        let registration_timeout = self.config.limits.unregistered_timeout;
        let poll_timeout = if registration_timeout > 0 {
            Some(Duration::from_secs(1))
        } else {
            None
        };

        loop {
            if self.stop_requested.load(Ordering::SeqCst) {
                break;
            }

            match self.poll.poll(&mut self.events, poll_timeout) {
                Ok(()) => {}
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    warn!("poll failed, shutting down: {e}");
                    return Err(RunError::Poll(e));
                }
            }

            if self.stop_requested.load(Ordering::SeqCst) {
                break;
            }

            let listener_ready = self
                .events
                .iter()
                .any(|event| event.token() == LISTENER_TOKEN);
            if listener_ready {
                self.accept_connections();
            }

            let client_events: Vec<(Token, bool, bool)> = self
                .events
                .iter()
                .filter(|event| event.token() != LISTENER_TOKEN)
                .map(|event| (event.token(), event.is_readable(), event.is_writable()))
                .collect();

            for (token, readable, writable) in client_events {
                if !self.clients.contains_key(&token) {
                    continue;
                }
                if readable {
                    self.handle_readable(token);
                }
                if writable && self.clients.contains_key(&token) {
                    self.handle_writable(token);
                }
                if self.clients.contains_key(&token) {
                    self.sync_interest(token);
                }
            }

            if registration_timeout > 0 {
                self.enforce_registration_timeout(registration_timeout);
            }

            self.reap_disconnected();
        }

        Ok(())
    }

    fn accept_connections(&mut self) {
        loop {
            let Some(listener) = self.listener.as_ref() else {
                return;
            };
            match listener.accept() {
                Ok((mut stream, addr)) => {
                    if let Some(reason) = self.rejection_reason(addr) {
                        debug!("rejecting connection from {addr}: {reason}");
                        let mut line = Vec::new();
                        line.extend_from_slice(format!("ERROR :{reason}\r\n").as_bytes());
                        let _ = stream.write_all(&line);
                        continue;
                    }

                    let token = Token(self.next_token);
                    self.next_token += 1;

                    if let Err(e) =
                        self.poll
                            .registry()
                            .register(&mut stream, token, Interest::READABLE)
                    {
                        warn!("failed to register accepted connection: {e}");
                        continue;
                    }

                    debug!("accepted connection from {addr} as {token:?}");
                    let client = Client::new(token, stream, Instant::now());
                    self.clients.insert(token, client);
                }
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => break,
                Err(e) => {
                    warn!("accept failed: {e}");
                    break;
                }
            }
        }
    }

    /// Checks the configured connection caps against the current client
    /// table. 0 means unlimited for both knobs, matching `Config`'s
    /// defaults. Per-IP counting walks the live client table rather than
    /// maintaining a running counter, since connections are accepted and
    /// reaped far less often than lines are parsed.
    fn rejection_reason(&self, addr: SocketAddr) -> Option<&'static str> {
        let max_total = self.config.network.max_connections;
        if max_total > 0 && self.clients.len() >= max_total {
            return Some("Connection limit reached");
        }

        let max_per_ip = self.config.limits.max_connections_per_ip;
        if max_per_ip > 0 {
            let from_same_ip = self
                .clients
                .values()
                .filter(|c| c.stream.peer_addr().map(|a| a.ip()) == Ok(addr.ip()))
                .count();
            if from_same_ip >= max_per_ip {
                return Some("Too many connections from your host");
            }
        }

        None
    }

    fn handle_readable(&mut self, token: Token) {
        let mut buf = [0u8; READ_CHUNK_SIZE];
        let mut peer_closed = false;

        loop {
            let Some(client) = self.clients.get_mut(&token) else {
                return;
            };
            match client.stream.read(&mut buf) {
                Ok(0) => {
                    peer_closed = true;
                    break;
                }
                Ok(n) => {
                    client.input_buffer.extend_from_slice(&buf[..n]);
                    if client.input_buffer.len() > MAX_INPUT_BUFFER {
                        client.input_buffer.clear();
                        self.send_immediate(token, "ERROR :Client exceeded buffer size limit");
                        if let Some(client) = self.clients.get_mut(&token) {
                            client.mark_disconnected("Connection closed");
                        }
                        return;
                    }
                }
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => break,
                Err(_) => {
                    peer_closed = true;
                    break;
                }
            }
        }

        if peer_closed {
            if let Some(client) = self.clients.get_mut(&token) {
                client.mark_disconnected("Connection closed");
            }
            return;
        }

        let frames = {
            let Some(client) = self.clients.get_mut(&token) else {
                return;
            };
            message::extract_frames(&mut client.input_buffer)
        };

        for frame in frames {
            let Ok(line) = String::from_utf8(frame) else {
                trace!("dropping non-UTF8 frame from {token:?}");
                continue;
            };
            let trimmed = line.trim_end_matches(['\r', '\n']);
            let Some(parsed) = message::parse_line(trimmed) else {
                continue;
            };
            commands::dispatch(self, token, parsed);

            if !self.clients.contains_key(&token) {
                break;
            }
            if self.clients.get(&token).is_some_and(|c| c.disconnected) {
                break;
            }
        }
    }

    fn handle_writable(&mut self, token: Token) {
        loop {
            let Some(client) = self.clients.get_mut(&token) else {
                return;
            };
            let Some(chunk) = client.output_queue.front() else {
                break;
            };
            match client.stream.write(chunk) {
                Ok(n) if n == chunk.len() => {
                    client.output_queue.pop_front();
                }
                Ok(n) => {
                    if let Some(front) = client.output_queue.front_mut() {
                        front.drain(..n);
                    }
                }
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => break,
                Err(_) => {
                    client.mark_disconnected("Connection closed");
                    break;
                }
            }
        }
    }

    /// Best-effort, non-blocking flush used only for messages that must
    /// reach the client right before it's torn down (a failed PASS, a
    /// buffer-limit `ERROR` line) — cases where the normal queue-and-wait-
    /// for-writable path would just get discarded by `reap_disconnected`.
    fn send_immediate(&mut self, token: Token, line: &str) {
        let Some(client) = self.clients.get_mut(&token) else {
            return;
        };
        client.queue_line(line);
        while let Some(chunk) = client.output_queue.front() {
            match client.stream.write(chunk) {
                Ok(n) if n == chunk.len() => {
                    client.output_queue.pop_front();
                }
                Ok(n) => {
                    if let Some(front) = client.output_queue.front_mut() {
                        front.drain(..n);
                    }
                    break;
                }
                Err(_) => break,
            }
        }
    }

    /// Re-arms the poller's interest set for `token`: always readable,
    /// additionally writable exactly when output is pending. Only issues
    /// `reregister` when the writable bit actually changes.
    fn sync_interest(&mut self, token: Token) {
        let Some(client) = self.clients.get_mut(&token) else {
            return;
        };
        let wants_writable = !client.output_queue.is_empty();
        if wants_writable == client.write_interest_armed {
            return;
        }
        let interest = if wants_writable {
            Interest::READABLE | Interest::WRITABLE
        } else {
            Interest::READABLE
        };
        if self
            .poll
            .registry()
            .reregister(&mut client.stream, token, interest)
            .is_ok()
        {
            client.write_interest_armed = wants_writable;
        }
    }

    fn enforce_registration_timeout(&mut self, timeout_secs: u64) {
        let now = Instant::now();
        let timeout = Duration::from_secs(timeout_secs);
        let expired: Vec<Token> = self
            .clients
            .values()
            .filter(|c| !c.is_registered() && now.duration_since(c.connected_at) >= timeout)
            .map(|c| c.token)
            .collect();

        for token in expired {
            self.send_immediate(token, "ERROR :Closing Link: registration timeout");
            if let Some(client) = self.clients.get_mut(&token) {
                client.mark_disconnected("Registration timeout");
            }
        }
    }

    fn reap_disconnected(&mut self) {
        let disconnected: Vec<Token> = self
            .clients
            .iter()
            .filter(|(_, c)| c.disconnected)
            .map(|(t, _)| *t)
            .collect();

        for token in disconnected {
            self.remove_client(token);
        }
    }

    /// Tears a client down: broadcasts QUIT to every channel it was in
    /// (snapshotting membership first so removal never iterates a roster
    /// it's also mutating), collects any channel left empty, deregisters
    /// the socket, and drops it from the client table.
    fn remove_client(&mut self, token: Token) {
        let Some(mut client) = self.clients.remove(&token) else {
            return;
        };

        // The wire-visible QUIT text is always this fixed string, regardless of
        // what the client passed to QUIT or why the connection actually dropped;
        // `quit_reason` is kept only for the debug log below.
        let log_reason = client.quit_reason.clone().unwrap_or_else(|| "Connection closed".to_string());
        let prefix = origin_prefix(
            client.nickname.as_deref().unwrap_or("*"),
            client.username.as_deref().unwrap_or("*"),
            &client.hostname,
        );
        let line = format!("{prefix} QUIT :Connection closed");

        let joined: Vec<String> = client.joined_channels.iter().cloned().collect();
        for channel_name in joined {
            if let Some(channel) = self.channels.get_mut(&channel_name) {
                channel.remove_member(token);
                let empty = channel.is_empty();
                let members: Vec<Token> = channel.roster.iter().copied().collect();
                for member in members {
                    if let Some(peer) = self.clients.get_mut(&member) {
                        peer.queue_line(&line);
                    }
                }
                if empty {
                    self.channels.remove(&channel_name);
                    debug!("channel {channel_name} collected (empty)");
                }
            }
        }

        let _ = self.poll.registry().deregister(&mut client.stream);
        debug!("removed client {token:?} ({log_reason})");
    }

    // --- accessors used by the command handlers ---

    pub(crate) fn config(&self) -> &Config {
        &self.config
    }

    pub(crate) fn password(&self) -> &str {
        &self.password
    }

    pub(crate) fn client(&self, token: Token) -> Option<&Client> {
        self.clients.get(&token)
    }

    pub(crate) fn client_mut(&mut self, token: Token) -> Option<&mut Client> {
        self.clients.get_mut(&token)
    }

    pub(crate) fn channel(&self, name: &str) -> Option<&Channel> {
        self.channels.get(name)
    }

    pub(crate) fn channel_mut(&mut self, name: &str) -> Option<&mut Channel> {
        self.channels.get_mut(name)
    }

    pub(crate) fn channels_mut(&mut self) -> &mut HashMap<String, Channel> {
        &mut self.channels
    }

    pub(crate) fn find_token_by_nick(&self, nick: &str) -> Option<Token> {
        self.clients
            .iter()
            .find(|(_, c)| c.nickname.as_deref() == Some(nick))
            .map(|(t, _)| *t)
    }

    pub(crate) fn nick_in_use(&self, nick: &str) -> bool {
        self.find_token_by_nick(nick).is_some()
    }

    /// Sends `line` to every member of `channel_name`, optionally skipping
    /// one token (the originator of the command causing the broadcast).
    pub(crate) fn broadcast_channel(&mut self, channel_name: &str, line: &str, except: Option<Token>) {
        let Some(channel) = self.channels.get(channel_name) else {
            return;
        };
        let members: Vec<Token> = channel.roster.iter().copied().collect();
        for member in members {
            if Some(member) == except {
                continue;
            }
            if let Some(client) = self.clients.get_mut(&member) {
                client.queue_line(line);
            }
        }
    }

    pub(crate) fn disconnect_with_reason(&mut self, token: Token, reason: &str) {
        if let Some(client) = self.clients.get_mut(&token) {
            client.mark_disconnected(reason.to_string());
        }
    }

    /// Same as `disconnect_with_reason`, but guarantees `line` was already
    /// handed to the kernel before the client is torn down — used for the
    /// two protocol violations the spec singles out as disconnect-worthy
    /// (wrong PASS, buffer overflow).
    pub(crate) fn disconnect_after_flush(&mut self, token: Token, line: &str, reason: &str) {
        self.send_immediate(token, line);
        self.disconnect_with_reason(token, reason);
    }
}
