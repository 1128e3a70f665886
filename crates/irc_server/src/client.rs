use std::collections::VecDeque;
use std::time::Instant;

use indexmap::IndexSet;
use mio::Token;
use mio::net::TcpStream;

use crate::constants::{CLIENT_HOSTNAME, MAX_NICKNAME_LEN};

/// Where a connection sits in the PASS -> NICK/USER -> registered
/// handshake. `nickname`/`username` on `Client` double as the `NICK_OK`/
/// `USER_OK` sub-states: they're set independently while in `PassOk`, and
/// `Registered` is entered the moment both are present.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistrationState {
    New,
    PassOk,
    Registered,
}

pub struct Client {
    pub token: Token,
    pub stream: TcpStream,

    pub nickname: Option<String>,
    pub username: Option<String>,
    pub realname: Option<String>,
    pub hostname: String,

    pub state: RegistrationState,
    pub password_validated: bool,
    /// Set once the 001-004/422 welcome burst has been sent, so a later
    /// NICK change after registration doesn't re-trigger it.
    pub welcomed: bool,

    pub input_buffer: Vec<u8>,
    pub output_queue: VecDeque<Vec<u8>>,
    /// Mirrors the last `Interest` registered with the poller, so the
    /// event loop only calls `reregister` when the write-interest actually
    /// needs to change.
    pub write_interest_armed: bool,

    pub joined_channels: IndexSet<String>,

    pub disconnected: bool,
    pub quit_reason: Option<String>,

    pub connected_at: Instant,
}

impl Client {
    pub fn new(token: Token, stream: TcpStream, now: Instant) -> Self {
        Client {
            token,
            stream,
            nickname: None,
            username: None,
            realname: None,
            hostname: CLIENT_HOSTNAME.to_string(),
            state: RegistrationState::New,
            password_validated: false,
            welcomed: false,
            input_buffer: Vec::new(),
            output_queue: VecDeque::new(),
            write_interest_armed: false,
            joined_channels: IndexSet::new(),
            disconnected: false,
            quit_reason: None,
            connected_at: now,
        }
    }

    pub fn is_registered(&self) -> bool {
        self.state == RegistrationState::Registered
    }

    /// `nick!user@host`, falling back to `*` for not-yet-set fields so a
    /// pre-registration client can still be addressed in log lines.
    pub fn prefix(&self) -> String {
        format!(
            "{}!{}@{}",
            self.nickname.as_deref().unwrap_or("*"),
            self.username.as_deref().unwrap_or("*"),
            self.hostname
        )
    }

    pub fn queue_line(&mut self, line: impl AsRef<str>) {
        let mut bytes = Vec::with_capacity(line.as_ref().len() + 2);
        bytes.extend_from_slice(line.as_ref().as_bytes());
        bytes.extend_from_slice(b"\r\n");
        self.output_queue.push_back(bytes);
    }

    /// Called after NICK or USER succeeds; promotes the connection to
    /// `Registered` once both halves of the handshake and the password
    /// check are satisfied.
    pub fn maybe_complete_registration(&mut self) {
        if self.state == RegistrationState::PassOk
            && self.nickname.is_some()
            && self.username.is_some()
        {
            self.state = RegistrationState::Registered;
        }
    }

    pub fn mark_disconnected(&mut self, quit_reason: impl Into<String>) {
        if !self.disconnected {
            self.disconnected = true;
            self.quit_reason = Some(quit_reason.into());
        }
    }
}

/// Nicknames are non-empty, at most 9 characters, drawn from
/// `[A-Za-z0-9\[\]\\\`_^{|}]`.
pub fn is_valid_nickname(nick: &str) -> bool {
    if nick.is_empty() || nick.len() > MAX_NICKNAME_LEN {
        return false;
    }
    nick.bytes().all(|b| {
        b.is_ascii_alphanumeric() || matches!(b, b'[' | b']' | b'\\' | b'`' | b'_' | b'^' | b'{' | b'|' | b'}')
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_and_overlong() {
        assert!(!is_valid_nickname(""));
        assert!(!is_valid_nickname("tenletters"));
    }

    #[test]
    fn accepts_special_characters() {
        assert!(is_valid_nickname("a_b^c{d}e"));
        assert!(is_valid_nickname("[alice]"));
    }

    #[test]
    fn rejects_invalid_characters() {
        assert!(!is_valid_nickname("alice!"));
        assert!(!is_valid_nickname("al ice"));
    }
}
