//! Line framing and command parsing.
//!
//! Grammar (simplified from RFC 2812's full ABNF, matching only what this
//! server actually needs to recognize):
//!
//!   message   = [ ":" prefix SPACE ] command *( SPACE param ) [ SPACE ":" trailing ]
//!   prefix    = 1*(not SPACE)
//!   command   = 1*(not SPACE)
//!   param     = 1*(not SPACE)
//!   trailing  = *any
//!
//! The prefix is recognized only to be discarded: this server does not
//! federate, so a client-supplied prefix never means anything.

use nom::{
    IResult, Parser,
    bytes::complete::{take_while1, tag},
    character::complete::{char, space1},
    combinator::rest,
    sequence::{preceded, terminated},
};

/// A single parsed IRC line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub command: String,
    pub params: Vec<String>,
    pub trailing: Option<String>,
}

impl Message {
    /// Parameter at `index`, not counting the trailing parameter.
    pub fn param(&self, index: usize) -> Option<&str> {
        self.params.get(index).map(String::as_str)
    }

    /// Number of non-trailing parameters.
    pub fn param_count(&self) -> usize {
        self.params.len()
    }

    /// The last parameter, whether it arrived as a trailing (`:`-prefixed)
    /// parameter or as the last middle parameter. Commands like PRIVMSG
    /// and TOPIC treat this position as "the text", however it was framed.
    pub fn last_as_text(&self) -> Option<&str> {
        self.trailing
            .as_deref()
            .or_else(|| self.params.last().map(String::as_str))
    }
}

fn is_not_space(c: char) -> bool {
    c != ' '
}

fn parse_prefix(input: &str) -> IResult<&str, &str> {
    preceded(char(':'), terminated(take_while1(is_not_space), space1)).parse(input)
}

fn parse_command(input: &str) -> IResult<&str, &str> {
    take_while1(is_not_space).parse(input)
}

fn parse_trailing(input: &str) -> IResult<&str, &str> {
    preceded(tag(":"), rest).parse(input)
}

fn parse_middle(input: &str) -> IResult<&str, &str> {
    take_while1(is_not_space).parse(input)
}

/// Consumes the parameter list: zero or more space-separated middle
/// parameters, optionally followed by a single `" :"`-introduced trailing
/// parameter that may itself contain spaces.
fn parse_params(mut input: &str) -> (Vec<String>, Option<String>) {
    let mut params = Vec::new();
    loop {
        let Ok((rest, _)) = space1::<&str, nom::error::Error<&str>>(input) else {
            break;
        };
        input = rest;
        if input.is_empty() {
            break;
        }
        if let Ok((rest, trailing)) = parse_trailing(input) {
            return (params, Some(trailing.to_string()));
        }
        match parse_middle(input) {
            Ok((rest, middle)) => {
                params.push(middle.to_string());
                input = rest;
            }
            Err(_) => break,
        }
    }
    (params, None)
}

/// Parses one already-delimited line (without its trailing `\r\n`) into a
/// `Message`. Returns `None` for empty lines or frames that fail to parse
/// (e.g. a bare `:` with nothing after it); both are silently dropped per
/// the framing contract, never surfaced as an error to the caller.
pub fn parse_line(line: &str) -> Option<Message> {
    if line.is_empty() {
        return None;
    }

    let (input, _prefix) = match parse_prefix(line) {
        Ok(result) => result,
        Err(_) if line.starts_with(':') => return None,
        Err(_) => (line, ""),
    };

    let (input, command) = parse_command(input).ok()?;
    if command.is_empty() {
        return None;
    }

    let (params, trailing) = parse_params(input);

    Some(Message {
        command: command.to_ascii_uppercase(),
        params,
        trailing,
    })
}

/// Extracts every complete `\r\n`-terminated frame from `buf`, leaving any
/// trailing partial frame in place. Frames are returned as raw bytes;
/// callers decode and parse separately so that non-UTF8 noise on the wire
/// only drops that one frame rather than the whole connection.
pub fn extract_frames(buf: &mut Vec<u8>) -> Vec<Vec<u8>> {
    let mut frames = Vec::new();
    loop {
        let Some(pos) = buf.windows(2).position(|w| w == b"\r\n") else {
            break;
        };
        let frame: Vec<u8> = buf.drain(..pos).collect();
        buf.drain(..2); // drop the "\r\n" itself
        frames.push(frame);
    }
    frames
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_command_only() {
        let msg = parse_line("QUIT").unwrap();
        assert_eq!(msg.command, "QUIT");
        assert!(msg.params.is_empty());
        assert!(msg.trailing.is_none());
    }

    #[test]
    fn parses_params_and_trailing() {
        let msg = parse_line("PRIVMSG #lobby :hello world").unwrap();
        assert_eq!(msg.command, "PRIVMSG");
        assert_eq!(msg.params, vec!["#lobby".to_string()]);
        assert_eq!(msg.trailing.as_deref(), Some("hello world"));
    }

    #[test]
    fn discards_prefix() {
        let msg = parse_line(":alice!alice@host JOIN #lobby").unwrap();
        assert_eq!(msg.command, "JOIN");
        assert_eq!(msg.params, vec!["#lobby".to_string()]);
    }

    #[test]
    fn command_is_upper_cased() {
        let msg = parse_line("join #lobby").unwrap();
        assert_eq!(msg.command, "JOIN");
    }

    #[test]
    fn trailing_may_contain_colons_and_spaces() {
        let msg = parse_line("PRIVMSG bob ::: hi : there").unwrap();
        assert_eq!(msg.trailing.as_deref(), Some(":: hi : there"));
    }

    #[test]
    fn empty_line_is_dropped() {
        assert!(parse_line("").is_none());
    }

    #[test]
    fn lone_prefix_is_dropped() {
        assert!(parse_line(":onlyprefix").is_none());
    }

    #[test]
    fn extract_frames_leaves_partial_tail() {
        let mut buf = b"NICK a\r\nUSER b".to_vec();
        let frames = extract_frames(&mut buf);
        assert_eq!(frames, vec![b"NICK a".to_vec()]);
        assert_eq!(buf, b"USER b");
    }

    #[test]
    fn extract_frames_handles_multiple_in_one_chunk() {
        let mut buf = b"NICK a\r\nNICK b\r\n".to_vec();
        let frames = extract_frames(&mut buf);
        assert_eq!(frames, vec![b"NICK a".to_vec(), b"NICK b".to_vec()]);
        assert!(buf.is_empty());
    }
}
