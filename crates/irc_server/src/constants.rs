//! Numeric reply codes and protocol-level size limits.
//!
//! Numerics follow the naming convention `<NAME>_NB` / `<NAME>_STR` used
//! throughout this crate: `_NB` is the three-digit code, `_STR` is the
//! fixed portion of the reply text that accompanies it.

pub const RPL_WELCOME_NB: u16 = 1;
pub const RPL_WELCOME_STR: &str = "Welcome to the Internet Relay Network";

pub const RPL_YOURHOST_NB: u16 = 2;
pub const RPL_CREATED_NB: u16 = 3;
pub const RPL_MYINFO_NB: u16 = 4;

pub const RPL_NOTOPIC_NB: u16 = 331;
pub const RPL_NOTOPIC_STR: &str = "No topic is set";

pub const RPL_TOPIC_NB: u16 = 332;

pub const RPL_NAMREPLY_NB: u16 = 353;
pub const RPL_ENDOFNAMES_NB: u16 = 366;
pub const RPL_ENDOFNAMES_STR: &str = "End of /NAMES list";

pub const ERR_NOSUCHNICK_NB: u16 = 401;
pub const ERR_NOSUCHNICK_STR: &str = "No such nick/channel";

pub const ERR_NOSUCHCHANNEL_NB: u16 = 403;
pub const ERR_NOSUCHCHANNEL_STR: &str = "No such channel";

pub const ERR_NOMOTD_NB: u16 = 422;
pub const ERR_NOMOTD_STR: &str = "MOTD File is missing";

pub const ERR_NONICKNAMEGIVEN_NB: u16 = 431;
pub const ERR_NONICKNAMEGIVEN_STR: &str = "No nickname given";

pub const ERR_ERRONEUSNICKNAME_NB: u16 = 432;
pub const ERR_ERRONEUSNICKNAME_STR: &str = "Erroneous nickname";

pub const ERR_NICKNAMEINUSE_NB: u16 = 433;
pub const ERR_NICKNAMEINUSE_STR: &str = "Nickname is already in use";

pub const ERR_NOTONCHANNEL_NB: u16 = 442;
pub const ERR_NOTONCHANNEL_STR: &str = "You're not on that channel";

pub const ERR_NOTREGISTERED_NB: u16 = 451;
pub const ERR_NOTREGISTERED_STR: &str = "You have not registered";

pub const ERR_NEEDMOREPARAMS_NB: u16 = 461;
pub const ERR_NEEDMOREPARAMS_STR: &str = "Not enough parameters";

pub const ERR_ALREADYREGISTRED_NB: u16 = 462;
pub const ERR_ALREADYREGISTRED_STR: &str = "You may not reregister";

pub const ERR_PASSWDMISMATCH_NB: u16 = 464;
pub const ERR_PASSWDMISMATCH_STR: &str = "Password incorrect";

pub const ERR_CHANOPRIVSNEEDED_NB: u16 = 482;
pub const ERR_CHANOPRIVSNEEDED_STR: &str = "You're not channel operator";

/// Not part of the base numeric set in §6; used only when
/// `limits.max_channels_per_user` is configured to a nonzero value.
pub const ERR_TOOMANYCHANNELS_NB: u16 = 405;
pub const ERR_TOOMANYCHANNELS_STR: &str = "You have joined too many channels";

/// Bytes read from the socket per non-blocking `recv` call.
pub const READ_CHUNK_SIZE: usize = 4096;

/// Hard cap on unframed bytes held in a client's input buffer.
pub const MAX_INPUT_BUFFER: usize = 8192;

/// Maximum nickname length, RFC 2812-derived (this server does not extend it).
pub const MAX_NICKNAME_LEN: usize = 9;

/// Listener backlog passed to `listen()`.
pub const LISTEN_BACKLOG: u32 = 10;

/// Literal hostname used in `nick!user@host` prefixes. See DESIGN.md for
/// why this is a fixed literal rather than a resolved or peer-derived value.
pub const CLIENT_HOSTNAME: &str = "host";
