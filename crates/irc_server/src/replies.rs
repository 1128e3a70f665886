use crate::constants::*;

/// Every numeric reply this server can send, plus the handful of
/// non-numeric lines (PONG, the bare `ERROR` line) that share the same
/// send path. `format` takes the server name explicitly since, unlike the
/// teacher this crate is grounded on, that name is configurable rather
/// than a compile-time constant.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq)]
pub enum IrcReply<'a> {
    Welcome {
        nick: &'a str,
        user: &'a str,
        host: &'a str,
    },
    YourHost {
        nick: &'a str,
        version: &'a str,
    },
    Created {
        nick: &'a str,
    },
    MyInfo {
        nick: &'a str,
        version: &'a str,
    },
    NoMotd {
        nick: &'a str,
    },

    NoTopic {
        nick: &'a str,
        channel: &'a str,
    },
    Topic {
        nick: &'a str,
        channel: &'a str,
        topic: &'a str,
    },
    NamesReply {
        nick: &'a str,
        channel: &'a str,
        names: &'a str,
    },
    EndOfNames {
        nick: &'a str,
        channel: &'a str,
    },

    ErrNoSuchNick {
        nick: &'a str,
        target: &'a str,
    },
    ErrNoSuchChannel {
        nick: &'a str,
        channel: &'a str,
    },
    ErrNoNicknameGiven {
        nick: &'a str,
    },
    ErrErroneousNickname {
        nick: &'a str,
        attempted: &'a str,
    },
    ErrNicknameInUse {
        nick: &'a str,
        attempted: &'a str,
    },
    ErrNotOnChannel {
        nick: &'a str,
        channel: &'a str,
    },
    ErrNotRegistered {
        nick: &'a str,
    },
    ErrNeedMoreParams {
        nick: &'a str,
        command: &'a str,
    },
    ErrAlreadyRegistered {
        nick: &'a str,
    },
    ErrPasswdMismatch {
        nick: &'a str,
    },
    ErrChanOpPrivsNeeded {
        nick: &'a str,
        channel: &'a str,
    },
    ErrTooManyChannels {
        nick: &'a str,
        channel: &'a str,
    },
}

impl<'a> IrcReply<'a> {
    pub fn format(&self, server_name: &str) -> String {
        match self {
            IrcReply::Welcome { nick, user, host } => format!(
                ":{server_name} {RPL_WELCOME_NB:03} {nick} :{RPL_WELCOME_STR} {nick}!{user}@{host}"
            ),
            IrcReply::YourHost { nick, version } => format!(
                ":{server_name} {RPL_YOURHOST_NB:03} {nick} :Your host is {server_name}, running version {version}"
            ),
            IrcReply::Created { nick } => {
                format!(":{server_name} {RPL_CREATED_NB:03} {nick} :This server was created recently")
            }
            IrcReply::MyInfo { nick, version } => {
                format!(":{server_name} {RPL_MYINFO_NB:03} {nick} {server_name} {version} o itkl")
            }
            IrcReply::NoMotd { nick } => {
                format!(":{server_name} {ERR_NOMOTD_NB:03} {nick} :{ERR_NOMOTD_STR}")
            }

            IrcReply::NoTopic { nick, channel } => format!(
                ":{server_name} {RPL_NOTOPIC_NB:03} {nick} {channel} :{RPL_NOTOPIC_STR}"
            ),
            IrcReply::Topic {
                nick,
                channel,
                topic,
            } => format!(":{server_name} {RPL_TOPIC_NB:03} {nick} {channel} :{topic}"),
            IrcReply::NamesReply {
                nick,
                channel,
                names,
            } => format!(":{server_name} {RPL_NAMREPLY_NB:03} {nick} = {channel} :{names}"),
            IrcReply::EndOfNames { nick, channel } => format!(
                ":{server_name} {RPL_ENDOFNAMES_NB:03} {nick} {channel} :{RPL_ENDOFNAMES_STR}"
            ),

            IrcReply::ErrNoSuchNick { nick, target } => format!(
                ":{server_name} {ERR_NOSUCHNICK_NB:03} {nick} {target} :{ERR_NOSUCHNICK_STR}"
            ),
            IrcReply::ErrNoSuchChannel { nick, channel } => format!(
                ":{server_name} {ERR_NOSUCHCHANNEL_NB:03} {nick} {channel} :{ERR_NOSUCHCHANNEL_STR}"
            ),
            IrcReply::ErrNoNicknameGiven { nick } => format!(
                ":{server_name} {ERR_NONICKNAMEGIVEN_NB:03} {nick} :{ERR_NONICKNAMEGIVEN_STR}"
            ),
            IrcReply::ErrErroneousNickname { nick, attempted } => format!(
                ":{server_name} {ERR_ERRONEUSNICKNAME_NB:03} {nick} {attempted} :{ERR_ERRONEUSNICKNAME_STR}"
            ),
            IrcReply::ErrNicknameInUse { nick, attempted } => format!(
                ":{server_name} {ERR_NICKNAMEINUSE_NB:03} {nick} {attempted} :{ERR_NICKNAMEINUSE_STR}"
            ),
            IrcReply::ErrNotOnChannel { nick, channel } => format!(
                ":{server_name} {ERR_NOTONCHANNEL_NB:03} {nick} {channel} :{ERR_NOTONCHANNEL_STR}"
            ),
            IrcReply::ErrNotRegistered { nick } => format!(
                ":{server_name} {ERR_NOTREGISTERED_NB:03} {nick} :{ERR_NOTREGISTERED_STR}"
            ),
            IrcReply::ErrNeedMoreParams { nick, command } => format!(
                ":{server_name} {ERR_NEEDMOREPARAMS_NB:03} {nick} {command} :{ERR_NEEDMOREPARAMS_STR}"
            ),
            IrcReply::ErrAlreadyRegistered { nick } => format!(
                ":{server_name} {ERR_ALREADYREGISTRED_NB:03} {nick} :{ERR_ALREADYREGISTRED_STR}"
            ),
            IrcReply::ErrPasswdMismatch { nick } => format!(
                ":{server_name} {ERR_PASSWDMISMATCH_NB:03} {nick} :{ERR_PASSWDMISMATCH_STR}"
            ),
            IrcReply::ErrChanOpPrivsNeeded { nick, channel } => format!(
                ":{server_name} {ERR_CHANOPRIVSNEEDED_NB:03} {nick} {channel} :{ERR_CHANOPRIVSNEEDED_STR}"
            ),
            IrcReply::ErrTooManyChannels { nick, channel } => format!(
                ":{server_name} {ERR_TOOMANYCHANNELS_NB:03} {nick} {channel} :{ERR_TOOMANYCHANNELS_STR}"
            ),
        }
    }
}

/// Builds the `nick!user@host` originator prefix used on broadcast lines.
pub fn origin_prefix(nick: &str, user: &str, host: &str) -> String {
    format!(":{nick}!{user}@{host}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn welcome_includes_nick_twice() {
        let line = IrcReply::Welcome {
            nick: "alice",
            user: "alice",
            host: "host",
        }
        .format("irc.local");
        assert!(line.starts_with(":irc.local 001 alice :"));
        assert!(line.contains("alice!alice@host"));
    }

    #[test]
    fn origin_prefix_format() {
        assert_eq!(origin_prefix("bob", "bob", "host"), ":bob!bob@host");
    }
}
