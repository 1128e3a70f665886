use mio::Token;

use crate::channel::Channel;
use crate::message::Message;
use crate::replies::{IrcReply, origin_prefix};
use crate::server::Server;

fn current_nick(server: &Server, token: Token) -> String {
    server
        .client(token)
        .and_then(|c| c.nickname.clone())
        .unwrap_or_else(|| "*".to_string())
}

fn reply(server: &mut Server, token: Token, irc_reply: IrcReply) {
    let line = irc_reply.format(&server.config().server.name);
    if let Some(client) = server.client_mut(token) {
        client.queue_line(line);
    }
}

fn need_more_params(server: &mut Server, token: Token, command: &str) {
    let nick = current_nick(server, token);
    reply(
        server,
        token,
        IrcReply::ErrNeedMoreParams {
            nick: &nick,
            command,
        },
    );
}

pub fn handle_join(server: &mut Server, token: Token, message: &Message) {
    let Some(channel_name) = message.param(0) else {
        need_more_params(server, token, "JOIN");
        return;
    };

    if !channel_name.starts_with('#') || channel_name.len() > server.config().max_channel_name_length() {
        let nick = current_nick(server, token);
        reply(
            server,
            token,
            IrcReply::ErrNoSuchChannel {
                nick: &nick,
                channel: channel_name,
            },
        );
        return;
    }
    let channel_name = channel_name.to_string();

    let max_channels = server.config().limits.max_channels_per_user;
    let already_joined = server.channel(&channel_name).is_some_and(|c| c.is_member(token));
    if max_channels > 0 && !already_joined {
        let current_count = server
            .client(token)
            .map(|c| c.joined_channels.len())
            .unwrap_or(0);
        if current_count >= max_channels {
            let nick = current_nick(server, token);
            reply(
                server,
                token,
                IrcReply::ErrTooManyChannels {
                    nick: &nick,
                    channel: &channel_name,
                },
            );
            return;
        }
    }

    let created = server.channel(&channel_name).is_none();
    if created {
        server
            .channels_mut()
            .insert(channel_name.clone(), Channel::new(channel_name.clone(), token));
    } else if let Some(channel) = server.channel_mut(&channel_name) {
        if !channel.is_member(token) {
            channel.roster.insert(token);
        }
    }

    if let Some(client) = server.client_mut(token) {
        client.joined_channels.insert(channel_name.clone());
    }

    let (nick, user, host) = {
        let client = server.client(token).unwrap();
        (
            client.nickname.clone().unwrap_or_default(),
            client.username.clone().unwrap_or_default(),
            client.hostname.clone(),
        )
    };

    let join_line = format!("{} JOIN {channel_name}", origin_prefix(&nick, &user, &host));
    server.broadcast_channel(&channel_name, &join_line, None);

    send_topic(server, token, &channel_name);

    let nick = current_nick(server, token);
    let names = names_list(server, &channel_name);
    reply(
        server,
        token,
        IrcReply::NamesReply {
            nick: &nick,
            channel: &channel_name,
            names: &names,
        },
    );
    reply(
        server,
        token,
        IrcReply::EndOfNames {
            nick: &nick,
            channel: &channel_name,
        },
    );
}

/// Roster in insertion order, each name prefixed with `@` for operators.
fn names_list(server: &Server, channel_name: &str) -> String {
    let Some(channel) = server.channel(channel_name) else {
        return String::new();
    };
    let mut out = String::new();
    for member in &channel.roster {
        if channel.is_operator(*member) {
            out.push('@');
        }
        if let Some(client) = server.client(*member) {
            out.push_str(client.nickname.as_deref().unwrap_or("*"));
        }
        out.push(' ');
    }
    out
}

pub fn handle_part(server: &mut Server, token: Token, message: &Message) {
    let Some(channel_name) = message.param(0) else {
        need_more_params(server, token, "PART");
        return;
    };
    let channel_name = channel_name.to_string();

    if server.channel(&channel_name).is_none() {
        let nick = current_nick(server, token);
        reply(
            server,
            token,
            IrcReply::ErrNoSuchChannel {
                nick: &nick,
                channel: &channel_name,
            },
        );
        return;
    }

    let is_member = server
        .channel(&channel_name)
        .is_some_and(|c| c.is_member(token));
    if !is_member {
        let nick = current_nick(server, token);
        reply(
            server,
            token,
            IrcReply::ErrNotOnChannel {
                nick: &nick,
                channel: &channel_name,
            },
        );
        return;
    }

    let (nick, user, host) = {
        let client = server.client(token).unwrap();
        (
            client.nickname.clone().unwrap_or_default(),
            client.username.clone().unwrap_or_default(),
            client.hostname.clone(),
        )
    };
    let part_line = format!("{} PART {channel_name}", origin_prefix(&nick, &user, &host));
    server.broadcast_channel(&channel_name, &part_line, None);

    if let Some(channel) = server.channel_mut(&channel_name) {
        channel.remove_member(token);
        if channel.is_empty() {
            server.channels_mut().remove(&channel_name);
        }
    }
    if let Some(client) = server.client_mut(token) {
        client.joined_channels.shift_remove(&channel_name);
    }
}

pub fn handle_topic(server: &mut Server, token: Token, message: &Message) {
    let Some(channel_name) = message.param(0) else {
        need_more_params(server, token, "TOPIC");
        return;
    };
    let channel_name = channel_name.to_string();

    if server.channel(&channel_name).is_none() {
        let nick = current_nick(server, token);
        reply(
            server,
            token,
            IrcReply::ErrNoSuchChannel {
                nick: &nick,
                channel: &channel_name,
            },
        );
        return;
    }

    let is_member = server
        .channel(&channel_name)
        .is_some_and(|c| c.is_member(token));
    if !is_member {
        let nick = current_nick(server, token);
        reply(
            server,
            token,
            IrcReply::ErrNotOnChannel {
                nick: &nick,
                channel: &channel_name,
            },
        );
        return;
    }

    // Reading the topic: no further params at all (the channel name is
    // params[0], so "further params" means param(1) or a trailing).
    if message.param(1).is_none() && message.trailing.is_none() {
        send_topic(server, token, &channel_name);
        return;
    }

    let mut new_topic = message.last_as_text().unwrap_or("").to_string();
    let max_topic_len = server.config().max_topic_length();
    if new_topic.len() > max_topic_len {
        new_topic.truncate(max_topic_len);
    }

    let (restricted, is_operator) = {
        let channel = server.channel(&channel_name).unwrap();
        (channel.topic_restricted, channel.is_operator(token))
    };
    if restricted && !is_operator {
        let nick = current_nick(server, token);
        reply(
            server,
            token,
            IrcReply::ErrChanOpPrivsNeeded {
                nick: &nick,
                channel: &channel_name,
            },
        );
        return;
    }

    if let Some(channel) = server.channel_mut(&channel_name) {
        channel.topic = new_topic.clone();
    }

    let (nick, user, host) = {
        let client = server.client(token).unwrap();
        (
            client.nickname.clone().unwrap_or_default(),
            client.username.clone().unwrap_or_default(),
            client.hostname.clone(),
        )
    };
    let topic_line = format!(
        "{} TOPIC {channel_name} :{new_topic}",
        origin_prefix(&nick, &user, &host)
    );
    server.broadcast_channel(&channel_name, &topic_line, None);
}

fn send_topic(server: &mut Server, token: Token, channel_name: &str) {
    let nick = current_nick(server, token);
    let Some(channel) = server.channel(channel_name) else {
        return;
    };
    if channel.topic.is_empty() {
        reply(
            server,
            token,
            IrcReply::NoTopic {
                nick: &nick,
                channel: channel_name,
            },
        );
    } else {
        let topic = channel.topic.clone();
        reply(
            server,
            token,
            IrcReply::Topic {
                nick: &nick,
                channel: channel_name,
                topic: &topic,
            },
        );
    }
}
