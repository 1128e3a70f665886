use mio::Token;

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

/// PING is answered regardless of registration state, mirroring a real
/// client's pre-registration liveness probe.
pub fn handle_ping(server: &mut Server, token: Token, message: &Message) {
    let token_text = message.last_as_text().unwrap_or("").to_string();
    let server_name = server.config().server.name.clone();
    let line = format!("PONG {server_name} :{token_text}");
    if let Some(client) = server.client_mut(token) {
        client.queue_line(line);
    }
}

pub fn handle_privmsg(server: &mut Server, token: Token, message: &Message) {
    let Some(target) = message.param(0) else {
        let nick = current_nick(server, token);
        reply(
            server,
            token,
            IrcReply::ErrNeedMoreParams {
                nick: &nick,
                command: "PRIVMSG",
            },
        );
        return;
    };
    let target = target.to_string();

    let Some(text) = message.last_as_text() else {
        let nick = current_nick(server, token);
        reply(
            server,
            token,
            IrcReply::ErrNeedMoreParams {
                nick: &nick,
                command: "PRIVMSG",
            },
        );
        return;
    };
    let mut text = text.to_string();
    let max_len = server.config().limits.max_message_length;
    if max_len > 0 && text.len() > max_len {
        text.truncate(max_len);
    }

    let (nick, user, host) = {
        let client = server.client(token).unwrap();
        (
            client.nickname.clone().unwrap_or_default(),
            client.username.clone().unwrap_or_default(),
            client.hostname.clone(),
        )
    };
    let line = format!("{} PRIVMSG {target} :{text}", origin_prefix(&nick, &user, &host));

    if target.starts_with('#') {
        if server.channel(&target).is_none() {
            reply(
                server,
                token,
                IrcReply::ErrNoSuchChannel {
                    nick: &nick,
                    channel: &target,
                },
            );
            return;
        }
        server.broadcast_channel(&target, &line, Some(token));
        return;
    }

    match server.find_token_by_nick(&target) {
        Some(recipient) => {
            if let Some(client) = server.client_mut(recipient) {
                client.queue_line(line);
            }
        }
        None => {
            reply(
                server,
                token,
                IrcReply::ErrNoSuchNick {
                    nick: &nick,
                    target: &target,
                },
            );
        }
    }
}
