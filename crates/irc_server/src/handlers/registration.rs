use log::info;
use mio::Token;

use crate::client::{RegistrationState, is_valid_nickname};
use crate::message::Message;
use crate::replies::IrcReply;
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

pub fn handle_pass(server: &mut Server, token: Token, message: &Message) {
    let Some(client) = server.client(token) else {
        return;
    };

    if client.is_registered() {
        let nick = current_nick(server, token);
        reply(server, token, IrcReply::ErrAlreadyRegistered { nick: &nick });
        return;
    }

    let Some(supplied) = message.param(0) else {
        // No password supplied at all: treat exactly like a wrong one.
        let nick = current_nick(server, token);
        let line = IrcReply::ErrPasswdMismatch { nick: &nick }.format(&server.config().server.name);
        server.disconnect_after_flush(token, &line, "Password incorrect");
        return;
    };

    if supplied == server.password() {
        if let Some(client) = server.client_mut(token) {
            client.password_validated = true;
            client.state = RegistrationState::PassOk;
        }
    } else {
        let nick = current_nick(server, token);
        let line = IrcReply::ErrPasswdMismatch { nick: &nick }.format(&server.config().server.name);
        server.disconnect_after_flush(token, &line, "Password incorrect");
    }
}

pub fn handle_nick(server: &mut Server, token: Token, message: &Message) {
    let Some(requested) = message.param(0) else {
        let nick = current_nick(server, token);
        reply(server, token, IrcReply::ErrNoNicknameGiven { nick: &nick });
        return;
    };

    if !is_valid_nickname(requested) {
        let nick = current_nick(server, token);
        reply(
            server,
            token,
            IrcReply::ErrErroneousNickname {
                nick: &nick,
                attempted: requested,
            },
        );
        return;
    }

    if server.nick_in_use(requested) {
        let nick = current_nick(server, token);
        reply(
            server,
            token,
            IrcReply::ErrNicknameInUse {
                nick: &nick,
                attempted: requested,
            },
        );
        return;
    }

    let requested = requested.to_string();
    if let Some(client) = server.client_mut(token) {
        client.nickname = Some(requested.clone());
        client.maybe_complete_registration();
    }
    maybe_send_welcome(server, token);
}

pub fn handle_user(server: &mut Server, token: Token, message: &Message) {
    let Some(client) = server.client(token) else {
        return;
    };

    if client.is_registered() {
        let nick = current_nick(server, token);
        reply(server, token, IrcReply::ErrAlreadyRegistered { nick: &nick });
        return;
    }

    if !client.password_validated {
        let nick = current_nick(server, token);
        reply(server, token, IrcReply::ErrPasswdMismatch { nick: &nick });
        return;
    }

    // USER needs four fields: username, hostname, servername, and a
    // trailing realname. `param_count()` alone can't tell the difference
    // between "USER alice 0 * :real name" and "USER alice 0 *" (the latter
    // has three middle params and no trailing, which `last_as_text()`
    // would otherwise paper over by reusing the last middle param).
    if message.param_count() < 3 || message.trailing.is_none() {
        let nick = current_nick(server, token);
        reply(
            server,
            token,
            IrcReply::ErrNeedMoreParams {
                nick: &nick,
                command: "USER",
            },
        );
        return;
    }

    let username = message.param(0).unwrap().to_string();
    let realname = message.last_as_text().unwrap().to_string();

    if let Some(client) = server.client_mut(token) {
        client.username = Some(username);
        client.realname = Some(realname);
        client.maybe_complete_registration();
    }
    maybe_send_welcome(server, token);
}

/// Sends the registration burst (001-004, 422) the first time a client's
/// state becomes `Registered`.
fn maybe_send_welcome(server: &mut Server, token: Token) {
    let Some(client) = server.client(token) else {
        return;
    };
    if !client.is_registered() || client.welcomed {
        return;
    }

    let nick = client.nickname.clone().unwrap_or_default();
    let user = client.username.clone().unwrap_or_default();
    let host = client.hostname.clone();
    let server_name = server.config().server.name.clone();
    let version = server.config().server.version.clone();

    info!("{nick} completed registration");

    let lines = [
        IrcReply::Welcome {
            nick: &nick,
            user: &user,
            host: &host,
        }
        .format(&server_name),
        IrcReply::YourHost {
            nick: &nick,
            version: &version,
        }
        .format(&server_name),
        IrcReply::Created { nick: &nick }.format(&server_name),
        IrcReply::MyInfo {
            nick: &nick,
            version: &version,
        }
        .format(&server_name),
        IrcReply::NoMotd { nick: &nick }.format(&server_name),
    ];

    if let Some(client) = server.client_mut(token) {
        for line in lines {
            client.queue_line(line);
        }
        client.welcomed = true;
    }
}

pub fn handle_quit(server: &mut Server, token: Token, message: &Message) {
    let reason = message
        .last_as_text()
        .map(str::to_string)
        .unwrap_or_else(|| "Client quit".to_string());
    server.disconnect_with_reason(token, &reason);
}
