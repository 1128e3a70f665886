use mio::Token;

use crate::handlers;
use crate::message::Message;
use crate::replies::IrcReply;
use crate::server::Server;

/// Commands that bypass the registration gate: meaningful (or harmless)
/// before `REGISTERED`.
fn allowed_before_registration(command: &str) -> bool {
    matches!(command, "PASS" | "NICK" | "USER" | "QUIT" | "PING")
}

/// Routes one parsed line to its handler. Unregistered clients are
/// rejected with 451 for anything outside the registration handshake;
/// commands this server doesn't implement are logged and otherwise
/// ignored rather than answered with an invented numeric.
pub fn dispatch(server: &mut Server, token: Token, message: Message) {
    if !allowed_before_registration(&message.command) {
        let registered = server.client(token).is_some_and(|c| c.is_registered());
        if !registered {
            send_not_registered(server, token);
            return;
        }
    }

    match message.command.as_str() {
        "PASS" => handlers::registration::handle_pass(server, token, &message),
        "NICK" => handlers::registration::handle_nick(server, token, &message),
        "USER" => handlers::registration::handle_user(server, token, &message),
        "QUIT" => handlers::registration::handle_quit(server, token, &message),
        "PING" => handlers::messages::handle_ping(server, token, &message),
        "JOIN" => handlers::channels::handle_join(server, token, &message),
        "PART" => handlers::channels::handle_part(server, token, &message),
        "TOPIC" => handlers::channels::handle_topic(server, token, &message),
        "PRIVMSG" => handlers::messages::handle_privmsg(server, token, &message),
        other => {
            log::debug!("ignoring unsupported command {other:?} from {token:?}");
        }
    }
}

fn send_not_registered(server: &mut Server, token: Token) {
    let nick = server
        .client(token)
        .and_then(|c| c.nickname.clone())
        .unwrap_or_else(|| "*".to_string());
    let line = IrcReply::ErrNotRegistered { nick: &nick }.format(&server.config().server.name);
    if let Some(client) = server.client_mut(token) {
        client.queue_line(line);
    }
}
