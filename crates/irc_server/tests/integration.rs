//! Black-box end-to-end tests: each spins up a real `Server` on an
//! ephemeral port in a background thread and drives it with plain
//! blocking `TcpStream` clients, the same way a manual smoke test would.

use std::io::{BufRead, BufReader, Write};
use std::net::TcpStream;
use std::thread;
use std::time::Duration;

use irc_server::{Config, Server};

struct TestServer {
    addr: std::net::SocketAddr,
    stop: std::sync::Arc<std::sync::atomic::AtomicBool>,
    handle: Option<thread::JoinHandle<()>>,
}

impl TestServer {
    fn start(password: &str) -> Self {
        Self::start_with_config(password, Config::default())
    }

    fn start_with_config(password: &str, config: Config) -> Self {
        let mut server = Server::new(0, password.to_string())
            .expect("poll init")
            .with_config(config);
        server.setup().expect("setup");
        let addr = server.local_addr().expect("bound address");
        let stop = server.stop_flag();

        let handle = thread::spawn(move || {
            let _ = server.run();
        });

        TestServer {
            addr,
            stop,
            handle: Some(handle),
        }
    }

    fn connect(&self) -> TcpStream {
        let stream = TcpStream::connect(self.addr).expect("connect");
        stream
            .set_read_timeout(Some(Duration::from_secs(2)))
            .unwrap();
        stream
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.stop.store(true, std::sync::atomic::Ordering::SeqCst);
        // Poking a dummy connection wakes up an infinite-timeout poll()
        // immediately instead of waiting for the next incoming event.
        let _ = TcpStream::connect(self.addr);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn read_line(reader: &mut BufReader<TcpStream>) -> String {
    let mut line = String::new();
    reader.read_line(&mut line).expect("read line");
    line.trim_end_matches(['\r', '\n']).to_string()
}

fn register(stream: &mut TcpStream, reader: &mut BufReader<TcpStream>, password: &str, nick: &str) {
    write!(stream, "PASS {password}\r\n").unwrap();
    write!(stream, "NICK {nick}\r\n").unwrap();
    write!(stream, "USER {nick} 0 * :{nick} Realname\r\n").unwrap();

    for expected_code in ["001", "002", "003", "004", "422"] {
        let line = read_line(reader);
        assert!(
            line.contains(expected_code),
            "expected numeric {expected_code} in {line:?}"
        );
    }
}

#[test]
fn s1_registration_happy_path() {
    let server = TestServer::start("secret");
    let mut stream = server.connect();
    let mut reader = BufReader::new(stream.try_clone().unwrap());
    register(&mut stream, &mut reader, "secret", "alice");
}

#[test]
fn s2_wrong_password_disconnects() {
    let server = TestServer::start("secret");
    let mut stream = server.connect();
    let mut reader = BufReader::new(stream.try_clone().unwrap());

    write!(stream, "PASS wrong\r\n").unwrap();
    let line = read_line(&mut reader);
    assert!(line.contains("464"), "expected 464 in {line:?}");

    // Socket should be closed shortly after: a further read returns Ok(0).
    let mut buf = [0u8; 16];
    use std::io::Read;
    let n = stream.read(&mut buf).unwrap_or(0);
    assert_eq!(n, 0, "expected connection to be closed after PASS mismatch");
}

#[test]
fn s3_topic_restricted_blocks_non_operator() {
    let server = TestServer::start("secret");

    let mut alice = server.connect();
    let mut alice_reader = BufReader::new(alice.try_clone().unwrap());
    register(&mut alice, &mut alice_reader, "secret", "alice");

    let mut bob = server.connect();
    let mut bob_reader = BufReader::new(bob.try_clone().unwrap());
    register(&mut bob, &mut bob_reader, "secret", "bob");

    write!(alice, "JOIN #lobby\r\n").unwrap();
    // alice: JOIN echo, 331 (no topic), 353 (names), 366 (end of names)
    for _ in 0..4 {
        read_line(&mut alice_reader);
    }

    write!(bob, "JOIN #lobby\r\n").unwrap();
    // bob sees alice's roster already contains her; alice gets bob's JOIN broadcast.
    let alice_sees_join = read_line(&mut alice_reader);
    assert!(alice_sees_join.contains("JOIN #lobby"));
    for _ in 0..3 {
        read_line(&mut bob_reader); // JOIN echo, 331, 353
    }
    read_line(&mut bob_reader); // 366

    write!(bob, "TOPIC #lobby :hello world\r\n").unwrap();
    let reply = read_line(&mut bob_reader);
    assert!(reply.contains("482"), "expected 482 in {reply:?}");
}

#[test]
fn s4_names_ordering_marks_only_creator_as_operator() {
    let server = TestServer::start("secret");

    let mut alice = server.connect();
    let mut alice_reader = BufReader::new(alice.try_clone().unwrap());
    register(&mut alice, &mut alice_reader, "secret", "alice");

    let mut bob = server.connect();
    let mut bob_reader = BufReader::new(bob.try_clone().unwrap());
    register(&mut bob, &mut bob_reader, "secret", "bob");

    let mut carol = server.connect();
    let mut carol_reader = BufReader::new(carol.try_clone().unwrap());
    register(&mut carol, &mut carol_reader, "secret", "carol");

    write!(alice, "JOIN #r\r\n").unwrap();
    for _ in 0..4 {
        read_line(&mut alice_reader);
    }

    write!(bob, "JOIN #r\r\n").unwrap();
    read_line(&mut alice_reader); // alice sees bob's JOIN
    for _ in 0..4 {
        read_line(&mut bob_reader);
    }

    write!(carol, "JOIN #r\r\n").unwrap();
    read_line(&mut alice_reader); // alice sees carol's JOIN
    read_line(&mut bob_reader); // bob sees carol's JOIN
    read_line(&mut carol_reader); // carol's own JOIN echo
    read_line(&mut carol_reader); // 331
    let names = read_line(&mut carol_reader); // 353
    assert!(names.contains("@alice"));
    assert!(names.contains("bob"));
    assert!(names.contains("carol"));
    assert!(!names.contains("@bob"));
    assert!(!names.contains("@carol"));
}

#[test]
fn s5_empty_channel_is_collected_and_recreated() {
    let server = TestServer::start("secret");

    let mut alice = server.connect();
    let mut alice_reader = BufReader::new(alice.try_clone().unwrap());
    register(&mut alice, &mut alice_reader, "secret", "alice");

    write!(alice, "JOIN #x\r\n").unwrap();
    for _ in 0..4 {
        read_line(&mut alice_reader);
    }
    write!(alice, "QUIT :bye\r\n").unwrap();
    thread::sleep(Duration::from_millis(100));

    let mut bob = server.connect();
    let mut bob_reader = BufReader::new(bob.try_clone().unwrap());
    register(&mut bob, &mut bob_reader, "secret", "bob");

    write!(bob, "JOIN #x\r\n").unwrap();
    read_line(&mut bob_reader); // JOIN echo
    read_line(&mut bob_reader); // 331 no topic
    let names = read_line(&mut bob_reader); // 353
    assert!(names.contains("@bob"), "bob should be the new operator: {names:?}");
}

#[test]
fn s6_buffer_overflow_disconnects_with_error_line() {
    let server = TestServer::start("secret");
    let mut stream = server.connect();
    let mut reader = BufReader::new(stream.try_clone().unwrap());

    let garbage = vec![b'a'; 9000];
    stream.write_all(&garbage).unwrap();

    let line = read_line(&mut reader);
    assert_eq!(line, "ERROR :Client exceeded buffer size limit");
}

#[test]
fn s7_ping_answered_before_registration() {
    let server = TestServer::start("secret");
    let mut stream = server.connect();
    let mut reader = BufReader::new(stream.try_clone().unwrap());

    write!(stream, "PING abc123\r\n").unwrap();
    let line = read_line(&mut reader);
    assert!(line.starts_with("PONG "));
    assert!(line.ends_with(":abc123"));
}

#[test]
fn join_over_channel_limit_gets_405() {
    let mut config = Config::default();
    config.limits.max_channels_per_user = 1;
    let server = TestServer::start_with_config("secret", config);

    let mut alice = server.connect();
    let mut reader = BufReader::new(alice.try_clone().unwrap());
    register(&mut alice, &mut reader, "secret", "alice");

    write!(alice, "JOIN #one\r\n").unwrap();
    for _ in 0..4 {
        read_line(&mut reader);
    }

    write!(alice, "JOIN #two\r\n").unwrap();
    let line = read_line(&mut reader);
    assert!(line.contains("405"), "expected 405 in {line:?}");
}

#[test]
fn connection_over_total_limit_is_rejected() {
    let mut config = Config::default();
    config.network.max_connections = 1;
    let server = TestServer::start_with_config("secret", config);

    let mut first = server.connect();
    let mut first_reader = BufReader::new(first.try_clone().unwrap());
    register(&mut first, &mut first_reader, "secret", "alice");

    // The listener now has one live client; a second connection should be
    // refused outright with an ERROR line and an immediate close.
    let mut second = server.connect();
    let mut second_reader = BufReader::new(second.try_clone().unwrap());
    let line = read_line(&mut second_reader);
    assert!(line.starts_with("ERROR"), "expected ERROR line, got {line:?}");

    let mut buf = [0u8; 16];
    use std::io::Read;
    let n = second.read(&mut buf).unwrap_or(0);
    assert_eq!(n, 0, "expected second connection to be closed");
}

#[test]
fn privmsg_to_unknown_nick_and_channel() {
    let server = TestServer::start("secret");
    let mut stream = server.connect();
    let mut reader = BufReader::new(stream.try_clone().unwrap());
    register(&mut stream, &mut reader, "secret", "alice");

    write!(stream, "PRIVMSG ghost :hi\r\n").unwrap();
    let line = read_line(&mut reader);
    assert!(line.contains("401"), "expected 401 in {line:?}");

    write!(stream, "PRIVMSG #nowhere :hi\r\n").unwrap();
    let line = read_line(&mut reader);
    assert!(line.contains("403"), "expected 403 in {line:?}");
}
