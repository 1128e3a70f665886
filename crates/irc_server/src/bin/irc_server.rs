use clap::Parser;
use flexi_logger::{Duplicate, Logger};
use log::{error, info};
use signal_hook::consts::{SIGINT, SIGTERM};

use irc_server::{Config, Server};

/// A minimal single-threaded IRC server.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// TCP port to listen on.
    port: u16,

    /// Shared admission password required of every connecting client.
    password: String,

    /// Optional TOML configuration file overriding default limits.
    #[arg(long)]
    config: Option<String>,

    /// Logging verbosity: trace, debug, info, warn, or error.
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn main() {
    let args = Args::parse();

    Logger::try_with_str(&args.log_level)
        .and_then(|logger| {
            logger
                .log_to_stderr()
                .duplicate_to_stderr(Duplicate::All)
                .start()
        })
        .ok();

    let config = match args.config {
        Some(path) => match Config::load(&path) {
            Ok(config) => config,
            Err(e) => {
                error!("{e}");
                std::process::exit(1);
            }
        },
        None => Config::default(),
    };

    let mut server = match Server::new(args.port, args.password) {
        Ok(server) => server.with_config(config),
        Err(e) => {
            error!("failed to initialize poller: {e}");
            std::process::exit(1);
        }
    };

    if let Err(e) = server.setup() {
        error!("{e}");
        std::process::exit(1);
    }

    let stop_flag = server.stop_flag();
    for signal in [SIGINT, SIGTERM] {
        if let Err(e) = signal_hook::flag::register(signal, stop_flag.clone()) {
            error!("failed to register signal handler: {e}");
            std::process::exit(1);
        }
    }

    info!("server starting");
    if let Err(e) = server.run() {
        error!("fatal event loop error: {e}");
        std::process::exit(1);
    }
    info!("server stopped");
}
