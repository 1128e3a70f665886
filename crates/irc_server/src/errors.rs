use thiserror::Error;

/// Errors that can occur while bringing the server up. All of these are
/// fatal: the caller is expected to report them and exit non-zero.
#[derive(Error, Debug)]
pub enum SetupError {
    #[error("failed to bind listener on port {port}: {source}")]
    Bind {
        port: u16,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to register listener with the poller: {0}")]
    Register(#[source] std::io::Error),
}

/// Errors that can occur while loading the optional TOML configuration
/// file. Also fatal at startup.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read configuration file '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse configuration file '{path}': {source}")]
    Parse {
        path: String,
        #[source]
        source: Box<toml::de::Error>,
    },
}

/// Fatal errors raised while the event loop is running. Anything else
/// (bad client input, a single connection's I/O failure) is handled inline
/// and never reaches this type.
#[derive(Error, Debug)]
pub enum RunError {
    #[error("poll failed: {0}")]
    Poll(#[source] std::io::Error),
}
