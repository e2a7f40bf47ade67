//! Error taxonomy for a running session.
//!
//! Everything here is recoverable at the dispatcher level: transport
//! failures feed the runtime's restart policy, desyncs are absorbed by a
//! wholesale reload, and user-facing failures become transient status
//! lines. Only configuration errors (see `config::ConfigError`) may abort
//! the process, and only at startup.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("transport failure: {0}")]
    Transport(#[from] lichess_client::ClientError),

    #[error("worker thread failed to start: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("move history diverged from the server")]
    ProtocolDesync,

    #[error("{0}")]
    IllegalLocalCommand(String),

    #[error("server rejected the request: {0}")]
    RemoteRejection(String),

    #[error(transparent)]
    Rules(#[from] chess_rules::RulesError),
}

pub type CoreResult<T> = Result<T, CoreError>;
