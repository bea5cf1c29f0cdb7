use thiserror::Error;

/// Channel/scope misconfiguration. Raised while building a channel table, never while resolving.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScopeError {
    #[error("scope {scope:?} requires a role threshold")]
    MissingRoleThreshold { scope: String },

    #[error("unknown role {0:?}")]
    UnknownRole(String),

    #[error("unknown scope {0:?}")]
    UnknownScope(String),

    #[error("empty scope name")]
    EmptyScope,

    #[error("duplicate channel name {0:?}")]
    DuplicateChannel(String),

    #[error("channel {channel}: {source}")]
    Channel {
        channel: String,
        #[source]
        source: Box<ScopeError>,
    },
}

/// Keyed lookup miss. Fatal to whoever asked the registry, not to resolution.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LookupError {
    #[error("{kind} not found: {key}")]
    NotFound { kind: &'static str, key: String },
}

/// Graph mutation failures (movement/grouping subsystem).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WorldError {
    #[error(transparent)]
    Lookup(#[from] LookupError),

    #[error("character {0} already in a party")]
    AlreadyInParty(u64),

    #[error("area yaml {file}: {msg}")]
    AreaFile { file: String, msg: String },
}
