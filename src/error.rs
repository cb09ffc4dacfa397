use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum GeoConsentError {
    /// The geolocation service could not produce a usable answer.
    #[error("geo lookup unavailable: {reason}")]
    LookupUnavailable { reason: String },

    /// The lookup succeeded but no location group claims the visitor.
    #[error("no location group matches country={country} region={region}")]
    NoMatch { country: String, region: String },

    /// The cached policy cookie could not be parsed.
    #[error("malformed cached policy: {reason}")]
    MalformedCache { reason: String },

    #[error("policy fetch failed: {reason}")]
    PolicyFetch { reason: String },

    #[error("invalid policy payload: {reason}")]
    InvalidPolicy { reason: String },

    #[error("config parse error in {path}: {reason}")]
    ConfigParse { path: PathBuf, reason: String },

    #[error("location groups parse error in {path}: {reason}")]
    GroupsParse { path: PathBuf, reason: String },

    #[error("a resolution hook is already registered with the banner bootstrap")]
    HookAlreadyRegistered,

    #[error("server error: {reason}")]
    Server { reason: String },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("api error: status={status}, body={body}")]
    Api { status: u16, body: String },
}

pub type Result<T> = std::result::Result<T, GeoConsentError>;
