use serde_json::Value;

/// Error codes the bridge reports in-band inside `{"error": {"type": n}}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiErrorKind {
    /// Code 1: the username is not whitelisted on the bridge.
    UnauthorizedUser,
    /// Code 3: the addressed light or group does not exist.
    ResourceNotAvailable,
    /// Code 6: the parameter is not supported by the resource.
    ParameterNotAvailable,
    /// Code 7: the value is out of range for the parameter.
    InvalidValue,
    /// Code 101: the link button has not been pressed.
    LinkButtonNotPressed,
    /// Code 201: the device is off; state parameters cannot be modified.
    LightIsOff,
    /// Code 301: the bridge cannot store any more groups.
    GroupTableFull,
    /// Any other code.
    Other(u16),
}

impl ApiErrorKind {
    pub fn from_code(code: u16) -> Self {
        match code {
            1 => ApiErrorKind::UnauthorizedUser,
            3 => ApiErrorKind::ResourceNotAvailable,
            6 => ApiErrorKind::ParameterNotAvailable,
            7 => ApiErrorKind::InvalidValue,
            101 => ApiErrorKind::LinkButtonNotPressed,
            201 => ApiErrorKind::LightIsOff,
            301 => ApiErrorKind::GroupTableFull,
            other => ApiErrorKind::Other(other),
        }
    }

    pub fn code(&self) -> u16 {
        match self {
            ApiErrorKind::UnauthorizedUser => 1,
            ApiErrorKind::ResourceNotAvailable => 3,
            ApiErrorKind::ParameterNotAvailable => 6,
            ApiErrorKind::InvalidValue => 7,
            ApiErrorKind::LinkButtonNotPressed => 101,
            ApiErrorKind::LightIsOff => 201,
            ApiErrorKind::GroupTableFull => 301,
            ApiErrorKind::Other(code) => *code,
        }
    }
}

impl std::fmt::Display for ApiErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiErrorKind::UnauthorizedUser => write!(f, "user not authorized"),
            ApiErrorKind::ResourceNotAvailable => write!(f, "resource not available"),
            ApiErrorKind::ParameterNotAvailable => write!(f, "parameter not available"),
            ApiErrorKind::InvalidValue => write!(f, "invalid value for parameter"),
            ApiErrorKind::LinkButtonNotPressed => write!(f, "link button not pressed"),
            ApiErrorKind::LightIsOff => write!(f, "light is off"),
            ApiErrorKind::GroupTableFull => {
                write!(f, "cannot create group, group table already full")
            }
            ApiErrorKind::Other(code) => write!(f, "unexpected error code {code}"),
        }
    }
}

/// All error types that can occur when talking to a Hue bridge.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// An authenticated request was attempted before a username was known.
    #[error("username not set")]
    UsernameNotSet,

    /// The bridge answered with an error object.
    #[error("bridge error {kind} ({code}) at {address:?}", code = .kind.code())]
    Api {
        kind: ApiErrorKind,
        address: Option<String>,
        description: Option<String>,
    },

    /// The bridge answered with JSON of an unexpected shape.
    #[error("unexpected response: {0}")]
    UnexpectedResponse(Value),

    /// The HTTP request itself failed.
    #[error("network error: {0}")]
    Http(#[from] reqwest::Error),

    /// Failed to serialize data to JSON.
    #[error("failed to dump json: {0:?}")]
    JsonDump(serde_json::Error),

    /// Failed to deserialize JSON data.
    #[error("failed to load json: {0:?}")]
    JsonLoad(serde_json::Error),

    /// A socket operation failed during discovery.
    #[error("socket {action} error: {err:?}")]
    Socket { action: String, err: std::io::Error },

    /// The light is not present in the local registry.
    #[error("light {0} not found")]
    LightNotFound(String),

    /// The group is not present in the local registry.
    #[error("group {0} not found")]
    GroupNotFound(String),

    /// Attempted to write a [`crate::StateUpdate`] with no properties set.
    #[error("invalid update; no properties set")]
    EmptyUpdate,

    /// The update queue worker is gone.
    #[error("update queue closed")]
    QueueClosed,

    /// The bridge host could not be turned into a URL.
    #[error("invalid bridge host {0}")]
    InvalidHost(String),
}

impl Error {
    /// Create a new socket error
    pub fn socket(action: &str, err: std::io::Error) -> Self {
        Error::Socket {
            action: action.to_string(),
            err,
        }
    }

    /// Create a new bridge error from its numeric code
    pub fn api(code: u16, address: Option<&str>, description: Option<&str>) -> Self {
        Error::Api {
            kind: ApiErrorKind::from_code(code),
            address: address.map(String::from),
            description: description.map(String::from),
        }
    }

    /// The bridge error kind, if this is a bridge error.
    pub fn api_kind(&self) -> Option<ApiErrorKind> {
        match self {
            Error::Api { kind, .. } => Some(*kind),
            _ => None,
        }
    }
}

/// Hacky implementation of PartialEq for testing
#[cfg(test)]
impl PartialEq for Error {
    fn eq(&self, other: &Self) -> bool {
        self.to_string() == other.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_codes() {
        assert_eq!(ApiErrorKind::from_code(101), ApiErrorKind::LinkButtonNotPressed);
        assert_eq!(ApiErrorKind::from_code(201), ApiErrorKind::LightIsOff);
        assert_eq!(ApiErrorKind::from_code(301), ApiErrorKind::GroupTableFull);
        assert_eq!(ApiErrorKind::from_code(42), ApiErrorKind::Other(42));
        assert_eq!(ApiErrorKind::Other(42).code(), 42);
    }

    #[test]
    fn test_api_kind() {
        let err = Error::api(201, Some("/lights/1/state/bri"), None);
        assert_eq!(err.api_kind(), Some(ApiErrorKind::LightIsOff));
        assert_eq!(Error::UsernameNotSet.api_kind(), None);
    }
}
