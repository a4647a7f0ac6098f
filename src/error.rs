pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Input rejected before any work was done (e.g. empty password).
    Validation(String),
    /// Stored hash is not in the expected `$tag$v=..$m=..,t=..,p=..$salt$digest` shape.
    Format(String),
    /// The OS random source failed to produce salt bytes.
    Randomness(String),
    Derivation(String),
    Cancelled,
    Config(String),
    Internal(String),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Validation(msg) => write!(f, "Validation Error: {msg}"),
            Error::Format(msg) => write!(f, "Format Error: {msg}"),
            Error::Randomness(msg) => write!(f, "Randomness Failure: {msg}"),
            Error::Derivation(msg) => write!(f, "Derivation Error: {msg}"),
            Error::Cancelled => write!(f, "Cancelled"),
            Error::Config(msg) => write!(f, "Config Error: {msg}"),
            Error::Internal(msg) => write!(f, "Internal Error: {msg}"),
        }
    }
}

impl std::error::Error for Error {}

impl From<argon2::Error> for Error {
    fn from(err: argon2::Error) -> Self {
        Error::Derivation(err.to_string())
    }
}

impl From<base64::DecodeError> for Error {
    fn from(err: base64::DecodeError) -> Self {
        Error::Format(format!("invalid base64: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_prefixes_kind() {
        assert_eq!(
            Error::Validation("password cannot be empty".into()).to_string(),
            "Validation Error: password cannot be empty"
        );
        assert_eq!(Error::Cancelled.to_string(), "Cancelled");
    }

    #[test]
    fn base64_errors_become_format_errors() {
        let err: Error = base64::DecodeError::InvalidLength(3).into();
        assert!(matches!(err, Error::Format(_)));
    }
}
