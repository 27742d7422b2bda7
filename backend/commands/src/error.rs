/// Error types for command registration and dispatch.
use thiserror::Error;

use crate::descriptor::ResponderKey;

/// A defect in how commands or mappers were wired together.
///
/// These surface at startup (registration, manifest loading) and are never a
/// user's fault.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("command name cannot be empty")]
    EmptyName,

    #[error("command `{0}` declares no responders")]
    NoResponders(String),

    #[error("`{name}` is already registered (by command `{owner}`)")]
    DuplicateName { name: String, owner: String },

    #[error("command `{command}` declares two responders with key {key}")]
    DuplicateResponder { command: String, key: ResponderKey },

    #[error("a mapper for type `{0}` is already registered")]
    DuplicateMapper(&'static str),

    #[error("command `{command}` takes a `{type_name}` but no argument mapper accepts it")]
    MissingArgumentMapper {
        command: String,
        type_name: &'static str,
    },

    #[error("command `{command}` returns a `{type_name}` but no result mapper accepts it")]
    MissingResultMapper {
        command: String,
        type_name: &'static str,
    },

    #[error("manifest references unknown command identifier `{0}`")]
    UnknownIdentifier(String),
}

/// A token could not be converted into the requested type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot map `{token}` to {expected}")]
pub struct MappingError {
    pub token: String,
    pub expected: &'static str,
}

impl MappingError {
    pub fn new(token: impl Into<String>, expected: &'static str) -> Self {
        Self {
            token: token.into(),
            expected,
        }
    }
}

/// A user-facing failure raised by a handler.
///
/// This is the only sanctioned way for a command to tell the invoker that
/// something went wrong; the message is shown verbatim.
#[derive(Debug, Clone, Default, PartialEq, Eq, Error)]
#[error("{}", message.as_deref().unwrap_or("command failed"))]
pub struct ErrorSignal {
    pub message: Option<String>,
}

impl ErrorSignal {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
        }
    }

    /// A signal without a message; the generic failure text is shown instead.
    pub fn bare() -> Self {
        Self { message: None }
    }
}

/// Everything a responder can fail with.
#[derive(Debug, Error)]
pub enum HandlerError {
    #[error(transparent)]
    Signal(#[from] ErrorSignal),

    #[error("handler fault: {0}")]
    Fault(#[from] anyhow::Error),
}

impl HandlerError {
    pub fn signal(message: impl Into<String>) -> Self {
        Self::Signal(ErrorSignal::new(message))
    }
}

/// Why a dispatch terminated without running to completion.
///
/// Exactly one of these ends a failed dispatch. Every variant is rendered to
/// the invoker; the defect variants are also logged at error level.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("insufficient permission: {0}")]
    InsufficientPermission(String),

    #[error("`{command}` takes {expected} argument(s), got {got}")]
    ArgumentCountMismatch {
        command: String,
        expected: String,
        got: usize,
    },

    #[error(transparent)]
    UnmappableArgument(MappingError),

    #[error("handler signalled an error: {0}")]
    Signal(ErrorSignal),

    #[error("no result mapper accepts `{0}`")]
    UnhandledResultType(&'static str),

    #[error("result mapping failed: {0}")]
    ResultMapping(MappingError),

    #[error("configuration defect: {0}")]
    Config(#[from] ConfigError),

    #[error("handler fault: {0}")]
    HandlerFault(String),
}

impl DispatchError {
    /// Whether this is a programming/configuration defect rather than a user error.
    pub fn is_defect(&self) -> bool {
        matches!(
            self,
            Self::UnhandledResultType(_)
                | Self::ResultMapping(_)
                | Self::Config(_)
                | Self::HandlerFault(_)
        )
    }

    /// Text shown to the invoker. Defects never leak internals.
    pub fn user_message(&self, generic: &str) -> String {
        match self {
            Self::InsufficientPermission(reason) => reason.clone(),
            Self::ArgumentCountMismatch {
                command,
                expected,
                got,
            } => format!("`{command}` expects {expected} argument(s) but {got} were given!"),
            Self::UnmappableArgument(err) => {
                format!("Could not understand `{}` (expected {})!", err.token, err.expected)
            }
            Self::Signal(signal) => signal.message.clone().unwrap_or_else(|| generic.to_string()),
            _ => generic.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GENERIC: &str = "Something went wrong";

    #[test]
    fn test_signal_message_or_fallback() {
        let with = DispatchError::Signal(ErrorSignal::new("No such user"));
        assert_eq!(with.user_message(GENERIC), "No such user");

        let without = DispatchError::Signal(ErrorSignal::bare());
        assert_eq!(without.user_message(GENERIC), GENERIC);
    }

    #[test]
    fn test_defects_hide_details() {
        let err = DispatchError::HandlerFault("index out of bounds".into());
        assert!(err.is_defect());
        assert_eq!(err.user_message(GENERIC), GENERIC);

        let err = DispatchError::UnhandledResultType("my_crate::Thing");
        assert!(err.is_defect());
        assert_eq!(err.user_message(GENERIC), GENERIC);
    }

    #[test]
    fn test_unmappable_names_token_and_type() {
        let err = DispatchError::UnmappableArgument(MappingError::new("abc", "i64"));
        assert!(!err.is_defect());
        let msg = err.user_message(GENERIC);
        assert!(msg.contains("`abc`"));
        assert!(msg.contains("i64"));
    }

    #[test]
    fn test_handler_error_conversions() {
        let err: HandlerError = ErrorSignal::new("nope").into();
        assert!(matches!(err, HandlerError::Signal(_)));

        let err: HandlerError = anyhow::anyhow!("boom").into();
        assert!(matches!(err, HandlerError::Fault(_)));
    }
}
