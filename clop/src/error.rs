use thiserror::Error;

pub type Result<T> = std::result::Result<T, ParseError>;

/// Why a scan did not produce a resume index.
///
/// Every variant except [`ParseError::Failed`] stopped the scan at once.
/// `Failed` is reported after the scan ran to its natural end while one or
/// more soft errors were recorded on the way.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// A lone `-` token.
    #[error("missing option -?")]
    MissingOption { index: usize },

    /// A lone `--` token.
    #[error("missing long option --???")]
    MissingLongOption { index: usize },

    #[error("missing argument of long option --{name}")]
    MissingLongArgument { name: String },

    #[error("missing argument for option '{short}'")]
    MissingShortArgument { short: char },

    #[error("missing argument after '=' of long option --{name}")]
    MissingLongValueAfterEquals { name: String },

    #[error("missing argument after '=' of short option -{short}")]
    MissingShortValueAfterEquals { short: char },

    /// A handler returned [`crate::Outcome::Abort`].
    #[error("option handler aborted with status {code}")]
    Aborted { code: i32 },

    /// Unrecognized options or soft handler failures.
    #[error("{errors} option error(s) reported")]
    Failed { errors: usize },
}

impl ParseError {
    /// Negative status code of this failure.
    ///
    /// Aborts carry the handler's own code, everything else maps to `-1`.
    pub fn code(&self) -> i32 {
        match self {
            ParseError::Aborted { code } => *code,
            _ => -1,
        }
    }

    /// True when the scan stopped before reaching its end.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, ParseError::Failed { .. })
    }
}

/// Malformed option declarations, found when a table is built.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TableError {
    #[error("option #{position} has neither a short nor a long spelling")]
    NoSpelling { position: usize },

    #[error("option #{position} has an empty long spelling")]
    EmptyLong { position: usize },

    #[error("long option --{name} must not contain '='")]
    LongContainsEquals { name: String },

    #[error("'{short}' cannot be used as a short option")]
    ReservedShort { short: char },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aborted_keeps_handler_code() {
        assert_eq!(ParseError::Aborted { code: -42 }.code(), -42);
        assert!(ParseError::Aborted { code: -42 }.is_fatal());
    }

    #[test]
    fn engine_failures_map_to_minus_one() {
        assert_eq!(ParseError::Failed { errors: 3 }.code(), -1);
        assert_eq!(ParseError::MissingOption { index: 1 }.code(), -1);
        assert!(!ParseError::Failed { errors: 3 }.is_fatal());
    }

    #[test]
    fn messages_name_the_option() {
        let err = ParseError::MissingLongArgument {
            name: "integer".to_string(),
        };
        assert_eq!(err.to_string(), "missing argument of long option --integer");
        let err = ParseError::MissingShortValueAfterEquals { short: 'l' };
        assert_eq!(err.to_string(), "missing argument after '=' of short option -l");
    }
}
