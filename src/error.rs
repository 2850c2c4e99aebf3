use crate::coerce::{CoercionFailure, FieldKind};
use colored::Colorize;
use std::fmt;

/// A present value that could not be converted to its field's kind
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoercionError {
    pub key: String,
    pub value: String,
    pub kind: FieldKind,
    pub failure: CoercionFailure,
}

impl CoercionError {
    pub fn new(key: &str, value: &str, kind: FieldKind, failure: CoercionFailure) -> Self {
        Self {
            key: key.to_string(),
            value: value.to_string(),
            kind,
            failure,
        }
    }
}

impl fmt::Display for CoercionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.failure {
            CoercionFailure::UnsupportedKind => write!(
                f,
                "{}: Unsupported field type {} for value {}",
                self.key.magenta().bold(),
                self.kind.to_string().yellow(),
                format!("'{}'", self.value).red(),
            ),
            failure => write!(
                f,
                "{}: Invalid value {} for {} ({})",
                self.key.magenta().bold(),
                format!("'{}'", self.value).red(),
                self.kind.to_string().yellow(),
                failure,
            ),
        }
    }
}

impl std::error::Error for CoercionError {}

/// Errors that can occur while binding a configuration record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BindError {
    /// A single field's value could not be coerced; aborts the binding pass
    TypeMismatch(CoercionError),
    /// Every required key that had neither an environment value nor a default,
    /// in declaration order
    MissingRequired { keys: Vec<String> },
}

impl BindError {
    /// Keys reported as missing, empty for a type mismatch
    pub fn missing_keys(&self) -> &[String] {
        match self {
            Self::MissingRequired { keys } => keys.as_slice(),
            Self::TypeMismatch(_) => &[],
        }
    }
}

impl From<CoercionError> for BindError {
    fn from(err: CoercionError) -> Self {
        Self::TypeMismatch(err)
    }
}

impl fmt::Display for BindError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BindError::TypeMismatch(err) => fmt::Display::fmt(err, f),
            BindError::MissingRequired { keys } => {
                let joined = keys
                    .iter()
                    .map(|key| key.magenta().bold().to_string())
                    .collect::<Vec<_>>()
                    .join(" ");
                write!(
                    f,
                    "the following environment variables must be set: {}",
                    joined
                )
            }
        }
    }
}

impl std::error::Error for BindError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            BindError::TypeMismatch(err) => Some(err),
            BindError::MissingRequired { .. } => None,
        }
    }
}

/// Format a binding failure into a startup report
pub fn format_bind_error(err: &BindError) -> String {
    let heading = match err {
        BindError::TypeMismatch(_) => "Configuration has an invalid value:".to_string(),
        BindError::MissingRequired { keys } => format!(
            "Configuration is missing {} required variable(s):",
            keys.len().to_string().yellow().bold()
        ),
    };

    format!("{}\n  - {}", heading, err)
}
