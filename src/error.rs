#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}

/// A problem found while turning metric CSV text into points.
///
/// Line numbers are 1-based and refer to the raw input.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("line {line}: expected 2 fields (timestamp, value), found {found}")]
    FieldCount { line: u64, found: usize },
    #[error("line {line}: invalid timestamp '{value}' ({expected})")]
    Timestamp {
        line: u64,
        value: String,
        expected: &'static str,
    },
    #[error("line {line}: invalid value '{value}' (expected a finite number)")]
    Value { line: u64, value: String },
    #[error("malformed CSV: {0}")]
    Csv(String),
}

impl ParseError {
    pub fn line(&self) -> Option<u64> {
        match self {
            Self::FieldCount { line, .. } | Self::Timestamp { line, .. } | Self::Value { line, .. } => Some(*line),
            Self::Csv(_) => None,
        }
    }
}

impl From<ParseError> for AppError {
    fn from(err: ParseError) -> Self {
        AppError::new(2, format!("Failed to parse metric CSV: {err}"))
    }
}
