use thiserror::Error;

/// Failure while encoding or decoding a wire buffer.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WireError {
    /// Input ended before the field was complete.
    #[error("unexpected end of buffer while reading {field}")]
    UnexpectedEnd { field: &'static str },

    /// A count was negative, too large, or inconsistent with another field.
    #[error("invalid length for {field}")]
    InvalidLength { field: &'static str },

    /// A value is outside its domain (bad flag, dangling link, stray NUL).
    #[error("invalid value for {field}")]
    InvalidValue { field: &'static str },

    /// Bytes remained after the last field.
    #[error("{remaining} trailing byte(s) after offset {consumed}")]
    TrailingBytes { consumed: usize, remaining: usize },
}

impl WireError {
    pub fn unexpected_end(field: &'static str) -> Self {
        Self::UnexpectedEnd { field }
    }

    pub fn invalid_length(field: &'static str) -> Self {
        Self::InvalidLength { field }
    }

    pub fn invalid_value(field: &'static str) -> Self {
        Self::InvalidValue { field }
    }
}

pub type WireResult<T> = Result<T, WireError>;
