use core::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    InvalidInput(&'static str),
}

pub type CoreResult<T> = Result<T, CoreError>;

impl fmt::Display for CoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoreError::InvalidInput(message) => write!(f, "invalid input: {message}"),
        }
    }
}

impl std::error::Error for CoreError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseErrorKind {
    /// The document violates the catalog structure.
    MalformedStructure,
    /// The bytes are not valid UTF-8 or declare an encoding we do not read.
    EncodingError,
}

/// A catalog rejected by the parser. Position is 1-based and points at the
/// construct that failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub message: String,
    pub line: u32,
    pub column: u32,
}

impl ParseError {
    pub fn malformed(message: impl Into<String>, line: u32, column: u32) -> Self {
        Self {
            kind: ParseErrorKind::MalformedStructure,
            message: message.into(),
            line,
            column,
        }
    }

    pub fn encoding(message: impl Into<String>, line: u32, column: u32) -> Self {
        Self {
            kind: ParseErrorKind::EncodingError,
            message: message.into(),
            line,
            column,
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.kind {
            ParseErrorKind::MalformedStructure => "malformed catalog",
            ParseErrorKind::EncodingError => "encoding error",
        };
        write!(
            f,
            "{kind} at {}:{}: {}",
            self.line, self.column, self.message
        )
    }
}

impl std::error::Error for ParseError {}

#[cfg(test)]
mod tests {
    use super::{CoreError, ParseError};

    #[test]
    fn display_formats_invalid_input() {
        let err = CoreError::InvalidInput("locale");
        assert_eq!(err.to_string(), "invalid input: locale");
    }

    #[test]
    fn display_formats_malformed() {
        let err = ParseError::malformed("missing <source>", 4, 9);
        assert_eq!(err.to_string(), "malformed catalog at 4:9: missing <source>");
    }

    #[test]
    fn display_formats_encoding() {
        let err = ParseError::encoding("invalid utf-8", 1, 1);
        assert_eq!(err.to_string(), "encoding error at 1:1: invalid utf-8");
    }
}
