// Crate-wide compile error
// Joins the decode boundary (I/O and JSON syntax) with grammar violations,
// so the source-form entry points have one failure type.

use crate::grammar::GrammarError;

/// Failure while turning a query document into a queryer tree.
#[derive(Debug, thiserror::Error)]
pub enum CompileError {
    /// The source could not be opened or read.
    #[error("failed to read query document: {0}")]
    Io(#[from] std::io::Error),

    /// The source is not well-formed JSON.
    #[error("invalid JSON in query document: {0}")]
    Decode(#[from] serde_json::Error),

    /// The decoded value violates the query grammar.
    #[error(transparent)]
    Grammar(#[from] GrammarError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let err: CompileError = json_err.into();
        assert!(matches!(err, CompileError::Decode(_)));
        assert!(format!("{}", err).starts_with("invalid JSON in query document"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "no such file");
        let err: CompileError = io_err.into();
        assert!(matches!(err, CompileError::Io(_)));
        assert!(format!("{}", err).contains("no such file"));
    }

    #[test]
    fn test_grammar_error_displays_transparently() {
        let err: CompileError = GrammarError::UnsupportedType("regex".to_string()).into();
        assert_eq!(format!("{}", err), "unsupported queryer type: `regex`");
    }
}
