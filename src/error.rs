use thiserror::Error;

/// Errors raised while evaluating an expression tree.
///
/// All three propagate synchronously through the recursive evaluate chain;
/// there is no internal retry or recovery. Softer failures never surface
/// here: unknown database properties degrade to the `"text"` value type
/// and non-numeric arithmetic inputs degrade to NaN or are skipped.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EvalError {
    /// A function call named a function that is not registered.
    #[error("unknown function: {0}")]
    UnknownFunction(String),

    /// A path referenced a root variable that is not bound in the context.
    #[error("no such variable: {0}")]
    NoSuchVariable(String),

    /// A range scan was requested on a path whose last hop is backward.
    #[error("the last segment of the path must be forward")]
    MustBeForward,
}

/// Errors raised while scanning or parsing expression text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("unterminated string starting at offset {0}")]
    UnterminatedString(usize),

    #[error("missing property identifier after hop operator at offset {0}")]
    MissingPropertyId(usize),

    #[error("missing factor at offset {0}")]
    MissingFactor(usize),

    #[error("missing ) after arguments of {name} at offset {offset}")]
    MissingParen { name: String, offset: usize },

    #[error("missing ( after control {name} at offset {offset}")]
    MissingParenStart { name: String, offset: usize },

    #[error("unexpected syntax {found:?} at offset {offset}")]
    UnexpectedSyntax { found: String, offset: usize },

    #[error("unexpected trailing input at offset {0}")]
    TrailingInput(usize),
}
