use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Everything that can go wrong while compiling, evaluating or integrating.
///
/// Floating-point overflow and NaN are not errors; they propagate as IEEE-754
/// values through evaluation and into step tables.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    #[error("invalid input: '{character}' at position {position}")]
    Lex { character: char, position: usize },
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error("unspecified identifier \"{name}\"")]
    UnboundIdentifier { name: String },
    #[error("\"{name}\" is a {found}, expected a {expected}")]
    TypeMismatch {
        name: String,
        expected: &'static str,
        found: &'static str,
    },
    #[error("function \"{name}\" takes {expected} argument(s), got {found}")]
    Arity {
        name: String,
        expected: usize,
        found: usize,
    },
    #[error("invalid value {value:?} for parameter `{name}`")]
    InvalidParameter { name: &'static str, value: String },
    #[error("cannot evaluate {value:?} for parameter `{name}`: {source}")]
    ParameterExpression {
        name: &'static str,
        value: String,
        source: Box<Error>,
    },
    #[error("step size must be finite and positive, got {step}")]
    InvalidStep { step: f64 },
    #[error("unknown integration method \"{name}\"")]
    UnknownMethod { name: String },
    #[error("integration requires {required} steps, exceeding the limit of {limit}")]
    StepLimitExceeded { required: usize, limit: usize },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("unexpected termination; expected {wanted}")]
    UnexpectedEnd { wanted: String },
    #[error("expected {wanted}, found {found}")]
    Expected { wanted: String, found: String },
    #[error("invalid expression at {found}")]
    InvalidExpression { found: String },
}
