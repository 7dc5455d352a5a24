use thiserror::Error;

/// Top-level error type for query compilation and schema lookups.
///
/// Variants are grouped by the pipeline stage that produces them. The
/// `Display` text of the compilation variants is part of the public
/// contract: callers surface these strings to API clients verbatim.
#[derive(Debug, Error)]
pub enum QuerestError {
    // ── Filter parsing ─────────────────────────────────────────
    #[error("unknown operator: {0}")]
    UnknownOperator(String),

    #[error("missing operator or value")]
    MissingOperatorOrValue,

    #[error("operator {0} does not support quantifiers")]
    QuantifierNotSupported(String),

    #[error("expected list format: (item1,item2,...)")]
    ExpectedListFormat,

    #[error("field must be a string")]
    FieldNotAString,

    #[error("invalid JSON path syntax")]
    InvalidJsonPath,

    #[error("empty field name")]
    EmptyFieldName,

    #[error("invalid field name: {0}")]
    InvalidFieldName(String),

    #[error("invalid filter format: {0}")]
    InvalidFilterFormat(String),

    // ── Select / logic structure ───────────────────────────────
    #[error("unclosed parenthesis")]
    UnclosedParenthesis,

    #[error("unexpected closing parenthesis")]
    UnexpectedClosingParenthesis,

    #[error("unclosed parenthesis in logic expression")]
    UnclosedLogicParenthesis,

    #[error("unexpected token")]
    UnexpectedToken,

    #[error("logic expression must be wrapped in parentheses")]
    LogicNotParenthesized,

    #[error("invalid nested logic: {0}")]
    InvalidNestedLogic(String),

    #[error("query nesting exceeds depth limit of {0}")]
    DepthExceeded(usize),

    // ── Order parsing ──────────────────────────────────────────
    #[error("invalid order options: {0}")]
    InvalidOrderOptions(String),

    // ── Pagination ─────────────────────────────────────────────
    #[error("limit must be a non-negative integer")]
    InvalidLimit,

    #[error("offset must be a non-negative integer")]
    InvalidOffset,

    // ── Relation embedding ─────────────────────────────────────
    #[error("relationship '{0}' not found")]
    RelationshipNotFound(String),

    #[error("relationship '{0}' is ambiguous, use hint")]
    RelationshipAmbiguous(String),

    // ── Schema cache ───────────────────────────────────────────
    #[error("schema cache: table '{schema}.{table}' not found for tenant '{tenant}'")]
    TableNotFound {
        tenant: String,
        schema: String,
        table: String,
    },

    #[error("schema cache: refresh timed out after {0} s")]
    RefreshTimeout(u64),

    #[error("schema cache: refresh failed")]
    RefreshFailed(#[source] Box<dyn std::error::Error + Send + Sync>),
}
