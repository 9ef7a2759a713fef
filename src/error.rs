//! Error types for parsing and resolving a description.

use thiserror::Error;

/// A parse failure, pinned to the logical line that caused it.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("line {line_no}: {kind}:\n    {line}")]
pub struct ParseError {
    /// 1-based physical line the offending logical line started on
    pub line_no: usize,
    pub line: String,
    pub kind: ParseErrorKind,
}

impl ParseError {
    pub fn new(line_no: usize, line: &str, kind: ParseErrorKind) -> Self {
        Self {
            line_no,
            line: line.trim().to_string(),
            kind,
        }
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ParseErrorKind {
    #[error("unknown format")]
    UnknownStatement,

    #[error("invalid {statement} statement")]
    Misplaced { statement: &'static str },

    #[error("duplicate interface `{name}`")]
    DuplicateInterface { name: String },

    #[error("duplicate class `{name}`")]
    DuplicateClass { name: String },

    #[error("interface and class `{name}` would generate the same files")]
    SharedName { name: String },

    #[error("duplicate function `{function}` in interface `{interface}`")]
    DuplicateFunction { interface: String, function: String },

    #[error("function name `delete` is reserved for the generated destructor")]
    ReservedFunction,

    #[error("duplicate return type for function `{function}`")]
    DuplicateReturn { function: String },

    #[error("function `{function}` has no return type")]
    MissingReturn { function: String },

    #[error("invalid input for function `{function}` which takes void")]
    InputAfterVoid { function: String },

    #[error("invalid void input for function `{function}` with existing parameters")]
    VoidAfterInput { function: String },

    #[error("cannot parse identifier (one parameter per INPUT; function pointer and variadic parameters are not supported)")]
    UnparsableParameter,

    #[error("only one author block is expected")]
    DuplicateAuthor,

    #[error("only one license block is expected")]
    DuplicateLicense,

    #[error("end of input before closing {block}")]
    UnterminatedBlock { block: String },
}

/// Every `IMPLEMENTS` target that names no interface, across all classes.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("non-existent interfaces specified: {}", .undefined.join(", "))]
pub struct ResolveError {
    pub undefined: Vec<String>,
}
