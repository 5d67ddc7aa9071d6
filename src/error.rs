use graphql_parser::query::ParseError;
use graphql_parser::Pos;
use serde_json::error::Error as JsonError;
use serde_json::Value;
use std::convert::From;
use std::fmt;

use super::step_info::PathSegment;

#[derive(Debug, Error, PartialEq)]
pub enum QueryError {
    #[error("Not supported.")]
    NotSupported,

    #[error("Cannot query field \"{name}\" on type \"{object}\".")]
    FieldNotFound { name: String, object: String },

    #[error("Unknown fragment \"{name}\".")]
    UnknownFragment { name: String },

    #[error("Unknown type \"{name}\".")]
    UnknownType { name: String },

    #[error("Fragment cannot condition on non composite type \"{name}\".")]
    FragmentOnNonCompositeType { name: String },

    #[error("Cannot spread fragment \"{name}\" within itself.")]
    FragmentCycle { name: String },

    #[error("Field \"{field}\" argument \"{argument}\" of type \"{argument_type}\" is required, but it was not provided.")]
    MissingArgument {
        field: String,
        argument: String,
        argument_type: String,
    },

    #[error("Field \"{field}\" must not have a selection since type \"{field_type}\" has no subfields.")]
    NoSubselectionAllowed { field: String, field_type: String },

    #[error("Field \"{field}\" of type \"{field_type}\" must have a selection of subfields.")]
    RequiredSubselection { field: String, field_type: String },

    #[error("Schema is not configured for mutations.")]
    NotConfiguredMutations,

    #[error("Unknown operation named \"{name}\".")]
    UnknownOperation { name: String },

    #[error("Must provide operation name if query contains multiple operations.")]
    OperationNameRequired,

    #[error("Must provide an operation.")]
    NoOperation,
}

#[derive(Debug, PartialEq)]
pub struct ValidationError {
    pub pos: Option<Pos>,
    pub err: QueryError,
}

impl ValidationError {
    pub fn new(pos: Pos, err: QueryError) -> Self {
        ValidationError {
            pos: Some(pos),
            err,
        }
    }
}

impl From<QueryError> for ValidationError {
    fn from(err: QueryError) -> Self {
        ValidationError { pos: None, err }
    }
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum CoercionError {
    #[error("Expected type \"{expected}\", found {found}.")]
    InvalidLiteral { expected: String, found: String },

    #[error("{type_name} cannot represent value: {value}")]
    InvalidValue { type_name: String, value: String },

    #[error("Int cannot represent non 32-bit signed integer value: {0}")]
    IntOutOfRange(String),

    #[error("Enum \"{type_name}\" cannot represent value: {value}")]
    InvalidEnumValue { type_name: String, value: String },

    #[error("Expected non-nullable type \"{0}\" not to be null.")]
    UnexpectedNull(String),

    #[error("Field \"{field}\" of required type \"{field_type}\" was not provided.")]
    MissingInputField { field: String, field_type: String },

    #[error("Field \"{field}\" is not defined by type \"{type_name}\".")]
    UnknownInputField { field: String, type_name: String },

    #[error("Type \"{0}\" is not an input type.")]
    NotInputType(String),

    #[error("Variable \"${name}\" of required type \"{variable_type}\" was not provided.")]
    MissingVariable { name: String, variable_type: String },

    #[error("Variable \"${name}\" got invalid value; {reason}")]
    InvalidVariable { name: String, reason: Box<CoercionError> },
}

/// Error returned by a resolver. `path` is relative to the field that produced it.
#[derive(Clone, Debug, PartialEq)]
pub struct ResolverError {
    pub message: String,
    pub path: Vec<PathSegment>,
    pub extensions: Option<Value>,
}

impl ResolverError {
    pub fn new<M: Into<String>>(message: M) -> Self {
        ResolverError {
            message: message.into(),
            path: vec![],
            extensions: None,
        }
    }

    pub fn with_path(mut self, path: Vec<PathSegment>) -> Self {
        self.path = path;
        self
    }

    pub fn with_extensions(mut self, extensions: Value) -> Self {
        self.extensions = Some(extensions);
        self
    }
}

impl fmt::Display for ResolverError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl From<String> for ResolverError {
    fn from(message: String) -> Self {
        ResolverError::new(message)
    }
}

impl From<&str> for ResolverError {
    fn from(message: &str) -> Self {
        ResolverError::new(message)
    }
}

impl From<JsonError> for ResolverError {
    fn from(e: JsonError) -> Self {
        ResolverError::new(e.to_string())
    }
}

impl From<CoercionError> for ResolverError {
    fn from(e: CoercionError) -> Self {
        ResolverError::new(e.to_string())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Location {
    pub line: usize,
    pub column: usize,
}

impl From<Pos> for Location {
    fn from(pos: Pos) -> Self {
        Location {
            line: pos.line,
            column: pos.column,
        }
    }
}

/// One entry of the `errors` list of a response.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct GraphQLError {
    pub message: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub locations: Vec<Location>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<Vec<PathSegment>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extensions: Option<Value>,
}

impl GraphQLError {
    pub fn new<M: Into<String>>(message: M) -> Self {
        GraphQLError {
            message: message.into(),
            locations: vec![],
            path: None,
            extensions: None,
        }
    }

    pub fn at(mut self, pos: Pos) -> Self {
        self.locations.push(pos.into());
        self
    }

    pub fn with_path(mut self, path: Vec<PathSegment>) -> Self {
        self.path = Some(path);
        self
    }

    /// Offsets a resolver error by the absolute path of the field that returned it.
    pub fn from_resolver_error(err: ResolverError, field_path: &[PathSegment], pos: Pos) -> Self {
        let mut path = field_path.to_vec();
        path.extend(err.path);

        GraphQLError {
            message: err.message,
            locations: vec![pos.into()],
            path: Some(path),
            extensions: err.extensions,
        }
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("Json error: {0}")]
    Json(JsonError),

    #[error("Syntax error: {0}")]
    Syntax(ParseError),

    #[error("Query error.")]
    Query(Vec<ValidationError>),

    #[error("Variable coercion error.")]
    Variables(Vec<CoercionError>),

    #[error("Internal engine error: {0}")]
    Internal(String),
}

impl Error {
    /// Request-level errors as they appear in the `errors` list of a response.
    pub fn to_graphql_errors(&self) -> Vec<GraphQLError> {
        match self {
            Error::Syntax(err) => vec![GraphQLError::new(format!("Syntax error: {}", err).trim_end())],
            Error::Query(errors) => errors
                .iter()
                .map(|e| {
                    let error = GraphQLError::new(e.err.to_string());
                    match e.pos {
                        Some(pos) => error.at(pos),
                        _ => error,
                    }
                })
                .collect(),
            Error::Variables(errors) => errors
                .iter()
                .map(|e| GraphQLError::new(e.to_string()))
                .collect(),
            _ => vec![GraphQLError::new(self.to_string())],
        }
    }
}

impl From<JsonError> for Error {
    fn from(e: JsonError) -> Error {
        Error::Json(e)
    }
}

impl From<ParseError> for Error {
    fn from(e: ParseError) -> Error {
        Error::Syntax(e)
    }
}

impl From<QueryError> for Error {
    fn from(e: QueryError) -> Error {
        Error::Query(vec![e.into()])
    }
}

pub type Result<T> = std::result::Result<T, Error>;
