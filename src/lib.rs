#[macro_use]
extern crate thiserror;

#[macro_use]
extern crate serde;

mod collector;
mod conditional;
mod context;
mod error;
mod fetcher;
mod graphql;
mod normalized;
mod query;
mod resolver;
mod result;
mod scalars;
mod schema;
mod step_info;
mod strategy;
mod validation;
mod values;

pub use crate::collector::{fragments, FieldCollector, Fragments, MergedField, MergedSelectionSet};
pub use crate::conditional::should_include;
pub use crate::context::{Data, ExecutionContext};
pub use crate::error::{
    CoercionError, Error, GraphQLError, Location, QueryError, ResolverError, Result,
    ValidationError,
};
pub use crate::fetcher::{fetch_value, FetchedValue};
pub use crate::graphql::{ExecutionResult, Payload};
pub use crate::normalized::{NormalizedField, NormalizedQueryTree};
pub use crate::query::{get_operation, Operation, OperationType, QueryBuilder};
pub use crate::resolver::{
    resolver_fn, FnResolver, PropertyResolver, Resolved, Resolver, ResolverContext,
    ResolverResult, TypeResolver,
};
pub use crate::result::{FieldSubSelection, NodeValue, ResultAssembler, ResultNode};
pub use crate::scalars::{
    BooleanCoercing, Coercing, FloatCoercing, IdCoercing, IntCoercing, StringCoercing,
};
pub use crate::schema::{
    EnumType, Field, InputObjectType, InputValue, InterfaceType, MetaType, ObjectType,
    ScalarType, Schema, TypeKind, TypeRef, UnionType,
};
pub use crate::step_info::{display_path, ExecutionStepInfo, PathSegment, StepView};
pub use crate::strategy::{execute, ExecutionMode};
pub use crate::validation::{DocumentValidator, Validator};
pub use crate::values::{coerce_arguments, coerce_variable_values, value_from_ast, Variables};
