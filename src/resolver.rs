use async_trait::async_trait;
use futures::future::{BoxFuture, FutureExt};
use serde_json::{Map, Value};
use std::any::Any;
use std::future::Future;
use std::sync::Arc;

use super::context::Data;
use super::error::ResolverError;
use super::step_info::StepView;

/// Everything a resolver gets to compute one field.
#[derive(Clone)]
pub struct ResolverContext {
    /// Value of the parent object.
    pub source: Value,
    /// Coerced arguments, defaults applied.
    pub arguments: Map<String, Value>,
    pub step: StepView,
    data: Arc<Data>,
}

impl ResolverContext {
    pub fn new(source: Value, arguments: Map<String, Value>, step: StepView, data: Arc<Data>) -> Self {
        ResolverContext {
            source,
            arguments,
            step,
            data,
        }
    }

    pub fn argument(&self, name: &str) -> Option<&Value> {
        self.arguments.get(name)
    }

    pub fn data<D: Any + Send + Sync>(&self) -> Option<&D> {
        self.data.get::<D>()
    }
}

/// Outcome of a resolver call.
pub enum Resolved {
    Value(Value),
    /// Nothing was produced; completes like `null`.
    Absent,
    /// A value together with errors raised below this field.
    Partial {
        data: Value,
        errors: Vec<ResolverError>,
    },
    /// Work that finishes later, awaited before the value is used.
    Deferred(BoxFuture<'static, ResolverResult>),
}

impl Resolved {
    pub fn deferred<F>(future: F) -> Self
    where
        F: Future<Output = ResolverResult> + Send + 'static,
    {
        Resolved::Deferred(future.boxed())
    }
}

impl From<Value> for Resolved {
    fn from(value: Value) -> Self {
        Resolved::Value(value)
    }
}

impl From<Option<Value>> for Resolved {
    fn from(value: Option<Value>) -> Self {
        match value {
            Some(value) => Resolved::Value(value),
            None => Resolved::Absent,
        }
    }
}

pub type ResolverResult = Result<Resolved, ResolverError>;

#[async_trait]
pub trait Resolver: Send + Sync {
    async fn resolve(&self, ctx: ResolverContext) -> ResolverResult;
}

pub struct FnResolver<F>(F);

#[async_trait]
impl<F, Fut> Resolver for FnResolver<F>
where
    F: Fn(ResolverContext) -> Fut + Send + Sync,
    Fut: Future<Output = ResolverResult> + Send + 'static,
{
    async fn resolve(&self, ctx: ResolverContext) -> ResolverResult {
        (self.0)(ctx).await
    }
}

/// Wraps an async closure as a field resolver.
pub fn resolver_fn<F, Fut>(f: F) -> FnResolver<F>
where
    F: Fn(ResolverContext) -> Fut + Send + Sync,
    Fut: Future<Output = ResolverResult> + Send + 'static,
{
    FnResolver(f)
}

/// Resolver of fields without one: reads the property named like the field
/// from the parent value.
pub struct PropertyResolver;

#[async_trait]
impl Resolver for PropertyResolver {
    async fn resolve(&self, ctx: ResolverContext) -> ResolverResult {
        Ok(ctx.source.get(&ctx.step.field_name).cloned().into())
    }
}

/// Picks the concrete object type of a value of an interface or union type.
pub trait TypeResolver: Send + Sync {
    fn resolve_type(&self, value: &Value) -> Option<String>;
}

impl<F> TypeResolver for F
where
    F: Fn(&Value) -> Option<String> + Send + Sync,
{
    fn resolve_type(&self, value: &Value) -> Option<String> {
        self(value)
    }
}
