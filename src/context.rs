use fnv::FnvHashMap;
use graphql_parser::query::Document;
use std::any::{Any, TypeId};
use std::sync::{Arc, Mutex, MutexGuard};

use super::collector::{fragments, FieldCollector, Fragments};
use super::error::GraphQLError;
use super::schema::Schema;
use super::values::Variables;

/// Request-scoped values handed to every resolver, keyed by type.
#[derive(Default)]
pub struct Data(FnvHashMap<TypeId, Box<dyn Any + Sync + Send>>);

impl Data {
    pub fn insert<D: Any + Send + Sync>(&mut self, data: D) {
        self.0.insert(TypeId::of::<D>(), Box::new(data));
    }

    pub fn get<D: Any + Send + Sync>(&self) -> Option<&D> {
        self.0
            .get(&TypeId::of::<D>())
            .and_then(|d| d.downcast_ref::<D>())
    }
}

/// State shared by every field of one operation.
pub struct ExecutionContext<'a> {
    pub schema: &'a Schema,
    pub fragments: Fragments<'a>,
    pub variables: Variables,
    pub data: Arc<Data>,
    errors: Mutex<Vec<GraphQLError>>,
}

impl<'a> ExecutionContext<'a> {
    pub fn new(
        schema: &'a Schema,
        document: &'a Document<'a, String>,
        variables: Variables,
        data: Arc<Data>,
    ) -> Self {
        ExecutionContext {
            schema,
            fragments: fragments(document),
            variables,
            data,
            errors: Mutex::new(vec![]),
        }
    }

    pub fn collector(&'a self) -> FieldCollector<'a> {
        FieldCollector::new(self.schema, &self.fragments, &self.variables)
    }

    pub fn add_error(&self, error: GraphQLError) {
        self.errors().push(error);
    }

    pub fn add_errors(&self, errors: Vec<GraphQLError>) {
        if !errors.is_empty() {
            self.errors().extend(errors);
        }
    }

    /// Errors in the order they were raised.
    pub fn take_errors(&self) -> Vec<GraphQLError> {
        std::mem::take(&mut *self.errors())
    }

    fn errors(&self) -> MutexGuard<'_, Vec<GraphQLError>> {
        match self.errors.lock() {
            Ok(errors) => errors,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}
