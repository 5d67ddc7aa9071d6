use graphql_parser::query::Type as AstType;
use indexmap::IndexMap;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

use super::error::CoercionError;
use super::resolver::{Resolver, TypeResolver};
use super::scalars::{self, Coercing};

/// A reference to a type as written on a field or argument: `[Int!]!`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum TypeRef {
    Named(String),
    List(Box<TypeRef>),
    NonNull(Box<TypeRef>),
}

impl TypeRef {
    pub fn named<N: Into<String>>(name: N) -> Self {
        TypeRef::Named(name.into())
    }

    pub fn named_non_null<N: Into<String>>(name: N) -> Self {
        TypeRef::non_null(TypeRef::named(name))
    }

    pub fn list(of_type: TypeRef) -> Self {
        TypeRef::List(Box::new(of_type))
    }

    pub fn non_null(of_type: TypeRef) -> Self {
        TypeRef::NonNull(Box::new(of_type))
    }

    pub fn is_non_null(&self) -> bool {
        matches!(self, TypeRef::NonNull(_))
    }

    /// Strips non-null wrappers: `[Int]!` -> `[Int]`.
    pub fn nullable(&self) -> &TypeRef {
        match self {
            TypeRef::NonNull(of_type) => of_type.nullable(),
            _ => self,
        }
    }

    /// The innermost named type: `[Int!]!` -> `Int`.
    pub fn name(&self) -> &str {
        match self {
            TypeRef::Named(name) => name,
            TypeRef::List(of_type) | TypeRef::NonNull(of_type) => of_type.name(),
        }
    }

    pub fn from_ast(ast_type: &AstType<'_, String>) -> Self {
        match ast_type {
            AstType::NamedType(name) => TypeRef::Named(name.clone()),
            AstType::ListType(of_type) => TypeRef::list(TypeRef::from_ast(of_type)),
            AstType::NonNullType(of_type) => TypeRef::non_null(TypeRef::from_ast(of_type)),
        }
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeRef::Named(name) => f.write_str(name),
            TypeRef::List(of_type) => write!(f, "[{}]", of_type),
            TypeRef::NonNull(of_type) => write!(f, "{}!", of_type),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TypeKind {
    Scalar,
    Object,
    Interface,
    Union,
    Enum,
    InputObject,
}

#[derive(Clone, Debug, PartialEq)]
pub struct InputValue {
    pub name: String,
    pub description: Option<String>,
    pub input_type: TypeRef,
    pub default_value: Option<Value>,
}

impl InputValue {
    pub fn new<N: Into<String>>(name: N, input_type: TypeRef) -> Self {
        InputValue {
            name: name.into(),
            description: None,
            input_type,
            default_value: None,
        }
    }

    pub fn default_value(mut self, value: Value) -> Self {
        self.default_value = Some(value);
        self
    }
}

#[derive(Clone)]
pub struct Field {
    pub name: String,
    pub description: Option<String>,
    pub args: IndexMap<String, InputValue>,
    pub field_type: TypeRef,
    pub resolver: Option<Arc<dyn Resolver>>,
}

impl Field {
    pub fn new<N: Into<String>>(name: N, field_type: TypeRef) -> Self {
        Field {
            name: name.into(),
            description: None,
            args: IndexMap::new(),
            field_type,
            resolver: None,
        }
    }

    pub fn description<D: Into<String>>(mut self, description: D) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn argument(mut self, argument: InputValue) -> Self {
        self.args.insert(argument.name.clone(), argument);
        self
    }

    pub fn resolver<R: Resolver + 'static>(mut self, resolver: R) -> Self {
        self.resolver = Some(Arc::new(resolver));
        self
    }
}

impl fmt::Debug for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Field")
            .field("name", &self.name)
            .field("field_type", &self.field_type)
            .field("args", &self.args)
            .field("resolver", &self.resolver.is_some())
            .finish()
    }
}

#[derive(Clone, Debug)]
pub struct ObjectType {
    pub name: String,
    pub description: Option<String>,
    pub fields: IndexMap<String, Field>,
    pub interfaces: Vec<String>,
}

impl ObjectType {
    pub fn new<N: Into<String>>(name: N) -> Self {
        ObjectType {
            name: name.into(),
            description: None,
            fields: IndexMap::new(),
            interfaces: vec![],
        }
    }

    pub fn field(mut self, field: Field) -> Self {
        self.fields.insert(field.name.clone(), field);
        self
    }

    pub fn implements<N: Into<String>>(mut self, interface: N) -> Self {
        self.interfaces.push(interface.into());
        self
    }
}

#[derive(Clone)]
pub struct InterfaceType {
    pub name: String,
    pub description: Option<String>,
    pub fields: IndexMap<String, Field>,
    pub type_resolver: Option<Arc<dyn TypeResolver>>,
}

impl InterfaceType {
    pub fn new<N: Into<String>>(name: N) -> Self {
        InterfaceType {
            name: name.into(),
            description: None,
            fields: IndexMap::new(),
            type_resolver: None,
        }
    }

    pub fn field(mut self, field: Field) -> Self {
        self.fields.insert(field.name.clone(), field);
        self
    }

    pub fn type_resolver<R: TypeResolver + 'static>(mut self, resolver: R) -> Self {
        self.type_resolver = Some(Arc::new(resolver));
        self
    }
}

#[derive(Clone)]
pub struct UnionType {
    pub name: String,
    pub description: Option<String>,
    pub members: Vec<String>,
    pub type_resolver: Option<Arc<dyn TypeResolver>>,
}

impl UnionType {
    pub fn new<N: Into<String>>(name: N) -> Self {
        UnionType {
            name: name.into(),
            description: None,
            members: vec![],
            type_resolver: None,
        }
    }

    pub fn member<N: Into<String>>(mut self, member: N) -> Self {
        self.members.push(member.into());
        self
    }

    pub fn type_resolver<R: TypeResolver + 'static>(mut self, resolver: R) -> Self {
        self.type_resolver = Some(Arc::new(resolver));
        self
    }
}

#[derive(Clone, Debug)]
pub struct EnumType {
    pub name: String,
    pub description: Option<String>,
    pub values: Vec<String>,
}

impl EnumType {
    pub fn new<N: Into<String>>(name: N) -> Self {
        EnumType {
            name: name.into(),
            description: None,
            values: vec![],
        }
    }

    pub fn value<V: Into<String>>(mut self, value: V) -> Self {
        self.values.push(value.into());
        self
    }

    pub fn contains(&self, value: &str) -> bool {
        self.values.iter().any(|v| v == value)
    }

    pub fn serialize(&self, value: &Value) -> Result<Value, CoercionError> {
        match value {
            Value::String(name) if self.contains(name) => Ok(value.clone()),
            _ => Err(CoercionError::InvalidEnumValue {
                type_name: self.name.clone(),
                value: value.to_string(),
            }),
        }
    }
}

#[derive(Clone, Debug)]
pub struct InputObjectType {
    pub name: String,
    pub description: Option<String>,
    pub fields: IndexMap<String, InputValue>,
}

impl InputObjectType {
    pub fn new<N: Into<String>>(name: N) -> Self {
        InputObjectType {
            name: name.into(),
            description: None,
            fields: IndexMap::new(),
        }
    }

    pub fn field(mut self, field: InputValue) -> Self {
        self.fields.insert(field.name.clone(), field);
        self
    }
}

#[derive(Clone)]
pub struct ScalarType {
    pub name: String,
    pub description: Option<String>,
    pub coercing: Arc<dyn Coercing>,
}

impl ScalarType {
    pub fn new<N: Into<String>, C: Coercing + 'static>(name: N, coercing: C) -> Self {
        ScalarType {
            name: name.into(),
            description: None,
            coercing: Arc::new(coercing),
        }
    }
}

#[derive(Clone)]
pub enum MetaType {
    Scalar(ScalarType),
    Object(ObjectType),
    Interface(InterfaceType),
    Union(UnionType),
    Enum(EnumType),
    InputObject(InputObjectType),
}

impl MetaType {
    pub fn name(&self) -> &str {
        match self {
            MetaType::Scalar(t) => &t.name,
            MetaType::Object(t) => &t.name,
            MetaType::Interface(t) => &t.name,
            MetaType::Union(t) => &t.name,
            MetaType::Enum(t) => &t.name,
            MetaType::InputObject(t) => &t.name,
        }
    }

    pub fn kind(&self) -> TypeKind {
        match self {
            MetaType::Scalar(_) => TypeKind::Scalar,
            MetaType::Object(_) => TypeKind::Object,
            MetaType::Interface(_) => TypeKind::Interface,
            MetaType::Union(_) => TypeKind::Union,
            MetaType::Enum(_) => TypeKind::Enum,
            MetaType::InputObject(_) => TypeKind::InputObject,
        }
    }

    pub fn is_composite(&self) -> bool {
        matches!(
            self,
            MetaType::Object(_) | MetaType::Interface(_) | MetaType::Union(_)
        )
    }

    pub fn is_abstract(&self) -> bool {
        matches!(self, MetaType::Interface(_) | MetaType::Union(_))
    }

    pub fn fields(&self) -> Option<&IndexMap<String, Field>> {
        match self {
            MetaType::Object(t) => Some(&t.fields),
            MetaType::Interface(t) => Some(&t.fields),
            _ => None,
        }
    }
}

impl From<ScalarType> for MetaType {
    fn from(t: ScalarType) -> Self {
        MetaType::Scalar(t)
    }
}

impl From<ObjectType> for MetaType {
    fn from(t: ObjectType) -> Self {
        MetaType::Object(t)
    }
}

impl From<InterfaceType> for MetaType {
    fn from(t: InterfaceType) -> Self {
        MetaType::Interface(t)
    }
}

impl From<UnionType> for MetaType {
    fn from(t: UnionType) -> Self {
        MetaType::Union(t)
    }
}

impl From<EnumType> for MetaType {
    fn from(t: EnumType) -> Self {
        MetaType::Enum(t)
    }
}

impl From<InputObjectType> for MetaType {
    fn from(t: InputObjectType) -> Self {
        MetaType::InputObject(t)
    }
}

#[derive(Clone)]
pub struct Schema {
    query_type: String,
    mutation_type: Option<String>,
    subscription_type: Option<String>,
    types: IndexMap<String, MetaType>,
}

impl Schema {
    pub fn new<N: Into<String>>(query_type: N) -> Self {
        let mut types = IndexMap::new();

        for scalar in scalars::builtins() {
            types.insert(scalar.name.clone(), MetaType::Scalar(scalar));
        }

        Schema {
            query_type: query_type.into(),
            mutation_type: None,
            subscription_type: None,
            types,
        }
    }

    pub fn mutation<N: Into<String>>(mut self, mutation_type: N) -> Self {
        self.mutation_type = Some(mutation_type.into());
        self
    }

    pub fn subscription<N: Into<String>>(mut self, subscription_type: N) -> Self {
        self.subscription_type = Some(subscription_type.into());
        self
    }

    pub fn register<T: Into<MetaType>>(mut self, meta_type: T) -> Self {
        let meta_type = meta_type.into();
        self.types.insert(meta_type.name().to_owned(), meta_type);
        self
    }

    pub fn query_type(&self) -> &str {
        &self.query_type
    }

    pub fn mutation_type(&self) -> Option<&str> {
        self.mutation_type.as_deref()
    }

    pub fn subscription_type(&self) -> Option<&str> {
        self.subscription_type.as_deref()
    }

    pub fn get_type(&self, name: &str) -> Option<&MetaType> {
        self.types.get(name)
    }

    pub fn object(&self, name: &str) -> Option<&ObjectType> {
        match self.types.get(name) {
            Some(MetaType::Object(object)) => Some(object),
            _ => None,
        }
    }

    /// Field definition on an object or interface type.
    pub fn field(&self, type_name: &str, field_name: &str) -> Option<&Field> {
        self.types
            .get(type_name)
            .and_then(|t| t.fields())
            .and_then(|fields| fields.get(field_name))
    }

    /// Object types a value of `name` can be at runtime, in registration order.
    pub fn possible_types(&self, name: &str) -> Vec<&ObjectType> {
        match self.types.get(name) {
            Some(MetaType::Object(object)) => vec![object],
            Some(MetaType::Interface(interface)) => self
                .types
                .values()
                .filter_map(|t| match t {
                    MetaType::Object(object)
                        if object.interfaces.iter().any(|i| *i == interface.name) =>
                    {
                        Some(object)
                    }
                    _ => None,
                })
                .collect(),
            Some(MetaType::Union(union)) => union
                .members
                .iter()
                .filter_map(|member| self.object(member))
                .collect(),
            _ => vec![],
        }
    }

    /// Whether a fragment conditioned on `type_condition` applies to `object_type`.
    pub fn is_possible_type(&self, type_condition: &str, object_type: &str) -> bool {
        match self.types.get(type_condition) {
            Some(MetaType::Object(object)) => object.name == object_type,
            Some(MetaType::Interface(_)) | Some(MetaType::Union(_)) => self
                .possible_types(type_condition)
                .iter()
                .any(|object| object.name == object_type),
            _ => false,
        }
    }

    /// Concrete object type of `value` for the abstract type `name`.
    ///
    /// Uses the type's resolver when registered and falls back to the value's
    /// `__typename` property. The result must be a possible type of `name`.
    pub fn resolve_abstract_type(&self, name: &str, value: &Value) -> Option<&ObjectType> {
        let type_resolver = match self.types.get(name) {
            Some(MetaType::Interface(interface)) => interface.type_resolver.as_ref(),
            Some(MetaType::Union(union)) => union.type_resolver.as_ref(),
            _ => return None,
        };

        let type_name = match type_resolver {
            Some(type_resolver) => type_resolver.resolve_type(value)?,
            _ => value.get("__typename")?.as_str()?.to_owned(),
        };

        if !self.is_possible_type(name, &type_name) {
            return None;
        }

        self.object(&type_name)
    }
}
