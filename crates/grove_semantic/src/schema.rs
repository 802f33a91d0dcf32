//! Type system and schema construction.
//!
//! Types are registered by value with a [`SchemaBuilder`] and reference each
//! other by name through [`TypeRef`], so mutually recursive types need no
//! particular registration order. Field lists may also be supplied as
//! deferred producers (`fields_with`) that run exactly once when the schema is
//! built. [`SchemaBuilder::build`] validates the whole type universe and
//! fails on the first defect; the resulting [`Schema`] is immutable and cheap
//! to clone.

use crate::coercion::value_from_ast_untyped;
use crate::context::Context;
use crate::directives::{builtin_directives, DirectiveDefinition};
use crate::resolver::{AsyncFnResolver, FnResolver, ResolveInfo, Resolver, ResolverArgs, ResolverResult};
use crate::scalars::builtin_scalars;
use grove_syntax::ast;
use indexmap::IndexMap;
use rustc_hash::FxHashMap;
use serde_json::Value;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use thiserror::Error;

/// Serialize / parse function of a scalar.
pub type ScalarFn = Arc<dyn Fn(&Value) -> Result<Value, String> + Send + Sync>;

/// Literal parse function of a scalar.
pub type LiteralFn = Arc<dyn Fn(&ast::Value) -> Result<Value, String> + Send + Sync>;

/// Decides whether a resolved value belongs to an object type.
pub type IsTypeOfFn = Arc<dyn Fn(&Value, &Context) -> bool + Send + Sync>;

/// Maps a resolved value of an abstract type to an object type name.
pub type ResolveTypeFn = Arc<dyn Fn(&Value, &Context) -> Option<String> + Send + Sync>;

type FieldsThunk = Box<dyn FnOnce() -> Vec<FieldDefinition> + Send + Sync>;

/// Errors detected while building a schema.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SchemaError {
    #[error("Schema query type must be provided.")]
    MissingQueryType,

    #[error("{operation} root type \"{name}\" must be an Object type.")]
    RootNotObject { operation: &'static str, name: String },

    #[error("Schema must contain uniquely named types but contains multiple types named \"{0}\".")]
    DuplicateType(String),

    #[error("Names must match /^[_a-zA-Z][_a-zA-Z0-9]*$/ but \"{0}\" does not.")]
    InvalidName(String),

    #[error("Name \"{0}\" must not begin with \"__\", which is reserved by GraphQL introspection.")]
    ReservedName(String),

    #[error("{kind} {name} must define one or more {members}.")]
    EmptyType {
        kind: &'static str,
        name: String,
        members: &'static str,
    },

    #[error("Unknown type \"{name}\" referenced by {position}.")]
    UnknownType { name: String, position: String },

    #[error("The type of {position} must be Input Type but got: {ty}.")]
    NotInputType { position: String, ty: String },

    #[error("The type of {position} must be Output Type but got: {ty}.")]
    NotOutputType { position: String, ty: String },

    #[error("The type of {position} wraps a Non-Null type in Non-Null: {ty}.")]
    NestedNonNull { position: String, ty: String },

    #[error("Type {object} must only implement Interface types, it cannot implement {name}.")]
    NotAnInterface { object: String, name: String },

    #[error("Interface field {interface}.{field} expected but {object} does not provide it.")]
    MissingInterfaceField {
        object: String,
        interface: String,
        field: String,
    },

    #[error("Union type {union} can only include Object types, it cannot include {member}.")]
    InvalidUnionMember { union: String, member: String },
}

// =============================================================================
// Type references
// =============================================================================

/// Type reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeRef {
    Named(String),
    List(Box<TypeRef>),
    NonNull(Box<TypeRef>),
}

impl TypeRef {
    pub fn named(name: impl Into<String>) -> Self {
        Self::Named(name.into())
    }

    #[must_use]
    pub fn list(inner: TypeRef) -> Self {
        Self::List(Box::new(inner))
    }

    #[must_use]
    pub fn non_null(inner: TypeRef) -> Self {
        Self::NonNull(Box::new(inner))
    }

    /// Converts a type written in a request document.
    #[must_use]
    pub fn from_ast(ty: &ast::Type) -> Self {
        match ty {
            ast::Type::Named(name) => Self::Named(name.value.clone()),
            ast::Type::List(inner, _) => Self::list(Self::from_ast(inner)),
            ast::Type::NonNull(inner, _) => Self::non_null(Self::from_ast(inner)),
        }
    }

    /// The innermost named type.
    #[must_use]
    pub fn named_type(&self) -> &str {
        match self {
            Self::Named(name) => name,
            Self::List(inner) | Self::NonNull(inner) => inner.named_type(),
        }
    }

    #[must_use]
    pub fn is_non_null(&self) -> bool {
        matches!(self, Self::NonNull(_))
    }

    /// Strips one `NonNull` wrapper, if present.
    #[must_use]
    pub fn nullable(&self) -> &TypeRef {
        match self {
            Self::NonNull(inner) => inner,
            other => other,
        }
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Named(name) => f.write_str(name),
            Self::List(inner) => write!(f, "[{inner}]"),
            Self::NonNull(inner) => write!(f, "{inner}!"),
        }
    }
}

// =============================================================================
// Type descriptors
// =============================================================================

/// A type definition.
#[derive(Debug)]
pub enum TypeDef {
    Scalar(ScalarType),
    Object(ObjectType),
    Interface(InterfaceType),
    Union(UnionType),
    Enum(EnumType),
    InputObject(InputObjectType),
}

impl TypeDef {
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Scalar(t) => &t.name,
            Self::Object(t) => &t.name,
            Self::Interface(t) => &t.name,
            Self::Union(t) => &t.name,
            Self::Enum(t) => &t.name,
            Self::InputObject(t) => &t.name,
        }
    }

    #[must_use]
    pub fn description(&self) -> Option<&str> {
        match self {
            Self::Scalar(t) => t.description.as_deref(),
            Self::Object(t) => t.description.as_deref(),
            Self::Interface(t) => t.description.as_deref(),
            Self::Union(t) => t.description.as_deref(),
            Self::Enum(t) => t.description.as_deref(),
            Self::InputObject(t) => t.description.as_deref(),
        }
    }

    /// Human-readable kind, as used in error messages.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Scalar(_) => "Scalar",
            Self::Object(_) => "Object",
            Self::Interface(_) => "Interface",
            Self::Union(_) => "Union",
            Self::Enum(_) => "Enum",
            Self::InputObject(_) => "Input Object",
        }
    }

    #[must_use]
    pub const fn is_input_type(&self) -> bool {
        matches!(self, Self::Scalar(_) | Self::Enum(_) | Self::InputObject(_))
    }

    #[must_use]
    pub const fn is_output_type(&self) -> bool {
        !matches!(self, Self::InputObject(_))
    }

    #[must_use]
    pub const fn is_composite(&self) -> bool {
        matches!(self, Self::Object(_) | Self::Interface(_) | Self::Union(_))
    }

    #[must_use]
    pub const fn is_abstract(&self) -> bool {
        matches!(self, Self::Interface(_) | Self::Union(_))
    }

    #[must_use]
    pub const fn is_leaf(&self) -> bool {
        matches!(self, Self::Scalar(_) | Self::Enum(_))
    }

    /// Fields of an object or interface type.
    #[must_use]
    pub fn fields(&self) -> Option<&IndexMap<String, FieldDefinition>> {
        match self {
            Self::Object(t) => Some(&t.fields),
            Self::Interface(t) => Some(&t.fields),
            _ => None,
        }
    }

    fn resolve_pending_fields(&mut self) {
        match self {
            Self::Object(t) => t.resolve_pending_fields(),
            Self::Interface(t) => t.resolve_pending_fields(),
            _ => {}
        }
    }
}

macro_rules! impl_from_type {
    ($($variant:ident($ty:ty)),* $(,)?) => {
        $(
            impl From<$ty> for TypeDef {
                fn from(ty: $ty) -> Self {
                    Self::$variant(ty)
                }
            }
        )*
    };
}

impl_from_type!(
    Scalar(ScalarType),
    Object(ObjectType),
    Interface(InterfaceType),
    Union(UnionType),
    Enum(EnumType),
    InputObject(InputObjectType),
);

/// Scalar type.
///
/// Every conversion returns `Err(message)` when the value cannot be
/// represented. Without a `parse_literal` function, literals are converted
/// to JSON and passed through `parse_value`.
pub struct ScalarType {
    pub name: String,
    pub description: Option<String>,
    serialize: ScalarFn,
    parse_value: ScalarFn,
    parse_literal: Option<LiteralFn>,
}

impl ScalarType {
    /// Creates a scalar whose conversions pass values through unchanged.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            serialize: Arc::new(|value| Ok(value.clone())),
            parse_value: Arc::new(|value| Ok(value.clone())),
            parse_literal: None,
        }
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets the output conversion.
    #[must_use]
    pub fn serialize<F>(mut self, f: F) -> Self
    where
        F: Fn(&Value) -> Result<Value, String> + Send + Sync + 'static,
    {
        self.serialize = Arc::new(f);
        self
    }

    /// Sets the conversion for variable values.
    #[must_use]
    pub fn parse_value<F>(mut self, f: F) -> Self
    where
        F: Fn(&Value) -> Result<Value, String> + Send + Sync + 'static,
    {
        self.parse_value = Arc::new(f);
        self
    }

    /// Sets the conversion for literals written in the request.
    #[must_use]
    pub fn parse_literal<F>(mut self, f: F) -> Self
    where
        F: Fn(&ast::Value) -> Result<Value, String> + Send + Sync + 'static,
    {
        self.parse_literal = Some(Arc::new(f));
        self
    }

    /// Converts a resolved value into its response representation.
    pub fn serialize_output(&self, value: &Value) -> Result<Value, String> {
        (self.serialize)(value)
    }

    /// Converts a variable value into its internal representation.
    pub fn coerce_input(&self, value: &Value) -> Result<Value, String> {
        (self.parse_value)(value)
    }

    /// Converts a request literal into its internal representation.
    pub fn coerce_literal(&self, literal: &ast::Value) -> Result<Value, String> {
        match &self.parse_literal {
            Some(parse) => parse(literal),
            None => (self.parse_value)(&value_from_ast_untyped(literal, None)),
        }
    }
}

impl fmt::Debug for ScalarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScalarType")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// One value of an enum type.
#[derive(Debug, Clone)]
pub struct EnumValue {
    pub name: String,
    pub description: Option<String>,
    /// Internal value handed to resolvers; defaults to the name.
    pub value: Value,
    pub deprecation_reason: Option<String>,
}

impl EnumValue {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            value: Value::String(name.clone()),
            name,
            description: None,
            deprecation_reason: None,
        }
    }

    #[must_use]
    pub fn value(mut self, value: Value) -> Self {
        self.value = value;
        self
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn deprecated(mut self, reason: impl Into<String>) -> Self {
        self.deprecation_reason = Some(reason.into());
        self
    }

    #[must_use]
    pub fn is_deprecated(&self) -> bool {
        self.deprecation_reason.is_some()
    }
}

/// Enum type.
#[derive(Debug, Clone)]
pub struct EnumType {
    pub name: String,
    pub description: Option<String>,
    pub values: IndexMap<String, EnumValue>,
}

impl EnumType {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            values: IndexMap::new(),
        }
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Adds a value whose internal representation is its name.
    #[must_use]
    pub fn value(self, name: impl Into<String>) -> Self {
        self.enum_value(EnumValue::new(name))
    }

    #[must_use]
    pub fn enum_value(mut self, value: EnumValue) -> Self {
        self.values.insert(value.name.clone(), value);
        self
    }

    /// Maps an internal value to its name.
    pub fn serialize_output(&self, value: &Value) -> Result<Value, String> {
        self.values
            .values()
            .find(|v| &v.value == value)
            .map(|v| Value::String(v.name.clone()))
            .ok_or_else(|| format!("Enum \"{}\" cannot represent value: {value}", self.name))
    }

    /// Maps a variable value (the name as a string) to the internal value.
    pub fn coerce_input(&self, value: &Value) -> Result<Value, String> {
        match value {
            Value::String(name) => self
                .values
                .get(name)
                .map(|v| v.value.clone())
                .ok_or_else(|| format!("Value {value} does not exist in \"{}\" enum.", self.name)),
            _ => Err(format!(
                "Enum \"{}\" cannot represent non-string value: {value}.",
                self.name
            )),
        }
    }

    /// Maps an enum literal to the internal value.
    pub fn coerce_literal(&self, literal: &ast::Value) -> Result<Value, String> {
        match literal {
            ast::Value::Enum(name) => self
                .values
                .get(&name.value)
                .map(|v| v.value.clone())
                .ok_or_else(|| {
                    format!("Value \"{}\" does not exist in \"{}\" enum.", name.value, self.name)
                }),
            other => Err(format!(
                "Enum \"{}\" cannot represent non-enum value: {other}.",
                self.name
            )),
        }
    }
}

/// An argument or input object field.
#[derive(Debug, Clone)]
pub struct InputValueDef {
    pub name: String,
    pub description: Option<String>,
    pub ty: TypeRef,
    pub default_value: Option<Value>,
}

impl InputValueDef {
    pub fn new(name: impl Into<String>, ty: TypeRef) -> Self {
        Self {
            name: name.into(),
            description: None,
            ty,
            default_value: None,
        }
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn default_value(mut self, value: Value) -> Self {
        self.default_value = Some(value);
        self
    }

    /// Required means non-null with no default.
    #[must_use]
    pub fn is_required(&self) -> bool {
        self.ty.is_non_null() && self.default_value.is_none()
    }
}

/// Field of an object or interface type.
pub struct FieldDefinition {
    pub name: String,
    pub description: Option<String>,
    pub ty: TypeRef,
    pub arguments: IndexMap<String, InputValueDef>,
    pub deprecation_reason: Option<String>,
    resolver: Option<Arc<dyn Resolver>>,
}

impl FieldDefinition {
    pub fn new(name: impl Into<String>, ty: TypeRef) -> Self {
        Self {
            name: name.into(),
            description: None,
            ty,
            arguments: IndexMap::new(),
            deprecation_reason: None,
            resolver: None,
        }
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn argument(mut self, argument: InputValueDef) -> Self {
        self.arguments.insert(argument.name.clone(), argument);
        self
    }

    #[must_use]
    pub fn deprecated(mut self, reason: impl Into<String>) -> Self {
        self.deprecation_reason = Some(reason.into());
        self
    }

    /// Attaches a resolver.
    #[must_use]
    pub fn resolver(mut self, resolver: impl Resolver + 'static) -> Self {
        self.resolver = Some(Arc::new(resolver));
        self
    }

    /// Attaches a synchronous resolver function.
    #[must_use]
    pub fn resolve<F>(self, f: F) -> Self
    where
        F: Fn(&Value, &ResolverArgs, &Context, &ResolveInfo) -> ResolverResult
            + Send
            + Sync
            + 'static,
    {
        self.resolver(FnResolver::new(f))
    }

    /// Attaches an asynchronous resolver function.
    #[must_use]
    pub fn resolve_async<F, Fut>(self, f: F) -> Self
    where
        F: Fn(Value, ResolverArgs, Context, ResolveInfo) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ResolverResult> + Send + 'static,
    {
        self.resolver(AsyncFnResolver::new(f))
    }

    /// The attached resolver, if any.
    #[must_use]
    pub fn get_resolver(&self) -> Option<&Arc<dyn Resolver>> {
        self.resolver.as_ref()
    }

    #[must_use]
    pub fn is_deprecated(&self) -> bool {
        self.deprecation_reason.is_some()
    }
}

impl fmt::Debug for FieldDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldDefinition")
            .field("name", &self.name)
            .field("ty", &self.ty)
            .field("arguments", &self.arguments)
            .field("has_resolver", &self.resolver.is_some())
            .finish_non_exhaustive()
    }
}

/// Object type.
pub struct ObjectType {
    pub name: String,
    pub description: Option<String>,
    pub fields: IndexMap<String, FieldDefinition>,
    pub interfaces: Vec<String>,
    is_type_of: Option<IsTypeOfFn>,
    pending: Vec<FieldsThunk>,
}

impl ObjectType {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            fields: IndexMap::new(),
            interfaces: Vec::new(),
            is_type_of: None,
            pending: Vec::new(),
        }
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn field(mut self, field: FieldDefinition) -> Self {
        self.fields.insert(field.name.clone(), field);
        self
    }

    /// Defers field construction until the schema is built.
    #[must_use]
    pub fn fields_with<F>(mut self, f: F) -> Self
    where
        F: FnOnce() -> Vec<FieldDefinition> + Send + Sync + 'static,
    {
        self.pending.push(Box::new(f));
        self
    }

    #[must_use]
    pub fn implements(mut self, interface: impl Into<String>) -> Self {
        self.interfaces.push(interface.into());
        self
    }

    #[must_use]
    pub fn is_type_of<F>(mut self, f: F) -> Self
    where
        F: Fn(&Value, &Context) -> bool + Send + Sync + 'static,
    {
        self.is_type_of = Some(Arc::new(f));
        self
    }

    /// Runs the `is_type_of` check; `None` when the type has none.
    #[must_use]
    pub fn check_is_type_of(&self, value: &Value, ctx: &Context) -> Option<bool> {
        self.is_type_of.as_ref().map(|f| f(value, ctx))
    }

    fn resolve_pending_fields(&mut self) {
        for thunk in self.pending.drain(..) {
            for field in thunk() {
                self.fields.insert(field.name.clone(), field);
            }
        }
    }
}

impl fmt::Debug for ObjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectType")
            .field("name", &self.name)
            .field("fields", &self.fields)
            .field("interfaces", &self.interfaces)
            .finish_non_exhaustive()
    }
}

/// Interface type.
pub struct InterfaceType {
    pub name: String,
    pub description: Option<String>,
    pub fields: IndexMap<String, FieldDefinition>,
    resolve_type: Option<ResolveTypeFn>,
    pending: Vec<FieldsThunk>,
}

impl InterfaceType {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            fields: IndexMap::new(),
            resolve_type: None,
            pending: Vec::new(),
        }
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn field(mut self, field: FieldDefinition) -> Self {
        self.fields.insert(field.name.clone(), field);
        self
    }

    /// Defers field construction until the schema is built.
    #[must_use]
    pub fn fields_with<F>(mut self, f: F) -> Self
    where
        F: FnOnce() -> Vec<FieldDefinition> + Send + Sync + 'static,
    {
        self.pending.push(Box::new(f));
        self
    }

    #[must_use]
    pub fn resolve_type<F>(mut self, f: F) -> Self
    where
        F: Fn(&Value, &Context) -> Option<String> + Send + Sync + 'static,
    {
        self.resolve_type = Some(Arc::new(f));
        self
    }

    #[must_use]
    pub fn type_resolver(&self) -> Option<&ResolveTypeFn> {
        self.resolve_type.as_ref()
    }

    fn resolve_pending_fields(&mut self) {
        for thunk in self.pending.drain(..) {
            for field in thunk() {
                self.fields.insert(field.name.clone(), field);
            }
        }
    }
}

impl fmt::Debug for InterfaceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InterfaceType")
            .field("name", &self.name)
            .field("fields", &self.fields)
            .finish_non_exhaustive()
    }
}

/// Union type.
pub struct UnionType {
    pub name: String,
    pub description: Option<String>,
    pub members: Vec<String>,
    resolve_type: Option<ResolveTypeFn>,
}

impl UnionType {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            members: Vec::new(),
            resolve_type: None,
        }
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn member(mut self, name: impl Into<String>) -> Self {
        self.members.push(name.into());
        self
    }

    #[must_use]
    pub fn resolve_type<F>(mut self, f: F) -> Self
    where
        F: Fn(&Value, &Context) -> Option<String> + Send + Sync + 'static,
    {
        self.resolve_type = Some(Arc::new(f));
        self
    }

    #[must_use]
    pub fn type_resolver(&self) -> Option<&ResolveTypeFn> {
        self.resolve_type.as_ref()
    }
}

impl fmt::Debug for UnionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UnionType")
            .field("name", &self.name)
            .field("members", &self.members)
            .finish_non_exhaustive()
    }
}

/// Input object type.
#[derive(Debug, Clone)]
pub struct InputObjectType {
    pub name: String,
    pub description: Option<String>,
    pub fields: IndexMap<String, InputValueDef>,
}

impl InputObjectType {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            fields: IndexMap::new(),
        }
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn field(mut self, field: InputValueDef) -> Self {
        self.fields.insert(field.name.clone(), field);
        self
    }
}

// =============================================================================
// Schema
// =============================================================================

struct SchemaData {
    query_type: String,
    mutation_type: Option<String>,
    subscription_type: Option<String>,
    types: IndexMap<String, TypeDef>,
    directives: IndexMap<String, DirectiveDefinition>,
    possible_types: FxHashMap<String, Vec<String>>,
    typename_field: FieldDefinition,
}

/// A validated, immutable schema. Clones share the same data.
#[derive(Clone)]
pub struct Schema {
    inner: Arc<SchemaData>,
}

impl Schema {
    /// Starts building a schema.
    #[must_use]
    pub fn builder() -> SchemaBuilder {
        SchemaBuilder::new()
    }

    #[must_use]
    pub fn query_type_name(&self) -> &str {
        &self.inner.query_type
    }

    /// The root object type for an operation kind, if configured.
    #[must_use]
    pub fn root_type(&self, operation: ast::OperationType) -> Option<&ObjectType> {
        let name = match operation {
            ast::OperationType::Query => Some(&self.inner.query_type),
            ast::OperationType::Mutation => self.inner.mutation_type.as_ref(),
            ast::OperationType::Subscription => self.inner.subscription_type.as_ref(),
        }?;
        self.object(name)
    }

    /// Gets a type by name.
    #[must_use]
    pub fn get_type(&self, name: &str) -> Option<&TypeDef> {
        self.inner.types.get(name)
    }

    /// Gets an object type by name.
    #[must_use]
    pub fn object(&self, name: &str) -> Option<&ObjectType> {
        match self.inner.types.get(name) {
            Some(TypeDef::Object(object)) => Some(object),
            _ => None,
        }
    }

    /// Returns all types.
    pub fn types(&self) -> impl Iterator<Item = &TypeDef> {
        self.inner.types.values()
    }

    #[must_use]
    pub fn directive(&self, name: &str) -> Option<&DirectiveDefinition> {
        self.inner.directives.get(name)
    }

    pub fn directives(&self) -> impl Iterator<Item = &DirectiveDefinition> {
        self.inner.directives.values()
    }

    /// Looks up a field on an object or interface, including `__typename`
    /// on every composite type.
    #[must_use]
    pub fn field_def<'a>(&'a self, parent: &'a TypeDef, name: &str) -> Option<&'a FieldDefinition> {
        if name == "__typename" {
            return parent.is_composite().then_some(&self.inner.typename_field);
        }
        parent.fields()?.get(name)
    }

    /// Object types a value of `abstract_type` may have at runtime.
    #[must_use]
    pub fn possible_types<'a>(&'a self, ty: &'a TypeDef) -> &'a [String] {
        match ty {
            TypeDef::Object(object) => std::slice::from_ref(&object.name),
            _ => self
                .inner
                .possible_types
                .get(ty.name())
                .map_or(&[], Vec::as_slice),
        }
    }

    #[must_use]
    pub fn is_possible_type(&self, abstract_type: &TypeDef, object_name: &str) -> bool {
        self.possible_types(abstract_type)
            .iter()
            .any(|name| name == object_name)
    }

    /// Returns true when a value of `maybe_sub` may be used where `super_type`
    /// is expected.
    #[must_use]
    pub fn is_sub_type(&self, maybe_sub: &TypeRef, super_type: &TypeRef) -> bool {
        match (maybe_sub, super_type) {
            (a, b) if a == b => true,
            (TypeRef::NonNull(a), TypeRef::NonNull(b)) => self.is_sub_type(a, b),
            (TypeRef::NonNull(a), b) => self.is_sub_type(a, b),
            (_, TypeRef::NonNull(_)) => false,
            (TypeRef::List(a), TypeRef::List(b)) => self.is_sub_type(a, b),
            (TypeRef::List(_), _) | (_, TypeRef::List(_)) => false,
            (TypeRef::Named(sub), TypeRef::Named(sup)) => self
                .get_type(sup)
                .is_some_and(|sup| sup.is_abstract() && self.is_possible_type(sup, sub)),
        }
    }

    /// Returns true when some object type could satisfy both types.
    #[must_use]
    pub fn types_overlap(&self, a: &TypeDef, b: &TypeDef) -> bool {
        if a.name() == b.name() {
            return true;
        }
        let b_types = self.possible_types(b);
        self.possible_types(a).iter().any(|name| b_types.contains(name))
    }
}

impl fmt::Debug for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Schema")
            .field("query_type", &self.inner.query_type)
            .field("mutation_type", &self.inner.mutation_type)
            .field("subscription_type", &self.inner.subscription_type)
            .field("types", &self.inner.types.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

/// Schema builder.
#[derive(Default)]
pub struct SchemaBuilder {
    query_type: Option<String>,
    mutation_type: Option<String>,
    subscription_type: Option<String>,
    types: Vec<TypeDef>,
    directives: Vec<DirectiveDefinition>,
}

impl SchemaBuilder {
    /// Creates a new schema builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `object` and uses it as the query root.
    #[must_use]
    pub fn query(mut self, object: ObjectType) -> Self {
        self.query_type = Some(object.name.clone());
        self.register(object)
    }

    /// Uses an already registered type as the query root.
    #[must_use]
    pub fn query_type(mut self, name: impl Into<String>) -> Self {
        self.query_type = Some(name.into());
        self
    }

    #[must_use]
    pub fn mutation(mut self, object: ObjectType) -> Self {
        self.mutation_type = Some(object.name.clone());
        self.register(object)
    }

    #[must_use]
    pub fn mutation_type(mut self, name: impl Into<String>) -> Self {
        self.mutation_type = Some(name.into());
        self
    }

    #[must_use]
    pub fn subscription(mut self, object: ObjectType) -> Self {
        self.subscription_type = Some(object.name.clone());
        self.register(object)
    }

    #[must_use]
    pub fn subscription_type(mut self, name: impl Into<String>) -> Self {
        self.subscription_type = Some(name.into());
        self
    }

    /// Adds a type.
    #[must_use]
    pub fn register(mut self, ty: impl Into<TypeDef>) -> Self {
        self.types.push(ty.into());
        self
    }

    /// Adds a directive definition.
    #[must_use]
    pub fn directive(mut self, directive: DirectiveDefinition) -> Self {
        self.directives.push(directive);
        self
    }

    /// Runs deferred field producers and validates the type universe.
    pub fn build(self) -> Result<Schema, SchemaError> {
        let query_type = self.query_type.ok_or(SchemaError::MissingQueryType)?;

        let mut types: IndexMap<String, TypeDef> = IndexMap::new();
        for mut ty in self.types {
            validate_name(ty.name())?;
            if types.contains_key(ty.name()) {
                return Err(SchemaError::DuplicateType(ty.name().to_string()));
            }
            ty.resolve_pending_fields();
            types.insert(ty.name().to_string(), ty);
        }
        for scalar in builtin_scalars() {
            if !types.contains_key(&scalar.name) {
                types.insert(scalar.name.clone(), TypeDef::Scalar(scalar));
            }
        }

        let mut directives: IndexMap<String, DirectiveDefinition> = builtin_directives()
            .into_iter()
            .map(|d| (d.name.clone(), d))
            .collect();
        for directive in self.directives {
            validate_name(&directive.name)?;
            directives.insert(directive.name.clone(), directive);
        }

        check_root(&types, "Query", Some(&query_type))?;
        check_root(&types, "Mutation", self.mutation_type.as_ref())?;
        check_root(&types, "Subscription", self.subscription_type.as_ref())?;

        for ty in types.values() {
            check_type(ty, &types)?;
        }
        for directive in directives.values() {
            for arg in directive.arguments.values() {
                let position = format!("@{}({}:)", directive.name, arg.name);
                check_type_ref(&arg.ty, &types, &position, true)?;
            }
        }

        let mut possible_types: FxHashMap<String, Vec<String>> = FxHashMap::default();
        for ty in types.values() {
            match ty {
                TypeDef::Object(object) => {
                    for interface in &object.interfaces {
                        possible_types
                            .entry(interface.clone())
                            .or_default()
                            .push(object.name.clone());
                    }
                }
                TypeDef::Union(union) => {
                    possible_types
                        .entry(union.name.clone())
                        .or_default()
                        .extend(union.members.iter().cloned());
                }
                _ => {}
            }
        }

        tracing::debug!(
            query = %query_type,
            types = types.len(),
            directives = directives.len(),
            "schema built"
        );

        Ok(Schema {
            inner: Arc::new(SchemaData {
                query_type,
                mutation_type: self.mutation_type,
                subscription_type: self.subscription_type,
                types,
                directives,
                possible_types,
                typename_field: FieldDefinition::new(
                    "__typename",
                    TypeRef::non_null(TypeRef::named("String")),
                )
                .description("The name of the current Object type at runtime."),
            }),
        })
    }
}

fn validate_name(name: &str) -> Result<(), SchemaError> {
    if name.starts_with("__") {
        return Err(SchemaError::ReservedName(name.to_string()));
    }
    let mut chars = name.chars();
    let valid_start = chars
        .next()
        .is_some_and(|c| c == '_' || c.is_ascii_alphabetic());
    if valid_start && chars.all(|c| c == '_' || c.is_ascii_alphanumeric()) {
        Ok(())
    } else {
        Err(SchemaError::InvalidName(name.to_string()))
    }
}

fn check_root(
    types: &IndexMap<String, TypeDef>,
    operation: &'static str,
    name: Option<&String>,
) -> Result<(), SchemaError> {
    let Some(name) = name else {
        return Ok(());
    };
    match types.get(name) {
        Some(TypeDef::Object(_)) => Ok(()),
        Some(_) => Err(SchemaError::RootNotObject {
            operation,
            name: name.clone(),
        }),
        None => Err(SchemaError::UnknownType {
            name: name.clone(),
            position: format!("the {} root", operation.to_lowercase()),
        }),
    }
}

fn check_type_ref(
    ty: &TypeRef,
    types: &IndexMap<String, TypeDef>,
    position: &str,
    input: bool,
) -> Result<(), SchemaError> {
    fn structure(ty: &TypeRef) -> bool {
        match ty {
            TypeRef::Named(_) => true,
            TypeRef::NonNull(inner) if inner.is_non_null() => false,
            TypeRef::List(inner) | TypeRef::NonNull(inner) => structure(inner),
        }
    }
    if !structure(ty) {
        return Err(SchemaError::NestedNonNull {
            position: position.to_string(),
            ty: ty.to_string(),
        });
    }

    let name = ty.named_type();
    let def = types.get(name).ok_or_else(|| SchemaError::UnknownType {
        name: name.to_string(),
        position: position.to_string(),
    })?;
    if input && !def.is_input_type() {
        return Err(SchemaError::NotInputType {
            position: position.to_string(),
            ty: ty.to_string(),
        });
    }
    if !input && !def.is_output_type() {
        return Err(SchemaError::NotOutputType {
            position: position.to_string(),
            ty: ty.to_string(),
        });
    }
    Ok(())
}

fn check_fields(
    owner: &str,
    kind: &'static str,
    fields: &IndexMap<String, FieldDefinition>,
    types: &IndexMap<String, TypeDef>,
) -> Result<(), SchemaError> {
    if fields.is_empty() {
        return Err(SchemaError::EmptyType {
            kind,
            name: owner.to_string(),
            members: "fields",
        });
    }
    for field in fields.values() {
        validate_name(&field.name)?;
        check_type_ref(&field.ty, types, &format!("{owner}.{}", field.name), false)?;
        for arg in field.arguments.values() {
            validate_name(&arg.name)?;
            let position = format!("{owner}.{}({}:)", field.name, arg.name);
            check_type_ref(&arg.ty, types, &position, true)?;
        }
    }
    Ok(())
}

fn check_type(ty: &TypeDef, types: &IndexMap<String, TypeDef>) -> Result<(), SchemaError> {
    match ty {
        TypeDef::Scalar(_) => Ok(()),
        TypeDef::Object(object) => {
            check_fields(&object.name, "Object", &object.fields, types)?;
            for interface_name in &object.interfaces {
                let interface = match types.get(interface_name) {
                    Some(TypeDef::Interface(interface)) => interface,
                    Some(_) => {
                        return Err(SchemaError::NotAnInterface {
                            object: object.name.clone(),
                            name: interface_name.clone(),
                        })
                    }
                    None => {
                        return Err(SchemaError::UnknownType {
                            name: interface_name.clone(),
                            position: format!("the interfaces of {}", object.name),
                        })
                    }
                };
                if let Some(field) = interface
                    .fields
                    .keys()
                    .find(|field| !object.fields.contains_key(*field))
                {
                    return Err(SchemaError::MissingInterfaceField {
                        object: object.name.clone(),
                        interface: interface.name.clone(),
                        field: field.clone(),
                    });
                }
            }
            Ok(())
        }
        TypeDef::Interface(interface) => {
            check_fields(&interface.name, "Interface", &interface.fields, types)
        }
        TypeDef::Union(union) => {
            if union.members.is_empty() {
                return Err(SchemaError::EmptyType {
                    kind: "Union",
                    name: union.name.clone(),
                    members: "member types",
                });
            }
            for member in &union.members {
                match types.get(member) {
                    Some(TypeDef::Object(_)) => {}
                    Some(_) => {
                        return Err(SchemaError::InvalidUnionMember {
                            union: union.name.clone(),
                            member: member.clone(),
                        })
                    }
                    None => {
                        return Err(SchemaError::UnknownType {
                            name: member.clone(),
                            position: format!("the members of {}", union.name),
                        })
                    }
                }
            }
            Ok(())
        }
        TypeDef::Enum(enum_type) => {
            if enum_type.values.is_empty() {
                return Err(SchemaError::EmptyType {
                    kind: "Enum",
                    name: enum_type.name.clone(),
                    members: "values",
                });
            }
            for name in enum_type.values.keys() {
                validate_name(name)?;
                if matches!(name.as_str(), "true" | "false" | "null") {
                    return Err(SchemaError::InvalidName(name.clone()));
                }
            }
            Ok(())
        }
        TypeDef::InputObject(input) => {
            if input.fields.is_empty() {
                return Err(SchemaError::EmptyType {
                    kind: "Input Object",
                    name: input.name.clone(),
                    members: "fields",
                });
            }
            for field in input.fields.values() {
                validate_name(&field.name)?;
                let position = format!("{}.{}", input.name, field.name);
                check_type_ref(&field.ty, types, &position, true)?;
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn string() -> TypeRef {
        TypeRef::named("String")
    }

    fn hello_query() -> ObjectType {
        ObjectType::new("Query").field(FieldDefinition::new("hello", string()))
    }

    #[test]
    fn test_missing_query_type() {
        let err = SchemaBuilder::new().build().unwrap_err();
        assert_eq!(err, SchemaError::MissingQueryType);
        assert_eq!(err.to_string(), "Schema query type must be provided.");
    }

    #[test]
    fn test_query_root_must_be_object() {
        let err = SchemaBuilder::new()
            .query_type("Episode")
            .register(EnumType::new("Episode").value("JEDI"))
            .build()
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Query root type \"Episode\" must be an Object type."
        );
    }

    #[test]
    fn test_builtins_registered() {
        let schema = SchemaBuilder::new().query(hello_query()).build().unwrap();
        for name in ["Int", "Float", "String", "Boolean", "ID"] {
            assert!(matches!(schema.get_type(name), Some(TypeDef::Scalar(_))));
        }
        assert!(schema.directive("skip").is_some());
        assert!(schema.directive("include").is_some());
        assert!(schema.directive("deprecated").is_some());
        assert_eq!(schema.query_type_name(), "Query");
        assert!(schema.root_type(ast::OperationType::Mutation).is_none());
    }

    #[test]
    fn test_mutually_recursive_types_via_deferred_fields() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let schema = SchemaBuilder::new()
            .query(ObjectType::new("Query").field(FieldDefinition::new("a", TypeRef::named("A"))))
            .register(ObjectType::new("A").fields_with(move || {
                counter.fetch_add(1, Ordering::SeqCst);
                vec![
                    FieldDefinition::new("b", TypeRef::named("B")),
                    FieldDefinition::new("self", TypeRef::named("A")),
                ]
            }))
            .register(ObjectType::new("B").field(FieldDefinition::new("a", TypeRef::named("A"))))
            .build()
            .unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        let a = schema.object("A").unwrap();
        assert_eq!(a.fields.keys().collect::<Vec<_>>(), ["b", "self"]);
    }

    #[test]
    fn test_unknown_type_reference() {
        let err = SchemaBuilder::new()
            .query(ObjectType::new("Query").field(FieldDefinition::new("x", TypeRef::named("Missing"))))
            .build()
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Unknown type \"Missing\" referenced by Query.x."
        );
    }

    #[test]
    fn test_duplicate_type() {
        let err = SchemaBuilder::new()
            .query(hello_query())
            .register(ObjectType::new("Query").field(FieldDefinition::new("b", string())))
            .build()
            .unwrap_err();
        assert_eq!(err, SchemaError::DuplicateType("Query".into()));
    }

    #[test]
    fn test_object_without_fields() {
        let err = SchemaBuilder::new()
            .query(ObjectType::new("Query"))
            .build()
            .unwrap_err();
        assert_eq!(err.to_string(), "Object Query must define one or more fields.");
    }

    #[test]
    fn test_argument_must_be_input_type() {
        let err = SchemaBuilder::new()
            .query(
                ObjectType::new("Query").field(
                    FieldDefinition::new("f", string())
                        .argument(InputValueDef::new("q", TypeRef::named("Query"))),
                ),
            )
            .build()
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "The type of Query.f(q:) must be Input Type but got: Query."
        );
    }

    #[test]
    fn test_nested_non_null() {
        let err = SchemaBuilder::new()
            .query(ObjectType::new("Query").field(FieldDefinition::new(
                "f",
                TypeRef::non_null(TypeRef::non_null(string())),
            )))
            .build()
            .unwrap_err();
        assert!(matches!(err, SchemaError::NestedNonNull { .. }));
    }

    #[test]
    fn test_reserved_and_invalid_names() {
        let err = SchemaBuilder::new()
            .query(ObjectType::new("Query").field(FieldDefinition::new("__secret", string())))
            .build()
            .unwrap_err();
        assert_eq!(err, SchemaError::ReservedName("__secret".into()));

        let err = SchemaBuilder::new()
            .query(ObjectType::new("Query").field(FieldDefinition::new("bad-name", string())))
            .build()
            .unwrap_err();
        assert_eq!(err, SchemaError::InvalidName("bad-name".into()));
    }

    #[test]
    fn test_interface_implementation_checked() {
        let err = SchemaBuilder::new()
            .query(hello_query())
            .register(
                InterfaceType::new("Node").field(FieldDefinition::new("id", TypeRef::named("ID"))),
            )
            .register(
                ObjectType::new("User")
                    .implements("Node")
                    .field(FieldDefinition::new("name", string())),
            )
            .build()
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Interface field Node.id expected but User does not provide it."
        );
    }

    #[test]
    fn test_union_members_must_be_objects() {
        let err = SchemaBuilder::new()
            .query(hello_query())
            .register(UnionType::new("Result").member("String"))
            .build()
            .unwrap_err();
        assert_eq!(
            err,
            SchemaError::InvalidUnionMember {
                union: "Result".into(),
                member: "String".into()
            }
        );
    }

    #[test]
    fn test_possible_types_and_sub_types() {
        let schema = SchemaBuilder::new()
            .query(hello_query())
            .register(
                InterfaceType::new("Node").field(FieldDefinition::new("id", TypeRef::named("ID"))),
            )
            .register(
                ObjectType::new("User")
                    .implements("Node")
                    .field(FieldDefinition::new("id", TypeRef::named("ID"))),
            )
            .register(UnionType::new("Search").member("User"))
            .build()
            .unwrap();

        let node = schema.get_type("Node").unwrap();
        assert_eq!(schema.possible_types(node), ["User".to_string()]);
        assert!(schema.is_possible_type(schema.get_type("Search").unwrap(), "User"));
        assert!(schema.types_overlap(node, schema.get_type("Search").unwrap()));

        let user = TypeRef::non_null(TypeRef::named("User"));
        assert!(schema.is_sub_type(&user, &TypeRef::named("Node")));
        assert!(!schema.is_sub_type(&TypeRef::named("User"), &TypeRef::non_null(TypeRef::named("Node"))));
        assert!(schema.field_def(node, "__typename").is_some());
        assert!(schema.field_def(schema.get_type("String").unwrap(), "__typename").is_none());
    }

    #[test]
    fn test_enum_conversions() {
        let episode = EnumType::new("Episode")
            .enum_value(EnumValue::new("NEWHOPE").value(json!(4)))
            .enum_value(EnumValue::new("EMPIRE").value(json!(5)))
            .value("JEDI");

        assert_eq!(episode.serialize_output(&json!(4)), Ok(json!("NEWHOPE")));
        assert_eq!(episode.serialize_output(&json!("JEDI")), Ok(json!("JEDI")));
        assert!(episode.serialize_output(&json!(99)).is_err());
        assert_eq!(episode.coerce_input(&json!("EMPIRE")), Ok(json!(5)));
        assert_eq!(
            episode.coerce_input(&json!("SITH")),
            Err("Value \"SITH\" does not exist in \"Episode\" enum.".to_string())
        );
    }

    #[test]
    fn test_deprecation_markers() {
        let schema = SchemaBuilder::new()
            .query(
                hello_query()
                    .field(FieldDefinition::new("greeting", string()).deprecated("Use `hello`.")),
            )
            .register(
                EnumType::new("Episode")
                    .enum_value(EnumValue::new("NEWHOPE").deprecated("Use EPISODE_IV."))
                    .value("EPISODE_IV"),
            )
            .build()
            .unwrap();
        let query = schema.object("Query").unwrap();
        assert!(!query.fields["hello"].is_deprecated());
        assert!(query.fields["greeting"].is_deprecated());
        assert_eq!(
            query.fields["greeting"].deprecation_reason.as_deref(),
            Some("Use `hello`.")
        );

        let Some(TypeDef::Enum(episode)) = schema.get_type("Episode") else {
            panic!("Episode is an enum");
        };
        assert!(episode.values["NEWHOPE"].is_deprecated());
        assert!(!episode.values["EPISODE_IV"].is_deprecated());
    }

    #[test]
    fn test_type_ref_display() {
        let ty = TypeRef::non_null(TypeRef::list(TypeRef::non_null(TypeRef::named("Episode"))));
        assert_eq!(ty.to_string(), "[Episode!]!");
        assert_eq!(ty.named_type(), "Episode");
        assert_eq!(ty.nullable().to_string(), "[Episode!]");
    }
}
