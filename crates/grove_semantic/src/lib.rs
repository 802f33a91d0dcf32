//! Semantic layer for Grove.
//!
//! - `schema`: type descriptors and the validated, immutable [`Schema`]
//! - `scalars`, `directives`: built-in scalars and directives
//! - `resolver`, `context`: the resolver contract and per-request context
//! - `coercion`: variable and argument coercion
//! - `validation`: request document validation rules

pub mod coercion;
pub mod context;
pub mod directives;
pub mod resolver;
pub mod scalars;
pub mod schema;
pub mod validation;

pub use coercion::{
    coerce_argument_values, coerce_input_value, coerce_variable_values, value_from_ast,
    value_from_ast_untyped, CoercionError,
};
pub use context::{CancellationToken, Context};
pub use directives::{DirectiveDefinition, DirectiveLocation};
pub use resolver::{
    AsyncFnResolver, DefaultResolver, FnResolver, PathSegment, ResolveInfo, Resolver,
    ResolverArgs, ResolverError, ResolverFuture, ResolverResult,
};
pub use schema::{
    EnumType, EnumValue, FieldDefinition, InputObjectType, InputValueDef, InterfaceType,
    ObjectType, ScalarType, Schema, SchemaBuilder, SchemaError, TypeDef, TypeRef, UnionType,
};
pub use validation::{validate, ValidationContext, ValidationOptions};
