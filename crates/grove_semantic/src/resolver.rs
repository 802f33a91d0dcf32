//! Resolver contract.
//!
//! Every field resolves through a fixed-signature callable
//! `(parent, args, context, info) -> Result<Value, ResolverError>`. Fields
//! without an attached resolver fall back to [`DefaultResolver`].

use crate::context::Context;
use crate::schema::{Schema, TypeRef};
use grove_syntax::ast;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use thiserror::Error;

/// A segment of a response path.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PathSegment {
    Field(String),
    Index(usize),
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Field(name) => f.write_str(name),
            Self::Index(index) => write!(f, "{index}"),
        }
    }
}

impl From<&str> for PathSegment {
    fn from(name: &str) -> Self {
        Self::Field(name.to_string())
    }
}

impl From<usize> for PathSegment {
    fn from(index: usize) -> Self {
        Self::Index(index)
    }
}

/// Coerced arguments passed to a resolver, in declaration order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolverArgs {
    args: IndexMap<String, Value>,
}

impl ResolverArgs {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.args.get(name)
    }

    /// Gets an argument deserialized into `T`.
    #[must_use]
    pub fn get_as<T: serde::de::DeserializeOwned>(&self, name: &str) -> Option<T> {
        self.args
            .get(name)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    /// Gets an argument, failing when it is absent or has the wrong shape.
    pub fn require<T: serde::de::DeserializeOwned>(&self, name: &str) -> Result<T, ResolverError> {
        self.args
            .get(name)
            .ok_or_else(|| ResolverError::MissingArgument(name.to_string()))
            .and_then(|v| {
                serde_json::from_value(v.clone())
                    .map_err(|e| ResolverError::ArgumentParseError(name.to_string(), e.to_string()))
            })
    }

    #[must_use]
    pub fn all(&self) -> &IndexMap<String, Value> {
        &self.args
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
    }

    pub fn set(&mut self, name: impl Into<String>, value: Value) {
        self.args.insert(name.into(), value);
    }
}

impl From<IndexMap<String, Value>> for ResolverArgs {
    fn from(args: IndexMap<String, Value>) -> Self {
        Self { args }
    }
}

/// Metadata about the field being resolved.
#[derive(Debug, Clone)]
pub struct ResolveInfo {
    pub field_name: String,
    /// Every AST occurrence merged under this response key.
    pub field_nodes: Arc<[ast::Field]>,
    pub return_type: TypeRef,
    pub parent_type: String,
    /// Full response path, ending with this field's response key.
    pub path: Vec<PathSegment>,
    pub schema: Schema,
    pub operation: Arc<ast::OperationDefinition>,
    /// Coerced variable values of the operation.
    pub variables: Arc<Map<String, Value>>,
}

/// Result type for resolvers.
pub type ResolverResult = Result<Value, ResolverError>;

/// Future type for resolvers.
pub type ResolverFuture<'a> = Pin<Box<dyn Future<Output = ResolverResult> + Send + 'a>>;

/// Error from a resolver.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ResolverError {
    #[error("Missing required argument: {0}")]
    MissingArgument(String),

    #[error("Failed to parse argument '{0}': {1}")]
    ArgumentParseError(String, String),

    #[error("{0}")]
    Custom(String),
}

impl From<String> for ResolverError {
    fn from(message: String) -> Self {
        Self::Custom(message)
    }
}

impl From<&str> for ResolverError {
    fn from(message: &str) -> Self {
        Self::Custom(message.to_string())
    }
}

/// Trait for field resolvers.
pub trait Resolver: Send + Sync {
    /// Resolves a field value.
    fn resolve<'a>(
        &'a self,
        parent: &'a Value,
        args: &'a ResolverArgs,
        ctx: &'a Context,
        info: &'a ResolveInfo,
    ) -> ResolverFuture<'a>;
}

/// A sync resolver function.
pub type SyncResolverFn =
    Arc<dyn Fn(&Value, &ResolverArgs, &Context, &ResolveInfo) -> ResolverResult + Send + Sync>;

/// Wraps a synchronous function.
pub struct FnResolver {
    func: SyncResolverFn,
}

impl FnResolver {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&Value, &ResolverArgs, &Context, &ResolveInfo) -> ResolverResult
            + Send
            + Sync
            + 'static,
    {
        Self { func: Arc::new(f) }
    }
}

impl Resolver for FnResolver {
    fn resolve<'a>(
        &'a self,
        parent: &'a Value,
        args: &'a ResolverArgs,
        ctx: &'a Context,
        info: &'a ResolveInfo,
    ) -> ResolverFuture<'a> {
        let result = (self.func)(parent, args, ctx, info);
        Box::pin(async move { result })
    }
}

/// An async resolver function type.
pub type AsyncResolverFn = Arc<
    dyn Fn(Value, ResolverArgs, Context, ResolveInfo) -> ResolverFuture<'static> + Send + Sync,
>;

/// Wraps an asynchronous function; inputs are cloned into the future.
pub struct AsyncFnResolver {
    func: AsyncResolverFn,
}

impl AsyncFnResolver {
    pub fn new<F, Fut>(f: F) -> Self
    where
        F: Fn(Value, ResolverArgs, Context, ResolveInfo) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ResolverResult> + Send + 'static,
    {
        Self {
            func: Arc::new(move |parent, args, ctx, info| Box::pin(f(parent, args, ctx, info))),
        }
    }
}

impl Resolver for AsyncFnResolver {
    fn resolve<'a>(
        &'a self,
        parent: &'a Value,
        args: &'a ResolverArgs,
        ctx: &'a Context,
        info: &'a ResolveInfo,
    ) -> ResolverFuture<'a> {
        let parent = parent.clone();
        let args = args.clone();
        let ctx = ctx.clone();
        let info = info.clone();
        let func = Arc::clone(&self.func);
        Box::pin(async move { func(parent, args, ctx, info).await })
    }
}

/// Reads the member named like the field off the parent value.
///
/// A null parent or a missing member resolves to null; any other parent
/// shape is an error.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultResolver;

impl Resolver for DefaultResolver {
    fn resolve<'a>(
        &'a self,
        parent: &'a Value,
        _args: &'a ResolverArgs,
        _ctx: &'a Context,
        info: &'a ResolveInfo,
    ) -> ResolverFuture<'a> {
        let result = match parent {
            Value::Object(map) => Ok(map.get(&info.field_name).cloned().unwrap_or(Value::Null)),
            Value::Null => Ok(Value::Null),
            other => Err(ResolverError::Custom(format!(
                "Cannot read field \"{}\" of non-object value {other}.",
                info.field_name
            ))),
        };
        Box::pin(async move { result })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{FieldDefinition, ObjectType, SchemaBuilder};
    use grove_syntax::parse;
    use serde_json::json;

    fn info(field_name: &str) -> ResolveInfo {
        let schema = SchemaBuilder::new()
            .query(ObjectType::new("Query").field(FieldDefinition::new("name", TypeRef::named("String"))))
            .build()
            .unwrap();
        let document = parse("{ name }").unwrap();
        let operation = document.operations().next().unwrap().clone();
        let field = match &operation.selection_set.selections[0] {
            ast::Selection::Field(field) => field.clone(),
            _ => unreachable!(),
        };
        ResolveInfo {
            field_name: field_name.to_string(),
            field_nodes: Arc::from(vec![field]),
            return_type: TypeRef::named("String"),
            parent_type: "Query".to_string(),
            path: vec![PathSegment::from(field_name)],
            schema,
            operation: Arc::new(operation),
            variables: Arc::new(Map::new()),
        }
    }

    #[test]
    fn test_resolver_args() {
        let mut args = ResolverArgs::new();
        args.set("id", json!(123));
        args.set("name", json!("test"));

        assert_eq!(args.get_as::<i64>("id"), Some(123));
        assert_eq!(args.get_as::<String>("name"), Some("test".to_string()));
        assert_eq!(args.get_as::<i64>("missing"), None);
        assert_eq!(
            args.require::<i64>("missing"),
            Err(ResolverError::MissingArgument("missing".into()))
        );
        assert!(matches!(
            args.require::<i64>("name"),
            Err(ResolverError::ArgumentParseError(..))
        ));
        assert_eq!(args.all().keys().collect::<Vec<_>>(), ["id", "name"]);
    }

    #[test]
    fn test_path_segment_serializes_untagged() {
        let path = vec![PathSegment::from("hero"), PathSegment::from(0), PathSegment::from("name")];
        assert_eq!(serde_json::to_value(&path).unwrap(), json!(["hero", 0, "name"]));
    }

    #[tokio::test]
    async fn test_default_resolver() {
        let ctx = Context::new();
        let args = ResolverArgs::new();
        let info = info("name");

        let parent = json!({"name": "Alice", "age": 30});
        let result = DefaultResolver.resolve(&parent, &args, &ctx, &info).await;
        assert_eq!(result, Ok(json!("Alice")));

        let result = DefaultResolver.resolve(&json!({}), &args, &ctx, &info).await;
        assert_eq!(result, Ok(Value::Null));

        let result = DefaultResolver.resolve(&Value::Null, &args, &ctx, &info).await;
        assert_eq!(result, Ok(Value::Null));

        let result = DefaultResolver.resolve(&json!(5), &args, &ctx, &info).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_fn_resolver() {
        let resolver = FnResolver::new(|_parent, args, _ctx, _info| {
            let id: i64 = args.require("id")?;
            Ok(json!({"id": id, "name": "User"}))
        });

        let mut args = ResolverArgs::new();
        args.set("id", json!(42));
        let result = resolver
            .resolve(&json!({}), &args, &Context::new(), &info("user"))
            .await;
        assert_eq!(result, Ok(json!({"id": 42, "name": "User"})));
    }

    #[tokio::test]
    async fn test_async_fn_resolver_sees_context() {
        let resolver = AsyncFnResolver::new(|_parent, _args, ctx: Context, info: ResolveInfo| async move {
            let token: String = ctx.get("token").ok_or("no token")?;
            Ok(json!(format!("{}:{token}", info.field_name)))
        });

        let ctx = Context::new().with_value("token", "xyz");
        let result = resolver
            .resolve(&Value::Null, &ResolverArgs::new(), &ctx, &info("me"))
            .await;
        assert_eq!(result, Ok(json!("me:xyz")));
    }
}
