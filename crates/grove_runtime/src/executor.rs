//! Request execution.
//!
//! Completion follows one rule: an error at a position is either recorded
//! there (when the position is nullable) or handed to the enclosing
//! position (when it is non-null). An `Err` travelling upward has not been
//! recorded yet, so every originating error lands in the response once.

use crate::collect::{Collector, GroupedFields};
use crate::config::ExecutorConfig;
use crate::error::{ErrorKind, GraphQLError};
use crate::request::Request;
use crate::response::Response;
use grove_core::LineIndex;
use grove_semantic::{
    coerce_argument_values, coerce_variable_values, validate, Context, DefaultResolver,
    FieldDefinition, ObjectType, PathSegment, ResolveInfo, Resolver, ResolverArgs, Schema,
    TypeDef, TypeRef,
};
use grove_syntax::ast::{self, OperationType};
use rustc_hash::FxHashMap;
use futures::FutureExt;
use serde_json::{Map, Value};
use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::pin::Pin;
use std::sync::Arc;
use tokio::sync::{RwLock, Semaphore};
use tracing::Instrument;

type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send + 'static>>;

/// A completed value, or an unrecorded error bound for the nearest nullable
/// ancestor.
type Completion = Result<Value, GraphQLError>;

/// Executes requests against a schema.
///
/// Cheap to clone; one executor can serve any number of concurrent requests.
#[derive(Debug, Clone)]
pub struct Executor {
    schema: Schema,
    config: ExecutorConfig,
}

impl Executor {
    #[must_use]
    pub fn new(schema: Schema) -> Self {
        Self {
            schema,
            config: ExecutorConfig::default(),
        }
    }

    #[must_use]
    pub fn with_config(mut self, config: ExecutorConfig) -> Self {
        self.config = config;
        self
    }

    #[must_use]
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    #[must_use]
    pub fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    /// Parses, validates and executes one request.
    ///
    /// Never fails outright: every problem is reported in the response.
    pub async fn execute(&self, request: impl Into<Request>) -> Response {
        let request = request.into();
        let span = tracing::info_span!(
            "execute",
            operation = request.operation_name.as_deref().unwrap_or("<anonymous>"),
            kind = tracing::field::Empty,
        );
        self.execute_request(request).instrument(span).await
    }

    async fn execute_request(&self, request: Request) -> Response {
        let Request {
            query,
            operation_name,
            variables,
            root_value,
            context,
        } = request;

        let document = match grove_syntax::parse(&query) {
            Ok(document) => document,
            Err(error) => {
                tracing::debug!(%error, "request rejected by parser");
                return Response::error(GraphQLError::from_syntax(&error));
            }
        };
        let lines = LineIndex::new(&query);

        let diagnostics = validate(&self.schema, &document, &self.config.validation_options());
        if diagnostics.has_errors() {
            tracing::debug!(errors = diagnostics.error_count(), "request rejected by validation");
            return Response::errors(
                diagnostics
                    .iter()
                    .map(|diagnostic| GraphQLError::from_diagnostic(diagnostic, &lines))
                    .collect(),
            );
        }

        let operation = match select_operation(&document, operation_name.as_deref()) {
            Ok(operation) => operation,
            Err(error) => {
                tracing::debug!(%error, "no operation selected");
                return Response::error(error);
            }
        };
        tracing::Span::current().record("kind", operation.operation.as_str());

        let Some(root_type) = self.schema.root_type(operation.operation) else {
            return Response::error(
                GraphQLError::new(
                    ErrorKind::Operation,
                    format!(
                        "Schema is not configured to execute {} operation.",
                        operation.operation
                    ),
                )
                .with_spans([operation.span], &lines),
            );
        };

        let variables = match coerce_variable_values(&self.schema, operation, &variables) {
            Ok(variables) => variables,
            Err(errors) => {
                tracing::debug!(errors = errors.len(), "variable coercion failed");
                return Response::errors(
                    errors
                        .iter()
                        .map(|error| GraphQLError::from_coercion(error, &lines))
                        .collect(),
                );
            }
        };

        let ecx = Arc::new(ExecutionContext {
            schema: self.schema.clone(),
            fragments: document
                .fragments()
                .map(|fragment| (fragment.name.value.clone(), fragment.clone()))
                .collect(),
            operation: Arc::new(operation.clone()),
            variables: Arc::new(variables),
            context,
            lines,
            errors: RwLock::new(Vec::new()),
            limiter: self
                .config
                .max_concurrent_resolvers
                .map(|limit| Semaphore::new(limit.max(1))),
        });

        let grouped = ecx.collector().collect(root_type, [&operation.selection_set]);
        let serial = operation.operation == OperationType::Mutation;
        let result = execute_fields(
            Arc::clone(&ecx),
            Arc::from(root_type.name.as_str()),
            Arc::new(root_value),
            grouped,
            Vec::new(),
            serial,
        )
        .await;

        let mut errors = std::mem::take(&mut *ecx.errors.write().await);
        let data = match result {
            Ok(data) => Some(data),
            Err(error) => {
                errors.push(error);
                None
            }
        };
        // Tasks record errors as they finish; report them in document order.
        errors.sort_by(|a, b| (a.locations.first(), &a.path).cmp(&(b.locations.first(), &b.path)));
        tracing::debug!(errors = errors.len(), has_data = data.is_some(), "execution finished");
        Response { data, errors }
    }
}

fn select_operation<'d>(
    document: &'d ast::Document,
    name: Option<&str>,
) -> Result<&'d ast::OperationDefinition, GraphQLError> {
    if let Some(name) = name {
        return document.operation(name).ok_or_else(|| {
            GraphQLError::new(ErrorKind::Operation, format!("Unknown operation named \"{name}\"."))
        });
    }
    let mut operations = document.operations();
    match (operations.next(), operations.next()) {
        (Some(operation), None) => Ok(operation),
        (None, _) => Err(GraphQLError::new(
            ErrorKind::Operation,
            "Must provide an operation.",
        )),
        (Some(_), Some(_)) => Err(GraphQLError::new(
            ErrorKind::Operation,
            "Must provide operation name if query contains multiple operations.",
        )),
    }
}

/// State shared by every task of one execution.
struct ExecutionContext {
    schema: Schema,
    fragments: FxHashMap<String, ast::FragmentDefinition>,
    operation: Arc<ast::OperationDefinition>,
    variables: Arc<Map<String, Value>>,
    context: Context,
    lines: LineIndex,
    errors: RwLock<Vec<GraphQLError>>,
    limiter: Option<Semaphore>,
}

impl ExecutionContext {
    fn collector(&self) -> Collector<'_> {
        Collector {
            schema: &self.schema,
            fragments: &self.fragments,
            variables: &self.variables,
        }
    }

    async fn record(&self, error: GraphQLError) {
        self.errors.write().await.push(error);
    }

    /// Settles a completion at a position of type `ty`: nullable positions
    /// absorb the error as null, non-null positions pass it upward.
    async fn settle(&self, completion: Completion, ty: &TypeRef) -> Completion {
        match completion {
            Err(error) if !ty.is_non_null() => {
                self.record(error).await;
                Ok(Value::Null)
            }
            other => other,
        }
    }
}

/// The field a value is being completed for.
#[derive(Clone)]
struct FieldSite {
    parent_type: Arc<str>,
    nodes: Arc<[ast::Field]>,
}

impl FieldSite {
    fn name(&self) -> &str {
        self.nodes.first().map_or("", |field| field.name.as_str())
    }

    fn error(
        &self,
        ecx: &ExecutionContext,
        kind: ErrorKind,
        message: impl Into<String>,
        path: &[PathSegment],
    ) -> GraphQLError {
        GraphQLError::new(kind, message)
            .with_spans(self.nodes.first().map(|field| field.span), &ecx.lines)
            .with_path(path.to_vec())
    }
}

fn child_path(path: &[PathSegment], segment: PathSegment) -> Vec<PathSegment> {
    let mut child = Vec::with_capacity(path.len() + 1);
    child.extend_from_slice(path);
    child.push(segment);
    child
}

/// Executes grouped fields against one parent value.
///
/// With `serial` unset and more than one field, each field runs on its own
/// task; handles are awaited in response-key order.
fn execute_fields(
    ecx: Arc<ExecutionContext>,
    type_name: Arc<str>,
    parent: Arc<Value>,
    grouped: GroupedFields,
    path: Vec<PathSegment>,
    serial: bool,
) -> BoxFuture<Completion> {
    Box::pin(async move {
        let mut results = Map::new();

        if serial || grouped.len() <= 1 {
            for (key, fields) in grouped {
                let field_path = child_path(&path, PathSegment::Field(key.clone()));
                let site = FieldSite {
                    parent_type: Arc::clone(&type_name),
                    nodes: Arc::from(fields),
                };
                let value = execute_field(Arc::clone(&ecx), site, Arc::clone(&parent), field_path).await?;
                results.insert(key, value);
            }
            return Ok(Value::Object(results));
        }

        let handles: Vec<_> = grouped
            .into_iter()
            .map(|(key, fields)| {
                let field_path = child_path(&path, PathSegment::Field(key.clone()));
                let site = FieldSite {
                    parent_type: Arc::clone(&type_name),
                    nodes: Arc::from(fields),
                };
                let handle = tokio::spawn(execute_field(
                    Arc::clone(&ecx),
                    site.clone(),
                    Arc::clone(&parent),
                    field_path.clone(),
                ));
                (key, site, field_path, handle)
            })
            .collect();

        let mut propagated = None;
        for (key, site, field_path, handle) in handles {
            let completion = match handle.await {
                Ok(completion) => completion,
                Err(join_error) => {
                    tracing::warn!(field = %key, error = %join_error, "field task failed");
                    let error = site.error(
                        &ecx,
                        ErrorKind::Field,
                        format!("Field execution failed: {join_error}"),
                        &field_path,
                    );
                    let non_null = field_definition(&ecx.schema, &type_name, site.name())
                        .is_some_and(|def| def.ty.is_non_null());
                    if non_null {
                        Err(error)
                    } else {
                        ecx.record(error).await;
                        Ok(Value::Null)
                    }
                }
            };
            match completion {
                Ok(value) => {
                    results.insert(key, value);
                }
                Err(error) if propagated.is_none() => propagated = Some(error),
                Err(error) => ecx.record(error).await,
            }
        }

        match propagated {
            Some(error) => Err(error),
            None => Ok(Value::Object(results)),
        }
    })
}

fn field_definition<'s>(schema: &'s Schema, type_name: &str, field_name: &str) -> Option<&'s FieldDefinition> {
    schema.object(type_name)?.fields.get(field_name)
}

/// Resolves and completes one response key.
fn execute_field(
    ecx: Arc<ExecutionContext>,
    site: FieldSite,
    parent: Arc<Value>,
    path: Vec<PathSegment>,
) -> BoxFuture<Completion> {
    Box::pin(async move {
        if site.name() == "__typename" {
            return Ok(Value::String(site.parent_type.to_string()));
        }
        // Validation guarantees the field exists.
        let Some(definition) = field_definition(&ecx.schema, &site.parent_type, site.name()) else {
            return Ok(Value::Null);
        };

        let span = tracing::trace_span!("field", parent = %site.parent_type, field = site.name());
        let resolved = resolve_field(&ecx, definition, &site, &parent, &path)
            .instrument(span)
            .await;
        let completion = match resolved {
            Ok(value) => {
                complete_value(
                    Arc::clone(&ecx),
                    definition.ty.clone(),
                    site.clone(),
                    value,
                    path,
                )
                .await
            }
            Err(error) => Err(error),
        };
        ecx.settle(completion, &definition.ty).await
    })
}

async fn resolve_field(
    ecx: &ExecutionContext,
    definition: &FieldDefinition,
    site: &FieldSite,
    parent: &Value,
    path: &[PathSegment],
) -> Result<Value, GraphQLError> {
    let cancelled = || {
        site.error(
            ecx,
            ErrorKind::Cancelled,
            format!(
                "Execution of field \"{}.{}\" was cancelled.",
                site.parent_type,
                site.name()
            ),
            path,
        )
    };
    if ecx.context.is_cancelled() {
        return Err(cancelled());
    }

    let arguments = site.nodes.first().map_or(&[][..], |field| &field.arguments[..]);
    let args = coerce_argument_values(&ecx.schema, &definition.arguments, arguments, &ecx.variables)
        .map_err(|error| {
            GraphQLError::new(ErrorKind::Coercion, error.message)
                .with_spans(
                    error.span.or_else(|| site.nodes.first().map(|field| field.span)),
                    &ecx.lines,
                )
                .with_path(path.to_vec())
        })?;
    let args = ResolverArgs::from(args);

    let info = ResolveInfo {
        field_name: definition.name.clone(),
        field_nodes: Arc::clone(&site.nodes),
        return_type: definition.ty.clone(),
        parent_type: site.parent_type.to_string(),
        path: path.to_vec(),
        schema: ecx.schema.clone(),
        operation: Arc::clone(&ecx.operation),
        variables: Arc::clone(&ecx.variables),
    };
    let resolver: &dyn Resolver = match definition.get_resolver() {
        Some(resolver) => resolver.as_ref(),
        None => &DefaultResolver,
    };

    let _permit = match &ecx.limiter {
        Some(limiter) => limiter.acquire().await.ok(),
        None => None,
    };
    // Sync resolvers run inside `resolve`, so the call itself is wrapped.
    let future = AssertUnwindSafe(async { resolver.resolve(parent, &args, &ecx.context, &info).await })
        .catch_unwind();
    let outcome = match ecx.context.cancellation() {
        Some(token) => tokio::select! {
            result = future => Some(result),
            () = token.cancelled() => None,
        },
        None => Some(future.await),
    };

    match outcome {
        Some(Ok(Ok(value))) => {
            tracing::trace!("resolved");
            Ok(value)
        }
        Some(Ok(Err(error))) => {
            tracing::trace!(%error, "resolver failed");
            Err(site.error(ecx, ErrorKind::Field, error.to_string(), path))
        }
        Some(Err(payload)) => {
            let message = panic_message(&*payload);
            tracing::warn!(field = site.name(), %message, "resolver panicked");
            Err(site.error(
                ecx,
                ErrorKind::Field,
                format!("Field execution failed: resolver panicked with message \"{message}\""),
                path,
            ))
        }
        None => Err(cancelled()),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&'static str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message
    } else {
        "Box<dyn Any>"
    }
}

/// Completes a resolved value against its declared type, wrapper by wrapper.
fn complete_value(
    ecx: Arc<ExecutionContext>,
    ty: TypeRef,
    site: FieldSite,
    value: Value,
    path: Vec<PathSegment>,
) -> BoxFuture<Completion> {
    Box::pin(async move {
        match &ty {
            TypeRef::NonNull(inner) => {
                let completed = complete_value(
                    Arc::clone(&ecx),
                    (**inner).clone(),
                    site.clone(),
                    value,
                    path.clone(),
                )
                .await?;
                if completed.is_null() {
                    return Err(site.error(
                        &ecx,
                        ErrorKind::NullabilityViolation,
                        format!(
                            "Cannot return null for non-nullable field {}.{}.",
                            site.parent_type,
                            site.name()
                        ),
                        &path,
                    ));
                }
                Ok(completed)
            }
            _ if value.is_null() => Ok(Value::Null),
            TypeRef::List(inner) => complete_list(ecx, (**inner).clone(), site, value, path).await,
            TypeRef::Named(name) => complete_named(&ecx, name, &site, value, path).await,
        }
    })
}

async fn complete_list(
    ecx: Arc<ExecutionContext>,
    item_type: TypeRef,
    site: FieldSite,
    value: Value,
    path: Vec<PathSegment>,
) -> Completion {
    let Value::Array(items) = value else {
        return Err(site.error(
            &ecx,
            ErrorKind::Field,
            format!(
                "Expected Iterable, but did not find one for field \"{}.{}\".",
                site.parent_type,
                site.name()
            ),
            &path,
        ));
    };

    let leaf = ecx
        .schema
        .get_type(item_type.named_type())
        .is_some_and(TypeDef::is_leaf);
    let mut completed = Vec::with_capacity(items.len());

    if leaf || items.len() <= 1 {
        for (index, item) in items.into_iter().enumerate() {
            let item_path = child_path(&path, PathSegment::Index(index));
            let completion =
                complete_value(Arc::clone(&ecx), item_type.clone(), site.clone(), item, item_path).await;
            completed.push(ecx.settle(completion, &item_type).await?);
        }
        return Ok(Value::Array(completed));
    }

    let handles: Vec<_> = items
        .into_iter()
        .enumerate()
        .map(|(index, item)| {
            let item_path = child_path(&path, PathSegment::Index(index));
            let handle = tokio::spawn(complete_value(
                Arc::clone(&ecx),
                item_type.clone(),
                site.clone(),
                item,
                item_path.clone(),
            ));
            (item_path, handle)
        })
        .collect();

    let mut propagated = None;
    for (item_path, handle) in handles {
        let completion = handle.await.unwrap_or_else(|join_error| {
            tracing::warn!(field = site.name(), error = %join_error, "list item task failed");
            Err(site.error(
                &ecx,
                ErrorKind::Field,
                format!("List item execution failed: {join_error}"),
                &item_path,
            ))
        });
        match ecx.settle(completion, &item_type).await {
            Ok(value) => completed.push(value),
            Err(error) if propagated.is_none() => propagated = Some(error),
            Err(error) => ecx.record(error).await,
        }
    }

    match propagated {
        Some(error) => Err(error),
        None => Ok(Value::Array(completed)),
    }
}

async fn complete_named(
    ecx: &Arc<ExecutionContext>,
    name: &str,
    site: &FieldSite,
    value: Value,
    path: Vec<PathSegment>,
) -> Completion {
    let field_error = |message: String| site.error(ecx, ErrorKind::Field, message, &path);
    let Some(type_def) = ecx.schema.get_type(name) else {
        return Err(field_error(format!("Unknown type \"{name}\".")));
    };

    match type_def {
        TypeDef::Scalar(scalar) => scalar.serialize_output(&value).map_err(field_error),
        TypeDef::Enum(enum_type) => enum_type.serialize_output(&value).map_err(field_error),
        TypeDef::Object(object) => complete_object(ecx, object, site, value, path).await,
        TypeDef::Interface(_) | TypeDef::Union(_) => {
            match resolve_runtime_type(ecx, type_def, site, &value) {
                Ok(object) => complete_object(ecx, object, site, value, path).await,
                Err(message) => Err(field_error(message)),
            }
        }
        TypeDef::InputObject(_) => Err(field_error(format!(
            "Type \"{name}\" is not an output type."
        ))),
    }
}

async fn complete_object(
    ecx: &Arc<ExecutionContext>,
    object: &ObjectType,
    site: &FieldSite,
    value: Value,
    path: Vec<PathSegment>,
) -> Completion {
    if object.check_is_type_of(&value, &ecx.context) == Some(false) {
        return Err(site.error(
            ecx,
            ErrorKind::Field,
            format!("Expected value of type \"{}\" but got: {value}.", object.name),
            &path,
        ));
    }
    let grouped = ecx.collector().collect(
        object,
        site.nodes.iter().filter_map(|field| field.selection_set.as_ref()),
    );
    execute_fields(
        Arc::clone(ecx),
        Arc::from(object.name.as_str()),
        Arc::new(value),
        grouped,
        path,
        false,
    )
    .await
}

/// Picks the concrete object type of an interface or union value.
///
/// Tries the abstract type's resolver, then each possible type's
/// `is_type_of`, then a `__typename` member on the value.
fn resolve_runtime_type<'s>(
    ecx: &'s ExecutionContext,
    abstract_type: &'s TypeDef,
    site: &FieldSite,
    value: &Value,
) -> Result<&'s ObjectType, String> {
    let schema = &ecx.schema;
    let type_resolver = match abstract_type {
        TypeDef::Interface(interface) => interface.type_resolver(),
        TypeDef::Union(union) => union.type_resolver(),
        _ => None,
    };
    let resolved = match type_resolver {
        Some(resolve) => resolve(value, &ecx.context),
        None => schema
            .possible_types(abstract_type)
            .iter()
            .find(|name| {
                schema
                    .object(name)
                    .and_then(|object| object.check_is_type_of(value, &ecx.context))
                    == Some(true)
            })
            .cloned()
            .or_else(|| {
                value
                    .get("__typename")
                    .and_then(Value::as_str)
                    .map(str::to_string)
            }),
    };

    let abstract_name = abstract_type.name();
    let Some(name) = resolved else {
        return Err(format!(
            "Abstract type \"{abstract_name}\" must resolve to an Object type at runtime for field \"{}.{}\". \
             Either the \"{abstract_name}\" type should provide a type resolver or each possible type should provide an \"is_type_of\" function.",
            site.parent_type,
            site.name()
        ));
    };
    let Some(object) = schema.object(&name) else {
        return Err(format!(
            "Abstract type \"{abstract_name}\" was resolved to a type \"{name}\" that does not exist inside the schema."
        ));
    };
    if !schema.is_possible_type(abstract_type, &name) {
        return Err(format!(
            "Runtime Object type \"{name}\" is not a possible type for \"{abstract_name}\"."
        ));
    }
    Ok(object)
}
