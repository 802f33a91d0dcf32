//! Null propagation through non-null positions.

use grove_runtime::{ErrorKind, Executor, Request, Response};
use grove_semantic::{
    Context, FieldDefinition, ObjectType, ResolveInfo, ResolverArgs, ResolverResult, Schema,
    SchemaBuilder, TypeRef,
};
use serde_json::{json, Value};
use std::time::Duration;

fn string() -> TypeRef {
    TypeRef::named("String")
}

fn error(
    message: &'static str,
) -> impl Fn(&Value, &ResolverArgs, &Context, &ResolveInfo) -> ResolverResult + Send + Sync + 'static {
    move |_, _, _, _| Err(message.into())
}

fn data_type() -> ObjectType {
    ObjectType::new("DataType")
        .field(FieldDefinition::new("sync", string()).resolve(|_, _, _, _| Ok(json!("sync"))))
        .field(FieldDefinition::new("syncError", string()).resolve(error("syncError")))
        .field(
            FieldDefinition::new("syncNonNull", TypeRef::non_null(string()))
                .resolve(|_, _, _, _| Ok(Value::Null)),
        )
        .field(
            FieldDefinition::new("syncNonNullError", TypeRef::non_null(string()))
                .resolve(error("syncNonNullError")),
        )
        .field(
            FieldDefinition::new("promise", string()).resolve_async(|_, _, _, _| async {
                tokio::time::sleep(Duration::from_millis(5)).await;
                Ok(json!("promise"))
            }),
        )
        .field(
            FieldDefinition::new("promiseError", string()).resolve_async(|_, _, _, _| async {
                tokio::time::sleep(Duration::from_millis(20)).await;
                ResolverResult::Err("promiseError".into())
            }),
        )
        .field(FieldDefinition::new("nest", TypeRef::named("DataType")).resolve(|_, _, _, _| Ok(json!({}))))
        .field(
            FieldDefinition::new("nonNullNest", TypeRef::non_null(TypeRef::named("DataType")))
                .resolve(|_, _, _, _| Ok(json!({}))),
        )
        .field(
            FieldDefinition::new("list", TypeRef::list(string()))
                .resolve(|_, _, _, _| Ok(json!(["a", null, "c"]))),
        )
        .field(
            FieldDefinition::new("nonNullList", TypeRef::list(TypeRef::non_null(string())))
                .resolve(|_, _, _, _| Ok(json!(["a", null, "c"]))),
        )
        .field(
            FieldDefinition::new("notAList", TypeRef::list(string()))
                .resolve(|_, _, _, _| Ok(json!("a"))),
        )
}

fn schema() -> Schema {
    SchemaBuilder::new()
        .query(
            ObjectType::new("Query")
                .field(FieldDefinition::new("nullable", TypeRef::named("DataType")).resolve(|_, _, _, _| Ok(json!({}))))
                .field(
                    FieldDefinition::new("nonNullable", TypeRef::non_null(TypeRef::named("DataType")))
                        .resolve(|_, _, _, _| Ok(json!({}))),
                ),
        )
        .register(data_type())
        .build()
        .unwrap()
}

async fn run(query: &str) -> Response {
    Executor::new(schema()).execute(Request::new(query)).await
}

fn paths(response: &Response) -> Vec<Value> {
    response
        .errors
        .iter()
        .map(|error| serde_json::to_value(&error.path).unwrap())
        .collect()
}

#[tokio::test]
async fn partial_success() {
    let response = run("{ nullable { sync syncError promise } }").await;
    assert_eq!(
        response.data,
        Some(json!({"nullable": {"sync": "sync", "syncError": null, "promise": "promise"}}))
    );
    assert_eq!(paths(&response), [json!(["nullable", "syncError"])]);
    assert_eq!(response.errors[0].message, "syncError");
    assert_eq!(response.errors[0].kind, ErrorKind::Field);
}

#[tokio::test]
async fn null_in_non_null_field_nulls_parent() {
    let response = run("{ nullable { sync syncNonNull } }").await;
    assert_eq!(response.data, Some(json!({"nullable": null})));
    assert_eq!(paths(&response), [json!(["nullable", "syncNonNull"])]);
    assert_eq!(response.errors[0].kind, ErrorKind::NullabilityViolation);
    insta::assert_snapshot!(
        response.errors[0].message,
        @"Cannot return null for non-nullable field DataType.syncNonNull."
    );
}

#[tokio::test]
async fn error_travels_through_non_null_chain() {
    let response = run("{ nullable { sync nest { nonNullNest { nonNullNest { syncNonNullError } } } } }").await;
    assert_eq!(response.data, Some(json!({"nullable": {"sync": "sync", "nest": null}})));
    assert_eq!(
        paths(&response),
        [json!(["nullable", "nest", "nonNullNest", "nonNullNest", "syncNonNullError"])]
    );
    assert_eq!(response.errors[0].message, "syncNonNullError");
}

#[tokio::test]
async fn collapse_to_root_removes_data() {
    let response = run("{ nullable { sync } nonNullable { syncNonNull } }").await;
    assert_eq!(response.data, None);
    assert_eq!(paths(&response), [json!(["nonNullable", "syncNonNull"])]);
    assert_eq!(
        response.to_json(),
        json!({"errors": [{
            "message": "Cannot return null for non-nullable field DataType.syncNonNull.",
            "locations": [{"line": 1, "column": 35}],
            "path": ["nonNullable", "syncNonNull"]
        }]})
    );
}

#[tokio::test]
async fn list_items() {
    let response = run("{ nullable { list nonNullList } }").await;
    assert_eq!(
        response.data,
        Some(json!({"nullable": {"list": ["a", null, "c"], "nonNullList": null}}))
    );
    assert_eq!(paths(&response), [json!(["nullable", "nonNullList", 1])]);
}

#[tokio::test]
async fn non_list_value_for_list_field() {
    let response = run("{ nullable { notAList } }").await;
    assert_eq!(response.data, Some(json!({"nullable": {"notAList": null}})));
    insta::assert_snapshot!(
        response.errors[0].message,
        @r###"Expected Iterable, but did not find one for field "DataType.notAList"."###
    );
}

#[tokio::test]
async fn sibling_errors_are_all_reported() {
    let response = run("{ nullable { a: syncNonNullError b: syncNonNullError } }").await;
    assert_eq!(response.data, Some(json!({"nullable": null})));
    assert_eq!(
        paths(&response),
        [json!(["nullable", "a"]), json!(["nullable", "b"])]
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn errors_are_reported_in_document_order() {
    let response = run("{ nullable { slow: promiseError fast: syncError } }").await;
    assert_eq!(
        response.data,
        Some(json!({"nullable": {"slow": null, "fast": null}}))
    );
    assert_eq!(
        paths(&response),
        [json!(["nullable", "slow"]), json!(["nullable", "fast"])]
    );
}
