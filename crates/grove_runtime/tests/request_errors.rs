//! Requests rejected before execution starts.

mod common;

use common::{run, star_wars_schema};
use grove_core::Location;
use grove_runtime::{graphql, ErrorKind, Executor, ExecutorConfig, Request};
use serde_json::json;

#[tokio::test]
async fn syntax_error_has_location_and_no_data() {
    let response = run("{\n  hero {\n    name(\n  }\n}").await;
    assert!(!response.has_data());
    assert_eq!(response.errors.len(), 1);
    let error = &response.errors[0];
    assert_eq!(error.kind, ErrorKind::Syntax);
    assert_eq!(error.locations, [Location::new(4, 3)]);
    insta::assert_snapshot!(error.message, @r###"Syntax Error: Expected Name, found "}"."###);
}

#[tokio::test]
async fn validation_errors_are_all_reported() {
    let response = run("{\n  hero {\n    nme\n  }\n  villain\n}").await;
    assert!(!response.has_data());
    assert!(response.errors.iter().all(|e| e.kind == ErrorKind::Validation));
    insta::assert_snapshot!(
        response.errors.iter().map(|e| format!("{:?} {}", e.locations, e.message)).collect::<Vec<_>>().join("\n"),
        @r###"
    [Location { line: 3, column: 5 }] Cannot query field "nme" on type "Character".
    [Location { line: 5, column: 3 }] Cannot query field "villain" on type "Query".
    "###
    );
    assert_eq!(
        response.to_json()["errors"][0]["extensions"],
        json!({"code": "V0014"})
    );
}

#[tokio::test]
async fn operation_selection() {
    let query = "query A { hero { name } } query B { hero { id } }";
    let response = run(Request::new(query).operation_name("B")).await;
    assert_eq!(response.data, Some(json!({"hero": {"id": "2001"}})));

    let response = run(query).await;
    assert_eq!(response.errors[0].kind, ErrorKind::Operation);
    insta::assert_snapshot!(response.errors[0].message, @"Must provide operation name if query contains multiple operations.");

    let response = run(Request::new(query).operation_name("C")).await;
    assert!(!response.has_data());
    insta::assert_snapshot!(response.errors[0].message, @r###"Unknown operation named "C"."###);
}

#[tokio::test]
async fn invalid_variables_abort_the_request() {
    let query = "query ($id: String!, $episode: Episode) { human(id: $id) { name } hero(episode: $episode) { name } }";
    let response = run(Request::new(query).variables(json!({"episode": "SITH"}))).await;
    assert!(!response.has_data());
    assert!(response.errors.iter().all(|e| e.kind == ErrorKind::Coercion));
    insta::assert_snapshot!(
        response.errors.iter().map(|e| e.message.as_str()).collect::<Vec<_>>().join("\n"),
        @r###"
    Variable "$id" of required type "String!" was not provided.
    Variable "$episode" got invalid value "SITH"; Value "SITH" does not exist in "Episode" enum.
    "###
    );
    assert_eq!(response.errors[0].locations, [Location::new(1, 8)]);
}

#[tokio::test]
async fn depth_limit_from_config() {
    let executor = Executor::new(star_wars_schema())
        .with_config(ExecutorConfig::default().with_max_depth(2).with_parallel_validation(false));
    let response = executor.execute("{ hero { friends { name } } }").await;
    insta::assert_snapshot!(response.errors[0].message, @"Query depth 3 exceeds maximum allowed depth of 2.");
    let response = executor.execute("{ hero { name } }").await;
    assert_eq!(response.data, Some(json!({"hero": {"name": "R2-D2"}})));
}

#[test]
fn blocking_entry_point() {
    let schema = star_wars_schema();
    let response = graphql(&schema, "{ hero { name } }");
    assert_eq!(response.data, Some(json!({"hero": {"name": "R2-D2"}})));

    let response = graphql(&schema, "{ hero {");
    assert_eq!(response.errors[0].kind, ErrorKind::Syntax);
}

#[tokio::test]
async fn blocking_entry_point_refuses_inside_runtime() {
    let response = graphql(&star_wars_schema(), "{ hero { name } }");
    assert!(!response.has_data());
    assert_eq!(response.errors[0].kind, ErrorKind::Operation);
}
