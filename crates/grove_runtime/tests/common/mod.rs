//! Star Wars fixture shared by the integration tests.

#![allow(dead_code)]

use grove_runtime::{Executor, Request, Response};
use grove_semantic::{
    EnumType, EnumValue, FieldDefinition, InputValueDef, InterfaceType, ObjectType, ResolverError,
    Schema, SchemaBuilder, TypeRef,
};
use serde_json::{json, Value};

fn characters() -> Value {
    json!({
        "1000": {
            "type": "Human", "id": "1000", "name": "Luke Skywalker",
            "friends": ["1002", "1003", "2000", "2001"], "appearsIn": [4, 5, 6],
            "homePlanet": "Tatooine"
        },
        "1001": {
            "type": "Human", "id": "1001", "name": "Darth Vader",
            "friends": ["1004"], "appearsIn": [4, 5, 6], "homePlanet": "Tatooine"
        },
        "1002": {
            "type": "Human", "id": "1002", "name": "Han Solo",
            "friends": ["1000", "1003", "2001"], "appearsIn": [4, 5, 6]
        },
        "1003": {
            "type": "Human", "id": "1003", "name": "Leia Organa",
            "friends": ["1000", "1002", "2000", "2001"], "appearsIn": [4, 5, 6],
            "homePlanet": "Alderaan"
        },
        "1004": {
            "type": "Human", "id": "1004", "name": "Wilhuff Tarkin",
            "friends": ["1001"], "appearsIn": [4]
        },
        "2000": {
            "type": "Droid", "id": "2000", "name": "C-3PO",
            "friends": ["1000", "1002", "1003", "2001"], "appearsIn": [4, 5, 6],
            "primaryFunction": "Protocol"
        },
        "2001": {
            "type": "Droid", "id": "2001", "name": "R2-D2",
            "friends": ["1000", "1002", "1003"], "appearsIn": [4, 5, 6],
            "primaryFunction": "Astromech"
        }
    })
}

pub fn character(id: &str) -> Value {
    characters().get(id).cloned().unwrap_or(Value::Null)
}

fn character_of_type(id: &str, ty: &str) -> Value {
    let found = character(id);
    if found.get("type").and_then(Value::as_str) == Some(ty) {
        found
    } else {
        Value::Null
    }
}

fn named(name: &str) -> TypeRef {
    TypeRef::named(name)
}

fn character_fields() -> Vec<FieldDefinition> {
    vec![
        FieldDefinition::new("id", TypeRef::non_null(named("String"))),
        FieldDefinition::new("name", named("String")),
        FieldDefinition::new("friends", TypeRef::list(named("Character"))).resolve(
            |parent, _args, _ctx, _info| {
                let ids = parent.get("friends").and_then(Value::as_array);
                Ok(Value::Array(
                    ids.into_iter()
                        .flatten()
                        .filter_map(Value::as_str)
                        .map(character)
                        .collect(),
                ))
            },
        ),
        FieldDefinition::new("appearsIn", TypeRef::list(named("Episode"))),
        FieldDefinition::new("secretBackstory", named("String"))
            .resolve(|_parent, _args, _ctx, _info| Err(ResolverError::from("secretBackstory is secret."))),
    ]
}

pub fn star_wars_schema() -> Schema {
    let id_arg = || InputValueDef::new("id", TypeRef::non_null(named("String")));
    SchemaBuilder::new()
        .query(
            ObjectType::new("Query")
                .field(
                    FieldDefinition::new("hero", named("Character"))
                        .argument(InputValueDef::new("episode", named("Episode")))
                        .resolve(|_parent, args, _ctx, _info| {
                            // Luke is the hero of Episode V, R2-D2 of the rest.
                            let id = match args.get_as::<i64>("episode") {
                                Some(5) => "1000",
                                _ => "2001",
                            };
                            Ok(character(id))
                        }),
                )
                .field(
                    FieldDefinition::new("human", named("Human"))
                        .argument(id_arg())
                        .resolve(|_parent, args, _ctx, _info| {
                            let id: String = args.require("id")?;
                            Ok(character_of_type(&id, "Human"))
                        }),
                )
                .field(
                    FieldDefinition::new("droid", named("Droid"))
                        .argument(id_arg())
                        .resolve(|_parent, args, _ctx, _info| {
                            let id: String = args.require("id")?;
                            Ok(character_of_type(&id, "Droid"))
                        }),
                ),
        )
        .register(
            EnumType::new("Episode")
                .description("One of the films in the Star Wars Trilogy")
                .enum_value(EnumValue::new("NEWHOPE").value(json!(4)))
                .enum_value(EnumValue::new("EMPIRE").value(json!(5)))
                .enum_value(EnumValue::new("JEDI").value(json!(6))),
        )
        .register(
            InterfaceType::new("Character")
                .fields_with(character_fields)
                .resolve_type(|value, _ctx| {
                    value.get("type").and_then(Value::as_str).map(str::to_string)
                }),
        )
        .register(
            ObjectType::new("Human")
                .implements("Character")
                .fields_with(character_fields)
                .field(FieldDefinition::new("homePlanet", named("String"))),
        )
        .register(
            ObjectType::new("Droid")
                .implements("Character")
                .fields_with(character_fields)
                .field(FieldDefinition::new("primaryFunction", named("String"))),
        )
        .build()
        .unwrap()
}

/// Installs a test subscriber honoring `RUST_LOG`; repeated calls are no-ops.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub async fn run(request: impl Into<Request>) -> Response {
    init_tracing();
    Executor::new(star_wars_schema()).execute(request).await
}

/// The response as JSON, with `errors` reduced to messages and paths.
pub fn summary(response: &Response) -> Value {
    let mut out = serde_json::Map::new();
    if let Some(data) = &response.data {
        out.insert("data".into(), data.clone());
    }
    if response.has_errors() {
        let errors = response
            .errors
            .iter()
            .map(|error| json!({"message": error.message, "path": error.path}))
            .collect();
        out.insert("errors".into(), Value::Array(errors));
    }
    Value::Object(out)
}
