//! Request descriptors.

use grove_semantic::Context;
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};

/// One request to execute.
///
/// Deserializes from the usual transport body
/// (`{"query", "operationName", "variables"}`); the root value and context
/// are supplied by the caller.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Request {
    pub query: String,
    #[serde(default)]
    pub operation_name: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub variables: Map<String, Value>,
    #[serde(skip)]
    pub root_value: Value,
    #[serde(skip)]
    pub context: Context,
}

impl Request {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn operation_name(mut self, name: impl Into<String>) -> Self {
        self.operation_name = Some(name.into());
        self
    }

    /// Sets raw variable inputs. Non-object values are ignored.
    #[must_use]
    pub fn variables(mut self, variables: Value) -> Self {
        if let Value::Object(map) = variables {
            self.variables = map;
        }
        self
    }

    #[must_use]
    pub fn variable(mut self, name: impl Into<String>, value: Value) -> Self {
        self.variables.insert(name.into(), value);
        self
    }

    /// Sets the parent value handed to root field resolvers.
    #[must_use]
    pub fn root_value(mut self, root: Value) -> Self {
        self.root_value = root;
        self
    }

    #[must_use]
    pub fn context(mut self, context: Context) -> Self {
        self.context = context;
        self
    }
}

impl From<&str> for Request {
    fn from(query: &str) -> Self {
        Self::new(query)
    }
}

impl From<String> for Request {
    fn from(query: String) -> Self {
        Self::new(query)
    }
}

fn null_as_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Map<String, Value>, D::Error> {
    Option::<Map<String, Value>>::deserialize(deserializer).map(Option::unwrap_or_default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_builder() {
        let request = Request::new("query Q($id: ID!) { human(id: $id) { name } }")
            .operation_name("Q")
            .variables(json!({"id": "1000"}))
            .root_value(json!({"seed": 1}));
        assert_eq!(request.operation_name.as_deref(), Some("Q"));
        assert_eq!(request.variables.get("id"), Some(&json!("1000")));
        assert_eq!(request.root_value, json!({"seed": 1}));
    }

    #[test]
    fn test_deserialize_transport_body() {
        let request: Request = serde_json::from_value(json!({
            "query": "{ hero { name } }",
            "operationName": null,
            "variables": null
        }))
        .unwrap();
        assert_eq!(request.query, "{ hero { name } }");
        assert!(request.operation_name.is_none());
        assert!(request.variables.is_empty());
        assert_eq!(request.root_value, Value::Null);
    }
}
