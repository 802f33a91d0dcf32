//! Execution results.

use crate::error::GraphQLError;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The result of one request.
///
/// `data` is absent when execution never started (syntax, validation,
/// operation selection or variable errors) or when a null reached the root.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Response {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<GraphQLError>,
}

impl Response {
    /// A successful response.
    pub fn data(data: Value) -> Self {
        Self {
            data: Some(data),
            errors: Vec::new(),
        }
    }

    /// A response carrying a single error and no data.
    pub fn error(error: GraphQLError) -> Self {
        Self {
            data: None,
            errors: vec![error],
        }
    }

    /// A response carrying errors and no data.
    pub fn errors(errors: Vec<GraphQLError>) -> Self {
        Self { data: None, errors }
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn has_data(&self) -> bool {
        self.data.is_some()
    }

    /// The response as a JSON value.
    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use serde_json::json;

    #[test]
    fn test_data_response() {
        let response = Response::data(json!({"hero": {"name": "R2-D2"}}));
        assert!(response.has_data());
        assert!(!response.has_errors());
        assert_eq!(response.to_json(), json!({"data": {"hero": {"name": "R2-D2"}}}));
    }

    #[test]
    fn test_error_response_has_no_data_member() {
        let response = Response::error(GraphQLError::new(ErrorKind::Operation, "Must provide an operation."));
        assert!(!response.has_data());
        assert_eq!(
            response.to_json(),
            json!({"errors": [{"message": "Must provide an operation."}]})
        );
    }
}
