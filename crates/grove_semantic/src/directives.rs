//! Directive definitions and the built-in `@include`, `@skip` and `@deprecated`.

use crate::schema::{InputValueDef, TypeRef};
use grove_syntax::ast::OperationType;
use indexmap::IndexMap;
use serde_json::Value;
use std::fmt;

pub const INCLUDE: &str = "include";
pub const SKIP: &str = "skip";
pub const DEPRECATED: &str = "deprecated";

/// Reason recorded by a bare `@deprecated`.
pub const DEFAULT_DEPRECATION_REASON: &str = "No longer supported";

/// Directive location.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DirectiveLocation {
    Query,
    Mutation,
    Subscription,
    Field,
    FragmentDefinition,
    FragmentSpread,
    InlineFragment,
    VariableDefinition,
    Schema,
    Scalar,
    Object,
    FieldDefinition,
    ArgumentDefinition,
    Interface,
    Union,
    Enum,
    EnumValue,
    InputObject,
    InputFieldDefinition,
}

impl DirectiveLocation {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Query => "QUERY",
            Self::Mutation => "MUTATION",
            Self::Subscription => "SUBSCRIPTION",
            Self::Field => "FIELD",
            Self::FragmentDefinition => "FRAGMENT_DEFINITION",
            Self::FragmentSpread => "FRAGMENT_SPREAD",
            Self::InlineFragment => "INLINE_FRAGMENT",
            Self::VariableDefinition => "VARIABLE_DEFINITION",
            Self::Schema => "SCHEMA",
            Self::Scalar => "SCALAR",
            Self::Object => "OBJECT",
            Self::FieldDefinition => "FIELD_DEFINITION",
            Self::ArgumentDefinition => "ARGUMENT_DEFINITION",
            Self::Interface => "INTERFACE",
            Self::Union => "UNION",
            Self::Enum => "ENUM",
            Self::EnumValue => "ENUM_VALUE",
            Self::InputObject => "INPUT_OBJECT",
            Self::InputFieldDefinition => "INPUT_FIELD_DEFINITION",
        }
    }
}

impl From<OperationType> for DirectiveLocation {
    fn from(operation: OperationType) -> Self {
        match operation {
            OperationType::Query => Self::Query,
            OperationType::Mutation => Self::Mutation,
            OperationType::Subscription => Self::Subscription,
        }
    }
}

impl fmt::Display for DirectiveLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Directive definition.
#[derive(Debug, Clone)]
pub struct DirectiveDefinition {
    pub name: String,
    pub description: Option<String>,
    pub arguments: IndexMap<String, InputValueDef>,
    pub locations: Vec<DirectiveLocation>,
    pub repeatable: bool,
}

impl DirectiveDefinition {
    /// Creates a directive usable at the given locations.
    pub fn new(
        name: impl Into<String>,
        locations: impl IntoIterator<Item = DirectiveLocation>,
    ) -> Self {
        Self {
            name: name.into(),
            description: None,
            arguments: IndexMap::new(),
            locations: locations.into_iter().collect(),
            repeatable: false,
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

    /// Allows the directive more than once per location.
    #[must_use]
    pub fn repeatable(mut self) -> Self {
        self.repeatable = true;
        self
    }

    #[must_use]
    pub fn allows(&self, location: DirectiveLocation) -> bool {
        self.locations.contains(&location)
    }
}

/// The directives every schema carries.
#[must_use]
pub fn builtin_directives() -> Vec<DirectiveDefinition> {
    use DirectiveLocation::{EnumValue, Field, FieldDefinition, FragmentSpread, InlineFragment};

    let condition = |name: &str, description: &str, if_description: &str| {
        DirectiveDefinition::new(name, [Field, FragmentSpread, InlineFragment])
            .description(description)
            .argument(
                InputValueDef::new("if", TypeRef::non_null(TypeRef::named("Boolean")))
                    .description(if_description),
            )
    };

    vec![
        condition(
            INCLUDE,
            "Directs the executor to include this field or fragment only when the `if` argument is true.",
            "Included when true.",
        ),
        condition(
            SKIP,
            "Directs the executor to skip this field or fragment when the `if` argument is true.",
            "Skipped when true.",
        ),
        DirectiveDefinition::new(DEPRECATED, [FieldDefinition, EnumValue])
            .description("Marks an element of a GraphQL schema as no longer supported.")
            .argument(
                InputValueDef::new("reason", TypeRef::named("String"))
                    .default_value(Value::String(DEFAULT_DEPRECATION_REASON.to_string())),
            ),
    ]
}
