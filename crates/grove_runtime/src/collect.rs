//! Field collection: flattens a selection set for one concrete object type.

use grove_semantic::{coerce_argument_values, ObjectType, Schema, TypeDef};
use grove_syntax::ast::{Directive, Field, FragmentDefinition, Selection, SelectionSet};
use indexmap::IndexMap;
use rustc_hash::{FxHashMap, FxHashSet};
use serde_json::{Map, Value};

/// Fields grouped by response key, in first-occurrence order.
pub(crate) type GroupedFields = IndexMap<String, Vec<Field>>;

/// Everything collection needs besides the selections themselves.
pub(crate) struct Collector<'a> {
    pub schema: &'a Schema,
    pub fragments: &'a FxHashMap<String, FragmentDefinition>,
    pub variables: &'a Map<String, Value>,
}

impl Collector<'_> {
    /// Collects the fields of `selection_sets` that apply to `object_type`.
    ///
    /// Several sets are merged when one response key was selected more than
    /// once and each occurrence carried sub-selections.
    pub fn collect<'s>(
        &self,
        object_type: &ObjectType,
        selection_sets: impl IntoIterator<Item = &'s SelectionSet>,
    ) -> GroupedFields {
        let mut grouped = GroupedFields::new();
        let mut visited = FxHashSet::default();
        for selection_set in selection_sets {
            self.collect_into(object_type, selection_set, &mut grouped, &mut visited);
        }
        grouped
    }

    fn collect_into(
        &self,
        object_type: &ObjectType,
        selection_set: &SelectionSet,
        grouped: &mut GroupedFields,
        visited: &mut FxHashSet<String>,
    ) {
        for selection in selection_set {
            if !self.should_include(selection.directives()) {
                continue;
            }
            match selection {
                Selection::Field(field) => {
                    grouped
                        .entry(field.response_key().to_string())
                        .or_default()
                        .push(field.clone());
                }
                Selection::FragmentSpread(spread) => {
                    let name = spread.name.as_str();
                    if visited.contains(name) {
                        continue;
                    }
                    visited.insert(name.to_string());
                    let Some(fragment) = self.fragments.get(name) else {
                        continue;
                    };
                    if self.condition_applies(fragment.type_condition.as_str(), object_type) {
                        self.collect_into(object_type, &fragment.selection_set, grouped, visited);
                    }
                }
                Selection::InlineFragment(inline) => {
                    let applies = inline
                        .type_condition
                        .as_ref()
                        .map_or(true, |condition| self.condition_applies(condition.as_str(), object_type));
                    if applies {
                        self.collect_into(object_type, &inline.selection_set, grouped, visited);
                    }
                }
            }
        }
    }

    /// Evaluates `@skip` and `@include`. Skip wins when both are present.
    fn should_include(&self, directives: &[Directive]) -> bool {
        let condition = |name: &str| {
            let directive = directives.iter().find(|d| d.name.as_str() == name)?;
            let definition = self.schema.directive(name)?;
            let args = coerce_argument_values(
                self.schema,
                &definition.arguments,
                &directive.arguments,
                self.variables,
            )
            .ok()?;
            args.get("if").and_then(Value::as_bool)
        };

        if condition("skip") == Some(true) {
            return false;
        }
        condition("include") != Some(false)
    }

    fn condition_applies(&self, condition: &str, object_type: &ObjectType) -> bool {
        if condition == object_type.name {
            return true;
        }
        match self.schema.get_type(condition) {
            Some(ty @ (TypeDef::Interface(_) | TypeDef::Union(_))) => {
                self.schema.is_possible_type(ty, &object_type.name)
            }
            _ => false,
        }
    }
}
