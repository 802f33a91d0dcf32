//! Shared state and traversal for validation rules.

use super::ValidationOptions;
use crate::directives::DirectiveLocation;
use crate::schema::{FieldDefinition, Schema, TypeDef, TypeRef};
use grove_syntax::ast::{
    Directive, Document, Field, FragmentDefinition, FragmentSpread, InlineFragment, Name,
    OperationDefinition, Selection, SelectionSet, Value, VariableDefinition,
};
use rustc_hash::{FxHashMap, FxHashSet};

/// A node reached by [`ValidationContext::walk`], with the type information
/// known at that point.
#[derive(Clone, Copy)]
pub(crate) enum Node<'a> {
    Operation(&'a OperationDefinition),
    VariableDefinition(&'a OperationDefinition, &'a VariableDefinition),
    Fragment(&'a FragmentDefinition),
    /// `parent` is the enclosing composite type, when known.
    Field {
        parent: Option<&'a TypeDef>,
        def: Option<&'a FieldDefinition>,
        field: &'a Field,
    },
    FragmentSpread {
        parent: Option<&'a TypeDef>,
        spread: &'a FragmentSpread,
    },
    InlineFragment {
        parent: Option<&'a TypeDef>,
        inline: &'a InlineFragment,
    },
    /// Any selection set, with the composite type it selects from.
    SelectionSet {
        parent: Option<&'a TypeDef>,
        selection_set: &'a SelectionSet,
    },
    Directive {
        directive: &'a Directive,
        location: DirectiveLocation,
    },
}

/// A variable referenced somewhere inside an operation.
#[derive(Debug, Clone)]
pub(crate) struct VariableUsage<'a> {
    pub name: &'a Name,
    /// The input type expected at the usage site, when known.
    pub ty: Option<TypeRef>,
    /// Whether the argument or input field at the usage site has a default.
    pub has_location_default: bool,
}

/// Context handed to every rule.
pub struct ValidationContext<'a> {
    pub schema: &'a Schema,
    pub document: &'a Document,
    pub options: &'a ValidationOptions,
    fragments: FxHashMap<&'a str, &'a FragmentDefinition>,
}

impl<'a> ValidationContext<'a> {
    #[must_use]
    pub fn new(schema: &'a Schema, document: &'a Document, options: &'a ValidationOptions) -> Self {
        let mut fragments = FxHashMap::default();
        for fragment in document.fragments() {
            fragments.entry(fragment.name.as_str()).or_insert(fragment);
        }
        Self {
            schema,
            document,
            options,
            fragments,
        }
    }

    /// First fragment definition with the given name.
    #[must_use]
    pub fn fragment(&self, name: &str) -> Option<&'a FragmentDefinition> {
        self.fragments.get(name).copied()
    }

    /// A composite type by name.
    pub(crate) fn composite(&self, name: &str) -> Option<&'a TypeDef> {
        self.schema.get_type(name).filter(|ty| ty.is_composite())
    }

    /// Visits every definition of the document in order.
    ///
    /// Fragment spreads are reported but not followed; each fragment
    /// definition is visited once on its own.
    pub(crate) fn walk(&self, mut f: impl FnMut(Node<'a>)) {
        for definition in &self.document.definitions {
            match definition {
                grove_syntax::ast::Definition::Operation(op) => {
                    f(Node::Operation(op));
                    self.walk_directives(&op.directives, op.operation.into(), &mut f);
                    for variable in &op.variables {
                        f(Node::VariableDefinition(op, variable));
                        self.walk_directives(
                            &variable.directives,
                            DirectiveLocation::VariableDefinition,
                            &mut f,
                        );
                    }
                    let root = self
                        .schema
                        .root_type(op.operation)
                        .and_then(|root| self.schema.get_type(&root.name));
                    self.walk_selection_set(root, &op.selection_set, &mut f);
                }
                grove_syntax::ast::Definition::Fragment(fragment) => {
                    f(Node::Fragment(fragment));
                    self.walk_directives(
                        &fragment.directives,
                        DirectiveLocation::FragmentDefinition,
                        &mut f,
                    );
                    let parent = self.composite(fragment.type_condition.as_str());
                    self.walk_selection_set(parent, &fragment.selection_set, &mut f);
                }
            }
        }
    }

    fn walk_directives(
        &self,
        directives: &'a [Directive],
        location: DirectiveLocation,
        f: &mut impl FnMut(Node<'a>),
    ) {
        for directive in directives {
            f(Node::Directive {
                directive,
                location,
            });
        }
    }

    fn walk_selection_set(
        &self,
        parent: Option<&'a TypeDef>,
        selection_set: &'a SelectionSet,
        f: &mut impl FnMut(Node<'a>),
    ) {
        f(Node::SelectionSet {
            parent,
            selection_set,
        });
        for selection in selection_set {
            match selection {
                Selection::Field(field) => {
                    let def = parent.and_then(|p| self.schema.field_def(p, field.name.as_str()));
                    f(Node::Field { parent, def, field });
                    self.walk_directives(&field.directives, DirectiveLocation::Field, f);
                    if let Some(child_set) = &field.selection_set {
                        let child = def.and_then(|def| self.composite(def.ty.named_type()));
                        self.walk_selection_set(child, child_set, f);
                    }
                }
                Selection::FragmentSpread(spread) => {
                    f(Node::FragmentSpread { parent, spread });
                    self.walk_directives(&spread.directives, DirectiveLocation::FragmentSpread, f);
                }
                Selection::InlineFragment(inline) => {
                    f(Node::InlineFragment { parent, inline });
                    self.walk_directives(&inline.directives, DirectiveLocation::InlineFragment, f);
                    let child = match &inline.type_condition {
                        Some(condition) => self.composite(condition.as_str()),
                        None => parent,
                    };
                    self.walk_selection_set(child, &inline.selection_set, f);
                }
            }
        }
    }

    /// Every fragment reachable from `selection_set`, each reported once.
    pub(crate) fn recursive_fragments(&self, selection_set: &'a SelectionSet) -> Vec<&'a FragmentDefinition> {
        let mut visited = FxHashSet::default();
        let mut found = Vec::new();
        let mut stack = vec![selection_set];
        while let Some(set) = stack.pop() {
            for selection in set {
                match selection {
                    Selection::Field(field) => stack.extend(field.selection_set.as_ref()),
                    Selection::InlineFragment(inline) => stack.push(&inline.selection_set),
                    Selection::FragmentSpread(spread) => {
                        if visited.insert(spread.name.as_str()) {
                            if let Some(fragment) = self.fragment(spread.name.as_str()) {
                                found.push(fragment);
                                stack.push(&fragment.selection_set);
                            }
                        }
                    }
                }
            }
        }
        found
    }

    /// Every variable referenced by an operation, including through fragments.
    pub(crate) fn variable_usages(&self, operation: &'a OperationDefinition) -> Vec<VariableUsage<'a>> {
        let mut usages = Vec::new();
        let mut visited = FxHashSet::default();
        self.directive_usages(&operation.directives, &mut usages);
        let root = self
            .schema
            .root_type(operation.operation)
            .and_then(|root| self.schema.get_type(&root.name));
        self.selection_usages(root, &operation.selection_set, &mut visited, &mut usages);
        usages
    }

    fn selection_usages(
        &self,
        parent: Option<&'a TypeDef>,
        selection_set: &'a SelectionSet,
        visited: &mut FxHashSet<&'a str>,
        usages: &mut Vec<VariableUsage<'a>>,
    ) {
        for selection in selection_set {
            self.directive_usages(selection.directives(), usages);
            match selection {
                Selection::Field(field) => {
                    let def = parent.and_then(|p| self.schema.field_def(p, field.name.as_str()));
                    for argument in &field.arguments {
                        let expected = def.and_then(|def| def.arguments.get(argument.name.as_str()));
                        self.value_usages(
                            &argument.value,
                            expected.map(|arg| &arg.ty),
                            expected.is_some_and(|arg| arg.default_value.is_some()),
                            usages,
                        );
                    }
                    if let Some(child_set) = &field.selection_set {
                        let child = def.and_then(|def| self.composite(def.ty.named_type()));
                        self.selection_usages(child, child_set, visited, usages);
                    }
                }
                Selection::FragmentSpread(spread) => {
                    if !visited.insert(spread.name.as_str()) {
                        continue;
                    }
                    if let Some(fragment) = self.fragment(spread.name.as_str()) {
                        self.directive_usages(&fragment.directives, usages);
                        let child = self.composite(fragment.type_condition.as_str());
                        self.selection_usages(child, &fragment.selection_set, visited, usages);
                    }
                }
                Selection::InlineFragment(inline) => {
                    let child = match &inline.type_condition {
                        Some(condition) => self.composite(condition.as_str()),
                        None => parent,
                    };
                    self.selection_usages(child, &inline.selection_set, visited, usages);
                }
            }
        }
    }

    fn directive_usages(&self, directives: &'a [Directive], usages: &mut Vec<VariableUsage<'a>>) {
        for directive in directives {
            let def = self.schema.directive(directive.name.as_str());
            for argument in &directive.arguments {
                let expected = def.and_then(|def| def.arguments.get(argument.name.as_str()));
                self.value_usages(
                    &argument.value,
                    expected.map(|arg| &arg.ty),
                    expected.is_some_and(|arg| arg.default_value.is_some()),
                    usages,
                );
            }
        }
    }

    fn value_usages(
        &self,
        value: &'a Value,
        expected: Option<&TypeRef>,
        has_location_default: bool,
        usages: &mut Vec<VariableUsage<'a>>,
    ) {
        match value {
            Value::Variable(name) => usages.push(VariableUsage {
                name,
                ty: expected.cloned(),
                has_location_default,
            }),
            Value::List(items, _) => {
                let item_type = match expected.map(TypeRef::nullable) {
                    Some(TypeRef::List(inner)) => Some(&**inner),
                    _ => None,
                };
                for item in items {
                    self.value_usages(item, item_type, false, usages);
                }
            }
            Value::Object(fields, _) => {
                let input = match expected.and_then(|ty| self.schema.get_type(ty.named_type())) {
                    Some(TypeDef::InputObject(input)) => Some(input),
                    _ => None,
                };
                for (name, value) in fields {
                    let field = input.and_then(|input| input.fields.get(name.as_str()));
                    self.value_usages(
                        value,
                        field.map(|field| &field.ty),
                        field.is_some_and(|field| field.default_value.is_some()),
                        usages,
                    );
                }
            }
            _ => {}
        }
    }

    /// Deepest field nesting below `selection_set`, following fragments.
    pub(crate) fn depth(&self, selection_set: &'a SelectionSet, stack: &mut Vec<&'a str>) -> usize {
        selection_set
            .iter()
            .map(|selection| match selection {
                Selection::Field(field) => {
                    1 + field
                        .selection_set
                        .as_ref()
                        .map_or(0, |set| self.depth(set, stack))
                }
                Selection::InlineFragment(inline) => self.depth(&inline.selection_set, stack),
                Selection::FragmentSpread(spread) => {
                    let name = spread.name.as_str();
                    match self.fragment(name) {
                        Some(fragment) if !stack.contains(&name) => {
                            stack.push(name);
                            let depth = self.depth(&fragment.selection_set, stack);
                            stack.pop();
                            depth
                        }
                        _ => 0,
                    }
                }
            })
            .max()
            .unwrap_or(0)
    }
}
