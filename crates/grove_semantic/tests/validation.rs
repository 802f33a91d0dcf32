//! Validation messages for invalid request documents.

use grove_semantic::{
    validate, EnumType, FieldDefinition, InputValueDef, InterfaceType, ObjectType, Schema,
    SchemaBuilder, TypeRef, UnionType, ValidationOptions,
};
use grove_syntax::parse;

fn named(name: &str) -> TypeRef {
    TypeRef::named(name)
}

fn character_fields() -> Vec<FieldDefinition> {
    vec![
        FieldDefinition::new("id", TypeRef::non_null(named("ID"))),
        FieldDefinition::new("name", named("String")),
        FieldDefinition::new("friends", TypeRef::list(named("Character"))),
    ]
}

fn schema() -> Schema {
    let id_arg = || InputValueDef::new("id", TypeRef::non_null(named("ID")));
    SchemaBuilder::new()
        .query(
            ObjectType::new("Query")
                .field(
                    FieldDefinition::new("hero", named("Character"))
                        .argument(InputValueDef::new("episode", named("Episode"))),
                )
                .field(FieldDefinition::new("human", named("Human")).argument(id_arg()))
                .field(FieldDefinition::new("droid", named("Droid")).argument(id_arg()))
                .field(
                    FieldDefinition::new("search", TypeRef::list(named("SearchResult")))
                        .argument(InputValueDef::new("text", TypeRef::non_null(named("String")))),
                ),
        )
        .subscription(
            ObjectType::new("Subscription")
                .field(FieldDefinition::new("heroChanged", named("Character")))
                .field(FieldDefinition::new("reviewAdded", named("String"))),
        )
        .register(EnumType::new("Episode").value("NEWHOPE").value("EMPIRE").value("JEDI"))
        .register(InterfaceType::new("Character").fields_with(character_fields))
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
        .register(UnionType::new("SearchResult").member("Human").member("Droid"))
        .build()
        .unwrap()
}

fn messages_with(source: &str, options: &ValidationOptions) -> String {
    let document = parse(source).unwrap();
    validate(&schema(), &document, options)
        .iter()
        .map(|d| d.title.clone())
        .collect::<Vec<_>>()
        .join("\n")
}

fn messages(source: &str) -> String {
    messages_with(source, &ValidationOptions::default())
}

#[test]
fn valid_documents_have_no_findings() {
    assert_eq!(
        messages(
            r#"
            query Hero($episode: Episode = JEDI, $id: ID = "1000") {
              hero(episode: $episode) { __typename id name ...Names }
              luke: human(id: $id) { homePlanet }
              leia: human(id: "1003") { name }
              search(text: "r2") { ... on Droid { primaryFunction } }
            }
            fragment Names on Character { friends { name } }
            "#
        ),
        ""
    );
}

#[test]
fn unknown_field() {
    insta::assert_snapshot!(messages("{ hero { nme } }"), @r###"Cannot query field "nme" on type "Character"."###);
}

#[test]
fn leaf_and_composite_selections() {
    insta::assert_snapshot!(messages("{ hero }"), @r###"Field "hero" of type "Character" must have a selection of subfields. Did you mean "hero { ... }"?"###);
    insta::assert_snapshot!(messages("{ hero { name { first } } }"), @r###"Field "name" must not have a selection since type "String" has no subfields."###);
}

#[test]
fn fragment_rules() {
    insta::assert_snapshot!(
        messages("{ hero { ...Missing } } fragment A on Character { ...B } fragment B on Character { ...A }"),
        @r###"
    Unknown fragment "Missing".
    Fragment "A" is never used.
    Fragment "B" is never used.
    Cannot spread fragment "A" within itself via "B".
    "###
    );
}

#[test]
fn fragment_type_conditions() {
    insta::assert_snapshot!(
        messages("{ hero { ...F } } fragment F on Strin { x }"),
        @r###"Unknown type "Strin"."###
    );
    insta::assert_snapshot!(
        messages("{ hero { ...F } } fragment F on Episode { x }"),
        @r###"Fragment "F" cannot condition on non composite type "Episode"."###
    );
    insta::assert_snapshot!(
        messages(r#"{ droid(id: "1") { ... on Human { name } } hero { ... on Human { homePlanet } } }"#),
        @r###"Fragment cannot be spread here as objects of type "Droid" can never be of type "Human"."###
    );
}

#[test]
fn variable_rules() {
    insta::assert_snapshot!(
        messages("query Q($a: Int, $b: String) { human(id: $a) { name } hero(episode: $c) { name } }"),
        @r###"
    Variable "$c" is not defined by operation "Q".
    Variable "$b" is never used in operation "Q".
    Variable "$a" of type "Int" used in position expecting type "ID!".
    "###
    );
    insta::assert_snapshot!(
        messages("query ($c: Character) { hero { name } }"),
        @r###"
    Variable "$c" cannot be non-input type "Character".
    Variable "$c" is never used.
    "###
    );
}

#[test]
fn variable_default_values_are_checked() {
    insta::assert_snapshot!(
        messages("query ($e: Episode = 4) { hero(episode: $e) { name } }"),
        @r###"Expected value of type "Episode", found 4; Enum "Episode" cannot represent non-enum value: 4."###
    );
}

#[test]
fn argument_rules() {
    insta::assert_snapshot!(
        messages(r#"{ human { name } droid(id: "1", id: "2", foo: 1) { name } hero(episode: SITH) { name } }"#),
        @r###"
    Unknown argument "foo" on field "Query.droid".
    There can be only one argument named "id".
    Expected value of type "Episode", found SITH; Value "SITH" does not exist in "Episode" enum.
    Field "human" argument "id" of type "ID!" is required, but it was not provided.
    "###
    );
}

#[test]
fn directive_rules() {
    insta::assert_snapshot!(
        messages("{ hero @skip(if: true) @skip(if: false) @unknown { name @include } }"),
        @r###"
    Unknown directive "@unknown".
    The directive "@skip" can only be used once at this location.
    Directive "@include" argument "if" of type "Boolean!" is required, but it was not provided.
    "###
    );
    insta::assert_snapshot!(
        messages("query @include(if: true) { hero { name } }"),
        @r###"Directive "@include" may not be used on QUERY."###
    );
}

#[test]
fn operation_rules() {
    insta::assert_snapshot!(
        messages("query A { hero { name } } query A { hero { id } } { hero { name } }"),
        @r###"
    There can be only one operation named "A".
    This anonymous operation must be the only defined operation.
    "###
    );
    insta::assert_snapshot!(
        messages("mutation { hero { name } }"),
        @r###"Schema is not configured to execute mutation operation."###
    );
    insta::assert_snapshot!(
        messages("subscription { reviewAdded heroChanged { name } }"),
        @r###"Anonymous Subscription must select only one top level field."###
    );
}

#[test]
fn overlapping_fields() {
    insta::assert_snapshot!(
        messages("{ hero { name: id name } }"),
        @r###"Fields "name" conflict because "id" and "name" are different fields. Use different aliases on the fields to fetch both if this was intentional."###
    );
    insta::assert_snapshot!(
        messages(r#"{ human(id: "1") { name } human(id: "2") { name } }"#),
        @r###"Fields "human" conflict because they have differing arguments. Use different aliases on the fields to fetch both if this was intentional."###
    );
    assert_eq!(
        messages("{ hero { ... on Human { x: homePlanet } ... on Droid { x: primaryFunction } } }"),
        ""
    );
}

#[test]
fn overlapping_fields_merge_sub_selections() {
    insta::assert_snapshot!(
        messages("{ hero { x: name } hero { x: id } }"),
        @r###"Fields "hero" conflict because subfields "x" conflict because "name" and "id" are different fields. Use different aliases on the fields to fetch both if this was intentional."###
    );
    insta::assert_snapshot!(
        messages("{ hero { ...A } hero { friends { name: id } } } fragment A on Character { friends { name } }"),
        @r###"Fields "hero" conflict because subfields "friends" conflict because subfields "name" conflict because "name" and "id" are different fields. Use different aliases on the fields to fetch both if this was intentional."###
    );
    assert_eq!(messages("{ hero { name } hero { id friends { name } } }"), "");
}

#[test]
fn overlapping_fields_compare_return_types() {
    insta::assert_snapshot!(
        messages("{ hero { ... on Human { x: homePlanet } ... on Droid { x: friends { name } } } }"),
        @r###"Fields "x" conflict because they return conflicting types "String" and "[Character]". Use different aliases on the fields to fetch both if this was intentional."###
    );
    insta::assert_snapshot!(
        messages("{ hero { ... on Human { x: homePlanet } ... on Droid { x: id } } }"),
        @r###"Fields "x" conflict because they return conflicting types "String" and "ID!". Use different aliases on the fields to fetch both if this was intentional."###
    );
}

#[test]
fn max_depth() {
    let options = ValidationOptions::default().with_max_depth(2);
    insta::assert_snapshot!(
        messages_with("{ hero { friends { name } } }", &options),
        @r###"Query depth 3 exceeds maximum allowed depth of 2."###
    );
    assert_eq!(messages_with("{ hero { name } }", &options), "");
}

#[test]
fn sequential_and_parallel_validation_agree() {
    let source = r#"
        query Q($a: Int) { hero { nme ...Missing } human(id: $a) { name } }
        fragment Unused on Droid { primaryFunction }
    "#;
    let parallel = messages_with(source, &ValidationOptions::default());
    let sequential = messages_with(source, &ValidationOptions::default().with_parallel(false));
    assert_eq!(parallel, sequential);
    assert_eq!(parallel.lines().count(), 4);
}
