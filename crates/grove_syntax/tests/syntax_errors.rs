//! Syntax error messages for malformed requests.

use grove_syntax::parse;

fn error_text(source: &str) -> String {
    let err = parse(source).unwrap_err();
    format!("{}:{} {err}", err.location.line, err.location.column)
}

#[test]
fn unterminated_selection_set() {
    insta::assert_snapshot!(error_text("{ hero { name }"), @r###"1:16 Syntax Error: Expected Name, found <EOF>."###);
}

#[test]
fn missing_argument_value() {
    insta::assert_snapshot!(error_text("{ human(id: ) { name } }"), @r###"1:13 Syntax Error: Unexpected ")"."###);
}

#[test]
fn missing_colon_in_variable_definition() {
    insta::assert_snapshot!(error_text("query Q($id ID) { human(id: $id) { name } }"), @r###"1:13 Syntax Error: Expected ":", found Name "ID"."###);
}

#[test]
fn bad_character() {
    insta::assert_snapshot!(error_text("{ hero { name; } }"), @r###"1:14 Syntax Error: Unexpected character: ";"."###);
}

#[test]
fn number_followed_by_name() {
    insta::assert_snapshot!(error_text("{ f(a: 1x) }"), @r###"1:9 Syntax Error: Invalid number, expected digit but got: "x"."###);
}

#[test]
fn second_definition_is_checked() {
    insta::assert_snapshot!(error_text("{ a }\nfragment F Hero { name }"), @r###"2:12 Syntax Error: Expected "on", found Name "Hero"."###);
}

#[test]
fn valid_document_round_trips_structure() {
    let doc = parse(
        r#"
        # a comment
        query Hero($episode: Episode = EMPIRE) {
          hero(episode: $episode) {
            name,
            friends { name }
          }
        }
        "#,
    )
    .unwrap();
    assert_eq!(doc.definitions.len(), 1);
    let op = doc.operation("Hero").unwrap();
    assert_eq!(op.selection_set.selections.len(), 1);
}
