use llm_function::{LlmFunctionError, PromptTemplate};
use serde_json::json;

#[test]
fn square_bracket_variables() {
    let template = PromptTemplate::from_source("Hello [[ name ]]!").unwrap();
    assert_eq!(template.render(json!({"name": "Ada"})).unwrap(), "Hello Ada!");
}

#[test]
fn square_bracket_blocks() {
    let template = PromptTemplate::from_source(
        "[% for item in items %]- [[ item ]]\n[% endfor %][% if urgent %]ASAP[% endif %]",
    )
    .unwrap();
    let rendered = template
        .render(json!({"items": ["a", "b"], "urgent": true}))
        .unwrap();
    assert_eq!(rendered, "- a\n- b\nASAP");
}

#[test]
fn curly_braces_are_literal_text() {
    // JSON examples inside prompts must survive untouched
    let template = PromptTemplate::from_source("Reply like {\"a\": {{ 1 }}} for [[ x ]]").unwrap();
    assert_eq!(
        template.render(json!({"x": "me"})).unwrap(),
        "Reply like {\"a\": {{ 1 }}} for me"
    );
}

#[test]
fn nested_values() {
    let template = PromptTemplate::from_source("[[ user.name ]] ([[ user.age ]])").unwrap();
    assert_eq!(
        template
            .render(json!({"user": {"name": "Ada", "age": 36}}))
            .unwrap(),
        "Ada (36)"
    );
}

#[test]
fn syntax_error_is_a_template_error() {
    let err = PromptTemplate::from_source("[% if x %]unterminated").unwrap_err();
    assert!(matches!(err, LlmFunctionError::Template(_)));
}

#[test]
fn load_from_file_keeps_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("t.md");
    std::fs::write(&path, "Hi [[ who ]]").unwrap();

    let template = PromptTemplate::load(&path).unwrap();
    assert_eq!(template.path(), Some(path.as_path()));
    assert_eq!(template.render(json!({"who": "you"})).unwrap(), "Hi you");
}

#[test]
fn missing_file_is_a_template_error() {
    let err = PromptTemplate::load("/nonexistent/prompt.md").unwrap_err();
    assert!(matches!(err, LlmFunctionError::Template(_)));
}
