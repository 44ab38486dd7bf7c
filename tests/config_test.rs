use std::collections::HashMap;
use std::path::Path;

use llm_function::config::{require_var, DATA_PATH_VAR, MISTRAL_API_KEY_VAR, OPENAI_API_KEY_VAR};
use llm_function::{Config, LlmFunctionError};

fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let vars: HashMap<String, String> = vars
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |name| vars.get(name).cloned()
}

#[test]
fn cache_root_is_below_data_path() {
    let config = Config::from_lookup(lookup(&[(DATA_PATH_VAR, "/srv/data")])).unwrap();
    assert_eq!(config.data_path(), Path::new("/srv/data"));
    assert_eq!(config.cache_root(), Path::new("/srv/data/cache"));

    let store = config.cache_store("openai_chat_completions");
    assert_eq!(store.dir(), Path::new("/srv/data/cache/openai_chat_completions"));
}

#[test]
fn missing_data_path_names_the_variable() {
    let err = Config::from_lookup(lookup(&[])).unwrap_err();
    assert!(matches!(err, LlmFunctionError::MissingEnvVar(ref name) if name == "DATA_PATH"));
    assert_eq!(err.to_string(), "please set up the DATA_PATH env variable");
}

#[test]
fn empty_values_count_as_missing() {
    let err = Config::from_lookup(lookup(&[(DATA_PATH_VAR, "")])).unwrap_err();
    assert!(matches!(err, LlmFunctionError::MissingEnvVar(_)));

    let config = Config::from_lookup(lookup(&[
        (DATA_PATH_VAR, "/d"),
        (OPENAI_API_KEY_VAR, ""),
    ]))
    .unwrap();
    assert!(config.require_openai_api_key().is_err());
}

#[test]
fn api_keys_are_read_when_present() {
    let config = Config::from_lookup(lookup(&[
        (DATA_PATH_VAR, "/d"),
        (OPENAI_API_KEY_VAR, "sk-open"),
        (MISTRAL_API_KEY_VAR, "sk-mistral"),
    ]))
    .unwrap();
    assert_eq!(config.require_openai_api_key().unwrap(), "sk-open");
    assert_eq!(config.require_mistral_api_key().unwrap(), "sk-mistral");
}

#[test]
fn api_keys_are_checked_lazily() {
    let config = Config::from_lookup(lookup(&[(DATA_PATH_VAR, "/d")])).unwrap();
    let err = config.require_mistral_api_key().unwrap_err();
    assert_eq!(err.to_string(), "please set up the MISTRAL_API_KEY env variable");
}

#[test]
fn builder_sets_keys() {
    let config = Config::new("/d").openai_api_key("k1").mistral_api_key("k2");
    assert_eq!(config.require_openai_api_key().unwrap(), "k1");
    assert_eq!(config.require_mistral_api_key().unwrap(), "k2");
}

#[test]
fn require_var_reports_name() {
    let err = require_var(lookup(&[]), "SOME_VAR").unwrap_err();
    assert_eq!(err.to_string(), "please set up the SOME_VAR env variable");
    assert_eq!(require_var(lookup(&[("SOME_VAR", "x")]), "SOME_VAR").unwrap(), "x");
}
