mod common;

use std::sync::Arc;

use common::{import, proj_x, TaskSpecBuilder, LEARNER};
use learnpath::config::EngineSettings;
use learnpath::errors::LearnpathError;
use learnpath::store::TaskRecord;
use learnpath::types::TaskType;
use learnpath::validators::{
    AcceptValidator, ExactMatchValidator, NonEmptyValidator, RegexValidator, Validator,
    ValidatorRegistry, ValidatorSpec,
};
use learnpath_test_utils::engine_with;
use learnpath_test_utils::fake_validator::{AlwaysFail, AlwaysPass};

fn record(id: &str, task_type: TaskType, validator: Option<ValidatorSpec>) -> TaskRecord {
    TaskRecord {
        id: id.to_string(),
        parent_id: None,
        task_type,
        title: id.to_string(),
        description: None,
        acceptance_criteria: None,
        priority: 2,
        requires_submission: None,
        validator,
        created_at_ms: 0,
        updated_at_ms: 0,
        seq: 0,
    }
}

#[test]
fn builtin_validators() {
    let task = record("t", TaskType::Subtask, None);

    assert!(!NonEmptyValidator.validate(&task, " \n\t").passed);
    assert!(NonEmptyValidator.validate(&task, "x").passed);

    let regex = RegexValidator::new(r"(?i)^\s*select\b").unwrap();
    assert!(regex.validate(&task, "SELECT * FROM t").passed);
    let verdict = regex.validate(&task, "DELETE FROM t");
    assert!(!verdict.passed);
    assert!(verdict.message.contains("select"), "{}", verdict.message);

    let exact = ExactMatchValidator::new(" 42 ", false);
    assert!(exact.validate(&task, "42\n").passed);
    assert!(!exact.validate(&task, "43").passed);

    let loose = ExactMatchValidator::new("Paris", true);
    assert!(loose.validate(&task, "paris").passed);

    assert!(AcceptValidator.validate(&task, "").passed);
}

#[test]
fn bad_regexes_are_config_errors() {
    let result = RegexValidator::new("(unclosed");
    assert!(matches!(result, Err(LearnpathError::ConfigError(_))), "{result:?}");

    let spec = ValidatorSpec::Regex {
        pattern: "[".to_string(),
    };
    assert!(matches!(spec.check(), Err(LearnpathError::ConfigError(_))));
}

#[test]
fn resolution_prefers_task_then_type_then_fallback() {
    let mut registry = ValidatorRegistry::new();
    registry.register(TaskType::Subtask, Arc::new(AlwaysFail));

    let own = record("a", TaskType::Subtask, Some(ValidatorSpec::Accept));
    assert_eq!(registry.resolve(&own).unwrap().name(), "accept");

    let by_type = record("b", TaskType::Subtask, None);
    assert_eq!(registry.resolve(&by_type).unwrap().name(), "always_fail");

    let fallback = record("c", TaskType::Task, None);
    assert_eq!(registry.resolve(&fallback).unwrap().name(), "non_empty");

    registry.set_fallback(Arc::new(AlwaysPass));
    assert_eq!(registry.resolve(&fallback).unwrap().name(), "always_pass");
}

#[test]
fn specs_round_trip_through_their_tagged_form() {
    let spec: ValidatorSpec =
        serde_json::from_str(r#"{"kind":"exact","expected":"42"}"#).unwrap();
    assert_eq!(
        spec,
        ValidatorSpec::Exact {
            expected: "42".to_string(),
            ignore_case: false,
        }
    );

    let spec: ValidatorSpec = serde_json::from_str(r#"{"kind":"non_empty"}"#).unwrap();
    assert_eq!(spec.build().unwrap().name(), "non_empty");

    assert!(serde_json::from_str::<ValidatorSpec>(r#"{"kind":"llm"}"#).is_err());
}

#[test]
fn per_task_validators_override_the_registry() {
    let mut registry = ValidatorRegistry::new();
    registry.set_fallback(Arc::new(AlwaysFail));
    let engine = engine_with(EngineSettings::default(), registry);

    import(
        &engine,
        proj_x().with_task(
            TaskSpecBuilder::new("proj-x.1.3", TaskType::Task).validator(ValidatorSpec::Exact {
                expected: "yes".to_string(),
                ignore_case: false,
            }),
        ),
    );

    assert!(!engine.submit("proj-x.1.1", LEARNER, "yes").unwrap().validation_passed);
    assert!(engine.submit("proj-x.1.3", LEARNER, "yes").unwrap().validation_passed);
}
