//! Integration tests for the FSM language server.
//!
//! These tests drive the language services through the bootstrap injector,
//! the way the server does.

use std::path::{Path, PathBuf};

use fsm_lsp::backend::LanguageServices;
use fsm_lsp::check::check_files;
use fsm_lsp::inject::Injector;
use fsm_lsp::language::{Generator, Parser, Severity, Validator};
use fsm_lsp::setup::{create_injector, StandaloneSetup};
use tower_lsp::lsp_types::Url;

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

fn read_fixture(name: &str) -> String {
    std::fs::read_to_string(fixture(name)).unwrap()
}

fn ide() -> Injector {
    create_injector().expect("bootstrap")
}

/// Test that the fixtures directory exists and contains expected files.
#[test]
fn test_fixtures_exist() {
    for name in ["valid.fsm", "invalid_syntax.fsm", "unreachable.fsm"] {
        assert!(fixture(name).exists(), "{name} fixture should exist");
    }
}

#[test]
fn test_invalid_fixture_produces_parse_error() {
    let parser = ide().resolve::<dyn Parser>().unwrap();
    let error = parser.parse(&read_fixture("invalid_syntax.fsm")).unwrap_err();

    assert!(error.line >= 4, "error is reported after the incomplete transition");
    assert!(!error.message.is_empty());
}

#[test]
fn test_valid_fixture_has_no_issues() {
    let injector = ide();
    let model = injector
        .resolve::<dyn Parser>()
        .unwrap()
        .parse(&read_fixture("valid.fsm"))
        .unwrap();

    assert_eq!(model.states.len(), 3);
    assert_eq!(model.transitions.len(), 4);
    assert!(injector
        .resolve::<dyn Validator>()
        .unwrap()
        .validate(&model)
        .is_empty());
}

#[test]
fn test_ide_validator_reports_unreachable_state() {
    let injector = ide();
    let model = injector
        .resolve::<dyn Parser>()
        .unwrap()
        .parse(&read_fixture("unreachable.fsm"))
        .unwrap();

    let issues = injector.resolve::<dyn Validator>().unwrap().validate(&model);
    assert_eq!(issues.len(), 1);
    assert_eq!(issues[0].code, "W001");
    assert_eq!(issues[0].severity, Severity::Warning);
    assert!(issues[0].message.contains("Attic"));
}

#[test]
fn test_standalone_validator_skips_ide_checks() {
    let injector = StandaloneSetup::create_injector().unwrap();
    let report = check_files(&injector, &[fixture("unreachable.fsm")]).unwrap();
    assert!(report.findings.is_empty());
}

#[test]
fn test_check_reports_syntax_error_location() {
    let injector = StandaloneSetup::create_injector().unwrap();
    let report = check_files(&injector, &[fixture("invalid_syntax.fsm")]).unwrap();

    assert!(report.has_errors());
    let line = report.findings[0].to_string();
    assert!(line.contains("invalid_syntax.fsm:"), "{line}");
    assert!(line.contains("error[E000]"), "{line}");
}

#[test]
fn test_generator_output_describes_fixture() {
    let injector = ide();
    let model = injector
        .resolve::<dyn Parser>()
        .unwrap()
        .parse(&read_fixture("valid.fsm"))
        .unwrap();

    let output = injector
        .resolve::<dyn Generator>()
        .unwrap()
        .generate(&model, false)
        .unwrap();
    let json: serde_json::Value = serde_json::from_str(&output).unwrap();

    assert_eq!(json["machine"], "Turnstile");
    assert_eq!(json["initial"], "Locked");
    assert_eq!(json["transitions"][0]["guard"], "coin accepted");
    assert!(json["transitions"][1].get("guard").is_none());
}

#[tokio::test]
async fn test_document_store_is_shared_by_services() {
    let injector = ide();
    let services = LanguageServices::resolve(&injector).unwrap();
    let uri = Url::parse("file:///turnstile.fsm").unwrap();

    services
        .documents
        .upsert(uri.clone(), read_fixture("valid.fsm"), 1)
        .await;

    // A second resolution sees the same singleton store.
    let again = LanguageServices::resolve(&injector).unwrap();
    let state = again.documents.get(&uri).await.expect("document stored");
    assert_eq!(state.version, 1);
    assert!(state.model().is_some());
}
