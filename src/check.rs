//! Batch validation for the `check` subcommand.

use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::Context;

use crate::inject::Injector;
use crate::line_index::LineIndex;
use crate::language::{Parser, Severity, Validator};

/// One problem found in one file.
#[derive(Debug, Clone)]
pub struct Finding {
    pub path: PathBuf,
    pub line: u32,
    pub column: u32,
    pub severity: Severity,
    pub code: String,
    pub message: String,
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let severity = match self.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
        };
        write!(
            f,
            "{}:{}:{} {}[{}] {}",
            self.path.display(),
            self.line,
            self.column,
            severity,
            self.code,
            self.message
        )
    }
}

#[derive(Debug, Default)]
pub struct CheckReport {
    pub files: usize,
    pub findings: Vec<Finding>,
}

impl CheckReport {
    pub fn error_count(&self) -> usize {
        self.findings
            .iter()
            .filter(|f| f.severity == Severity::Error)
            .count()
    }

    pub fn has_errors(&self) -> bool {
        self.error_count() > 0
    }
}

/// Parses and validates every file in `paths`.
///
/// Unreadable files abort the run; syntax and validation problems are
/// collected into the report.
pub fn check_files(injector: &Injector, paths: &[PathBuf]) -> anyhow::Result<CheckReport> {
    let parser = injector.resolve::<dyn Parser>()?;
    let validator = injector.resolve::<dyn Validator>()?;

    let mut report = CheckReport::default();
    for path in paths {
        let source = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        report.files += 1;
        report
            .findings
            .extend(check_source(parser.as_ref(), validator.as_ref(), path, &source));
    }
    log::info!(
        "Checked {} file(s): {} finding(s)",
        report.files,
        report.findings.len()
    );
    Ok(report)
}

fn check_source(
    parser: &dyn Parser,
    validator: &dyn Validator,
    path: &Path,
    source: &str,
) -> Vec<Finding> {
    let model = match parser.parse(source) {
        Ok(model) => model,
        Err(error) => {
            return vec![Finding {
                path: path.to_path_buf(),
                line: error.line as u32,
                column: error.column as u32,
                severity: Severity::Error,
                code: crate::diagnostics::SYNTAX_ERROR_CODE.to_string(),
                message: error.message,
            }]
        }
    };

    let line_index = LineIndex::new(source);
    validator
        .validate(&model)
        .into_iter()
        .map(|issue| {
            let position = line_index.position_of(issue.range.start);
            Finding {
                path: path.to_path_buf(),
                line: position.line + 1,
                column: position.character + 1,
                severity: issue.severity,
                code: issue.code.to_string(),
                message: issue.message,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::setup::StandaloneSetup;
    use std::io::Write;

    fn write_file(dir: &tempfile::TempDir, name: &str, text: &str) -> PathBuf {
        let path = dir.path().join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(text.as_bytes()).unwrap();
        path
    }

    #[test]
    fn reports_validation_errors_with_positions() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            &dir,
            "bad.fsm",
            "machine M\nstate A initial\ntransition go from A to Missing\n",
        );

        let injector = StandaloneSetup::create_injector().unwrap();
        let report = check_files(&injector, &[path]).unwrap();

        assert_eq!(report.files, 1);
        assert!(report.has_errors());
        let rendered = report.findings[0].to_string();
        assert!(rendered.contains(":3:"), "{rendered}");
        assert!(rendered.contains("error["), "{rendered}");
    }

    #[test]
    fn syntax_error_is_a_single_finding() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "broken.fsm", "state\n");

        let injector = StandaloneSetup::create_injector().unwrap();
        let report = check_files(&injector, &[path]).unwrap();

        assert_eq!(report.findings.len(), 1);
        assert_eq!(report.findings[0].code, "E000");
    }

    #[test]
    fn clean_file_has_no_findings() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            &dir,
            "ok.fsm",
            "machine M\nstate A initial\nstate B\ntransition go from A to B\n",
        );

        let injector = StandaloneSetup::create_injector().unwrap();
        let report = check_files(&injector, &[path]).unwrap();
        assert!(report.findings.is_empty());
    }

    #[test]
    fn missing_file_aborts() {
        let injector = StandaloneSetup::create_injector().unwrap();
        let err = check_files(&injector, &[PathBuf::from("/nonexistent/x.fsm")]).unwrap_err();
        assert!(err.to_string().contains("failed to read"));
    }
}
