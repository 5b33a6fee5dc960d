use crate::error::FailureKind;
use crate::matrix::{CaseKind, TestCase};
use crate::verifier::{Phase, Verification};
use effect_backend::VolumeParam;
use serde::Serialize;
use std::fs::File;
use std::io::{self, BufWriter};
use std::path::Path;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Passed,
    Failed,
}

/// Outcome of one case
#[derive(Debug, Clone, Serialize)]
pub struct CaseReport {
    pub id: String,
    pub implementor: String,
    pub name: String,
    pub uuid: Uuid,
    pub kind: CaseKind,
    pub param: VolumeParam,
    pub verdict: Verdict,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<FailureKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diagnostic: Option<String>,
    pub phases: Vec<Phase>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub teardown_warnings: Vec<String>,
    pub duration_ms: u64,
}

impl CaseReport {
    pub fn new(case: &TestCase, verification: Verification, duration_ms: u64) -> Self {
        let common = &case.instance().descriptor.common;
        let (verdict, failure, diagnostic) = match &verification.outcome {
            Ok(()) => (Verdict::Passed, None, None),
            Err(e) => (Verdict::Failed, Some(e.kind()), Some(e.to_string())),
        };
        Self {
            id: case.id(),
            implementor: common.implementor.clone(),
            name: common.name.clone(),
            uuid: common.id.uuid,
            kind: case.kind(),
            param: case.param(),
            verdict,
            failure,
            diagnostic,
            phases: verification.phases,
            teardown_warnings: verification.teardown_warnings,
            duration_ms,
        }
    }

    pub fn passed(&self) -> bool {
        self.verdict == Verdict::Passed
    }
}

/// Outcome of a whole run
#[derive(Debug, Clone, Serialize)]
pub struct SuiteReport {
    pub suite: String,
    /// Number of discovered instances the cases were built from
    pub instances: usize,
    pub passed: usize,
    pub failed: usize,
    /// Cases excluded by the filter
    pub skipped: usize,
    pub cases: Vec<CaseReport>,
}

impl SuiteReport {
    pub fn new(suite: impl Into<String>, instances: usize, skipped: usize) -> Self {
        Self {
            suite: suite.into(),
            instances,
            passed: 0,
            failed: 0,
            skipped,
            cases: Vec::new(),
        }
    }

    pub fn push(&mut self, case: CaseReport) {
        if case.passed() {
            self.passed += 1;
        } else {
            self.failed += 1;
        }
        self.cases.push(case);
    }

    /// True when no case failed, including when none ran
    pub fn success(&self) -> bool {
        self.failed == 0
    }

    pub fn failures(&self) -> impl Iterator<Item = &CaseReport> {
        self.cases.iter().filter(|case| !case.passed())
    }

    /// One-line summary
    pub fn summary(&self) -> String {
        if self.cases.is_empty() && self.instances == 0 {
            return format!(
                "{}: no implementations discovered, 0 cases run",
                self.suite
            );
        }
        format!(
            "{}: {} passed, {} failed, {} skipped ({} instance(s))",
            self.suite, self.passed, self.failed, self.skipped, self.instances
        )
    }

    /// Write the report as pretty-printed JSON
    pub fn write_json(&self, path: &Path) -> io::Result<()> {
        let writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{CaseError, Step};
    use crate::matrix::Instance;
    use effect_backend::{Descriptor, LocalFactory, TransportError};
    use std::sync::Arc;
    use std::time::Duration;

    fn case(kind: CaseKind) -> TestCase {
        let factory = Arc::new(LocalFactory::new("test", Duration::from_millis(100)));
        let instance = Instance::new(factory, Descriptor::volume(Uuid::nil(), "Vol", "Test", 0));
        TestCase::new(instance, kind, -100, true)
    }

    fn verification(outcome: Result<(), CaseError>) -> Verification {
        Verification {
            phases: vec![Phase::Done],
            outcome,
            teardown_warnings: Vec::new(),
        }
    }

    #[test]
    fn test_counts_and_success() {
        let mut report = SuiteReport::new("VolumeTest/VolumeParamTest", 1, 3);
        report.push(CaseReport::new(&case(CaseKind::SetAndGetLevel), verification(Ok(())), 2));
        assert!(report.success());

        let err = CaseError::unreachable(Step::Set)(TransportError::Disconnected);
        report.push(CaseReport::new(&case(CaseKind::SetAndGetMute), verification(Err(err)), 5));
        assert!(!report.success());
        assert_eq!((report.passed, report.failed, report.skipped), (1, 1, 3));

        let failed: Vec<_> = report.failures().collect();
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].failure, Some(FailureKind::UnreachableImplementation));
        assert_eq!(failed[0].param, VolumeParam::Mute(true));
        assert!(failed[0].diagnostic.as_deref().unwrap().contains("setParameter"));
        assert_eq!(
            report.summary(),
            "VolumeTest/VolumeParamTest: 1 passed, 1 failed, 3 skipped (1 instance(s))"
        );
    }

    #[test]
    fn test_empty_run_summary() {
        let report = SuiteReport::new("VolumeTest/VolumeParamTest", 0, 0);
        assert!(report.success());
        assert_eq!(
            report.summary(),
            "VolumeTest/VolumeParamTest: no implementations discovered, 0 cases run"
        );
    }

    #[test]
    fn test_json_omits_empty_fields() {
        let report = CaseReport::new(&case(CaseKind::SetAndGetLevel), verification(Ok(())), 1);
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["verdict"], "passed");
        assert_eq!(json["kind"], "SetAndGetLevel");
        assert!(json.get("failure").is_none());
        assert!(json.get("teardown_warnings").is_none());
        assert_eq!(json["phases"][0]["phase"], "done");
    }

    #[test]
    fn test_write_json() {
        let mut report = SuiteReport::new("VolumeTest/VolumeParamTest", 1, 0);
        report.push(CaseReport::new(&case(CaseKind::SetAndGetMute), verification(Ok(())), 1));

        let path = std::env::temp_dir().join(format!("volume-report-{}.json", Uuid::new_v4()));
        report.write_json(&path).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["passed"], 1);
        assert_eq!(value["cases"].as_array().unwrap().len(), 1);
    }
}
