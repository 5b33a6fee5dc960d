use crate::matrix::{instantiate, Instance, TestCase, SUITE_NAME};
use crate::report::{CaseReport, SuiteReport};
use crate::verifier::{Verifier, VerifyOptions};
use globset::{Glob, GlobSet, GlobSetBuilder};
use log::{error, info};
use std::time::Instant;

/// Selects cases by id, gtest style: `POS[:POS...][-NEG[:NEG...]]`
///
/// Patterns use `*` and `?` wildcards and match the whole id. An empty
/// positive part selects every case.
#[derive(Debug, Clone)]
pub struct CaseFilter {
    positive: Option<GlobSet>,
    negative: Option<GlobSet>,
}

impl CaseFilter {
    /// Filter accepting every case
    pub fn all() -> Self {
        Self {
            positive: None,
            negative: None,
        }
    }

    pub fn parse(filter: &str) -> Result<Self, globset::Error> {
        let (positive, negative) = match filter.split_once('-') {
            Some((pos, neg)) => (pos, Some(neg)),
            None => (filter, None),
        };
        Ok(Self {
            positive: build_set(positive)?,
            negative: negative.map(build_set).transpose()?.flatten(),
        })
    }

    pub fn matches(&self, id: &str) -> bool {
        let selected = self.positive.as_ref().map_or(true, |set| set.is_match(id));
        let excluded = self.negative.as_ref().is_some_and(|set| set.is_match(id));
        selected && !excluded
    }
}

impl Default for CaseFilter {
    fn default() -> Self {
        Self::all()
    }
}

fn build_set(patterns: &str) -> Result<Option<GlobSet>, globset::Error> {
    let patterns: Vec<&str> = patterns
        .split(':')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect();
    if patterns.is_empty() {
        return Ok(None);
    }
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern)?);
    }
    Ok(Some(builder.build()?))
}

/// A full conformance run over a set of discovered instances
pub struct Suite {
    instance_count: usize,
    cases: Vec<TestCase>,
    verifier: Verifier,
    filter: CaseFilter,
}

impl Suite {
    pub fn new(instances: &[Instance], options: VerifyOptions) -> Self {
        Self {
            instance_count: instances.len(),
            cases: instantiate(instances),
            verifier: Verifier::new(options),
            filter: CaseFilter::all(),
        }
    }

    pub fn with_filter(mut self, filter: CaseFilter) -> Self {
        self.filter = filter;
        self
    }

    /// All instantiated cases, filtered or not
    pub fn cases(&self) -> &[TestCase] {
        &self.cases
    }

    /// Cases the filter selects, in run order
    pub fn selected(&self) -> impl Iterator<Item = &TestCase> {
        self.cases
            .iter()
            .filter(move |case| self.filter.matches(&case.id()))
    }

    /// Run every selected case, one at a time
    ///
    /// A failing case never stops the run.
    pub fn run(&self) -> SuiteReport {
        let selected: Vec<&TestCase> = self.selected().collect();
        let skipped = self.cases.len() - selected.len();
        let mut report = SuiteReport::new(SUITE_NAME, self.instance_count, skipped);

        if self.instance_count == 0 {
            info!("No implementations discovered; nothing to verify");
            return report;
        }
        info!(
            "Running {} of {} case(s) over {} instance(s)",
            selected.len(),
            self.cases.len(),
            self.instance_count
        );

        for case in selected {
            let id = case.id();
            let start = Instant::now();
            let verification = self.verifier.verify(case);
            let duration_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);

            match &verification.outcome {
                Ok(()) => info!("[ OK ] {} ({} ms)", id, duration_ms),
                Err(e) => error!("[FAIL] {}: {}", id, e),
            }
            report.push(CaseReport::new(case, verification, duration_ms));
        }

        info!("{}", report.summary());
        report
    }
}
