//! Golden-file harness
//!
//! Binds fixture discovery, a [`Pipeline`] and the baseline store into
//! repeatable cases. Every fixture yields three independent cases, one per
//! [`Stage`]:
//!
//! - lex: the token dump, one token per line
//! - parse: the printed syntax tree
//! - result: the rendered output
//!
//! Each case reads the source again and runs the pipeline from scratch, so a
//! failure in one stage never leaks into another.

mod report;

pub use report::{CaseReport, CaseStatus, RunReport, RunSummary};

use std::any::Any;
use std::fs;
use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;
use std::time::Instant;

use similar::TextDiff;

use crate::config::HarnessConfig;
use crate::discovery::{discover_fixtures, Fixture};
use crate::error::{HarnessError, Result};
use crate::golden::{Baseline, BaselineState, GoldenStore, Stage};
use crate::pipeline::{Pipeline, PipelineError};
use crate::printer::{TreePrinter, LINE_ENDING};

/// Regression harness over a pipeline
pub struct Harness<P: Pipeline> {
    pipeline: P,
    config: HarnessConfig,
    store: GoldenStore,
    printer: TreePrinter,
}

impl<P: Pipeline> Harness<P> {
    /// Create a harness.
    ///
    /// Fails if the configuration is invalid or the base directory cannot be
    /// read. A missing fixture directory is not an error; it just has no
    /// fixtures.
    pub fn new(pipeline: P, config: HarnessConfig) -> Result<Self> {
        config.validate()?;
        fs::read_dir(&config.base_dir).map_err(|source| HarnessError::BaseDir {
            path: config.base_dir.clone(),
            source,
        })?;

        let store = GoldenStore::new(&config.base_dir, &config.expected_dir);
        let printer = TreePrinter::with_config(config.print_config());
        Ok(Self {
            pipeline,
            config,
            store,
            printer,
        })
    }

    /// Create a harness configured from `base_dir/snippets.toml`, or the
    /// defaults if there is no such file
    pub fn for_base_dir(pipeline: P, base_dir: impl Into<PathBuf>) -> Result<Self> {
        Self::new(pipeline, HarnessConfig::for_base_dir(base_dir)?)
    }

    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    pub fn pipeline(&self) -> &P {
        &self.pipeline
    }

    pub fn store(&self) -> &GoldenStore {
        &self.store
    }

    /// All fixtures, sorted by name
    pub fn fixtures(&self) -> Result<Vec<Fixture>> {
        Ok(discover_fixtures(&self.config)?)
    }

    /// Look up a fixture by name, trying each configured extension in turn
    pub fn fixture(&self, name: &str) -> Result<Fixture> {
        let root = self.config.data_root();
        self.config
            .extensions
            .iter()
            .map(|ext| root.join(format!("{}.{}", name, ext.trim_start_matches('.'))))
            .find(|path| path.is_file())
            .map(|source| Fixture::new(name, source, &self.store))
            .ok_or_else(|| HarnessError::MissingFixture(name.to_string()))
    }

    /// Read a fixture's source text
    pub fn read_source(&self, fixture: &Fixture) -> Result<String> {
        fs::read_to_string(&fixture.source).map_err(|source| HarnessError::Source {
            path: fixture.source.clone(),
            source,
        })
    }

    /// Recorded baseline for a case, without seeding
    pub fn expected(&self, fixture: &Fixture, stage: Stage) -> Result<Option<String>> {
        Ok(self.store.read(stage, &fixture.name)?)
    }

    /// Token dump: each token's display form on its own line.
    ///
    /// Hidden-channel tokens are included only when `hidden_tokens` is set.
    pub fn lex_source(&self, source: &str) -> std::result::Result<String, PipelineError> {
        let tokens = self.pipeline.tokenize(source)?;
        let mut dump = String::new();
        for token in tokens
            .iter()
            .filter(|t| self.config.hidden_tokens || t.is_main())
        {
            dump.push_str(token.to_string().trim());
            dump.push_str(LINE_ENDING);
        }
        Ok(dump)
    }

    /// Printed syntax tree
    pub fn parse_source(&self, source: &str) -> std::result::Result<String, PipelineError> {
        let parsed = self.pipeline.parse(self.pipeline.tokenize(source)?)?;
        Ok(self.printer.print(&parsed.tree, &parsed.rule_names))
    }

    /// Rendered output, from a freshly parsed tree
    pub fn render_source(&self, source: &str) -> std::result::Result<String, PipelineError> {
        let parsed = self.pipeline.parse(self.pipeline.tokenize(source)?)?;
        self.pipeline.render(&parsed.tree)
    }

    /// Compute the found value of a case and echo it if enabled
    pub fn compute(&self, fixture: &Fixture, stage: Stage) -> Result<String> {
        let source = self.read_source(fixture)?;
        let found = match stage {
            Stage::Lex => self.lex_source(&source)?,
            Stage::Parse => self.parse_source(&source)?,
            Stage::Result => self.render_source(&source)?,
        };
        if self.echo_enabled(stage) {
            println!("{}", found);
        }
        Ok(found)
    }

    fn echo_enabled(&self, stage: Stage) -> bool {
        self.config.echo
            && match stage {
                Stage::Lex => self.config.echo_lex,
                Stage::Parse => self.config.echo_tree,
                Stage::Result => self.config.echo_result,
            }
    }

    /// Run one case and compare it against its baseline.
    ///
    /// Pipeline errors and panics become a failed case.
    pub fn run_case(&self, fixture: &Fixture, stage: Stage) -> CaseReport {
        tracing::debug!(fixture = %fixture.name, %stage, "running case");
        let start = Instant::now();

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| self.compute(fixture, stage)));
        let (status, message) = match outcome {
            Ok(Ok(found)) => self.compare(fixture, stage, &found),
            Ok(Err(e)) => (CaseStatus::Failed, Some(e.to_string())),
            Err(payload) => (
                CaseStatus::Failed,
                Some(format!("pipeline panicked: {}", panic_message(&*payload))),
            ),
        };

        if status == CaseStatus::Failed {
            tracing::debug!(fixture = %fixture.name, %stage, "case failed");
        }

        CaseReport {
            fixture: fixture.name.clone(),
            stage,
            status,
            baseline: fixture.baseline(stage).to_path_buf(),
            duration: start.elapsed(),
            message,
        }
    }

    fn compare(
        &self,
        fixture: &Fixture,
        stage: Stage,
        found: &str,
    ) -> (CaseStatus, Option<String>) {
        let baseline = self.store.read_or_seed(stage, &fixture.name, found);
        match baseline.state {
            BaselineState::Unavailable => (
                CaseStatus::Failed,
                Some(format!("baseline {} is unavailable", baseline.path.display())),
            ),
            BaselineState::Seeded if self.config.fail_on_seed => (
                CaseStatus::Failed,
                Some(format!(
                    "new baseline {} was seeded; review it and run again",
                    baseline.path.display()
                )),
            ),
            BaselineState::Seeded => (CaseStatus::Seeded, None),
            BaselineState::Recorded if baseline.content == found => (CaseStatus::Passed, None),
            BaselineState::Recorded => (
                CaseStatus::Failed,
                Some(mismatch_message(&fixture.name, &baseline, found)),
            ),
        }
    }

    /// Run the three cases of a fixture, in stage order
    pub fn run_fixture(&self, fixture: &Fixture) -> Vec<CaseReport> {
        Stage::ALL
            .iter()
            .map(|&stage| self.run_case(fixture, stage))
            .collect()
    }

    /// Run every discovered fixture
    pub fn run_all(&self) -> Result<RunReport> {
        let start = Instant::now();
        let fixtures = self.fixtures()?;

        let mut cases = Vec::with_capacity(fixtures.len() * Stage::ALL.len());
        for fixture in &fixtures {
            cases.extend(self.run_fixture(fixture));
        }

        let report = RunReport::new(cases, start.elapsed());
        tracing::debug!(
            total = report.summary.total,
            passed = report.summary.passed,
            seeded = report.summary.seeded,
            failed = report.summary.failed,
            "run finished"
        );
        Ok(report)
    }

    /// Run a case and panic with its failure message unless it succeeds
    pub fn assert_case(&self, fixture: &Fixture, stage: Stage) {
        let report = self.run_case(fixture, stage);
        if !report.status.is_ok() {
            panic!(
                "{} [{}] failed: {}",
                report.fixture,
                stage,
                report.message.unwrap_or_default()
            );
        }
    }

    /// Look up a fixture by name and assert one of its cases
    pub fn assert_stage(&self, name: &str, stage: Stage) {
        match self.fixture(name) {
            Ok(fixture) => self.assert_case(&fixture, stage),
            Err(e) => panic!("{}", e),
        }
    }
}

fn mismatch_message(fixture: &str, baseline: &Baseline, found: &str) -> String {
    let diff = TextDiff::from_lines(baseline.content.as_str(), found);
    format!(
        "{} [{}] differs from {}\n{}",
        fixture,
        baseline.stage,
        baseline.path.display(),
        diff.unified_diff().header("expected", "found")
    )
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

/// Generate a `lex`/`parse`/`result` test trio for each named fixture.
///
/// The harness expression is evaluated once per test, inside a module that
/// glob-imports its parent.
///
/// ```ignore
/// fn harness() -> Harness<MarkupPipeline> {
///     Harness::for_base_dir(MarkupPipeline, env!("CARGO_MANIFEST_DIR")).unwrap()
/// }
///
/// snippet_tests!(harness();
///     basic => "basic",
///     nested => "lists/nested",
/// );
/// ```
#[macro_export]
macro_rules! snippet_tests {
    ($harness:expr; $($case:ident => $fixture:expr),+ $(,)?) => {
        $(
            mod $case {
                #[allow(unused_imports)]
                use super::*;

                #[test]
                fn lex() {
                    ($harness).assert_stage($fixture, $crate::golden::Stage::Lex);
                }

                #[test]
                fn parse() {
                    ($harness).assert_stage($fixture, $crate::golden::Stage::Parse);
                }

                #[test]
                fn result() {
                    ($harness).assert_stage($fixture, $crate::golden::Stage::Result);
                }
            }
        )+
    };
}

#[cfg(test)]
mod tests;
