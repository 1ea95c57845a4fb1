//! Regression cases for the bundled markup pipeline
//!
//! Fixtures live in `tests/data/test.snippets`; baselines in
//! `tests/data/test.expected`. Every fixture has its baselines checked in,
//! and `fail_on_seed` makes a missing one fail the run.

use std::path::Path;

use pretty_assertions::assert_eq;
use snippets::prelude::*;
use snippets::snippet_tests;

fn harness() -> Harness<MarkupPipeline> {
    let base = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests").join("data");
    Harness::for_base_dir(MarkupPipeline, base).unwrap()
}

snippet_tests!(harness();
    basic => "basic",
    headings => "headings",
    comments => "comments",
    nested => "lists/nested",
);

#[test]
fn discovered_fixtures() {
    let names: Vec<String> = harness()
        .fixtures()
        .unwrap()
        .into_iter()
        .map(|f| f.name)
        .collect();
    assert_eq!(names, vec!["basic", "comments", "headings", "lists/nested"]);
}

#[test]
fn config_file_is_applied() {
    let harness = harness();
    assert!(!harness.config().echo);
    assert_eq!(harness.config().data_dir, "test.snippets");
    assert!(harness.config().fail_on_seed);
}

#[test]
fn every_fixture_has_recorded_baselines() {
    let harness = harness();
    for fixture in harness.fixtures().unwrap() {
        for stage in Stage::ALL {
            assert!(
                fixture.baseline(stage).is_file(),
                "{} has no {} baseline",
                fixture.name,
                stage
            );
        }
    }
}
