use super::*;
use crate::markup::MarkupPipeline;
use crate::pipeline::{ParseTree, Parsed, Token};
use pretty_assertions::assert_eq;
use std::path::Path;
use tempfile::TempDir;

type PipelineResult<T> = std::result::Result<T, PipelineError>;

fn write(root: &Path, relative: &str, content: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

fn quiet_config(base_dir: &Path) -> HarnessConfig {
    HarnessConfig {
        echo: false,
        ..HarnessConfig::new(base_dir)
    }
}

fn markup_harness(tmp: &TempDir) -> Harness<MarkupPipeline> {
    Harness::new(MarkupPipeline, quiet_config(tmp.path())).unwrap()
}

fn statuses(cases: &[CaseReport]) -> Vec<CaseStatus> {
    cases.iter().map(|c| c.status).collect()
}

/// Tokenizes like the markup pipeline but always fails to parse
struct FailingParse;

impl Pipeline for FailingParse {
    type Tree = ParseTree;

    fn tokenize(&self, source: &str) -> PipelineResult<Vec<Token>> {
        MarkupPipeline.tokenize(source)
    }

    fn parse(&self, _tokens: Vec<Token>) -> PipelineResult<Parsed<ParseTree>> {
        Err(PipelineError::Parse {
            line: 1,
            column: 0,
            message: "boom".to_string(),
        })
    }

    fn render(&self, _tree: &ParseTree) -> PipelineResult<String> {
        unreachable!("render without a tree")
    }
}

/// Panics while rendering
struct PanickingRender;

impl Pipeline for PanickingRender {
    type Tree = ParseTree;

    fn tokenize(&self, source: &str) -> PipelineResult<Vec<Token>> {
        MarkupPipeline.tokenize(source)
    }

    fn parse(&self, tokens: Vec<Token>) -> PipelineResult<Parsed<ParseTree>> {
        MarkupPipeline.parse(tokens)
    }

    fn render(&self, _tree: &ParseTree) -> PipelineResult<String> {
        panic!("render exploded")
    }
}

#[test]
fn test_new_rejects_missing_base_dir() {
    let tmp = TempDir::new().unwrap();
    let result = Harness::new(MarkupPipeline, quiet_config(&tmp.path().join("nope")));
    assert!(matches!(result, Err(HarnessError::BaseDir { .. })));
}

#[test]
fn test_new_rejects_invalid_config() {
    let tmp = TempDir::new().unwrap();
    let config = HarnessConfig {
        filter: Some("(".to_string()),
        ..quiet_config(tmp.path())
    };
    let result = Harness::new(MarkupPipeline, config);
    assert!(matches!(result, Err(HarnessError::Config(_))));
}

#[test]
fn test_for_base_dir_reads_config_file() {
    let tmp = TempDir::new().unwrap();
    write(tmp.path(), "snippets.toml", "echo = false\ndata_dir = \"cases\"\n");
    write(tmp.path(), "cases/one.md", "one\n");

    let harness = Harness::for_base_dir(MarkupPipeline, tmp.path()).unwrap();
    assert!(!harness.config().echo);
    let names: Vec<_> = harness.fixtures().unwrap().into_iter().map(|f| f.name).collect();
    assert_eq!(names, vec!["one"]);
}

#[test]
fn test_empty_base_dir_runs_nothing() {
    let tmp = TempDir::new().unwrap();
    let report = markup_harness(&tmp).run_all().unwrap();
    assert_eq!(report.summary.total, 0);
    assert!(report.is_success());
}

#[test]
fn test_lex_dump_format() {
    let tmp = TempDir::new().unwrap();
    let dump = markup_harness(&tmp).lex_source("# Hi\n").unwrap();
    let expected: String = [
        "[@0,0:0='#',<HASHES>,1:0]",
        "[@1,1:3=' Hi',<TEXT>,1:1]",
        "[@2,4:4='\\n',<NEWLINE>,1:4]",
        "[@3,5:4='<EOF>',<EOF>,2:0]",
    ]
    .iter()
    .map(|line| format!("{}{}", line, LINE_ENDING))
    .collect();
    assert_eq!(dump, expected);
}

#[test]
fn test_hidden_tokens_only_when_enabled() {
    let tmp = TempDir::new().unwrap();
    let source = "a <!-- c --> b\n";

    let dump = markup_harness(&tmp).lex_source(source).unwrap();
    assert!(!dump.contains("<COMMENT>"));

    let config = HarnessConfig {
        hidden_tokens: true,
        ..quiet_config(tmp.path())
    };
    let dump = Harness::new(MarkupPipeline, config)
        .unwrap()
        .lex_source(source)
        .unwrap();
    assert!(dump.contains("[@1,2:11='<!-- c -->',<COMMENT>,channel=1,1:2]"), "{}", dump);
}

#[test]
fn test_parse_source_pretty_and_compact() {
    let tmp = TempDir::new().unwrap();
    let pretty = markup_harness(&tmp).parse_source("*a*").unwrap();
    let expected = [
        "document",
        "  paragraph",
        "    line",
        "      emphasis",
        "        *",
        "        text",
        "          a",
        "        *",
        "  <EOF>",
    ]
    .join(LINE_ENDING);
    assert_eq!(pretty, expected);

    let config = HarnessConfig {
        tree_pretty: false,
        ..quiet_config(tmp.path())
    };
    let compact = Harness::new(MarkupPipeline, config)
        .unwrap()
        .parse_source("*a*")
        .unwrap();
    assert_eq!(compact, "(document (paragraph (line (emphasis * (text a) *))) <EOF>)");
}

#[test]
fn test_first_run_seeds_then_passes() {
    let tmp = TempDir::new().unwrap();
    write(tmp.path(), "test.snippets/basic.md", "# Title\n\nHello *world*\n");
    let harness = markup_harness(&tmp);

    let first = harness.run_all().unwrap();
    assert_eq!(statuses(&first.cases), vec![CaseStatus::Seeded; 3]);
    assert_eq!(first.summary.seeded, 3);
    assert!(first.is_success());
    for stage in Stage::ALL {
        let baseline = format!("test.expected/basic{}", stage.suffix());
        assert!(tmp.path().join(baseline).is_file());
    }
    assert_eq!(
        fs::read_to_string(tmp.path().join("test.expected/basicResult.txt")).unwrap(),
        "<h1 id=\"title\">Title</h1>\n<p>Hello <em>world</em></p>\n"
    );

    let second = harness.run_all().unwrap();
    assert_eq!(statuses(&second.cases), vec![CaseStatus::Passed; 3]);
    assert_eq!(second.summary.passed, 3);
}

#[test]
fn test_mismatch_reports_unified_diff() {
    let tmp = TempDir::new().unwrap();
    write(tmp.path(), "test.snippets/basic.md", "Hello *world*\n");
    write(tmp.path(), "test.expected/basicResult.txt", "<p>old</p>\n");
    let harness = markup_harness(&tmp);

    let fixture = harness.fixture("basic").unwrap();
    let report = harness.run_case(&fixture, Stage::Result);
    assert_eq!(report.status, CaseStatus::Failed);

    let message = report.message.unwrap();
    assert!(message.starts_with("basic [result] differs from"), "{}", message);
    assert!(message.contains("--- expected"), "{}", message);
    assert!(message.contains("+++ found"), "{}", message);
    assert!(message.contains("-<p>old</p>"), "{}", message);
    assert!(message.contains("+<p>Hello <em>world</em></p>"), "{}", message);

    // The recorded baseline is left alone
    assert_eq!(
        fs::read_to_string(tmp.path().join("test.expected/basicResult.txt")).unwrap(),
        "<p>old</p>\n"
    );
}

#[test]
fn test_parse_failure_leaves_lex_unaffected() {
    let tmp = TempDir::new().unwrap();
    write(tmp.path(), "test.snippets/broken.md", "text\n");
    let harness = Harness::new(FailingParse, quiet_config(tmp.path())).unwrap();

    let fixture = harness.fixture("broken").unwrap();
    let cases = harness.run_fixture(&fixture);
    assert_eq!(
        statuses(&cases),
        vec![CaseStatus::Seeded, CaseStatus::Failed, CaseStatus::Failed]
    );
    for case in &cases[1..] {
        assert_eq!(case.message.as_deref(), Some("parse error at 1:0: boom"));
    }

    // Failed cases never seed a baseline
    assert!(fixture.baseline(Stage::Lex).is_file());
    assert!(!fixture.baseline(Stage::Parse).exists());
    assert!(!fixture.baseline(Stage::Result).exists());
}

#[test]
fn test_panics_are_caught_per_case() {
    let tmp = TempDir::new().unwrap();
    write(tmp.path(), "test.snippets/basic.md", "text\n");
    let harness = Harness::new(PanickingRender, quiet_config(tmp.path())).unwrap();

    let report = harness.run_all().unwrap();
    assert_eq!(
        statuses(&report.cases),
        vec![CaseStatus::Seeded, CaseStatus::Seeded, CaseStatus::Failed]
    );
    assert_eq!(
        report.cases[2].message.as_deref(),
        Some("pipeline panicked: render exploded")
    );
    assert_eq!(report.failures().count(), 1);
}

#[test]
fn test_fail_on_seed() {
    let tmp = TempDir::new().unwrap();
    write(tmp.path(), "test.snippets/basic.md", "text\n");
    let config = HarnessConfig {
        fail_on_seed: true,
        ..quiet_config(tmp.path())
    };
    let harness = Harness::new(MarkupPipeline, config).unwrap();

    let first = harness.run_all().unwrap();
    assert_eq!(first.summary.failed, 3);
    assert!(first.cases[0]
        .message
        .as_deref()
        .unwrap()
        .contains("was seeded; review it"));

    let second = harness.run_all().unwrap();
    assert_eq!(second.summary.passed, 3);
}

#[test]
fn test_unavailable_baseline_fails() {
    let tmp = TempDir::new().unwrap();
    write(tmp.path(), "test.snippets/basic.md", "text\n");
    write(tmp.path(), "test.expected", "not a directory");
    let harness = markup_harness(&tmp);

    let report = harness.run_all().unwrap();
    assert_eq!(report.summary.failed, 3);
    assert!(report.cases[0]
        .message
        .as_deref()
        .unwrap()
        .ends_with("is unavailable"));
}

#[test]
fn test_filter_limits_run() {
    let tmp = TempDir::new().unwrap();
    write(tmp.path(), "test.snippets/basic.md", "a\n");
    write(tmp.path(), "test.snippets/other.md", "b\n");
    let config = HarnessConfig {
        filter: Some("^b".to_string()),
        ..quiet_config(tmp.path())
    };
    let report = Harness::new(MarkupPipeline, config).unwrap().run_all().unwrap();
    assert_eq!(report.summary.total, 3);
    assert!(report.cases.iter().all(|c| c.fixture == "basic"));
}

#[test]
fn test_fixture_lookup_tries_each_extension() {
    let tmp = TempDir::new().unwrap();
    write(tmp.path(), "test.snippets/sub/page.markdown", "a\n");
    let config = HarnessConfig {
        extensions: vec!["md".to_string(), ".markdown".to_string()],
        ..quiet_config(tmp.path())
    };
    let harness = Harness::new(MarkupPipeline, config).unwrap();

    let fixture = harness.fixture("sub/page").unwrap();
    assert_eq!(fixture.source, tmp.path().join("test.snippets/sub/page.markdown"));
    assert!(matches!(
        harness.fixture("missing"),
        Err(HarnessError::MissingFixture(name)) if name == "missing"
    ));
}

#[test]
fn test_expected_reads_without_seeding() {
    let tmp = TempDir::new().unwrap();
    write(tmp.path(), "test.snippets/basic.md", "a\n");
    let harness = markup_harness(&tmp);
    let fixture = harness.fixture("basic").unwrap();

    assert_eq!(harness.expected(&fixture, Stage::Result).unwrap(), None);
    assert!(!fixture.baseline(Stage::Result).exists());

    harness.assert_case(&fixture, Stage::Result);
    assert_eq!(
        harness.expected(&fixture, Stage::Result).unwrap().as_deref(),
        Some("<p>a</p>\n")
    );
}

#[test]
#[should_panic(expected = "no source file for fixture 'missing'")]
fn test_assert_stage_missing_fixture() {
    let tmp = TempDir::new().unwrap();
    markup_harness(&tmp).assert_stage("missing", Stage::Lex);
}

#[test]
#[should_panic(expected = "basic [result] failed")]
fn test_assert_stage_mismatch() {
    let tmp = TempDir::new().unwrap();
    write(tmp.path(), "test.snippets/basic.md", "a\n");
    write(tmp.path(), "test.expected/basicResult.txt", "<p>b</p>\n");
    markup_harness(&tmp).assert_stage("basic", Stage::Result);
}

#[test]
fn test_report_json() {
    let tmp = TempDir::new().unwrap();
    write(tmp.path(), "test.snippets/basic.md", "a\n");
    let report = markup_harness(&tmp).run_all().unwrap();

    let json: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
    assert_eq!(json["summary"]["total"], 3);
    assert_eq!(json["summary"]["seeded"], 3);
    assert_eq!(json["summary"]["failed"], 0);
    assert_eq!(json["cases"][0]["fixture"], "basic");
    assert_eq!(json["cases"][0]["stage"], "lex");
    assert_eq!(json["cases"][0]["status"], "seeded");
    assert!(json["cases"][0].get("message").is_none());

    let back: RunReport = serde_json::from_value(json).unwrap();
    assert_eq!(back.summary.total, 3);
}

#[test]
fn test_dotted_fixture_names_do_not_share_baselines() {
    let tmp = TempDir::new().unwrap();
    write(tmp.path(), "test.snippets/notes.md", "alpha\n");
    write(tmp.path(), "test.snippets/notes.v2.md", "beta\n");
    let harness = markup_harness(&tmp);

    let first = harness.run_all().unwrap();
    assert_eq!(first.summary.seeded, 6);
    assert_eq!(
        fs::read_to_string(tmp.path().join("test.expected/notesResult.txt")).unwrap(),
        "<p>alpha</p>\n"
    );
    assert_eq!(
        fs::read_to_string(tmp.path().join("test.expected/notes.v2Result.txt")).unwrap(),
        "<p>beta</p>\n"
    );

    let second = harness.run_all().unwrap();
    assert_eq!(second.summary.passed, 6);
    assert!(second.is_success());
}

#[test]
fn test_report_duration_saturates() {
    let report = RunReport::new(Vec::new(), std::time::Duration::MAX);
    let json: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
    assert_eq!(json["summary"]["duration"], u64::MAX);
}
