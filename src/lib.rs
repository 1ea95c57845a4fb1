//! Snippets: golden-file regression testing for text pipelines
//!
//! Drop a source file into the fixture directory and get three regression
//! checks for it: the token dump, the syntax tree and the rendered result.
//! Each is compared against a recorded baseline, which is written on the
//! first run.
//!
//! ```ignore
//! use snippets::prelude::*;
//!
//! let harness = Harness::for_base_dir(MarkupPipeline, "tests/data")?;
//! let report = harness.run_all()?;
//! assert!(report.is_success(), "{}", report.to_json()?);
//! ```

pub mod config;
pub mod discovery;
pub mod error;
pub mod golden;
pub mod harness;
pub mod markup;
pub mod pipeline;
pub mod printer;

pub use config::HarnessConfig;
pub use error::HarnessError;
pub use golden::Stage;
pub use harness::Harness;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::HarnessConfig;
    pub use crate::discovery::{discover, Fixture};
    pub use crate::error::HarnessError;
    pub use crate::golden::{GoldenStore, Stage};
    pub use crate::harness::{CaseReport, CaseStatus, Harness, RunReport};
    pub use crate::markup::MarkupPipeline;
    pub use crate::pipeline::{
        Channel, ParseTree, Parsed, Pipeline, PipelineError, Position, RuleNames, SyntaxTree,
        Token,
    };
    pub use crate::printer::{PrintConfig, TreePrinter};
}
