//! Stage trait and the driver that chains stages together.
//!
//! This module provides the `Stage` trait, the unit the run driver
//! sequences. A stage:
//! - declares the artifact it produces and, optionally, the one upstream
//!   artifact it consumes;
//! - is treated as complete, and never re-run, when its output already
//!   exists;
//! - refuses to start when its upstream artifact is missing, rather than
//!   recomputing it inline.
//!
//! [`PipelineRunner`] runs the fixed identity list, classification and
//! stats chain in dependency order, which makes an interrupted run
//! resumable: only the missing artifacts are produced.

use std::fmt;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::catalog::build_identity_list;
use crate::classifier::classify_scraped;
use crate::config::{Layout, PipelineConfig};
use crate::error::PipelineError;
use crate::stats::write_stats;

/// A pipeline step that turns one artifact into the next.
pub trait Stage {
    /// Returns the name of the stage.
    fn name(&self) -> &str;

    /// Artifact this stage produces.
    fn output(&self) -> &Path;

    /// Artifact this stage consumes, if any.
    fn input(&self) -> Option<&Path> {
        None
    }

    /// Produces the output artifact. Returns the number of data rows written.
    fn run(&self) -> Result<usize, PipelineError>;
}

/// What happened to a stage during a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageOutcome {
    /// Output was produced with this many rows.
    Completed(usize),
    /// Output already existed; nothing was written.
    Skipped,
}

impl fmt::Display for StageOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StageOutcome::Completed(rows) => write!(f, "completed ({rows} rows)"),
            StageOutcome::Skipped => f.write_str("skipped (output exists)"),
        }
    }
}

/// Runs a single stage, honouring the skip and upstream rules.
pub fn execute(stage: &dyn Stage) -> Result<StageOutcome, PipelineError> {
    if stage.output().exists() {
        info!(
            "Stage '{}' already complete at {:?}",
            stage.name(),
            stage.output()
        );
        return Ok(StageOutcome::Skipped);
    }
    if let Some(input) = stage.input() {
        if !input.exists() {
            return Err(PipelineError::MissingUpstreamArtifact {
                stage: stage.name().to_string(),
                path: input.to_path_buf(),
            });
        }
    }

    info!("Running stage '{}'", stage.name());
    let rows = stage.run()?;
    Ok(StageOutcome::Completed(rows))
}

/// Reads every present catalog and writes the identity list.
pub struct IdentityListStage<'a> {
    config: &'a PipelineConfig,
    layout: &'a Layout,
    output: PathBuf,
}

impl<'a> IdentityListStage<'a> {
    pub fn new(config: &'a PipelineConfig, layout: &'a Layout) -> Self {
        Self {
            config,
            layout,
            output: layout.identities_path(),
        }
    }
}

impl Stage for IdentityListStage<'_> {
    fn name(&self) -> &str {
        "identities"
    }

    fn output(&self) -> &Path {
        &self.output
    }

    fn run(&self) -> Result<usize, PipelineError> {
        build_identity_list(self.config, self.layout, &self.output)
    }
}

/// Classifies scraped feeds against the identity list.
pub struct ClassifyStage<'a> {
    config: &'a PipelineConfig,
    layout: &'a Layout,
    input: PathBuf,
    output: PathBuf,
}

impl<'a> ClassifyStage<'a> {
    pub fn new(config: &'a PipelineConfig, layout: &'a Layout) -> Self {
        Self {
            config,
            layout,
            input: layout.identities_path(),
            output: layout.classified_path(),
        }
    }
}

impl Stage for ClassifyStage<'_> {
    fn name(&self) -> &str {
        "classify"
    }

    fn output(&self) -> &Path {
        &self.output
    }

    fn input(&self) -> Option<&Path> {
        Some(&self.input)
    }

    fn run(&self) -> Result<usize, PipelineError> {
        classify_scraped(self.config, self.layout, &self.input, &self.output)
    }
}

/// Aggregates the classified artifact into the stats table.
pub struct StatsStage<'a> {
    config: &'a PipelineConfig,
    input: PathBuf,
    output: PathBuf,
}

impl<'a> StatsStage<'a> {
    pub fn new(config: &'a PipelineConfig, layout: &'a Layout) -> Self {
        Self {
            config,
            input: layout.classified_path(),
            output: layout.stats_path(),
        }
    }
}

impl Stage for StatsStage<'_> {
    fn name(&self) -> &str {
        "stats"
    }

    fn output(&self) -> &Path {
        &self.output
    }

    fn input(&self) -> Option<&Path> {
        Some(&self.input)
    }

    fn run(&self) -> Result<usize, PipelineError> {
        write_stats(&self.config.stores, &self.input, &self.output)
    }
}

/// The stages of a run, in dependency order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum StageKind {
    Identities,
    Classify,
    Stats,
}

/// Drives the fixed three-stage chain.
pub struct PipelineRunner<'a> {
    config: &'a PipelineConfig,
    layout: &'a Layout,
}

impl<'a> PipelineRunner<'a> {
    pub fn new(config: &'a PipelineConfig, layout: &'a Layout) -> Self {
        Self { config, layout }
    }

    fn stage(&self, kind: StageKind) -> Box<dyn Stage + 'a> {
        match kind {
            StageKind::Identities => Box::new(IdentityListStage::new(self.config, self.layout)),
            StageKind::Classify => Box::new(ClassifyStage::new(self.config, self.layout)),
            StageKind::Stats => Box::new(StatsStage::new(self.config, self.layout)),
        }
    }

    /// Runs every stage up to and including `target`, stopping at the first
    /// failure.
    pub fn run_until(
        &self,
        target: StageKind,
    ) -> Result<Vec<(StageKind, StageOutcome)>, PipelineError> {
        let mut report = Vec::new();
        for kind in [StageKind::Identities, StageKind::Classify, StageKind::Stats] {
            if kind > target {
                break;
            }
            let stage = self.stage(kind);
            let outcome = execute(stage.as_ref())?;
            info!("Stage '{}' {}", stage.name(), outcome);
            report.push((kind, outcome));
        }
        Ok(report)
    }

    /// Runs the full chain.
    pub fn run(&self) -> Result<Vec<(StageKind, StageOutcome)>, PipelineError> {
        self.run_until(StageKind::Stats)
    }
}
