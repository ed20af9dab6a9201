//! End-to-end run: load and reconcile every selected family up front, then
//! execute the families one after another, each through its own worker pool.

use crate::config::HarnessConfig;
use crate::engine::{AcvpEngine, SubprocessEngine};
use crate::error::Result;
use crate::invocation::Invocation;
use crate::loader::{FamilyDocuments, FamilyFiles};
use crate::model::TestFamily;
use crate::reconcile::reconcile;
use crate::report::{ResultAggregator, RunSummary};
use crate::runner::Runner;
use std::io::{self, Write};
use std::path::Path;
use tracing::info;

/// A family whose vectors reconciled cleanly, ready to dispatch.
#[derive(Debug, Clone)]
pub struct PreparedFamily {
    pub family: TestFamily,
    pub invocations: Vec<Invocation>,
}

/// Load, reconcile and build invocations for one family.
pub fn prepare_family(vectors_dir: &Path, family: TestFamily) -> Result<PreparedFamily> {
    let files = FamilyFiles::locate(vectors_dir, family);
    let docs = FamilyDocuments::load(&files)?;
    let invocations: Vec<Invocation> = reconcile(&docs)?.iter().map(Invocation::build).collect();
    info!(%family, cases = invocations.len(), "prepared test family");
    Ok(PreparedFamily {
        family,
        invocations,
    })
}

/// Prepare every family the configuration selects. Any load or mismatch
/// error aborts before a single invocation is dispatched.
pub fn prepare(config: &HarnessConfig) -> Result<Vec<PreparedFamily>> {
    config.validate()?;
    let vectors_dir = config.vectors_dir();
    config
        .run_order()
        .into_iter()
        .map(|family| prepare_family(&vectors_dir, family))
        .collect()
}

/// Run prepared families sequentially, streaming per-case echoes to `out`.
pub fn run_prepared<E, W>(
    prepared: &[PreparedFamily],
    engine: &E,
    jobs: usize,
    out: &mut W,
) -> RunSummary
where
    E: AcvpEngine,
    W: Write,
{
    let total: usize = prepared.iter().map(|p| p.invocations.len()).sum();
    info!("Running {total} tests with {jobs} parallel jobs");

    let runner = Runner::new(engine, jobs);
    let mut summary = RunSummary::default();
    for family in prepared {
        let mut aggregator = ResultAggregator::new(family.family, &mut *out);
        runner.run(&family.invocations, |completion| {
            aggregator.observe(&completion);
        });
        let report = aggregator.finish();
        info!(
            family = %report.family,
            passed = report.tally.passed,
            failed = report.tally.failed,
            "family finished"
        );
        summary.push(report);
    }
    summary
}

/// Run the configured families against the configured subject, echoing to stdout.
pub fn run(config: &HarnessConfig) -> Result<RunSummary> {
    let prepared = prepare(config)?;
    let engine = SubprocessEngine::from_config(config);
    info!(
        subject = %engine.program().display(),
        vectors = %config.vectors_dir().display(),
        "starting ACVP run"
    );
    let stdout = io::stdout();
    let mut out = stdout.lock();
    Ok(run_prepared(&prepared, &engine, config.effective_jobs(), &mut out))
}
