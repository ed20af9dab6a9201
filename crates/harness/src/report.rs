//! Pass/fail accounting across invocations and families.

use crate::engine::InvocationResult;
use crate::model::TestFamily;
use crate::runner::Completion;
use slhdsa_acvp_params::acvp::PASS_MARKER;
use std::io::{self, Write};
use tracing::warn;

/// How one result is counted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaseOutcome {
    /// Exit code zero. `echoed` is set when stdout carried the pass marker.
    Passed { echoed: bool },
    Failed,
}

pub fn classify(result: &InvocationResult) -> CaseOutcome {
    if result.success() {
        CaseOutcome::Passed {
            echoed: result.stdout.contains(PASS_MARKER),
        }
    } else {
        CaseOutcome::Failed
    }
}

/// Commutative pass/fail counter.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Tally {
    pub passed: usize,
    pub failed: usize,
}

impl Tally {
    pub fn record(&mut self, outcome: CaseOutcome) {
        match outcome {
            CaseOutcome::Passed { .. } => self.passed += 1,
            CaseOutcome::Failed => self.failed += 1,
        }
    }

    pub fn merge(self, other: Tally) -> Tally {
        Tally {
            passed: self.passed + other.passed,
            failed: self.failed + other.failed,
        }
    }

    pub fn total(&self) -> usize {
        self.passed + self.failed
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Success,
    Failure,
}

impl Verdict {
    /// Process exit code for this verdict
    pub fn exit_code(self) -> i32 {
        match self {
            Verdict::Success => 0,
            Verdict::Failure => 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FamilyReport {
    pub family: TestFamily,
    pub tally: Tally,
}

/// Per-family reports folded into the run's verdict.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunSummary {
    families: Vec<FamilyReport>,
}

impl RunSummary {
    pub fn push(&mut self, report: FamilyReport) {
        self.families.push(report);
    }

    pub fn families(&self) -> &[FamilyReport] {
        &self.families
    }

    pub fn total(&self) -> Tally {
        self.families
            .iter()
            .fold(Tally::default(), |acc, report| acc.merge(report.tally))
    }

    pub fn total_passed(&self) -> usize {
        self.total().passed
    }

    pub fn total_failed(&self) -> usize {
        self.total().failed
    }

    /// Success iff nothing failed in any family
    pub fn verdict(&self) -> Verdict {
        if self.total_failed() == 0 {
            Verdict::Success
        } else {
            Verdict::Failure
        }
    }

    pub fn exit_code(&self) -> i32 {
        self.verdict().exit_code()
    }

    pub fn write_summary<W: Write>(&self, out: &mut W) -> io::Result<()> {
        let total = self.total();
        writeln!(out)?;
        writeln!(out, "=== test summary ===")?;
        writeln!(out, "PASS: {}", total.passed)?;
        writeln!(out, "FAIL: {}", total.failed)?;
        if self.verdict() == Verdict::Success {
            writeln!(out, "ALL GOOD!")?;
        }
        Ok(())
    }
}

/// Folds completions of one family as they stream in, echoing passing
/// subject output and failing stderr to `out`.
pub struct ResultAggregator<W: Write> {
    family: TestFamily,
    tally: Tally,
    out: W,
}

impl<W: Write> ResultAggregator<W> {
    pub fn new(family: TestFamily, out: W) -> Self {
        Self {
            family,
            tally: Tally::default(),
            out,
        }
    }

    pub fn observe(&mut self, completion: &Completion) -> CaseOutcome {
        let outcome = classify(&completion.result);
        self.tally.record(outcome);

        let echoed = match outcome {
            CaseOutcome::Passed { echoed: true } => {
                writeln!(self.out, "{}", completion.result.stdout.trim())
            }
            CaseOutcome::Passed { echoed: false } => Ok(()),
            CaseOutcome::Failed => {
                warn!(
                    family = %completion.family,
                    key = %completion.key,
                    exit_code = completion.result.exit_code,
                    "case failed"
                );
                if completion.result.stderr.is_empty() {
                    Ok(())
                } else {
                    writeln!(self.out, "Error: {}", completion.result.stderr)
                }
            }
        };
        if let Err(error) = echoed {
            warn!(%error, "failed to echo case output");
        }
        outcome
    }

    pub fn tally(&self) -> Tally {
        self.tally
    }

    pub fn finish(self) -> FamilyReport {
        FamilyReport {
            family: self.family,
            tally: self.tally,
        }
    }
}
