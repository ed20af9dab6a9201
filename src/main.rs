//! `acvp-client`: runs the SLH-DSA ACVP vector sets against a subject executable.

mod logging;

use clap::Parser;
use slhdsa_acvp::harness::{self, HarnessConfig, HarnessError, TestFamily};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::error;

#[derive(Debug, Parser)]
#[command(name = "acvp-client", version, about = "SLH-DSA ACVP test runner")]
struct Cli {
    /// Number of parallel jobs (default: auto-detect CPU cores)
    #[arg(short, long)]
    jobs: Option<usize>,

    /// TOML configuration file; flags override its values
    #[arg(long)]
    config: Option<PathBuf>,

    /// Root of the ACVP JSON vector tree
    #[arg(long)]
    vectors: Option<PathBuf>,

    /// Vector-set version directory under the vector root
    #[arg(long = "version-dir")]
    version_dir: Option<String>,

    /// Subject-under-test executable
    #[arg(long)]
    subject: Option<PathBuf>,

    /// Per-case timeout in seconds (0 disables it)
    #[arg(long)]
    timeout: Option<u64>,

    /// Restrict the run to these families (keyGen, sigGen, sigVer)
    #[arg(long = "family")]
    families: Vec<TestFamily>,

    #[arg(short, long)]
    verbose: bool,

    #[arg(short, long)]
    quiet: bool,

    #[arg(long)]
    no_color: bool,
}

impl Cli {
    fn into_config(self) -> Result<HarnessConfig, HarnessError> {
        let mut config = match &self.config {
            Some(path) => HarnessConfig::from_toml_file(path)?,
            None => HarnessConfig::default(),
        };
        if let Some(jobs) = self.jobs {
            config = config.with_jobs(jobs);
        }
        if let Some(root) = self.vectors {
            config = config.with_vectors_root(root);
        }
        if let Some(version) = self.version_dir {
            config = config.with_vector_version(version);
        }
        if let Some(subject) = self.subject {
            config = config.with_subject(subject);
        }
        if let Some(secs) = self.timeout {
            config = config.with_timeout_secs(secs);
        }
        if !self.families.is_empty() {
            config = config.with_families(self.families);
        }
        Ok(config)
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init_subscriber(
        logging::Verbosity::from_flags(cli.verbose, cli.quiet),
        cli.no_color,
    );

    let config = match cli.into_config() {
        Ok(config) => config,
        Err(err) => {
            error!("{err}");
            return ExitCode::FAILURE;
        }
    };

    eprintln!("Generating test commands from ACVP JSON files...");
    match harness::run(&config) {
        Ok(summary) => {
            if let Err(err) = summary.write_summary(&mut std::io::stdout().lock()) {
                error!("failed to write summary: {err}");
            }
            if summary.exit_code() == 0 {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            }
        }
        Err(err) if err.is_missing_vectors() => {
            error!("{err}");
            eprintln!(
                "Error: Could not find ACVP JSON files under {}. Initialize them first.",
                config.vectors_dir().display()
            );
            eprintln!("Run: git submodule update --init --recursive");
            ExitCode::FAILURE
        }
        Err(err) => {
            error!("{err}");
            ExitCode::FAILURE
        }
    }
}
