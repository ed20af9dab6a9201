//! Harness configuration: defaults, TOML file loading and builder overrides.

use crate::error::{HarnessError, Result};
use crate::model::TestFamily;
use serde::Deserialize;
use slhdsa_acvp_params::acvp::{
    DEFAULT_SUBJECT, DEFAULT_TIMEOUT_SECS, DEFAULT_VECTORS_ROOT, FALLBACK_JOBS,
};
use std::fs;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HarnessConfig {
    /// Root of the ACVP JSON tree
    pub vectors_root: PathBuf,
    /// Optional vector-set version directory under `vectors_root`
    pub vector_version: Option<String>,
    pub subject: PathBuf,
    /// Arguments placed before the flag pairs
    pub subject_args: Vec<String>,
    /// 0 means one worker per available processing unit
    pub jobs: usize,
    /// 0 disables the per-invocation timeout
    pub timeout_secs: u64,
    pub families: Vec<TestFamily>,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            vectors_root: PathBuf::from(DEFAULT_VECTORS_ROOT),
            vector_version: None,
            subject: PathBuf::from(DEFAULT_SUBJECT),
            subject_args: Vec::new(),
            jobs: 0,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            families: TestFamily::ALL.to_vec(),
        }
    }
}

// Builder methods for CLI overrides
impl HarnessConfig {
    pub fn with_vectors_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.vectors_root = root.into();
        self
    }

    pub fn with_vector_version(mut self, version: impl Into<String>) -> Self {
        self.vector_version = Some(version.into());
        self
    }

    pub fn with_subject(mut self, subject: impl Into<PathBuf>) -> Self {
        self.subject = subject.into();
        self
    }

    pub fn with_subject_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.subject_args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_jobs(mut self, jobs: usize) -> Self {
        self.jobs = jobs;
        self
    }

    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    pub fn with_families(mut self, families: impl IntoIterator<Item = TestFamily>) -> Self {
        self.families = families.into_iter().collect();
        self
    }
}

impl HarnessConfig {
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| HarnessError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&text).map_err(|source| HarnessError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn validate(&self) -> Result<()> {
        if self.families.is_empty() {
            return Err(HarnessError::InvalidConfig(
                "at least one test family must be selected".into(),
            ));
        }
        if self.subject.as_os_str().is_empty() {
            return Err(HarnessError::InvalidConfig("subject path is empty".into()));
        }
        Ok(())
    }

    /// Directory holding the per-family vector directories
    pub fn vectors_dir(&self) -> PathBuf {
        match &self.vector_version {
            Some(version) if !version.is_empty() => self.vectors_root.join(version),
            _ => self.vectors_root.clone(),
        }
    }

    pub fn effective_jobs(&self) -> usize {
        if self.jobs > 0 {
            return self.jobs;
        }
        std::thread::available_parallelism()
            .map(NonZeroUsize::get)
            .unwrap_or(FALLBACK_JOBS)
    }

    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs))
    }

    /// Selected families in run order, without repeats
    pub fn run_order(&self) -> Vec<TestFamily> {
        TestFamily::ALL
            .into_iter()
            .filter(|family| self.families.contains(family))
            .collect()
    }
}
