//! Constants describing the ACVP vector layout and the subject-under-test contract

/// Default root of the ACVP-Server JSON vector tree
pub const DEFAULT_VECTORS_ROOT: &str = "test/ACVP-Server/gen-val/json-files";

/// Default subject-under-test executable
pub const DEFAULT_SUBJECT: &str = "./xfips205";

/// Default per-invocation timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// Worker count used when the host cannot report its parallelism
pub const FALLBACK_JOBS: usize = 4;

// Vector file names inside each family directory
/// Inputs for every test case
pub const PROMPT_FILE: &str = "prompt.json";
/// Oracle answers for every test case
pub const EXPECTED_RESULTS_FILE: &str = "expectedResults.json";
/// Re-derived message/signature bytes (signature verification only)
pub const INTERNAL_PROJECTION_FILE: &str = "internalProjection.json";

// Family directories
pub const KEYGEN_DIR: &str = "SLH-DSA-keyGen-FIPS205";
pub const SIGGEN_DIR: &str = "SLH-DSA-sigGen-FIPS205";
pub const SIGVER_DIR: &str = "SLH-DSA-sigVer-FIPS205";

// Family selector tokens, passed as the final subject argument
pub const KEYGEN_SELECTOR: &str = "keyGen";
pub const SIGGEN_SELECTOR: &str = "sigGen";
pub const SIGVER_SELECTOR: &str = "sigVer";

/// Group-level `preHash` value that switches a group to pre-hash mode
pub const PREHASH_SENTINEL: &str = "preHash";

/// Token the subject prints on stdout for a semantically passing case
pub const PASS_MARKER: &str = "PASS";

/// Exit code reported when the subject could not be started
pub const LAUNCH_FAILURE_EXIT_CODE: i32 = -1;

/// Exit code reported when the subject exceeded its timeout
pub const TIMEOUT_EXIT_CODE: i32 = -2;

/// Exit code reported when the subject was terminated by a signal
pub const SIGNALLED_EXIT_CODE: i32 = -3;
