//! Constants for the SLH-DSA (FIPS 205) parameter sets

/// Number of standardised parameter sets
pub const PARAMETER_SET_COUNT: usize = 12;

/// ACVP `parameterSet` identifiers accepted by the subject
pub const PARAMETER_SETS: [&str; PARAMETER_SET_COUNT] = [
    "SLH-DSA-SHA2-128s",
    "SLH-DSA-SHA2-128f",
    "SLH-DSA-SHA2-192s",
    "SLH-DSA-SHA2-192f",
    "SLH-DSA-SHA2-256s",
    "SLH-DSA-SHA2-256f",
    "SLH-DSA-SHAKE-128s",
    "SLH-DSA-SHAKE-128f",
    "SLH-DSA-SHAKE-192s",
    "SLH-DSA-SHAKE-192f",
    "SLH-DSA-SHAKE-256s",
    "SLH-DSA-SHAKE-256f",
];
