//! Generators for large, well-formed vector sets.
//!
//! Every generated sigVer case carries a different `pk` in each of the three
//! files so that precedence mistakes show up immediately.

use serde_json::{json, Value};
use slhdsa_acvp_harness::{Result, VectorIndex};
use slhdsa_acvp_params::slh_dsa::PARAMETER_SETS;

/// Shape of a generated vector set
#[derive(Debug, Clone)]
pub struct Shape {
    /// One entry per group: does the group declare the `preHash` sentinel?
    pub pre_hash_groups: Vec<bool>,
    pub cases_per_group: usize,
    /// Emit groups and cases of the answer files in reverse order
    pub reverse_answers: bool,
}

impl Shape {
    pub fn uniform(groups: usize, cases_per_group: usize) -> Self {
        Self {
            pre_hash_groups: (0..groups).map(|g| g % 2 == 1).collect(),
            cases_per_group,
            reverse_answers: false,
        }
    }

    pub fn case_count(&self) -> usize {
        self.pre_hash_groups.len() * self.cases_per_group
    }
}

/// The files of one generated family, as JSON text
#[derive(Debug, Clone)]
pub struct SyntheticFamily {
    pub prompt: String,
    pub expected_results: String,
    pub internal_projection: Option<String>,
}

impl SyntheticFamily {
    pub fn indexes(&self) -> Result<(VectorIndex, VectorIndex, Option<VectorIndex>)> {
        let prompt = VectorIndex::from_json_str(&self.prompt, "prompt.json")?;
        let results = VectorIndex::from_json_str(&self.expected_results, "expectedResults.json")?;
        let projection = self
            .internal_projection
            .as_deref()
            .map(|json| VectorIndex::from_json_str(json, "internalProjection.json"))
            .transpose()?;
        Ok((prompt, results, projection))
    }
}

/// Deterministic pseudo-random hex of `len` bytes
pub fn hex_bytes(seed: u64, len: usize) -> String {
    let bytes: Vec<u8> = (0..len as u64)
        .map(|i| (seed.wrapping_mul(0x9E37_79B9).wrapping_add(i.wrapping_mul(31)) >> 3) as u8)
        .collect();
    hex::encode_upper(bytes)
}

fn tc_id(group: usize, case: usize, shape: &Shape) -> u64 {
    (group * shape.cases_per_group + case + 1) as u64
}

fn document(mode: &str, groups: Vec<Value>) -> String {
    json!({
        "vsId": 0,
        "algorithm": "SLH-DSA",
        "mode": mode,
        "revision": "FIPS205",
        "isSample": true,
        "testGroups": groups,
    })
    .to_string()
}

fn maybe_reverse(mut values: Vec<Value>, shape: &Shape) -> Vec<Value> {
    if shape.reverse_answers {
        values.reverse();
    }
    values
}

pub fn keygen(shape: &Shape) -> SyntheticFamily {
    let mut prompt = Vec::new();
    let mut results = Vec::new();
    for (g, _) in shape.pre_hash_groups.iter().enumerate() {
        let mut prompt_cases = Vec::new();
        let mut result_cases = Vec::new();
        for c in 0..shape.cases_per_group {
            let id = tc_id(g, c, shape);
            prompt_cases.push(json!({
                "tcId": id,
                "skSeed": hex_bytes(id, 16),
                "skPrf": hex_bytes(id + 1, 16),
                "pkSeed": hex_bytes(id + 2, 16),
            }));
            result_cases.push(json!({
                "tcId": id,
                "sk": hex_bytes(id + 3, 64),
                "pk": hex_bytes(id + 4, 32),
            }));
        }
        let tg_id = g as u64 + 1;
        prompt.push(json!({
            "tgId": tg_id,
            "testType": "AFT",
            "parameterSet": PARAMETER_SETS[g % PARAMETER_SETS.len()],
            "tests": prompt_cases,
        }));
        results.push(json!({ "tgId": tg_id, "tests": maybe_reverse(result_cases, shape) }));
    }
    SyntheticFamily {
        prompt: document("keyGen", prompt),
        expected_results: document("keyGen", maybe_reverse(results, shape)),
        internal_projection: None,
    }
}

pub fn siggen(shape: &Shape) -> SyntheticFamily {
    let mut prompt = Vec::new();
    let mut results = Vec::new();
    for (g, &pre_hash) in shape.pre_hash_groups.iter().enumerate() {
        let mut prompt_cases = Vec::new();
        let mut result_cases = Vec::new();
        for c in 0..shape.cases_per_group {
            let id = tc_id(g, c, shape);
            let mut case = json!({
                "tcId": id,
                "sk": hex_bytes(id, 64),
                "message": hex_bytes(id + 1, 48),
            });
            if c % 2 == 0 {
                case["context"] = json!(hex_bytes(id + 2, 8));
            }
            if pre_hash {
                case["hashAlg"] = json!("SHA2-256");
            }
            prompt_cases.push(case);
            result_cases.push(json!({ "tcId": id, "signature": hex_bytes(id + 3, 96) }));
        }
        let tg_id = g as u64 + 1;
        let mut group = json!({
            "tgId": tg_id,
            "testType": "AFT",
            "parameterSet": PARAMETER_SETS[g % PARAMETER_SETS.len()],
            "deterministic": g % 3 == 0,
            "preHash": if pre_hash { "preHash" } else { "pure" },
            "tests": prompt_cases,
        });
        if g % 2 == 0 {
            group["signatureInterface"] = json!("external");
        }
        prompt.push(group);
        results.push(json!({ "tgId": tg_id, "tests": maybe_reverse(result_cases, shape) }));
    }
    SyntheticFamily {
        prompt: document("sigGen", prompt),
        expected_results: document("sigGen", maybe_reverse(results, shape)),
        internal_projection: None,
    }
}

/// The prompt `pk` of a generated sigVer case
pub fn sigver_prompt_pk(id: u64) -> String {
    hex_bytes(id + 1000, 32)
}

pub fn sigver(shape: &Shape) -> SyntheticFamily {
    let mut prompt = Vec::new();
    let mut results = Vec::new();
    let mut projection = Vec::new();
    for (g, &pre_hash) in shape.pre_hash_groups.iter().enumerate() {
        let mut prompt_cases = Vec::new();
        let mut result_cases = Vec::new();
        let mut projection_cases = Vec::new();
        for c in 0..shape.cases_per_group {
            let id = tc_id(g, c, shape);
            let passed = c % 3 != 0;
            prompt_cases.push(json!({
                "tcId": id,
                "pk": sigver_prompt_pk(id),
                "message": hex_bytes(id, 48),
                "signature": hex_bytes(id + 1, 96),
            }));
            result_cases.push(json!({
                "tcId": id,
                "testPassed": passed,
                "pk": hex_bytes(id + 2000, 32),
            }));
            projection_cases.push(json!({
                "tcId": id,
                "pk": hex_bytes(id + 3000, 32),
                "message": hex_bytes(id + 2, 48),
                "signature": hex_bytes(id + 3, 96),
                "testPassed": passed,
                "reason": if passed { "valid signature and message" } else { "modified signature" },
            }));
        }
        let tg_id = g as u64 + 1;
        prompt.push(json!({
            "tgId": tg_id,
            "testType": "AFT",
            "parameterSet": PARAMETER_SETS[g % PARAMETER_SETS.len()],
            "preHash": if pre_hash { "preHash" } else { "pure" },
            "signatureInterface": if g % 2 == 0 { "internal" } else { "external" },
            "tests": prompt_cases,
        }));
        results.push(json!({ "tgId": tg_id, "tests": maybe_reverse(result_cases, shape) }));
        projection.push(json!({ "tgId": tg_id, "tests": maybe_reverse(projection_cases, shape) }));
    }
    SyntheticFamily {
        prompt: document("sigVer", prompt),
        expected_results: document("sigVer", maybe_reverse(results, shape)),
        internal_projection: Some(document("sigVer", maybe_reverse(projection, shape))),
    }
}
