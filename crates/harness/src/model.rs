//! Pure data model for ACVP vector files and the records reconciled from them.
//! No dependency on the rest of the harness.

use serde::{Deserialize, Serialize};
use slhdsa_acvp_params::acvp::{
    EXPECTED_RESULTS_FILE, INTERNAL_PROJECTION_FILE, KEYGEN_DIR, KEYGEN_SELECTOR, PREHASH_SENTINEL,
    PROMPT_FILE, SIGGEN_DIR, SIGGEN_SELECTOR, SIGVER_DIR, SIGVER_SELECTOR,
};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;

/// Flexible value that can be either string, number, bool, array, object, or null
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    String(String),
    Number(serde_json::Number),
    Bool(bool),
    Array(Vec<FieldValue>),
    Object(BTreeMap<String, FieldValue>),
    Null,
}

impl FieldValue {
    /// Render the value the way the subject expects it on its command line.
    ///
    /// Booleans become `True`/`False`, numbers are decimal, arrays and
    /// objects are compact JSON. `None` means the flag must be omitted.
    pub fn as_flag_value(&self) -> Option<String> {
        match self {
            FieldValue::String(s) if s.is_empty() => None,
            FieldValue::String(s) => Some(s.clone()),
            FieldValue::Number(n) => Some(n.to_string()),
            FieldValue::Bool(true) => Some("True".into()),
            FieldValue::Bool(false) => Some("False".into()),
            FieldValue::Array(_) | FieldValue::Object(_) => serde_json::to_string(self).ok(),
            FieldValue::Null => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Accepts JSON booleans and their Python-style spellings.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FieldValue::Bool(b) => Some(*b),
            FieldValue::String(s) => match s.as_str() {
                "True" | "true" => Some(true),
                "False" | "false" => Some(false),
                _ => None,
            },
            _ => None,
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::String(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::String(s)
    }
}

impl From<bool> for FieldValue {
    fn from(b: bool) -> Self {
        FieldValue::Bool(b)
    }
}

impl From<u64> for FieldValue {
    fn from(n: u64) -> Self {
        FieldValue::Number(n.into())
    }
}

/// Open set of per-case fields, ordered by name so merges are reproducible.
pub type CaseFields = BTreeMap<String, FieldValue>;

/// ----------------------------------------------------------------
/// 1. Leaf-level test case
/// ----------------------------------------------------------------
#[derive(Debug, Clone, Deserialize)]
pub struct TestCase {
    #[serde(rename = "tcId")]
    pub case_id: u64,
    /// Everything else the file carries for this case (pk, sk, message, ...)
    #[serde(flatten)]
    pub fields: CaseFields,
}

/// ----------------------------------------------------------------
/// 2. Groups (ACVP terminology) – share a parameter set and modes
/// ----------------------------------------------------------------
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestGroup {
    #[serde(rename = "tgId")]
    pub group_id: u64,
    #[serde(default)]
    pub test_type: Option<String>,
    #[serde(default)]
    pub parameter_set: Option<String>,

    /// Family-specific group fields (deterministic, preHash, signatureInterface, ...)
    #[serde(flatten)]
    pub metadata: CaseFields,

    #[serde(default)]
    pub tests: Vec<TestCase>,

    #[serde(skip)]
    case_index: HashMap<u64, usize>,
}

impl TestGroup {
    /// Rebuild the `tcId` lookup table. Returns the ids seen more than once;
    /// the first occurrence of each stays addressable.
    pub(crate) fn build_case_index(&mut self) -> Vec<u64> {
        let mut duplicates = Vec::new();
        self.case_index.clear();
        for (position, case) in self.tests.iter().enumerate() {
            if self.case_index.contains_key(&case.case_id) {
                duplicates.push(case.case_id);
            } else {
                self.case_index.insert(case.case_id, position);
            }
        }
        duplicates
    }

    pub fn find_case(&self, case_id: u64) -> Option<&TestCase> {
        self.case_index
            .get(&case_id)
            .and_then(|&position| self.tests.get(position))
    }

    /// True only when the group declares the literal `preHash` mode.
    pub fn declares_pre_hash(&self) -> bool {
        self.metadata
            .get("preHash")
            .and_then(FieldValue::as_str)
            .map_or(false, |mode| mode == PREHASH_SENTINEL)
    }

    pub fn signature_interface(&self) -> Option<String> {
        self.metadata
            .get("signatureInterface")
            .and_then(FieldValue::as_flag_value)
    }

    pub fn deterministic(&self) -> Option<bool> {
        self.metadata.get("deterministic").and_then(FieldValue::as_bool)
    }
}

/// ----------------------------------------------------------------
/// 3. Whole vector file – ACVP JSON format
/// ----------------------------------------------------------------
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VectorDocument {
    #[serde(default)]
    pub vs_id: Option<u64>,
    #[serde(default)]
    pub algorithm: Option<String>,
    #[serde(default)]
    pub mode: Option<String>,
    #[serde(default)]
    pub revision: Option<String>,
    #[serde(rename = "testGroups")]
    pub groups: Vec<TestGroup>,
}

/// The three test families exercised against the subject.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize)]
pub enum TestFamily {
    #[serde(rename = "keyGen")]
    KeyGen,
    #[serde(rename = "sigGen")]
    SigGen,
    #[serde(rename = "sigVer")]
    SigVer,
}

impl TestFamily {
    pub const ALL: [TestFamily; 3] = [TestFamily::KeyGen, TestFamily::SigGen, TestFamily::SigVer];

    /// Token passed as the subject's final argument
    pub const fn selector(self) -> &'static str {
        match self {
            TestFamily::KeyGen => KEYGEN_SELECTOR,
            TestFamily::SigGen => SIGGEN_SELECTOR,
            TestFamily::SigVer => SIGVER_SELECTOR,
        }
    }

    /// Directory holding this family's vector files
    pub const fn directory(self) -> &'static str {
        match self {
            TestFamily::KeyGen => KEYGEN_DIR,
            TestFamily::SigGen => SIGGEN_DIR,
            TestFamily::SigVer => SIGVER_DIR,
        }
    }

    pub const fn documents(self) -> &'static [DocumentKind] {
        match self {
            TestFamily::KeyGen | TestFamily::SigGen => {
                &[DocumentKind::Prompt, DocumentKind::ExpectedResults]
            }
            TestFamily::SigVer => &[
                DocumentKind::Prompt,
                DocumentKind::ExpectedResults,
                DocumentKind::InternalProjection,
            ],
        }
    }
}

impl fmt::Display for TestFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.selector())
    }
}

impl FromStr for TestFamily {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TestFamily::ALL
            .into_iter()
            .find(|family| family.selector().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown test family `{s}` (expected keyGen, sigGen or sigVer)"))
    }
}

/// Which of a family's vector files a group or case came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentKind {
    Prompt,
    ExpectedResults,
    InternalProjection,
}

impl DocumentKind {
    pub const fn file_name(self) -> &'static str {
        match self {
            DocumentKind::Prompt => PROMPT_FILE,
            DocumentKind::ExpectedResults => EXPECTED_RESULTS_FILE,
            DocumentKind::InternalProjection => INTERNAL_PROJECTION_FILE,
        }
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.file_name())
    }
}

/// Identity of a reconciled case across the three files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CaseKey {
    pub group_id: u64,
    pub case_id: u64,
}

impl CaseKey {
    pub const fn new(group_id: u64, case_id: u64) -> Self {
        Self { group_id, case_id }
    }
}

impl fmt::Display for CaseKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tgId {} tcId {}", self.group_id, self.case_id)
    }
}

/// ----------------------------------------------------------------
/// 4. Reconciled records, one struct per family
/// ----------------------------------------------------------------
#[derive(Debug, Clone, PartialEq)]
pub struct KeyGenRecord {
    pub key: CaseKey,
    pub parameter_set: String,
    pub fields: CaseFields,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SigGenRecord {
    pub key: CaseKey,
    pub parameter_set: String,
    pub deterministic: bool,
    pub pre_hash: bool,
    /// Left unset when the group does not name one
    pub signature_interface: Option<String>,
    pub context: String,
    pub fields: CaseFields,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SigVerRecord {
    pub key: CaseKey,
    pub parameter_set: String,
    pub pre_hash: bool,
    pub signature_interface: Option<String>,
    /// Always the prompt file's public key
    pub pk: FieldValue,
    pub fields: CaseFields,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MergedRecord {
    KeyGen(KeyGenRecord),
    SigGen(SigGenRecord),
    SigVer(SigVerRecord),
}

impl MergedRecord {
    pub fn family(&self) -> TestFamily {
        match self {
            MergedRecord::KeyGen(_) => TestFamily::KeyGen,
            MergedRecord::SigGen(_) => TestFamily::SigGen,
            MergedRecord::SigVer(_) => TestFamily::SigVer,
        }
    }

    pub fn key(&self) -> CaseKey {
        match self {
            MergedRecord::KeyGen(r) => r.key,
            MergedRecord::SigGen(r) => r.key,
            MergedRecord::SigVer(r) => r.key,
        }
    }

    pub fn parameter_set(&self) -> &str {
        match self {
            MergedRecord::KeyGen(r) => &r.parameter_set,
            MergedRecord::SigGen(r) => &r.parameter_set,
            MergedRecord::SigVer(r) => &r.parameter_set,
        }
    }

    /// Flatten the record back into ACVP field names, typed fields included.
    /// `tcId` is present, `tgId` is not: the subject only knows the former.
    pub fn to_field_map(&self) -> CaseFields {
        let (key, mut map) = match self {
            MergedRecord::KeyGen(r) => {
                let mut map = r.fields.clone();
                map.insert("parameterSet".into(), r.parameter_set.as_str().into());
                (r.key, map)
            }
            MergedRecord::SigGen(r) => {
                let mut map = r.fields.clone();
                map.insert("parameterSet".into(), r.parameter_set.as_str().into());
                map.insert("deterministic".into(), r.deterministic.into());
                map.insert("preHash".into(), r.pre_hash.into());
                map.insert("context".into(), r.context.as_str().into());
                map.insert(
                    "signatureInterface".into(),
                    r.signature_interface.clone().map_or(FieldValue::Null, FieldValue::String),
                );
                (r.key, map)
            }
            MergedRecord::SigVer(r) => {
                let mut map = r.fields.clone();
                map.insert("parameterSet".into(), r.parameter_set.as_str().into());
                map.insert("preHash".into(), r.pre_hash.into());
                map.insert("pk".into(), r.pk.clone());
                map.insert(
                    "signatureInterface".into(),
                    r.signature_interface.clone().map_or(FieldValue::Null, FieldValue::String),
                );
                (r.key, map)
            }
        };
        map.insert("tcId".into(), key.case_id.into());
        map
    }
}
