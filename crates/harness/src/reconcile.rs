//! Merges prompt, expected-result and internal-projection cases into one
//! record per prompt case.
//!
//! Precedence is explicit and per family:
//!
//! * keyGen / sigGen: result fields override prompt fields.
//! * sigVer: projection fields override result fields, which override prompt
//!   fields; the prompt's `pk` is then restored over all of them.
//!
//! A prompt group or case without a counterpart aborts the whole family.

use crate::error::{HarnessError, Result};
use crate::loader::{FamilyDocuments, VectorIndex};
use crate::model::{
    CaseFields, CaseKey, DocumentKind, FieldValue, KeyGenRecord, MergedRecord, SigGenRecord,
    SigVerRecord, TestCase, TestFamily, TestGroup,
};
use once_cell::sync::Lazy;
use slhdsa_acvp_params::acvp::PREHASH_SENTINEL;
use slhdsa_acvp_params::slh_dsa::PARAMETER_SETS;
use std::collections::HashSet;
use tracing::{debug, warn};

static KNOWN_PARAMETER_SETS: Lazy<HashSet<&'static str>> =
    Lazy::new(|| PARAMETER_SETS.iter().copied().collect());

/// Reconcile whichever family `docs` holds.
pub fn reconcile(docs: &FamilyDocuments) -> Result<Vec<MergedRecord>> {
    let records: Vec<MergedRecord> = match docs.family {
        TestFamily::KeyGen => reconcile_keygen(&docs.prompt, &docs.expected_results)?
            .into_iter()
            .map(MergedRecord::KeyGen)
            .collect(),
        TestFamily::SigGen => reconcile_siggen(&docs.prompt, &docs.expected_results)?
            .into_iter()
            .map(MergedRecord::SigGen)
            .collect(),
        TestFamily::SigVer => {
            let projection =
                docs.internal_projection
                    .as_ref()
                    .ok_or(HarnessError::MissingDocument {
                        family: TestFamily::SigVer,
                        document: DocumentKind::InternalProjection,
                    })?;
            reconcile_sigver(&docs.prompt, &docs.expected_results, projection)?
                .into_iter()
                .map(MergedRecord::SigVer)
                .collect()
        }
    };
    debug!(family = %docs.family, records = records.len(), "reconciled family");
    Ok(records)
}

pub fn reconcile_keygen(prompt: &VectorIndex, results: &VectorIndex) -> Result<Vec<KeyGenRecord>> {
    let family = TestFamily::KeyGen;
    let mut records = Vec::with_capacity(prompt.case_count());

    for group in prompt.groups() {
        let result_group = paired_group(family, DocumentKind::ExpectedResults, results, group.group_id)?;
        let parameter_set = require_parameter_set(family, group)?;

        for case in &group.tests {
            let fields = merge_prompt_with_result(family, result_group, case)?;
            records.push(KeyGenRecord {
                key: CaseKey::new(group.group_id, case.case_id),
                parameter_set: parameter_set.clone(),
                fields: strip_group_fields(fields),
            });
        }
    }
    Ok(records)
}

pub fn reconcile_siggen(prompt: &VectorIndex, results: &VectorIndex) -> Result<Vec<SigGenRecord>> {
    let family = TestFamily::SigGen;
    let mut records = Vec::with_capacity(prompt.case_count());

    for group in prompt.groups() {
        let result_group = paired_group(family, DocumentKind::ExpectedResults, results, group.group_id)?;
        let parameter_set = require_parameter_set(family, group)?;
        let deterministic = group.deterministic().ok_or(HarnessError::MissingField {
            family,
            group_id: group.group_id,
            case_id: None,
            field: "deterministic",
        })?;
        let modes = GroupModes::of(group);

        for case in &group.tests {
            let mut fields = merge_prompt_with_result(family, result_group, case)?;
            let pre_hash = resolve_pre_hash(&mut fields, modes.pre_hash);
            let context = fields
                .remove("context")
                .and_then(|v| v.as_flag_value())
                .unwrap_or_default();

            records.push(SigGenRecord {
                key: CaseKey::new(group.group_id, case.case_id),
                parameter_set: parameter_set.clone(),
                deterministic,
                pre_hash,
                signature_interface: modes.signature_interface.clone(),
                context,
                fields: strip_group_fields(fields),
            });
        }
    }
    Ok(records)
}

pub fn reconcile_sigver(
    prompt: &VectorIndex,
    results: &VectorIndex,
    projection: &VectorIndex,
) -> Result<Vec<SigVerRecord>> {
    let family = TestFamily::SigVer;
    let mut records = Vec::with_capacity(prompt.case_count());

    for group in prompt.groups() {
        let result_group = paired_group(family, DocumentKind::ExpectedResults, results, group.group_id)?;
        let projection_group =
            paired_group(family, DocumentKind::InternalProjection, projection, group.group_id)?;
        let parameter_set = require_parameter_set(family, group)?;
        let modes = GroupModes::of(group);

        for case in &group.tests {
            let pk = case.fields.get("pk").cloned().ok_or(HarnessError::MissingField {
                family,
                group_id: group.group_id,
                case_id: Some(case.case_id),
                field: "pk",
            })?;

            let mut fields = merge_prompt_with_result(family, result_group, case)?;
            let projected = paired_case(
                family,
                DocumentKind::InternalProjection,
                projection_group,
                case.case_id,
            )?;
            overlay(&mut fields, &projected.fields);
            discard_merged_pk(&mut fields);
            let pre_hash = resolve_pre_hash(&mut fields, modes.pre_hash);

            records.push(SigVerRecord {
                key: CaseKey::new(group.group_id, case.case_id),
                parameter_set: parameter_set.clone(),
                pre_hash,
                signature_interface: modes.signature_interface.clone(),
                pk,
                fields: strip_group_fields(fields),
            });
        }
    }
    Ok(records)
}

/// Group-level modes shared by sigGen and sigVer
struct GroupModes {
    pre_hash: bool,
    signature_interface: Option<String>,
}

impl GroupModes {
    fn of(group: &TestGroup) -> Self {
        Self {
            pre_hash: group.declares_pre_hash(),
            signature_interface: group.signature_interface(),
        }
    }
}

fn paired_group<'a>(
    family: TestFamily,
    document: DocumentKind,
    index: &'a VectorIndex,
    group_id: u64,
) -> Result<&'a TestGroup> {
    index.find_group(group_id).ok_or(HarnessError::GroupMismatch {
        family,
        document,
        group_id,
    })
}

fn paired_case<'a>(
    family: TestFamily,
    document: DocumentKind,
    group: &'a TestGroup,
    case_id: u64,
) -> Result<&'a TestCase> {
    group.find_case(case_id).ok_or(HarnessError::CaseMismatch {
        family,
        document,
        group_id: group.group_id,
        case_id,
    })
}

/// Copy every field of `authority` onto `base`, replacing what is there.
fn overlay(base: &mut CaseFields, authority: &CaseFields) {
    for (name, value) in authority {
        base.insert(name.clone(), value.clone());
    }
}

/// Prompt fields, overridden by the matching expected-result case.
fn merge_prompt_with_result(
    family: TestFamily,
    result_group: &TestGroup,
    prompt_case: &TestCase,
) -> Result<CaseFields> {
    let result_case = paired_case(
        family,
        DocumentKind::ExpectedResults,
        result_group,
        prompt_case.case_id,
    )?;

    let mut fields = prompt_case.fields.clone();
    overlay(&mut fields, &result_case.fields);
    Ok(fields)
}

/// The prompt's public key is authoritative. It lives in the record's typed
/// `pk` slot, so whatever the later files merged in under that name is dropped.
fn discard_merged_pk(fields: &mut CaseFields) {
    fields.remove("pk");
}

/// A `preHash` already present on the case wins; otherwise the group mode applies.
fn resolve_pre_hash(fields: &mut CaseFields, group_pre_hash: bool) -> bool {
    match fields.remove("preHash") {
        Some(value) => {
            value.as_bool().unwrap_or(false) || value.as_str() == Some(PREHASH_SENTINEL)
        }
        None => group_pre_hash,
    }
}

/// Fields that are copied down from the group replace any case-level copy.
fn strip_group_fields(mut fields: CaseFields) -> CaseFields {
    for name in ["parameterSet", "deterministic", "signatureInterface", "tgId"] {
        fields.remove(name);
    }
    fields
}

fn require_parameter_set(family: TestFamily, group: &TestGroup) -> Result<String> {
    let parameter_set = group
        .parameter_set
        .clone()
        .filter(|p| !p.is_empty())
        .ok_or(HarnessError::MissingField {
            family,
            group_id: group.group_id,
            case_id: None,
            field: "parameterSet",
        })?;
    if !KNOWN_PARAMETER_SETS.contains(parameter_set.as_str()) {
        warn!(
            %family,
            group_id = group.group_id,
            parameter_set = %parameter_set,
            "parameter set is not one of the FIPS 205 sets"
        );
    }
    Ok(parameter_set)
}
