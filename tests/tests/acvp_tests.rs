// tests/acvp_tests.rs
use slhdsa_acvp_harness::reconcile::reconcile;
use slhdsa_acvp_harness::{
    prepare, prepare_family, run_prepared, CaseKey, FamilyDocuments, FamilyFiles, HarnessConfig,
    HarnessError, Invocation, MergedRecord, Runner, TestFamily, Verdict,
};
use slhdsa_acvp_tests::{acvp_json_dir, copy_fixtures, ScriptedEngine};
use std::fs;

fn reconciled(family: TestFamily) -> Vec<MergedRecord> {
    let files = FamilyFiles::locate(&acvp_json_dir(), family);
    let docs = FamilyDocuments::load(&files).expect("fixture vectors load");
    reconcile(&docs).expect("fixture vectors reconcile")
}

fn invocation(family: TestFamily, case_id: u64) -> Invocation {
    let record = reconciled(family)
        .into_iter()
        .find(|record| record.key().case_id == case_id)
        .expect("case present in fixtures");
    Invocation::build(&record)
}

#[test]
fn every_prompt_case_yields_one_record() {
    for family in TestFamily::ALL {
        let records = reconciled(family);
        let ids: Vec<u64> = records.iter().map(|r| r.key().case_id).collect();
        assert_eq!(ids, vec![1, 2, 3, 4], "{family}");
        assert!(records.iter().all(|r| r.family() == family));
    }
}

#[test]
fn keygen_merges_expected_keys_into_prompt() {
    let args = invocation(TestFamily::KeyGen, 1);
    assert_eq!(args.flag("parameterSet"), Some("SLH-DSA-SHA2-128s"));
    assert_eq!(args.flag("deferred"), Some("False"));
    assert_eq!(args.flag("skSeed"), Some("1F262D343B424950575E656C737A8188"));
    assert!(args.flag("pk").is_some());
    assert!(args.flag("sk").is_some());
    assert_eq!(args.flag("tgId"), None);
    assert_eq!(args.args.last().map(String::as_str), Some("keyGen"));
}

#[test]
fn siggen_group_modes_become_flags() {
    let pure = invocation(TestFamily::SigGen, 1);
    assert_eq!(pure.flag("deterministic"), Some("True"));
    assert_eq!(pure.flag("preHash"), Some("False"));
    assert_eq!(pure.flag("signatureInterface"), Some("external"));
    assert_eq!(pure.flag("context"), Some("363D444B52596067"));
    assert!(pure.flag("signature").is_some());

    // No context in the prompt: the empty default is never passed along.
    let no_context = invocation(TestFamily::SigGen, 2);
    assert_eq!(no_context.flag("context"), None);

    let pre_hashed = invocation(TestFamily::SigGen, 3);
    assert_eq!(pre_hashed.flag("deterministic"), Some("False"));
    assert_eq!(pre_hashed.flag("preHash"), Some("True"));
    assert_eq!(pre_hashed.flag("hashAlg"), Some("SHA2-256"));
    assert_eq!(pre_hashed.flag("signatureInterface"), None);
    assert!(pre_hashed.flag("additionalRandomness").is_some());
}

#[test]
fn sigver_projection_wins_except_for_pk() {
    let first = invocation(TestFamily::SigVer, 1);
    assert_eq!(
        first.flag("message"),
        Some("99A0A7AEB5BCC3CAD1D8DFE6EDF4FB020910171E252C333A41484F565D646B72")
    );
    assert_eq!(first.flag("testPassed"), Some("True"));
    assert_eq!(first.flag("signatureInterface"), Some("internal"));
    assert_eq!(first.flag("preHash"), Some("False"));
    assert!(first.flag("reason").is_some());

    // The projection carries a zeroed pk for this case; the prompt's must survive.
    let stale = invocation(TestFamily::SigVer, 3);
    assert_eq!(
        stale.flag("pk"),
        Some("7980878E959CA3AAB1B8BFC6CDD4DBE2E9F0F7FE050C131A21282F363D444B52")
    );
    assert_eq!(stale.flag("preHash"), Some("True"));
    assert_eq!(stale.flag("hashAlg"), Some("SHAKE-128"));

    match reconciled(TestFamily::SigVer).remove(2) {
        MergedRecord::SigVer(record) => {
            assert_eq!(record.key, CaseKey::new(2, 3));
            assert_eq!(record.parameter_set, "SLH-DSA-SHAKE-128s");
            assert!(record.pre_hash);
        }
        other => panic!("expected a sigVer record, got {other:?}"),
    }
}

#[test]
fn full_run_with_in_process_subject() {
    let config = HarnessConfig::default().with_vectors_root(acvp_json_dir());
    let prepared = prepare(&config).expect("fixtures prepare");
    assert_eq!(prepared.len(), 3);

    let engine = ScriptedEngine::failing([CaseKey::new(2, 4)]);
    let mut out = Vec::new();
    let summary = run_prepared(&prepared, &engine, 4, &mut out);

    // Every family has a case 4 in group 2, so each contributes one failure.
    assert_eq!(summary.total_passed(), 9);
    assert_eq!(summary.total_failed(), 3);
    assert_eq!(summary.verdict(), Verdict::Failure);
    assert_eq!(engine.seen().len(), 12);

    let echoed = String::from_utf8(out).expect("utf-8 echo");
    assert_eq!(echoed.matches("[PASS]").count(), 9);
    assert_eq!(echoed.matches("Error: case tgId 2 tcId 4 rejected").count(), 3);
}

#[test]
fn family_selection_limits_the_run() {
    let config = HarnessConfig::default()
        .with_vectors_root(acvp_json_dir())
        .with_families([TestFamily::SigVer]);
    let prepared = prepare(&config).expect("fixtures prepare");
    assert_eq!(prepared.len(), 1);
    assert_eq!(prepared[0].family, TestFamily::SigVer);

    let engine = ScriptedEngine::passing();
    let summary = run_prepared(&prepared, &engine, 2, &mut Vec::new());
    assert_eq!(summary.total_passed(), 4);
    assert_eq!(summary.verdict(), Verdict::Success);
    assert!(engine
        .seen()
        .iter()
        .all(|invocation| invocation.family == TestFamily::SigVer));
}

#[cfg(unix)]
#[test]
fn full_run_through_subprocess_subject() {
    // Reports a failure for every tcId 2, passes everything else.
    let script = r#"
        while [ $# -gt 1 ]; do
            if [ "$1" = -tcId ]; then id=$2; fi
            shift 2
        done
        if [ "$id" = 2 ]; then
            echo "[FAIL] $id $1"
            echo "tcId $id mismatch" >&2
            exit 1
        fi
        echo "[PASS] $id $1"
    "#;
    let config = HarnessConfig::default()
        .with_vectors_root(acvp_json_dir())
        .with_subject("sh")
        .with_subject_args(["-c", script, "xfips205"])
        .with_jobs(3)
        .with_timeout_secs(30);
    let prepared = prepare(&config).expect("fixtures prepare");

    let engine = slhdsa_acvp_harness::SubprocessEngine::from_config(&config);
    let mut out = Vec::new();
    let summary = run_prepared(&prepared, &engine, config.effective_jobs(), &mut out);

    assert_eq!(summary.total_passed(), 9);
    assert_eq!(summary.total_failed(), 3);
    let echoed = String::from_utf8(out).expect("utf-8 echo");
    assert!(echoed.contains("[PASS] 1 keyGen"));
    assert!(echoed.contains("[PASS] 4 sigVer"));
    assert!(echoed.contains("Error: tcId 2 mismatch"));
}

#[test]
fn missing_result_case_aborts_before_dispatch() {
    let dir = tempfile::tempdir().expect("tempdir");
    copy_fixtures(dir.path()).expect("copy fixtures");

    let results = dir
        .path()
        .join(TestFamily::SigGen.directory())
        .join("expectedResults.json");
    let mut json: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&results).expect("read results"))
            .expect("parse results");
    json["testGroups"][1]["tests"]
        .as_array_mut()
        .expect("tests array")
        .retain(|case| case["tcId"] != 4);
    fs::write(&results, json.to_string()).expect("write results");

    let config = HarnessConfig::default().with_vectors_root(dir.path());
    let err = prepare(&config).expect_err("mismatch must abort");
    assert!(matches!(
        err,
        HarnessError::CaseMismatch {
            family: TestFamily::SigGen,
            group_id: 2,
            case_id: 4,
            ..
        }
    ));
    assert_eq!(
        err.to_string(),
        "sigGen: no case with tcId 4 in group 2 of expectedResults.json"
    );
}

#[test]
fn missing_projection_is_a_missing_vector_set() {
    let dir = tempfile::tempdir().expect("tempdir");
    copy_fixtures(dir.path()).expect("copy fixtures");
    fs::remove_file(
        dir.path()
            .join(TestFamily::SigVer.directory())
            .join("internalProjection.json"),
    )
    .expect("remove projection");

    assert!(prepare_family(dir.path(), TestFamily::KeyGen).is_ok());
    let err = prepare_family(dir.path(), TestFamily::SigVer).expect_err("projection required");
    assert!(err.is_missing_vectors());
}

#[test]
fn absent_vector_tree_reports_missing_vectors() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = HarnessConfig::default()
        .with_vectors_root(dir.path())
        .with_vector_version("v1.1.0.40");
    let err = prepare(&config).expect_err("nothing to load");
    assert!(err.is_missing_vectors());
}

#[test]
fn hundred_invocations_with_three_failures() {
    let failing = [CaseKey::new(1, 7), CaseKey::new(1, 42), CaseKey::new(1, 99)];
    let invocations: Vec<Invocation> = (1..=100)
        .map(|case_id| Invocation {
            family: TestFamily::KeyGen,
            key: CaseKey::new(1, case_id),
            args: vec![
                "-tcId".to_string(),
                case_id.to_string(),
                "keyGen".to_string(),
            ],
        })
        .collect();

    let engine = ScriptedEngine::failing(failing);
    let completions = Runner::new(&engine, 8).run_collect(&invocations);
    assert_eq!(completions.len(), 100);

    let prepared = vec![slhdsa_acvp_harness::PreparedFamily {
        family: TestFamily::KeyGen,
        invocations,
    }];
    let summary = run_prepared(&prepared, &engine, 8, &mut Vec::new());
    assert_eq!(summary.total_passed(), 97);
    assert_eq!(summary.total_failed(), 3);
    assert_eq!(summary.verdict(), Verdict::Failure);
    assert_eq!(summary.exit_code(), 1);
}

#[cfg(unix)]
#[test]
fn subject_that_hangs_is_timed_out() {
    let prepared = prepare_family(&acvp_json_dir(), TestFamily::KeyGen).expect("fixtures prepare");
    // The shell forks `sleep`, which still holds the output pipes after the shell is killed.
    let engine = slhdsa_acvp_tests::sh_subject("sleep 5; true")
        .with_timeout(Some(std::time::Duration::from_millis(200)));

    let started = std::time::Instant::now();
    let completions = Runner::new(&engine, 4).run_collect(&prepared.invocations);
    assert!(started.elapsed() < std::time::Duration::from_secs(3));
    assert_eq!(completions.len(), 4);
    assert!(completions
        .iter()
        .all(|completion| completion.result.exit_code == slhdsa_acvp_params::acvp::TIMEOUT_EXIT_CODE));
}
