/*!
 * Integration tests for the store, batch runner and repair passes.
 */

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use tagguard::app_config::Config;
use tagguard::errors::{ProviderError, StoreError};
use tagguard::providers::mock::{MockCall, MockGenerator, MockReply};
use tagguard::translation::{
    BatchRunner, Commit, ExportPolicy, TranslationService, TranslationStrategy, UnitStatus, UnitStore,
};

use crate::common::{self, BOLD_SOURCE, PLACEHOLDER_SOURCE};

/// Answers every whole-segment request with its own source
fn echo(call: &MockCall) -> String {
    let value: serde_json::Value = serde_json::from_str(&call.user).unwrap();
    serde_json::json!({ "translation": value["source"] }).to_string()
}

/// Service that handles one unit at a time so scripted replies stay in order
fn sequential_service(
    translation: Arc<MockGenerator>,
    repair: Arc<MockGenerator>,
    timeout: Duration,
) -> TranslationService {
    TranslationService::new(translation, repair, &Config::default(), timeout, 1)
}

fn shared(store: UnitStore) -> Arc<UnitStore> {
    Arc::new(store)
}

#[tokio::test]
async fn test_translateStore_withManyUnits_shouldCommitAllAndReportProgress() {
    common::init_logging();
    let sources: Vec<(String, String)> = (0..25)
        .map(|i| (format!("seg-{}", i), format!(r#"Step {} <ph id="1"/> done"#, i)))
        .collect();
    let store = shared(UnitStore::from_sources(sources, Default::default()).unwrap());
    let mock = Arc::new(MockGenerator::scripted(vec![]).with_fallback(echo));
    let service = common::mock_service(mock.clone(), Arc::new(MockGenerator::failing()));

    let last = Arc::new(AtomicUsize::new(0));
    let seen = last.clone();
    let summary = service
        .translate_store(store.clone(), &service.batch_runner(), move |done, total| {
            assert_eq!(total, 25);
            seen.fetch_max(done, Ordering::SeqCst);
        })
        .await;

    assert_eq!(summary.translated, 25);
    assert_eq!(summary.total(), 25);
    assert_eq!(last.load(Ordering::SeqCst), 25);
    assert_eq!(mock.call_count(), 25);
    assert!(store.units().iter().all(|u| u.status == UnitStatus::QaOk));
}

#[tokio::test]
async fn test_translateStore_withDroppedTokens_shouldUseChunkFallbackOnce() {
    let store = shared(common::store_of(&[("u1", PLACEHOLDER_SOURCE)]));
    let mock = Arc::new(MockGenerator::scripted(vec![
        MockReply::translation("Appuyez sur le bouton. Puis attendez."),
        MockReply::chunks(&["Appuyez sur le bouton.", "Puis attendez."]),
    ]));
    let service = sequential_service(mock.clone(), Arc::new(MockGenerator::failing()), Duration::from_secs(2));

    let summary = service.translate_store(store.clone(), &service.batch_runner(), |_, _| {}).await;

    assert_eq!(summary.translated, 1);
    assert_eq!(mock.call_count(), 2);
    let unit = store.get("u1").unwrap();
    assert_eq!(unit.target_abstracted.as_deref(), Some("Appuyez sur le bouton.{1}Puis attendez."));
    assert_eq!(
        unit.target_raw.as_deref(),
        Some(r#"Appuyez sur le bouton.<ph id="1">&lt;br/&gt;</ph>Puis attendez."#)
    );
}

#[tokio::test]
async fn test_translate_withTimedOutWholeSegment_shouldFallBackToChunks() {
    let store = common::store_of(&[("u1", BOLD_SOURCE)]);
    let mock = Arc::new(MockGenerator::scripted(vec![
        MockReply::Delayed {
            delay_ms: 2_000,
            text: r#"{"translation": "Bonjour {1}monde{2}"}"#.to_string(),
        },
        MockReply::chunks(&["Bonjour", "monde"]),
    ]));
    let service = sequential_service(mock.clone(), Arc::new(MockGenerator::failing()), Duration::from_millis(50));

    let unit = store.get("u1").unwrap();
    let outcome = service.translator().translate(&unit).await.unwrap();

    assert_eq!(outcome.strategy, TranslationStrategy::ChunkFallback);
    assert_eq!(outcome.target_abstracted, "Bonjour {1}monde{2}");
    assert_eq!(mock.call_count(), 2);
}

#[test]
fn test_translate_withServiceDown_shouldReportFailureWithoutCommit() {
    let store = shared(common::store_of(&[("u1", BOLD_SOURCE)]));
    let service = sequential_service(
        Arc::new(MockGenerator::failing()),
        Arc::new(MockGenerator::failing()),
        Duration::from_secs(1),
    );

    let summary = tokio_test::block_on(service.translate_store(store.clone(), &service.batch_runner(), |_, _| {}));

    assert_eq!(summary.failed, 1);
    let unit = store.get("u1").unwrap();
    assert_eq!(unit.status, UnitStatus::QaError);
    assert!(unit.target_abstracted.is_none());
    assert!(unit.qa_details.failure.as_deref().unwrap().contains("mock service unavailable"));
}

#[tokio::test]
async fn test_translateStore_withImportedBrokenTarget_shouldAutoRepair() {
    let file = tagguard::file_utils::UnitFile::parse(&format!(
        r#"[{{"id": "u1", "source": {}, "target": "Bonjour monde{{2}}"}}]"#,
        serde_json::to_string(BOLD_SOURCE).unwrap()
    ))
    .unwrap();
    let store = shared(file.into_store(Default::default()).unwrap());
    assert_eq!(store.flagged(), vec!["u1".to_string()]);

    let repair = Arc::new(MockGenerator::scripted(vec![MockReply::translation("Bonjour {1}monde{2}")]));
    let service = sequential_service(Arc::new(MockGenerator::failing()), repair.clone(), Duration::from_secs(1));

    let summary = service.translate_store(store.clone(), &service.batch_runner(), |_, _| {}).await;

    assert_eq!(summary.repaired, 1);
    assert_eq!(summary.failed, 0);
    assert_eq!(repair.call_count(), 1);
    assert_eq!(store.get("u1").unwrap().status, UnitStatus::QaOk);
}

#[tokio::test]
async fn test_translateStore_withRejectedTranslation_shouldRepairBeforeCommit() {
    let store = shared(common::store_of(&[("u1", BOLD_SOURCE)]));
    let translation = Arc::new(MockGenerator::scripted(vec![
        MockReply::translation("Bonjour monde"),
        MockReply::Error(ProviderError::ConnectionError("reset".to_string())),
    ]));
    let repair = Arc::new(MockGenerator::scripted(vec![MockReply::translation("Bonjour {1}monde{2}")]));
    let service = sequential_service(translation, repair.clone(), Duration::from_secs(1));

    let summary = service.translate_store(store.clone(), &service.batch_runner(), |_, _| {}).await;

    assert_eq!(summary.repaired, 1);
    assert_eq!(summary.failed, 0);
    assert_eq!(repair.call_count(), 1);
    let unit = store.get("u1").unwrap();
    assert_eq!(unit.status, UnitStatus::QaOk);
    assert_eq!(
        unit.target_raw.as_deref(),
        Some(r#"Bonjour <bpt id="1">&lt;b&gt;</bpt>monde<ept id="1">&lt;/b&gt;</ept>"#)
    );
}

#[tokio::test]
async fn test_translateStore_withRejectedTranslationAndFailedRepair_shouldNotCommitCandidate() {
    let store = shared(common::store_of(&[("u1", BOLD_SOURCE)]));
    let translation = Arc::new(MockGenerator::scripted(vec![
        MockReply::translation("Bonjour monde"),
        MockReply::chunks(&["", ""]),
    ]));
    let repair = Arc::new(MockGenerator::scripted(vec![
        MockReply::translation("Bonjour {1}monde"),
        MockReply::Error(ProviderError::Timeout(Duration::from_secs(1))),
    ]));
    let service = sequential_service(translation, repair.clone(), Duration::from_secs(1));

    let summary = service.translate_store(store.clone(), &service.batch_runner(), |_, _| {}).await;

    assert_eq!(summary.failed, 1);
    assert_eq!(repair.call_count(), 2);
    let unit = store.get("u1").unwrap();
    assert_eq!(unit.status, UnitStatus::QaError);
    assert!(unit.target_abstracted.is_none());
    assert_eq!(unit.qa_details.missing, vec![2]);
}

#[tokio::test]
async fn test_translateStore_withAutoRepairDisabled_shouldOnlyRecordFailure() {
    let store = shared(common::store_of(&[("u1", BOLD_SOURCE)]));
    let translation = Arc::new(MockGenerator::scripted(vec![
        MockReply::translation("Bonjour monde"),
        MockReply::Error(ProviderError::ConnectionError("reset".to_string())),
    ]));
    let repair = Arc::new(MockGenerator::failing());
    let mut config = Config::default();
    config.repair.auto_repair = false;
    let service = TranslationService::new(translation, repair.clone(), &config, Duration::from_secs(1), 1);

    let summary = service.translate_store(store.clone(), &service.batch_runner(), |_, _| {}).await;

    assert_eq!(summary.failed, 1);
    assert_eq!(repair.call_count(), 0);
    assert_eq!(store.get("u1").unwrap().qa_details.missing, vec![1, 2]);
}

#[tokio::test]
async fn test_repairStore_withExhaustedBudget_shouldKeepTargetBitIdentical() {
    let store = shared(common::store_of(&[("u1", BOLD_SOURCE)]));
    let snapshot = store.checkout("u1").unwrap();
    store
        .commit("u1", snapshot.revision, Commit::ManualEdit("Bonjour {2}monde".to_string()))
        .unwrap();
    let before = store.get("u1").unwrap();

    let repair = Arc::new(MockGenerator::scripted(vec![
        MockReply::Error(ProviderError::ConnectionError("reset".to_string())),
        MockReply::translation("Bonjour monde"),
    ]));
    let service = sequential_service(Arc::new(MockGenerator::failing()), repair.clone(), Duration::from_secs(1));

    let summary = service.repair_store(store.clone(), &service.batch_runner(), |_, _| {}).await;

    assert_eq!(summary.failed, 1);
    assert_eq!(repair.call_count(), 2);
    let after = store.get("u1").unwrap();
    assert_eq!(after.target_abstracted, before.target_abstracted);
    assert_eq!(after.status, UnitStatus::QaError);
}

#[tokio::test]
async fn test_translateStore_withCancelledRunner_shouldLeaveUnitsUntranslated() {
    let store = shared(common::store_of(&[("a", BOLD_SOURCE), ("b", PLACEHOLDER_SOURCE)]));
    let mock = Arc::new(MockGenerator::scripted(vec![]).with_fallback(echo));
    let service = common::mock_service(mock.clone(), Arc::new(MockGenerator::failing()));
    let runner: BatchRunner = service.batch_runner();
    runner.cancellation_token().cancel();

    let summary = service.translate_store(store.clone(), &runner, |_, _| {}).await;

    assert_eq!(summary.cancelled, 2);
    assert_eq!(mock.call_count(), 0);
    assert!(store.units().iter().all(|u| u.status == UnitStatus::Untranslated));
}

#[test]
fn test_commit_withStaleRevision_shouldBeRejected() {
    let store = common::store_of(&[("u1", BOLD_SOURCE)]);
    let first = store.checkout("u1").unwrap();
    let second = store.checkout("u1").unwrap();

    store
        .commit("u1", first.revision, Commit::Translation("Bonjour {1}monde{2}".to_string()))
        .unwrap();
    let result = store.commit("u1", second.revision, Commit::ManualEdit("Salut".to_string()));

    assert!(matches!(result, Err(StoreError::StaleRevision { .. })));
    assert_eq!(store.get("u1").unwrap().target_abstracted.as_deref(), Some("Bonjour {1}monde{2}"));
}

#[test]
fn test_export_withFlaggedUnit_shouldHonorPolicy() {
    let store = common::store_of(&[("ok", BOLD_SOURCE), ("bad", PLACEHOLDER_SOURCE), ("new", "Untouched")]);
    let commits = [
        ("ok", "Bonjour {1}monde{2}"),
        ("bad", "Appuyez sur le bouton. Puis attendez."),
    ];
    for (id, target) in commits {
        let snapshot = store.checkout(id).unwrap();
        store
            .commit(id, snapshot.revision, Commit::ManualEdit(target.to_string()))
            .unwrap();
    }

    assert_eq!(
        store.export(ExportPolicy::Strict),
        Err(StoreError::ExportBlocked(vec!["bad".to_string()]))
    );

    let exported = store.export(ExportPolicy::Warn).unwrap();
    assert_eq!(exported[1], ("bad".to_string(), PLACEHOLDER_SOURCE.to_string()));
    assert_eq!(exported[2], ("new".to_string(), "Untouched".to_string()));
    assert!(exported[0].1.starts_with("Bonjour <bpt"));
}
