/*!
 * End-to-end token scenarios through the store, translator and repair loop.
 */

use std::sync::Arc;
use std::time::Duration;

use tagguard::errors::{ProviderError, RepairError};
use tagguard::markup::tokens;
use tagguard::providers::mock::{MockGenerator, MockReply};
use tagguard::translation::{
    Commit, PromptBuilder, RepairEngine, StyleProfile, TokenSafeTranslator, UnitStatus, UnitStore,
};
use tagguard::validation::{QaStatus, ValidationService};

use crate::common::{self, BOLD_SOURCE};

fn prompts() -> PromptBuilder {
    PromptBuilder::new("en", "fr", StyleProfile::default())
}

fn translator(mock: Arc<MockGenerator>) -> TokenSafeTranslator {
    TokenSafeTranslator::new(mock, prompts(), ValidationService::default(), Duration::from_secs(2))
}

fn repair_engine(mock: Arc<MockGenerator>) -> RepairEngine {
    RepairEngine::new(mock, prompts(), ValidationService::default(), Duration::from_secs(2))
}

/// Store with one bold unit whose target was committed as a manual edit
fn store_with_target(target: &str) -> UnitStore {
    let store = common::store_of(&[("u1", BOLD_SOURCE)]);
    let snapshot = store.checkout("u1").unwrap();
    store
        .commit("u1", snapshot.revision, Commit::ManualEdit(target.to_string()))
        .unwrap();
    store
}

#[tokio::test]
async fn test_scenario_wellFormedTranslation_shouldRestoreMarkers() {
    common::init_logging();
    let store = common::store_of(&[("u1", BOLD_SOURCE)]);
    let mock = Arc::new(MockGenerator::scripted(vec![MockReply::translation("Bonjour {1}monde{2}")]));

    let snapshot = store.checkout("u1").unwrap();
    assert_eq!(snapshot.unit.source_abstracted, "Hello {1}world{2}");
    let outcome = translator(mock).translate(&snapshot.unit).await.unwrap();
    let qa = store
        .commit("u1", snapshot.revision, Commit::Translation(outcome.target_abstracted))
        .unwrap();

    assert_eq!(qa.status, QaStatus::Ok);
    let unit = store.get("u1").unwrap();
    assert_eq!(unit.status, UnitStatus::QaOk);
    assert_eq!(
        unit.target_raw.as_deref(),
        Some(r#"Bonjour <bpt id="1">&lt;b&gt;</bpt>monde<ept id="1">&lt;/b&gt;</ept>"#)
    );
}

#[tokio::test]
async fn test_scenario_droppedTokens_shouldBeRepairedWithinBudget() {
    let store = Arc::new(common::store_of(&[("u1", BOLD_SOURCE)]));
    let translation = Arc::new(MockGenerator::scripted(vec![
        MockReply::translation("Bonjour monde"),
        MockReply::Error(ProviderError::ConnectionError("reset".to_string())),
    ]));
    let repair = Arc::new(MockGenerator::scripted(vec![
        MockReply::translation("Bonjour {1}monde"),
        MockReply::translation("Bonjour {1}monde{2}"),
    ]));
    let service = common::mock_service(translation.clone(), repair.clone());

    let summary = service
        .translate_store(store.clone(), &service.batch_runner(), |_, _| {})
        .await;

    assert_eq!(summary.repaired, 1);
    assert_eq!(summary.failed, 0);
    assert_eq!(translation.call_count(), 2);
    assert_eq!(repair.call_count(), 2);
    let unit = store.get("u1").unwrap();
    assert_eq!(unit.status, UnitStatus::QaOk);
    assert_eq!(unit.target_abstracted.as_deref(), Some("Bonjour {1}monde{2}"));

    // The refined request names the token the first answer missed
    let calls = repair.calls();
    assert!(calls[0].user.contains(r#""broken_translation":"Bonjour monde""#));
    assert!(calls[1].user.contains("Your last answer was missing {2}"));
}

#[test]
fn test_scenario_unknownToken_shouldBeFlaggedExtra() {
    let store = store_with_target("Bonjour {1}{3}monde{2}");
    let unit = store.get("u1").unwrap();
    assert_eq!(unit.status, UnitStatus::QaError);
    assert_eq!(unit.qa_details.extra, vec![3]);
    assert!(unit.target_raw.is_none());
}

#[test]
fn test_scenario_emptyTarget_shouldBeFlaggedRegardlessOfTokens() {
    let store = common::store_of(&[("plain", "Plain sentence without markup")]);
    let snapshot = store.checkout("plain").unwrap();
    let qa = store
        .commit("plain", snapshot.revision, Commit::ManualEdit(String::new()))
        .unwrap();

    assert_eq!(qa.status, QaStatus::Error);
    assert!(qa.details.empty_target);
    assert!(qa.details.missing.is_empty() && qa.details.extra.is_empty());
}

#[tokio::test]
async fn test_scenario_exhaustedRepair_shouldLeaveTargetUnchanged() {
    let store = store_with_target("Bonjour monde");
    let before = store.get("u1").unwrap();

    let mock = Arc::new(MockGenerator::scripted(vec![
        MockReply::translation("Bonjour {1}monde"),
        MockReply::translation("Bonjour {1}{1}monde"),
    ]));
    let snapshot = store.checkout("u1").unwrap();
    let result = repair_engine(mock.clone()).repair(&snapshot.unit, 2).await;

    match result {
        Err(RepairError::BudgetExhausted { attempts, last_details }) => {
            assert_eq!(attempts, 2);
            assert_eq!(last_details.extra, vec![1]);
            store
                .commit("u1", snapshot.revision, Commit::Failed(last_details))
                .unwrap();
        }
        other => panic!("expected budget exhaustion, got {:?}", other.map(|_| ())),
    }

    let after = store.get("u1").unwrap();
    assert_eq!(mock.call_count(), 2);
    assert_eq!(after.status, UnitStatus::QaError);
    assert_eq!(after.target_abstracted, before.target_abstracted);
    assert_eq!(after.target_abstracted.as_deref(), Some("Bonjour monde"));
}

#[test]
fn test_multisetInvariant_forQaOkUnits_shouldHoldAfterCommits() {
    let store = common::store_of(&[
        ("a", BOLD_SOURCE),
        ("b", r#"<ph id="1"/> and <ph id="2"/> twice"#),
        ("c", "No markup here at all"),
    ]);
    let targets = [
        ("a", "Bonjour {2}monde{1}"),
        ("b", "{2} et {1} deux fois"),
        ("c", "Aucun balisage ici"),
    ];
    for (id, target) in targets {
        let snapshot = store.checkout(id).unwrap();
        store
            .commit(id, snapshot.revision, Commit::Translation(target.to_string()))
            .unwrap();
    }

    for unit in store.units() {
        if unit.status == UnitStatus::QaOk {
            let target = unit.target_abstracted.as_deref().unwrap();
            assert_eq!(
                tokens::token_counts(target),
                tokens::token_counts(&unit.source_abstracted)
            );
        }
    }
    // Inverted pair is only a warning
    assert_eq!(store.get("a").unwrap().status, UnitStatus::QaWarning);
}
