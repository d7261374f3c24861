/*!
 * Full app lifecycle tests: batch file in, controller run, output file out.
 */

use std::sync::Arc;

use tagguard::app_config::Config;
use tagguard::app_controller::{Controller, RunMode, RunOptions};
use tagguard::file_utils::{FileManager, OutputFile};
use tagguard::providers::mock::{MockCall, MockGenerator, MockReply};
use tagguard::translation::{ExportPolicy, UnitStatus};

use crate::common::{self, BOLD_SOURCE, PLACEHOLDER_SOURCE};

/// Uppercases the text of every whole-segment request, keeping tokens
fn shout(call: &MockCall) -> String {
    let value: serde_json::Value = serde_json::from_str(&call.user).unwrap();
    let source = value["source"].as_str().unwrap_or_default();
    serde_json::json!({ "translation": source.to_uppercase() }).to_string()
}

fn batch_json() -> String {
    serde_json::json!({
        "units": [
            {"id": "1", "source": BOLD_SOURCE},
            {"id": "2", "source": PLACEHOLDER_SOURCE},
            {"id": "3", "source": "Only plain text here"},
        ]
    })
    .to_string()
}

fn options(mode: RunMode, export_policy: ExportPolicy) -> RunOptions {
    RunOptions {
        mode,
        retranslate: false,
        export_policy,
    }
}

fn read_output(path: &std::path::Path) -> OutputFile {
    serde_json::from_str(&FileManager::read_to_string(path).unwrap()).unwrap()
}

#[tokio::test]
async fn test_run_withWorkingService_shouldWriteRestoredTargets() {
    common::init_logging();
    let dir = common::create_temp_dir().unwrap();
    let input = common::create_test_file(dir.path(), "units.json", &batch_json()).unwrap();
    let output = dir.path().join("out").join("result.json");

    let mock = Arc::new(MockGenerator::scripted(vec![]).with_fallback(shout));
    let service = common::mock_service(mock, Arc::new(MockGenerator::failing()));
    let controller = Controller::with_service(Config::default(), service);

    let summary = controller
        .run(&input, &output, options(RunMode::Translate, ExportPolicy::Strict))
        .await
        .unwrap();

    assert_eq!(summary.translated, 3);
    let result = read_output(&output);
    assert_eq!(result.units.len(), 3);
    assert!(result.units.iter().all(|u| u.status == UnitStatus::QaOk));
    assert_eq!(
        result.units[0].target,
        r#"HELLO <bpt id="1">&lt;b&gt;</bpt>WORLD<ept id="1">&lt;/b&gt;</ept>"#
    );
    assert_eq!(result.units[2].target, "ONLY PLAIN TEXT HERE");
}

#[tokio::test]
async fn test_run_withFailingServiceAndStrictExport_shouldRefuseToWrite() {
    let dir = common::create_temp_dir().unwrap();
    let input = common::create_test_file(dir.path(), "units.json", &batch_json()).unwrap();
    let output = dir.path().join("result.json");

    let service = common::mock_service(Arc::new(MockGenerator::failing()), Arc::new(MockGenerator::failing()));
    let controller = Controller::with_service(Config::default(), service);

    let result = controller
        .run(&input, &output, options(RunMode::Translate, ExportPolicy::Strict))
        .await;

    assert!(result.is_err());
    assert!(!output.exists());
}

#[tokio::test]
async fn test_run_withFailingServiceAndWarnExport_shouldExportSources() {
    let dir = common::create_temp_dir().unwrap();
    let input = common::create_test_file(dir.path(), "units.json", &batch_json()).unwrap();
    let output = dir.path().join("result.json");

    let service = common::mock_service(Arc::new(MockGenerator::failing()), Arc::new(MockGenerator::failing()));
    let controller = Controller::with_service(Config::default(), service);

    let summary = controller
        .run(&input, &output, options(RunMode::Translate, ExportPolicy::Warn))
        .await
        .unwrap();

    assert_eq!(summary.failed, 3);
    let result = read_output(&output);
    assert_eq!(result.units[1].target, PLACEHOLDER_SOURCE);
    assert_eq!(result.units[1].status, UnitStatus::QaError);
    assert!(result.units[1].qa.failure.is_some());
}

#[tokio::test]
async fn test_run_inRepairMode_shouldOnlyFixFlaggedUnits() {
    let dir = common::create_temp_dir().unwrap();
    let batch = serde_json::json!([
        {"id": "good", "source": BOLD_SOURCE, "target": "Bonjour {1}monde{2}"},
        {"id": "broken", "source": PLACEHOLDER_SOURCE, "target": "Appuyez. Attendez."},
        {"id": "pending", "source": "Not translated yet"},
    ]);
    let input = common::create_test_file(dir.path(), "units.json", &batch.to_string()).unwrap();
    let output = dir.path().join("fixed.json");

    let translation = Arc::new(MockGenerator::failing());
    let repair = Arc::new(MockGenerator::scripted(vec![MockReply::translation("Appuyez.{1}Attendez.")]));
    let service = common::mock_service(translation.clone(), repair.clone());
    let controller = Controller::with_service(Config::default(), service);

    let summary = controller
        .run(&input, &output, options(RunMode::Repair, ExportPolicy::Strict))
        .await
        .unwrap();

    assert_eq!(summary.repaired, 1);
    assert_eq!(translation.call_count(), 0);
    assert_eq!(repair.call_count(), 1);

    let result = read_output(&output);
    assert_eq!(result.units[0].status, UnitStatus::QaOk);
    assert_eq!(result.units[1].target, r#"Appuyez.<ph id="1">&lt;br/&gt;</ph>Attendez."#);
    assert_eq!(result.units[2].status, UnitStatus::Untranslated);
    assert_eq!(result.units[2].target, "Not translated yet");
}

#[tokio::test]
async fn test_refine_withInstruction_shouldRewriteOneUnitOnly() {
    let dir = common::create_temp_dir().unwrap();
    let batch = serde_json::json!([
        {"id": "a", "source": BOLD_SOURCE, "target": "Salut {1}monde{2}"},
        {"id": "b", "source": PLACEHOLDER_SOURCE, "target": "Appuyez.{1}Attendez."},
    ]);
    let input = common::create_test_file(dir.path(), "units.json", &batch.to_string()).unwrap();
    let output = dir.path().join("refined.json");

    let translation = Arc::new(MockGenerator::scripted(vec![MockReply::translation("Bonjour {1}le monde{2}")]));
    let service = common::mock_service(translation.clone(), Arc::new(MockGenerator::failing()));
    let controller = Controller::with_service(Config::default(), service);

    let qa = controller
        .refine(&input, &output, "a", "Use a formal greeting", ExportPolicy::Strict)
        .await
        .unwrap();

    assert!(qa.is_valid());
    assert_eq!(translation.call_count(), 1);
    assert!(translation.calls()[0].user.contains("Use a formal greeting"));
    let result = read_output(&output);
    assert_eq!(
        result.units[0].target,
        r#"Bonjour <bpt id="1">&lt;b&gt;</bpt>le monde<ept id="1">&lt;/b&gt;</ept>"#
    );
    assert_eq!(result.units[1].target, r#"Appuyez.<ph id="1">&lt;br/&gt;</ph>Attendez."#);
}

#[tokio::test]
async fn test_refine_withUnknownUnit_shouldFailWithoutOutput() {
    let dir = common::create_temp_dir().unwrap();
    let input = common::create_test_file(dir.path(), "units.json", &batch_json()).unwrap();
    let output = dir.path().join("refined.json");

    let service = common::mock_service(Arc::new(MockGenerator::failing()), Arc::new(MockGenerator::failing()));
    let controller = Controller::with_service(Config::default(), service);

    let result = controller
        .refine(&input, &output, "missing", "Shorter", ExportPolicy::Warn)
        .await;

    assert!(result.is_err());
    assert!(!output.exists());
}
