/*!
 * Tests for error types and conversions
 */

use std::time::Duration;

use tagguard::errors::{AppError, ProviderError, RepairError, StoreError, TranslationError};
use tagguard::validation::QaDetails;

#[test]
fn test_providerError_timeout_shouldBeRetryable() {
    let error = ProviderError::Timeout(Duration::from_secs(5));
    assert!(error.is_retryable());
    assert!(!ProviderError::AuthenticationError("bad key".to_string()).is_retryable());
}

#[test]
fn test_translationError_fromProviderError_shouldWrapCorrectly() {
    let error: TranslationError = ProviderError::ParseError("Invalid JSON".to_string()).into();
    assert!(matches!(error, TranslationError::Service(ProviderError::ParseError(_))));
    assert!(error.to_string().contains("Invalid JSON"));
}

#[test]
fn test_translationError_tokenMismatch_shouldListTokens() {
    let error = TranslationError::TokenMismatch(QaDetails {
        missing: vec![1, 2],
        ..QaDetails::default()
    });
    assert!(error.to_string().contains("missing {1} {2}"));
}

#[test]
fn test_repairError_budgetExhausted_shouldDisplayAttempts() {
    let error = RepairError::BudgetExhausted {
        attempts: 2,
        last_details: QaDetails {
            extra: vec![3],
            ..QaDetails::default()
        },
    };
    let display = error.to_string();
    assert!(display.contains("2 attempt(s)"));
    assert!(display.contains("extra {3}"));
}

#[test]
fn test_storeError_exportBlocked_shouldListUnits() {
    let error = StoreError::ExportBlocked(vec!["u1".to_string(), "u7".to_string()]);
    assert_eq!(error.to_string(), "Export blocked: 2 unit(s) have QA errors (u1, u7)");
}

#[test]
fn test_appError_fromStoreError_shouldWrapCorrectly() {
    let error: AppError = StoreError::UnknownUnit("u9".to_string()).into();
    assert!(matches!(error, AppError::Store(StoreError::UnknownUnit(_))));
}
