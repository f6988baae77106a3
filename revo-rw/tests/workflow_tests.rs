//! End-to-end workflow tests against a stub verification backend

mod support;

use revo_common::Error;
use revo_rw::models::ReturnState;
use std::time::Duration;
use support::{
    approve_analysis, engine, engine_with_store, reject_analysis, spawn_backend, INELIGIBLE_CODE,
    KNOWN_CODE,
};

#[tokio::test]
async fn unknown_code_creates_no_record() {
    let (_stub, base_url) = spawn_backend().await;
    let (orch, _events, store) = engine_with_store(&base_url);

    let result = orch.scan("0000000000").await;
    assert!(matches!(result, Err(Error::NotFound(_))));
    assert!(store.is_empty().await);
}

#[tokio::test]
async fn ineligible_product_is_rejected_at_scan() {
    let (_stub, base_url) = spawn_backend().await;
    let (orch, _events, store) = engine_with_store(&base_url);

    let result = orch.scan(INELIGIBLE_CODE).await;
    assert!(matches!(result, Err(Error::Validation(_))));
    assert!(store.is_empty().await);
}

#[tokio::test]
async fn full_flow_approves_with_wear_adjusted_refund() {
    let (stub, base_url) = spawn_backend().await;
    let (orch, events) = engine(&base_url);
    let mut rx = events.subscribe();

    let record = orch.scan(KNOWN_CODE).await.unwrap();
    assert_eq!(record.state, ReturnState::Initiated);

    let record = orch.select_reason(record.id, "damaged").await.unwrap();
    assert_eq!(record.state, ReturnState::Capturing);
    assert_eq!(record.evidence.len(), 4);

    // damaged requires overview, damage and closeup; capture two, skip one
    orch.capture(record.id, "overview", vec![0xff; 16]).await.unwrap();
    orch.capture(record.id, "damage", vec![0xff; 16]).await.unwrap();
    orch.skip(record.id, "closeup").await.unwrap();

    // Default stub analysis: approve, confidence 0.85, moderate wear
    let decided = orch.submit(record.id).await.unwrap();

    // $100 at moderate wear refunds 75%; backend notified, return closed
    assert_eq!(decided.state, ReturnState::Completed);
    assert_eq!(decided.refund_amount, Some(75.0));
    assert!(decided.analysis.is_some());
    assert_eq!(stub.approvals.load(std::sync::atomic::Ordering::SeqCst), 1);
    assert_eq!(stub.uploads.load(std::sync::atomic::Ordering::SeqCst), 2);

    let mut names = Vec::new();
    while let Ok(event) = rx.try_recv() {
        names.push(event.name());
    }
    assert_eq!(
        names,
        vec![
            "ReturnStarted",
            "ReasonSelected",
            "EvidenceCaptured",
            "EvidenceCaptured",
            "EvidenceSkipped",
            "AnalysisStarted",
            "AnalysisCompleted",
            "DecisionReached",
        ]
    );
}

#[tokio::test]
async fn submit_with_missing_required_evidence_names_the_gap() {
    let (_stub, base_url) = spawn_backend().await;
    let (orch, _events) = engine(&base_url);

    let record = orch.scan(KNOWN_CODE).await.unwrap();
    orch.select_reason(record.id, "damaged").await.unwrap();
    orch.capture(record.id, "overview", vec![0xff; 16]).await.unwrap();

    let err = orch.submit(record.id).await.unwrap_err();
    match err {
        Error::Validation(msg) => {
            assert!(msg.contains("damage"), "missing steps not named: {msg}");
            assert!(msg.contains("closeup"), "missing steps not named: {msg}");
        }
        other => panic!("expected validation error, got {other:?}"),
    }

    // The failed submit left the record untouched
    let snapshot = orch.snapshot(record.id).await.unwrap();
    assert_eq!(snapshot.state, ReturnState::Capturing);
    assert!(snapshot.analysis.is_none());
}

#[tokio::test]
async fn low_confidence_reject_routes_to_review() {
    let (stub, base_url) = spawn_backend().await;
    let (orch, _events) = engine(&base_url);
    stub.set_analysis(reject_analysis(0.5));

    let record = orch.scan(KNOWN_CODE).await.unwrap();
    orch.select_reason(record.id, "changed_mind").await.unwrap();
    orch.capture(record.id, "overview", vec![0xff; 16]).await.unwrap();

    let decided = orch.submit(record.id).await.unwrap();
    assert_eq!(decided.state, ReturnState::Review);
    assert!(decided.refund_amount.is_none());
    // Review is local; the backend is not notified either way
    assert_eq!(stub.rejections.load(std::sync::atomic::Ordering::SeqCst), 0);
}

#[tokio::test]
async fn confident_reject_is_rejected_and_reported() {
    let (stub, base_url) = spawn_backend().await;
    let (orch, _events) = engine(&base_url);
    stub.set_analysis(reject_analysis(0.7));

    let record = orch.scan(KNOWN_CODE).await.unwrap();
    orch.select_reason(record.id, "changed_mind").await.unwrap();
    orch.capture(record.id, "overview", vec![0xff; 16]).await.unwrap();

    let decided = orch.submit(record.id).await.unwrap();
    assert_eq!(decided.state, ReturnState::Completed);
    assert!(decided.refund_amount.is_none());
    assert_eq!(stub.rejections.load(std::sync::atomic::Ordering::SeqCst), 1);
}

#[tokio::test]
async fn borderline_approve_without_high_confidence_goes_to_review() {
    let (stub, base_url) = spawn_backend().await;
    let (orch, _events) = engine(&base_url);
    stub.set_analysis(approve_analysis(0.7, "new"));

    let record = orch.scan(KNOWN_CODE).await.unwrap();
    orch.select_reason(record.id, "changed_mind").await.unwrap();
    orch.capture(record.id, "overview", vec![0xff; 16]).await.unwrap();

    let decided = orch.submit(record.id).await.unwrap();
    assert_eq!(decided.state, ReturnState::Review);
    assert_eq!(stub.approvals.load(std::sync::atomic::Ordering::SeqCst), 0);
}

#[tokio::test]
async fn corrupt_analysis_is_fatal_and_reverts_to_capturing() {
    let (stub, base_url) = spawn_backend().await;
    let (orch, events) = engine(&base_url);
    // Out-of-range confidence makes the payload malformed
    stub.set_analysis(approve_analysis(1.5, "moderate"));
    let mut rx = events.subscribe();

    let record = orch.scan(KNOWN_CODE).await.unwrap();
    orch.select_reason(record.id, "changed_mind").await.unwrap();
    orch.capture(record.id, "overview", vec![0xff; 16]).await.unwrap();

    let err = orch.submit(record.id).await.unwrap_err();
    assert!(matches!(err, Error::CorruptResult(_)), "got {err:?}");
    assert!(!err.is_retryable());

    // The record is back in the pre-submission state, nothing attached
    let snapshot = orch.snapshot(record.id).await.unwrap();
    assert_eq!(snapshot.state, ReturnState::Capturing);
    assert!(snapshot.analysis.is_none());
    assert!(snapshot.refund_amount.is_none());
    assert!(snapshot.evidence.iter().any(|e| e.is_captured()));

    let names: Vec<_> = std::iter::from_fn(|| rx.try_recv().ok().map(|e| e.name())).collect();
    assert!(names.contains(&"SubmissionFailed"));
    assert!(!names.contains(&"AnalysisCompleted"));

    // A clean resubmission succeeds once the backend behaves
    stub.set_analysis(approve_analysis(0.85, "moderate"));
    let decided = orch.submit(record.id).await.unwrap();
    assert_eq!(decided.state, ReturnState::Completed);
    assert_eq!(decided.refund_amount, Some(75.0));
}

#[tokio::test]
async fn backend_view_of_a_return_is_queryable() {
    let (_stub, base_url) = spawn_backend().await;
    let requestor =
        revo_rw::services::AnalysisRequestor::new(reqwest::Client::new(), base_url.clone());

    let remote = requestor.remote_status("rt-1").await.unwrap();
    assert_eq!(remote.id, "rt-1");
    assert_eq!(remote.status.as_deref(), Some("processing"));
    assert_eq!(remote.tracking_number.as_deref(), Some("TRK-0001"));
}

#[tokio::test]
async fn cancelled_submission_reverts_to_capturing() {
    let (stub, base_url) = spawn_backend().await;
    let (orch, events) = engine(&base_url);
    stub.set_analyze_delay(Duration::from_secs(5));
    let mut rx = events.subscribe();

    let record = orch.scan(KNOWN_CODE).await.unwrap();
    orch.select_reason(record.id, "changed_mind").await.unwrap();
    orch.capture(record.id, "overview", vec![0xff; 16]).await.unwrap();

    let submitting = {
        let orch = orch.clone();
        let id = record.id;
        tokio::spawn(async move { orch.submit(id).await })
    };
    tokio::time::sleep(Duration::from_millis(200)).await;

    orch.cancel_submission(record.id).await.unwrap();
    let result = submitting.await.unwrap();
    assert!(result.is_err());

    // Reverted to the pre-submission state, evidence intact
    let snapshot = orch.snapshot(record.id).await.unwrap();
    assert_eq!(snapshot.state, ReturnState::Capturing);
    assert!(snapshot.analysis.is_none());
    assert!(snapshot.evidence.iter().any(|e| e.is_captured()));

    let names: Vec<_> = std::iter::from_fn(|| rx.try_recv().ok().map(|e| e.name())).collect();
    assert!(names.contains(&"SubmissionFailed"));
    assert!(!names.contains(&"DecisionReached"));
}

#[tokio::test]
async fn concurrent_mutation_during_submission_fails_fast() {
    let (stub, base_url) = spawn_backend().await;
    let (orch, _events) = engine(&base_url);
    stub.set_analyze_delay(Duration::from_secs(2));

    let record = orch.scan(KNOWN_CODE).await.unwrap();
    orch.select_reason(record.id, "damaged").await.unwrap();
    orch.capture(record.id, "overview", vec![0xff; 16]).await.unwrap();
    orch.capture(record.id, "damage", vec![0xff; 16]).await.unwrap();
    orch.skip(record.id, "closeup").await.unwrap();

    let submitting = {
        let orch = orch.clone();
        let id = record.id;
        tokio::spawn(async move { orch.submit(id).await })
    };
    tokio::time::sleep(Duration::from_millis(200)).await;

    // The record gate is held by the in-flight submission
    let result = orch.skip(record.id, "label").await;
    assert!(matches!(result, Err(Error::RecordBusy(_))));

    // Snapshot reads still succeed while the gate is held
    let snapshot = orch.snapshot(record.id).await.unwrap();
    assert_eq!(snapshot.state, ReturnState::Analyzing);

    orch.cancel_submission(record.id).await.unwrap();
    let _ = submitting.await.unwrap();
}

#[tokio::test]
async fn cancelling_the_return_overrides_an_in_flight_submission() {
    let (stub, base_url) = spawn_backend().await;
    let (orch, _events) = engine(&base_url);
    stub.set_analyze_delay(Duration::from_secs(2));

    let record = orch.scan(KNOWN_CODE).await.unwrap();
    orch.select_reason(record.id, "changed_mind").await.unwrap();
    orch.capture(record.id, "overview", vec![0xff; 16]).await.unwrap();

    let submitting = {
        let orch = orch.clone();
        let id = record.id;
        tokio::spawn(async move { orch.submit(id).await })
    };
    tokio::time::sleep(Duration::from_millis(200)).await;

    let cancelled = orch.cancel(record.id).await.unwrap();
    assert_eq!(cancelled.state, ReturnState::Cancelled);
    // Captured evidence is preserved for audit
    assert!(cancelled.evidence.iter().any(|e| e.is_captured()));

    let result = submitting.await.unwrap();
    assert!(result.is_err());
}
