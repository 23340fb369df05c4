//! Invariants, round-trip, and boundary properties of the scoring pipeline.

use chrono::{TimeZone, Utc};
use sentinel_core::config::{self, Settings};
use sentinel_core::pipeline::coordinator::IncomingAccess;
use sentinel_core::pipeline::integrity::IntegrityVerifier;
use sentinel_core::pipeline::ThreatDetectionPipeline;
use sentinel_core::queue;
use sentinel_core::types::enums::{Action, Department, RiskLevel};

fn ensure_config() {
    if !config::is_initialized() {
        config::init(Settings::from_env());
    }
}

fn ts() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 7, 29, 10, 0, 0).unwrap()
}

fn sample_access(action: Action, actor_dept: &str, target_dept: &str) -> IncomingAccess {
    IncomingAccess {
        actor_id: "u1".into(),
        actor_department: Department::new(actor_dept),
        action,
        document_id: Some("doc-1".into()),
        target_department: Department::new(target_dept),
        bytes_transferred: 1_000,
        source_ip: Some("10.0.0.1".into()),
        device_info: Some("laptop".into()),
        session_id: Some("s1".into()),
        baseline_hash: None,
        baseline_content: None,
        content: None,
        declared_sensitivity: None,
    }
}

#[test]
fn risk_score_is_bounded_and_level_matches_threshold_bucket() {
    ensure_config();
    let mut pipeline = ThreatDetectionPipeline::new();
    let result = pipeline.run(sample_access(Action::Delete, "hr", "finance"), "e1".into(), ts());

    assert!(result.event.risk_score >= 0.0 && result.event.risk_score <= 1.0);
    assert_eq!(result.event.risk_level, RiskLevel::from_score(result.event.risk_score));
}

#[test]
fn cross_department_flag_is_case_insensitive() {
    ensure_config();
    let mut pipeline = ThreatDetectionPipeline::new();
    let result = pipeline.run(sample_access(Action::View, "Finance", "FINANCE"), "e2".into(), ts());
    assert!(!result.event.is_cross_department);

    let mut pipeline2 = ThreatDetectionPipeline::new();
    let result2 = pipeline2.run(sample_access(Action::View, "HR", "finance"), "e3".into(), ts());
    assert!(result2.event.is_cross_department);
}

#[test]
fn alert_existence_matches_requires_alert_and_priority_matches_level() {
    ensure_config();
    let mut pipeline = ThreatDetectionPipeline::new();
    let benign = pipeline.run(sample_access(Action::View, "finance", "finance"), "e4".into(), ts());
    assert!(benign.alert_summary.is_none());

    let mut pipeline2 = ThreatDetectionPipeline::new();
    let severe = pipeline2.run(sample_access(Action::Delete, "hr", "finance"), "e5".into(), ts());
    assert!(severe.alert_summary.is_some());
    // priority would be set from event.risk_level by the worker; verify the
    // level itself is internally consistent with the score that drove it.
    assert_eq!(severe.event.risk_level, RiskLevel::from_score(severe.event.risk_score));
}

#[test]
fn modification_record_change_percent_matches_formula() {
    use sentinel_core::types::ModificationRecord;
    let original_length = 100;
    let chars_added = 20;
    let chars_removed = 10;
    let percent = ModificationRecord::compute_change_percent(original_length, chars_added, chars_removed);
    assert!((percent - 30.0).abs() < 1e-9);

    // max(original_length, 1) guards the zero-length edge case.
    let percent_zero = ModificationRecord::compute_change_percent(0, 5, 5);
    assert!((percent_zero - 1000.0).abs() < 1e-9);
}

#[test]
fn integrity_is_tampered_iff_hash_mismatch() {
    let verifier = IntegrityVerifier::new();
    let baseline = "the original document body";
    let hash = IntegrityVerifier::compute_hash(baseline);

    let unchanged = verifier.check(&hash, baseline, baseline);
    assert!(!unchanged.is_tampered);
    assert_eq!(unchanged.current_hash, hash);

    let changed = verifier.check(&hash, baseline, "a completely different document body entirely");
    assert!(changed.is_tampered);
    assert_ne!(changed.current_hash, hash);
}

#[test]
fn document_registration_hash_round_trips() {
    let content = "registered baseline content";
    let hash = IntegrityVerifier::compute_hash(content);
    let verifier = IntegrityVerifier::new();
    let result = verifier.check(&hash, content, content);
    assert!(result.hash_match);
    assert_eq!(result.severity, sentinel_core::types::enums::TamperSeverity::None);
}

#[test]
fn fusion_is_deterministic_for_identical_inputs() {
    ensure_config();
    let mut a = ThreatDetectionPipeline::new();
    let mut b = ThreatDetectionPipeline::new();
    let ra = a.run(sample_access(Action::Share, "finance", "finance"), "e6".into(), ts());
    let rb = b.run(sample_access(Action::Share, "finance", "finance"), "e7".into(), ts());
    assert!((ra.event.risk_score - rb.event.risk_score).abs() < 1e-12);
    assert_eq!(ra.event.risk_level, rb.event.risk_level);
}

#[test]
fn queue_capacity_minus_one_admits_capacity_rejects() {
    let (tx, _rx) = queue::bounded::<u32>(4, 0.9);
    for i in 0..3 {
        tx.try_offer(i).expect("below capacity admits");
    }
    tx.try_offer(99).expect("exactly at capacity - 1 still admits");
    assert!(tx.try_offer(100).is_err(), "queue at capacity rejects");
}

#[test]
fn risk_level_threshold_boundaries_are_inclusive() {
    assert_eq!(RiskLevel::from_score(0.8), RiskLevel::Critical);
    assert_eq!(RiskLevel::from_score(0.799_999), RiskLevel::High);
    assert_eq!(RiskLevel::from_score(0.6), RiskLevel::High);
    assert_eq!(RiskLevel::from_score(0.4), RiskLevel::Medium);
    assert_eq!(RiskLevel::from_score(0.399_999), RiskLevel::Low);
}
