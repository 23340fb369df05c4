//! End-to-end scenarios exercising the full ingest-to-alert pipeline.

use chrono::{TimeZone, Utc};
use sentinel_core::broadcast::{Broadcaster, WsMessage};
use sentinel_core::config::{self, Settings};
use sentinel_core::pipeline::coordinator::IncomingAccess;
use sentinel_core::pipeline::ThreatDetectionPipeline;
use sentinel_core::queue;
use sentinel_core::types::enums::{Action, Department, RiskLevel, Sensitivity};
use sentinel_core::types::Event;

fn ensure_config() {
    if !config::is_initialized() {
        config::init(Settings::from_env());
    }
}

fn business_hours_timestamp() -> chrono::DateTime<Utc> {
    // A Wednesday at 10:00 UTC.
    Utc.with_ymd_and_hms(2026, 7, 29, 10, 0, 0).unwrap()
}

#[test]
fn benign_same_department_view_is_low_risk_no_alert() {
    ensure_config();
    let mut pipeline = ThreatDetectionPipeline::new();
    let access = IncomingAccess {
        actor_id: "u1".into(),
        actor_department: Department::new("finance"),
        action: Action::View,
        document_id: Some("doc-1".into()),
        target_department: Department::new("finance"),
        bytes_transferred: 1_024,
        source_ip: Some("10.0.0.1".into()),
        device_info: Some("laptop".into()),
        session_id: Some("s1".into()),
        baseline_hash: None,
        baseline_content: None,
        content: None,
        declared_sensitivity: None,
    };
    let result = pipeline.run(access, "e1".into(), business_hours_timestamp());

    assert!(!result.event.is_cross_department);
    assert_eq!(result.event.risk_level, RiskLevel::Low);
    assert!(result.alert_summary.is_none());
    assert!(result.event.risk_score <= 0.05 + 1e-9);
}

#[test]
fn cross_department_modify_of_confidential_escalates_to_critical() {
    ensure_config();
    let mut pipeline = ThreatDetectionPipeline::new();
    let baseline_content = "quarterly revenue figures";
    let baseline_hash = sentinel_core::pipeline::integrity::IntegrityVerifier::compute_hash(baseline_content);
    let modified_content = "quarterly revenue figures, SSN 123-45-6789, merger plans confidential nda salary";

    let access = IncomingAccess {
        actor_id: "hr-user".into(),
        actor_department: Department::new("hr"),
        action: Action::Modify,
        document_id: Some("doc-2".into()),
        target_department: Department::new("finance"),
        bytes_transferred: 4_096,
        source_ip: Some("10.0.0.2".into()),
        device_info: Some("desktop".into()),
        session_id: Some("s2".into()),
        baseline_hash: Some(baseline_hash),
        baseline_content: Some(baseline_content.to_string()),
        content: Some(modified_content.to_string()),
        declared_sensitivity: None,
    };
    let result = pipeline.run(access, "e2".into(), business_hours_timestamp());

    assert!(result.event.is_cross_department);
    assert!(result.integrity.is_tampered);
    assert_eq!(result.event.risk_level, RiskLevel::Critical);
    assert!((result.event.risk_score - 1.0).abs() < 1e-9);
    assert!(result.alert_summary.is_some());
    assert!(result.risk_factors.iter().any(|f| f.contains("Cross-department")));
    assert!(result.risk_factors.iter().any(|f| f.contains("High-risk action")));
    assert!(result.risk_factors.iter().any(|f| f.contains("Tampering")));
}

#[test]
fn upload_sensitivity_mismatch_flags_and_computes_modifier() {
    ensure_config();
    let mut pipeline = ThreatDetectionPipeline::new();
    // Lexicon-heavy confidential content so the classifier predicts confidential
    // with high confidence, while the uploader declares it public.
    let content = "ssn nda merger salary password: hunter2 confidential confidential confidential";

    let access = IncomingAccess {
        actor_id: "u3".into(),
        actor_department: Department::new("finance"),
        action: Action::Upload,
        document_id: Some("doc-3".into()),
        target_department: Department::new("finance"),
        bytes_transferred: 2_048,
        source_ip: Some("10.0.0.3".into()),
        device_info: Some("laptop".into()),
        session_id: Some("s3".into()),
        baseline_hash: None,
        baseline_content: None,
        content: Some(content.to_string()),
        declared_sensitivity: Some(Sensitivity::Public),
    };
    let result = pipeline.run(access, "e3".into(), business_hours_timestamp());

    let mismatch = result.sensitivity_mismatch.expect("upload with declared sensitivity yields a mismatch result");
    assert!(mismatch.flagged);
    assert_eq!(mismatch.predicted, Sensitivity::Confidential);
    assert!(mismatch.risk_modifier > 0.0);
}

#[test]
fn after_hours_download_escalates_via_temporal_multiplier() {
    ensure_config();
    let mut pipeline = ThreatDetectionPipeline::new();
    let late_night = Utc.with_ymd_and_hms(2026, 7, 29, 22, 0, 0).unwrap();

    let access = IncomingAccess {
        actor_id: "u4".into(),
        actor_department: Department::new("finance"),
        action: Action::Download,
        document_id: Some("doc-4".into()),
        target_department: Department::new("finance"),
        bytes_transferred: 10_000_000,
        source_ip: Some("10.0.0.4".into()),
        device_info: Some("laptop".into()),
        session_id: Some("s4".into()),
        baseline_hash: None,
        baseline_content: None,
        content: None,
        declared_sensitivity: None,
    };
    let result = pipeline.run(access, "e4".into(), late_night);

    assert!(result.event.is_after_hours());
    assert!(!result.event.is_cross_department);
    // Download's action multiplier (1.8) alone clears the "high-risk action"
    // factor threshold (>= 1.5) regardless of the behavior/classification
    // components, and the after-hours temporal multiplier always fires.
    assert!(result.risk_factors.iter().any(|f| f.contains("High-risk action")));
    assert!(result.risk_factors.iter().any(|f| f.contains("Off-hours activity")));
}

#[test]
fn queue_overflow_admits_up_to_capacity_then_rejects() {
    let capacity = 1000;
    let (tx, _rx) = queue::bounded::<u32>(capacity, 0.9);

    let near_capacity_threshold = (capacity as f64 * 0.9) as u32;
    for i in 0..near_capacity_threshold {
        tx.try_offer(i).expect("admitted below the 90% utilization threshold");
    }
    assert!(tx.is_near_capacity());

    // Submitting the full burst of 1001 events: everything past the
    // threshold is rejected, not just the one past raw capacity.
    let mut rejected = 0;
    for i in near_capacity_threshold..(capacity as u32 + 1) {
        if tx.is_near_capacity() || tx.try_offer(i).is_err() {
            rejected += 1;
        }
    }
    assert!(rejected > 0, "events submitted past the 90% utilization mark are rejected");
}

#[tokio::test]
async fn websocket_fan_out_reaches_live_sessions_and_drops_dead_ones() {
    let broadcaster = Broadcaster::new();
    let (_, mut analyst_a) = broadcaster.connect("analyst-a").await;
    let (_, mut analyst_b) = broadcaster.connect("analyst-b").await;
    let (_, analyst_c) = broadcaster.connect("analyst-c").await;
    drop(analyst_c); // disconnects mid-stream before the broadcast

    let event = Event {
        event_id: "e-fanout".into(),
        actor_id: "u1".into(),
        actor_department: Department::new("finance"),
        action: Action::View,
        document_id: Some("doc-1".into()),
        target_department: Some(Department::new("finance")),
        timestamp: business_hours_timestamp(),
        bytes_transferred: 512,
        source_ip: None,
        device_info: None,
        session_id: None,
        is_cross_department: false,
        behavior_score: 0.1,
        risk_score: 0.1,
        risk_level: RiskLevel::Low,
    };
    broadcaster.broadcast_event(event).await;

    let msg_a = analyst_a.recv().await.expect("still-connected session receives the event");
    assert!(matches!(msg_a, WsMessage::NewEvent(_)));
    let msg_b = analyst_b.recv().await.expect("still-connected session receives the event");
    assert!(matches!(msg_b, WsMessage::NewEvent(_)));

    assert_eq!(broadcaster.session_count().await, 2, "the dead session was silently dropped");
}
