use super::*;

#[test]
fn scan_request_fills_defaults_for_missing_fields() {
    let req: ContinuousScanRequest = serde_json::from_value(serde_json::json!({
        "username": "golfer@example.com",
        "password": "pw",
        "target_date": "2026-02-14",
    }))
    .expect("json");

    assert_eq!(req.username.as_deref(), Some("golfer@example.com"));
    assert!(req.start_time.is_none());
    assert!(req.scan_interval.is_none());
    assert!(!req.enable_notifications);
    assert_eq!(req.completion_policy, CompletionPolicy::NotifyOnly);
}

#[test]
fn scan_request_reads_completion_policy_in_snake_case() {
    let req: ContinuousScanRequest = serde_json::from_value(serde_json::json!({
        "completion_policy": "auto_book_first_match",
        "enable_notifications": true,
    }))
    .expect("json");
    assert_eq!(req.completion_policy, CompletionPolicy::AutoBookFirstMatch);
    assert!(req.enable_notifications);
}

#[test]
fn grab_request_accepts_explicit_release_timestamp() {
    let req: InstantGrabRequest = serde_json::from_value(serde_json::json!({
        "wait_until": "2026-02-07T19:00:00-08:00",
        "reservation_time": "7:57am",
    }))
    .expect("json");
    let wait_until = req.wait_until.expect("timestamp");
    assert_eq!(wait_until.offset().local_minus_utc(), -8 * 3600);
    assert!(req.wait_hour.is_none());
}

#[test]
fn status_response_uses_flat_field_names() {
    let status = StatusResponse {
        status: "Idle".into(),
        is_running: false,
        messages: vec!["a".into()],
    };
    let value = serde_json::to_value(&status).expect("json");
    assert_eq!(
        value,
        serde_json::json!({ "status": "Idle", "is_running": false, "messages": ["a"] })
    );
}
