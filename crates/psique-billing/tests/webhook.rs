use hmac::{Hmac, Mac};
use sha2::Sha256;

use psique_billing::plans::{Entitlements, entitlements};
use psique_billing::webhook::{
    BillingEvent, DEFAULT_TOLERANCE_SECS, apply_event, parse_event, verify_signature,
};
use psique_core::models::subscription::{Plan, Subscription, SubscriptionStatus};

const SECRET: &str = "whsec_test_secret";
const NOW: i64 = 1_792_000_000;

fn sign(payload: &str, timestamp: i64, secret: &str) -> String {
    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes()).unwrap();
    mac.update(format!("{timestamp}.{payload}").as_bytes());
    let sig: String = mac
        .finalize()
        .into_bytes()
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect();
    format!("t={timestamp},v1={sig}")
}

fn ts(s: i64) -> jiff::Timestamp {
    jiff::Timestamp::from_second(s).unwrap()
}

#[test]
fn valid_signature_is_accepted() {
    let payload = r#"{"id":"evt_1"}"#;
    let header = sign(payload, NOW, SECRET);
    verify_signature(payload.as_bytes(), &header, SECRET, NOW + 10, DEFAULT_TOLERANCE_SECS).unwrap();
}

#[test]
fn rolled_secret_signatures_are_tried_in_turn() {
    let payload = r#"{"id":"evt_1"}"#;
    let old = sign(payload, NOW, "whsec_old");
    let new = sign(payload, NOW, SECRET);
    let v1_new = new.split_once(",v1=").unwrap().1;
    let header = format!("{old},v1={v1_new}");
    verify_signature(payload.as_bytes(), &header, SECRET, NOW, DEFAULT_TOLERANCE_SECS).unwrap();
}

#[test]
fn extreme_timestamps_are_rejected_without_overflow() {
    for header in ["t=-9223372036854775808,v1=00", "t=9223372036854775807,v1=00"] {
        let err = verify_signature(b"{}", header, SECRET, NOW, DEFAULT_TOLERANCE_SECS).unwrap_err();
        assert!(err.to_string().contains("timestamp outside tolerance"), "{err}");
    }
}

#[test]
fn tampered_payload_is_rejected() {
    let header = sign(r#"{"amount":100}"#, NOW, SECRET);
    assert!(verify_signature(br#"{"amount":1}"#, &header, SECRET, NOW, DEFAULT_TOLERANCE_SECS).is_err());
}

#[test]
fn replayed_event_is_rejected() {
    let payload = r#"{"id":"evt_1"}"#;
    let header = sign(payload, NOW, SECRET);
    let later = NOW + DEFAULT_TOLERANCE_SECS + 1;
    assert!(verify_signature(payload.as_bytes(), &header, SECRET, later, DEFAULT_TOLERANCE_SECS).is_err());
}

#[test]
fn header_without_signature_is_rejected() {
    assert!(verify_signature(b"{}", "t=1792000000", SECRET, NOW, DEFAULT_TOLERANCE_SECS).is_err());
    assert!(verify_signature(b"{}", "v1=abcd", SECRET, NOW, DEFAULT_TOLERANCE_SECS).is_err());
}

#[test]
fn unknown_events_are_ignored() {
    let payload = br#"{"id":"evt_9","type":"charge.succeeded","data":{"object":{}}}"#;
    assert_eq!(parse_event(payload).unwrap(), None);
}

#[test]
fn subscription_lifecycle() {
    let mut sub = Subscription::free("sub-1", ts(NOW));

    let checkout = parse_event(
        br#"{"id":"evt_1","type":"checkout.session.completed","data":{"object":{
            "id":"cs_1","customer":"cus_1","subscription":"sub_1","client_reference_id":"sub-1"}}}"#,
    )
    .unwrap()
    .unwrap();
    assert_eq!(checkout.professional_id(), Some("sub-1"));
    assert_eq!(checkout.customer_id(), "cus_1");
    sub = apply_event(sub, checkout, ts(NOW));
    assert_eq!(sub.plan, Plan::Pro);
    assert_eq!(sub.status, SubscriptionStatus::Active);
    assert_eq!(entitlements(&sub, ts(NOW)), Entitlements::PRO);

    // Period end lives on the items in recent API versions.
    let updated = parse_event(
        br#"{"id":"evt_2","type":"customer.subscription.updated","data":{"object":{
            "id":"sub_1","customer":"cus_1","status":"active",
            "items":{"data":[{"current_period_end":1794600000}]},
            "metadata":{"professional_id":"sub-1"}}}}"#,
    )
    .unwrap()
    .unwrap();
    sub = apply_event(sub, updated, ts(NOW));
    assert_eq!(sub.current_period_end, Some(ts(1_794_600_000)));

    let failed = parse_event(
        br#"{"id":"evt_3","type":"invoice.payment_failed","data":{"object":{"id":"in_1","customer":"cus_1"}}}"#,
    )
    .unwrap()
    .unwrap();
    sub = apply_event(sub, failed, ts(NOW));
    assert_eq!(sub.status, SubscriptionStatus::PastDue);
    assert_eq!(entitlements(&sub, ts(1_794_599_999)), Entitlements::PRO);
    assert_eq!(entitlements(&sub, ts(1_794_600_000)), Entitlements::FREE);

    let deleted = parse_event(
        br#"{"id":"evt_4","type":"customer.subscription.deleted","data":{"object":{
            "id":"sub_1","customer":"cus_1","status":"canceled","current_period_end":1794600000}}}"#,
    )
    .unwrap()
    .unwrap();
    sub = apply_event(sub, deleted, ts(NOW));
    assert_eq!(sub.plan, Plan::Free);
    assert_eq!(sub.status, SubscriptionStatus::Canceled);
    assert_eq!(sub.customer_id.as_deref(), Some("cus_1"));
}

#[test]
fn stale_delete_does_not_cancel_new_subscription() {
    let mut sub = Subscription::free("sub-1", ts(NOW));
    sub.plan = Plan::Pro;
    sub.subscription_id = Some("sub_new".to_string());
    let event = BillingEvent::SubscriptionDeleted {
        customer_id: "cus_1".to_string(),
        subscription_id: "sub_old".to_string(),
    };
    let sub = apply_event(sub, event, ts(NOW));
    assert_eq!(sub.plan, Plan::Pro);
}
