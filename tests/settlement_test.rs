//! End-to-end settlement scenarios against a recording stub backend.
//!
//! These tests drive the public library surface the way the operator
//! console does: raw wire records in, settled sessions and actuator calls
//! out, with the stub recording every request so call counts can be
//! asserted exactly.

use chrono::{DateTime, Utc};
use gate_settlement::{
    settle_plate, FeeSchedule, GateBackend, ParkingSession, PaymentRequest, PaymentResponse,
    Result, Rupiah, SessionRecord, Settlement, SettlementError, SettlementState, SessionStatus,
};
use std::collections::VecDeque;
use std::sync::Mutex;

/// Scripted reply for one payment submission.
enum Reply {
    Open,
    Refuse(Option<&'static str>),
    Unreachable,
}

/// Recording stub standing in for all four collaborators.
struct StubBackend {
    sessions: Vec<ParkingSession>,
    members: Vec<&'static str>,
    replies: Mutex<VecDeque<Reply>>,
    payments: Mutex<Vec<PaymentRequest>>,
    gate_calls: Mutex<usize>,
}

impl StubBackend {
    fn new(sessions: Vec<ParkingSession>, replies: Vec<Reply>) -> Self {
        StubBackend {
            sessions,
            members: Vec::new(),
            replies: Mutex::new(replies.into()),
            payments: Mutex::new(Vec::new()),
            gate_calls: Mutex::new(0),
        }
    }

    fn payment_count(&self) -> usize {
        self.payments.lock().unwrap().len()
    }

    fn gate_call_count(&self) -> usize {
        *self.gate_calls.lock().unwrap()
    }
}

impl GateBackend for StubBackend {
    async fn fetch_sessions(&self) -> Result<Vec<ParkingSession>> {
        Ok(self.sessions.clone())
    }

    async fn member_status(&self, plate: &str) -> Result<bool> {
        Ok(self.members.iter().any(|member| *member == plate))
    }

    async fn submit_payment(&self, request: &PaymentRequest) -> Result<PaymentResponse> {
        self.payments.lock().unwrap().push(request.clone());
        match self.replies.lock().unwrap().pop_front() {
            Some(Reply::Open) => Ok(PaymentResponse {
                open_gate: true,
                message: None,
            }),
            Some(Reply::Refuse(message)) => Ok(PaymentResponse {
                open_gate: false,
                message: message.map(str::to_string),
            }),
            Some(Reply::Unreachable) | None => Err(SettlementError::Transport(
                "connection refused".to_string(),
            )),
        }
    }

    async fn trigger_gate(&self) -> Result<()> {
        *self.gate_calls.lock().unwrap() += 1;
        Ok(())
    }
}

fn now() -> DateTime<Utc> {
    "2025-06-01T10:00:00Z".parse().unwrap()
}

/// Builds a session the way production does: through the wire-record parser.
fn session_from_wire(json: &str) -> ParkingSession {
    let record: SessionRecord = serde_json::from_str(json).unwrap();
    record.parse().unwrap()
}

/// Parked since 08:10, i.e. 110 minutes before `now()`: two started hours,
/// a 6000 fee on the default schedule.
fn parked_b1234() -> ParkingSession {
    session_from_wire(r#"{"plate_number": "B 1234 CD", "time_in": "2025-06-01 08:10:00"}"#)
}

// ==================== FEE PROPERTIES ====================

#[test]
fn test_fee_schedule_properties() {
    let schedule = FeeSchedule::default();
    let entry: DateTime<Utc> = "2025-06-01T08:00:00Z".parse().unwrap();

    assert_eq!(schedule.fee_for(entry, entry), Rupiah::new(3000));
    assert_eq!(
        schedule.fee_for(entry, entry + chrono::Duration::minutes(59)),
        Rupiah::new(3000)
    );
    assert_eq!(
        schedule.fee_for(entry, entry + chrono::Duration::minutes(61)),
        Rupiah::new(6000)
    );
    assert_eq!(
        schedule.fee_for(entry, entry + chrono::Duration::hours(3)),
        Rupiah::new(9000)
    );
}

// ==================== SETTLEMENT SCENARIOS ====================

#[tokio::test]
async fn test_full_settlement_scenario() {
    let backend = StubBackend::new(vec![parked_b1234()], vec![Reply::Open]);

    let outcome = settle_plate(
        &backend,
        &FeeSchedule::default(),
        "B 1234 CD",
        Rupiah::new(10_000),
        now(),
    )
    .await
    .unwrap();

    assert_eq!(outcome.amount_paid, Rupiah::new(6000));
    assert_eq!(outcome.change_due, Rupiah::new(4000));
    assert_eq!(outcome.exit_time, now());
    assert_eq!(outcome.actuator_error, None);

    // Exactly one payment request, carrying the fee (not the tendered cash),
    // and exactly one actuator call.
    assert_eq!(backend.payment_count(), 1);
    assert_eq!(backend.gate_call_count(), 1);
    let request = &backend.payments.lock().unwrap()[0];
    assert_eq!(request.plate_number, "B 1234 CD");
    assert_eq!(request.amount_paid, Rupiah::new(6000));
    assert_eq!(request.exit_time, now());
}

#[tokio::test]
async fn test_insufficient_tender_issues_no_requests() {
    let backend = StubBackend::new(vec![parked_b1234()], vec![Reply::Open]);

    let result = settle_plate(
        &backend,
        &FeeSchedule::default(),
        "B 1234 CD",
        Rupiah::new(5000),
        now(),
    )
    .await;

    assert!(matches!(
        result,
        Err(SettlementError::InsufficientAmount { .. })
    ));
    assert_eq!(backend.payment_count(), 0);
    assert_eq!(backend.gate_call_count(), 0);
}

#[tokio::test]
async fn test_backend_refusal_reaches_failed_with_message() {
    let backend = StubBackend::new(
        vec![parked_b1234()],
        vec![Reply::Refuse(Some("insufficient funds"))],
    );

    let mut settlement = Settlement::begin(
        parked_b1234(),
        false,
        &FeeSchedule::default(),
        now(),
    )
    .unwrap();
    settlement.enter_amount(Rupiah::new(10_000)).unwrap();

    let err = settlement.submit(&backend, now()).await.unwrap_err();
    assert_eq!(err.to_string(), "payment rejected: insufficient funds");

    assert_eq!(settlement.state(), SettlementState::Failed);
    assert_eq!(settlement.last_failure(), Some("insufficient funds"));

    // The session is untouched and the gate never fired.
    assert!(settlement.session().is_parked());
    assert_eq!(settlement.session().exit_time, None);
    assert_eq!(backend.gate_call_count(), 0);
}

#[tokio::test]
async fn test_failed_attempt_is_independently_retryable() {
    let backend = StubBackend::new(
        vec![parked_b1234()],
        vec![Reply::Unreachable, Reply::Refuse(None), Reply::Open],
    );

    let mut settlement = Settlement::begin(
        parked_b1234(),
        false,
        &FeeSchedule::default(),
        now(),
    )
    .unwrap();
    settlement.enter_amount(Rupiah::new(10_000)).unwrap();

    // Transport failure, then a domain refusal: both leave the attempt
    // retryable, and neither fires the actuator.
    let transport = settlement.submit(&backend, now()).await.unwrap_err();
    assert!(transport.is_retryable());
    let refusal = settlement.submit(&backend, now()).await.unwrap_err();
    assert!(refusal.is_retryable());
    assert_eq!(backend.gate_call_count(), 0);

    // The actuator fires only for the fresh go-ahead.
    let outcome = settlement.submit(&backend, now()).await.unwrap();
    assert_eq!(outcome.change_due, Rupiah::new(4000));
    assert_eq!(backend.payment_count(), 3);
    assert_eq!(backend.gate_call_count(), 1);

    let session = settlement.into_session();
    assert_eq!(session.status, SessionStatus::Selesai);
    assert_eq!(session.parking_fee, Rupiah::new(6000));
}

// ==================== MEMBER SHORT-CIRCUIT ====================

#[tokio::test]
async fn test_member_settles_for_zero() {
    let mut backend = StubBackend::new(vec![parked_b1234()], vec![Reply::Open]);
    backend.members = vec!["B 1234 CD"];

    let outcome = settle_plate(
        &backend,
        &FeeSchedule::default(),
        "B 1234 CD",
        Rupiah::new(10_000),
        now(),
    )
    .await
    .unwrap();

    assert_eq!(outcome.amount_paid, Rupiah::ZERO);
    assert_eq!(backend.payments.lock().unwrap()[0].amount_paid, Rupiah::ZERO);
    assert_eq!(backend.gate_call_count(), 1);
}

#[tokio::test]
async fn test_member_roll_matches_exact_plate_only() {
    let mut backend = StubBackend::new(vec![parked_b1234()], vec![Reply::Open]);
    backend.members = vec!["B 1234 C"];

    let outcome = settle_plate(
        &backend,
        &FeeSchedule::default(),
        "B 1234 CD",
        Rupiah::new(10_000),
        now(),
    )
    .await
    .unwrap();

    // Near-miss plates do not short-circuit the charge.
    assert_eq!(outcome.amount_paid, Rupiah::new(6000));
}

// ==================== SESSION SELECTION ====================

#[tokio::test]
async fn test_settled_sessions_are_not_selectable() {
    let settled = session_from_wire(
        r#"{"plate_number": "B 1234 CD",
            "time_in": "2025-06-01 07:00:00",
            "time_out": "2025-06-01 08:00:00",
            "fee": 3000}"#,
    );
    let backend = StubBackend::new(vec![settled], vec![Reply::Open]);

    let result = settle_plate(
        &backend,
        &FeeSchedule::default(),
        "B 1234 CD",
        Rupiah::new(10_000),
        now(),
    )
    .await;

    assert!(matches!(result, Err(SettlementError::NotParked(_))));
    assert_eq!(backend.payment_count(), 0);
}
