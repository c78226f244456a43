//! Remote collaborators: parking logs, membership roll, payment endpoint,
//! and the gate servo.
//!
//! The settlement engine only ever talks to the outside world through the
//! [`GateBackend`] trait, so every workflow is testable against a recording
//! stub with no network in sight. [`HttpBackend`] is the production
//! implementation.

use crate::config::{Endpoints, REQUEST_TIMEOUT};
use crate::currency::Rupiah;
use crate::error::{Result, SettlementError};
use crate::session::{MembershipRecord, ParkingSession, SessionRecord};
use chrono::{DateTime, Utc};
use log::warn;
use serde::{Deserialize, Serialize};

/// Payment submission body.
///
/// `exit_time` serializes as an ISO-8601 timestamp; `amount_paid` is a bare
/// whole-rupiah number, zero for member vehicles.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaymentRequest {
    pub plate_number: String,
    pub exit_time: DateTime<Utc>,
    pub amount_paid: Rupiah,
}

/// Payment submission reply.
///
/// A missing `open_gate` field reads as `false`: the gate only ever opens on
/// an explicit go-ahead.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PaymentResponse {
    #[serde(default)]
    pub open_gate: bool,

    #[serde(default)]
    pub message: Option<String>,
}

/// The four collaborator operations the settlement engine needs.
#[allow(async_fn_in_trait)]
pub trait GateBackend {
    /// Fetches all parking sessions currently known to the backend.
    async fn fetch_sessions(&self) -> Result<Vec<ParkingSession>>;

    /// Looks the plate up on the membership roll (exact string match).
    async fn member_status(&self, plate: &str) -> Result<bool>;

    /// Submits one payment. Exactly one request per call; never retried
    /// internally.
    async fn submit_payment(&self, request: &PaymentRequest) -> Result<PaymentResponse>;

    /// Fires the gate servo once. The response body is ignored; only the
    /// status code decides success.
    async fn trigger_gate(&self) -> Result<()>;
}

/// HTTP implementation of [`GateBackend`] over a shared `reqwest` client.
pub struct HttpBackend {
    client: reqwest::Client,
    endpoints: Endpoints,
}

impl HttpBackend {
    /// Creates a backend for the given endpoints.
    pub fn new(endpoints: Endpoints) -> Self {
        HttpBackend {
            client: reqwest::Client::new(),
            endpoints,
        }
    }
}

impl GateBackend for HttpBackend {
    async fn fetch_sessions(&self) -> Result<Vec<ParkingSession>> {
        let response = self
            .client
            .get(&self.endpoints.logs_url)
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(SettlementError::Transport(format!(
                "parking-logs endpoint returned {}",
                response.status()
            )));
        }

        let records: Vec<SessionRecord> = response.json().await?;

        let mut sessions = Vec::with_capacity(records.len());
        for (idx, record) in records.iter().enumerate() {
            match record.parse() {
                Some(session) => sessions.push(session),
                None => warn!("Skipping malformed parking-log record at index {}", idx),
            }
        }

        Ok(sessions)
    }

    async fn member_status(&self, plate: &str) -> Result<bool> {
        let response = self
            .client
            .get(&self.endpoints.membership_url)
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(SettlementError::Transport(format!(
                "membership endpoint returned {}",
                response.status()
            )));
        }

        let records: Vec<MembershipRecord> = response.json().await?;

        Ok(records
            .iter()
            .any(|record| record.plate_number == plate && record.is_member()))
    }

    async fn submit_payment(&self, request: &PaymentRequest) -> Result<PaymentResponse> {
        let response = self
            .client
            .post(&self.endpoints.payment_url)
            .timeout(REQUEST_TIMEOUT)
            .json(request)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(SettlementError::Transport(format!(
                "payment endpoint returned {}",
                response.status()
            )));
        }

        // Malformed JSON surfaces as a reqwest decode error, which maps to
        // the same retryable transport class as a connection failure.
        Ok(response.json().await?)
    }

    async fn trigger_gate(&self) -> Result<()> {
        let response = self
            .client
            .post(&self.endpoints.servo_url)
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(SettlementError::Transport(format!(
                "servo endpoint returned {}",
                response.status()
            )));
        }

        Ok(())
    }
}
