//! Core settlement workflow.
//!
//! A [`Settlement`] walks one parking session through fee computation,
//! payment reconciliation, and gate release. The fee is computed once, when
//! the attempt begins; the tendered amount may be corrected any number of
//! times; submission issues exactly one payment request and, on a go-ahead,
//! exactly one actuator call.

use crate::backend::{GateBackend, PaymentRequest};
use crate::currency::Rupiah;
use crate::error::{Result, SettlementError};
use crate::fee::FeeSchedule;
use crate::session::ParkingSession;
use chrono::{DateTime, Utc};
use log::{debug, warn};
use std::fmt;

/// Where a settlement attempt currently stands.
///
/// The idle state is the absence of a `Settlement`; constructing one via
/// [`Settlement::begin`] is the first transition. From `Failed` the attempt
/// may be resubmitted as-is or after correcting the tendered amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettlementState {
    /// Fee computed; waiting for a tendered amount.
    FeeComputed,

    /// Tendered amount on record; ready to submit.
    AmountEntered,

    /// Payment request in flight.
    Submitting,

    /// Payment accepted and session marked settled.
    Settled,

    /// Last submission failed; retry permitted.
    Failed,
}

impl fmt::Display for SettlementState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SettlementState::FeeComputed => "fee-computed",
            SettlementState::AmountEntered => "amount-entered",
            SettlementState::Submitting => "submitting",
            SettlementState::Settled => "settled",
            SettlementState::Failed => "failed",
        };
        write!(f, "{}", name)
    }
}

/// What a successful settlement produced.
#[derive(Debug, Clone, PartialEq)]
pub struct SettlementOutcome {
    pub plate_number: String,

    /// Exit time recorded on the session and sent to the backend.
    pub exit_time: DateTime<Utc>,

    /// Amount actually charged: zero for members, the computed fee otherwise.
    pub amount_paid: Rupiah,

    /// `tendered - computed_fee`. For members this is the change against the
    /// displayed fee; the tendered cash itself is returned in full.
    pub change_due: Rupiah,

    /// Rendered actuator failure, if the gate servo call did not succeed.
    /// Never reverses the settlement.
    pub actuator_error: Option<String>,
}

/// One settlement attempt for one parking session.
///
/// Owns the session for the duration of the attempt. Dropping the value in
/// any state short of `Submitting` abandons the attempt with no side
/// effects; [`Settlement::into_session`] recovers the session either way.
#[derive(Debug)]
pub struct Settlement {
    session: ParkingSession,
    member: bool,
    fee: Rupiah,
    tendered: Option<Rupiah>,
    state: SettlementState,
    failure: Option<String>,
}

impl Settlement {
    /// Starts an attempt for a parked session.
    ///
    /// The fee is computed here, against `now`, and never re-evaluated.
    /// Sessions that already settled are refused.
    pub fn begin(
        session: ParkingSession,
        member: bool,
        schedule: &FeeSchedule,
        now: DateTime<Utc>,
    ) -> Result<Self> {
        if !session.is_parked() {
            return Err(SettlementError::AlreadySettled(session.plate_number));
        }

        let fee = schedule.fee_for(session.entry_time, now);
        debug!(
            "Settlement begun for {} (fee {}, member: {})",
            session.plate_number, fee, member
        );

        Ok(Settlement {
            session,
            member,
            fee,
            tendered: None,
            state: SettlementState::FeeComputed,
            failure: None,
        })
    }

    /// Current state of the attempt.
    pub fn state(&self) -> SettlementState {
        self.state
    }

    /// The fee computed when the attempt began.
    pub fn fee(&self) -> Rupiah {
        self.fee
    }

    /// Whether the plate was confirmed as a member when the attempt began.
    pub fn is_member(&self) -> bool {
        self.member
    }

    /// The session as this attempt currently sees it.
    pub fn session(&self) -> &ParkingSession {
        &self.session
    }

    /// The amount that will be sent as `amount_paid`: zero for members,
    /// the computed fee otherwise.
    pub fn amount_due(&self) -> Rupiah {
        if self.member {
            Rupiah::ZERO
        } else {
            self.fee
        }
    }

    /// Change against the tendered amount, if one has been entered.
    /// Negative while the tendered amount is still short of the fee.
    pub fn change_due(&self) -> Option<Rupiah> {
        self.tendered.map(|tendered| tendered - self.fee)
    }

    /// The message carried by the last failure, if any.
    pub fn last_failure(&self) -> Option<&str> {
        self.failure.as_deref()
    }

    /// Records (or corrects) the tendered amount and returns the change due.
    ///
    /// Permitted any time before the session settles; calling it after a
    /// failed submission resets the attempt for a retry.
    pub fn enter_amount(&mut self, tendered: Rupiah) -> Result<Rupiah> {
        match self.state {
            SettlementState::Settled => {
                Err(SettlementError::AlreadySettled(self.session.plate_number.clone()))
            }
            SettlementState::Submitting => Err(SettlementError::SubmissionInFlight(
                self.session.plate_number.clone(),
            )),
            _ => {
                self.tendered = Some(tendered);
                self.state = SettlementState::AmountEntered;
                Ok(tendered - self.fee)
            }
        }
    }

    /// Submits the payment and, on a gate go-ahead, settles the session and
    /// fires the actuator once.
    ///
    /// Refused without any network traffic while the tendered amount is
    /// missing or short of the fee. A transport failure or a backend
    /// refusal moves the attempt to `Failed`, mutates nothing locally, and
    /// leaves the attempt retryable. An actuator failure after settlement is
    /// reported in the outcome and logged, never propagated.
    pub async fn submit<B: GateBackend>(
        &mut self,
        backend: &B,
        now: DateTime<Utc>,
    ) -> Result<SettlementOutcome> {
        match self.state {
            SettlementState::Settled => {
                return Err(SettlementError::AlreadySettled(
                    self.session.plate_number.clone(),
                ));
            }
            SettlementState::Submitting => {
                return Err(SettlementError::SubmissionInFlight(
                    self.session.plate_number.clone(),
                ));
            }
            _ => {}
        }

        let tendered = self.tendered.ok_or(SettlementError::AmountMissing)?;
        if tendered < self.fee {
            return Err(SettlementError::InsufficientAmount {
                tendered,
                fee: self.fee,
            });
        }

        self.state = SettlementState::Submitting;
        let request = PaymentRequest {
            plate_number: self.session.plate_number.clone(),
            exit_time: now,
            amount_paid: self.amount_due(),
        };
        debug!(
            "Submitting payment for {} (amount_paid {})",
            request.plate_number, request.amount_paid
        );

        let response = match backend.submit_payment(&request).await {
            Ok(response) => response,
            Err(err) => {
                self.state = SettlementState::Failed;
                self.failure = Some(err.to_string());
                return Err(err);
            }
        };

        if !response.open_gate {
            self.state = SettlementState::Failed;
            self.failure = response.message.clone();
            return Err(SettlementError::Rejected {
                message: response.message,
            });
        }

        let charged = self.amount_due();
        self.session.settle(now, charged);
        self.state = SettlementState::Settled;
        debug!(
            "Settled {} (charged {}, change {})",
            self.session.plate_number,
            charged,
            tendered - self.fee
        );

        let actuator_error = match backend.trigger_gate().await {
            Ok(()) => None,
            Err(err) => {
                warn!(
                    "Gate actuator call failed for {}: {}",
                    self.session.plate_number, err
                );
                Some(err.to_string())
            }
        };

        Ok(SettlementOutcome {
            plate_number: self.session.plate_number.clone(),
            exit_time: now,
            amount_paid: charged,
            change_due: tendered - self.fee,
            actuator_error,
        })
    }

    /// Consumes the attempt and returns the session: settled if submission
    /// succeeded, untouched if the attempt was abandoned.
    pub fn into_session(self) -> ParkingSession {
        self.session
    }
}

/// Full settlement for one plate: fetch sessions, select the parked one,
/// look up membership, then `begin -> enter_amount -> submit`.
///
/// A membership lookup failure is charged as non-member rather than aborting
/// the settlement; the degradation is logged so operators can see it.
pub async fn settle_plate<B: GateBackend>(
    backend: &B,
    schedule: &FeeSchedule,
    plate: &str,
    tendered: Rupiah,
    now: DateTime<Utc>,
) -> Result<SettlementOutcome> {
    let sessions = backend.fetch_sessions().await?;
    let session = sessions
        .into_iter()
        .find(|session| session.plate_number == plate && session.is_parked())
        .ok_or_else(|| SettlementError::NotParked(plate.to_string()))?;

    let member = match backend.member_status(plate).await {
        Ok(status) => status,
        Err(err) => {
            warn!(
                "Membership lookup failed for {}: {}; charging as non-member",
                plate, err
            );
            false
        }
    };

    let mut settlement = Settlement::begin(session, member, schedule, now)?;
    settlement.enter_amount(tendered)?;
    settlement.submit(backend, now).await
}
