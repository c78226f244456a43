//! # Gate Settlement
//!
//! A settlement engine for a parking-gate operation: computes the parking
//! fee for a stay, reconciles a tendered cash amount against it, submits the
//! payment to the remote backend, and triggers the physical gate on a
//! go-ahead.
//!
//! ## Design Principles
//!
//! - **Integer currency**: whole-rupiah amounts, no fractional units
//! - **Fee fixed at computation instant**: never silently re-evaluated
//! - **One request per submission**: no hidden retries, no duplicate
//!   actuator calls
//! - **Backend behind a trait**: every workflow testable without a network
//!
//! ## Example
//!
//! ```no_run
//! use gate_settlement::{settle_plate, Endpoints, FeeSchedule, HttpBackend, Rupiah};
//!
//! # async fn demo() -> gate_settlement::Result<()> {
//! let backend = HttpBackend::new(Endpoints::from_env());
//! let outcome = settle_plate(
//!     &backend,
//!     &FeeSchedule::default(),
//!     "B 1234 CD",
//!     Rupiah::new(10_000),
//!     chrono::Utc::now(),
//! )
//! .await?;
//! println!("paid {}, change {}", outcome.amount_paid, outcome.change_due);
//! # Ok(())
//! # }
//! ```

pub mod backend;
pub mod config;
pub mod currency;
pub mod engine;
pub mod error;
pub mod fee;
pub mod session;

pub use backend::{GateBackend, HttpBackend, PaymentRequest, PaymentResponse};
pub use config::Endpoints;
pub use currency::Rupiah;
pub use engine::{settle_plate, Settlement, SettlementOutcome, SettlementState};
pub use error::{Result, SettlementError};
pub use fee::FeeSchedule;
pub use session::{MembershipRecord, ParkingSession, SessionRecord, SessionStatus};
