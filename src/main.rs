//! Gate Settlement CLI
//!
//! An operator console for the parking gate: list current sessions, preview
//! the fee due for a plate, or settle a session and release the gate.
//!
//! # Usage
//!
//! ```bash
//! gate-settlement list
//! gate-settlement fee "B 1234 CD"
//! gate-settlement settle "B 1234 CD" 10000
//! ```
//!
//! # Environment Variables
//!
//! - `RUST_LOG`: set to `debug` or `warn` to control logging verbosity
//! - `GATE_LOGS_URL`, `GATE_MEMBERSHIP_URL`, `GATE_PAYMENT_URL`,
//!   `GATE_SERVO_URL`: collaborator endpoint overrides

use chrono::Utc;
use gate_settlement::{
    session, settle_plate, Endpoints, FeeSchedule, GateBackend, HttpBackend, Result, Rupiah,
    SettlementError,
};
use std::env;
use std::io;
use std::process;
use std::str::FromStr;

#[tokio::main]
async fn main() {
    env_logger::init();

    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

async fn run() -> Result<()> {
    let args: Vec<String> = env::args().collect();
    let command = args.get(1).ok_or(SettlementError::MissingArgument)?;

    let backend = HttpBackend::new(Endpoints::from_env());

    match command.as_str() {
        "list" => list(&backend).await,
        "fee" => {
            let plate = args.get(2).ok_or(SettlementError::MissingArgument)?;
            fee(&backend, plate).await
        }
        "settle" => {
            let plate = args.get(2).ok_or(SettlementError::MissingArgument)?;
            let raw_amount = args.get(3).ok_or(SettlementError::MissingArgument)?;
            let tendered = Rupiah::from_str(raw_amount)
                .map_err(|_| SettlementError::InvalidAmount(raw_amount.clone()))?;
            settle(&backend, plate, tendered).await
        }
        other => Err(SettlementError::UnknownCommand(other.to_string())),
    }
}

async fn list(backend: &HttpBackend) -> Result<()> {
    let sessions = backend.fetch_sessions().await?;

    let stdout = io::stdout();
    let handle = stdout.lock();
    session::write_sessions(&sessions, handle)?;

    Ok(())
}

async fn fee(backend: &HttpBackend, plate: &str) -> Result<()> {
    let sessions = backend.fetch_sessions().await?;
    let session = sessions
        .iter()
        .find(|session| session.plate_number == plate && session.is_parked())
        .ok_or_else(|| SettlementError::NotParked(plate.to_string()))?;

    let due = FeeSchedule::default().fee_for(session.entry_time, Utc::now());
    println!("{}", due);

    Ok(())
}

async fn settle(backend: &HttpBackend, plate: &str, tendered: Rupiah) -> Result<()> {
    let outcome = settle_plate(
        backend,
        &FeeSchedule::default(),
        plate,
        tendered,
        Utc::now(),
    )
    .await?;

    println!("plate:  {}", outcome.plate_number);
    println!("paid:   {}", outcome.amount_paid);
    println!("change: {}", outcome.change_due);

    if let Some(actuator_error) = &outcome.actuator_error {
        eprintln!(
            "Warning: payment settled but the gate did not open: {}",
            actuator_error
        );
    }

    Ok(())
}
