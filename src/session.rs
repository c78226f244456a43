//! Parking session model and wire-record parsing.
//!
//! The parking-logs backend predates this crate and is loose about field
//! names and value types: the same record may carry `entry_time` or
//! `time_in`, `exit_time` or `time_out`, `parking_fee` or `fee`, and amounts
//! arrive either as numbers or as numeric strings. Parsing coalesces the
//! synonyms and tolerates both shapes; records that cannot yield a plate and
//! an entry time are skipped by the caller.

use crate::currency::Rupiah;
use crate::error::Result;
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::Write;

/// Whether a vehicle is still in the lot or has settled and left.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionStatus {
    /// Vehicle is parked; no exit recorded.
    #[serde(rename = "PARKIR")]
    Parkir,

    /// Exit recorded and fee settled.
    #[serde(rename = "SELESAI")]
    Selesai,
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionStatus::Parkir => write!(f, "PARKIR"),
            SessionStatus::Selesai => write!(f, "SELESAI"),
        }
    }
}

/// One vehicle's stay, from entry to settlement.
///
/// Created by the entry-side collaborator; this crate only ever mutates a
/// session once, when settlement completes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParkingSession {
    /// License plate, e.g. `"B 1234 CD"`. Matched by exact string equality.
    pub plate_number: String,

    /// When the vehicle entered the lot.
    pub entry_time: DateTime<Utc>,

    /// When the vehicle left. `None` while still parked.
    pub exit_time: Option<DateTime<Utc>>,

    /// The amount actually charged. Zero until settled, and zero forever
    /// for member vehicles.
    pub parking_fee: Rupiah,

    /// Derived from `exit_time` presence on the wire.
    pub status: SessionStatus,
}

impl ParkingSession {
    /// Returns `true` while the vehicle is still in the lot.
    pub fn is_parked(&self) -> bool {
        self.status == SessionStatus::Parkir
    }

    /// Marks the session settled with the given exit time and charged fee.
    ///
    /// Returns `false` (and changes nothing) if the session already settled.
    pub fn settle(&mut self, exit_time: DateTime<Utc>, fee: Rupiah) -> bool {
        if !self.is_parked() {
            return false;
        }
        self.exit_time = Some(exit_time);
        self.parking_fee = fee;
        self.status = SessionStatus::Selesai;
        true
    }
}

/// An amount that may arrive as a JSON number or a numeric string.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum LooseAmount {
    Number(i64),
    Text(String),
}

impl LooseAmount {
    fn as_rupiah(&self) -> Option<Rupiah> {
        match self {
            LooseAmount::Number(n) => Some(Rupiah::new(*n)),
            LooseAmount::Text(s) => s.trim().parse::<i64>().ok().map(Rupiah::new),
        }
    }
}

/// Raw parking-log record as returned by the logs endpoint.
#[derive(Debug, Deserialize)]
pub struct SessionRecord {
    #[serde(default)]
    pub plate_number: Option<String>,

    #[serde(default)]
    entry_time: Option<String>,
    #[serde(default)]
    time_in: Option<String>,

    #[serde(default)]
    exit_time: Option<String>,
    #[serde(default)]
    time_out: Option<String>,

    #[serde(default)]
    parking_fee: Option<LooseAmount>,
    #[serde(default)]
    fee: Option<LooseAmount>,
}

impl SessionRecord {
    /// Parses the raw record into a typed session.
    ///
    /// Returns `None` if the plate is missing/empty or no entry timestamp
    /// parses. A missing fee is zero; an exit time that fails to parse is
    /// treated as absent, leaving the session parked.
    pub fn parse(&self) -> Option<ParkingSession> {
        let plate = self.plate_number.as_deref()?.trim();
        if plate.is_empty() {
            return None;
        }

        let entry_raw = self.entry_time.as_deref().or(self.time_in.as_deref())?;
        let entry_time = parse_timestamp(entry_raw)?;

        let exit_time = self
            .exit_time
            .as_deref()
            .or(self.time_out.as_deref())
            .and_then(parse_timestamp);

        let parking_fee = self
            .parking_fee
            .as_ref()
            .or(self.fee.as_ref())
            .and_then(LooseAmount::as_rupiah)
            .unwrap_or(Rupiah::ZERO);

        let status = if exit_time.is_some() {
            SessionStatus::Selesai
        } else {
            SessionStatus::Parkir
        };

        Some(ParkingSession {
            plate_number: plate.to_string(),
            entry_time,
            exit_time,
            parking_fee,
            status,
        })
    }
}

/// Parses the backend's two timestamp dialects: RFC 3339, or the bare
/// `YYYY-MM-DD HH:MM:SS` that the database layer emits (read as UTC).
fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(parsed) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(parsed.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%d %H:%M:%S")
        .ok()
        .map(|naive| naive.and_utc())
}

/// A membership roll entry.
///
/// `is_member` is `"0"`/`"1"` on paper, but the endpoint has also been seen
/// emitting bare numbers, so both are accepted.
#[derive(Debug, Clone, Deserialize)]
pub struct MembershipRecord {
    pub plate_number: String,

    #[serde(default)]
    is_member: Option<MemberFlag>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum MemberFlag {
    Number(i64),
    Text(String),
    Flag(bool),
}

impl MembershipRecord {
    /// Returns `true` if this record marks the plate as a member.
    pub fn is_member(&self) -> bool {
        match &self.is_member {
            Some(MemberFlag::Number(n)) => *n != 0,
            Some(MemberFlag::Text(s)) => s.trim() == "1",
            Some(MemberFlag::Flag(b)) => *b,
            None => false,
        }
    }
}

/// Writes sessions as CSV.
///
/// Output is sorted newest entry first, then by plate, for deterministic
/// results. Timestamps are RFC 3339; an unsettled exit time is left blank.
pub fn write_sessions<W: Write>(sessions: &[ParkingSession], writer: W) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);

    csv_writer.write_record(["plate_number", "entry_time", "exit_time", "parking_fee", "status"])?;

    let mut sorted: Vec<&ParkingSession> = sessions.iter().collect();
    sorted.sort_by(|a, b| {
        b.entry_time
            .cmp(&a.entry_time)
            .then_with(|| a.plate_number.cmp(&b.plate_number))
    });

    for session in sorted {
        csv_writer.write_record([
            session.plate_number.clone(),
            session.entry_time.to_rfc3339(),
            session
                .exit_time
                .map(|t| t.to_rfc3339())
                .unwrap_or_default(),
            session.parking_fee.to_string(),
            session.status.to_string(),
        ])?;
    }

    csv_writer.flush()?;
    Ok(())
}
