//! Collaborator endpoint configuration.

use std::env;
use std::time::Duration;

/// Per-request timeout for every collaborator call.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

const DEFAULT_LOGS_URL: &str = "http://tkj-3b.com/tkj-3b.com/opengate/parking-logs.php";
const DEFAULT_MEMBERSHIP_URL: &str = "http://tkj-3b.com/tkj-3b.com/opengate/get-vehicles.php";
const DEFAULT_PAYMENT_URL: &str = "http://tkj-3b.com/tkj-3b.com/opengate/parking-payment.php";
const DEFAULT_SERVO_URL: &str = "http://10.12.12.251:5050/servo/open";

/// URLs of the four remote collaborators.
///
/// `Default` yields the deployed endpoints; `from_env` additionally honors
/// `GATE_LOGS_URL`, `GATE_MEMBERSHIP_URL`, `GATE_PAYMENT_URL`, and
/// `GATE_SERVO_URL` overrides for test rigs and lab setups.
#[derive(Debug, Clone)]
pub struct Endpoints {
    /// Parking-logs listing (GET).
    pub logs_url: String,

    /// Membership roll (GET).
    pub membership_url: String,

    /// Payment submission (POST).
    pub payment_url: String,

    /// Gate servo trigger (POST).
    pub servo_url: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Endpoints {
            logs_url: DEFAULT_LOGS_URL.to_string(),
            membership_url: DEFAULT_MEMBERSHIP_URL.to_string(),
            payment_url: DEFAULT_PAYMENT_URL.to_string(),
            servo_url: DEFAULT_SERVO_URL.to_string(),
        }
    }
}

impl Endpoints {
    /// Builds endpoints from the environment, falling back to the deployed
    /// defaults for any unset variable.
    pub fn from_env() -> Self {
        let defaults = Endpoints::default();
        Endpoints {
            logs_url: env::var("GATE_LOGS_URL").unwrap_or(defaults.logs_url),
            membership_url: env::var("GATE_MEMBERSHIP_URL").unwrap_or(defaults.membership_url),
            payment_url: env::var("GATE_PAYMENT_URL").unwrap_or(defaults.payment_url),
            servo_url: env::var("GATE_SERVO_URL").unwrap_or(defaults.servo_url),
        }
    }
}
