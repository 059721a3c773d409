//! Text shown in the icon and the tooltip.

use crate::power::{ChargeState, PowerLine, PowerStatus};

const CHARGING: &str = "Charging";
const NOT_CHARGING: &str = "Low charging power";
const PLUGGED_IN: &str = "Plugged in";
const ON_BATTERY: &str = "On battery";

/// Shown in place of a number when the OS has no answer.
pub const UNKNOWN_PERCENT: &str = "?";
pub const UNKNOWN_TIME: &str = "\u{221E}";

/// Whole percentage, rounded half away from zero. `None` when unknown.
fn whole_percent(fraction: f64) -> Option<i64> {
    if fraction < 0.0 || !fraction.is_finite() {
        return None;
    }
    Some((fraction * 100.0).round() as i64)
}

/// Bare integer percentage drawn into the icon: `0.42` -> `"42"`.
pub fn percentage_text(fraction: f64) -> String {
    match whole_percent(fraction) {
        Some(p) => p.to_string(),
        None => UNKNOWN_PERCENT.into(),
    }
}

/// Percent with sign for the tooltip: `0.42` -> `"42%"`.
pub fn percent_label(fraction: f64) -> String {
    match whole_percent(fraction) {
        Some(p) => format!("{}%", p),
        None => UNKNOWN_PERCENT.into(),
    }
}

/// `H:MM:SS`, or `∞` for a negative (unknown) estimate.
pub fn human_readable_remaining_time(seconds: i64) -> String {
    if seconds < 0 {
        return UNKNOWN_TIME.into();
    }
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;
    format!("{}:{:02}:{:02}", hours, minutes, secs)
}

/// Power source phrase. Anything other than an explicit offline line is
/// reported as plugged in.
pub fn plug_status(line: PowerLine, charge: ChargeState) -> String {
    if line == PowerLine::Offline {
        return ON_BATTERY.into();
    }
    let charge = match charge {
        ChargeState::Charging => CHARGING,
        ChargeState::NotCharging => NOT_CHARGING,
    };
    format!("{}, {}", PLUGGED_IN, charge)
}

/// Full hover text, e.g. `50% - On battery: ∞ remaining`.
pub fn tooltip(status: &PowerStatus) -> String {
    format!(
        "{} - {}: {} remaining",
        percent_label(status.battery_fraction),
        plug_status(status.line, status.charge),
        human_readable_remaining_time(status.remaining_seconds),
    )
}
