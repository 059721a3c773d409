//! Battery and power-line snapshot as reported by the OS.

/// AC power line state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerLine {
    Online,
    Offline,
    /// Reported but neither online nor offline.
    Unknown,
}

/// Battery charge state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChargeState {
    Charging,
    NotCharging,
}

/// One power status reading, taken fresh on every tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PowerStatus {
    /// 0.0..=1.0, negative when unknown.
    pub battery_fraction: f64,
    /// Estimated seconds of battery left, negative when unknown.
    pub remaining_seconds: i64,
    pub line: PowerLine,
    pub charge: ChargeState,
}

// SYSTEM_POWER_STATUS sentinels.
const AC_LINE_OFFLINE: u8 = 0;
const AC_LINE_ONLINE: u8 = 1;
const BATTERY_FLAG_CHARGING: u8 = 8;
const BATTERY_FLAG_UNKNOWN: u8 = 255;
const BATTERY_PERCENT_UNKNOWN: u8 = 255;
const BATTERY_LIFE_UNKNOWN: u32 = u32::MAX;

impl PowerStatus {
    /// Snapshot used when the OS query fails.
    pub fn unknown() -> Self {
        Self {
            battery_fraction: -1.0,
            remaining_seconds: -1,
            line: PowerLine::Unknown,
            charge: ChargeState::NotCharging,
        }
    }

    /// Decode the raw `SYSTEM_POWER_STATUS` fields.
    pub fn from_system(
        ac_line_status: u8,
        battery_flag: u8,
        battery_life_percent: u8,
        battery_life_time: u32,
    ) -> Self {
        let line = match ac_line_status {
            AC_LINE_OFFLINE => PowerLine::Offline,
            AC_LINE_ONLINE => PowerLine::Online,
            _ => PowerLine::Unknown,
        };
        let charge = if battery_flag != BATTERY_FLAG_UNKNOWN
            && battery_flag & BATTERY_FLAG_CHARGING != 0
        {
            ChargeState::Charging
        } else {
            ChargeState::NotCharging
        };
        let battery_fraction = if battery_life_percent == BATTERY_PERCENT_UNKNOWN {
            -1.0
        } else {
            f64::from(battery_life_percent) / 100.0
        };
        let remaining_seconds = if battery_life_time == BATTERY_LIFE_UNKNOWN {
            -1
        } else {
            i64::from(battery_life_time)
        };

        Self {
            battery_fraction,
            remaining_seconds,
            line,
            charge,
        }
    }
}

/// Anything that can report the current power status.
pub trait PowerSource {
    /// Never fails; an unusable reading comes back as [`PowerStatus::unknown`].
    fn query(&mut self) -> PowerStatus;
}

#[cfg(windows)]
pub use system::SystemPowerSource;

#[cfg(windows)]
mod system {
    use tracing::warn;
    use windows::Win32::System::Power::{GetSystemPowerStatus, SYSTEM_POWER_STATUS};

    use super::{PowerSource, PowerStatus};

    /// `GetSystemPowerStatus` backed source.
    pub struct SystemPowerSource;

    impl PowerSource for SystemPowerSource {
        fn query(&mut self) -> PowerStatus {
            let mut sps = SYSTEM_POWER_STATUS::default();
            // SAFETY: `sps` is a valid, writable SYSTEM_POWER_STATUS.
            match unsafe { GetSystemPowerStatus(&mut sps) } {
                Ok(()) => PowerStatus::from_system(
                    sps.ACLineStatus,
                    sps.BatteryFlag,
                    sps.BatteryLifePercent,
                    sps.BatteryLifeTime,
                ),
                Err(e) => {
                    warn!(error = %e, "GetSystemPowerStatus failed");
                    PowerStatus::unknown()
                }
            }
        }
    }
}
