//! Application context: one power source, one tray entry, one renderer.

use std::time::{Duration, Instant};
use tracing::debug;

use crate::error::TrayError;
use crate::format;
use crate::power::{PowerSource, PowerStatus};
use crate::render::TextRenderer;
use crate::tray::TrayHost;

pub struct Indicator<P, H> {
    power: P,
    host: H,
    renderer: TextRenderer,
    percentage: String,
}

impl<P: PowerSource, H: TrayHost> Indicator<P, H> {
    pub fn new(power: P, host: H, renderer: TextRenderer) -> Self {
        Self {
            power,
            host,
            renderer,
            percentage: format::UNKNOWN_PERCENT.into(),
        }
    }

    /// Text currently drawn in the icon.
    pub fn percentage(&self) -> &str {
        &self.percentage
    }

    #[cfg(test)]
    pub fn host(&self) -> &H {
        &self.host
    }

    /// Show the `?` placeholder until the first tick.
    pub fn show_placeholder(&mut self) -> Result<(), TrayError> {
        self.publish(format::UNKNOWN_PERCENT, format::UNKNOWN_PERCENT)?;
        self.host.set_visible(true)
    }

    /// Query, render and publish once.
    pub fn tick(&mut self) -> Result<PowerStatus, TrayError> {
        let status = self.power.query();
        let text = format::percentage_text(status.battery_fraction);
        let tooltip = format::tooltip(&status);
        debug!(percent = %text, tooltip = %tooltip, "tick");

        self.publish(&text, &tooltip)?;
        self.percentage = text;
        Ok(status)
    }

    fn publish(&mut self, text: &str, tooltip: &str) -> Result<(), TrayError> {
        // The bitmap moves into the icon; a failed assignment drops the icon
        // inside `set_icon`.
        let icon = self.host.create_icon(self.renderer.render(text))?;
        self.host.set_icon(icon)?;
        self.host.set_tooltip(tooltip)
    }

    /// Hide the entry and hand back the host for disposal.
    pub fn shutdown(mut self) -> (H, Result<(), TrayError>) {
        let hidden = self.host.set_visible(false);
        (self.host, hidden)
    }
}

/// Fixed-period deadline for `ControlFlow::WaitUntil`.
#[derive(Debug)]
pub struct Ticker {
    period: Duration,
    next: Instant,
}

impl Ticker {
    pub fn new(period: Duration, now: Instant) -> Self {
        Self {
            period,
            next: now + period,
        }
    }

    pub fn deadline(&self) -> Instant {
        self.next
    }

    /// `true` if a tick is due at `now`; advances the deadline. A loop that
    /// fell more than a period behind is re-anchored instead of catching up.
    pub fn poll(&mut self, now: Instant) -> bool {
        if now < self.next {
            return false;
        }
        self.next += self.period;
        if self.next <= now {
            self.next = now + self.period;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::power::{ChargeState, PowerLine};
    use image::RgbaImage;
    use std::cell::Cell;
    use std::collections::VecDeque;
    use std::rc::Rc;

    struct ScriptedPower {
        readings: VecDeque<PowerStatus>,
    }

    impl PowerSource for ScriptedPower {
        fn query(&mut self) -> PowerStatus {
            self.readings.pop_front().unwrap_or_else(PowerStatus::unknown)
        }
    }

    /// Icon that counts itself as a live OS handle until dropped.
    struct CountedIcon {
        live: Rc<Cell<usize>>,
        size: (u32, u32),
    }

    impl Drop for CountedIcon {
        fn drop(&mut self) {
            self.live.set(self.live.get() - 1);
        }
    }

    #[derive(Default)]
    struct FakeTray {
        live: Rc<Cell<usize>>,
        icon: Option<CountedIcon>,
        tooltip: Option<String>,
        visible: bool,
        fail_set_icon: bool,
    }

    impl TrayHost for FakeTray {
        type Icon = CountedIcon;

        fn create_icon(&self, image: RgbaImage) -> Result<CountedIcon, TrayError> {
            self.live.set(self.live.get() + 1);
            Ok(CountedIcon {
                live: self.live.clone(),
                size: image.dimensions(),
            })
        }

        fn set_icon(&mut self, icon: CountedIcon) -> Result<(), TrayError> {
            if self.fail_set_icon {
                return Err(TrayError::Shell("shell refused icon".into()));
            }
            self.icon = Some(icon);
            Ok(())
        }

        fn set_tooltip(&mut self, text: &str) -> Result<(), TrayError> {
            self.tooltip = Some(text.to_string());
            Ok(())
        }

        fn set_visible(&mut self, visible: bool) -> Result<(), TrayError> {
            self.visible = visible;
            Ok(())
        }
    }

    fn status(fraction: f64, seconds: i64, line: PowerLine, charge: ChargeState) -> PowerStatus {
        PowerStatus {
            battery_fraction: fraction,
            remaining_seconds: seconds,
            line,
            charge,
        }
    }

    fn indicator(readings: Vec<PowerStatus>) -> Indicator<ScriptedPower, FakeTray> {
        Indicator::new(
            ScriptedPower {
                readings: readings.into(),
            },
            FakeTray::default(),
            TextRenderer::pixel(18.7),
        )
    }

    #[test]
    fn test_placeholder_before_first_tick() {
        let mut ind = indicator(vec![]);
        assert_eq!(ind.percentage(), "?");
        ind.show_placeholder().unwrap();
        assert!(ind.host().visible);
        assert_eq!(ind.host().tooltip.as_deref(), Some("?"));
        assert!(ind.host().icon.is_some());
    }

    #[test]
    fn test_tick_full_and_charging() {
        let mut ind = indicator(vec![status(1.0, 0, PowerLine::Online, ChargeState::Charging)]);
        ind.tick().unwrap();
        assert_eq!(ind.percentage(), "100");
        assert_eq!(
            ind.host().tooltip.as_deref(),
            Some("100% - Plugged in, Charging: 0:00:00 remaining")
        );
    }

    #[test]
    fn test_tick_half_on_battery() {
        let mut ind = indicator(vec![status(0.5, -1, PowerLine::Offline, ChargeState::NotCharging)]);
        ind.tick().unwrap();
        assert_eq!(ind.percentage(), "50");
        assert_eq!(
            ind.host().tooltip.as_deref(),
            Some("50% - On battery: ∞ remaining")
        );
    }

    #[test]
    fn test_icon_sized_to_text() {
        let renderer = TextRenderer::pixel(18.7);
        let expected = renderer.measure("42");
        let mut ind = indicator(vec![status(0.42, 60, PowerLine::Offline, ChargeState::NotCharging)]);
        ind.tick().unwrap();
        let icon = ind.host().icon.as_ref().unwrap();
        assert_eq!(icon.size, (expected.width, expected.height));
    }

    #[test]
    fn test_query_failure_degrades() {
        let mut ind = indicator(vec![]);
        let reading = ind.tick().unwrap();
        assert_eq!(reading, PowerStatus::unknown());
        assert_eq!(ind.percentage(), "?");
        assert_eq!(
            ind.host().tooltip.as_deref(),
            Some("? - Plugged in, Low charging power: ∞ remaining")
        );
    }

    #[test]
    fn test_one_live_icon_across_ticks() {
        let readings = (0..50)
            .map(|i| status(i as f64 / 100.0, i * 60, PowerLine::Offline, ChargeState::NotCharging))
            .collect();
        let mut ind = indicator(readings);
        ind.show_placeholder().unwrap();
        assert_eq!(ind.host().live.get(), 1);
        for _ in 0..50 {
            ind.tick().unwrap();
            assert_eq!(ind.host().live.get(), 1);
        }
    }

    #[test]
    fn test_failed_assignment_releases_icon() {
        let mut ind = indicator(vec![status(0.3, 10, PowerLine::Online, ChargeState::Charging)]);
        ind.show_placeholder().unwrap();
        ind.host.fail_set_icon = true;
        assert!(matches!(ind.tick(), Err(TrayError::Shell(_))));
        assert_eq!(ind.host().live.get(), 1);
        // Previous text and tooltip stay on display
        assert_eq!(ind.percentage(), "?");
        assert_eq!(ind.host().tooltip.as_deref(), Some("?"));
    }

    #[test]
    fn test_shutdown_hides_and_releases() {
        let mut ind = indicator(vec![status(0.8, 100, PowerLine::Offline, ChargeState::NotCharging)]);
        ind.show_placeholder().unwrap();
        ind.tick().unwrap();
        let live = ind.host().live.clone();
        let (host, hidden) = ind.shutdown();
        assert!(hidden.is_ok());
        assert!(!host.visible);
        drop(host);
        assert_eq!(live.get(), 0);
    }

    #[test]
    fn test_ticker_fires_on_period() {
        let start = Instant::now();
        let period = Duration::from_millis(1000);
        let mut ticker = Ticker::new(period, start);
        assert_eq!(ticker.deadline(), start + period);
        assert!(!ticker.poll(start + Duration::from_millis(999)));
        assert!(ticker.poll(start + period));
        assert_eq!(ticker.deadline(), start + period * 2);
        assert!(!ticker.poll(start + period));
    }

    #[test]
    fn test_ticker_reanchors_when_behind() {
        let start = Instant::now();
        let period = Duration::from_millis(1000);
        let mut ticker = Ticker::new(period, start);
        let late = start + Duration::from_millis(5500);
        assert!(ticker.poll(late));
        assert_eq!(ticker.deadline(), late + period);
        assert!(!ticker.poll(late));
    }

    #[test]
    fn test_ticker_keeps_cadence_when_slightly_late() {
        let start = Instant::now();
        let period = Duration::from_millis(1000);
        let mut ticker = Ticker::new(period, start);
        assert!(ticker.poll(start + Duration::from_millis(1200)));
        assert_eq!(ticker.deadline(), start + period * 2);
    }
}
