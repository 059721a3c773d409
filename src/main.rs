#![cfg_attr(all(windows, not(debug_assertions)), windows_subsystem = "windows")]
// Only the pure pieces are reachable off Windows.
#![cfg_attr(not(windows), allow(dead_code))]

mod config;
mod error;
mod format;
mod indicator;
mod power;
mod render;
mod tray;

use tracing::{error, info};

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();
}

#[cfg(windows)]
fn main() {
    init_tracing();
    info!(version = env!("CARGO_PKG_VERSION"), "battery-tray starting");

    let cfg = config::load();
    if let Err(e) = app::run(cfg) {
        error!(error = %e, "battery-tray failed to start");
        std::process::exit(1);
    }
}

#[cfg(not(windows))]
fn main() {
    init_tracing();
    info!(version = env!("CARGO_PKG_VERSION"), "battery-tray starting");
    error!("battery-tray needs the Windows power status and shell tray APIs");
    std::process::exit(1);
}

#[cfg(windows)]
mod app {
    use std::time::Instant;
    use tao::{
        event::{Event, StartCause},
        event_loop::{ControlFlow, EventLoop, EventLoopBuilder},
    };
    use tray_icon::{menu::MenuEvent, TrayIconEvent};
    use tracing::{error, info, trace, warn};

    use crate::config::TrayConfig;
    use crate::error::TrayError;
    use crate::format;
    use crate::indicator::{Indicator, Ticker};
    use crate::power::SystemPowerSource;
    use crate::render::TextRenderer;
    use crate::tray::{self, ShellTray};

    enum UserEvent {
        TrayIconEvent(TrayIconEvent),
        MenuEvent(MenuEvent),
    }

    /// Route menu and tray events into the loop so they run on the UI thread.
    /// Without a tray handler tray-icon queues every hover into a global
    /// channel nobody drains.
    fn forward_events(event_loop: &EventLoop<UserEvent>) {
        let proxy = event_loop.create_proxy();
        TrayIconEvent::set_event_handler(Some(move |event| {
            let _ = proxy.send_event(UserEvent::TrayIconEvent(event));
        }));

        let proxy = event_loop.create_proxy();
        MenuEvent::set_event_handler(Some(move |event| {
            let _ = proxy.send_event(UserEvent::MenuEvent(event));
        }));
    }

    pub fn run(cfg: TrayConfig) -> Result<(), TrayError> {
        let event_loop = EventLoopBuilder::<UserEvent>::with_user_event().build();
        forward_events(&event_loop);

        let (menu, menu_items) = tray::build_menu()?;
        let period = cfg.refresh_interval();
        info!(interval_ms = period.as_millis() as u64, "refresh interval");

        // Moved into the tray once the loop is running.
        let mut pending = Some((menu, TextRenderer::from_config(&cfg.icon)));
        let mut indicator: Option<Indicator<SystemPowerSource, ShellTray>> = None;
        let mut ticker = Ticker::new(period, Instant::now());

        event_loop.run(move |event, _, control_flow| {
            match event {
                Event::NewEvents(StartCause::Init) => {
                    let Some((menu, renderer)) = pending.take() else {
                        return;
                    };
                    let host = match tray::build_tray(menu, format::UNKNOWN_PERCENT) {
                        Ok(host) => host,
                        Err(e) => {
                            error!(error = %e, "failed to create tray icon");
                            *control_flow = ControlFlow::ExitWithCode(1);
                            return;
                        }
                    };
                    let mut ind = Indicator::new(SystemPowerSource, host, renderer);
                    if let Err(e) = ind.show_placeholder() {
                        warn!(error = %e, "failed to show placeholder icon");
                    }
                    indicator = Some(ind);
                    ticker = Ticker::new(period, Instant::now());
                    info!("tray icon created");
                }

                Event::NewEvents(StartCause::ResumeTimeReached { .. }) => {
                    if ticker.poll(Instant::now()) {
                        if let Some(ref mut ind) = indicator {
                            if let Err(e) = ind.tick() {
                                warn!(error = %e, "tray update failed");
                            }
                        }
                    }
                }

                Event::UserEvent(UserEvent::MenuEvent(event)) => {
                    if event.id == menu_items.exit_item.id() {
                        info!("exit requested");
                        if let Some(ind) = indicator.take() {
                            info!(last_percent = %ind.percentage(), "removing tray icon");
                            let (host, hidden) = ind.shutdown();
                            if let Err(e) = hidden {
                                warn!(error = %e, "failed to hide tray icon");
                            }
                            drop(host);
                        }
                        *control_flow = ControlFlow::Exit;
                        return;
                    }
                }

                Event::UserEvent(UserEvent::TrayIconEvent(event)) => {
                    trace!(?event, "tray icon event");
                }

                _ => {}
            }

            *control_flow = ControlFlow::WaitUntil(ticker.deadline());
        })
    }

}
