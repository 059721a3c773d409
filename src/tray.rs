use image::RgbaImage;

use crate::error::TrayError;

/// Label of the only context-menu entry.
pub const EXIT_LABEL: &str = "Exit";

/// The notification-area entry the indicator draws into.
///
/// Implementations own at most one platform icon. Assigning a new one
/// releases the previous one, and dropping the host releases whatever is
/// still assigned.
pub trait TrayHost {
    type Icon;

    /// Convert a rendered bitmap into a platform icon.
    fn create_icon(&self, image: RgbaImage) -> Result<Self::Icon, TrayError>;

    /// Replace the displayed icon. The icon is consumed even on failure.
    fn set_icon(&mut self, icon: Self::Icon) -> Result<(), TrayError>;

    fn set_tooltip(&mut self, text: &str) -> Result<(), TrayError>;

    fn set_visible(&mut self, visible: bool) -> Result<(), TrayError>;
}

#[cfg(windows)]
pub use shell::{build_menu, build_tray, MenuItems, ShellTray};

#[cfg(windows)]
mod shell {
    use image::RgbaImage;
    use tray_icon::{
        menu::{Menu, MenuItem},
        Icon, TrayIcon, TrayIconBuilder,
    };

    use super::{TrayHost, EXIT_LABEL};
    use crate::error::TrayError;

    /// Holds references to menu items whose events the loop matches on.
    pub struct MenuItems {
        pub exit_item: MenuItem,
    }

    /// Build the one-item context menu.
    pub fn build_menu() -> Result<(Menu, MenuItems), TrayError> {
        let menu = Menu::new();
        let exit_item = MenuItem::new(EXIT_LABEL, true, None);
        menu.append(&exit_item)
            .map_err(|e| TrayError::Menu(e.to_string()))?;
        Ok((menu, MenuItems { exit_item }))
    }

    /// Create the visible tray entry with its menu and initial tooltip.
    pub fn build_tray(menu: Menu, tooltip: &str) -> Result<ShellTray, TrayError> {
        let tray = TrayIconBuilder::new()
            .with_menu(Box::new(menu))
            .with_tooltip(tooltip)
            .build()
            .map_err(|e| TrayError::Shell(e.to_string()))?;
        Ok(ShellTray { tray })
    }

    /// `tray-icon` backed host. The crate keeps a single HICON per entry and
    /// destroys the old one when a new icon is set.
    pub struct ShellTray {
        tray: TrayIcon,
    }

    impl TrayHost for ShellTray {
        type Icon = Icon;

        fn create_icon(&self, image: RgbaImage) -> Result<Icon, TrayError> {
            let (width, height) = image.dimensions();
            Icon::from_rgba(image.into_raw(), width, height)
                .map_err(|e| TrayError::Icon(e.to_string()))
        }

        fn set_icon(&mut self, icon: Icon) -> Result<(), TrayError> {
            self.tray
                .set_icon(Some(icon))
                .map_err(|e| TrayError::Shell(e.to_string()))
        }

        fn set_tooltip(&mut self, text: &str) -> Result<(), TrayError> {
            self.tray
                .set_tooltip(Some(text))
                .map_err(|e| TrayError::Shell(e.to_string()))
        }

        fn set_visible(&mut self, visible: bool) -> Result<(), TrayError> {
            self.tray
                .set_visible(visible)
                .map_err(|e| TrayError::Shell(e.to_string()))
        }
    }
}
