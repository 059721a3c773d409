use std::path::PathBuf;

use thiserror::Error;

/// Failures while turning a rendered bitmap into a visible tray icon.
#[derive(Error, Debug)]
pub enum TrayError {
    #[error("failed to convert bitmap to icon: {0}")]
    Icon(String),

    #[error("failed to update tray icon: {0}")]
    Shell(String),

    #[error("failed to build context menu: {0}")]
    Menu(String),
}

/// Failures while loading the outline font used for the icon text.
#[derive(Error, Debug)]
pub enum FontError {
    #[error("failed to read font {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid font data in {}", .0.display())]
    Parse(PathBuf),
}
