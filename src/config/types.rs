//! Configuration type definitions.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Main window state remembered between sessions.
///
/// These keys are written back every time the user moves the window, toggles
/// a capture checkbox, or picks a different capture mode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct GuiConfig {
    /// Last top-left window position as `[x, y]`
    #[serde(default = "default_window_position")]
    pub window_position: [i32; 2],

    /// Include the mouse pointer in captures
    #[serde(default = "default_true")]
    pub include_pointer: bool,

    /// Include window decorations (title bar, borders) in window captures
    #[serde(default = "default_true")]
    pub include_decorations: bool,

    /// Index of the last used capture mode (0 = full screen, 1 = current screen,
    /// 2 = active window, 3 = rectangular region)
    #[serde(default)]
    pub capture_mode_index: u32,
}

impl Default for GuiConfig {
    fn default() -> Self {
        Self {
            window_position: default_window_position(),
            include_pointer: default_true(),
            include_decorations: default_true(),
            capture_mode_index: 0,
        }
    }
}

/// Capture backend settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct CaptureConfig {
    /// Seconds to wait for the capture backend before giving up (valid range: 1 - 600)
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Where and how screenshots are saved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SaveConfig {
    /// Directory used by quick save. `~/` is expanded.
    #[serde(default = "default_save_location")]
    pub default_save_location: String,

    /// Filename template. Placeholders: %Y %y %M %D %H %m %S %T %d %Nd.
    /// Slashes create sub-folders. %T (window title) is empty for portal
    /// captures, which do not report a title.
    #[serde(default = "default_filename_format")]
    pub filename_format: String,

    /// Image format extension (lowercase, e.g. "png")
    #[serde(default = "default_image_format")]
    pub image_format: String,

    /// Copy the saved file location to the clipboard after saving
    #[serde(default)]
    pub copy_save_location_to_clipboard: bool,
}

impl Default for SaveConfig {
    fn default() -> Self {
        Self {
            default_save_location: default_save_location(),
            filename_format: default_filename_format(),
            image_format: default_image_format(),
            copy_save_location_to_clipboard: false,
        }
    }
}

/// Send-to destination settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ExportConfig {
    /// Command used for the "Open With..." entry; receives the image path
    #[serde(default = "default_open_with_command")]
    pub open_with_command: String,

    /// Directory holding export plugin manifests. Defaults to
    /// `~/.config/shotgenie/plugins`.
    #[serde(default)]
    pub plugin_dir: Option<String>,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            open_with_command: default_open_with_command(),
            plugin_dir: None,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_window_position() -> [i32; 2] {
    [50, 50]
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_save_location() -> String {
    "~/Pictures".to_string()
}

fn default_filename_format() -> String {
    "Screenshot_%Y%M%D_%H%m%S".to_string()
}

fn default_image_format() -> String {
    "png".to_string()
}

fn default_open_with_command() -> String {
    "xdg-open".to_string()
}
