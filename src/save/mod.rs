//! Writing screenshots to disk.

mod template;

pub use template::{TemplateContext, expand_template, has_sequence, unique_path};

use crate::capture::CapturedImage;
use crate::config::SaveConfig;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Runtime save options derived from [`SaveConfig`].
#[derive(Debug, Clone)]
pub struct SaveOptions {
    pub directory: PathBuf,
    pub filename_format: String,
    pub image_format: String,
    pub copy_location_to_clipboard: bool,
}

impl SaveOptions {
    pub fn from_config(config: &SaveConfig) -> Self {
        Self {
            directory: expand_tilde(&config.default_save_location),
            filename_format: config.filename_format.clone(),
            image_format: config.image_format.clone(),
            copy_location_to_clipboard: config.copy_save_location_to_clipboard,
        }
    }
}

impl Default for SaveOptions {
    fn default() -> Self {
        Self::from_config(&SaveConfig::default())
    }
}

/// Quick save: writes `image` under the configured directory using the
/// filename template and returns the final path.
pub fn save_screenshot(image: &CapturedImage, options: &SaveOptions) -> io::Result<PathBuf> {
    let ctx = TemplateContext {
        time: image.captured_at,
        window_title: image.window_title.as_deref(),
    };
    let path = unique_path(
        &options.directory,
        &options.filename_format,
        &options.image_format,
        &ctx,
        Path::exists,
    );
    write_image(&image.data, &path)?;
    Ok(path)
}

/// Writes encoded image bytes to `path`, creating parent directories.
/// The file is readable by the owner only.
pub fn write_image(data: &[u8], path: &Path) -> io::Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
        && !parent.exists()
    {
        log::info!("Creating screenshot directory: {}", parent.display());
        fs::create_dir_all(parent)?;
    }

    log::info!("Saving screenshot to {} ({} bytes)", path.display(), data.len());
    fs::write(path, data)?;

    #[cfg(unix)]
    {
        use std::fs::Permissions;
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, Permissions::from_mode(0o600))?;
    }

    Ok(())
}

/// Writes `image` to a uniquely named file in `directory` so external
/// applications can open it.
pub fn stage_for_export(image: &CapturedImage, directory: &Path) -> io::Result<PathBuf> {
    let ctx = TemplateContext {
        time: image.captured_at,
        window_title: None,
    };
    let path = unique_path(
        directory,
        "shotgenie-%Y%M%D-%H%m%S",
        "png",
        &ctx,
        Path::exists,
    );
    write_image(&image.data, &path)?;
    Ok(path)
}

/// Expand tilde (~) in path strings.
pub fn expand_tilde(path: &str) -> PathBuf {
    if path == "~" {
        if let Some(home) = dirs::home_dir() {
            return home;
        }
    }
    if let Some(stripped) = path.strip_prefix("~/")
        && let Some(home) = dirs::home_dir()
    {
        return home.join(stripped);
    }
    PathBuf::from(path)
}
