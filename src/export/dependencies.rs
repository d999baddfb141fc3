use std::{
    path::PathBuf,
    process::{Command, Stdio},
    sync::Arc,
    thread,
};

use crate::config::Config;

use super::{
    clipboard,
    desktop::DesktopEntryRegistry,
    plugins::ManifestPluginHost,
    providers::{IMAGE_MIME_TYPE, PluginHost, SystemServiceRegistry},
    types::ExportError,
};

const TEXT_MIME_TYPE: &str = "text/plain;charset=utf-8";

/// Clipboard sink for exported images and saved locations.
pub trait ImageClipboard: Send + Sync {
    fn copy_image(&self, bytes: &[u8]) -> Result<(), ExportError>;
    fn copy_text(&self, text: &str) -> Result<(), ExportError>;
}

/// Starts external programs without waiting for them.
pub trait ProcessLauncher: Send + Sync {
    fn launch(&self, argv: &[String]) -> Result<(), ExportError>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct WaylandClipboard;

impl ImageClipboard for WaylandClipboard {
    fn copy_image(&self, bytes: &[u8]) -> Result<(), ExportError> {
        clipboard::copy_bytes(bytes, IMAGE_MIME_TYPE)
    }

    fn copy_text(&self, text: &str) -> Result<(), ExportError> {
        clipboard::copy_bytes(text.as_bytes(), TEXT_MIME_TYPE)
    }
}

/// Spawns the program detached from our stdio. A background thread waits on
/// the child so it does not linger as a zombie.
#[derive(Debug, Default, Clone, Copy)]
pub struct CommandLauncher;

impl ProcessLauncher for CommandLauncher {
    fn launch(&self, argv: &[String]) -> Result<(), ExportError> {
        let (program, args) = argv.split_first().ok_or_else(|| ExportError::Launch {
            command: String::new(),
            message: "empty command line".to_string(),
        })?;

        log::info!("Launching {:?}", argv);
        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| ExportError::Launch {
                command: program.clone(),
                message: e.to_string(),
            })?;

        let program = program.clone();
        thread::Builder::new()
            .name("launch-reaper".into())
            .spawn(move || match child.wait() {
                Ok(status) if !status.success() => {
                    log::warn!("'{}' exited with {}", program, status)
                }
                Ok(_) => log::debug!("'{}' exited", program),
                Err(e) => log::warn!("Failed to wait for '{}': {}", program, e),
            })
            .map_err(|e| ExportError::Task(format!("Failed to start reaper thread: {}", e)))?;
        Ok(())
    }
}

/// Collaborators used to carry out export actions.
#[derive(Clone)]
pub struct ExportDependencies {
    pub clipboard: Arc<dyn ImageClipboard>,
    pub launcher: Arc<dyn ProcessLauncher>,
    pub services: Arc<dyn SystemServiceRegistry>,
    pub plugins: Arc<dyn PluginHost>,
    /// Command line used for "Other Application", split like an `Exec=` value.
    /// The image path is appended.
    pub open_with_command: String,
    /// Where images are written before an external program opens them.
    pub staging_dir: PathBuf,
}

impl ExportDependencies {
    /// Default collaborators: Wayland clipboard, `.desktop` registry from the
    /// XDG data dirs and manifest plugins from the configured directory.
    pub fn from_config(config: &Config) -> Self {
        let plugins = match config.plugin_dir() {
            Ok(dir) => ManifestPluginHost::load(&dir),
            Err(e) => {
                log::warn!("Export plugins disabled: {}", e);
                ManifestPluginHost::default()
            }
        };
        Self {
            clipboard: Arc::new(WaylandClipboard),
            launcher: Arc::new(CommandLauncher),
            services: Arc::new(DesktopEntryRegistry::from_xdg_env()),
            plugins: Arc::new(plugins),
            open_with_command: config.export.open_with_command.clone(),
            staging_dir: default_staging_dir(),
        }
    }
}

fn default_staging_dir() -> PathBuf {
    dirs::runtime_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("shotgenie")
}
