//! Export plugins declared by TOML manifests.
//!
//! Each `*.toml` file in the plugin directory is one plugin:
//!
//! ```toml
//! name = "Image Hosting"
//!
//! [[actions]]
//! name = "Upload to imgbin"
//! icon = "go-up"
//! command = ["imgbin-upload", "--public"]
//! ```
//!
//! Plugins load in file-name order. Actions receive the image path as their
//! last argument.

use std::{
    fs,
    path::{Path, PathBuf},
    process::{Command, Stdio},
};

use serde::Deserialize;

use super::{
    providers::{PluginAction, PluginHost, PluginInfo},
    types::{ExportError, IconHandle},
};

#[derive(Debug, Deserialize)]
struct Manifest {
    name: String,
    #[serde(default)]
    actions: Vec<ManifestAction>,
}

#[derive(Debug, Deserialize)]
struct ManifestAction {
    name: String,
    #[serde(default)]
    icon: String,
    command: Vec<String>,
}

#[derive(Debug)]
struct LoadedAction {
    action: PluginAction,
    command: Vec<String>,
}

#[derive(Debug)]
struct LoadedPlugin {
    info: PluginInfo,
    actions: Vec<LoadedAction>,
}

/// Plugin host over a directory of manifests, loaded once.
///
/// Action ids are assigned sequentially across all plugins so they stay
/// unique for the session.
#[derive(Debug, Default)]
pub struct ManifestPluginHost {
    plugins: Vec<LoadedPlugin>,
}

impl ManifestPluginHost {
    /// Loads every manifest in `dir`. A missing directory means no plugins;
    /// unreadable or malformed manifests are skipped with a warning.
    pub fn load(dir: &Path) -> Self {
        let mut files: Vec<PathBuf> = match fs::read_dir(dir) {
            Ok(read_dir) => read_dir
                .flatten()
                .map(|entry| entry.path())
                .filter(|path| path.extension().is_some_and(|ext| ext == "toml"))
                .collect(),
            Err(e) => {
                log::debug!("No export plugins in {}: {}", dir.display(), e);
                return Self::default();
            }
        };
        files.sort();

        let mut host = Self::default();
        let mut next_action_id = 1;
        for path in files {
            let manifest = match fs::read_to_string(&path)
                .map_err(|e| e.to_string())
                .and_then(|s| toml::from_str::<Manifest>(&s).map_err(|e| e.to_string()))
            {
                Ok(manifest) => manifest,
                Err(e) => {
                    log::warn!("Skipping export plugin {}: {}", path.display(), e);
                    continue;
                }
            };

            let group = host.plugins.len() as u32;
            let actions = manifest
                .actions
                .into_iter()
                .filter(|action| {
                    let valid = !action.command.is_empty();
                    if !valid {
                        log::warn!(
                            "Plugin '{}' action '{}' has an empty command",
                            manifest.name,
                            action.name
                        );
                    }
                    valid
                })
                .map(|action| {
                    let action_id = next_action_id;
                    next_action_id += 1;
                    LoadedAction {
                        action: PluginAction {
                            action_id,
                            display_name: action.name,
                            icon: IconHandle(action.icon),
                        },
                        command: action.command,
                    }
                })
                .collect();

            log::info!("Loaded export plugin '{}' from {}", manifest.name, path.display());
            host.plugins.push(LoadedPlugin {
                info: PluginInfo {
                    group,
                    name: manifest.name,
                },
                actions,
            });
        }
        host
    }

    fn find_action(&self, action_id: i64) -> Option<&LoadedAction> {
        self.plugins
            .iter()
            .flat_map(|plugin| plugin.actions.iter())
            .find(|loaded| loaded.action.action_id == action_id)
    }
}

impl PluginHost for ManifestPluginHost {
    fn loaded_plugins(&self) -> Vec<PluginInfo> {
        self.plugins.iter().map(|plugin| plugin.info.clone()).collect()
    }

    fn actions(&self, plugin: &PluginInfo) -> Result<Vec<PluginAction>, ExportError> {
        self.plugins
            .iter()
            .find(|loaded| loaded.info == *plugin)
            .map(|loaded| loaded.actions.iter().map(|a| a.action.clone()).collect())
            .ok_or_else(|| ExportError::Provider(format!("plugin '{}' is not loaded", plugin.name)))
    }

    fn invoke(&self, action_id: i64, image: &Path) -> Result<(), ExportError> {
        let loaded = self
            .find_action(action_id)
            .ok_or(ExportError::UnknownPluginAction(action_id))?;
        let (program, args) = loaded
            .command
            .split_first()
            .ok_or(ExportError::UnknownPluginAction(action_id))?;

        log::info!(
            "Running plugin action '{}': {} {:?}",
            loaded.action.display_name,
            program,
            args
        );
        let output = Command::new(program)
            .args(args)
            .arg(image)
            .stdin(Stdio::null())
            .output()
            .map_err(|e| ExportError::Launch {
                command: program.clone(),
                message: e.to_string(),
            })?;

        if !output.status.success() {
            return Err(ExportError::Launch {
                command: program.clone(),
                message: format!(
                    "exited with {}: {}",
                    output.status,
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
            });
        }
        Ok(())
    }
}
