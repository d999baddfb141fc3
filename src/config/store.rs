use anyhow::Result;
use std::path::{Path, PathBuf};

use super::{Config, MAX_CAPTURE_MODE_INDEX};

/// Handle over the on-disk configuration.
///
/// The file is read once in [`ConfigStore::open`]; every setter updates the
/// in-memory copy and flushes the whole file before returning.
#[derive(Debug)]
pub struct ConfigStore {
    path: PathBuf,
    config: Config,
}

impl ConfigStore {
    /// Opens the store at the default location (`~/.config/shotgenie/config.toml`).
    pub fn open_default() -> Result<Self> {
        Self::open(Config::get_config_path()?)
    }

    /// Opens the store at `path`, loading existing values or defaults.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let config = Config::load_from(&path)?;
        Ok(Self { path, config })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn window_position(&self) -> (i32, i32) {
        let [x, y] = self.config.gui.window_position;
        (x, y)
    }

    /// Returns `(include_pointer, include_decorations)`.
    pub fn checkbox_states(&self) -> (bool, bool) {
        (
            self.config.gui.include_pointer,
            self.config.gui.include_decorations,
        )
    }

    pub fn capture_mode_index(&self) -> u32 {
        self.config.gui.capture_mode_index
    }

    pub fn set_window_position(&mut self, x: i32, y: i32) -> Result<()> {
        self.config.gui.window_position = [x, y];
        self.flush()
    }

    pub fn set_checkbox_states(
        &mut self,
        include_pointer: bool,
        include_decorations: bool,
    ) -> Result<()> {
        self.config.gui.include_pointer = include_pointer;
        self.config.gui.include_decorations = include_decorations;
        self.flush()
    }

    pub fn set_capture_mode_index(&mut self, index: u32) -> Result<()> {
        if index > MAX_CAPTURE_MODE_INDEX {
            log::warn!("Ignoring out-of-range capture mode index {}", index);
            return Ok(());
        }
        self.config.gui.capture_mode_index = index;
        self.flush()
    }

    fn flush(&self) -> Result<()> {
        self.config.save_to(&self.path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_are_flushed_immediately() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("config.toml");

        let mut store = ConfigStore::open(&path).unwrap();
        assert!(!path.exists(), "opening must not create the file");

        store.set_window_position(300, 200).unwrap();
        store.set_checkbox_states(false, true).unwrap();
        store.set_capture_mode_index(3).unwrap();

        let reopened = ConfigStore::open(&path).unwrap();
        assert_eq!(reopened.window_position(), (300, 200));
        assert_eq!(reopened.checkbox_states(), (false, true));
        assert_eq!(reopened.capture_mode_index(), 3);
    }

    #[test]
    fn out_of_range_mode_index_is_ignored() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("config.toml");

        let mut store = ConfigStore::open(&path).unwrap();
        store.set_capture_mode_index(2).unwrap();
        store.set_capture_mode_index(7).unwrap();
        assert_eq!(store.capture_mode_index(), 2);
        assert_eq!(ConfigStore::open(&path).unwrap().capture_mode_index(), 2);
    }
}
