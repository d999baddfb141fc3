//! System services backed by freedesktop `.desktop` entries.

use std::{
    collections::HashSet,
    env, fs,
    path::{Path, PathBuf},
};

use walkdir::WalkDir;

use super::{
    providers::{ServiceEntry, ServiceHandler, SystemServiceRegistry},
    types::{ExportError, IconHandle},
};

#[derive(Debug, Clone, PartialEq, Eq)]
struct DesktopEntry {
    id: String,
    path: PathBuf,
    name: String,
    icon: String,
    exec: String,
    mime_types: Vec<String>,
}

impl DesktopEntry {
    fn accepts(&self, mime_type: &str) -> bool {
        let wildcard = mime_type
            .split_once('/')
            .map(|(family, _)| format!("{family}/*"));
        self.mime_types
            .iter()
            .any(|m| m == mime_type || Some(m) == wildcard.as_ref())
    }
}

/// Reads application entries from `applications/` under the XDG data dirs.
///
/// Directories are searched in priority order; the first entry seen for a
/// desktop file id shadows later ones.
#[derive(Debug, Clone)]
pub struct DesktopEntryRegistry {
    search_dirs: Vec<PathBuf>,
}

impl DesktopEntryRegistry {
    pub fn new(search_dirs: Vec<PathBuf>) -> Self {
        Self { search_dirs }
    }

    /// `$XDG_DATA_HOME/applications` followed by each `$XDG_DATA_DIRS` entry.
    pub fn from_xdg_env() -> Self {
        let mut dirs_list = Vec::new();
        if let Some(data_home) = dirs::data_dir() {
            dirs_list.push(data_home.join("applications"));
        }
        let data_dirs = env::var("XDG_DATA_DIRS")
            .ok()
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| "/usr/local/share:/usr/share".to_string());
        dirs_list.extend(
            env::split_paths(&data_dirs).map(|dir| dir.join("applications")),
        );
        Self::new(dirs_list)
    }

    fn entries(&self) -> Vec<DesktopEntry> {
        let mut seen = HashSet::new();
        let mut entries = Vec::new();
        for dir in &self.search_dirs {
            let mut files = collect_desktop_files(dir);
            files.sort();
            for (id, path) in files {
                if !seen.insert(id.clone()) {
                    continue;
                }
                match fs::read_to_string(&path) {
                    Ok(contents) => {
                        if let Some(entry) = parse_desktop_entry(&id, &path, &contents) {
                            entries.push(entry);
                        }
                    }
                    Err(e) => log::debug!("Skipping unreadable {}: {}", path.display(), e),
                }
            }
        }
        entries
    }
}

impl SystemServiceRegistry for DesktopEntryRegistry {
    fn handlers_for(&self, mime_type: &str) -> Result<Vec<ServiceEntry>, ExportError> {
        Ok(self
            .entries()
            .into_iter()
            .filter(|entry| entry.accepts(mime_type))
            .map(|entry| ServiceEntry {
                service_id: entry.id,
                display_name: entry.name,
                icon: IconHandle(entry.icon),
            })
            .collect())
    }

    fn lookup(&self, service_id: &str, image: &Path) -> Option<ServiceHandler> {
        let entry = self.entries().into_iter().find(|e| e.id == service_id)?;
        Some(ServiceHandler {
            service_id: entry.id.clone(),
            argv: expand_exec(&entry, image),
        })
    }
}

/// Collects `(desktop file id, path)` pairs under `root`. Sub-directory
/// names become `-`-joined id prefixes. Symlinked directories are not
/// descended into; symlinked files are kept.
fn collect_desktop_files(root: &Path) -> Vec<(String, PathBuf)> {
    let mut out = Vec::new();
    for entry in WalkDir::new(root).follow_links(false) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                log::debug!("Skipping unreadable entry under {}: {}", root.display(), e);
                continue;
            }
        };
        let path = entry.path();
        if entry.file_type().is_dir()
            || !path.is_file()
            || path.extension().is_none_or(|ext| ext != "desktop")
        {
            continue;
        }
        if let Ok(relative) = path.strip_prefix(root) {
            let id = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("-");
            out.push((id, path.to_path_buf()));
        }
    }
    out
}

fn parse_desktop_entry(id: &str, path: &Path, contents: &str) -> Option<DesktopEntry> {
    let mut in_main_group = false;
    let mut name = None;
    let mut icon = String::new();
    let mut exec = None;
    let mut mime_types = Vec::new();
    let mut kind = None;

    for line in contents.lines().map(str::trim) {
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if line.starts_with('[') {
            in_main_group = line == "[Desktop Entry]";
            continue;
        }
        if !in_main_group {
            continue;
        }
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        let value = value.trim();
        match key.trim() {
            "Type" => kind = Some(value.to_string()),
            "Name" => name = Some(value.to_string()),
            "Icon" => icon = value.to_string(),
            "Exec" => exec = Some(value.to_string()),
            "MimeType" => {
                mime_types = value
                    .split(';')
                    .filter(|m| !m.is_empty())
                    .map(str::to_string)
                    .collect()
            }
            "NoDisplay" | "Hidden" if value == "true" => return None,
            _ => {}
        }
    }

    if kind.as_deref() != Some("Application") {
        return None;
    }
    Some(DesktopEntry {
        id: id.to_string(),
        path: path.to_path_buf(),
        name: name?,
        icon,
        exec: exec?,
        mime_types,
    })
}

/// Splits a command line into arguments, honouring double quotes.
pub(crate) fn split_exec(exec: &str) -> Vec<String> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut has_token = false;
    let mut chars = exec.chars();

    while let Some(c) = chars.next() {
        match c {
            '"' => {
                in_quotes = !in_quotes;
                has_token = true;
            }
            '\\' if in_quotes => {
                if let Some(next) = chars.next() {
                    current.push(next);
                }
            }
            c if c.is_whitespace() && !in_quotes => {
                if has_token {
                    args.push(std::mem::take(&mut current));
                    has_token = false;
                }
            }
            c => {
                current.push(c);
                has_token = true;
            }
        }
    }
    if has_token {
        args.push(current);
    }
    args
}

/// Substitutes field codes in the entry's command line. The image path is
/// appended when the command has no file code.
fn expand_exec(entry: &DesktopEntry, image: &Path) -> Vec<String> {
    let file = image.to_string_lossy().into_owned();
    let uri = url::Url::from_file_path(image)
        .map(|u| u.to_string())
        .unwrap_or_else(|_| file.clone());

    let mut argv = Vec::new();
    let mut used_file = false;
    for arg in split_exec(&entry.exec) {
        match arg.as_str() {
            "%f" | "%F" => {
                argv.push(file.clone());
                used_file = true;
            }
            "%u" | "%U" => {
                argv.push(uri.clone());
                used_file = true;
            }
            "%i" => {
                if !entry.icon.is_empty() {
                    argv.push("--icon".to_string());
                    argv.push(entry.icon.clone());
                }
            }
            "%d" | "%D" | "%n" | "%N" | "%v" | "%m" => {}
            _ => argv.push(
                arg.replace("%c", &entry.name)
                    .replace("%k", &entry.path.to_string_lossy())
                    .replace("%%", "%"),
            ),
        }
    }
    if !used_file {
        argv.push(file);
    }
    argv
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_entry(dir: &Path, file: &str, body: &str) {
        let path = dir.join(file);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, body).unwrap();
    }

    fn app(name: &str, exec: &str, mime: &str) -> String {
        format!(
            "[Desktop Entry]\nType=Application\nName={name}\nIcon={name}-icon\nExec={exec}\nMimeType={mime}\n"
        )
    }

    #[test]
    fn lists_only_image_handlers() {
        let temp = TempDir::new().unwrap();
        write_entry(temp.path(), "viewer.desktop", &app("Viewer", "viewer %f", "image/png;image/jpeg;"));
        write_entry(temp.path(), "editor.desktop", &app("Editor", "editor %U", "image/*;"));
        write_entry(temp.path(), "text.desktop", &app("Text", "text %f", "text/plain;"));
        write_entry(
            temp.path(),
            "hidden.desktop",
            &format!("{}NoDisplay=true\n", app("Hidden", "hidden %f", "image/png;")),
        );

        let registry = DesktopEntryRegistry::new(vec![temp.path().to_path_buf()]);
        let mut names: Vec<_> = registry
            .handlers_for("image/png")
            .unwrap()
            .into_iter()
            .map(|e| e.display_name)
            .collect();
        names.sort();
        assert_eq!(names, vec!["Editor", "Viewer"]);
    }

    #[test]
    fn earlier_directories_shadow_later_ones() {
        let home = TempDir::new().unwrap();
        let system = TempDir::new().unwrap();
        write_entry(home.path(), "viewer.desktop", &app("My Viewer", "viewer %f", "image/png;"));
        write_entry(system.path(), "viewer.desktop", &app("Viewer", "viewer %f", "image/png;"));

        let registry = DesktopEntryRegistry::new(vec![
            home.path().to_path_buf(),
            system.path().to_path_buf(),
        ]);
        let entries = registry.handlers_for("image/png").unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].display_name, "My Viewer");
    }

    #[test]
    fn nested_entries_get_dashed_ids() {
        let temp = TempDir::new().unwrap();
        write_entry(temp.path(), "kde/gwenview.desktop", &app("Gwenview", "gwenview %U", "image/png;"));

        let registry = DesktopEntryRegistry::new(vec![temp.path().to_path_buf()]);
        let entries = registry.handlers_for("image/png").unwrap();
        assert_eq!(entries[0].service_id, "kde-gwenview.desktop");
    }

    #[test]
    fn lookup_expands_field_codes() {
        let temp = TempDir::new().unwrap();
        write_entry(
            temp.path(),
            "viewer.desktop",
            &app("Viewer", "\"/opt/my viewer/bin\" --title %c %f", "image/png;"),
        );
        write_entry(temp.path(), "plain.desktop", &app("Plain", "plain --new", "image/png;"));

        let registry = DesktopEntryRegistry::new(vec![temp.path().to_path_buf()]);
        let image = Path::new("/tmp/shot.png");

        let handler = registry.lookup("viewer.desktop", image).unwrap();
        assert_eq!(
            handler.argv,
            vec!["/opt/my viewer/bin", "--title", "Viewer", "/tmp/shot.png"]
        );

        let plain = registry.lookup("plain.desktop", image).unwrap();
        assert_eq!(plain.argv, vec!["plain", "--new", "/tmp/shot.png"]);

        assert!(registry.lookup("missing.desktop", image).is_none());
    }

    #[test]
    fn url_field_code_gets_file_uri() {
        let temp = TempDir::new().unwrap();
        write_entry(temp.path(), "editor.desktop", &app("Editor", "editor %U", "image/png;"));

        let registry = DesktopEntryRegistry::new(vec![temp.path().to_path_buf()]);
        let handler = registry
            .lookup("editor.desktop", Path::new("/tmp/my shot.png"))
            .unwrap();
        assert_eq!(handler.argv, vec!["editor", "file:///tmp/my%20shot.png"]);
    }

    #[cfg(unix)]
    #[test]
    fn symlinked_directories_are_not_walked() {
        let temp = TempDir::new().unwrap();
        write_entry(temp.path(), "viewer.desktop", &app("Viewer", "viewer %f", "image/png;"));
        std::os::unix::fs::symlink(temp.path(), temp.path().join("loop")).unwrap();
        std::os::unix::fs::symlink(temp.path(), temp.path().join("again")).unwrap();

        let registry = DesktopEntryRegistry::new(vec![temp.path().to_path_buf()]);
        let entries = registry.handlers_for("image/png").unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].service_id, "viewer.desktop");
    }

    #[cfg(unix)]
    #[test]
    fn symlinked_desktop_files_are_kept() {
        let temp = TempDir::new().unwrap();
        let store = TempDir::new().unwrap();
        write_entry(store.path(), "real.desktop", &app("Viewer", "viewer %f", "image/png;"));
        std::os::unix::fs::symlink(
            store.path().join("real.desktop"),
            temp.path().join("viewer.desktop"),
        )
        .unwrap();

        let registry = DesktopEntryRegistry::new(vec![temp.path().to_path_buf()]);
        let entries = registry.handlers_for("image/png").unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].service_id, "viewer.desktop");
    }

    #[test]
    fn missing_directories_yield_no_handlers() {
        let registry = DesktopEntryRegistry::new(vec![PathBuf::from("/nonexistent/shotgenie")]);
        assert!(registry.handlers_for("image/png").unwrap().is_empty());
    }
}
