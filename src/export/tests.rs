use std::{
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
};

use tempfile::TempDir;

use super::*;
use crate::capture::{CaptureMode, CapturedImage};

struct MockRegistry {
    entries: Mutex<Result<Vec<ServiceEntry>, String>>,
}

impl MockRegistry {
    fn with_names(names: &[&str]) -> Self {
        let entries = names
            .iter()
            .map(|name| ServiceEntry {
                service_id: format!("{}.desktop", name.to_lowercase()),
                display_name: name.to_string(),
                icon: IconHandle::named(name.to_lowercase()),
            })
            .collect();
        Self {
            entries: Mutex::new(Ok(entries)),
        }
    }

    fn failing() -> Self {
        Self {
            entries: Mutex::new(Err("registry offline".to_string())),
        }
    }
}

impl Default for MockRegistry {
    fn default() -> Self {
        Self::with_names(&[])
    }
}

impl SystemServiceRegistry for MockRegistry {
    fn handlers_for(&self, mime_type: &str) -> Result<Vec<ServiceEntry>, ExportError> {
        assert_eq!(mime_type, IMAGE_MIME_TYPE);
        self.entries
            .lock()
            .unwrap()
            .clone()
            .map_err(ExportError::Provider)
    }

    fn lookup(&self, service_id: &str, image: &Path) -> Option<ServiceHandler> {
        let entries = self.entries.lock().unwrap();
        let entry = entries
            .as_ref()
            .ok()?
            .iter()
            .find(|entry| entry.service_id == service_id)?;
        Some(ServiceHandler {
            service_id: entry.service_id.clone(),
            argv: vec![
                entry.display_name.to_lowercase(),
                image.to_string_lossy().into_owned(),
            ],
        })
    }
}

#[derive(Default)]
struct MockPluginHost {
    plugins: Vec<(PluginInfo, Result<Vec<PluginAction>, String>)>,
    invoked: Mutex<Vec<(i64, PathBuf)>>,
}

impl MockPluginHost {
    fn plugin(mut self, name: &str, actions: Result<&[(i64, &str)], &str>) -> Self {
        let info = PluginInfo {
            group: self.plugins.len() as u32,
            name: name.to_string(),
        };
        let actions = actions
            .map(|list| {
                list.iter()
                    .map(|(action_id, display_name)| PluginAction {
                        action_id: *action_id,
                        display_name: display_name.to_string(),
                        icon: IconHandle::default(),
                    })
                    .collect()
            })
            .map_err(str::to_string);
        self.plugins.push((info, actions));
        self
    }
}

impl PluginHost for MockPluginHost {
    fn loaded_plugins(&self) -> Vec<PluginInfo> {
        self.plugins.iter().map(|(info, _)| info.clone()).collect()
    }

    fn actions(&self, plugin: &PluginInfo) -> Result<Vec<PluginAction>, ExportError> {
        self.plugins
            .iter()
            .find(|(info, _)| info == plugin)
            .map(|(_, actions)| actions.clone().map_err(ExportError::Provider))
            .unwrap_or_else(|| Err(ExportError::Provider("not loaded".into())))
    }

    fn invoke(&self, action_id: i64, image: &Path) -> Result<(), ExportError> {
        if !self
            .plugins
            .iter()
            .filter_map(|(_, actions)| actions.as_ref().ok())
            .flatten()
            .any(|action| action.action_id == action_id)
        {
            return Err(ExportError::UnknownPluginAction(action_id));
        }
        self.invoked
            .lock()
            .unwrap()
            .push((action_id, image.to_path_buf()));
        Ok(())
    }
}

/// Renders a menu as names with `|` for separators.
fn layout(menu: &ExportMenu) -> Vec<String> {
    menu.entries()
        .iter()
        .map(|entry| match entry {
            MenuEntry::Target(descriptor) => descriptor.display_name().to_string(),
            MenuEntry::Separator => "|".to_string(),
        })
        .collect()
}

#[test]
fn hardcoded_targets_come_first_and_services_are_sorted() {
    let registry = MockRegistry::with_names(&["Viewer", "archiver", "Editor"]);
    let host = MockPluginHost::default();

    let menu = discover_menu(&registry, &host);

    assert_eq!(
        layout(&menu),
        vec![
            "Copy To Clipboard",
            "Other Application",
            "|",
            "archiver",
            "Editor",
            "Viewer"
        ]
    );
    assert!(menu.is_sealed());
}

#[test]
fn each_plugin_forms_its_own_group() {
    let registry = MockRegistry::with_names(&["Gimp"]);
    let host = MockPluginHost::default()
        .plugin("imgur", Ok(&[(1, "Upload to Imgur")]))
        .plugin("print", Ok(&[(2, "Print"), (3, "Print Preview")]));

    let menu = discover_menu(&registry, &host);

    assert_eq!(
        layout(&menu),
        vec![
            "Copy To Clipboard",
            "Other Application",
            "|",
            "Gimp",
            "|",
            "Upload to Imgur",
            "|",
            "Print",
            "Print Preview"
        ]
    );
    let preview = menu.find("print preview").expect("plugin target");
    assert_eq!(
        preview.payload(),
        &ExportPayload::PluginExport {
            action_id: 3,
            plugin_group: 1
        }
    );
}

#[test]
fn failing_or_empty_providers_leave_no_trace() {
    let registry = MockRegistry::failing();
    let host = MockPluginHost::default()
        .plugin("broken", Err("crashed"))
        .plugin("empty", Ok(&[]))
        .plugin("mail", Ok(&[(9, "Send by Mail")]));

    let menu = discover_menu(&registry, &host);

    assert_eq!(
        layout(&menu),
        vec!["Copy To Clipboard", "Other Application", "|", "Send by Mail"]
    );
}

#[test]
fn discovery_ends_with_done_and_stays_exhausted() {
    let registry = MockRegistry::with_names(&["Viewer"]);
    let host = MockPluginHost::default();
    let mut aggregator = ExportTargetAggregator::new(&registry, &host);

    let events: Vec<_> = aggregator.by_ref().collect();
    assert_eq!(events.last(), Some(&DiscoveryEvent::Done));
    assert_eq!(
        events
            .iter()
            .filter(|event| **event == DiscoveryEvent::Done)
            .count(),
        1
    );
    assert_eq!(aggregator.next(), None);
    assert_eq!(aggregator.next(), None);
}

#[test]
fn ids_are_unique_within_a_discovery() {
    let registry = MockRegistry::with_names(&["A", "B"]);
    let host = MockPluginHost::default().plugin("p", Ok(&[(5, "C")]));

    let menu = discover_menu(&registry, &host);
    let mut ids: Vec<_> = menu.targets().map(|target| target.id()).collect();
    let total = ids.len();
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), total);
}

#[test]
fn sealed_menu_ignores_later_discovery() {
    let registry = MockRegistry::with_names(&["Viewer"]);
    let host = MockPluginHost::default();
    let mut menu = discover_menu(&registry, &host);
    let before = layout(&menu);

    *registry.entries.lock().unwrap() = Ok(Vec::new());
    for event in ExportTargetAggregator::new(&registry, &host) {
        assert!(matches!(menu.push(event), Err(ExportError::MenuSealed)));
    }

    assert_eq!(layout(&menu), before);
}

#[test]
fn duplicate_ids_are_rejected() {
    let descriptor = ExportTargetDescriptor::new(
        ExportTargetId(4),
        "Copy",
        IconHandle::default(),
        ExportPayload::Hardcoded {
            action: HardcodedAction::Clipboard,
        },
    );
    let mut menu = ExportMenu::new();
    menu.push(DiscoveryEvent::Entry(descriptor.clone())).unwrap();
    let err = menu.push(DiscoveryEvent::Entry(descriptor)).unwrap_err();
    assert!(matches!(err, ExportError::DuplicateTarget(ExportTargetId(4))));
    assert_eq!(menu.len(), 1);
}

#[test]
fn discovery_without_done_is_still_sealed() {
    let menu = ExportMenu::from_discovery(vec![DiscoveryEvent::Separator]);
    assert!(menu.is_sealed());
    assert_eq!(menu.len(), 1);
}

#[test]
fn dispatcher_maps_each_payload_to_one_action() {
    let cases = [
        (
            ExportPayload::Hardcoded {
                action: HardcodedAction::Clipboard,
            },
            ExportAction::CopyToClipboard,
        ),
        (
            ExportPayload::Hardcoded {
                action: HardcodedAction::OpenWithApplication,
            },
            ExportAction::OpenWithApplication,
        ),
        (
            ExportPayload::SystemService {
                service_id: "org.gimp.GIMP.desktop".into(),
            },
            ExportAction::InvokeSystemService("org.gimp.GIMP.desktop".into()),
        ),
        (
            ExportPayload::PluginExport {
                action_id: 42,
                plugin_group: 1,
            },
            ExportAction::InvokePluginAction(42),
        ),
    ];
    for (payload, expected) in cases {
        assert_eq!(dispatch(&payload), expected);
    }
}

#[test]
fn selection_lookup_by_id_and_name() {
    let registry = MockRegistry::with_names(&["Viewer"]);
    let host = MockPluginHost::default();
    let menu = discover_menu(&registry, &host);

    let viewer = menu.find("VIEWER").expect("found by name");
    assert_eq!(menu.find(&viewer.id().to_string()), Some(viewer));
    assert_eq!(
        dispatch_selection(&menu, viewer.id()).unwrap(),
        ExportAction::InvokeSystemService("viewer.desktop".into())
    );
    assert!(menu.find("Nothing Here").is_none());
}

#[test]
fn unknown_selection_is_an_error() {
    let menu = discover_menu(&MockRegistry::default(), &MockPluginHost::default());
    let err = dispatch_selection(&menu, ExportTargetId(99)).unwrap_err();
    assert!(matches!(err, ExportError::UnknownTarget(ref id) if id == "99"));
}

#[test]
fn payload_serializes_with_kind_tag() {
    let json = serde_json::to_value(ExportPayload::PluginExport {
        action_id: 42,
        plugin_group: 1,
    })
    .unwrap();
    assert_eq!(json["kind"], "plugin-export");
    assert_eq!(json["action_id"], 42);
}

#[derive(Default)]
struct RecordingClipboard {
    images: Mutex<Vec<Vec<u8>>>,
    texts: Mutex<Vec<String>>,
}

impl ImageClipboard for RecordingClipboard {
    fn copy_image(&self, bytes: &[u8]) -> Result<(), ExportError> {
        self.images.lock().unwrap().push(bytes.to_vec());
        Ok(())
    }

    fn copy_text(&self, text: &str) -> Result<(), ExportError> {
        self.texts.lock().unwrap().push(text.to_string());
        Ok(())
    }
}

#[derive(Default)]
struct RecordingLauncher {
    launched: Mutex<Vec<Vec<String>>>,
}

impl ProcessLauncher for RecordingLauncher {
    fn launch(&self, argv: &[String]) -> Result<(), ExportError> {
        self.launched.lock().unwrap().push(argv.to_vec());
        Ok(())
    }
}

struct Harness {
    _staging: TempDir,
    clipboard: Arc<RecordingClipboard>,
    launcher: Arc<RecordingLauncher>,
    plugins: Arc<MockPluginHost>,
    deps: Arc<ExportDependencies>,
}

fn harness() -> Harness {
    let staging = TempDir::new().unwrap();
    let clipboard = Arc::new(RecordingClipboard::default());
    let launcher = Arc::new(RecordingLauncher::default());
    let plugins = Arc::new(MockPluginHost::default().plugin("p", Ok(&[(7, "Upload")])));
    let deps = Arc::new(ExportDependencies {
        clipboard: clipboard.clone(),
        launcher: launcher.clone(),
        services: Arc::new(MockRegistry::with_names(&["Viewer"])),
        plugins: plugins.clone(),
        open_with_command: "xdg-open --verbose".to_string(),
        staging_dir: staging.path().to_path_buf(),
    });
    Harness {
        _staging: staging,
        clipboard,
        launcher,
        plugins,
        deps,
    }
}

fn image() -> CapturedImage {
    CapturedImage::new(vec![0x89, b'P', b'N', b'G'], Some(CaptureMode::FullScreen))
}

#[tokio::test]
async fn clipboard_export_copies_png_bytes() {
    let h = harness();
    perform_export(ExportAction::CopyToClipboard, &image(), h.deps.clone())
        .await
        .unwrap();
    assert_eq!(
        *h.clipboard.images.lock().unwrap(),
        vec![vec![0x89, b'P', b'N', b'G']]
    );
    assert!(h.launcher.launched.lock().unwrap().is_empty());
}

#[tokio::test]
async fn open_with_application_launches_configured_command_on_staged_file() {
    let h = harness();
    perform_export(ExportAction::OpenWithApplication, &image(), h.deps.clone())
        .await
        .unwrap();

    let launched = h.launcher.launched.lock().unwrap();
    assert_eq!(launched.len(), 1);
    let argv = &launched[0];
    assert_eq!(&argv[..2], &["xdg-open".to_string(), "--verbose".to_string()]);
    let staged = PathBuf::from(&argv[2]);
    assert!(staged.starts_with(&h.deps.staging_dir));
    assert_eq!(std::fs::read(staged).unwrap(), image().data);
}

#[tokio::test]
async fn open_with_command_keeps_quoted_arguments_together() {
    let staging = TempDir::new().unwrap();
    let launcher = Arc::new(RecordingLauncher::default());
    let deps = Arc::new(ExportDependencies {
        clipboard: Arc::new(RecordingClipboard::default()),
        launcher: launcher.clone(),
        services: Arc::new(MockRegistry::default()),
        plugins: Arc::new(MockPluginHost::default()),
        open_with_command: "\"/opt/my viewer/bin/view\" --new-window".to_string(),
        staging_dir: staging.path().to_path_buf(),
    });

    perform_export(ExportAction::OpenWithApplication, &image(), deps)
        .await
        .unwrap();

    let launched = launcher.launched.lock().unwrap();
    assert_eq!(launched[0][0], "/opt/my viewer/bin/view");
    assert_eq!(launched[0][1], "--new-window");
    assert_eq!(launched[0].len(), 3);
}

#[tokio::test]
async fn system_service_export_uses_registry_command() {
    let h = harness();
    perform_export(
        ExportAction::InvokeSystemService("viewer.desktop".into()),
        &image(),
        h.deps.clone(),
    )
    .await
    .unwrap();
    let launched = h.launcher.launched.lock().unwrap();
    assert_eq!(launched[0][0], "viewer");
}

#[tokio::test]
async fn missing_system_service_is_reported() {
    let h = harness();
    let err = perform_export(
        ExportAction::InvokeSystemService("gone.desktop".into()),
        &image(),
        h.deps.clone(),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, ExportError::ServiceNotFound(ref id) if id == "gone.desktop"));
    assert!(h.launcher.launched.lock().unwrap().is_empty());
}

#[tokio::test]
async fn plugin_export_invokes_host_with_staged_file() {
    let h = harness();
    perform_export(ExportAction::InvokePluginAction(7), &image(), h.deps.clone())
        .await
        .unwrap();
    let invoked = h.plugins.invoked.lock().unwrap();
    assert_eq!(invoked.len(), 1);
    assert_eq!(invoked[0].0, 7);
    assert!(invoked[0].1.exists());

    let err = perform_export(ExportAction::InvokePluginAction(8), &image(), h.deps.clone())
        .await
        .unwrap_err();
    assert!(matches!(err, ExportError::UnknownPluginAction(8)));
}
