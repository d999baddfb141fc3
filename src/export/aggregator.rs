use std::collections::VecDeque;

use super::{
    providers::{IMAGE_MIME_TYPE, PluginHost, PluginInfo, SystemServiceRegistry},
    types::{
        DiscoveryEvent, ExportPayload, ExportTargetDescriptor, ExportTargetId, HardcodedAction,
        IconHandle,
    },
};

enum Phase {
    Hardcoded,
    Services,
    Plugins(VecDeque<PluginInfo>),
    Finish,
    Exhausted,
}

/// Discovers send-to targets from the built-in, system-service and plugin
/// providers, in that order.
///
/// The aggregator is a finite iterator: it yields every entry and separator in
/// discovery order, then [`DiscoveryEvent::Done`], then nothing. Providers are
/// queried lazily on the calling thread as the iterator advances. A provider
/// that fails or returns nothing contributes no entries and no separator.
pub struct ExportTargetAggregator<'a> {
    services: &'a dyn SystemServiceRegistry,
    plugins: &'a dyn PluginHost,
    phase: Phase,
    pending: VecDeque<DiscoveryEvent>,
    next_id: u32,
    emitted_group: bool,
}

impl<'a> ExportTargetAggregator<'a> {
    pub fn new(services: &'a dyn SystemServiceRegistry, plugins: &'a dyn PluginHost) -> Self {
        Self {
            services,
            plugins,
            phase: Phase::Hardcoded,
            pending: VecDeque::new(),
            next_id: 0,
            emitted_group: false,
        }
    }

    /// Queue one provider group, preceded by a separator when an earlier group
    /// was emitted. Empty groups leave no trace.
    fn push_group(&mut self, group: Vec<(String, IconHandle, ExportPayload)>) {
        if group.is_empty() {
            return;
        }
        if self.emitted_group {
            self.pending.push_back(DiscoveryEvent::Separator);
        }
        for (name, icon, payload) in group {
            let id = ExportTargetId(self.next_id);
            self.next_id += 1;
            self.pending.push_back(DiscoveryEvent::Entry(ExportTargetDescriptor::new(
                id, name, icon, payload,
            )));
        }
        self.emitted_group = true;
    }

    fn hardcoded_group() -> Vec<(String, IconHandle, ExportPayload)> {
        vec![
            (
                "Copy To Clipboard".to_string(),
                IconHandle::named("edit-copy"),
                ExportPayload::Hardcoded {
                    action: HardcodedAction::Clipboard,
                },
            ),
            (
                "Other Application".to_string(),
                IconHandle::named("document-open"),
                ExportPayload::Hardcoded {
                    action: HardcodedAction::OpenWithApplication,
                },
            ),
        ]
    }

    fn service_group(&self) -> Vec<(String, IconHandle, ExportPayload)> {
        let mut entries = match self.services.handlers_for(IMAGE_MIME_TYPE) {
            Ok(entries) => entries,
            Err(e) => {
                log::warn!("System service discovery failed, skipping group: {}", e);
                return Vec::new();
            }
        };
        entries.sort_by_cached_key(|entry| entry.display_name.to_lowercase());
        log::debug!("Discovered {} system services", entries.len());

        entries
            .into_iter()
            .map(|entry| {
                (
                    entry.display_name,
                    entry.icon,
                    ExportPayload::SystemService {
                        service_id: entry.service_id,
                    },
                )
            })
            .collect()
    }

    fn plugin_group(&self, plugin: &PluginInfo) -> Vec<(String, IconHandle, ExportPayload)> {
        match self.plugins.actions(plugin) {
            Ok(actions) => actions
                .into_iter()
                .map(|action| {
                    (
                        action.display_name,
                        action.icon,
                        ExportPayload::PluginExport {
                            action_id: action.action_id,
                            plugin_group: plugin.group,
                        },
                    )
                })
                .collect(),
            Err(e) => {
                log::warn!(
                    "Export plugin '{}' failed to list actions, skipping: {}",
                    plugin.name,
                    e
                );
                Vec::new()
            }
        }
    }

    /// Advance the phase machine by one step, queueing whatever it produced.
    fn step(&mut self) {
        match std::mem::replace(&mut self.phase, Phase::Exhausted) {
            Phase::Hardcoded => {
                self.push_group(Self::hardcoded_group());
                self.phase = Phase::Services;
            }
            Phase::Services => {
                let group = self.service_group();
                self.push_group(group);
                let plugins = self.plugins.loaded_plugins();
                log::debug!("{} export plugins loaded", plugins.len());
                self.phase = Phase::Plugins(plugins.into());
            }
            Phase::Plugins(mut remaining) => match remaining.pop_front() {
                Some(plugin) => {
                    let group = self.plugin_group(&plugin);
                    self.push_group(group);
                    self.phase = Phase::Plugins(remaining);
                }
                None => self.phase = Phase::Finish,
            },
            Phase::Finish => {
                log::debug!("Export target discovery complete ({} targets)", self.next_id);
                self.pending.push_back(DiscoveryEvent::Done);
            }
            Phase::Exhausted => {}
        }
    }
}

impl Iterator for ExportTargetAggregator<'_> {
    type Item = DiscoveryEvent;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(event) = self.pending.pop_front() {
                return Some(event);
            }
            if matches!(self.phase, Phase::Exhausted) {
                return None;
            }
            self.step();
        }
    }
}

impl std::iter::FusedIterator for ExportTargetAggregator<'_> {}
