use std::collections::HashMap;

use super::types::{
    DiscoveryEvent, ExportError, ExportTargetDescriptor, ExportTargetId, MenuEntry,
};

/// Ordered send-to menu with id lookup.
///
/// Entries are appended in arrival order until [`DiscoveryEvent::Done`]
/// arrives; after that the menu is sealed and every append is rejected.
#[derive(Debug, Default)]
pub struct ExportMenu {
    entries: Vec<MenuEntry>,
    index: HashMap<ExportTargetId, usize>,
    sealed: bool,
}

impl ExportMenu {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drains a discovery sequence into a new menu.
    ///
    /// Rejected events (duplicate ids) are logged and skipped. The menu is
    /// sealed even if the sequence ends without `Done`.
    pub fn from_discovery(events: impl IntoIterator<Item = DiscoveryEvent>) -> Self {
        let mut menu = Self::new();
        for event in events {
            if let Err(e) = menu.push(event) {
                log::error!("Dropping discovery event: {}", e);
            }
            if menu.sealed {
                break;
            }
        }
        if !menu.sealed {
            log::warn!("Discovery ended without completion marker; sealing menu");
            menu.sealed = true;
        }
        menu
    }

    /// Appends one discovery event.
    pub fn push(&mut self, event: DiscoveryEvent) -> Result<(), ExportError> {
        if self.sealed {
            return Err(ExportError::MenuSealed);
        }
        match event {
            DiscoveryEvent::Entry(descriptor) => {
                let id = descriptor.id();
                if self.index.contains_key(&id) {
                    return Err(ExportError::DuplicateTarget(id));
                }
                self.index.insert(id, self.entries.len());
                self.entries.push(MenuEntry::Target(descriptor));
            }
            DiscoveryEvent::Separator => self.entries.push(MenuEntry::Separator),
            DiscoveryEvent::Done => self.sealed = true,
        }
        Ok(())
    }

    pub fn is_sealed(&self) -> bool {
        self.sealed
    }

    pub fn entries(&self) -> &[MenuEntry] {
        &self.entries
    }

    /// Targets in menu order, separators skipped.
    pub fn targets(&self) -> impl Iterator<Item = &ExportTargetDescriptor> {
        self.entries.iter().filter_map(|entry| match entry {
            MenuEntry::Target(descriptor) => Some(descriptor),
            MenuEntry::Separator => None,
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, id: ExportTargetId) -> Option<&ExportTargetDescriptor> {
        match self.entries.get(*self.index.get(&id)?) {
            Some(MenuEntry::Target(descriptor)) => Some(descriptor),
            _ => None,
        }
    }

    /// Resolves a user-typed selector: a numeric id, or a display name
    /// compared case-insensitively.
    pub fn find(&self, selector: &str) -> Option<&ExportTargetDescriptor> {
        if let Ok(id) = selector.parse::<ExportTargetId>() {
            return self.get(id);
        }
        let wanted = selector.trim().to_lowercase();
        self.targets()
            .find(|descriptor| descriptor.display_name().to_lowercase() == wanted)
    }
}
