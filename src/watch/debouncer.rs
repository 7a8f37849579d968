use std::{
    path::{Path, PathBuf},
    time::{Duration, Instant},
};

use notify::{EventKind, event::ModifyKind};
use rustc_hash::FxHashMap;

use crate::utils::path::normalize_path;

pub(super) const DEBOUNCE_MS: u64 = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Created,
    Modified,
    Removed,
}

impl ChangeKind {
    /// Renames report the old and new name; whichever still exists was created.
    fn of(kind: &EventKind, path: &Path) -> Option<Self> {
        match kind {
            EventKind::Create(_) => Some(Self::Created),
            EventKind::Remove(_) => Some(Self::Removed),
            EventKind::Modify(ModifyKind::Metadata(_)) => None,
            EventKind::Modify(ModifyKind::Name(_)) => {
                Some(if path.exists() { Self::Created } else { Self::Removed })
            }
            EventKind::Modify(_) => Some(Self::Modified),
            _ => None,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Modified => "modified",
            Self::Removed => "removed",
        }
    }
}

/// Pure debouncer: only handles timing and event deduplication.
pub(super) struct Debouncer {
    changes: FxHashMap<PathBuf, ChangeKind>,
    last_event: Option<Instant>,
    window: Duration,
}

impl Debouncer {
    pub(super) fn new() -> Self {
        Self::with_window(Duration::from_millis(DEBOUNCE_MS))
    }

    pub(super) fn with_window(window: Duration) -> Self {
        Self {
            changes: FxHashMap::default(),
            last_event: None,
            window,
        }
    }

    /// Add a notify event, applying dedup rules:
    /// - Removed then Created/Modified: restored, the new event wins
    /// - Modified then Removed: upgraded to Removed
    /// - Created then Removed: discarded
    /// - otherwise the first event wins
    pub(super) fn add_event(&mut self, event: &notify::Event) {
        crate::debug!("watch"; "raw notify: {:?} {:?}", event.kind, event.paths);

        for path in &event.paths {
            if is_temp_file(path) {
                continue;
            }
            let Some(kind) = ChangeKind::of(&event.kind, path) else {
                continue;
            };
            self.add(normalize_path(path), kind);
        }
    }

    pub(super) fn add(&mut self, path: PathBuf, kind: ChangeKind) {
        self.last_event = Some(Instant::now());

        let Some(&existing) = self.changes.get(&path) else {
            self.changes.insert(path, kind);
            return;
        };

        match (existing, kind) {
            (ChangeKind::Removed, ChangeKind::Created | ChangeKind::Modified) => {
                self.changes.insert(path, kind);
            }
            (ChangeKind::Modified, ChangeKind::Removed) => {
                self.changes.insert(path, ChangeKind::Removed);
            }
            (ChangeKind::Created, ChangeKind::Removed) => {
                self.changes.remove(&path);
            }
            _ => {}
        }
    }

    /// Take the collected changes once the window has passed quietly.
    pub(super) fn take_if_ready(&mut self) -> Option<FxHashMap<PathBuf, ChangeKind>> {
        let last_event = self.last_event?;
        if last_event.elapsed() < self.window {
            return None;
        }

        self.last_event = None;
        let changes = std::mem::take(&mut self.changes);
        (!changes.is_empty()).then_some(changes)
    }

    /// Sleep until the next possible ready time.
    pub(super) fn sleep_duration(&self) -> Duration {
        let Some(last_event) = self.last_event else {
            return Duration::from_secs(86400);
        };
        self.window
            .saturating_sub(last_event.elapsed())
            .max(Duration::from_millis(1))
    }
}

/// Editor artifacts and hidden files.
fn is_temp_file(path: &Path) -> bool {
    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");

    matches!(ext, "bck" | "bak" | "backup" | "swp" | "swo" | "tmp")
        || name.ends_with('~')
        || name.starts_with('.')
}

#[cfg(test)]
mod tests {
    use notify::event::{CreateKind, DataChange, MetadataKind, RemoveKind};

    use super::*;

    fn event(kind: EventKind, path: &str) -> notify::Event {
        notify::Event::new(kind).add_path(PathBuf::from(path))
    }

    fn ready(debouncer: &mut Debouncer) -> FxHashMap<PathBuf, ChangeKind> {
        std::thread::sleep(Duration::from_millis(5));
        debouncer.take_if_ready().unwrap_or_default()
    }

    #[test]
    fn test_created_then_removed_discarded() {
        let mut d = Debouncer::with_window(Duration::ZERO);
        d.add_event(&event(EventKind::Create(CreateKind::File), "/p/a.tsx"));
        d.add_event(&event(EventKind::Remove(RemoveKind::File), "/p/a.tsx"));
        assert!(ready(&mut d).is_empty());
    }

    #[test]
    fn test_modified_then_removed_upgraded() {
        let mut d = Debouncer::with_window(Duration::ZERO);
        d.add_event(&event(EventKind::Modify(ModifyKind::Data(DataChange::Content)), "/p/a.tsx"));
        d.add_event(&event(EventKind::Remove(RemoveKind::File), "/p/a.tsx"));
        assert_eq!(ready(&mut d)[Path::new("/p/a.tsx")], ChangeKind::Removed);
    }

    #[test]
    fn test_metadata_and_temp_ignored() {
        let mut d = Debouncer::with_window(Duration::ZERO);
        d.add_event(&event(
            EventKind::Modify(ModifyKind::Metadata(MetadataKind::Any)),
            "/p/a.tsx",
        ));
        d.add_event(&event(EventKind::Create(CreateKind::File), "/p/.a.tsx.swp"));
        d.add_event(&event(EventKind::Create(CreateKind::File), "/p/a.tsx~"));
        assert!(d.take_if_ready().is_none());
    }

    #[test]
    fn test_waits_for_quiet_window() {
        let mut d = Debouncer::with_window(Duration::from_secs(60));
        d.add_event(&event(EventKind::Create(CreateKind::File), "/p/a.tsx"));
        assert!(d.take_if_ready().is_none());
        assert!(d.sleep_duration() > Duration::from_secs(1));
    }
}
