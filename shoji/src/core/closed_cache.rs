use std::collections::BTreeMap;

use super::WindowId;

/// Where a window lived when GC removed it.
#[derive(Debug, Clone, PartialEq)]
pub struct ClosedWindow {
    pub workspace: String,
    pub index: usize,
}

/// Remembers windows removed while they were only momentarily unobservable,
/// so a window that comes back lands where it was.
#[derive(Debug, Default)]
pub struct ClosedWindowsCache {
    entries: BTreeMap<WindowId, ClosedWindow>,
}

impl ClosedWindowsCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, window_id: WindowId, closed: ClosedWindow) {
        tracing::debug!(
            "Caching closed window {} (workspace {}, index {})",
            window_id,
            closed.workspace,
            closed.index
        );
        self.entries.insert(window_id, closed);
    }

    pub fn take(&mut self, window_id: WindowId) -> Option<ClosedWindow> {
        self.entries.remove(&window_id)
    }

    pub fn clear(&mut self) {
        if !self.entries.is_empty() {
            tracing::debug!("Discarding {} closed window entries", self.entries.len());
        }
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
