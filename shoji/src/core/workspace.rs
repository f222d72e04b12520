use shoji_ipc::LayoutKind;

use super::{MonitorId, WindowId};

/// Root of a workspace's tiling tree. Leaves are window ids.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TilingContainer {
    pub layout: LayoutKind,
    pub children: Vec<WindowId>,
}

impl TilingContainer {
    pub fn insert(&mut self, window_id: WindowId, index: Option<usize>) {
        if self.children.contains(&window_id) {
            return;
        }
        match index {
            Some(i) if i <= self.children.len() => self.children.insert(i, window_id),
            _ => self.children.push(window_id),
        }
    }

    pub fn remove(&mut self, window_id: WindowId) -> Option<usize> {
        let index = self.children.iter().position(|&id| id == window_id)?;
        self.children.remove(index);
        Some(index)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Workspace {
    pub name: String,
    pub monitor: Option<MonitorId>,
    pub root: TilingContainer,
}

impl Workspace {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            monitor: None,
            root: TilingContainer::default(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.root.children.is_empty()
    }

    pub fn contains(&self, window_id: WindowId) -> bool {
        self.root.children.contains(&window_id)
    }

    /// Drops leaves that no longer refer to a tracked window and duplicates.
    /// Returns true if anything changed.
    pub fn normalize_containers(&mut self, is_tracked: impl Fn(WindowId) -> bool) -> bool {
        let before = self.root.children.len();
        let mut seen = Vec::with_capacity(before);
        self.root.children.retain(|&id| {
            if !is_tracked(id) || seen.contains(&id) {
                return false;
            }
            seen.push(id);
            true
        });
        before != self.root.children.len()
    }

    /// Startup heuristic: few windows tile, many windows stack.
    pub fn smart_layout(&self) -> LayoutKind {
        if self.root.children.len() <= 3 {
            LayoutKind::Tiles
        } else {
            LayoutKind::Accordion
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_respects_index_and_dedups() {
        let mut root = TilingContainer::default();
        root.insert(1, None);
        root.insert(2, None);
        root.insert(3, Some(0));
        root.insert(2, Some(0));
        assert_eq!(root.children, vec![3, 1, 2]);

        root.insert(4, Some(99));
        assert_eq!(root.children, vec![3, 1, 2, 4]);
    }

    #[test]
    fn test_normalize_containers() {
        let mut ws = Workspace::new("1");
        ws.root.children = vec![1, 2, 1, 3];
        assert!(ws.normalize_containers(|id| id != 3));
        assert_eq!(ws.root.children, vec![1, 2]);
        assert!(!ws.normalize_containers(|_| true));
    }

    #[test]
    fn test_smart_layout() {
        let mut ws = Workspace::new("1");
        ws.root.children = vec![1, 2, 3];
        assert_eq!(ws.smart_layout(), LayoutKind::Tiles);
        ws.root.children.push(4);
        assert_eq!(ws.smart_layout(), LayoutKind::Accordion);
    }
}
