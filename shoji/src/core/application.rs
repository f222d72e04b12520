use std::collections::BTreeMap;

use super::{Pid, Window, WindowId};
use crate::platform::WindowSource;

#[derive(Debug, Clone, PartialEq)]
pub struct Application {
    pub pid: Pid,
    pub name: String,
    pub windows: BTreeMap<WindowId, Window>,
}

impl Application {
    pub fn new(pid: Pid, name: String) -> Self {
        Self {
            pid,
            name,
            windows: BTreeMap::new(),
        }
    }

    /// Liveness is owned by the OS, so it is asked for rather than cached.
    pub fn is_alive(&self, source: &dyn WindowSource) -> bool {
        !source.is_process_terminated(self.pid)
    }
}
