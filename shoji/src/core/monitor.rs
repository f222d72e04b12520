use super::Rect;

pub type MonitorId = u32;

#[derive(Debug, Clone, PartialEq)]
pub struct Monitor {
    pub id: MonitorId,
    pub frame: Rect,
    pub is_main: bool,
    pub active_workspace: String,
}

impl Monitor {
    pub fn new(id: MonitorId, frame: Rect, is_main: bool, active_workspace: String) -> Self {
        Self {
            id,
            frame,
            is_main,
            active_workspace,
        }
    }
}
