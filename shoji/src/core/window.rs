use crate::platform::{NativeState, WindowInfo};

pub type WindowId = u32;
pub type Pid = i32;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn max_x(&self) -> i32 {
        self.x + self.width as i32
    }

    pub fn max_y(&self) -> i32 {
        self.y + self.height as i32
    }

    /// Half-open containment: the right and bottom edges belong to the neighbour.
    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= self.x && x < self.max_x() && y >= self.y && y < self.max_y()
    }

    pub fn center(&self) -> (i32, i32) {
        (
            self.x + self.width as i32 / 2,
            self.y + self.height as i32 / 2,
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HideCorner {
    BottomLeft,
    BottomRight,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Shown,
    Parked(HideCorner),
}

/// Why a window is (or is not) part of tiling.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LayoutReason {
    #[default]
    Standard,
    /// The OS owns the window's geometry (minimized, native fullscreen).
    Native(NativeState),
}

#[derive(Debug, Clone, PartialEq)]
pub struct WindowMove {
    pub window_id: WindowId,
    pub pid: Pid,
    pub new_x: i32,
    pub new_y: i32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Window {
    pub id: WindowId,
    pub pid: Pid,
    pub title: String,
    pub workspace: String,
    pub frame: Rect,
    pub saved_frame: Option<Rect>,
    pub visibility: Visibility,
    pub layout_reason: LayoutReason,
}

impl Window {
    pub fn from_window_info(info: &WindowInfo, workspace: &str) -> Self {
        Self {
            id: info.window_id,
            pid: info.pid,
            title: info.title.clone(),
            workspace: workspace.to_string(),
            frame: info.frame,
            saved_frame: None,
            visibility: Visibility::Shown,
            layout_reason: info
                .native_state
                .map(LayoutReason::Native)
                .unwrap_or_default(),
        }
    }

    pub fn is_hidden(&self) -> bool {
        matches!(self.visibility, Visibility::Parked(_))
    }

    pub fn is_tiled(&self) -> bool {
        self.layout_reason == LayoutReason::Standard
    }
}

/// Parking position for a window of the given width in a monitor corner.
/// One pixel of the window stays on the monitor so the OS keeps it there.
pub fn hide_position(corner: HideCorner, monitor: &Rect, window_width: u32) -> (i32, i32) {
    match corner {
        HideCorner::BottomRight => (monitor.max_x() - 1, monitor.max_y() - 1),
        HideCorner::BottomLeft => (monitor.x - window_width as i32 + 1, monitor.max_y() - 1),
    }
}

/// Windows that can be parked in a monitor corner and brought back.
pub trait Hideable {
    fn hide_in_corner(&mut self, corner: HideCorner, monitor: &Rect) -> Option<WindowMove>;
    fn unhide_from_corner(&mut self) -> Option<WindowMove>;
}

impl Hideable for Window {
    fn hide_in_corner(&mut self, corner: HideCorner, monitor: &Rect) -> Option<WindowMove> {
        let width = self.saved_frame.unwrap_or(self.frame).width;
        let (x, y) = hide_position(corner, monitor, width);

        if self.visibility == Visibility::Parked(corner) && self.frame.x == x && self.frame.y == y {
            return None;
        }
        if self.visibility == Visibility::Shown {
            self.saved_frame = Some(self.frame);
        }

        tracing::debug!(
            "Hiding window {} from ({}, {}) to ({}, {})",
            self.id,
            self.frame.x,
            self.frame.y,
            x,
            y
        );
        self.visibility = Visibility::Parked(corner);
        self.frame.x = x;
        self.frame.y = y;
        Some(WindowMove {
            window_id: self.id,
            pid: self.pid,
            new_x: x,
            new_y: y,
        })
    }

    fn unhide_from_corner(&mut self) -> Option<WindowMove> {
        if !self.is_hidden() {
            return None;
        }
        let saved = self.saved_frame.take().unwrap_or(self.frame);
        tracing::debug!(
            "Showing window {} from ({}, {}) to ({}, {})",
            self.id,
            self.frame.x,
            self.frame.y,
            saved.x,
            saved.y
        );
        self.visibility = Visibility::Shown;
        self.frame = saved;
        Some(WindowMove {
            window_id: self.id,
            pid: self.pid,
            new_x: saved.x,
            new_y: saved.y,
        })
    }
}
