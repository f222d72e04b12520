use std::collections::{BTreeMap, BTreeSet};

use core_foundation::{
    array::CFArray, base::TCFType, dictionary::CFDictionary, number::CFNumber, string::CFString,
};
use core_graphics::display::{CGDisplayBounds, CGGetActiveDisplayList, CGMainDisplayID};
use core_graphics::window::{
    kCGNullWindowID, kCGWindowListExcludeDesktopElements, kCGWindowListOptionIncludingWindow,
    kCGWindowListOptionOnScreenOnly, CGWindowListCopyWindowInfo, CGWindowListOption,
};

use crate::core::{Rect, WindowId};
use crate::platform::MonitorInfo;

/// A row of the window server's window list.
#[derive(Debug, Clone)]
pub struct CGWindowEntry {
    pub pid: i32,
    pub window_id: WindowId,
    pub layer: i32,
    pub bounds: Rect,
}

fn copy_window_list(options: CGWindowListOption, relative_to: WindowId) -> Vec<CGWindowEntry> {
    let window_list: CFArray =
        unsafe { CFArray::wrap_under_create_rule(CGWindowListCopyWindowInfo(options, relative_to)) };

    let mut windows = Vec::new();
    for i in 0..window_list.len() {
        let dict_ptr = unsafe { *window_list.get_unchecked(i) };
        let dict: CFDictionary = unsafe { CFDictionary::wrap_under_get_rule(dict_ptr as *const _) };
        if let Some(entry) = parse_window_entry(&dict) {
            windows.push(entry);
        }
    }
    windows
}

/// Ids of normal-layer windows currently on screen.
pub fn on_screen_window_ids() -> BTreeSet<WindowId> {
    let options = kCGWindowListOptionOnScreenOnly | kCGWindowListExcludeDesktopElements;
    copy_window_list(options, kCGNullWindowID)
        .into_iter()
        .filter(|w| w.layer == 0)
        .map(|w| w.window_id)
        .collect()
}

/// Whether the window server still knows the window, on screen or not.
pub fn window_exists(window_id: WindowId) -> bool {
    copy_window_list(kCGWindowListOptionIncludingWindow, window_id)
        .iter()
        .any(|w| w.window_id == window_id)
}

fn parse_window_entry(dict: &CFDictionary) -> Option<CGWindowEntry> {
    let pid = get_number(dict, "kCGWindowOwnerPID")?.to_i32()?;
    let window_id = get_number(dict, "kCGWindowNumber")?.to_i32()? as u32;
    let layer = get_number(dict, "kCGWindowLayer")?.to_i32()?;
    let bounds = parse_bounds(dict, "kCGWindowBounds")?;
    Some(CGWindowEntry {
        pid,
        window_id,
        layer,
        bounds,
    })
}

fn get_number(dict: &CFDictionary, key: &str) -> Option<CFNumber> {
    let key = CFString::new(key);
    unsafe {
        let value = dict.find(key.as_concrete_TypeRef() as *const _)?;
        Some(CFNumber::wrap_under_get_rule(*value as *const _))
    }
}

fn parse_bounds(dict: &CFDictionary, key: &str) -> Option<Rect> {
    let key = CFString::new(key);
    unsafe {
        let value = dict.find(key.as_concrete_TypeRef() as *const _)?;
        let bounds_dict = CFDictionary::wrap_under_get_rule(*value as *const _);

        let x = get_number(&bounds_dict, "X")?.to_f64()?;
        let y = get_number(&bounds_dict, "Y")?.to_f64()?;
        let width = get_number(&bounds_dict, "Width")?.to_f64()?;
        let height = get_number(&bounds_dict, "Height")?.to_f64()?;

        Some(Rect::new(
            x as i32,
            y as i32,
            width.max(0.0) as u32,
            height.max(0.0) as u32,
        ))
    }
}

/// Usable area of every active display, menu bar excluded.
pub fn get_all_monitors() -> Vec<MonitorInfo> {
    let display_ids = get_active_display_ids();
    if display_ids.is_empty() {
        return Vec::new();
    }

    let main_display_id = unsafe { CGMainDisplayID() };
    let bounds: Vec<(u32, Rect)> = display_ids
        .iter()
        .map(|&id| (id, get_display_bounds(id)))
        .collect();
    let menu_bar_heights = detect_menu_bar_heights(&bounds);

    bounds
        .into_iter()
        .map(|(id, frame)| {
            let menu_bar = menu_bar_heights.get(&id).copied().unwrap_or(0);
            MonitorInfo {
                id,
                frame: Rect::new(
                    frame.x,
                    frame.y + menu_bar as i32,
                    frame.width,
                    frame.height.saturating_sub(menu_bar),
                ),
                is_main: id == main_display_id,
            }
        })
        .collect()
}

fn get_active_display_ids() -> Vec<u32> {
    const MAX_DISPLAYS: u32 = 16;
    let mut display_ids = [0u32; MAX_DISPLAYS as usize];
    let mut display_count: u32 = 0;

    let result = unsafe {
        CGGetActiveDisplayList(MAX_DISPLAYS, display_ids.as_mut_ptr(), &mut display_count)
    };
    if result != 0 {
        tracing::warn!("CGGetActiveDisplayList failed: {}", result);
        return Vec::new();
    }

    display_ids[..display_count as usize].to_vec()
}

fn get_display_bounds(display_id: u32) -> Rect {
    let rect = unsafe { CGDisplayBounds(display_id) };
    Rect::new(
        rect.origin.x as i32,
        rect.origin.y as i32,
        rect.size.width as u32,
        rect.size.height as u32,
    )
}

/// Menu bars are thin, screen-wide Window Server windows on layer 24.
fn detect_menu_bar_heights(displays: &[(u32, Rect)]) -> BTreeMap<u32, u32> {
    let mut heights = BTreeMap::new();
    for entry in copy_window_list(kCGWindowListOptionOnScreenOnly, kCGNullWindowID) {
        if entry.layer != 24 || entry.bounds.height >= 50 || entry.bounds.width <= 500 {
            continue;
        }
        if let Some((id, _)) = displays.iter().find(|(_, d)| {
            d.x == entry.bounds.x && d.y == entry.bounds.y && d.width == entry.bounds.width
        }) {
            heights.insert(*id, entry.bounds.height);
        }
    }
    heights
}
