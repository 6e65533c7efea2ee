//! The door directory: which access points are doors, and what to call them.
//!
//! The vendor reports every access point it knows about. Points whose raw
//! name starts with `_` are the doors this tool manages; the rest (gates,
//! barriers, turnstiles) only show up on request via the "additional" path.
//! A handful of static tables pin down what operators actually see: ids to
//! hide outright, display-name overrides, and the fixed membership of the
//! "3-6 Этаж" submenu.

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use std::time::{Duration, Instant};

use crate::transport::AccessPoint;

/// How long a populated directory is served without re-asking the vendor.
pub const DOORS_CACHE_TTL: Duration = Duration::from_secs(60 * 60);

/// Access point ids never shown, whatever the vendor says about them.
pub const HIDDEN_DOORS: [u32; 7] = [17, 18, 19, 20, 24, 27, 28];

/// Display names that replace whatever the vendor reports.
pub static DOOR_NAME_OVERRIDES: Lazy<IndexMap<u32, &'static str>> = Lazy::new(|| {
    IndexMap::from([
        (13, "3 Этаж"),
        (14, "4 Этаж"),
        (15, "5 Этаж"),
        (16, "6 Этаж"),
        (21, "Лифт 2 Этаж"),
        (22, "Чёрный вход"),
        (23, "Задняя лестница 2 этаж"),
        (25, "Главный вход"),
        (26, "Фойе лифта 1 этаж"),
    ])
});

/// The doors grouped under the floors submenu, in menu order.
pub const FLOORS_SUBMENU_DOORS: [u32; 4] = [13, 14, 15, 16];

/// Menu label that opens the floors submenu.
pub const FLOORS_SUBMENU_TITLE: &str = "3-6 Этаж";

/// Whether a menu selection is the floors submenu label.
pub fn is_submenu_trigger(text: &str) -> bool {
    text == FLOORS_SUBMENU_TITLE
}

fn override_for(id: u32) -> Option<&'static str> {
    DOOR_NAME_OVERRIDES.get(&id).copied()
}

/// Turn a marker-prefixed vendor name into a display name.
///
/// The convention is `_<name> <floor> flor...`: drop the marker, then cut
/// everything from two characters before the `flor` substring onward so the
/// floor number goes with it, and trim. Names without the `flor` part are
/// just stripped of the marker. When the cut leaves nothing (the `flor`
/// sits right at the front), the stripped name is kept whole.
fn derive_door_name(raw: &str) -> String {
    let stripped = raw.strip_prefix('_').unwrap_or(raw);
    if let Some(byte_idx) = raw.find("flor") {
        let flor_at = raw[..byte_idx].chars().count();
        if flor_at > 3 {
            let cut: String = raw.chars().skip(1).take(flor_at - 3).collect();
            let trimmed = cut.trim();
            if !trimmed.is_empty() {
                return trimmed.to_string();
            }
        }
    }
    stripped.to_string()
}

/// The cached id→name mapping of visible doors.
///
/// Rebuilt wholesale from a vendor point listing, never patched entry by
/// entry. Iteration order is the vendor's response order, which is what
/// name lookup relies on when two doors share a display name.
#[derive(Debug, Default)]
pub struct DoorDirectory {
    doors: IndexMap<u32, String>,
    fresh_until: Option<Instant>,
}

impl DoorDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn doors(&self) -> &IndexMap<u32, String> {
        &self.doors
    }

    pub fn is_empty(&self) -> bool {
        self.doors.is_empty()
    }

    /// True while the directory is populated and inside its TTL.
    pub fn is_fresh(&self) -> bool {
        !self.doors.is_empty()
            && self
                .fresh_until
                .map_or(false, |until| Instant::now() < until)
    }

    /// Replace the directory with the marker-carrying doors of a fresh
    /// vendor listing and restart the TTL.
    pub fn rebuild(&mut self, points: &[AccessPoint]) {
        self.doors.clear();
        for point in points {
            if HIDDEN_DOORS.contains(&point.id) {
                continue;
            }
            if !point.name.starts_with('_') {
                continue;
            }
            let display = override_for(point.id)
                .map(str::to_string)
                .unwrap_or_else(|| derive_door_name(&point.name));
            self.doors.insert(point.id, display);
        }
        self.fresh_until = Some(Instant::now() + DOORS_CACHE_TTL);
    }

    /// The cached doors plus the non-marker points of a listing, with the
    /// same hidden and override rules applied. Leaves the cache untouched.
    pub fn with_additional(&self, points: &[AccessPoint]) -> IndexMap<u32, String> {
        let mut all = self.doors.clone();
        for point in points {
            if HIDDEN_DOORS.contains(&point.id) {
                continue;
            }
            if point.name.starts_with('_') {
                continue;
            }
            let display = override_for(point.id)
                .map(str::to_string)
                .unwrap_or_else(|| point.name.clone());
            all.insert(point.id, display);
        }
        all
    }

    /// Display name for an id: override first, then the cache.
    pub fn resolve_name(&self, id: u32) -> Option<String> {
        override_for(id)
            .map(str::to_string)
            .or_else(|| self.doors.get(&id).cloned())
    }

    /// Pull the TTL deadline closer. Lets tests cross the TTL without
    /// sleeping.
    #[cfg(test)]
    pub fn backdate(&mut self, by: Duration) {
        if let Some(until) = self.fresh_until {
            if let Some(earlier) = until.checked_sub(by) {
                self.fresh_until = Some(earlier);
            }
        }
    }
}

/// Filter a door mapping down to the floors submenu, in menu order.
/// Absent or unnamed floors are dropped rather than shown blank.
pub fn floors_submenu(doors: &IndexMap<u32, String>) -> IndexMap<u32, String> {
    let mut submenu = IndexMap::new();
    for id in FLOORS_SUBMENU_DOORS {
        if let Some(name) = doors.get(&id) {
            if !name.is_empty() {
                submenu.insert(id, name.clone());
            }
        }
    }
    submenu
}
