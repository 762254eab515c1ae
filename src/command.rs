//! Commands and types used throughout moover.
//!
//! This module defines the vocabulary that all components share:
//! [`Command`] describes every request the daemon accepts, [`KeyPress`] is
//! the symbolic form of a captured keystroke, and [`MonitorInfo`] /
//! [`WindowInfo`] / [`MonitorGeometry`] / [`TargetRect`] carry the window
//! manager data the overlay works with.
//!
//! Keys travel as plain strings on the wire: `"Escape"` (or `"esc"`), a
//! single printable character such as `"q"` or `" "`, anything else becomes
//! [`KeyPress::Other`].

use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// A keystroke captured while the overlay holds keyboard focus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyPress {
    /// The Escape key.
    Escape,
    /// A key with a printable form.
    Char(char),
    /// A key with no printable form (arrows, function keys, …).
    Other,
}

impl fmt::Display for KeyPress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyPress::Escape => write!(f, "Escape"),
            KeyPress::Char(c) => write!(f, "{}", c),
            KeyPress::Other => write!(f, "Other"),
        }
    }
}

/// Parse a key string.
///
/// A string of exactly one character is always a [`KeyPress::Char`], so
/// `" "` is the space bar.  Longer strings are matched case-insensitively
/// against the names of non-printable keys.
pub fn parse_key(s: &str) -> KeyPress {
    let mut chars = s.chars();
    if let (Some(c), None) = (chars.next(), chars.next()) {
        return KeyPress::Char(c);
    }
    match s.trim().to_lowercase().as_str() {
        "escape" | "esc" => KeyPress::Escape,
        "space" => KeyPress::Char(' '),
        _ => KeyPress::Other,
    }
}

impl Serialize for KeyPress {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for KeyPress {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        if s.is_empty() {
            return Err(DeError::custom("empty key"));
        }
        Ok(parse_key(&s))
    }
}

/// Every request the overlay controller can receive.
///
/// Commands are produced by [`CommandSource`](crate::traits::CommandSource)
/// implementations and by the overlay surface, and consumed by the
/// [`OverlayController`](crate::controller::OverlayController).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Command {
    /// The global keybinding fired.  Opens the menu, or keeps an open menu
    /// alive by resetting its inactivity timer.
    ///
    /// On the wire this is the JSON string `"Trigger"`.
    Trigger,

    /// A keystroke captured by the modal surface.
    ///
    /// On the wire: `{"Key":"q"}`, `{"Key":"Escape"}`.
    Key(KeyPress),

    /// Unregister the keybinding, tear everything down and stop the daemon.
    Disable,
}

/// Static information about a monitor known to the window manager.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorInfo {
    /// Numeric id the window manager uses for this monitor.
    pub id: i64,
    /// Unique name the window manager uses for this monitor (e.g. `"DP-1"`).
    pub name: String,
    /// Horizontal resolution in pixels.
    pub width: u32,
    /// Vertical resolution in pixels.
    pub height: u32,
    /// X position on the virtual desktop (pixels).
    pub x: i32,
    /// Y position on the virtual desktop (pixels).
    pub y: i32,
}

impl MonitorInfo {
    /// Snapshot of this monitor's rectangle.
    pub fn geometry(&self) -> MonitorGeometry {
        MonitorGeometry {
            x: self.x,
            y: self.y,
            width: self.width as i32,
            height: self.height as i32,
        }
    }
}

/// Minimal information about the currently focused window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowInfo {
    /// Window manager address / id.
    pub address: String,
    /// Human-readable title.
    pub title: String,
    /// Id of the monitor the window is on.
    pub monitor: i64,
    /// Whether the window is already floating.
    pub floating: bool,
}

/// Origin and size of one monitor in desktop coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonitorGeometry {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

/// Where a window should be placed, in absolute pixels.
///
/// Values are not clamped; negative sizes are passed on unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetRect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl TargetRect {
    /// Shift the rectangle by `(dx, dy)`.
    pub fn translate(self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
            ..self
        }
    }
}
