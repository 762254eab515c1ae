//! [`WindowManager`] implementation backed by Hyprland IPC.
//!
//! Queries go through `j/activewindow` and `j/monitors`; placement is done
//! with `movewindowpixel exact` and `resizewindowpixel exact`, both
//! addressed at the window so a focus change in between cannot redirect
//! them.  Tiled windows ignore exact pixel geometry, so the window is made
//! floating first.

use super::socket::{self, SocketError};
use crate::command::{MonitorGeometry, MonitorInfo, TargetRect, WindowInfo};
use crate::traits::WindowManager;
use log::debug;
use serde::Deserialize;

/// Hyprland-backed window manager.
///
/// All communication happens over Hyprland's IPC socket
/// (`$XDG_RUNTIME_DIR/hypr/<instance>/.socket.sock`).  No child processes
/// are spawned.
#[derive(Debug, Default)]
pub struct HyprlandWm;

/// Errors that can occur when talking to Hyprland.
#[derive(Debug, thiserror::Error)]
#[error("hyprland IPC error: {0}")]
pub struct HyprlandWmError(String);

impl From<SocketError> for HyprlandWmError {
    fn from(e: SocketError) -> Self {
        HyprlandWmError(e.to_string())
    }
}

impl HyprlandWm {
    /// Create a new handle.
    ///
    /// No connection is opened eagerly; each method call opens a short-lived
    /// IPC request.
    pub fn new() -> Self {
        Self
    }
}

//  Minimal serde structs for the JSON we care about

/// Subset of the JSON object returned by `j/monitors`.
#[derive(Deserialize)]
struct MonitorJson {
    id: i64,
    name: String,
    width: u32,
    height: u32,
    x: i32,
    y: i32,
}

impl From<MonitorJson> for MonitorInfo {
    fn from(m: MonitorJson) -> Self {
        MonitorInfo {
            id: m.id,
            name: m.name,
            width: m.width,
            height: m.height,
            x: m.x,
            y: m.y,
        }
    }
}

/// Subset of the JSON object returned by `j/activewindow`.
#[derive(Deserialize)]
struct ActiveWindowJson {
    address: String,
    title: String,
    monitor: i64,
    #[serde(default)]
    floating: bool,
}

fn parse_monitors(json: &str) -> Result<Vec<MonitorInfo>, HyprlandWmError> {
    let monitors: Vec<MonitorJson> =
        serde_json::from_str(json).map_err(|e| HyprlandWmError(format!("parse: {}", e)))?;
    Ok(monitors.into_iter().map(MonitorInfo::from).collect())
}

fn parse_active_window(json: &str) -> Result<Option<WindowInfo>, HyprlandWmError> {
    // Hyprland returns an empty object `{}` when no window is focused.
    if json.trim() == "{}" {
        return Ok(None);
    }
    let w: ActiveWindowJson =
        serde_json::from_str(json).map_err(|e| HyprlandWmError(format!("parse: {}", e)))?;
    Ok(Some(WindowInfo {
        address: w.address,
        title: w.title,
        monitor: w.monitor,
        floating: w.floating,
    }))
}

//  WindowManager implementation

impl WindowManager for HyprlandWm {
    type Error = HyprlandWmError;

    fn monitors(&self) -> Result<Vec<MonitorInfo>, Self::Error> {
        parse_monitors(&socket::json("monitors")?)
    }

    fn focused_window(&self) -> Result<Option<WindowInfo>, Self::Error> {
        parse_active_window(&socket::json("activewindow")?)
    }

    fn monitor_geometry(&self, monitor: i64) -> Result<Option<MonitorGeometry>, Self::Error> {
        Ok(self
            .monitors()?
            .into_iter()
            .find(|m| m.id == monitor)
            .map(|m| m.geometry()))
    }

    fn move_resize(
        &self,
        window: &WindowInfo,
        user_initiated: bool,
        rect: TargetRect,
    ) -> Result<(), Self::Error> {
        // Hyprland has no notion of user-initiated moves.
        debug!(
            "move_resize {} (user_initiated={})",
            window.address, user_initiated
        );
        let target = format!("address:{}", window.address);
        if !window.floating {
            socket::dispatch(&format!("setfloating {}", target))?;
        }
        socket::dispatch(&format!(
            "resizewindowpixel exact {} {},{}",
            rect.width, rect.height, target
        ))?;
        socket::dispatch(&format!(
            "movewindowpixel exact {} {},{}",
            rect.x, rect.y, target
        ))?;
        Ok(())
    }
}
