//! Hyprland-specific implementations.
//!
//! This module provides concrete backends for the
//! [`WindowManager`](crate::traits::WindowManager) and
//! [`KeybindingRegistry`](crate::traits::KeybindingRegistry) traits,
//! powered by Hyprland's IPC socket.
//!
//! Nothing outside this module should reference Hyprland directly.

pub mod keybind;
mod socket;
pub mod wm;
