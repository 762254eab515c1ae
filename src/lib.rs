//! **moover**: a keyboard-driven window placement menu.
//!
//! Pressing the global keybinding opens a full-screen menu.  While it is
//! open, every letter key moves and resizes the focused window to a fixed
//! horizontal slice of its monitor (`Q` = left half, `C` = centred third,
//! …).  Escape closes the menu; so does five seconds without a keystroke.
//!
//! # Architecture
//!
//! * [`overlay`]: the menu lifecycle as a pure state machine producing
//!   effects.
//! * [`placement`]: the fixed key table and the geometry arithmetic.
//! * [`controller::OverlayController`]: owns the live session and executes
//!   effects against the capability traits in [`traits`]:
//!   [`traits::WindowManager`], [`traits::KeybindingRegistry`],
//!   [`traits::OverlaySurface`] and [`traits::Timer`].
//!
//! Concrete implementations live in [`hyprland`] (Hyprland IPC),
//! [`visualizer`] (GTK layer-shell or headless surface), [`timer`] (polled
//! deadlines) and [`ipc`] (Unix-socket commands).

pub mod command;
pub mod config;
pub mod controller;
pub mod hyprland;
pub mod ipc;
pub mod overlay;
pub mod placement;
pub mod timer;
pub mod traits;
pub mod visualizer;
