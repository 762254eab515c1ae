//! Core traits that decouple moover from any specific window manager,
//! toolkit or transport mechanism.
//!
//! Every concrete backend (Hyprland, a GTK layer-shell window, a Unix-socket
//! listener, a test harness, …) implements one of these traits.  The
//! [`OverlayController`](crate::controller::OverlayController) only depends
//! on these abstractions.

use crate::command::{Command, MonitorGeometry, MonitorInfo, TargetRect, WindowInfo};
use crate::placement::MenuLayout;
use std::sync::mpsc;
use std::time::{Duration, Instant};

/// Abstraction over a window manager that can report the focused window and
/// move it.
///
/// An implementation might talk to Hyprland via IPC, or it might be a
/// no-op stub used in tests.
pub trait WindowManager {
    /// The error type produced by this window manager.
    type Error: std::error::Error + Send + 'static;

    /// Return the list of monitors the window manager knows about.
    fn monitors(&self) -> Result<Vec<MonitorInfo>, Self::Error>;

    /// Return information about the currently focused window, or `None` if
    /// no window is focused.
    fn focused_window(&self) -> Result<Option<WindowInfo>, Self::Error>;

    /// Return the geometry of the monitor with id `monitor`, or `None` if the
    /// window manager does not know it (e.g. it was just unplugged).
    fn monitor_geometry(&self, monitor: i64) -> Result<Option<MonitorGeometry>, Self::Error>;

    /// Move and resize `window` to `rect` in one step.
    ///
    /// `user_initiated` marks the request as a direct result of user input.
    fn move_resize(
        &self,
        window: &WindowInfo,
        user_initiated: bool,
        rect: TargetRect,
    ) -> Result<(), Self::Error>;
}

//  Keybinding

/// A global key combination and the action it runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyBinding {
    /// Modifier list in the host's notation (e.g. `"SUPER SHIFT"`).
    pub mods: String,
    /// Key name in the host's notation (e.g. `"M"`).
    pub key: String,
    /// Shell command the host runs when the combination is pressed.
    pub command: String,
}

/// Registers and removes named global keybindings.
///
/// The activation callback is not a closure: the bound command delivers a
/// [`Command::Trigger`] to the daemon through a [`CommandSource`].
pub trait KeybindingRegistry {
    type Error: std::error::Error + Send + 'static;

    /// Register `binding` under `name`, replacing a previous binding with the
    /// same name.
    fn register(&mut self, name: &str, binding: &KeyBinding) -> Result<(), Self::Error>;

    /// Remove the binding registered under `name`.
    fn unregister(&mut self, name: &str) -> Result<(), Self::Error>;

    /// Whether [`unregister`](KeybindingRegistry::unregister) is supported.
    fn can_unregister(&self) -> bool {
        true
    }
}

//  Surface

/// The full-screen, focus-grabbing surface that shows the menu.
///
/// Keystrokes received while the surface has focus are delivered as
/// [`Command::Key`] through the same channel as every other command, so
/// they are handled in order on the main thread.
pub trait OverlaySurface {
    type Error: std::error::Error + Send + 'static;

    /// Create the surface, place it above all other windows and take
    /// exclusive keyboard focus.
    fn show(&mut self, layout: &MenuLayout) -> Result<(), Self::Error>;

    /// Give keyboard focus back and remove the surface from the screen.
    /// Must be safe to call when nothing is shown.
    fn release(&mut self);

    /// Free the surface.  Must be safe to call when nothing is shown.
    fn destroy(&mut self);
}

//  Timer

/// Opaque handle for a scheduled timeout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(pub u64);

/// One-shot timers driven by the main loop.
///
/// The main loop polls [`take_expired`](Timer::take_expired) on every turn
/// and feeds the returned handles back into the controller.
pub trait Timer {
    /// Schedule a timeout `delay` from now.
    fn schedule(&mut self, delay: Duration) -> TimerId;

    /// Cancel a pending timeout.  Unknown or already fired handles are ignored.
    fn cancel(&mut self, id: TimerId);

    /// Remove and return every timeout whose deadline is at or before `now`.
    fn take_expired(&mut self, now: Instant) -> Vec<TimerId>;

    /// Earliest pending deadline, if any.
    fn next_deadline(&self) -> Option<Instant>;
}

//  Command Source

/// A source of [`Command`]s.
///
/// Implementations listen on some transport (a Unix socket, an in-memory
/// channel, …) and forward parsed commands into the provided
/// [`mpsc::Sender`].
///
/// # Contract
///
/// * [`run`](CommandSource::run) **blocks** until the source is exhausted or
///   an unrecoverable error occurs.
/// * Each received command must be sent through `sink` exactly once.
/// * Implementations must be [`Send`] so they can run on a dedicated thread.
pub trait CommandSource: Send {
    /// The error type produced by this source.
    type Error: std::error::Error + Send + 'static;

    /// Start listening and forward every incoming [`Command`] into `sink`.
    ///
    /// This method blocks the calling thread.  To run multiple sources
    /// concurrently, spawn each one on its own thread.
    fn run(&mut self, sink: mpsc::Sender<Command>) -> Result<(), Self::Error>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::KeyPress;
    use std::sync::mpsc;

    #[derive(Debug, thiserror::Error)]
    #[error("mock error")]
    struct MockError;

    /// A test double that emits a fixed sequence of commands.
    struct MockSource {
        commands: Vec<Command>,
    }

    impl CommandSource for MockSource {
        type Error = MockError;

        fn run(&mut self, sink: mpsc::Sender<Command>) -> Result<(), MockError> {
            for cmd in self.commands.drain(..) {
                let _ = sink.send(cmd);
            }
            Ok(())
        }
    }

    #[test]
    fn mock_source_emits_commands() {
        let mut src = MockSource {
            commands: vec![Command::Trigger, Command::Key(KeyPress::Char('q'))],
        };
        let (tx, rx) = mpsc::channel();
        src.run(tx).unwrap();
        let cmds: Vec<Command> = rx.try_iter().collect();
        assert_eq!(cmds.len(), 2);
        assert_eq!(cmds[0], Command::Trigger);
        assert_eq!(cmds[1], Command::Key(KeyPress::Char('q')));
    }

    /// Registry that only supports registration.
    #[derive(Default)]
    struct AddOnlyRegistry {
        names: Vec<String>,
    }

    impl KeybindingRegistry for AddOnlyRegistry {
        type Error = MockError;

        fn register(&mut self, name: &str, _: &KeyBinding) -> Result<(), MockError> {
            self.names.push(name.into());
            Ok(())
        }

        fn unregister(&mut self, _: &str) -> Result<(), MockError> {
            Err(MockError)
        }

        fn can_unregister(&self) -> bool {
            false
        }
    }

    #[test]
    fn registry_can_opt_out_of_unregister() {
        let mut reg = AddOnlyRegistry::default();
        let binding = KeyBinding {
            mods: "SUPER".into(),
            key: "M".into(),
            command: "moover trigger".into(),
        };
        reg.register("move-focused-window", &binding).unwrap();
        assert_eq!(reg.names, vec!["move-focused-window".to_string()]);
        assert!(!reg.can_unregister());
    }
}
