//! Overlay surfaces and the main loops that drive the controller.
//!
//! When the `visualizer-gtk` feature is enabled, [`gtk::run_main_loop`]
//! takes over the main thread, shows the menu as a layer-shell window and
//! drives command processing through the GLib main loop.  Without it,
//! [`headless::run_blocking_loop`] processes commands from the socket only.

#[cfg(feature = "visualizer-gtk")]
pub mod gtk;
pub mod headless;

use crate::command::{Command, KeyPress};
use crate::controller::OverlayController;
use crate::traits::{KeybindingRegistry, OverlaySurface, Timer, WindowManager};
use log::{debug, error, info};
use std::sync::mpsc;
use std::time::Instant;

/// Whether a main loop should keep running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopStatus {
    Running,
    Finished,
}

/// Handle one command, logging failures.  A `Disable` finishes the loop.
pub fn dispatch_command<W, K, S, T>(
    controller: &mut OverlayController<W, K, S, T>,
    cmd: Command,
) -> LoopStatus
where
    W: WindowManager,
    K: KeybindingRegistry,
    S: OverlaySurface,
    T: Timer,
{
    debug!("command: {:?}", cmd);
    let last = cmd == Command::Disable;
    if let Err(e) = controller.handle(cmd) {
        error!("command error: {}", e);
    }
    if last {
        LoopStatus::Finished
    } else {
        LoopStatus::Running
    }
}

/// Drain every queued command, then fire expired timers.
///
/// When all senders are gone the controller is disabled and the loop
/// finishes.
pub fn pump<W, K, S, T>(
    controller: &mut OverlayController<W, K, S, T>,
    cmd_rx: &mpsc::Receiver<Command>,
) -> LoopStatus
where
    W: WindowManager,
    K: KeybindingRegistry,
    S: OverlaySurface,
    T: Timer,
{
    loop {
        match cmd_rx.try_recv() {
            Ok(cmd) => {
                if dispatch_command(controller, cmd) == LoopStatus::Finished {
                    return LoopStatus::Finished;
                }
            }
            Err(mpsc::TryRecvError::Empty) => break,
            Err(mpsc::TryRecvError::Disconnected) => {
                info!("all command sources closed");
                if let Err(e) = controller.disable() {
                    error!("disable: {}", e);
                }
                return LoopStatus::Finished;
            }
        }
    }

    if let Err(e) = controller.poll_timers(Instant::now()) {
        error!("timeout error: {}", e);
    }
    LoopStatus::Running
}

/// Map a toolkit key event to a [`KeyPress`].
///
/// `printable` is the key's Unicode form, if it has one.  Control
/// characters (Tab, Return, …) count as non-printable.
pub fn key_press(is_escape: bool, printable: Option<char>) -> KeyPress {
    if is_escape {
        return KeyPress::Escape;
    }
    match printable {
        Some(c) if !c.is_control() => KeyPress::Char(c),
        _ => KeyPress::Other,
    }
}
