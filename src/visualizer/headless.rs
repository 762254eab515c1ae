//! Surface and main loop for builds without a toolkit.
//!
//! [`HeadlessSurface`] only logs the menu.  Keys reach the controller over
//! the command socket (`moover key q`), which makes this mode useful for
//! scripting and for compositors without layer-shell support.

use super::{dispatch_command, pump, LoopStatus};
use crate::command::Command;
use crate::controller::OverlayController;
use crate::placement::MenuLayout;
use crate::traits::{KeybindingRegistry, OverlaySurface, Timer, WindowManager};
use log::{debug, error, info};
use std::convert::Infallible;
use std::sync::mpsc;
use std::time::{Duration, Instant};

/// How long the loop sleeps when no timer is pending.
const IDLE_WAIT: Duration = Duration::from_secs(3600);

/// An [`OverlaySurface`] that writes the menu to the log.
#[derive(Debug, Default)]
pub struct HeadlessSurface {
    shown: bool,
}

impl HeadlessSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_shown(&self) -> bool {
        self.shown
    }
}

impl OverlaySurface for HeadlessSurface {
    type Error = Infallible;

    fn show(&mut self, layout: &MenuLayout) -> Result<(), Infallible> {
        info!("menu open");
        let rows = layout.columns.iter().map(Vec::len).max().unwrap_or(0);
        for row in 0..rows {
            let line: Vec<&str> = layout
                .columns
                .iter()
                .filter_map(|col| col.get(row).map(String::as_str))
                .collect();
            info!("  {}", line.join("   "));
        }
        self.shown = true;
        Ok(())
    }

    fn release(&mut self) {
        if self.shown {
            debug!("menu released");
        }
    }

    fn destroy(&mut self) {
        if self.shown {
            info!("menu closed");
        }
        self.shown = false;
    }
}

/// Process commands on the current thread until a `Disable` arrives or
/// every sender is dropped.
///
/// Blocks on the channel between commands, waking up in time for the next
/// timer deadline.
pub fn run_blocking_loop<W, K, S, T>(
    mut controller: OverlayController<W, K, S, T>,
    cmd_rx: mpsc::Receiver<Command>,
) where
    W: WindowManager,
    K: KeybindingRegistry,
    S: OverlaySurface,
    T: Timer,
{
    info!("moover running");
    loop {
        let wait = controller
            .next_deadline()
            .map(|d| d.saturating_duration_since(Instant::now()))
            .unwrap_or(IDLE_WAIT);

        match cmd_rx.recv_timeout(wait) {
            Ok(cmd) => {
                if dispatch_command(&mut controller, cmd) == LoopStatus::Finished {
                    break;
                }
            }
            Err(mpsc::RecvTimeoutError::Timeout) => {}
            Err(mpsc::RecvTimeoutError::Disconnected) => {
                info!("all command sources closed");
                if let Err(e) = controller.disable() {
                    error!("disable: {}", e);
                }
                break;
            }
        }

        if pump(&mut controller, &cmd_rx) == LoopStatus::Finished {
            break;
        }
    }
    info!("moover stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::{KeyPress, MonitorGeometry, MonitorInfo, TargetRect, WindowInfo};
    use crate::config::Config;
    use crate::overlay::OverlayState;
    use crate::placement::PlacementTable;
    use crate::timer::DeadlineTimer;
    use crate::traits::KeyBinding;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Debug, thiserror::Error)]
    #[error("test error")]
    struct TestErr;

    #[derive(Default)]
    struct SharedWm {
        moves: Rc<RefCell<Vec<TargetRect>>>,
    }

    impl WindowManager for SharedWm {
        type Error = TestErr;

        fn monitors(&self) -> Result<Vec<MonitorInfo>, TestErr> {
            Ok(Vec::new())
        }

        fn focused_window(&self) -> Result<Option<WindowInfo>, TestErr> {
            Ok(Some(WindowInfo {
                address: "0x1".into(),
                title: "t".into(),
                monitor: 0,
                floating: true,
            }))
        }

        fn monitor_geometry(&self, _: i64) -> Result<Option<MonitorGeometry>, TestErr> {
            Ok(Some(MonitorGeometry {
                x: 0,
                y: 0,
                width: 1920,
                height: 1080,
            }))
        }

        fn move_resize(&self, _: &WindowInfo, _: bool, rect: TargetRect) -> Result<(), TestErr> {
            self.moves.borrow_mut().push(rect);
            Ok(())
        }
    }

    #[derive(Default)]
    struct SharedKeys {
        unregistered: Rc<RefCell<bool>>,
    }

    impl KeybindingRegistry for SharedKeys {
        type Error = TestErr;

        fn register(&mut self, _: &str, _: &KeyBinding) -> Result<(), TestErr> {
            Ok(())
        }

        fn unregister(&mut self, _: &str) -> Result<(), TestErr> {
            *self.unregistered.borrow_mut() = true;
            Ok(())
        }
    }

    #[test]
    fn headless_surface_tracks_visibility() {
        let mut s = HeadlessSurface::new();
        s.show(&PlacementTable::standard().menu_layout()).unwrap();
        assert!(s.is_shown());
        s.release();
        s.destroy();
        assert!(!s.is_shown());
        s.destroy();
    }

    #[test]
    fn loop_handles_commands_until_disable() {
        let wm = SharedWm::default();
        let moves = wm.moves.clone();
        let keys = SharedKeys::default();
        let unregistered = keys.unregistered.clone();
        let ctl = OverlayController::new(wm, keys, HeadlessSurface::new(), DeadlineTimer::new());

        let (tx, rx) = mpsc::channel();
        tx.send(Command::Trigger).unwrap();
        tx.send(Command::Key(KeyPress::Char('t'))).unwrap();
        tx.send(Command::Key(KeyPress::Char('y'))).unwrap();
        tx.send(Command::Disable).unwrap();

        run_blocking_loop(ctl, rx);

        assert_eq!(moves.borrow().len(), 1);
        assert_eq!(moves.borrow()[0].x, 976);
        assert!(*unregistered.borrow());
    }

    #[test]
    fn loop_disables_when_senders_drop() {
        let keys = SharedKeys::default();
        let unregistered = keys.unregistered.clone();
        let ctl = OverlayController::new(SharedWm::default(), keys, HeadlessSurface::new(), DeadlineTimer::new());

        let (tx, rx) = mpsc::channel();
        tx.send(Command::Trigger).unwrap();
        drop(tx);

        run_blocking_loop(ctl, rx);
        assert!(*unregistered.borrow());
    }

    #[test]
    fn loop_closes_menu_on_timeout() {
        let mut ctl = OverlayController::new(
            SharedWm::default(),
            SharedKeys::default(),
            HeadlessSurface::new(),
            DeadlineTimer::new(),
        );
        let mut config = Config::default();
        config.overlay.timeout_ms = 20;
        ctl.set_config(&config, "moover trigger");

        let (tx, rx) = mpsc::channel();
        tx.send(Command::Trigger).unwrap();
        assert_eq!(pump(&mut ctl, &rx), LoopStatus::Running);
        assert_eq!(ctl.state(), OverlayState::Open);

        std::thread::sleep(Duration::from_millis(40));
        assert_eq!(pump(&mut ctl, &rx), LoopStatus::Running);
        assert_eq!(ctl.state(), OverlayState::Closed);
        drop(tx);
    }
}
