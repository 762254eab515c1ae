//! The orchestrator that ties the menu state machine, the placement table
//! and the host capabilities together.
//!
//! [`OverlayController`] owns the single [`OverlaySession`] and reacts to
//! [`Command`]s and timer expiries by running [`transition`] and executing
//! the resulting [`Effect`]s against the injected [`WindowManager`],
//! [`KeybindingRegistry`], [`OverlaySurface`] and [`Timer`].

use crate::command::Command;
use crate::config::Config;
use crate::overlay::{transition, Effect, OverlayEvent, OverlayState, Transition};
use crate::placement::PlacementTable;
use crate::traits::{
    KeyBinding, KeybindingRegistry, OverlaySurface, Timer, TimerId, WindowManager,
};
use log::{debug, info, warn};
use std::time::{Duration, Instant};

/// Possible errors from the controller.
#[derive(Debug, thiserror::Error)]
pub enum ControllerError {
    /// The window manager returned an error.
    #[error("window manager error: {0}")]
    WindowManager(String),
    /// The overlay surface could not be shown.
    #[error("surface error: {0}")]
    Surface(String),
    /// The keybinding registry returned an error.
    #[error("keybinding error: {0}")]
    Keybinding(String),
}

/// The live menu.  Exists exactly while the state is [`OverlayState::Open`].
#[derive(Debug, Default)]
struct OverlaySession {
    timer: Option<TimerId>,
}

/// Drives the menu lifecycle.
///
/// The controller is generic over every host capability, making it
/// independent of Hyprland, GTK or any other concrete backend.
///
/// # Typical usage
///
/// ```ignore
/// let mut ctl = OverlayController::new(wm, keybindings, surface, DeadlineTimer::new());
/// ctl.enable()?;
/// ctl.handle(Command::Trigger)?;
/// ctl.handle(Command::Key(KeyPress::Char('q')))?;
/// ctl.poll_timers(Instant::now())?;
/// ```
pub struct OverlayController<W, K, S, T>
where
    W: WindowManager,
    K: KeybindingRegistry,
    S: OverlaySurface,
    T: Timer,
{
    wm: W,
    keybindings: K,
    surface: S,
    timer: T,
    table: &'static PlacementTable,
    timeout: Duration,
    binding_name: String,
    binding: KeyBinding,
    add_monitor_x: bool,
    session: Option<OverlaySession>,
}

impl<W, K, S, T> OverlayController<W, K, S, T>
where
    W: WindowManager,
    K: KeybindingRegistry,
    S: OverlaySurface,
    T: Timer,
{
    /// Create a controller in the `Closed` state with the default
    /// configuration.  Nothing is registered until [`enable`](Self::enable).
    pub fn new(wm: W, keybindings: K, surface: S, timer: T) -> Self {
        let config = Config::default();
        Self {
            wm,
            keybindings,
            surface,
            timer,
            table: PlacementTable::standard(),
            timeout: config.overlay.timeout(),
            binding_name: config.keybinding.name.clone(),
            binding: config.keybinding.binding("moover trigger"),
            add_monitor_x: config.placement.add_monitor_x,
            session: None,
        }
    }

    /// Apply a loaded [`Config`].
    ///
    /// `trigger_command` is bound when the config does not name its own
    /// command.
    pub fn set_config(&mut self, config: &Config, trigger_command: &str) {
        self.timeout = config.overlay.timeout();
        self.binding_name = config.keybinding.name.clone();
        self.binding = config.keybinding.binding(trigger_command);
        self.add_monitor_x = config.placement.add_monitor_x;
    }

    /// Current menu state.
    pub fn state(&self) -> OverlayState {
        if self.session.is_some() {
            OverlayState::Open
        } else {
            OverlayState::Closed
        }
    }

    /// Earliest pending timer deadline, for sleeping main loops.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.timer.next_deadline()
    }

    /// Register the global keybinding.
    pub fn enable(&mut self) -> Result<(), ControllerError> {
        info!(
            "registering keybinding {} ({} + {} -> {})",
            self.binding_name, self.binding.mods, self.binding.key, self.binding.command
        );
        self.keybindings
            .register(&self.binding_name, &self.binding)
            .map_err(|e| ControllerError::Keybinding(e.to_string()))
    }

    /// Unregister the keybinding (when supported) and tear everything down.
    ///
    /// Always ends in `Closed` with no timer pending, even if
    /// unregistration fails; the first error is returned afterwards.
    pub fn disable(&mut self) -> Result<(), ControllerError> {
        info!("disabling");
        let result = self.dispatch(OverlayEvent::Disable);
        self.teardown();
        result
    }

    /// Process a single [`Command`].
    pub fn handle(&mut self, cmd: Command) -> Result<(), ControllerError> {
        match cmd {
            Command::Trigger => {
                debug!("trigger");
                self.dispatch(OverlayEvent::Trigger)
            }
            Command::Key(key) => {
                debug!("key {:?}", key);
                self.dispatch(OverlayEvent::Key(key))
            }
            Command::Disable => self.disable(),
        }
    }

    /// Feed every timer that expired at or before `now` into the state
    /// machine.
    pub fn poll_timers(&mut self, now: Instant) -> Result<(), ControllerError> {
        for id in self.timer.take_expired(now) {
            self.handle_timeout(id)?;
        }
        Ok(())
    }

    /// A timer fired.  Only the current session's timer closes the menu;
    /// anything else is stale.
    pub fn handle_timeout(&mut self, id: TimerId) -> Result<(), ControllerError> {
        let current = self.session.as_ref().and_then(|s| s.timer);
        if current != Some(id) {
            debug!("ignoring stale timer {:?}", id);
            return Ok(());
        }
        if let Some(session) = self.session.as_mut() {
            // Already fired, so there is nothing left to cancel.
            session.timer = None;
        }
        info!("closing after {}ms without input", self.timeout.as_millis());
        self.dispatch(OverlayEvent::TimeoutElapsed)
    }

    /// Close the menu and release every resource it holds.
    ///
    /// Idempotent: calling it while `Closed` does nothing.
    pub fn teardown(&mut self) {
        if self.session.is_none() {
            return;
        }
        // Same order as `overlay::TEARDOWN`.
        self.cancel_timer();
        self.release_surface();
        self.destroy_surface();
    }

    //  Effect execution

    fn dispatch(&mut self, event: OverlayEvent) -> Result<(), ControllerError> {
        let from = self.state();
        let Transition { state, effects } = transition(from, event);
        if from != state {
            info!("overlay {:?} -> {:?} on {:?}", from, state, event);
        }

        let mut first_err = None;
        for effect in effects {
            match self.apply(effect) {
                Ok(()) => {}
                Err(e) if effect == Effect::ShowSurface => {
                    // Nothing was opened, so nothing else in this transition
                    // may run either.
                    self.surface.release();
                    self.surface.destroy();
                    self.session = None;
                    return Err(e);
                }
                Err(e) => {
                    warn!("{:?} failed: {}", effect, e);
                    first_err.get_or_insert(e);
                }
            }
        }

        debug_assert_eq!(self.state(), state);
        first_err.map_or(Ok(()), Err)
    }

    fn apply(&mut self, effect: Effect) -> Result<(), ControllerError> {
        match effect {
            Effect::ShowSurface => {
                let layout = self.table.menu_layout();
                self.surface
                    .show(&layout)
                    .map_err(|e| ControllerError::Surface(e.to_string()))?;
                self.session = Some(OverlaySession::default());
            }

            Effect::ArmTimer => match self.session.as_mut() {
                Some(session) => {
                    session.timer = Some(self.timer.schedule(self.timeout));
                }
                None => debug!("no session, not arming timer"),
            },

            Effect::CancelTimer => self.cancel_timer(),

            Effect::ReleaseSurface => self.release_surface(),

            Effect::DestroySurface => self.destroy_surface(),

            Effect::Place(key) => self.place(key)?,

            Effect::UnregisterKeybinding => {
                if self.keybindings.can_unregister() {
                    info!("unregistering keybinding {}", self.binding_name);
                    self.keybindings
                        .unregister(&self.binding_name)
                        .map_err(|e| ControllerError::Keybinding(e.to_string()))?;
                } else {
                    debug!("keybinding registry cannot unregister, skipping");
                }
            }
        }
        Ok(())
    }

    //  Teardown steps (infallible)

    fn cancel_timer(&mut self) {
        if let Some(id) = self.session.as_mut().and_then(|s| s.timer.take()) {
            self.timer.cancel(id);
        }
    }

    fn release_surface(&mut self) {
        self.surface.release();
    }

    fn destroy_surface(&mut self) {
        self.surface.destroy();
        self.session = None;
    }

    /// Move the focused window according to the rule for `key`.
    ///
    /// Unknown keys and a missing focused window are silent no-ops.
    fn place(&self, key: char) -> Result<(), ControllerError> {
        let rule = match self.table.get(key) {
            Some(r) => r,
            None => {
                debug!("no placement for {:?}", key);
                return Ok(());
            }
        };

        let window = match self
            .wm
            .focused_window()
            .map_err(|e| ControllerError::WindowManager(e.to_string()))?
        {
            Some(w) => w,
            None => {
                debug!("no focused window, nothing to place");
                return Ok(());
            }
        };

        // Fetched per keystroke: the window may have changed monitors.
        let monitor = match self
            .wm
            .monitor_geometry(window.monitor)
            .map_err(|e| ControllerError::WindowManager(e.to_string()))?
        {
            Some(m) => m,
            None => {
                warn!("window {} is on unknown monitor {}", window.address, window.monitor);
                return Ok(());
            }
        };

        let mut rect = rule.apply(&monitor);
        if self.add_monitor_x {
            rect = rect.translate(monitor.x, 0);
        }

        info!(
            "{} ({} from {}) -> {}x{} at ({}, {})",
            rule.label, rule.width, rule.start, rect.width, rect.height, rect.x, rect.y
        );
        self.wm
            .move_resize(&window, true, rect)
            .map_err(|e| ControllerError::WindowManager(e.to_string()))
    }
}

//  Tests
