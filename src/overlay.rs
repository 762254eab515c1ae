//! Menu lifecycle as a pure state machine.
//!
//! [`transition`] maps `(state, event)` to the next state plus an ordered
//! list of [`Effect`]s.  It performs no I/O: the
//! [`OverlayController`](crate::controller::OverlayController) executes the
//! effects against the real surface, timer and window manager.
//!
//! ```text
//!            Trigger                     Trigger / Key(*)
//!   Closed ──────────▶ Open ◀──────────────────────────┐
//!     ▲                 │ └──────────────────────────────┘
//!     └─────────────────┘
//!       Key(Escape) / TimeoutElapsed / Disable
//! ```

use crate::command::KeyPress;

/// Whether the menu is on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverlayState {
    #[default]
    Closed,
    Open,
}

/// Something that happened to the menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlayEvent {
    /// The global keybinding fired.
    Trigger,
    /// A keystroke reached the modal surface.
    Key(KeyPress),
    /// The inactivity timer of the current session elapsed.
    TimeoutElapsed,
    /// The daemon is being disabled.
    Disable,
}

/// A side effect requested by a transition, executed in list order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    /// Create the full-screen surface and give it exclusive keyboard focus.
    ShowSurface,
    /// Start the inactivity timer.
    ArmTimer,
    /// Cancel the inactivity timer, if one is pending.
    CancelTimer,
    /// Release keyboard focus and take the surface off the screen.
    ReleaseSurface,
    /// Destroy the surface.
    DestroySurface,
    /// Move the focused window according to the rule for this key.
    Place(char),
    /// Remove the global keybinding.
    UnregisterKeybinding,
}

/// Result of one [`transition`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub state: OverlayState,
    pub effects: Vec<Effect>,
}

impl Transition {
    fn to(state: OverlayState, effects: Vec<Effect>) -> Self {
        Self { state, effects }
    }
}

/// Teardown order: timer first, then focus/screen, then the surface itself.
pub const TEARDOWN: [Effect; 3] = [
    Effect::CancelTimer,
    Effect::ReleaseSurface,
    Effect::DestroySurface,
];

const RESET_TIMER: [Effect; 2] = [Effect::CancelTimer, Effect::ArmTimer];

/// Compute the next state and the effects that get there.
pub fn transition(state: OverlayState, event: OverlayEvent) -> Transition {
    use OverlayEvent::*;
    use OverlayState::*;

    match (state, event) {
        (Closed, Trigger) => Transition::to(Open, vec![Effect::ShowSurface, Effect::ArmTimer]),
        (Open, Trigger) => Transition::to(Open, RESET_TIMER.to_vec()),

        (Open, Key(KeyPress::Escape)) => Transition::to(Closed, TEARDOWN.to_vec()),
        (Open, Key(KeyPress::Char(c))) => {
            let mut effects = vec![Effect::Place(c)];
            effects.extend(RESET_TIMER);
            Transition::to(Open, effects)
        }
        (Open, Key(KeyPress::Other)) => Transition::to(Open, RESET_TIMER.to_vec()),

        (Open, TimeoutElapsed) => Transition::to(Closed, TEARDOWN.to_vec()),

        (Open, Disable) => {
            let mut effects = vec![Effect::UnregisterKeybinding];
            effects.extend(TEARDOWN);
            Transition::to(Closed, effects)
        }
        (Closed, Disable) => Transition::to(Closed, vec![Effect::UnregisterKeybinding]),

        // No surface exists to deliver keys, and a timer that outlived its
        // session has nothing left to close.
        (Closed, Key(_)) | (Closed, TimeoutElapsed) => Transition::to(Closed, Vec::new()),
    }
}
