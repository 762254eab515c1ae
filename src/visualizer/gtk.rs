//! GTK4 + layer-shell menu surface that runs on the **main thread**.
//!
//! # Widget tree
//!
//! ```text
//! window                         (layer-shell, overlay layer, all edges)
//! └ .moover-overlay            (full-screen dimmed backdrop)
//!     └ .moover-grid           (horizontal box, centred)
//!         └ .moover-column     (one vertical box per column)
//!             └ .moover-key-label
//! ```
//!
//! # CSS selectors
//!
//! | Selector             | Targets                                   |
//! |----------------------|-------------------------------------------|
//! | `window`             | The overlay window (keep transparent)     |
//! | `.moover-overlay`    | Backdrop covering the monitor             |
//! | `.moover-grid`       | Container around the columns              |
//! | `.moover-column`     | One column of labels                      |
//! | `.moover-key-label`  | A single `[Q]: Left 1/2` label            |
//!
//! A fresh window is built every time the menu opens and destroyed when it
//! closes; while it exists it holds exclusive keyboard focus.

use super::{key_press, pump, LoopStatus};
use crate::command::Command;
use crate::controller::OverlayController;
use crate::placement::MenuLayout;
use crate::timer::DeadlineTimer;
use crate::traits::{KeybindingRegistry, OverlaySurface, WindowManager};
use gtk4::prelude::*;
use gtk4::{gdk, glib};
use gtk4_layer_shell::{Edge, KeyboardMode, Layer, LayerShell};
use log::{debug, info, warn};
use std::path::PathBuf;
use std::sync::mpsc;
use std::time::Duration;

/// Main loop tick.
const TICK: Duration = Duration::from_millis(16);

//  Default CSS

const DEFAULT_CSS: &str = r#"
window,
window.background {
    background-color: transparent;
    background: none;
}

.moover-overlay {
    background-color: rgba(0, 0, 0, 0.6);
}

.moover-grid {
    background-color: rgba(20, 20, 20, 0.9);
    border-radius: 16px;
    padding: 24px;
}

.moover-column {
    margin: 0 12px;
}

.moover-key-label {
    color: rgba(255, 255, 255, 0.9);
    font-family: monospace;
    font-size: 16px;
    padding: 6px 8px;
}
"#;

//  Surface

/// Error from creating the layer-shell window.
#[derive(Debug, thiserror::Error)]
#[error("gtk surface error: {0}")]
pub struct GtkSurfaceError(String);

/// An [`OverlaySurface`] backed by a GTK4 layer-shell window.
///
/// Key presses on the window are sent into the command channel as
/// [`Command::Key`] and always stop propagation.
pub struct GtkSurface {
    window: Option<gtk4::Window>,
    keys: mpsc::Sender<Command>,
}

impl GtkSurface {
    /// Create a surface that reports keys through `keys`.  Must be called
    /// on the GTK thread after `gtk4::init`.
    pub fn new(keys: mpsc::Sender<Command>) -> Self {
        Self { window: None, keys }
    }
}

fn build_grid(layout: &MenuLayout) -> gtk4::Box {
    let grid = gtk4::Box::new(gtk4::Orientation::Horizontal, 0);
    grid.add_css_class("moover-grid");
    grid.set_halign(gtk4::Align::Center);
    grid.set_valign(gtk4::Align::Center);
    grid.set_hexpand(true);
    grid.set_vexpand(true);

    for column in &layout.columns {
        let col = gtk4::Box::new(gtk4::Orientation::Vertical, 0);
        col.add_css_class("moover-column");
        for text in column {
            let label = gtk4::Label::new(Some(text));
            label.add_css_class("moover-key-label");
            label.set_halign(gtk4::Align::Start);
            col.append(&label);
        }
        grid.append(&col);
    }
    grid
}

impl OverlaySurface for GtkSurface {
    type Error = GtkSurfaceError;

    fn show(&mut self, layout: &MenuLayout) -> Result<(), GtkSurfaceError> {
        if !gtk4_layer_shell::is_supported() {
            return Err(GtkSurfaceError(
                "compositor does not support wlr-layer-shell".into(),
            ));
        }
        if self.window.is_some() {
            warn!("menu window already exists, replacing it");
            self.release();
            self.destroy();
        }

        let window = gtk4::Window::new();
        window.init_layer_shell();
        window.set_layer(Layer::Overlay);
        window.set_namespace("moover");
        for edge in [Edge::Top, Edge::Bottom, Edge::Left, Edge::Right] {
            window.set_anchor(edge, true);
        }
        window.set_exclusive_zone(-1);
        window.set_keyboard_mode(KeyboardMode::Exclusive);
        window.set_decorated(false);
        window.remove_css_class("background");

        let backdrop = gtk4::Box::new(gtk4::Orientation::Vertical, 0);
        backdrop.add_css_class("moover-overlay");
        backdrop.append(&build_grid(layout));
        window.set_child(Some(&backdrop));

        let controller = gtk4::EventControllerKey::new();
        let tx = self.keys.clone();
        controller.connect_key_pressed(move |_, keyval, _, _| {
            let key = key_press(keyval == gdk::Key::Escape, keyval.to_unicode());
            if tx.send(Command::Key(key)).is_err() {
                warn!("command channel closed, dropping key {}", key);
            }
            glib::Propagation::Stop
        });
        window.add_controller(controller);

        window.present();
        debug!("menu window presented");
        self.window = Some(window);
        Ok(())
    }

    fn release(&mut self) {
        if let Some(window) = &self.window {
            window.set_keyboard_mode(KeyboardMode::None);
            window.set_visible(false);
            debug!("menu window released");
        }
    }

    fn destroy(&mut self) {
        if let Some(window) = self.window.take() {
            window.destroy();
            debug!("menu window destroyed");
        }
    }
}

//  Public API

/// Run the GTK4 main loop on the **current** (main) thread.
///
/// `build` receives the [`GtkSurface`] (which can only be created once GTK
/// is initialised) and returns the controller to drive.  `key_tx` must feed
/// the same channel as `cmd_rx`.  Returns once a `Disable` command has been
/// handled or every command source has closed.
pub fn run_main_loop<W, K, F>(
    build: F,
    key_tx: mpsc::Sender<Command>,
    cmd_rx: mpsc::Receiver<Command>,
    css_path: Option<PathBuf>,
) where
    W: WindowManager + 'static,
    K: KeybindingRegistry + 'static,
    F: FnOnce(GtkSurface) -> OverlayController<W, K, GtkSurface, DeadlineTimer>,
{
    gtk4::init().expect("failed to initialise GTK4");
    info!("GTK4 initialised on main thread");

    load_css(&css_path);

    let mut controller = build(GtkSurface::new(key_tx));
    let main_loop = glib::MainLoop::new(None, false);

    let quit = main_loop.clone();
    glib::timeout_add_local(TICK, move || {
        if pump(&mut controller, &cmd_rx) == LoopStatus::Finished {
            info!("shutting down");
            quit.quit();
            return glib::ControlFlow::Break;
        }
        glib::ControlFlow::Continue
    });

    info!("entering GLib main loop");
    main_loop.run();
    info!("GLib main loop exited");
}

//  CSS loading

fn load_css(css_path: &Option<PathBuf>) {
    let provider = gtk4::CssProvider::new();

    let css_content = match css_path.as_ref().filter(|p| p.exists()) {
        Some(p) => match std::fs::read_to_string(p) {
            Ok(content) => {
                info!("user CSS: {} ({} bytes)", p.display(), content.len());
                content
            }
            Err(e) => {
                warn!("CSS read failed ({}): {}, using built-in", p.display(), e);
                DEFAULT_CSS.to_string()
            }
        },
        None => {
            info!("no user CSS, using built-in default");
            DEFAULT_CSS.to_string()
        }
    };

    #[allow(deprecated)]
    provider.load_from_data(&css_content);

    if let Some(display) = gdk::Display::default() {
        gtk4::style_context_add_provider_for_display(
            &display,
            &provider,
            gtk4::STYLE_PROVIDER_PRIORITY_APPLICATION,
        );
        info!("CSS registered on display");
    } else {
        warn!("no GDK display, CSS will not be applied");
    }
}
