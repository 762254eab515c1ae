//! Entry point for **moover**.
//!
//! Without arguments the binary runs the daemon: it registers the global
//! keybinding, listens on the command socket on a background thread and
//! processes commands on the main thread.
//!
//! When the `visualizer-gtk` feature is enabled the main thread runs the
//! GLib main loop (GTK4 requires it) and polls the command channel from
//! there.  Without the feature, a simple blocking loop is used instead.
//!
//! Subcommands talk to a running daemon:
//!
//! ```text
//! moover trigger      open the menu / keep it open
//! moover key <key>    send one keystroke ("q", "space", "escape")
//! moover disable      unbind, close everything and stop the daemon
//! ```

use moover::command::{parse_key, Command};
use moover::config::Config;
use moover::controller::OverlayController;
use moover::hyprland::keybind::HyprlandKeybindings;
use moover::hyprland::wm::HyprlandWm;
use moover::ipc::listener::{UnixSocketError, UnixSocketListener};
use moover::ipc::{client, default_socket_path};
use moover::timer::DeadlineTimer;
use moover::traits::{CommandSource, KeybindingRegistry, OverlaySurface, WindowManager};
use log::{error, info, warn};
use std::path::Path;
use std::sync::mpsc;

/// Resolve the config directory (`$XDG_CONFIG_HOME/moover`).
fn config_dir() -> std::path::PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME").unwrap_or_else(|_| {
        let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".into());
        format!("{}/.config", home)
    });
    std::path::PathBuf::from(base).join("moover")
}

/// Try to load the config from `$XDG_CONFIG_HOME/moover/config.json`,
/// falling back to compiled-in defaults.
fn load_config() -> Config {
    let path = config_dir().join("config.json");
    match Config::load(&path) {
        Ok(cfg) => {
            info!("loaded config from {}", path.display());
            cfg
        }
        Err(e) => {
            info!("no config file ({}), using defaults", e);
            Config::default()
        }
    }
}

/// Resolve the CSS stylesheet path.
#[cfg(feature = "visualizer-gtk")]
fn css_path() -> std::path::PathBuf {
    config_dir().join("style.css")
}

/// The command the compositor runs when the keybinding fires.
fn trigger_command() -> String {
    match std::env::current_exe() {
        Ok(exe) => format!("{} trigger", exe.display()),
        Err(e) => {
            warn!("cannot resolve own executable ({}), binding `moover trigger`", e);
            "moover trigger".into()
        }
    }
}

//  No-op backends (--debug-visualizer-only)

mod noop {
    use moover::command::{MonitorGeometry, MonitorInfo, TargetRect, WindowInfo};
    use moover::traits::{KeyBinding, KeybindingRegistry, WindowManager};
    use log::info;

    pub struct NoopWm;

    #[derive(Debug, thiserror::Error)]
    #[error("noop")]
    pub struct NoopError;

    const DEBUG_MONITOR: MonitorGeometry = MonitorGeometry {
        x: 0,
        y: 0,
        width: 1920,
        height: 1080,
    };

    impl WindowManager for NoopWm {
        type Error = NoopError;

        fn monitors(&self) -> Result<Vec<MonitorInfo>, NoopError> {
            Ok(vec![MonitorInfo {
                id: 0,
                name: "DEBUG-1".into(),
                width: DEBUG_MONITOR.width as u32,
                height: DEBUG_MONITOR.height as u32,
                x: DEBUG_MONITOR.x,
                y: DEBUG_MONITOR.y,
            }])
        }

        fn focused_window(&self) -> Result<Option<WindowInfo>, NoopError> {
            Ok(Some(WindowInfo {
                address: "0x0".into(),
                title: "debug".into(),
                monitor: 0,
                floating: true,
            }))
        }

        fn monitor_geometry(&self, _: i64) -> Result<Option<MonitorGeometry>, NoopError> {
            Ok(Some(DEBUG_MONITOR))
        }

        fn move_resize(&self, _: &WindowInfo, _: bool, rect: TargetRect) -> Result<(), NoopError> {
            info!(
                "would place window at ({}, {}) size {}x{}",
                rect.x, rect.y, rect.width, rect.height
            );
            Ok(())
        }
    }

    /// Registers nothing; the menu is opened with `moover trigger`.
    pub struct NoopKeybindings;

    impl KeybindingRegistry for NoopKeybindings {
        type Error = NoopError;

        fn register(&mut self, name: &str, _: &KeyBinding) -> Result<(), NoopError> {
            info!("not registering {} in debug mode", name);
            Ok(())
        }

        fn unregister(&mut self, _: &str) -> Result<(), NoopError> {
            Ok(())
        }

        fn can_unregister(&self) -> bool {
            false
        }
    }
}

//  Main

fn main() {
    env_logger::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    match args.first().map(String::as_str) {
        Some("trigger") => run_client(Command::Trigger),
        Some("disable") => run_client(Command::Disable),
        Some("key") => match args.get(1) {
            Some(k) if !k.is_empty() => run_client(Command::Key(parse_key(k))),
            _ => {
                eprintln!("usage: moover key <key>");
                std::process::exit(2);
            }
        },
        Some("--debug-visualizer-only") => run_daemon(noop::NoopWm, noop::NoopKeybindings),
        None => run_daemon(HyprlandWm::new(), HyprlandKeybindings::new()),
        Some(other) => {
            eprintln!("unknown argument {:?}", other);
            eprintln!("usage: moover [trigger | key <key> | disable | --debug-visualizer-only]");
            std::process::exit(2);
        }
    }
}

/// Send one command to the running daemon.
fn run_client(cmd: Command) {
    let path = default_socket_path();
    if let Err(e) = client::send(&path, &cmd) {
        error!("{}", e);
        eprintln!("moover: {}", e);
        std::process::exit(1);
    }
}

fn run_daemon<W, K>(wm: W, keybindings: K)
where
    W: WindowManager + 'static,
    K: KeybindingRegistry + 'static,
{
    let config = load_config();

    match wm.monitors() {
        Ok(m) => info!("found {} monitor(s)", m.len()),
        Err(e) => {
            error!("failed to query monitors: {}", e);
            std::process::exit(1);
        }
    }

    let started = with_claimed_socket(&default_socket_path(), |listener| {
        let (cmd_tx, cmd_rx) = mpsc::channel::<Command>();
        spawn_command_sources(listener, cmd_tx.clone());
        start_event_loop(wm, keybindings, config, cmd_tx, cmd_rx);
    });
    if let Err(e) = started {
        error!("{}", e);
        eprintln!("moover: {} (stop it with `moover disable`)", e);
        std::process::exit(1);
    }
}

/// Claim the command socket, then hand it to `start`.
///
/// Must run before the keybinding is registered: when another daemon owns
/// the socket, `start` is never called and the compositor is not touched.
fn with_claimed_socket<T>(
    path: &Path,
    start: impl FnOnce(UnixSocketListener) -> T,
) -> Result<T, UnixSocketError> {
    let listener = UnixSocketListener::claim(path)?;
    Ok(start(listener))
}

/// Build the controller and register the keybinding.
///
/// A failed registration is not fatal: `moover trigger` still works.
fn build_controller<W, K, S>(
    wm: W,
    keybindings: K,
    surface: S,
    config: &Config,
) -> OverlayController<W, K, S, DeadlineTimer>
where
    W: WindowManager,
    K: KeybindingRegistry,
    S: OverlaySurface,
{
    let mut controller = OverlayController::new(wm, keybindings, surface, DeadlineTimer::new());
    controller.set_config(config, &trigger_command());
    if let Err(e) = controller.enable() {
        error!("{} (the menu can still be opened with `moover trigger`)", e);
    }
    controller
}

//  Event loops

#[cfg(feature = "visualizer-gtk")]
fn start_event_loop<W, K>(
    wm: W,
    keybindings: K,
    config: Config,
    cmd_tx: mpsc::Sender<Command>,
    cmd_rx: mpsc::Receiver<Command>,
) where
    W: WindowManager + 'static,
    K: KeybindingRegistry + 'static,
{
    moover::visualizer::gtk::run_main_loop(
        move |surface| build_controller(wm, keybindings, surface, &config),
        cmd_tx,
        cmd_rx,
        Some(css_path()),
    );
}

#[cfg(not(feature = "visualizer-gtk"))]
fn start_event_loop<W, K>(
    wm: W,
    keybindings: K,
    config: Config,
    cmd_tx: mpsc::Sender<Command>,
    cmd_rx: mpsc::Receiver<Command>,
) where
    W: WindowManager + 'static,
    K: KeybindingRegistry + 'static,
{
    use moover::visualizer::headless::{run_blocking_loop, HeadlessSurface};

    // Keys only arrive over the socket here.
    drop(cmd_tx);
    let controller = build_controller(wm, keybindings, HeadlessSurface::new(), &config);
    run_blocking_loop(controller, cmd_rx);
}

//  Helpers

fn spawn_command_sources(mut source: UnixSocketListener, tx: mpsc::Sender<Command>) {
    std::thread::spawn(move || {
        if let Err(e) = source.run(tx.clone()) {
            error!("socket listener error: {}", e);
            // Without the socket the keybinding cannot reach us.
            let _ = tx.send(Command::Disable);
        }
    });
}
