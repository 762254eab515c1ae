//! IPC between the daemon and its clients over a Unix socket.
//!
//! External tools (the compositor's keybinding, scripts, …) connect to the
//! socket and send newline-delimited JSON commands.

pub mod client;
pub mod listener;

/// Default socket path, `$XDG_RUNTIME_DIR/moover.sock`.
pub fn default_socket_path() -> std::path::PathBuf {
    let runtime = std::env::var("XDG_RUNTIME_DIR").unwrap_or_else(|_| "/tmp".into());
    std::path::PathBuf::from(runtime).join("moover.sock")
}
