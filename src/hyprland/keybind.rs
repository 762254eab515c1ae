//! [`KeybindingRegistry`] implementation backed by Hyprland's runtime
//! `keyword` command.
//!
//! Hyprland binds are anonymous, keyed only by their `MODS,KEY` pair, so
//! the registry remembers which combination each name was bound to in order
//! to `unbind` it later.

use super::socket::{self, SocketError};
use crate::traits::{KeyBinding, KeybindingRegistry};
use log::{debug, info};
use std::collections::HashMap;

/// Registers global keybindings with `keyword bind MODS,KEY,exec,COMMAND`.
#[derive(Debug, Default)]
pub struct HyprlandKeybindings {
    bound: HashMap<String, KeyBinding>,
}

/// Errors from registering or removing a keybinding.
#[derive(Debug, thiserror::Error)]
pub enum HyprlandKeybindError {
    #[error("hyprland IPC error: {0}")]
    Ipc(String),
    #[error("no keybinding registered as {0:?}")]
    Unknown(String),
}

impl From<SocketError> for HyprlandKeybindError {
    fn from(e: SocketError) -> Self {
        HyprlandKeybindError::Ipc(e.to_string())
    }
}

impl HyprlandKeybindings {
    pub fn new() -> Self {
        Self::default()
    }
}

fn bind_args(binding: &KeyBinding) -> String {
    format!("bind {},{},exec,{}", binding.mods, binding.key, binding.command)
}

fn unbind_args(binding: &KeyBinding) -> String {
    format!("unbind {},{}", binding.mods, binding.key)
}

impl KeybindingRegistry for HyprlandKeybindings {
    type Error = HyprlandKeybindError;

    fn register(&mut self, name: &str, binding: &KeyBinding) -> Result<(), Self::Error> {
        if let Some(old) = self.bound.remove(name) {
            debug!("replacing keybinding {}", name);
            socket::keyword(&unbind_args(&old))?;
        }
        socket::keyword(&bind_args(binding))?;
        info!("bound {} + {} ({})", binding.mods, binding.key, name);
        self.bound.insert(name.to_string(), binding.clone());
        Ok(())
    }

    fn unregister(&mut self, name: &str) -> Result<(), Self::Error> {
        let binding = self
            .bound
            .remove(name)
            .ok_or_else(|| HyprlandKeybindError::Unknown(name.to_string()))?;
        socket::keyword(&unbind_args(&binding))?;
        info!("unbound {} + {} ({})", binding.mods, binding.key, name);
        Ok(())
    }
}
