//! Direct access to Hyprland's command socket.
//!
//! Every request is one short-lived connection: write the command, then read
//! until Hyprland closes the stream.  No child processes are spawned.

use std::io::{self, Read, Write};
use std::os::unix::net::UnixStream;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub(crate) enum SocketError {
    #[error("{0} not set, is Hyprland running?")]
    MissingEnv(&'static str),
    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("reply is not utf-8")]
    Encoding,
    #[error("{what} rejected: {reply}")]
    Rejected { what: &'static str, reply: String },
}

fn env(name: &'static str) -> Result<String, SocketError> {
    std::env::var(name).map_err(|_| SocketError::MissingEnv(name))
}

/// `$XDG_RUNTIME_DIR/hypr/$HYPRLAND_INSTANCE_SIGNATURE/.socket.sock`
fn socket_path() -> Result<PathBuf, SocketError> {
    let mut path = PathBuf::from(env("XDG_RUNTIME_DIR")?);
    path.push("hypr");
    path.push(env("HYPRLAND_INSTANCE_SIGNATURE")?);
    path.push(".socket.sock");
    Ok(path)
}

/// Send one raw command and return Hyprland's reply.
pub(crate) fn request(command: &str) -> Result<String, SocketError> {
    let path = socket_path()?;
    let exchange = |path: &PathBuf| -> io::Result<Vec<u8>> {
        let mut stream = UnixStream::connect(path)?;
        stream.write_all(command.as_bytes())?;
        let mut reply = Vec::new();
        stream.read_to_end(&mut reply)?;
        Ok(reply)
    };
    let reply = exchange(&path).map_err(|source| SocketError::Io { path, source })?;
    String::from_utf8(reply).map_err(|_| SocketError::Encoding)
}

/// Data query (`j/<command>`); returns the raw JSON.
pub(crate) fn json(data_command: &str) -> Result<String, SocketError> {
    request(&format!("j/{}", data_command))
}

/// Accept a reply that is exactly `ok`.
pub(crate) fn expect_ok(what: &'static str, reply: &str) -> Result<(), SocketError> {
    match reply.trim() {
        "ok" => Ok(()),
        other => Err(SocketError::Rejected {
            what,
            reply: other.to_string(),
        }),
    }
}

pub(crate) fn dispatch(args: &str) -> Result<(), SocketError> {
    expect_ok("dispatch", &request(&format!("/dispatch {}", args))?)
}

/// Runtime config change, e.g. `keyword bind SUPER,M,exec,...`.
pub(crate) fn keyword(args: &str) -> Result<(), SocketError> {
    expect_ok("keyword", &request(&format!("/keyword {}", args))?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ok_reply_accepted() {
        assert!(expect_ok("dispatch", "ok").is_ok());
        assert!(expect_ok("dispatch", "ok\n").is_ok());
    }

    #[test]
    fn error_reply_carries_message() {
        let err = expect_ok("keyword", "Invalid dispatcher\n").unwrap_err();
        assert_eq!(err.to_string(), "keyword rejected: Invalid dispatcher");
    }

    #[test]
    fn missing_env_names_the_variable() {
        let err = SocketError::MissingEnv("HYPRLAND_INSTANCE_SIGNATURE");
        assert!(err.to_string().starts_with("HYPRLAND_INSTANCE_SIGNATURE not set"));
    }
}
