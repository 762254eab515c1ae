//! Client side of the command socket.
//!
//! Used by `moover trigger` (the command the compositor runs when the
//! global keybinding fires) and the other one-shot subcommands.

use crate::command::Command;
use std::io::{BufRead, BufReader, Write};
use std::os::unix::net::UnixStream;
use std::path::{Path, PathBuf};

/// Errors from sending a command to the daemon.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("cannot reach daemon at {0}: {1}")]
    Connect(PathBuf, std::io::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json encode error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("daemon rejected command: {0}")]
    Rejected(String),
    #[error("daemon closed the connection without replying")]
    NoReply,
}

/// Send one command and wait for the daemon's reply line.
pub fn send(path: &Path, cmd: &Command) -> Result<(), ClientError> {
    let mut stream =
        UnixStream::connect(path).map_err(|e| ClientError::Connect(path.to_path_buf(), e))?;

    let line = serde_json::to_string(cmd)?;
    writeln!(stream, "{}", line)?;
    stream.shutdown(std::net::Shutdown::Write)?;

    let mut reply = String::new();
    BufReader::new(stream).read_line(&mut reply)?;
    match reply.trim() {
        "ok" => Ok(()),
        "" => Err(ClientError::NoReply),
        other => Err(ClientError::Rejected(other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::KeyPress;
    use crate::ipc::listener::UnixSocketListener;
    use crate::traits::CommandSource;
    use std::sync::mpsc;
    use std::time::Duration;

    fn tmp_socket_path(tag: &str) -> PathBuf {
        std::env::temp_dir().join(format!("moover-client-{}-{}.sock", tag, std::process::id()))
    }

    #[test]
    fn send_reaches_listener() {
        let path = tmp_socket_path("send");
        let (tx, rx) = mpsc::channel();
        let listen_path = path.clone();
        let handle = std::thread::spawn(move || UnixSocketListener::new(&listen_path).run(tx));
        std::thread::sleep(Duration::from_millis(150));

        send(&path, &Command::Trigger).unwrap();
        send(&path, &Command::Key(KeyPress::Char(' '))).unwrap();
        send(&path, &Command::Disable).unwrap();
        assert!(handle.join().unwrap().is_ok());

        let cmds: Vec<Command> = rx.try_iter().collect();
        assert_eq!(
            cmds,
            vec![
                Command::Trigger,
                Command::Key(KeyPress::Char(' ')),
                Command::Disable,
            ]
        );
    }

    #[test]
    fn missing_daemon_is_a_connect_error() {
        let path = tmp_socket_path("missing");
        let _ = std::fs::remove_file(&path);
        let err = send(&path, &Command::Trigger).unwrap_err();
        assert!(matches!(err, ClientError::Connect(_, _)));
    }
}
