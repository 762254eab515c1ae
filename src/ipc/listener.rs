//! Unix-socket [`CommandSource`] implementation.
//!
//! Binds a Unix stream socket and accepts one connection at a time.
//! Each line received is parsed as a JSON-encoded [`Command`] and answered
//! with a single reply line: `ok`, or `error: <reason>` for lines that do
//! not parse.
//!
//! # Wire format
//!
//! Every message is a single line of JSON followed by `\n`:
//!
//! ```json
//! "Trigger"
//! {"Key":"q"}
//! {"Key":"Escape"}
//! "Disable"
//! ```
//!
//! After forwarding `"Disable"` the listener removes its socket file and
//! returns, so the daemon can shut down once every source is gone.

use crate::command::Command;
use crate::traits::CommandSource;
use log::{debug, error, info, warn};
use std::io::{BufRead, BufReader, Write};
use std::os::unix::net::{UnixListener, UnixStream};
use std::path::{Path, PathBuf};
use std::sync::mpsc;

/// A [`CommandSource`] that listens on a Unix stream socket for
/// JSON-encoded commands.
///
/// Each accepted connection can send multiple newline-delimited JSON
/// commands.  When the connection closes, the listener waits for the
/// next one.
pub struct UnixSocketListener {
    path: PathBuf,
    bound: Option<UnixListener>,
}

/// Errors produced by the Unix socket listener.
#[derive(Debug, thiserror::Error)]
pub enum UnixSocketError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("{0} is in use by another daemon")]
    InUse(PathBuf),
}

/// What the accept loop does after a client disconnects.
#[derive(Debug, PartialEq, Eq)]
enum Flow {
    Continue,
    Stop,
}

impl UnixSocketListener {
    /// Create a new listener bound to `path`.
    ///
    /// The socket file is created by [`claim`](Self::claim), or lazily when
    /// [`run`](CommandSource::run) is called, and removed when the source
    /// shuts down.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            bound: None,
        }
    }

    /// Bind the socket now, failing with [`UnixSocketError::InUse`] when a
    /// live daemon already owns it.
    ///
    /// The daemon calls this before registering anything with the compositor.
    pub fn claim(path: impl AsRef<Path>) -> Result<Self, UnixSocketError> {
        let mut source = Self::new(path);
        source.bind()?;
        Ok(source)
    }

    fn bind(&mut self) -> Result<(), UnixSocketError> {
        if self.bound.is_some() {
            return Ok(());
        }
        // A socket that still accepts connections belongs to a live daemon;
        // anything else left on disk is stale.
        if UnixStream::connect(&self.path).is_ok() {
            return Err(UnixSocketError::InUse(self.path.clone()));
        }
        let _ = std::fs::remove_file(&self.path);

        self.bound = Some(UnixListener::bind(&self.path)?);
        info!("listening on {}", self.path.display());
        Ok(())
    }

    /// The filesystem path of the socket.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn serve(&self, listener: &UnixListener, sink: &mpsc::Sender<Command>) {
        for stream in listener.incoming() {
            match stream {
                Ok(stream) => {
                    debug!("client connected");
                    match handle_client(stream, sink) {
                        Ok(Flow::Continue) => debug!("client disconnected"),
                        Ok(Flow::Stop) => return,
                        Err(e) => error!("client error: {}", e),
                    }
                }
                Err(e) => {
                    error!("accept error: {}", e);
                }
            }
        }
    }
}

/// Read commands from one client until it hangs up.
fn handle_client(stream: UnixStream, sink: &mpsc::Sender<Command>) -> Result<Flow, UnixSocketError> {
    let mut replies = stream.try_clone()?;
    let reader = BufReader::new(stream);
    for line in reader.lines() {
        let text = line?;
        let text = text.trim();
        if text.is_empty() {
            continue;
        }
        match serde_json::from_str::<Command>(text) {
            Ok(cmd) => {
                debug!("received {:?}", cmd);
                let last = cmd == Command::Disable;
                if sink.send(cmd).is_err() {
                    info!("sink closed, shutting down");
                    return Ok(Flow::Stop);
                }
                reply(&mut replies, "ok");
                if last {
                    info!("disable received, closing socket");
                    return Ok(Flow::Stop);
                }
            }
            Err(e) => {
                error!("bad command: {} ({})", text, e);
                reply(&mut replies, &format!("error: {}", e));
            }
        }
    }
    Ok(Flow::Continue)
}

/// Best-effort reply; clients are free to hang up without reading it.
fn reply(stream: &mut UnixStream, msg: &str) {
    if let Err(e) = writeln!(stream, "{}", msg) {
        debug!("reply dropped: {}", e);
    }
}

impl CommandSource for UnixSocketListener {
    type Error = UnixSocketError;

    /// Bind the socket and start accepting connections.
    ///
    /// This method **blocks** until a `Disable` command arrives or the sink
    /// is dropped.  Run it on a dedicated thread.
    fn run(&mut self, sink: mpsc::Sender<Command>) -> Result<(), Self::Error> {
        self.bind()?;
        if let Some(listener) = self.bound.take() {
            self.serve(&listener, &sink);
        }

        if let Err(e) = std::fs::remove_file(&self.path) {
            warn!("could not remove {}: {}", self.path.display(), e);
        }
        Ok(())
    }
}

//  Tests

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::KeyPress;
    use std::io::Read;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    /// Monotonic counter to generate unique socket paths per test.
    static TEST_ID: AtomicU32 = AtomicU32::new(0);

    /// Helper: create a unique temporary socket path for each test.
    fn tmp_socket_path() -> PathBuf {
        let id = TEST_ID.fetch_add(1, Ordering::SeqCst);
        let dir = std::env::temp_dir();
        dir.join(format!("moover-test-{}-{}.sock", std::process::id(), id))
    }

    fn spawn_listener(path: &Path) -> (std::thread::JoinHandle<Result<(), UnixSocketError>>, mpsc::Receiver<Command>) {
        let (tx, rx) = mpsc::channel();
        let path = path.to_path_buf();
        let handle = std::thread::spawn(move || UnixSocketListener::new(&path).run(tx));
        // Give the listener a moment to bind.
        std::thread::sleep(Duration::from_millis(150));
        (handle, rx)
    }

    /// Send raw lines, half-close, and return everything the daemon replied.
    fn exchange(path: &Path, lines: &[&str]) -> String {
        let mut stream = UnixStream::connect(path).expect("connect");
        for line in lines {
            writeln!(stream, "{}", line).unwrap();
        }
        stream.shutdown(std::net::Shutdown::Write).unwrap();
        let mut replies = String::new();
        stream.read_to_string(&mut replies).unwrap();
        replies
    }

    #[test]
    fn commands_arrive_in_order() {
        let path = tmp_socket_path();
        let (_handle, rx) = spawn_listener(&path);

        let replies = exchange(&path, &[r#""Trigger""#, r#"{"Key":"c"}"#, r#"{"Key":"Escape"}"#]);
        assert_eq!(replies, "ok\nok\nok\n");

        let cmds: Vec<Command> = rx.try_iter().collect();
        assert_eq!(cmds.len(), 3);
        assert_eq!(cmds[0], Command::Trigger);
        assert_eq!(cmds[1], Command::Key(KeyPress::Char('c')));
        assert_eq!(cmds[2], Command::Key(KeyPress::Escape));

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn malformed_json_does_not_crash() {
        let path = tmp_socket_path();
        let (_handle, rx) = spawn_listener(&path);

        let replies = exchange(&path, &["not json at all", r#"{"Key":""}"#, "", r#""Trigger""#]);
        let lines: Vec<&str> = replies.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("error:"));
        assert!(lines[1].starts_with("error:"));
        assert_eq!(lines[2], "ok");

        // Only the valid command should have arrived.
        let cmds: Vec<Command> = rx.try_iter().collect();
        assert_eq!(cmds, vec![Command::Trigger]);

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn disable_stops_listener_and_removes_socket() {
        let path = tmp_socket_path();
        let (handle, rx) = spawn_listener(&path);

        let replies = exchange(&path, &[r#""Disable""#]);
        assert_eq!(replies, "ok\n");
        assert!(handle.join().unwrap().is_ok());
        assert_eq!(rx.try_iter().collect::<Vec<_>>(), vec![Command::Disable]);
        assert!(!path.exists());
    }

    #[test]
    fn second_listener_refuses_live_socket() {
        let path = tmp_socket_path();
        let (_handle, _rx) = spawn_listener(&path);

        let (tx, _rx2) = mpsc::channel();
        let err = UnixSocketListener::new(&path).run(tx).unwrap_err();
        assert!(matches!(err, UnixSocketError::InUse(_)));

        let _ = exchange(&path, &[r#""Disable""#]);
    }

    #[test]
    fn claim_refuses_live_socket_and_leaves_it_alone() {
        let path = tmp_socket_path();
        let (_handle, rx) = spawn_listener(&path);

        assert!(matches!(
            UnixSocketListener::claim(&path),
            Err(UnixSocketError::InUse(_))
        ));

        // The first daemon still owns and serves the socket.
        assert_eq!(exchange(&path, &[r#""Trigger""#]), "ok\n");
        assert_eq!(rx.try_iter().collect::<Vec<_>>(), vec![Command::Trigger]);

        let _ = exchange(&path, &[r#""Disable""#]);
    }

    #[test]
    fn claimed_socket_accepts_before_run() {
        let path = tmp_socket_path();
        let mut source = UnixSocketListener::claim(&path).unwrap();
        assert!(path.exists());

        // Connections queue in the backlog until the loop starts.
        let client = {
            let path = path.clone();
            std::thread::spawn(move || exchange(&path, &[r#""Disable""#]))
        };
        let (tx, rx) = mpsc::channel();
        source.run(tx).unwrap();

        assert_eq!(client.join().unwrap(), "ok\n");
        assert_eq!(rx.try_iter().collect::<Vec<_>>(), vec![Command::Disable]);
        assert!(!path.exists());
    }

    #[test]
    fn stale_socket_file_is_replaced() {
        let path = tmp_socket_path();
        std::fs::write(&path, b"").unwrap();
        let (_handle, rx) = spawn_listener(&path);

        exchange(&path, &[r#""Trigger""#]);
        assert_eq!(rx.try_iter().collect::<Vec<_>>(), vec![Command::Trigger]);

        let _ = exchange(&path, &[r#""Disable""#]);
    }
}
