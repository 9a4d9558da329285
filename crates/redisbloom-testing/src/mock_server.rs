//! Scriptable in-process RESP server.

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use parking_lot::Mutex;
use redisbloom_codec::RespStream;
use resp_protocol::Value;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::emulator::Emulator;
use crate::error::TestingError;

/// What the server does with one request.
#[derive(Debug, Clone)]
pub enum Reply {
    /// Send this value.
    Value(Value),
    /// Wait, then send this value.
    Delayed(Duration, Value),
    /// Close the connection without replying.
    Disconnect,
}

/// Upper bound on the synchronization helpers.
const SYNC_TIMEOUT: Duration = Duration::from_secs(5);

/// Request hook. Returning `None` falls through to the built-in behavior.
pub type Handler = Arc<dyn Fn(&[String]) -> Option<Reply> + Send + Sync>;

struct Shared {
    username: Option<String>,
    password: Option<String>,
    handler: Option<Handler>,
    emulator: Mutex<Emulator>,
    accepted: watch::Sender<usize>,
    active: watch::Sender<usize>,
    commands: AtomicUsize,
    kill: watch::Sender<u64>,
}

/// Builder for [`MockServer`].
#[derive(Default)]
pub struct MockServerBuilder {
    username: Option<String>,
    password: Option<String>,
    handler: Option<Handler>,
}

impl MockServerBuilder {
    /// Require `AUTH <password>` before any other command.
    #[must_use]
    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    /// Require `AUTH <username> <password>` before any other command.
    #[must_use]
    pub fn acl(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    /// Intercept requests before the built-in command handling.
    #[must_use]
    pub fn handler<F>(mut self, handler: F) -> Self
    where
        F: Fn(&[String]) -> Option<Reply> + Send + Sync + 'static,
    {
        self.handler = Some(Arc::new(handler));
        self
    }

    /// Bind to an ephemeral localhost port and start accepting connections.
    pub async fn start(self) -> Result<MockServer, TestingError> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let (kill, _) = watch::channel(0);
        let shared = Arc::new(Shared {
            username: self.username,
            password: self.password,
            handler: self.handler,
            emulator: Mutex::new(Emulator::new()),
            accepted: watch::Sender::new(0),
            active: watch::Sender::new(0),
            commands: AtomicUsize::new(0),
            kill,
        });

        let accept_shared = Arc::clone(&shared);
        let accept_task = tokio::spawn(async move {
            while let Ok((tcp, peer)) = listener.accept().await {
                // Subscribe before counting so a `drop_connections` that
                // observes this connection also reaches it.
                let kill = accept_shared.kill.subscribe();
                accept_shared.active.send_modify(|n| *n += 1);
                accept_shared.accepted.send_modify(|n| *n += 1);
                tracing::trace!(%peer, "mock server accepted connection");
                tokio::spawn(serve(Arc::clone(&accept_shared), tcp, kill));
            }
        });

        tracing::debug!(%addr, "mock server listening");
        Ok(MockServer {
            addr,
            shared,
            accept_task,
        })
    }
}

/// A RESP server on localhost that emulates the RedisBloom commands.
///
/// `PING` and `AUTH` are handled natively. Everything else goes to the
/// optional [`Handler`] first and then to an in-memory emulator of the
/// `BF.*` and `TOPK.*` commands. The server stops when dropped.
pub struct MockServer {
    addr: SocketAddr,
    shared: Arc<Shared>,
    accept_task: JoinHandle<()>,
}

impl MockServer {
    /// Create a builder.
    #[must_use]
    pub fn builder() -> MockServerBuilder {
        MockServerBuilder::default()
    }

    /// Start a server with no password and no handler.
    pub async fn start() -> Result<Self, TestingError> {
        Self::builder().start().await
    }

    /// Bound socket address.
    #[must_use]
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Bound address as `host:port`.
    #[must_use]
    pub fn address(&self) -> String {
        self.addr.to_string()
    }

    /// Total connections accepted since start.
    ///
    /// A client's connect can complete before the server has accepted the
    /// socket. Use [`wait_for_connections`](Self::wait_for_connections)
    /// before asserting on this after connects that sent no command.
    #[must_use]
    pub fn connections_accepted(&self) -> usize {
        *self.shared.accepted.borrow()
    }

    /// Wait until at least `count` connections have been accepted.
    pub async fn wait_for_connections(&self, count: usize) -> Result<(), TestingError> {
        let mut accepted = self.shared.accepted.subscribe();
        tokio::time::timeout(SYNC_TIMEOUT, accepted.wait_for(|&n| n >= count))
            .await
            .map_err(|_| TestingError::Timeout("accepted connections"))?
            .map_err(|_| TestingError::Timeout("accepted connections"))?;
        Ok(())
    }

    /// Connections currently open.
    #[must_use]
    pub fn active_connections(&self) -> usize {
        *self.shared.active.borrow()
    }

    /// Requests received since start, including `AUTH` and `PING`.
    #[must_use]
    pub fn commands_received(&self) -> usize {
        self.shared.commands.load(Ordering::SeqCst)
    }

    /// Close every accepted connection and wait until all of them are gone.
    ///
    /// New connections are still accepted afterwards. A connection in the
    /// middle of a [`Reply::Delayed`] closes once its delay ends.
    pub async fn drop_connections(&self) -> Result<(), TestingError> {
        self.shared.kill.send_modify(|generation| *generation += 1);
        let mut active = self.shared.active.subscribe();
        tokio::time::timeout(SYNC_TIMEOUT, active.wait_for(|&n| n == 0))
            .await
            .map_err(|_| TestingError::Timeout("connections to close"))?
            .map_err(|_| TestingError::Timeout("connections to close"))?;
        Ok(())
    }
}

impl Drop for MockServer {
    fn drop(&mut self) {
        self.accept_task.abort();
        self.shared.kill.send_modify(|generation| *generation += 1);
    }
}

impl std::fmt::Debug for MockServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockServer")
            .field("addr", &self.addr)
            .field("active_connections", &self.active_connections())
            .finish()
    }
}

async fn serve(shared: Arc<Shared>, tcp: TcpStream, mut kill: watch::Receiver<u64>) {
    let mut stream = RespStream::new(tcp);
    let mut authenticated = shared.password.is_none();

    loop {
        let request = tokio::select! {
            request = stream.next() => request,
            _ = kill.changed() => break,
        };
        let request = match request {
            Some(Ok(value)) => value,
            None => break,
            Some(Err(e)) => {
                tracing::trace!(error = %e, "mock server connection ended");
                break;
            }
        };
        shared.commands.fetch_add(1, Ordering::SeqCst);

        let reply = match request_args(request) {
            Some(args) => shared.dispatch(&args, &mut authenticated),
            None => Reply::Value(Value::error("ERR Protocol error: expected array of bulk strings")),
        };
        let value = match reply {
            Reply::Value(value) => value,
            Reply::Delayed(delay, value) => {
                tokio::time::sleep(delay).await;
                value
            }
            Reply::Disconnect => break,
        };
        if stream.send(value).await.is_err() {
            break;
        }
    }

    drop(stream);
    shared.active.send_modify(|n| *n -= 1);
}

fn request_args(request: Value) -> Option<Vec<String>> {
    let Value::Array(items) = request else {
        return None;
    };
    items
        .into_iter()
        .map(|item| match item {
            Value::Bulk(bytes) => Some(String::from_utf8_lossy(&bytes).into_owned()),
            _ => None,
        })
        .collect()
}

impl Shared {
    fn dispatch(&self, args: &[String], authenticated: &mut bool) -> Reply {
        let name = args.first().map(|n| n.to_uppercase()).unwrap_or_default();

        if name == "AUTH" {
            return Reply::Value(self.auth(&args[1..], authenticated));
        }
        if !*authenticated {
            return Reply::Value(Value::error("NOAUTH Authentication required."));
        }
        if let Some(reply) = self.handler.as_ref().and_then(|h| h(args)) {
            return reply;
        }
        if name == "PING" {
            return Reply::Value(Value::simple("PONG"));
        }
        Reply::Value(self.emulator.lock().apply(args))
    }

    fn auth(&self, args: &[String], authenticated: &mut bool) -> Value {
        let Some(expected) = &self.password else {
            return Value::error(
                "ERR AUTH <password> called without any password configured for the default user.",
            );
        };
        let accepted = match args {
            [password] => self.username.is_none() && password == expected,
            [username, password] => {
                let user_ok = match &self.username {
                    Some(u) => username == u,
                    None => username == "default",
                };
                user_ok && password == expected
            }
            _ => return Value::error("ERR wrong number of arguments for 'auth' command"),
        };
        if accepted {
            *authenticated = true;
            Value::ok()
        } else {
            Value::error("WRONGPASS invalid username-password pair or user is disabled.")
        }
    }
}
