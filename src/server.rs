//! The TCP server: accepts connections and drives each one through the
//! read-dispatch-reply loop described in spec.md §4.6, multiplexed against
//! pub/sub pushes delivered out-of-band through `Hub` and the process-wide
//! shutdown broadcast.

use crate::cmd::{Command, Context};
use crate::connection::Connection;
use crate::db::Db;
use crate::hub::Hub;
use crate::metrics;
use crate::session::Session;
use crate::shutdown::Shutdown;
use crate::utils::resp_ok;
use crate::Frame;

use std::cell::RefCell;
use std::future::Future;
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{broadcast, mpsc, Semaphore};
use tokio::time::{self, Duration};
use tracing::{debug, error, info, instrument};

/// Caps simultaneous connections. spec.md does not bound this; an unbounded
/// accept loop is still a foot-gun worth avoiding.
const MAX_CONNECTIONS: usize = 8192;

struct Listener {
    db: Db,
    hub: Hub,
    listener: TcpListener,
    limit_connections: Arc<Semaphore>,
    notify_shutdown: broadcast::Sender<()>,
    shutdown_complete_rx: mpsc::Receiver<()>,
    shutdown_complete_tx: mpsc::Sender<()>,
}

/// Per-connection state: the session, the socket, and the push channel that
/// lets pub/sub deliveries interleave with client-issued commands.
struct Handler {
    db: Db,
    hub: Hub,
    session: Session,
    connection: Connection,
    shutdown: Shutdown,
    notify_shutdown: broadcast::Sender<()>,
    push_tx: mpsc::UnboundedSender<Frame>,
    push_rx: mpsc::UnboundedReceiver<Frame>,
    _shutdown_complete: mpsc::Sender<()>,
}

enum Event {
    Frame(Option<Frame>),
    Push(Frame),
    Shutdown,
}

/// Runs the server. Accepts connections from `listener` until `shutdown`
/// completes, then waits for every in-flight connection to reach a safe
/// state before returning.
pub async fn run(listener: TcpListener, db: Db, hub: Hub, shutdown: impl Future) {
    let (notify_shutdown, _) = broadcast::channel(1);
    let (shutdown_complete_tx, shutdown_complete_rx) = mpsc::channel(1);

    let mut server = Listener {
        db,
        hub,
        listener,
        limit_connections: Arc::new(Semaphore::new(MAX_CONNECTIONS)),
        notify_shutdown,
        shutdown_complete_tx,
        shutdown_complete_rx,
    };

    tokio::select! {
        res = server.run() => {
            if let Err(err) = res {
                error!(%err, "failed to accept");
            }
        }
        _ = shutdown => {
            info!("shutting down");
        }
    }

    let Listener {
        mut shutdown_complete_rx,
        shutdown_complete_tx,
        notify_shutdown,
        ..
    } = server;

    // Dropping this sends the signal to every subscribed `Shutdown`.
    drop(notify_shutdown);
    drop(shutdown_complete_tx);

    let _ = shutdown_complete_rx.recv().await;
}

impl Listener {
    async fn run(&mut self) -> crate::Result<()> {
        info!("accepting inbound connections");

        loop {
            let permit = self.limit_connections.clone().acquire_owned().await.unwrap();
            let socket = self.accept().await?;
            let conn_id = self.hub.next_conn_id();
            let (push_tx, push_rx) = mpsc::unbounded_channel();

            let mut handler = Handler {
                db: self.db.clone(),
                hub: self.hub.clone(),
                session: Session::new(conn_id),
                connection: Connection::new(socket),
                shutdown: Shutdown::new(self.notify_shutdown.subscribe()),
                notify_shutdown: self.notify_shutdown.clone(),
                push_tx,
                push_rx,
                _shutdown_complete: self.shutdown_complete_tx.clone(),
            };

            tokio::spawn(async move {
                if let Err(err) = handler.run().await {
                    error!(%err, session = handler.session.id, "connection error");
                }
                drop(permit);
            });
        }
    }

    /// Accepts an inbound connection, retrying with exponential backoff on
    /// transient errors (e.g. the process is out of file descriptors). Gives
    /// up and returns an error after the backoff exceeds 64 seconds.
    async fn accept(&mut self) -> crate::Result<TcpStream> {
        let mut backoff = 1;

        loop {
            match self.listener.accept().await {
                Ok((socket, _)) => return Ok(socket),
                Err(err) => {
                    if backoff > 64 {
                        return Err(err.into());
                    }
                    error!(%err, "accept error");
                }
            }

            time::sleep(Duration::from_secs(backoff)).await;
            backoff *= 2;
        }
    }
}

impl Handler {
    /// Processes a single connection until it closes or the server shuts
    /// down. Pipelining (accepting a new request before the prior reply is
    /// written) is not implemented, matching spec.md's single-event-loop
    /// execution model.
    async fn run(&mut self) -> crate::Result<()> {
        metrics::CONNECTED_CLIENTS.inc();
        let result = self.run_inner().await;
        metrics::CONNECTED_CLIENTS.dec();

        let (channels, patterns) = self.hub.drop_connection(self.session.id);
        debug!(
            session = self.session.id,
            dropped_channels = channels.len(),
            dropped_patterns = patterns.len(),
            "connection closed"
        );

        result
    }

    async fn run_inner(&mut self) -> crate::Result<()> {
        loop {
            let event = tokio::select! {
                res = self.connection.read_frame() => Event::Frame(res?),
                Some(frame) = self.push_rx.recv() => Event::Push(frame),
                _ = self.shutdown.recv() => Event::Shutdown,
            };

            match event {
                Event::Shutdown => return Ok(()),
                Event::Push(frame) => self.connection.write_frame(&frame).await?,
                Event::Frame(None) => return Ok(()),
                Event::Frame(Some(frame)) => {
                    if self.handle_frame(frame).await? {
                        return Ok(());
                    }
                }
            }
        }
    }

    /// Dispatches one request frame, writing its reply (or replies, for
    /// `EXEC`) to the connection. Returns `true` if the connection should
    /// close after this (QUIT, or this connection triggered SHUTDOWN).
    #[instrument(skip(self, frame), fields(session = self.session.id))]
    async fn handle_frame(&mut self, frame: Frame) -> crate::Result<bool> {
        let command = match Command::from_frame(frame.clone()) {
            Ok(cmd) => cmd,
            Err(err) => {
                if self.session.in_multi {
                    self.session.multi_dirty = true;
                }
                self.connection
                    .write_frame(&Frame::Error(format!("ERR {err}")))
                    .await?;
                return Ok(false);
            }
        };

        let name = command.get_name().to_string();
        debug!(command = %name, "dispatching");

        if self.session.is_subscribed() && !command.allowed_while_subscribed() {
            self.connection
                .write_frame(&Frame::Error(format!(
                    "ERR Can't execute '{}': only (P)SUBSCRIBE / (P)UNSUBSCRIBE / PING / QUIT are allowed in this context",
                    name.to_lowercase()
                )))
                .await?;
            return Ok(false);
        }

        match command {
            Command::Multi => {
                if self.session.in_multi {
                    self.connection
                        .write_frame(&Frame::Error("ERR MULTI calls can not be nested".into()))
                        .await?;
                } else {
                    self.session.start_multi();
                    self.connection.write_frame(&resp_ok()).await?;
                }
                Ok(false)
            }
            Command::Discard => {
                if !self.session.in_multi {
                    self.connection
                        .write_frame(&Frame::Error("ERR DISCARD without MULTI".into()))
                        .await?;
                } else {
                    self.session.discard_multi();
                    self.connection.write_frame(&resp_ok()).await?;
                }
                Ok(false)
            }
            Command::Exec => {
                if !self.session.in_multi {
                    self.connection
                        .write_frame(&Frame::Error("ERR EXEC without MULTI".into()))
                        .await?;
                } else if self.session.multi_dirty {
                    self.session.discard_multi();
                    self.connection
                        .write_frame(&Frame::Error(
                            "EXECABORT Transaction discarded because of previous errors.".into(),
                        ))
                        .await?;
                } else {
                    let queued = std::mem::take(&mut self.session.queued);
                    self.session.discard_multi();
                    let results = self.apply_batch_locked(queued);
                    self.connection.write_frame(&Frame::Array(results)).await?;
                }
                Ok(false)
            }
            Command::Quit => {
                self.connection.write_frame(&resp_ok()).await?;
                Ok(true)
            }
            Command::Shutdown(_) => {
                let _ = self.notify_shutdown.send(());
                Ok(true)
            }
            other if self.session.in_multi => {
                self.session.queue(frame);
                self.connection
                    .write_frame(&Frame::Simple("QUEUED".into()))
                    .await?;
                Ok(false)
            }
            other => {
                let reply = self.apply_one(other).await;
                self.connection.write_frame(&reply).await?;
                Ok(false)
            }
        }
    }

    async fn apply_one(&mut self, command: Command) -> Frame {
        let name = command.get_name().to_string();
        let mut ctx = Context::new(&self.db, &self.hub, &mut self.session, &self.push_tx);
        let reply = command.apply(&mut ctx);

        metrics::COMMANDS_PROCESSED.inc();
        if matches!(reply, Frame::Error(_)) {
            metrics::COMMAND_ERRORS.with_label_values(&[&name]).inc();
        }
        reply
    }

    /// Applies a whole `EXEC` queue under a single `KeyspaceGuard`, so no
    /// other connection's command can interleave between two commands of the
    /// same transaction (spec.md §4.3 "EXEC runs the queue atomically").
    /// Parsing errors for an individual queued command still only fail that
    /// one reply slot, matching the non-locked behavior.
    fn apply_batch_locked(&mut self, queued: Vec<crate::session::QueuedCommand>) -> Vec<Frame> {
        let guard = RefCell::new(self.db.lock());
        let mut ctx = Context::with_held_lock(&self.db, &self.hub, &mut self.session, &self.push_tx, &guard);
        let mut results = Vec::with_capacity(queued.len());

        for queued_cmd in queued {
            let reply = match Command::from_frame(queued_cmd.frame) {
                Ok(cmd) => {
                    let name = cmd.get_name().to_string();
                    let reply = cmd.apply(&mut ctx);
                    metrics::COMMANDS_PROCESSED.inc();
                    if matches!(reply, Frame::Error(_)) {
                        metrics::COMMAND_ERRORS.with_label_values(&[&name]).inc();
                    }
                    reply
                }
                Err(err) => Frame::Error(format!("ERR {err}")),
            };
            results.push(reply);
        }

        results
    }
}
