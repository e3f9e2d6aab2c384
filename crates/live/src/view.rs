use std::sync::Arc;
use std::time::Duration;

use brokerdesk_client::ClientConfig;
use brokerdesk_core::{ApiError, LiveError, LiveFeed, LiveMessage};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use crate::channel::WsChannel;
use crate::retry::ManagedRetry;

/// How long `dispose` waits for the background task to close the socket
/// before aborting it.
const DISPOSE_GRACE: Duration = Duration::from_secs(2);

// ---------------------------------------------------------------------------
// Configuration & observable state
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiveViewConfig {
    /// WebSocket root such as `ws://host:8000`; the feed's path is appended.
    pub ws_base_url: String,
    pub poll_interval: Duration,
    pub reconnect_delay: Duration,
}

impl LiveViewConfig {
    pub fn from_client_config(config: &ClientConfig) -> Result<Self, ApiError> {
        Ok(Self {
            ws_base_url: config.ws_base_url()?,
            poll_interval: config.poll_interval(),
            reconnect_delay: config.reconnect_delay(),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    Connecting,
    Connected,
    /// Socket lost, a reconnect is scheduled.
    Reconnecting,
    /// No socket and none scheduled (hidden, disposed, or not started).
    Disconnected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Control {
    visible: bool,
    disposed: bool,
}

// ---------------------------------------------------------------------------
// Live view
// ---------------------------------------------------------------------------

/// View-model that keeps a feed's state fresh.
///
/// After [`start`](Self::start) a single background task polls REST every
/// `poll_interval` and holds at most one WebSocket open. Subscribers are
/// woken only when a fetch or a push message actually changed the state.
/// Dropping the view disposes it.
pub struct LiveView<F: LiveFeed> {
    feed: Arc<F>,
    config: LiveViewConfig,
    state_tx: watch::Sender<F::State>,
    connection_tx: watch::Sender<ConnectionState>,
    control_tx: watch::Sender<Control>,
    task: Option<JoinHandle<()>>,
}

impl<F: LiveFeed> LiveView<F> {
    pub fn new(feed: F, config: LiveViewConfig) -> Self {
        let (state_tx, _) = watch::channel(F::State::default());
        let (connection_tx, _) = watch::channel(ConnectionState::Disconnected);
        let (control_tx, _) = watch::channel(Control {
            visible: true,
            disposed: false,
        });
        Self {
            feed: Arc::new(feed),
            config,
            state_tx,
            connection_tx,
            control_tx,
            task: None,
        }
    }

    pub fn feed(&self) -> &F {
        &self.feed
    }

    /// Load the initial state over REST, then start polling and the
    /// WebSocket subscription. Calling it again while running is a no-op.
    pub async fn start(&mut self) -> Result<(), ApiError> {
        if self.task.is_some() {
            return Ok(());
        }
        if self.is_disposed() {
            return Err(ApiError::Config(format!(
                "{} view was disposed",
                self.feed.name()
            )));
        }

        let fresh = self.feed.fetch().await?;
        let feed = Arc::clone(&self.feed);
        self.state_tx
            .send_if_modified(|state| feed.merge_fetched(state, fresh));
        info!(feed = self.feed.name(), "Live view started");

        let worker = Worker {
            feed: Arc::clone(&self.feed),
            url: format!("{}{}", self.config.ws_base_url, self.feed.ws_path()),
            config: self.config.clone(),
            state_tx: self.state_tx.clone(),
            connection_tx: self.connection_tx.clone(),
            control_rx: self.control_tx.subscribe(),
        };
        self.task = Some(tokio::spawn(worker.run()));
        Ok(())
    }

    /// Receiver that is notified on every published change.
    pub fn subscribe(&self) -> watch::Receiver<F::State> {
        self.state_tx.subscribe()
    }

    pub fn state(&self) -> F::State {
        self.state_tx.borrow().clone()
    }

    pub fn connection(&self) -> watch::Receiver<ConnectionState> {
        self.connection_tx.subscribe()
    }

    pub fn connection_state(&self) -> ConnectionState {
        *self.connection_tx.borrow()
    }

    /// Hiding a visibility-gated view stops reconnection; showing it
    /// reconnects right away when the socket is down.
    pub fn set_visible(&self, visible: bool) {
        self.control_tx.send_if_modified(|control| {
            if control.visible == visible {
                false
            } else {
                control.visible = visible;
                true
            }
        });
    }

    pub fn is_visible(&self) -> bool {
        self.control_tx.borrow().visible
    }

    pub fn is_disposed(&self) -> bool {
        self.control_tx.borrow().disposed
    }

    /// Close the socket, cancel any pending reconnect and stop polling.
    pub async fn dispose(&mut self) {
        self.signal_dispose();
        if let Some(mut task) = self.task.take() {
            if tokio::time::timeout(DISPOSE_GRACE, &mut task).await.is_err() {
                warn!(feed = self.feed.name(), "Live view task did not stop, aborting");
                task.abort();
            }
        }
        self.connection_tx.send_replace(ConnectionState::Disconnected);
    }

    fn signal_dispose(&self) {
        self.control_tx.send_if_modified(|control| {
            let changed = !control.disposed;
            control.disposed = true;
            changed
        });
    }
}

impl<F: LiveFeed> Drop for LiveView<F> {
    fn drop(&mut self) {
        self.signal_dispose();
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

// ---------------------------------------------------------------------------
// Background task
// ---------------------------------------------------------------------------

struct Worker<F: LiveFeed> {
    feed: Arc<F>,
    url: String,
    config: LiveViewConfig,
    state_tx: watch::Sender<F::State>,
    connection_tx: watch::Sender<ConnectionState>,
    control_rx: watch::Receiver<Control>,
}

async fn next_on(channel: &mut Option<WsChannel>) -> Result<LiveMessage, LiveError> {
    match channel {
        Some(channel) => channel.next_message().await,
        None => std::future::pending().await,
    }
}

impl<F: LiveFeed> Worker<F> {
    fn set_connection(&self, state: ConnectionState) {
        self.connection_tx.send_if_modified(|current| {
            if *current == state {
                false
            } else {
                *current = state;
                true
            }
        });
    }

    fn may_connect(&self, control: Control) -> bool {
        !control.disposed && (control.visible || !self.feed.requires_visibility())
    }

    async fn run(mut self) {
        let name = self.feed.name().to_string();
        let mut retry = ManagedRetry::new(self.config.reconnect_delay);
        let period = self.config.poll_interval.max(Duration::from_millis(1));
        let mut poll = interval_at(Instant::now() + period, period);
        poll.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut channel: Option<WsChannel> = None;
        let mut connect_now = true;

        loop {
            let control = *self.control_rx.borrow_and_update();
            if control.disposed {
                break;
            }

            if channel.is_none() && connect_now && self.may_connect(control) {
                connect_now = false;
                self.set_connection(ConnectionState::Connecting);

                let attempt = tokio::select! {
                    changed = self.control_rx.changed() => {
                        if changed.is_err() {
                            break;
                        }
                        // Re-evaluate visibility / disposal, then try again.
                        connect_now = true;
                        continue;
                    }
                    attempt = WsChannel::connect(&self.url) => attempt,
                };

                match attempt {
                    Ok(opened) => {
                        retry.cancel();
                        channel = Some(opened);
                        self.set_connection(ConnectionState::Connected);
                    }
                    Err(e) => {
                        warn!(feed = %name, error = %e, "WebSocket connect failed");
                        retry.schedule();
                        self.set_connection(ConnectionState::Reconnecting);
                    }
                }
                continue;
            }

            tokio::select! {
                changed = self.control_rx.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let control = *self.control_rx.borrow();
                    if !self.may_connect(control) {
                        retry.cancel();
                        if channel.is_none() {
                            self.set_connection(ConnectionState::Disconnected);
                        }
                    } else if channel.is_none() {
                        debug!(feed = %name, "View visible again, reconnecting");
                        retry.cancel();
                        connect_now = true;
                    }
                }

                _ = poll.tick() => {
                    match self.feed.fetch().await {
                        Ok(fresh) => {
                            let feed = &self.feed;
                            self.state_tx
                                .send_if_modified(|state| feed.merge_fetched(state, fresh));
                        }
                        Err(e) if e.is_transient() => {
                            warn!(feed = %name, error = %e, "Refresh failed, will retry next poll");
                        }
                        Err(e) => {
                            error!(feed = %name, error = %e, "Refresh failed");
                        }
                    }
                }

                message = next_on(&mut channel) => {
                    match message {
                        Ok(message) => {
                            let feed = &self.feed;
                            self.state_tx
                                .send_if_modified(|state| feed.reconcile(state, message));
                        }
                        Err(e) => {
                            debug!(feed = %name, error = %e, "WebSocket lost");
                            channel = None;
                            if self.may_connect(*self.control_rx.borrow()) {
                                retry.schedule();
                                self.set_connection(ConnectionState::Reconnecting);
                            } else {
                                self.set_connection(ConnectionState::Disconnected);
                            }
                        }
                    }
                }

                _ = retry.fired() => {
                    debug!(feed = %name, delay = ?retry.delay(), "Reconnecting");
                    connect_now = true;
                }
            }
        }

        retry.cancel();
        if let Some(open) = channel.take() {
            open.close().await;
        }
        self.set_connection(ConnectionState::Disconnected);
        info!(feed = %name, "Live view stopped");
    }
}
