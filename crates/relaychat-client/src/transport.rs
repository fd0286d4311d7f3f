//! Websocket transport for the client.
//!
//! Provides [`Channel`], a handle to a spawned task that owns the
//! connection to the relay. This is a thin layer that encodes/decodes
//! envelopes and keeps the connection alive; session logic stays in the
//! Sans-IO [`crate::Session`].
//!
//! The task reconnects forever: a failed connect or a lost connection
//! enters a capped exponential backoff loop rather than surfacing an error
//! to callers. [`ChannelNotice::Connecting`] precedes every attempt;
//! [`ChannelNotice::Up`] and [`ChannelNotice::Down`] are level-triggered
//! state signals, not edge counts. Envelopes submitted
//! while the connection is down are dropped; their acknowledgments simply
//! never resolve.

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use relaychat_proto::Envelope;
use tokio::{net::TcpStream, sync::mpsc};
use tokio_tungstenite::{
    MaybeTlsStream, WebSocketStream, connect_async, tungstenite::Message,
};

/// Notices delivered from the channel task, in network order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelNotice {
    /// A connection attempt is starting (initial connect or reconnect).
    Connecting,
    /// The connection is established (initial connect or reconnect).
    Up,
    /// The connection was lost; a reconnect attempt is underway.
    Down,
    /// An envelope arrived from the relay.
    Event(Envelope),
}

/// Channel configuration.
#[derive(Debug, Clone)]
pub struct ChannelConfig {
    /// Relay websocket URL, e.g. `ws://127.0.0.1:9000`.
    pub url: String,
    /// First reconnect delay; doubles per consecutive failure.
    pub backoff_base: Duration,
    /// Upper bound on the reconnect delay.
    pub backoff_cap: Duration,
    /// Capacity of the outbound and notice mpsc channels.
    pub capacity: usize,
}

impl ChannelConfig {
    /// Config with default backoff (250ms base, 15s cap).
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            backoff_base: Duration::from_millis(250),
            backoff_cap: Duration::from_secs(15),
            capacity: 32,
        }
    }
}

/// Handle to the connection task.
///
/// Send outgoing envelopes via `to_server`; receive lifecycle notices and
/// inbound envelopes via `notices`. Dropping both halves (or calling
/// [`Channel::stop`]) ends the task.
pub struct Channel {
    /// Outgoing envelopes to the relay.
    pub to_server: mpsc::Sender<Envelope>,
    /// Lifecycle notices and inbound envelopes, in network order.
    pub notices: mpsc::Receiver<ChannelNotice>,
    abort_handle: tokio::task::AbortHandle,
}

impl Channel {
    /// Stop the connection task.
    pub fn stop(&self) {
        self.abort_handle.abort();
    }
}

/// Spawn the connection task for `config`.
///
/// Must be called within a tokio runtime. Connecting is not a fallible
/// call: failures feed the retry loop instead of the caller.
pub fn spawn(config: ChannelConfig) -> Channel {
    let (to_server_tx, to_server_rx) = mpsc::channel::<Envelope>(config.capacity);
    let (notice_tx, notice_rx) = mpsc::channel::<ChannelNotice>(config.capacity);

    let handle = tokio::spawn(run_channel(config, to_server_rx, notice_tx));

    Channel { to_server: to_server_tx, notices: notice_rx, abort_handle: handle.abort_handle() }
}

/// Connect/serve/backoff loop. Runs until the caller goes away.
async fn run_channel(
    config: ChannelConfig,
    mut outgoing: mpsc::Receiver<Envelope>,
    notices: mpsc::Sender<ChannelNotice>,
) {
    let mut failures: u32 = 0;

    loop {
        if notices.send(ChannelNotice::Connecting).await.is_err() {
            return;
        }
        match connect_async(config.url.as_str()).await {
            Ok((stream, _)) => {
                failures = 0;
                tracing::info!(url = %config.url, "channel up");
                if notices.send(ChannelNotice::Up).await.is_err() {
                    return;
                }

                let keep_running = run_connection(stream, &mut outgoing, &notices).await;
                if notices.send(ChannelNotice::Down).await.is_err() || !keep_running {
                    return;
                }
            },
            Err(error) => {
                tracing::warn!(url = %config.url, %error, "connect failed");
            },
        }

        failures += 1;
        let delay = backoff_delay(config.backoff_base, config.backoff_cap, failures);
        tracing::debug!(?delay, failures, "reconnecting after backoff");
        if !drain_during_backoff(&mut outgoing, delay).await {
            return;
        }
    }
}

/// Serve one live connection. Returns `false` when the caller is gone.
async fn run_connection(
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
    outgoing: &mut mpsc::Receiver<Envelope>,
    notices: &mpsc::Sender<ChannelNotice>,
) -> bool {
    let (mut sink, mut source) = stream.split();

    loop {
        tokio::select! {
            outbound = outgoing.recv() => match outbound {
                Some(envelope) => match envelope.encode() {
                    Ok(text) => {
                        if let Err(error) = sink.send(Message::text(text)).await {
                            tracing::warn!(%error, "send failed, connection lost");
                            return true;
                        }
                    },
                    Err(error) => {
                        tracing::warn!(%error, "dropped unencodable envelope");
                    },
                },
                None => return false,
            },
            inbound = source.next() => match inbound {
                Some(Ok(Message::Text(text))) => match Envelope::decode(&text) {
                    Ok(envelope) => {
                        if notices.send(ChannelNotice::Event(envelope)).await.is_err() {
                            return false;
                        }
                    },
                    Err(error) => {
                        tracing::warn!(%error, "dropped undecodable frame");
                    },
                },
                // Pings are answered by tungstenite; other frames carry
                // nothing for this protocol.
                Some(Ok(_)) => {},
                Some(Err(error)) => {
                    tracing::warn!(%error, "read failed, connection lost");
                    return true;
                },
                None => {
                    tracing::info!("relay closed the connection");
                    return true;
                },
            },
        }
    }
}

/// Sleep out the backoff delay, dropping envelopes submitted meanwhile.
///
/// Returns `false` when the caller is gone.
async fn drain_during_backoff(outgoing: &mut mpsc::Receiver<Envelope>, delay: Duration) -> bool {
    let sleep = tokio::time::sleep(delay);
    tokio::pin!(sleep);

    loop {
        tokio::select! {
            () = &mut sleep => return true,
            dropped = outgoing.recv() => match dropped {
                Some(envelope) => {
                    tracing::debug!(
                        event = envelope.event.name(),
                        "dropped envelope while disconnected"
                    );
                },
                None => return false,
            },
        }
    }
}

/// Delay before reconnect attempt number `failures` (1-based).
fn backoff_delay(base: Duration, cap: Duration, failures: u32) -> Duration {
    let exponent = failures.saturating_sub(1).min(16);
    base.saturating_mul(1_u32 << exponent).min(cap)
}
