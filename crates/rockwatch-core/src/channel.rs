//! Capability interface over the external real-time feed.
//!
//! The feed pushes two kinds of traffic: sensor readings and transport
//! lifecycle signals. [`ReadingChannel`] abstracts over whatever delivers
//! them so the aggregator and session never depend on a live network
//! connection:
//!
//! - [`ManualChannel`] is driven synchronously through a [`ManualChannelHandle`]
//!   (replaying recorded feeds, tests).
//! - [`StreamChannel`] drives any [`futures::Stream`] of [`ChannelEvent`]s on a
//!   background tokio task and supports graceful shutdown through a
//!   [`CancellationToken`].
//!
//! Closing a channel unsubscribes every handler exactly once. After
//! [`ReadingChannel::close`] returns, no handler is invoked again.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

use futures::StreamExt;
use futures::stream::{BoxStream, Stream};
use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use rockwatch_types::{ParseError, RawReading, TransportSignal};

use crate::error::{Error, Result};

/// Handler invoked for every inbound reading.
pub type ReadingHandler = Arc<dyn Fn(RawReading) + Send + Sync>;

/// Handler invoked for every transport lifecycle signal.
pub type StateHandler = Arc<dyn Fn(TransportSignal) + Send + Sync>;

/// One event on the real-time feed.
///
/// Serialized with a `type` tag, e.g. `{"type":"sensor_data","data":{...}}`
/// or `{"type":"connect_error","message":"timeout"}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
#[non_exhaustive]
pub enum ChannelEvent {
    /// The transport connected.
    Connect,
    /// The transport disconnected.
    Disconnect,
    /// The transport failed to connect.
    ConnectError {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
    /// A sensor reading.
    SensorData {
        #[serde(default)]
        data: RawReading,
    },
}

impl ChannelEvent {
    /// Build a reading event.
    pub fn reading(data: RawReading) -> Self {
        ChannelEvent::SensorData { data }
    }

    /// The lifecycle signal carried by this event, if any.
    pub fn signal(&self) -> Option<TransportSignal> {
        match self {
            ChannelEvent::Connect => Some(TransportSignal::Connect),
            ChannelEvent::Disconnect => Some(TransportSignal::Disconnect),
            ChannelEvent::ConnectError { .. } => Some(TransportSignal::ConnectError),
            ChannelEvent::SensorData { .. } => None,
        }
    }

    /// Decode one line of a recorded feed.
    ///
    /// A JSON object with a `type` field is decoded as a tagged event; any
    /// other object is treated as the body of a reading event.
    ///
    /// ```
    /// use rockwatch_core::ChannelEvent;
    ///
    /// let event = ChannelEvent::from_json(r#"{"type":"connect"}"#).unwrap();
    /// assert_eq!(event, ChannelEvent::Connect);
    ///
    /// let event = ChannelEvent::from_json(r#"{"co2": 700, "humidity": 40}"#).unwrap();
    /// assert!(matches!(event, ChannelEvent::SensorData { .. }));
    /// ```
    pub fn from_json(line: &str) -> Result<Self> {
        let value: serde_json::Value =
            serde_json::from_str(line).map_err(|e| ParseError::InvalidJson(e.to_string()))?;

        if value.get("type").is_some() {
            Ok(serde_json::from_value(value)?)
        } else {
            Ok(ChannelEvent::SensorData {
                data: RawReading::from_value(value)?,
            })
        }
    }
}

impl From<TransportSignal> for ChannelEvent {
    fn from(signal: TransportSignal) -> Self {
        match signal {
            TransportSignal::Connect => ChannelEvent::Connect,
            TransportSignal::Disconnect => ChannelEvent::Disconnect,
            TransportSignal::ConnectError => ChannelEvent::ConnectError { message: None },
        }
    }
}

/// Push-based source of readings and lifecycle signals.
///
/// Handlers must be registered before [`start`](Self::start) is called;
/// events delivered before a handler is registered are not replayed.
pub trait ReadingChannel: Send + Sync {
    /// Register a handler for inbound readings.
    fn on_reading(&self, handler: ReadingHandler);

    /// Register a handler for transport lifecycle signals.
    fn on_state_change(&self, handler: StateHandler);

    /// Begin delivering events.
    ///
    /// The default implementation does nothing, for channels that deliver
    /// as soon as they are pushed into.
    fn start(&self) -> Result<()> {
        Ok(())
    }

    /// Unsubscribe every handler and stop delivery.
    ///
    /// Returns `true` only for the call that actually closed the channel;
    /// every later call is a no-op returning `false`.
    fn close(&self) -> bool;

    /// Check if the channel has been closed.
    fn is_closed(&self) -> bool;
}

impl<T: ReadingChannel + ?Sized> ReadingChannel for Arc<T> {
    fn on_reading(&self, handler: ReadingHandler) {
        (**self).on_reading(handler);
    }

    fn on_state_change(&self, handler: StateHandler) {
        (**self).on_state_change(handler);
    }

    fn start(&self) -> Result<()> {
        (**self).start()
    }

    fn close(&self) -> bool {
        (**self).close()
    }

    fn is_closed(&self) -> bool {
        (**self).is_closed()
    }
}

pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Handler registry shared by the channel implementations.
#[derive(Default)]
struct Handlers {
    reading: RwLock<Vec<ReadingHandler>>,
    state: RwLock<Vec<StateHandler>>,
    closed: AtomicBool,
}

impl Handlers {
    fn add_reading(&self, handler: ReadingHandler) {
        if !self.is_closed() {
            self.reading
                .write()
                .unwrap_or_else(PoisonError::into_inner)
                .push(handler);
        }
    }

    fn add_state(&self, handler: StateHandler) {
        if !self.is_closed() {
            self.state
                .write()
                .unwrap_or_else(PoisonError::into_inner)
                .push(handler);
        }
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    fn close(&self) -> bool {
        if self.closed.swap(true, Ordering::AcqRel) {
            return false;
        }
        self.reading
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        self.state
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        true
    }

    /// Deliver one event. Handlers are cloned out of the lock first so a
    /// handler may close the channel it is called from.
    fn dispatch(&self, event: ChannelEvent) {
        if self.is_closed() {
            return;
        }

        match event {
            ChannelEvent::SensorData { data } => {
                let handlers = self
                    .reading
                    .read()
                    .unwrap_or_else(PoisonError::into_inner)
                    .clone();
                for handler in handlers {
                    if self.is_closed() {
                        break;
                    }
                    handler(data.clone());
                }
            }
            other => {
                if let ChannelEvent::ConnectError {
                    message: Some(message),
                } = &other
                {
                    warn!(%message, "Transport reported a connection error");
                }
                let Some(signal) = other.signal() else {
                    return;
                };
                let handlers = self
                    .state
                    .read()
                    .unwrap_or_else(PoisonError::into_inner)
                    .clone();
                for handler in handlers {
                    if self.is_closed() {
                        break;
                    }
                    handler(signal);
                }
            }
        }
    }
}

impl fmt::Debug for Handlers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handlers")
            .field("closed", &self.is_closed())
            .finish_non_exhaustive()
    }
}

/// In-process channel fed synchronously through a [`ManualChannelHandle`].
///
/// ```
/// use rockwatch_core::{ChannelEvent, ManualChannel, ReadingChannel};
/// use std::sync::Arc;
/// use std::sync::atomic::{AtomicUsize, Ordering};
///
/// let channel = ManualChannel::new();
/// let handle = channel.handle();
/// let seen = Arc::new(AtomicUsize::new(0));
/// let counter = Arc::clone(&seen);
/// channel.on_reading(Arc::new(move |_| {
///     counter.fetch_add(1, Ordering::SeqCst);
/// }));
///
/// handle.send_json(r#"{"co2": 650, "temperature": 20, "humidity": 50}"#).unwrap();
/// assert_eq!(seen.load(Ordering::SeqCst), 1);
///
/// assert!(channel.close());
/// assert!(handle.send(ChannelEvent::Connect).is_err());
/// ```
#[derive(Debug, Default)]
pub struct ManualChannel {
    handlers: Arc<Handlers>,
}

impl ManualChannel {
    /// Create a new, open channel.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a handle for pushing events into this channel.
    pub fn handle(&self) -> ManualChannelHandle {
        ManualChannelHandle {
            handlers: Arc::clone(&self.handlers),
        }
    }
}

impl ReadingChannel for ManualChannel {
    fn on_reading(&self, handler: ReadingHandler) {
        self.handlers.add_reading(handler);
    }

    fn on_state_change(&self, handler: StateHandler) {
        self.handlers.add_state(handler);
    }

    fn close(&self) -> bool {
        let closed = self.handlers.close();
        if closed {
            debug!("Manual channel closed");
        }
        closed
    }

    fn is_closed(&self) -> bool {
        self.handlers.is_closed()
    }
}

/// Producer side of a [`ManualChannel`].
#[derive(Debug, Clone)]
pub struct ManualChannelHandle {
    handlers: Arc<Handlers>,
}

impl ManualChannelHandle {
    /// Deliver an event to the registered handlers, synchronously.
    ///
    /// Returns [`Error::ChannelClosed`] if the channel has been closed.
    pub fn send(&self, event: ChannelEvent) -> Result<()> {
        if self.handlers.is_closed() {
            return Err(Error::ChannelClosed);
        }
        self.handlers.dispatch(event);
        Ok(())
    }

    /// Deliver a reading.
    pub fn send_reading(&self, data: RawReading) -> Result<()> {
        self.send(ChannelEvent::SensorData { data })
    }

    /// Deliver a lifecycle signal.
    pub fn signal(&self, signal: TransportSignal) -> Result<()> {
        self.send(signal.into())
    }

    /// Decode one recorded line and deliver it.
    pub fn send_json(&self, line: &str) -> Result<()> {
        self.send(ChannelEvent::from_json(line)?)
    }

    /// Check if the channel has been closed.
    pub fn is_closed(&self) -> bool {
        self.handlers.is_closed()
    }
}

/// Channel driven by an async stream of events on a background task.
///
/// The task is spawned by [`start`](ReadingChannel::start) and stops when the
/// stream ends, on [`close`](ReadingChannel::close), or when the channel is
/// dropped.
pub struct StreamChannel {
    handlers: Arc<Handlers>,
    source: Mutex<Option<BoxStream<'static, ChannelEvent>>>,
    task: Mutex<Option<JoinHandle<()>>>,
    cancel_token: CancellationToken,
    done_token: CancellationToken,
}

impl StreamChannel {
    /// Wrap an event stream. Nothing is polled until the channel is started.
    pub fn new<S>(stream: S) -> Self
    where
        S: Stream<Item = ChannelEvent> + Send + 'static,
    {
        Self {
            handlers: Arc::new(Handlers::default()),
            source: Mutex::new(Some(stream.boxed())),
            task: Mutex::new(None),
            cancel_token: CancellationToken::new(),
            done_token: CancellationToken::new(),
        }
    }

    /// Get a cancellation token that can be used to close the channel externally.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel_token.clone()
    }

    /// Check if the background task is running.
    pub fn is_active(&self) -> bool {
        lock(&self.task)
            .as_ref()
            .is_some_and(|task| !task.is_finished())
    }

    /// Wait until the background task has stopped, whether because the
    /// stream ended or the channel was closed.
    pub async fn finished(&self) {
        self.done_token.cancelled().await;
    }
}

impl ReadingChannel for StreamChannel {
    fn on_reading(&self, handler: ReadingHandler) {
        self.handlers.add_reading(handler);
    }

    fn on_state_change(&self, handler: StateHandler) {
        self.handlers.add_state(handler);
    }

    fn start(&self) -> Result<()> {
        if self.handlers.is_closed() {
            return Err(Error::ChannelClosed);
        }
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| Error::NoRuntime(e.to_string()))?;

        let Some(mut stream) = lock(&self.source).take() else {
            debug!("Stream channel already started");
            return Ok(());
        };

        let handlers = Arc::clone(&self.handlers);
        let task_token = self.cancel_token.clone();
        let done_token = self.done_token.clone();

        let handle = runtime.spawn(async move {
            loop {
                tokio::select! {
                    _ = task_token.cancelled() => {
                        debug!("Stream channel cancelled, stopping gracefully");
                        break;
                    }
                    next = stream.next() => match next {
                        Some(event) => handlers.dispatch(event),
                        None => {
                            debug!("Event stream ended");
                            break;
                        }
                    }
                }
            }
            done_token.cancel();
        });

        *lock(&self.task) = Some(handle);
        Ok(())
    }

    fn close(&self) -> bool {
        let closed = self.handlers.close();
        self.cancel_token.cancel();
        if lock(&self.task).is_none() {
            // Never started: nothing will signal completion.
            self.done_token.cancel();
        }
        if closed {
            debug!("Stream channel closed");
        }
        closed
    }

    fn is_closed(&self) -> bool {
        self.handlers.is_closed()
    }
}

impl Drop for StreamChannel {
    fn drop(&mut self) {
        self.cancel_token.cancel();
    }
}

impl fmt::Debug for StreamChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamChannel")
            .field("handlers", &self.handlers)
            .field("cancelled", &self.cancel_token.is_cancelled())
            .finish_non_exhaustive()
    }
}
