//! # Event Bus
//!
//! Typed client events published over a `tokio::sync::broadcast` channel.
//!
//! Hosts subscribe to react to session changes (for example switching to the
//! sign-in view after [`AuthEvent::SignedOut`]) and to keep cart badges or
//! order lists fresh without polling.
//!
//! ```text
//! ┌────────────┐  emit   ┌──────────┐  subscribe  ┌──────┐
//! │ AuthGateway├────────>│          ├────────────>│ Host │
//! └────────────┘         │ EventBus │             └──────┘
//! ┌────────────┐  emit   │          │  subscribe  ┌──────┐
//! │ Services   ├────────>│          ├────────────>│ Logs │
//! └────────────┘         └──────────┘             └──────┘
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use core_runtime::events::{AuthEvent, CoreEvent, EventBus, SignOutReason};
//!
//! let bus = EventBus::new(32);
//! let mut rx = bus.subscribe();
//!
//! bus.emit(CoreEvent::Auth(AuthEvent::SignedOut {
//!     reason: SignOutReason::SessionExpired,
//! }))
//! .ok();
//!
//! assert!(matches!(rx.try_recv(), Ok(CoreEvent::Auth(_))));
//! ```
//!
//! Emitting with no subscribers returns `Err`; publishers ignore it.

use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::broadcast::{
    self,
    error::{RecvError, SendError, TryRecvError},
};

pub use tokio::sync::broadcast::Receiver;

/// Per-subscriber buffer used when none is configured.
pub const DEFAULT_EVENT_BUFFER_SIZE: usize = 100;

// ============================================================================
// Event Types
// ============================================================================

/// Every event published on the bus.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "payload")]
pub enum CoreEvent {
    Auth(AuthEvent),
    Cart(CartEvent),
    Order(OrderEvent),
}

impl CoreEvent {
    /// Short human-readable description.
    pub fn description(&self) -> &str {
        match self {
            CoreEvent::Auth(e) => e.description(),
            CoreEvent::Cart(e) => e.description(),
            CoreEvent::Order(e) => e.description(),
        }
    }

    pub fn severity(&self) -> EventSeverity {
        match self {
            CoreEvent::Auth(AuthEvent::RefreshFailed { .. }) => EventSeverity::Error,
            CoreEvent::Auth(AuthEvent::SignedOut { reason }) if reason.is_forced() => {
                EventSeverity::Warning
            }
            CoreEvent::Auth(AuthEvent::SignedIn) | CoreEvent::Auth(AuthEvent::SignedOut { .. }) => {
                EventSeverity::Info
            }
            CoreEvent::Order(_) => EventSeverity::Info,
            _ => EventSeverity::Debug,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EventSeverity {
    Debug,
    Info,
    Warning,
    Error,
}

/// Why a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SignOutReason {
    /// The user asked to sign out.
    UserInitiated,
    /// The backend answered 403.
    AccessDenied,
    /// The credential expired and could not be refreshed.
    SessionExpired,
}

impl SignOutReason {
    /// True when the session ended without the user asking for it.
    pub fn is_forced(&self) -> bool {
        !matches!(self, SignOutReason::UserInitiated)
    }
}

impl fmt::Display for SignOutReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SignOutReason::UserInitiated => "user initiated",
            SignOutReason::AccessDenied => "access denied",
            SignOutReason::SessionExpired => "session expired",
        };
        f.write_str(label)
    }
}

/// Session lifecycle events. Credential values are never carried.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum AuthEvent {
    /// A credential was obtained through sign-in.
    SignedIn,
    /// The session ended and the stored credential was cleared.
    SignedOut { reason: SignOutReason },
    /// A credential refresh call was issued.
    TokenRefreshing,
    /// The refresh succeeded; `replayed` requests were waiting on it.
    TokenRefreshed { replayed: usize },
    /// The refresh failed; every waiting request was rejected.
    RefreshFailed { message: String },
}

impl AuthEvent {
    fn description(&self) -> &str {
        match self {
            AuthEvent::SignedIn => "User signed in",
            AuthEvent::SignedOut { .. } => "User signed out",
            AuthEvent::TokenRefreshing => "Refreshing access credential",
            AuthEvent::TokenRefreshed { .. } => "Access credential refreshed",
            AuthEvent::RefreshFailed { .. } => "Access credential refresh failed",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum CartEvent {
    ItemAdded { book_id: String, quantity: u32 },
    QuantityChanged { item_id: String, quantity: u32 },
    ItemRemoved { item_id: String },
    Cleared,
}

impl CartEvent {
    fn description(&self) -> &str {
        match self {
            CartEvent::ItemAdded { .. } => "Book added to cart",
            CartEvent::QuantityChanged { .. } => "Cart quantity changed",
            CartEvent::ItemRemoved { .. } => "Book removed from cart",
            CartEvent::Cleared => "Cart cleared",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum OrderEvent {
    Placed { order_id: String },
    Cancelled { order_id: String },
}

impl OrderEvent {
    fn description(&self) -> &str {
        match self {
            OrderEvent::Placed { .. } => "Order placed",
            OrderEvent::Cancelled { .. } => "Order cancelled",
        }
    }
}

// ============================================================================
// Event Bus
// ============================================================================

/// Cloneable handle to the broadcast channel. Clones share one channel.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<CoreEvent>,
}

impl EventBus {
    /// `capacity` is the number of events buffered per subscriber before it
    /// starts observing `RecvError::Lagged`.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Returns the number of subscribers reached, or `Err` when nobody listens.
    pub fn emit(&self, event: CoreEvent) -> Result<usize, SendError<CoreEvent>> {
        self.sender.send(event)
    }

    pub fn subscribe(&self) -> Receiver<CoreEvent> {
        self.sender.subscribe()
    }

    /// Subscribe through an [`EventStream`].
    pub fn stream(&self) -> EventStream {
        EventStream::new(self.subscribe())
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_BUFFER_SIZE)
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}

type EventFilter = Box<dyn Fn(&CoreEvent) -> bool + Send + Sync>;

/// Receiver wrapper that skips events rejected by an optional predicate.
pub struct EventStream {
    receiver: Receiver<CoreEvent>,
    filter: Option<EventFilter>,
}

impl EventStream {
    pub fn new(receiver: Receiver<CoreEvent>) -> Self {
        Self {
            receiver,
            filter: None,
        }
    }

    pub fn filter<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&CoreEvent) -> bool + Send + Sync + 'static,
    {
        self.filter = Some(Box::new(predicate));
        self
    }

    /// Only auth events.
    pub fn auth_only(self) -> Self {
        self.filter(|event| matches!(event, CoreEvent::Auth(_)))
    }

    fn accepts(&self, event: &CoreEvent) -> bool {
        self.filter.as_ref().map_or(true, |f| f(event))
    }

    /// Next matching event.
    ///
    /// # Errors
    ///
    /// `RecvError::Lagged(n)` if this subscriber fell `n` events behind,
    /// `RecvError::Closed` once every bus handle is dropped.
    pub async fn recv(&mut self) -> Result<CoreEvent, RecvError> {
        loop {
            let event = self.receiver.recv().await?;
            if self.accepts(&event) {
                return Ok(event);
            }
        }
    }

    /// Next matching event already buffered, if any.
    pub fn try_recv(&mut self) -> Option<Result<CoreEvent, RecvError>> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) if self.accepts(&event) => return Some(Ok(event)),
                Ok(_) => continue,
                Err(TryRecvError::Empty) => return None,
                Err(TryRecvError::Lagged(n)) => return Some(Err(RecvError::Lagged(n))),
                Err(TryRecvError::Closed) => return Some(Err(RecvError::Closed)),
            }
        }
    }
}

impl fmt::Debug for EventStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventStream")
            .field("has_filter", &self.filter.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signed_out(reason: SignOutReason) -> CoreEvent {
        CoreEvent::Auth(AuthEvent::SignedOut { reason })
    }

    #[test]
    fn test_emit_without_subscribers_is_err() {
        let bus = EventBus::new(4);
        assert_eq!(bus.subscriber_count(), 0);
        assert!(bus.emit(CoreEvent::Cart(CartEvent::Cleared)).is_err());
    }

    #[tokio::test]
    async fn test_all_subscribers_receive_event() {
        let bus = EventBus::new(4);
        let mut a = bus.subscribe();
        let mut b = bus.clone().subscribe();

        let delivered = bus.emit(CoreEvent::Auth(AuthEvent::SignedIn)).unwrap();
        assert_eq!(delivered, 2);
        assert_eq!(a.recv().await.unwrap(), CoreEvent::Auth(AuthEvent::SignedIn));
        assert_eq!(b.recv().await.unwrap(), CoreEvent::Auth(AuthEvent::SignedIn));
    }

    #[tokio::test]
    async fn test_stream_filter_skips_other_events() {
        let bus = EventBus::default();
        let mut stream = bus.stream().auth_only();

        bus.emit(CoreEvent::Cart(CartEvent::Cleared)).unwrap();
        bus.emit(CoreEvent::Order(OrderEvent::Placed {
            order_id: "7".to_string(),
        }))
        .unwrap();
        bus.emit(signed_out(SignOutReason::AccessDenied)).unwrap();

        assert_eq!(
            stream.recv().await.unwrap(),
            signed_out(SignOutReason::AccessDenied)
        );
        assert!(stream.try_recv().is_none());
    }

    #[test]
    fn test_lagged_subscriber() {
        let bus = EventBus::new(2);
        let mut stream = bus.stream();
        for _ in 0..5 {
            bus.emit(CoreEvent::Cart(CartEvent::Cleared)).unwrap();
        }
        assert!(matches!(stream.try_recv(), Some(Err(RecvError::Lagged(_)))));
    }

    #[test]
    fn test_severity() {
        assert_eq!(
            CoreEvent::Auth(AuthEvent::RefreshFailed {
                message: "401".to_string()
            })
            .severity(),
            EventSeverity::Error
        );
        assert_eq!(
            signed_out(SignOutReason::SessionExpired).severity(),
            EventSeverity::Warning
        );
        assert_eq!(
            signed_out(SignOutReason::UserInitiated).severity(),
            EventSeverity::Info
        );
        assert_eq!(
            CoreEvent::Auth(AuthEvent::TokenRefreshing).severity(),
            EventSeverity::Debug
        );
    }

    #[test]
    fn test_serialized_shape() {
        let json = serde_json::to_value(signed_out(SignOutReason::SessionExpired)).unwrap();
        assert_eq!(json["type"], "Auth");
        assert_eq!(json["payload"]["event"], "SignedOut");
        assert_eq!(json["payload"]["reason"], "SessionExpired");

        let back: CoreEvent = serde_json::from_value(json).unwrap();
        assert_eq!(back.description(), "User signed out");
    }
}
