//! Event filters, letting a listener only see the events it cares about.
//!
//! ```
//! use chat_realtime::{filter::{self, FilterExt}, EventType};
//!
//! // messages of room r1, or any room change
//! let wanted = EventType::MessageCreated
//!     .and(filter::in_room("r1"))
//!     .or(EventType::RoomUpdated.or(EventType::RoomDeleted));
//! # let _ = wanted;
//! ```

use std::borrow::Cow;

use crate::{
    subscriber::Listener,
    ws::{EventType, RealtimeEvent},
};

/// Decides whether a delivered event is passed on.
pub trait Filter {
    /// true to pass the event on
    fn filter_event(&self, event: &RealtimeEvent) -> bool;
}

impl<F> Filter for F
where
    F: Fn(&RealtimeEvent) -> bool,
{
    fn filter_event(&self, event: &RealtimeEvent) -> bool {
        self(event)
    }
}

/// An event type passes events classified as that type, whatever their wire spelling.
impl Filter for EventType {
    fn filter_event(&self, event: &RealtimeEvent) -> bool {
        event.event_type() == *self
    }
}

/// Passes what the inner filter rejects, see [FilterExt::not].
#[derive(Debug, Copy, Clone)]
pub struct Not<F> {
    filter: F,
}

impl<F: Filter> Filter for Not<F> {
    fn filter_event(&self, event: &RealtimeEvent) -> bool {
        !self.filter.filter_event(event)
    }
}

/// Passes what both filters pass, see [FilterExt::and].
#[derive(Debug, Copy, Clone)]
pub struct And<FA, FB> {
    a: FA,
    b: FB,
}

impl<FA: Filter, FB: Filter> Filter for And<FA, FB> {
    fn filter_event(&self, event: &RealtimeEvent) -> bool {
        self.a.filter_event(event) && self.b.filter_event(event)
    }
}

/// Passes what either filter passes, see [FilterExt::or].
#[derive(Debug, Copy, Clone)]
pub struct Or<FA, FB> {
    a: FA,
    b: FB,
}

impl<FA: Filter, FB: Filter> Filter for Or<FA, FB> {
    fn filter_event(&self, event: &RealtimeEvent) -> bool {
        self.a.filter_event(event) || self.b.filter_event(event)
    }
}

/// Combinators for every [Filter].
pub trait FilterExt: Filter + Sized {
    /// invert
    fn not(self) -> Not<Self> {
        Not { filter: self }
    }

    /// both must pass, `other` is not asked when `self` rejects
    fn and<F: Filter>(self, other: F) -> And<Self, F> {
        And { a: self, b: other }
    }

    /// one must pass, `other` is not asked when `self` passes
    fn or<F: Filter>(self, other: F) -> Or<Self, F> {
        Or { a: self, b: other }
    }
}

impl<T: Filter> FilterExt for T {}

/// Passes every event.
#[derive(Debug, Copy, Clone)]
pub struct All;

impl Filter for All {
    fn filter_event(&self, _event: &RealtimeEvent) -> bool {
        true
    }
}

/// Filter passing every event
pub fn all() -> All {
    All
}

/// Rejects every event, handy to mute a listener without unsubscribing it.
#[derive(Debug, Copy, Clone)]
pub struct Reject;

impl Filter for Reject {
    fn filter_event(&self, _event: &RealtimeEvent) -> bool {
        false
    }
}

/// Filter rejecting every event
pub fn none() -> Reject {
    Reject
}

/// Passes events of one type, same as using the [EventType] itself.
#[derive(Debug, Copy, Clone)]
pub struct OfType(pub EventType);

impl Filter for OfType {
    fn filter_event(&self, event: &RealtimeEvent) -> bool {
        self.0.filter_event(event)
    }
}

/// Filter passing events of `t`
pub fn of_type(t: EventType) -> OfType {
    OfType(t)
}

/// Passes events whose payload names one room.
///
/// Chat events carry the room as `payload.roomId`, room events as `payload.id` of a
/// `room-*` event. Events without a room never pass.
#[derive(Debug, Clone)]
pub struct InRoom {
    room_id: String,
}

impl Filter for InRoom {
    fn filter_event(&self, event: &RealtimeEvent) -> bool {
        let room = match event.event_type() {
            EventType::RoomCreated | EventType::RoomUpdated | EventType::RoomDeleted => event
                .payload
                .get("roomId")
                .or_else(|| event.payload.get("id")),
            _ => event.payload.get("roomId"),
        };

        room.and_then(|v| v.as_str()) == Some(self.room_id.as_str())
    }
}

/// Filter passing events of room `room_id`
pub fn in_room<S: Into<String>>(room_id: S) -> InRoom {
    InRoom {
        room_id: room_id.into(),
    }
}

/// Listener that only sees events passing its filter.
#[derive(Debug, Clone)]
pub struct Filtered<F, L> {
    filter: F,
    listener: L,
}

impl<F, L> Filtered<F, L> {
    /// Wrap a listener with a filter
    pub fn new(filter: F, listener: L) -> Self {
        Self { filter, listener }
    }
}

impl<F, L> Listener for Filtered<F, L>
where
    F: Filter + Send + Sync,
    L: Listener,
{
    fn name(&self) -> Cow<'static, str> {
        format!("filtered {}", self.listener.name()).into()
    }

    fn on_event(&self, event: &RealtimeEvent) {
        if self.filter.filter_event(event) {
            self.listener.on_event(event)
        }
    }
}

#[cfg(test)]
mod test {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use serde_json::json;

    fn message() -> RealtimeEvent {
        RealtimeEvent::new("message-created", json!({"id": "m1", "roomId": "r1"}))
    }

    fn room_deleted() -> RealtimeEvent {
        RealtimeEvent::new("ROOM_DELETED", json!({"roomId": "r1"}))
    }

    #[test]
    fn test_combinators() {
        let from_r1 = |e: &RealtimeEvent| e.payload.get("roomId") == Some(&json!("r1"));

        let f = of_type(EventType::MessageCreated).and(from_r1);
        assert!(f.filter_event(&message()));
        assert!(!f.filter_event(&room_deleted()));

        let f = of_type(EventType::MessageCreated).or(of_type(EventType::RoomDeleted));
        assert!(f.filter_event(&message()));
        assert!(f.filter_event(&room_deleted()));

        let f = of_type(EventType::MessageCreated).not();
        assert!(!f.filter_event(&message()));
        assert!(f.filter_event(&room_deleted()));

        assert!(all().filter_event(&message()));
        assert!(!none().filter_event(&message()));
    }

    #[test]
    fn test_event_type_is_a_filter() {
        let f = EventType::RoomDeleted.or(EventType::RoomUpdated);
        assert!(f.filter_event(&room_deleted()));
        assert!(!f.filter_event(&message()));

        let spelled = RealtimeEvent::new("NEW_MESSAGE", json!({}));
        assert!(EventType::MessageCreated.filter_event(&spelled));
    }

    #[test]
    fn test_in_room() {
        let r1 = in_room("r1");
        assert!(r1.filter_event(&message()));
        assert!(r1.filter_event(&room_deleted()));
        assert!(r1.filter_event(&RealtimeEvent::new("room-created", json!({"id": "r1"}))));

        assert!(!r1.filter_event(&RealtimeEvent::new(
            "message-created",
            json!({"roomId": "r2"})
        )));
        assert!(!r1.filter_event(&RealtimeEvent::new("user-left", json!({"id": "r1"}))));
    }

    #[test]
    fn test_filtered_listener() {
        let count = AtomicUsize::new(0);
        let listener = Filtered::new(of_type(EventType::RoomDeleted), |_: &RealtimeEvent| {
            count.fetch_add(1, Ordering::SeqCst);
        });

        listener.on_event(&message());
        listener.on_event(&room_deleted());

        assert_eq!(count.load(Ordering::SeqCst), 1);
    }
}
