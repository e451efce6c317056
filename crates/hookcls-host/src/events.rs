//! Window-style event target.
//!
//! Effects use this to subscribe to things that outlive a single render, such
//! as key presses. Every `add_listener` made in an effect setup must be paired
//! with a `remove_listener` in its cleanup; `listener_count` makes leaks
//! visible in tests.

use std::cell::RefCell;
use std::rc::Rc;

use slotmap::{SlotMap, new_key_type};

new_key_type! {
    pub struct ListenerId;
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Event {
    pub name: String,
    pub data: String,
}

impl Event {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data: String::new(),
        }
    }

    pub fn with_data(mut self, data: impl Into<String>) -> Self {
        self.data = data.into();
        self
    }
}

pub type Handler = Rc<dyn Fn(&Event)>;

struct Listener {
    event: String,
    handler: Handler,
}

#[derive(Clone, Default)]
pub struct EventTarget {
    listeners: Rc<RefCell<SlotMap<ListenerId, Listener>>>,
}

impl EventTarget {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_listener(&self, event: impl Into<String>, handler: Handler) -> ListenerId {
        let event = event.into();
        log::trace!("add listener for `{event}`");
        self.listeners
            .borrow_mut()
            .insert(Listener { event, handler })
    }

    /// Returns false if the listener was already removed.
    pub fn remove_listener(&self, id: ListenerId) -> bool {
        self.listeners.borrow_mut().remove(id).is_some()
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.borrow().len()
    }

    /// Calls every listener registered for `event.name`. Returns how many ran.
    pub fn emit(&self, event: &Event) -> usize {
        // Snapshot first: handlers may add or remove listeners.
        let handlers: Vec<Handler> = self
            .listeners
            .borrow()
            .values()
            .filter(|l| l.event == event.name)
            .map(|l| l.handler.clone())
            .collect();
        for handler in &handlers {
            handler(event);
        }
        handlers.len()
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.listeners, &other.listeners)
    }
}

impl PartialEq for EventTarget {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl std::fmt::Debug for EventTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventTarget")
            .field("listeners", &self.listener_count())
            .finish()
    }
}
