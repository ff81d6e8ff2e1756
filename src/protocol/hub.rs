//! In-process message bus shared by the transports.
//!
//! A [`Hub`] fans a published message out to every other member, each through
//! its own unbounded queue, so delivery is asynchronous and preserves sender
//! order per receiver. An [`Endpoint`] pumps one member's queue into the
//! protocol's `on_message` handler on the current `LocalSet`.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use serde_json::Value;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::protocol::MessageHandler;

struct Members<E> {
    next_id: u64,
    members: Vec<(u64, mpsc::UnboundedSender<E>)>,
}

/// Broadcast bus; cloning yields another handle to the same bus
pub struct Hub<E> {
    inner: Rc<RefCell<Members<E>>>,
}

impl<E> Clone for Hub<E> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<E> Hub<E> {
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(Members {
                next_id: 0,
                members: Vec::new(),
            })),
        }
    }

    pub(crate) fn join(&self) -> (u64, mpsc::UnboundedReceiver<E>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        let mut inner = self.inner.borrow_mut();
        let id = inner.next_id;
        inner.next_id += 1;
        inner.members.push((id, sender));
        (id, receiver)
    }

    pub(crate) fn leave(&self, id: u64) {
        self.inner.borrow_mut().members.retain(|(member, _)| *member != id);
    }

    pub fn member_count(&self) -> usize {
        self.inner.borrow().members.len()
    }
}

impl<E: Clone> Hub<E> {
    /// Deliver `message` to every member except `from`
    pub(crate) fn publish(&self, from: u64, message: E) {
        let mut inner = self.inner.borrow_mut();
        inner.members.retain(|(member, sender)| {
            if *member == from {
                return true;
            }
            sender.send(message.clone()).is_ok()
        });
    }
}

impl<E> Default for Hub<E> {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Default)]
struct HandlerSlot {
    handler: RefCell<Option<MessageHandler>>,
    generation: Cell<u64>,
    closed: Cell<bool>,
}

impl HandlerSlot {
    fn set(&self, handler: Option<MessageHandler>) {
        self.generation.set(self.generation.get() + 1);
        *self.handler.borrow_mut() = handler;
    }

    fn dispatch(&self, message: Value) {
        if self.closed.get() {
            return;
        }

        let generation = self.generation.get();
        let taken = self.handler.borrow_mut().take();
        let Some(mut handler) = taken else {
            return;
        };

        handler(message);

        // The handler may have replaced itself or closed the endpoint
        if !self.closed.get() && self.generation.get() == generation {
            *self.handler.borrow_mut() = Some(handler);
        }
    }
}

/// One member of a hub wired to a message handler.
///
/// Must be opened inside a `tokio::task::LocalSet`.
pub(crate) struct Endpoint<E> {
    hub: Hub<E>,
    id: u64,
    slot: Rc<HandlerSlot>,
    pump: RefCell<Option<JoinHandle<()>>>,
}

impl<E: Clone + 'static> Endpoint<E> {
    /// Join `hub`; `accept` maps inbound envelopes to messages for this endpoint
    pub(crate) fn open(hub: &Hub<E>, accept: impl Fn(E) -> Option<Value> + 'static) -> Self {
        let (id, mut receiver) = hub.join();
        let slot = Rc::new(HandlerSlot::default());

        let pump_slot = Rc::clone(&slot);
        let pump = tokio::task::spawn_local(async move {
            while let Some(envelope) = receiver.recv().await {
                if pump_slot.closed.get() {
                    break;
                }
                if let Some(message) = accept(envelope) {
                    pump_slot.dispatch(message);
                }
            }
        });

        Self {
            hub: hub.clone(),
            id,
            slot,
            pump: RefCell::new(Some(pump)),
        }
    }

    pub(crate) fn send(&self, envelope: E) {
        if self.slot.closed.get() {
            log::debug!("Dropping message posted on closed endpoint {}", self.id);
            return;
        }
        self.hub.publish(self.id, envelope);
    }

    pub(crate) fn set_on_message(&self, handler: Option<MessageHandler>) {
        if self.slot.closed.get() {
            return;
        }
        self.slot.set(handler);
    }

    /// Stop delivery immediately; queued messages are discarded
    pub(crate) fn close(&self) {
        if self.slot.closed.replace(true) {
            return;
        }

        self.slot.set(None);
        self.hub.leave(self.id);
        if let Some(pump) = self.pump.borrow_mut().take() {
            pump.abort();
        }
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.slot.closed.get()
    }
}

impl<E> Drop for Endpoint<E> {
    fn drop(&mut self) {
        self.slot.closed.set(true);
        self.hub.leave(self.id);
        if let Some(pump) = self.pump.get_mut().take() {
            pump.abort();
        }
    }
}
