//! Cross-tab transport over a named broadcast channel.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use serde_json::Value;

use crate::protocol::hub::{Endpoint, Hub};
use crate::protocol::{session_id, MessageHandler, VideoProtocol};

/// Named broadcast channels visible to every context of the session
#[derive(Clone, Default)]
pub struct ChannelRegistry {
    channels: Rc<RefCell<HashMap<String, Hub<Value>>>>,
}

impl ChannelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The channel called `name`, created on first use
    pub fn channel(&self, name: &str) -> Hub<Value> {
        self.channels
            .borrow_mut()
            .entry(name.to_string())
            .or_default()
            .clone()
    }

    pub fn member_count(&self, name: &str) -> usize {
        self.channels
            .borrow()
            .get(name)
            .map(Hub::member_count)
            .unwrap_or(0)
    }
}

/// Both ends open the same channel name; neither receives its own messages
pub struct BroadcastChannelProtocol {
    name: String,
    endpoint: Endpoint<Value>,
}

impl BroadcastChannelProtocol {
    pub fn open(registry: &ChannelRegistry, name: &str) -> Self {
        log::debug!("Opening broadcast channel {}", name);
        Self {
            name: name.to_string(),
            endpoint: Endpoint::open(&registry.channel(name), Some),
        }
    }

    /// Open a channel under a fresh session name
    pub fn open_session(registry: &ChannelRegistry) -> Self {
        Self::open(registry, &session_id())
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl VideoProtocol for BroadcastChannelProtocol {
    fn post_message(&self, message: Value) {
        self.endpoint.send(message);
    }

    fn set_on_message(&self, handler: Option<MessageHandler>) {
        self.endpoint.set_on_message(handler);
    }

    fn close(&self) {
        self.endpoint.close();
    }
}
