//! Transport relayed through the browser extension.
//!
//! The extension forwards messages between the player and a video inside an
//! arbitrary tab. Messages are addressed by the tab id and the source URL of
//! the video element within that tab.

use serde_json::Value;

use crate::protocol::hub::{Endpoint, Hub};
use crate::protocol::{MessageHandler, VideoProtocol};

/// Message as carried by the extension relay
#[derive(Debug, Clone, PartialEq)]
pub struct RelayEnvelope {
    pub sender: String,
    pub tab_id: u32,
    pub src: String,
    pub message: Value,
}

pub type ExtensionBus = Hub<RelayEnvelope>;

pub struct ExtensionRelayProtocol {
    source: String,
    tab_id: u32,
    src: String,
    endpoint: Endpoint<RelayEnvelope>,
}

impl ExtensionRelayProtocol {
    pub fn open(bus: &ExtensionBus, source: &str, destination: &str, tab_id: u32, src: &str) -> Self {
        let destination = destination.to_string();
        let expected_src = src.to_string();

        let endpoint = Endpoint::open(bus, move |envelope: RelayEnvelope| {
            let addressed = envelope.tab_id == tab_id && envelope.src == expected_src;
            if envelope.sender != destination || !addressed {
                return None;
            }
            Some(envelope.message)
        });

        Self {
            source: source.to_string(),
            tab_id,
            src: src.to_string(),
            endpoint,
        }
    }

    pub fn tab_id(&self) -> u32 {
        self.tab_id
    }

    pub fn src(&self) -> &str {
        &self.src
    }
}

impl VideoProtocol for ExtensionRelayProtocol {
    fn post_message(&self, message: Value) {
        self.endpoint.send(RelayEnvelope {
            sender: self.source.clone(),
            tab_id: self.tab_id,
            src: self.src.clone(),
            message,
        });
    }

    fn set_on_message(&self, handler: Option<MessageHandler>) {
        self.endpoint.set_on_message(handler);
    }

    fn close(&self) {
        self.endpoint.close();
    }
}
