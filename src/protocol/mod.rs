//! Message transports between the subtitle player and a video surface.
//!
//! Transports carry JSON values and know nothing about their meaning. After
//! `close()` returns no further message reaches the handler.

pub mod broadcast;
pub mod extension;
pub mod hub;
pub mod window;

use serde_json::Value;

pub use broadcast::{BroadcastChannelProtocol, ChannelRegistry};
pub use extension::{ExtensionBus, ExtensionRelayProtocol, RelayEnvelope};
pub use hub::Hub;
pub use window::{WindowBus, WindowEnvelope, WindowMessageProtocol};

/// Sender name used by the subtitle player side
pub const PLAYER: &str = "player";
/// Sender name used by the video side
pub const VIDEO: &str = "video";

/// Inbound message callback
pub type MessageHandler = Box<dyn FnMut(Value)>;

/// Transport interface shared by every video connection
pub trait VideoProtocol {
    /// Post a message to the other side; dropped silently once closed
    fn post_message(&self, message: Value);

    /// Replace the inbound handler
    fn set_on_message(&self, handler: Option<MessageHandler>);

    fn close(&self);
}

/// Fresh random identifier for channel names and frame ids
pub fn session_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
