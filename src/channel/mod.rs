//! Synchronisation channels on top of a [`VideoProtocol`](crate::protocol::VideoProtocol).
//!
//! [`VideoChannel`] is the subtitle player's view of a remote video;
//! [`PlayerChannel`] is the video surface's view of the subtitle player.

pub mod messages;
pub mod player_channel;
pub mod video_channel;

use std::cell::Cell;

use crate::channel::messages::{encode, Command};
use crate::protocol::VideoProtocol;

pub use messages::{FromVideoMessage, Inbound, ToVideoMessage};
pub use player_channel::PlayerChannel;
pub use video_channel::{MirroredState, VideoChannel, WeakVideoChannel};

/// Typed sending half shared by both channel ends
pub(crate) struct Outbox {
    protocol: Box<dyn VideoProtocol>,
    closed: Cell<bool>,
}

impl Outbox {
    pub(crate) fn new(protocol: Box<dyn VideoProtocol>) -> Self {
        Self {
            protocol,
            closed: Cell::new(false),
        }
    }

    pub(crate) fn protocol(&self) -> &dyn VideoProtocol {
        self.protocol.as_ref()
    }

    pub(crate) fn post<M: Command>(&self, message: &M) {
        if self.closed.get() {
            log::debug!("Ignoring message sent on closed channel");
            return;
        }

        if let Some(value) = encode(message) {
            self.protocol.post_message(value);
        }
    }

    /// Post a final message, then close the transport. Returns false if already closed.
    pub(crate) fn close_with<M: Command>(&self, farewell: &M) -> bool {
        if self.closed.get() {
            return false;
        }

        self.post(farewell);
        self.closed.set(true);
        self.protocol.close();
        true
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.closed.get()
    }
}
