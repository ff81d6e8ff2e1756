//! In-page transport between a document and an embedded frame.
//!
//! Every frame on the page shares one window bus. Envelopes are tagged with
//! the sender name and the frame id chosen for the session, and each side only
//! accepts envelopes from its peer in its own frame.

use serde_json::Value;

use crate::protocol::hub::{Endpoint, Hub};
use crate::protocol::{MessageHandler, VideoProtocol};

/// Window message as posted between frames
#[derive(Debug, Clone, PartialEq)]
pub struct WindowEnvelope {
    pub sender: String,
    pub frame_id: String,
    pub message: Value,
}

pub type WindowBus = Hub<WindowEnvelope>;

pub struct WindowMessageProtocol {
    source: String,
    frame_id: String,
    endpoint: Endpoint<WindowEnvelope>,
}

impl WindowMessageProtocol {
    pub fn open(bus: &WindowBus, source: &str, destination: &str, frame_id: &str) -> Self {
        let destination = destination.to_string();
        let expected_frame = frame_id.to_string();

        let endpoint = Endpoint::open(bus, move |envelope: WindowEnvelope| {
            if envelope.sender != destination || envelope.frame_id != expected_frame {
                return None;
            }
            Some(envelope.message)
        });

        Self {
            source: source.to_string(),
            frame_id: frame_id.to_string(),
            endpoint,
        }
    }

    pub fn frame_id(&self) -> &str {
        &self.frame_id
    }
}

impl VideoProtocol for WindowMessageProtocol {
    fn post_message(&self, message: Value) {
        self.endpoint.send(WindowEnvelope {
            sender: self.source.clone(),
            frame_id: self.frame_id.clone(),
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{PLAYER, VIDEO};
    use serde_json::json;
    use std::cell::RefCell;
    use std::rc::Rc;
    use tokio::task::LocalSet;

    fn record(protocol: &WindowMessageProtocol) -> Rc<RefCell<Vec<Value>>> {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        protocol.set_on_message(Some(Box::new(move |m| sink.borrow_mut().push(m))));
        seen
    }

    #[tokio::test]
    async fn test_frames_do_not_cross_talk() {
        LocalSet::new()
            .run_until(async {
                let bus = WindowBus::new();
                let player = WindowMessageProtocol::open(&bus, PLAYER, VIDEO, "frame-a");
                let video_a = WindowMessageProtocol::open(&bus, VIDEO, PLAYER, "frame-a");
                let video_b = WindowMessageProtocol::open(&bus, VIDEO, PLAYER, "frame-b");

                let at_player = record(&player);
                let at_a = record(&video_a);
                let at_b = record(&video_b);

                player.post_message(json!({"command": "init"}));
                video_b.post_message(json!({"command": "ready"}));
                video_a.post_message(json!({"command": "play", "echo": false}));
                tokio::task::yield_now().await;

                assert_eq!(*at_a.borrow(), vec![json!({"command": "init"})]);
                assert!(at_b.borrow().is_empty());
                assert_eq!(
                    *at_player.borrow(),
                    vec![json!({"command": "play", "echo": false})]
                );
            })
            .await;
    }
}
