//! Helpers shared by async tests.

use std::cell::RefCell;
use std::rc::Rc;

use serde_json::Value;

use crate::protocol::VideoProtocol;

/// Let every local task run until the message queues drain
pub(crate) async fn settle() {
    for _ in 0..16 {
        tokio::task::yield_now().await;
    }
}

/// Collect everything `protocol` receives
pub(crate) fn record(protocol: &dyn VideoProtocol) -> Rc<RefCell<Vec<Value>>> {
    let log = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&log);
    protocol.set_on_message(Some(Box::new(move |message| sink.borrow_mut().push(message))));
    log
}

/// The `command` of each recorded message
pub(crate) fn commands(log: &RefCell<Vec<Value>>) -> Vec<String> {
    log.borrow()
        .iter()
        .map(|message| message["command"].as_str().unwrap_or_default().to_string())
        .collect()
}
