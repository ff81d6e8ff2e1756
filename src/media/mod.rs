pub mod adapter;
pub mod element;

pub use adapter::MediaAdapter;
pub use element::{CanPlayHandler, MediaElement, HAVE_ENOUGH_DATA, HAVE_FUTURE_DATA};
