//! Persisted entities and the read-side views built from them

pub mod channel;
pub mod video;

pub use channel::Channel;
pub use video::{Video, VideoListEntry, VideoPublication};
