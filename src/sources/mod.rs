//! Video platform access
//!
//! [`traits`] holds the seams the update job depends on, [`youtube`] the
//! YouTube Data API implementation and [`records`] the typed payloads it
//! produces.

pub mod records;
pub mod resolve;
pub mod traits;
pub mod youtube;

pub use records::{ChannelRecord, VideoRecord};
pub use resolve::{is_channel_id, resolve_channel_id};
pub use traits::{ChannelLookup, VideoPlatform};
pub use youtube::YouTubeApiClient;
