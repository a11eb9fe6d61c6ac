//! Bridge channel adapter
//!
//! Talks to the Cheat Engine bridge subprocess over its standard streams.
//! Requests go out as one JSON object per line; responses come back as JSON
//! objects with no framing guarantees and are cut apart by
//! [`JsonFrameDecoder`].

pub mod channel;
pub mod error;
pub mod framing;
pub mod protocol;
pub mod transport;

pub use channel::{ChannelConfig, StdioChannel};
pub use error::BridgeError;
pub use framing::{DEFAULT_MAX_FRAME_BYTES, JsonFrameDecoder};
