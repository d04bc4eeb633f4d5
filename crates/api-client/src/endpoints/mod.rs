//! Endpoint-specific API implementations
//!
//! | Module | Remote | Description |
//! |--------|--------|-------------|
//! | `sidroid` | SI-Droid Event Result Service | IOF XML 3.0 results report, liveness ping |
//! | `ofeed` | OFeed REST API | IOF XML upload for an event |

pub mod ofeed;
pub mod sidroid;

pub use ofeed::OFeedApi;
pub use sidroid::SiDroidApi;
