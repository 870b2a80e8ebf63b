pub mod ghost_client;

pub use ghost_client::{ContentSource, GhostClient, GhostPost};
