use async_trait::async_trait;

use crate::{error::Result, types::SourceId};

/// Notifications a player's owner forwards to the playback loop.
#[derive(Debug, Clone, PartialEq)]
pub enum PlayerEvent {
    /// The range passed to the last `load` played to its end.
    Ended,
    Error(String),
}

/// The external video player, shared by duration resolution and playback.
///
/// Only one command is ever outstanding: callers hold it as `&mut dyn Player`.
#[async_trait]
pub trait Player: Send + Sync {
    fn is_ready(&self) -> bool;

    /// Prepare `id` without starting playback so its duration can be queried.
    async fn cue(&mut self, id: &SourceId) -> Result<()>;

    /// Duration of the cued source in seconds, `0.0` while unknown.
    fn duration(&self) -> f64;

    /// Play `[start, end)` of `id`, replacing whatever was playing.
    async fn load(&mut self, id: &SourceId, start: f64, end: f64) -> Result<()>;
}
