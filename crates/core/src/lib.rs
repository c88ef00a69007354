//! Minishiur Core Library
//!
//! Splits a course made of several videos into fixed-length mini-lessons and
//! walks a lesson segment by segment through an external player.

pub mod duration;
pub mod error;
pub mod format;
pub mod partition;
pub mod playback;
pub mod player;
pub mod rows;
pub mod session;
pub mod types;
pub mod youtube;

// Re-export commonly used items at crate root
pub use duration::{DurationConfig, resolve_duration, resolve_sources};
pub use error::{PlannerError, Result};
pub use format::{format_course_summary, format_hms, parse_hms};
pub use partition::partition;
pub use playback::{
    LessonOutcome, PlaybackCommand, PlaybackController, PlaybackCursor, PlaybackEvent,
    PlaybackState, play_lesson, transition,
};
pub use player::{Player, PlayerEvent};
pub use rows::{CompletionSet, LessonRow, lesson_rows, plan_summary};
pub use session::PlannerSession;
pub use types::{Lesson, Plan, Segment, Source, SourceId, SourceRequest};
pub use youtube::{build_segment_url, extract_video_id, source_requests};
