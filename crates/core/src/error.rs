use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PlannerError {
    #[error("Invalid duration \"{input}\": use HH:MM:SS, MM:SS, or SS (numbers only)")]
    InvalidDurationFormat { input: String },

    #[error("Mini-shiur duration \"{input}\" must be greater than 0 seconds")]
    NonPositiveDuration { input: String },

    #[error("Lesson length must be a positive number of seconds, got {length}")]
    InvalidLessonLength { length: f64 },

    #[error("Video {source_id} has an unusable duration ({duration})")]
    InvalidSourceDuration { source_id: String, duration: f64 },

    #[error("Unable to read video duration for {source_id}: the video may be restricted or unavailable")]
    DurationUnavailable { source_id: String },

    #[error("Player is not ready yet")]
    PlayerNotReady,

    #[error("Lesson {lesson} does not exist (plan has {len} lessons)")]
    LessonIndexOutOfRange { lesson: usize, len: usize },

    #[error("Invalid YouTube URL: {url}")]
    InvalidSourceUrl { url: String },

    #[error("Please enter at least one YouTube URL")]
    NoSources,

    #[error("Player command failed: {reason}")]
    Player { reason: String },
}

pub type Result<T> = std::result::Result<T, PlannerError>;
