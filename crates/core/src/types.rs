use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque identifier the player understands (a YouTube video id).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SourceId(pub String);

impl SourceId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SourceId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// A source video whose duration has not been resolved yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceRequest {
    pub id: SourceId,
    pub url: String,
}

impl SourceRequest {
    pub fn resolved(self, duration: f64) -> Source {
        Source {
            id: self.id,
            url: self.url,
            duration,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Source {
    pub id: SourceId,
    pub url: String,
    /// Seconds.
    pub duration: f64,
}

/// A `[start, end)` range of one source, in that source's local seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Segment {
    pub source_index: usize,
    pub start: f64,
    pub end: f64,
}

impl Segment {
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lesson {
    /// 1-based number shown to users.
    pub index: usize,
    pub start_global: f64,
    pub end_global: f64,
    pub segments: Vec<Segment>,
}

impl Lesson {
    pub fn duration(&self) -> f64 {
        self.end_global - self.start_global
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Plan {
    pub sources: Vec<Source>,
    pub lesson_length: f64,
    pub lessons: Vec<Lesson>,
}

impl Plan {
    pub fn is_empty(&self) -> bool {
        self.lessons.is_empty()
    }

    pub fn total_duration(&self) -> f64 {
        self.lessons.last().map(|l| l.end_global).unwrap_or(0.0)
    }

    /// Lesson by 0-based position.
    pub fn lesson(&self, position: usize) -> Option<&Lesson> {
        self.lessons.get(position)
    }

    pub fn source_for(&self, segment: &Segment) -> Option<&Source> {
        self.sources.get(segment.source_index)
    }
}
