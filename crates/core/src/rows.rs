use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::{
    format::{format_course_summary, format_hms},
    types::Plan,
    youtube::build_segment_url,
};

/// One table row per lesson, in the shape the front end persists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonRow {
    /// 1-based lesson number.
    pub index: usize,
    pub start_label: String,
    pub end_label: String,
    /// 0-based position to hand back to playback.
    pub lesson: usize,
    /// Deep link to where the lesson starts in its first video.
    pub url: String,
}

pub fn lesson_rows(plan: &Plan) -> Vec<LessonRow> {
    plan.lessons
        .iter()
        .enumerate()
        .map(|(position, lesson)| {
            let url = lesson
                .segments
                .first()
                .and_then(|seg| plan.source_for(seg).map(|src| (seg, src)))
                .map(|(seg, src)| build_segment_url(&src.url, seg.start))
                .unwrap_or_default();
            LessonRow {
                index: lesson.index,
                start_label: format_hms(lesson.start_global),
                end_label: format_hms(lesson.end_global),
                lesson: position,
                url,
            }
        })
        .collect()
}

pub fn plan_summary(plan: &Plan) -> String {
    format_course_summary(plan.total_duration(), plan.lessons.len())
}

/// Completed lessons by 1-based index.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CompletionSet(BTreeSet<usize>);

impl CompletionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mark(&mut self, index: usize) -> bool {
        self.0.insert(index)
    }

    pub fn unmark(&mut self, index: usize) -> bool {
        self.0.remove(&index)
    }

    /// Flip `index`; returns whether it is now complete.
    pub fn toggle(&mut self, index: usize) -> bool {
        if self.0.remove(&index) {
            false
        } else {
            self.0.insert(index);
            true
        }
    }

    pub fn is_complete(&self, index: usize) -> bool {
        self.0.contains(&index)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.0.iter().copied()
    }

    /// Drop marks for lessons that no longer have a row.
    pub fn retain_rows(&mut self, rows: &[LessonRow]) {
        let present: BTreeSet<usize> = rows.iter().map(|r| r.index).collect();
        self.0.retain(|i| present.contains(i));
    }
}

impl FromIterator<usize> for CompletionSet {
    fn from_iter<T: IntoIterator<Item = usize>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        partition::partition,
        types::{Source, SourceId},
    };

    fn plan() -> Plan {
        let sources = vec![
            Source {
                id: SourceId::from("a"),
                url: "https://www.youtube.com/watch?v=a".into(),
                duration: 3000.0,
            },
            Source {
                id: SourceId::from("b"),
                url: "https://youtu.be/b".into(),
                duration: 1500.0,
            },
        ];
        partition(sources, 1800.0).unwrap()
    }

    #[test]
    fn one_row_per_lesson_with_deep_link() {
        let rows = lesson_rows(&plan());
        assert_eq!(rows.len(), 3);
        assert_eq!(
            rows[1],
            LessonRow {
                index: 2,
                start_label: "00:30:00".into(),
                end_label: "01:00:00".into(),
                lesson: 1,
                url: "https://www.youtube.com/watch?v=a&t=1800".into(),
            }
        );
        assert_eq!(rows[2].url, "https://youtu.be/b?t=600");
        assert_eq!(rows[2].end_label, "01:15:00");
    }

    #[test]
    fn rows_serialize_for_storage() {
        let rows = lesson_rows(&plan());
        let json = serde_json::to_value(&rows[0]).unwrap();
        assert_eq!(json["startLabel"], "00:00:00");
        assert_eq!(json["lesson"], 0);
        let back: Vec<LessonRow> =
            serde_json::from_str(&serde_json::to_string(&rows).unwrap()).unwrap();
        assert_eq!(back, rows);
    }

    #[test]
    fn summary_counts_lessons() {
        assert_eq!(
            plan_summary(&plan()),
            "Total course duration: 01:15:00 (1.25 hours) • Mini-shiurim: 3"
        );
    }

    #[test]
    fn completion_marks_and_trims_to_rows() {
        let mut done = CompletionSet::new();
        assert!(done.toggle(2));
        assert!(done.mark(5));
        assert!(!done.mark(5));
        assert!(!done.toggle(2));
        done.mark(1);

        let rows = lesson_rows(&plan());
        done.retain_rows(&rows);
        assert_eq!(done.iter().collect::<Vec<_>>(), [1]);
        assert_eq!(serde_json::to_string(&done).unwrap(), "[1]");
    }
}
