use log::debug;

use crate::{
    error::{PlannerError, Result},
    types::{Lesson, Plan, Segment, Source},
};

/// Remainders shorter than this are rounding noise, not a lesson.
const EPSILON: f64 = 1e-9;

/// Split the concatenation of `sources` into lessons of `lesson_length` seconds.
///
/// Lesson `k` covers `[k * len, min((k + 1) * len, total))` of the virtual
/// timeline and gets one segment per source it overlaps, in source order. A
/// lesson boundary that falls exactly on a source boundary starts the next
/// lesson in the next source, so no segment is ever zero-length. The last
/// lesson keeps whatever remains, however short, unless it is below
/// [`EPSILON`], in which case it is folded into the lesson before it.
pub fn partition(sources: Vec<Source>, lesson_length: f64) -> Result<Plan> {
    if !lesson_length.is_finite() || lesson_length <= 0.0 {
        return Err(PlannerError::InvalidLessonLength {
            length: lesson_length,
        });
    }
    if let Some(bad) = sources.iter().find(|s| !s.duration.is_finite()) {
        return Err(PlannerError::InvalidSourceDuration {
            source_id: bad.id.to_string(),
            duration: bad.duration,
        });
    }

    // Global [start, end) of each source on the concatenated timeline.
    let mut acc = 0.0;
    let spans: Vec<(f64, f64)> = sources
        .iter()
        .map(|s| {
            let start = acc;
            acc += s.duration.max(0.0);
            (start, acc)
        })
        .collect();
    let total = acc;

    let mut lessons = Vec::new();
    let mut k = 0usize;
    loop {
        let start_global = k as f64 * lesson_length;
        if start_global >= total - EPSILON {
            break;
        }
        let mut end_global = ((k + 1) as f64 * lesson_length).min(total);
        if total - end_global < EPSILON {
            end_global = total;
        }

        let segments = spans
            .iter()
            .zip(&sources)
            .enumerate()
            .filter_map(|(source_index, (&(src_start, src_end), source))| {
                let from = start_global.max(src_start);
                let to = end_global.min(src_end);
                (to > from).then(|| Segment {
                    source_index,
                    start: from - src_start,
                    end: if to == src_end {
                        source.duration
                    } else {
                        (to - src_start).min(source.duration)
                    },
                })
            })
            .collect::<Vec<_>>();

        lessons.push(Lesson {
            index: k + 1,
            start_global,
            end_global,
            segments,
        });
        k += 1;
    }

    debug!(
        "Partitioned {} sources ({:.1}s) into {} lessons of {:.1}s",
        sources.len(),
        total,
        lessons.len(),
        lesson_length
    );

    Ok(Plan {
        sources,
        lesson_length,
        lessons,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SourceId;

    fn sources(durations: &[f64]) -> Vec<Source> {
        durations
            .iter()
            .enumerate()
            .map(|(i, &duration)| Source {
                id: SourceId(format!("vid{i}")),
                url: format!("https://youtu.be/vid{i}"),
                duration,
            })
            .collect()
    }

    fn bounds(plan: &Plan) -> Vec<(f64, f64)> {
        plan.lessons
            .iter()
            .map(|l| (l.start_global, l.end_global))
            .collect()
    }

    fn seg(source_index: usize, start: f64, end: f64) -> Segment {
        Segment {
            source_index,
            start,
            end,
        }
    }

    #[test]
    fn single_source_splits_evenly() {
        let plan = partition(sources(&[90.0]), 30.0).unwrap();
        assert_eq!(bounds(&plan), [(0.0, 30.0), (30.0, 60.0), (60.0, 90.0)]);
        for lesson in &plan.lessons {
            assert_eq!(lesson.segments.len(), 1);
        }
        assert_eq!(plan.lessons[2].segments[0], seg(0, 60.0, 90.0));
        let indices: Vec<usize> = plan.lessons.iter().map(|l| l.index).collect();
        assert_eq!(indices, [1, 2, 3]);
    }

    #[test]
    fn lesson_spanning_two_sources_gets_two_segments() {
        let plan = partition(sources(&[20.0, 20.0]), 30.0).unwrap();
        assert_eq!(bounds(&plan), [(0.0, 30.0), (30.0, 40.0)]);
        assert_eq!(
            plan.lessons[0].segments,
            [seg(0, 0.0, 20.0), seg(1, 0.0, 10.0)]
        );
        assert_eq!(plan.lessons[1].segments, [seg(1, 10.0, 20.0)]);
    }

    #[test]
    fn short_final_lesson_is_kept() {
        let plan = partition(sources(&[100.0]), 30.0).unwrap();
        assert_eq!(plan.lessons.len(), 4);
        assert_eq!(bounds(&plan)[3], (90.0, 100.0));
        assert_eq!(plan.lessons[3].duration(), 10.0);
    }

    #[test]
    fn boundary_on_source_edge_starts_in_next_source() {
        let plan = partition(sources(&[30.0, 30.0]), 30.0).unwrap();
        assert_eq!(plan.lessons[0].segments, [seg(0, 0.0, 30.0)]);
        assert_eq!(plan.lessons[1].segments, [seg(1, 0.0, 30.0)]);
    }

    #[test]
    fn lesson_can_cover_several_short_sources() {
        let plan = partition(sources(&[5.0, 5.0, 5.0, 50.0]), 20.0).unwrap();
        assert_eq!(
            plan.lessons[0].segments,
            [
                seg(0, 0.0, 5.0),
                seg(1, 0.0, 5.0),
                seg(2, 0.0, 5.0),
                seg(3, 0.0, 5.0)
            ]
        );
        assert_eq!(plan.lessons[1].segments, [seg(3, 5.0, 25.0)]);
        assert_eq!(plan.lessons[3].segments, [seg(3, 45.0, 50.0)]);
    }

    #[test]
    fn lessons_are_contiguous_and_cover_the_total() {
        let durations = [613.0, 47.5, 1200.25, 3.0, 999.0];
        let total: f64 = durations.iter().sum();
        for length in [1.0, 7.5, 60.0, 600.0, 5000.0] {
            let plan = partition(sources(&durations), length).unwrap();
            assert_eq!(plan.lessons[0].start_global, 0.0);
            assert_eq!(plan.total_duration(), total);
            for pair in plan.lessons.windows(2) {
                assert_eq!(pair[0].end_global, pair[1].start_global);
            }
            for lesson in &plan.lessons {
                let covered: f64 = lesson.segments.iter().map(Segment::duration).sum();
                assert!((covered - lesson.duration()).abs() < 1e-6);
                for s in &lesson.segments {
                    assert!(s.start >= 0.0 && s.start < s.end);
                    assert!(s.end <= durations[s.source_index] + 1e-9);
                }
            }
        }
    }

    #[test]
    fn same_inputs_give_same_plan() {
        let a = partition(sources(&[321.0, 654.0]), 100.0).unwrap();
        let b = partition(sources(&[321.0, 654.0]), 100.0).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn empty_inputs_give_empty_plan() {
        assert!(partition(Vec::new(), 30.0).unwrap().is_empty());
        assert!(partition(sources(&[0.0]), 30.0).unwrap().is_empty());
    }

    #[test]
    fn zero_length_source_is_skipped() {
        let plan = partition(sources(&[10.0, 0.0, 10.0]), 15.0).unwrap();
        assert_eq!(
            plan.lessons[0].segments,
            [seg(0, 0.0, 10.0), seg(2, 0.0, 5.0)]
        );
    }

    #[test]
    fn rounding_leaves_no_sliver_lesson() {
        let plan = partition(sources(&[0.1, 0.2]), 0.3).unwrap();
        assert_eq!(plan.lessons.len(), 1);
        assert_eq!(plan.lessons[0].end_global, 0.1 + 0.2);
        assert_eq!(
            plan.lessons[0].segments,
            [seg(0, 0.0, 0.1), seg(1, 0.0, 0.2)]
        );
    }

    #[test]
    fn segment_ends_never_pass_their_source() {
        let durations = [0.1, 0.2, 0.7, 1.3, 0.3];
        for length in [0.1, 0.2, 0.3, 0.7] {
            let plan = partition(sources(&durations), length).unwrap();
            for s in plan.lessons.iter().flat_map(|l| &l.segments) {
                assert!(s.end <= durations[s.source_index]);
            }
        }
    }

    #[test]
    fn rejects_non_finite_source_duration() {
        for duration in [f64::INFINITY, f64::NEG_INFINITY, f64::NAN] {
            let err = partition(sources(&[10.0, duration]), 30.0).unwrap_err();
            assert!(matches!(
                err,
                PlannerError::InvalidSourceDuration { ref source_id, .. } if source_id == "vid1"
            ));
        }
    }

    #[test]
    fn rejects_bad_lesson_length() {
        for length in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            assert!(matches!(
                partition(sources(&[10.0]), length),
                Err(PlannerError::InvalidLessonLength { .. })
            ));
        }
    }
}
