use crate::error::{PlannerError, Result};

/// Format seconds as zero-padded HH:MM:SS, flooring fractional seconds.
pub fn format_hms(seconds: f64) -> String {
    let total = if seconds.is_finite() && seconds > 0.0 {
        seconds.floor() as u64
    } else {
        0
    };
    let hours = total / 3600;
    let mins = (total / 60) % 60;
    let secs = total % 60;
    format!("{:02}:{:02}:{:02}", hours, mins, secs)
}

/// Parse `HH:MM:SS`, `MM:SS`, or `SS` into seconds.
pub fn parse_hms(input: &str) -> Result<f64> {
    let invalid = || PlannerError::InvalidDurationFormat {
        input: input.to_string(),
    };

    let cleaned = input.trim();
    if cleaned.is_empty() {
        return Err(invalid());
    }

    let parts = cleaned
        .split(':')
        .map(|p| p.trim().parse::<i64>().map_err(|_| invalid()))
        .collect::<Result<Vec<_>>>()?;

    let seconds = match parts.as_slice() {
        [h, m, s] => h
            .saturating_mul(3600)
            .saturating_add(m.saturating_mul(60))
            .saturating_add(*s),
        [m, s] => m.saturating_mul(60).saturating_add(*s),
        [s] => *s,
        _ => return Err(invalid()),
    };

    if seconds <= 0 {
        return Err(PlannerError::NonPositiveDuration {
            input: input.to_string(),
        });
    }

    Ok(seconds as f64)
}

pub fn format_course_summary(total_seconds: f64, lesson_count: usize) -> String {
    format!(
        "Total course duration: {} ({:.2} hours) • Mini-shiurim: {}",
        format_hms(total_seconds),
        total_seconds / 3600.0,
        lesson_count
    )
}
