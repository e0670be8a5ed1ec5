//! Slot generation.
//!
//! Pure functions: they turn a requested range into candidate blocks and
//! never look at stored appointments. Conflict filtering happens in
//! [`super::overlap`].

use chrono::{Duration, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use super::{SchedulingError, MAX_GENERATION_STEPS};
use crate::models::Reason;

/// Candidate half-open block `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimeBlock {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl TimeBlock {
    pub fn overlaps(&self, start: NaiveDateTime, end: NaiveDateTime) -> bool {
        self.start < end && start < self.end
    }
}

/// Availability upload: a range plus optional daily hour bounds ("HH:MM").
#[derive(Debug, Clone, Deserialize)]
pub struct AvailabilityRequest {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub reason: Reason,
    #[serde(default, alias = "minHour")]
    pub min_hour: Option<String>,
    #[serde(default, alias = "maxHour")]
    pub max_hour: Option<String>,
}

fn parse_hour(label: &str, raw: Option<&str>) -> Result<Option<NaiveTime>, SchedulingError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => NaiveTime::parse_from_str(s, "%H:%M")
            .map(Some)
            .map_err(|_| SchedulingError::InvalidRange(format!("{label} must use HH:MM, got {s:?}"))),
    }
}

fn block_length(reason: Reason) -> Result<Duration, SchedulingError> {
    let minutes = reason.duration_minutes();
    if minutes <= 0 {
        return Err(SchedulingError::InvalidRange(format!(
            "{reason} has a non-positive block duration"
        )));
    }
    Ok(Duration::minutes(minutes))
}

/// Generate daily-bounded blocks for an availability upload.
///
/// A start in the past is clamped to `now` (or to today's `min_hour` when
/// `now` is earlier than it). Blocks never cross midnight and never end
/// after `max_hour`; when the walk passes `max_hour` it resumes at the
/// next day's `min_hour`, or midnight when no lower bound is set.
pub fn generate(
    req: &AvailabilityRequest,
    now: NaiveDateTime,
) -> Result<Vec<TimeBlock>, SchedulingError> {
    let min = parse_hour("min_hour", req.min_hour.as_deref())?;
    let max = parse_hour("max_hour", req.max_hour.as_deref())?;
    if let (Some(min), Some(max)) = (min, max) {
        if min >= max {
            return Err(SchedulingError::InvalidRange(
                "min_hour must be before max_hour".into(),
            ));
        }
    }
    if req.start > req.end {
        return Err(SchedulingError::InvalidRange("start must not be after end".into()));
    }
    let step = block_length(req.reason)?;

    let mut start = req.start;
    if start < now {
        start = match min {
            Some(min) if now.time() < min => now.date().and_time(min),
            _ => now,
        };
    }
    if let Some(min) = min {
        if start.time() < min {
            start = start.date().and_time(min);
        }
    }
    if req.end < start {
        return Err(SchedulingError::InvalidRange(
            "range must end in the future".into(),
        ));
    }

    let day_start = min.unwrap_or(NaiveTime::MIN);
    let mut blocks = Vec::new();
    let mut cursor = start;
    let mut steps = 0usize;

    while cursor < req.end {
        steps += 1;
        if steps > MAX_GENERATION_STEPS {
            return Err(SchedulingError::InvalidRange(format!(
                "range too large: more than {MAX_GENERATION_STEPS} generation steps"
            )));
        }

        if let Some(max) = max {
            if cursor.time() >= max {
                cursor = next_day_at(cursor, day_start);
                continue;
            }
        }
        // Rolling over midnight without an upper bound lands before min_hour.
        if let Some(min) = min {
            if cursor.time() < min {
                cursor = cursor.date().and_time(min);
                continue;
            }
        }

        let block_end = cursor + step;
        if block_end > req.end {
            break;
        }

        let same_day = block_end.date() == cursor.date()
            || (block_end.time() == NaiveTime::MIN && max.is_none());
        let under_max = max.map_or(true, |max| block_end.time() <= max);
        if !same_day || !under_max {
            cursor = next_day_at(cursor, day_start);
            continue;
        }

        tracing::debug!(start = %cursor, end = %block_end, "generated block");
        blocks.push(TimeBlock {
            start: cursor,
            end: block_end,
        });
        cursor = block_end;
    }

    Ok(blocks)
}

fn next_day_at(cursor: NaiveDateTime, at: NaiveTime) -> NaiveDateTime {
    (cursor.date() + Duration::days(1)).and_time(at)
}

/// Tile `[start, end)` into back-to-back blocks with no daily bounds.
/// A trailing remainder shorter than one block is dropped.
pub fn tile(
    start: NaiveDateTime,
    end: NaiveDateTime,
    reason: Reason,
) -> Result<Vec<TimeBlock>, SchedulingError> {
    if start > end {
        return Err(SchedulingError::InvalidRange("start must not be after end".into()));
    }
    let step = block_length(reason)?;
    let count = (end - start).num_minutes() / step.num_minutes();
    if count > MAX_GENERATION_STEPS as i64 {
        return Err(SchedulingError::InvalidRange(format!(
            "range too large: more than {MAX_GENERATION_STEPS} blocks"
        )));
    }

    Ok((0..count)
        .map(|i| {
            let block_start = start + step * i as i32;
            TimeBlock {
                start: block_start,
                end: block_start + step,
            }
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn at(day: u32, h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, day)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    fn request(start: NaiveDateTime, end: NaiveDateTime, min: Option<&str>, max: Option<&str>) -> AvailabilityRequest {
        AvailabilityRequest {
            start,
            end,
            reason: Reason::Control,
            min_hour: min.map(String::from),
            max_hour: max.map(String::from),
        }
    }

    #[test]
    fn morning_window_yields_eight_blocks() {
        let now = NaiveDate::from_ymd_opt(2023, 12, 31).unwrap().and_hms_opt(12, 0, 0).unwrap();
        let blocks = generate(&request(at(1, 8, 0), at(1, 12, 0), Some("09:00"), Some("11:00")), now).unwrap();

        assert_eq!(blocks.len(), 8);
        assert_eq!(blocks[0].start, at(1, 9, 0));
        assert_eq!(blocks[7].end, at(1, 11, 0));
        assert!(blocks.iter().all(|b| b.start >= at(1, 9, 0) && b.end <= at(1, 11, 0)));
        assert!(blocks.windows(2).all(|w| w[0].end == w[1].start));
    }

    #[test]
    fn multi_day_range_resumes_at_min_hour() {
        let now = at(1, 0, 0);
        let blocks = generate(&request(at(2, 0, 0), at(4, 0, 0), Some("09:00"), Some("10:00")), now).unwrap();

        assert_eq!(blocks.len(), 8);
        assert_eq!(blocks[4].start, at(3, 9, 0));
        assert!(blocks.iter().all(|b| b.start.date() == b.end.date()));
    }

    #[test]
    fn lower_bound_only_skips_to_next_min_hour_after_midnight() {
        let now = at(1, 0, 0);
        let blocks = generate(&request(at(2, 23, 0), at(3, 10, 0), Some("09:00"), None), now).unwrap();

        assert_eq!(blocks.len(), 8);
        assert_eq!(blocks[3].end, at(3, 0, 0));
        assert_eq!(blocks[4].start, at(3, 9, 0));
        assert!(blocks.iter().all(|b| b.start.time() >= NaiveTime::from_hms_opt(9, 0, 0).unwrap()));
    }

    #[test]
    fn past_start_clamps_to_now() {
        let now = at(1, 9, 30);
        let blocks = generate(&request(at(1, 8, 0), at(1, 10, 0), None, None), now).unwrap();
        assert_eq!(blocks.first().unwrap().start, at(1, 9, 30));
        assert_eq!(blocks.len(), 2);
    }

    #[test]
    fn past_start_before_min_clamps_to_min_today() {
        let now = at(1, 6, 0);
        let blocks = generate(&request(at(1, 0, 0), at(1, 9, 30), Some("09:00"), None), now).unwrap();
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].start, at(1, 9, 0));
    }

    #[test]
    fn inverted_hours_rejected() {
        let err = generate(&request(at(2, 8, 0), at(2, 12, 0), Some("11:00"), Some("09:00")), at(1, 0, 0)).unwrap_err();
        assert!(matches!(err, SchedulingError::InvalidRange(_)));

        let err = generate(&request(at(2, 8, 0), at(2, 12, 0), Some("10:00"), Some("10:00")), at(1, 0, 0)).unwrap_err();
        assert!(matches!(err, SchedulingError::InvalidRange(_)));
    }

    #[test]
    fn malformed_hour_rejected() {
        let err = generate(&request(at(2, 8, 0), at(2, 12, 0), Some("9am"), None), at(1, 0, 0)).unwrap_err();
        assert!(matches!(err, SchedulingError::InvalidRange(_)));
    }

    #[test]
    fn start_after_end_rejected() {
        let err = generate(&request(at(3, 8, 0), at(2, 12, 0), None, None), at(1, 0, 0)).unwrap_err();
        assert!(matches!(err, SchedulingError::InvalidRange(_)));
    }

    #[test]
    fn fully_past_range_rejected() {
        let err = generate(&request(at(1, 8, 0), at(1, 9, 0), None, None), at(2, 0, 0)).unwrap_err();
        assert!(matches!(err, SchedulingError::InvalidRange(_)));
    }

    #[test]
    fn huge_range_hits_step_ceiling() {
        let end = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap().and_hms_opt(0, 0, 0).unwrap();
        let err = generate(&request(at(2, 0, 0), end, None, None), at(1, 0, 0)).unwrap_err();
        assert!(matches!(err, SchedulingError::InvalidRange(_)));
    }

    #[test]
    fn tile_drops_short_remainder() {
        let blocks = tile(at(2, 9, 0), at(2, 10, 10), Reason::Control).unwrap();
        assert_eq!(blocks.len(), 4);
        assert_eq!(blocks[3].end, at(2, 10, 0));
    }

    #[test]
    fn tile_empty_when_range_shorter_than_block() {
        assert!(tile(at(2, 9, 0), at(2, 9, 10), Reason::Control).unwrap().is_empty());
    }

    #[test]
    fn block_overlap_is_half_open() {
        let b = TimeBlock { start: at(2, 9, 0), end: at(2, 9, 15) };
        assert!(!b.overlaps(at(2, 9, 15), at(2, 9, 30)));
        assert!(b.overlaps(at(2, 9, 14), at(2, 9, 30)));
    }
}
