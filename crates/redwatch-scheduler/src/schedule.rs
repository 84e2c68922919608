use chrono::{DateTime, Datelike, Duration, Local, TimeZone, Utc};

use crate::types::Schedule;

/// Compute the next UTC execution time for `schedule` starting *after*
/// `from`.
///
/// Returns `None` when the schedule is exhausted (a `Once` job whose
/// time has already passed).
pub fn compute_next_run(schedule: &Schedule, from: DateTime<Utc>) -> Option<DateTime<Utc>> {
    match schedule {
        Schedule::Once { at } => {
            // Fire only if the instant is still in the future.
            if *at > from {
                Some(*at)
            } else {
                None
            }
        }

        Schedule::Interval { every_secs } => Some(from + Duration::seconds(*every_secs as i64)),

        Schedule::Daily { hour, minute } => {
            // Build today's candidate at HH:MM:00 in local time, then
            // compare in UTC.
            let local_from = from.with_timezone(&Local);
            let candidate = Local
                .with_ymd_and_hms(
                    local_from.year(),
                    local_from.month(),
                    local_from.day(),
                    *hour as u32,
                    *minute as u32,
                    0,
                )
                .single()?
                .with_timezone(&Utc);
            if candidate > from {
                Some(candidate)
            } else {
                // Today's window has passed, advance to tomorrow.
                Some(candidate + Duration::days(1))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    #[test]
    fn once_in_future_fires_once() {
        let from = Utc::now();
        let at = from + Duration::hours(1);
        assert_eq!(compute_next_run(&Schedule::Once { at }, from), Some(at));
    }

    #[test]
    fn once_in_past_is_exhausted() {
        let from = Utc::now();
        let at = from - Duration::hours(1);
        assert_eq!(compute_next_run(&Schedule::Once { at }, from), None);
    }

    #[test]
    fn interval_adds_seconds() {
        let from = Utc::now();
        let next = compute_next_run(&Schedule::Interval { every_secs: 3600 }, from).unwrap();
        assert_eq!(next - from, Duration::seconds(3600));
    }

    #[test]
    fn daily_picks_today_when_time_remains() {
        // Anchor "now" at 01:00 local so a 03:00 schedule lands today.
        let local_now = Local::now();
        let from = Local
            .with_ymd_and_hms(local_now.year(), local_now.month(), local_now.day(), 1, 0, 0)
            .single()
            .unwrap()
            .with_timezone(&Utc);

        let next = compute_next_run(&Schedule::Daily { hour: 3, minute: 0 }, from).unwrap();
        let next_local = next.with_timezone(&Local);
        assert_eq!(next_local.hour(), 3);
        assert_eq!(next_local.minute(), 0);
        assert!(next > from);
        assert!(next - from <= Duration::hours(3));
    }

    #[test]
    fn daily_rolls_to_tomorrow_when_passed() {
        let local_now = Local::now();
        let from = Local
            .with_ymd_and_hms(local_now.year(), local_now.month(), local_now.day(), 4, 0, 0)
            .single()
            .unwrap()
            .with_timezone(&Utc);

        let next = compute_next_run(&Schedule::Daily { hour: 3, minute: 0 }, from).unwrap();
        assert!(next > from);
        assert!(next - from > Duration::hours(20));
        assert!(next - from <= Duration::hours(24));
    }
}
