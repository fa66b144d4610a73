//! Consecutive-day solve streak.
//!
//! A convenience metric for the dashboard, not a persisted value. The walk
//! starts at `today`; if today has no solve the streak may still begin at
//! yesterday, but that allowance applies only at the start of the walk, never
//! to a later gap.

use chrono::NaiveDate;

/// Count consecutive calendar days with at least one solve, walking backward
/// from `today`. `solved_days` may be unsorted and may contain duplicates.
pub fn current_streak(solved_days: &[NaiveDate], today: NaiveDate) -> u32 {
    if solved_days.is_empty() {
        return 0;
    }

    let mut days: Vec<NaiveDate> = solved_days.to_vec();
    days.sort_unstable_by(|a, b| b.cmp(a));
    days.dedup();

    // Ignore anything after "today" (clock skew between client and server).
    let mut iter = days.into_iter().skip_while(|d| *d > today).peekable();

    let start = match iter.peek() {
        Some(d) if *d == today => today,
        // Yesterday allowance: only at the start of the walk.
        Some(d) if *d == today.pred_opt().expect("date underflow") => *d,
        _ => return 0,
    };

    let mut streak = 0u32;
    let mut expected = start;
    for day in iter {
        if day == expected {
            streak += 1;
            expected = match expected.pred_opt() {
                Some(prev) => prev,
                None => break,
            };
        } else {
            break;
        }
    }
    streak
}
