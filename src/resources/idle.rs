use time::OffsetDateTime;

/// Idle duration becomes urgent at two whole calendar months.
pub const URGENT_THRESHOLD_MONTHS: i32 = 2;

/// Fields derived from `idle_from` on every persist. Never accepted from
/// callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdleFields {
    pub duration_months: i32,
    pub is_urgent: bool,
}

/// Whole calendar months between two instants: year difference times twelve
/// plus month difference. Day-of-month is ignored, so crossing a month
/// boundary counts a full month regardless of the day. A future `idle_from`
/// yields a negative count.
pub fn months_between(from: OffsetDateTime, now: OffsetDateTime) -> i32 {
    (now.year() - from.year()) * 12 + (u8::from(now.month()) as i32 - u8::from(from.month()) as i32)
}

pub fn derive(idle_from: OffsetDateTime, now: OffsetDateTime) -> IdleFields {
    let duration_months = months_between(idle_from, now);
    IdleFields {
        duration_months,
        is_urgent: duration_months >= URGENT_THRESHOLD_MONTHS,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn exactly_two_months_same_day_is_urgent() {
        let fields = derive(datetime!(2025-04-15 09:00 UTC), datetime!(2025-06-15 09:00 UTC));
        assert_eq!(fields.duration_months, 2);
        assert!(fields.is_urgent);
    }

    #[test]
    fn one_month_and_29_days_is_not_urgent() {
        // May 1 → Jun 30 is 59 elapsed days but only one calendar month.
        let fields = derive(datetime!(2025-05-01 09:00 UTC), datetime!(2025-06-30 09:00 UTC));
        assert_eq!(fields.duration_months, 1);
        assert!(!fields.is_urgent);
    }

    #[test]
    fn month_granularity_ignores_day_of_month() {
        // Jan 31 → Feb 1 is one "month" despite being a single day.
        assert_eq!(
            months_between(datetime!(2025-01-31 00:00 UTC), datetime!(2025-02-01 00:00 UTC)),
            1
        );
        // Jan 1 → Feb 28 is still one month.
        assert_eq!(
            months_between(datetime!(2025-01-01 00:00 UTC), datetime!(2025-02-28 00:00 UTC)),
            1
        );
    }

    #[test]
    fn same_month_is_zero() {
        let fields = derive(datetime!(2025-06-01 00:00 UTC), datetime!(2025-06-30 23:59 UTC));
        assert_eq!(fields.duration_months, 0);
        assert!(!fields.is_urgent);
    }

    #[test]
    fn spans_year_boundary() {
        assert_eq!(
            months_between(datetime!(2024-11-10 00:00 UTC), datetime!(2025-02-10 00:00 UTC)),
            3
        );
    }

    #[test]
    fn future_idle_from_is_negative_and_not_urgent() {
        let fields = derive(datetime!(2025-09-01 00:00 UTC), datetime!(2025-06-15 00:00 UTC));
        assert_eq!(fields.duration_months, -3);
        assert!(!fields.is_urgent);
    }
}
