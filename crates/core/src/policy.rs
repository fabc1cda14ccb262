use chrono::NaiveDate;
use thiserror::Error;

/// Why a candidate date is not bookable right now. Always recoverable; the
/// rendered message is what callers surface to the end user.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum WindowViolation {
    #[error("cannot book for past dates")]
    PastDate,
    #[error("bookings can only be made up to {horizon_days} days in advance; the requested date is {days_ahead} days ahead")]
    BeyondHorizon { horizon_days: i64, days_ahead: i64 },
}

/// The advance-booking window: a date is bookable when it falls within
/// `today..=today + horizon_days`, compared by calendar date only.
///
/// Both the availability engine's alternate-date search and the ledger's
/// commit path validate against the same window, so the horizon comes from
/// `BookingConfig` rather than a literal buried in either.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BookingWindow {
    horizon_days: i64,
}

impl BookingWindow {
    pub fn new(horizon_days: i64) -> Self {
        Self { horizon_days: horizon_days.max(0) }
    }

    pub fn horizon_days(&self) -> i64 {
        self.horizon_days
    }

    pub fn validate(&self, candidate: NaiveDate, today: NaiveDate) -> Result<(), WindowViolation> {
        if candidate < today {
            return Err(WindowViolation::PastDate);
        }

        let days_ahead = (candidate - today).num_days();
        if days_ahead > self.horizon_days {
            return Err(WindowViolation::BeyondHorizon {
                horizon_days: self.horizon_days,
                days_ahead,
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, NaiveDate};

    use super::{BookingWindow, WindowViolation};

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 8, 7).expect("valid date")
    }

    #[test]
    fn rejects_all_past_dates() {
        let window = BookingWindow::new(3);
        for days_back in 1..30 {
            let candidate = today() - Duration::days(days_back);
            assert_eq!(window.validate(candidate, today()), Err(WindowViolation::PastDate));
        }
    }

    #[test]
    fn accepts_today_through_horizon() {
        let window = BookingWindow::new(3);
        for days_ahead in 0..=3 {
            let candidate = today() + Duration::days(days_ahead);
            assert_eq!(window.validate(candidate, today()), Ok(()));
        }
    }

    #[test]
    fn rejects_beyond_horizon_reporting_distance() {
        let window = BookingWindow::new(3);
        let candidate = today() + Duration::days(4);
        assert_eq!(
            window.validate(candidate, today()),
            Err(WindowViolation::BeyondHorizon { horizon_days: 3, days_ahead: 4 })
        );

        let far = today() + Duration::days(45);
        assert_eq!(
            window.validate(far, today()),
            Err(WindowViolation::BeyondHorizon { horizon_days: 3, days_ahead: 45 })
        );
    }

    #[test]
    fn horizon_boundary_is_inclusive() {
        let window = BookingWindow::new(3);
        assert!(window.validate(today() + Duration::days(3), today()).is_ok());
        assert!(window.validate(today() + Duration::days(4), today()).is_err());
    }

    #[test]
    fn comparison_is_by_calendar_date() {
        // Same-day bookings are valid regardless of wall-clock time; the
        // policy never sees a time component at all.
        let window = BookingWindow::new(3);
        assert!(window.validate(today(), today()).is_ok());
    }
}
