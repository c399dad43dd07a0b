//! Dashboard statistics.

use chrono::{DateTime, Duration, Utc};

use crate::Patient;

/// Width of the "new patients" window.
pub const RECENT_WINDOW_DAYS: i64 = 30;

/// Number of patients registered within the last [`RECENT_WINDOW_DAYS`] days.
///
/// The window is `now - 30 * 24h` inclusive up to `now`.
pub fn count_recent(patients: &[Patient], now: DateTime<Utc>) -> usize {
    let since = now - Duration::days(RECENT_WINDOW_DAYS);
    patients.iter().filter(|p| p.created_at >= since).count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone};
    use clinic_core::PatientId;

    fn registered_at(created_at: DateTime<Utc>) -> Patient {
        Patient {
            id: PatientId::new(),
            name: "Paciente".into(),
            birth_date: NaiveDate::from_ymd_opt(1990, 1, 1).unwrap(),
            notes: None,
            created_at,
        }
    }

    #[test]
    fn window_lower_bound_is_inclusive() {
        let now = Utc.with_ymd_and_hms(2024, 6, 30, 15, 0, 0).unwrap();
        let exactly = now - Duration::hours(30 * 24);
        let just_before = exactly - Duration::seconds(1);

        let patients = vec![
            registered_at(exactly),
            registered_at(just_before),
            registered_at(now),
        ];
        assert_eq!(count_recent(&patients, now), 2);
    }

    #[test]
    fn empty_set_counts_zero() {
        assert_eq!(count_recent(&[], Utc::now()), 0);
    }
}
