//! Prescription expansion — turns a dose-series definition into the
//! concrete set of dated-and-timed reminder occurrences.
//!
//! A series is `(start date, optional end date, time of day, frequency)`.
//! Expansion is synchronous and all-or-nothing: either every occurrence
//! row for the series is persisted or none are.

use chrono::{Days, Months, NaiveDate, NaiveDateTime, NaiveTime};
use rusqlite::{params, Connection};

use crate::db::DatabaseError;
use crate::models::reminder::format_remind_at;
use crate::models::Frequency;

/// A prescription's dosing schedule, as entered by the user.
#[derive(Debug, Clone)]
pub struct DoseSeries {
    pub start_date: NaiveDate,
    /// Absent means a single dose on the start date.
    pub end_date: Option<NaiveDate>,
    pub time_of_day: NaiveTime,
    pub frequency: Frequency,
}

/// The nth calendar date of a series, counted from the start date.
///
/// Monthly steps are taken from the original start date, so a series
/// starting on the 31st lands on the 31st of every month that has one
/// and is clamped to the last valid day of shorter months
/// (Jan 31 → Feb 28 → Mar 31).
fn nth_occurrence_date(start: NaiveDate, frequency: Frequency, n: u32) -> Option<NaiveDate> {
    match frequency {
        Frequency::Daily => start.checked_add_days(Days::new(u64::from(n))),
        Frequency::Weekly => start.checked_add_days(Days::new(7 * u64::from(n))),
        Frequency::Monthly => start.checked_add_months(Months::new(n)),
        Frequency::OneTime => (n == 0).then_some(start),
    }
}

/// Expand a series into its ordered occurrence timestamps.
///
/// The end date is inclusive: a dose falling exactly on it is emitted.
/// An end date before the start date yields no occurrences.
pub fn occurrence_times(series: &DoseSeries) -> Vec<NaiveDateTime> {
    let end = match series.end_date {
        Some(end) => end,
        None => return vec![series.start_date.and_time(series.time_of_day)],
    };

    let mut times = Vec::new();
    let mut n = 0;
    while let Some(date) = nth_occurrence_date(series.start_date, series.frequency, n) {
        if date > end {
            break;
        }
        times.push(date.and_time(series.time_of_day));
        n += 1;
    }
    times
}

/// Insert one pending reminder per occurrence of the series.
///
/// Callers compose this into a wider transaction (medicine + series);
/// use [`create_series`] for a standalone all-or-nothing expansion.
pub fn insert_series(
    conn: &Connection,
    medicine_id: i64,
    series: &DoseSeries,
) -> Result<usize, DatabaseError> {
    let times = occurrence_times(series);
    let mut stmt = conn.prepare(
        "INSERT INTO reminders (medicine_id, remind_at, status) VALUES (?1, ?2, 'pending')",
    )?;
    for ts in &times {
        stmt.execute(params![medicine_id, format_remind_at(ts)])?;
    }
    Ok(times.len())
}

/// Expand and persist a series in its own transaction.
///
/// A failure partway rolls back every insert of this call.
pub fn create_series(
    conn: &mut Connection,
    medicine_id: i64,
    series: &DoseSeries,
) -> Result<usize, DatabaseError> {
    let tx = conn.transaction()?;
    let created = insert_series(&tx, medicine_id, series)?;
    tx.commit()?;
    Ok(created)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::{insert_medicine, insert_user};
    use crate::db::sqlite::open_memory_database;
    use crate::models::Role;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn series(
        start: NaiveDate,
        end: Option<NaiveDate>,
        time: &str,
        frequency: Frequency,
    ) -> DoseSeries {
        DoseSeries {
            start_date: start,
            end_date: end,
            time_of_day: NaiveTime::parse_from_str(time, "%H:%M").unwrap(),
            frequency,
        }
    }

    #[test]
    fn daily_count_is_inclusive_day_count() {
        let s = series(
            date(2025, 1, 1),
            Some(date(2025, 1, 10)),
            "08:00",
            Frequency::Daily,
        );
        assert_eq!(occurrence_times(&s).len(), 10);
    }

    #[test]
    fn daily_three_day_scenario() {
        let s = series(
            date(2025, 1, 1),
            Some(date(2025, 1, 3)),
            "08:00",
            Frequency::Daily,
        );
        let times = occurrence_times(&s);
        let formatted: Vec<String> = times.iter().map(format_remind_at).collect();
        assert_eq!(
            formatted,
            vec![
                "2025-01-01 08:00:00",
                "2025-01-02 08:00:00",
                "2025-01-03 08:00:00",
            ]
        );
    }

    #[test]
    fn weekly_occurrences_are_seven_days_apart() {
        let s = series(
            date(2025, 1, 1),
            Some(date(2025, 2, 1)),
            "09:30",
            Frequency::Weekly,
        );
        let times = occurrence_times(&s);
        assert_eq!(times.len(), 5);
        for pair in times.windows(2) {
            assert_eq!((pair[1] - pair[0]).num_days(), 7);
        }
        assert!(times.last().unwrap().date() <= date(2025, 2, 1));
    }

    #[test]
    fn missing_end_date_means_single_occurrence() {
        let s = series(date(2025, 1, 1), None, "08:00", Frequency::Daily);
        assert_eq!(occurrence_times(&s).len(), 1);
    }

    #[test]
    fn one_time_ignores_end_date() {
        let s = series(
            date(2025, 1, 1),
            Some(date(2025, 12, 31)),
            "08:00",
            Frequency::OneTime,
        );
        let times = occurrence_times(&s);
        assert_eq!(times.len(), 1);
        assert_eq!(times[0].date(), date(2025, 1, 1));
    }

    #[test]
    fn end_before_start_yields_nothing() {
        let s = series(
            date(2025, 1, 10),
            Some(date(2025, 1, 1)),
            "08:00",
            Frequency::Daily,
        );
        assert!(occurrence_times(&s).is_empty());
    }

    #[test]
    fn end_date_is_inclusive_for_monthly() {
        let s = series(
            date(2025, 1, 15),
            Some(date(2025, 3, 15)),
            "20:00",
            Frequency::Monthly,
        );
        let times = occurrence_times(&s);
        assert_eq!(times.len(), 3);
        assert_eq!(times[2].date(), date(2025, 3, 15));
    }

    #[test]
    fn monthly_clamps_short_months_but_keeps_start_day() {
        let s = series(
            date(2025, 1, 31),
            Some(date(2025, 4, 15)),
            "08:00",
            Frequency::Monthly,
        );
        let dates: Vec<NaiveDate> = occurrence_times(&s).iter().map(|t| t.date()).collect();
        assert_eq!(
            dates,
            vec![date(2025, 1, 31), date(2025, 2, 28), date(2025, 3, 31)]
        );
    }

    #[test]
    fn monthly_clamps_to_leap_day() {
        let s = series(
            date(2024, 1, 31),
            Some(date(2024, 2, 29)),
            "08:00",
            Frequency::Monthly,
        );
        let dates: Vec<NaiveDate> = occurrence_times(&s).iter().map(|t| t.date()).collect();
        assert_eq!(dates, vec![date(2024, 1, 31), date(2024, 2, 29)]);
    }

    #[test]
    fn monthly_rolls_over_year_boundary() {
        let s = series(
            date(2024, 11, 15),
            Some(date(2025, 1, 15)),
            "08:00",
            Frequency::Monthly,
        );
        let dates: Vec<NaiveDate> = occurrence_times(&s).iter().map(|t| t.date()).collect();
        assert_eq!(
            dates,
            vec![date(2024, 11, 15), date(2024, 12, 15), date(2025, 1, 15)]
        );
    }

    #[test]
    fn create_series_persists_pending_rows() {
        let mut conn = open_memory_database().unwrap();
        let user = insert_user(&conn, "Hana", "hana@example.com", "h", Role::Client).unwrap();
        let med = insert_medicine(&conn, Some(user), "Aspirin", "100mg", None).unwrap();

        let s = series(
            date(2025, 1, 1),
            Some(date(2025, 1, 3)),
            "08:00",
            Frequency::Daily,
        );
        let created = create_series(&mut conn, med, &s).unwrap();
        assert_eq!(created, 3);

        let pending: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM reminders WHERE medicine_id = ?1 AND status = 'pending'",
                [med],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(pending, 3);
    }

    #[test]
    fn failed_expansion_persists_nothing() {
        let mut conn = open_memory_database().unwrap();
        // No such medicine — the first insert violates the foreign key.
        let s = series(
            date(2025, 1, 1),
            Some(date(2025, 1, 3)),
            "08:00",
            Frequency::Daily,
        );
        assert!(create_series(&mut conn, 42, &s).is_err());

        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM reminders", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 0);
    }
}
