//! Time accounting over raw shift boundaries.
//!
//! Pure and deterministic. Boundary ordering is not validated: a leg whose
//! exit precedes its entry yields a negative duration.

use chrono::{Datelike, Days, NaiveDate, NaiveTime, Weekday};

use crate::contract::model::{
    DailySummary, EntryStatus, PeriodSummary, ShiftLeg, SignedMinutes, TimeEntry, WeekDay,
    WeeklyBucket,
};

/// Standard daily workload used as the overtime threshold.
pub const DEFAULT_STANDARD_MINUTES: i64 = 480;

/// Minutes between `entry` and `exit`; zero unless both are present.
pub fn shift_minutes(entry: Option<NaiveTime>, exit: Option<NaiveTime>) -> i64 {
    match (entry, exit) {
        (Some(entry), Some(exit)) => (exit - entry).num_minutes(),
        _ => 0,
    }
}

pub fn leg_minutes(leg: &ShiftLeg) -> i64 {
    shift_minutes(leg.entry, leg.exit)
}

/// Sum of both legs. The gap between the legs is never added, so nothing
/// is subtracted for it either.
pub fn daily_worked_minutes(entry: &TimeEntry) -> i64 {
    leg_minutes(&entry.shift1) + leg_minutes(&entry.shift2)
}

/// `(normal, overtime)` split of a day's minutes.
pub fn overtime_split(daily_minutes: i64, standard_minutes: i64) -> (i64, i64) {
    let normal = daily_minutes.min(standard_minutes);
    let overtime = (daily_minutes - standard_minutes).max(0);
    (normal, overtime)
}

pub fn daily_summary(entry: &TimeEntry, standard_minutes: i64) -> DailySummary {
    let worked = daily_worked_minutes(entry);
    let (normal, overtime) = overtime_split(worked, standard_minutes);
    DailySummary {
        worked,
        normal,
        overtime,
    }
}

/// Worked minutes over `entries` minus what `assumed_working_days` should have produced.
pub fn signed_balance(
    entries: &[TimeEntry],
    expected_minutes_per_day: i64,
    assumed_working_days: i64,
) -> SignedMinutes {
    let worked: i64 = entries.iter().map(daily_worked_minutes).sum();
    SignedMinutes(worked - assumed_working_days * expected_minutes_per_day)
}

/// Monday of the week containing `day`.
pub fn week_start(day: NaiveDate) -> NaiveDate {
    let offset = u64::from(day.weekday().num_days_from_monday());
    day.checked_sub_days(Days::new(offset)).unwrap_or(day)
}

/// Bucket entries into the seven days of the week containing `today`.
///
/// Pending and approved entries count their worked minutes; a rejected day
/// keeps its status but contributes zero.
pub fn weekly_bucket(entries: &[TimeEntry], today: NaiveDate) -> WeeklyBucket {
    let start = week_start(today);
    let days: Vec<WeekDay> = start
        .iter_days()
        .take(7)
        .map(|date| {
            let mut day = WeekDay {
                date,
                minutes: 0,
                status: None,
            };
            for entry in entries.iter().filter(|e| e.date == date) {
                day.status = Some(entry.status);
                if counts_toward_totals(entry.status) {
                    day.minutes += daily_worked_minutes(entry);
                }
            }
            day
        })
        .collect();
    let total = days.iter().map(|d| d.minutes).sum();
    WeeklyBucket {
        week_start: start,
        days,
        total,
    }
}

/// Monday to Friday days in the inclusive range; zero when `to < from`.
pub fn working_days(from: NaiveDate, to: NaiveDate) -> i64 {
    if to < from {
        return 0;
    }
    from.iter_days()
        .take_while(|d| *d <= to)
        .filter(|d| !matches!(d.weekday(), Weekday::Sat | Weekday::Sun))
        .count() as i64
}

/// Totals over the inclusive date range, ignoring rejected entries.
pub fn period_summary(
    entries: &[TimeEntry],
    from: NaiveDate,
    to: NaiveDate,
    standard_minutes: i64,
    expected_minutes_per_day: i64,
) -> PeriodSummary {
    let counted: Vec<TimeEntry> = entries
        .iter()
        .filter(|e| e.date >= from && e.date <= to && counts_toward_totals(e.status))
        .cloned()
        .collect();

    let mut totals = DailySummary::default();
    for entry in &counted {
        let day = daily_summary(entry, standard_minutes);
        totals.worked += day.worked;
        totals.normal += day.normal;
        totals.overtime += day.overtime;
    }

    let days = working_days(from, to);
    PeriodSummary {
        from,
        to,
        worked: totals.worked,
        normal: totals.normal,
        overtime: totals.overtime,
        working_days: days,
        expected: days * expected_minutes_per_day,
        balance: signed_balance(&counted, expected_minutes_per_day, days),
    }
}

/// `HH:MM`, with a leading `-` for negative values.
pub fn format_minutes(minutes: i64) -> String {
    let abs = minutes.unsigned_abs();
    let sign = if minutes < 0 { "-" } else { "" };
    format!("{sign}{:02}:{:02}", abs / 60, abs % 60)
}

fn counts_toward_totals(status: EntryStatus) -> bool {
    matches!(status, EntryStatus::Pending | EntryStatus::Approved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn entry(date: NaiveDate, status: EntryStatus, s1: ShiftLeg, s2: ShiftLeg) -> TimeEntry {
        TimeEntry {
            id: Uuid::new_v4(),
            owner_id: Uuid::new_v4(),
            tenant_id: Uuid::new_v4(),
            date,
            shift1: s1,
            shift2: s2,
            observation: None,
            status,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn full_day(date: NaiveDate, status: EntryStatus) -> TimeEntry {
        entry(
            date,
            status,
            ShiftLeg::closed(t(8, 0), t(12, 0)),
            ShiftLeg::closed(t(13, 0), t(18, 0)),
        )
    }

    #[test]
    fn two_legs_sum_without_break() {
        let e = full_day(d(2024, 1, 10), EntryStatus::Pending);
        assert_eq!(daily_worked_minutes(&e), 540);
        assert_eq!(overtime_split(540, DEFAULT_STANDARD_MINUTES), (480, 60));
    }

    #[test]
    fn open_leg_counts_zero() {
        let e = entry(
            d(2024, 1, 10),
            EntryStatus::Pending,
            ShiftLeg::closed(t(8, 0), t(12, 0)),
            ShiftLeg::new(Some(t(13, 0)), None),
        );
        assert_eq!(daily_worked_minutes(&e), 240);
        assert_eq!(shift_minutes(None, Some(t(12, 0))), 0);
        assert_eq!(shift_minutes(None, None), 0);
    }

    #[test]
    fn reversed_boundaries_are_not_validated() {
        assert_eq!(shift_minutes(Some(t(12, 0)), Some(t(8, 0))), -240);
    }

    #[test]
    fn split_below_standard_has_no_overtime() {
        assert_eq!(overtime_split(300, 480), (300, 0));
        assert_eq!(overtime_split(480, 480), (480, 0));
    }

    #[test]
    fn balance_is_signed() {
        let entries = vec![
            full_day(d(2024, 1, 8), EntryStatus::Approved),
            full_day(d(2024, 1, 9), EntryStatus::Approved),
        ];
        let b = signed_balance(&entries, 480, 2);
        assert_eq!(b, SignedMinutes(120));
        assert_eq!(b.to_string(), "+02:00");

        let b = signed_balance(&entries, 480, 3);
        assert_eq!(b.to_string(), "-06:00");
        assert_eq!(SignedMinutes(0).to_string(), "+00:00");
    }

    #[test]
    fn week_starts_on_monday() {
        // 2024-01-10 is a Wednesday
        assert_eq!(week_start(d(2024, 1, 10)), d(2024, 1, 8));
        assert_eq!(week_start(d(2024, 1, 8)), d(2024, 1, 8));
        assert_eq!(week_start(d(2024, 1, 14)), d(2024, 1, 8));
    }

    #[test]
    fn weekly_bucket_zeroes_rejected_days() {
        let entries = vec![
            full_day(d(2024, 1, 8), EntryStatus::Pending),
            full_day(d(2024, 1, 9), EntryStatus::Approved),
            full_day(d(2024, 1, 10), EntryStatus::Rejected),
            // previous week, ignored
            full_day(d(2024, 1, 5), EntryStatus::Approved),
        ];
        let week = weekly_bucket(&entries, d(2024, 1, 10));
        assert_eq!(week.week_start, d(2024, 1, 8));
        assert_eq!(week.days.len(), 7);
        assert_eq!(week.days[0].minutes, 540);
        assert_eq!(week.days[1].minutes, 540);
        assert_eq!(week.days[2].minutes, 0);
        assert_eq!(week.days[2].status, Some(EntryStatus::Rejected));
        assert_eq!(week.days[3].status, None);
        assert_eq!(week.total, 1080);
    }

    #[test]
    fn working_days_skip_weekends() {
        assert_eq!(working_days(d(2024, 1, 8), d(2024, 1, 14)), 5);
        assert_eq!(working_days(d(2024, 1, 13), d(2024, 1, 14)), 0);
        assert_eq!(working_days(d(2024, 1, 1), d(2024, 1, 31)), 23);
        assert_eq!(working_days(d(2024, 1, 10), d(2024, 1, 9)), 0);
    }

    #[test]
    fn period_summary_excludes_rejected_and_out_of_range() {
        let entries = vec![
            full_day(d(2024, 1, 8), EntryStatus::Approved),
            full_day(d(2024, 1, 9), EntryStatus::Pending),
            full_day(d(2024, 1, 10), EntryStatus::Rejected),
            full_day(d(2024, 1, 20), EntryStatus::Approved),
        ];
        let s = period_summary(&entries, d(2024, 1, 8), d(2024, 1, 12), 480, 480);
        assert_eq!(s.worked, 1080);
        assert_eq!(s.normal, 960);
        assert_eq!(s.overtime, 120);
        assert_eq!(s.working_days, 5);
        assert_eq!(s.expected, 2400);
        assert_eq!(s.balance, SignedMinutes(1080 - 2400));
    }

    #[test]
    fn minutes_format_as_hours() {
        assert_eq!(format_minutes(540), "09:00");
        assert_eq!(format_minutes(65), "01:05");
        assert_eq!(format_minutes(0), "00:00");
        assert_eq!(format_minutes(-90), "-01:30");
        assert_eq!(format_minutes(6000), "100:00");
    }
}
