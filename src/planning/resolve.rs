use super::types::{BookingError, DayStatus};
use super::util;
use crate::model::{AvailabilityException, DaySchedule, ShiftPair, WeeklyRule};
use chrono::{Datelike, NaiveDate, NaiveTime};
use std::collections::BTreeMap;

fn default_break() -> (NaiveTime, NaiveTime) {
    (
        NaiveTime::from_hms_opt(14, 0, 0).unwrap(),
        NaiveTime::from_hms_opt(16, 0, 0).unwrap(),
    )
}

/// Résout l'horaire effectif d'une date à partir des règles hebdo et des
/// exceptions datées. `None` = salon fermé, issue valide et attendue.
///
/// Une exception couvrant la date prime sur la règle hebdo ; une exception
/// ouverte qui fournit ses propres plages remplace intégralement la règle,
/// une exception ouverte sans plage retombe sur la règle du jour.
pub fn resolve_day(
    weekly: &[WeeklyRule],
    exceptions: &[AvailabilityException],
    date: NaiveDate,
) -> Option<DaySchedule> {
    if let Some(exc) = pick_exception(exceptions, date) {
        if exc.closed {
            return None;
        }
        if let Some(sched) = effective(&exc.shifts) {
            return Some(sched);
        }
    }

    let rule = weekly
        .iter()
        .find(|r| r.day_of_week == util::weekday_index(date))?;
    if rule.closed {
        return None;
    }
    effective(&rule.shifts)
}

/// Parmi les exceptions couvrant la date, la plus récemment créée l'emporte.
pub(super) fn pick_exception<'a>(
    exceptions: &'a [AvailabilityException],
    date: NaiveDate,
) -> Option<&'a AvailabilityException> {
    exceptions
        .iter()
        .filter(|e| e.covers(date))
        .max_by_key(|e| e.created_at)
}

fn effective(shifts: &ShiftPair) -> Option<DaySchedule> {
    let (open, close) = shifts.window()?;
    let (break_start, break_end) = shifts.break_range().unwrap_or_else(default_break);
    Some(DaySchedule {
        open,
        close,
        break_start,
        break_end,
    })
}

/// Statut ouvert/fermé de chaque jour d'un mois (flux du calendrier).
/// Les dates antérieures à `today` sont forcées fermées, motif "past",
/// quel que soit l'horaire sous-jacent.
pub fn month_availability(
    weekly: &[WeeklyRule],
    exceptions: &[AvailabilityException],
    year: i32,
    month: u32,
    today: NaiveDate,
) -> Result<BTreeMap<NaiveDate, DayStatus>, BookingError> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or(BookingError::InvalidSchedule("invalid year/month"))?;

    let mut out = BTreeMap::new();
    let mut current = first;
    while current.month() == month {
        let status = if current < today {
            DayStatus {
                is_open: false,
                reason: Some("past".to_string()),
            }
        } else {
            match resolve_day(weekly, exceptions, current) {
                Some(_) => DayStatus {
                    is_open: true,
                    reason: None,
                },
                None => DayStatus {
                    is_open: false,
                    reason: pick_exception(exceptions, current)
                        .filter(|e| e.closed)
                        .and_then(|e| e.reason.clone()),
                },
            }
        };
        out.insert(current, status);
        current = match current.succ_opt() {
            Some(d) => d,
            None => break,
        };
    }
    Ok(out)
}
