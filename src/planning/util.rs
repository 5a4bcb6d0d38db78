use crate::model::DaySchedule;
use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;

/// Test de chevauchement d'intervalles semi-ouverts [start, end).
pub(super) fn overlaps(
    a_start: DateTime<Utc>,
    a_end: DateTime<Utc>,
    b_start: DateTime<Utc>,
    b_end: DateTime<Utc>,
) -> bool {
    a_start < b_end && b_start < a_end
}

/// Heure murale locale -> instant UTC dans le fuseau du salon.
/// `None` si l'heure n'existe pas ce jour-là (trou de changement d'heure) ;
/// en cas d'ambiguïté, la première occurrence est retenue.
pub(super) fn local_instant(tz: Tz, date: NaiveDate, time: NaiveTime) -> Option<DateTime<Utc>> {
    tz.from_local_datetime(&NaiveDateTime::new(date, time))
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
}

pub(super) fn local_date(tz: Tz, at: DateTime<Utc>) -> NaiveDate {
    at.with_timezone(&tz).date_naive()
}

pub(super) fn local_time(tz: Tz, at: DateTime<Utc>) -> NaiveTime {
    at.with_timezone(&tz).time()
}

/// Jour de semaine au format 0=dimanche..6=samedi.
pub(super) fn weekday_index(date: NaiveDate) -> u8 {
    date.weekday().num_days_from_sunday() as u8
}

/// Horaire effectif d'une journée projeté en instants UTC.
#[derive(Debug, Clone, Copy)]
pub(super) struct DayWindow {
    pub open: DateTime<Utc>,
    pub close: DateTime<Utc>,
    pub break_start: DateTime<Utc>,
    pub break_end: DateTime<Utc>,
}

pub(super) fn day_window(tz: Tz, date: NaiveDate, sched: &DaySchedule) -> Option<DayWindow> {
    Some(DayWindow {
        open: local_instant(tz, date, sched.open)?,
        close: local_instant(tz, date, sched.close)?,
        break_start: local_instant(tz, date, sched.break_start)?,
        break_end: local_instant(tz, date, sched.break_end)?,
    })
}
