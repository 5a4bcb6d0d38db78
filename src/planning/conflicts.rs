use super::types::{BookingError, ChangeScope, ConflictReason, HoursConflict, ScheduleChange};
use super::{util, Planner};
use crate::model::{Agenda, AvailabilityException, Booking, ShiftPair, TimeRange, WeeklyRule};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};

/// Réservations futures actives que la proposition rendrait orphelines.
/// Ne lève jamais : liste vide = proposition sans dégât.
pub(super) fn check_change(
    agenda: &Agenda,
    change: &ScheduleChange,
    now: DateTime<Utc>,
) -> Vec<HoursConflict> {
    let mut out = Vec::new();

    for b in agenda
        .bookings
        .iter()
        .filter(|b| b.is_active() && b.start_at >= now)
    {
        if !in_scope(&change.scope, b.date) {
            continue;
        }
        if change.closed || change.shifts.is_empty() {
            out.push(conflict(b, ConflictReason::DayClosed));
            continue;
        }
        // Contrôle grossier, sans battement : la réservation tient-elle
        // encore entièrement dans l'une des deux plages proposées ?
        let end_local = util::local_time(agenda.time_zone, b.end_at);
        if !contained(&change.shifts, b.start_time, end_local) {
            out.push(conflict(b, ConflictReason::OutsideNewHours));
        }
    }

    out
}

/// Applique une proposition. Sans `force`, le moindre conflit bloque tout.
/// Avec `force`, le changement est persisté inconditionnellement et les
/// réservations en conflit gardent leur statut mais sont marquées
/// `needs_review` pour un arbitrage manuel.
pub(super) fn apply_change(
    planner: &mut Planner,
    change: ScheduleChange,
    force: bool,
    now: DateTime<Utc>,
) -> Result<Vec<HoursConflict>, BookingError> {
    change
        .shifts
        .validate()
        .map_err(|_| BookingError::InvalidSchedule("invalid shift ranges"))?;
    if !change.closed && change.shifts.is_empty() {
        return Err(BookingError::InvalidSchedule(
            "an open day needs at least one shift",
        ));
    }
    match change.scope {
        ChangeScope::Weekday(day) if day > 6 => {
            return Err(BookingError::InvalidSchedule("day of week out of range"));
        }
        ChangeScope::Range { start, end } if end < start => {
            return Err(BookingError::InvalidSchedule("range end before start"));
        }
        _ => {}
    }

    let conflicts = check_change(&planner.agenda, &change, now);
    if !conflicts.is_empty() && !force {
        return Err(BookingError::ConflictingBookings(conflicts.len()));
    }

    match change.scope {
        ChangeScope::Weekday(day) => {
            planner.agenda.weekly.retain(|r| r.day_of_week != day);
            planner.agenda.weekly.push(WeeklyRule {
                day_of_week: day,
                closed: change.closed,
                shifts: change.shifts,
            });
            planner.agenda.weekly.sort_by_key(|r| r.day_of_week);
        }
        ChangeScope::Date(date) => {
            insert_exception(planner, date, date, &change, now)?;
        }
        ChangeScope::Range { start, end } => {
            insert_exception(planner, start, end, &change, now)?;
        }
    }

    for c in &conflicts {
        if let Some(b) = planner.agenda.find_booking_mut(&c.booking) {
            b.needs_review = true;
        }
    }

    Ok(conflicts)
}

fn insert_exception(
    planner: &mut Planner,
    start: NaiveDate,
    end: NaiveDate,
    change: &ScheduleChange,
    now: DateTime<Utc>,
) -> Result<(), BookingError> {
    // created_at = now : la nouvelle exception gagne le départage
    // "la plus récente l'emporte" sur toute exception déjà en place.
    let exc = AvailabilityException::new(
        start,
        end,
        change.closed,
        change.shifts.clone(),
        change.reason.clone(),
        now,
    )
    .map_err(|_| BookingError::InvalidSchedule("invalid exception dates"))?;
    planner.agenda.exceptions.push(exc);
    Ok(())
}

fn in_scope(scope: &ChangeScope, date: NaiveDate) -> bool {
    match scope {
        ChangeScope::Weekday(d) => util::weekday_index(date) == *d,
        ChangeScope::Date(d) => date == *d,
        ChangeScope::Range { start, end } => *start <= date && date <= *end,
    }
}

fn contained(shifts: &ShiftPair, start: NaiveTime, end: NaiveTime) -> bool {
    let inside = |r: &TimeRange| r.start <= start && end <= r.end;
    shifts.morning.as_ref().map_or(false, inside)
        || shifts.afternoon.as_ref().map_or(false, inside)
}

fn conflict(b: &Booking, reason: ConflictReason) -> HoursConflict {
    HoursConflict {
        booking: b.id.clone(),
        locator: b.locator.clone(),
        customer_name: b.customer.name.clone(),
        date: b.date,
        time: b.start_time,
        reason,
    }
}
