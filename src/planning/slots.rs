use super::resolve;
use super::types::{BookingError, SlotOptions};
use super::util::{self, DayWindow};
use crate::model::{Agenda, Booking, BookingId};
use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use std::collections::BTreeSet;

/// Liste triée et dédupliquée des heures de début réservables pour une date
/// et une durée. Jour fermé -> liste vide, sans génération de candidats.
///
/// Une grille fixe au pas de 30 minutes rate l'instant exact où un trou
/// s'ouvre entre deux réservations de durées quelconques : on unit donc
/// trois sources de candidats (grille, fin tamponnée de chaque réservation,
/// sortie de pause) avant de les valider toutes de la même façon.
pub(super) fn list_slots(
    agenda: &Agenda,
    opts: SlotOptions,
    date: NaiveDate,
    duration_minutes: i64,
    now: DateTime<Utc>,
) -> Result<Vec<NaiveTime>, BookingError> {
    if duration_minutes <= 0 {
        return Err(BookingError::InvalidSchedule("duration must be positive"));
    }
    let Some(sched) = resolve::resolve_day(&agenda.weekly, &agenda.exceptions, date) else {
        return Ok(Vec::new());
    };
    let window = util::day_window(agenda.time_zone, date, &sched).ok_or(
        BookingError::InvalidSchedule("schedule not representable in the business time zone"),
    )?;

    let day_bookings = agenda.active_bookings_on(date);
    let duration = Duration::minutes(duration_minutes);
    let buffer = Duration::minutes(i64::from(opts.buffer_minutes));
    let grid = Duration::minutes(i64::from(opts.grid_minutes));

    // Dédupliqués par instant exact, triés par construction.
    let mut candidates: BTreeSet<DateTime<Utc>> = BTreeSet::new();

    let mut t = window.open;
    while t <= window.close {
        candidates.insert(t);
        t += grid;
    }
    for b in &day_bookings {
        let c = b.end_at + buffer;
        if c >= window.open && c < window.close {
            candidates.insert(c);
        }
    }
    candidates.insert(window.break_end);

    let mut out = Vec::new();
    for c in candidates {
        if fits(c, duration, buffer, &window, &day_bookings, None, now).is_ok() {
            out.push(util::local_time(agenda.time_zone, c));
        }
    }
    Ok(out)
}

/// Validation uniforme d'un instant candidat, partagée entre le listage des
/// créneaux et le chemin transactionnel de création/replanification.
///
/// Le battement est asymétrique : ajouté après la fin de chaque intervalle
/// seulement, il impose un écart minimal uniforme entre intervalles
/// adjacents. La borne de fermeture compare la fin brute (le battement ne
/// s'applique qu'entre réservations, pas face à la fermeture).
pub(super) fn fits(
    candidate: DateTime<Utc>,
    duration: Duration,
    buffer: Duration,
    window: &DayWindow,
    bookings: &[&Booking],
    exclude: Option<&BookingId>,
    now: DateTime<Utc>,
) -> Result<(), BookingError> {
    let end = candidate + duration;
    let buffered_end = end + buffer;

    if candidate < window.open || end > window.close {
        return Err(BookingError::OutsideHours);
    }
    // Pause de largeur nulle (plages contiguës) : rien à bloquer.
    if window.break_start < window.break_end
        && util::overlaps(candidate, buffered_end, window.break_start, window.break_end)
    {
        return Err(BookingError::BreakConflict);
    }
    for b in bookings {
        if exclude.map_or(false, |id| &b.id == id) {
            continue;
        }
        if util::overlaps(candidate, buffered_end, b.start_at, b.end_at + buffer) {
            return Err(BookingError::SlotUnavailable);
        }
    }
    if candidate < now {
        return Err(BookingError::OutsideHours);
    }
    Ok(())
}
