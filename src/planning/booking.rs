use super::types::{BookingError, BookingUpdate};
use super::{resolve, slots, util, Planner};
use crate::model::{
    random_locator, Agenda, Booking, BookingId, BookingStatus, Customer, ServiceId,
};
use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};

/// Crée une réservation confirmée. La séquence lecture-validation-écriture
/// s'exécute entièrement sous l'emprunt exclusif du Planner : c'est elle,
/// et non le listage consultatif des créneaux, qui garantit l'absence de
/// double réservation.
pub(super) fn create_booking(
    planner: &mut Planner,
    service: &ServiceId,
    date: NaiveDate,
    time: NaiveTime,
    customer: Customer,
    now: DateTime<Utc>,
) -> Result<Booking, BookingError> {
    let svc = planner
        .agenda
        .find_service(service)
        .ok_or_else(|| BookingError::ServiceNotFound(service.as_str().to_string()))?;
    let duration = Duration::minutes(svc.duration_minutes);

    let start_at = util::local_instant(planner.agenda.time_zone, date, time).ok_or(
        BookingError::InvalidSchedule("time does not exist in the business time zone"),
    )?;

    // L'heure fournie par le client n'est jamais crue sur parole : mêmes
    // contrôles que le listage, sur le jeu de données vivant.
    validate_instant(planner, date, start_at, duration, None, now)?;

    let locator = unique_locator(&planner.agenda);
    let booking = Booking::new(
        locator,
        service.clone(),
        customer,
        date,
        time,
        start_at,
        start_at + duration,
        now,
    )
    .map_err(|_| BookingError::InvalidSchedule("empty booking interval"))?;

    #[cfg(feature = "logging")]
    tracing::debug!(locator = %booking.locator, %date, "booking created");

    planner.agenda.bookings.push(booking.clone());
    Ok(booking)
}

/// Replanifie une réservation. Les champs temporels (date, heure,
/// prestation) déclenchent la même revalidation que la création, en
/// excluant l'enregistrement courant du balayage de chevauchement ; les
/// coordonnées client se mettent à jour sans revalidation. Tout échec
/// laisse la réservation inchangée.
pub(super) fn reschedule_booking(
    planner: &mut Planner,
    id: &BookingId,
    update: BookingUpdate,
    now: DateTime<Utc>,
) -> Result<Booking, BookingError> {
    let current = planner
        .agenda
        .find_booking(id)
        .filter(|b| b.status != BookingStatus::Deleted)
        .cloned()
        .ok_or_else(|| BookingError::UnknownBooking(id.as_str().to_string()))?;

    let mut next = current.clone();
    if let Some(name) = update.customer_name.clone() {
        next.customer.name = name;
    }
    if let Some(phone) = update.customer_phone.clone() {
        next.customer.phone = phone;
    }
    if let Some(email) = update.customer_email.clone() {
        next.customer.email = Some(email);
    }

    if update.reschedules() {
        let date = update.date.unwrap_or(current.date);
        let time = update.time.unwrap_or(current.start_time);
        let service_id = update
            .service
            .clone()
            .unwrap_or_else(|| current.service.clone());
        let svc = planner
            .agenda
            .find_service(&service_id)
            .ok_or_else(|| BookingError::ServiceNotFound(service_id.as_str().to_string()))?;
        let duration = Duration::minutes(svc.duration_minutes);
        let start_at = util::local_instant(planner.agenda.time_zone, date, time).ok_or(
            BookingError::InvalidSchedule("time does not exist in the business time zone"),
        )?;

        validate_instant(planner, date, start_at, duration, Some(id), now)?;

        next.service = service_id;
        next.date = date;
        next.start_time = time;
        next.start_at = start_at;
        next.end_at = start_at + duration;

        #[cfg(feature = "logging")]
        tracing::debug!(locator = %next.locator, %date, "booking rescheduled");
    }

    let stored = planner
        .agenda
        .find_booking_mut(id)
        .ok_or_else(|| BookingError::UnknownBooking(id.as_str().to_string()))?;
    *stored = next.clone();
    Ok(next)
}

/// Annulation : la réservation devient inerte pour tout test de
/// chevauchement, le créneau se libère.
pub(super) fn cancel_booking(planner: &mut Planner, id: &BookingId) -> Result<Booking, BookingError> {
    let b = planner
        .agenda
        .find_booking_mut(id)
        .filter(|b| b.status != BookingStatus::Deleted)
        .ok_or_else(|| BookingError::UnknownBooking(id.as_str().to_string()))?;
    b.status = BookingStatus::Cancelled;
    Ok(b.clone())
}

/// Suppression douce. Aucune réservation n'est jamais physiquement retirée.
pub(super) fn delete_booking(planner: &mut Planner, id: &BookingId) -> Result<(), BookingError> {
    let b = planner
        .agenda
        .find_booking_mut(id)
        .ok_or_else(|| BookingError::UnknownBooking(id.as_str().to_string()))?;
    b.status = BookingStatus::Deleted;
    Ok(())
}

/// Réactivation d'une réservation annulée, revalidée comme une
/// replanification avant de redevenir confirmée.
pub(super) fn reactivate_booking(
    planner: &mut Planner,
    id: &BookingId,
    now: DateTime<Utc>,
) -> Result<Booking, BookingError> {
    let current = planner
        .agenda
        .find_booking(id)
        .cloned()
        .ok_or_else(|| BookingError::UnknownBooking(id.as_str().to_string()))?;
    if current.status != BookingStatus::Cancelled {
        return Err(BookingError::InvalidSchedule(
            "only cancelled bookings can be reactivated",
        ));
    }

    let duration = current.end_at - current.start_at;
    validate_instant(planner, current.date, current.start_at, duration, Some(id), now)?;

    let b = planner
        .agenda
        .find_booking_mut(id)
        .ok_or_else(|| BookingError::UnknownBooking(id.as_str().to_string()))?;
    b.status = BookingStatus::Confirmed;
    Ok(b.clone())
}

/// Revalidation d'un instant précis : jour ouvert, bornes et pause, puis
/// balayage des réservations actives du jour avec le prédicat tamponné.
fn validate_instant(
    planner: &Planner,
    date: NaiveDate,
    start_at: DateTime<Utc>,
    duration: Duration,
    exclude: Option<&BookingId>,
    now: DateTime<Utc>,
) -> Result<(), BookingError> {
    let agenda = &planner.agenda;
    let sched = resolve::resolve_day(&agenda.weekly, &agenda.exceptions, date)
        .ok_or(BookingError::ClosedDay(date))?;
    let window = util::day_window(agenda.time_zone, date, &sched).ok_or(
        BookingError::InvalidSchedule("schedule not representable in the business time zone"),
    )?;
    let day_bookings = agenda.active_bookings_on(date);
    let buffer = Duration::minutes(i64::from(planner.opts.buffer_minutes));
    slots::fits(start_at, duration, buffer, &window, &day_bookings, exclude, now)
}

fn unique_locator(agenda: &Agenda) -> String {
    loop {
        let locator = random_locator();
        if agenda.find_booking_by_locator(&locator).is_none() {
            return locator;
        }
    }
}
