#![forbid(unsafe_code)]
use chrono::{NaiveDate, NaiveTime, TimeZone, Utc};
use creneau::{
    model::{Service, ServiceId, ShiftPair, TimeRange, WeeklyRule},
    planning::{BookingError, BookingUpdate},
    BookingStatus, Customer, Planner,
};

fn t(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).unwrap()
}

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

/// Planner ouvert le mardi 09:00-18:00 (pause par défaut 14:00-16:00),
/// avec une prestation "Coupe" de 60 minutes.
fn salon() -> (Planner, ServiceId) {
    let mut planner = Planner::new();
    planner
        .set_weekly_rule(WeeklyRule {
            day_of_week: 2,
            closed: false,
            shifts: ShiftPair {
                morning: Some(TimeRange::new(t(9, 0), t(18, 0)).unwrap()),
                afternoon: None,
            },
        })
        .unwrap();
    let id = planner.add_service(Service::new("Coupe", 60, 2500).unwrap());
    (planner, id)
}

fn now() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap()
}

#[test]
fn create_confirms_and_stores_utc_instants() {
    let (mut planner, coupe) = salon();
    let booking = planner
        .create_booking(
            &coupe,
            d(2025, 1, 7),
            t(10, 0),
            Customer::new("Alice", "0600000000"),
            now(),
        )
        .unwrap();

    assert_eq!(booking.status, BookingStatus::Confirmed);
    assert_eq!(booking.locator.len(), 8);
    // 10:00 à Paris en janvier = 09:00 UTC
    assert_eq!(
        booking.start_at,
        Utc.with_ymd_and_hms(2025, 1, 7, 9, 0, 0).unwrap()
    );
    assert_eq!(booking.duration_minutes(), 60);
    assert_eq!(planner.agenda().bookings.len(), 1);
}

#[test]
fn same_slot_booked_twice_fails_once() {
    let (mut planner, coupe) = salon();
    let customer = Customer::new("Alice", "0600000000");

    planner
        .create_booking(&coupe, d(2025, 1, 7), t(10, 0), customer.clone(), now())
        .unwrap();
    let err = planner
        .create_booking(&coupe, d(2025, 1, 7), t(10, 0), customer, now())
        .unwrap_err();

    assert!(matches!(err, BookingError::SlotUnavailable));
    assert_eq!(planner.agenda().bookings.len(), 1);
}

#[test]
fn buffer_blocks_back_to_back_starts() {
    let (mut planner, coupe) = salon();
    planner
        .create_booking(
            &coupe,
            d(2025, 1, 7),
            t(10, 0),
            Customer::new("Alice", "0600000000"),
            now(),
        )
        .unwrap();

    // 11:00 colle à la fin de la précédente : refusé (battement de 10 min)
    let err = planner
        .create_booking(
            &coupe,
            d(2025, 1, 7),
            t(11, 0),
            Customer::new("Bob", "0611111111"),
            now(),
        )
        .unwrap_err();
    assert!(matches!(err, BookingError::SlotUnavailable));

    // 11:10 respecte le battement
    planner
        .create_booking(
            &coupe,
            d(2025, 1, 7),
            t(11, 10),
            Customer::new("Bob", "0611111111"),
            now(),
        )
        .unwrap();
}

#[test]
fn typed_rejections() {
    let (mut planner, coupe) = salon();
    let customer = Customer::new("Alice", "0600000000");

    // mercredi : aucune règle hebdo
    let err = planner
        .create_booking(&coupe, d(2025, 1, 8), t(10, 0), customer.clone(), now())
        .unwrap_err();
    assert!(matches!(err, BookingError::ClosedDay(_)));

    // avant l'ouverture
    let err = planner
        .create_booking(&coupe, d(2025, 1, 7), t(8, 0), customer.clone(), now())
        .unwrap_err();
    assert!(matches!(err, BookingError::OutsideHours));

    // en pleine pause
    let err = planner
        .create_booking(&coupe, d(2025, 1, 7), t(14, 30), customer.clone(), now())
        .unwrap_err();
    assert!(matches!(err, BookingError::BreakConflict));

    // prestation inconnue
    let err = planner
        .create_booking(
            &ServiceId::new("nope"),
            d(2025, 1, 7),
            t(10, 0),
            customer.clone(),
            now(),
        )
        .unwrap_err();
    assert!(matches!(err, BookingError::ServiceNotFound(_)));

    // heure déjà passée
    let late = Utc.with_ymd_and_hms(2025, 1, 7, 16, 0, 0).unwrap();
    let err = planner
        .create_booking(&coupe, d(2025, 1, 7), t(10, 0), customer, late)
        .unwrap_err();
    assert!(matches!(err, BookingError::OutsideHours));
}

#[test]
fn cancelling_frees_the_slot() {
    let (mut planner, coupe) = salon();
    let booking = planner
        .create_booking(
            &coupe,
            d(2025, 1, 7),
            t(10, 0),
            Customer::new("Alice", "0600000000"),
            now(),
        )
        .unwrap();

    planner.cancel_booking(&booking.id).unwrap();
    let slots = planner.list_slots(d(2025, 1, 7), 60, now()).unwrap();
    assert!(slots.contains(&t(10, 0)));

    // et le créneau est de nouveau réservable
    planner
        .create_booking(
            &coupe,
            d(2025, 1, 7),
            t(10, 0),
            Customer::new("Bob", "0611111111"),
            now(),
        )
        .unwrap();
}

#[test]
fn reschedule_ignores_its_own_interval() {
    let (mut planner, coupe) = salon();
    let booking = planner
        .create_booking(
            &coupe,
            d(2025, 1, 7),
            t(10, 0),
            Customer::new("Alice", "0600000000"),
            now(),
        )
        .unwrap();

    // 10:30 chevauche 10:00-11:00... sauf que c'est la même réservation
    let moved = planner
        .reschedule_booking(
            &booking.id,
            BookingUpdate {
                time: Some(t(10, 30)),
                ..BookingUpdate::default()
            },
            now(),
        )
        .unwrap();

    assert_eq!(moved.start_time, t(10, 30));
    assert_eq!(
        moved.end_at,
        Utc.with_ymd_and_hms(2025, 1, 7, 10, 30, 0).unwrap()
    );
}

#[test]
fn failed_reschedule_leaves_booking_untouched() {
    let (mut planner, coupe) = salon();
    planner
        .create_booking(
            &coupe,
            d(2025, 1, 7),
            t(10, 0),
            Customer::new("Alice", "0600000000"),
            now(),
        )
        .unwrap();
    let second = planner
        .create_booking(
            &coupe,
            d(2025, 1, 7),
            t(11, 10),
            Customer::new("Bob", "0611111111"),
            now(),
        )
        .unwrap();

    let err = planner
        .reschedule_booking(
            &second.id,
            BookingUpdate {
                time: Some(t(10, 30)),
                ..BookingUpdate::default()
            },
            now(),
        )
        .unwrap_err();
    assert!(matches!(err, BookingError::SlotUnavailable));

    let unchanged = planner.agenda().find_booking(&second.id).unwrap();
    assert_eq!(unchanged.start_time, t(11, 10));
    assert_eq!(unchanged.status, BookingStatus::Confirmed);
}

#[test]
fn contact_update_skips_revalidation() {
    let (mut planner, coupe) = salon();
    let booking = planner
        .create_booking(
            &coupe,
            d(2025, 1, 7),
            t(10, 0),
            Customer::new("Alice", "0600000000"),
            now(),
        )
        .unwrap();

    // le jour ferme ensuite : la mise à jour des coordonnées passe quand même
    planner
        .set_weekly_rule(WeeklyRule {
            day_of_week: 2,
            closed: true,
            shifts: ShiftPair::default(),
        })
        .unwrap();

    let updated = planner
        .reschedule_booking(
            &booking.id,
            BookingUpdate {
                customer_name: Some("Alice Martin".into()),
                customer_phone: Some("0622222222".into()),
                ..BookingUpdate::default()
            },
            now(),
        )
        .unwrap();

    assert_eq!(updated.customer.name, "Alice Martin");
    assert_eq!(updated.start_time, t(10, 0));
}

#[test]
fn reactivation_is_revalidated() {
    let (mut planner, coupe) = salon();
    let first = planner
        .create_booking(
            &coupe,
            d(2025, 1, 7),
            t(10, 0),
            Customer::new("Alice", "0600000000"),
            now(),
        )
        .unwrap();
    planner.cancel_booking(&first.id).unwrap();

    // le créneau libéré est repris par quelqu'un d'autre
    let second = planner
        .create_booking(
            &coupe,
            d(2025, 1, 7),
            t(10, 0),
            Customer::new("Bob", "0611111111"),
            now(),
        )
        .unwrap();

    let err = planner.reactivate_booking(&first.id, now()).unwrap_err();
    assert!(matches!(err, BookingError::SlotUnavailable));

    planner.cancel_booking(&second.id).unwrap();
    let revived = planner.reactivate_booking(&first.id, now()).unwrap();
    assert_eq!(revived.status, BookingStatus::Confirmed);
}

#[test]
fn soft_delete_keeps_the_record() {
    let (mut planner, coupe) = salon();
    let booking = planner
        .create_booking(
            &coupe,
            d(2025, 1, 7),
            t(10, 0),
            Customer::new("Alice", "0600000000"),
            now(),
        )
        .unwrap();

    planner.delete_booking(&booking.id).unwrap();
    assert_eq!(planner.agenda().bookings.len(), 1);
    assert_eq!(
        planner.agenda().find_booking(&booking.id).unwrap().status,
        BookingStatus::Deleted
    );

    // inerte : le créneau est libre
    let slots = planner.list_slots(d(2025, 1, 7), 60, now()).unwrap();
    assert!(slots.contains(&t(10, 0)));

    // et la réservation supprimée n'est plus adressable
    let err = planner.cancel_booking(&booking.id).unwrap_err();
    assert!(matches!(err, BookingError::UnknownBooking(_)));
}
