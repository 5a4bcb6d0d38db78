#![forbid(unsafe_code)]
use chrono::{NaiveDate, NaiveTime, TimeZone, Utc};
use creneau::{
    model::{AvailabilityException, Service, ShiftPair, TimeRange, WeeklyRule},
    planning::resolve_day,
    Agenda, JsonStorage, Planner, Storage,
};

fn t(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).unwrap()
}

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

fn range(start: (u32, u32), end: (u32, u32)) -> TimeRange {
    TimeRange::new(t(start.0, start.1), t(end.0, end.1)).unwrap()
}

fn single_window(day_of_week: u8, start: (u32, u32), end: (u32, u32)) -> WeeklyRule {
    WeeklyRule {
        day_of_week,
        closed: false,
        shifts: ShiftPair {
            morning: Some(range(start, end)),
            afternoon: None,
        },
    }
}

#[test]
fn break_defaults_to_14_16() {
    // mardi 10:00-20:00 sans pause explicite
    let weekly = vec![single_window(2, (10, 0), (20, 0))];
    let sched = resolve_day(&weekly, &[], d(2025, 1, 7)).unwrap();
    assert_eq!(sched.open, t(10, 0));
    assert_eq!(sched.close, t(20, 0));
    assert_eq!(sched.break_start, t(14, 0));
    assert_eq!(sched.break_end, t(16, 0));
}

#[test]
fn two_shifts_derive_their_own_break() {
    let weekly = vec![WeeklyRule {
        day_of_week: 2,
        closed: false,
        shifts: ShiftPair {
            morning: Some(range((9, 0), (13, 30))),
            afternoon: Some(range((15, 45), (20, 0))),
        },
    }];
    let sched = resolve_day(&weekly, &[], d(2025, 1, 7)).unwrap();
    assert_eq!(sched.break_start, t(13, 30));
    assert_eq!(sched.break_end, t(15, 45));
}

#[test]
fn missing_or_closed_rule_means_closed() {
    assert!(resolve_day(&[], &[], d(2025, 1, 7)).is_none());

    let weekly = vec![WeeklyRule {
        day_of_week: 2,
        closed: true,
        shifts: ShiftPair::default(),
    }];
    assert!(resolve_day(&weekly, &[], d(2025, 1, 7)).is_none());
}

#[test]
fn exception_takes_priority_over_weekly_rule() {
    let weekly = vec![single_window(2, (10, 0), (20, 0))];
    let created = Utc.with_ymd_and_hms(2025, 1, 1, 8, 0, 0).unwrap();

    let closed = AvailabilityException::new(
        d(2025, 1, 6),
        d(2025, 1, 8),
        true,
        ShiftPair::default(),
        Some("congés".into()),
        created,
    )
    .unwrap();
    assert!(resolve_day(&weekly, &[closed], d(2025, 1, 7)).is_none());

    let shorter = AvailabilityException::new(
        d(2025, 1, 7),
        d(2025, 1, 7),
        false,
        ShiftPair {
            morning: Some(range((9, 0), (12, 0))),
            afternoon: None,
        },
        None,
        created,
    )
    .unwrap();
    let sched = resolve_day(&weekly, &[shorter], d(2025, 1, 7)).unwrap();
    assert_eq!(sched.open, t(9, 0));
    assert_eq!(sched.close, t(12, 0));
    // hors de la plage de l'exception, la règle hebdo reprend
    let sched = resolve_day(
        &weekly,
        &[AvailabilityException::new(
            d(2025, 1, 7),
            d(2025, 1, 7),
            true,
            ShiftPair::default(),
            None,
            created,
        )
        .unwrap()],
        d(2025, 1, 14),
    )
    .unwrap();
    assert_eq!(sched.open, t(10, 0));
}

#[test]
fn most_recently_created_exception_wins() {
    let weekly = vec![single_window(2, (10, 0), (20, 0))];
    let open = AvailabilityException::new(
        d(2025, 1, 7),
        d(2025, 1, 7),
        false,
        ShiftPair {
            morning: Some(range((9, 0), (12, 0))),
            afternoon: None,
        },
        None,
        Utc.with_ymd_and_hms(2025, 1, 1, 8, 0, 0).unwrap(),
    )
    .unwrap();
    let closed = AvailabilityException::new(
        d(2025, 1, 7),
        d(2025, 1, 7),
        true,
        ShiftPair::default(),
        None,
        Utc.with_ymd_and_hms(2025, 1, 2, 8, 0, 0).unwrap(),
    )
    .unwrap();

    // l'ordre d'insertion ne compte pas, seule la date de création départage
    assert!(resolve_day(&weekly, &[open.clone(), closed.clone()], d(2025, 1, 7)).is_none());
    assert!(resolve_day(&weekly, &[closed, open], d(2025, 1, 7)).is_none());
}

#[test]
fn closed_day_yields_no_slot() {
    let planner = Planner::new();
    let now = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
    let slots = planner.list_slots(d(2025, 1, 7), 60, now).unwrap();
    assert!(slots.is_empty());
}

#[test]
fn tuesday_grid_with_default_break() {
    // mardi 10:00-20:00, pause par défaut 14:00-16:00, prestation de 60 min
    let mut planner = Planner::new();
    planner.set_weekly_rule(single_window(2, (10, 0), (20, 0))).unwrap();
    let now = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();

    let slots = planner.list_slots(d(2025, 1, 7), 60, now).unwrap();
    assert!(slots.contains(&t(10, 0)));
    assert!(slots.contains(&t(19, 0)));
    // finirait à 14:30, en pleine pause
    assert!(!slots.contains(&t(13, 30)));
    // finirait à 20:30, après la fermeture
    assert!(!slots.contains(&t(19, 30)));
    // trié et dédupliqué
    let mut sorted = slots.clone();
    sorted.sort();
    sorted.dedup();
    assert_eq!(slots, sorted);
}

#[test]
fn buffered_gap_filler_is_offered() {
    // réservation existante 10:00-11:00 : 10:30 est pris, 11:10 est offert
    let mut planner = Planner::new();
    planner.set_weekly_rule(single_window(2, (9, 0), (18, 0))).unwrap();
    let coupe = Service::new("Coupe", 60, 2500).unwrap();
    let coupe_id = planner.add_service(coupe);
    let now = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();

    planner
        .create_booking(
            &coupe_id,
            d(2025, 1, 7),
            t(10, 0),
            creneau::Customer::new("Alice", "0600000000"),
            now,
        )
        .unwrap();

    let slots = planner.list_slots(d(2025, 1, 7), 30, now).unwrap();
    assert!(!slots.contains(&t(10, 0)));
    assert!(!slots.contains(&t(10, 30)));
    assert!(slots.contains(&t(11, 10)));
}

#[test]
fn post_break_start_is_offered_even_off_grid() {
    let mut planner = Planner::new();
    planner
        .set_weekly_rule(WeeklyRule {
            day_of_week: 2,
            closed: false,
            shifts: ShiftPair {
                morning: Some(range((10, 0), (13, 30))),
                afternoon: Some(range((15, 45), (20, 0))),
            },
        })
        .unwrap();
    let now = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();

    let slots = planner.list_slots(d(2025, 1, 7), 60, now).unwrap();
    assert!(slots.contains(&t(15, 45)));
    assert!(!slots.contains(&t(15, 30)));
}

#[test]
fn past_candidates_are_dropped() {
    let mut planner = Planner::new();
    planner.set_weekly_rule(single_window(2, (10, 0), (20, 0))).unwrap();
    // 15:30 heure de Paris le jour même
    let now = Utc.with_ymd_and_hms(2025, 1, 7, 14, 30, 0).unwrap();

    let slots = planner.list_slots(d(2025, 1, 7), 60, now).unwrap();
    assert!(!slots.contains(&t(10, 0)));
    assert!(slots.contains(&t(16, 0)));
}

#[test]
fn month_availability_marks_past_and_reasons() {
    let mut planner = Planner::new();
    planner.set_weekly_rule(single_window(2, (10, 0), (20, 0))).unwrap();
    let now = Utc.with_ymd_and_hms(2025, 6, 15, 10, 0, 0).unwrap();
    planner
        .apply_change(
            creneau::ScheduleChange {
                scope: creneau::planning::ChangeScope::Range {
                    start: d(2025, 6, 20),
                    end: d(2025, 6, 22),
                },
                closed: true,
                shifts: ShiftPair::default(),
                reason: Some("congés".into()),
            },
            false,
            now,
        )
        .unwrap();

    let days = planner.month_availability(2025, 6, now).unwrap();
    assert_eq!(days.len(), 30);

    // mardi 3 juin : nominalement ouvert, mais passé
    let past = &days[&d(2025, 6, 3)];
    assert!(!past.is_open);
    assert_eq!(past.reason.as_deref(), Some("past"));

    // mardi 17 juin : ouvert
    assert!(days[&d(2025, 6, 17)].is_open);

    // mercredi 18 juin : fermé sans motif particulier
    let wednesday = &days[&d(2025, 6, 18)];
    assert!(!wednesday.is_open);
    assert!(wednesday.reason.is_none());

    // vendredi 20 juin : fermé par exception, motif remonté
    let excepted = &days[&d(2025, 6, 20)];
    assert!(!excepted.is_open);
    assert_eq!(excepted.reason.as_deref(), Some("congés"));
}

#[test]
fn agenda_json_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("agenda.json");

    let mut agenda = Agenda::default();
    agenda.weekly.push(single_window(2, (10, 0), (20, 0)));
    let service = Service::new("Coupe", 60, 2500).unwrap();
    agenda.services.push(service.clone());

    let storage = JsonStorage::open(&path).unwrap();
    storage.save(&agenda).unwrap();
    let loaded = storage.load().unwrap();

    assert_eq!(loaded.time_zone, agenda.time_zone);
    assert_eq!(loaded.weekly, agenda.weekly);
    assert_eq!(loaded.services, agenda.services);
}
