mod booking;
mod conflicts;
mod resolve;
mod slots;
mod types;
mod util;

pub use resolve::{month_availability, resolve_day};
pub use types::{
    BookingError, BookingUpdate, ChangeScope, ConflictReason, DayStatus, HoursConflict,
    ScheduleChange, SlotOptions,
};

use crate::model::{
    Agenda, Booking, BookingId, Customer, DaySchedule, Service, ServiceId, WeeklyRule,
};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use std::collections::BTreeMap;

/// Planner : encapsule l'Agenda et porte toutes les opérations du moteur.
///
/// Les opérations sensibles au temps prennent `now` en paramètre explicite
/// (horloge injectable) ; aucune ne lit l'horloge système.
#[derive(Debug, Default)]
pub struct Planner {
    agenda: Agenda,
    opts: SlotOptions,
}

impl Planner {
    pub fn new() -> Self {
        Self {
            agenda: Agenda::default(),
            opts: SlotOptions::default(),
        }
    }

    pub fn with_agenda(agenda: Agenda) -> Self {
        Self {
            agenda,
            opts: SlotOptions::default(),
        }
    }

    pub fn agenda(&self) -> &Agenda {
        &self.agenda
    }
    pub fn agenda_mut(&mut self) -> &mut Agenda {
        &mut self.agenda
    }
    pub fn options(&self) -> SlotOptions {
        self.opts
    }
    pub fn set_options(&mut self, opts: SlotOptions) {
        self.opts = opts;
    }

    /// Ajoute une prestation au catalogue.
    pub fn add_service(&mut self, service: Service) -> ServiceId {
        let id = service.id.clone();
        self.agenda.services.push(service);
        id
    }

    /// Remplace la règle hebdo d'un jour sans contrôle de conflit
    /// (chemin d'amorçage ; le chemin vérifié est `apply_change`).
    pub fn set_weekly_rule(&mut self, rule: WeeklyRule) -> Result<(), BookingError> {
        if rule.day_of_week > 6 {
            return Err(BookingError::InvalidSchedule("day of week out of range"));
        }
        rule.shifts
            .validate()
            .map_err(|_| BookingError::InvalidSchedule("invalid shift ranges"))?;
        self.agenda.weekly.retain(|r| r.day_of_week != rule.day_of_week);
        self.agenda.weekly.push(rule);
        self.agenda.weekly.sort_by_key(|r| r.day_of_week);
        Ok(())
    }

    /// Horaire effectif d'une date. `None` = fermé.
    pub fn resolve_day(&self, date: NaiveDate) -> Option<DaySchedule> {
        resolve::resolve_day(&self.agenda.weekly, &self.agenda.exceptions, date)
    }

    /// Statut ouvert/fermé de chaque jour du mois, "aujourd'hui" étant
    /// dérivé de `now` dans le fuseau du salon.
    pub fn month_availability(
        &self,
        year: i32,
        month: u32,
        now: DateTime<Utc>,
    ) -> Result<BTreeMap<NaiveDate, DayStatus>, BookingError> {
        let today = util::local_date(self.agenda.time_zone, now);
        resolve::month_availability(&self.agenda.weekly, &self.agenda.exceptions, year, month, today)
    }

    /// Heures de début réservables pour une date et une durée en minutes.
    pub fn list_slots(
        &self,
        date: NaiveDate,
        duration_minutes: i64,
        now: DateTime<Utc>,
    ) -> Result<Vec<NaiveTime>, BookingError> {
        slots::list_slots(&self.agenda, self.opts, date, duration_minutes, now)
    }

    pub fn create_booking(
        &mut self,
        service: &ServiceId,
        date: NaiveDate,
        time: NaiveTime,
        customer: Customer,
        now: DateTime<Utc>,
    ) -> Result<Booking, BookingError> {
        booking::create_booking(self, service, date, time, customer, now)
    }

    pub fn reschedule_booking(
        &mut self,
        id: &BookingId,
        update: BookingUpdate,
        now: DateTime<Utc>,
    ) -> Result<Booking, BookingError> {
        booking::reschedule_booking(self, id, update, now)
    }

    pub fn cancel_booking(&mut self, id: &BookingId) -> Result<Booking, BookingError> {
        booking::cancel_booking(self, id)
    }

    pub fn delete_booking(&mut self, id: &BookingId) -> Result<(), BookingError> {
        booking::delete_booking(self, id)
    }

    pub fn reactivate_booking(
        &mut self,
        id: &BookingId,
        now: DateTime<Utc>,
    ) -> Result<Booking, BookingError> {
        booking::reactivate_booking(self, id, now)
    }

    /// Détecte les réservations futures que la proposition rendrait
    /// orphelines, sans rien modifier.
    pub fn check_change(&self, change: &ScheduleChange, now: DateTime<Utc>) -> Vec<HoursConflict> {
        conflicts::check_change(&self.agenda, change, now)
    }

    /// Applique une proposition d'horaires, bloquée par tout conflit sauf
    /// passage en force explicite.
    pub fn apply_change(
        &mut self,
        change: ScheduleChange,
        force: bool,
        now: DateTime<Utc>,
    ) -> Result<Vec<HoursConflict>, BookingError> {
        conflicts::apply_change(self, change, force, now)
    }
}
