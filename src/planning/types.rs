use crate::model::{BookingId, ServiceId, ShiftPair};
use chrono::{NaiveDate, NaiveTime};
use thiserror::Error;

/// Options de découpage des créneaux.
#[derive(Debug, Clone, Copy)]
pub struct SlotOptions {
    /// Pas de la grille de candidats, en minutes.
    pub grid_minutes: u32,
    /// Battement minimal imposé après la fin de chaque réservation.
    pub buffer_minutes: u32,
}

impl Default for SlotOptions {
    fn default() -> Self {
        Self {
            grid_minutes: 30,
            buffer_minutes: 10,
        }
    }
}

/// Portée d'une proposition de changement d'horaires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeScope {
    /// Remplace la règle hebdo d'un jour (0=dimanche..6=samedi).
    Weekday(u8),
    /// Exception sur une date précise.
    Date(NaiveDate),
    /// Exception sur une plage de dates (bornes incluses).
    Range { start: NaiveDate, end: NaiveDate },
}

/// Proposition de changement soumise au détecteur de conflits.
#[derive(Debug, Clone)]
pub struct ScheduleChange {
    pub scope: ChangeScope,
    pub closed: bool,
    pub shifts: ShiftPair,
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictReason {
    /// La période proposée est fermée.
    DayClosed,
    /// La réservation ne tient plus dans les nouvelles plages.
    OutsideNewHours,
}

/// Réservation future que la proposition rendrait orpheline.
#[derive(Debug, Clone)]
pub struct HoursConflict {
    pub booking: BookingId,
    pub locator: String,
    pub customer_name: String,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub reason: ConflictReason,
}

/// Champs modifiables d'une réservation. Les champs temporels déclenchent
/// une revalidation complète ; les coordonnées client non.
#[derive(Debug, Clone, Default)]
pub struct BookingUpdate {
    pub date: Option<NaiveDate>,
    pub time: Option<NaiveTime>,
    pub service: Option<ServiceId>,
    pub customer_name: Option<String>,
    pub customer_phone: Option<String>,
    pub customer_email: Option<String>,
}

impl BookingUpdate {
    /// La mise à jour touche-t-elle l'intervalle réservé ?
    pub fn reschedules(&self) -> bool {
        self.date.is_some() || self.time.is_some() || self.service.is_some()
    }
}

/// Statut d'un jour dans le résumé mensuel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayStatus {
    pub is_open: bool,
    pub reason: Option<String>,
}

#[derive(Error, Debug)]
pub enum BookingError {
    #[error("unknown service: {0}")]
    ServiceNotFound(String),
    #[error("closed on {0}")]
    ClosedDay(NaiveDate),
    #[error("requested time is outside opening hours")]
    OutsideHours,
    #[error("requested time overlaps the break")]
    BreakConflict,
    #[error("slot unavailable: overlaps another booking")]
    SlotUnavailable,
    #[error("unknown booking: {0}")]
    UnknownBooking(String),
    #[error("invalid schedule input: {0}")]
    InvalidSchedule(&'static str),
    #[error("{0} existing booking(s) conflict with the proposed hours")]
    ConflictingBookings(usize),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
