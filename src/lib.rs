#![forbid(unsafe_code)]
//! Creneau — bibliothèque de réservation pour salon mono-site (sans BD).
//!
//! - Résolution des horaires effectifs (règles hebdo + exceptions datées).
//! - Génération/validation de créneaux, battement de 10 minutes.
//! - Créations/replanifications sans double réservation.
//! - Détection des rendez-vous orphelins lors d'un changement d'horaires.
//! - Tout instant stocké en UTC ; les heures murales n'ont de sens que dans
//!   le fuseau déclaré du salon.

pub mod hours;
pub mod io;
pub mod model;
pub mod notification;
pub mod planning;
pub mod storage;

pub use hours::{
    export_template_json, load_template_from_file, weekly_rules, DayHours, HoursTemplate,
    TemplateInfo, TemplateStore,
};
pub use model::{
    Agenda, AvailabilityException, Booking, BookingId, BookingStatus, Customer, DaySchedule,
    Service, ServiceId, ShiftPair, TimeRange, WeeklyRule,
};
pub use notification::{prepare_reminder, Reminder, ReminderRenderer, TextReminder};
pub use planning::{
    month_availability, resolve_day, BookingError, BookingUpdate, ChangeScope, ConflictReason,
    DayStatus, HoursConflict, Planner, ScheduleChange, SlotOptions,
};
pub use storage::{JsonStorage, Storage};
