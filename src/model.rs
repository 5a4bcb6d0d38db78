use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifiant fort pour Service
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ServiceId(String);

impl ServiceId {
    pub fn new<S: AsRef<str>>(s: S) -> Self {
        Self(s.as_ref().to_owned())
    }
    pub fn random() -> Self {
        Self(Uuid::new_v4().to_string())
    }
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Identifiant fort pour Booking
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BookingId(String);

impl BookingId {
    pub fn new<S: AsRef<str>>(s: S) -> Self {
        Self(s.as_ref().to_owned())
    }
    pub fn random() -> Self {
        Self(Uuid::new_v4().to_string())
    }
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Code court remis au client (distinct de l'id interne).
pub fn random_locator() -> String {
    let raw = Uuid::new_v4().simple().to_string();
    raw[..8].to_ascii_uppercase()
}

/// Prestation du catalogue (durée en minutes, prix en centimes).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Service {
    pub id: ServiceId,
    pub name: String,
    pub duration_minutes: i64,
    pub price_cents: i64,
}

impl Service {
    pub fn new<N: Into<String>>(
        name: N,
        duration_minutes: i64,
        price_cents: i64,
    ) -> Result<Self, String> {
        if duration_minutes <= 0 {
            return Err("service duration must be positive".to_string());
        }
        if price_cents < 0 {
            return Err("service price cannot be negative".to_string());
        }
        Ok(Self {
            id: ServiceId::random(),
            name: name.into(),
            duration_minutes,
            price_cents,
        })
    }
}

/// Coordonnées client portées par une réservation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub name: String,
    pub phone: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl Customer {
    pub fn new<N: Into<String>, P: Into<String>>(name: N, phone: P) -> Self {
        Self {
            name: name.into(),
            phone: phone.into(),
            email: None,
        }
    }
}

/// Plage horaire murale [start, end) au sein d'une journée.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl TimeRange {
    pub fn new(start: NaiveTime, end: NaiveTime) -> Result<Self, String> {
        if end <= start {
            return Err("range end must be after start".to_string());
        }
        Ok(Self { start, end })
    }

    /// Parse "HH:MM-HH:MM".
    pub fn parse(raw: &str) -> Result<Self, String> {
        let (a, b) = raw
            .split_once('-')
            .ok_or_else(|| format!("expected HH:MM-HH:MM, got {raw}"))?;
        let start = parse_hhmm(a.trim())?;
        let end = parse_hhmm(b.trim())?;
        Self::new(start, end)
    }
}

/// Parse une heure murale "HH:MM".
pub fn parse_hhmm(raw: &str) -> Result<NaiveTime, String> {
    NaiveTime::parse_from_str(raw, "%H:%M").map_err(|_| format!("invalid time: {raw}"))
}

/// Paire matin/après-midi : la forme unique partagée par les règles hebdo,
/// les exceptions et les propositions de changement d'horaires.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShiftPair {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub morning: Option<TimeRange>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub afternoon: Option<TimeRange>,
}

impl ShiftPair {
    pub fn is_empty(&self) -> bool {
        self.morning.is_none() && self.afternoon.is_none()
    }

    /// Fenêtre d'ouverture de la journée, de la première ouverture à la
    /// dernière fermeture. `None` si aucune plage n'est définie.
    pub fn window(&self) -> Option<(NaiveTime, NaiveTime)> {
        let open = self
            .morning
            .as_ref()
            .map(|r| r.start)
            .or_else(|| self.afternoon.as_ref().map(|r| r.start))?;
        let close = self
            .afternoon
            .as_ref()
            .map(|r| r.end)
            .or_else(|| self.morning.as_ref().map(|r| r.end))?;
        Some((open, close))
    }

    /// Pause entre les deux plages quand elles sont toutes les deux définies.
    pub fn break_range(&self) -> Option<(NaiveTime, NaiveTime)> {
        match (&self.morning, &self.afternoon) {
            (Some(m), Some(a)) => Some((m.end, a.start)),
            _ => None,
        }
    }

    /// Revalide les plages : les champs sont publics et la désérialisation
    /// ne passe pas par les constructeurs.
    pub fn validate(&self) -> Result<(), String> {
        for range in [&self.morning, &self.afternoon].into_iter().flatten() {
            if range.end <= range.start {
                return Err("range end must be after start".to_string());
            }
        }
        if let (Some(m), Some(a)) = (&self.morning, &self.afternoon) {
            if a.start < m.end {
                return Err("afternoon shift starts before morning ends".to_string());
            }
        }
        Ok(())
    }
}

/// Règle hebdomadaire récurrente, unique par jour (0=dimanche..6=samedi).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeeklyRule {
    pub day_of_week: u8,
    #[serde(default)]
    pub closed: bool,
    #[serde(default)]
    pub shifts: ShiftPair,
}

/// Dérogation datée aux horaires hebdo (bornes incluses).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilityException {
    pub id: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default)]
    pub closed: bool,
    #[serde(default)]
    pub shifts: ShiftPair,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl AvailabilityException {
    pub fn new(
        start_date: NaiveDate,
        end_date: NaiveDate,
        closed: bool,
        shifts: ShiftPair,
        reason: Option<String>,
        created_at: DateTime<Utc>,
    ) -> Result<Self, String> {
        if end_date < start_date {
            return Err("exception end date before start date".to_string());
        }
        shifts.validate()?;
        Ok(Self {
            id: Uuid::new_v4().to_string(),
            start_date,
            end_date,
            closed,
            shifts,
            reason,
            created_at,
        })
    }

    pub fn covers(&self, date: NaiveDate) -> bool {
        self.start_date <= date && date <= self.end_date
    }
}

/// Horaire effectif résolu pour une journée ouverte. Les bornes de pause
/// sont toujours renseignées (14:00–16:00 par défaut).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DaySchedule {
    pub open: NaiveTime,
    pub close: NaiveTime,
    pub break_start: NaiveTime,
    pub break_end: NaiveTime,
}

/// Statut d'une réservation. Seuls Pending et Confirmed participent aux
/// tests de chevauchement et de conflit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Cancelled,
    Deleted,
}

/// Réservation. `start_at`/`end_at` (UTC) font foi pour tout calcul
/// d'intervalle ; `date`/`start_time` sont les valeurs murales affichées.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub id: BookingId,
    pub locator: String,
    pub service: ServiceId,
    pub customer: Customer,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
    pub status: BookingStatus,
    #[serde(default)]
    pub needs_review: bool,
    pub created_at: DateTime<Utc>,
}

impl Booking {
    /// Crée une réservation confirmée en validant que `end_at > start_at`.
    pub fn new(
        locator: String,
        service: ServiceId,
        customer: Customer,
        date: NaiveDate,
        start_time: NaiveTime,
        start_at: DateTime<Utc>,
        end_at: DateTime<Utc>,
        created_at: DateTime<Utc>,
    ) -> Result<Self, String> {
        if end_at <= start_at {
            return Err("end must be strictly after start".to_string());
        }
        Ok(Self {
            id: BookingId::random(),
            locator,
            service,
            customer,
            date,
            start_time,
            start_at,
            end_at,
            status: BookingStatus::Confirmed,
            needs_review: false,
            created_at,
        })
    }

    pub fn is_active(&self) -> bool {
        matches!(self.status, BookingStatus::Pending | BookingStatus::Confirmed)
    }

    /// Durée en minutes.
    pub fn duration_minutes(&self) -> i64 {
        (self.end_at - self.start_at).num_minutes()
    }
}

fn default_zone() -> Tz {
    chrono_tz::Europe::Paris
}

/// Jeu de données complet du salon : catalogue, horaires et réservations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Agenda {
    #[serde(default = "default_zone")]
    pub time_zone: Tz,
    #[serde(default)]
    pub services: Vec<Service>,
    #[serde(default)]
    pub weekly: Vec<WeeklyRule>,
    #[serde(default)]
    pub exceptions: Vec<AvailabilityException>,
    #[serde(default)]
    pub bookings: Vec<Booking>,
}

impl Default for Agenda {
    fn default() -> Self {
        Self {
            time_zone: default_zone(),
            services: Vec::new(),
            weekly: Vec::new(),
            exceptions: Vec::new(),
            bookings: Vec::new(),
        }
    }
}

impl Agenda {
    pub fn find_service<'a>(&'a self, id: &ServiceId) -> Option<&'a Service> {
        self.services.iter().find(|s| &s.id == id)
    }
    pub fn find_service_by_name<'a>(&'a self, name: &str) -> Option<&'a Service> {
        self.services.iter().find(|s| s.name == name)
    }
    pub fn find_booking<'a>(&'a self, id: &BookingId) -> Option<&'a Booking> {
        self.bookings.iter().find(|b| &b.id == id)
    }
    pub fn find_booking_mut(&mut self, id: &BookingId) -> Option<&mut Booking> {
        self.bookings.iter_mut().find(|b| &b.id == id)
    }
    pub fn find_booking_by_locator<'a>(&'a self, locator: &str) -> Option<&'a Booking> {
        self.bookings.iter().find(|b| b.locator == locator)
    }
    pub fn weekly_for_day<'a>(&'a self, day_of_week: u8) -> Option<&'a WeeklyRule> {
        self.weekly.iter().find(|r| r.day_of_week == day_of_week)
    }
    /// Réservations actives (Pending/Confirmed) d'une date locale, triées
    /// par instant de début.
    pub fn active_bookings_on(&self, date: NaiveDate) -> Vec<&Booking> {
        let mut out: Vec<&Booking> = self
            .bookings
            .iter()
            .filter(|b| b.is_active() && b.date == date)
            .collect();
        out.sort_by_key(|b| b.start_at);
        out
    }
}
