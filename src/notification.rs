use crate::model::{Agenda, Booking, Service};
use anyhow::{bail, Context, Result};
use chrono::{DateTime, Duration, Utc};

/// Représente un rappel généré pour une réservation.
#[derive(Debug, Clone)]
pub struct Reminder {
    pub locator: String,
    pub notice_at: DateTime<Utc>,
    pub content: String,
}

/// Permet de customiser le rendu du message (texte, SMS, etc.).
/// L'envoi effectif reste hors de la bibliothèque.
pub trait ReminderRenderer {
    fn render(&self, booking: &Booking, service: &Service, notice_at: DateTime<Utc>) -> String;
}

/// Gabarit texte simple destiné à un futur mail/SMS.
#[derive(Debug, Default, Clone, Copy)]
pub struct TextReminder;

impl ReminderRenderer for TextReminder {
    fn render(&self, booking: &Booking, service: &Service, notice_at: DateTime<Utc>) -> String {
        format!(
            "Bonjour {name},\n\nVotre rendez-vous \"{service}\" est prévu le {date} à {time} (code {locator}).\nCe message est généré le {notice}.\n\nEn cas d'empêchement, merci de prévenir le salon au plus tôt.\n",
            name = booking.customer.name,
            service = service.name,
            date = booking.date.format("%Y-%m-%d"),
            time = booking.start_time.format("%H:%M"),
            locator = booking.locator,
            notice = notice_at.to_rfc3339()
        )
    }
}

/// Prépare un rappel pour une réservation à venir, identifiée par son code.
pub fn prepare_reminder(
    agenda: &Agenda,
    locator: &str,
    days_before: i64,
    now: DateTime<Utc>,
    renderer: &dyn ReminderRenderer,
) -> Result<Reminder> {
    if days_before < 0 {
        bail!("days_before must be positive");
    }

    let booking = agenda
        .find_booking_by_locator(locator)
        .with_context(|| format!("unknown booking locator: {locator}"))?;
    if !booking.is_active() {
        bail!("booking {locator} is not active");
    }
    if booking.start_at < now {
        bail!("booking {locator} is already past");
    }

    let service = agenda
        .find_service(&booking.service)
        .with_context(|| format!("unknown service for booking {locator}"))?;

    let notice_at = booking.start_at - Duration::days(days_before);

    let content = renderer.render(booking, service, notice_at);
    Ok(Reminder {
        locator: booking.locator.clone(),
        notice_at,
        content,
    })
}
