use crate::model::{Agenda, BookingStatus, Service};
use anyhow::{bail, Context};
use csv::{ReaderBuilder, WriterBuilder};
use std::fs;
use std::path::Path;

/// Import de prestations depuis CSV: header `name,duration_minutes[,price_cents]`
pub fn import_services_csv<P: AsRef<Path>>(path: P) -> anyhow::Result<Vec<Service>> {
    let mut rdr = ReaderBuilder::new().has_headers(true).from_path(path)?;
    let mut out = Vec::new();
    for rec in rdr.records() {
        let rec = rec?;
        let name = rec.get(0).context("missing name")?.trim();
        let duration = rec.get(1).context("missing duration_minutes")?.trim();
        if name.is_empty() || duration.is_empty() {
            bail!("invalid service row (empty)");
        }
        let duration: i64 = duration
            .parse()
            .with_context(|| format!("invalid duration for service {name}"))?;
        let price: i64 = match rec.get(2) {
            Some(raw) if !raw.trim().is_empty() => raw
                .trim()
                .parse()
                .with_context(|| format!("invalid price for service {name}"))?,
            _ => 0,
        };
        let service = Service::new(name.to_string(), duration, price)
            .map_err(anyhow::Error::msg)
            .with_context(|| format!("invalid service {name}"))?;
        out.push(service);
    }
    Ok(out)
}

/// Export CSV du catalogue: header `id,name,duration_minutes,price_cents`
pub fn export_services_csv<P: AsRef<Path>>(path: P, agenda: &Agenda) -> anyhow::Result<()> {
    let mut w = WriterBuilder::new().has_headers(true).from_path(path)?;
    w.write_record(["id", "name", "duration_minutes", "price_cents"])?;
    let mut dur = itoa::Buffer::new();
    let mut price = itoa::Buffer::new();
    for s in &agenda.services {
        w.write_record([
            s.id.as_str(),
            s.name.as_str(),
            dur.format(s.duration_minutes),
            price.format(s.price_cents),
        ])?;
    }
    w.flush()?;
    Ok(())
}

/// Export CSV des réservations:
/// header `locator,date,start_time,service,customer,phone,status,needs_review`
pub fn export_bookings_csv<P: AsRef<Path>>(path: P, agenda: &Agenda) -> anyhow::Result<()> {
    let mut w = WriterBuilder::new().has_headers(true).from_path(path)?;
    w.write_record([
        "locator",
        "date",
        "start_time",
        "service",
        "customer",
        "phone",
        "status",
        "needs_review",
    ])?;
    for b in &agenda.bookings {
        let service = agenda
            .find_service(&b.service)
            .map(|s| s.name.as_str())
            .unwrap_or("");
        let date = b.date.format("%Y-%m-%d").to_string();
        let time = b.start_time.format("%H:%M").to_string();
        w.write_record([
            b.locator.as_str(),
            date.as_str(),
            time.as_str(),
            service,
            b.customer.name.as_str(),
            b.customer.phone.as_str(),
            status_label(b.status),
            if b.needs_review { "yes" } else { "" },
        ])?;
    }
    w.flush()?;
    Ok(())
}

pub fn status_label(status: BookingStatus) -> &'static str {
    match status {
        BookingStatus::Pending => "pending",
        BookingStatus::Confirmed => "confirmed",
        BookingStatus::Cancelled => "cancelled",
        BookingStatus::Deleted => "deleted",
    }
}

/// Export JSON de l'agenda (jolie mise en forme)
pub fn export_agenda_json<P: AsRef<Path>>(path: P, agenda: &Agenda) -> anyhow::Result<()> {
    let s = serde_json::to_string_pretty(agenda)?;
    fs::write(path, s)?;
    Ok(())
}
