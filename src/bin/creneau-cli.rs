#![forbid(unsafe_code)]
use anyhow::{bail, Context, Result};
use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};
use creneau::{
    io,
    model::{parse_hhmm, Customer, Service, ServiceId, ShiftPair, TimeRange},
    notification::{prepare_reminder, TextReminder},
    planning::{BookingError, BookingUpdate, ChangeScope, ConflictReason, HoursConflict, Planner, ScheduleChange},
    storage::{JsonStorage, Storage},
};
#[cfg(feature = "logging")]
use tracing_subscriber::{fmt::Subscriber, EnvFilter};

/// CLI minimaliste de réservation de salon (sans base de données)
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// Active les logs (feature `logging`)
    #[arg(long, global = true)]
    log: bool,

    /// Fichier JSON de l'agenda
    #[arg(long, global = true, default_value = "agenda.json")]
    agenda: String,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Ajouter une prestation au catalogue
    AddService {
        #[arg(long)]
        name: String,
        /// Durée en minutes
        #[arg(long)]
        duration: i64,
        /// Prix en centimes
        #[arg(long, default_value_t = 0)]
        price: i64,
    },

    /// Importer des prestations depuis un CSV
    ImportServices {
        #[arg(long)]
        csv: String,
    },

    /// Fixer les horaires hebdo d'un jour (0=dimanche..6=samedi)
    SetHours {
        #[arg(long)]
        day: u8,
        /// Plage du matin, "HH:MM-HH:MM"
        #[arg(long)]
        morning: Option<String>,
        /// Plage de l'après-midi, "HH:MM-HH:MM"
        #[arg(long)]
        afternoon: Option<String>,
        #[arg(long)]
        closed: bool,
        /// Applique malgré les réservations en conflit (marquées à revoir)
        #[arg(long)]
        force: bool,
    },

    /// Poser une exception datée (une date ou une plage incluse)
    SetException {
        /// "YYYY-MM-DD"
        #[arg(long)]
        start: String,
        /// "YYYY-MM-DD", défaut = start
        #[arg(long)]
        end: Option<String>,
        #[arg(long)]
        morning: Option<String>,
        #[arg(long)]
        afternoon: Option<String>,
        #[arg(long)]
        closed: bool,
        #[arg(long)]
        reason: Option<String>,
        #[arg(long)]
        force: bool,
    },

    /// Vérifier les conflits d'une proposition d'horaires sans l'appliquer
    CheckHours {
        /// Jour hebdo visé (exclusif avec --start/--end)
        #[arg(long)]
        day: Option<u8>,
        #[arg(long)]
        start: Option<String>,
        #[arg(long)]
        end: Option<String>,
        #[arg(long)]
        morning: Option<String>,
        #[arg(long)]
        afternoon: Option<String>,
        #[arg(long)]
        closed: bool,
        /// Export CSV des conflits (optionnel)
        #[arg(long)]
        report: Option<String>,
    },

    /// Statut ouvert/fermé de chaque jour d'un mois
    Month {
        #[arg(long)]
        year: i32,
        #[arg(long)]
        month: u32,
    },

    /// Lister les créneaux réservables d'une date
    Slots {
        /// "YYYY-MM-DD"
        #[arg(long)]
        date: String,
        /// Nom de prestation du catalogue
        #[arg(long)]
        service: Option<String>,
        /// Durée en minutes (si pas de --service)
        #[arg(long)]
        duration: Option<i64>,
    },

    /// Réserver un créneau
    Book {
        #[arg(long)]
        service: String,
        /// "YYYY-MM-DD"
        #[arg(long)]
        date: String,
        /// "HH:MM"
        #[arg(long)]
        time: String,
        #[arg(long)]
        name: String,
        #[arg(long)]
        phone: String,
        #[arg(long)]
        email: Option<String>,
    },

    /// Replanifier une réservation par son code
    Reschedule {
        #[arg(long)]
        locator: String,
        #[arg(long)]
        date: Option<String>,
        #[arg(long)]
        time: Option<String>,
        #[arg(long)]
        service: Option<String>,
    },

    /// Annuler une réservation
    Cancel {
        #[arg(long)]
        locator: String,
    },

    /// Réactiver une réservation annulée (revalidée comme une création)
    Reactivate {
        #[arg(long)]
        locator: String,
    },

    /// Lister et optionnellement exporter
    List {
        #[arg(long)]
        out_json: Option<String>,
        #[arg(long)]
        out_csv: Option<String>,
    },

    /// Générer un rappel texte pour une réservation à venir
    Notify {
        #[arg(long)]
        locator: String,
        #[arg(long, default_value_t = 2)]
        days_before: i64,
        /// Fichier de sortie (texte brut)
        #[arg(long)]
        out: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    #[cfg(feature = "logging")]
    if cli.log {
        let _ = Subscriber::builder()
            .with_env_filter(EnvFilter::from_default_env())
            .try_init();
    }

    let storage = JsonStorage::open(&cli.agenda)?;
    let mut planner = Planner::with_agenda(storage.load_or_default()?);
    let now = Utc::now();

    let code = match cli.cmd {
        Commands::AddService { name, duration, price } => {
            let service = Service::new(name, duration, price).map_err(anyhow::Error::msg)?;
            let id = planner.add_service(service);
            storage.save(planner.agenda())?;
            println!("Service added: {}", id.as_str());
            0
        }
        Commands::ImportServices { csv } => {
            let services = io::import_services_csv(csv)?;
            for s in services {
                planner.add_service(s);
            }
            storage.save(planner.agenda())?;
            0
        }
        Commands::SetHours { day, morning, afternoon, closed, force } => {
            let change = ScheduleChange {
                scope: ChangeScope::Weekday(day),
                closed,
                shifts: parse_shifts(morning, afternoon)?,
                reason: None,
            };
            apply(&mut planner, &storage, change, force, now)?
        }
        Commands::SetException { start, end, morning, afternoon, closed, reason, force } => {
            let start = parse_date(&start)?;
            let scope = match end {
                Some(raw) => ChangeScope::Range { start, end: parse_date(&raw)? },
                None => ChangeScope::Date(start),
            };
            let change = ScheduleChange {
                scope,
                closed,
                shifts: parse_shifts(morning, afternoon)?,
                reason,
            };
            apply(&mut planner, &storage, change, force, now)?
        }
        Commands::CheckHours { day, start, end, morning, afternoon, closed, report } => {
            let scope = match (day, start) {
                (Some(d), None) => ChangeScope::Weekday(d),
                (None, Some(raw)) => {
                    let start = parse_date(&raw)?;
                    match end {
                        Some(raw) => ChangeScope::Range { start, end: parse_date(&raw)? },
                        None => ChangeScope::Date(start),
                    }
                }
                _ => bail!("use either --day or --start [--end]"),
            };
            let change = ScheduleChange {
                scope,
                closed,
                shifts: parse_shifts(morning, afternoon)?,
                reason: None,
            };
            let conflicts = planner.check_change(&change, now);
            if conflicts.is_empty() {
                println!("OK: no conflicts");
                0
            } else {
                eprintln!("Found {} conflict(s)", conflicts.len());
                for c in &conflicts {
                    print_conflict(c);
                }
                if let Some(path) = report {
                    // CSV simple
                    let mut w = csv::Writer::from_path(path)?;
                    w.write_record(["locator", "customer", "date", "time", "reason"])?;
                    for c in &conflicts {
                        let date = c.date.format("%Y-%m-%d").to_string();
                        let time = c.time.format("%H:%M").to_string();
                        w.write_record([
                            c.locator.as_str(),
                            c.customer_name.as_str(),
                            date.as_str(),
                            time.as_str(),
                            reason_label(c.reason),
                        ])?;
                    }
                    w.flush()?;
                }
                // Code 2 = WARNING/INCOMPLETE
                2
            }
        }
        Commands::Month { year, month } => {
            let days = planner.month_availability(year, month, now)?;
            for (date, status) in &days {
                let label = if status.is_open { "open" } else { "closed" };
                match &status.reason {
                    Some(reason) => println!("{date} | {label} ({reason})"),
                    None => println!("{date} | {label}"),
                }
            }
            0
        }
        Commands::Slots { date, service, duration } => {
            let date = parse_date(&date)?;
            let duration = match (service, duration) {
                (Some(name), None) => service_by_name(&planner, &name)?.1,
                (None, Some(minutes)) => minutes,
                _ => bail!("use either --service or --duration"),
            };
            let slots = planner.list_slots(date, duration, now)?;
            if slots.is_empty() {
                println!("No slot available on {date}");
            }
            for t in slots {
                println!("{}", t.format("%H:%M"));
            }
            0
        }
        Commands::Book { service, date, time, name, phone, email } => {
            let (service_id, _) = service_by_name(&planner, &service)?;
            let date = parse_date(&date)?;
            let time = parse_hhmm(&time).map_err(anyhow::Error::msg)?;
            let mut customer = Customer::new(name, phone);
            customer.email = email;
            let booking = planner.create_booking(&service_id, date, time, customer, now)?;
            storage.save(planner.agenda())?;
            println!(
                "Booked {} on {} at {} (code {})",
                service,
                booking.date,
                booking.start_time.format("%H:%M"),
                booking.locator
            );
            0
        }
        Commands::Reschedule { locator, date, time, service } => {
            let id = booking_id(&planner, &locator)?;
            let update = BookingUpdate {
                date: date.as_deref().map(parse_date).transpose()?,
                time: time
                    .as_deref()
                    .map(|raw| parse_hhmm(raw).map_err(anyhow::Error::msg))
                    .transpose()?,
                service: service
                    .as_deref()
                    .map(|name| service_by_name(&planner, name).map(|(id, _)| id))
                    .transpose()?,
                ..BookingUpdate::default()
            };
            let booking = planner.reschedule_booking(&id, update, now)?;
            storage.save(planner.agenda())?;
            println!(
                "Rescheduled {} to {} at {}",
                booking.locator,
                booking.date,
                booking.start_time.format("%H:%M")
            );
            0
        }
        Commands::Cancel { locator } => {
            let id = booking_id(&planner, &locator)?;
            planner.cancel_booking(&id)?;
            storage.save(planner.agenda())?;
            println!("Cancelled {locator}");
            0
        }
        Commands::Reactivate { locator } => {
            let id = booking_id(&planner, &locator)?;
            planner.reactivate_booking(&id, now)?;
            storage.save(planner.agenda())?;
            println!("Reactivated {locator}");
            0
        }
        Commands::List { out_json, out_csv } => {
            if let Some(path) = out_json {
                io::export_agenda_json(path, planner.agenda())?;
            }
            if let Some(path) = out_csv {
                io::export_bookings_csv(path, planner.agenda())?;
            }
            // impression compacte
            for b in &planner.agenda().bookings {
                let service = planner
                    .agenda()
                    .find_service(&b.service)
                    .map(|s| s.name.as_str())
                    .unwrap_or("-");
                println!(
                    "{} | {} {} | {} | {} | {}",
                    b.locator,
                    b.date,
                    b.start_time.format("%H:%M"),
                    service,
                    b.customer.name,
                    io::status_label(b.status)
                );
            }
            0
        }
        Commands::Notify { locator, days_before, out } => {
            let renderer = TextReminder;
            let reminder = prepare_reminder(planner.agenda(), &locator, days_before, now, &renderer)?;
            std::fs::write(&out, reminder.content)?;
            println!(
                "Reminder generated for {} at {}",
                reminder.locator,
                reminder.notice_at.to_rfc3339()
            );
            0
        }
    };

    std::process::exit(code);
}

fn apply(
    planner: &mut Planner,
    storage: &JsonStorage,
    change: ScheduleChange,
    force: bool,
    now: chrono::DateTime<Utc>,
) -> Result<i32> {
    match planner.apply_change(change.clone(), force, now) {
        Ok(conflicts) => {
            storage.save(planner.agenda())?;
            if conflicts.is_empty() {
                println!("Hours updated");
            } else {
                eprintln!(
                    "Hours updated; {} booking(s) flagged for review",
                    conflicts.len()
                );
                for c in &conflicts {
                    print_conflict(c);
                }
            }
            Ok(0)
        }
        Err(BookingError::ConflictingBookings(n)) => {
            eprintln!("Refused: {n} conflicting booking(s); re-run with --force to apply anyway");
            for c in planner.check_change(&change, now) {
                print_conflict(&c);
            }
            Ok(2)
        }
        Err(err) => Err(err.into()),
    }
}

fn print_conflict(c: &HoursConflict) {
    eprintln!(
        "  {} | {} {} | {} | {}",
        c.locator,
        c.date,
        c.time.format("%H:%M"),
        c.customer_name,
        reason_label(c.reason)
    );
}

fn reason_label(reason: ConflictReason) -> &'static str {
    match reason {
        ConflictReason::DayClosed => "day now closed",
        ConflictReason::OutsideNewHours => "outside new hours / overlaps break",
    }
}

fn parse_date(raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").with_context(|| format!("invalid date: {raw}"))
}

fn parse_shifts(morning: Option<String>, afternoon: Option<String>) -> Result<ShiftPair> {
    let parse = |raw: Option<String>| -> Result<Option<TimeRange>> {
        match raw {
            Some(raw) => Ok(Some(TimeRange::parse(&raw).map_err(anyhow::Error::msg)?)),
            None => Ok(None),
        }
    };
    Ok(ShiftPair {
        morning: parse(morning)?,
        afternoon: parse(afternoon)?,
    })
}

fn service_by_name(planner: &Planner, name: &str) -> Result<(ServiceId, i64)> {
    let service = planner
        .agenda()
        .find_service_by_name(name)
        .or_else(|| planner.agenda().find_service(&ServiceId::new(name)))
        .ok_or_else(|| anyhow::anyhow!("unknown service: {}", name))?;
    Ok((service.id.clone(), service.duration_minutes))
}

fn booking_id(planner: &Planner, locator: &str) -> Result<creneau::BookingId> {
    planner
        .agenda()
        .find_booking_by_locator(locator)
        .map(|b| b.id.clone())
        .ok_or_else(|| anyhow::anyhow!("unknown booking: {}", locator))
}
