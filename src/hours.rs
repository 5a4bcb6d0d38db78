use crate::model::{ShiftPair, WeeklyRule};
use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Gabarit d'horaires d'ouverture réutilisable (horaires d'été, d'hiver...),
/// convertible en jeu complet de règles hebdo.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HoursTemplate {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub days: Vec<DayHours>,
    #[serde(default)]
    pub metadata: Option<serde_json::Value>,
}

impl HoursTemplate {
    pub fn validate(&self) -> Result<()> {
        if self.id.trim().is_empty() {
            bail!("template id cannot be empty");
        }
        if self.name.trim().is_empty() {
            bail!("template name cannot be empty");
        }
        if self.days.is_empty() {
            bail!("template must define at least one day");
        }
        for day in &self.days {
            day.validate()?;
        }
        for (i, a) in self.days.iter().enumerate() {
            if self.days.iter().skip(i + 1).any(|b| b.day_of_week == a.day_of_week) {
                bail!("template defines day {} twice", a.day_of_week);
            }
        }
        Ok(())
    }
}

/// Horaires d'un jour du gabarit (0=dimanche..6=samedi).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DayHours {
    pub day_of_week: u8,
    #[serde(default)]
    pub closed: bool,
    #[serde(default)]
    pub shifts: ShiftPair,
}

impl DayHours {
    fn validate(&self) -> Result<()> {
        if self.day_of_week > 6 {
            bail!("day_of_week must be 0..=6, got {}", self.day_of_week);
        }
        self.shifts.validate().map_err(anyhow::Error::msg)?;
        if !self.closed && self.shifts.is_empty() {
            bail!("open day {} needs at least one shift", self.day_of_week);
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct TemplateInfo {
    pub template: HoursTemplate,
    pub path: PathBuf,
    pub modified: Option<DateTime<Utc>>,
}

/// Gestion simple des gabarits persistés sur disque.
#[derive(Debug, Clone)]
pub struct TemplateStore {
    base_dir: PathBuf,
}

impl TemplateStore {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            base_dir: dir.as_ref().to_path_buf(),
        }
    }

    fn ensure_dir(&self) -> Result<()> {
        fs::create_dir_all(&self.base_dir)
            .with_context(|| format!("creating template directory {}", self.base_dir.display()))
    }

    pub fn save(&self, template: &HoursTemplate) -> Result<PathBuf> {
        template.validate()?;
        self.ensure_dir()?;
        let path = self.base_dir.join(format!("{}.json", template.id));
        let json = serde_json::to_string_pretty(template)?;
        fs::write(&path, json).with_context(|| format!("writing template {}", path.display()))?;
        Ok(path)
    }

    pub fn load(&self, id: &str) -> Result<HoursTemplate> {
        let path = self.base_dir.join(format!("{}.json", id));
        let data =
            fs::read(&path).with_context(|| format!("reading template {}", path.display()))?;
        let template: HoursTemplate = serde_json::from_slice(&data)
            .with_context(|| format!("parsing template {}", path.display()))?;
        template.validate()?;
        Ok(template)
    }

    pub fn list(&self) -> Result<Vec<TemplateInfo>> {
        if !self.base_dir.exists() {
            return Ok(Vec::new());
        }
        let mut infos = Vec::new();
        for entry in fs::read_dir(&self.base_dir)? {
            let entry = entry?;
            let path = entry.path();
            if path.extension().and_then(|s| s.to_str()) != Some("json") {
                continue;
            }
            let data = fs::read(&path)?;
            let template: HoursTemplate = match serde_json::from_slice(&data) {
                Ok(t) => t,
                Err(err) => {
                    eprintln!(
                        "Warning: could not parse template {}: {err}",
                        path.display()
                    );
                    continue;
                }
            };
            let modified = entry
                .metadata()
                .and_then(|meta| meta.modified())
                .ok()
                .map(DateTime::<Utc>::from);
            infos.push(TemplateInfo {
                template,
                path,
                modified,
            });
        }
        infos.sort_by(|a, b| a.template.id.cmp(&b.template.id));
        Ok(infos)
    }
}

/// Convertit un gabarit en sept règles hebdo ; les jours absents du gabarit
/// deviennent des jours fermés.
pub fn weekly_rules(template: &HoursTemplate) -> Result<Vec<WeeklyRule>> {
    template.validate()?;

    let mut rules = Vec::with_capacity(7);
    for day in 0u8..7 {
        let rule = match template.days.iter().find(|d| d.day_of_week == day) {
            Some(d) => WeeklyRule {
                day_of_week: day,
                closed: d.closed,
                shifts: d.shifts.clone(),
            },
            None => WeeklyRule {
                day_of_week: day,
                closed: true,
                shifts: ShiftPair::default(),
            },
        };
        rules.push(rule);
    }
    Ok(rules)
}

pub fn export_template_json<P: AsRef<Path>>(path: P, template: &HoursTemplate) -> Result<()> {
    let json = serde_json::to_string_pretty(template)?;
    fs::write(path, json)?;
    Ok(())
}

pub fn load_template_from_file<P: AsRef<Path>>(path: P) -> Result<HoursTemplate> {
    let data = fs::read(&path)?;
    let template: HoursTemplate = serde_json::from_slice(&data)?;
    template.validate()?;
    Ok(template)
}
