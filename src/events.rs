//! Timeline events derived from a family snapshot.

use std::collections::{HashMap, HashSet};

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::geometry::hash32;
use crate::ir::{EventRecord, Person, Tree};

static FULL_DATE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\d{4})-(\d{2})-(\d{2})$").unwrap());
static MONTH_DATE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\d{4})-(\d{2})$").unwrap());
static YEAR_DATE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\d{4})$").unwrap());
static LOOSE_DATE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{4})[-/](\d{1,2})[-/](\d{1,2})").unwrap());

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimelineEvent {
    pub id: String,
    pub kind: String,
    pub date: String,
    pub title: String,
    pub meta: String,
    pub person: String,
    pub photo: String,
}

/// Calendar date with month/day defaulting to 1 for partial inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct EventDate {
    pub year: i32,
    pub month: u32,
    pub day: u32,
}

impl EventDate {
    fn new(year: i32, month: u32, day: u32) -> Option<Self> {
        ((1..=12).contains(&month) && (1..=31).contains(&day)).then_some(Self { year, month, day })
    }
}

pub fn parse_date(raw: &str) -> Option<EventDate> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    let num = |caps: &regex::Captures<'_>, i: usize| -> Option<u32> { caps.get(i)?.as_str().parse().ok() };
    if let Some(caps) = FULL_DATE_RE.captures(s) {
        return EventDate::new(num(&caps, 1)? as i32, num(&caps, 2)?, num(&caps, 3)?);
    }
    if let Some(caps) = MONTH_DATE_RE.captures(s) {
        return EventDate::new(num(&caps, 1)? as i32, num(&caps, 2)?, 1);
    }
    if let Some(caps) = YEAR_DATE_RE.captures(s) {
        return EventDate::new(num(&caps, 1)? as i32, 1, 1);
    }
    if let Some(caps) = LOOSE_DATE_RE.captures(s) {
        return EventDate::new(num(&caps, 1)? as i32, num(&caps, 2)?, num(&caps, 3)?);
    }
    None
}

/// Formats a date at the precision it was written with; unparseable input is
/// returned unchanged.
pub fn format_date(raw: &str) -> String {
    let Some(date) = parse_date(raw) else {
        return raw.to_string();
    };
    let s = raw.trim();
    if YEAR_DATE_RE.is_match(s) {
        format!("{}", date.year)
    } else if MONTH_DATE_RE.is_match(s) {
        format!("{}-{:02}", date.year, date.month)
    } else {
        format!("{}-{:02}-{:02}", date.year, date.month, date.day)
    }
}

/// Whole years between birth and death, or `None` if either is unparseable.
pub fn compute_age(born: &str, died: &str) -> Option<i32> {
    let b = parse_date(born)?;
    let d = parse_date(died)?;
    let mut age = d.year - b.year;
    if (d.month, d.day) < (b.month, b.day) {
        age -= 1;
    }
    Some(age)
}

fn where_text(record: &EventRecord) -> String {
    record
        .place_text
        .clone()
        .or_else(|| record.place.as_ref().map(|p| p.display()))
        .unwrap_or_default()
}

fn default_title(kind: &str, names: &[&str], fallback: &str) -> String {
    match (kind, names) {
        ("marriage", [a, b, ..]) => format!("Marriage of {a} & {b}"),
        ("move", [a, ..]) => format!("{a} moves"),
        ("birth" | "death", [a, ..]) => a.to_string(),
        _ if !fallback.is_empty() => fallback.to_string(),
        _ => "Event".to_string(),
    }
}

fn default_meta(kind: &str, place: &str) -> String {
    let (with_place, bare) = match kind {
        "marriage" => ("Married in", "Marriage"),
        "move" => ("Moved to", "Move"),
        "birth" => ("Born in", "Born"),
        "death" => ("Died in", "Died"),
        _ => return place.to_string(),
    };
    if place.is_empty() {
        bare.to_string()
    } else {
        format!("{with_place} {place}")
    }
}

fn finish(id: Option<&str>, kind: &str, date: &str, title: String, meta: String, person: String, photo: String) -> TimelineEvent {
    let id = match id {
        Some(id) => id.to_string(),
        None => format!("ev-{:08x}", hash32(&format!("{kind}|{date}|{title}|{person}"))),
    };
    TimelineEvent {
        id,
        kind: kind.to_string(),
        date: date.to_string(),
        title,
        meta,
        person,
        photo,
    }
}

fn tree_event(record: &EventRecord, by_id: &HashMap<String, &Person>) -> TimelineEvent {
    let persons: Vec<&Person> = record
        .people
        .iter()
        .filter_map(|pid| by_id.get(&pid.to_lowercase()).copied())
        .collect();
    let names: Vec<&str> = persons
        .iter()
        .map(|p| p.name.as_str())
        .filter(|n| !n.is_empty())
        .collect();
    let person_label = if names.is_empty() {
        record.person.clone().unwrap_or_default()
    } else {
        names.join(" & ")
    };
    let place = where_text(record);

    let title = record
        .title
        .clone()
        .unwrap_or_else(|| default_title(&record.kind, &names, &person_label));
    let meta = record
        .meta
        .clone()
        .unwrap_or_else(|| default_meta(&record.kind, &place));
    let photo = record
        .photo
        .clone()
        .or_else(|| persons.first().map(|p| p.photo.clone()))
        .unwrap_or_default();

    finish(
        record.id.as_deref(),
        &record.kind,
        &record.date,
        title,
        meta,
        person_label,
        photo,
    )
}

fn person_events(person: &Person, out: &mut Vec<TimelineEvent>) {
    let place = person.place.display();
    let name = person.name.clone();

    if let Some(born) = &person.born {
        let meta = if place.is_empty() {
            "Born".to_string()
        } else {
            format!("Born in {place}")
        };
        out.push(finish(None, "birth", born, name.clone(), meta, name.clone(), person.photo.clone()));
    }

    if let Some(died) = &person.died {
        let age = person.born.as_deref().and_then(|b| compute_age(b, died));
        let meta = match age {
            Some(age) => format!("Died \u{2022} Age {age}"),
            None => "Died".to_string(),
        };
        out.push(finish(None, "death", died, name.clone(), meta, name.clone(), person.photo.clone()));
    }

    for record in &person.events {
        let title = record.title.clone().unwrap_or_else(|| name.clone());
        let meta = record.meta.clone().unwrap_or_else(|| where_text(record));
        let photo = record.photo.clone().unwrap_or_else(|| person.photo.clone());
        out.push(finish(None, &record.kind, &record.date, title, meta, name.clone(), photo));
    }
}

/// All dated events of a snapshot in chronological order (undated last),
/// de-duplicated on kind, formatted date and title.
pub fn build_events(tree: &Tree) -> Vec<TimelineEvent> {
    let by_id: HashMap<String, &Person> = tree
        .people
        .iter()
        .map(|p| (p.id.to_lowercase(), p))
        .collect();

    let mut events: Vec<TimelineEvent> = tree
        .events
        .iter()
        .map(|record| tree_event(record, &by_id))
        .collect();
    for person in &tree.people {
        person_events(person, &mut events);
    }

    // Stable: equal dates keep source order.
    events.sort_by_key(|e| match parse_date(&e.date) {
        Some(d) => (0, d),
        None => (1, EventDate { year: 0, month: 1, day: 1 }),
    });

    let mut seen = HashSet::new();
    events
        .into_iter()
        .filter(|e| seen.insert(format!("{}|{}|{}", e.kind, format_date(&e.date), e.title)))
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

/// Type chip + search box + sort toggle.
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    /// `None` shows every kind.
    pub kind: Option<String>,
    pub query: String,
    pub order: SortOrder,
}

impl EventFilter {
    pub fn matches(&self, event: &TimelineEvent) -> bool {
        if let Some(kind) = &self.kind {
            if kind != "all" && &event.kind != kind {
                return false;
            }
        }
        let query = self.query.trim().to_lowercase();
        if query.is_empty() {
            return true;
        }
        let hay = format!(
            "{} {} {} {} {}",
            event.title, event.person, event.meta, event.kind, event.date
        )
        .to_lowercase();
        hay.contains(&query)
    }

    pub fn apply(&self, events: &[TimelineEvent]) -> Vec<TimelineEvent> {
        let mut out: Vec<TimelineEvent> = events.iter().filter(|e| self.matches(e)).cloned().collect();
        if self.order == SortOrder::Desc {
            out.reverse();
        }
        out
    }
}
