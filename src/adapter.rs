//! Tolerant adapter from backend JSON to the canonical [`crate::ir`] shape.
//!
//! Family data arrives from several generations of exports, each spelling the
//! same field differently. Every synonym list lives here, in priority order,
//! and nowhere else: the first entry that yields a usable value wins.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::error::{Error, Result};
use crate::ir::{DomainPosition, EventRecord, Person, Place, Relationship, Tree};

pub const PLACEHOLDER_AVATAR: &str = "/static/img/placeholder-avatar.png";
pub const UNKNOWN_NAME: &str = "Unknown";

/// Paths (nested keys) that may hold the people array.
const PEOPLE_PATHS: &[&[&str]] = &[&["people"], &["nodes"], &["members"], &["family", "people"]];
const RELATIONSHIP_PATHS: &[&[&str]] = &[&["relationships"], &["family", "relationships"]];
const EVENT_PATHS: &[&[&str]] = &[&["events"], &["family", "events"]];

const ID_FIELDS: &[&str] = &["id", "personId", "person_id"];
const NAME_FIELDS: &[&str] = &["name", "full_name", "display_name", "label"];
const PHOTO_FIELDS: &[&str] = &[
    "photo_url",
    "photo",
    "image_url",
    "img",
    "avatar_url",
    "image",
    "avatar",
];
const PARENT_FIELDS: &[&str] = &["parentId", "parent", "source", "sourceId"];
const CHILD_FIELDS: &[&str] = &["childId", "child", "target", "targetId"];

/// Location sources on a person record; `locations[0]` is consulted first.
const LOCATION_FIELDS: &[&str] = &[
    "location",
    "place",
    "birth_place",
    "birthPlace",
    "residence",
    "home",
];
const CITY_FIELDS: &[&str] = &["city", "town", "locality"];
const REGION_FIELDS: &[&str] = &["region", "state", "province", "area"];
const COUNTRY_FIELDS: &[&str] = &["country", "nation"];

/// Sub-objects searched for coordinates, before the record itself.
const COORD_CONTAINERS: &[&str] = &["map", "coords", "pin", "location", "place", "geo"];

#[derive(Debug, Clone, Copy)]
enum CoordKind {
    Percent,
    Geo,
}

struct CoordStrategy {
    x: &'static str,
    y: &'static str,
    kind: CoordKind,
}

/// Explicit percentage fields, then generic x/y spellings, then lat/lng.
/// For geographic strategies `x` is the longitude field and `y` the latitude.
const COORD_STRATEGIES: &[CoordStrategy] = &[
    CoordStrategy { x: "xPct", y: "yPct", kind: CoordKind::Percent },
    CoordStrategy { x: "lngPct", y: "latPct", kind: CoordKind::Percent },
    CoordStrategy { x: "lonPct", y: "latPct", kind: CoordKind::Percent },
    CoordStrategy { x: "x", y: "y", kind: CoordKind::Percent },
    CoordStrategy { x: "left", y: "top", kind: CoordKind::Percent },
    CoordStrategy { x: "px", y: "py", kind: CoordKind::Percent },
    CoordStrategy { x: "posX", y: "posY", kind: CoordKind::Percent },
    CoordStrategy { x: "mapX", y: "mapY", kind: CoordKind::Percent },
    CoordStrategy { x: "pinX", y: "pinY", kind: CoordKind::Percent },
    CoordStrategy { x: "lng", y: "lat", kind: CoordKind::Geo },
    CoordStrategy { x: "lon", y: "lat", kind: CoordKind::Geo },
    CoordStrategy { x: "longitude", y: "latitude", kind: CoordKind::Geo },
];

/// Ready-made secondary lines for tree cards.
const META_FIELDS: &[&str] = &[
    "meta",
    "subtitle",
    "subTitle",
    "dates",
    "date",
    "birthDeath",
    "lifespan",
    "years",
    "yearRange",
    "displayYears",
    "displayDate",
    "life",
    "lifeSpan",
];
const BIRTH_FIELDS: &[&str] = &[
    "birthYear",
    "birth_year",
    "bornYear",
    "born_year",
    "birthDate",
    "birth_date",
    "birth",
    "born",
    "b",
    "startYear",
    "start_year",
];
const DEATH_FIELDS: &[&str] = &[
    "deathYear",
    "death_year",
    "diedYear",
    "died_year",
    "deathDate",
    "death_date",
    "death",
    "died",
    "d",
    "endYear",
    "end_year",
];

static LEADING_YEAR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\d{4})[-/]").unwrap());
static BORN_PREFIX_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bb\.").unwrap());
static DIED_PREFIX_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bd\.").unwrap());

/// Validates an HTTP response from the family data endpoint and parses its body.
pub fn tree_from_response(status: u16, url: &str, body: &str) -> Result<Tree> {
    if !(200..300).contains(&status) {
        return Err(Error::Http {
            status,
            url: url.to_string(),
        });
    }
    parse_tree_json(body)
}

pub fn parse_tree_json(text: &str) -> Result<Tree> {
    let value: Value = serde_json::from_str(text)?;
    tree_from_value(&value)
}

pub fn tree_from_value(value: &Value) -> Result<Tree> {
    let Some(people) = first_array(value, PEOPLE_PATHS) else {
        tracing::warn!("family response has no recognised people array");
        return Err(Error::MalformedResponse);
    };

    let people: Vec<Person> = people
        .iter()
        .enumerate()
        .filter(|(_, raw)| raw.is_object())
        .map(|(idx, raw)| person_from_value(raw, idx))
        .collect();

    let relationships = first_array(value, RELATIONSHIP_PATHS)
        .map(|rels| rels.iter().filter_map(relationship_from_value).collect())
        .unwrap_or_default();

    let events = first_array(value, EVENT_PATHS)
        .map(|evs| evs.iter().filter(|e| e.is_object()).map(event_from_value).collect())
        .unwrap_or_default();

    Ok(Tree {
        people,
        relationships,
        events,
    })
}

pub fn person_from_value(raw: &Value, index: usize) -> Person {
    let name = text_field(raw, NAME_FIELDS).unwrap_or_else(|| UNKNOWN_NAME.to_string());
    let id = text_field(raw, ID_FIELDS).unwrap_or_else(|| format!("person-{index}"));
    let events = raw
        .get("events")
        .and_then(Value::as_array)
        .map(|evs| evs.iter().filter(|e| e.is_object()).map(event_from_value).collect())
        .unwrap_or_default();

    Person {
        id,
        name,
        born: text_field(raw, &["born"]),
        died: text_field(raw, &["died"]),
        photo: photo_of(raw),
        card_meta: card_meta(raw),
        place: place_of(raw),
        position: coordinates(raw),
        events,
    }
}

pub fn photo_of(raw: &Value) -> String {
    text_field(raw, PHOTO_FIELDS).unwrap_or_else(|| PLACEHOLDER_AVATAR.to_string())
}

fn relationship_from_value(raw: &Value) -> Option<Relationship> {
    Some(Relationship {
        parent_id: text_field(raw, PARENT_FIELDS)?,
        child_id: text_field(raw, CHILD_FIELDS)?,
    })
}

fn event_from_value(raw: &Value) -> EventRecord {
    let people = raw
        .get("people")
        .and_then(Value::as_array)
        .map(|ids| ids.iter().filter_map(scalar_text).collect())
        .unwrap_or_default();
    let place = raw.get("location").map(parse_place).filter(|p| !p.is_empty());

    EventRecord {
        id: text_field(raw, &["id"]),
        kind: text_field(raw, &["type"]).unwrap_or_else(|| "other".to_string()),
        date: text_field(raw, &["date"]).unwrap_or_default(),
        people,
        place,
        place_text: text_field(raw, &["where"]),
        title: text_field(raw, &["title"]),
        meta: text_field(raw, &["meta", "description"]),
        person: text_field(raw, &["person"]),
        photo: text_field(raw, &["photo"]),
    }
}

/// Location of a person: the first populated source in priority order.
pub fn place_of(raw: &Value) -> Place {
    let first_listed = raw
        .get("locations")
        .and_then(Value::as_array)
        .and_then(|list| list.first());
    first_listed
        .into_iter()
        .chain(LOCATION_FIELDS.iter().filter_map(|field| raw.get(*field)))
        .find(|v| is_populated(v))
        .map(parse_place)
        .unwrap_or_default()
}

/// Parses either a "City, Region, Country" string or a structured object.
pub fn parse_place(raw: &Value) -> Place {
    match raw {
        Value::String(s) => {
            let parts: Vec<&str> = s
                .split(',')
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .collect();
            let owned = |s: &str| Some(s.to_string());
            match parts.as_slice() {
                [] => Place::default(),
                [city] => Place {
                    city: owned(city),
                    ..Place::default()
                },
                [city, region] => Place {
                    city: owned(city),
                    region: owned(region),
                    country: None,
                },
                [city, region, rest @ ..] => Place {
                    city: owned(city),
                    region: owned(region),
                    country: Some(rest.join(", ")),
                },
            }
        }
        Value::Object(_) => Place {
            city: text_field(raw, CITY_FIELDS),
            region: text_field(raw, REGION_FIELDS),
            country: text_field(raw, COUNTRY_FIELDS),
        },
        _ => Place::default(),
    }
}

/// First coordinate pair, across all strategies and containers, whose two
/// components are both finite numbers.
pub fn coordinates(raw: &Value) -> Option<DomainPosition> {
    let containers: Vec<&Value> = COORD_CONTAINERS
        .iter()
        .filter_map(|field| raw.get(*field))
        .chain(std::iter::once(raw))
        .filter(|v| v.is_object())
        .collect();

    for strategy in COORD_STRATEGIES {
        for container in &containers {
            let x = container.get(strategy.x).and_then(number);
            let y = container.get(strategy.y).and_then(number);
            if let (Some(x), Some(y)) = (x, y) {
                return Some(match strategy.kind {
                    CoordKind::Percent => DomainPosition::Percent { x, y },
                    CoordKind::Geo => DomainPosition::Geo { lat: y, lng: x },
                });
            }
        }
    }
    None
}

/// Secondary card line: an explicit meta field, or one composed from birth/death.
pub fn card_meta(raw: &Value) -> String {
    if let Some(direct) = text_field(raw, META_FIELDS) {
        return direct;
    }

    let born = text_field(raw, BIRTH_FIELDS).map(|s| leading_year(&s));
    let died = text_field(raw, DEATH_FIELDS).map(|s| leading_year(&s));

    match (born, died) {
        (Some(b), Some(d)) => format!("{b} \u{2013} {d}"),
        (Some(b), None) if BORN_PREFIX_RE.is_match(&b) => b,
        (Some(b), None) => format!("b. {b}"),
        (None, Some(d)) if DIED_PREFIX_RE.is_match(&d) => d,
        (None, Some(d)) => format!("d. {d}"),
        (None, None) => String::new(),
    }
}

fn leading_year(s: &str) -> String {
    LEADING_YEAR_RE
        .captures(s)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .unwrap_or_else(|| s.to_string())
}

fn first_array<'a>(value: &'a Value, paths: &[&[&str]]) -> Option<&'a Vec<Value>> {
    paths.iter().find_map(|path| {
        path.iter()
            .try_fold(value, |cur, key| cur.get(*key))
            .and_then(Value::as_array)
    })
}

fn text_field(raw: &Value, fields: &[&str]) -> Option<String> {
    fields
        .iter()
        .filter_map(|field| raw.get(*field))
        .find_map(scalar_text)
}

fn scalar_text(v: &Value) -> Option<String> {
    match v {
        Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn number(v: &Value) -> Option<f32> {
    let n = match v {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) if !s.trim().is_empty() => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    let n = n as f32;
    n.is_finite().then_some(n)
}

fn is_populated(v: &Value) -> bool {
    match v {
        Value::String(s) => !s.trim().is_empty(),
        Value::Object(map) => !map.is_empty(),
        _ => false,
    }
}
