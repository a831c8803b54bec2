//! Canonical in-memory shape of a family snapshot.
//!
//! Everything downstream of [`crate::adapter`] works on these types only; the
//! tolerant field-name handling lives in the adapter.

use serde::Serialize;

/// Where a person or event sits in the source data's coordinate space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum DomainPosition {
    /// x/y pair in `[0, 1]` or `[0, 100]` percentage space.
    Percent { x: f32, y: f32 },
    /// Geographic latitude/longitude in degrees.
    Geo { lat: f32, lng: f32 },
}

/// Raw location parts exactly as they appeared in the source.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Place {
    pub city: Option<String>,
    pub region: Option<String>,
    pub country: Option<String>,
}

/// Grouping key for the geographic accordion: title-cased with defaults filled in.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct PlaceKey {
    pub country: String,
    pub region: String,
    pub city: String,
}

pub const UNKNOWN_CITY: &str = "Unknown City";
pub const UNKNOWN_COUNTRY: &str = "Unknown";

impl Place {
    pub fn is_empty(&self) -> bool {
        self.city.is_none() && self.region.is_none() && self.country.is_none()
    }

    /// "City, Region, Country" with the missing parts skipped.
    pub fn display(&self) -> String {
        [&self.city, &self.region, &self.country]
            .into_iter()
            .flatten()
            .map(|s| s.as_str())
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(", ")
    }

    pub fn key(&self) -> PlaceKey {
        let mut region = self.region.clone().unwrap_or_default();
        let mut country = self.country.clone().unwrap_or_default();
        // Region-only settings ("Winterfell, The North") carry no country.
        if country.trim().is_empty() && !region.trim().is_empty() {
            country = std::mem::take(&mut region);
        }
        let city = title_case(self.city.as_deref().unwrap_or_default());
        let country = title_case(&country);
        PlaceKey {
            country: if country.is_empty() {
                UNKNOWN_COUNTRY.to_string()
            } else {
                country
            },
            region: title_case(&region),
            city: if city.is_empty() {
                UNKNOWN_CITY.to_string()
            } else {
                city
            },
        }
    }
}

fn title_case(raw: &str) -> String {
    let lower = raw.trim().to_lowercase();
    let mut out = String::with_capacity(lower.len());
    let mut at_word_start = true;
    for ch in lower.chars() {
        let is_word = ch.is_alphanumeric() || ch == '_';
        if is_word && at_word_start {
            out.extend(ch.to_uppercase());
        } else {
            out.push(ch);
        }
        at_word_start = !is_word;
    }
    out
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EventRecord {
    pub id: Option<String>,
    pub kind: String,
    pub date: String,
    pub people: Vec<String>,
    pub place: Option<Place>,
    /// Free-text place that overrides `place` when present.
    pub place_text: Option<String>,
    pub title: Option<String>,
    pub meta: Option<String>,
    pub person: Option<String>,
    pub photo: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Person {
    pub id: String,
    pub name: String,
    pub born: Option<String>,
    pub died: Option<String>,
    pub photo: String,
    /// Secondary line shown on tree cards ("1950 – 2010", "b. 1980", ...).
    pub card_meta: String,
    pub place: Place,
    pub position: Option<DomainPosition>,
    pub events: Vec<EventRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Relationship {
    pub parent_id: String,
    pub child_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Tree {
    pub people: Vec<Person>,
    pub relationships: Vec<Relationship>,
    pub events: Vec<EventRecord>,
}

impl Tree {
    pub fn person(&self, id: &str) -> Option<&Person> {
        self.people.iter().find(|p| p.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn region_only_place_promotes_region_to_country() {
        let place = Place {
            city: Some("winterfell".into()),
            region: Some("the north".into()),
            country: None,
        };
        let key = place.key();
        assert_eq!(key.city, "Winterfell");
        assert_eq!(key.region, "");
        assert_eq!(key.country, "The North");
    }

    #[test]
    fn empty_place_uses_defaults() {
        let key = Place::default().key();
        assert_eq!(key.city, UNKNOWN_CITY);
        assert_eq!(key.country, UNKNOWN_COUNTRY);
    }

    #[test]
    fn display_skips_missing_parts() {
        let place = Place {
            city: Some("Toronto".into()),
            region: None,
            country: Some("Canada".into()),
        };
        assert_eq!(place.display(), "Toronto, Canada");
    }
}
