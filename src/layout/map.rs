use std::cmp::Ordering;
use std::collections::BTreeMap;

use super::cluster::{ClusterParams, cluster_by_point, layout_cluster};
use super::projection::Projector;
use super::types::{ClusterBadge, MapLayout, PinLayout};
use crate::config::MapConfig;
use crate::ir::{Person, UNKNOWN_COUNTRY};

/// Stand-in region for places that name none.
pub const NO_REGION: &str = "\u{2014}";

#[derive(Debug, Clone, PartialEq)]
pub struct CityGroup {
    pub city: String,
    pub person_ids: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RegionGroup {
    pub region: String,
    pub cities: Vec<CityGroup>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CountryGroup {
    pub country: String,
    pub regions: Vec<RegionGroup>,
}

impl CountryGroup {
    pub fn person_ids(&self) -> impl Iterator<Item = &str> {
        self.regions
            .iter()
            .flat_map(|r| r.cities.iter())
            .flat_map(|c| c.person_ids.iter().map(String::as_str))
    }
}

fn is_placeholder(name: &str) -> bool {
    name == UNKNOWN_COUNTRY || name == NO_REGION || name.starts_with("Unknown ")
}

/// Alphabetical, with placeholder names after every real one.
fn place_order(a: &str, b: &str) -> Ordering {
    is_placeholder(a)
        .cmp(&is_placeholder(b))
        .then_with(|| a.cmp(b))
}

/// Country -> region -> city accordion over everyone in `people`.
pub fn group_by_place<'a, I>(people: I) -> Vec<CountryGroup>
where
    I: IntoIterator<Item = &'a Person>,
{
    let mut tree: BTreeMap<String, BTreeMap<String, BTreeMap<String, Vec<String>>>> = BTreeMap::new();
    for person in people {
        let key = person.place.key();
        let region = if key.region.is_empty() {
            NO_REGION.to_string()
        } else {
            key.region
        };
        tree.entry(key.country)
            .or_default()
            .entry(region)
            .or_default()
            .entry(key.city)
            .or_default()
            .push(person.id.clone());
    }

    let mut countries: Vec<CountryGroup> = tree
        .into_iter()
        .map(|(country, regions)| {
            let mut regions: Vec<RegionGroup> = regions
                .into_iter()
                .map(|(region, cities)| {
                    let mut cities: Vec<CityGroup> = cities
                        .into_iter()
                        .map(|(city, person_ids)| CityGroup { city, person_ids })
                        .collect();
                    cities.sort_by(|a, b| place_order(&a.city, &b.city));
                    RegionGroup { region, cities }
                })
                .collect();
            regions.sort_by(|a, b| place_order(&a.region, &b.region));
            CountryGroup { country, regions }
        })
        .collect();
    countries.sort_by(|a, b| place_order(&a.country, &b.country));
    countries
}

/// Pins, cluster badges and leader lines for one map surface.
///
/// `natural_size` is the decoded size of the background image; without it
/// the whole container is used as the contain box.
pub fn compute_map_layout<'a, I>(
    people: I,
    width: f32,
    height: f32,
    natural_size: Option<(f32, f32)>,
    config: &MapConfig,
) -> MapLayout
where
    I: IntoIterator<Item = &'a Person>,
{
    let projector = Projector::new(width, height, natural_size, &config.edge_margin);
    let params = ClusterParams::for_width(config, width);

    let mut skipped = Vec::new();
    let mut anchored = Vec::new();
    for person in people {
        match projector.project_person(person) {
            Some(anchor) => anchored.push((anchor, person)),
            None => skipped.push(person.id.clone()),
        }
    }

    let mut pins = Vec::new();
    let mut clusters = Vec::new();
    for (anchor, members) in cluster_by_point(anchored) {
        let keys: Vec<&str> = members.iter().map(|p| p.id.as_str()).collect();
        let placement = layout_cluster(anchor, &keys, projector.contain, &params);

        let cluster = (members.len() > 1).then(|| {
            clusters.push(ClusterBadge {
                anchor,
                center: placement.center,
                count: members.len(),
                orbit_size: placement.orbit_size.unwrap_or(params.pin_size),
                head_photo: members[0].photo.clone(),
                member_ids: keys.iter().map(|k| k.to_string()).collect(),
            });
            clusters.len() - 1
        });

        for (person, display) in members.iter().zip(placement.display.iter()) {
            pins.push(PinLayout {
                person_id: person.id.clone(),
                label: person.name.clone(),
                photo: person.photo.clone(),
                place: person.place.display(),
                anchor,
                display: *display,
                leader: placement.leaders,
                cluster,
            });
        }
    }

    MapLayout {
        width,
        height,
        contain: projector.contain,
        pin_size: params.pin_size,
        dot_radius: config.dot_radius,
        cluster_dot_radius: config.cluster_dot_radius,
        pins,
        clusters,
        skipped,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CountryMap {
    pub group: CountryGroup,
    pub layout: MapLayout,
}

/// One map surface per country, in accordion order.
pub fn compute_country_maps(
    people: &[Person],
    width: f32,
    height: f32,
    natural_size: Option<(f32, f32)>,
    config: &MapConfig,
) -> Vec<CountryMap> {
    group_by_place(people)
        .into_iter()
        .map(|group| {
            let members = group
                .person_ids()
                .filter_map(|id| people.iter().find(|p| p.id == id));
            let layout = compute_map_layout(members, width, height, natural_size, config);
            CountryMap { group, layout }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{DomainPosition, Place};

    fn person(id: &str, city: &str, region: &str, country: &str) -> Person {
        let part = |s: &str| (!s.is_empty()).then(|| s.to_string());
        Person {
            id: id.to_string(),
            name: id.to_string(),
            place: Place {
                city: part(city),
                region: part(region),
                country: part(country),
            },
            ..Person::default()
        }
    }

    #[test]
    fn unknowns_sort_last() {
        let people = vec![
            person("a", "", "", ""),
            person("b", "lyon", "", "france"),
            person("c", "york", "", "england"),
            person("d", "", "", "england"),
            person("e", "leeds", "yorkshire", "england"),
        ];
        let groups = group_by_place(&people);
        let countries: Vec<&str> = groups.iter().map(|g| g.country.as_str()).collect();
        assert_eq!(countries, vec!["England", "France", "Unknown"]);

        let england = &groups[0];
        assert_eq!(england.regions[0].region, "Yorkshire");
        assert_eq!(england.regions[1].region, NO_REGION);
        let cities: Vec<&str> = england.regions[1].cities.iter().map(|c| c.city.as_str()).collect();
        assert_eq!(cities, vec!["York", "Unknown City"]);
    }

    #[test]
    fn people_without_coordinates_are_skipped() {
        let mut ned = person("ned", "", "", "");
        ned.position = Some(DomainPosition::Percent { x: 0.5, y: 0.5 });
        let arya = person("arya", "", "", "");
        let layout = compute_map_layout([&ned, &arya], 800.0, 600.0, None, &MapConfig::default());
        assert_eq!(layout.pins.len(), 1);
        assert_eq!(layout.skipped, vec!["arya".to_string()]);
        assert!(layout.clusters.is_empty());
        assert_eq!(layout.pins[0].display, layout.pins[0].anchor);
    }

    #[test]
    fn shared_point_becomes_one_cluster() {
        let people: Vec<Person> = ["a", "b", "c", "d", "e"]
            .iter()
            .map(|id| {
                let mut p = person(id, "", "", "");
                p.position = Some(DomainPosition::Geo { lat: 10.0, lng: 20.0 });
                p
            })
            .collect();
        let layout = compute_map_layout(&people, 1000.0, 700.0, None, &MapConfig::default());
        assert_eq!(layout.clusters.len(), 1);
        assert_eq!(layout.clusters[0].count, 5);
        assert!(layout.pins.iter().all(|p| p.cluster == Some(0) && p.leader));
        assert!(layout.pins.iter().all(|p| layout.contain.contains(p.display)));
    }

    #[test]
    fn one_surface_per_country() {
        let mut a = person("a", "york", "", "england");
        a.position = Some(DomainPosition::Percent { x: 30.0, y: 30.0 });
        let mut b = person("b", "lyon", "", "france");
        b.position = Some(DomainPosition::Percent { x: 60.0, y: 60.0 });
        let maps = compute_country_maps(&[a, b], 800.0, 600.0, None, &MapConfig::default());
        assert_eq!(maps.len(), 2);
        assert_eq!(maps[0].layout.pins[0].person_id, "a");
        assert_eq!(maps[1].layout.pins[0].person_id, "b");
    }
}
