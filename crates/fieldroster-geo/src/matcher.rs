//! Technician matching: filter and rank active technicians for a classified
//! search area, with a nearest-N fallback when no exact match exists.

use fieldroster_core::geo::{haversine_miles, Coordinate};
use fieldroster_core::{normalize, Technician};

use crate::classify::SearchScope;
use crate::types::GeocodeMatch;

/// Result-set size for fallback (non-exact) matches.
pub const FALLBACK_LIMIT: usize = 10;

/// One ranked result.
#[derive(Debug, Clone)]
pub struct TechnicianMatch {
    pub technician: Technician,
    pub distance_miles: f64,
    /// True when no record satisfied the exact scope filter and this entry
    /// came from the nearest-N fallback.
    pub is_fallback: bool,
}

/// A classified search target: the resolved point plus the address
/// components the per-scope filters compare against.
#[derive(Debug, Clone)]
pub struct SearchArea {
    pub scope: SearchScope,
    pub coordinate: Coordinate,
    pub postcode: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
}

impl SearchArea {
    /// Build from a geocoding match. `None` when the match carries no usable
    /// coordinate.
    #[must_use]
    pub fn from_geocode(scope: SearchScope, m: &GeocodeMatch) -> Option<Self> {
        let coordinate = m.coordinate()?;
        let address = m.address.as_ref();
        Some(Self {
            scope,
            coordinate,
            postcode: address.and_then(|a| a.postcode.clone()),
            city: address.and_then(|a| a.city_like().map(String::from)),
            state: address.and_then(|a| a.state.clone()),
        })
    }
}

/// Rank the given technicians against a search area.
///
/// Ordering is uniform across scopes: newly onboarded technicians first,
/// then ascending distance. Exact scope matches return unflagged and
/// unlimited; when the exact filter yields nothing, or the scope has no
/// containment relation (address, unknown), the nearest [`FALLBACK_LIMIT`]
/// come back flagged. The result is empty only when no active technician
/// exists.
#[must_use]
pub fn match_technicians(area: &SearchArea, technicians: &[Technician]) -> Vec<TechnicianMatch> {
    let mut ranked: Vec<(Technician, f64)> = technicians
        .iter()
        .filter(|t| t.is_active)
        .map(|t| {
            let distance = haversine_miles(area.coordinate, t.coordinate());
            (t.clone(), distance)
        })
        .collect();

    ranked.sort_by(|a, b| {
        b.0.is_new
            .cmp(&a.0.is_new)
            .then_with(|| a.1.total_cmp(&b.1))
    });

    let exact: Vec<TechnicianMatch> = ranked
        .iter()
        .filter(|(t, _)| is_exact_match(area, t))
        .map(|(t, d)| TechnicianMatch {
            technician: t.clone(),
            distance_miles: *d,
            is_fallback: false,
        })
        .collect();

    if !exact.is_empty() {
        return exact;
    }

    ranked
        .into_iter()
        .take(FALLBACK_LIMIT)
        .map(|(t, d)| TechnicianMatch {
            technician: t,
            distance_miles: d,
            is_fallback: true,
        })
        .collect()
}

fn is_exact_match(area: &SearchArea, tech: &Technician) -> bool {
    match area.scope {
        SearchScope::Zip => match (&area.postcode, &tech.zip) {
            (Some(wanted), Some(zip)) => wanted == zip,
            _ => false,
        },
        SearchScope::City | SearchScope::Neighborhood => area
            .city
            .as_deref()
            .is_some_and(|city| tech.city.eq_ignore_ascii_case(city)),
        SearchScope::State => area
            .state
            .as_deref()
            .is_some_and(|state| normalize::correct_state(state) == normalize::correct_state(&tech.state)),
        // A street address has no containment relation to a technician's
        // city/state record.
        SearchScope::Address | SearchScope::Unknown => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use fieldroster_core::Priority;
    use uuid::Uuid;

    fn tech(id: i64, city: &str, state: &str, zip: &str, lat: f64, lng: f64) -> Technician {
        Technician {
            id,
            public_id: Uuid::nil(),
            name: format!("Tech {id}"),
            phone: None,
            email: None,
            city: city.to_string(),
            state: state.to_string(),
            zip: if zip.is_empty() {
                None
            } else {
                Some(zip.to_string())
            },
            latitude: lat,
            longitude: lng,
            service_radius_miles: 25.0,
            specialties: Vec::new(),
            priority: Priority::Normal,
            notes: None,
            is_active: true,
            is_new: false,
            created_by: None,
            created_at: Utc::now(),
        }
    }

    fn area(scope: SearchScope) -> SearchArea {
        SearchArea {
            scope,
            coordinate: Coordinate::new(32.7767, -96.797),
            postcode: Some("75201".to_string()),
            city: Some("Dallas".to_string()),
            state: Some("Texas".to_string()),
        }
    }

    #[test]
    fn zip_scope_filters_on_exact_postal_code() {
        let techs = vec![
            tech(1, "Dallas", "TX", "75201", 32.8, -96.8),
            tech(2, "Dallas", "TX", "75207", 32.8, -96.8),
            tech(3, "Austin", "TX", "", 30.3, -97.7),
        ];
        let results = match_technicians(&area(SearchScope::Zip), &techs);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].technician.id, 1);
        assert!(!results[0].is_fallback);
    }

    #[test]
    fn zip_scope_with_no_exact_match_falls_back_to_nearest() {
        let techs = vec![
            tech(1, "Dallas", "TX", "75207", 32.8, -96.8),
            tech(2, "Austin", "TX", "78701", 30.27, -97.74),
        ];
        let results = match_technicians(&area(SearchScope::Zip), &techs);
        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|r| r.is_fallback));
        // Nearest first.
        assert_eq!(results[0].technician.id, 1);
    }

    #[test]
    fn city_scope_matches_case_insensitively() {
        let techs = vec![
            tech(1, "DALLAS", "TX", "", 32.8, -96.8),
            tech(2, "Fort Worth", "TX", "", 32.76, -97.33),
        ];
        let results = match_technicians(&area(SearchScope::City), &techs);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].technician.id, 1);
    }

    #[test]
    fn state_scope_normalizes_both_sides() {
        // The geocoder says "Texas"; one record carries the code, another
        // the full name.
        let techs = vec![
            tech(1, "Dallas", "TX", "", 32.8, -96.8),
            tech(2, "Houston", "Texas", "", 29.76, -95.37),
            tech(3, "Tulsa", "OK", "", 36.15, -95.99),
        ];
        let results = match_technicians(&area(SearchScope::State), &techs);
        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|r| !r.is_fallback));
        assert!(results.iter().all(|r| r.technician.id != 3));
    }

    #[test]
    fn address_scope_always_returns_nearest_flagged() {
        let techs = vec![
            tech(1, "Dallas", "TX", "75201", 32.8, -96.8),
            tech(2, "Fort Worth", "TX", "76102", 32.76, -97.33),
        ];
        let results = match_technicians(&area(SearchScope::Address), &techs);
        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|r| r.is_fallback));
    }

    #[test]
    fn fallback_is_capped_at_ten() {
        let techs: Vec<Technician> = (0..15)
            .map(|i| {
                let offset = f64::from(i) * 0.1;
                tech(i64::from(i), "Dallas", "TX", "", 32.8 + offset, -96.8)
            })
            .collect();
        let results = match_technicians(&area(SearchScope::Unknown), &techs);
        assert_eq!(results.len(), FALLBACK_LIMIT);
        // Ascending distance.
        for pair in results.windows(2) {
            assert!(pair[0].distance_miles <= pair[1].distance_miles);
        }
    }

    #[test]
    fn newly_onboarded_rank_ahead_within_each_group() {
        let mut far_but_new = tech(1, "Dallas", "TX", "", 33.5, -96.8);
        far_but_new.is_new = true;
        let near_and_old = tech(2, "Dallas", "TX", "", 32.78, -96.80);
        let techs = vec![near_and_old, far_but_new];

        let results = match_technicians(&area(SearchScope::City), &techs);
        assert_eq!(results[0].technician.id, 1);
        assert_eq!(results[1].technician.id, 2);
        assert!(results[0].distance_miles > results[1].distance_miles);
    }

    #[test]
    fn inactive_technicians_are_invisible() {
        let mut inactive = tech(1, "Dallas", "TX", "75201", 32.8, -96.8);
        inactive.is_active = false;
        let results = match_technicians(&area(SearchScope::Zip), &[inactive]);
        assert!(results.is_empty());
    }

    #[test]
    fn never_empty_while_an_active_technician_exists() {
        // No city component on the area at all; exact filter cannot match.
        let bare = SearchArea {
            scope: SearchScope::City,
            coordinate: Coordinate::new(32.7767, -96.797),
            postcode: None,
            city: None,
            state: None,
        };
        let techs = vec![tech(1, "Austin", "TX", "", 30.27, -97.74)];
        let results = match_technicians(&bare, &techs);
        assert_eq!(results.len(), 1);
        assert!(results[0].is_fallback);
    }

    #[test]
    fn search_area_from_geocode_needs_a_coordinate() {
        let m = GeocodeMatch {
            lat: "nope".to_string(),
            lon: "-96.8".to_string(),
            display_name: None,
            class: None,
            kind: None,
            addresstype: None,
            boundingbox: None,
            address: None,
        };
        assert!(SearchArea::from_geocode(SearchScope::City, &m).is_none());
    }
}
