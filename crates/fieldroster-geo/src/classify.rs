//! Search query classification: which geographic granularity did the
//! geocoder actually match?
//!
//! No single geocoder field reliably separates a house number from a whole
//! state, so classification is an ordered sequence of signals ending in a
//! bounding-box-span fallback.

use crate::types::GeocodeMatch;

/// The inferred granularity of a search query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchScope {
    Address,
    Neighborhood,
    Zip,
    City,
    State,
    Unknown,
}

impl std::fmt::Display for SearchScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            SearchScope::Address => "address",
            SearchScope::Neighborhood => "neighborhood",
            SearchScope::Zip => "zip",
            SearchScope::City => "city",
            SearchScope::State => "state",
            SearchScope::Unknown => "unknown",
        };
        write!(f, "{s}")
    }
}

/// Bounding-box span below which a match is treated as a street address.
const ADDRESS_SPAN_DEGREES: f64 = 0.01;

/// Bounding-box span above which a match is treated as a whole state.
const STATE_SPAN_DEGREES: f64 = 2.0;

const CITY_ADDRESS_TYPES: &[&str] = &["city", "town", "village", "municipality"];
const NEIGHBORHOOD_ADDRESS_TYPES: &[&str] = &["neighbourhood", "suburb", "quarter"];
const ADDRESS_FEATURE_TYPES: &[&str] = &["house", "building", "residential", "road"];
const ADDRESS_CLASSES: &[&str] = &["building", "shop", "amenity", "highway"];

/// Classify one geocoding match.
#[must_use]
pub fn classify(m: &GeocodeMatch) -> SearchScope {
    let addresstype = m.addresstype.as_deref().unwrap_or("");
    let class = m.class.as_deref().unwrap_or("");
    let kind = m.kind.as_deref().unwrap_or("");
    let has_city_component = m.address.as_ref().is_some_and(|a| a.has_city_like());

    // A state-typed match that still names a city is the geocoder hedging;
    // trust the city component.
    if addresstype == "state" && !has_city_component {
        return SearchScope::State;
    }
    if CITY_ADDRESS_TYPES.contains(&addresstype) {
        return SearchScope::City;
    }
    if addresstype == "postcode" || (class == "place" && kind == "suburb") {
        return SearchScope::Zip;
    }
    if NEIGHBORHOOD_ADDRESS_TYPES.contains(&addresstype) {
        return SearchScope::Neighborhood;
    }
    if ADDRESS_FEATURE_TYPES.contains(&addresstype)
        || ADDRESS_FEATURE_TYPES.contains(&kind)
        || ADDRESS_CLASSES.contains(&class)
    {
        return SearchScope::Address;
    }

    match m.bounding_span() {
        Some(span) if span < ADDRESS_SPAN_DEGREES => SearchScope::Address,
        Some(span) if span > STATE_SPAN_DEGREES => SearchScope::State,
        Some(_) => SearchScope::City,
        None => SearchScope::Unknown,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::AddressParts;

    fn geocode_match(
        addresstype: Option<&str>,
        class: Option<&str>,
        kind: Option<&str>,
        bbox: Option<[f64; 4]>,
        address: Option<AddressParts>,
    ) -> GeocodeMatch {
        GeocodeMatch {
            lat: "32.78".to_string(),
            lon: "-96.80".to_string(),
            display_name: None,
            class: class.map(String::from),
            kind: kind.map(String::from),
            addresstype: addresstype.map(String::from),
            boundingbox: bbox.map(|b| b.iter().map(ToString::to_string).collect()),
            address,
        }
    }

    #[test]
    fn zip_query_with_postcode_type_classifies_as_zip() {
        // "75201" geocoded to a postcode feature.
        let m = geocode_match(
            Some("postcode"),
            Some("place"),
            Some("postcode"),
            None,
            Some(AddressParts {
                postcode: Some("75201".to_string()),
                ..AddressParts::default()
            }),
        );
        assert_eq!(classify(&m), SearchScope::Zip);
    }

    #[test]
    fn suburb_classed_place_counts_as_zip() {
        let m = geocode_match(None, Some("place"), Some("suburb"), None, None);
        assert_eq!(classify(&m), SearchScope::Zip);
    }

    #[test]
    fn state_query_with_wide_bbox_classifies_as_state() {
        // "Texas": no specific address type, bounding box spanning far more
        // than two degrees.
        let m = geocode_match(
            Some("administrative"),
            Some("boundary"),
            Some("administrative"),
            Some([25.83, 36.5, -106.64, -93.50]),
            None,
        );
        assert_eq!(classify(&m), SearchScope::State);
    }

    #[test]
    fn explicit_state_type_without_city_component_wins() {
        let m = geocode_match(
            Some("state"),
            Some("boundary"),
            Some("administrative"),
            None,
            Some(AddressParts {
                state: Some("Texas".to_string()),
                ..AddressParts::default()
            }),
        );
        assert_eq!(classify(&m), SearchScope::State);
    }

    #[test]
    fn state_type_with_a_city_component_falls_through() {
        let m = geocode_match(
            Some("state"),
            Some("boundary"),
            Some("administrative"),
            Some([32.6, 33.0, -97.0, -96.5]),
            Some(AddressParts {
                city: Some("Dallas".to_string()),
                state: Some("Texas".to_string()),
                ..AddressParts::default()
            }),
        );
        assert_eq!(classify(&m), SearchScope::City);
    }

    #[test]
    fn city_and_town_types_classify_as_city() {
        for t in ["city", "town", "village"] {
            let m = geocode_match(Some(t), Some("boundary"), Some("administrative"), None, None);
            assert_eq!(classify(&m), SearchScope::City, "addresstype {t}");
        }
    }

    #[test]
    fn neighbourhood_types_classify_as_neighborhood() {
        // A place-classed suburb falls to the ZIP rule first, so keep the
        // class out of "place" here to exercise the addresstype rule.
        for t in ["neighbourhood", "suburb", "quarter"] {
            let m = geocode_match(Some(t), Some("boundary"), Some(t), None, None);
            assert_eq!(classify(&m), SearchScope::Neighborhood, "addresstype {t}");
        }
    }

    #[test]
    fn house_and_road_features_classify_as_address() {
        let house = geocode_match(Some("house"), Some("building"), Some("yes"), None, None);
        assert_eq!(classify(&house), SearchScope::Address);

        let road = geocode_match(Some("road"), Some("highway"), Some("residential"), None, None);
        assert_eq!(classify(&road), SearchScope::Address);

        let shop = geocode_match(None, Some("shop"), Some("hardware"), None, None);
        assert_eq!(classify(&shop), SearchScope::Address);
    }

    #[test]
    fn bbox_span_fallback_bands() {
        let tiny = geocode_match(None, None, None, Some([32.780, 32.781, -96.801, -96.800]), None);
        assert_eq!(classify(&tiny), SearchScope::Address);

        let wide = geocode_match(None, None, None, Some([25.0, 36.0, -106.0, -93.0]), None);
        assert_eq!(classify(&wide), SearchScope::State);

        let middling = geocode_match(None, None, None, Some([32.6, 33.0, -97.0, -96.5]), None);
        assert_eq!(classify(&middling), SearchScope::City);
    }

    #[test]
    fn no_signals_at_all_is_unknown() {
        let m = geocode_match(None, None, None, None, None);
        assert_eq!(classify(&m), SearchScope::Unknown);
    }
}
