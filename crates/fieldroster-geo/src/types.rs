//! Wire types for the Nominatim-compatible geocoding endpoint.
//!
//! Nominatim's `jsonv2` format carries latitude/longitude and the bounding
//! box as strings; parsing to numbers happens in accessors so one malformed
//! field degrades to a miss instead of failing the whole response.

use serde::Deserialize;

use fieldroster_core::geo::Coordinate;

/// One geocoding match.
#[derive(Debug, Clone, Deserialize)]
pub struct GeocodeMatch {
    pub lat: String,
    pub lon: String,
    pub display_name: Option<String>,
    /// Feature class, e.g. `place`, `boundary`, `highway`, `building`.
    pub class: Option<String>,
    /// Feature type within the class, e.g. `suburb`, `house`, `postcode`.
    #[serde(rename = "type")]
    pub kind: Option<String>,
    /// Nominatim's own summary of which address component matched, e.g.
    /// `city`, `state`, `postcode`, `road`.
    pub addresstype: Option<String>,
    /// `[south, north, west, east]`, as strings.
    pub boundingbox: Option<Vec<String>>,
    pub address: Option<AddressParts>,
}

/// Address component tags. Only the components the classifier and matcher
/// consult are modeled.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AddressParts {
    pub house_number: Option<String>,
    pub road: Option<String>,
    pub neighbourhood: Option<String>,
    pub suburb: Option<String>,
    pub quarter: Option<String>,
    pub city: Option<String>,
    pub town: Option<String>,
    pub village: Option<String>,
    pub county: Option<String>,
    pub state: Option<String>,
    pub postcode: Option<String>,
}

impl AddressParts {
    /// The most specific city-like component present.
    #[must_use]
    pub fn city_like(&self) -> Option<&str> {
        self.city
            .as_deref()
            .or(self.town.as_deref())
            .or(self.village.as_deref())
            .or(self.suburb.as_deref())
    }

    #[must_use]
    pub fn has_city_like(&self) -> bool {
        self.city_like().is_some()
    }
}

impl GeocodeMatch {
    /// The match's coordinate, or `None` when the strings do not parse.
    #[must_use]
    pub fn coordinate(&self) -> Option<Coordinate> {
        let lat = self.lat.parse::<f64>().ok()?;
        let lng = self.lon.parse::<f64>().ok()?;
        Some(Coordinate::new(lat, lng))
    }

    /// The larger of the bounding box's latitude and longitude spans, in
    /// degrees.
    #[must_use]
    pub fn bounding_span(&self) -> Option<f64> {
        let bbox = self.boundingbox.as_ref()?;
        if bbox.len() != 4 {
            return None;
        }
        let south = bbox[0].parse::<f64>().ok()?;
        let north = bbox[1].parse::<f64>().ok()?;
        let west = bbox[2].parse::<f64>().ok()?;
        let east = bbox[3].parse::<f64>().ok()?;
        Some((north - south).abs().max((east - west).abs()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_jsonv2_match() {
        let json = r#"{
            "lat": "32.7766642",
            "lon": "-96.7968559",
            "display_name": "Dallas, Dallas County, Texas, United States",
            "class": "boundary",
            "type": "administrative",
            "addresstype": "city",
            "boundingbox": ["32.617537", "33.016498", "-96.999347", "-96.555516"],
            "address": {"city": "Dallas", "state": "Texas", "postcode": "75201"}
        }"#;
        let m: GeocodeMatch = serde_json::from_str(json).unwrap();
        let coord = m.coordinate().unwrap();
        assert!((coord.latitude - 32.776_664_2).abs() < 1e-9);
        assert_eq!(m.addresstype.as_deref(), Some("city"));
        assert_eq!(m.address.as_ref().unwrap().city_like(), Some("Dallas"));
        let span = m.bounding_span().unwrap();
        assert!((span - 0.443_831).abs() < 1e-6);
    }

    #[test]
    fn malformed_coordinate_is_a_miss() {
        let m = GeocodeMatch {
            lat: "north-ish".to_string(),
            lon: "-96.79".to_string(),
            display_name: None,
            class: None,
            kind: None,
            addresstype: None,
            boundingbox: None,
            address: None,
        };
        assert!(m.coordinate().is_none());
        assert!(m.bounding_span().is_none());
    }

    #[test]
    fn city_like_prefers_city_over_town_and_suburb() {
        let parts = AddressParts {
            town: Some("Plano".to_string()),
            suburb: Some("Deep Ellum".to_string()),
            ..AddressParts::default()
        };
        assert_eq!(parts.city_like(), Some("Plano"));

        let suburb_only = AddressParts {
            suburb: Some("Deep Ellum".to_string()),
            ..AddressParts::default()
        };
        assert_eq!(suburb_only.city_like(), Some("Deep Ellum"));
    }
}
