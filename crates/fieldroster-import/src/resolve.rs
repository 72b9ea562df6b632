//! Coordinate resolution chain: an ordered list of resolver tiers tried in
//! sequence until one places the row.
//!
//! Tier order is explicit coordinates, then ZIP centroid, then city/state
//! centroid, then (manual entry only) a built-in major-city table. A tier
//! miss is never an error; the chain falls through and an exhausted chain
//! reports [`ResolutionSource::Unresolved`] so the caller can apply its
//! unresolved-coordinate policy.

use std::collections::{HashMap, HashSet};

use sqlx::PgPool;

use fieldroster_core::geo::{plausible_us_coordinate, Coordinate, UNRESOLVED};

use crate::types::ParsedRow;

/// Small fallback table for manual single-record entry, where no centroid
/// cache has been prefetched. Bulk import never consults it.
const MAJOR_CITIES: &[(&str, &str, f64, f64)] = &[
    ("new york", "NY", 40.7128, -74.0060),
    ("los angeles", "CA", 34.0522, -118.2437),
    ("chicago", "IL", 41.8781, -87.6298),
    ("houston", "TX", 29.7604, -95.3698),
    ("phoenix", "AZ", 33.4484, -112.0740),
    ("philadelphia", "PA", 39.9526, -75.1652),
    ("san antonio", "TX", 29.4241, -98.4936),
    ("san diego", "CA", 32.7157, -117.1611),
    ("dallas", "TX", 32.7767, -96.7970),
    ("austin", "TX", 30.2672, -97.7431),
    ("jacksonville", "FL", 30.3322, -81.6557),
    ("fort worth", "TX", 32.7555, -97.3308),
    ("columbus", "OH", 39.9612, -82.9988),
    ("charlotte", "NC", 35.2271, -80.8431),
    ("indianapolis", "IN", 39.7684, -86.1581),
    ("san francisco", "CA", 37.7749, -122.4194),
    ("seattle", "WA", 47.6062, -122.3321),
    ("denver", "CO", 39.7392, -104.9903),
    ("nashville", "TN", 36.1627, -86.7816),
    ("oklahoma city", "OK", 35.4676, -97.5164),
    ("boston", "MA", 42.3601, -71.0589),
    ("portland", "OR", 45.5152, -122.6784),
    ("las vegas", "NV", 36.1699, -115.1398),
    ("memphis", "TN", 35.1495, -90.0490),
    ("detroit", "MI", 42.3314, -83.0458),
    ("atlanta", "GA", 33.7490, -84.3880),
    ("miami", "FL", 25.7617, -80.1918),
    ("minneapolis", "MN", 44.9778, -93.2650),
];

/// Normalize a raw ZIP to the canonical 5-digit form: keep digits only, take
/// the first five of a ZIP+4, left-zero-pad anything shorter.
#[must_use]
pub fn normalize_zip(raw: &str) -> Option<String> {
    let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
    if digits.is_empty() {
        None
    } else if digits.len() >= 5 {
        Some(digits[..5].to_string())
    } else {
        Some(format!("{digits:0>5}"))
    }
}

/// Which tier placed the row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionSource {
    Explicit,
    ZipCentroid,
    CityCentroid,
    BuiltinCity,
    Unresolved,
}

/// Outcome of a chain run. `zip` is the ZIP to persist: the row's own value
/// normalized, or a canonical ZIP backfilled from the winning centroid when
/// the row arrived without one.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolved {
    pub coordinate: Coordinate,
    pub source: ResolutionSource,
    pub zip: Option<String>,
}

impl Resolved {
    #[must_use]
    pub fn is_resolved(&self) -> bool {
        self.source != ResolutionSource::Unresolved
    }
}

/// Two-tier in-memory centroid cache, prefetched once per import run.
///
/// First result wins on duplicate keys; ties between conflicting centroid
/// rows are deliberately nondeterministic.
#[derive(Debug, Default)]
pub struct CentroidCache {
    zip: HashMap<String, Coordinate>,
    /// Keyed by (lowercased city, state code); value carries the canonical
    /// ZIP when the source dataset has one.
    city: HashMap<(String, String), (Coordinate, Option<String>)>,
}

impl CentroidCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Prefetch every centroid the given rows could need, in chunked batched
    /// reads.
    ///
    /// # Errors
    ///
    /// Returns [`sqlx::Error`] if a lookup query fails.
    pub async fn load(pool: &PgPool, rows: &[ParsedRow]) -> Result<Self, sqlx::Error> {
        let mut zips: HashSet<String> = HashSet::new();
        let mut cities: HashSet<String> = HashSet::new();
        for row in rows {
            if let Some(zip) = row.zip.as_deref().and_then(normalize_zip) {
                zips.insert(zip);
            }
            cities.insert(row.city.to_lowercase());
        }

        let mut cache = Self::new();

        let zips: Vec<String> = zips.into_iter().collect();
        for row in fieldroster_db::fetch_zip_centroids(pool, &zips).await? {
            cache.insert_zip(&row.zip, Coordinate::new(row.latitude, row.longitude));
        }

        let cities: Vec<String> = cities.into_iter().collect();
        for row in fieldroster_db::fetch_city_centroids(pool, &cities).await? {
            cache.insert_city(
                &row.city,
                &row.state,
                Coordinate::new(row.latitude, row.longitude),
                row.zip,
            );
        }

        tracing::debug!(
            zip_hits = cache.zip.len(),
            city_hits = cache.city.len(),
            "centroid cache loaded"
        );
        Ok(cache)
    }

    pub fn insert_zip(&mut self, zip: &str, coordinate: Coordinate) {
        self.zip.entry(zip.to_string()).or_insert(coordinate);
    }

    pub fn insert_city(
        &mut self,
        city: &str,
        state: &str,
        coordinate: Coordinate,
        canonical_zip: Option<String>,
    ) {
        self.city
            .entry((city.to_lowercase(), state.to_string()))
            .or_insert((coordinate, canonical_zip));
    }

    #[must_use]
    pub fn resolve_zip(&self, zip: &str) -> Option<Coordinate> {
        self.zip.get(zip).copied()
    }

    #[must_use]
    pub fn resolve_city(&self, city: &str, state: &str) -> Option<&(Coordinate, Option<String>)> {
        self.city.get(&(city.to_lowercase(), state.to_string()))
    }
}

/// One tier of the chain. Each tier sees the row plus the normalized ZIP and
/// either places it or passes.
trait ResolverTier {
    fn name(&self) -> &'static str;
    fn resolve(&self, row: &ParsedRow, zip: Option<&str>) -> Option<Resolved>;
}

/// Explicit latitude/longitude from the row, accepted only when both parse
/// and the pair passes the continental-US plausibility box.
struct ExplicitTier;

impl ResolverTier for ExplicitTier {
    fn name(&self) -> &'static str {
        "explicit"
    }

    fn resolve(&self, row: &ParsedRow, zip: Option<&str>) -> Option<Resolved> {
        let lat = row.latitude_raw.parse::<f64>().ok()?;
        let lng = row.longitude_raw.parse::<f64>().ok()?;
        if !plausible_us_coordinate(lat, lng) {
            return None;
        }
        Some(Resolved {
            coordinate: Coordinate::new(lat, lng),
            source: ResolutionSource::Explicit,
            zip: zip.map(String::from),
        })
    }
}

struct ZipTier<'a> {
    cache: &'a CentroidCache,
}

impl ResolverTier for ZipTier<'_> {
    fn name(&self) -> &'static str {
        "zip-centroid"
    }

    fn resolve(&self, _row: &ParsedRow, zip: Option<&str>) -> Option<Resolved> {
        let zip = zip?;
        let coordinate = self.cache.resolve_zip(zip)?;
        Some(Resolved {
            coordinate,
            source: ResolutionSource::ZipCentroid,
            zip: Some(zip.to_string()),
        })
    }
}

/// City/state centroid. Backfills a missing ZIP from the centroid's
/// canonical ZIP when the dataset carries one.
struct CityTier<'a> {
    cache: &'a CentroidCache,
}

impl ResolverTier for CityTier<'_> {
    fn name(&self) -> &'static str {
        "city-centroid"
    }

    fn resolve(&self, row: &ParsedRow, zip: Option<&str>) -> Option<Resolved> {
        let (coordinate, canonical_zip) = self.cache.resolve_city(&row.city, &row.state)?;
        Some(Resolved {
            coordinate: *coordinate,
            source: ResolutionSource::CityCentroid,
            zip: zip.map(String::from).or_else(|| canonical_zip.clone()),
        })
    }
}

struct BuiltinCityTier;

impl ResolverTier for BuiltinCityTier {
    fn name(&self) -> &'static str {
        "builtin-city"
    }

    fn resolve(&self, row: &ParsedRow, zip: Option<&str>) -> Option<Resolved> {
        let city = row.city.to_lowercase();
        MAJOR_CITIES
            .iter()
            .find(|(c, s, _, _)| *c == city && *s == row.state)
            .map(|(_, _, lat, lng)| Resolved {
                coordinate: Coordinate::new(*lat, *lng),
                source: ResolutionSource::BuiltinCity,
                zip: zip.map(String::from),
            })
    }
}

/// The assembled chain. Built per run against a prefetched cache.
pub struct CoordinateResolver<'a> {
    tiers: Vec<Box<dyn ResolverTier + 'a>>,
}

impl<'a> CoordinateResolver<'a> {
    /// Chain used by bulk import: explicit, ZIP centroid, city centroid.
    #[must_use]
    pub fn for_import(cache: &'a CentroidCache) -> Self {
        Self {
            tiers: vec![
                Box::new(ExplicitTier),
                Box::new(ZipTier { cache }),
                Box::new(CityTier { cache }),
            ],
        }
    }

    /// Chain used by manual single-record entry: the import chain plus the
    /// built-in major-city table as a last tier.
    #[must_use]
    pub fn for_manual_entry(cache: &'a CentroidCache) -> Self {
        let mut chain = Self::for_import(cache);
        chain.tiers.push(Box::new(BuiltinCityTier));
        chain
    }

    /// Run the chain. Never fails; an exhausted chain returns the sentinel
    /// coordinate with [`ResolutionSource::Unresolved`].
    #[must_use]
    pub fn resolve(&self, row: &ParsedRow) -> Resolved {
        let zip = row.zip.as_deref().and_then(normalize_zip);
        for tier in &self.tiers {
            if let Some(resolved) = tier.resolve(row, zip.as_deref()) {
                tracing::debug!(row = row.row_number, tier = tier.name(), "row placed");
                return resolved;
            }
        }
        tracing::debug!(row = row.row_number, "no tier could place row");
        Resolved {
            coordinate: UNRESOLVED,
            source: ResolutionSource::Unresolved,
            zip,
        }
    }
}
