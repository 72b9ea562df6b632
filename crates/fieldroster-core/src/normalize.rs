//! City/state spelling correction and phone normalization.
//!
//! Every function here is pure and infallible: a value that cannot be
//! corrected degrades to a cleaned-up pass-through rather than an error, and
//! downstream validation accepts the pass-through form.

/// Common city misspellings seen in uploaded rosters, keyed by lowercase
/// input. Not exhaustive; misses fall back to title-casing.
const CITY_MISSPELLINGS: &[(&str, &str)] = &[
    ("albuqerque", "Albuquerque"),
    ("albuquerqe", "Albuquerque"),
    ("cincinatti", "Cincinnati"),
    ("cincinnatti", "Cincinnati"),
    ("los angelos", "Los Angeles"),
    ("philidelphia", "Philadelphia"),
    ("philladelphia", "Philadelphia"),
    ("pittsburg", "Pittsburgh"),
    ("san fransisco", "San Francisco"),
    ("san fransico", "San Francisco"),
    ("seatle", "Seattle"),
    ("tuscon", "Tucson"),
    ("houstan", "Houston"),
    ("minneapolos", "Minneapolis"),
    ("phenix", "Phoenix"),
];

/// The 50 states plus DC.
const VALID_STATE_CODES: &[&str] = &[
    "AL", "AK", "AZ", "AR", "CA", "CO", "CT", "DE", "DC", "FL", "GA", "HI", "ID", "IL", "IN",
    "IA", "KS", "KY", "LA", "ME", "MD", "MA", "MI", "MN", "MS", "MO", "MT", "NE", "NV", "NH",
    "NJ", "NM", "NY", "NC", "ND", "OH", "OK", "OR", "PA", "RI", "SC", "SD", "TN", "TX", "UT",
    "VT", "VA", "WA", "WV", "WI", "WY",
];

/// Full state names, lowercase, to 2-letter codes.
const STATE_NAMES: &[(&str, &str)] = &[
    ("alabama", "AL"),
    ("alaska", "AK"),
    ("arizona", "AZ"),
    ("arkansas", "AR"),
    ("california", "CA"),
    ("colorado", "CO"),
    ("connecticut", "CT"),
    ("delaware", "DE"),
    ("district of columbia", "DC"),
    ("florida", "FL"),
    ("georgia", "GA"),
    ("hawaii", "HI"),
    ("idaho", "ID"),
    ("illinois", "IL"),
    ("indiana", "IN"),
    ("iowa", "IA"),
    ("kansas", "KS"),
    ("kentucky", "KY"),
    ("louisiana", "LA"),
    ("maine", "ME"),
    ("maryland", "MD"),
    ("massachusetts", "MA"),
    ("michigan", "MI"),
    ("minnesota", "MN"),
    ("mississippi", "MS"),
    ("missouri", "MO"),
    ("montana", "MT"),
    ("nebraska", "NE"),
    ("nevada", "NV"),
    ("new hampshire", "NH"),
    ("new jersey", "NJ"),
    ("new mexico", "NM"),
    ("new york", "NY"),
    ("north carolina", "NC"),
    ("north dakota", "ND"),
    ("ohio", "OH"),
    ("oklahoma", "OK"),
    ("oregon", "OR"),
    ("pennsylvania", "PA"),
    ("rhode island", "RI"),
    ("south carolina", "SC"),
    ("south dakota", "SD"),
    ("tennessee", "TN"),
    ("texas", "TX"),
    ("utah", "UT"),
    ("vermont", "VT"),
    ("virginia", "VA"),
    ("washington", "WA"),
    ("west virginia", "WV"),
    ("wisconsin", "WI"),
    ("wyoming", "WY"),
];

/// Misspellings and legacy abbreviations, lowercase, to 2-letter codes.
const STATE_MISSPELLINGS: &[(&str, &str)] = &[
    ("ariz", "AZ"),
    ("cali", "CA"),
    ("calif", "CA"),
    ("colo", "CO"),
    ("conn", "CT"),
    ("fla", "FL"),
    ("ill", "IL"),
    ("mass", "MA"),
    ("mich", "MI"),
    ("minn", "MN"),
    ("okla", "OK"),
    ("ore", "OR"),
    ("oreg", "OR"),
    ("penn", "PA"),
    ("penna", "PA"),
    ("tenn", "TN"),
    ("tex", "TX"),
    ("wash", "WA"),
    ("wis", "WI"),
    ("wisc", "WI"),
    ("virgina", "VA"),
    ("massachusets", "MA"),
    ("pennsilvania", "PA"),
    ("tennesee", "TN"),
];

/// Title-case every whitespace-separated word: first letter upper, rest
/// lower.
#[must_use]
pub fn title_case(raw: &str) -> String {
    raw.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => {
                    first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase()
                }
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Correct a city name against the misspelling table; on a miss, return the
/// input title-cased. Always returns a usable string.
#[must_use]
pub fn correct_city(raw: &str) -> String {
    let trimmed = raw.trim();
    let lowered = trimmed.to_lowercase();
    for (wrong, right) in CITY_MISSPELLINGS {
        if lowered == *wrong {
            return (*right).to_string();
        }
    }
    title_case(trimmed)
}

/// Normalize a state value to a 2-letter code where possible.
///
/// Tried in order: already a valid code, full state name, misspelling/
/// abbreviation table. An unrecognized value passes through upper-cased;
/// downstream validation treats that as acceptable.
#[must_use]
pub fn correct_state(raw: &str) -> String {
    let upper = raw.trim().to_uppercase();
    if VALID_STATE_CODES.contains(&upper.as_str()) {
        return upper;
    }

    let lowered = raw.trim().to_lowercase();
    for (name, code) in STATE_NAMES {
        if lowered == *name {
            return (*code).to_string();
        }
    }
    for (wrong, code) in STATE_MISSPELLINGS {
        if lowered == *wrong {
            return (*code).to_string();
        }
    }

    upper
}

/// Whether a value is one of the 51 recognized 2-letter codes.
#[must_use]
pub fn is_valid_state_code(code: &str) -> bool {
    VALID_STATE_CODES.contains(&code)
}

/// Strip a phone value to bare digits, dropping a leading US country code
/// when the result is 11 digits starting with `1`.
#[must_use]
pub fn strip_phone(raw: &str) -> String {
    let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
    if digits.len() == 11 && digits.starts_with('1') {
        digits[1..].to_string()
    } else {
        digits
    }
}

/// Format a phone as `(XXX) XXX-XXXX` when it strips to exactly 10 digits;
/// otherwise return the raw input unchanged. Never a partially transformed
/// string.
#[must_use]
pub fn format_phone(raw: &str) -> String {
    let digits = strip_phone(raw);
    if digits.len() == 10 {
        format!("({}) {}-{}", &digits[..3], &digits[3..6], &digits[6..])
    } else {
        raw.to_string()
    }
}
