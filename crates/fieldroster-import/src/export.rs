//! Roster export: the fixed 12-column delimited format the importer also
//! accepts, so an exported file re-imports cleanly.

use fieldroster_core::Technician;

pub const EXPORT_HEADER: [&str; 12] = [
    "name",
    "phone",
    "email",
    "city",
    "state",
    "zip",
    "latitude",
    "longitude",
    "service_radius_miles",
    "specialty",
    "priority",
    "notes",
];

/// Render the roster as delimited text. Embedded quotes are doubled and
/// cells containing the delimiter are quoted (csv defaults).
#[must_use]
pub fn export_roster(technicians: &[Technician]) -> String {
    let mut writer = csv::Writer::from_writer(Vec::new());
    let _ = writer.write_record(EXPORT_HEADER);
    for tech in technicians {
        let _ = writer.write_record([
            tech.name.clone(),
            tech.phone.clone().unwrap_or_default(),
            tech.email.clone().unwrap_or_default(),
            tech.city.clone(),
            tech.state.clone(),
            tech.zip.clone().unwrap_or_default(),
            tech.latitude.to_string(),
            tech.longitude.to_string(),
            tech.service_radius_miles.to_string(),
            tech.specialties.join(";"),
            tech.priority.to_string(),
            tech.notes.clone().unwrap_or_default(),
        ]);
    }
    let bytes = writer.into_inner().unwrap_or_default();
    String::from_utf8(bytes).unwrap_or_default()
}
