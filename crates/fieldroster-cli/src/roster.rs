//! Roster management handlers: bulk import, export, manual entry, removal,
//! activation.

use std::path::PathBuf;

use clap::{Subcommand, ValueEnum};
use sqlx::PgPool;

use fieldroster_core::{normalize, AppConfig, Priority, DEFAULT_SERVICE_RADIUS_MILES};
use fieldroster_db::NewTechnician;
use fieldroster_import::{
    export_roster, run_import, BatchFailurePolicy, CentroidCache, CoordinateResolver,
    ImportOptions, ParsedRow, UnresolvedCoordinatePolicy,
};

#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum UnresolvedArg {
    /// Skip rows no resolution tier could place
    Drop,
    /// Persist them with (0, 0) and report them
    #[default]
    Keep,
}

impl From<UnresolvedArg> for UnresolvedCoordinatePolicy {
    fn from(arg: UnresolvedArg) -> Self {
        match arg {
            UnresolvedArg::Drop => UnresolvedCoordinatePolicy::Drop,
            UnresolvedArg::Keep => UnresolvedCoordinatePolicy::KeepWithSentinel,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum BatchFailureArg {
    /// Stop the run on the first failed batch
    Abort,
    /// Retry a failed batch row by row
    #[default]
    Isolate,
}

impl From<BatchFailureArg> for BatchFailurePolicy {
    fn from(arg: BatchFailureArg) -> Self {
        match arg {
            BatchFailureArg::Abort => BatchFailurePolicy::AbortAll,
            BatchFailureArg::Isolate => BatchFailurePolicy::IsolatePerRow,
        }
    }
}

/// Fields for manual entry, shared by `add` and `update`.
#[derive(Debug, clap::Args)]
pub struct EntryArgs {
    #[arg(long)]
    pub name: String,
    #[arg(long)]
    pub city: String,
    #[arg(long)]
    pub state: String,
    #[arg(long)]
    pub phone: Option<String>,
    #[arg(long)]
    pub email: Option<String>,
    #[arg(long)]
    pub zip: Option<String>,
    #[arg(long, allow_negative_numbers = true)]
    pub latitude: Option<f64>,
    #[arg(long, allow_negative_numbers = true)]
    pub longitude: Option<f64>,
    #[arg(long)]
    pub radius: Option<f64>,
    /// Repeatable specialty tag
    #[arg(long = "specialty")]
    pub specialties: Vec<String>,
    #[arg(long)]
    pub priority: Option<String>,
    #[arg(long)]
    pub notes: Option<String>,
    /// Mark as newly onboarded
    #[arg(long)]
    pub new: bool,
}

#[derive(Debug, Subcommand)]
pub enum RosterCommands {
    /// Bulk-import technicians from a delimited file
    Import {
        /// CSV or TSV file (delimiter auto-detected)
        file: PathBuf,

        /// Write skipped rows to this file as CSV
        #[arg(long)]
        skipped_out: Option<PathBuf>,

        /// What to do with rows whose coordinates cannot be resolved
        #[arg(long, value_enum, default_value_t)]
        on_unresolved: UnresolvedArg,

        /// What to do when a batch insert fails
        #[arg(long, value_enum, default_value_t)]
        on_batch_failure: BatchFailureArg,

        /// Validate and resolve without writing to the database
        #[arg(long)]
        dry_run: bool,

        /// Mark imported technicians as newly onboarded
        #[arg(long)]
        mark_new: bool,

        /// Recorded as the creator of every imported row
        #[arg(long)]
        created_by: Option<String>,
    },
    /// Export the full roster as CSV
    Export {
        /// Output file
        out: PathBuf,
    },
    /// Add a single technician
    Add {
        #[command(flatten)]
        entry: EntryArgs,
    },
    /// Overwrite a technician's fields
    Update {
        id: i64,
        #[command(flatten)]
        entry: EntryArgs,
    },
    /// Delete technicians by id
    Remove {
        #[arg(required = true)]
        ids: Vec<i64>,
    },
    /// Re-activate a technician
    Activate { id: i64 },
    /// Deactivate a technician without deleting the record
    Deactivate { id: i64 },
}

pub async fn run(pool: &PgPool, config: &AppConfig, command: RosterCommands) -> anyhow::Result<()> {
    match command {
        RosterCommands::Import {
            file,
            skipped_out,
            on_unresolved,
            on_batch_failure,
            dry_run,
            mark_new,
            created_by,
        } => {
            let text = std::fs::read_to_string(&file)?;
            let options = ImportOptions {
                on_unresolved: on_unresolved.into(),
                on_batch_failure: on_batch_failure.into(),
                chunk_size: config.import_batch_size,
                mark_new,
                created_by,
                dry_run,
            };
            let report = run_import(pool, &text, &options).await?;

            if dry_run {
                println!("dry run: nothing written");
            }
            println!(
                "{} row(s) processed: {} imported, {} skipped",
                report.total_rows,
                report.imported,
                report.skipped.len()
            );
            if !report.without_coordinates.is_empty() {
                println!(
                    "{} row(s) saved without coordinates: rows {}",
                    report.without_coordinates.len(),
                    report
                        .without_coordinates
                        .iter()
                        .map(ToString::to_string)
                        .collect::<Vec<_>>()
                        .join(", ")
                );
            }
            for (reason, count) in report.reason_counts() {
                println!("  {count} x {reason}");
            }
            if let Some(path) = skipped_out {
                if report.skipped.is_empty() {
                    println!("no skipped rows to write");
                } else {
                    std::fs::write(&path, report.skipped_export())?;
                    println!("skipped rows written to {}", path.display());
                }
            }
            Ok(())
        }
        RosterCommands::Export { out } => {
            let rows = fieldroster_db::list_all_technicians(pool).await?;
            let technicians: Vec<_> = rows.into_iter().map(Into::into).collect();
            std::fs::write(&out, export_roster(&technicians))?;
            println!("{} technician(s) exported to {}", technicians.len(), out.display());
            Ok(())
        }
        RosterCommands::Add { entry } => {
            let record = resolve_entry(pool, entry).await?;
            let id = fieldroster_db::insert_technician(pool, &record).await?;
            println!("technician {} added with id {id}", record.name);
            Ok(())
        }
        RosterCommands::Update { id, entry } => {
            let record = resolve_entry(pool, entry).await?;
            fieldroster_db::update_technician(pool, id, &record).await?;
            println!("technician {id} updated");
            Ok(())
        }
        RosterCommands::Remove { ids } => {
            let removed = fieldroster_db::delete_technicians(pool, &ids).await?;
            println!("{removed} technician(s) removed");
            Ok(())
        }
        RosterCommands::Activate { id } => set_active(pool, id, true).await,
        RosterCommands::Deactivate { id } => set_active(pool, id, false).await,
    }
}

/// Normalize manual-entry fields and run the coordinate resolution chain,
/// built-in major-city tier included.
async fn resolve_entry(pool: &PgPool, entry: EntryArgs) -> anyhow::Result<NewTechnician> {
    let parsed = ParsedRow {
        row_number: 1,
        name: entry.name,
        phone: entry.phone.as_deref().map(normalize::format_phone),
        phone_digits: entry
            .phone
            .as_deref()
            .map(normalize::strip_phone)
            .filter(|d| d.len() == 10),
        email: entry.email,
        city: normalize::correct_city(&entry.city),
        state: normalize::correct_state(&entry.state),
        zip: entry.zip,
        latitude_raw: entry.latitude.map(|v| v.to_string()).unwrap_or_default(),
        longitude_raw: entry.longitude.map(|v| v.to_string()).unwrap_or_default(),
        service_radius_miles: entry.radius.unwrap_or(DEFAULT_SERVICE_RADIUS_MILES),
        specialties: entry.specialties,
        priority: Priority::parse_or_default(entry.priority.as_deref().unwrap_or("")),
        notes: entry.notes,
    };

    let cache = CentroidCache::load(pool, std::slice::from_ref(&parsed)).await?;
    let resolver = CoordinateResolver::for_manual_entry(&cache);
    let resolved = resolver.resolve(&parsed);
    if !resolved.is_resolved() {
        println!("no coordinates found for this location; saving with (0, 0)");
    }

    Ok(NewTechnician {
        name: parsed.name,
        phone: parsed.phone,
        email: parsed.email,
        city: parsed.city,
        state: parsed.state,
        zip: resolved.zip,
        latitude: resolved.coordinate.latitude,
        longitude: resolved.coordinate.longitude,
        service_radius_miles: parsed.service_radius_miles,
        specialties: parsed.specialties,
        priority: parsed.priority,
        notes: parsed.notes,
        is_new: entry.new,
        created_by: Some("cli".to_string()),
    })
}

async fn set_active(pool: &PgPool, id: i64, active: bool) -> anyhow::Result<()> {
    let rows = fieldroster_db::set_technician_active(pool, id, active).await?;
    if rows == 0 {
        anyhow::bail!("technician {id} not found");
    }
    println!(
        "technician {id} {}",
        if active { "activated" } else { "deactivated" }
    );
    Ok(())
}
