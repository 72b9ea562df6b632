use super::*;

use clap::error::ErrorKind;

#[test]
fn parses_db_ping_command() {
    let cli = Cli::try_parse_from(["fieldroster", "db", "ping"]).expect("expected valid cli args");

    assert!(matches!(
        cli.command,
        Commands::Db {
            command: DbCommands::Ping
        }
    ));
}

#[test]
fn parses_db_migrate_command() {
    let cli =
        Cli::try_parse_from(["fieldroster", "db", "migrate"]).expect("expected valid cli args");

    assert!(matches!(
        cli.command,
        Commands::Db {
            command: DbCommands::Migrate
        }
    ));
}

#[test]
fn parses_seed_centroids_with_files_and_force() {
    let cli = Cli::try_parse_from([
        "fieldroster",
        "db",
        "seed-centroids",
        "--zip-file",
        "zips.csv",
        "--city-file",
        "cities.csv",
        "--force",
    ])
    .unwrap();

    assert!(matches!(
        cli.command,
        Commands::Db {
            command: DbCommands::SeedCentroids {
                zip_file: Some(_),
                city_file: Some(_),
                force: true
            }
        }
    ));
}

#[test]
fn import_defaults_to_lossless_policies() {
    let cli = Cli::try_parse_from(["fieldroster", "roster", "import", "techs.csv"]).unwrap();

    assert!(matches!(
        cli.command,
        Commands::Roster {
            command: RosterCommands::Import {
                on_unresolved: roster::UnresolvedArg::Keep,
                on_batch_failure: roster::BatchFailureArg::Isolate,
                dry_run: false,
                mark_new: false,
                ..
            }
        }
    ));
}

#[test]
fn import_accepts_policy_overrides() {
    let cli = Cli::try_parse_from([
        "fieldroster",
        "roster",
        "import",
        "techs.csv",
        "--on-unresolved",
        "drop",
        "--on-batch-failure",
        "abort",
        "--dry-run",
        "--skipped-out",
        "skipped.csv",
        "--created-by",
        "ops",
    ])
    .unwrap();

    assert!(matches!(
        cli.command,
        Commands::Roster {
            command: RosterCommands::Import {
                on_unresolved: roster::UnresolvedArg::Drop,
                on_batch_failure: roster::BatchFailureArg::Abort,
                dry_run: true,
                skipped_out: Some(_),
                created_by: Some(_),
                ..
            }
        }
    ));
}

#[test]
fn add_collects_repeated_specialties() {
    let cli = Cli::try_parse_from([
        "fieldroster",
        "roster",
        "add",
        "--name",
        "Jo Rivera",
        "--city",
        "Dallas",
        "--state",
        "TX",
        "--specialty",
        "hvac",
        "--specialty",
        "plumbing",
        "--new",
    ])
    .unwrap();

    match cli.command {
        Commands::Roster {
            command: RosterCommands::Add { entry },
        } => {
            assert_eq!(entry.name, "Jo Rivera");
            assert_eq!(entry.specialties, vec!["hvac", "plumbing"]);
            assert!(entry.new);
            assert!(entry.latitude.is_none());
        }
        other => panic!("unexpected command: {other:?}"),
    }
}

#[test]
fn update_takes_an_id_before_the_entry_fields() {
    let cli = Cli::try_parse_from([
        "fieldroster",
        "roster",
        "update",
        "42",
        "--name",
        "Jo Rivera",
        "--city",
        "Dallas",
        "--state",
        "TX",
        "--latitude",
        "32.78",
        "--longitude",
        "-96.80",
    ])
    .unwrap();

    match cli.command {
        Commands::Roster {
            command: RosterCommands::Update { id, entry },
        } => {
            assert_eq!(id, 42);
            assert_eq!(entry.city, "Dallas");
            assert_eq!(entry.latitude, Some(32.78));
        }
        other => panic!("unexpected command: {other:?}"),
    }
}

#[test]
fn remove_requires_at_least_one_id() {
    let err = Cli::try_parse_from(["fieldroster", "roster", "remove"]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MissingRequiredArgument);

    let cli = Cli::try_parse_from(["fieldroster", "roster", "remove", "3", "7"]).unwrap();
    assert!(matches!(
        cli.command,
        Commands::Roster {
            command: RosterCommands::Remove { ref ids }
        } if ids == &[3, 7]
    ));
}

#[test]
fn search_takes_a_query_and_optional_limit() {
    let cli = Cli::try_parse_from(["fieldroster", "search", "75201"]).unwrap();
    assert!(matches!(
        cli.command,
        Commands::Search { ref query, limit: 10 } if query == "75201"
    ));

    let cli = Cli::try_parse_from(["fieldroster", "search", "Dallas, TX", "--limit", "5"]).unwrap();
    assert!(matches!(
        cli.command,
        Commands::Search { limit: 5, .. }
    ));
}

#[test]
fn missing_subcommand_is_an_error() {
    let err = Cli::try_parse_from(["fieldroster"]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand);
}
