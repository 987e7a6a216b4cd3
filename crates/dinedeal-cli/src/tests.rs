use super::*;

#[test]
fn parses_db_ping_command() {
    let cli = Cli::try_parse_from(["dinedeal", "db", "ping"]).expect("expected valid cli args");

    assert!(matches!(
        cli.command,
        Some(Commands::Db {
            command: DbCommands::Ping
        })
    ));
}

#[test]
fn parses_db_migrate_command() {
    let cli = Cli::try_parse_from(["dinedeal", "db", "migrate"]).expect("expected valid cli args");

    assert!(matches!(
        cli.command,
        Some(Commands::Db {
            command: DbCommands::Migrate
        })
    ));
}

#[test]
fn no_command_is_none() {
    let cli = Cli::try_parse_from(["dinedeal"]).expect("expected valid cli args");
    assert!(cli.command.is_none());
}

#[test]
fn scrape_defaults() {
    let cli = Cli::try_parse_from(["dinedeal", "scrape"]).unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::Scrape {
            credentials: None,
            force: false,
            ref place_id,
            dry_run: false,
        }) if place_id.is_empty()
    ));
}

#[test]
fn scrape_accepts_repeated_place_ids() {
    let cli = Cli::try_parse_from([
        "dinedeal",
        "scrape",
        "--place-id",
        "hard-rock-cafe",
        "--place-id",
        "ohris",
    ])
    .unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::Scrape { ref place_id, .. })
            if place_id == &["hard-rock-cafe".to_string(), "ohris".to_string()]
    ));
}

#[test]
fn scrape_all_flags_together() {
    let cli = Cli::try_parse_from([
        "dinedeal",
        "scrape",
        "--credentials",
        "/etc/dinedeal/creds.env",
        "--force",
        "--dry-run",
    ])
    .unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::Scrape {
            credentials: Some(ref path),
            force: true,
            dry_run: true,
            ..
        }) if path == &PathBuf::from("/etc/dinedeal/creds.env")
    ));
}

#[test]
fn check_without_pairs_uses_defaults() {
    let cli = Cli::try_parse_from(["dinedeal", "check"]).unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::Check { ref pair }) if pair.is_empty()
    ));
}

#[test]
fn check_collects_pairs() {
    let cli = Cli::try_parse_from([
        "dinedeal",
        "check",
        "--pair",
        "zomato=https://www.zomato.com/hyderabad/cafe",
    ])
    .unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::Check { ref pair }) if pair.len() == 1
    ));
}

#[test]
fn scrape_place_id_requires_value() {
    assert!(Cli::try_parse_from(["dinedeal", "scrape", "--place-id"]).is_err());
}

#[test]
fn unknown_subcommand_is_rejected() {
    assert!(Cli::try_parse_from(["dinedeal", "collect"]).is_err());
}
