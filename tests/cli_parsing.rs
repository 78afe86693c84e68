use clap::Parser;
use roost::cli::{Cli, Commands};

#[test]
fn test_parse_list_with_filters() {
    let cli = Cli::try_parse_from([
        "roost",
        "list",
        "--search",
        "loft",
        "--min-price",
        "100000",
        "--filter",
        "available",
        "--page",
        "2",
        "--json",
    ])
    .unwrap();

    assert!(cli.json);
    match cli.command {
        Commands::List(args) => {
            assert_eq!(args.search.as_deref(), Some("loft"));
            assert_eq!(args.min_price, Some(100_000.0));
            assert_eq!(args.filter, "available");
            assert_eq!(args.page, 2);
            assert_eq!(args.limit, None);
            assert!(!args.refresh);
        }
        other => panic!("Wrong command: {other:?}"),
    }
}

#[test]
fn test_parse_list_defaults() {
    let cli = Cli::try_parse_from(["roost", "list"]).unwrap();
    match cli.command {
        Commands::List(args) => {
            assert_eq!(args.filter, "all");
            assert_eq!(args.page, 1);
        }
        other => panic!("Wrong command: {other:?}"),
    }
}

#[test]
fn test_parse_update_flattens_draft() {
    let cli = Cli::try_parse_from([
        "roost", "update", "p-7", "--name", "Casa", "--price", "250000", "--status", "sold",
    ])
    .unwrap();

    match cli.command {
        Commands::Update { id, draft } => {
            assert_eq!(id, "p-7");
            assert_eq!(draft.name, "Casa");
            assert_eq!(draft.status, "sold");
            assert_eq!(draft.category, "house");
        }
        other => panic!("Wrong command: {other:?}"),
    }
}

#[test]
fn test_global_config_flag() {
    let cli = Cli::try_parse_from(["roost", "stats", "--config", "/tmp/roost.yaml"]).unwrap();
    assert_eq!(cli.config.as_deref(), Some(std::path::Path::new("/tmp/roost.yaml")));
    assert!(matches!(cli.command, Commands::Stats { refresh: false }));
}

#[test]
fn test_create_requires_name_and_price() {
    assert!(Cli::try_parse_from(["roost", "create", "--name", "Casa"]).is_err());
}
