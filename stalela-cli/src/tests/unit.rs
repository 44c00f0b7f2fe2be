//! Focused unit tests covering CLI configuration and command output.

use super::helpers::{JOHANNESBURG, Workspace};
use super::*;
use crate::bbox::BboxConfig;
use crate::init::{InitConfig, initialise};
use crate::nearby::{NearbyConfig, config_from_layers_for_test, find_nearby};
use camino::{Utf8Path, Utf8PathBuf};
use geo::Coord;
use ortho_config::MergeComposer;
use rstest::rstest;
use serde_json::{Value, json};
use stalela_store::CompanySource;

fn nearby_args(database: &Utf8Path) -> NearbyArgs {
    let (lat, lng) = JOHANNESBURG;
    NearbyArgs {
        database: Some(database.to_path_buf()),
        lat: Some(lat),
        lng: Some(lng),
        radius_km: Some(20.0),
        limit: None,
    }
}

#[rstest]
#[case::database(ARG_DATABASE, ENV_NEARBY_DATABASE)]
#[case::lat(ARG_LAT, ENV_NEARBY_LAT)]
#[case::lng(ARG_LNG, ENV_NEARBY_LNG)]
#[case::radius(ARG_RADIUS_KM, ENV_NEARBY_RADIUS_KM)]
fn nearby_without_required_fields_errors(#[case] field: &'static str, #[case] env_var: &'static str) {
    let mut args = nearby_args(Utf8Path::new("stalela.db"));
    match field {
        ARG_DATABASE => args.database = None,
        ARG_LAT => args.lat = None,
        ARG_LNG => args.lng = None,
        _ => args.radius_km = None,
    }
    let err = NearbyConfig::try_from(args).expect_err("missing field should error");
    match err {
        CliError::MissingArgument {
            field: missing,
            env,
        } => {
            assert_eq!(missing, field);
            assert_eq!(env, env_var);
        }
        other => panic!("expected MissingArgument, found {other:?}"),
    }
}

#[rstest]
fn nearby_config_puts_longitude_on_x() {
    let config = NearbyConfig::try_from(NearbyArgs {
        limit: Some(3),
        ..nearby_args(Utf8Path::new("stalela.db"))
    })
    .expect("config should build");
    assert_eq!(
        config.center,
        Coord {
            x: 28.0473,
            y: -26.2041
        }
    );
    assert_eq!(config.radius_km, 20.0);
    assert_eq!(config.limit, Some(3));
}

#[rstest]
fn merge_layers_honours_precedence() {
    let mut composer = MergeComposer::new();
    composer.push_file(
        json!({
            "database": "from-file.db",
            "radius_km": 5.0,
            "limit": 7,
        }),
        None,
    );
    composer.push_environment(json!({
        "database": "from-env.db",
        "lat": -26.0,
    }));
    composer.push_cli(json!({
        "lat": -26.2041,
        "lng": 28.0473,
    }));

    let config =
        config_from_layers_for_test(composer.layers()).expect("merged config should build");
    assert_eq!(config.database, Utf8PathBuf::from("from-env.db"));
    assert_eq!(config.center.y, -26.2041);
    assert_eq!(config.radius_km, 5.0);
    assert_eq!(config.limit, Some(7));
}

#[rstest]
fn merge_layers_maps_configuration_errors() {
    let mut composer = MergeComposer::new();
    composer.push_cli(json!({ "lat": "north" }));

    let err = config_from_layers_for_test(composer.layers())
        .expect_err("invalid config layer should map to CliError::Configuration");
    match err {
        CliError::Configuration(_) => {}
        other => panic!("expected CliError::Configuration, found {other:?}"),
    }
}

#[rstest]
fn bbox_config_carries_source_and_limit() {
    let config = BboxConfig::try_from(BboxArgs {
        database: Some(Utf8PathBuf::from("stalela.db")),
        min_lat: Some(-26.2),
        max_lat: Some(-26.0),
        min_lng: Some(28.0),
        max_lng: Some(28.1),
        source: Some(CompanySource::Yep),
        limit: Some(25),
    })
    .expect("config should build");
    assert_eq!(config.query.min_lat, -26.2);
    assert_eq!(config.query.max_lng, 28.1);
    assert_eq!(config.query.source, Some(CompanySource::Yep));
    assert_eq!(config.query.limit, Some(25));
}

#[rstest]
fn bbox_requires_every_edge() {
    let err = BboxConfig::try_from(BboxArgs {
        database: Some(Utf8PathBuf::from("stalela.db")),
        min_lat: Some(-26.2),
        max_lat: Some(-26.0),
        min_lng: None,
        max_lng: Some(28.1),
        ..BboxArgs::default()
    })
    .expect_err("missing edge should error");
    match err {
        CliError::MissingArgument { field, env } => {
            assert_eq!(field, ARG_MIN_LNG);
            assert_eq!(env, ENV_BBOX_MIN_LNG);
        }
        other => panic!("expected MissingArgument, found {other:?}"),
    }
}

#[rstest]
fn source_flag_parses_directory_names() {
    let cli = Cli::try_parse_from([
        "stalela",
        "bbox",
        "--database",
        "stalela.db",
        "--min-lat",
        "-26.2",
        "--max-lat=-26.0",
        "--min-lng=28.0",
        "--max-lng=28.1",
        "--source",
        "bizcommunity",
    ])
    .expect("arguments should parse");
    match cli.command {
        Command::Bbox(args) => {
            assert_eq!(args.source, Some(CompanySource::Bizcommunity));
            assert_eq!(args.min_lat, Some(-26.2));
        }
        other => panic!("expected bbox command, found {other:?}"),
    }
}

#[rstest]
fn unknown_sources_are_rejected_by_the_parser() {
    let err = Cli::try_parse_from(["stalela", "bbox", "--source", "yellowpages"])
        .expect_err("unknown source should be rejected");
    assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
}

#[rstest]
fn read_commands_refuse_missing_databases() {
    let workspace = Workspace::new();
    let config = NearbyConfig::try_from(nearby_args(&workspace.database()))
        .expect("config should build");
    let err = find_nearby(&config).expect_err("missing database should error");
    match err {
        CliError::MissingDatabase { path } => assert_eq!(path, workspace.database()),
        other => panic!("expected MissingDatabase, found {other:?}"),
    }
    assert!(
        !workspace.database().exists(),
        "a failed lookup must not create the database"
    );
}

#[rstest]
fn initialise_reports_whether_the_file_was_new() {
    let workspace = Workspace::new();
    let config = InitConfig {
        database: workspace.database(),
    };
    assert!(initialise(&config).expect("first init").created);
    assert!(!initialise(&config).expect("second init").created);
    assert!(workspace.root().join("data").is_dir());
}

#[rstest]
fn nearby_results_are_ranked_with_distances() {
    let workspace = Workspace::new();
    workspace.seed();
    let config = NearbyConfig::try_from(nearby_args(&workspace.database()))
        .expect("config should build");
    let results = find_nearby(&config).expect("search succeeds");
    let ranked: Vec<_> = results
        .iter()
        .map(|r| (r.record.name.as_str(), r.distance_km))
        .collect();
    assert_eq!(
        ranked,
        vec![("Acme Plumbing", 0.0), ("Bolt Electrical", 10.77)]
    );
}

#[rstest]
fn invalid_radius_surfaces_as_proximity_error() {
    let workspace = Workspace::new();
    workspace.seed();
    let config = NearbyConfig::try_from(NearbyArgs {
        radius_km: Some(-1.0),
        ..nearby_args(&workspace.database())
    })
    .expect("config should build");
    match find_nearby(&config).expect_err("negative radius should error") {
        CliError::Proximity(stalela_core::ProximityError::InvalidInput { .. }) => {}
        other => panic!("expected InvalidInput, found {other:?}"),
    }
}

#[rstest]
fn json_output_ends_with_a_newline() {
    let mut buffer = Vec::new();
    write_json(&mut buffer, &json!({ "ok": true })).expect("write json");
    let text = String::from_utf8(buffer).expect("utf-8 output");
    assert!(text.ends_with('\n'));
    let value: Value = serde_json::from_str(&text).expect("valid json");
    assert_eq!(value["ok"], true);
}
