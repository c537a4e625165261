//! Integration tests for the query catalog

use starschema_core::{ConfigError, DwhConfig, StatementKind};
use starschema_sql::{LintDialect, LintOutcome, QueryCatalog, StatementLinter};

const CONFIG: &str = "
[IAM_ROLE]
ARN = arn:aws:iam::acct:role/x

[S3]
LOG_DATA = s3://b/log
LOG_JSONPATH = s3://b/jsonpath.json
SONG_DATA = s3://b/song
";

/// A `dwh.cfg` as written for the Python toolchain: single-quoted
/// literals and a `[CLUSTER]` section with a bare port.
const CLASSIC_CONFIG: &str = "[CLUSTER]
HOST=dwhcluster.example.us-west-2.redshift.amazonaws.com
DB_NAME=dwh
DB_USER=dwhuser
DB_PASSWORD=Passw0rd
DB_PORT=5439

[IAM_ROLE]
ARN='arn:aws:iam::1:role/x'

[S3]
LOG_DATA='s3://udacity-dend/log_data'
LOG_JSONPATH='s3://udacity-dend/log_json_path.json'
SONG_DATA='s3://udacity-dend/song_data'
";

fn catalog() -> QueryCatalog {
    QueryCatalog::new(&DwhConfig::from_ini(CONFIG).unwrap())
}

#[test]
fn every_required_key_is_enforced() {
    let required = [
        ("IAM_ROLE", "ARN", "ARN = arn:aws:iam::acct:role/x"),
        ("S3", "LOG_DATA", "LOG_DATA = s3://b/log"),
        ("S3", "LOG_JSONPATH", "LOG_JSONPATH = s3://b/jsonpath.json"),
        ("S3", "SONG_DATA", "SONG_DATA = s3://b/song"),
    ];

    for (section, key, line) in required {
        let ini = CONFIG.replace(line, "");
        match DwhConfig::from_ini(&ini) {
            Err(ConfigError::MissingKey { section: s, key: k }) => {
                assert_eq!((s, k), (section, key));
            }
            other => panic!("expected missing {}.{}, got {:?}", section, key, other),
        }
    }
}

#[test]
fn missing_key_in_file_fails_catalog_load() {
    let dir = std::env::temp_dir().join(format!("starschema-test-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("dwh.cfg");
    std::fs::write(&path, CONFIG.replace("SONG_DATA = s3://b/song", "")).unwrap();

    let result = QueryCatalog::from_file(&path);
    assert!(matches!(
        result,
        Err(ConfigError::MissingKey { section: "S3", key: "SONG_DATA" })
    ));

    std::fs::write(&path, CONFIG).unwrap();
    let catalog = QueryCatalog::from_file(&path).unwrap();
    assert_eq!(catalog.copy().len(), 2);

    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn first_copy_loads_event_log() {
    let catalog = catalog();
    let first = &catalog.copy()[0];

    assert!(first.contains("from s3://b/log"));
    assert!(first.contains("iam_role arn:aws:iam::acct:role/x"));
    assert!(first.contains("json s3://b/jsonpath.json"));
}

#[test]
fn copy_values_are_substituted_verbatim() {
    let config = DwhConfig::new(
        "'arn:aws:iam::123:role/dwh\"quoted\"'",
        "'s3://bucket/log data'",
        "'s3://bucket/path.json'",
        "'s3://bucket/song_data'",
    );
    let catalog = QueryCatalog::new(&config);

    assert!(catalog.copy()[0].contains("from 's3://bucket/log data'"));
    assert!(catalog.copy()[0].contains("iam_role 'arn:aws:iam::123:role/dwh\"quoted\"'"));
    assert!(catalog.copy()[1].contains("from 's3://bucket/song_data'"));
    assert!(catalog.copy()[1].contains("iam_role 'arn:aws:iam::123:role/dwh\"quoted\"'"));
}

#[test]
fn classic_config_file_keeps_quoted_literals() {
    let dir = std::env::temp_dir().join(format!("starschema-classic-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("dwh.cfg");
    std::fs::write(&path, CLASSIC_CONFIG).unwrap();

    let catalog = QueryCatalog::from_file(&path).unwrap();
    let events = &catalog.copy()[0];
    let songs = &catalog.copy()[1];

    assert!(events.contains("from 's3://udacity-dend/log_data'"), "{}", events);
    assert!(events.contains("iam_role 'arn:aws:iam::1:role/x'"), "{}", events);
    assert!(events.contains("json 's3://udacity-dend/log_json_path.json'"), "{}", events);
    assert!(songs.contains("from 's3://udacity-dend/song_data'"), "{}", songs);

    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn unquoted_arn_is_accepted() {
    let ini = CLASSIC_CONFIG.replace("ARN='arn:aws:iam::1:role/x'", "ARN=arn:aws:iam::1:role/x");
    let config = DwhConfig::from_ini(&ini).unwrap();
    assert_eq!(config.role_arn, "arn:aws:iam::1:role/x");
    assert_eq!(config.require_cluster().unwrap().db_port, 5439);
}

#[test]
fn drops_are_idempotent() {
    let catalog = catalog();
    for sql in catalog.drop_schemas().iter().chain(catalog.drop_tables()) {
        assert!(sql.starts_with("DROP "), "{}", sql);
        assert!(sql.contains("IF EXISTS"), "{}", sql);
    }
}

#[test]
fn creates_are_idempotent() {
    let catalog = catalog();
    for sql in catalog.create_schemas().iter().chain(catalog.create_tables()) {
        assert!(sql.starts_with("CREATE "), "{}", sql);
        assert!(sql.contains("IF NOT EXISTS"), "{}", sql);
    }
}

#[test]
fn fact_insert_filters_and_joins() {
    let catalog = catalog();
    let fact = &catalog.insert()[0];

    assert!(fact.starts_with("INSERT INTO fact_tables.songplays"));
    assert!(fact.contains("se.page = 'NextSong'"));
    assert!(fact.contains("se.song = ss.title"));
    assert!(fact.contains("se.artist = ss.artist_name"));
    assert!(fact.contains("se.length = ss.duration"));
}

#[test]
fn inserts_target_every_final_table() {
    let catalog = catalog();
    let targets: Vec<&str> = catalog
        .insert()
        .iter()
        .map(|sql| sql.split_whitespace().nth(2).unwrap())
        .collect();

    assert_eq!(
        targets,
        vec![
            "fact_tables.songplays",
            "dimension_tables.users",
            "dimension_tables.songs",
            "dimension_tables.artists",
            "dimension_tables.time",
        ]
    );
}

#[test]
fn region_is_configurable() {
    let ini = CONFIG.replace("[S3]", "[S3]\nREGION = eu-west-1");
    let catalog = QueryCatalog::new(&DwhConfig::from_ini(&ini).unwrap());

    assert!(catalog.copy().iter().all(|sql| sql.contains("region 'eu-west-1'")));
}

#[test]
fn lint_covers_whole_catalog() {
    let catalog = catalog();

    for dialect in [LintDialect::Redshift, LintDialect::Postgres, LintDialect::Generic] {
        let report = StatementLinter::from_dialect(dialect).lint(&catalog);

        assert_eq!(report.findings.len(), catalog.len());
        assert!(!report.has_failures(), "{:?}: {:?}", dialect, report.failures().collect::<Vec<_>>());

        for finding in report.findings.iter().filter(|f| f.kind == StatementKind::Copy) {
            assert!(matches!(finding.outcome, LintOutcome::Skipped { .. }));
        }

        for finding in report
            .findings
            .iter()
            .filter(|f| matches!(f.kind, StatementKind::DropSchemas | StatementKind::DropTables))
        {
            assert_eq!(finding.outcome, LintOutcome::Ok, "{}", finding);
        }
    }
}

#[test]
fn time_insert_lints_per_dialect() {
    let catalog = catalog();
    let time = &catalog.insert()[4];

    let redshift = StatementLinter::new().lint_statement(StatementKind::Insert, 4, time);
    assert!(matches!(redshift.outcome, LintOutcome::Skipped { .. }), "{}", redshift);

    let postgres = StatementLinter::from_dialect(LintDialect::Postgres).lint_statement(StatementKind::Insert, 4, time);
    assert_eq!(postgres.outcome, LintOutcome::Ok, "{}", postgres);
}
