//! Bulk-copy and insert-transform statements
//!
//! Copy statements take the configured locations and role verbatim. Insert
//! statements pair a target table's insertable columns with a fixed SELECT
//! over the staging tables.

use starschema_core::{S3Config, Table};
use crate::tables;

/// Load the event log using the configured JSONPath file
pub fn staging_events_copy(s3: &S3Config, role_arn: &str) -> String {
    format!(
        "copy {table}\nfrom {source}\niam_role {role}\ncompupdate off\nregion '{region}'\njson {jsonpath}",
        table = tables::staging_events().qualified_name(),
        source = s3.log_data,
        role = role_arn,
        region = s3.region,
        jsonpath = s3.log_jsonpath,
    )
}

/// Load song metadata, mapping JSON keys to columns by name
pub fn staging_songs_copy(s3: &S3Config, role_arn: &str) -> String {
    format!(
        "copy {table}\nfrom {source}\niam_role {role}\ncompupdate off\nregion '{region}'\nformat as json 'auto'",
        table = tables::staging_songs().qualified_name(),
        source = s3.song_data,
        role = role_arn,
        region = s3.region,
    )
}

/// Plays are `NextSong` events matched to a song on title, artist name and
/// duration. The match is exact, so formatting or float differences between
/// the two sources drop the play.
const SONGPLAY_SELECT: &str = r#"SELECT DISTINCT TIMESTAMP 'epoch' + se.ts / 1000 * INTERVAL '1 second' AS start_time,
    se.userid, se.level, ss.song_id, ss.artist_id, se.sessionid, se.location, se.useragent
FROM staging_tables.staging_events se, staging_tables.staging_songs ss
WHERE se.page = 'NextSong'
    AND se.song = ss.title
    AND se.artist = ss.artist_name
    AND se.length = ss.duration"#;

const USER_SELECT: &str = r#"SELECT DISTINCT userid, firstname, lastname, gender, level
FROM staging_tables.staging_events
WHERE userid IS NOT NULL
    AND page = 'NextSong'"#;

const SONG_SELECT: &str = r#"SELECT DISTINCT song_id, title, artist_id, year, duration
FROM staging_tables.staging_songs
WHERE artist_id IS NOT NULL"#;

const ARTIST_SELECT: &str = r#"SELECT DISTINCT artist_id, artist_name, artist_location, artist_latitude, artist_longitude
FROM staging_tables.staging_songs
WHERE artist_id IS NOT NULL"#;

const TIME_SELECT: &str = r#"SELECT start_time,
    EXTRACT(HOUR FROM start_time), EXTRACT(DAY FROM start_time),
    EXTRACT(WEEK FROM start_time), EXTRACT(MONTH FROM start_time),
    EXTRACT(YEAR FROM start_time), EXTRACT(WEEKDAY FROM start_time)
FROM (
    SELECT DISTINCT TIMESTAMP 'epoch' + ts / 1000 * INTERVAL '1 second' AS start_time
    FROM staging_tables.staging_events
) AS events"#;

fn insert_from(table: &Table, select: &str) -> String {
    format!(
        "INSERT INTO {} ({})\n{}",
        table.qualified_name(),
        table.insertable_columns().join(", "),
        select
    )
}

pub fn songplay_insert() -> String {
    insert_from(&tables::songplays(), SONGPLAY_SELECT)
}

pub fn user_insert() -> String {
    insert_from(&tables::users(), USER_SELECT)
}

pub fn song_insert() -> String {
    insert_from(&tables::songs(), SONG_SELECT)
}

pub fn artist_insert() -> String {
    insert_from(&tables::artists(), ARTIST_SELECT)
}

pub fn time_insert() -> String {
    insert_from(&tables::time(), TIME_SELECT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn s3() -> S3Config {
        S3Config {
            log_data: "'s3://bucket/log_data'".to_string(),
            log_jsonpath: "'s3://bucket/log_json_path.json'".to_string(),
            song_data: "'s3://bucket/song_data'".to_string(),
            region: "eu-central-1".to_string(),
        }
    }

    #[test]
    fn events_copy_text() {
        assert_eq!(
            staging_events_copy(&s3(), "'arn:aws:iam::1:role/r'"),
            "copy staging_tables.staging_events\n\
             from 's3://bucket/log_data'\n\
             iam_role 'arn:aws:iam::1:role/r'\n\
             compupdate off\n\
             region 'eu-central-1'\n\
             json 's3://bucket/log_json_path.json'"
        );
    }

    #[test]
    fn songs_copy_uses_auto_mapping() {
        let sql = staging_songs_copy(&s3(), "arn");
        assert!(sql.starts_with("copy staging_tables.staging_songs\n"));
        assert!(sql.contains("from 's3://bucket/song_data'"));
        assert!(sql.ends_with("format as json 'auto'"));
    }

    #[test]
    fn insert_header_lists_target_columns() {
        assert!(user_insert().starts_with(
            "INSERT INTO dimension_tables.users (user_id, first_name, last_name, gender, level)\n"
        ));
        assert!(songplay_insert().starts_with(
            "INSERT INTO fact_tables.songplays (start_time, user_id, level, song_id, artist_id, session_id, location, user_agent)\n"
        ));
    }

    #[test]
    fn dimension_inserts_exclude_null_ids() {
        assert!(user_insert().contains("userid IS NOT NULL"));
        assert!(song_insert().contains("artist_id IS NOT NULL"));
        assert!(artist_insert().contains("artist_id IS NOT NULL"));
    }

    #[test]
    fn time_insert_derives_units() {
        let sql = time_insert();
        for unit in ["HOUR", "DAY", "WEEK", "MONTH", "YEAR", "WEEKDAY"] {
            assert!(sql.contains(&format!("EXTRACT({} FROM start_time)", unit)), "missing {}", unit);
        }
    }
}
