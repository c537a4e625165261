//! Warehouse table definitions
//!
//! Two staging tables receive the raw event log and song metadata, one fact
//! table records song plays, and four dimension tables describe users,
//! songs, artists and time.

use starschema_core::{Column, ColumnType, SchemaKind, Table};

const VARCHAR_255: ColumnType = ColumnType::varchar(255);

/// Raw event log (one row per log line)
pub fn staging_events() -> Table {
    Table::new(
        SchemaKind::Staging,
        "staging_events",
        vec![
            Column::new("event_key", ColumnType::Int).identity(),
            Column::new("artist", VARCHAR_255),
            Column::new("auth", VARCHAR_255),
            Column::new("firstName", VARCHAR_255),
            Column::new("gender", VARCHAR_255),
            Column::new("itemInSession", ColumnType::Int),
            Column::new("lastName", VARCHAR_255),
            Column::new("length", ColumnType::Float),
            Column::new("level", VARCHAR_255),
            Column::new("location", VARCHAR_255),
            Column::new("method", VARCHAR_255),
            Column::new("page", VARCHAR_255),
            Column::new("registration", ColumnType::Float),
            Column::new("sessionId", ColumnType::Int),
            Column::new("song", VARCHAR_255),
            Column::new("status", ColumnType::Int),
            Column::new("ts", ColumnType::BigInt),
            Column::new("userAgent", VARCHAR_255),
            Column::new("userId", ColumnType::Int),
        ],
    )
}

/// Raw song metadata (one row per song file)
pub fn staging_songs() -> Table {
    Table::new(
        SchemaKind::Staging,
        "staging_songs",
        vec![
            Column::new("song_key", ColumnType::Int).identity(),
            Column::new("num_songs", ColumnType::Int),
            Column::new("artist_id", VARCHAR_255),
            Column::new("artist_latitude", ColumnType::Numeric),
            Column::new("artist_longitude", ColumnType::Numeric),
            Column::new("artist_location", VARCHAR_255),
            Column::new("artist_name", VARCHAR_255),
            Column::new("song_id", VARCHAR_255),
            Column::new("title", VARCHAR_255),
            Column::new("duration", ColumnType::Numeric),
            Column::new("year", ColumnType::Int),
        ],
    )
}

/// Fact table, distributed on `song_id`
pub fn songplays() -> Table {
    Table::new(
        SchemaKind::Fact,
        "songplays",
        vec![
            Column::new("songplay_id", ColumnType::Int).identity().primary_key(),
            Column::new("start_time", ColumnType::Timestamp).not_null(),
            Column::new("user_id", ColumnType::Int).not_null(),
            Column::new("level", ColumnType::Varchar { length: None }),
            Column::new("song_id", VARCHAR_255).dist_key(),
            Column::new("artist_id", VARCHAR_255),
            Column::new("session_id", ColumnType::Int),
            Column::new("location", VARCHAR_255),
            Column::new("user_agent", VARCHAR_255),
        ],
    )
}

pub fn users() -> Table {
    Table::new(
        SchemaKind::Dimension,
        "users",
        vec![
            Column::new("user_id", ColumnType::Int).primary_key(),
            Column::new("first_name", VARCHAR_255),
            Column::new("last_name", VARCHAR_255),
            Column::new("gender", ColumnType::varchar(10)),
            Column::new("level", VARCHAR_255),
        ],
    )
}

pub fn songs() -> Table {
    Table::new(
        SchemaKind::Dimension,
        "songs",
        vec![
            Column::new("song_id", VARCHAR_255).primary_key(),
            Column::new("title", VARCHAR_255),
            Column::new("artist_id", VARCHAR_255),
            Column::new("year", ColumnType::Int),
            Column::new("duration", ColumnType::Float),
        ],
    )
}

pub fn artists() -> Table {
    Table::new(
        SchemaKind::Dimension,
        "artists",
        vec![
            Column::new("artist_id", VARCHAR_255).primary_key(),
            Column::new("name", VARCHAR_255),
            Column::new("location", VARCHAR_255),
            Column::new("latitude", ColumnType::Float),
            Column::new("longitude", ColumnType::Float),
        ],
    )
}

/// Play timestamps broken down into calendar units
pub fn time() -> Table {
    Table::new(
        SchemaKind::Dimension,
        "time",
        vec![
            Column::new("start_time", ColumnType::Timestamp).not_null().primary_key(),
            Column::new("hour", ColumnType::Int),
            Column::new("day", ColumnType::Int),
            Column::new("week", ColumnType::Int),
            Column::new("month", ColumnType::varchar(20)),
            Column::new("year", ColumnType::Int),
            Column::new("weekday", ColumnType::varchar(20)),
        ],
    )
}

/// Every table, in the order it is dropped and created
pub fn all_tables() -> Vec<Table> {
    vec![
        staging_events(),
        staging_songs(),
        songplays(),
        users(),
        songs(),
        artists(),
        time(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use starschema_core::SchemaKind;

    #[test]
    fn table_order() {
        let names: Vec<String> = all_tables().iter().map(|t| t.qualified_name()).collect();
        assert_eq!(
            names,
            vec![
                "staging_tables.staging_events",
                "staging_tables.staging_songs",
                "fact_tables.songplays",
                "dimension_tables.users",
                "dimension_tables.songs",
                "dimension_tables.artists",
                "dimension_tables.time",
            ]
        );
    }

    #[test]
    fn dimensions_declare_primary_keys() {
        for table in all_tables().iter().filter(|t| t.schema == SchemaKind::Dimension) {
            assert!(table.primary_key().is_some(), "{} has no primary key", table.name);
        }

        assert_eq!(users().primary_key().unwrap().name, "user_id");
        assert_eq!(songs().primary_key().unwrap().name, "song_id");
        assert_eq!(artists().primary_key().unwrap().name, "artist_id");
        assert_eq!(time().primary_key().unwrap().name, "start_time");
    }

    #[test]
    fn staging_tables_have_no_primary_key() {
        assert!(staging_events().primary_key().is_none());
        assert!(staging_songs().primary_key().is_none());
    }

    #[test]
    fn fact_table_distributed_on_song() {
        let table = songplays();
        assert_eq!(table.dist_key().unwrap().name, "song_id");
        assert!(table.find_column("start_time").unwrap().not_null);
        assert!(table.find_column("user_id").unwrap().not_null);
        assert_eq!(
            table.insertable_columns(),
            vec!["start_time", "user_id", "level", "song_id", "artist_id", "session_id", "location", "user_agent"]
        );
    }

    #[test]
    fn staging_events_columns() {
        let table = staging_events();
        assert_eq!(table.columns.len(), 19);
        assert_eq!(table.find_column("ts").unwrap().column_type, ColumnType::BigInt);
    }
}
