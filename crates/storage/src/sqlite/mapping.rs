use sqlx::Row;

use crate::repository::{MatchOp, StorageError, Triple};

fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

pub(crate) fn map_triple_row(row: &sqlx::sqlite::SqliteRow) -> Result<Triple, StorageError> {
    Ok(Triple {
        resource: row.try_get("resource").map_err(ser)?,
        value: row.try_get("value").map_err(ser)?,
    })
}

/// Maps a driver error onto the storage taxonomy.
///
/// Only connectivity, pool exhaustion and a busy or locked database are
/// worth retrying; everything else is a broken statement or schema.
pub(crate) fn store_error(e: sqlx::Error) -> StorageError {
    let transient = match &e {
        sqlx::Error::Io(_)
        | sqlx::Error::Tls(_)
        | sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed => true,
        // SQLITE_BUSY, SQLITE_LOCKED
        sqlx::Error::Database(db) => matches!(db.code().as_deref(), Some("5" | "6")),
        _ => false,
    };
    if transient {
        StorageError::Connection(e.to_string())
    } else {
        StorageError::Query(e.to_string())
    }
}

/// SQL comparison of `column` against positional parameter `param`.
pub(crate) fn condition(column: &str, op: MatchOp, param: u8) -> String {
    match op {
        MatchOp::Equals => format!("{column} = ?{param}"),
        MatchOp::Like => format!("{column} LIKE ?{param} ESCAPE '\\'"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn like_condition_declares_escape() {
        assert_eq!(condition("value", MatchOp::Like, 2), r"value LIKE ?2 ESCAPE '\'");
        assert_eq!(condition("property", MatchOp::Equals, 1), "property = ?1");
    }

    #[test]
    fn only_connectivity_errors_are_transient() {
        assert!(store_error(sqlx::Error::PoolTimedOut).is_transient());
        assert!(store_error(sqlx::Error::Io(std::io::Error::other("reset"))).is_transient());
        assert!(!store_error(sqlx::Error::RowNotFound).is_transient());
        assert!(!store_error(sqlx::Error::ColumnNotFound("value".into())).is_transient());
    }
}
