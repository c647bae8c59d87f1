use crate::repository::{ProgressStore, StorageError, SubjectFilter, Triple, TripleQuery};

use super::{
    SqliteRepository,
    mapping::{condition, map_triple_row, store_error},
};

#[async_trait::async_trait]
impl ProgressStore for SqliteRepository {
    async fn query(&self, query: &TripleQuery) -> Result<Vec<Triple>, StorageError> {
        let mut sql = format!(
            "SELECT resource, value FROM triples WHERE {} AND {}",
            condition("property", query.predicate_op, 1),
            condition("value", query.object_op, 2),
        );
        if let SubjectFilter::Exact(_) = query.subject {
            sql.push_str(" AND ");
            sql.push_str(&condition("resource", query.subject_op, 3));
        }
        sql.push_str(" ORDER BY id ASC");

        let mut stmt = sqlx::query(&sql)
            .bind(query.predicate.as_str())
            .bind(query.object.as_str());
        if let SubjectFilter::Exact(subject) = &query.subject {
            stmt = stmt.bind(subject.as_str());
        }

        let rows = stmt
            .fetch_all(&self.pool)
            .await
            .map_err(store_error)?;

        rows.iter().map(map_triple_row).collect()
    }

    async fn insert(
        &self,
        subject: &str,
        predicate: &str,
        value: &str,
    ) -> Result<(), StorageError> {
        sqlx::query(
            r"
                INSERT INTO triples (resource, property, value)
                VALUES (?1, ?2, ?3)
            ",
        )
        .bind(subject)
        .bind(predicate)
        .bind(value)
        .execute(&self.pool)
        .await
        .map_err(store_error)?;

        Ok(())
    }
}
