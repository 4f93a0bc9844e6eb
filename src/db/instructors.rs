//! Instructor persistence.
//!
//! Updates use the same version-checked conditional write as courses.

use chrono::Utc;
use sqlx::{QueryBuilder, Row, Sqlite};

use super::repository::{bounded, search_words, Repository};
use crate::errors::AppError;
use crate::filters::{calculate, Filters, Metadata};
use crate::models::Instructor;

impl Repository {
    pub async fn insert_instructor(&self, instructor: &Instructor) -> Result<Instructor, AppError> {
        let now = Utc::now().to_rfc3339();

        let row = bounded(
            sqlx::query(
                "INSERT INTO instructors (created_at, first_name, last_name, age) VALUES (?, ?, ?, ?) RETURNING id, created_at, version",
            )
            .bind(&now)
            .bind(&instructor.first_name)
            .bind(&instructor.last_name)
            .bind(instructor.age)
            .fetch_one(&self.pool),
        )
        .await?;

        Ok(Instructor {
            id: row.try_get("id")?,
            created_at: row.try_get("created_at")?,
            version: row.try_get("version")?,
            ..instructor.clone()
        })
    }

    pub async fn get_instructor(&self, id: i64) -> Result<Instructor, AppError> {
        if id < 1 {
            return Err(AppError::NotFound);
        }

        let row = bounded(
            sqlx::query(
                "SELECT id, created_at, first_name, last_name, age, version FROM instructors WHERE id = ?",
            )
            .bind(id)
            .fetch_optional(&self.pool),
        )
        .await?;

        row.as_ref()
            .map(instructor_from_row)
            .transpose()?
            .ok_or(AppError::NotFound)
    }

    /// List one page of instructors whose names contain every word of the
    /// corresponding search term.
    pub async fn list_instructors(
        &self,
        first_name: &str,
        last_name: &str,
        filters: &Filters,
    ) -> Result<(Vec<Instructor>, Metadata), AppError> {
        let mut query = QueryBuilder::<Sqlite>::new(
            "SELECT COUNT(*) OVER() AS total_records, id, created_at, first_name, last_name, age, version FROM instructors WHERE 1 = 1",
        );
        push_name_filters(&mut query, first_name, last_name);
        query
            .push(" ORDER BY ")
            .push(filters.order_by())
            .push(" LIMIT ")
            .push_bind(filters.limit())
            .push(" OFFSET ")
            .push_bind(filters.offset());

        let rows = bounded(query.build().fetch_all(&self.pool)).await?;

        let total_records: i64 = match rows.first() {
            Some(row) => row.try_get("total_records")?,
            None if filters.page() > 1 => {
                let mut count = QueryBuilder::<Sqlite>::new(
                    "SELECT COUNT(*) AS total_records FROM instructors WHERE 1 = 1",
                );
                push_name_filters(&mut count, first_name, last_name);
                let row = bounded(count.build().fetch_one(&self.pool)).await?;
                row.try_get("total_records")?
            }
            None => 0,
        };
        let instructors = rows
            .iter()
            .map(instructor_from_row)
            .collect::<Result<Vec<_>, _>>()?;

        Ok((
            instructors,
            calculate(total_records, filters.page(), filters.page_size()),
        ))
    }

    /// Version-checked update; see [`Repository::update_course`].
    pub async fn update_instructor(&self, instructor: &Instructor) -> Result<Instructor, AppError> {
        let row = bounded(
            sqlx::query(
                "UPDATE instructors SET first_name = ?, last_name = ?, age = ?, version = version + 1 WHERE id = ? AND version = ? RETURNING version",
            )
            .bind(&instructor.first_name)
            .bind(&instructor.last_name)
            .bind(instructor.age)
            .bind(instructor.id)
            .bind(instructor.version)
            .fetch_optional(&self.pool),
        )
        .await?;

        match row {
            Some(row) => Ok(Instructor {
                version: row.try_get("version")?,
                ..instructor.clone()
            }),
            None => Err(AppError::EditConflict),
        }
    }

    pub async fn delete_instructor(&self, id: i64) -> Result<(), AppError> {
        if id < 1 {
            return Err(AppError::NotFound);
        }

        let result = bounded(
            sqlx::query("DELETE FROM instructors WHERE id = ?")
                .bind(id)
                .execute(&self.pool),
        )
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound);
        }
        Ok(())
    }
}

fn push_name_filters(query: &mut QueryBuilder<'_, Sqlite>, first_name: &str, last_name: &str) {
    for (column, term) in [("first_name", first_name), ("last_name", last_name)] {
        for word in search_words(term) {
            query
                .push(format!(" AND instr(lower({column}), "))
                .push_bind(word)
                .push(") > 0");
        }
    }
}

fn instructor_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Instructor, sqlx::Error> {
    Ok(Instructor {
        id: row.try_get("id")?,
        created_at: row.try_get("created_at")?,
        first_name: row.try_get("first_name")?,
        last_name: row.try_get("last_name")?,
        age: row.try_get("age")?,
        version: row.try_get("version")?,
    })
}
