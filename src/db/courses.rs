//! Course persistence with optimistic concurrency.

use chrono::Utc;
use sqlx::{QueryBuilder, Row, Sqlite};

use super::repository::{bounded, encode_string_list, parse_string_list, search_words, Repository};
use crate::errors::AppError;
use crate::filters::{calculate, Filters, Metadata};
use crate::models::{Course, Runtime};

impl Repository {
    /// Insert a course, returning it with its id, creation time and version.
    pub async fn insert_course(&self, course: &Course) -> Result<Course, AppError> {
        let now = Utc::now().to_rfc3339();
        let lectures = encode_string_list(&course.lectures);

        let row = bounded(
            sqlx::query(
                "INSERT INTO courses (created_at, title, published_date, runtime, lectures) VALUES (?, ?, ?, ?, ?) RETURNING id, created_at, version",
            )
            .bind(&now)
            .bind(&course.title)
            .bind(&course.published_date)
            .bind(course.runtime.minutes())
            .bind(&lectures)
            .fetch_one(&self.pool),
        )
        .await?;

        Ok(Course {
            id: row.try_get("id")?,
            created_at: row.try_get("created_at")?,
            version: row.try_get("version")?,
            ..course.clone()
        })
    }

    /// Get a course by ID.
    pub async fn get_course(&self, id: i64) -> Result<Course, AppError> {
        if id < 1 {
            return Err(AppError::NotFound);
        }

        let row = bounded(
            sqlx::query(
                "SELECT id, created_at, title, published_date, runtime, lectures, version FROM courses WHERE id = ?",
            )
            .bind(id)
            .fetch_optional(&self.pool),
        )
        .await?;

        row.as_ref()
            .map(course_from_row)
            .transpose()?
            .ok_or(AppError::NotFound)
    }

    /// List one page of courses matching `title` and containing every entry of
    /// `lectures`, together with the total match count.
    pub async fn list_courses(
        &self,
        title: &str,
        lectures: &[String],
        filters: &Filters,
    ) -> Result<(Vec<Course>, Metadata), AppError> {
        let mut query = QueryBuilder::<Sqlite>::new(
            "SELECT COUNT(*) OVER() AS total_records, id, created_at, title, published_date, runtime, lectures, version FROM courses WHERE 1 = 1",
        );
        push_course_filters(&mut query, title, lectures);
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
            // Past the last page the window count has no row to ride on
            None if filters.page() > 1 => {
                let mut count = QueryBuilder::<Sqlite>::new(
                    "SELECT COUNT(*) AS total_records FROM courses WHERE 1 = 1",
                );
                push_course_filters(&mut count, title, lectures);
                let row = bounded(count.build().fetch_one(&self.pool)).await?;
                row.try_get("total_records")?
            }
            None => 0,
        };
        let courses = rows
            .iter()
            .map(course_from_row)
            .collect::<Result<Vec<_>, _>>()?;

        let metadata = calculate(total_records, filters.page(), filters.page_size());
        Ok((courses, metadata))
    }

    /// Write `course` if the stored row is still at `course.version`.
    ///
    /// Returns the course with its new version. When no row matches, either
    /// because the id is gone or because another writer bumped the version
    /// first, the result is [`AppError::EditConflict`].
    pub async fn update_course(&self, course: &Course) -> Result<Course, AppError> {
        let lectures = encode_string_list(&course.lectures);

        let row = bounded(
            sqlx::query(
                "UPDATE courses SET title = ?, published_date = ?, runtime = ?, lectures = ?, version = version + 1 WHERE id = ? AND version = ? RETURNING version",
            )
            .bind(&course.title)
            .bind(&course.published_date)
            .bind(course.runtime.minutes())
            .bind(&lectures)
            .bind(course.id)
            .bind(course.version)
            .fetch_optional(&self.pool),
        )
        .await?;

        match row {
            Some(row) => Ok(Course {
                version: row.try_get("version")?,
                ..course.clone()
            }),
            None => Err(AppError::EditConflict),
        }
    }

    /// Delete a course.
    pub async fn delete_course(&self, id: i64) -> Result<(), AppError> {
        if id < 1 {
            return Err(AppError::NotFound);
        }

        let result = bounded(
            sqlx::query("DELETE FROM courses WHERE id = ?")
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

/// Title words and required lectures, shared by the page and count queries.
fn push_course_filters(query: &mut QueryBuilder<'_, Sqlite>, title: &str, lectures: &[String]) {
    for word in search_words(title) {
        query
            .push(" AND instr(lower(title), ")
            .push_bind(word)
            .push(") > 0");
    }

    for lecture in lectures {
        query
            .push(" AND EXISTS (SELECT 1 FROM json_each(courses.lectures) WHERE json_each.value = ")
            .push_bind(lecture.clone())
            .push(")");
    }
}

fn course_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Course, sqlx::Error> {
    let lectures: String = row.try_get("lectures")?;
    Ok(Course {
        id: row.try_get("id")?,
        created_at: row.try_get("created_at")?,
        title: row.try_get("title")?,
        published_date: row.try_get("published_date")?,
        runtime: Runtime(row.try_get("runtime")?),
        lectures: parse_string_list(&lectures)?,
        version: row.try_get("version")?,
    })
}
