//! User account persistence.

use chrono::Utc;
use sqlx::Row;

use super::repository::{bounded, Repository};
use crate::errors::AppError;
use crate::models::{hash_token, TokenScope, User};

const DUPLICATE_EMAIL: &str = "a user with this email address already exists";

impl Repository {
    /// Insert a new user. A clash on email surfaces as a field error on `email`.
    pub async fn insert_user(&self, user: &User) -> Result<User, AppError> {
        let now = Utc::now().to_rfc3339();

        let row = bounded(async {
            sqlx::query(
                "INSERT INTO users (created_at, name, email, password_hash, activated) VALUES (?, ?, ?, ?, ?) RETURNING id, created_at, version",
            )
            .bind(&now)
            .bind(&user.name)
            .bind(&user.email)
            .bind(&user.password_hash)
            .bind(user.activated)
            .fetch_one(&self.pool)
            .await
            .map_err(duplicate_email)
        })
        .await?;

        Ok(User {
            id: row.try_get("id")?,
            created_at: row.try_get("created_at")?,
            version: row.try_get("version")?,
            ..user.clone()
        })
    }

    /// Look a user up by email, case-insensitively.
    pub async fn get_user_by_email(&self, email: &str) -> Result<User, AppError> {
        let row = bounded(
            sqlx::query(
                "SELECT id, created_at, name, email, password_hash, activated, version FROM users WHERE email = ?",
            )
            .bind(email)
            .fetch_optional(&self.pool),
        )
        .await?;

        row.as_ref()
            .map(user_from_row)
            .transpose()?
            .ok_or(AppError::NotFound)
    }

    /// Version-checked update of a user's mutable fields.
    pub async fn update_user(&self, user: &User) -> Result<User, AppError> {
        let row = bounded(async {
            sqlx::query(
                "UPDATE users SET name = ?, email = ?, password_hash = ?, activated = ?, version = version + 1 WHERE id = ? AND version = ? RETURNING version",
            )
            .bind(&user.name)
            .bind(&user.email)
            .bind(&user.password_hash)
            .bind(user.activated)
            .bind(user.id)
            .bind(user.version)
            .fetch_optional(&self.pool)
            .await
            .map_err(duplicate_email)
        })
        .await?;

        match row {
            Some(row) => Ok(User {
                version: row.try_get("version")?,
                ..user.clone()
            }),
            None => Err(AppError::EditConflict),
        }
    }

    /// Resolve a token plaintext to its owner.
    ///
    /// Unknown, expired and wrong-scope tokens all come back as `None` from
    /// the same query.
    pub async fn get_user_for_token(
        &self,
        scope: TokenScope,
        plaintext: &str,
    ) -> Result<Option<User>, AppError> {
        let row = bounded(
            sqlx::query(
                r#"
                SELECT users.id, users.created_at, users.name, users.email,
                       users.password_hash, users.activated, users.version
                FROM users
                INNER JOIN tokens ON users.id = tokens.user_id
                WHERE tokens.hash = ? AND tokens.scope = ? AND tokens.expiry > ?
                "#,
            )
            .bind(hash_token(plaintext))
            .bind(scope.as_str())
            .bind(Utc::now().timestamp())
            .fetch_optional(&self.pool),
        )
        .await?;

        Ok(row.as_ref().map(user_from_row).transpose()?)
    }
}

fn duplicate_email(err: sqlx::Error) -> AppError {
    match err {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            AppError::field("email", DUPLICATE_EMAIL)
        }
        other => other.into(),
    }
}

fn user_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<User, sqlx::Error> {
    let activated: i64 = row.try_get("activated")?;
    Ok(User {
        id: row.try_get("id")?,
        created_at: row.try_get("created_at")?,
        name: row.try_get("name")?,
        email: row.try_get("email")?,
        password_hash: row.try_get("password_hash")?,
        activated: activated != 0,
        version: row.try_get("version")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::test_support;

    fn new_user(email: &str) -> User {
        User {
            id: 0,
            created_at: String::new(),
            name: "Alice".to_string(),
            email: email.to_string(),
            password_hash: "$argon2id$placeholder".to_string(),
            activated: false,
            version: 0,
        }
    }

    #[tokio::test]
    async fn test_insert_and_lookup() {
        let (repo, _dir) = test_support::repository().await;

        let created = repo.insert_user(&new_user("alice@example.com")).await.unwrap();
        assert!(created.id >= 1);
        assert_eq!(created.version, 1);

        let fetched = repo.get_user_by_email("ALICE@example.com").await.unwrap();
        assert_eq!(fetched, created);

        assert!(matches!(
            repo.get_user_by_email("nobody@example.com").await,
            Err(AppError::NotFound)
        ));
    }

    #[tokio::test]
    async fn test_duplicate_email_is_field_error() {
        let (repo, _dir) = test_support::repository().await;
        repo.insert_user(&new_user("alice@example.com")).await.unwrap();

        match repo.insert_user(&new_user("Alice@Example.com")).await {
            Err(AppError::Validation(errors)) => assert_eq!(errors["email"], DUPLICATE_EMAIL),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_update_to_taken_email_is_field_error() {
        let (repo, _dir) = test_support::repository().await;
        repo.insert_user(&new_user("alice@example.com")).await.unwrap();
        let mut bob = repo.insert_user(&new_user("bob@example.com")).await.unwrap();

        bob.email = "ALICE@example.com".to_string();
        match repo.update_user(&bob).await {
            Err(AppError::Validation(errors)) => assert_eq!(errors["email"], DUPLICATE_EMAIL),
            other => panic!("expected validation error, got {other:?}"),
        }

        // The failed write left the row untouched
        let fetched = repo.get_user_by_email("bob@example.com").await.unwrap();
        assert_eq!(fetched.version, 1);
    }

    #[tokio::test]
    async fn test_activation_update() {
        let (repo, _dir) = test_support::repository().await;
        let mut user = repo.insert_user(&new_user("alice@example.com")).await.unwrap();

        user.activated = true;
        let updated = repo.update_user(&user).await.unwrap();
        assert!(updated.activated);
        assert_eq!(updated.version, 2);

        // Same version again: someone else already wrote
        assert!(matches!(
            repo.update_user(&user).await,
            Err(AppError::EditConflict)
        ));

        let fetched = repo.get_user_by_email("alice@example.com").await.unwrap();
        assert!(fetched.activated);
    }

    #[tokio::test]
    async fn test_user_for_token_checks_scope() {
        let (repo, _dir) = test_support::repository().await;
        let user = repo.insert_user(&new_user("alice@example.com")).await.unwrap();
        let token = repo
            .new_token(user.id, TokenScope::Activation)
            .await
            .unwrap();

        let found = repo
            .get_user_for_token(TokenScope::Activation, &token.plaintext)
            .await
            .unwrap();
        assert_eq!(found.map(|u| u.id), Some(user.id));

        let wrong_scope = repo
            .get_user_for_token(TokenScope::Authentication, &token.plaintext)
            .await
            .unwrap();
        assert!(wrong_scope.is_none());
    }
}
