//! Token persistence. Only digests are stored.

use super::repository::{bounded, Repository};
use crate::errors::AppError;
use crate::models::{Token, TokenScope};

impl Repository {
    /// Generate and store a token for `user_id`, returning it with its plaintext.
    pub async fn new_token(&self, user_id: i64, scope: TokenScope) -> Result<Token, AppError> {
        let token = Token::generate(user_id, scope);
        self.insert_token(&token).await?;
        Ok(token)
    }

    pub async fn insert_token(&self, token: &Token) -> Result<(), AppError> {
        bounded(
            sqlx::query("INSERT INTO tokens (hash, user_id, expiry, scope) VALUES (?, ?, ?, ?)")
                .bind(&token.hash)
                .bind(token.user_id)
                .bind(token.expiry.timestamp())
                .bind(token.scope.as_str())
                .execute(&self.pool),
        )
        .await?;
        Ok(())
    }

    /// Drop every token of `scope` held by `user_id`. Returns how many went.
    pub async fn delete_all_tokens_for_user(
        &self,
        scope: TokenScope,
        user_id: i64,
    ) -> Result<u64, AppError> {
        let result = bounded(
            sqlx::query("DELETE FROM tokens WHERE scope = ? AND user_id = ?")
                .bind(scope.as_str())
                .bind(user_id)
                .execute(&self.pool),
        )
        .await?;
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};

    use super::*;
    use crate::db::repository::test_support;
    use crate::models::User;

    async fn insert_user(repo: &Repository) -> User {
        repo.insert_user(&User {
            id: 0,
            created_at: String::new(),
            name: "Bob".to_string(),
            email: "bob@example.com".to_string(),
            password_hash: "$argon2id$placeholder".to_string(),
            activated: true,
            version: 0,
        })
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_expired_and_unknown_tokens_resolve_to_nobody() {
        let (repo, _dir) = test_support::repository().await;
        let user = insert_user(&repo).await;

        let mut expired = Token::generate(user.id, TokenScope::Authentication);
        expired.expiry = Utc::now() - Duration::minutes(1);
        repo.insert_token(&expired).await.unwrap();

        let unknown = Token::generate(user.id, TokenScope::Authentication);

        for plaintext in [&expired.plaintext, &unknown.plaintext] {
            let found = repo
                .get_user_for_token(TokenScope::Authentication, plaintext)
                .await
                .unwrap();
            assert!(found.is_none());
        }
    }

    #[tokio::test]
    async fn test_delete_all_tokens_for_scope() {
        let (repo, _dir) = test_support::repository().await;
        let user = insert_user(&repo).await;

        let auth_a = repo.new_token(user.id, TokenScope::Authentication).await.unwrap();
        let auth_b = repo.new_token(user.id, TokenScope::Authentication).await.unwrap();
        let activation = repo.new_token(user.id, TokenScope::Activation).await.unwrap();

        let removed = repo
            .delete_all_tokens_for_user(TokenScope::Authentication, user.id)
            .await
            .unwrap();
        assert_eq!(removed, 2);

        for token in [&auth_a, &auth_b] {
            assert!(repo
                .get_user_for_token(TokenScope::Authentication, &token.plaintext)
                .await
                .unwrap()
                .is_none());
        }

        // Other scopes are untouched
        assert!(repo
            .get_user_for_token(TokenScope::Activation, &activation.plaintext)
            .await
            .unwrap()
            .is_some());
    }

    #[tokio::test]
    async fn test_token_for_missing_user_is_rejected() {
        let (repo, _dir) = test_support::repository().await;
        let result = repo.new_token(4242, TokenScope::Authentication).await;
        assert!(matches!(result, Err(AppError::Database(_))));
    }
}
