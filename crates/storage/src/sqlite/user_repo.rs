use lms_core::model::{User, UserId};

use super::SqliteRepository;
use super::mapping::map_user_row;
use crate::repository::{SaveOutcome, StorageError, UserRepository};

#[async_trait::async_trait]
impl UserRepository for SqliteRepository {
    async fn list_users(&self) -> Result<Vec<User>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT id, name, email, role, avatar_url
            FROM users
            ORDER BY position ASC
            ",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        let mut users = Vec::with_capacity(rows.len());
        for row in rows {
            users.push(map_user_row(&row)?);
        }
        Ok(users)
    }

    async fn get_user(&self, id: &UserId) -> Result<Option<User>, StorageError> {
        let row = sqlx::query(
            r"
            SELECT id, name, email, role, avatar_url
            FROM users WHERE id = ?1
            ",
        )
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        row.as_ref().map(map_user_row).transpose()
    }

    async fn upsert_user(&self, user: &User) -> Result<SaveOutcome, StorageError> {
        let existed = self.get_user(&user.id).await?.is_some();

        sqlx::query(
            r"
            INSERT INTO users (id, name, email, role, avatar_url)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                email = excluded.email,
                role = excluded.role,
                avatar_url = excluded.avatar_url
            ",
        )
        .bind(user.id.as_str())
        .bind(&user.name)
        .bind(&user.email)
        .bind(user.role.as_str())
        .bind(user.avatar_url.as_deref())
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        Ok(if existed {
            SaveOutcome::Replaced
        } else {
            SaveOutcome::Inserted
        })
    }
}
