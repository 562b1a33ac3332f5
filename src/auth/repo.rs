use crate::auth::repo_types::User;
use sqlx::PgPool;

const USER_COLUMNS: &str = "id, username, email, password_hash, role, is_confirmed, created_at";

impl User {
    /// Find a user by exact username or normalized email.
    pub async fn find_by_identifier(
        db: &PgPool,
        username: &str,
        email: &str,
    ) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            SELECT {USER_COLUMNS}
            FROM users
            WHERE username = $1 OR email = $2
            "#,
        ))
        .bind(username)
        .bind(email)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    pub async fn find_by_email(db: &PgPool, email: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            SELECT {USER_COLUMNS}
            FROM users
            WHERE email = $1
            "#,
        ))
        .bind(email)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    pub async fn find_by_id(db: &PgPool, id: uuid::Uuid) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            SELECT {USER_COLUMNS}
            FROM users
            WHERE id = $1
            "#,
        ))
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    /// Insert an unconfirmed user with no role. Returns the raw sqlx error so
    /// callers can map a unique violation to a conflict; the DB constraints
    /// are what actually guarantee uniqueness, not the pre-insert lookup.
    pub async fn create(
        db: &PgPool,
        username: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<User, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (username, email, password_hash, is_confirmed)
            VALUES ($1, $2, $3, FALSE)
            RETURNING {USER_COLUMNS}
            "#,
        ))
        .bind(username)
        .bind(email)
        .bind(password_hash)
        .fetch_one(db)
        .await?;
        Ok(user)
    }

    /// Mark the account confirmed and grant the base role. Zero or one rows
    /// updated are both success: re-confirming is a no-op.
    pub async fn confirm_email(db: &PgPool, email: &str) -> anyhow::Result<u64> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET role = 'user', is_confirmed = TRUE
            WHERE email = $1
            "#,
        )
        .bind(email)
        .execute(db)
        .await?;
        Ok(result.rows_affected())
    }

    pub async fn update_password(db: &PgPool, email: &str, password_hash: &str) -> anyhow::Result<u64> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET password_hash = $2
            WHERE email = $1
            "#,
        )
        .bind(email)
        .bind(password_hash)
        .execute(db)
        .await?;
        Ok(result.rows_affected())
    }

    /// All accounts, oldest first. Admin-only listing.
    pub async fn list_all(db: &PgPool) -> anyhow::Result<Vec<User>> {
        let users = sqlx::query_as::<_, User>(&format!(
            r#"
            SELECT {USER_COLUMNS}
            FROM users
            ORDER BY created_at
            "#,
        ))
        .fetch_all(db)
        .await?;
        Ok(users)
    }
}
