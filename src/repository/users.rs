//! Users repository for database operations

use sqlx::{Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::user::{CreateUser, Role, User, UserQuery},
};

#[derive(Clone)]
pub struct UsersRepository {
    pool: Pool<Postgres>,
}

impl UsersRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get user by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<User> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(AppError::UserNotFound(id))
    }

    /// Search users with pagination
    pub async fn search(&self, query: &UserQuery) -> AppResult<(Vec<User>, i64)> {
        let page = query.page.unwrap_or(1).max(1);
        let per_page = query.per_page.unwrap_or(15).clamp(1, 100);
        let offset = (page - 1) * per_page;

        let mut conditions = Vec::new();
        let mut params: Vec<String> = Vec::new();

        if let Some(ref search) = query.search {
            params.push(format!("%{}%", search));
            conditions.push(format!(
                "(name ILIKE ${n} OR email ILIKE ${n})",
                n = params.len()
            ));
        }

        if let Some(blocked) = query.blocked {
            conditions.push(format!("is_blocked = {}", blocked));
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        let count_query = format!("SELECT COUNT(*) FROM users {}", where_clause);
        let mut count_builder = sqlx::query_scalar::<_, i64>(&count_query);
        for param in &params {
            count_builder = count_builder.bind(param);
        }
        let total = count_builder.fetch_one(&self.pool).await?;

        let select_query = format!(
            "SELECT * FROM users {} ORDER BY name LIMIT {} OFFSET {}",
            where_clause, per_page, offset
        );
        let mut select_builder = sqlx::query_as::<_, User>(&select_query);
        for param in &params {
            select_builder = select_builder.bind(param);
        }
        let users = select_builder.fetch_all(&self.pool).await?;

        Ok((users, total))
    }

    /// Create a new user
    pub async fn create(&self, user: &CreateUser) -> AppResult<User> {
        let created = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (name, email, phone, address, role)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.phone)
        .bind(&user.address)
        .bind(user.role.unwrap_or(Role::User))
        .fetch_one(&self.pool)
        .await
        .map_err(|err| {
            if let sqlx::Error::Database(ref db) = err {
                if db.code().as_deref() == Some("23505")
                    && db.constraint() == Some("users_email_key")
                {
                    return AppError::Validation(
                        "A user with this email already exists".to_string(),
                    );
                }
            }
            AppError::Database(err)
        })?;

        Ok(created)
    }

    /// Set the blocked flag
    pub async fn set_blocked(&self, id: i32, blocked: bool) -> AppResult<User> {
        let user = sqlx::query_as::<_, User>(
            "UPDATE users SET is_blocked = $1 WHERE id = $2 RETURNING *",
        )
        .bind(blocked)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(AppError::UserNotFound(id))?;

        Ok(user)
    }

    /// Count all users
    pub async fn count(&self) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}
