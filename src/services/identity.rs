use argon2::{Argon2, password_hash::PasswordHasher, password_hash::SaltString, PasswordVerifier};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::role::Role;
use crate::models::user::{User, UserInRole};
use crate::utils::jwt::JwtKeys;

pub struct NewUser {
    pub email: String,
    pub user_name: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub password: String,
}

/// Users, roles and role membership. Kept apart from the unit of work.
#[async_trait]
pub trait IdentityService: Send + Sync {
    async fn register(&self, new_user: NewUser) -> Result<User, AppError>;
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError>;
    async fn find_by_id(&self, user_id: Uuid) -> Result<Option<User>, AppError>;
    fn check_password(&self, user: &User, password: &str) -> bool;
    fn generate_password_reset_token(&self, user: &User) -> Result<String, AppError>;
    /// Fails with `BadRequest` when the token is expired, forged or already used.
    async fn reset_password(&self, user: &User, token: &str, new_password: &str) -> Result<(), AppError>;

    async fn create_role(&self, name: &str) -> Result<Role, AppError>;
    async fn list_roles(&self) -> Result<Vec<Role>, AppError>;
    async fn find_role(&self, role_id: Uuid) -> Result<Option<Role>, AppError>;
    async fn find_role_by_name(&self, name: &str) -> Result<Option<Role>, AppError>;
    async fn rename_role(&self, role_id: Uuid, name: &str) -> Result<Option<Role>, AppError>;
    async fn delete_role(&self, role_id: Uuid) -> Result<bool, AppError>;

    async fn is_in_role(&self, user_id: Uuid, role_id: Uuid) -> Result<bool, AppError>;
    async fn add_to_role(&self, user_id: Uuid, role_id: Uuid) -> Result<(), AppError>;
    async fn remove_from_role(&self, user_id: Uuid, role_id: Uuid) -> Result<(), AppError>;
    async fn roles_for_user(&self, user_id: Uuid) -> Result<Vec<String>, AppError>;
    async fn users_in_role(&self, role_id: Uuid) -> Result<Vec<UserInRole>, AppError>;
}

pub fn hash_password(password: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut rand::thread_rng());
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AppError::InternalServerError("Hashing error".to_string()))
}

pub fn verify_password(password: &str, password_hash: &str) -> bool {
    argon2::PasswordHash::new(password_hash)
        .map(|parsed| Argon2::default().verify_password(password.as_bytes(), &parsed).is_ok())
        .unwrap_or(false)
}

pub struct PgIdentityService {
    pool: PgPool,
    keys: JwtKeys,
}

impl PgIdentityService {
    pub fn new(pool: PgPool, keys: JwtKeys) -> Self {
        Self { pool, keys }
    }
}

#[async_trait]
impl IdentityService for PgIdentityService {
    async fn register(&self, new_user: NewUser) -> Result<User, AppError> {
        if self.find_by_email(&new_user.email).await?.is_some() {
            return Err(AppError::Conflict("Email already exists".to_string()));
        }

        let password_hash = hash_password(&new_user.password)?;
        let now = Utc::now();
        let user = sqlx::query_as::<_, User>(
            "INSERT INTO users (user_id, email, user_name, first_name, last_name, password, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $7) RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(&new_user.email)
        .bind(&new_user.user_name)
        .bind(&new_user.first_name)
        .bind(&new_user.last_name)
        .bind(&password_hash)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        Ok(sqlx::query_as::<_, User>("SELECT * FROM users WHERE LOWER(email) = LOWER($1)")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn find_by_id(&self, user_id: Uuid) -> Result<Option<User>, AppError> {
        Ok(sqlx::query_as::<_, User>("SELECT * FROM users WHERE user_id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?)
    }

    fn check_password(&self, user: &User, password: &str) -> bool {
        verify_password(password, &user.password)
    }

    fn generate_password_reset_token(&self, user: &User) -> Result<String, AppError> {
        self.keys
            .generate_reset_token(&user.user_id.to_string(), &user.password)
            .map_err(|_| AppError::InternalServerError("Token generation error".to_string()))
    }

    async fn reset_password(&self, user: &User, token: &str, new_password: &str) -> Result<(), AppError> {
        if !self.keys.validate_reset_token(token, &user.user_id.to_string(), &user.password) {
            return Err(AppError::BadRequest("Invalid or expired reset token".to_string()));
        }

        let password_hash = hash_password(new_password)?;
        sqlx::query("UPDATE users SET password = $1, updated_at = $2 WHERE user_id = $3")
            .bind(&password_hash)
            .bind(Utc::now())
            .bind(user.user_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn create_role(&self, name: &str) -> Result<Role, AppError> {
        if self.find_role_by_name(name).await?.is_some() {
            return Err(AppError::Conflict(format!("Role '{}' already exists", name)));
        }
        Ok(sqlx::query_as::<_, Role>("INSERT INTO roles (role_id, name) VALUES ($1, $2) RETURNING role_id, name")
            .bind(Uuid::new_v4())
            .bind(name)
            .fetch_one(&self.pool)
            .await?)
    }

    async fn list_roles(&self) -> Result<Vec<Role>, AppError> {
        Ok(sqlx::query_as::<_, Role>("SELECT role_id, name FROM roles ORDER BY name")
            .fetch_all(&self.pool)
            .await?)
    }

    async fn find_role(&self, role_id: Uuid) -> Result<Option<Role>, AppError> {
        Ok(sqlx::query_as::<_, Role>("SELECT role_id, name FROM roles WHERE role_id = $1")
            .bind(role_id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn find_role_by_name(&self, name: &str) -> Result<Option<Role>, AppError> {
        Ok(sqlx::query_as::<_, Role>("SELECT role_id, name FROM roles WHERE LOWER(name) = LOWER($1)")
            .bind(name)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn rename_role(&self, role_id: Uuid, name: &str) -> Result<Option<Role>, AppError> {
        Ok(sqlx::query_as::<_, Role>("UPDATE roles SET name = $1 WHERE role_id = $2 RETURNING role_id, name")
            .bind(name)
            .bind(role_id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn delete_role(&self, role_id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM roles WHERE role_id = $1")
            .bind(role_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn is_in_role(&self, user_id: Uuid, role_id: Uuid) -> Result<bool, AppError> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM user_roles WHERE user_id = $1 AND role_id = $2)",
        )
        .bind(user_id)
        .bind(role_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    async fn add_to_role(&self, user_id: Uuid, role_id: Uuid) -> Result<(), AppError> {
        sqlx::query("INSERT INTO user_roles (user_id, role_id) VALUES ($1, $2) ON CONFLICT DO NOTHING")
            .bind(user_id)
            .bind(role_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn remove_from_role(&self, user_id: Uuid, role_id: Uuid) -> Result<(), AppError> {
        sqlx::query("DELETE FROM user_roles WHERE user_id = $1 AND role_id = $2")
            .bind(user_id)
            .bind(role_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn roles_for_user(&self, user_id: Uuid) -> Result<Vec<String>, AppError> {
        Ok(sqlx::query_scalar::<_, String>(
            "SELECT r.name FROM roles r JOIN user_roles ur ON ur.role_id = r.role_id WHERE ur.user_id = $1 ORDER BY r.name",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn users_in_role(&self, role_id: Uuid) -> Result<Vec<UserInRole>, AppError> {
        let rows: Vec<(Uuid, String, bool)> = sqlx::query_as(
            "SELECT u.user_id, u.user_name, EXISTS(SELECT 1 FROM user_roles ur WHERE ur.user_id = u.user_id AND ur.role_id = $1) \
             FROM users u ORDER BY u.user_name",
        )
        .bind(role_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(user_id, user_name, is_in_role)| UserInRole { user_id, user_name, is_in_role })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_hash_round_trip() {
        let hash = hash_password("Pa$$w0rd!").unwrap();
        assert_ne!(hash, "Pa$$w0rd!");
        assert!(verify_password("Pa$$w0rd!", &hash));
        assert!(!verify_password("wrong", &hash));
        assert!(!verify_password("Pa$$w0rd!", "not-a-phc-string"));
    }
}
