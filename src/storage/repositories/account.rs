//! Account repository
//!
//! Persistence for identities, their secret hashes and pending password
//! resets. Callers pass identifiers already normalized by the credential store.

use crate::auth::account::{Account, AccountCredentials, Role};
use crate::domain::UserId;
use crate::errors::{Error, Result};
use crate::storage::DbPool;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use std::str::FromStr;
use tracing::instrument;

const ACCOUNT_COLUMNS: &str = "id, full_name, username, email, phone, password_hash, role, \
     is_active, avatar, last_login_at, created_at, updated_at";

#[derive(Debug, Clone, FromRow)]
struct AccountRow {
    pub id: String,
    pub full_name: String,
    pub username: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub password_hash: String,
    pub role: String,
    pub is_active: bool,
    pub avatar: String,
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AccountRow {
    fn into_credentials(self) -> Result<AccountCredentials> {
        let role = Role::from_str(&self.role)
            .map_err(|e| Error::internal(format!("Corrupt account row {}: {}", self.id, e)))?;

        Ok(AccountCredentials {
            password_hash: self.password_hash,
            account: Account {
                id: UserId::from_string(self.id),
                full_name: self.full_name,
                username: self.username,
                email: self.email,
                phone: self.phone,
                role,
                is_active: self.is_active,
                avatar: self.avatar,
                last_login_at: self.last_login_at,
                created_at: self.created_at,
                updated_at: self.updated_at,
            },
        })
    }

    fn into_account(self) -> Result<Account> {
        self.into_credentials().map(|c| c.account)
    }
}

/// Insert payload; the secret is already hashed.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub id: UserId,
    pub full_name: String,
    pub username: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub password_hash: String,
    pub role: Role,
}

/// Partial profile update; `None` leaves the column untouched.
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

#[async_trait]
pub trait AccountRepository: Send + Sync {
    async fn create(&self, account: NewAccount) -> Result<Account>;

    async fn find_by_id(&self, id: &UserId) -> Result<Option<Account>>;

    async fn find_by_email(&self, email: &str) -> Result<Option<Account>>;

    /// Lookup by username or email, including the secret hash.
    async fn find_credentials_by_identifier(
        &self,
        identifier: &str,
    ) -> Result<Option<AccountCredentials>>;

    async fn find_credentials_by_id(&self, id: &UserId) -> Result<Option<AccountCredentials>>;

    async fn username_exists(&self, username: &str) -> Result<bool>;

    /// Whether another account already holds `email`.
    async fn email_taken(&self, email: &str, excluding: Option<&UserId>) -> Result<bool>;

    async fn update_profile(&self, id: &UserId, update: ProfileUpdate) -> Result<Account>;

    async fn update_password_hash(&self, id: &UserId, password_hash: &str) -> Result<()>;

    /// Flip the active flag atomically, returning the new state of the account.
    async fn toggle_active(&self, id: &UserId) -> Result<Option<Account>>;

    async fn mark_login(&self, id: &UserId, at: DateTime<Utc>) -> Result<()>;

    /// Overwrite any pending reset with a new hash and expiry.
    async fn store_reset_token(&self, id: &UserId, token_hash: &str, expires_at_ms: i64)
        -> Result<()>;

    /// Account whose pending reset matches `token_hash` and expires after `now_ms`.
    async fn find_by_reset_token(&self, token_hash: &str, now_ms: i64) -> Result<Option<Account>>;

    /// Write the new hash and clear the reset fields if the reset is still pending.
    ///
    /// Returns `false` when the row no longer matches, which means the token was
    /// consumed, superseded or expired in the meantime.
    async fn consume_reset_token(
        &self,
        id: &UserId,
        token_hash: &str,
        new_password_hash: &str,
        now_ms: i64,
    ) -> Result<bool>;

    /// Delete the account and the applications it owns in one transaction.
    async fn delete_with_dependents(&self, id: &UserId) -> Result<bool>;

    async fn admin_exists(&self) -> Result<bool>;
}

#[derive(Debug, Clone)]
pub struct SqlxAccountRepository {
    pool: DbPool,
}

impl SqlxAccountRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    async fn fetch_row(&self, clause: &str, value: &str) -> Result<Option<AccountRow>> {
        let sql = format!("SELECT {} FROM accounts WHERE {}", ACCOUNT_COLUMNS, clause);
        sqlx::query_as::<_, AccountRow>(&sql)
            .bind(value)
            .fetch_optional(&self.pool)
            .await
            .map_err(|err| Error::database(err, "Failed to fetch account"))
    }
}

#[async_trait]
impl AccountRepository for SqlxAccountRepository {
    #[instrument(skip(self, account), fields(user_id = %account.id, username = %account.username), name = "db_create_account")]
    async fn create(&self, account: NewAccount) -> Result<Account> {
        let now = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO accounts (id, full_name, username, email, phone, password_hash, role, is_active, avatar, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, 1, '', $8, $9)
            "#,
        )
        .bind(&account.id)
        .bind(&account.full_name)
        .bind(&account.username)
        .bind(&account.email)
        .bind(&account.phone)
        .bind(&account.password_hash)
        .bind(account.role.as_str())
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|err| Error::database(err, "Failed to create account"))?;

        self.find_by_id(&account.id)
            .await?
            .ok_or_else(|| Error::internal("Account not found after creation"))
    }

    #[instrument(skip(self), fields(user_id = %id), name = "db_find_account")]
    async fn find_by_id(&self, id: &UserId) -> Result<Option<Account>> {
        self.fetch_row("id = $1", id.as_str()).await?.map(AccountRow::into_account).transpose()
    }

    #[instrument(skip(self, email), name = "db_find_account_by_email")]
    async fn find_by_email(&self, email: &str) -> Result<Option<Account>> {
        self.fetch_row("email = $1", email).await?.map(AccountRow::into_account).transpose()
    }

    #[instrument(skip(self, identifier), name = "db_find_account_credentials")]
    async fn find_credentials_by_identifier(
        &self,
        identifier: &str,
    ) -> Result<Option<AccountCredentials>> {
        // Prefer the username match should a username equal another account's email.
        let sql = format!(
            "SELECT {} FROM accounts WHERE username = $1 OR email = $1 \
             ORDER BY CASE WHEN username = $1 THEN 0 ELSE 1 END LIMIT 1",
            ACCOUNT_COLUMNS
        );
        sqlx::query_as::<_, AccountRow>(&sql)
            .bind(identifier)
            .fetch_optional(&self.pool)
            .await
            .map_err(|err| Error::database(err, "Failed to fetch account credentials"))?
            .map(AccountRow::into_credentials)
            .transpose()
    }

    #[instrument(skip(self), fields(user_id = %id), name = "db_find_account_credentials_by_id")]
    async fn find_credentials_by_id(&self, id: &UserId) -> Result<Option<AccountCredentials>> {
        self.fetch_row("id = $1", id.as_str()).await?.map(AccountRow::into_credentials).transpose()
    }

    #[instrument(skip(self), name = "db_username_exists")]
    async fn username_exists(&self, username: &str) -> Result<bool> {
        let count =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM accounts WHERE username = $1")
                .bind(username)
                .fetch_one(&self.pool)
                .await
                .map_err(|err| Error::database(err, "Failed to check username"))?;

        Ok(count > 0)
    }

    #[instrument(skip(self, email), name = "db_email_taken")]
    async fn email_taken(&self, email: &str, excluding: Option<&UserId>) -> Result<bool> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM accounts WHERE email = $1 AND ($2 IS NULL OR id <> $2)",
        )
        .bind(email)
        .bind(excluding.map(UserId::as_str))
        .fetch_one(&self.pool)
        .await
        .map_err(|err| Error::database(err, "Failed to check email"))?;

        Ok(count > 0)
    }

    #[instrument(skip(self, update), fields(user_id = %id), name = "db_update_profile")]
    async fn update_profile(&self, id: &UserId, update: ProfileUpdate) -> Result<Account> {
        let result = sqlx::query(
            r#"
            UPDATE accounts
            SET full_name = COALESCE($1, full_name),
                email = COALESCE($2, email),
                phone = COALESCE($3, phone),
                updated_at = $4
            WHERE id = $5
            "#,
        )
        .bind(update.full_name)
        .bind(update.email)
        .bind(update.phone)
        .bind(Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|err| Error::database(err, "Failed to update profile"))?;

        if result.rows_affected() == 0 {
            return Err(Error::not_found("User", id.as_str()));
        }

        self.find_by_id(id).await?.ok_or_else(|| Error::internal("Account not found after update"))
    }

    #[instrument(skip(self, password_hash), fields(user_id = %id), name = "db_update_password")]
    async fn update_password_hash(&self, id: &UserId, password_hash: &str) -> Result<()> {
        let result =
            sqlx::query("UPDATE accounts SET password_hash = $1, updated_at = $2 WHERE id = $3")
                .bind(password_hash)
                .bind(Utc::now())
                .bind(id)
                .execute(&self.pool)
                .await
                .map_err(|err| Error::database(err, "Failed to update password"))?;

        if result.rows_affected() == 0 {
            return Err(Error::not_found("User", id.as_str()));
        }

        Ok(())
    }

    #[instrument(skip(self), fields(user_id = %id), name = "db_toggle_active")]
    async fn toggle_active(&self, id: &UserId) -> Result<Option<Account>> {
        let result = sqlx::query(
            "UPDATE accounts SET is_active = NOT is_active, updated_at = $1 WHERE id = $2",
        )
        .bind(Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|err| Error::database(err, "Failed to toggle account status"))?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }

        self.find_by_id(id).await
    }

    #[instrument(skip(self), fields(user_id = %id), name = "db_mark_login")]
    async fn mark_login(&self, id: &UserId, at: DateTime<Utc>) -> Result<()> {
        sqlx::query("UPDATE accounts SET last_login_at = $1 WHERE id = $2")
            .bind(at)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|err| Error::database(err, "Failed to record login"))?;

        Ok(())
    }

    #[instrument(skip(self, token_hash), fields(user_id = %id), name = "db_store_reset_token")]
    async fn store_reset_token(
        &self,
        id: &UserId,
        token_hash: &str,
        expires_at_ms: i64,
    ) -> Result<()> {
        sqlx::query(
            "UPDATE accounts SET reset_token_hash = $1, reset_token_expires_at = $2 WHERE id = $3",
        )
        .bind(token_hash)
        .bind(expires_at_ms)
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|err| Error::database(err, "Failed to store reset token"))?;

        Ok(())
    }

    #[instrument(skip(self, token_hash), name = "db_find_by_reset_token")]
    async fn find_by_reset_token(&self, token_hash: &str, now_ms: i64) -> Result<Option<Account>> {
        let sql = format!(
            "SELECT {} FROM accounts WHERE reset_token_hash = $1 AND reset_token_expires_at > $2",
            ACCOUNT_COLUMNS
        );
        sqlx::query_as::<_, AccountRow>(&sql)
            .bind(token_hash)
            .bind(now_ms)
            .fetch_optional(&self.pool)
            .await
            .map_err(|err| Error::database(err, "Failed to look up reset token"))?
            .map(AccountRow::into_account)
            .transpose()
    }

    #[instrument(skip(self, token_hash, new_password_hash), fields(user_id = %id), name = "db_consume_reset_token")]
    async fn consume_reset_token(
        &self,
        id: &UserId,
        token_hash: &str,
        new_password_hash: &str,
        now_ms: i64,
    ) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE accounts
            SET password_hash = $1,
                reset_token_hash = NULL,
                reset_token_expires_at = NULL,
                updated_at = $2
            WHERE id = $3 AND reset_token_hash = $4 AND reset_token_expires_at > $5
            "#,
        )
        .bind(new_password_hash)
        .bind(Utc::now())
        .bind(id)
        .bind(token_hash)
        .bind(now_ms)
        .execute(&self.pool)
        .await
        .map_err(|err| Error::database(err, "Failed to consume reset token"))?;

        Ok(result.rows_affected() == 1)
    }

    #[instrument(skip(self), fields(user_id = %id), name = "db_delete_account")]
    async fn delete_with_dependents(&self, id: &UserId) -> Result<bool> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|err| Error::database(err, "Failed to begin account deletion"))?;

        let applications = sqlx::query("DELETE FROM applications WHERE user_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(|err| Error::database(err, "Failed to delete applications"))?
            .rows_affected();

        let deleted = sqlx::query("DELETE FROM accounts WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(|err| Error::database(err, "Failed to delete account"))?
            .rows_affected();

        tx.commit().await.map_err(|err| Error::database(err, "Failed to commit account deletion"))?;

        tracing::debug!(user_id = %id, applications, deleted, "Account deletion committed");
        Ok(deleted == 1)
    }

    #[instrument(skip(self), name = "db_admin_exists")]
    async fn admin_exists(&self) -> Result<bool> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM accounts WHERE role = 'admin'")
            .fetch_one(&self.pool)
            .await
            .map_err(|err| Error::database(err, "Failed to count admin accounts"))?;

        Ok(count > 0)
    }
}
