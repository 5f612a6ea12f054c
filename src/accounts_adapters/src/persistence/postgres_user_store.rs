use accounts_core::{
    Address, Email, PasswordHash, PendingToken, Phone, RefreshTokenSet, TokenDigest, User, UserId,
    UserName, UserRecord, UserStore, UserStoreError, Visibility,
};
use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, Secret};
use sqlx::{
    PgPool,
    Postgres,
    postgres::{PgArguments, PgPoolOptions},
    query::QueryAs,
    types::Json,
};
use uuid::Uuid;

const EMAIL_CONSTRAINT: &str = "users_email_key";
const PHONE_CONSTRAINT: &str = "users_phone_key";
const EXISTS_BY_ID: &str = "SELECT EXISTS (SELECT 1 FROM users WHERE id = $1)";

const USER_COLUMNS: &str = r#"
    id, name, email, phone, photo, role, password_hash, password_changed_at,
    shipping_address, billing_address, email_verified,
    email_verification_digest, email_verification_expires_at,
    password_reset_digest, password_reset_expires_at,
    refresh_tokens, mfa_enabled, mfa_secret, active, version, created_at, updated_at
"#;

/// Create a PostgreSQL connection pool
pub async fn get_postgres_pool(url: &str) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new().max_connections(5).connect(url).await
}

/// Connects to PostgreSQL and brings the schema up to date.
pub async fn configure_postgresql(url: &Secret<String>) -> Result<PgPool, sqlx::Error> {
    let pg_pool = get_postgres_pool(url.expose_secret()).await?;

    sqlx::migrate!("../../migrations").run(&pg_pool).await?;

    Ok(pg_pool)
}

pub struct PostgresUserStore {
    pool: PgPool,
}

impl PostgresUserStore {
    pub fn new(pool: PgPool) -> Self {
        PostgresUserStore { pool }
    }

    async fn fetch_one_where<T>(&self, condition: &str, value: T) -> Result<User, UserStoreError>
    where
        T: for<'q> sqlx::Encode<'q, Postgres> + sqlx::Type<Postgres> + Send + 'static,
    {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE {condition}");
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(value)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| UserStoreError::UnexpectedError(e.to_string()))?;

        let Some(row) = row else {
            return Err(UserStoreError::UserNotFound);
        };

        User::try_from(row)
    }
}

#[async_trait::async_trait]
impl UserStore for PostgresUserStore {
    #[tracing::instrument(name = "Adding user to PostgreSQL", skip_all)]
    async fn add_user(&self, user: User) -> Result<User, UserStoreError> {
        let sql = format!(
            r#"
                INSERT INTO users ({USER_COLUMNS})
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11,
                        $12, $13, $14, $15, $16, $17, $18, $19, $20, $21, $22)
                RETURNING {USER_COLUMNS}
            "#
        );
        let record = user.to_record();

        let row = bind_record(
            sqlx::query_as::<_, UserRow>(&sql).bind(*record.id.as_uuid()),
            &record,
        )
        .bind(record.version)
        .bind(record.created_at)
        .bind(record.updated_at)
        .fetch_one(&self.pool)
        .await
        .map_err(map_write_error)?;

        User::try_from(row)
    }

    #[tracing::instrument(name = "Retrieving user from PostgreSQL", skip(self))]
    async fn get_user(&self, id: &UserId, visibility: Visibility) -> Result<User, UserStoreError> {
        let condition = match visibility {
            Visibility::Active => "id = $1 AND active",
            Visibility::All => "id = $1",
        };
        self.fetch_one_where(condition, *id.as_uuid()).await
    }

    #[tracing::instrument(name = "Retrieving user by email from PostgreSQL", skip_all)]
    async fn find_by_email(&self, email: &Email) -> Result<User, UserStoreError> {
        let email = email.as_ref().expose_secret().clone();
        self.fetch_one_where("email = $1 AND active", email).await
    }

    #[tracing::instrument(name = "Retrieving user by phone from PostgreSQL", skip_all)]
    async fn find_by_phone(&self, phone: &Phone) -> Result<User, UserStoreError> {
        let phone = phone.as_str().to_string();
        self.fetch_one_where("phone = $1 AND active", phone).await
    }

    #[tracing::instrument(name = "Retrieving user by reset token from PostgreSQL", skip_all)]
    async fn find_by_password_reset_token(
        &self,
        digest: &TokenDigest,
    ) -> Result<User, UserStoreError> {
        let digest = digest.as_str().to_string();
        self.fetch_one_where("password_reset_digest = $1 AND active", digest)
            .await
    }

    #[tracing::instrument(name = "Updating user in PostgreSQL", skip_all)]
    async fn update_user(&self, user: &User) -> Result<User, UserStoreError> {
        let sql = format!(
            r#"
                UPDATE users
                SET name = $2, email = $3, phone = $4, photo = $5, role = $6,
                    password_hash = $7, password_changed_at = $8,
                    shipping_address = $9, billing_address = $10, email_verified = $11,
                    email_verification_digest = $12, email_verification_expires_at = $13,
                    password_reset_digest = $14, password_reset_expires_at = $15,
                    refresh_tokens = $16, mfa_enabled = $17, mfa_secret = $18, active = $19,
                    version = version + 1, updated_at = $21
                WHERE id = $1 AND version = $20
                RETURNING {USER_COLUMNS}
            "#
        );
        let record = user.to_record();

        let row = bind_record(
            sqlx::query_as::<_, UserRow>(&sql).bind(*record.id.as_uuid()),
            &record,
        )
        .bind(record.version)
        .bind(record.updated_at)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_write_error)?;

        match row {
            Some(row) => User::try_from(row),
            None => {
                let exists: bool = sqlx::query_scalar::<_, bool>(EXISTS_BY_ID)
                    .bind(*record.id.as_uuid())
                    .fetch_one(&self.pool)
                    .await
                    .map_err(|e| UserStoreError::UnexpectedError(e.to_string()))?;
                if exists {
                    tracing::debug!(user_id = %record.id, "Stale version rejected");
                    Err(UserStoreError::Conflict)
                } else {
                    Err(UserStoreError::UserNotFound)
                }
            }
        }
    }
}

type UserQuery<'q> = QueryAs<'q, Postgres, UserRow, PgArguments>;

/// Binds the columns `$2` to `$19` shared by insert and update.
fn bind_record<'q>(query: UserQuery<'q>, record: &UserRecord) -> UserQuery<'q> {
    let (verification_digest, verification_expires_at) = split_pending(&record.email_verification);
    let (reset_digest, reset_expires_at) = split_pending(&record.password_reset);
    let refresh_tokens: Vec<String> = record.refresh_tokens.iter().map(str::to_string).collect();

    query
        .bind(record.name.as_str().to_string())
        .bind(record.email.as_ref().expose_secret().clone())
        .bind(record.phone.as_str().to_string())
        .bind(record.photo.clone())
        .bind(record.role.as_str())
        .bind(record.password_hash.as_ref().expose_secret().clone())
        .bind(record.password_changed_at)
        .bind(record.shipping_address.clone().map(Json))
        .bind(record.billing_address.clone().map(Json))
        .bind(record.email_verified)
        .bind(verification_digest)
        .bind(verification_expires_at)
        .bind(reset_digest)
        .bind(reset_expires_at)
        .bind(refresh_tokens)
        .bind(record.mfa_enabled)
        .bind(
            record
                .mfa_secret
                .as_ref()
                .map(|secret| secret.expose_secret().clone()),
        )
        .bind(record.active)
}

fn split_pending(pending: &Option<PendingToken>) -> (Option<String>, Option<DateTime<Utc>>) {
    match pending {
        Some(pending) => (
            Some(pending.digest.as_str().to_string()),
            Some(pending.expires_at),
        ),
        None => (None, None),
    }
}

fn join_pending(digest: Option<String>, expires_at: Option<DateTime<Utc>>) -> Option<PendingToken> {
    match (digest, expires_at) {
        (Some(digest), Some(expires_at)) => Some(PendingToken {
            digest: TokenDigest::from_stored(digest),
            expires_at,
        }),
        _ => None,
    }
}

fn map_write_error(e: sqlx::Error) -> UserStoreError {
    if let Some(db_err) = e.as_database_error() {
        match db_err.constraint() {
            Some(EMAIL_CONSTRAINT) => return UserStoreError::DuplicateEmail,
            Some(PHONE_CONSTRAINT) => return UserStoreError::DuplicatePhone,
            _ => {}
        }
    }
    UserStoreError::UnexpectedError(e.to_string())
}

#[derive(sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    name: String,
    email: String,
    phone: String,
    photo: String,
    role: String,
    password_hash: String,
    password_changed_at: DateTime<Utc>,
    shipping_address: Option<Json<Address>>,
    billing_address: Option<Json<Address>>,
    email_verified: bool,
    email_verification_digest: Option<String>,
    email_verification_expires_at: Option<DateTime<Utc>>,
    password_reset_digest: Option<String>,
    password_reset_expires_at: Option<DateTime<Utc>>,
    refresh_tokens: Vec<String>,
    mfa_enabled: bool,
    mfa_secret: Option<String>,
    active: bool,
    version: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = UserStoreError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let corrupt = |e: accounts_core::UserError| UserStoreError::UnexpectedError(e.to_string());

        Ok(User::from(UserRecord {
            id: UserId::from(row.id),
            name: UserName::parse(&row.name).map_err(corrupt)?,
            email: Email::try_from(Secret::new(row.email)).map_err(corrupt)?,
            phone: Phone::parse(&row.phone).map_err(corrupt)?,
            photo: row.photo,
            role: row.role.parse().map_err(corrupt)?,
            password_hash: PasswordHash::new(Secret::new(row.password_hash)),
            password_changed_at: row.password_changed_at,
            shipping_address: row.shipping_address.map(|Json(address)| address),
            billing_address: row.billing_address.map(|Json(address)| address),
            email_verified: row.email_verified,
            email_verification: join_pending(
                row.email_verification_digest,
                row.email_verification_expires_at,
            ),
            password_reset: join_pending(row.password_reset_digest, row.password_reset_expires_at),
            refresh_tokens: RefreshTokenSet::from_stored(row.refresh_tokens),
            mfa_enabled: row.mfa_enabled,
            mfa_secret: row.mfa_secret.map(Secret::new),
            active: row.active,
            version: row.version,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }))
    }
}
