use crate::config::DatabaseSettings;
use crate::core::MatchPair;
use crate::models::{Match, MatchFilter, MatchWithPets, NewPet, Pet, PetChanges, User};
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Row};
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur when interacting with PostgreSQL
#[derive(Debug, Error)]
pub enum PostgresError {
    #[error("SQLx error: {0}")]
    SqlxError(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    MigrateError(#[from] sqlx::migrate::MigrateError),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Conflict: {0}")]
    Conflict(String),
}

const USER_COLUMNS: &str = "id, auth0_id, name, email, created_at";
const PET_COLUMNS: &str = "id, name, age, breed, gender, image, owner_id, created_at";

/// PostgreSQL client owning users, pets and matches
pub struct PostgresClient {
    pool: PgPool,
}

impl PostgresClient {
    /// Connect, then run the embedded migrations
    pub async fn new(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
        acquire_timeout: Duration,
        idle_timeout: Duration,
    ) -> Result<Self, PostgresError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(acquire_timeout)
            .idle_timeout(idle_timeout)
            .test_before_acquire(true)
            .connect(database_url)
            .await?;

        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok(Self { pool })
    }

    /// Create a new PostgreSQL client from settings
    pub async fn from_settings(settings: &DatabaseSettings) -> Result<Self, PostgresError> {
        tracing::info!(
            "Connecting to PostgreSQL (max: {} connections)",
            settings.max_connections.unwrap_or(10)
        );

        Self::new(
            &settings.url,
            settings.max_connections.unwrap_or(10),
            settings.min_connections.unwrap_or(1),
            Duration::from_secs(settings.acquire_timeout_secs.unwrap_or(5)),
            Duration::from_secs(settings.idle_timeout_secs.unwrap_or(600)),
        )
        .await
    }

    /// Build a client whose pool connects on first use; migrations are not run
    pub fn connect_lazy(database_url: &str) -> Result<Self, PostgresError> {
        let pool = PgPoolOptions::new()
            .acquire_timeout(Duration::from_secs(2))
            .connect_lazy(database_url)?;
        Ok(Self { pool })
    }

    // ---- users -------------------------------------------------------------

    pub async fn list_users(&self) -> Result<Vec<User>, PostgresError> {
        let query = format!("SELECT {} FROM users ORDER BY id", USER_COLUMNS);
        let users = sqlx::query_as::<_, User>(&query)
            .fetch_all(&self.pool)
            .await?;
        Ok(users)
    }

    pub async fn get_user(&self, user_id: i32) -> Result<Option<User>, PostgresError> {
        let query = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);
        let user = sqlx::query_as::<_, User>(&query)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    pub async fn find_user_by_auth0_id(
        &self,
        auth0_id: &str,
    ) -> Result<Option<User>, PostgresError> {
        let query = format!("SELECT {} FROM users WHERE auth0_id = $1", USER_COLUMNS);
        let user = sqlx::query_as::<_, User>(&query)
            .bind(auth0_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    /// Return the user for `auth0_id`, creating it if absent
    ///
    /// The boolean is `true` when the row was created by this call. Concurrent
    /// first logins race on the unique `auth0_id` and both see the same row.
    pub async fn find_or_create_user(
        &self,
        auth0_id: &str,
        email: Option<&str>,
        name: Option<&str>,
    ) -> Result<(User, bool), PostgresError> {
        let query = format!(
            r#"
            INSERT INTO users (auth0_id, email, name)
            VALUES ($1, $2, $3)
            ON CONFLICT (auth0_id) DO NOTHING
            RETURNING {}
            "#,
            USER_COLUMNS
        );

        let created = sqlx::query_as::<_, User>(&query)
            .bind(auth0_id)
            .bind(email)
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;

        if let Some(user) = created {
            tracing::info!("Registered user {} ({})", user.id, auth0_id);
            return Ok((user, true));
        }

        let existing = self
            .find_user_by_auth0_id(auth0_id)
            .await?
            .ok_or_else(|| PostgresError::NotFound(format!("User {}", auth0_id)))?;
        Ok((existing, false))
    }

    /// Insert or update the user keyed by `auth0_id`
    ///
    /// `None` fields keep their stored value on update.
    pub async fn upsert_user(
        &self,
        auth0_id: &str,
        email: Option<&str>,
        name: Option<&str>,
    ) -> Result<User, PostgresError> {
        let query = format!(
            r#"
            INSERT INTO users (auth0_id, email, name)
            VALUES ($1, $2, $3)
            ON CONFLICT (auth0_id)
            DO UPDATE SET
                email = COALESCE(EXCLUDED.email, users.email),
                name = COALESCE(EXCLUDED.name, users.name)
            RETURNING {}
            "#,
            USER_COLUMNS
        );

        let user = sqlx::query_as::<_, User>(&query)
            .bind(auth0_id)
            .bind(email)
            .bind(name)
            .fetch_one(&self.pool)
            .await?;

        Ok(user)
    }

    /// Delete a user; their pets and those pets' matches cascade
    pub async fn delete_user(&self, user_id: i32) -> Result<bool, PostgresError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    // ---- pets --------------------------------------------------------------

    pub async fn list_pets(&self) -> Result<Vec<Pet>, PostgresError> {
        let query = format!("SELECT {} FROM pets ORDER BY id", PET_COLUMNS);
        let pets = sqlx::query_as::<_, Pet>(&query)
            .fetch_all(&self.pool)
            .await?;
        Ok(pets)
    }

    /// Most recently created pets, newest first
    pub async fn latest_pets(&self, limit: i64) -> Result<Vec<Pet>, PostgresError> {
        let query = format!(
            "SELECT {} FROM pets ORDER BY created_at DESC, id DESC LIMIT $1",
            PET_COLUMNS
        );
        let pets = sqlx::query_as::<_, Pet>(&query)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;
        Ok(pets)
    }

    pub async fn get_pet(&self, pet_id: i32) -> Result<Option<Pet>, PostgresError> {
        let query = format!("SELECT {} FROM pets WHERE id = $1", PET_COLUMNS);
        let pet = sqlx::query_as::<_, Pet>(&query)
            .bind(pet_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(pet)
    }

    pub async fn pets_for_owner(&self, owner_id: i32) -> Result<Vec<Pet>, PostgresError> {
        let query = format!("SELECT {} FROM pets WHERE owner_id = $1 ORDER BY id", PET_COLUMNS);
        let pets = sqlx::query_as::<_, Pet>(&query)
            .bind(owner_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(pets)
    }

    pub async fn create_pet(&self, pet: &NewPet) -> Result<Pet, PostgresError> {
        let query = format!(
            r#"
            INSERT INTO pets (name, age, breed, gender, image, owner_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {}
            "#,
            PET_COLUMNS
        );

        let created = sqlx::query_as::<_, Pet>(&query)
            .bind(&pet.name)
            .bind(pet.age)
            .bind(&pet.breed)
            .bind(&pet.gender)
            .bind(&pet.image)
            .bind(pet.owner_id)
            .fetch_one(&self.pool)
            .await?;

        tracing::debug!("Created pet {} for owner {}", created.id, created.owner_id);

        Ok(created)
    }

    /// Apply a partial update; `None` when the pet does not exist
    pub async fn update_pet(
        &self,
        pet_id: i32,
        changes: &PetChanges,
    ) -> Result<Option<Pet>, PostgresError> {
        let query = format!(
            r#"
            UPDATE pets SET
                name = COALESCE($2, name),
                age = COALESCE($3, age),
                breed = COALESCE($4, breed),
                gender = COALESCE($5, gender),
                image = COALESCE($6, image)
            WHERE id = $1
            RETURNING {}
            "#,
            PET_COLUMNS
        );

        let pet = sqlx::query_as::<_, Pet>(&query)
            .bind(pet_id)
            .bind(changes.name.as_deref())
            .bind(changes.age)
            .bind(changes.breed.as_deref())
            .bind(changes.gender.as_deref())
            .bind(changes.image.as_deref())
            .fetch_optional(&self.pool)
            .await?;

        Ok(pet)
    }

    /// Delete a pet; matches referencing it cascade
    pub async fn delete_pet(&self, pet_id: i32) -> Result<bool, PostgresError> {
        let result = sqlx::query("DELETE FROM pets WHERE id = $1")
            .bind(pet_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    // ---- matches -----------------------------------------------------------

    /// Matches with both pets joined in, newest first
    pub async fn list_matches(
        &self,
        filter: MatchFilter,
    ) -> Result<Vec<MatchWithPets>, PostgresError> {
        let query = r#"
            SELECT
                m.id, m.pet1_id, m.pet2_id, m.created_at,
                p1.name AS p1_name, p1.age AS p1_age, p1.breed AS p1_breed,
                p1.gender AS p1_gender, p1.image AS p1_image,
                p1.owner_id AS p1_owner_id, p1.created_at AS p1_created_at,
                p2.name AS p2_name, p2.age AS p2_age, p2.breed AS p2_breed,
                p2.gender AS p2_gender, p2.image AS p2_image,
                p2.owner_id AS p2_owner_id, p2.created_at AS p2_created_at
            FROM matches m
            JOIN pets p1 ON p1.id = m.pet1_id
            JOIN pets p2 ON p2.id = m.pet2_id
            WHERE ($1::int IS NULL OR m.pet1_id = $1 OR m.pet2_id = $1)
              AND ($2::int IS NULL OR p1.owner_id = $2 OR p2.owner_id = $2)
            ORDER BY m.created_at DESC, m.id DESC
        "#;

        let rows = sqlx::query(query)
            .bind(filter.pet_id)
            .bind(filter.owner_id)
            .fetch_all(&self.pool)
            .await?;

        let matches: Result<Vec<MatchWithPets>, sqlx::Error> =
            rows.iter().map(match_with_pets_from_row).collect();

        Ok(matches?)
    }

    pub async fn get_match(&self, match_id: i32) -> Result<Option<Match>, PostgresError> {
        let m = sqlx::query_as::<_, Match>(
            "SELECT id, pet1_id, pet2_id, created_at FROM matches WHERE id = $1",
        )
        .bind(match_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(m)
    }

    /// Owners of the two pets in a match, `(pet1 owner, pet2 owner)`
    pub async fn match_owners(&self, match_id: i32) -> Result<Option<(i32, i32)>, PostgresError> {
        let query = r#"
            SELECT p1.owner_id AS owner1, p2.owner_id AS owner2
            FROM matches m
            JOIN pets p1 ON p1.id = m.pet1_id
            JOIN pets p2 ON p2.id = m.pet2_id
            WHERE m.id = $1
        "#;

        let row = sqlx::query(query)
            .bind(match_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|r| (r.get("owner1"), r.get("owner2"))))
    }

    /// Create a match for `pair` on behalf of `requester_id`
    ///
    /// Runs in one transaction: both pets are share-locked so neither can be
    /// deleted underneath the insert, `pet1` must belong to the requester,
    /// and the insert itself is the duplicate check through the
    /// unordered-pair unique index.
    pub async fn create_match(
        &self,
        pair: MatchPair,
        requester_id: i32,
    ) -> Result<Match, PostgresError> {
        let mut tx = self.pool.begin().await?;

        let rows = sqlx::query("SELECT id, owner_id FROM pets WHERE id = ANY($1) FOR SHARE")
            .bind(vec![pair.pet1_id(), pair.pet2_id()])
            .fetch_all(&mut *tx)
            .await?;

        let owner_of = |pet_id: i32| {
            rows.iter()
                .find(|r| r.get::<i32, _>("id") == pet_id)
                .map(|r| r.get::<i32, _>("owner_id"))
        };

        let pet1_owner = owner_of(pair.pet1_id())
            .ok_or_else(|| PostgresError::NotFound(format!("Pet {}", pair.pet1_id())))?;
        if owner_of(pair.pet2_id()).is_none() {
            return Err(PostgresError::NotFound(format!("Pet {}", pair.pet2_id())));
        }
        if pet1_owner != requester_id {
            return Err(PostgresError::Forbidden(format!(
                "Pet {} does not belong to the requesting user",
                pair.pet1_id()
            )));
        }

        let query = r#"
            INSERT INTO matches (pet1_id, pet2_id)
            VALUES ($1, $2)
            ON CONFLICT ((LEAST(pet1_id, pet2_id)), (GREATEST(pet1_id, pet2_id)))
            DO NOTHING
            RETURNING id, pet1_id, pet2_id, created_at
        "#;

        let created = sqlx::query_as::<_, Match>(query)
            .bind(pair.pet1_id())
            .bind(pair.pet2_id())
            .fetch_optional(&mut *tx)
            .await?;

        let Some(created) = created else {
            let (a, b) = pair.key();
            return Err(PostgresError::Conflict(format!(
                "Pets {} and {} are already matched",
                a, b
            )));
        };

        tx.commit().await?;

        tracing::info!(
            "Created match {}: pet {} <-> pet {}",
            created.id,
            created.pet1_id,
            created.pet2_id
        );

        Ok(created)
    }

    pub async fn delete_match(&self, match_id: i32) -> Result<bool, PostgresError> {
        let result = sqlx::query("DELETE FROM matches WHERE id = $1")
            .bind(match_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Health check for the database connection
    pub async fn health_check(&self) -> Result<bool, PostgresError> {
        sqlx::query("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map(|_| true)
            .map_err(Into::into)
    }
}

fn match_with_pets_from_row(row: &PgRow) -> Result<MatchWithPets, sqlx::Error> {
    let pairing = Match {
        id: row.try_get("id")?,
        pet1_id: row.try_get("pet1_id")?,
        pet2_id: row.try_get("pet2_id")?,
        created_at: row.try_get("created_at")?,
    };

    let pet = |prefix: &str, id: i32| -> Result<Pet, sqlx::Error> {
        Ok(Pet {
            id,
            name: row.try_get(format!("{}_name", prefix).as_str())?,
            age: row.try_get(format!("{}_age", prefix).as_str())?,
            breed: row.try_get(format!("{}_breed", prefix).as_str())?,
            gender: row.try_get(format!("{}_gender", prefix).as_str())?,
            image: row.try_get(format!("{}_image", prefix).as_str())?,
            owner_id: row.try_get(format!("{}_owner_id", prefix).as_str())?,
            created_at: row.try_get(format!("{}_created_at", prefix).as_str())?,
        })
    };

    Ok(MatchWithPets {
        pet1: pet("p1", pairing.pet1_id)?,
        pet2: pet("p2", pairing.pet2_id)?,
        pairing,
    })
}
