//! SQLite-backed clinic store.
//!
//! Reads assemble whole aggregates with one query per table (owners, pets,
//! visits) and stitch them together in memory; nothing is loaded lazily.
//!
//! Every save runs inside one transaction. Generated ids are assigned to a
//! staged copy of the caller's aggregate and copied back only after commit, so
//! a failed save leaves both the database and the caller's value unchanged.

use std::collections::HashMap;
use std::str::FromStr;

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::sqlite::{SqliteConnectOptions, SqliteConnection, SqlitePoolOptions, SqliteRow};
use sqlx::{FromRow, Row, SqlitePool};
use tracing::{debug, info, instrument};

use petclinic_core::{DomainError, OwnerId, PetId, PetTypeId, SpecialtyId, VetId, VisitId};
use petclinic_model::{Owner, OwnerRef, Person, Pet, PetType, Specialty, Vet, Visit};

use super::r#trait::{
    OwnerRepository, PetRepository, RepositoryError, RepositoryResult, VetRepository,
    VisitRepository, check_pet_references, like_prefix,
};
use crate::config::DatabaseConfig;
use crate::seed::SeedData;

const SCHEMA: &str = include_str!("../../sql/schema.sql");

/// Owners matching an optional last-name pattern (`?1`) and optional id (`?2`).
const OWNER_FILTER: &str = r"(?1 IS NULL OR o.last_name LIKE ?1 ESCAPE '\') AND (?2 IS NULL OR o.id = ?2)";

/// SQLite clinic store.
///
/// `SqlitePool` is `Send + Sync` and cheap to clone. The pool size comes from
/// `DatabaseConfig::max_connections`. sqlx opens `sqlite::memory:` as a
/// shared-cache database, so every pooled connection sees the same data; the
/// pool keeps at least one connection open and never expires it, which keeps
/// that database alive for the lifetime of the store.
#[derive(Debug, Clone)]
pub struct SqliteClinicStore {
    pool: SqlitePool,
}

impl SqliteClinicStore {
    /// Open the database described by `config` and apply the schema.
    #[instrument(skip(config), fields(url = %config.url), err)]
    pub async fn connect(config: &DatabaseConfig) -> RepositoryResult<Self> {
        let options = SqliteConnectOptions::from_str(&config.url)
            .map_err(|e| RepositoryError::database("parse_url", e))?
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await
            .map_err(|e| RepositoryError::database("connect", e))?;

        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }

    /// Wrap an existing pool. The schema must already be applied.
    pub fn from_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn migrate(&self) -> RepositoryResult<()> {
        sqlx::raw_sql(SCHEMA)
            .execute(&self.pool)
            .await
            .map_err(|e| RepositoryError::Migration(e.to_string()))?;
        debug!("schema applied");
        Ok(())
    }

    /// Insert `data` with its ids. Rows that already exist are left alone.
    #[instrument(skip(self, data), err)]
    pub async fn seed(&self, data: &SeedData) -> RepositoryResult<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| RepositoryError::database("begin_transaction", e))?;

        for t in &data.pet_types {
            sqlx::query("INSERT OR IGNORE INTO types (id, name) VALUES (?1, ?2)")
                .bind(t.id.map(PetTypeId::get))
                .bind(t.name.as_str())
                .execute(&mut *tx)
                .await
                .map_err(|e| RepositoryError::database("seed_types", e))?;
        }

        for s in &data.specialties {
            sqlx::query("INSERT OR IGNORE INTO specialties (id, name) VALUES (?1, ?2)")
                .bind(s.id.map(SpecialtyId::get))
                .bind(s.name.as_str())
                .execute(&mut *tx)
                .await
                .map_err(|e| RepositoryError::database("seed_specialties", e))?;
        }

        for vet in &data.vets {
            let Some(vet_id) = vet.id else { continue };
            sqlx::query("INSERT OR IGNORE INTO vets (id, first_name, last_name) VALUES (?1, ?2, ?3)")
                .bind(vet_id.get())
                .bind(vet.first_name())
                .bind(vet.last_name())
                .execute(&mut *tx)
                .await
                .map_err(|e| RepositoryError::database("seed_vets", e))?;

            for s in vet.specialties() {
                sqlx::query(
                    "INSERT OR IGNORE INTO vet_specialties (vet_id, specialty_id) VALUES (?1, ?2)",
                )
                .bind(vet_id.get())
                .bind(s.id.map(SpecialtyId::get))
                .execute(&mut *tx)
                .await
                .map_err(|e| RepositoryError::database("seed_vet_specialties", e))?;
            }
        }

        for owner in &data.owners {
            sqlx::query(
                r#"
                INSERT OR IGNORE INTO owners (id, first_name, last_name, address, city, telephone)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                "#,
            )
            .bind(owner.id.map(OwnerId::get))
            .bind(owner.first_name())
            .bind(owner.last_name())
            .bind(owner.address.as_str())
            .bind(owner.city.as_str())
            .bind(owner.telephone.as_str())
            .execute(&mut *tx)
            .await
            .map_err(|e| RepositoryError::database("seed_owners", e))?;

            for pet in &owner.pets {
                sqlx::query(
                    r#"
                    INSERT OR IGNORE INTO pets (id, name, birth_date, type_id, owner_id)
                    VALUES (?1, ?2, ?3, ?4, ?5)
                    "#,
                )
                .bind(pet.id.map(PetId::get))
                .bind(pet.name.as_str())
                .bind(pet.birth_date)
                .bind(pet.pet_type.as_ref().and_then(|t| t.id).map(PetTypeId::get))
                .bind(owner.id.map(OwnerId::get))
                .execute(&mut *tx)
                .await
                .map_err(|e| RepositoryError::database("seed_pets", e))?;

                for visit in &pet.visits {
                    sqlx::query(
                        r#"
                        INSERT OR IGNORE INTO visits (id, pet_id, visit_date, description)
                        VALUES (?1, ?2, ?3, ?4)
                        "#,
                    )
                    .bind(visit.id.map(VisitId::get))
                    .bind(pet.id.map(PetId::get))
                    .bind(visit.date)
                    .bind(visit.description.as_str())
                    .execute(&mut *tx)
                    .await
                    .map_err(|e| RepositoryError::database("seed_visits", e))?;
                }
            }
        }

        tx.commit()
            .await
            .map_err(|e| RepositoryError::database("commit_transaction", e))?;

        info!(owners = data.owners.len(), vets = data.vets.len(), "seed data loaded");
        Ok(())
    }

    /// Owners matching the filter, fully assembled, ordered by id.
    async fn load_owners(
        &self,
        last_name: Option<String>,
        id: Option<OwnerId>,
    ) -> RepositoryResult<Vec<Owner>> {
        let id = id.map(OwnerId::get);

        let owners: Vec<OwnerRecord> = sqlx::query_as(&format!(
            r#"
            SELECT o.id, o.first_name, o.last_name, o.address, o.city, o.telephone
            FROM owners o
            WHERE {OWNER_FILTER}
            ORDER BY o.id
            "#
        ))
        .bind(last_name.as_deref())
        .bind(id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RepositoryError::database("load_owners", e))?;

        if owners.is_empty() {
            return Ok(Vec::new());
        }

        let pets: Vec<PetRecord> = sqlx::query_as(&format!(
            r#"
            SELECT p.id, p.name, p.birth_date, p.owner_id, t.id AS type_id, t.name AS type_name
            FROM pets p
            JOIN types t ON t.id = p.type_id
            JOIN owners o ON o.id = p.owner_id
            WHERE {OWNER_FILTER}
            ORDER BY p.id
            "#
        ))
        .bind(last_name.as_deref())
        .bind(id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RepositoryError::database("load_owner_pets", e))?;

        let visits: Vec<VisitRecord> = sqlx::query_as(&format!(
            r#"
            SELECT v.id, v.pet_id, v.visit_date, v.description
            FROM visits v
            JOIN pets p ON p.id = v.pet_id
            JOIN owners o ON o.id = p.owner_id
            WHERE {OWNER_FILTER}
            ORDER BY v.id
            "#
        ))
        .bind(last_name.as_deref())
        .bind(id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RepositoryError::database("load_owner_visits", e))?;

        Ok(assemble_owners(owners, pets, visits))
    }

    async fn load_visits(&self, pet_id: PetId) -> RepositoryResult<Vec<Visit>> {
        let rows: Vec<VisitRecord> = sqlx::query_as(
            r#"
            SELECT v.id, v.pet_id, v.visit_date, v.description
            FROM visits v
            WHERE v.pet_id = ?1
            ORDER BY v.id
            "#,
        )
        .bind(pet_id.get())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RepositoryError::database("load_visits", e))?;

        Ok(rows.into_iter().map(VisitRecord::into_visit).collect())
    }
}

#[async_trait]
impl OwnerRepository for SqliteClinicStore {
    #[instrument(skip(self), err)]
    async fn find_by_last_name(&self, last_name: &str) -> RepositoryResult<Vec<Owner>> {
        let owners = self.load_owners(Some(like_prefix(last_name)), None).await?;
        debug!(count = owners.len(), "owners found");
        Ok(owners)
    }

    #[instrument(skip(self), err)]
    async fn find_by_id(&self, id: OwnerId) -> RepositoryResult<Option<Owner>> {
        Ok(self.load_owners(None, Some(id)).await?.into_iter().next())
    }

    #[instrument(skip(self, owner), fields(owner_id = ?owner.id), err)]
    async fn save(&self, owner: &mut Owner) -> RepositoryResult<()> {
        let mut staged = owner.clone();
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| RepositoryError::database("begin_transaction", e))?;

        upsert_owner(&mut *tx, &mut staged).await?;

        tx.commit()
            .await
            .map_err(|e| RepositoryError::database("commit_transaction", e))?;
        *owner = staged;
        Ok(())
    }
}

#[async_trait]
impl PetRepository for SqliteClinicStore {
    async fn find_pet_types(&self) -> RepositoryResult<Vec<PetType>> {
        let rows = sqlx::query("SELECT id, name FROM types ORDER BY id")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| RepositoryError::database("find_pet_types", e))?;

        rows.iter()
            .map(|row| {
                let id: i64 = row.try_get("id").map_err(corrupt)?;
                let name: String = row.try_get("name").map_err(corrupt)?;
                Ok(PetType::new(PetTypeId::new(id), name))
            })
            .collect()
    }

    #[instrument(skip(self), err)]
    async fn find_by_id(&self, id: PetId) -> RepositoryResult<Option<Pet>> {
        let record: Option<PetRecord> = sqlx::query_as(
            r#"
            SELECT p.id, p.name, p.birth_date, p.owner_id, t.id AS type_id, t.name AS type_name
            FROM pets p
            JOIN types t ON t.id = p.type_id
            WHERE p.id = ?1
            "#,
        )
        .bind(id.get())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| RepositoryError::database("find_pet", e))?;

        let Some(record) = record else {
            return Ok(None);
        };

        let owner: Option<OwnerRecord> = sqlx::query_as(
            r#"
            SELECT o.id, o.first_name, o.last_name, o.address, o.city, o.telephone
            FROM owners o
            WHERE o.id = ?1
            "#,
        )
        .bind(record.owner_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| RepositoryError::database("find_pet_owner", e))?;

        let visits = self.load_visits(id).await?;
        Ok(Some(record.into_pet(owner.map(OwnerRecord::into_ref), visits)))
    }

    #[instrument(skip(self, pet), fields(pet_id = ?pet.id), err)]
    async fn save(&self, pet: &mut Pet) -> RepositoryResult<()> {
        let mut staged = pet.clone();
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| RepositoryError::database("begin_transaction", e))?;

        upsert_pet(&mut *tx, &mut staged).await?;

        tx.commit()
            .await
            .map_err(|e| RepositoryError::database("commit_transaction", e))?;
        *pet = staged;
        Ok(())
    }
}

#[async_trait]
impl VisitRepository for SqliteClinicStore {
    #[instrument(skip(self, visit), fields(pet_id = ?visit.pet_id), err)]
    async fn save(&self, visit: &mut Visit) -> RepositoryResult<()> {
        let mut staged = visit.clone();
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| RepositoryError::database("begin_transaction", e))?;

        upsert_visit(&mut *tx, &mut staged).await?;

        tx.commit()
            .await
            .map_err(|e| RepositoryError::database("commit_transaction", e))?;
        *visit = staged;
        Ok(())
    }

    async fn find_by_pet_id(&self, pet_id: PetId) -> RepositoryResult<Vec<Visit>> {
        let mut pet = Pet {
            visits: self.load_visits(pet_id).await?,
            ..Pet::default()
        };
        pet.sort_visits();
        Ok(pet.visits)
    }
}

#[async_trait]
impl VetRepository for SqliteClinicStore {
    #[instrument(skip(self), err)]
    async fn find_all(&self) -> RepositoryResult<Vec<Vet>> {
        let rows = sqlx::query(
            r#"
            SELECT v.id, v.first_name, v.last_name, s.id AS specialty_id, s.name AS specialty_name
            FROM vets v
            LEFT JOIN vet_specialties vs ON vs.vet_id = v.id
            LEFT JOIN specialties s ON s.id = vs.specialty_id
            ORDER BY v.id, s.name
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RepositoryError::database("find_vets", e))?;

        let mut vets: Vec<Vet> = Vec::new();
        for row in &rows {
            let id: i64 = row.try_get("id").map_err(corrupt)?;
            if vets.last().and_then(|v| v.id) != Some(VetId::new(id)) {
                let mut vet = Vet::new(Person::new(
                    row.try_get::<String, _>("first_name").map_err(corrupt)?,
                    row.try_get::<String, _>("last_name").map_err(corrupt)?,
                ));
                vet.id = Some(VetId::new(id));
                vets.push(vet);
            }

            let specialty_id: Option<i64> = row.try_get("specialty_id").map_err(corrupt)?;
            let specialty_name: Option<String> = row.try_get("specialty_name").map_err(corrupt)?;
            if let (Some(sid), Some(name), Some(vet)) = (specialty_id, specialty_name, vets.last_mut()) {
                vet.add_specialty(Specialty::new(SpecialtyId::new(sid), name));
            }
        }
        Ok(vets)
    }
}

async fn upsert_owner(conn: &mut SqliteConnection, owner: &mut Owner) -> RepositoryResult<()> {
    match owner.id {
        Some(id) => {
            let result = sqlx::query(
                r#"
                UPDATE owners
                SET first_name = ?1, last_name = ?2, address = ?3, city = ?4, telephone = ?5
                WHERE id = ?6
                "#,
            )
            .bind(owner.first_name())
            .bind(owner.last_name())
            .bind(owner.address.as_str())
            .bind(owner.city.as_str())
            .bind(owner.telephone.as_str())
            .bind(id.get())
            .execute(&mut *conn)
            .await
            .map_err(|e| RepositoryError::database("update_owner", e))?;

            if result.rows_affected() == 0 {
                return Err(DomainError::not_found("owner", id).into());
            }
        }
        None => {
            let result = sqlx::query(
                r#"
                INSERT INTO owners (first_name, last_name, address, city, telephone)
                VALUES (?1, ?2, ?3, ?4, ?5)
                "#,
            )
            .bind(owner.first_name())
            .bind(owner.last_name())
            .bind(owner.address.as_str())
            .bind(owner.city.as_str())
            .bind(owner.telephone.as_str())
            .execute(&mut *conn)
            .await
            .map_err(|e| RepositoryError::database("insert_owner", e))?;

            owner.id = Some(OwnerId::new(result.last_insert_rowid()));
        }
    }

    owner.relink_pets();
    for pet in &mut owner.pets {
        upsert_pet(&mut *conn, pet).await?;
    }
    Ok(())
}

async fn upsert_pet(conn: &mut SqliteConnection, pet: &mut Pet) -> RepositoryResult<()> {
    check_pet_references(pet)?;
    let (Some(owner_id), Some(type_id)) = (
        pet.owner.as_ref().map(|o| o.id.get()),
        pet.pet_type.as_ref().and_then(|t| t.id).map(PetTypeId::get),
    ) else {
        return Err(DomainError::invariant("pet references are incomplete").into());
    };
    ensure_exists(&mut *conn, "owners", "owner", owner_id).await?;
    ensure_exists(&mut *conn, "types", "pet type", type_id).await?;

    let id = match pet.id {
        Some(id) => {
            let result = sqlx::query(
                r#"
                UPDATE pets
                SET name = ?1, birth_date = ?2, type_id = ?3, owner_id = ?4
                WHERE id = ?5
                "#,
            )
            .bind(pet.name.as_str())
            .bind(pet.birth_date)
            .bind(type_id)
            .bind(owner_id)
            .bind(id.get())
            .execute(&mut *conn)
            .await
            .map_err(|e| RepositoryError::database("update_pet", e))?;

            if result.rows_affected() == 0 {
                return Err(DomainError::not_found("pet", id).into());
            }
            id
        }
        None => {
            let result = sqlx::query(
                r#"
                INSERT INTO pets (name, birth_date, type_id, owner_id)
                VALUES (?1, ?2, ?3, ?4)
                "#,
            )
            .bind(pet.name.as_str())
            .bind(pet.birth_date)
            .bind(type_id)
            .bind(owner_id)
            .execute(&mut *conn)
            .await
            .map_err(|e| RepositoryError::database("insert_pet", e))?;

            let id = PetId::new(result.last_insert_rowid());
            pet.id = Some(id);
            id
        }
    };

    for visit in &mut pet.visits {
        visit.pet_id = Some(id);
        upsert_visit(&mut *conn, visit).await?;
    }
    Ok(())
}

async fn upsert_visit(conn: &mut SqliteConnection, visit: &mut Visit) -> RepositoryResult<()> {
    let pet_id = visit
        .pet_id
        .ok_or_else(|| DomainError::invariant("visit must belong to a saved pet"))?;
    ensure_exists(&mut *conn, "pets", "pet", pet_id.get()).await?;

    match visit.id {
        Some(id) => {
            let result = sqlx::query(
                "UPDATE visits SET pet_id = ?1, visit_date = ?2, description = ?3 WHERE id = ?4",
            )
            .bind(pet_id.get())
            .bind(visit.date)
            .bind(visit.description.as_str())
            .bind(id.get())
            .execute(&mut *conn)
            .await
            .map_err(|e| RepositoryError::database("update_visit", e))?;

            if result.rows_affected() == 0 {
                return Err(DomainError::not_found("visit", id).into());
            }
        }
        None => {
            let result = sqlx::query(
                "INSERT INTO visits (pet_id, visit_date, description) VALUES (?1, ?2, ?3)",
            )
            .bind(pet_id.get())
            .bind(visit.date)
            .bind(visit.description.as_str())
            .execute(&mut *conn)
            .await
            .map_err(|e| RepositoryError::database("insert_visit", e))?;

            visit.id = Some(VisitId::new(result.last_insert_rowid()));
        }
    }
    Ok(())
}

/// Turn a dangling reference into `NotFound` instead of a foreign-key failure.
async fn ensure_exists(
    conn: &mut SqliteConnection,
    table: &'static str,
    entity: &'static str,
    id: i64,
) -> RepositoryResult<()> {
    let found = sqlx::query(&format!("SELECT 1 FROM {table} WHERE id = ?1"))
        .bind(id)
        .fetch_optional(&mut *conn)
        .await
        .map_err(|e| RepositoryError::database("check_reference", e))?;

    match found {
        Some(_) => Ok(()),
        None => Err(DomainError::not_found(entity, id).into()),
    }
}

fn corrupt(err: sqlx::Error) -> RepositoryError {
    RepositoryError::CorruptRow(err.to_string())
}

fn assemble_owners(
    owners: Vec<OwnerRecord>,
    pets: Vec<PetRecord>,
    visits: Vec<VisitRecord>,
) -> Vec<Owner> {
    let mut visits_by_pet: HashMap<i64, Vec<Visit>> = HashMap::new();
    for v in visits {
        visits_by_pet.entry(v.pet_id).or_default().push(v.into_visit());
    }

    let mut pets_by_owner: HashMap<i64, Vec<PetRecord>> = HashMap::new();
    for p in pets {
        pets_by_owner.entry(p.owner_id).or_default().push(p);
    }

    owners
        .into_iter()
        .map(|record| {
            let owner_id = record.id;
            let mut owner = record.into_owner();
            let owner_ref = owner.owner_ref();
            owner.pets = pets_by_owner
                .remove(&owner_id)
                .unwrap_or_default()
                .into_iter()
                .map(|p| {
                    let visits = visits_by_pet.remove(&p.id).unwrap_or_default();
                    p.into_pet(owner_ref.clone(), visits)
                })
                .collect();
            owner.sort_pets();
            owner
        })
        .collect()
}

// SQLx row types

#[derive(Debug)]
struct OwnerRecord {
    id: i64,
    first_name: String,
    last_name: String,
    address: String,
    city: String,
    telephone: String,
}

impl<'r> FromRow<'r, SqliteRow> for OwnerRecord {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(OwnerRecord {
            id: row.try_get("id")?,
            first_name: row.try_get("first_name")?,
            last_name: row.try_get("last_name")?,
            address: row.try_get("address")?,
            city: row.try_get("city")?,
            telephone: row.try_get("telephone")?,
        })
    }
}

impl OwnerRecord {
    fn into_owner(self) -> Owner {
        let mut owner = Owner::new(
            Person::new(self.first_name, self.last_name),
            self.address,
            self.city,
            self.telephone,
        );
        owner.id = Some(OwnerId::new(self.id));
        owner
    }

    fn into_ref(self) -> OwnerRef {
        OwnerRef {
            id: OwnerId::new(self.id),
            person: Person::new(self.first_name, self.last_name),
        }
    }
}

#[derive(Debug)]
struct PetRecord {
    id: i64,
    name: String,
    birth_date: Option<NaiveDate>,
    owner_id: i64,
    type_id: i64,
    type_name: String,
}

impl<'r> FromRow<'r, SqliteRow> for PetRecord {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(PetRecord {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            birth_date: row.try_get("birth_date")?,
            owner_id: row.try_get("owner_id")?,
            type_id: row.try_get("type_id")?,
            type_name: row.try_get("type_name")?,
        })
    }
}

impl PetRecord {
    fn into_pet(self, owner: Option<OwnerRef>, visits: Vec<Visit>) -> Pet {
        let mut pet = Pet {
            id: Some(PetId::new(self.id)),
            name: self.name,
            birth_date: self.birth_date,
            pet_type: Some(PetType::new(PetTypeId::new(self.type_id), self.type_name)),
            owner,
            visits,
        };
        pet.sort_visits();
        pet
    }
}

#[derive(Debug)]
struct VisitRecord {
    id: i64,
    pet_id: i64,
    visit_date: NaiveDate,
    description: String,
}

impl<'r> FromRow<'r, SqliteRow> for VisitRecord {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(VisitRecord {
            id: row.try_get("id")?,
            pet_id: row.try_get("pet_id")?,
            visit_date: row.try_get("visit_date")?,
            description: row.try_get("description")?,
        })
    }
}

impl VisitRecord {
    fn into_visit(self) -> Visit {
        Visit {
            id: Some(VisitId::new(self.id)),
            date: self.visit_date,
            description: self.description,
            pet_id: Some(PetId::new(self.pet_id)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seed::reference_dataset;

    async fn seeded() -> SqliteClinicStore {
        let store = SqliteClinicStore::connect(&DatabaseConfig::in_memory())
            .await
            .unwrap();
        store.seed(&reference_dataset()).await.unwrap();
        store
    }

    #[tokio::test]
    async fn seeding_twice_is_harmless() {
        let store = seeded().await;
        store.seed(&reference_dataset()).await.unwrap();

        let all = store.find_by_last_name("").await.unwrap();
        assert_eq!(all.len(), 10);
    }

    #[tokio::test]
    async fn like_wildcards_in_input_match_literally() {
        let store = seeded().await;

        assert!(store.find_by_last_name("%").await.unwrap().is_empty());
        assert!(store.find_by_last_name("_avis").await.unwrap().is_empty());
        assert_eq!(store.find_by_last_name("davis").await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn owner_aggregate_includes_pets_and_visits() {
        let store = seeded().await;

        let owner = OwnerRepository::find_by_id(&store, OwnerId::new(6))
            .await
            .unwrap()
            .unwrap();

        let names: Vec<_> = owner.pets.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["Max", "Samantha"]);
        let samantha = &owner.pets[1];
        assert_eq!(samantha.visits.len(), 2);
        assert_eq!(samantha.visits[0].description, "spayed");
        assert_eq!(samantha.owner.as_ref().unwrap().first_name(), "Jean");
    }

    #[tokio::test]
    async fn rejected_pet_rolls_back_owner_insert() {
        let store = seeded().await;
        let mut owner = Owner::new(Person::new("Sam", "Schultz"), "4, Evans Street", "Wollongong", "4444444444");
        owner.add_pet(Pet::new("typeless"));

        let err = OwnerRepository::save(&store, &mut owner).await.unwrap_err();

        assert!(matches!(err, RepositoryError::Domain(DomainError::InvariantViolation(_))));
        assert!(owner.id.is_none());
        assert!(store.find_by_last_name("Schultz").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn vets_without_specialties_are_listed() {
        let store = seeded().await;

        let vets = store.find_all().await.unwrap();

        assert_eq!(vets.len(), 6);
        assert_eq!(vets[0].last_name(), "Carter");
        assert_eq!(vets[0].nr_of_specialties(), 0);
    }

    #[tokio::test]
    async fn dangling_references_are_not_found() {
        let store = seeded().await;
        let mut pet = Pet::new("ghost");
        pet.pet_type = Some(PetType::new(PetTypeId::new(1), "cat"));
        pet.owner = Some(OwnerRef {
            id: OwnerId::new(999),
            person: Person::new("No", "Body"),
        });

        let err = PetRepository::save(&store, &mut pet).await.unwrap_err();
        assert!(matches!(err, RepositoryError::Domain(ref e) if e.is_not_found()), "{err}");
        assert!(pet.id.is_none());

        let mut visit = Visit::new();
        visit.description = "checkup".into();
        visit.pet_id = Some(PetId::new(999));

        let err = VisitRepository::save(&store, &mut visit).await.unwrap_err();
        assert!(matches!(err, RepositoryError::Domain(ref e) if e.is_not_found()), "{err}");
    }
}
