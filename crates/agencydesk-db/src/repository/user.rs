//! SurrealDB implementation of [`UserRepository`].
//!
//! Password hashing uses Argon2id with OWASP-recommended parameters
//! (memory: 19 MiB, iterations: 2, parallelism: 1). Salt is randomly
//! generated per hash. An optional pepper (server-side secret) can be
//! provided at construction time.
//!
//! Emails are stored lower-cased and are unique across all agencies.

use agencydesk_core::authz::ScopeFilter;
use agencydesk_core::error::BrokerResult;
use agencydesk_core::models::role::Role;
use agencydesk_core::models::user::{CreateUser, UpdateUser, User};
use agencydesk_core::repository::{PaginatedResult, Pagination, UserRepository};
use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHasher};
use chrono::{DateTime, Utc};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::info;
use uuid::Uuid;

use super::{
    count, from_object, metadata_or_empty, parse_id, parse_opt_id, patch_assignments, to_object,
};
use crate::error::DbError;
use crate::scope::{Ownership, clause};

#[derive(Debug, SurrealValue)]
struct UserRow {
    record_id: String,
    first_name: String,
    last_name: String,
    email: String,
    password_hash: String,
    role: String,
    agency_id: Option<String>,
    location_id: Option<String>,
    profile: serde_json::Value,
    metadata: serde_json::Value,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl UserRow {
    fn try_into_user(self) -> Result<User, DbError> {
        let role: Role = self
            .role
            .parse()
            .map_err(|e| DbError::decode("user", e))?;
        Ok(User {
            id: parse_id("user", &self.record_id)?,
            first_name: self.first_name,
            last_name: self.last_name,
            email: self.email,
            password_hash: self.password_hash,
            role,
            agency_id: parse_opt_id("user", self.agency_id)?,
            location_id: parse_opt_id("user", self.location_id)?,
            profile: from_object("user", self.profile)?,
            metadata: self.metadata,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn role_names(roles: &[Role]) -> Vec<String> {
    roles.iter().map(|r| r.as_str().to_string()).collect()
}

/// Hash a password with Argon2id using OWASP-recommended parameters.
///
/// If a pepper is provided, it is prepended to the password before
/// hashing. The salt is randomly generated for each call.
fn hash_password(password: &str, pepper: Option<&str>) -> Result<String, DbError> {
    // OWASP ASVS recommended: m=19456 (19 MiB), t=2, p=1
    let params = argon2::Params::new(19456, 2, 1, None)
        .map_err(|e| DbError::Query(format!("argon2 params error: {e}")))?;
    let argon2 = Argon2::new(argon2::Algorithm::Argon2id, argon2::Version::V0x13, params);

    let peppered: String;
    let input = match pepper {
        Some(p) => {
            peppered = format!("{p}{password}");
            peppered.as_bytes()
        }
        None => password.as_bytes(),
    };

    let salt = SaltString::generate(&mut argon2::password_hash::rand_core::OsRng);
    let hash = argon2
        .hash_password(input, &salt)
        .map_err(|e| DbError::Query(format!("password hash error: {e}")))?;

    Ok(hash.to_string())
}

/// SurrealDB implementation of the User repository.
#[derive(Clone)]
pub struct SurrealUserRepository<C: Connection> {
    db: Surreal<C>,
    /// Optional server-side pepper for password hashing.
    pepper: Option<String>,
}

impl<C: Connection> SurrealUserRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db, pepper: None }
    }

    pub fn with_pepper(db: Surreal<C>, pepper: String) -> Self {
        Self {
            db,
            pepper: Some(pepper),
        }
    }

    async fn fetch_one(
        &self,
        filter: &str,
        params: Vec<(&'static str, String)>,
        what: String,
    ) -> BrokerResult<User> {
        let query = format!("SELECT meta::id(id) AS record_id, * FROM user WHERE {filter}");
        let mut builder = self.db.query(&query);
        for param in params {
            builder = builder.bind(param);
        }
        let mut result = builder.await.map_err(DbError::from)?;

        let rows: Vec<UserRow> = result.take(0).map_err(DbError::from)?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| DbError::not_found("user", what))?;

        Ok(row.try_into_user()?)
    }
}

impl<C: Connection> UserRepository for SurrealUserRepository<C> {
    async fn create(&self, input: CreateUser) -> BrokerResult<User> {
        let id_str = Uuid::new_v4().to_string();
        let password_hash = hash_password(&input.password, self.pepper.as_deref())?;
        let profile = to_object("user", &input.profile)?;

        let create = "CREATE type::record('user', $id) SET \
                      first_name = $first_name, last_name = $last_name, \
                      email = $email, password_hash = $password_hash, \
                      role = $role, agency_id = $agency_id, \
                      location_id = $location_id, profile = $profile, \
                      metadata = $metadata \
                      RETURN meta::id(id) AS record_id, *";

        // The agency must still exist at the moment the identity is written.
        let query = if input.agency_id.is_some() {
            format!(
                "IF record::exists(type::record('agency', $agency_id)) {{ {create} }} \
                 ELSE {{ THROW '[not_found] agency' }}"
            )
        } else {
            create.to_string()
        };

        let result = self
            .db
            .query(&query)
            .bind(("id", id_str.clone()))
            .bind(("first_name", input.first_name))
            .bind(("last_name", input.last_name))
            .bind(("email", normalize_email(&input.email)))
            .bind(("password_hash", password_hash))
            .bind(("role", input.role.as_str().to_string()))
            .bind(("agency_id", input.agency_id.map(|id| id.to_string())))
            .bind(("location_id", input.location_id.map(|id| id.to_string())))
            .bind(("profile", profile))
            .bind(("metadata", metadata_or_empty(input.metadata)))
            .await
            .map_err(DbError::from)?;

        let entity = if input.agency_id.is_some() { "agency" } else { "user" };
        let mut result = result
            .check()
            .map_err(|e| DbError::from_statement(e, entity, &id_str))?;

        let rows: Vec<UserRow> = result.take(0).map_err(DbError::from)?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| DbError::not_found("user", &id_str))?;

        let user = row.try_into_user()?;
        info!(user_id = %user.id, role = %user.role, "identity created");
        Ok(user)
    }

    async fn get_by_id(&self, id: Uuid) -> BrokerResult<User> {
        let mut result = self
            .db
            .query("SELECT meta::id(id) AS record_id, * FROM type::record('user', $id)")
            .bind(("id", id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<UserRow> = result.take(0).map_err(DbError::from)?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| DbError::not_found("user", id))?;

        Ok(row.try_into_user()?)
    }

    async fn get_by_email(&self, email: &str) -> BrokerResult<User> {
        let email = normalize_email(email);
        self.fetch_one(
            "email = $email",
            vec![("email", email.clone())],
            format!("email={email}"),
        )
        .await
    }

    async fn get(&self, scope: ScopeFilter, id: Uuid) -> BrokerResult<User> {
        let scope = clause(scope, Ownership::Direct("agency_id"));
        self.fetch_one(
            &format!("meta::id(id) = $id AND {}", scope.sql),
            vec![
                ("id", id.to_string()),
                ("scope_agency", scope.agency),
                ("scope_agent", scope.agent),
            ],
            id.to_string(),
        )
        .await
    }

    async fn update(
        &self,
        scope: ScopeFilter,
        id: Uuid,
        roles: &'static [Role],
        input: UpdateUser,
    ) -> BrokerResult<User> {
        let scope = clause(scope, Ownership::Direct("agency_id"));
        let profile_sets = patch_assignments("user", "profile", &input.profile)?;

        let mut sets: Vec<String> = Vec::new();
        if input.first_name.is_some() {
            sets.push("first_name = $first_name".into());
        }
        if input.last_name.is_some() {
            sets.push("last_name = $last_name".into());
        }
        if input.email.is_some() {
            sets.push("email = $email".into());
        }
        if input.location_id.is_some() {
            sets.push("location_id = $location_id".into());
        }
        if input.metadata.is_some() {
            sets.push("metadata = $metadata".into());
        }
        sets.extend(profile_sets.iter().map(|(set, _, _)| set.clone()));
        sets.push("updated_at = time::now()".into());

        let query = format!(
            "UPDATE type::record('user', $id) SET {} \
             WHERE {} AND role IN $roles \
             RETURN meta::id(id) AS record_id, *",
            sets.join(", "),
            scope.sql
        );

        let mut builder = self
            .db
            .query(&query)
            .bind(("id", id.to_string()))
            .bind(("roles", role_names(roles)))
            .bind(("scope_agency", scope.agency))
            .bind(("scope_agent", scope.agent));
        if let Some(first_name) = input.first_name {
            builder = builder.bind(("first_name", first_name));
        }
        if let Some(last_name) = input.last_name {
            builder = builder.bind(("last_name", last_name));
        }
        if let Some(email) = input.email {
            builder = builder.bind(("email", normalize_email(&email)));
        }
        if let Some(location_id) = input.location_id {
            builder = builder.bind(("location_id", location_id.to_string()));
        }
        if let Some(metadata) = input.metadata {
            builder = builder.bind(("metadata", metadata));
        }
        for (_, param, value) in profile_sets {
            builder = builder.bind((param, value));
        }

        let result = builder.await.map_err(DbError::from)?;
        let mut result = result
            .check()
            .map_err(|e| DbError::from_statement(e, "user", id))?;

        let rows: Vec<UserRow> = result.take(0).map_err(DbError::from)?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| DbError::not_found("user", id))?;

        Ok(row.try_into_user()?)
    }

    async fn set_password(&self, id: Uuid, password: String) -> BrokerResult<()> {
        let password_hash = hash_password(&password, self.pepper.as_deref())?;

        let mut result = self
            .db
            .query(
                "UPDATE type::record('user', $id) SET \
                 password_hash = $password_hash, updated_at = time::now() \
                 RETURN meta::id(id) AS record_id, *",
            )
            .bind(("id", id.to_string()))
            .bind(("password_hash", password_hash))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<UserRow> = result.take(0).map_err(DbError::from)?;
        if rows.is_empty() {
            return Err(DbError::not_found("user", id).into());
        }

        info!(user_id = %id, "password changed");
        Ok(())
    }

    async fn list(
        &self,
        scope: ScopeFilter,
        roles: &'static [Role],
        pagination: Pagination,
    ) -> BrokerResult<PaginatedResult<User>> {
        let scope = clause(scope, Ownership::Direct("agency_id"));
        let filter = format!("{} AND role IN $roles", scope.sql);
        let total = count(
            &self.db,
            "user",
            &filter,
            vec![
                ("roles", role_names(roles).into()),
                ("scope_agency", scope.agency.clone().into()),
                ("scope_agent", scope.agent.clone().into()),
            ],
        )
        .await?;

        let query = format!(
            "SELECT meta::id(id) AS record_id, * FROM user WHERE {filter} \
             ORDER BY created_at ASC LIMIT $limit START $offset"
        );
        let mut result = self
            .db
            .query(&query)
            .bind(("roles", role_names(roles)))
            .bind(("scope_agency", scope.agency))
            .bind(("scope_agent", scope.agent))
            .bind(("limit", pagination.limit))
            .bind(("offset", pagination.offset))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<UserRow> = result.take(0).map_err(DbError::from)?;
        let items = rows
            .into_iter()
            .map(|row| row.try_into_user())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(PaginatedResult {
            items,
            total,
            offset: pagination.offset,
            limit: pagination.limit,
        })
    }

    async fn count_by_role(&self, role: Role) -> BrokerResult<u64> {
        Ok(count(
            &self.db,
            "user",
            "role = $role",
            vec![("role", role.as_str().into())],
        )
        .await?)
    }
}
