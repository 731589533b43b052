//! SurrealDB implementation of [`GroupRepository`].
//!
//! Memberships are `member_of` relation edges from user to group,
//! carrying per-group attributes. A unique (in, out) index guarantees
//! at most one edge per pair; re-adding a member replaces the edge.

use chrono::{DateTime, Utc};
use qualdoc_core::error::QualdocResult;
use qualdoc_core::models::group::{
    CreateGroup, GroupMembership, InterestGroup, MAX_GROUP_NAME_LEN, MIN_GROUP_NAME_LEN,
    MembershipInput, UpdateGroup,
};
use qualdoc_core::models::user::{MAX_APPROVAL_LEVEL, MIN_APPROVAL_LEVEL, User};
use qualdoc_core::repository::{GroupRepository, PaginatedResult, Pagination};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::DbError;
use crate::normalize;
use crate::repository::user::UserRowWithId;

/// DB-side row struct for queries where the UUID is already known.
#[derive(Debug, SurrealValue)]
struct GroupRow {
    code: String,
    name: String,
    description: String,
    group_permissions: serde_json::Value,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// DB-side row struct that includes the record ID via `meta::id(id)`.
#[derive(Debug, SurrealValue)]
struct GroupRowWithId {
    record_id: String,
    code: String,
    name: String,
    description: String,
    group_permissions: serde_json::Value,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl GroupRow {
    fn into_group(self, id: Uuid) -> InterestGroup {
        InterestGroup {
            id,
            code: self.code,
            name: self.name,
            description: self.description,
            group_permissions: normalize::permission_set(&self.group_permissions),
            is_active: self.is_active,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

impl GroupRowWithId {
    fn try_into_group(self) -> Result<InterestGroup, DbError> {
        let id = Uuid::parse_str(&self.record_id)
            .map_err(|e| DbError::Migration(format!("invalid UUID: {e}")))?;
        Ok(InterestGroup {
            id,
            code: self.code,
            name: self.name,
            description: self.description,
            group_permissions: normalize::permission_set(&self.group_permissions),
            is_active: self.is_active,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// DB-side row struct for membership edges.
#[derive(Debug, SurrealValue)]
struct MembershipRow {
    user_record: String,
    group_record: String,
    role_in_group: String,
    approval_level_in_group: u32,
    is_department_head: bool,
    created_at: DateTime<Utc>,
}

impl MembershipRow {
    fn try_into_membership(self) -> Result<GroupMembership, DbError> {
        let user_id = Uuid::parse_str(&self.user_record)
            .map_err(|e| DbError::Migration(format!("invalid user UUID: {e}")))?;
        let group_id = Uuid::parse_str(&self.group_record)
            .map_err(|e| DbError::Migration(format!("invalid group UUID: {e}")))?;
        Ok(GroupMembership {
            user_id,
            group_id,
            role_in_group: self.role_in_group,
            approval_level_in_group: self.approval_level_in_group as u8,
            is_department_head: self.is_department_head,
            created_at: self.created_at,
        })
    }
}

/// Row struct for count queries.
#[derive(Debug, SurrealValue)]
struct CountRow {
    total: u64,
}

fn is_snake_case(code: &str) -> bool {
    !code.is_empty()
        && code.starts_with(|c: char| c.is_ascii_lowercase())
        && code
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
}

fn check_group_name(name: &str) -> Result<(), DbError> {
    let len = name.chars().count();
    if !(MIN_GROUP_NAME_LEN..=MAX_GROUP_NAME_LEN).contains(&len) {
        return Err(DbError::Validation(format!(
            "group name must be {MIN_GROUP_NAME_LEN}-{MAX_GROUP_NAME_LEN} \
             characters, got {len}"
        )));
    }
    Ok(())
}

/// SurrealDB implementation of the Group repository.
#[derive(Clone)]
pub struct SurrealGroupRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealGroupRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }

    /// NotFound check used before edge operations.
    async fn ensure_exists(&self, table: &str, id: &str) -> Result<(), DbError> {
        let mut result = self
            .db
            .query(format!(
                "SELECT count() AS total FROM {table} \
                 WHERE id = type::record('{table}', $id) GROUP ALL"
            ))
            .bind(("id", id.to_string()))
            .await?;
        let rows: Vec<CountRow> = result.take(0)?;
        if rows.first().map(|r| r.total).unwrap_or(0) == 0 {
            return Err(DbError::NotFound {
                entity: table.into(),
                id: id.into(),
            });
        }
        Ok(())
    }
}

impl<C: Connection> GroupRepository for SurrealGroupRepository<C> {
    async fn create(&self, input: CreateGroup) -> QualdocResult<InterestGroup> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        if !is_snake_case(&input.code) {
            return Err(DbError::Validation(format!(
                "group code must be snake_case: {}",
                input.code
            ))
            .into());
        }
        check_group_name(&input.name)?;

        // Duplicate policy for group creation: reject with Conflict.
        let mut existing = self
            .db
            .query(
                "SELECT count() AS total FROM interest_group \
                 WHERE code = $code OR name = $name GROUP ALL",
            )
            .bind(("code", input.code.clone()))
            .bind(("name", input.name.clone()))
            .await
            .map_err(DbError::from)?;
        let rows: Vec<CountRow> = existing.take(0).map_err(DbError::from)?;
        if rows.first().map(|r| r.total).unwrap_or(0) > 0 {
            return Err(DbError::Duplicate {
                entity: "interest_group".into(),
                key: format!("code={} or name={}", input.code, input.name),
            }
            .into());
        }

        let permissions: std::collections::BTreeSet<String> = input
            .group_permissions
            .iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let result = self
            .db
            .query(
                "CREATE type::record('interest_group', $id) SET \
                 code = $code, name = $name, \
                 description = $description, \
                 group_permissions = $group_permissions, \
                 is_active = true",
            )
            .bind(("id", id_str.clone()))
            .bind(("code", input.code))
            .bind(("name", input.name))
            .bind(("description", input.description))
            .bind(("group_permissions", normalize::permission_array(&permissions)))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::Migration(e.to_string()))?;

        let rows: Vec<GroupRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "interest_group".into(),
            id: id_str,
        })?;

        Ok(row.into_group(id))
    }

    async fn get_by_id(&self, id: Uuid) -> QualdocResult<InterestGroup> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query("SELECT * FROM type::record('interest_group', $id)")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<GroupRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "interest_group".into(),
            id: id_str,
        })?;

        Ok(row.into_group(id))
    }

    async fn get_by_code(&self, code: &str) -> QualdocResult<InterestGroup> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM interest_group \
                 WHERE code = $code",
            )
            .bind(("code", code.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<GroupRowWithId> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "interest_group".into(),
            id: format!("code={code}"),
        })?;

        Ok(row.try_into_group()?)
    }

    async fn update(&self, id: Uuid, input: UpdateGroup) -> QualdocResult<InterestGroup> {
        let id_str = id.to_string();

        if let Some(ref name) = input.name {
            check_group_name(name)?;
        }

        let mut sets = Vec::new();
        if input.name.is_some() {
            sets.push("name = $name");
        }
        if input.description.is_some() {
            sets.push("description = $description");
        }
        if input.group_permissions.is_some() {
            sets.push("group_permissions = $group_permissions");
        }
        if input.is_active.is_some() {
            sets.push("is_active = $is_active");
        }
        sets.push("updated_at = time::now()");

        let query = format!(
            "UPDATE type::record('interest_group', $id) SET {}",
            sets.join(", ")
        );

        let mut builder = self.db.query(&query).bind(("id", id_str.clone()));

        if let Some(name) = input.name {
            builder = builder.bind(("name", name));
        }
        if let Some(description) = input.description {
            builder = builder.bind(("description", description));
        }
        if let Some(group_permissions) = input.group_permissions {
            let permissions: std::collections::BTreeSet<String> = group_permissions
                .iter()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
            builder = builder.bind(("group_permissions", normalize::permission_array(&permissions)));
        }
        if let Some(is_active) = input.is_active {
            builder = builder.bind(("is_active", is_active));
        }

        let result = builder.await.map_err(DbError::from)?;
        let mut result = result
            .check()
            .map_err(|e| DbError::Migration(e.to_string()))?;

        let rows: Vec<GroupRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "interest_group".into(),
            id: id_str,
        })?;

        Ok(row.into_group(id))
    }

    async fn delete(&self, id: Uuid) -> QualdocResult<()> {
        // Soft-delete: the group stops contributing permissions but
        // its memberships remain on record.
        let id_str = id.to_string();

        self.db
            .query(
                "UPDATE type::record('interest_group', $id) SET \
                 is_active = false, updated_at = time::now()",
            )
            .bind(("id", id_str))
            .await
            .map_err(DbError::from)?;

        Ok(())
    }

    async fn list(&self, pagination: Pagination) -> QualdocResult<PaginatedResult<InterestGroup>> {
        let mut count_result = self
            .db
            .query("SELECT count() AS total FROM interest_group GROUP ALL")
            .await
            .map_err(DbError::from)?;
        let count_rows: Vec<CountRow> = count_result.take(0).map_err(DbError::from)?;
        let total = count_rows.first().map(|r| r.total).unwrap_or(0);

        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM interest_group \
                 ORDER BY created_at ASC \
                 LIMIT $limit START $offset",
            )
            .bind(("limit", pagination.limit))
            .bind(("offset", pagination.offset))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<GroupRowWithId> = result.take(0).map_err(DbError::from)?;

        let items = rows
            .into_iter()
            .map(|row| row.try_into_group())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(PaginatedResult {
            items,
            total,
            offset: pagination.offset,
            limit: pagination.limit,
        })
    }

    async fn add_member(
        &self,
        user_id: Uuid,
        group_id: Uuid,
        input: MembershipInput,
    ) -> QualdocResult<GroupMembership> {
        let user_id_str = user_id.to_string();
        let group_id_str = group_id.to_string();

        if !(MIN_APPROVAL_LEVEL..=MAX_APPROVAL_LEVEL).contains(&input.approval_level_in_group) {
            return Err(DbError::Validation(format!(
                "approval level must be between {MIN_APPROVAL_LEVEL} and \
                 {MAX_APPROVAL_LEVEL}, got {}",
                input.approval_level_in_group
            ))
            .into());
        }

        self.ensure_exists("user", &user_id_str).await?;
        self.ensure_exists("interest_group", &group_id_str).await?;

        // Re-assertion semantics: an existing (user, group) edge is
        // replaced with the new attributes, not an error.
        let query = format!(
            "DELETE member_of WHERE \
             in = user:`{user_id_str}` AND \
             out = interest_group:`{group_id_str}`; \
             RELATE user:`{user_id_str}` -> member_of -> \
             interest_group:`{group_id_str}` SET \
             role_in_group = $role_in_group, \
             approval_level_in_group = $approval_level_in_group, \
             is_department_head = $is_department_head;"
        );

        self.db
            .query(query)
            .bind(("role_in_group", input.role_in_group.clone()))
            .bind(("approval_level_in_group", input.approval_level_in_group as u32))
            .bind(("is_department_head", input.is_department_head))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::Migration(e.to_string()))?;

        // Read the edge back with both endpoint ids projected.
        let mut result = self
            .db
            .query(
                "SELECT meta::id(in) AS user_record, \
                 meta::id(out) AS group_record, \
                 role_in_group, approval_level_in_group, \
                 is_department_head, created_at \
                 FROM member_of \
                 WHERE in = type::record('user', $user_id) \
                 AND out = type::record('interest_group', $group_id)",
            )
            .bind(("user_id", user_id_str.clone()))
            .bind(("group_id", group_id_str))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<MembershipRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "member_of".into(),
            id: user_id_str,
        })?;

        Ok(row.try_into_membership()?)
    }

    async fn remove_member(&self, user_id: Uuid, group_id: Uuid) -> QualdocResult<()> {
        self.db
            .query(
                "DELETE member_of WHERE \
                 in = type::record('user', $user_id) AND \
                 out = type::record('interest_group', $group_id)",
            )
            .bind(("user_id", user_id.to_string()))
            .bind(("group_id", group_id.to_string()))
            .await
            .map_err(DbError::from)?;

        Ok(())
    }

    async fn is_member(&self, user_id: Uuid, group_id: Uuid) -> QualdocResult<bool> {
        let mut result = self
            .db
            .query(
                "SELECT count() AS total FROM member_of WHERE \
                 in = type::record('user', $user_id) AND \
                 out = type::record('interest_group', $group_id) GROUP ALL",
            )
            .bind(("user_id", user_id.to_string()))
            .bind(("group_id", group_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<CountRow> = result.take(0).map_err(DbError::from)?;
        Ok(rows.first().map(|r| r.total).unwrap_or(0) > 0)
    }

    async fn members(
        &self,
        group_id: Uuid,
        pagination: Pagination,
    ) -> QualdocResult<PaginatedResult<User>> {
        let group_id_str = group_id.to_string();

        let mut count_result = self
            .db
            .query(
                "SELECT count() AS total FROM member_of \
                 WHERE out = type::record('interest_group', $group_id) GROUP ALL",
            )
            .bind(("group_id", group_id_str.clone()))
            .await
            .map_err(DbError::from)?;
        let count_rows: Vec<CountRow> = count_result.take(0).map_err(DbError::from)?;
        let total = count_rows.first().map(|r| r.total).unwrap_or(0);

        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM user \
                 WHERE id IN (\
                     SELECT VALUE in FROM member_of \
                     WHERE out = type::record('interest_group', $group_id)\
                 ) \
                 ORDER BY created_at ASC \
                 LIMIT $limit START $offset",
            )
            .bind(("group_id", group_id_str))
            .bind(("limit", pagination.limit))
            .bind(("offset", pagination.offset))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<UserRowWithId> = result.take(0).map_err(DbError::from)?;

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

    async fn groups_for_user(&self, user_id: Uuid) -> QualdocResult<Vec<InterestGroup>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM interest_group \
                 WHERE id IN (\
                     SELECT VALUE out FROM member_of \
                     WHERE in = type::record('user', $user_id)\
                 )",
            )
            .bind(("user_id", user_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<GroupRowWithId> = result.take(0).map_err(DbError::from)?;

        let groups = rows
            .into_iter()
            .map(|row| row.try_into_group())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(groups)
    }

    async fn memberships_for_user(&self, user_id: Uuid) -> QualdocResult<Vec<GroupMembership>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(in) AS user_record, \
                 meta::id(out) AS group_record, \
                 role_in_group, approval_level_in_group, \
                 is_department_head, created_at \
                 FROM member_of \
                 WHERE in = type::record('user', $user_id)",
            )
            .bind(("user_id", user_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<MembershipRow> = result.take(0).map_err(DbError::from)?;

        let memberships = rows
            .into_iter()
            .map(|row| row.try_into_membership())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(memberships)
    }
}
