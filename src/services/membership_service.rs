use async_trait::async_trait;
use serde::Deserialize;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::access::session::MembershipStore;
use crate::database::manager::DatabaseError;
use crate::database::models::{Membership, Profile, TeamMember};
use crate::error::ApiError;
use crate::types::{MembershipStatus, Role};
use crate::validation::FieldErrors;

const MEMBERSHIP_COLUMNS: &str = "id, organization_id, user_id, role, status, created_at, updated_at";

const TEAM_MEMBER_SELECT: &str = "SELECT m.user_id, m.organization_id, m.role, m.status,
            p.email, p.full_name, m.created_at AS joined_at
     FROM memberships m
     JOIN profiles p ON p.id = m.user_id";

#[derive(Debug, Clone, Deserialize)]
pub struct NewMember {
    pub email: String,
    pub role: Option<Role>,
}

impl NewMember {
    pub fn validate(&self) -> Result<(), ApiError> {
        let mut errors = FieldErrors::new();
        errors.email("email", self.email.trim());
        if self.role == Some(Role::Owner) {
            errors.add("role", "An organization has exactly one owner");
        }
        errors.finish()
    }

    pub fn role(&self) -> Role {
        self.role.unwrap_or(Role::Member)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MemberUpdate {
    pub role: Option<Role>,
    pub status: Option<MembershipStatus>,
}

impl MemberUpdate {
    pub fn validate(&self) -> Result<(), ApiError> {
        let mut errors = FieldErrors::new();
        if self.role == Some(Role::Owner) {
            errors.add("role", "Ownership cannot be transferred here");
        }
        if self.role.is_none() && self.status.is_none() {
            errors.add("role", "Nothing to update");
        }
        errors.finish()
    }
}

/// Membership reads and writes. Everything here runs on the service-role
/// pool: a user cannot see their own membership row before it is resolved,
/// and team management touches other users' rows.
pub struct MembershipService;

impl MembershipService {
    pub async fn find_for_user(pool: &PgPool, user_id: Uuid) -> Result<Option<Membership>, DatabaseError> {
        let sql = format!(
            "SELECT {MEMBERSHIP_COLUMNS} FROM memberships
             WHERE user_id = $1
             ORDER BY (status = 'active') DESC, created_at
             LIMIT 1"
        );
        Ok(sqlx::query_as::<_, Membership>(&sql)
            .bind(user_id)
            .fetch_optional(pool)
            .await?)
    }

    pub async fn list_team(pool: &PgPool, organization_id: Uuid) -> Result<Vec<TeamMember>, DatabaseError> {
        let sql = format!(
            "{TEAM_MEMBER_SELECT}
             WHERE m.organization_id = $1
             ORDER BY (m.role = 'owner') DESC, p.email"
        );
        Ok(sqlx::query_as::<_, TeamMember>(&sql)
            .bind(organization_id)
            .fetch_all(pool)
            .await?)
    }

    pub async fn get_member(
        pool: &PgPool,
        organization_id: Uuid,
        user_id: Uuid,
    ) -> Result<TeamMember, DatabaseError> {
        let sql = format!("{TEAM_MEMBER_SELECT} WHERE m.organization_id = $1 AND m.user_id = $2");
        sqlx::query_as::<_, TeamMember>(&sql)
            .bind(organization_id)
            .bind(user_id)
            .fetch_optional(pool)
            .await?
            .ok_or_else(|| DatabaseError::NotFound("Team member not found".to_string()))
    }

    pub async fn find_profile_by_email(pool: &PgPool, email: &str) -> Result<Option<Profile>, DatabaseError> {
        Ok(sqlx::query_as::<_, Profile>(
            "SELECT id, email, full_name, created_at FROM profiles WHERE lower(email) = lower($1)",
        )
        .bind(email.trim())
        .fetch_optional(pool)
        .await?)
    }

    /// Whether `user_id` is an active member of the organization; used to
    /// vet task assignees.
    pub async fn is_active_member(
        conn: &mut PgConnection,
        organization_id: Uuid,
        user_id: Uuid,
    ) -> Result<bool, DatabaseError> {
        let (exists,): (bool,) = sqlx::query_as(
            "SELECT EXISTS (
                SELECT 1 FROM memberships
                WHERE organization_id = $1 AND user_id = $2 AND status = 'active'
             )",
        )
        .bind(organization_id)
        .bind(user_id)
        .fetch_one(conn)
        .await?;
        Ok(exists)
    }

    /// Add an existing identity user to the organization. An inactive
    /// membership in the same organization is reactivated with the new role.
    pub async fn add_member(
        pool: &PgPool,
        organization_id: Uuid,
        input: &NewMember,
    ) -> Result<TeamMember, ApiError> {
        let profile = Self::find_profile_by_email(pool, &input.email)
            .await?
            .ok_or_else(|| ApiError::not_found("No user with that email address"))?;

        let mut tx = pool.begin().await.map_err(DatabaseError::from)?;

        let existing: Vec<Membership> = sqlx::query_as::<_, Membership>(&format!(
            "SELECT {MEMBERSHIP_COLUMNS} FROM memberships WHERE user_id = $1 FOR UPDATE"
        ))
        .bind(profile.id)
        .fetch_all(&mut *tx)
        .await
        .map_err(DatabaseError::from)?;

        if existing.iter().any(Membership::is_active) {
            return Err(ApiError::conflict("User is already a member of an organization"));
        }

        let role = input.role().as_str();
        if existing.iter().any(|m| m.organization_id == organization_id) {
            sqlx::query(
                "UPDATE memberships SET role = $3, status = 'active', updated_at = now()
                 WHERE organization_id = $1 AND user_id = $2",
            )
            .bind(organization_id)
            .bind(profile.id)
            .bind(role)
            .execute(&mut *tx)
            .await
            .map_err(DatabaseError::from)?;
        } else {
            sqlx::query(
                "INSERT INTO memberships (organization_id, user_id, role, status)
                 VALUES ($1, $2, $3, 'active')",
            )
            .bind(organization_id)
            .bind(profile.id)
            .bind(role)
            .execute(&mut *tx)
            .await
            .map_err(DatabaseError::from)?;
        }

        tx.commit().await.map_err(DatabaseError::from)?;
        tracing::info!("Added user {} to organization {} as {}", profile.id, organization_id, role);

        Ok(Self::get_member(pool, organization_id, profile.id).await?)
    }

    pub async fn update_member(
        pool: &PgPool,
        organization_id: Uuid,
        user_id: Uuid,
        changes: &MemberUpdate,
    ) -> Result<TeamMember, DatabaseError> {
        let result = sqlx::query(
            "UPDATE memberships SET
                role = COALESCE($3, role),
                status = COALESCE($4, status),
                updated_at = now()
             WHERE organization_id = $1 AND user_id = $2 AND role <> 'owner'",
        )
        .bind(organization_id)
        .bind(user_id)
        .bind(changes.role.map(|r| r.as_str()))
        .bind(changes.status.map(|s| s.as_str()))
        .execute(pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound("Team member not found".to_string()));
        }
        Self::get_member(pool, organization_id, user_id).await
    }
}

/// [`MembershipStore`] backed by the service-role pool
#[derive(Clone)]
pub struct PgMembershipStore {
    pool: PgPool,
}

impl PgMembershipStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MembershipStore for PgMembershipStore {
    async fn find_membership(&self, user_id: Uuid) -> Result<Option<Membership>, DatabaseError> {
        MembershipService::find_for_user(&self.pool, user_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_member_defaults_to_member_role() {
        let input = NewMember {
            email: "dev@example.com".to_string(),
            role: None,
        };
        assert!(input.validate().is_ok());
        assert_eq!(input.role(), Role::Member);
    }

    #[test]
    fn owner_role_cannot_be_granted() {
        let input = NewMember {
            email: "dev@example.com".to_string(),
            role: Some(Role::Owner),
        };
        assert!(input.validate().is_err());

        let update = MemberUpdate {
            role: Some(Role::Owner),
            status: None,
        };
        assert!(update.validate().is_err());
    }

    #[test]
    fn empty_update_is_rejected() {
        assert!(MemberUpdate::default().validate().is_err());
    }
}
