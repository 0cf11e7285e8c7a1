//! Role group service.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;

use common::{AppError, AppResult, OptionExt};
use domain::{GroupChanges, GroupFormData, NewRoleGroup, RoleGroup};

use super::member_counts::{compute_member_counts, MemberCountPolicy};
use crate::repository::{GroupRepository, UserRepository};

/// Group service trait for dependency injection.
#[async_trait]
pub trait GroupService: Send + Sync {
    async fn list_groups(&self) -> AppResult<Vec<RoleGroup>>;

    /// Create a non-default, empty group; returns the new id
    async fn create_group(&self, form: GroupFormData, created_by: &str) -> AppResult<String>;

    /// Overwrite name, description, roles and color.
    /// Member counts are left alone until the next recount.
    async fn update_group(&self, id: &str, form: GroupFormData) -> AppResult<()>;

    async fn delete_group(&self, id: &str) -> AppResult<()>;

    /// Rebuild every member count from active profiles and return the groups
    async fn recompute_member_counts(&self) -> AppResult<Vec<RoleGroup>>;
}

/// Concrete implementation of GroupService using repositories.
pub struct GroupManager {
    groups: Arc<dyn GroupRepository>,
    users: Arc<dyn UserRepository>,
    policy: MemberCountPolicy,
}

impl GroupManager {
    pub fn new(
        groups: Arc<dyn GroupRepository>,
        users: Arc<dyn UserRepository>,
        policy: MemberCountPolicy,
    ) -> Self {
        Self {
            groups,
            users,
            policy,
        }
    }
}

#[async_trait]
impl GroupService for GroupManager {
    async fn list_groups(&self) -> AppResult<Vec<RoleGroup>> {
        self.groups.list().await
    }

    async fn create_group(&self, form: GroupFormData, created_by: &str) -> AppResult<String> {
        form.validate_form()?;

        let id = self
            .groups
            .insert(NewRoleGroup::from_form(form.normalized(), created_by, Utc::now()))
            .await?;
        tracing::info!(group_id = %id, created_by, "Group created");
        Ok(id)
    }

    async fn update_group(&self, id: &str, form: GroupFormData) -> AppResult<()> {
        form.validate_form()?;

        self.groups.find_by_id(id).await?.ok_or_not_found()?;
        self.groups
            .update(id, GroupChanges::from_form(form.normalized(), Utc::now()))
            .await?;
        tracing::info!(group_id = %id, "Group updated");
        Ok(())
    }

    async fn delete_group(&self, id: &str) -> AppResult<()> {
        let group = self.groups.find_by_id(id).await?.ok_or_not_found()?;
        if group.is_default {
            return Err(AppError::invalid_operation("Cannot delete default group"));
        }

        self.groups.delete(id).await?;
        tracing::info!(group_id = %id, "Group deleted");
        Ok(())
    }

    async fn recompute_member_counts(&self) -> AppResult<Vec<RoleGroup>> {
        let (profiles, groups) = tokio::try_join!(self.users.list_all(), self.groups.list())?;

        let counts = compute_member_counts(self.policy, &profiles, &groups);
        self.groups.set_member_counts(&counts, Utc::now()).await?;
        tracing::info!(
            groups = counts.len(),
            profiles = profiles.len(),
            policy = %self.policy,
            "Member counts recomputed"
        );

        self.groups.list().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::{MockGroupRepository, MockUserRepository};
    use domain::Role;

    fn form(name: &str, roles: Vec<Role>) -> GroupFormData {
        GroupFormData {
            name: name.to_string(),
            description: String::new(),
            roles,
            color: None,
        }
    }

    fn stored(id: &str, is_default: bool) -> RoleGroup {
        RoleGroup {
            is_default,
            ..NewRoleGroup::from_form(form(id, vec![Role::Member]), "system", Utc::now())
                .into_group(id.to_string())
        }
    }

    fn manager(groups: MockGroupRepository) -> GroupManager {
        GroupManager::new(
            Arc::new(groups),
            Arc::new(MockUserRepository::new()),
            MemberCountPolicy::PerRole,
        )
    }

    #[tokio::test]
    async fn invalid_group_form_is_rejected() {
        let service = manager(MockGroupRepository::new());
        let result = service.create_group(form("X", vec![Role::Member]), "admin-1").await;
        assert!(matches!(result, Err(AppError::Validation(_))));

        let result = service.update_group("g1", form("Umpires", vec![])).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn default_groups_cannot_be_deleted() {
        let mut groups = MockGroupRepository::new();
        groups
            .expect_find_by_id()
            .returning(|id| Ok(Some(stored(id, true))));
        groups.expect_delete().never();

        let result = manager(groups).delete_group("member-group").await;
        assert!(matches!(result, Err(AppError::InvalidOperation(_))));
    }

    #[tokio::test]
    async fn missing_group_is_not_found() {
        let mut groups = MockGroupRepository::new();
        groups.expect_find_by_id().returning(|_| Ok(None));
        groups.expect_update().never();

        let service = manager(groups);
        assert!(matches!(
            service.delete_group("ghost").await,
            Err(AppError::NotFound)
        ));
        assert!(matches!(
            service
                .update_group("ghost", form("Umpires", vec![Role::Referee]))
                .await,
            Err(AppError::NotFound)
        ));
    }

    #[tokio::test]
    async fn custom_group_is_deleted() {
        let mut groups = MockGroupRepository::new();
        groups
            .expect_find_by_id()
            .returning(|id| Ok(Some(stored(id, false))));
        groups
            .expect_delete()
            .withf(|id| id == "umpires")
            .times(1)
            .returning(|_| Ok(()));

        tokio_test::assert_ok!(manager(groups).delete_group("umpires").await);
    }
}
