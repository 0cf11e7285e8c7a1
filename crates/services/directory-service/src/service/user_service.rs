//! User directory service - listing and admin maintenance of profiles.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;

use common::{AppError, AppResult, OptionExt};
use domain::{
    ManagedUser, NewUserProfile, Paginated, ProfileChanges, UserFilter, UserFormData,
    UserListParams, UserStatistics,
};

use super::member_counts::MemberCounter;
use crate::repository::{UserQuery, UserRepository};

/// User directory service trait for dependency injection.
#[async_trait]
pub trait UserService: Send + Sync {
    /// One page of profiles, annotated for `viewer_id`
    async fn list_users(
        &self,
        params: UserListParams,
        viewer_id: Option<&str>,
    ) -> AppResult<Paginated<ManagedUser>>;

    async fn get_user(&self, id: &str, viewer_id: Option<&str>) -> AppResult<ManagedUser>;

    /// Head counts over every live profile
    async fn get_user_statistics(&self) -> AppResult<UserStatistics>;

    /// Create a profile; returns the new id
    async fn create_user(&self, form: UserFormData, created_by: &str) -> AppResult<String>;

    /// Overwrite every editable field of a profile
    async fn update_user(&self, id: &str, form: UserFormData, updated_by: &str) -> AppResult<()>;

    async fn delete_user(&self, id: &str, acting_user_id: &str) -> AppResult<()>;

    async fn toggle_user_status(
        &self,
        id: &str,
        is_active: bool,
        acting_user_id: &str,
    ) -> AppResult<()>;

    /// Whether a live profile other than `exclude_id` uses this number
    async fn check_phone_number_exists(
        &self,
        phone_number: &str,
        exclude_id: Option<&str>,
    ) -> AppResult<bool>;
}

/// Concrete implementation of UserService using repositories.
pub struct UserManager {
    repo: Arc<dyn UserRepository>,
    counter: MemberCounter,
}

impl UserManager {
    pub fn new(repo: Arc<dyn UserRepository>, counter: MemberCounter) -> Self {
        Self { repo, counter }
    }
}

#[async_trait]
impl UserService for UserManager {
    async fn list_users(
        &self,
        params: UserListParams,
        viewer_id: Option<&str>,
    ) -> AppResult<Paginated<ManagedUser>> {
        let (page, limit, offset) = (params.page(), params.limit(), params.offset());
        let query = UserQuery::from_params(&params);

        let (profiles, total) = match params.filter.search_term() {
            // Store pages directly
            None => {
                let paged = query.clone().paged(offset, limit);
                tokio::try_join!(self.repo.query(&paged), self.repo.count(&query))?
            }
            // Search runs after retrieval, so total and page come from the
            // searched set
            Some(term) => {
                let matched: Vec<_> = self
                    .repo
                    .query(&query)
                    .await?
                    .into_iter()
                    .filter(|profile| UserFilter::matches_search(&term, profile))
                    .collect();
                let total = matched.len() as u64;
                let page_items = matched
                    .into_iter()
                    .skip(usize::try_from(offset).unwrap_or(usize::MAX))
                    .take(limit as usize)
                    .collect();
                (page_items, total)
            }
        };

        tracing::debug!(page, limit, total, "Listed users");

        Ok(Paginated::new(profiles, page, limit, total)
            .map(|profile| ManagedUser::for_viewer(profile, viewer_id)))
    }

    async fn get_user(&self, id: &str, viewer_id: Option<&str>) -> AppResult<ManagedUser> {
        let profile = self.repo.find_by_id(id).await?.ok_or_not_found()?;
        Ok(ManagedUser::for_viewer(profile, viewer_id))
    }

    async fn get_user_statistics(&self) -> AppResult<UserStatistics> {
        let profiles = self.repo.list_all().await?;
        Ok(UserStatistics::from_profiles(&profiles))
    }

    async fn create_user(&self, form: UserFormData, created_by: &str) -> AppResult<String> {
        form.validate_form()?;
        let form = form.normalized();
        let roles = form.roles.clone();

        let id = self
            .repo
            .insert(NewUserProfile::from_form(form, created_by, Utc::now()))
            .await?;
        tracing::info!(user_id = %id, created_by, "User created");

        self.counter.increment(&roles).await;
        Ok(id)
    }

    async fn update_user(&self, id: &str, form: UserFormData, updated_by: &str) -> AppResult<()> {
        form.validate_form()?;
        let form = form.normalized();

        let existing = self.repo.find_by_id(id).await?.ok_or_not_found()?;
        let roles = form.roles.clone();

        self.repo
            .update(id, ProfileChanges::from_form(form, updated_by, Utc::now()))
            .await?;
        tracing::info!(user_id = %id, updated_by, "User updated");

        self.counter.record(&existing.roles, &roles).await;
        Ok(())
    }

    async fn delete_user(&self, id: &str, acting_user_id: &str) -> AppResult<()> {
        if id == acting_user_id {
            return Err(AppError::invalid_operation("Cannot delete your own account"));
        }

        let existing = self.repo.find_by_id(id).await?.ok_or_not_found()?;
        self.repo.delete(id).await?;
        tracing::info!(user_id = %id, deleted_by = acting_user_id, "User deleted");

        self.counter.decrement(&existing.roles).await;
        Ok(())
    }

    async fn toggle_user_status(
        &self,
        id: &str,
        is_active: bool,
        acting_user_id: &str,
    ) -> AppResult<()> {
        if id == acting_user_id && !is_active {
            return Err(AppError::invalid_operation(
                "Cannot deactivate your own account",
            ));
        }

        self.repo.set_active(id, is_active, Utc::now()).await?;
        tracing::info!(user_id = %id, is_active, changed_by = acting_user_id, "User status changed");
        Ok(())
    }

    async fn check_phone_number_exists(
        &self,
        phone_number: &str,
        exclude_id: Option<&str>,
    ) -> AppResult<bool> {
        let matches = self.repo.find_by_phone(phone_number).await?;
        Ok(matches
            .iter()
            .any(|profile| Some(profile.id.as_str()) != exclude_id))
    }
}
