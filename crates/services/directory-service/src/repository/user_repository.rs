//! User profile repository.
//!
//! Soft-deleted profiles are invisible to every read.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::sea_query::{Expr, NullOrdering, Order};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Select, Set,
};
use uuid::Uuid;

use super::entities::{join_roles, like_prefix};
use super::entities::user::{self, ActiveModel, Entity as UserEntity};
use super::query::UserQuery;
use common::{AppError, AppResult};
use domain::{NewUserProfile, ProfileChanges, SortDirection, UserProfile, UserSortField};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// User repository trait for dependency injection.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Find a live profile by id
    async fn find_by_id(&self, id: &str) -> AppResult<Option<UserProfile>>;

    /// Every live profile with this exact phone number
    async fn find_by_phone(&self, phone_number: &str) -> AppResult<Vec<UserProfile>>;

    /// Profiles matching the store-level filters, ordered and paged
    async fn query(&self, query: &UserQuery) -> AppResult<Vec<UserProfile>>;

    /// Number of profiles matching the filters; paging is ignored
    async fn count(&self, query: &UserQuery) -> AppResult<u64>;

    /// Every live profile
    async fn list_all(&self) -> AppResult<Vec<UserProfile>>;

    /// Insert a new profile and return its generated id
    async fn insert(&self, profile: NewUserProfile) -> AppResult<String>;

    /// Create or overwrite a profile under its own id
    async fn put(&self, profile: UserProfile) -> AppResult<()>;

    /// Overwrite the editable fields of a live profile
    async fn update(&self, id: &str, changes: ProfileChanges) -> AppResult<()>;

    async fn set_active(&self, id: &str, is_active: bool, at: DateTime<Utc>) -> AppResult<()>;

    async fn touch_last_login(&self, id: &str, at: DateTime<Utc>) -> AppResult<()>;

    /// Remove a profile permanently
    async fn delete(&self, id: &str) -> AppResult<()>;

    /// Soft delete (sets deleted_at); missing ids are ignored
    async fn mark_deleted(&self, id: &str, at: DateTime<Utc>) -> AppResult<()>;

    /// Check that the store answers
    async fn ping(&self) -> AppResult<()>;
}

/// PostgreSQL implementation of UserRepository
pub struct UserStore {
    db: DatabaseConnection,
}

impl UserStore {
    /// Create new repository instance
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    fn live() -> Select<UserEntity> {
        UserEntity::find().filter(user::Column::DeletedAt.is_null())
    }

    fn filtered(query: &UserQuery) -> Select<UserEntity> {
        let mut select = Self::live();

        if !query.roles_any.is_empty() {
            select = select.filter(Expr::cust_with_values(
                "jsonb_exists_any(roles, string_to_array($1, ','))",
                [join_roles(&query.roles_any)],
            ));
        }
        if !query.grades.is_empty() {
            select = select.filter(user::Column::Grade.is_in(query.grades.iter().map(|g| g.as_str())));
        }
        if let Some(active) = query.is_active {
            select = select.filter(user::Column::IsActive.eq(active));
        }
        if let Some(club) = &query.club_prefix {
            select = select.filter(Expr::cust_with_values(
                r"club LIKE $1 ESCAPE '\'",
                [like_prefix(club)],
            ));
        }
        if let Some(after) = query.created_after {
            select = select.filter(user::Column::CreatedAt.gte(after));
        }
        if let Some(before) = query.created_before {
            select = select.filter(user::Column::CreatedAt.lte(before));
        }

        select
    }

    fn ordered(select: Select<UserEntity>, query: &UserQuery) -> Select<UserEntity> {
        let column = match query.sort_by {
            UserSortField::DisplayName => user::Column::DisplayName,
            UserSortField::PhoneNumber => user::Column::PhoneNumber,
            UserSortField::Grade => user::Column::Grade,
            UserSortField::LastLoginAt => user::Column::LastLoginAt,
            UserSortField::CreatedAt => user::Column::CreatedAt,
        };
        let (order, nulls) = match query.sort_direction {
            SortDirection::Asc => (Order::Asc, NullOrdering::First),
            SortDirection::Desc => (Order::Desc, NullOrdering::Last),
        };

        select
            .order_by_with_nulls(column, order, nulls)
            .order_by_asc(user::Column::CreatedAt)
            .order_by_asc(user::Column::Id)
    }

    async fn find_live_model(&self, id: &str) -> AppResult<user::Model> {
        Self::live()
            .filter(user::Column::Id.eq(id))
            .one(&self.db)
            .await?
            .ok_or(AppError::NotFound)
    }
}

#[async_trait]
impl UserRepository for UserStore {
    async fn find_by_id(&self, id: &str) -> AppResult<Option<UserProfile>> {
        let result = Self::live()
            .filter(user::Column::Id.eq(id))
            .one(&self.db)
            .await
            .map_err(AppError::from)?;

        Ok(result.map(UserProfile::from))
    }

    async fn find_by_phone(&self, phone_number: &str) -> AppResult<Vec<UserProfile>> {
        let models = Self::live()
            .filter(user::Column::PhoneNumber.eq(phone_number))
            .order_by_asc(user::Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(AppError::from)?;

        Ok(models.into_iter().map(UserProfile::from).collect())
    }

    async fn query(&self, query: &UserQuery) -> AppResult<Vec<UserProfile>> {
        let models = Self::ordered(Self::filtered(query), query)
            .offset(query.offset)
            .limit(query.limit)
            .all(&self.db)
            .await
            .map_err(AppError::from)?;

        Ok(models.into_iter().map(UserProfile::from).collect())
    }

    async fn count(&self, query: &UserQuery) -> AppResult<u64> {
        Self::filtered(query)
            .count(&self.db)
            .await
            .map_err(AppError::from)
    }

    async fn list_all(&self) -> AppResult<Vec<UserProfile>> {
        let models = Self::live()
            .order_by_asc(user::Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(AppError::from)?;

        Ok(models.into_iter().map(UserProfile::from).collect())
    }

    async fn insert(&self, profile: NewUserProfile) -> AppResult<String> {
        let id = Uuid::new_v4().to_string();
        let active: ActiveModel = profile.into_profile(id.clone()).into();

        active.insert(&self.db).await.map_err(AppError::from)?;
        Ok(id)
    }

    async fn put(&self, profile: UserProfile) -> AppResult<()> {
        let exists = UserEntity::find_by_id(profile.id.clone())
            .one(&self.db)
            .await?
            .is_some();

        let active: ActiveModel = profile.into();
        if exists {
            active.update(&self.db).await.map_err(AppError::from)?;
        } else {
            active.insert(&self.db).await.map_err(AppError::from)?;
        }
        Ok(())
    }

    async fn update(&self, id: &str, changes: ProfileChanges) -> AppResult<()> {
        let model = self.find_live_model(id).await?;
        let mut profile = UserProfile::from(model);
        changes.apply_to(&mut profile);

        let active: ActiveModel = profile.into();
        active.update(&self.db).await.map_err(AppError::from)?;
        Ok(())
    }

    async fn set_active(&self, id: &str, is_active: bool, at: DateTime<Utc>) -> AppResult<()> {
        let model = self.find_live_model(id).await?;

        let mut active: ActiveModel = model.into();
        active.is_active = Set(is_active);
        active.updated_at = Set(at);

        active.update(&self.db).await.map_err(AppError::from)?;
        Ok(())
    }

    async fn touch_last_login(&self, id: &str, at: DateTime<Utc>) -> AppResult<()> {
        let result = UserEntity::update_many()
            .col_expr(user::Column::LastLoginAt, Expr::value(Some(at)))
            .col_expr(user::Column::UpdatedAt, Expr::value(at))
            .filter(user::Column::Id.eq(id))
            .filter(user::Column::DeletedAt.is_null())
            .exec(&self.db)
            .await
            .map_err(AppError::from)?;

        if result.rows_affected == 0 {
            return Err(AppError::NotFound);
        }
        Ok(())
    }

    async fn delete(&self, id: &str) -> AppResult<()> {
        let result = UserEntity::delete_many()
            .filter(user::Column::Id.eq(id))
            .filter(user::Column::DeletedAt.is_null())
            .exec(&self.db)
            .await
            .map_err(AppError::from)?;

        if result.rows_affected == 0 {
            return Err(AppError::NotFound);
        }
        Ok(())
    }

    async fn mark_deleted(&self, id: &str, at: DateTime<Utc>) -> AppResult<()> {
        UserEntity::update_many()
            .col_expr(user::Column::DeletedAt, Expr::value(Some(at)))
            .col_expr(user::Column::UpdatedAt, Expr::value(at))
            .filter(user::Column::Id.eq(id))
            .filter(user::Column::DeletedAt.is_null())
            .exec(&self.db)
            .await
            .map_err(AppError::from)?;
        Ok(())
    }

    async fn ping(&self) -> AppResult<()> {
        crate::infra::ping_connection(&self.db)
            .await
            .map_err(AppError::from)
    }
}
