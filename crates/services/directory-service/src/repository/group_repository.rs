//! Role group repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    Select, TransactionTrait,
};
use uuid::Uuid;

use super::entities::user_group::{self, ActiveModel, Entity as GroupEntity};
use common::{AppError, AppResult};
use domain::{GroupChanges, NewRoleGroup, Role, RoleGroup};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// A signed change (or, for [`GroupRepository::set_member_counts`], an
/// absolute value) for one group's member count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberDelta {
    pub group_id: String,
    pub delta: i64,
}

impl MemberDelta {
    pub fn new(group_id: impl Into<String>, delta: i64) -> Self {
        Self {
            group_id: group_id.into(),
            delta,
        }
    }
}

/// Group repository trait for dependency injection.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait GroupRepository: Send + Sync {
    /// Every live group, ordered by name
    async fn list(&self) -> AppResult<Vec<RoleGroup>>;

    async fn find_by_id(&self, id: &str) -> AppResult<Option<RoleGroup>>;

    /// Live groups whose role list contains `role`
    async fn find_containing_role(&self, role: Role) -> AppResult<Vec<RoleGroup>>;

    /// Insert a new group and return its generated id
    async fn insert(&self, group: NewRoleGroup) -> AppResult<String>;

    /// Create or overwrite a group under its own id
    async fn put(&self, group: RoleGroup) -> AppResult<()>;

    async fn update(&self, id: &str, changes: GroupChanges) -> AppResult<()>;

    /// Remove a group permanently
    async fn delete(&self, id: &str) -> AppResult<()>;

    /// Add every delta in one atomic write. Counts never drop below zero.
    /// Fails without applying anything if a group is missing.
    async fn apply_member_deltas(&self, deltas: &[MemberDelta], at: DateTime<Utc>)
        -> AppResult<()>;

    /// Overwrite member counts in one atomic write.
    async fn set_member_counts(&self, counts: &[MemberDelta], at: DateTime<Utc>) -> AppResult<()>;

    /// Soft delete (sets deleted_at); missing ids are ignored
    async fn mark_deleted(&self, id: &str, at: DateTime<Utc>) -> AppResult<()>;
}

/// PostgreSQL implementation of GroupRepository
pub struct GroupStore {
    db: DatabaseConnection,
}

impl GroupStore {
    /// Create new repository instance
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    fn live() -> Select<GroupEntity> {
        GroupEntity::find().filter(user_group::Column::DeletedAt.is_null())
    }

    async fn find_live_model(&self, id: &str) -> AppResult<user_group::Model> {
        Self::live()
            .filter(user_group::Column::Id.eq(id))
            .one(&self.db)
            .await?
            .ok_or(AppError::NotFound)
    }
}

#[async_trait]
impl GroupRepository for GroupStore {
    async fn list(&self) -> AppResult<Vec<RoleGroup>> {
        let models = Self::live()
            .order_by_asc(user_group::Column::Name)
            .all(&self.db)
            .await
            .map_err(AppError::from)?;

        Ok(models.into_iter().map(RoleGroup::from).collect())
    }

    async fn find_by_id(&self, id: &str) -> AppResult<Option<RoleGroup>> {
        let result = Self::live()
            .filter(user_group::Column::Id.eq(id))
            .one(&self.db)
            .await
            .map_err(AppError::from)?;

        Ok(result.map(RoleGroup::from))
    }

    async fn find_containing_role(&self, role: Role) -> AppResult<Vec<RoleGroup>> {
        let models = Self::live()
            .filter(Expr::cust_with_values("jsonb_exists(roles, $1)", [role.as_str()]))
            .order_by_asc(user_group::Column::Name)
            .all(&self.db)
            .await
            .map_err(AppError::from)?;

        Ok(models.into_iter().map(RoleGroup::from).collect())
    }

    async fn insert(&self, group: NewRoleGroup) -> AppResult<String> {
        let id = Uuid::new_v4().to_string();
        let active: ActiveModel = group.into_group(id.clone()).into();

        active.insert(&self.db).await.map_err(AppError::from)?;
        Ok(id)
    }

    async fn put(&self, group: RoleGroup) -> AppResult<()> {
        let exists = GroupEntity::find_by_id(group.id.clone())
            .one(&self.db)
            .await?
            .is_some();

        let active: ActiveModel = group.into();
        if exists {
            active.update(&self.db).await.map_err(AppError::from)?;
        } else {
            active.insert(&self.db).await.map_err(AppError::from)?;
        }
        Ok(())
    }

    async fn update(&self, id: &str, changes: GroupChanges) -> AppResult<()> {
        let model = self.find_live_model(id).await?;
        let mut group = RoleGroup::from(model);
        changes.apply_to(&mut group);

        let active: ActiveModel = group.into();
        active.update(&self.db).await.map_err(AppError::from)?;
        Ok(())
    }

    async fn delete(&self, id: &str) -> AppResult<()> {
        let result = GroupEntity::delete_many()
            .filter(user_group::Column::Id.eq(id))
            .filter(user_group::Column::DeletedAt.is_null())
            .exec(&self.db)
            .await
            .map_err(AppError::from)?;

        if result.rows_affected == 0 {
            return Err(AppError::NotFound);
        }
        Ok(())
    }

    async fn apply_member_deltas(
        &self,
        deltas: &[MemberDelta],
        at: DateTime<Utc>,
    ) -> AppResult<()> {
        if deltas.is_empty() {
            return Ok(());
        }

        // Dropping the transaction on an early return rolls it back
        let txn = self.db.begin().await?;
        for MemberDelta { group_id, delta } in deltas {
            let result = GroupEntity::update_many()
                .col_expr(
                    user_group::Column::MemberCount,
                    Expr::cust_with_values("GREATEST(member_count + $1, 0)", [*delta]),
                )
                .col_expr(user_group::Column::UpdatedAt, Expr::value(at))
                .filter(user_group::Column::Id.eq(group_id.as_str()))
                .filter(user_group::Column::DeletedAt.is_null())
                .exec(&txn)
                .await?;

            if result.rows_affected == 0 {
                return Err(AppError::NotFound);
            }
        }
        txn.commit().await?;

        Ok(())
    }

    async fn set_member_counts(&self, counts: &[MemberDelta], at: DateTime<Utc>) -> AppResult<()> {
        let txn = self.db.begin().await?;
        for MemberDelta { group_id, delta } in counts {
            GroupEntity::update_many()
                .col_expr(user_group::Column::MemberCount, Expr::value((*delta).max(0)))
                .col_expr(user_group::Column::UpdatedAt, Expr::value(at))
                .filter(user_group::Column::Id.eq(group_id.as_str()))
                .exec(&txn)
                .await?;
        }
        txn.commit().await?;

        Ok(())
    }

    async fn mark_deleted(&self, id: &str, at: DateTime<Utc>) -> AppResult<()> {
        GroupEntity::update_many()
            .col_expr(user_group::Column::DeletedAt, Expr::value(Some(at)))
            .col_expr(user_group::Column::UpdatedAt, Expr::value(at))
            .filter(user_group::Column::Id.eq(id))
            .filter(user_group::Column::DeletedAt.is_null())
            .exec(&self.db)
            .await
            .map_err(AppError::from)?;
        Ok(())
    }
}
