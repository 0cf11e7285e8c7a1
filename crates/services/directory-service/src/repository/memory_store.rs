//! In-memory store for tests and local runs.
//!
//! Records keep insertion order, which is also the tie-break for sorting.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::group_repository::{GroupRepository, MemberDelta};
use super::query::UserQuery;
use super::user_repository::UserRepository;
use common::{AppError, AppResult};
use domain::{GroupChanges, NewRoleGroup, NewUserProfile, ProfileChanges, Role, RoleGroup, UserProfile};

#[derive(Default)]
pub struct MemoryStore {
    users: RwLock<Vec<UserProfile>>,
    groups: RwLock<Vec<RoleGroup>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn live_user_mut<'a>(users: &'a mut [UserProfile], id: &str) -> AppResult<&'a mut UserProfile> {
        users
            .iter_mut()
            .find(|u| u.id == id && !u.is_deleted())
            .ok_or(AppError::NotFound)
    }

    fn live_group_mut<'a>(groups: &'a mut [RoleGroup], id: &str) -> AppResult<&'a mut RoleGroup> {
        groups
            .iter_mut()
            .find(|g| g.id == id && !g.is_deleted())
            .ok_or(AppError::NotFound)
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn find_by_id(&self, id: &str) -> AppResult<Option<UserProfile>> {
        let users = self.users.read().await;
        Ok(users.iter().find(|u| u.id == id && !u.is_deleted()).cloned())
    }

    async fn find_by_phone(&self, phone_number: &str) -> AppResult<Vec<UserProfile>> {
        let users = self.users.read().await;
        Ok(users
            .iter()
            .filter(|u| u.phone_number == phone_number && !u.is_deleted())
            .cloned()
            .collect())
    }

    async fn query(&self, query: &UserQuery) -> AppResult<Vec<UserProfile>> {
        let users = self.users.read().await;
        let mut matched: Vec<UserProfile> =
            users.iter().filter(|u| query.matches(u)).cloned().collect();
        // Stable: equal keys keep insertion order
        matched.sort_by(|a, b| query.compare(a, b));

        let offset = usize::try_from(query.offset.unwrap_or(0)).unwrap_or(usize::MAX);
        let limit = query.limit.map_or(usize::MAX, |l| l as usize);
        Ok(matched.into_iter().skip(offset).take(limit).collect())
    }

    async fn count(&self, query: &UserQuery) -> AppResult<u64> {
        let users = self.users.read().await;
        Ok(users.iter().filter(|u| query.matches(u)).count() as u64)
    }

    async fn list_all(&self) -> AppResult<Vec<UserProfile>> {
        let users = self.users.read().await;
        Ok(users.iter().filter(|u| !u.is_deleted()).cloned().collect())
    }

    async fn insert(&self, profile: NewUserProfile) -> AppResult<String> {
        let id = Uuid::new_v4().to_string();
        self.users.write().await.push(profile.into_profile(id.clone()));
        Ok(id)
    }

    async fn put(&self, profile: UserProfile) -> AppResult<()> {
        let mut users = self.users.write().await;
        match users.iter_mut().find(|u| u.id == profile.id) {
            Some(existing) => *existing = profile,
            None => users.push(profile),
        }
        Ok(())
    }

    async fn update(&self, id: &str, changes: ProfileChanges) -> AppResult<()> {
        let mut users = self.users.write().await;
        changes.apply_to(Self::live_user_mut(&mut users, id)?);
        Ok(())
    }

    async fn set_active(&self, id: &str, is_active: bool, at: DateTime<Utc>) -> AppResult<()> {
        let mut users = self.users.write().await;
        let user = Self::live_user_mut(&mut users, id)?;
        user.is_active = is_active;
        user.updated_at = at;
        Ok(())
    }

    async fn touch_last_login(&self, id: &str, at: DateTime<Utc>) -> AppResult<()> {
        let mut users = self.users.write().await;
        let user = Self::live_user_mut(&mut users, id)?;
        user.last_login_at = Some(at);
        user.updated_at = at;
        Ok(())
    }

    async fn delete(&self, id: &str) -> AppResult<()> {
        let mut users = self.users.write().await;
        let position = users
            .iter()
            .position(|u| u.id == id && !u.is_deleted())
            .ok_or(AppError::NotFound)?;
        users.remove(position);
        Ok(())
    }

    async fn mark_deleted(&self, id: &str, at: DateTime<Utc>) -> AppResult<()> {
        let mut users = self.users.write().await;
        if let Ok(user) = Self::live_user_mut(&mut users, id) {
            user.deleted_at = Some(at);
            user.updated_at = at;
        }
        Ok(())
    }

    async fn ping(&self) -> AppResult<()> {
        Ok(())
    }
}

#[async_trait]
impl GroupRepository for MemoryStore {
    async fn list(&self) -> AppResult<Vec<RoleGroup>> {
        let groups = self.groups.read().await;
        let mut live: Vec<RoleGroup> = groups.iter().filter(|g| !g.is_deleted()).cloned().collect();
        live.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(live)
    }

    async fn find_by_id(&self, id: &str) -> AppResult<Option<RoleGroup>> {
        let groups = self.groups.read().await;
        Ok(groups.iter().find(|g| g.id == id && !g.is_deleted()).cloned())
    }

    async fn find_containing_role(&self, role: Role) -> AppResult<Vec<RoleGroup>> {
        let groups = self.groups.read().await;
        Ok(groups
            .iter()
            .filter(|g| !g.is_deleted() && g.matches_role(role))
            .cloned()
            .collect())
    }

    async fn insert(&self, group: NewRoleGroup) -> AppResult<String> {
        let id = Uuid::new_v4().to_string();
        self.groups.write().await.push(group.into_group(id.clone()));
        Ok(id)
    }

    async fn put(&self, group: RoleGroup) -> AppResult<()> {
        let mut groups = self.groups.write().await;
        match groups.iter_mut().find(|g| g.id == group.id) {
            Some(existing) => *existing = group,
            None => groups.push(group),
        }
        Ok(())
    }

    async fn update(&self, id: &str, changes: GroupChanges) -> AppResult<()> {
        let mut groups = self.groups.write().await;
        changes.apply_to(Self::live_group_mut(&mut groups, id)?);
        Ok(())
    }

    async fn delete(&self, id: &str) -> AppResult<()> {
        let mut groups = self.groups.write().await;
        let position = groups
            .iter()
            .position(|g| g.id == id && !g.is_deleted())
            .ok_or(AppError::NotFound)?;
        groups.remove(position);
        Ok(())
    }

    async fn apply_member_deltas(
        &self,
        deltas: &[MemberDelta],
        at: DateTime<Utc>,
    ) -> AppResult<()> {
        let mut groups = self.groups.write().await;

        // All-or-nothing: resolve every target before touching any
        let mut positions = HashMap::with_capacity(deltas.len());
        for MemberDelta { group_id, .. } in deltas {
            let position = groups
                .iter()
                .position(|g| &g.id == group_id && !g.is_deleted())
                .ok_or(AppError::NotFound)?;
            positions.insert(group_id.as_str(), position);
        }

        for MemberDelta { group_id, delta } in deltas {
            let group = &mut groups[positions[group_id.as_str()]];
            group.member_count = (group.member_count + delta).max(0);
            group.updated_at = at;
        }
        Ok(())
    }

    async fn set_member_counts(&self, counts: &[MemberDelta], at: DateTime<Utc>) -> AppResult<()> {
        let mut groups = self.groups.write().await;
        for MemberDelta { group_id, delta } in counts {
            if let Some(group) = groups.iter_mut().find(|g| &g.id == group_id) {
                group.member_count = (*delta).max(0);
                group.updated_at = at;
            }
        }
        Ok(())
    }

    async fn mark_deleted(&self, id: &str, at: DateTime<Utc>) -> AppResult<()> {
        let mut groups = self.groups.write().await;
        if let Ok(group) = Self::live_group_mut(&mut groups, id) {
            group.deleted_at = Some(at);
            group.updated_at = at;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::{Grade, SortDirection, UserSortField};

    fn new_profile(name: &str, phone: &str, roles: Vec<Role>) -> NewUserProfile {
        NewUserProfile {
            phone_number: phone.to_string(),
            display_name: name.to_string(),
            birth_year: 1990,
            club: None,
            roles,
            grade: Grade::C,
            rating_points: 0,
            is_active: true,
            last_login_at: None,
            created_at: Utc::now(),
            created_by: "test".to_string(),
        }
    }

    fn new_group(name: &str, roles: Vec<Role>) -> NewRoleGroup {
        NewRoleGroup {
            name: name.to_string(),
            description: String::new(),
            roles,
            color: None,
            created_at: Utc::now(),
            created_by: "test".to_string(),
        }
    }

    #[tokio::test]
    async fn equal_sort_keys_keep_insertion_order() {
        let store = MemoryStore::new();
        let first = UserRepository::insert(&store, new_profile("Lan", "+84900000001", vec![Role::Member]))
            .await
            .unwrap();
        let second = UserRepository::insert(&store, new_profile("Lan", "+84900000002", vec![Role::Member]))
            .await
            .unwrap();

        for direction in [SortDirection::Asc, SortDirection::Desc] {
            let query = UserQuery {
                sort_by: UserSortField::DisplayName,
                sort_direction: direction,
                ..Default::default()
            };
            let ids: Vec<String> = store.query(&query).await.unwrap().into_iter().map(|u| u.id).collect();
            assert_eq!(ids, vec![first.clone(), second.clone()]);
        }
    }

    #[tokio::test]
    async fn paging_skips_and_takes() {
        let store = MemoryStore::new();
        for (i, name) in ["An", "Binh", "Chi", "Dung", "Em"].iter().enumerate() {
            UserRepository::insert(&store, new_profile(name, &format!("+8490000000{}", i), vec![Role::Member]))
                .await
                .unwrap();
        }
        let page = store.query(&UserQuery::default().paged(2, 2)).await.unwrap();
        let names: Vec<&str> = page.iter().map(|u| u.display_name.as_str()).collect();
        assert_eq!(names, vec!["Chi", "Dung"]);
        assert_eq!(store.count(&UserQuery::default().paged(2, 2)).await.unwrap(), 5);
    }

    #[tokio::test]
    async fn batch_with_missing_group_applies_nothing() {
        let store = MemoryStore::new();
        let id = GroupRepository::insert(&store, new_group("Members", vec![Role::Member])).await.unwrap();

        let result = store
            .apply_member_deltas(
                &[MemberDelta::new(id.clone(), 1), MemberDelta::new("missing", 1)],
                Utc::now(),
            )
            .await;
        assert!(matches!(result, Err(AppError::NotFound)));

        let group = GroupRepository::find_by_id(&store, &id).await.unwrap().unwrap();
        assert_eq!(group.member_count, 0);
    }

    #[tokio::test]
    async fn member_counts_do_not_go_negative() {
        let store = MemoryStore::new();
        let id = GroupRepository::insert(&store, new_group("Members", vec![Role::Member])).await.unwrap();

        store
            .apply_member_deltas(&[MemberDelta::new(id.clone(), -3)], Utc::now())
            .await
            .unwrap();

        let group = GroupRepository::find_by_id(&store, &id).await.unwrap().unwrap();
        assert_eq!(group.member_count, 0);
    }

    #[tokio::test]
    async fn soft_deleted_profiles_are_hidden() {
        let store = MemoryStore::new();
        let id = UserRepository::insert(&store, new_profile("Lan", "+84900000001", vec![Role::Member]))
            .await
            .unwrap();
        UserRepository::mark_deleted(&store, &id, Utc::now()).await.unwrap();

        assert!(UserRepository::find_by_id(&store, &id).await.unwrap().is_none());
        assert!(store.find_by_phone("+84900000001").await.unwrap().is_empty());
        assert!(store.list_all().await.unwrap().is_empty());
        assert!(matches!(
            store.set_active(&id, false, Utc::now()).await,
            Err(AppError::NotFound)
        ));
    }
}
