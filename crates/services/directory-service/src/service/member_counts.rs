//! Group member count bookkeeping.
//!
//! Counts are derived values. Profile writes adjust them incrementally;
//! [`compute_member_counts`] rebuilds them from scratch. Incremental
//! failures are logged and swallowed: the profile write that triggered them
//! has already succeeded.

use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;

use chrono::Utc;
use futures::future::try_join_all;

use common::{AppError, AppResult};
use domain::{Role, RoleGroup, UserProfile};

use crate::repository::{GroupRepository, MemberDelta};

/// How a profile contributes to a group's member count.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MemberCountPolicy {
    /// One unit per (profile role, group containing it) pair. A profile
    /// holding two of a group's roles counts twice.
    #[default]
    PerRole,
    /// One unit per profile sharing at least one role with the group.
    PerGroup,
}

impl MemberCountPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            MemberCountPolicy::PerRole => "per-role",
            MemberCountPolicy::PerGroup => "per-group",
        }
    }
}

impl FromStr for MemberCountPolicy {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "per-role" | "per_role" => Ok(MemberCountPolicy::PerRole),
            "per-group" | "per_group" => Ok(MemberCountPolicy::PerGroup),
            other => Err(AppError::validation(format!(
                "Unknown member count policy '{}'",
                other
            ))),
        }
    }
}

impl std::fmt::Display for MemberCountPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Applies role changes of a single profile to the matching groups.
#[derive(Clone)]
pub struct MemberCounter {
    groups: Arc<dyn GroupRepository>,
    policy: MemberCountPolicy,
}

impl MemberCounter {
    pub fn new(groups: Arc<dyn GroupRepository>, policy: MemberCountPolicy) -> Self {
        Self { groups, policy }
    }

    pub fn policy(&self) -> MemberCountPolicy {
        self.policy
    }

    /// A profile was created with `roles`.
    pub async fn increment(&self, roles: &[Role]) {
        self.record(&[], roles).await
    }

    /// A profile holding `roles` was removed.
    pub async fn decrement(&self, roles: &[Role]) {
        self.record(roles, &[]).await
    }

    /// A profile's role set changed from `before` to `after`. Every
    /// adjustment lands in one batch.
    pub async fn record(&self, before: &[Role], after: &[Role]) {
        let added = missing_from(after, before);
        let removed = missing_from(before, after);
        if added.is_empty() && removed.is_empty() {
            return;
        }

        match self.try_record(before, after, &added, &removed).await {
            Ok(touched) => {
                tracing::debug!(?added, ?removed, groups = touched, "Member counts adjusted")
            }
            Err(e) => {
                tracing::warn!(error = %e, ?added, ?removed, "Failed to adjust group member counts")
            }
        }
    }

    async fn try_record(
        &self,
        before: &[Role],
        after: &[Role],
        added: &[Role],
        removed: &[Role],
    ) -> AppResult<usize> {
        let deltas = match self.policy {
            MemberCountPolicy::PerRole => {
                let mut deltas = self.per_role_deltas(added, 1).await?;
                deltas.extend(self.per_role_deltas(removed, -1).await?);
                merge_deltas(deltas)
            }
            MemberCountPolicy::PerGroup => {
                let changed: Vec<Role> = added.iter().chain(removed).copied().collect();
                self.per_group_deltas(before, after, &changed).await?
            }
        };

        if deltas.is_empty() {
            return Ok(0);
        }
        self.groups.apply_member_deltas(&deltas, Utc::now()).await?;
        Ok(deltas.len())
    }

    /// Groups containing each of `roles`, one lookup per role.
    async fn groups_for(&self, roles: &[Role]) -> AppResult<Vec<RoleGroup>> {
        if roles.is_empty() {
            return Ok(Vec::new());
        }

        let per_role =
            try_join_all(roles.iter().map(|role| self.groups.find_containing_role(*role))).await?;
        Ok(per_role.into_iter().flatten().collect())
    }

    async fn per_role_deltas(&self, roles: &[Role], sign: i64) -> AppResult<Vec<MemberDelta>> {
        Ok(self
            .groups_for(roles)
            .await?
            .into_iter()
            .map(|group| MemberDelta::new(group.id, sign))
            .collect())
    }

    /// Only groups containing a changed role can gain or lose the profile;
    /// each moves by the difference in membership, never more than one.
    async fn per_group_deltas(
        &self,
        before: &[Role],
        after: &[Role],
        changed: &[Role],
    ) -> AppResult<Vec<MemberDelta>> {
        let mut seen: Vec<String> = Vec::new();
        let mut deltas = Vec::new();

        for group in self.groups_for(changed).await? {
            if seen.contains(&group.id) {
                continue;
            }
            let was_member = before.iter().any(|role| group.matches_role(*role));
            let is_member = after.iter().any(|role| group.matches_role(*role));
            seen.push(group.id.clone());

            let delta = i64::from(is_member) - i64::from(was_member);
            if delta != 0 {
                deltas.push(MemberDelta::new(group.id, delta));
            }
        }
        Ok(deltas)
    }
}

/// Roles of `roles` that `other` lacks, in order.
fn missing_from(roles: &[Role], other: &[Role]) -> Vec<Role> {
    roles
        .iter()
        .copied()
        .filter(|role| !other.contains(role))
        .collect()
}

/// Sum deltas per group, keeping first-seen order and dropping zeros.
fn merge_deltas(deltas: Vec<MemberDelta>) -> Vec<MemberDelta> {
    let mut merged: Vec<MemberDelta> = Vec::with_capacity(deltas.len());
    for delta in deltas {
        match merged.iter_mut().find(|m| m.group_id == delta.group_id) {
            Some(existing) => existing.delta += delta.delta,
            None => merged.push(delta),
        }
    }
    merged.retain(|m| m.delta != 0);
    merged
}

/// Member counts rebuilt from active profiles only.
pub fn compute_member_counts(
    policy: MemberCountPolicy,
    profiles: &[UserProfile],
    groups: &[RoleGroup],
) -> Vec<MemberDelta> {
    let active: Vec<&UserProfile> = profiles.iter().filter(|p| p.is_active).collect();

    match policy {
        MemberCountPolicy::PerRole => {
            let mut per_role: HashMap<Role, i64> = HashMap::new();
            for profile in &active {
                for role in &profile.roles {
                    *per_role.entry(*role).or_default() += 1;
                }
            }
            groups
                .iter()
                .map(|group| {
                    let count = group
                        .roles
                        .iter()
                        .map(|role| per_role.get(role).copied().unwrap_or(0))
                        .sum();
                    MemberDelta::new(group.id.clone(), count)
                })
                .collect()
        }
        MemberCountPolicy::PerGroup => groups
            .iter()
            .map(|group| {
                let count = active
                    .iter()
                    .filter(|p| p.roles.iter().any(|r| group.matches_role(*r)))
                    .count() as i64;
                MemberDelta::new(group.id.clone(), count)
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::MockGroupRepository;
    use domain::{Grade, NewRoleGroup, NewUserProfile};

    fn group(id: &str, roles: Vec<Role>) -> RoleGroup {
        NewRoleGroup {
            name: id.to_string(),
            description: String::new(),
            roles,
            color: None,
            created_at: Utc::now(),
            created_by: "test".to_string(),
        }
        .into_group(id.to_string())
    }

    fn profile(id: &str, roles: Vec<Role>, is_active: bool) -> UserProfile {
        NewUserProfile {
            phone_number: "+84912345678".to_string(),
            display_name: id.to_string(),
            birth_year: 1990,
            club: None,
            roles,
            grade: Grade::C,
            rating_points: 0,
            is_active,
            last_login_at: None,
            created_at: Utc::now(),
            created_by: "test".to_string(),
        }
        .into_profile(id.to_string())
    }

    #[test]
    fn policy_parses() {
        assert_eq!("per-group".parse::<MemberCountPolicy>().unwrap(), MemberCountPolicy::PerGroup);
        assert_eq!("PER_ROLE".parse::<MemberCountPolicy>().unwrap(), MemberCountPolicy::PerRole);
        assert!("both".parse::<MemberCountPolicy>().is_err());
    }

    #[test]
    fn merge_sums_and_drops_zero() {
        let merged = merge_deltas(vec![
            MemberDelta::new("a", 1),
            MemberDelta::new("b", 1),
            MemberDelta::new("a", 1),
            MemberDelta::new("b", -1),
        ]);
        assert_eq!(merged, vec![MemberDelta::new("a", 2)]);
    }

    #[test]
    fn recount_per_role_sums_role_counts() {
        let groups = vec![
            group("captains", vec![Role::Captain, Role::Player, Role::Member]),
            group("admins", vec![Role::Admin]),
        ];
        let profiles = vec![
            profile("u1", vec![Role::Captain, Role::Player, Role::Member], true),
            profile("u2", vec![Role::Player, Role::Member], true),
            profile("u3", vec![Role::Player, Role::Member], false),
        ];

        let counts = compute_member_counts(MemberCountPolicy::PerRole, &profiles, &groups);
        assert_eq!(
            counts,
            vec![MemberDelta::new("captains", 5), MemberDelta::new("admins", 0)]
        );
    }

    #[test]
    fn recount_per_group_counts_profiles_once() {
        let groups = vec![group("captains", vec![Role::Captain, Role::Player, Role::Member])];
        let profiles = vec![
            profile("u1", vec![Role::Captain, Role::Player, Role::Member], true),
            profile("u2", vec![Role::Player, Role::Member], true),
        ];

        let counts = compute_member_counts(MemberCountPolicy::PerGroup, &profiles, &groups);
        assert_eq!(counts, vec![MemberDelta::new("captains", 2)]);
    }

    #[tokio::test]
    async fn per_role_increment_touches_group_once_per_role() {
        let mut groups = MockGroupRepository::new();
        groups
            .expect_find_containing_role()
            .returning(|role| match role {
                Role::Organizer => Ok(vec![group("organizers", vec![Role::Organizer, Role::Member])]),
                Role::Member => Ok(vec![
                    group("organizers", vec![Role::Organizer, Role::Member]),
                    group("members", vec![Role::Member]),
                ]),
                _ => Ok(vec![]),
            });
        groups
            .expect_apply_member_deltas()
            .withf(|deltas, _| {
                deltas.to_vec()
                    == vec![
                        MemberDelta::new("organizers", 2),
                        MemberDelta::new("members", 1),
                    ]
            })
            .times(1)
            .returning(|_, _| Ok(()));

        let counter = MemberCounter::new(Arc::new(groups), MemberCountPolicy::PerRole);
        counter.increment(&[Role::Organizer, Role::Member]).await;
    }

    #[tokio::test]
    async fn store_failure_is_swallowed() {
        let mut groups = MockGroupRepository::new();
        groups
            .expect_find_containing_role()
            .returning(|_| Ok(vec![group("members", vec![Role::Member])]));
        groups
            .expect_apply_member_deltas()
            .times(1)
            .returning(|_, _| Err(AppError::store_unavailable("connection reset")));

        let counter = MemberCounter::new(Arc::new(groups), MemberCountPolicy::PerRole);
        counter.decrement(&[Role::Member]).await;
    }

    fn player_member_groups() -> MockGroupRepository {
        let mut groups = MockGroupRepository::new();
        groups
            .expect_find_containing_role()
            .returning(|role| match role {
                Role::Player | Role::Member => {
                    Ok(vec![group("players", vec![Role::Player, Role::Member])])
                }
                Role::Referee => Ok(vec![group("referees", vec![Role::Referee])]),
                _ => Ok(vec![]),
            });
        groups
    }

    #[tokio::test]
    async fn per_group_keeps_count_while_a_shared_role_remains() {
        let mut groups = player_member_groups();
        groups.expect_apply_member_deltas().never();

        let counter = MemberCounter::new(Arc::new(groups), MemberCountPolicy::PerGroup);
        counter
            .record(&[Role::Player, Role::Member], &[Role::Member])
            .await;
        counter
            .record(&[Role::Member], &[Role::Player, Role::Member])
            .await;
    }

    #[tokio::test]
    async fn per_group_moves_by_one_when_membership_changes() {
        let mut groups = player_member_groups();
        groups
            .expect_apply_member_deltas()
            .withf(|deltas, _| {
                deltas.to_vec()
                    == vec![
                        MemberDelta::new("referees", 1),
                        MemberDelta::new("players", -1),
                    ]
            })
            .times(1)
            .returning(|_, _| Ok(()));

        let counter = MemberCounter::new(Arc::new(groups), MemberCountPolicy::PerGroup);
        counter
            .record(&[Role::Player, Role::Member], &[Role::Referee])
            .await;
    }

    #[tokio::test]
    async fn no_roles_means_no_store_calls() {
        let groups = MockGroupRepository::new();
        let counter = MemberCounter::new(Arc::new(groups), MemberCountPolicy::PerGroup);
        counter.record(&[], &[]).await;
    }
}
