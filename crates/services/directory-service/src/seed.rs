//! Default groups, bootstrap admin and demo profiles.
//!
//! Seeding writes fixed ids, so running it twice overwrites instead of
//! duplicating. Cleaning soft-deletes exactly those ids.

use chrono::{DateTime, Utc};

use common::AppResult;
use domain::{Grade, Role, RoleGroup, UserProfile, SYSTEM_ACTOR};

use crate::repository::Repositories;
use crate::service::GroupService;

struct GroupSeed {
    id: &'static str,
    name: &'static str,
    description: &'static str,
    roles: &'static [Role],
    color: &'static str,
    is_default: bool,
}

const GROUPS: &[GroupSeed] = &[
    GroupSeed {
        id: "admin-group",
        name: "Quản trị viên",
        description: "Toàn quyền quản lý hệ thống",
        roles: &[Role::Admin],
        color: "#ef4444",
        is_default: true,
    },
    GroupSeed {
        id: "organizer-group",
        name: "Ban tổ chức",
        description: "Tổ chức và quản lý giải đấu",
        roles: &[Role::Organizer, Role::Member],
        color: "#8b5cf6",
        is_default: false,
    },
    GroupSeed {
        id: "referee-group",
        name: "Trọng tài",
        description: "Điều hành các trận đấu",
        roles: &[Role::Referee, Role::Member],
        color: "#3b82f6",
        is_default: false,
    },
    GroupSeed {
        id: "treasurer-group",
        name: "Thủ quỹ",
        description: "Quản lý quỹ và lệ phí",
        roles: &[Role::Treasurer, Role::Member],
        color: "#22c55e",
        is_default: false,
    },
    GroupSeed {
        id: "captain-group",
        name: "Đội trưởng",
        description: "Điều phối đội thi đấu",
        roles: &[Role::Captain, Role::Player, Role::Member],
        color: "#f97316",
        is_default: false,
    },
    GroupSeed {
        id: "player-group",
        name: "Người chơi",
        description: "Vận động viên thi đấu",
        roles: &[Role::Player, Role::Member],
        color: "#6366f1",
        is_default: false,
    },
    GroupSeed {
        id: "member-group",
        name: "Thành viên",
        description: "Thành viên câu lạc bộ",
        roles: &[Role::Member],
        color: "#64748b",
        is_default: true,
    },
    GroupSeed {
        id: "viewer-group",
        name: "Khách",
        description: "Chỉ xem thông tin công khai",
        roles: &[Role::Viewer],
        color: "#94a3b8",
        is_default: false,
    },
];

struct UserSeed {
    id: &'static str,
    phone_number: &'static str,
    display_name: &'static str,
    birth_year: i32,
    club: &'static str,
    roles: &'static [Role],
    grade: Grade,
    rating_points: i32,
    is_active: bool,
}

pub const ADMIN_USER_ID: &str = "admin-user-001";

const DEMO_USERS: &[UserSeed] = &[
    UserSeed {
        id: "demo-user-001",
        phone_number: "+84912345678",
        display_name: "Nguyễn Văn An",
        birth_year: 1990,
        club: "Club Bình Thạnh",
        roles: &[Role::Organizer, Role::Member],
        grade: Grade::B,
        rating_points: 850,
        is_active: true,
    },
    UserSeed {
        id: "demo-user-002",
        phone_number: "+84987654321",
        display_name: "Trần Thị Bình",
        birth_year: 1988,
        club: "Club Quận 1",
        roles: &[Role::Referee, Role::Member],
        grade: Grade::B,
        rating_points: 720,
        is_active: true,
    },
    UserSeed {
        id: "demo-user-003",
        phone_number: "+84555123456",
        display_name: "Lê Văn Cường",
        birth_year: 1992,
        club: "Club Thủ Đức",
        roles: &[Role::Treasurer, Role::Member],
        grade: Grade::C,
        rating_points: 650,
        is_active: true,
    },
    UserSeed {
        id: "demo-user-004",
        phone_number: "+84333888999",
        display_name: "Phạm Minh Đức",
        birth_year: 1995,
        club: "Club Gò Vấp",
        roles: &[Role::Captain, Role::Player, Role::Member],
        grade: Grade::A,
        rating_points: 920,
        is_active: true,
    },
    UserSeed {
        id: "demo-user-005",
        phone_number: "+84777555333",
        display_name: "Hoàng Thị Nga",
        birth_year: 1993,
        club: "Club Tân Bình",
        roles: &[Role::Player, Role::Member],
        grade: Grade::B,
        rating_points: 780,
        is_active: false,
    },
];

impl GroupSeed {
    fn build(&self, now: DateTime<Utc>) -> RoleGroup {
        RoleGroup {
            id: self.id.to_string(),
            name: self.name.to_string(),
            description: self.description.to_string(),
            roles: self.roles.to_vec(),
            color: Some(self.color.to_string()),
            is_default: self.is_default,
            member_count: 0,
            created_at: now,
            updated_at: now,
            created_by: SYSTEM_ACTOR.to_string(),
            deleted_at: None,
        }
    }
}

impl UserSeed {
    fn build(&self, now: DateTime<Utc>) -> UserProfile {
        UserProfile {
            id: self.id.to_string(),
            phone_number: self.phone_number.to_string(),
            display_name: self.display_name.to_string(),
            birth_year: self.birth_year,
            club: Some(self.club.to_string()),
            roles: self.roles.to_vec(),
            grade: self.grade,
            rating_points: self.rating_points,
            device_tokens: Vec::new(),
            is_active: self.is_active,
            last_login_at: None,
            created_at: now,
            updated_at: now,
            created_by: SYSTEM_ACTOR.to_string(),
            updated_by: None,
            deleted_at: None,
        }
    }
}

/// The eight default role groups.
pub fn default_groups(now: DateTime<Utc>) -> Vec<RoleGroup> {
    GROUPS.iter().map(|seed| seed.build(now)).collect()
}

/// Bootstrap admin plus demo profiles.
pub fn seed_users(admin_phone: &str, now: DateTime<Utc>) -> Vec<UserProfile> {
    let admin = UserSeed {
        id: ADMIN_USER_ID,
        phone_number: "",
        display_name: "Quản trị viên hệ thống",
        birth_year: 1985,
        club: "Admin Club",
        roles: &[Role::Admin],
        grade: Grade::A,
        rating_points: 1000,
        is_active: true,
    };
    let mut admin = admin.build(now);
    admin.phone_number = admin_phone.to_string();

    std::iter::once(admin)
        .chain(DEMO_USERS.iter().map(|seed| seed.build(now)))
        .collect()
}

/// Every id written by [`seed_database`].
pub fn seeded_ids() -> (Vec<&'static str>, Vec<&'static str>) {
    let users = std::iter::once(ADMIN_USER_ID)
        .chain(DEMO_USERS.iter().map(|seed| seed.id))
        .collect();
    let groups = GROUPS.iter().map(|seed| seed.id).collect();
    (users, groups)
}

/// Outcome of a seeding run.
#[derive(Debug, Clone, PartialEq)]
pub struct SeedReport {
    pub groups: Vec<RoleGroup>,
    pub users: usize,
}

/// Write default groups and seed profiles, then recount members.
pub async fn seed_database(
    repos: &Repositories,
    groups: &dyn GroupService,
    admin_phone: &str,
) -> AppResult<SeedReport> {
    let now = Utc::now();

    for group in default_groups(now) {
        tracing::info!(group_id = %group.id, name = %group.name, "Seeding group");
        repos.groups.put(group).await?;
    }

    let users = seed_users(admin_phone, now);
    let user_count = users.len();
    for user in users {
        tracing::info!(user_id = %user.id, "Seeding profile");
        repos.users.put(user).await?;
    }

    let groups = groups.recompute_member_counts().await?;
    tracing::info!(groups = groups.len(), users = user_count, "Seeding complete");

    Ok(SeedReport {
        groups,
        users: user_count,
    })
}

/// Soft-delete every seeded record.
pub async fn clean_database(repos: &Repositories) -> AppResult<()> {
    let now = Utc::now();
    let (user_ids, group_ids) = seeded_ids();

    for id in &user_ids {
        repos.users.mark_deleted(id, now).await?;
    }
    for id in &group_ids {
        repos.groups.mark_deleted(id, now).await?;
    }

    tracing::info!(
        users = user_ids.len(),
        groups = group_ids.len(),
        "Seeded records cleaned"
    );
    Ok(())
}
