//! User profile entity for SeaORM.

use sea_orm::entity::prelude::*;
use sea_orm::Set;

use domain::{Grade, Role, UserProfile};

use super::{decode_roles, encode_roles};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub phone_number: String,
    pub display_name: String,
    pub birth_year: i32,
    pub club: Option<String>,
    #[sea_orm(column_type = "JsonBinary")]
    pub roles: Json,
    pub grade: String,
    pub rating_points: i32,
    #[sea_orm(column_type = "JsonBinary")]
    pub device_tokens: Json,
    pub is_active: bool,
    pub last_login_at: Option<DateTimeUtc>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
    pub created_by: String,
    pub updated_by: Option<String>,
    /// Soft delete timestamp (NULL = live, set = cleaned)
    pub deleted_at: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

/// Convert database model to domain entity.
///
/// A profile without roles reads as a plain member and an unknown grade as C.
impl From<Model> for UserProfile {
    fn from(model: Model) -> Self {
        let mut roles = decode_roles(&model.roles);
        if roles.is_empty() {
            roles.push(Role::Member);
        }

        let device_tokens = match model.device_tokens {
            Json::Array(items) => items
                .into_iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect(),
            _ => Vec::new(),
        };

        UserProfile {
            id: model.id,
            phone_number: model.phone_number,
            display_name: model.display_name,
            birth_year: model.birth_year,
            club: model.club,
            roles,
            grade: model.grade.parse().unwrap_or(Grade::C),
            rating_points: model.rating_points,
            device_tokens,
            is_active: model.is_active,
            last_login_at: model.last_login_at,
            created_at: model.created_at,
            updated_at: model.updated_at,
            created_by: model.created_by,
            updated_by: model.updated_by,
            deleted_at: model.deleted_at,
        }
    }
}

/// Every column set from the domain profile.
impl From<UserProfile> for ActiveModel {
    fn from(profile: UserProfile) -> Self {
        ActiveModel {
            id: Set(profile.id),
            phone_number: Set(profile.phone_number),
            display_name: Set(profile.display_name),
            birth_year: Set(profile.birth_year),
            club: Set(profile.club),
            roles: Set(encode_roles(&profile.roles)),
            grade: Set(profile.grade.as_str().to_string()),
            rating_points: Set(profile.rating_points),
            device_tokens: Set(Json::Array(
                profile.device_tokens.into_iter().map(Json::String).collect(),
            )),
            is_active: Set(profile.is_active),
            last_login_at: Set(profile.last_login_at),
            created_at: Set(profile.created_at),
            updated_at: Set(profile.updated_at),
            created_by: Set(profile.created_by),
            updated_by: Set(profile.updated_by),
            deleted_at: Set(profile.deleted_at),
        }
    }
}
