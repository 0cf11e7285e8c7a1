//! Role group entity for SeaORM.

use sea_orm::entity::prelude::*;
use sea_orm::Set;

use domain::RoleGroup;

use super::{decode_roles, encode_roles};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "user_groups")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub name: String,
    #[sea_orm(column_type = "Text")]
    pub description: String,
    #[sea_orm(column_type = "JsonBinary")]
    pub roles: Json,
    pub color: Option<String>,
    pub is_default: bool,
    pub member_count: i64,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
    pub created_by: String,
    pub deleted_at: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for RoleGroup {
    fn from(model: Model) -> Self {
        RoleGroup {
            id: model.id,
            name: model.name,
            description: model.description,
            roles: decode_roles(&model.roles),
            color: model.color,
            is_default: model.is_default,
            member_count: model.member_count,
            created_at: model.created_at,
            updated_at: model.updated_at,
            created_by: model.created_by,
            deleted_at: model.deleted_at,
        }
    }
}

impl From<RoleGroup> for ActiveModel {
    fn from(group: RoleGroup) -> Self {
        ActiveModel {
            id: Set(group.id),
            name: Set(group.name),
            description: Set(group.description),
            roles: Set(encode_roles(&group.roles)),
            color: Set(group.color),
            is_default: Set(group.is_default),
            member_count: Set(group.member_count),
            created_at: Set(group.created_at),
            updated_at: Set(group.updated_at),
            created_by: Set(group.created_by),
            deleted_at: Set(group.deleted_at),
        }
    }
}
