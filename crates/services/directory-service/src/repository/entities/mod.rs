//! SeaORM entities.
//!
//! Role lists are stored as JSONB arrays of role names.

pub mod user;
pub mod user_group;

use domain::Role;
use serde_json::Value as JsonValue;

/// Encode roles as a JSON array of names.
pub fn encode_roles(roles: &[Role]) -> JsonValue {
    JsonValue::Array(
        roles
            .iter()
            .map(|role| JsonValue::String(role.as_str().to_string()))
            .collect(),
    )
}

/// Decode a stored role array, skipping names this build does not know.
pub fn decode_roles(value: &JsonValue) -> Vec<Role> {
    match value {
        JsonValue::Array(items) => items
            .iter()
            .filter_map(JsonValue::as_str)
            .filter_map(|name| match name.parse::<Role>() {
                Ok(role) => Some(role),
                Err(_) => {
                    tracing::warn!(role = name, "Skipping unknown stored role");
                    None
                }
            })
            .collect(),
        _ => Vec::new(),
    }
}

/// Join role names for `string_to_array(.., ',')`.
pub fn join_roles(roles: &[Role]) -> String {
    roles
        .iter()
        .map(|role| role.as_str())
        .collect::<Vec<_>>()
        .join(",")
}

/// `LIKE` pattern matching values that begin with `prefix` literally.
/// Pair with `ESCAPE '\'`.
pub fn like_prefix(prefix: &str) -> String {
    let mut pattern = String::with_capacity(prefix.len() + 1);
    for ch in prefix.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(ch);
    }
    pattern.push('%');
    pattern
}
