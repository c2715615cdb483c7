//! Roles and permissions (`/roles`)

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{Id, Update, de_id, split_update};
use crate::envelope::{Ack, Paginated, decode_ack, decode_list};
use crate::errors::ApiResult;
use crate::mutation::MutationEndpoint;
use crate::query::QueryEndpoint;
use crate::tags::{Tag, TagType};
use crate::transport::ApiRequest;

pub const ROLES_PATH: &str = "/roles";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    #[serde(deserialize_with = "de_id", alias = "_id")]
    pub id: Id,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub permissions: Vec<String>,
}

impl Role {
    pub fn has_permission(&self, permission: &str) -> bool {
        self.permissions.iter().any(|p| p == permission)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleInput {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub permissions: Vec<String>,
}

fn decode_roles(body: Value) -> ApiResult<Paginated<Role>> {
    decode_list(body, &["roles"])
}

pub fn get_roles() -> QueryEndpoint<(), Paginated<Role>> {
    QueryEndpoint::new("getRoles", |_: &()| Ok(ApiRequest::get(ROLES_PATH)))
        .decode_with(decode_roles)
        .provides_tags(&[TagType::Role])
}

pub fn get_role() -> QueryEndpoint<Id, Role> {
    QueryEndpoint::new("getRole", |id: &Id| {
        Ok(ApiRequest::get(format!("{ROLES_PATH}/{id}")))
    })
    .provides_with(|id: &Id, _: Option<&Role>| vec![Tag::id(TagType::Role, id)])
}

pub fn create_role() -> MutationEndpoint<RoleInput, Role> {
    MutationEndpoint::new("createRole", |input: &RoleInput| {
        ApiRequest::post(ROLES_PATH).json(input)
    })
    .invalidates_tags(&[TagType::Role])
}

/// Users display their role name, so user views refresh too
pub fn update_role() -> MutationEndpoint<Update<RoleInput>, Role> {
    MutationEndpoint::new("updateRole", |update: &Update<RoleInput>| {
        split_update(ApiRequest::put, ROLES_PATH, update)
    })
    .invalidates_tags(&[TagType::Role, TagType::User])
}

pub fn delete_role() -> MutationEndpoint<Id, Ack> {
    MutationEndpoint::new("deleteRole", |id: &Id| {
        Ok(ApiRequest::delete(format!("{ROLES_PATH}/{id}")))
    })
    .decode_with(decode_ack)
    .invalidates_tags(&[TagType::Role, TagType::User])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::Query;
    use serde_json::json;

    #[test]
    fn decodes_roles_with_permissions() {
        let list = get_roles()
            .decode(json!({ "data": { "roles": [
                { "id": 1, "name": "admin", "permissions": ["orders:write"] }
            ] } }))
            .unwrap();
        assert!(list.items[0].has_permission("orders:write"));
        assert!(!list.items[0].has_permission("users:delete"));
    }
}
