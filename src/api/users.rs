//! Users and profiles (`/users`)

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{Id, PageParams, Update, de_id, de_opt_id, split_update};
use crate::envelope::{Ack, Paginated, decode_ack, decode_list};
use crate::errors::ApiResult;
use crate::mutation::MutationEndpoint;
use crate::query::QueryEndpoint;
use crate::tags::{Tag, TagType};
use crate::transport::ApiRequest;

pub const USERS_PATH: &str = "/users";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    #[serde(deserialize_with = "de_id", alias = "_id")]
    pub id: Id,
    #[serde(alias = "fullName")]
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default, deserialize_with = "de_opt_id", alias = "roleId")]
    pub role_id: Option<Id>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default, alias = "isActive")]
    pub is_active: Option<bool>,
    #[serde(default, alias = "isDeleted")]
    pub is_deleted: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserInput {
    pub name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role_id: Option<Id>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoleChange {
    #[serde(skip)]
    pub user_id: Id,
    #[serde(rename = "roleId")]
    pub role_id: Id,
}

fn decode_users(body: Value) -> ApiResult<Paginated<User>> {
    decode_list(body, &["users"])
}

fn user_tags<T>(update: &Update<T>, _: Option<&User>) -> Vec<Tag> {
    vec![Tag::of(TagType::User), Tag::id(TagType::User, &update.id)]
}

pub fn get_users() -> QueryEndpoint<PageParams, Paginated<User>> {
    QueryEndpoint::new("getUsers", |params: &PageParams| {
        ApiRequest::get(USERS_PATH).with_query(params)
    })
    .decode_with(decode_users)
    .provides_tags(&[TagType::User])
}

pub fn get_user() -> QueryEndpoint<Id, User> {
    QueryEndpoint::new("getUser", |id: &Id| {
        Ok(ApiRequest::get(format!("{USERS_PATH}/{id}")))
    })
    .provides_with(|id: &Id, _: Option<&User>| vec![Tag::id(TagType::User, id)])
}

/// The signed-in user
pub fn get_profile() -> QueryEndpoint<(), User> {
    QueryEndpoint::new("getProfile", |_: &()| {
        Ok(ApiRequest::get(format!("{USERS_PATH}/profile")))
    })
    .provides_tags(&[TagType::User])
}

pub fn update_profile() -> MutationEndpoint<UserInput, User> {
    MutationEndpoint::new("updateProfile", |input: &UserInput| {
        ApiRequest::put(format!("{USERS_PATH}/profile")).json(input)
    })
    .invalidates_tags(&[TagType::User])
}

pub fn create_user() -> MutationEndpoint<UserInput, User> {
    MutationEndpoint::new("createUser", |input: &UserInput| {
        ApiRequest::post(USERS_PATH).json(input)
    })
    .invalidates_tags(&[TagType::User])
}

pub fn update_user() -> MutationEndpoint<Update<UserInput>, User> {
    MutationEndpoint::new("updateUser", |update: &Update<UserInput>| {
        split_update(ApiRequest::put, USERS_PATH, update)
    })
    .invalidates_with(user_tags)
}

pub fn delete_user() -> MutationEndpoint<Id, Ack> {
    MutationEndpoint::new("deleteUser", |id: &Id| {
        Ok(ApiRequest::delete(format!("{USERS_PATH}/{id}")))
    })
    .decode_with(decode_ack)
    .invalidates_tags(&[TagType::User])
}

pub fn restore_user() -> MutationEndpoint<Id, Ack> {
    MutationEndpoint::new("restoreUser", |id: &Id| {
        Ok(ApiRequest::patch(format!("{USERS_PATH}/{id}/restore")))
    })
    .decode_with(decode_ack)
    .invalidates_tags(&[TagType::User])
}

/// Role assignment changes what the user sees, and the role's member count
pub fn change_user_role() -> MutationEndpoint<RoleChange, User> {
    MutationEndpoint::new("changeUserRole", |change: &RoleChange| {
        ApiRequest::put(format!("{USERS_PATH}/{}/role", change.user_id)).json(change)
    })
    .invalidates_with(|change: &RoleChange, _: Option<&User>| {
        vec![
            Tag::of(TagType::User),
            Tag::id(TagType::User, &change.user_id),
            Tag::of(TagType::Role),
        ]
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mutation::Mutation;
    use serde_json::json;

    #[test]
    fn role_change_targets_user_path() {
        let change = RoleChange {
            user_id: "u1".into(),
            role_id: "r2".into(),
        };
        let request = change_user_role().request(&change).unwrap();
        assert_eq!(request.path, "/users/u1/role");
        assert_eq!(request.json_body(), Some(&json!({ "roleId": "r2" })));
    }

    #[test]
    fn password_is_omitted_when_unset() {
        let update = Update::new(
            "5",
            UserInput {
                name: "Ada".into(),
                email: "ada@example.com".into(),
                ..UserInput::default()
            },
        );
        let request = update_user().request(&update).unwrap();
        let body = request.json_body().unwrap();
        assert!(body.get("password").is_none());
        assert_eq!(body["email"], "ada@example.com");
    }
}
