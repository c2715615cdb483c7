//! Product categories (`/categories`)

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{Id, PageParams, Update, de_id, de_opt_id, split_update};
use crate::envelope::{Ack, Paginated, decode_ack, decode_list};
use crate::errors::ApiResult;
use crate::mutation::MutationEndpoint;
use crate::query::QueryEndpoint;
use crate::tags::{Tag, TagType};
use crate::transport::ApiRequest;

pub const CATEGORIES_PATH: &str = "/categories";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    #[serde(deserialize_with = "de_id", alias = "_id")]
    pub id: Id,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, deserialize_with = "de_opt_id", alias = "parentId")]
    pub parent_id: Option<Id>,
    #[serde(default, alias = "imageUrl")]
    pub image_url: Option<String>,
    #[serde(default, alias = "productCount")]
    pub product_count: u64,
    #[serde(default, alias = "isDeleted")]
    pub is_deleted: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryInput {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<Id>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

fn decode_categories(body: Value) -> ApiResult<Paginated<Category>> {
    decode_list(body, &["categories"])
}

pub fn get_categories() -> QueryEndpoint<PageParams, Paginated<Category>> {
    QueryEndpoint::new("getCategories", |params: &PageParams| {
        ApiRequest::get(CATEGORIES_PATH).with_query(params)
    })
    .decode_with(decode_categories)
    .provides_tags(&[TagType::Category])
}

pub fn get_category() -> QueryEndpoint<Id, Category> {
    QueryEndpoint::new("getCategory", |id: &Id| {
        Ok(ApiRequest::get(format!("{CATEGORIES_PATH}/{id}")))
    })
    .provides_with(|id: &Id, _: Option<&Category>| vec![Tag::id(TagType::Category, id)])
}

pub fn create_category() -> MutationEndpoint<CategoryInput, Category> {
    MutationEndpoint::new("createCategory", |input: &CategoryInput| {
        ApiRequest::post(CATEGORIES_PATH).json(input)
    })
    .invalidates_tags(&[TagType::Category])
}

/// Products embed their category, so category writes refresh the catalog too
pub fn update_category() -> MutationEndpoint<Update<CategoryInput>, Category> {
    MutationEndpoint::new("updateCategory", |update: &Update<CategoryInput>| {
        split_update(ApiRequest::put, CATEGORIES_PATH, update)
    })
    .invalidates_tags(&[TagType::Category, TagType::Product])
}

pub fn delete_category() -> MutationEndpoint<Id, Ack> {
    MutationEndpoint::new("deleteCategory", |id: &Id| {
        Ok(ApiRequest::delete(format!("{CATEGORIES_PATH}/{id}")))
    })
    .decode_with(decode_ack)
    .invalidates_tags(&[TagType::Category, TagType::Product])
}

pub fn restore_category() -> MutationEndpoint<Id, Ack> {
    MutationEndpoint::new("restoreCategory", |id: &Id| {
        Ok(ApiRequest::patch(format!("{CATEGORIES_PATH}/{id}/restore")))
    })
    .decode_with(decode_ack)
    .invalidates_tags(&[TagType::Category])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mutation::Mutation;
    use crate::query::Query;
    use serde_json::json;

    #[test]
    fn decodes_bare_array() {
        let list = get_categories()
            .decode(json!([{ "id": 1, "name": "Lamps" }, { "id": "2", "name": "Rugs" }]))
            .unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list.items[1].id, "2");
        assert!(list.pagination.is_none());
    }

    #[test]
    fn delete_refreshes_products_as_well() {
        let tags = delete_category().invalidates(&"3".to_string(), &Ack::default());
        assert!(tags.contains(&Tag::of(TagType::Product)));
        assert!(tags.contains(&Tag::of(TagType::Category)));
    }
}
