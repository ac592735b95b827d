use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use super::repo_types::{Category, Condition, Item, ItemStatus, Seller};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListItemsQuery {
    pub category: Option<Category>,
    pub condition: Option<Condition>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub search: Option<String>,
    pub sort: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

/// Body for `POST /items`. Required fields are optional here so that a
/// missing one yields a field-specific message instead of a serde error.
#[derive(Debug, Deserialize)]
pub struct CreateItemRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub category: Option<Category>,
    pub condition: Option<Condition>,
    #[serde(default)]
    pub size: String,
    #[serde(default)]
    pub brand: String,
    #[serde(default)]
    pub color: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub images: Vec<String>,
}

/// Body for `PUT /items/:id`. Only these fields can change; anything else in
/// the body (seller, views, favorites...) is dropped by deserialization.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateItemRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub category: Option<Category>,
    pub condition: Option<Condition>,
    pub size: Option<String>,
    pub brand: Option<String>,
    pub color: Option<String>,
    pub images: Option<Vec<String>>,
    pub location: Option<String>,
    pub status: Option<ItemStatus>,
}

#[derive(Debug, Serialize)]
pub struct SellerSummary {
    pub id: Uuid,
    pub username: String,
    pub avatar: String,
    pub rating: f64,
}

impl From<Seller> for SellerSummary {
    fn from(s: Seller) -> Self {
        Self {
            id: s.id,
            username: s.username,
            avatar: s.avatar,
            rating: s.rating,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SellerProfile {
    pub id: Uuid,
    pub username: String,
    pub avatar: String,
    pub rating: f64,
    pub location: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl From<Seller> for SellerProfile {
    fn from(s: Seller) -> Self {
        Self {
            id: s.id,
            username: s.username,
            avatar: s.avatar,
            rating: s.rating,
            location: s.location,
            created_at: s.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ItemView<S> {
    #[serde(flatten)]
    pub item: Item,
    pub seller: S,
}

#[derive(Debug, Serialize)]
pub struct ItemResponse<S> {
    pub item: ItemView<S>,
}

#[derive(Debug, Serialize)]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total: i64,
    pub pages: i64,
}

#[derive(Debug, Serialize)]
pub struct ItemListResponse {
    pub items: Vec<ItemView<SellerSummary>>,
    pub pagination: Pagination,
}

#[derive(Debug, Serialize)]
pub struct SellerItemsResponse {
    pub items: Vec<ItemView<SellerSummary>>,
    pub count: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FavoriteResponse {
    pub is_favorited: bool,
    pub favorites_count: i64,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}
