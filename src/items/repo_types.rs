use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// Listing category. Lithuanian labels from older clients are still accepted on input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "item_category", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Category {
    #[serde(alias = "Drabužiai")]
    Clothing,
    #[serde(alias = "Avalynė")]
    Footwear,
    #[serde(alias = "Aksesuarai")]
    Accessories,
    #[serde(alias = "Elektronika")]
    Electronics,
    #[serde(alias = "Namų apyvoka")]
    Household,
    #[serde(alias = "Vaikams")]
    Kids,
    #[serde(alias = "Grožis")]
    Beauty,
    #[serde(alias = "Sportas")]
    Sports,
    #[serde(alias = "Kita")]
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "item_condition", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Condition {
    #[serde(alias = "Nauja su etikete")]
    NewWithTags,
    #[serde(alias = "Nauja be etiketės")]
    NewWithoutTags,
    #[serde(alias = "Labai gera")]
    VeryGood,
    #[serde(alias = "Gera")]
    Good,
    #[serde(alias = "Patenkinama")]
    Satisfactory,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "item_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ItemStatus {
    #[default]
    Active,
    Sold,
    Reserved,
    Hidden,
}

/// A listing as stored. `seller_id` is rendered through the populated seller instead.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub price: f64,
    pub category: Category,
    pub condition: Condition,
    pub size: String,
    pub brand: String,
    pub color: String,
    pub location: String,
    pub images: Vec<String>,
    #[serde(skip)]
    pub seller_id: Uuid,
    pub status: ItemStatus,
    pub views: i64,
    pub favorites: Vec<Uuid>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone)]
pub struct NewItem {
    pub title: String,
    pub description: String,
    pub price: f64,
    pub category: Category,
    pub condition: Condition,
    pub size: String,
    pub brand: String,
    pub color: String,
    pub location: String,
    pub images: Vec<String>,
}

/// Public columns of the owning user, joined onto every item read.
#[derive(Debug, Clone)]
pub struct Seller {
    pub id: Uuid,
    pub username: String,
    pub avatar: String,
    pub rating: f64,
    pub location: String,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone)]
pub struct ItemWithSeller {
    pub item: Item,
    pub seller: Seller,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FavoriteState {
    pub favorited: bool,
    pub count: i64,
}

/// Flat row produced by the items/users join.
#[derive(Debug, FromRow)]
pub struct ItemRow {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub price: f64,
    pub category: Category,
    pub condition: Condition,
    pub size: String,
    pub brand: String,
    pub color: String,
    pub location: String,
    pub images: Vec<String>,
    pub seller_id: Uuid,
    pub status: ItemStatus,
    pub views: i64,
    pub favorites: Vec<Uuid>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
    pub seller_username: String,
    pub seller_avatar: String,
    pub seller_rating: f64,
    pub seller_location: String,
    pub seller_created_at: OffsetDateTime,
}

impl From<ItemRow> for ItemWithSeller {
    fn from(r: ItemRow) -> Self {
        Self {
            seller: Seller {
                id: r.seller_id,
                username: r.seller_username,
                avatar: r.seller_avatar,
                rating: r.seller_rating,
                location: r.seller_location,
                created_at: r.seller_created_at,
            },
            item: Item {
                id: r.id,
                title: r.title,
                description: r.description,
                price: r.price,
                category: r.category,
                condition: r.condition,
                size: r.size,
                brand: r.brand,
                color: r.color,
                location: r.location,
                images: r.images,
                seller_id: r.seller_id,
                status: r.status,
                views: r.views,
                favorites: r.favorites,
                created_at: r.created_at,
                updated_at: r.updated_at,
            },
        }
    }
}
