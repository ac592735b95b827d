use super::{
    dto::{CreateItemRequest, ItemView, UpdateItemRequest},
    repo_types::{Item, ItemWithSeller, NewItem, Seller},
};
use crate::{auth::repo_types::User, error::AppError};

pub const MAX_TITLE_LEN: usize = 100;
pub const MAX_DESCRIPTION_LEN: usize = 2000;

fn validate_listing(
    title: &str,
    description: &str,
    price: f64,
    images: &[String],
) -> Result<(), AppError> {
    if images.is_empty() {
        return Err(AppError::validation("At least one image is required"));
    }
    if images.iter().any(|url| url.trim().is_empty()) {
        return Err(AppError::validation("Image URLs must not be blank"));
    }
    if title.is_empty() {
        return Err(AppError::validation("Title is required"));
    }
    if title.chars().count() > MAX_TITLE_LEN {
        return Err(AppError::validation(format!(
            "Title cannot exceed {MAX_TITLE_LEN} characters"
        )));
    }
    if description.trim().is_empty() {
        return Err(AppError::validation("Description is required"));
    }
    if description.chars().count() > MAX_DESCRIPTION_LEN {
        return Err(AppError::validation(format!(
            "Description cannot exceed {MAX_DESCRIPTION_LEN} characters"
        )));
    }
    if !price.is_finite() || price < 0.0 {
        return Err(AppError::validation("Price cannot be negative"));
    }
    Ok(())
}

impl TryFrom<CreateItemRequest> for NewItem {
    type Error = AppError;

    fn try_from(req: CreateItemRequest) -> Result<Self, Self::Error> {
        // Images first: the most common client mistake gets the clearest message.
        if req.images.is_empty() {
            return Err(AppError::validation("At least one image is required"));
        }
        let title = req.title.as_deref().map(str::trim).unwrap_or_default().to_string();
        let description = req.description.unwrap_or_default();
        let price = req
            .price
            .ok_or_else(|| AppError::validation("Price is required"))?;
        let category = req
            .category
            .ok_or_else(|| AppError::validation("Category is required"))?;
        let condition = req
            .condition
            .ok_or_else(|| AppError::validation("Condition is required"))?;

        validate_listing(&title, &description, price, &req.images)?;

        Ok(NewItem {
            title,
            description,
            price,
            category,
            condition,
            size: req.size,
            brand: req.brand,
            color: req.color,
            location: req.location,
            images: req.images,
        })
    }
}

/// Copies the whitelisted fields onto `item` and re-validates the result.
pub fn apply_update(item: &mut Item, req: UpdateItemRequest) -> Result<(), AppError> {
    if let Some(title) = req.title {
        item.title = title.trim().to_string();
    }
    if let Some(description) = req.description {
        item.description = description;
    }
    if let Some(price) = req.price {
        item.price = price;
    }
    if let Some(category) = req.category {
        item.category = category;
    }
    if let Some(condition) = req.condition {
        item.condition = condition;
    }
    if let Some(size) = req.size {
        item.size = size;
    }
    if let Some(brand) = req.brand {
        item.brand = brand;
    }
    if let Some(color) = req.color {
        item.color = color;
    }
    if let Some(images) = req.images {
        item.images = images;
    }
    if let Some(location) = req.location {
        item.location = location;
    }
    if let Some(status) = req.status {
        item.status = status;
    }
    validate_listing(&item.title, &item.description, item.price, &item.images)
}

pub fn ensure_owner(item: &Item, user: &User, message: &str) -> Result<(), AppError> {
    if item.seller_id != user.id {
        return Err(AppError::Forbidden(message.to_string()));
    }
    Ok(())
}

/// Pairs an item with the requested seller projection.
pub fn view<S: From<Seller>>(row: ItemWithSeller) -> ItemView<S> {
    ItemView {
        item: row.item,
        seller: row.seller.into(),
    }
}
