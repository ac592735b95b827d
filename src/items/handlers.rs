use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument};
use uuid::Uuid;

use super::{
    dto::{
        CreateItemRequest, FavoriteResponse, ItemListResponse, ItemResponse, ListItemsQuery,
        MessageResponse, Pagination, SellerItemsResponse, SellerProfile, SellerSummary,
        UpdateItemRequest,
    },
    filter::{parse_sort, search_terms, ItemFilter, Page, DEFAULT_LIMIT, DEFAULT_SORT},
    repo_types::NewItem,
    services::{apply_update, ensure_owner, view},
};
use crate::{
    auth::extractors::AuthUser,
    error::{AppError, AppResult},
    extract::{ApiResponse, AppJson, AppPath, AppQuery},
    state::AppState,
};

pub fn item_routes() -> Router<AppState> {
    Router::new()
        .route("/items", get(list_items).post(create_item))
        .route(
            "/items/:id",
            get(get_item).put(update_item).delete(delete_item),
        )
        .route("/items/:id/favorite", post(toggle_favorite))
        .route("/items/user/:user_id", get(list_seller_items))
}

fn not_found() -> AppError {
    AppError::NotFound("Item not found".into())
}

#[instrument(skip(state))]
pub async fn list_items(
    State(state): State<AppState>,
    AppQuery(q): AppQuery<ListItemsQuery>,
) -> AppResult<Json<ApiResponse<ItemListResponse>>> {
    if [q.min_price, q.max_price]
        .into_iter()
        .flatten()
        .any(|bound| !bound.is_finite())
    {
        return Err(AppError::validation("Price filters must be finite numbers"));
    }

    let filter = ItemFilter {
        category: q.category,
        condition: q.condition,
        min_price: q.min_price,
        max_price: q.max_price,
        search: q
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(search_terms),
        ..ItemFilter::active()
    };
    let sort = parse_sort(q.sort.as_deref().unwrap_or(DEFAULT_SORT))?;
    let page = Page::new(q.page.unwrap_or(1), q.limit.unwrap_or(DEFAULT_LIMIT))?;

    let (rows, total) = tokio::try_join!(
        state.items.list(&filter, &sort, Some(page)),
        state.items.count(&filter),
    )?;

    Ok(ApiResponse::ok(ItemListResponse {
        items: rows.into_iter().map(view).collect(),
        pagination: Pagination {
            page: page.page,
            limit: page.limit,
            total,
            pages: page.total_pages(total),
        },
    }))
}

#[instrument(skip(state))]
pub async fn get_item(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
) -> AppResult<Json<ApiResponse<ItemResponse<SellerProfile>>>> {
    let row = state.items.record_view(id).await?.ok_or_else(not_found)?;
    Ok(ApiResponse::ok(ItemResponse { item: view(row) }))
}

#[instrument(skip(state, user, body))]
pub async fn create_item(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    AppJson(body): AppJson<CreateItemRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<ItemResponse<SellerSummary>>>)> {
    let new_item = NewItem::try_from(body)?;
    let row = state.items.create(user.id, new_item).await?;

    info!(item_id = %row.item.id, seller_id = %user.id, "item created");
    Ok((
        StatusCode::CREATED,
        ApiResponse::ok(ItemResponse { item: view(row) }),
    ))
}

#[instrument(skip(state, user, body))]
pub async fn update_item(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    AppPath(id): AppPath<Uuid>,
    AppJson(body): AppJson<UpdateItemRequest>,
) -> AppResult<Json<ApiResponse<ItemResponse<SellerSummary>>>> {
    let mut item = state.items.find(id).await?.ok_or_else(not_found)?.item;
    ensure_owner(&item, &user, "Not authorized to update this item")?;

    apply_update(&mut item, body)?;
    let row = state.items.update(&item).await?.ok_or_else(not_found)?;

    info!(item_id = %id, seller_id = %user.id, "item updated");
    Ok(ApiResponse::ok(ItemResponse { item: view(row) }))
}

#[instrument(skip(state, user))]
pub async fn delete_item(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    AppPath(id): AppPath<Uuid>,
) -> AppResult<Json<ApiResponse<MessageResponse>>> {
    let existing = state.items.find(id).await?.ok_or_else(not_found)?;
    ensure_owner(&existing.item, &user, "Not authorized to delete this item")?;

    if !state.items.delete(id).await? {
        return Err(not_found());
    }

    info!(item_id = %id, seller_id = %user.id, "item deleted");
    Ok(ApiResponse::ok(MessageResponse {
        message: "Item deleted".into(),
    }))
}

#[instrument(skip(state, user))]
pub async fn toggle_favorite(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    AppPath(id): AppPath<Uuid>,
) -> AppResult<Json<ApiResponse<FavoriteResponse>>> {
    state.items.find(id).await?.ok_or_else(not_found)?;

    let fav = state.items.toggle_favorite(id, user.id).await?;

    info!(item_id = %id, user_id = %user.id, favorited = fav.favorited, "favorite toggled");
    Ok(ApiResponse::ok(FavoriteResponse {
        is_favorited: fav.favorited,
        favorites_count: fav.count,
    }))
}

#[instrument(skip(state))]
pub async fn list_seller_items(
    State(state): State<AppState>,
    AppPath(user_id): AppPath<Uuid>,
) -> AppResult<Json<ApiResponse<SellerItemsResponse>>> {
    let filter = ItemFilter {
        seller_id: Some(user_id),
        ..ItemFilter::active()
    };
    let rows = state
        .items
        .list(&filter, &parse_sort(DEFAULT_SORT)?, None)
        .await?;

    let items: Vec<_> = rows.into_iter().map(view).collect();
    Ok(ApiResponse::ok(SellerItemsResponse {
        count: items.len(),
        items,
    }))
}
