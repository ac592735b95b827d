use anyhow::Context;
use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use super::{
    filter::{tsquery, ItemFilter, Page, SortKey},
    repo_types::{FavoriteState, Item, ItemRow, ItemWithSeller, NewItem},
};

#[async_trait]
pub trait ItemRepository: Send + Sync {
    /// Items matching `filter`, ordered by `sort`, optionally paged.
    async fn list(
        &self,
        filter: &ItemFilter,
        sort: &[SortKey],
        page: Option<Page>,
    ) -> anyhow::Result<Vec<ItemWithSeller>>;
    async fn count(&self, filter: &ItemFilter) -> anyhow::Result<i64>;
    async fn find(&self, id: Uuid) -> anyhow::Result<Option<ItemWithSeller>>;
    /// Atomically bumps the view counter and returns the updated item.
    async fn record_view(&self, id: Uuid) -> anyhow::Result<Option<ItemWithSeller>>;
    async fn create(&self, seller_id: Uuid, new: NewItem) -> anyhow::Result<ItemWithSeller>;
    /// Persists every mutable field of `item`. `None` if it no longer exists.
    async fn update(&self, item: &Item) -> anyhow::Result<Option<ItemWithSeller>>;
    async fn delete(&self, id: Uuid) -> anyhow::Result<bool>;
    /// Adds `user_id` to the favorites of an existing item, or removes it if present.
    async fn toggle_favorite(&self, item_id: Uuid, user_id: Uuid) -> anyhow::Result<FavoriteState>;
}

const SELECT_ITEMS: &str = r#"
    SELECT i.id, i.title, i.description, i.price, i.category, i.condition,
           i.size, i.brand, i.color, i.location, i.images, i.seller_id,
           i.status, i.views, i.created_at, i.updated_at,
           ARRAY(
               SELECT f.user_id FROM item_favorites f
                WHERE f.item_id = i.id
                ORDER BY f.created_at
           ) AS favorites,
           u.username AS seller_username,
           u.avatar AS seller_avatar,
           u.rating AS seller_rating,
           u.location AS seller_location,
           u.created_at AS seller_created_at
      FROM items i
      JOIN users u ON u.id = i.seller_id
"#;

// Must stay identical to the expression of items_search_idx. Every run of
// non-alphanumerics becomes a word break, so `38.5` indexes as `38` and `5`.
const SEARCH_DOCUMENT: &str = "to_tsvector('simple', regexp_replace(i.title || ' ' || i.description || ' ' || i.brand, '[^[:alnum:]]+', ' ', 'g'))";

fn push_filter(qb: &mut QueryBuilder<'_, Postgres>, filter: &ItemFilter) {
    qb.push(" WHERE i.status = ").push_bind(filter.status);
    if let Some(seller_id) = filter.seller_id {
        qb.push(" AND i.seller_id = ").push_bind(seller_id);
    }
    if let Some(category) = filter.category {
        qb.push(" AND i.category = ").push_bind(category);
    }
    if let Some(condition) = filter.condition {
        qb.push(" AND i.condition = ").push_bind(condition);
    }
    if let Some(min) = filter.min_price {
        qb.push(" AND i.price >= ").push_bind(min);
    }
    if let Some(max) = filter.max_price {
        qb.push(" AND i.price <= ").push_bind(max);
    }
    match filter.search.as_deref() {
        None => {}
        Some([]) => {
            qb.push(" AND FALSE");
        }
        Some(terms) => {
            qb.push(" AND ")
                .push(SEARCH_DOCUMENT)
                .push(" @@ to_tsquery('simple', ")
                .push_bind(tsquery(terms))
                .push(")");
        }
    }
}

#[derive(Clone)]
pub struct PgItemRepository {
    db: PgPool,
}

impl PgItemRepository {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ItemRepository for PgItemRepository {
    async fn list(
        &self,
        filter: &ItemFilter,
        sort: &[SortKey],
        page: Option<Page>,
    ) -> anyhow::Result<Vec<ItemWithSeller>> {
        let mut qb = QueryBuilder::<Postgres>::new(SELECT_ITEMS);
        push_filter(&mut qb, filter);

        qb.push(" ORDER BY ");
        for key in sort {
            qb.push(key.sql()).push(", ");
        }
        qb.push("i.id");

        if let Some(page) = page {
            qb.push(" LIMIT ")
                .push_bind(i64::from(page.limit))
                .push(" OFFSET ")
                .push_bind(page.offset());
        }

        let rows = qb
            .build_query_as::<ItemRow>()
            .fetch_all(&self.db)
            .await
            .context("list items")?;
        Ok(rows.into_iter().map(ItemWithSeller::from).collect())
    }

    async fn count(&self, filter: &ItemFilter) -> anyhow::Result<i64> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM items i");
        push_filter(&mut qb, filter);
        let total = qb
            .build_query_scalar::<i64>()
            .fetch_one(&self.db)
            .await
            .context("count items")?;
        Ok(total)
    }

    async fn find(&self, id: Uuid) -> anyhow::Result<Option<ItemWithSeller>> {
        let row = sqlx::query_as::<_, ItemRow>(&format!("{SELECT_ITEMS} WHERE i.id = $1"))
            .bind(id)
            .fetch_optional(&self.db)
            .await
            .context("find item")?;
        Ok(row.map(ItemWithSeller::from))
    }

    async fn record_view(&self, id: Uuid) -> anyhow::Result<Option<ItemWithSeller>> {
        let bumped = sqlx::query("UPDATE items SET views = views + 1 WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await
            .context("increment item views")?
            .rows_affected();
        if bumped == 0 {
            return Ok(None);
        }
        self.find(id).await
    }

    async fn create(&self, seller_id: Uuid, new: NewItem) -> anyhow::Result<ItemWithSeller> {
        let id: Uuid = sqlx::query_scalar(
            r#"
            INSERT INTO items (title, description, price, category, condition,
                               size, brand, color, location, images, seller_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING id
            "#,
        )
        .bind(&new.title)
        .bind(&new.description)
        .bind(new.price)
        .bind(new.category)
        .bind(new.condition)
        .bind(&new.size)
        .bind(&new.brand)
        .bind(&new.color)
        .bind(&new.location)
        .bind(&new.images)
        .bind(seller_id)
        .fetch_one(&self.db)
        .await
        .context("insert item")?;

        self.find(id)
            .await?
            .with_context(|| format!("item {id} missing right after insert"))
    }

    async fn update(&self, item: &Item) -> anyhow::Result<Option<ItemWithSeller>> {
        let updated = sqlx::query(
            r#"
            UPDATE items
               SET title = $2, description = $3, price = $4, category = $5,
                   condition = $6, size = $7, brand = $8, color = $9,
                   location = $10, images = $11, status = $12,
                   updated_at = now()
             WHERE id = $1
            "#,
        )
        .bind(item.id)
        .bind(&item.title)
        .bind(&item.description)
        .bind(item.price)
        .bind(item.category)
        .bind(item.condition)
        .bind(&item.size)
        .bind(&item.brand)
        .bind(&item.color)
        .bind(&item.location)
        .bind(&item.images)
        .bind(item.status)
        .execute(&self.db)
        .await
        .context("update item")?
        .rows_affected();
        if updated == 0 {
            return Ok(None);
        }
        self.find(item.id).await
    }

    async fn delete(&self, id: Uuid) -> anyhow::Result<bool> {
        let deleted = sqlx::query("DELETE FROM items WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await
            .context("delete item")?
            .rows_affected();
        Ok(deleted > 0)
    }

    async fn toggle_favorite(&self, item_id: Uuid, user_id: Uuid) -> anyhow::Result<FavoriteState> {
        let removed = sqlx::query("DELETE FROM item_favorites WHERE item_id = $1 AND user_id = $2")
            .bind(item_id)
            .bind(user_id)
            .execute(&self.db)
            .await
            .context("remove favorite")?
            .rows_affected();

        let favorited = removed == 0;
        if favorited {
            sqlx::query(
                r#"
                INSERT INTO item_favorites (item_id, user_id)
                VALUES ($1, $2)
                ON CONFLICT DO NOTHING
                "#,
            )
            .bind(item_id)
            .bind(user_id)
            .execute(&self.db)
            .await
            .context("add favorite")?;
        }

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM item_favorites WHERE item_id = $1")
            .bind(item_id)
            .fetch_one(&self.db)
            .await
            .context("count favorites")?;

        Ok(FavoriteState { favorited, count })
    }
}
