//! In-memory repositories and request helpers for handler tests.

use std::sync::{Arc, Mutex};

use anyhow::{bail, Context};
use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use time::{Duration, OffsetDateTime};
use tower::ServiceExt;
use uuid::Uuid;

use crate::{
    app::build_app,
    auth::{
        repo::UserRepository,
        repo_types::{DuplicateUser, NewUser, UniqueField, User},
    },
    items::{
        filter::{compare_by, ItemFilter, Page, SortKey},
        repo::ItemRepository,
        repo_types::{FavoriteState, Item, ItemStatus, ItemWithSeller, NewItem, Seller},
    },
    state::AppState,
};

#[derive(Default)]
struct Inner {
    users: Vec<User>,
    items: Vec<Item>,
    clock: Option<OffsetDateTime>,
}

impl Inner {
    /// Strictly increasing timestamps so "newest first" is deterministic.
    fn tick(&mut self) -> OffsetDateTime {
        let now = OffsetDateTime::now_utc();
        let t = match self.clock {
            Some(last) if now <= last => last + Duration::microseconds(1),
            _ => now,
        };
        self.clock = Some(t);
        t
    }

    fn with_seller(&self, item: &Item) -> anyhow::Result<ItemWithSeller> {
        let u = self
            .users
            .iter()
            .find(|u| u.id == item.seller_id)
            .with_context(|| format!("seller {} of item {} missing", item.seller_id, item.id))?;
        Ok(ItemWithSeller {
            item: item.clone(),
            seller: Seller {
                id: u.id,
                username: u.username.clone(),
                avatar: u.avatar.clone(),
                rating: u.rating,
                location: u.location.clone(),
                created_at: u.created_at,
            },
        })
    }
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryStore {
    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|p| p.into_inner())
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>> {
        Ok(self.lock().users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        Ok(self.lock().users.iter().find(|u| u.email == email).cloned())
    }

    async fn find_by_email_or_username(
        &self,
        email: &str,
        username: &str,
    ) -> anyhow::Result<Option<User>> {
        let inner = self.lock();
        let by_email = inner.users.iter().find(|u| u.email == email);
        Ok(by_email
            .or_else(|| inner.users.iter().find(|u| u.username == username))
            .cloned())
    }

    async fn create(&self, new: NewUser) -> anyhow::Result<User> {
        let mut inner = self.lock();
        if inner.users.iter().any(|u| u.email == new.email) {
            return Err(DuplicateUser(UniqueField::Email).into());
        }
        if inner.users.iter().any(|u| u.username == new.username) {
            return Err(DuplicateUser(UniqueField::Username).into());
        }
        let now = inner.tick();
        let user = User {
            id: Uuid::new_v4(),
            username: new.username,
            email: new.email,
            password_hash: new.password_hash,
            avatar: String::new(),
            bio: String::new(),
            location: String::new(),
            rating: 0.0,
            review_count: 0,
            created_at: now,
            updated_at: now,
        };
        inner.users.push(user.clone());
        Ok(user)
    }
}

#[async_trait]
impl ItemRepository for MemoryStore {
    async fn list(
        &self,
        filter: &ItemFilter,
        sort: &[SortKey],
        page: Option<Page>,
    ) -> anyhow::Result<Vec<ItemWithSeller>> {
        let inner = self.lock();
        let mut matched: Vec<&Item> = inner.items.iter().filter(|i| filter.matches(i)).collect();
        matched.sort_by(|a, b| compare_by(sort, a, b).then_with(|| a.id.cmp(&b.id)));

        let (skip, take) = match page {
            Some(p) => (p.offset() as usize, p.limit as usize),
            None => (0, usize::MAX),
        };
        matched
            .into_iter()
            .skip(skip)
            .take(take)
            .map(|i| inner.with_seller(i))
            .collect()
    }

    async fn count(&self, filter: &ItemFilter) -> anyhow::Result<i64> {
        Ok(self.lock().items.iter().filter(|i| filter.matches(i)).count() as i64)
    }

    async fn find(&self, id: Uuid) -> anyhow::Result<Option<ItemWithSeller>> {
        let inner = self.lock();
        inner
            .items
            .iter()
            .find(|i| i.id == id)
            .map(|i| inner.with_seller(i))
            .transpose()
    }

    async fn record_view(&self, id: Uuid) -> anyhow::Result<Option<ItemWithSeller>> {
        let mut inner = self.lock();
        let Some(item) = inner.items.iter_mut().find(|i| i.id == id) else {
            return Ok(None);
        };
        item.views += 1;
        let item = item.clone();
        inner.with_seller(&item).map(Some)
    }

    async fn create(&self, seller_id: Uuid, new: NewItem) -> anyhow::Result<ItemWithSeller> {
        let mut inner = self.lock();
        if !inner.users.iter().any(|u| u.id == seller_id) {
            bail!("seller {seller_id} does not exist");
        }
        let now = inner.tick();
        let item = Item {
            id: Uuid::new_v4(),
            title: new.title,
            description: new.description,
            price: new.price,
            category: new.category,
            condition: new.condition,
            size: new.size,
            brand: new.brand,
            color: new.color,
            location: new.location,
            images: new.images,
            seller_id,
            status: ItemStatus::Active,
            views: 0,
            favorites: vec![],
            created_at: now,
            updated_at: now,
        };
        inner.items.push(item.clone());
        inner.with_seller(&item)
    }

    async fn update(&self, item: &Item) -> anyhow::Result<Option<ItemWithSeller>> {
        let mut inner = self.lock();
        let now = inner.tick();
        let Some(stored) = inner.items.iter_mut().find(|i| i.id == item.id) else {
            return Ok(None);
        };
        stored.title = item.title.clone();
        stored.description = item.description.clone();
        stored.price = item.price;
        stored.category = item.category;
        stored.condition = item.condition;
        stored.size = item.size.clone();
        stored.brand = item.brand.clone();
        stored.color = item.color.clone();
        stored.location = item.location.clone();
        stored.images = item.images.clone();
        stored.status = item.status;
        stored.updated_at = now;
        let stored = stored.clone();
        inner.with_seller(&stored).map(Some)
    }

    async fn delete(&self, id: Uuid) -> anyhow::Result<bool> {
        let mut inner = self.lock();
        let before = inner.items.len();
        inner.items.retain(|i| i.id != id);
        Ok(inner.items.len() < before)
    }

    async fn toggle_favorite(&self, item_id: Uuid, user_id: Uuid) -> anyhow::Result<FavoriteState> {
        let mut inner = self.lock();
        let item = inner
            .items
            .iter_mut()
            .find(|i| i.id == item_id)
            .with_context(|| format!("item {item_id} not found"))?;
        let favorited = match item.favorites.iter().position(|u| *u == user_id) {
            Some(pos) => {
                item.favorites.remove(pos);
                false
            }
            None => {
                item.favorites.push(user_id);
                true
            }
        };
        Ok(FavoriteState {
            favorited,
            count: item.favorites.len() as i64,
        })
    }
}

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
}

impl TestApp {
    pub fn new() -> Self {
        let state = AppState::fake();
        Self {
            router: build_app(state.clone()),
            state,
        }
    }

    pub fn token_for(&self, user_id: Uuid) -> String {
        self.state.jwt.sign(user_id).expect("sign test token")
    }
}

/// Sends one request through the router and decodes the JSON body.
pub async fn send(
    router: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = match body {
        Some(v) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(v.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

/// Registers a user with password `secret1`; returns its token and id.
pub async fn register(router: &Router, username: &str, email: &str) -> (String, Uuid) {
    let (status, body) = send(
        router,
        "POST",
        "/api/auth/register",
        None,
        Some(json!({ "username": username, "email": email, "password": "secret1" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "register failed: {body}");
    let token = body["token"].as_str().unwrap().to_string();
    let id = body["user"]["id"].as_str().unwrap().parse().unwrap();
    (token, id)
}

pub fn listing(title: &str, category: &str, price: f64) -> Value {
    json!({
        "title": title,
        "description": format!("{title} in great shape"),
        "price": price,
        "category": category,
        "condition": "good",
        "images": ["https://cdn.example.com/1.jpg"],
    })
}

/// Creates a listing and returns the `item` object from the response.
pub async fn create_listing(router: &Router, token: &str, body: Value) -> Value {
    let (status, res) = send(router, "POST", "/api/items", Some(token), Some(body)).await;
    assert_eq!(status, StatusCode::CREATED, "create failed: {res}");
    res["item"].clone()
}
