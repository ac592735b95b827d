//! Listing filters, sort expressions and page arithmetic.
//!
//! [`ItemFilter`] drives the SQL `WHERE` clause built in `repo.rs`. The
//! in-process `matches`/`compare` mirror it for the in-memory test store.

#[cfg(test)]
use std::cmp::Ordering;

use uuid::Uuid;

#[cfg(test)]
use super::repo_types::Item;
use super::repo_types::{Category, Condition, ItemStatus};
use crate::error::AppError;

pub const DEFAULT_SORT: &str = "-createdAt";
pub const DEFAULT_LIMIT: u32 = 20;
pub const MAX_LIMIT: u32 = 100;

#[derive(Debug, Clone, Default)]
pub struct ItemFilter {
    pub status: ItemStatus,
    pub seller_id: Option<Uuid>,
    pub category: Option<Category>,
    pub condition: Option<Condition>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    /// `Some(vec![])` means a search was requested but had no usable terms.
    pub search: Option<Vec<String>>,
}

impl ItemFilter {
    pub fn active() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub fn matches(&self, item: &Item) -> bool {
        if item.status != self.status {
            return false;
        }
        if self.seller_id.is_some_and(|s| s != item.seller_id) {
            return false;
        }
        if self.category.is_some_and(|c| c != item.category) {
            return false;
        }
        if self.condition.is_some_and(|c| c != item.condition) {
            return false;
        }
        if self.min_price.is_some_and(|min| item.price < min) {
            return false;
        }
        if self.max_price.is_some_and(|max| item.price > max) {
            return false;
        }
        match &self.search {
            None => true,
            Some(terms) => {
                let words: Vec<String> = [&item.title, &item.description, &item.brand]
                    .into_iter()
                    .flat_map(|field| search_terms(field))
                    .collect();
                terms.iter().any(|t| words.contains(t))
            }
        }
    }
}

/// Splits free text into lowercase alphanumeric words.
pub fn search_terms(raw: &str) -> Vec<String> {
    raw.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .collect()
}

/// Builds an OR `tsquery` from already sanitized terms.
pub fn tsquery(terms: &[String]) -> String {
    terms.join(" | ")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    CreatedAt,
    UpdatedAt,
    Price,
    Views,
    Title,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortKey {
    pub field: SortField,
    pub descending: bool,
}

impl SortKey {
    pub fn sql(&self) -> &'static str {
        match (self.field, self.descending) {
            (SortField::CreatedAt, false) => "i.created_at ASC",
            (SortField::CreatedAt, true) => "i.created_at DESC",
            (SortField::UpdatedAt, false) => "i.updated_at ASC",
            (SortField::UpdatedAt, true) => "i.updated_at DESC",
            (SortField::Price, false) => "i.price ASC",
            (SortField::Price, true) => "i.price DESC",
            (SortField::Views, false) => "i.views ASC",
            (SortField::Views, true) => "i.views DESC",
            (SortField::Title, false) => "i.title ASC",
            (SortField::Title, true) => "i.title DESC",
        }
    }

    #[cfg(test)]
    pub fn compare(&self, a: &Item, b: &Item) -> Ordering {
        let ord = match self.field {
            SortField::CreatedAt => a.created_at.cmp(&b.created_at),
            SortField::UpdatedAt => a.updated_at.cmp(&b.updated_at),
            SortField::Price => a.price.total_cmp(&b.price),
            SortField::Views => a.views.cmp(&b.views),
            SortField::Title => a.title.cmp(&b.title),
        };
        if self.descending {
            ord.reverse()
        } else {
            ord
        }
    }
}

/// Orders two items by a list of keys, falling through on ties.
#[cfg(test)]
pub fn compare_by(keys: &[SortKey], a: &Item, b: &Item) -> Ordering {
    keys.iter()
        .map(|k| k.compare(a, b))
        .find(|o| o.is_ne())
        .unwrap_or(Ordering::Equal)
}

/// Parses `"-createdAt price"` style expressions (space or comma separated).
pub fn parse_sort(expr: &str) -> Result<Vec<SortKey>, AppError> {
    let mut keys = Vec::new();
    for token in expr.split([' ', ',']).filter(|t| !t.is_empty()) {
        let (descending, name) = match token.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, token.strip_prefix('+').unwrap_or(token)),
        };
        let field = match name {
            "createdAt" | "created_at" => SortField::CreatedAt,
            "updatedAt" | "updated_at" => SortField::UpdatedAt,
            "price" => SortField::Price,
            "views" => SortField::Views,
            "title" => SortField::Title,
            other => {
                return Err(AppError::validation(format!("Unknown sort field '{other}'")));
            }
        };
        keys.push(SortKey { field, descending });
    }
    if keys.is_empty() {
        keys.push(SortKey {
            field: SortField::CreatedAt,
            descending: true,
        });
    }
    Ok(keys)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub page: u32,
    pub limit: u32,
}

impl Page {
    pub fn new(page: u32, limit: u32) -> Result<Self, AppError> {
        if page < 1 {
            return Err(AppError::validation("page must be at least 1"));
        }
        if !(1..=MAX_LIMIT).contains(&limit) {
            return Err(AppError::validation(format!(
                "limit must be between 1 and {MAX_LIMIT}"
            )));
        }
        Ok(Self { page, limit })
    }

    pub fn offset(&self) -> i64 {
        (i64::from(self.page) - 1) * i64::from(self.limit)
    }

    pub fn total_pages(&self, total: i64) -> i64 {
        let limit = i64::from(self.limit);
        (total + limit - 1) / limit
    }
}
