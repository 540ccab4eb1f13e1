//! News article source contract.
//!
//! The ETL that scrapes and enriches articles lives outside this crate;
//! the engine only asks a feed for articles inside a time window, newest
//! first, skipping titles it has already turned into scenes.

use crate::scene::NewsArticle;
use crate::store::StoreError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// A source of enriched news articles.
#[async_trait]
pub trait NewsFeed: Send + Sync {
    /// Fetch up to `limit` articles published inside `(from, to)`, newest
    /// first, excluding the given titles.
    async fn fetch(
        &self,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
        limit: usize,
        exclude_titles: &[String],
    ) -> Result<Vec<NewsArticle>, StoreError>;
}

/// In-memory feed over a fixed article list.
#[derive(Debug, Default)]
pub struct MemoryNewsFeed {
    articles: Vec<NewsArticle>,
}

impl MemoryNewsFeed {
    pub fn new(articles: Vec<NewsArticle>) -> Self {
        Self { articles }
    }

    pub fn push(&mut self, article: NewsArticle) {
        self.articles.push(article);
    }
}

#[async_trait]
impl NewsFeed for MemoryNewsFeed {
    async fn fetch(
        &self,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
        limit: usize,
        exclude_titles: &[String],
    ) -> Result<Vec<NewsArticle>, StoreError> {
        let mut matching: Vec<_> = self
            .articles
            .iter()
            .filter(|a| from.map_or(true, |f| a.published_at > f))
            .filter(|a| to.map_or(true, |t| a.published_at < t))
            .filter(|a| !exclude_titles.contains(&a.title))
            .cloned()
            .collect();
        matching.sort_by_key(|a| std::cmp::Reverse(a.published_at));
        matching.truncate(limit);
        Ok(matching)
    }
}
