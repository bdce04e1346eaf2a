//! Offset pagination over the feed.

use crate::{
    cache::{QueryKey, QueryObserver},
    data::DataAccess,
    error::{ClientError, Result},
};
use plaza_common::model::post::Post;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::debug;

pub const PAGE_SIZE: u32 = 10;

/// `(limit, offset)` of the listing behind page `page`.
#[must_use]
pub fn page_window(page: u32) -> (u32, u32) {
    (PAGE_SIZE, page.saturating_mul(PAGE_SIZE))
}

#[derive(Clone, Eq, PartialEq, Debug, Default, Hash)]
pub struct FeedPage {
    pub page: u32,
    pub posts: Arc<Vec<Post>>,
    pub is_loading: bool,
    pub error: Option<String>,
}

impl FeedPage {
    /// Another page may exist. Only a full page suggests one.
    #[must_use]
    pub fn has_next(&self) -> bool {
        self.posts.len() == PAGE_SIZE as usize
    }

    #[must_use]
    pub fn has_previous(&self) -> bool {
        self.page > 0
    }
}

#[derive(Copy, Clone, Eq, PartialEq, Debug, Hash)]
struct Ticket {
    page: u32,
    generation: u64,
}

#[derive(Debug, Default)]
struct PagerState {
    shown: FeedPage,
    generation: u64,
}

impl PagerState {
    fn begin(&mut self, page: u32) -> Ticket {
        self.generation += 1;
        if self.shown.page != page {
            self.shown.posts = Arc::default();
        }
        self.shown.page = page;
        self.shown.is_loading = true;
        self.shown.error = None;

        Ticket {
            page,
            generation: self.generation,
        }
    }

    /// Applies a response unless a newer request was started since.
    fn finish(&mut self, ticket: Ticket, result: Result<Arc<Vec<Post>>, &ClientError>) -> bool {
        if ticket.generation != self.generation {
            debug!(page = ticket.page, "Discarding stale feed page");
            return false;
        }

        self.shown.is_loading = false;
        match result {
            Ok(posts) => self.shown.posts = posts,
            Err(err) => self.shown.error = Some(err.to_string()),
        }
        true
    }
}

/// The feed as shown: one page of posts at a time.
#[derive(Debug)]
pub struct FeedPager {
    data: DataAccess,
    state: Mutex<PagerState>,
    observer: Mutex<Option<QueryObserver>>,
}

impl FeedPager {
    #[must_use]
    pub fn new(data: DataAccess) -> Self {
        Self {
            data,
            state: Mutex::default(),
            observer: Mutex::default(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, PagerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_observer(&self) -> MutexGuard<'_, Option<QueryObserver>> {
        self.observer.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// The page as shown, including posts a background refetch stored since it was loaded.
    #[must_use]
    pub fn current(&self) -> FeedPage {
        let mut shown = self.lock().shown.clone();
        if !shown.is_loading
            && let Some(posts) = self
                .data
                .cache()
                .peek::<Vec<Post>>(&QueryKey::Posts { page: shown.page })
        {
            shown.posts = posts;
        }

        shown
    }

    /// Waits until the shown page was refetched in the background, e.g. after a new post.
    ///
    /// Returns `false` when no page was loaded yet.
    pub async fn changed(&self) -> bool {
        let observer = self.lock_observer().clone();
        match observer {
            Some(mut observer) => observer.changed().await,
            None => false,
        }
    }

    /// Shows page `page`. Returns `false` when the response arrived after another page was
    /// requested and was dropped.
    pub async fn load(&self, page: u32) -> Result<bool> {
        let ticket = self.lock().begin(page);
        let observer = self.data.cache().observe(QueryKey::Posts { page });
        *self.lock_observer() = Some(observer);

        let result = self.data.posts_page(page).await;
        let applied = self.lock().finish(ticket, result.as_ref().map(Arc::clone));
        if applied && let Some(observer) = self.lock_observer().as_mut() {
            observer.mark_seen();
        }

        result.map(|_| applied)
    }

    pub async fn next(&self) -> Result<bool> {
        let current = self.current();
        if !current.has_next() {
            return Ok(false);
        }

        self.load(current.page + 1).await
    }

    pub async fn previous(&self) -> Result<bool> {
        let current = self.current();
        if !current.has_previous() {
            return Ok(false);
        }

        self.load(current.page - 1).await
    }

    /// Reloads the shown page, picking up a background refetch when one is running.
    pub async fn refresh(&self) -> Result<bool> {
        let page = self.current().page;
        self.load(page).await
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        error::ClientError,
        feed::{FeedPage, PAGE_SIZE, PagerState, page_window},
    };
    use plaza_common::model::{Id, post::Post};
    use std::sync::Arc;
    use time::OffsetDateTime;

    fn posts(count: u64) -> Arc<Vec<Post>> {
        let now = OffsetDateTime::now_utc();
        Arc::new(
            (0..count)
                .map(|id| Post {
                    id: Id::from(id),
                    author_id: Id::from(1),
                    content: format!("post {id}"),
                    image_url: None,
                    likes: 0,
                    created_at: now,
                    updated_at: now,
                })
                .collect(),
        )
    }

    #[test]
    fn pages_are_windows_of_ten() {
        for page in [0, 1, 2, 7, 100] {
            assert_eq!(page_window(page), (10, page * 10));
        }
    }

    #[test]
    fn next_needs_a_full_page() {
        let full = FeedPage {
            page: 0,
            posts: posts(u64::from(PAGE_SIZE)),
            ..FeedPage::default()
        };
        assert!(full.has_next());
        assert!(!full.has_previous());

        let partial = FeedPage {
            page: 3,
            posts: posts(9),
            ..FeedPage::default()
        };
        assert!(!partial.has_next());
        assert!(partial.has_previous());
    }

    #[test]
    fn stale_page_response_is_dropped() {
        let mut state = PagerState::default();

        let slow = state.begin(1);
        let fast = state.begin(2);
        assert!(state.finish(fast, Ok(posts(3))));
        assert!(!state.finish(slow, Ok(posts(10))));

        assert_eq!(state.shown.page, 2);
        assert_eq!(state.shown.posts.len(), 3);
        assert!(!state.shown.is_loading);
    }

    #[test]
    fn failed_page_keeps_error() {
        let mut state = PagerState::default();
        let ticket = state.begin(0);

        assert!(state.finish(ticket, Err(&ClientError::NotAuthenticated)));
        assert_eq!(
            state.shown.error.as_deref(),
            Some("You need to be logged in to do that")
        );
    }
}
