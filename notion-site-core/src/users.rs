use std::collections::HashMap;
use tracing::{debug, warn};

use crate::contract::ContentApi;
use crate::model::{Page, User};

/// Memoized user lookups for a single database pass.
///
/// Failed lookups are memoized too (as [`User::unknown`]), so one author costs at most one
/// remote call per pass no matter how often it appears.
#[derive(Debug, Default)]
pub struct UserCache {
    users: HashMap<String, User>,
    lookups: usize,
    failures: usize,
}

impl UserCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ensures the creator and last editor of `page` are cached.
    pub async fn resolve_page_authors<A>(&mut self, api: &A, page: &Page)
    where
        A: ContentApi + ?Sized,
    {
        self.resolve(api, &page.created_by.id).await;
        self.resolve(api, &page.last_edited_by.id).await;
    }

    async fn resolve<A>(&mut self, api: &A, user_id: &str)
    where
        A: ContentApi + ?Sized,
    {
        if user_id.is_empty() || self.users.contains_key(user_id) {
            return;
        }
        self.lookups += 1;
        let user = match api.query_user(user_id).await {
            Ok(user) => {
                debug!(user_id, name = ?user.name, "[USERS] Resolved user");
                user
            }
            Err(e) => {
                self.failures += 1;
                warn!(user_id, error = %e, "[USERS] User lookup failed, continuing without it");
                User::unknown(user_id)
            }
        };
        self.users.insert(user_id.to_string(), user);
    }

    pub fn users(&self) -> &HashMap<String, User> {
        &self.users
    }

    /// Remote lookups issued so far.
    pub fn lookups(&self) -> usize {
        self.lookups
    }

    /// Lookups that failed and were replaced by a stand-in.
    pub fn failures(&self) -> usize {
        self.failures
    }
}
