//! Identity lookup: an in-memory profile directory and an LRU cache in front of any
//! [`RoleResolver`].

use async_trait::async_trait;
use lru::LruCache;
use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

use super::traits::{RoleResolver, UserProfile};
use crate::error::AppError;

/// Profiles keyed by user id, loaded once at startup.
#[derive(Debug, Clone, Default)]
pub struct ProfileDirectory {
    profiles: HashMap<String, UserProfile>,
}

impl ProfileDirectory {
    pub fn new(profiles: impl IntoIterator<Item = UserProfile>) -> Self {
        Self {
            profiles: profiles
                .into_iter()
                .map(|p| (p.user_id.clone(), p))
                .collect(),
        }
    }

    /// Reads a JSON array of profiles.
    pub async fn from_json_file(path: &Path) -> Result<Self, AppError> {
        let raw = tokio::fs::read_to_string(path).await?;
        let profiles: Vec<UserProfile> = serde_json::from_str(&raw)?;
        info!(count = profiles.len(), path = ?path, "Profile directory loaded");
        Ok(Self::new(profiles))
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}

#[async_trait]
impl RoleResolver for ProfileDirectory {
    async fn lookup(&self, user_id: &str) -> Result<Option<UserProfile>, AppError> {
        Ok(self.profiles.get(user_id).cloned())
    }
}

/// Caches the profiles found by an inner resolver.
///
/// Unknown users and failures are not cached, so a profile created later is picked up
/// on the next lookup.
pub struct CachedRoleResolver {
    inner: Arc<dyn RoleResolver>,
    cache: Mutex<LruCache<String, UserProfile>>,
}

impl CachedRoleResolver {
    const DEFAULT_CAPACITY: NonZeroUsize = match NonZeroUsize::new(256) {
        Some(size) => size,
        None => panic!("cache capacity must be non-zero"),
    };

    pub fn new(inner: Arc<dyn RoleResolver>) -> Self {
        Self::with_capacity(inner, Self::DEFAULT_CAPACITY)
    }

    pub fn with_capacity(inner: Arc<dyn RoleResolver>, capacity: NonZeroUsize) -> Self {
        Self {
            inner,
            cache: Mutex::new(LruCache::new(capacity)),
        }
    }

    pub async fn cached_len(&self) -> usize {
        self.cache.lock().await.len()
    }
}

#[async_trait]
impl RoleResolver for CachedRoleResolver {
    async fn lookup(&self, user_id: &str) -> Result<Option<UserProfile>, AppError> {
        if let Some(profile) = self.cache.lock().await.get(user_id) {
            debug!(user_id, "Profile cache hit");
            return Ok(Some(profile.clone()));
        }

        let found = self.inner.lookup(user_id).await?;
        if let Some(profile) = &found {
            self.cache
                .lock()
                .await
                .put(user_id.to_string(), profile.clone());
        }
        Ok(found)
    }
}
