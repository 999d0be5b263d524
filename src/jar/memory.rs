use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Weak};
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::debug;

use super::{CookieJar, CookieOptions, Result};

#[derive(Debug)]
struct Slot {
    value: String,
    deadline: Option<Instant>,
    generation: u64,
}

impl Slot {
    fn is_live(&self, now: Instant) -> bool {
        self.deadline.is_none_or(|deadline| now < deadline)
    }
}

#[derive(Debug, Default)]
struct Cookies {
    slots: HashMap<String, Slot>,
    next_generation: u64,
}

/// In-memory cookie jar for non-browser, non-request contexts
///
/// Cookies written with a truthy `expires` get a deadline and a tokio timer
/// that drops the entry when it fires. Reads honor the deadline even if the
/// timer has not run yet. Clones share the same cookies.
#[derive(Debug, Clone, Default)]
pub struct MemoryJar {
    cookies: Arc<RwLock<Cookies>>,
}

impl MemoryJar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the jar with session cookies
    pub fn from_map(map: HashMap<String, String>) -> Self {
        let mut cookies = Cookies::default();
        for (name, value) in map {
            let generation = cookies.next_generation;
            cookies.next_generation += 1;
            cookies.slots.insert(
                name,
                Slot {
                    value,
                    deadline: None,
                    generation,
                },
            );
        }

        Self {
            cookies: Arc::new(RwLock::new(cookies)),
        }
    }

    /// Number of live cookies
    pub async fn len(&self) -> usize {
        let now = Instant::now();
        self.cookies
            .read()
            .await
            .slots
            .values()
            .filter(|slot| slot.is_live(now))
            .count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    fn schedule_expiry(&self, name: String, generation: u64, deadline: Instant) {
        let cookies: Weak<RwLock<Cookies>> = Arc::downgrade(&self.cookies);

        tokio::spawn(async move {
            tokio::time::sleep_until(deadline).await;

            let Some(cookies) = cookies.upgrade() else {
                return;
            };
            let mut cookies = cookies.write().await;

            // A later write replaced the cookie, its own timer owns it now
            if cookies
                .slots
                .get(&name)
                .is_some_and(|slot| slot.generation == generation)
            {
                cookies.slots.remove(&name);
                debug!(name, "Memory cookie expired");
            }
        });
    }
}

#[async_trait]
impl CookieJar for MemoryJar {
    async fn get(&self, name: &str) -> Result<Option<String>> {
        let now = Instant::now();
        let cookies = self.cookies.read().await;

        Ok(cookies
            .slots
            .get(name)
            .filter(|slot| slot.is_live(now))
            .map(|slot| slot.value.clone()))
    }

    async fn set(&self, name: &str, value: &str, options: &CookieOptions) -> Result<()> {
        let ttl = options.expires.filter(|ttl| !ttl.is_session());
        // A deadline past the clock's range never arrives, keep it for the session
        let deadline = ttl.and_then(|ttl| Instant::now().checked_add(ttl.as_duration()));

        let generation = {
            let mut cookies = self.cookies.write().await;
            let generation = cookies.next_generation;
            cookies.next_generation += 1;
            cookies.slots.insert(
                name.to_string(),
                Slot {
                    value: value.to_string(),
                    deadline,
                    generation,
                },
            );
            generation
        };

        debug!(name, ttl = ?ttl.map(|ttl| ttl.as_secs()), "Memory cookie set");

        if let Some(deadline) = deadline {
            self.schedule_expiry(name.to_string(), generation, deadline);
        }

        Ok(())
    }

    async fn expire(&self, name: &str) -> Result<()> {
        self.cookies.write().await.slots.remove(name);
        debug!(name, "Memory cookie removed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::humanize::Ttl;
    use std::time::Duration;

    #[tokio::test]
    async fn test_set_and_get() {
        let jar = MemoryJar::new();
        jar.set("a", "1", &CookieOptions::default()).await.unwrap();

        assert_eq!(jar.get("a").await.unwrap().as_deref(), Some("1"));
        assert_eq!(jar.get("b").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_expire_missing_is_ok() {
        let jar = MemoryJar::new();
        jar.expire("missing").await.unwrap();
        assert!(jar.is_empty().await);
    }

    #[tokio::test]
    async fn test_from_map() {
        let jar = MemoryJar::from_map(HashMap::from([("a".to_string(), "1".to_string())]));
        assert_eq!(jar.get("a").await.unwrap().as_deref(), Some("1"));
        assert_eq!(jar.len().await, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timer_removes_expired_cookie() {
        let jar = MemoryJar::new();
        let options = CookieOptions::default().with_expiry(Some(Ttl(1)));
        jar.set("a", "1", &options).await.unwrap();

        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(jar.get("a").await.unwrap().as_deref(), Some("1"));

        tokio::time::sleep(Duration::from_millis(600)).await;
        assert_eq!(jar.get("a").await.unwrap(), None);
        assert_eq!(jar.cookies.read().await.slots.len(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rewrite_outlives_old_timer() {
        let jar = MemoryJar::new();
        jar.set("a", "1", &CookieOptions::default().with_expiry(Some(Ttl(1))))
            .await
            .unwrap();
        jar.set("a", "2", &CookieOptions::default()).await.unwrap();

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(jar.get("a").await.unwrap().as_deref(), Some("2"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_unreachable_deadline_is_session() {
        let jar = MemoryJar::new();
        let options = CookieOptions::default().with_expiry(Some(Ttl(u64::MAX)));
        jar.set("a", "1", &options).await.unwrap();

        tokio::time::sleep(Duration::from_secs(60 * 60 * 24 * 365)).await;
        assert_eq!(jar.get("a").await.unwrap().as_deref(), Some("1"));
        assert!(jar.cookies.read().await.slots["a"].deadline.is_none());
    }
}
