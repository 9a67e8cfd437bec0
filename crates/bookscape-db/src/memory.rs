use std::sync::Mutex;

use crate::models::SubscriberRow;
use crate::{DbError, Result, SubscriberStore};

/// Process-local subscriber list, kept in insertion order. Contents are lost
/// when the process exits.
#[derive(Default)]
pub struct MemorySubscriberStore {
    subscribers: Mutex<Vec<SubscriberRow>>,
}

impl MemorySubscriberStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the list in insertion order.
    #[cfg(test)]
    fn snapshot(&self) -> Result<Vec<SubscriberRow>> {
        Ok(self.lock()?.clone())
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Vec<SubscriberRow>>> {
        self.subscribers.lock().map_err(|_| DbError::Poisoned)
    }
}

impl SubscriberStore for MemorySubscriberStore {
    fn find_subscriber(&self, email: &str) -> Result<Option<SubscriberRow>> {
        Ok(self.lock()?.iter().find(|s| s.email == email).cloned())
    }

    fn insert_subscriber(&self, subscriber: &SubscriberRow) -> Result<()> {
        if self.insert_subscriber_if_absent(subscriber.clone())? {
            Ok(())
        } else {
            Err(DbError::Duplicate("subscriber"))
        }
    }

    fn update_subscriber(&self, subscriber: &SubscriberRow) -> Result<()> {
        let mut subscribers = self.lock()?;
        if let Some(existing) = subscribers.iter_mut().find(|s| s.email == subscriber.email) {
            existing.name = subscriber.name.clone();
            existing.is_active = subscriber.is_active;
            existing.updated_at = subscriber.updated_at;
        }
        Ok(())
    }

    fn insert_subscriber_if_absent(&self, subscriber: SubscriberRow) -> Result<bool> {
        // Scan and append under one guard so concurrent callers cannot both
        // miss the same email.
        let mut subscribers = self.lock()?;
        if subscribers.iter().any(|s| s.email == subscriber.email) {
            return Ok(false);
        }
        subscribers.push(subscriber);
        Ok(true)
    }

    fn subscriber_count(&self) -> Result<usize> {
        Ok(self.lock()?.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn keeps_insertion_order() {
        let store = MemorySubscriberStore::new();
        for email in ["c@x.com", "a@x.com", "b@x.com"] {
            assert!(store.insert_subscriber_if_absent(SubscriberRow::new(email, None)).unwrap());
        }
        let emails: Vec<_> = store.snapshot().unwrap().into_iter().map(|s| s.email).collect();
        assert_eq!(emails, ["c@x.com", "a@x.com", "b@x.com"]);
    }

    #[test]
    fn duplicate_insert_is_rejected() {
        let store = MemorySubscriberStore::new();
        let sub = SubscriberRow::new("a@x.com", Some("A".into()));
        store.insert_subscriber(&sub).unwrap();

        assert!(matches!(store.insert_subscriber(&sub), Err(DbError::Duplicate(_))));
        assert!(!store.insert_subscriber_if_absent(sub).unwrap());
        assert_eq!(store.subscriber_count().unwrap(), 1);
    }

    #[test]
    fn concurrent_inserts_of_one_email_keep_a_single_record() {
        let store = Arc::new(MemorySubscriberStore::new());
        let handles: Vec<_> = (0..16)
            .map(|_| {
                let store = store.clone();
                thread::spawn(move || {
                    store
                        .insert_subscriber_if_absent(SubscriberRow::new("race@x.com", None))
                        .unwrap()
                })
            })
            .collect();

        let inserted = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|ok| *ok)
            .count();
        assert_eq!(inserted, 1);
        assert_eq!(store.subscriber_count().unwrap(), 1);
    }

    #[test]
    fn update_overwrites_flag_and_name() {
        let store = MemorySubscriberStore::new();
        let mut sub = SubscriberRow::new("a@x.com", None);
        store.insert_subscriber(&sub).unwrap();

        sub.is_active = false;
        sub.name = Some("Renamed".into());
        store.update_subscriber(&sub).unwrap();

        let found = store.find_subscriber("a@x.com").unwrap().unwrap();
        assert!(!found.is_active);
        assert_eq!(found.name.as_deref(), Some("Renamed"));
    }
}
