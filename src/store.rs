//! Template storage.
//!
//! Templates belong to a user. Lookups are always scoped to the requesting
//! user, so a template owned by someone else is indistinguishable from one
//! that does not exist.

use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::error::PlatenError;
use crate::model::Template;

/// Per-user template persistence.
pub trait TemplateStore: Send + Sync {
    /// The template with `id`, if `user_id` owns it.
    fn get(&self, id: &str, user_id: &str) -> Result<Template, PlatenError>;

    /// All templates owned by `user_id`, most recently written first.
    fn list(&self, user_id: &str) -> Result<Vec<Template>, PlatenError>;

    /// Create or update a template and return its stored version.
    ///
    /// New templates start at version 1 and get an id when theirs is empty.
    /// Every update bumps the version; the last write wins.
    fn put(&self, user_id: &str, template: Template) -> Result<Template, PlatenError>;

    fn delete(&self, id: &str, user_id: &str) -> Result<(), PlatenError>;
}

#[derive(Debug)]
struct Entry {
    owner: String,
    template: Template,
    /// Store-wide write counter, for recency ordering.
    revision: u64,
}

#[derive(Debug, Default)]
struct Inner {
    entries: HashMap<String, Entry>,
    revision: u64,
    next_id: u64,
}

impl Inner {
    /// An id no stored template uses yet, so a new template is never
    /// mistaken for an update.
    fn fresh_id(&mut self) -> String {
        loop {
            self.next_id += 1;
            let id = format!("tpl-{}", self.next_id);
            if !self.entries.contains_key(&id) {
                return id;
            }
        }
    }
}

/// An in-process store. Cheap to create, shared behind a lock.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Inner>, PlatenError> {
        self.inner
            .read()
            .map_err(|_| PlatenError::Backend("template store lock poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Inner>, PlatenError> {
        self.inner
            .write()
            .map_err(|_| PlatenError::Backend("template store lock poisoned".to_string()))
    }
}

impl TemplateStore for MemoryStore {
    fn get(&self, id: &str, user_id: &str) -> Result<Template, PlatenError> {
        self.read()?
            .entries
            .get(id)
            .filter(|entry| entry.owner == user_id)
            .map(|entry| entry.template.clone())
            .ok_or_else(|| PlatenError::NotFound(id.to_string()))
    }

    fn list(&self, user_id: &str) -> Result<Vec<Template>, PlatenError> {
        let inner = self.read()?;
        let mut owned: Vec<&Entry> = inner.entries.values().filter(|e| e.owner == user_id).collect();
        owned.sort_by(|a, b| b.revision.cmp(&a.revision));
        Ok(owned.into_iter().map(|e| e.template.clone()).collect())
    }

    fn put(&self, user_id: &str, mut template: Template) -> Result<Template, PlatenError> {
        template.page.validate()?;

        let mut inner = self.write()?;
        if template.id.is_empty() {
            template.id = inner.fresh_id();
        }

        template.version = match inner.entries.get(&template.id) {
            Some(existing) if existing.owner != user_id => {
                return Err(PlatenError::AccessDenied(format!(
                    "template '{}' belongs to another user",
                    template.id
                )));
            }
            Some(existing) => existing.template.version + 1,
            None => 1,
        };
        inner.revision += 1;
        let revision = inner.revision;

        log::debug!("stored template '{}' v{} for {}", template.id, template.version, user_id);
        inner.entries.insert(
            template.id.clone(),
            Entry {
                owner: user_id.to_string(),
                template: template.clone(),
                revision,
            },
        );
        Ok(template)
    }

    fn delete(&self, id: &str, user_id: &str) -> Result<(), PlatenError> {
        let mut inner = self.write()?;
        if !inner.entries.get(id).is_some_and(|e| e.owner == user_id) {
            return Err(PlatenError::NotFound(id.to_string()));
        }
        inner.entries.remove(id);
        Ok(())
    }
}
