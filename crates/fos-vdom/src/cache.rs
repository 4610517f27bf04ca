//! Run-scoped key/value cache
//!
//! Backs memoized derived properties. A stored "nothing" (`None`) is kept
//! distinct from an absent key, and a default factory runs at most once per
//! key until the cache is cleared.

use std::any::Any;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// Cache misuse
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CacheError {
    #[error("Cache key must be a non-empty string")]
    InvalidKey,

    #[error("Default factory for cache key {0:?} produced no value")]
    UndefinedDefault(String),

    #[error("Cache key {0:?} holds a value of another type")]
    TypeMismatch(String),
}

type Slot = Option<Rc<dyn Any>>;

/// Key/value store with lazily computed defaults
#[derive(Default)]
pub struct Cache {
    entries: RefCell<HashMap<String, Slot>>,
}

impl Cache {
    pub fn new() -> Self {
        Self::default()
    }

    fn check_key(key: &str) -> Result<(), CacheError> {
        if key.is_empty() {
            return Err(CacheError::InvalidKey);
        }
        Ok(())
    }

    /// Store a value verbatim; `None` is stored as a present-but-empty entry
    pub fn set<T: Any>(&self, key: &str, value: Option<T>) -> Result<(), CacheError> {
        Self::check_key(key)?;
        let slot = value.map(|v| Rc::new(v) as Rc<dyn Any>);
        self.entries.borrow_mut().insert(key.to_string(), slot);
        Ok(())
    }

    /// `None` if absent, `Some(None)` if stored empty, `Some(Some(v))` otherwise.
    /// A value of another type reads as absent.
    pub fn get<T: Any>(&self, key: &str) -> Option<Option<Rc<T>>> {
        let entries = self.entries.borrow();
        match entries.get(key)? {
            None => Some(None),
            Some(value) => Rc::clone(value).downcast::<T>().ok().map(Some),
        }
    }

    /// Whether the key is present, even if it holds nothing
    pub fn contains(&self, key: &str) -> bool {
        self.entries.borrow().contains_key(key)
    }

    /// Return the stored entry, or run `factory` once and store its result.
    /// A present key never runs the factory; one holding another type is an
    /// error rather than being overwritten.
    ///
    /// The factory runs without the cache borrowed, so it may read or write
    /// other keys.
    pub fn get_or_insert_with<T, F>(&self, key: &str, factory: F) -> Result<Option<Rc<T>>, CacheError>
    where
        T: Any,
        F: FnOnce() -> Option<T>,
    {
        Self::check_key(key)?;
        if let Some(slot) = self.entries.borrow().get(key) {
            return match slot {
                None => Ok(None),
                Some(value) => Rc::clone(value)
                    .downcast::<T>()
                    .map(Some)
                    .map_err(|_| CacheError::TypeMismatch(key.to_string())),
            };
        }
        let value = factory().ok_or_else(|| CacheError::UndefinedDefault(key.to_string()))?;
        let value = Rc::new(value);
        self.entries
            .borrow_mut()
            .insert(key.to_string(), Some(Rc::clone(&value) as Rc<dyn Any>));
        Ok(Some(value))
    }

    /// Remove every entry
    pub fn clear(&self) {
        self.entries.borrow_mut().clear();
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }
}

impl std::fmt::Debug for Cache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cache").field("entries", &self.len()).finish()
    }
}
