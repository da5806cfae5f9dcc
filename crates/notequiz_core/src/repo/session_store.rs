//! Non-durable stores and the durable-with-fallback composite.
//!
//! # Responsibility
//! - Keep scores for the running session when durable storage is missing.
//! - Chain a durable store with a session store.
//!
//! # Invariants
//! - `FallbackScoreStore` is durable only while its primary is.
//! - A primary failure never prevents the secondary from being tried.
//! - A save that only reached the secondary is reported through
//!   `last_save_durable()`.

use crate::model::snapshot::PersistedSnapshot;
use crate::repo::score_store::{parse_snapshot, ScoreStore, StoreError, StoreResult};
use log::warn;
use std::cell::{Cell, RefCell};

/// Session-scoped store holding the serialized snapshot in memory.
#[derive(Debug, Default)]
pub struct MemoryScoreStore {
    slot: RefCell<Option<String>>,
}

impl MemoryScoreStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ScoreStore for MemoryScoreStore {
    fn is_available(&self) -> bool {
        true
    }

    fn is_durable(&self) -> bool {
        false
    }

    fn save(&self, snapshot: &PersistedSnapshot) -> StoreResult<()> {
        let value = serde_json::to_string(snapshot)?;
        *self.slot.borrow_mut() = Some(value);
        Ok(())
    }

    fn last_save_durable(&self) -> bool {
        false
    }

    fn load(&self) -> StoreResult<Option<PersistedSnapshot>> {
        match self.slot.borrow().as_deref() {
            Some(value) => parse_snapshot(value).map(Some),
            None => Ok(None),
        }
    }

    fn clear(&self) -> StoreResult<()> {
        self.slot.borrow_mut().take();
        Ok(())
    }
}

/// Store used when no storage backend could be opened.
#[derive(Debug, Clone)]
pub struct DisabledScoreStore {
    reason: String,
}

impl DisabledScoreStore {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl ScoreStore for DisabledScoreStore {
    fn is_available(&self) -> bool {
        false
    }

    fn save(&self, _snapshot: &PersistedSnapshot) -> StoreResult<()> {
        Err(StoreError::Unavailable(self.reason.clone()))
    }

    fn last_save_durable(&self) -> bool {
        false
    }

    fn load(&self) -> StoreResult<Option<PersistedSnapshot>> {
        Err(StoreError::Unavailable(self.reason.clone()))
    }

    fn clear(&self) -> StoreResult<()> {
        Ok(())
    }
}

/// Durable primary store with a session-scoped secondary.
#[derive(Debug)]
pub struct FallbackScoreStore<P, S> {
    primary: P,
    secondary: S,
    /// Set while the latest save went to the secondary only.
    primary_failed: Cell<bool>,
}

impl<P: ScoreStore, S: ScoreStore> FallbackScoreStore<P, S> {
    pub fn new(primary: P, secondary: S) -> Self {
        Self {
            primary,
            secondary,
            primary_failed: Cell::new(false),
        }
    }

    pub fn primary(&self) -> &P {
        &self.primary
    }

    pub fn secondary(&self) -> &S {
        &self.secondary
    }
}

impl<P: ScoreStore, S: ScoreStore> ScoreStore for FallbackScoreStore<P, S> {
    fn is_available(&self) -> bool {
        self.primary.is_available() || self.secondary.is_available()
    }

    fn is_durable(&self) -> bool {
        self.primary.is_durable()
    }

    fn save(&self, snapshot: &PersistedSnapshot) -> StoreResult<()> {
        match self.primary.save(snapshot) {
            Ok(()) => {
                self.primary_failed.set(false);
                Ok(())
            }
            Err(err) => {
                warn!("event=score_save module=repo status=fallback store=primary error={err}");
                self.primary_failed.set(true);
                self.secondary.save(snapshot)
            }
        }
    }

    fn last_save_durable(&self) -> bool {
        if self.primary_failed.get() {
            self.secondary.last_save_durable()
        } else {
            self.primary.last_save_durable()
        }
    }

    fn load(&self) -> StoreResult<Option<PersistedSnapshot>> {
        match self.primary.load() {
            Ok(Some(snapshot)) => Ok(Some(snapshot)),
            Ok(None) => self.secondary.load(),
            Err(err) => {
                warn!("event=score_load module=repo status=fallback store=primary error={err}");
                self.secondary.load()
            }
        }
    }

    fn clear(&self) -> StoreResult<()> {
        let primary = self.primary.clear();
        let secondary = self.secondary.clear();
        primary.and(secondary)
    }
}
