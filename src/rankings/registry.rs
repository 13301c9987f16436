/**
 * ============================================================================
 * LEADERBOARD REGISTRY MODULE
 * ============================================================================
 *
 * PURPOSE: Get-or-create table of leaderboards keyed by (namespace, id)
 *
 * GET-OR-CREATE:
 * 1. Persist a fresh record (new secret, enabled) if none exists yet
 * 2. Reread the persisted record unconditionally
 * 3. Refresh the shared in-memory entity from it
 * 4. Announce the leaderboard to the collector
 *
 * The returned handle therefore always reflects exactly what is on disk.
 * Secrets are never regenerated for an existing (namespace, id).
 *
 * ============================================================================
 */

use crate::rankings::config::{ConfigStore, LeaderboardRecord};
use crate::rankings::error::{RankingsError, Result};
use crate::rankings::leaderboard::{Leaderboard, LeaderboardEntity, Session};
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

type EntityKey = (String, u32);

pub struct Registry {
    store: Arc<ConfigStore>,
    session: Arc<Session>,
    entities: Mutex<HashMap<EntityKey, Arc<RwLock<LeaderboardEntity>>>>,
}

impl Registry {
    pub(crate) fn new(store: Arc<ConfigStore>, session: Arc<Session>) -> Self {
        Self {
            store,
            session,
            entities: Mutex::new(HashMap::new()),
        }
    }

    /**
     * Load or create the leaderboard `id` under `namespace`
     *
     * `title`, `metric` and `higher_is_better` only seed a new record. For an
     * existing record the persisted values win.
     *
     * Fails only if a new record cannot be written to the settings file.
     */
    pub fn get_or_create(
        &self,
        namespace: &str,
        id: u32,
        title: &str,
        metric: &str,
        higher_is_better: bool,
    ) -> Result<Leaderboard> {
        let created = self.store.insert_leaderboard_if_absent(namespace, id, || {
            LeaderboardRecord::generate(title, metric, higher_is_better)
        })?;

        if created {
            self.session
                .dispatcher
                .reporter()
                .debug(format!("Created leaderboard {} ({}/{})", title, namespace, id));
        }

        let record = self.store.leaderboard(namespace, id).ok_or_else(|| {
            RankingsError::configuration(
                "read",
                self.store.path(),
                format!("leaderboard {}/{} missing after write", namespace, id),
            )
        })?;

        let entity = self.refresh(namespace, id, LeaderboardEntity::from_record(id, record));
        let leaderboard = Leaderboard::new(namespace.to_string(), entity, Arc::clone(&self.session));
        leaderboard.announce();

        Ok(leaderboard)
    }

    // Existing handles see the reloaded state, they share the same entity
    fn refresh(
        &self,
        namespace: &str,
        id: u32,
        loaded: LeaderboardEntity,
    ) -> Arc<RwLock<LeaderboardEntity>> {
        match self.entities().entry((namespace.to_string(), id)) {
            Entry::Occupied(slot) => {
                *slot.get().write().unwrap_or_else(PoisonError::into_inner) = loaded;
                Arc::clone(slot.get())
            }
            Entry::Vacant(slot) => Arc::clone(slot.insert(Arc::new(RwLock::new(loaded)))),
        }
    }

    fn entities(&self) -> MutexGuard<'_, HashMap<EntityKey, Arc<RwLock<LeaderboardEntity>>>> {
        self.entities.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
