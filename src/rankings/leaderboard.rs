/**
 * ============================================================================
 * LEADERBOARD HANDLE MODULE
 * ============================================================================
 *
 * PURPOSE: Public handle through which the host publishes scores
 *
 * BEHAVIOR:
 * - Every mutation is a fire-and-forget request through the dispatcher
 * - A disabled leaderboard silently ignores every mutation
 * - `url()` is a pure template substitution and always works
 * - Handles are views over the registry's shared entity, never copies
 *
 * ============================================================================
 */

use crate::rankings::config::LeaderboardRecord;
use crate::rankings::dispatcher::Dispatcher;
use crate::rankings::types::{
    BulkScoreUpdate, Endpoint, LeaderboardRegistration, PlayerScore, RequestKind,
    ScoreDeletion, ScoreUpdate, ServerIdentity,
};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard};
use uuid::Uuid;

/**
 * In-memory state of one leaderboard
 * Always reflects the persisted record it was loaded from
 */
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeaderboardEntity {
    pub id: u32,
    pub title: String,
    pub metric: String,
    pub higher_is_better: bool,
    pub enabled: bool,
    pub secret_key: String,
}

impl LeaderboardEntity {
    pub fn from_record(id: u32, record: LeaderboardRecord) -> Self {
        Self {
            id,
            title: record.title,
            metric: record.metric,
            higher_is_better: record.higher_is_better,
            enabled: record.enabled,
            secret_key: record.secret_key,
        }
    }
}

/// State shared by every handle of one client instance.
pub(crate) struct Session {
    pub dispatcher: Arc<Dispatcher>,
    pub identity: ServerIdentity,
    pub frontend_url: String,
}

#[derive(Clone)]
pub struct Leaderboard {
    namespace: String,
    entity: Arc<RwLock<LeaderboardEntity>>,
    session: Arc<Session>,
}

impl Leaderboard {
    pub(crate) fn new(
        namespace: String,
        entity: Arc<RwLock<LeaderboardEntity>>,
        session: Arc<Session>,
    ) -> Self {
        Self {
            namespace,
            entity,
            session,
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn id(&self) -> u32 {
        self.entity().id
    }

    pub fn title(&self) -> String {
        self.entity().title.clone()
    }

    pub fn metric(&self) -> String {
        self.entity().metric.clone()
    }

    pub fn higher_is_better(&self) -> bool {
        self.entity().higher_is_better
    }

    pub fn is_enabled(&self) -> bool {
        self.entity().enabled
    }

    /// Permanent credential of this leaderboard at the collector.
    pub fn secret_key(&self) -> String {
        self.entity().secret_key.clone()
    }

    /**
     * Public page of this leaderboard
     * Substitutes <serverName>, <pluginName> and <id> in the frontend template
     */
    pub fn url(&self) -> String {
        self.session
            .frontend_url
            .replace("<serverName>", &self.session.identity.public_name())
            .replace("<pluginName>", &self.namespace)
            .replace("<id>", &self.id().to_string())
    }

    pub fn set_score(&self, uuid: Uuid, username: &str, score: i64) {
        let Some(entity) = self.enabled_entity() else {
            return;
        };

        let body = ScoreUpdate {
            secret_key: &entity.secret_key,
            uuid,
            username,
            score,
            server_key: &self.session.identity.server_key,
        };
        self.session
            .dispatcher
            .submit_body(Endpoint::Score, RequestKind::ScoreUpdate, &body);
    }

    pub fn set_player_score(&self, player_score: &PlayerScore) {
        self.set_score(player_score.uuid, &player_score.username, player_score.score);
    }

    /**
     * Publish many scores in a single request
     * Sent as one bulk update regardless of the list length
     */
    pub fn set_scores(&self, scores: &[PlayerScore]) {
        let Some(entity) = self.enabled_entity() else {
            return;
        };

        let body = BulkScoreUpdate {
            server_key: &self.session.identity.server_key,
            secret_key: &entity.secret_key,
            scores,
        };
        self.session
            .dispatcher
            .submit_body(Endpoint::Scores, RequestKind::BulkScoreUpdate, &body);
    }

    pub fn delete_entry(&self, uuid: Uuid) {
        let Some(entity) = self.enabled_entity() else {
            return;
        };

        let body = ScoreDeletion {
            secret_key: &entity.secret_key,
            uuid: Some(uuid),
        };
        self.session
            .dispatcher
            .submit_body(Endpoint::ScoreDelete, RequestKind::ScoreUpdate, &body);
    }

    /// Remove every entry of this leaderboard.
    pub fn clear(&self) {
        let Some(entity) = self.enabled_entity() else {
            return;
        };

        let body = ScoreDeletion {
            secret_key: &entity.secret_key,
            uuid: None,
        };
        self.session
            .dispatcher
            .submit_body(Endpoint::ScoreDeleteAll, RequestKind::ScoreUpdate, &body);
    }

    /**
     * Announce this leaderboard to the collector
     * Sent on every load, the collector upserts. Not gated by `enabled`,
     * the flag itself is part of the announcement.
     */
    pub(crate) fn announce(&self) {
        let entity = self.entity().clone();

        let body = LeaderboardRegistration {
            server_key: &self.session.identity.server_key,
            secret_key: &entity.secret_key,
            title: &entity.title,
            plugin_name: &self.namespace,
            metric: &entity.metric,
            leaderboard_id: entity.id,
            higher_is_better: entity.higher_is_better,
            enabled: entity.enabled,
        };
        self.session.dispatcher.submit_body(
            Endpoint::LeaderboardRegister,
            RequestKind::LeaderboardRegistration,
            &body,
        );
    }

    fn entity(&self) -> RwLockReadGuard<'_, LeaderboardEntity> {
        self.entity.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn enabled_entity(&self) -> Option<LeaderboardEntity> {
        let entity = self.entity();
        entity.enabled.then(|| entity.clone())
    }
}

impl std::fmt::Debug for Leaderboard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let entity = self.entity();
        f.debug_struct("Leaderboard")
            .field("namespace", &self.namespace)
            .field("id", &entity.id)
            .field("title", &entity.title)
            .field("enabled", &entity.enabled)
            .finish()
    }
}
