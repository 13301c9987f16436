/**
 * ============================================================================
 * RANKINGS TYPES MODULE
 * ============================================================================
 *
 * PURPOSE: Define the data structures shared across the rankings client
 *
 * TYPES DEFINED:
 * - ServerIdentity: License key, server key and server name
 * - PlayerScore: One player's score, transient per call
 * - RequestKind: Classification driving wait policy and failure logging
 * - Endpoint: Fixed set of collector endpoints
 * - RequestDescriptor: One outbound request, consumed once by the dispatcher
 * - Wire bodies: JSON payloads sent to each endpoint
 *
 * ============================================================================
 */

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use uuid::Uuid;

/// Cold-start wait for leaderboard registrations.
pub const REGISTRATION_GATE: Duration = Duration::from_secs(1);

/// Cold-start wait for single and bulk score updates.
pub const SCORE_GATE: Duration = Duration::from_secs(2);

/// One-shot delay armed after a leaderboard registration has been dispatched.
pub const REGISTRATION_SETTLE: Duration = Duration::from_secs(2);

/**
 * Identity of this server towards the collector
 * Generated once on first run and persisted forever
 */
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerIdentity {
    pub license_key: String,
    pub server_key: String,
    pub server_name: String,
}

impl ServerIdentity {
    /**
     * Server name as it is sent to the collector and used in URLs
     * White-spaces are not allowed there and become dashes
     */
    pub fn public_name(&self) -> String {
        self.server_name.replace(' ', "-")
    }
}

/**
 * A single player's score
 * Never persisted locally
 */
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerScore {
    pub uuid: Uuid,
    pub username: String,
    pub score: i64,
}

impl PlayerScore {
    pub fn new(uuid: Uuid, username: impl Into<String>, score: i64) -> Self {
        Self {
            uuid,
            username: username.into(),
            score,
        }
    }
}

/**
 * Classification of an outbound request
 * Decides the cold-start wait and the warning logged on rejection
 */
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestKind {
    Identity,
    LeaderboardRegistration,
    ScoreUpdate,
    BulkScoreUpdate,
}

impl RequestKind {
    /**
     * Wait applied before the network call while no identity exchange has
     * succeeded yet. Identity requests never wait.
     */
    pub fn cold_start_wait(self) -> Option<Duration> {
        match self {
            RequestKind::Identity => None,
            RequestKind::LeaderboardRegistration => Some(REGISTRATION_GATE),
            RequestKind::ScoreUpdate | RequestKind::BulkScoreUpdate => Some(SCORE_GATE),
        }
    }

    /// Whether this kind waits out an armed registration settle delay.
    pub fn consumes_settle_delay(self) -> bool {
        matches!(self, RequestKind::ScoreUpdate | RequestKind::BulkScoreUpdate)
    }

    /// Warning logged when the collector rejects a request of this kind.
    pub fn failure_message(self) -> &'static str {
        match self {
            RequestKind::Identity => "Could not connect to mc-rankings.com",
            RequestKind::LeaderboardRegistration => "Could not update leaderboard",
            RequestKind::ScoreUpdate => "Could not update score",
            RequestKind::BulkScoreUpdate => "Could not execute bulk task",
        }
    }
}

impl fmt::Display for RequestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RequestKind::Identity => "identity",
            RequestKind::LeaderboardRegistration => "leaderboard registration",
            RequestKind::ScoreUpdate => "score update",
            RequestKind::BulkScoreUpdate => "bulk score update",
        };
        f.write_str(name)
    }
}

/// Collector endpoints, relative to the API base URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    ServerRegister,
    LeaderboardRegister,
    Score,
    Scores,
    ScoreDelete,
    ScoreDeleteAll,
}

impl Endpoint {
    pub fn path(self) -> &'static str {
        match self {
            Endpoint::ServerRegister => "server/register",
            Endpoint::LeaderboardRegister => "leaderboard/register",
            Endpoint::Score => "leaderboard/score",
            Endpoint::Scores => "leaderboard/scores",
            Endpoint::ScoreDelete => "score/delete",
            Endpoint::ScoreDeleteAll => "score/deleteAll",
        }
    }
}

/**
 * A single outbound request
 * Built by the facade, consumed once by the dispatcher
 */
#[derive(Debug, Clone)]
pub struct RequestDescriptor {
    pub endpoint: Endpoint,
    pub body: serde_json::Value,
    pub kind: RequestKind,
}

impl RequestDescriptor {
    /// Build a descriptor from any serializable body.
    pub fn new<B: Serialize>(
        endpoint: Endpoint,
        kind: RequestKind,
        body: &B,
    ) -> serde_json::Result<Self> {
        Ok(Self {
            endpoint,
            body: serde_json::to_value(body)?,
            kind,
        })
    }
}

// =============================================================================
// Wire bodies
// =============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ServerRegistration<'a> {
    pub server_name: String,
    pub server_key: &'a str,
    pub license: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct LeaderboardRegistration<'a> {
    pub server_key: &'a str,
    pub secret_key: &'a str,
    pub title: &'a str,
    pub plugin_name: &'a str,
    pub metric: &'a str,
    pub leaderboard_id: u32,
    pub higher_is_better: bool,
    pub enabled: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ScoreUpdate<'a> {
    pub secret_key: &'a str,
    pub uuid: Uuid,
    pub username: &'a str,
    pub score: i64,
    pub server_key: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct BulkScoreUpdate<'a> {
    pub server_key: &'a str,
    pub secret_key: &'a str,
    pub scores: &'a [PlayerScore],
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ScoreDeletion<'a> {
    pub secret_key: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uuid: Option<Uuid>,
}
