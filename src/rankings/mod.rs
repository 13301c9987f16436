/**
 * ============================================================================
 * RANKINGS MODULE
 * ============================================================================
 *
 * PURPOSE: Outbound telemetry client that reports server identity,
 * leaderboard definitions and player scores to the mc-rankings.com collector
 * over HTTP without ever blocking the host.
 *
 * ARCHITECTURE:
 * - config: Persisted settings document (identity keys, leaderboard secrets)
 * - keys: Random key and server name generation
 * - types: Data structures and request descriptors
 * - error: Error taxonomy
 * - logging: Prefixed log output with optional info suppression
 * - client: HTTP transport seam and reqwest implementation
 * - dispatcher: Fire-and-forget request execution with readiness gating
 * - registry: Get-or-create table of leaderboards
 * - leaderboard: Public leaderboard handle
 * - manager: Bootstrap sequence and host-facing builder
 *
 * ============================================================================
 */

pub mod client;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod keys;
pub mod leaderboard;
pub mod logging;
pub mod manager;
pub mod registry;
pub mod types;

#[cfg(test)]
pub(crate) mod test_utils;
