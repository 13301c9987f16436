/**
 * ============================================================================
 * KEY GENERATION MODULE
 * ============================================================================
 *
 * PURPOSE: Opaque tokens for license, server and leaderboard secret keys
 *
 * - Keys: 14 characters from [A-Za-z0-9]
 * - Default server name: random UUID v4
 *
 * ============================================================================
 */

use rand::distributions::Alphanumeric;
use rand::Rng;
use uuid::Uuid;

/// Length of every generated key.
pub const KEY_LENGTH: usize = 14;

/**
 * Generate a random key from [A-Za-z0-9]
 * Uses the thread-local CSPRNG, the collector treats keys as credentials
 */
pub fn generate_key() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(KEY_LENGTH)
        .map(char::from)
        .collect()
}

// Unique default server name for fresh installs
pub fn generate_server_name() -> String {
    Uuid::new_v4().to_string()
}
