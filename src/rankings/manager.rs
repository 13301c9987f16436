/**
 * ============================================================================
 * RANKINGS MANAGER MODULE
 * ============================================================================
 *
 * PURPOSE: Host-facing entry point and bootstrap sequence
 *
 * BOOTSTRAP:
 * 1. Open or create the settings document (identity generated on first run)
 * 2. Connection flag starts true if the document already existed
 * 3. If the global `enabled` switch is off, stop here: every later request
 *    is dropped silently
 * 4. Submit exactly one identity request in the background
 *
 * BUILDER:
 * - with_namespace: override the plugin name used as leaderboard namespace
 * - without_logging: suppress informational output, warnings stay
 *
 * ============================================================================
 */

use crate::rankings::client::{HttpTransport, Transport};
use crate::rankings::config::ConfigStore;
use crate::rankings::dispatcher::Dispatcher;
use crate::rankings::error::{RankingsError, Result};
use crate::rankings::leaderboard::{Leaderboard, Session};
use crate::rankings::logging::Reporter;
use crate::rankings::registry::Registry;
use crate::rankings::types::{Endpoint, RequestKind, ServerIdentity, ServerRegistration};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::runtime::Handle;

/// Warned once on a fresh install, whatever the log settings.
pub const RELOAD_NOTICE: &str =
    "mc-rankings.com requires one more server reload for the initial setup to take effect.";

/**
 * What the embedding host provides
 * `runtime` is where every request task is spawned
 */
#[derive(Debug, Clone)]
pub struct Host {
    pub plugin_name: String,
    pub data_dir: PathBuf,
    pub runtime: Handle,
}

impl Host {
    pub fn new(plugin_name: impl Into<String>, data_dir: impl Into<PathBuf>, runtime: Handle) -> Self {
        Self {
            plugin_name: plugin_name.into(),
            data_dir: data_dir.into(),
            runtime,
        }
    }
}

pub struct McRankings {
    namespace: String,
    store: Arc<ConfigStore>,
    dispatcher: Arc<Dispatcher>,
    registry: Registry,
    reporter: Reporter,
}

impl McRankings {
    /**
     * Bootstrap against the public collector
     * Fails with a configuration error if the settings file is unusable
     */
    pub fn new(host: Host) -> Result<Self> {
        let transport: Arc<dyn Transport> = Arc::new(HttpTransport::new()?);
        Self::with_transport(host, transport)
    }

    /// Bootstrap with a caller-supplied transport.
    pub fn with_transport(host: Host, transport: Arc<dyn Transport>) -> Result<Self> {
        let reporter = Reporter::default();
        reporter.info(
            "Plugin is using mc-rankings.com - You will find a settings file in the mc-rankings folder.",
        );

        let store = Arc::new(ConfigStore::open(&host.data_dir)?);
        if store.was_created() {
            reporter.debug(format!("Created settings file {}", store.path().display()));
            reporter.warn(RELOAD_NOTICE);
        }

        let dispatcher = Arc::new(Dispatcher::new(
            transport,
            host.runtime,
            store.api_endpoint(),
            store.is_enabled(),
            !store.was_created(),
            reporter.clone(),
        ));

        let session = Arc::new(Session {
            dispatcher: Arc::clone(&dispatcher),
            identity: store.identity(),
            frontend_url: store.frontend_url(),
        });
        let registry = Registry::new(Arc::clone(&store), session);

        let rankings = Self {
            namespace: host.plugin_name,
            store,
            dispatcher,
            registry,
            reporter,
        };
        rankings.register_server();

        Ok(rankings)
    }

    /**
     * Use `namespace` instead of the plugin name for leaderboards loaded
     * from now on. White-spaces are rejected and leave the namespace as is.
     */
    pub fn with_namespace(&mut self, namespace: &str) -> Result<&mut Self> {
        if namespace.chars().any(char::is_whitespace) {
            return Err(RankingsError::Validation(namespace.to_string()));
        }
        self.namespace = namespace.to_string();
        Ok(self)
    }

    pub fn without_logging(&mut self) -> &mut Self {
        self.reporter.silence_infos();
        self
    }

    /**
     * Load or create leaderboard `id` in the current namespace
     * Creation writes the settings file synchronously
     */
    pub fn leaderboard(
        &self,
        id: u32,
        title: &str,
        metric: &str,
        higher_is_better: bool,
    ) -> Result<Leaderboard> {
        self.registry
            .get_or_create(&self.namespace, id, title, metric, higher_is_better)
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn is_enabled(&self) -> bool {
        self.dispatcher.is_enabled()
    }

    /// True once an identity exchange succeeded, or the server registered in a prior run.
    pub fn is_connected(&self) -> bool {
        self.dispatcher.is_connected()
    }

    pub fn identity(&self) -> ServerIdentity {
        self.store.identity()
    }

    pub fn settings_path(&self) -> &Path {
        self.store.path()
    }

    fn register_server(&self) {
        if !self.dispatcher.is_enabled() {
            return;
        }

        let identity = self.store.identity();
        let body = ServerRegistration {
            server_name: identity.public_name(),
            server_key: &identity.server_key,
            license: &identity.license_key,
        };

        self.reporter.debug("Connecting to mc-rankings.com...");
        self.dispatcher
            .submit_body(Endpoint::ServerRegister, RequestKind::Identity, &body);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rankings::config::{RankingsDocument, SETTINGS_FILE};
    use crate::rankings::test_utils::{
        MockReply, MockTransport, captured_logs, init_capture, warnings,
    };
    use std::time::Duration;
    use tokio::time::{Instant, sleep};
    use uuid::Uuid;

    fn host(data_dir: &Path) -> Host {
        Host::new("myplugin", data_dir, Handle::current())
    }

    fn write_document(data_dir: &Path, document: &RankingsDocument) {
        std::fs::write(
            data_dir.join(SETTINGS_FILE),
            serde_json::to_string_pretty(document).unwrap(),
        )
        .unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_fresh_install_registers_server_first() {
        let dir = tempfile::tempdir().unwrap();
        let (transport, mut calls) = MockTransport::new();

        let rankings = McRankings::with_transport(host(dir.path()), transport).unwrap();
        assert!(!rankings.is_connected());
        assert!(rankings.is_enabled());
        assert!(rankings.settings_path().exists());

        let call = calls.recv().await.unwrap();
        assert!(call.url.ends_with("/server/register"));
        let identity = rankings.identity();
        assert_eq!(call.body["serverKey"], identity.server_key);
        assert_eq!(call.body["license"], identity.license_key);
        assert_eq!(call.body["serverName"], identity.public_name());

        tokio::task::yield_now().await;
        assert!(rankings.is_connected());
    }

    #[tokio::test(start_paused = true)]
    async fn test_existing_install_starts_connected() {
        init_capture();
        let dir = tempfile::tempdir().unwrap();
        write_document(dir.path(), &RankingsDocument::generate());
        let (transport, _calls) = MockTransport::new();

        let rankings = McRankings::with_transport(host(dir.path()), transport).unwrap();
        assert!(rankings.is_connected());
        assert!(!warnings().iter().any(|m| m.contains(RELOAD_NOTICE)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_fresh_install_warns_reload_needed() {
        init_capture();
        let dir = tempfile::tempdir().unwrap();
        let (transport, _calls) = MockTransport::new();

        let mut rankings = McRankings::with_transport(host(dir.path()), transport).unwrap();
        rankings.without_logging();

        let notices: Vec<_> = captured_logs()
            .into_iter()
            .filter(|r| r.message.contains(RELOAD_NOTICE))
            .collect();
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].level, log::Level::Warn);
        assert_eq!(notices[0].message, format!("(mc-rankings) > {}", RELOAD_NOTICE));
    }

    #[tokio::test(start_paused = true)]
    async fn test_scores_after_new_leaderboard_wait_for_slow_collector() {
        let dir = tempfile::tempdir().unwrap();
        write_document(dir.path(), &RankingsDocument::generate());
        let (transport, mut calls) = MockTransport::new();
        transport.set_latency(Duration::from_millis(300));

        let started = Instant::now();
        let rankings =
            McRankings::with_transport(host(dir.path()), Arc::clone(&transport) as Arc<dyn Transport>)
                .unwrap();
        let leaderboard = rankings.leaderboard(1, "Wins", "wins", true).unwrap();
        leaderboard.set_score(Uuid::new_v4(), "Notch", 5);
        leaderboard.set_score(Uuid::new_v4(), "Jeb", 7);

        let mut registered_at = None;
        let mut score_offsets = Vec::new();
        while score_offsets.len() < 2 {
            let call = calls.recv().await.unwrap();
            if call.url.ends_with("/leaderboard/register") {
                registered_at = Some(call.at - started);
            } else if call.url.ends_with("/leaderboard/score") {
                score_offsets.push(call.at - started);
            }
        }
        score_offsets.sort();

        assert_eq!(registered_at, Some(Duration::ZERO));
        assert!(score_offsets[1] >= Duration::from_secs(2));
        assert!(score_offsets[1] < Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn test_disabled_install_sends_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let mut document = RankingsDocument::generate();
        document.enabled = false;
        write_document(dir.path(), &document);
        let (transport, _calls) = MockTransport::new();

        let rankings =
            McRankings::with_transport(host(dir.path()), Arc::clone(&transport) as Arc<dyn Transport>)
                .unwrap();
        assert!(!rankings.is_enabled());

        let leaderboard = rankings.leaderboard(1, "Wins", "wins", true).unwrap();
        leaderboard.set_score(Uuid::new_v4(), "Notch", 5);
        leaderboard.clear();

        sleep(Duration::from_secs(30)).await;
        assert_eq!(transport.call_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_score_before_identity_waits_for_gate() {
        let dir = tempfile::tempdir().unwrap();
        let (transport, mut calls) = MockTransport::new();
        transport.reply(
            Endpoint::ServerRegister,
            MockReply::Status(503, "starting up".to_string()),
        );

        let started = Instant::now();
        let rankings = McRankings::with_transport(host(dir.path()), transport).unwrap();
        let leaderboard = rankings.leaderboard(1, "Wins", "wins", true).unwrap();
        leaderboard.set_score(Uuid::new_v4(), "Notch", 5);

        let mut score_call = None;
        while let Some(call) = calls.recv().await {
            if call.url.ends_with("/leaderboard/score") {
                score_call = Some(call);
                break;
            }
        }

        let score_call = score_call.unwrap();
        assert!(score_call.at - started >= Duration::from_secs(2));
        assert!(!rankings.is_connected());
    }

    #[tokio::test]
    async fn test_namespace_with_space_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let (transport, _calls) = MockTransport::new();
        let mut rankings = McRankings::with_transport(host(dir.path()), transport).unwrap();

        let err = rankings.with_namespace("my plugin").err().unwrap();
        assert!(matches!(err, RankingsError::Validation(_)));
        assert_eq!(rankings.namespace(), "myplugin");

        assert!(rankings.with_namespace("my\tplugin").is_err());
        assert_eq!(rankings.namespace(), "myplugin");

        rankings.with_namespace("minigames").unwrap().without_logging();
        assert_eq!(rankings.namespace(), "minigames");
    }

    #[tokio::test]
    async fn test_namespace_scopes_leaderboards() {
        let dir = tempfile::tempdir().unwrap();
        let (transport, _calls) = MockTransport::new();
        let mut rankings = McRankings::with_transport(host(dir.path()), transport).unwrap();

        let default_ns = rankings.leaderboard(1, "Wins", "wins", true).unwrap();
        rankings.with_namespace("minigames").unwrap();
        let custom_ns = rankings.leaderboard(1, "Wins", "wins", true).unwrap();

        assert_eq!(default_ns.namespace(), "myplugin");
        assert_eq!(custom_ns.namespace(), "minigames");
        assert_ne!(default_ns.secret_key(), custom_ns.secret_key());
        assert!(custom_ns.url().ends_with("/minigames/1"));
    }

    #[tokio::test]
    async fn test_leaderboard_round_trip_across_restarts() {
        let dir = tempfile::tempdir().unwrap();

        let (transport, _calls) = MockTransport::new();
        let first = McRankings::with_transport(host(dir.path()), transport).unwrap();
        let created = first.leaderboard(9, "Wins", "wins", true).unwrap();
        let again = first.leaderboard(9, "Wins", "wins", true).unwrap();
        assert_eq!(created.secret_key(), again.secret_key());
        let identity = first.identity();
        drop(first);

        let (transport, _calls) = MockTransport::new();
        let second = McRankings::with_transport(host(dir.path()), transport).unwrap();
        let reloaded = second.leaderboard(9, "Wins", "wins", true).unwrap();

        assert_eq!(second.identity(), identity);
        assert_eq!(reloaded.title(), "Wins");
        assert_eq!(reloaded.metric(), "wins");
        assert!(reloaded.higher_is_better());
        assert_eq!(reloaded.secret_key(), created.secret_key());
    }

    #[tokio::test(start_paused = true)]
    async fn test_rejected_score_is_logged_not_raised() {
        init_capture();
        let dir = tempfile::tempdir().unwrap();
        write_document(dir.path(), &RankingsDocument::generate());
        let (transport, _calls) = MockTransport::new();
        transport.reply(
            Endpoint::Score,
            MockReply::Status(500, "database unavailable".to_string()),
        );

        let rankings =
            McRankings::with_transport(host(dir.path()), Arc::clone(&transport) as Arc<dyn Transport>)
                .unwrap();
        let leaderboard = rankings.leaderboard(1, "Wins", "wins", true).unwrap();
        leaderboard.set_score(Uuid::new_v4(), "Notch", 5);

        sleep(Duration::from_secs(10)).await;
        assert_eq!(transport.call_count(), 3);

        let warnings = warnings();
        assert_eq!(warnings.iter().filter(|m| m.contains("score")).count(), 1);
        assert_eq!(
            warnings
                .iter()
                .filter(|m| m.contains("database unavailable"))
                .count(),
            1
        );
        assert_eq!(warnings.len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_without_logging_keeps_warnings() {
        init_capture();
        let dir = tempfile::tempdir().unwrap();
        let (transport, mut calls) = MockTransport::new();
        transport.reply(
            Endpoint::LeaderboardRegister,
            MockReply::Status(409, "conflict".to_string()),
        );

        let mut rankings = McRankings::with_transport(host(dir.path()), transport).unwrap();
        rankings.without_logging();
        let infos_before = captured_logs().len();

        rankings.leaderboard(1, "Wins", "wins", true).unwrap();
        calls.recv().await.unwrap();
        calls.recv().await.unwrap();
        tokio::task::yield_now().await;

        let logs = captured_logs();
        let new_logs: Vec<_> = logs[infos_before..].iter().collect();
        assert!(new_logs.iter().all(|r| r.level == log::Level::Warn));
        assert!(new_logs
            .iter()
            .any(|r| r.message.contains("Could not update leaderboard")));
    }
}
