use std::collections::HashMap;
use std::sync::Arc;

use serenity::http::Http;
use serenity::model::id::GuildId;
use songbird::Songbird;
use tokio::sync::Mutex;
use tracing::info;

use crate::session::VoiceSession;
use crate::settings::Settings;

/// Process-wide guild -> session map. Creation is idempotent under the map
/// lock, so two concurrent commands for the same guild always see the same
/// session.
pub struct SessionRegistry {
    sessions: Mutex<HashMap<u64, Arc<VoiceSession>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
        }
    }

    pub async fn get(&self, guild: GuildId) -> Option<Arc<VoiceSession>> {
        self.sessions.lock().await.get(&guild.0).map(Arc::clone)
    }

    pub async fn get_or_create(
        &self,
        guild: GuildId,
        http: Arc<Http>,
        manager: Arc<Songbird>,
        settings: Arc<Settings>,
    ) -> Arc<VoiceSession> {
        let mut sessions = self.sessions.lock().await;

        if let Some(session) = sessions.get(&guild.0) {
            return Arc::clone(session);
        }

        info!("Creating voice session for guild {}", guild.0);

        let session = Arc::new(VoiceSession::new(guild, http, manager, settings));
        session.spawn_playback_loop();
        sessions.insert(guild.0, Arc::clone(&session));

        session
    }

    /// Removes and tears down the guild's session. Returns false when there
    /// was none.
    pub async fn stop(&self, guild: GuildId) -> bool {
        let session = self.sessions.lock().await.remove(&guild.0);

        match session {
            Some(session) => {
                session.shutdown().await;
                true
            }
            None => false,
        }
    }

    /// Tears down every session; used on process shutdown.
    pub async fn shutdown_all(&self) {
        let sessions: Vec<_> = self
            .sessions
            .lock()
            .await
            .drain()
            .map(|(_, session)| session)
            .collect();

        for session in sessions {
            session.shutdown().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn deps() -> (Arc<Http>, Arc<Songbird>, Arc<Settings>) {
        let http = Arc::new(Http::new(""));
        let manager = Songbird::serenity();
        let settings = Arc::new(Settings::load(
            std::env::temp_dir().join(format!("chorus-bot-registry-{}.json", std::process::id())),
        ));

        (http, manager, settings)
    }

    #[tokio::test]
    async fn get_or_create_is_idempotent() {
        let registry = SessionRegistry::new();
        let (http, manager, settings) = deps();

        let first = registry
            .get_or_create(
                GuildId(1),
                Arc::clone(&http),
                Arc::clone(&manager),
                Arc::clone(&settings),
            )
            .await;
        let second = registry
            .get_or_create(GuildId(1), http, manager, settings)
            .await;

        assert!(Arc::ptr_eq(&first, &second));

        registry.shutdown_all().await;
    }

    #[tokio::test]
    async fn stop_removes_the_session() {
        let registry = SessionRegistry::new();
        let (http, manager, settings) = deps();

        registry
            .get_or_create(GuildId(2), http, manager, settings)
            .await;
        assert!(registry.get(GuildId(2)).await.is_some());

        assert!(registry.stop(GuildId(2)).await);
        assert!(registry.get(GuildId(2)).await.is_none());

        // a second stop has nothing to do
        assert!(!registry.stop(GuildId(2)).await);
    }
}
