use std::sync::{Arc, Mutex as StdMutex};
use std::time::{Duration, Instant};

use serenity::async_trait;
use serenity::http::Http;
use serenity::model::id::{GuildId, UserId};
use songbird::tracks::TrackHandle;
use songbird::{ytdl, Event, EventContext, EventHandler as VoiceEventHandler, Songbird, TrackEvent};
use tokio::sync::{Mutex, Notify};
use tokio::task::JoinHandle;
use tracing::info;

use crate::check_msg;
use crate::error::MusicError;
use crate::models::Track;
use crate::queue::PlaybackQueue;
use crate::settings::Settings;
use crate::votes::{self, Vote, VoteChoice};

const QUEUE_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Everything a command or the playback loop may mutate, behind one lock.
/// The queue head stays in place while it plays; `current` holds a copy of it
/// until the track finishes and the head is popped.
struct SessionState {
    queue: PlaybackQueue,
    current: Option<Track>,
    votes: Vec<Vote>,
    handle: Option<TrackHandle>,
    start_time: Instant,
    total_played: Duration,
    paused: bool,
}

impl SessionState {
    fn new() -> Self {
        Self {
            queue: PlaybackQueue::new(),
            current: None,
            votes: Vec::new(),
            handle: None,
            start_time: Instant::now(),
            total_played: Duration::ZERO,
            paused: false,
        }
    }

    /// Promotes the queue head to `current` and resets per-track state.
    /// Returns a copy of the track for the playback loop.
    fn begin_next(&mut self) -> Option<Track> {
        let track = self.queue.peek_head()?.clone();

        self.current = Some(track.clone());
        self.votes.clear();
        self.paused = false;
        self.total_played = Duration::ZERO;
        self.start_time = Instant::now();

        Some(track)
    }

    /// Drops the finished (or failed) head track.
    fn finish_current(&mut self) {
        self.queue.pop_head();
        self.current = None;
        self.votes.clear();
        self.handle = None;
        self.paused = false;
        self.total_played = Duration::ZERO;
    }

    fn restart_clock(&mut self) {
        self.start_time = Instant::now();
    }

    fn pause(&mut self) -> bool {
        if self.current.is_none() || self.paused {
            return false;
        }

        self.total_played += self.start_time.elapsed();
        self.paused = true;
        true
    }

    fn resume(&mut self) -> bool {
        if self.current.is_none() || !self.paused {
            return false;
        }

        self.start_time = Instant::now();
        self.paused = false;
        true
    }

    /// Time the current track has actually played. Paused time is excluded.
    fn elapsed(&self) -> Duration {
        if self.current.is_some() && !self.paused {
            self.total_played + self.start_time.elapsed()
        } else {
            self.total_played
        }
    }

    fn remove_song(&mut self, index: usize) -> Result<Track, MusicError> {
        if index >= self.queue.len() {
            return Err(MusicError::InvalidIndex);
        }

        if index == 0 && self.current.is_some() {
            return Err(MusicError::CannotRemoveCurrent);
        }

        self.queue.remove_at(index)
    }
}

/// Per-guild playback state machine. Owns the queue, the vote list for the
/// current track, the live track handle and the playback loop task.
pub struct VoiceSession {
    guild: GuildId,
    http: Arc<Http>,
    manager: Arc<Songbird>,
    settings: Arc<Settings>,
    state: Mutex<SessionState>,
    track_done: Notify,
    task: StdMutex<Option<JoinHandle<()>>>,
}

impl VoiceSession {
    pub(crate) fn new(
        guild: GuildId,
        http: Arc<Http>,
        manager: Arc<Songbird>,
        settings: Arc<Settings>,
    ) -> Self {
        Self {
            guild,
            http,
            manager,
            settings,
            state: Mutex::new(SessionState::new()),
            track_done: Notify::new(),
            task: StdMutex::new(None),
        }
    }

    /// Starts the playback loop. Called exactly once, by the registry, right
    /// after the session is created.
    pub(crate) fn spawn_playback_loop(self: &Arc<Self>) {
        let session = Arc::clone(self);
        let task = tokio::spawn(playback_loop(session));

        *self.task.lock().expect("playback task slot poisoned") = Some(task);
    }

    pub async fn enqueue(&self, track: Track) {
        self.state.lock().await.queue.enqueue(track);
    }

    /// True while a track is current (playing or paused).
    pub async fn is_playing(&self) -> bool {
        self.state.lock().await.current.is_some()
    }

    pub async fn current_track(&self) -> Option<Track> {
        self.state.lock().await.current.clone()
    }

    pub async fn queue_snapshot(&self) -> Vec<Track> {
        self.state.lock().await.queue.iter().cloned().collect()
    }

    pub async fn votes_snapshot(&self) -> Vec<Vote> {
        self.state.lock().await.votes.clone()
    }

    pub async fn cast_vote(&self, voter: UserId, choice: VoteChoice) -> Result<(), MusicError> {
        let mut state = self.state.lock().await;
        if state.current.is_none() {
            return Err(MusicError::NotConnected);
        }

        votes::cast(&mut state.votes, voter, choice);
        Ok(())
    }

    /// Ok(false) means the voter had no vote to remove.
    pub async fn remove_vote(&self, voter: UserId) -> Result<bool, MusicError> {
        let mut state = self.state.lock().await;
        if state.current.is_none() {
            return Err(MusicError::NotConnected);
        }

        Ok(votes::remove(&mut state.votes, voter))
    }

    /// Clears the votes and stops the active track, if any. The stop makes
    /// songbird fire the end event, which advances the playback loop. Safe to
    /// call when nothing is playing.
    pub async fn skip(&self) {
        let mut state = self.state.lock().await;
        state.votes.clear();

        if let Some(handle) = &state.handle {
            if let Err(why) = handle.stop() {
                info!("Stop on skip failed: {why}");
            }
        }
    }

    pub async fn pause(&self) -> Result<(), MusicError> {
        let mut state = self.state.lock().await;
        if state.current.is_none() {
            return Err(MusicError::NotConnected);
        }

        if state.pause() {
            if let Some(handle) = &state.handle {
                if let Err(why) = handle.pause() {
                    info!("Pause failed: {why}");
                }
            }
        }

        Ok(())
    }

    pub async fn resume(&self) -> Result<(), MusicError> {
        let mut state = self.state.lock().await;
        if state.current.is_none() {
            return Err(MusicError::NotConnected);
        }

        if state.resume() {
            if let Some(handle) = &state.handle {
                if let Err(why) = handle.play() {
                    info!("Resume failed: {why}");
                }
            }
        }

        Ok(())
    }

    /// Volume in `[0.0, 1.0]`, applied to the active track.
    pub async fn set_volume(&self, volume: f32) -> Result<(), MusicError> {
        let state = self.state.lock().await;
        match &state.handle {
            Some(handle) => {
                if let Err(why) = handle.set_volume(volume) {
                    info!("Set volume failed: {why}");
                }
                Ok(())
            }
            None => Err(MusicError::NotConnected),
        }
    }

    pub async fn elapsed(&self) -> Duration {
        self.state.lock().await.elapsed()
    }

    /// `index` is zero-based; index 0 is the playing track and cannot be
    /// removed, only skipped.
    pub async fn remove_song(&self, index: usize) -> Result<Track, MusicError> {
        self.state.lock().await.remove_song(index)
    }

    /// Best-effort teardown: cancels the loop, stops the audio, clears the
    /// queue and leaves the voice channel. Errors are logged and swallowed so
    /// the registry can always drop the session.
    pub async fn shutdown(&self) {
        let task = self.task.lock().expect("playback task slot poisoned").take();
        if let Some(task) = task {
            task.abort();
        }

        {
            let mut state = self.state.lock().await;
            if let Some(handle) = state.handle.take() {
                if let Err(why) = handle.stop() {
                    info!("Stop on shutdown failed: {why}");
                }
            }

            state.queue.clear();
            state.current = None;
            state.votes.clear();
            state.paused = false;
        }

        if self.manager.get(self.guild).is_some() {
            if let Err(why) = self.manager.remove(self.guild).await {
                info!("Could not leave voice in guild {}: {why}", self.guild.0);
            }
        }
    }
}

/// Long-lived task per session: waits for a voice connection and a non-empty
/// queue, plays the head track, waits for the end signal, pops and repeats.
async fn playback_loop(session: Arc<VoiceSession>) {
    loop {
        let call = match session.manager.get(session.guild) {
            Some(call) => call,
            None => {
                tokio::time::sleep(QUEUE_POLL_INTERVAL).await;
                continue;
            }
        };

        let track = match session.state.lock().await.begin_next() {
            Some(track) => track,
            None => {
                tokio::time::sleep(QUEUE_POLL_INTERVAL).await;
                continue;
            }
        };

        let source = match ytdl(&track.url).await {
            Ok(source) => source,
            Err(why) => {
                info!("Err starting source: {why:?}");
                check_msg(
                    track
                        .channel
                        .say(
                            &session.http,
                            format!("Could not play {} due to error {}", track.title, why),
                        )
                        .await,
                );
                session.state.lock().await.finish_current();
                continue;
            }
        };

        let volume = session.settings.volume_for(session.guild).await;

        let handle = {
            let mut call = call.lock().await;
            call.stop();
            call.play_source(source)
        };

        if let Err(why) = handle.set_volume(volume) {
            info!("Set volume failed: {why}");
        }

        handle
            .add_event(
                Event::Track(TrackEvent::End),
                TrackEndNotifier {
                    session: Arc::clone(&session),
                },
            )
            .expect("Add event END failed");

        {
            let mut state = session.state.lock().await;
            state.handle = Some(handle);
            state.restart_clock();
        }

        check_msg(
            track
                .channel
                .say(&session.http, format!("Now playing {track}"))
                .await,
        );

        session.track_done.notified().await;

        session.state.lock().await.finish_current();
    }
}

struct TrackEndNotifier {
    session: Arc<VoiceSession>,
}

#[async_trait]
impl VoiceEventHandler for TrackEndNotifier {
    async fn act(&self, _ctx: &EventContext<'_>) -> Option<Event> {
        info!("Track ended in guild {}", self.session.guild.0);
        self.session.track_done.notify_one();

        None
    }
}

#[cfg(test)]
mod tests {
    use serenity::model::id::{ChannelId, UserId};

    use super::*;

    fn track(title: &str) -> Track {
        Track {
            title: title.to_string(),
            url: format!("https://example.com/{title}"),
            duration: None,
            requester: UserId(1),
            requester_name: "alice".to_string(),
            channel: ChannelId(2),
        }
    }

    fn playing_state(titles: &[&str]) -> SessionState {
        let mut state = SessionState::new();
        for title in titles {
            state.queue.enqueue(track(title));
        }
        state.begin_next();
        state
    }

    #[test]
    fn begin_next_resets_votes_and_pause() {
        let mut state = SessionState::new();
        state.queue.enqueue(track("a"));
        state.queue.enqueue(track("b"));

        assert!(state.current.is_none());
        state.begin_next();
        assert_eq!(state.current.as_ref().unwrap().title, "a");

        votes::cast(&mut state.votes, UserId(5), VoteChoice::Keep);
        state.pause();

        state.finish_current();
        assert!(state.current.is_none());
        assert!(state.votes.is_empty());
        assert!(!state.paused);

        // next head is ready for the loop
        state.begin_next();
        assert_eq!(state.current.as_ref().unwrap().title, "b");
        assert!(state.votes.is_empty());
    }

    #[test]
    fn begin_next_on_empty_queue_is_none() {
        let mut state = SessionState::new();
        assert!(state.begin_next().is_none());
        assert!(state.current.is_none());
    }

    #[test]
    fn remove_song_rules() {
        let mut state = playing_state(&["a", "b", "c"]);

        assert_eq!(
            state.remove_song(0).unwrap_err(),
            MusicError::CannotRemoveCurrent
        );
        assert_eq!(state.remove_song(3).unwrap_err(), MusicError::InvalidIndex);

        let removed = state.remove_song(1).unwrap();
        assert_eq!(removed.title, "b");

        let order: Vec<_> = state.queue.iter().map(|t| t.title.clone()).collect();
        assert_eq!(order, ["a", "c"]);
    }

    #[test]
    fn remove_song_index_zero_without_current() {
        let mut state = SessionState::new();
        assert_eq!(state.remove_song(0).unwrap_err(), MusicError::InvalidIndex);

        state.queue.enqueue(track("a"));
        // nothing playing, so the head is removable
        assert_eq!(state.remove_song(0).unwrap().title, "a");
    }

    #[test]
    fn paused_time_is_not_counted() {
        let mut state = playing_state(&["a"]);

        std::thread::sleep(Duration::from_millis(15));
        let before_pause = state.elapsed();
        assert!(before_pause >= Duration::from_millis(15));

        assert!(state.pause());
        let at_pause = state.elapsed();
        std::thread::sleep(Duration::from_millis(15));
        assert_eq!(state.elapsed(), at_pause);

        assert!(state.resume());
        std::thread::sleep(Duration::from_millis(15));
        let after_resume = state.elapsed();
        assert!(after_resume >= at_pause + Duration::from_millis(15));
        assert!(after_resume < at_pause + Duration::from_secs(1));
    }

    #[test]
    fn elapsed_is_monotonic_across_transitions() {
        let mut state = playing_state(&["a"]);

        let mut last = state.elapsed();
        for _ in 0..3 {
            state.pause();
            let now = state.elapsed();
            assert!(now >= last);
            last = now;

            state.resume();
            std::thread::sleep(Duration::from_millis(5));
            let now = state.elapsed();
            assert!(now >= last);
            last = now;
        }
    }

    #[test]
    fn pause_and_resume_are_noops_out_of_state() {
        let mut state = SessionState::new();
        assert!(!state.pause());
        assert!(!state.resume());

        state.queue.enqueue(track("a"));
        state.begin_next();

        assert!(!state.resume()); // not paused
        assert!(state.pause());
        assert!(!state.pause()); // already paused
        assert!(state.resume());
    }
}
