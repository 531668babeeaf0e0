//! Mood library and play queue.
//!
//! Moods and songs are persisted; playback state (queue, pointer, volume,
//! progress) lives in memory only. Audio output is handled elsewhere.

use std::path::Path;

use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::change::{Bucket, Changes};
use crate::id::{MoodId, SongId};
use crate::model::{Mood, Song};
use crate::patch::{MoodPatch, SongPatch};

/// Color assigned to moods created without one.
pub const DEFAULT_MOOD_COLOR: &str = "#f97316";
/// Initial playback volume.
pub const DEFAULT_VOLUME: f64 = 0.7;
/// Seconds after which "previous" restarts the current song instead of going back.
pub const RESTART_THRESHOLD_SECS: f64 = 3.0;

const UNKNOWN_TITLE: &str = "Unknown Title";
const UNKNOWN_ARTIST: &str = "Unknown Artist";
const UNKNOWN_ALBUM: &str = "Unknown Album";

/// Behaviour at the end of a song or of the queue.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RepeatMode {
    /// Stop at the end of the queue.
    #[default]
    None,
    /// Wrap to the head of the queue.
    All,
    /// Replay the current song.
    One,
}

impl RepeatMode {
    /// Next mode in the none → all → one cycle.
    #[must_use]
    pub const fn cycle(self) -> Self {
        match self {
            Self::None => Self::All,
            Self::All => Self::One,
            Self::One => Self::None,
        }
    }
}

/// Optional tags read from (or guessed for) an audio file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SongMetadata {
    /// Track title.
    pub title: Option<String>,
    /// Track artist.
    pub artist: Option<String>,
    /// Album name.
    pub album: Option<String>,
    /// Length in seconds.
    pub duration: Option<f64>,
}

impl SongMetadata {
    /// Guess metadata from a file name of the form `Artist - Title.ext`.
    ///
    /// Without a separator the whole stem becomes the title.
    #[must_use]
    pub fn from_path(path: &str) -> Self {
        let stem = Path::new(path)
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default();
        let (artist, title) = match stem.split_once(" - ") {
            Some((artist, title)) => (Some(artist.trim().to_owned()), title.trim().to_owned()),
            None => (None, stem.trim().to_owned()),
        };
        Self {
            title: Some(title).filter(|t| !t.is_empty()),
            artist: artist.filter(|a| !a.is_empty()),
            album: None,
            duration: None,
        }
    }
}

fn or_unknown(value: Option<String>, fallback: &str) -> String {
    value
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| fallback.to_owned())
}

/// Transient playback state.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Playback {
    /// Song the transport should be playing.
    pub current_song: Option<SongId>,
    /// Whether playback is running.
    pub is_playing: bool,
    /// Output volume in `[0, 1]`.
    pub volume: f64,
    /// Shuffle flag.
    pub shuffle: bool,
    /// Repeat mode.
    pub repeat: RepeatMode,
    /// Scheduled songs.
    pub queue: Vec<SongId>,
    /// Selected mood.
    pub current_mood: Option<MoodId>,
    /// Position in the current song, in seconds.
    pub progress: f64,
    /// Length of the current song, in seconds.
    pub duration: f64,
}

impl Default for Playback {
    fn default() -> Self {
        Self {
            current_song: None,
            is_playing: false,
            volume: DEFAULT_VOLUME,
            shuffle: false,
            repeat: RepeatMode::None,
            queue: Vec::new(),
            current_mood: None,
            progress: 0.0,
            duration: 0.0,
        }
    }
}

impl Playback {
    fn queue_index(&self) -> Option<usize> {
        let current = self.current_song.as_ref()?;
        self.queue.iter().position(|id| id == current)
    }

    fn start(&mut self, song: SongId) {
        self.current_song = Some(song);
        self.progress = 0.0;
    }
}

/// Mood library plus playback state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MusicState {
    moods: Vec<Mood>,
    songs: Vec<Song>,
    playback: Playback,
}

impl MusicState {
    /// Build a state from loaded collections with default playback.
    #[must_use]
    pub fn from_parts(moods: Vec<Mood>, songs: Vec<Song>) -> Self {
        Self {
            moods,
            songs,
            playback: Playback::default(),
        }
    }

    /// Moods.
    #[must_use]
    pub fn moods(&self) -> &[Mood] {
        &self.moods
    }

    /// Songs.
    #[must_use]
    pub fn songs(&self) -> &[Song] {
        &self.songs
    }

    /// Playback state.
    #[must_use]
    pub const fn playback(&self) -> &Playback {
        &self.playback
    }

    /// Look up a song.
    #[must_use]
    pub fn song(&self, id: &SongId) -> Option<&Song> {
        self.songs.iter().find(|song| &song.id == id)
    }

    /// Songs of a mood (`None` for unsorted), in collection order.
    #[must_use]
    pub fn mood_songs(&self, mood: Option<&MoodId>) -> Vec<&Song> {
        self.songs
            .iter()
            .filter(|song| song.mood_id.as_ref() == mood)
            .collect()
    }

    // Moods

    /// Create a mood.
    pub fn add_mood(&mut self, name: impl Into<String>, color: Option<String>) -> (MoodId, Changes) {
        let mood = Mood {
            id: MoodId::new(),
            name: name.into(),
            color: color.unwrap_or_else(|| DEFAULT_MOOD_COLOR.to_owned()),
            created_at: OffsetDateTime::now_utc(),
        };
        let id = mood.id.clone();
        self.moods.push(mood);
        (id, Changes::touching(&[Bucket::Moods]))
    }

    /// Rename or recolor a mood.
    pub fn update_mood(&mut self, id: &MoodId, patch: MoodPatch) -> Changes {
        let Some(mood) = self.moods.iter_mut().find(|mood| &mood.id == id) else {
            return Changes::none();
        };
        patch.apply(mood);
        Changes::touching(&[Bucket::Moods])
    }

    /// Delete a mood, moving its songs to unsorted.
    pub fn delete_mood(&mut self, id: &MoodId) -> Changes {
        let Some(index) = self.moods.iter().position(|mood| &mood.id == id) else {
            return Changes::none();
        };
        self.moods.remove(index);
        for song in self.songs.iter_mut().filter(|song| song.mood_id.as_ref() == Some(id)) {
            song.mood_id = None;
        }
        if self.playback.current_mood.as_ref() == Some(id) {
            self.playback.current_mood = None;
        }
        Changes::touching(&[Bucket::Moods, Bucket::Songs])
    }

    /// Select a mood without starting playback.
    pub fn set_current_mood(&mut self, id: Option<MoodId>) {
        self.playback.current_mood = id;
    }

    // Songs

    /// Register a song, filling missing metadata with placeholders.
    pub fn add_song(
        &mut self,
        file_path: impl Into<String>,
        metadata: SongMetadata,
        mood: Option<MoodId>,
    ) -> (SongId, Changes) {
        let song = Song {
            id: SongId::new(),
            file_path: file_path.into(),
            title: or_unknown(metadata.title, UNKNOWN_TITLE),
            artist: or_unknown(metadata.artist, UNKNOWN_ARTIST),
            album: or_unknown(metadata.album, UNKNOWN_ALBUM),
            duration: metadata.duration.filter(|d| d.is_finite() && *d > 0.0).unwrap_or(0.0),
            mood_id: mood,
            added_at: OffsetDateTime::now_utc(),
        };
        let id = song.id.clone();
        self.songs.push(song);
        (id, Changes::touching(&[Bucket::Songs]))
    }

    /// Edit a song.
    pub fn update_song(&mut self, id: &SongId, patch: SongPatch) -> Changes {
        let Some(song) = self.songs.iter_mut().find(|song| &song.id == id) else {
            return Changes::none();
        };
        patch.apply(song);
        Changes::touching(&[Bucket::Songs])
    }

    /// Delete a song, dropping it from the queue.
    ///
    /// When it was current, playback moves to the queue entry that followed it
    /// (wrapping to the head) or stops when the queue is now empty.
    pub fn delete_song(&mut self, id: &SongId) -> Changes {
        let Some(index) = self.songs.iter().position(|song| &song.id == id) else {
            return Changes::none();
        };
        self.songs.remove(index);
        let playback = &mut self.playback;
        let was_current = playback.current_song.as_ref() == Some(id);
        let position = playback.queue.iter().position(|queued| queued == id);
        playback.queue.retain(|queued| queued != id);
        if was_current {
            let next = position
                .and_then(|pos| playback.queue.get(pos))
                .or_else(|| playback.queue.first())
                .cloned();
            match next {
                Some(next) => playback.start(next),
                None => {
                    playback.current_song = None;
                    playback.is_playing = false;
                    playback.progress = 0.0;
                }
            }
        }
        Changes::touching(&[Bucket::Songs])
    }

    /// Assign a song to a mood (`None` for unsorted).
    pub fn move_song_to_mood(&mut self, id: &SongId, mood: Option<MoodId>) -> Changes {
        self.update_song(
            id,
            SongPatch {
                mood_id: Some(mood),
                ..SongPatch::default()
            },
        )
    }

    // Playback

    /// Play a song, or toggle play/pause when it is already current.
    pub fn play_song(&mut self, id: &SongId) {
        if self.song(id).is_none() {
            return;
        }
        if self.playback.current_song.as_ref() == Some(id) {
            self.playback.is_playing = !self.playback.is_playing;
            return;
        }
        self.playback.start(id.clone());
        self.playback.is_playing = true;
    }

    /// Queue every song of a mood and start the first one.
    ///
    /// Songs keep collection order unless shuffle is on. Empty moods are ignored.
    pub fn play_mood<R: Rng + ?Sized>(&mut self, mood: &MoodId, rng: &mut R) {
        let mut queue: Vec<SongId> = self
            .mood_songs(Some(mood))
            .into_iter()
            .map(|song| song.id.clone())
            .collect();
        let Some(first) = queue.first().cloned() else {
            return;
        };
        let head = if self.playback.shuffle {
            queue.shuffle(rng);
            queue[0].clone()
        } else {
            first
        };
        self.playback.queue = queue;
        self.playback.start(head);
        self.playback.is_playing = true;
        self.playback.current_mood = Some(mood.clone());
    }

    /// Toggle between playing and paused.
    pub const fn toggle_play(&mut self) {
        self.playback.is_playing = !self.playback.is_playing;
    }

    /// Pause and rewind.
    pub const fn stop_playback(&mut self) {
        self.playback.is_playing = false;
        self.playback.progress = 0.0;
    }

    /// Advance to the next queued song.
    pub fn next_song(&mut self) {
        let playback = &mut self.playback;
        if playback.current_song.is_none() || playback.queue.is_empty() {
            return;
        }
        match playback.queue_index() {
            Some(index) if index + 1 >= playback.queue.len() => {
                if playback.repeat == RepeatMode::All {
                    let head = playback.queue[0].clone();
                    playback.start(head);
                } else {
                    playback.is_playing = false;
                }
            }
            Some(index) => {
                let next = playback.queue[index + 1].clone();
                playback.start(next);
            }
            None => {
                let head = playback.queue[0].clone();
                playback.start(head);
            }
        }
    }

    /// Go back one song, or restart the current one when at the head or past the threshold.
    pub fn previous_song(&mut self) {
        let playback = &mut self.playback;
        if playback.current_song.is_none() || playback.queue.is_empty() {
            return;
        }
        match playback.queue_index() {
            Some(index) if index > 0 && playback.progress <= RESTART_THRESHOLD_SECS => {
                let previous = playback.queue[index - 1].clone();
                playback.start(previous);
            }
            _ => playback.progress = 0.0,
        }
    }

    /// Handle the end of the current song.
    pub fn track_ended(&mut self) {
        if self.playback.repeat == RepeatMode::One && self.playback.current_song.is_some() {
            self.playback.progress = 0.0;
            self.playback.is_playing = true;
        } else {
            self.next_song();
        }
    }

    /// Flip shuffle; turning it on reshuffles the queue behind the current song.
    pub fn toggle_shuffle<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        let playback = &mut self.playback;
        playback.shuffle = !playback.shuffle;
        if !playback.shuffle {
            return;
        }
        let Some(current) = playback.current_song.clone() else {
            return;
        };
        let mut rest: Vec<SongId> = playback
            .queue
            .iter()
            .filter(|id| **id != current)
            .cloned()
            .collect();
        rest.shuffle(rng);
        rest.insert(0, current);
        playback.queue = rest;
    }

    /// Cycle the repeat mode.
    pub const fn toggle_repeat(&mut self) {
        self.playback.repeat = self.playback.repeat.cycle();
    }

    /// Set the volume, clamped to `[0, 1]`.
    pub fn set_volume(&mut self, volume: f64) {
        self.playback.volume = if volume.is_nan() { 0.0 } else { volume.clamp(0.0, 1.0) };
    }

    /// Record the transport's position.
    pub fn update_progress(&mut self, progress: f64) {
        self.playback.progress = progress.max(0.0);
    }

    /// Jump to a position in the current song.
    pub fn seek_to(&mut self, progress: f64) {
        self.update_progress(progress);
    }

    /// Record the length reported by the transport.
    pub fn set_duration(&mut self, duration: f64) {
        self.playback.duration = duration.max(0.0);
    }

    /// Append a song to the queue.
    pub fn add_to_queue(&mut self, id: &SongId) {
        if self.song(id).is_some() {
            self.playback.queue.push(id.clone());
        }
    }

    /// Drop a song from the queue, skipping ahead when it was current.
    pub fn remove_from_queue(&mut self, id: &SongId) {
        let playback = &mut self.playback;
        if playback.current_song.as_ref() == Some(id) {
            let next = playback
                .queue_index()
                .and_then(|index| playback.queue.get(index + 1))
                .cloned();
            match next {
                Some(next) => playback.start(next),
                None => {
                    playback.current_song = None;
                    playback.is_playing = false;
                }
            }
        }
        playback.queue.retain(|queued| queued != id);
    }

    /// Empty the queue and stop playback.
    pub fn clear_queue(&mut self) {
        self.playback.queue.clear();
        self.playback.current_song = None;
        self.playback.is_playing = false;
    }

    /// Apply persisted playback preferences.
    pub fn restore_preferences(&mut self, volume: f64, shuffle: bool, repeat: RepeatMode) {
        self.set_volume(volume);
        self.playback.shuffle = shuffle;
        self.playback.repeat = repeat;
    }
}
