use anyhow::{Result, bail};
use miniplan_app::PlannerService;
use miniplan_core::{MusicState, Playback, RepeatMode, SongMetadata};
use miniplan_core::id::{MoodId, SongId};
use miniplan_core::patch::{MoodPatch, SongPatch};

use super::parse_id;
use crate::{MoodCommand, MusicCommand, SongCommand, TransportArgs, TransportStep};

pub fn run(command: MusicCommand, service: &mut PlannerService) -> Result<()> {
    match command {
        MusicCommand::Mood(cmd) => run_mood(cmd, service),
        MusicCommand::Song(cmd) => run_song(cmd, service),
        MusicCommand::Play {
            mood,
            shuffle,
            transport,
        } => {
            let mood = existing_mood(service, &mood)?;
            let TransportArgs {
                volume,
                enqueue,
                dequeue,
                steps,
                json,
            } = transport;
            let enqueue = existing_songs(service, &enqueue)?;
            let dequeue = existing_songs(service, &dequeue)?;
            service.with_music(|music, rng| {
                if shuffle != music.playback().shuffle {
                    music.toggle_shuffle(rng);
                }
                music.play_mood(&mood, rng);
                if let Some(volume) = volume {
                    music.set_volume(volume);
                }
                for id in &enqueue {
                    music.add_to_queue(id);
                }
                for id in &dequeue {
                    music.remove_from_queue(id);
                }
                for step in steps {
                    apply_step(music, step);
                }
            });
            if json {
                println!("{}", serde_json::to_string_pretty(service.music().playback())?);
            } else {
                print_queue(service);
                println!("{}", status_line(service.music().playback()));
            }
            Ok(())
        }
    }
}

fn run_mood(command: MoodCommand, service: &mut PlannerService) -> Result<()> {
    match command {
        MoodCommand::Add { name, color } => {
            let id = service.with_music(|music, _| music.add_mood(name, color));
            println!("created mood: {id}");
        }
        MoodCommand::Edit { id, name, color } => {
            let id = existing_mood(service, &id)?;
            service.with_music(|music, _| music.update_mood(&id, MoodPatch { name, color }));
        }
        MoodCommand::Rm { id } => {
            let id = existing_mood(service, &id)?;
            service.with_music(|music, _| music.delete_mood(&id));
            println!("deleted mood: {id}");
        }
        MoodCommand::Ls => {
            for mood in service.music().moods() {
                let songs = service.music().mood_songs(Some(&mood.id)).len();
                println!("{} | {} | {} | {songs} song(s)", mood.id, mood.name, mood.color);
            }
            let unsorted = service.music().mood_songs(None).len();
            if unsorted > 0 {
                println!("- | unsorted | - | {unsorted} song(s)");
            }
        }
    }
    Ok(())
}

fn run_song(command: SongCommand, service: &mut PlannerService) -> Result<()> {
    match command {
        SongCommand::Add {
            path,
            mood,
            title,
            artist,
            album,
            duration,
        } => {
            let mood = mood.map(|raw| existing_mood(service, &raw)).transpose()?;
            let guessed = SongMetadata::from_path(&path);
            let metadata = SongMetadata {
                title: title.or(guessed.title),
                artist: artist.or(guessed.artist),
                album: album.or(guessed.album),
                duration,
            };
            let id = service.with_music(|music, _| music.add_song(path, metadata, mood));
            println!("added song: {id}");
        }
        SongCommand::Edit {
            id,
            title,
            artist,
            album,
        } => {
            let id = existing_song(service, &id)?;
            let patch = SongPatch {
                title,
                artist,
                album,
                ..SongPatch::default()
            };
            service.with_music(|music, _| music.update_song(&id, patch));
        }
        SongCommand::Mv { id, mood } => {
            let id = existing_song(service, &id)?;
            let mood = mood.map(|raw| existing_mood(service, &raw)).transpose()?;
            service.with_music(|music, _| music.move_song_to_mood(&id, mood));
        }
        SongCommand::Rm { id } => {
            let id = existing_song(service, &id)?;
            service.with_music(|music, _| music.delete_song(&id));
            println!("removed song: {id}");
        }
        SongCommand::Ls { mood } => {
            let songs = match mood {
                Some(raw) => {
                    let mood = existing_mood(service, &raw)?;
                    service.music().mood_songs(Some(&mood))
                }
                None => service.music().songs().iter().collect(),
            };
            for song in songs {
                println!(
                    "{} | {} | {} | {} | {}",
                    song.id,
                    song.artist,
                    song.title,
                    song.album,
                    format_duration(song.duration)
                );
            }
        }
    }
    Ok(())
}

fn print_queue(service: &PlannerService) {
    let playback = service.music().playback();
    if playback.queue.is_empty() {
        println!("Queue is empty");
        return;
    }
    for (position, id) in playback.queue.iter().enumerate() {
        let marker = if playback.current_song.as_ref() == Some(id) { ">" } else { " " };
        let title = service
            .music()
            .song(id)
            .map_or("?", |song| song.title.as_str());
        println!("{marker} {:>3}. {title}", position + 1);
    }
}

fn apply_step(music: &mut MusicState, step: TransportStep) {
    match step {
        TransportStep::Next => music.next_song(),
        TransportStep::Previous => music.previous_song(),
        TransportStep::TrackEnded => music.track_ended(),
        TransportStep::Repeat => music.toggle_repeat(),
        TransportStep::Toggle => music.toggle_play(),
        TransportStep::Stop => music.stop_playback(),
        TransportStep::Clear => music.clear_queue(),
    }
}

fn status_line(playback: &Playback) -> String {
    let state = if playback.is_playing { "playing" } else { "paused" };
    let repeat = match playback.repeat {
        RepeatMode::None => "off",
        RepeatMode::All => "all",
        RepeatMode::One => "one",
    };
    let shuffle = if playback.shuffle { "on" } else { "off" };
    let volume = (playback.volume * 100.0).round();
    format!("{state} | repeat {repeat} | shuffle {shuffle} | volume {volume}%")
}

fn format_duration(seconds: f64) -> String {
    if !seconds.is_finite() || seconds <= 0.0 {
        return "--:--".to_owned();
    }
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let total = seconds.round() as u64;
    format!("{}:{:02}", total / 60, total % 60)
}

fn existing_mood(service: &PlannerService, raw: &str) -> Result<MoodId> {
    let id: MoodId = parse_id(raw, "mood")?;
    if !service.music().moods().iter().any(|mood| mood.id == id) {
        bail!("unknown mood: {id}");
    }
    Ok(id)
}

fn existing_song(service: &PlannerService, raw: &str) -> Result<SongId> {
    let id: SongId = parse_id(raw, "song")?;
    if service.music().song(&id).is_none() {
        bail!("unknown song: {id}");
    }
    Ok(id)
}

fn existing_songs(service: &PlannerService, raw: &[String]) -> Result<Vec<SongId>> {
    raw.iter().map(|raw| existing_song(service, raw)).collect()
}
