//! CLI entry point for miniplan.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::{Args, Parser, Subcommand, ValueEnum};
use miniplan_app::{AppConfig, HookBridge, PlannerService, config};
use miniplan_store_fs::JsonStore;
use tracing::debug;
use tracing_subscriber::{EnvFilter, fmt::format::FmtSpan};

mod commands;

/// Task and note planner with a mood-based music queue.
#[derive(Parser, Debug)]
#[command(
    name = "miniplan",
    version,
    about = "miniplan: grouped tasks, notes and a music queue, mirrored to a stream overlay"
)]
struct Cli {
    /// Base directory holding config.toml, hooks and data (defaults to $MINIPLAN_DIR or the platform data dir).
    #[arg(long, global = true)]
    dir: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Manage task groups.
    #[command(subcommand)]
    Group(GroupCommand),

    /// Manage tasks.
    #[command(subcommand)]
    Task(TaskCommand),

    /// Manage the checklist of a task.
    #[command(subcommand)]
    Subtask(SubtaskCommand),

    /// Manage tags.
    #[command(subcommand)]
    Tag(TagCommand),

    /// Manage notes.
    #[command(subcommand)]
    Note(NoteCommand),

    /// Move every completed task into the archive.
    Archive,

    /// Full-text search over tasks.
    Search {
        /// Text to look for (case-insensitive).
        query: String,
    },

    /// Show today's counters (the day starts at 06:00 local time).
    Stats,

    /// Run a focus countdown on a task, a note or nothing in particular.
    Focus(FocusArgs),

    /// Manage moods, songs and the play queue.
    #[command(subcommand)]
    Music(MusicCommand),

    /// Configure the stream overlay.
    #[command(subcommand)]
    Stream(StreamCommand),
}

#[derive(Subcommand, Debug)]
enum GroupCommand {
    /// Create a group.
    Add { name: String },
    /// Rename a group.
    Rename { id: String, name: String },
    /// Delete a group; its tasks become ungrouped.
    Rm { id: String },
    /// Move a group to another position.
    Mv { from: usize, to: usize },
    /// List groups.
    Ls,
}

#[derive(Subcommand, Debug)]
enum TaskCommand {
    /// Create a task.
    Add {
        title: String,
        /// Target group id, or `ungrouped`.
        #[arg(short = 'g', long)]
        group: Option<String>,
    },
    /// Edit task fields.
    Edit(TaskEditArgs),
    /// Mark a task completed.
    Done { id: String },
    /// Reopen a completed task.
    Undo { id: String },
    /// Delete a task.
    Rm { id: String },
    /// Move a task within or across groups.
    Mv {
        id: String,
        /// Destination group id, or `ungrouped` (defaults to the task's group).
        #[arg(long = "to")]
        to_group: Option<String>,
        /// Destination position within the group.
        #[arg(long)]
        index: usize,
    },
    /// Append an entry to a task's description history.
    Log { id: String, text: String },
    /// Rewrite an existing description entry.
    EditLog { id: String, entry: String, text: String },
    /// Show a task as JSON.
    Show { id: String },
    /// List tasks.
    Ls(TaskListArgs),
}

#[derive(Args, Debug)]
struct TaskEditArgs {
    id: String,
    #[arg(long)]
    title: Option<String>,
    #[arg(long)]
    description: Option<String>,
    /// New group id, or `ungrouped`.
    #[arg(short = 'g', long)]
    group: Option<String>,
    /// Replace the tags with these tag ids.
    #[arg(short = 't', long = "tag")]
    tags: Vec<String>,
    /// Remove every tag.
    #[arg(long, conflicts_with = "tags")]
    clear_tags: bool,
}

#[derive(Args, Debug)]
struct TaskListArgs {
    /// Only tasks of this group id, or `ungrouped`.
    #[arg(short = 'g', long)]
    group: Option<String>,
    /// all, active or completed.
    #[arg(short = 's', long, default_value = "all")]
    status: String,
    /// Require tag names (logical AND).
    #[arg(short = 't', long = "tag")]
    tags: Vec<String>,
    /// Case-insensitive text match.
    #[arg(long)]
    text: Option<String>,
    #[arg(long, value_enum, default_value_t = ListFormat::Table)]
    format: ListFormat,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum ListFormat {
    Table,
    Json,
}

#[derive(Subcommand, Debug)]
enum SubtaskCommand {
    /// Add a subtask.
    Add { task: String, title: String },
    /// Mark a subtask completed.
    Done { task: String, subtask: String },
    /// Reopen a subtask.
    Undo { task: String, subtask: String },
    /// Rename a subtask.
    Rename { task: String, subtask: String, title: String },
    /// Delete a subtask.
    Rm { task: String, subtask: String },
    /// Move a subtask to another position.
    Mv { task: String, subtask: String, from: usize, to: usize },
}

#[derive(Subcommand, Debug)]
enum TagCommand {
    /// Create a tag.
    Add {
        name: String,
        #[arg(long, default_value = "#6b7280")]
        color: String,
    },
    /// Edit a tag.
    Edit {
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        color: Option<String>,
    },
    /// Delete a tag and detach it from every task.
    Rm { id: String },
    /// List tags.
    Ls,
}

#[derive(Subcommand, Debug)]
enum NoteCommand {
    /// Create a note.
    Add {
        content: String,
        #[arg(long)]
        title: Option<String>,
    },
    /// Edit a note.
    Edit {
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        content: Option<String>,
    },
    /// Delete a note.
    Rm { id: String },
    /// List notes.
    Ls,
    /// Turn a note into a task.
    Convert {
        id: String,
        /// Target group id, or `ungrouped`.
        #[arg(short = 'g', long)]
        group: Option<String>,
    },
}

#[derive(Args, Debug)]
struct FocusArgs {
    /// Task to focus on.
    #[arg(long, conflicts_with = "note")]
    task: Option<String>,
    /// Note to focus on.
    #[arg(long)]
    note: Option<String>,
    /// Session length in minutes (defaults to 20).
    #[arg(long)]
    minutes: Option<u64>,
    /// Add five minutes this many times.
    #[arg(long, default_value_t = 0)]
    extend: u32,
}

#[derive(Subcommand, Debug)]
enum MusicCommand {
    /// Manage moods.
    #[command(subcommand)]
    Mood(MoodCommand),
    /// Manage songs.
    #[command(subcommand)]
    Song(SongCommand),
    /// Build the play queue for a mood and print it.
    Play {
        mood: String,
        /// Shuffle the queue.
        #[arg(long)]
        shuffle: bool,
        #[command(flatten)]
        transport: TransportArgs,
    },
}

/// Queue edits and transport steps applied after the mood starts playing.
#[derive(Args, Debug)]
struct TransportArgs {
    /// Output volume between 0 and 1.
    #[arg(long)]
    volume: Option<f64>,
    /// Append a song to the queue.
    #[arg(long = "enqueue")]
    enqueue: Vec<String>,
    /// Drop a song from the queue.
    #[arg(long = "dequeue")]
    dequeue: Vec<String>,
    /// Transport steps, applied in order.
    #[arg(long = "then", value_enum)]
    steps: Vec<TransportStep>,
    /// Print the playback state as JSON.
    #[arg(long)]
    json: bool,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum TransportStep {
    /// Skip to the next song.
    Next,
    /// Go back, or restart the current song.
    Previous,
    /// Report the current song as finished.
    TrackEnded,
    /// Cycle none, all, one.
    Repeat,
    /// Pause or resume.
    Toggle,
    /// Stop and rewind.
    Stop,
    /// Empty the queue.
    Clear,
}

#[derive(Subcommand, Debug)]
enum MoodCommand {
    /// Create a mood.
    Add {
        name: String,
        #[arg(long)]
        color: Option<String>,
    },
    /// Edit a mood.
    Edit {
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        color: Option<String>,
    },
    /// Delete a mood; its songs become unsorted.
    Rm { id: String },
    /// List moods with their song counts.
    Ls,
}

#[derive(Subcommand, Debug)]
enum SongCommand {
    /// Register an audio file.
    Add {
        path: String,
        #[arg(long)]
        mood: Option<String>,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        artist: Option<String>,
        #[arg(long)]
        album: Option<String>,
        /// Length in seconds.
        #[arg(long)]
        duration: Option<f64>,
    },
    /// Edit song metadata.
    Edit {
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        artist: Option<String>,
        #[arg(long)]
        album: Option<String>,
    },
    /// Move a song to another mood (omit `--mood` to unsort it).
    Mv {
        id: String,
        #[arg(long)]
        mood: Option<String>,
    },
    /// Remove a song from the library.
    Rm { id: String },
    /// List songs.
    Ls {
        #[arg(long)]
        mood: Option<String>,
    },
}

#[derive(Subcommand, Debug)]
enum StreamCommand {
    /// Print the stream settings.
    Show,
    /// Mirror a group to the overlay.
    Enable { group: String },
    /// Stop mirroring.
    Disable,
    /// Push the streamed group's tasks now.
    Push,
}

#[tokio::main]
async fn main() -> Result<()> {
    let Cli { dir, cmd } = Cli::parse();
    install_tracing();

    let base = config::base_dir(dir)?;
    let app_config = AppConfig::load(&base)?;
    debug!(base = %base.display(), "Resolved base directory");

    if let Command::Stream(action) = &cmd
        && commands::stream_config(action, app_config.clone(), &base)?
    {
        return Ok(());
    }

    let data_dir = app_config.data_dir(&base);
    let store = JsonStore::open(&data_dir)?;
    let bridge = HookBridge::new(app_config.stream_settings(), app_config.hooks.clone(), base);
    let mut service = PlannerService::load(Arc::new(store), Arc::new(bridge), &app_config.music).await?;

    let outcome = commands::run(cmd, &mut service).await;
    service.shutdown().await?;
    outcome
}

fn install_tracing() {
    let filter = EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into());
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_span_events(FmtSpan::NONE)
        .with_writer(std::io::stderr)
        .compact()
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_task_add_with_group() {
        let cli = Cli::parse_from(["miniplan", "--dir", "/tmp/plan", "task", "add", "Buy milk", "--group", "g1"]);
        assert_eq!(cli.dir, Some(PathBuf::from("/tmp/plan")));
        match cli.cmd {
            Command::Task(TaskCommand::Add { title, group }) => {
                assert_eq!(title, "Buy milk");
                assert_eq!(group.as_deref(), Some("g1"));
            }
            _ => panic!("expected task add command"),
        }
    }

    #[test]
    fn parse_task_move() {
        let cli = Cli::parse_from(["miniplan", "task", "mv", "t1", "--to", "ungrouped", "--index", "2"]);
        match cli.cmd {
            Command::Task(TaskCommand::Mv { id, to_group, index }) => {
                assert_eq!(id, "t1");
                assert_eq!(to_group.as_deref(), Some("ungrouped"));
                assert_eq!(index, 2);
            }
            _ => panic!("expected task mv command"),
        }
    }

    #[test]
    fn parse_task_list_filters() {
        let cli = Cli::parse_from([
            "miniplan", "task", "ls", "--status", "active", "--tag", "urgent", "--tag", "home", "--format", "json",
        ]);
        match cli.cmd {
            Command::Task(TaskCommand::Ls(args)) => {
                assert_eq!(args.status, "active");
                assert_eq!(args.tags, vec!["urgent", "home"]);
                assert_eq!(args.format, ListFormat::Json);
                assert!(args.group.is_none());
            }
            _ => panic!("expected task ls command"),
        }
    }

    #[test]
    fn clear_tags_conflicts_with_tags() {
        let result = Cli::try_parse_from(["miniplan", "task", "edit", "t1", "--tag", "a", "--clear-tags"]);
        assert!(result.is_err());
    }

    #[test]
    fn parse_music_play() {
        let cli = Cli::parse_from(["miniplan", "music", "play", "m1", "--shuffle"]);
        match cli.cmd {
            Command::Music(MusicCommand::Play { mood, shuffle, transport }) => {
                assert_eq!(mood, "m1");
                assert!(shuffle);
                assert!(transport.steps.is_empty());
                assert!(transport.volume.is_none());
            }
            _ => panic!("expected music play command"),
        }
    }

    #[test]
    fn parse_music_transport_steps_in_order() {
        let cli = Cli::parse_from([
            "miniplan", "music", "play", "m1", "--volume", "0.4", "--enqueue", "s9", "--then", "next", "--then",
            "repeat", "--then", "track-ended", "--json",
        ]);
        match cli.cmd {
            Command::Music(MusicCommand::Play { transport, .. }) => {
                assert_eq!(
                    transport.steps,
                    vec![TransportStep::Next, TransportStep::Repeat, TransportStep::TrackEnded]
                );
                assert_eq!(transport.enqueue, vec!["s9"]);
                assert!(transport.volume.is_some_and(|volume| (volume - 0.4).abs() < f64::EPSILON));
                assert!(transport.json);
            }
            _ => panic!("expected music play command"),
        }
    }

    #[test]
    fn parse_focus_on_a_task() {
        let cli = Cli::parse_from(["miniplan", "focus", "--task", "t1", "--minutes", "25", "--extend", "1"]);
        match cli.cmd {
            Command::Focus(args) => {
                assert_eq!(args.task.as_deref(), Some("t1"));
                assert!(args.note.is_none());
                assert_eq!(args.minutes, Some(25));
                assert_eq!(args.extend, 1);
            }
            _ => panic!("expected focus command"),
        }
    }

    #[test]
    fn focus_targets_are_exclusive() {
        let result = Cli::try_parse_from(["miniplan", "focus", "--task", "t1", "--note", "n1"]);
        assert!(result.is_err());
    }

    #[test]
    fn dir_flag_is_global() {
        let cli = Cli::parse_from(["miniplan", "stats", "--dir", "/srv/plan"]);
        assert_eq!(cli.dir, Some(PathBuf::from("/srv/plan")));
        assert!(matches!(cli.cmd, Command::Stats));
    }
}
