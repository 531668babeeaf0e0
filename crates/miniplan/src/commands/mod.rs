use std::path::Path;
use std::str::FromStr;

use anyhow::{Context, Result, bail};
use miniplan_app::{AppConfig, GroupSelector, PlannerService, TaskFilterBuilder};
use miniplan_core::id::{EntryId, GroupId, IdError, NoteId, SubtaskId, TagId, TaskId};
use miniplan_core::model::Task;
use miniplan_core::patch::{GroupPatch, NotePatch, SubtaskPatch, TagPatch, TaskPatch};
use miniplan_core::{PlannerState, TaskMove};
use time::OffsetDateTime;

use crate::{
    Command, GroupCommand, ListFormat, NoteCommand, StreamCommand, SubtaskCommand, TagCommand, TaskCommand,
    TaskEditArgs, TaskListArgs,
};

mod focus;
mod music;

/// Command-line spelling of "no group".
pub const UNGROUPED: &str = "ungrouped";

pub async fn run(command: Command, service: &mut PlannerService) -> Result<()> {
    match command {
        Command::Group(cmd) => run_group(cmd, service),
        Command::Task(cmd) => run_task(cmd, service),
        Command::Subtask(cmd) => run_subtask(cmd, service),
        Command::Tag(cmd) => run_tag(cmd, service),
        Command::Note(cmd) => run_note(cmd, service),
        Command::Archive => {
            let before = service.planner().archived_tasks().len();
            service.with_planner(PlannerState::archive_completed_tasks);
            let archived = service.planner().archived_tasks().len() - before;
            println!("archived {archived} task(s)");
            Ok(())
        }
        Command::Search { query } => {
            let tasks = service.planner().search(&query);
            if tasks.is_empty() {
                println!("No tasks matched {query:?}");
            } else {
                render_task_table(service.planner(), &tasks);
            }
            Ok(())
        }
        Command::Stats => {
            let now = OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc());
            let stats = service.stats(now);
            println!("open tasks:         {}", stats.open_tasks);
            println!("completed today:    {}", stats.completed_today);
            println!("subtasks completed: {}/{}", stats.completed_subtasks, stats.total_subtasks);
            Ok(())
        }
        Command::Focus(args) => focus::run(args, service).await,
        Command::Music(cmd) => music::run(cmd, service),
        Command::Stream(_) => {
            let settings = service.stream_settings();
            match (&settings.stream_group, settings.enabled) {
                (Some(group), true) => println!("pushed tasks of group {group}"),
                _ => println!("streaming is disabled; nothing pushed"),
            }
            Ok(())
        }
    }
}

/// Handle stream settings that only touch the configuration file.
///
/// Returns `false` when the command needs a loaded planner.
pub fn stream_config(command: &StreamCommand, mut config: AppConfig, base: &Path) -> Result<bool> {
    match command {
        StreamCommand::Show => {
            println!("{}", serde_json::to_string_pretty(&config.stream_settings())?);
        }
        StreamCommand::Enable { group } => {
            let group: GroupId = parse_id(group, "group")?;
            config.stream.enabled = true;
            config.stream.group = Some(group.clone());
            config.save(base)?;
            println!("streaming group {group}");
        }
        StreamCommand::Disable => {
            config.stream.enabled = false;
            config.save(base)?;
            println!("streaming disabled");
        }
        StreamCommand::Push => return Ok(false),
    }
    Ok(true)
}

fn run_group(command: GroupCommand, service: &mut PlannerService) -> Result<()> {
    match command {
        GroupCommand::Add { name } => {
            let id = service.with_planner(|planner| planner.add_group(name));
            println!("created group: {id}");
        }
        GroupCommand::Rename { id, name } => {
            let id = existing_group(service, &id)?;
            service.with_planner(|planner| planner.update_group(&id, GroupPatch { name: Some(name) }));
            println!("renamed group: {id}");
        }
        GroupCommand::Rm { id } => {
            let id = existing_group(service, &id)?;
            service.with_planner(|planner| planner.delete_group(&id));
            println!("deleted group: {id}");
        }
        GroupCommand::Mv { from, to } => {
            let count = service.planner().groups().len();
            if from >= count {
                bail!("no group at position {from} (have {count})");
            }
            service.with_planner(|planner| planner.move_group(from, to));
        }
        GroupCommand::Ls => {
            if service.planner().groups().is_empty() {
                println!("No groups yet");
            }
            for group in service.planner().groups() {
                let tasks = service.planner().group_tasks(Some(&group.id));
                let open = tasks.iter().filter(|task| !task.completed).count();
                println!("{} | {} | {open} open / {} total", group.id, group.name, tasks.len());
            }
        }
    }
    Ok(())
}

fn run_task(command: TaskCommand, service: &mut PlannerService) -> Result<()> {
    match command {
        TaskCommand::Add { title, group } => {
            let group = match group {
                Some(raw) => parse_group(service, &raw)?,
                None => None,
            };
            let id = service.with_planner(|planner| planner.add_task(group, title));
            println!("created task: {id}");
        }
        TaskCommand::Edit(args) => handle_edit(service, args)?,
        TaskCommand::Done { id } => {
            let id = existing_task(service, &id)?;
            service.with_planner(|planner| planner.complete_task(&id));
            println!("completed task: {id}");
        }
        TaskCommand::Undo { id } => {
            let id = existing_task(service, &id)?;
            service.with_planner(|planner| planner.uncomplete_task(&id));
            println!("reopened task: {id}");
        }
        TaskCommand::Rm { id } => {
            let id = existing_task(service, &id)?;
            service.with_planner(|planner| planner.delete_task(&id));
            println!("deleted task: {id}");
        }
        TaskCommand::Mv { id, to_group, index } => {
            let id = existing_task(service, &id)?;
            let source_group = service.planner().task(&id).and_then(|task| task.group_id.clone());
            let dest_group = match to_group {
                Some(raw) => parse_group(service, &raw)?,
                None => source_group.clone(),
            };
            let source_index = service
                .planner()
                .group_tasks(source_group.as_ref())
                .iter()
                .position(|task| task.id == id)
                .unwrap_or_default();
            let request = TaskMove {
                task: id.clone(),
                source_group,
                dest_group,
                source_index,
                dest_index: index,
            };
            service.with_planner(|planner| planner.move_task(&request));
            println!("moved task: {id}");
        }
        TaskCommand::Log { id, text } => {
            let id = existing_task(service, &id)?;
            if let Some(entry) = service.with_planner(|planner| planner.add_description_entry(&id, text)) {
                println!("added entry: {entry}");
            }
        }
        TaskCommand::EditLog { id, entry, text } => {
            let id = existing_task(service, &id)?;
            let entry: EntryId = parse_id(&entry, "entry")?;
            service.with_planner(|planner| planner.edit_description_entry(&id, &entry, text));
        }
        TaskCommand::Show { id } => {
            let id = existing_task(service, &id)?;
            if let Some(task) = service.planner().task(&id) {
                println!("{}", serde_json::to_string_pretty(task)?);
            }
        }
        TaskCommand::Ls(args) => handle_ls(service, args)?,
    }
    Ok(())
}

fn handle_edit(service: &mut PlannerService, args: TaskEditArgs) -> Result<()> {
    let TaskEditArgs {
        id,
        title,
        description,
        group,
        tags,
        clear_tags,
    } = args;
    let id = existing_task(service, &id)?;
    let group_id = match group {
        Some(raw) => Some(parse_group(service, &raw)?),
        None => None,
    };
    let tags = if clear_tags {
        Some(Vec::new())
    } else if tags.is_empty() {
        None
    } else {
        let ids = tags
            .iter()
            .map(|raw| parse_id(raw, "tag"))
            .collect::<Result<Vec<TagId>>>()?;
        if let Some(unknown) = ids.iter().find(|tag| !service.planner().tags().iter().any(|t| &t.id == *tag)) {
            bail!("unknown tag: {unknown}");
        }
        Some(ids)
    };
    let patch = TaskPatch {
        title,
        description,
        group_id,
        completed: None,
        tags,
    };
    if patch.is_empty() {
        println!("nothing to change");
        return Ok(());
    }
    service.with_planner(|planner| planner.update_task(&id, patch));
    println!("updated task: {id}");
    Ok(())
}

fn handle_ls(service: &PlannerService, args: TaskListArgs) -> Result<()> {
    let TaskListArgs {
        group,
        status,
        tags,
        text,
        format,
    } = args;
    let selector = match group {
        None => GroupSelector::Any,
        Some(raw) => parse_group(service, &raw)?.map_or(GroupSelector::Ungrouped, GroupSelector::Group),
    };
    let filter = TaskFilterBuilder::new()
        .with_group(selector)
        .with_status(&status)?
        .with_tag_names(&tags)
        .with_text(text)
        .build(service.planner())?;
    let tasks = service.filter_tasks(&filter);

    match format {
        ListFormat::Json => println!("{}", serde_json::to_string_pretty(&tasks)?),
        ListFormat::Table if tasks.is_empty() => {
            if service.planner().tasks().is_empty() {
                println!("No tasks found");
            } else {
                println!("No tasks matched the provided filters");
            }
        }
        ListFormat::Table => render_task_table(service.planner(), &tasks),
    }
    Ok(())
}

fn run_subtask(command: SubtaskCommand, service: &mut PlannerService) -> Result<()> {
    match command {
        SubtaskCommand::Add { task, title } => {
            let task = existing_task(service, &task)?;
            if let Some(id) = service.with_planner(|planner| planner.add_subtask(&task, title)) {
                println!("created subtask: {id}");
            }
        }
        SubtaskCommand::Done { task, subtask } => {
            set_subtask(service, &task, &subtask, SubtaskPatch {
                completed: Some(true),
                ..SubtaskPatch::default()
            })?;
        }
        SubtaskCommand::Undo { task, subtask } => {
            set_subtask(service, &task, &subtask, SubtaskPatch {
                completed: Some(false),
                ..SubtaskPatch::default()
            })?;
        }
        SubtaskCommand::Rename { task, subtask, title } => {
            set_subtask(service, &task, &subtask, SubtaskPatch {
                title: Some(title),
                ..SubtaskPatch::default()
            })?;
        }
        SubtaskCommand::Rm { task, subtask } => {
            let (task, subtask) = existing_subtask(service, &task, &subtask)?;
            service.with_planner(|planner| planner.delete_subtask(&task, &subtask));
        }
        SubtaskCommand::Mv {
            task,
            subtask,
            from,
            to,
        } => {
            let (task, subtask) = existing_subtask(service, &task, &subtask)?;
            service.with_planner(|planner| planner.move_subtask(&task, &subtask, from, to));
        }
    }
    Ok(())
}

fn set_subtask(service: &mut PlannerService, task: &str, subtask: &str, patch: SubtaskPatch) -> Result<()> {
    let (task, subtask) = existing_subtask(service, task, subtask)?;
    service.with_planner(|planner| planner.update_subtask(&task, &subtask, patch));
    Ok(())
}

fn run_tag(command: TagCommand, service: &mut PlannerService) -> Result<()> {
    match command {
        TagCommand::Add { name, color } => {
            let id = service.with_planner(|planner| planner.add_tag(name, color));
            println!("created tag: {id}");
        }
        TagCommand::Edit { id, name, color } => {
            let id: TagId = parse_id(&id, "tag")?;
            service.with_planner(|planner| planner.update_tag(&id, TagPatch { name, color }));
        }
        TagCommand::Rm { id } => {
            let id: TagId = parse_id(&id, "tag")?;
            service.with_planner(|planner| planner.delete_tag(&id));
        }
        TagCommand::Ls => {
            for tag in service.planner().tags() {
                println!("{} | {} | {}", tag.id, tag.name, tag.color);
            }
        }
    }
    Ok(())
}

fn run_note(command: NoteCommand, service: &mut PlannerService) -> Result<()> {
    match command {
        NoteCommand::Add { content, title } => {
            let id = service.with_planner(|planner| planner.add_note(title, content));
            println!("created note: {id}");
        }
        NoteCommand::Edit { id, title, content } => {
            let id = existing_note(service, &id)?;
            service.with_planner(|planner| planner.update_note(&id, NotePatch { title, content }));
        }
        NoteCommand::Rm { id } => {
            let id = existing_note(service, &id)?;
            service.with_planner(|planner| planner.delete_note(&id));
        }
        NoteCommand::Ls => {
            for note in service.planner().notes() {
                println!("{} | {} | {}", note.id, note.title, first_line(&note.content));
            }
        }
        NoteCommand::Convert { id, group } => {
            let id = existing_note(service, &id)?;
            let group = match group {
                Some(raw) => parse_group(service, &raw)?,
                None => None,
            };
            if let Some(task) = service.with_planner(|planner| planner.convert_note_to_task(&id, group)) {
                println!("converted note {id} into task {task}");
            }
        }
    }
    Ok(())
}

fn render_task_table(state: &PlannerState, tasks: &[&Task]) {
    println!("ID | Group | Status | Title | Tags | Subtasks");
    println!("-- | ----- | ------ | ----- | ---- | --------");

    for task in tasks {
        let group = task
            .group_id
            .as_ref()
            .and_then(|id| state.group(id))
            .map_or(UNGROUPED, |group| group.name.as_str());
        let status = if task.completed { "done" } else { "open" };
        let tags = task
            .tags
            .iter()
            .filter_map(|id| state.tags().iter().find(|tag| &tag.id == id))
            .map(|tag| tag.name.as_str())
            .collect::<Vec<_>>();
        let tags = if tags.is_empty() { "-".to_owned() } else { tags.join(", ") };
        let done = task.subtasks.iter().filter(|subtask| subtask.completed).count();
        println!(
            "{} | {} | {} | {} | {} | {}/{}",
            task.id,
            group,
            status,
            task.title,
            tags,
            done,
            task.subtasks.len()
        );
    }
}

fn first_line(text: &str) -> &str {
    text.lines().next().unwrap_or_default()
}

fn parse_id<T: FromStr<Err = IdError>>(raw: &str, kind: &str) -> Result<T> {
    raw.parse().with_context(|| format!("Invalid {kind} id: {raw}"))
}

/// Translate a group argument, mapping the `ungrouped` sentinel to `None`.
fn parse_group_arg(raw: &str) -> Result<Option<GroupId>> {
    if raw.trim().eq_ignore_ascii_case(UNGROUPED) {
        return Ok(None);
    }
    parse_id(raw, "group").map(Some)
}

fn parse_group(service: &PlannerService, raw: &str) -> Result<Option<GroupId>> {
    let group = parse_group_arg(raw)?;
    if let Some(id) = &group
        && service.planner().group(id).is_none()
    {
        bail!("unknown group: {id}");
    }
    Ok(group)
}

fn existing_group(service: &PlannerService, raw: &str) -> Result<GroupId> {
    let id: GroupId = parse_id(raw, "group")?;
    if service.planner().group(&id).is_none() {
        bail!("unknown group: {id}");
    }
    Ok(id)
}

fn existing_task(service: &PlannerService, raw: &str) -> Result<TaskId> {
    let id: TaskId = parse_id(raw, "task")?;
    if service.planner().task(&id).is_none() {
        bail!("unknown task: {id}");
    }
    Ok(id)
}

fn existing_subtask(service: &PlannerService, task: &str, subtask: &str) -> Result<(TaskId, SubtaskId)> {
    let task = existing_task(service, task)?;
    let subtask: SubtaskId = parse_id(subtask, "subtask")?;
    let known = service
        .planner()
        .task(&task)
        .is_some_and(|owner| owner.subtasks.iter().any(|candidate| candidate.id == subtask));
    if !known {
        bail!("unknown subtask {subtask} on task {task}");
    }
    Ok((task, subtask))
}

fn existing_note(service: &PlannerService, raw: &str) -> Result<NoteId> {
    let id: NoteId = parse_id(raw, "note")?;
    if service.planner().note(&id).is_none() {
        bail!("unknown note: {id}");
    }
    Ok(id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use miniplan_app::{MemoryStore, MusicConfig, NoopBridge};

    async fn service() -> PlannerService {
        PlannerService::load(Arc::new(MemoryStore::new()), Arc::new(NoopBridge), &MusicConfig::default())
            .await
            .unwrap_or_else(|err| panic!("load service: {err}"))
    }

    #[test]
    fn ungrouped_sentinel_maps_to_none() -> Result<()> {
        assert_eq!(parse_group_arg("ungrouped")?, None);
        assert_eq!(parse_group_arg(" Ungrouped ")?, None);
        assert_eq!(parse_group_arg("g1")?.as_ref().map(GroupId::as_str), Some("g1"));
        assert!(parse_group_arg("  ").is_err());
        Ok(())
    }

    #[tokio::test]
    async fn unknown_group_is_rejected() -> Result<()> {
        let mut service = service().await;
        let Err(err) = run(
            Command::Task(TaskCommand::Add {
                title: "Orphan".to_owned(),
                group: Some("missing".to_owned()),
            }),
            &mut service,
        )
        .await
        else {
            panic!("unknown group should fail");
        };
        assert!(err.to_string().contains("missing"));
        assert!(service.planner().tasks().is_empty());
        service.shutdown().await
    }

    #[tokio::test]
    async fn move_command_reorders_within_group() -> Result<()> {
        let mut service = service().await;
        let group = service.with_planner(|planner| planner.add_group("Work"));
        let first = service.with_planner(|planner| planner.add_task(Some(group.clone()), "First"));
        let second = service.with_planner(|planner| planner.add_task(Some(group.clone()), "Second"));

        run(
            Command::Task(TaskCommand::Mv {
                id: second.to_string(),
                to_group: None,
                index: 0,
            }),
            &mut service,
        )
        .await?;

        let order: Vec<_> = service
            .planner()
            .group_tasks(Some(&group))
            .iter()
            .map(|task| task.id.clone())
            .collect();
        assert_eq!(order, vec![second, first]);
        service.shutdown().await
    }

    #[tokio::test]
    async fn edit_can_move_a_task_out_of_its_group() -> Result<()> {
        let mut service = service().await;
        let group = service.with_planner(|planner| planner.add_group("Work"));
        let task = service.with_planner(|planner| planner.add_task(Some(group), "Drift"));

        run(
            Command::Task(TaskCommand::Edit(TaskEditArgs {
                id: task.to_string(),
                title: None,
                description: None,
                group: Some(UNGROUPED.to_owned()),
                tags: Vec::new(),
                clear_tags: false,
            })),
            &mut service,
        )
        .await?;

        let moved = service.planner().task(&task).map(|task| task.group_id.clone());
        assert_eq!(moved, Some(None));
        service.shutdown().await
    }

    #[test]
    fn stream_enable_and_disable_rewrite_the_config() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let enable = StreamCommand::Enable { group: "g1".to_owned() };
        assert!(stream_config(&enable, AppConfig::load(dir.path())?, dir.path())?);

        let config = AppConfig::load(dir.path())?;
        assert!(config.stream.enabled);
        assert_eq!(config.stream.group.as_ref().map(GroupId::as_str), Some("g1"));

        assert!(stream_config(&StreamCommand::Disable, config, dir.path())?);
        assert!(!AppConfig::load(dir.path())?.stream.enabled);

        assert!(!stream_config(&StreamCommand::Push, AppConfig::default(), dir.path())?);
        Ok(())
    }
}
