//! End-to-end scenarios over the public planner and music API.

#![allow(clippy::expect_used, clippy::unwrap_used, clippy::cast_possible_wrap)]

use std::collections::BTreeMap;

use miniplan_core::id::GroupId;
use miniplan_core::model::Task;
use miniplan_core::{Bucket, MusicState, Notice, PlannerState, RepeatMode, SongMetadata, TaskMove};
use rand::SeedableRng;
use rand::rngs::StdRng;

/// Every (group, completed) partition must hold orders `0..n` in list order.
fn assert_dense(state: &PlannerState) {
    let mut partitions: BTreeMap<(Option<GroupId>, bool), Vec<i64>> = BTreeMap::new();
    for task in state.tasks() {
        partitions
            .entry((task.group_id.clone(), task.completed))
            .or_default()
            .push(task.order);
    }
    for ((group, completed), orders) in partitions {
        let expected: Vec<i64> = (0..orders.len() as i64).collect();
        assert_eq!(orders, expected, "group {group:?} completed={completed}");
    }
}

fn titles(tasks: &[&Task]) -> Vec<String> {
    tasks.iter().map(|task| task.title.clone()).collect()
}

#[test]
fn reorder_inside_a_group_keeps_completed_partition() {
    let mut state = PlannerState::default();
    let (a, _) = state.add_group("A");
    let (_t1, _) = state.add_task(Some(a.clone()), "T1");
    let (t2, _) = state.add_task(Some(a.clone()), "T2");
    let (t3, _) = state.add_task(Some(a.clone()), "T3");
    let _ = state.complete_task(&t3);

    let changes = state.move_task(&TaskMove {
        task: t2,
        source_group: Some(a.clone()),
        dest_group: Some(a.clone()),
        source_index: 1,
        dest_index: 0,
    });

    assert!(changes.buckets.contains(&Bucket::Tasks));
    let tasks = state.group_tasks(Some(&a));
    assert_eq!(titles(&tasks), vec!["T2", "T1", "T3"]);
    let orders: Vec<_> = tasks.iter().map(|task| (task.order, task.completed)).collect();
    assert_eq!(orders, vec![(0, false), (1, false), (0, true)]);
    assert_dense(&state);
}

#[test]
fn mixed_operations_keep_orders_dense() {
    let mut state = PlannerState::default();
    let (work, _) = state.add_group("Work");
    let (home, _) = state.add_group("Home");
    let mut ids = Vec::new();
    for index in 0..6 {
        let group = if index % 2 == 0 { Some(work.clone()) } else { Some(home.clone()) };
        ids.push(state.add_task(group, format!("task {index}")).0);
    }
    let (_loose, _) = state.add_task(None, "loose");

    let _ = state.complete_task(&ids[0]);
    let _ = state.complete_task(&ids[2]);
    assert_dense(&state);
    let _ = state.move_task(&TaskMove {
        task: ids[4].clone(),
        source_group: Some(work.clone()),
        dest_group: Some(home.clone()),
        source_index: 0,
        dest_index: 1,
    });
    assert_dense(&state);
    let _ = state.uncomplete_task(&ids[0]);
    assert_dense(&state);
    let _ = state.delete_task(&ids[1]);
    assert_dense(&state);
    let _ = state.delete_group(&home);
    assert_dense(&state);
    assert!(state.tasks().iter().all(|task| task.group_id.as_ref() != Some(&home)));
    let _ = state.archive_completed_tasks();
    assert_dense(&state);
    assert_eq!(state.archived_tasks().len(), 1);
}

#[test]
fn reopening_then_completing_lands_at_completed_tail() {
    let mut state = PlannerState::default();
    let (g, _) = state.add_group("G");
    let (first, _) = state.add_task(Some(g.clone()), "first");
    let (second, _) = state.add_task(Some(g.clone()), "second");
    let _ = state.complete_task(&first);
    let _ = state.complete_task(&second);

    let _ = state.uncomplete_task(&first);
    let _ = state.complete_task(&first);

    let completed: Vec<_> = state
        .group_tasks(Some(&g))
        .into_iter()
        .filter(|task| task.completed)
        .map(|task| (task.title.clone(), task.order))
        .collect();
    assert_eq!(completed, vec![("second".to_owned(), 0), ("first".to_owned(), 1)]);
}

#[test]
fn completion_notices_carry_the_group() {
    let mut state = PlannerState::default();
    let (g, _) = state.add_group("Live");
    let (task, _) = state.add_task(Some(g.clone()), "Ship it");
    let changes = state.complete_task(&task);
    assert!(changes.notices.contains(&Notice::TaskCompleted {
        task: task.clone(),
        group: Some(g.clone()),
    }));
    assert!(state.complete_task(&task).is_empty(), "second completion is a no-op");
}

#[test]
fn converting_a_note_creates_one_task() {
    let mut state = PlannerState::default();
    let (g1, _) = state.add_group("g1");
    let (note, _) = state.add_note(None, "remember the milk");
    let (task, _) = state.convert_note_to_task(&note, Some(g1.clone()));
    let task = task.expect("note exists");

    assert!(state.notes().is_empty());
    assert_eq!(state.tasks().len(), 1);
    let created = state.task(&task).expect("task exists");
    assert_eq!(created.description_entries[0].text, "remember the milk");
    assert_eq!(created.group_id, Some(g1));
}

#[test]
fn deleting_a_mood_unsorts_its_songs_and_playback_follows_the_queue() {
    let mut music = MusicState::default();
    let (mood, _) = music.add_mood("Calm", None);
    let mut songs = Vec::new();
    for name in ["One", "Two", "Three"] {
        let path = format!("/music/Band - {name}.flac");
        let metadata = SongMetadata::from_path(&path);
        songs.push(music.add_song(path, metadata, Some(mood.clone())).0);
    }
    let mut rng = StdRng::seed_from_u64(7);

    music.play_mood(&mood, &mut rng);
    assert_eq!(music.playback().queue, songs);
    assert_eq!(music.playback().current_song.as_ref(), Some(&songs[0]));

    music.next_song();
    music.next_song();
    music.next_song();
    assert_eq!(music.playback().current_song.as_ref(), Some(&songs[2]));
    assert!(!music.playback().is_playing);

    music.toggle_repeat();
    assert_eq!(music.playback().repeat, RepeatMode::All);
    music.next_song();
    assert_eq!(music.playback().current_song.as_ref(), Some(&songs[0]));

    let _ = music.delete_mood(&mood);
    assert!(music.songs().iter().all(|song| song.mood_id.is_none()));
    assert_eq!(music.mood_songs(None).len(), 3);
}
