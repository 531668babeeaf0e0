//! Task ordering engine.
//!
//! Tasks live in one flat collection. Within each (group, completed)
//! partition the `order` field is dense and zero-based once [`renumber`] has
//! run. Collection position is authoritative: renumbering assigns orders from
//! positions, so splices decide where a task lands.

use std::collections::HashMap;

use crate::id::{GroupId, TaskId};
use crate::model::Task;

/// Drag-and-drop request for a single task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskMove {
    /// Task being dragged.
    pub task: TaskId,
    /// Group the task was dragged from (`None` for ungrouped).
    pub source_group: Option<GroupId>,
    /// Group the task was dropped into (`None` for ungrouped).
    pub dest_group: Option<GroupId>,
    /// Index in the source column. Informational only.
    pub source_index: usize,
    /// Index in the destination column.
    pub dest_index: usize,
}

struct Partition {
    active: Vec<Task>,
    completed: Vec<Task>,
}

fn partition(tasks: Vec<Task>) -> Vec<Partition> {
    let mut slots: HashMap<Option<GroupId>, usize> = HashMap::new();
    let mut partitions: Vec<Partition> = Vec::new();
    for task in tasks {
        let slot = *slots.entry(task.group_id.clone()).or_insert_with(|| {
            partitions.push(Partition {
                active: Vec::new(),
                completed: Vec::new(),
            });
            partitions.len() - 1
        });
        let bucket = &mut partitions[slot];
        if task.completed {
            bucket.completed.push(task);
        } else {
            bucket.active.push(task);
        }
    }
    partitions
}

fn assign_orders(tasks: &mut [Task]) {
    for (index, task) in tasks.iter_mut().enumerate() {
        task.order = i64::try_from(index).unwrap_or(i64::MAX);
    }
}

fn flatten(partitions: Vec<Partition>) -> Vec<Task> {
    let mut out = Vec::with_capacity(partitions.iter().map(|p| p.active.len() + p.completed.len()).sum());
    for Partition {
        mut active,
        mut completed,
    } in partitions
    {
        assign_orders(&mut active);
        assign_orders(&mut completed);
        out.extend(active);
        out.extend(completed);
    }
    out
}

/// Global renumbering pass.
///
/// Groups are laid out in order of first appearance, each as its active
/// tasks followed by its completed tasks, with collection order preserved
/// inside every partition and orders reassigned from zero.
#[must_use]
pub fn renumber(tasks: Vec<Task>) -> Vec<Task> {
    flatten(partition(tasks))
}

/// Load-time normalization: sort every partition by its stored order, then renumber.
#[must_use]
pub fn normalize(tasks: Vec<Task>) -> Vec<Task> {
    let mut partitions = partition(tasks);
    for bucket in &mut partitions {
        bucket.active.sort_by_key(|task| task.order);
        bucket.completed.sort_by_key(|task| task.order);
    }
    flatten(partitions)
}

/// Count of active tasks in `group`.
#[must_use]
pub fn active_count(tasks: &[Task], group: Option<&GroupId>) -> usize {
    tasks
        .iter()
        .filter(|task| task.in_group(group) && !task.completed)
        .count()
}

fn first_in_group(tasks: &[Task], group: Option<&GroupId>) -> Option<usize> {
    tasks.iter().position(|task| task.in_group(group))
}

fn first_completed_in_group(tasks: &[Task], group: Option<&GroupId>) -> Option<usize> {
    tasks
        .iter()
        .position(|task| task.in_group(group) && task.completed)
}

fn after_last_in_group(tasks: &[Task], group: Option<&GroupId>) -> Option<usize> {
    tasks
        .iter()
        .rposition(|task| task.in_group(group))
        .map(|index| index + 1)
}

/// Insertion index that puts `task` at the tail of its partition.
///
/// Completed tasks go after the last task of their group. Active tasks go
/// before the first completed task of their group, falling back to after the
/// group's last task. A group with no tasks appends to the collection.
fn partition_tail(tasks: &[Task], task: &Task) -> usize {
    let group = task.group_id.as_ref();
    let slot = if task.completed {
        after_last_in_group(tasks, group)
    } else {
        first_completed_in_group(tasks, group).or_else(|| after_last_in_group(tasks, group))
    };
    slot.unwrap_or(tasks.len())
}

/// Move the task at `index` to the tail of the partition implied by its
/// current group and completion flag, then renumber.
#[must_use]
pub fn relocate_to_partition_tail(mut tasks: Vec<Task>, index: usize) -> Vec<Task> {
    if index >= tasks.len() {
        return tasks;
    }
    let task = tasks.remove(index);
    let slot = partition_tail(&tasks, &task);
    tasks.insert(slot, task);
    renumber(tasks)
}

/// Apply a drag-and-drop move.
///
/// The task keeps its completion flag; only its group and position change.
/// Returns `None` when the task does not exist.
#[must_use]
pub fn move_task(mut tasks: Vec<Task>, request: &TaskMove) -> Option<Vec<Task>> {
    let index = tasks.iter().position(|task| task.id == request.task)?;
    let mut task = tasks.remove(index);
    let stays = task.group_id == request.dest_group;
    task.group_id.clone_from(&request.dest_group);
    let dest = request.dest_group.as_ref();
    // A group left empty by the removal keeps its slot when the task stays in it.
    let empty_group_slot = if stays { index } else { tasks.len() };

    let slot = if task.completed {
        match first_completed_in_group(&tasks, dest) {
            Some(run_start) => {
                let offset = request
                    .dest_index
                    .saturating_sub(active_count(&tasks, dest));
                (run_start + offset).min(tasks.len())
            }
            None => after_last_in_group(&tasks, dest).unwrap_or(empty_group_slot),
        }
    } else if request.dest_index == 0 {
        first_in_group(&tasks, dest).unwrap_or(empty_group_slot)
    } else {
        nth_active_slot(&tasks, dest, request.dest_index)
            .or_else(|| first_completed_in_group(&tasks, dest))
            .or_else(|| after_last_in_group(&tasks, dest))
            .unwrap_or(empty_group_slot)
    };

    tasks.insert(slot, task);
    Some(renumber(tasks))
}

/// Index just after the `n`-th (one-based) active task of `group`.
fn nth_active_slot(tasks: &[Task], group: Option<&GroupId>, n: usize) -> Option<usize> {
    let mut seen = 0;
    for (index, task) in tasks.iter().enumerate() {
        if task.in_group(group) && !task.completed {
            seen += 1;
            if seen == n {
                return Some(index + 1);
            }
        }
    }
    None
}

/// Remove the item at `from` and reinsert it at `to` (clamped).
///
/// Returns false, leaving the list untouched, when `from` is out of range.
pub fn splice_move<T>(items: &mut Vec<T>, from: usize, to: usize) -> bool {
    if from >= items.len() {
        return false;
    }
    let item = items.remove(from);
    let to = to.min(items.len());
    items.insert(to, item);
    true
}
