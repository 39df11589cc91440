//! Task chain of a single production file.
//!
//! A file visits departments in rank order; each visit is a task. The chain keeps those
//! tasks sorted by department rank, maintains the `previous_task_id` / `next_task_id`
//! links between neighbours and decides which task currently holds `permission`,
//! i.e. may be worked on.
//!
//! [`Chain`] is an in-memory arena over the task rows of one file. It has no access to
//! the database: callers load the rows, run one mutation and persist
//! [`Chain::take_dirty`] inside the same transaction.

mod update;

pub use update::TaskUpdate;

use log::debug;
use thiserror::Error;

use crate::entities::task;

/// Errors raised by chain mutations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ChainError {
    #[error("task {task_id} is not part of the chain of file {file_id}")]
    UnknownTask { file_id: i32, task_id: i32 },

    #[error("task {task_id} belongs to file {task_file_id}, not file {file_id}")]
    ForeignTask { file_id: i32, task_id: i32, task_file_id: i32 },

    #[error("task {task_id} is already part of the chain of file {file_id}")]
    AlreadyLinked { file_id: i32, task_id: i32 },
}

/// Result of asking the chain to update a task.
#[derive(Clone, Debug, PartialEq)]
pub enum UpdateOutcome {
    /// The update went through; carries the task as stored.
    Applied(task::Model),
    /// The task does not hold permission. Nothing was changed.
    PermissionDenied { task_id: i32 },
}

#[derive(Clone, Debug)]
struct ChainNode {
    task: task::Model,
    rank: i32,
    dirty: bool,
}

/// Rank-ordered tasks of one file.
#[derive(Clone, Debug)]
pub struct Chain {
    file_id: i32,
    nodes: Vec<ChainNode>,
}

impl Chain {
    /// Build the chain from task rows paired with their department rank.
    pub fn load(file_id: i32, rows: Vec<(task::Model, i32)>) -> Self {
        let mut nodes: Vec<ChainNode> = rows
            .into_iter()
            .map(|(task, rank)| ChainNode {
                task,
                rank,
                dirty: false,
            })
            .collect();
        nodes.sort_by_key(|node| node.rank);
        Self { file_id, nodes }
    }

    pub fn file_id(&self) -> i32 {
        self.file_id
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Tasks in chain order.
    pub fn tasks(&self) -> impl Iterator<Item = &task::Model> {
        self.nodes.iter().map(|node| &node.task)
    }

    pub fn get(&self, task_id: i32) -> Option<&task::Model> {
        self.nodes.iter().find(|node| node.task.id == task_id).map(|node| &node.task)
    }

    pub fn head(&self) -> Option<&task::Model> {
        self.nodes.first().map(|node| &node.task)
    }

    /// Ids of the tasks currently holding permission.
    pub fn permission_holders(&self) -> Vec<i32> {
        self.tasks().filter(|task| task.permission).map(|task| task.id).collect()
    }

    /// Whether the stored links describe exactly the rank order of the chain.
    pub fn is_linked(&self) -> bool {
        self.nodes.iter().enumerate().all(|(i, node)| {
            let prev = i.checked_sub(1).map(|p| self.nodes[p].task.id);
            let next = self.nodes.get(i + 1).map(|n| n.task.id);
            node.task.previous_task_id == prev && node.task.next_task_id == next
        })
    }

    /// Insert a freshly stored task at its rank position.
    ///
    /// An empty chain hands permission to the new task. A task ranked before the current
    /// head becomes the permitted head and every existing task starts over. Otherwise the
    /// current head is made the only permission holder and the tasks behind it start over.
    pub fn admit(&mut self, mut task: task::Model, rank: i32) -> Result<&task::Model, ChainError> {
        if task.file_id != self.file_id {
            return Err(ChainError::ForeignTask {
                file_id: self.file_id,
                task_id: task.id,
                task_file_id: task.file_id,
            });
        }
        if self.position(task.id).is_some() {
            return Err(ChainError::AlreadyLinked {
                file_id: self.file_id,
                task_id: task.id,
            });
        }

        match self.nodes.first().map(|head| head.rank) {
            None => task.permission = true,
            Some(head_rank) if rank < head_rank => {
                for node in &mut self.nodes {
                    node.dirty |= node.task.reset_flags();
                }
                task.permission = true;
            }
            Some(_) => {
                for (i, node) in self.nodes.iter_mut().enumerate() {
                    if i == 0 {
                        if !node.task.permission {
                            node.task.permission = true;
                            node.dirty = true;
                        }
                    } else {
                        node.dirty |= node.task.reset_flags();
                    }
                }
                task.permission = false;
            }
        }

        let pos = self.nodes.partition_point(|node| node.rank <= rank);
        debug!("Admitting task {} at position {} of file {}", task.id, pos, self.file_id);
        self.nodes.insert(
            pos,
            ChainNode {
                task,
                rank,
                dirty: true,
            },
        );
        self.relink_around(pos);
        Ok(&self.nodes[pos].task)
    }

    /// Apply an update to a task holding permission.
    ///
    /// Finishing the task passes permission to the next one. Any other change restarts
    /// every task behind it.
    pub fn apply(&mut self, task_id: i32, update: &TaskUpdate) -> Result<UpdateOutcome, ChainError> {
        let idx = self.require(task_id)?;
        if !self.nodes[idx].task.permission {
            return Ok(UpdateOutcome::PermissionDenied { task_id });
        }

        let changed = update.apply_to(&mut self.nodes[idx].task);
        self.nodes[idx].dirty |= changed;

        if update.completes() {
            if idx + 1 < self.nodes.len() {
                self.grant(idx + 1);
            }
        } else if changed {
            for node in &mut self.nodes[idx + 1..] {
                node.dirty |= node.task.reset_flags();
            }
        }

        Ok(UpdateOutcome::Applied(self.nodes[idx].task.clone()))
    }

    /// Unlink a task and return it.
    ///
    /// Removing the head makes the next task the permitted head. Removing an interior task
    /// joins its neighbours and, when the previous one is already finished, lets the next
    /// one proceed.
    pub fn remove(&mut self, task_id: i32) -> Result<task::Model, ChainError> {
        let idx = self.require(task_id)?;
        let removed = self.nodes.remove(idx).task;

        if self.nodes.is_empty() {
            return Ok(removed);
        }

        if idx == 0 {
            let next = self.nodes.get(1).map(|n| n.task.id);
            self.set_links(0, None, next);
            self.grant(0);
        } else if idx == self.nodes.len() {
            let prev = (idx >= 2).then(|| self.nodes[idx - 2].task.id);
            self.set_links(idx - 1, prev, None);
        } else {
            let prev_id = self.nodes[idx - 1].task.id;
            let next_id = self.nodes[idx].task.id;
            self.set_next(idx - 1, Some(next_id));
            self.set_prev(idx, Some(prev_id));
            if self.nodes[idx - 1].task.end && !self.nodes[idx].task.permission {
                self.grant(idx);
            }
        }

        Ok(removed)
    }

    /// Tasks changed since the last call, in chain order.
    pub fn take_dirty(&mut self) -> Vec<task::Model> {
        self.nodes
            .iter_mut()
            .filter(|node| node.dirty)
            .map(|node| {
                node.dirty = false;
                node.task.clone()
            })
            .collect()
    }

    fn position(&self, task_id: i32) -> Option<usize> {
        self.nodes.iter().position(|node| node.task.id == task_id)
    }

    fn require(&self, task_id: i32) -> Result<usize, ChainError> {
        self.position(task_id).ok_or(ChainError::UnknownTask {
            file_id: self.file_id,
            task_id,
        })
    }

    /// Give permission to one task and take it from every other.
    fn grant(&mut self, idx: usize) {
        for (i, node) in self.nodes.iter_mut().enumerate() {
            let permission = i == idx;
            if node.task.permission != permission {
                node.task.permission = permission;
                node.dirty = true;
            }
        }
    }

    fn relink_around(&mut self, pos: usize) {
        let id = self.nodes[pos].task.id;
        let prev = pos.checked_sub(1).map(|i| self.nodes[i].task.id);
        let next = self.nodes.get(pos + 1).map(|n| n.task.id);
        self.set_links(pos, prev, next);
        if let Some(i) = pos.checked_sub(1) {
            self.set_next(i, Some(id));
        }
        if pos + 1 < self.nodes.len() {
            self.set_prev(pos + 1, Some(id));
        }
    }

    fn set_links(&mut self, idx: usize, prev: Option<i32>, next: Option<i32>) {
        self.set_prev(idx, prev);
        self.set_next(idx, next);
    }

    fn set_prev(&mut self, idx: usize, prev: Option<i32>) {
        let node = &mut self.nodes[idx];
        if node.task.previous_task_id != prev {
            node.task.previous_task_id = prev;
            node.dirty = true;
        }
    }

    fn set_next(&mut self, idx: usize, next: Option<i32>) {
        let node = &mut self.nodes[idx];
        if node.task.next_task_id != next {
            node.task.next_task_id = next;
            node.dirty = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    const FILE: i32 = 1;

    fn task(id: i32, department_id: i32) -> task::Model {
        let day = Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap();
        task::Model {
            id,
            file_id: FILE,
            department_id,
            project_id: 1,
            manager_id: 1,
            planned_start_date: day,
            planned_end_date: day,
            real_start_date: None,
            real_end_date: None,
            paused_date: None,
            permission: false,
            start: false,
            paused: false,
            end: false,
            next_task_id: None,
            previous_task_id: None,
        }
    }

    /// Tasks with ids 1..=n in departments ranked 1..=n, admitted in order.
    fn chain_of(n: i32) -> Chain {
        let mut chain = Chain::load(FILE, Vec::new());
        for id in 1..=n {
            chain.admit(task(id, id), id).unwrap();
        }
        chain.take_dirty();
        chain
    }

    fn order(chain: &Chain) -> Vec<i32> {
        chain.tasks().map(|task| task.id).collect()
    }

    #[test]
    fn first_task_gets_permission() {
        let mut chain = Chain::load(FILE, Vec::new());
        let admitted = chain.admit(task(1, 1), 2).unwrap();
        assert!(admitted.permission);
        assert_eq!(admitted.previous_task_id, None);
        assert_eq!(admitted.next_task_id, None);
    }

    #[test]
    fn creation_out_of_rank_order_ends_sorted() {
        let mut chain = Chain::load(FILE, Vec::new());
        chain.admit(task(10, 2), 2).unwrap();
        chain.admit(task(11, 1), 1).unwrap();
        chain.admit(task(12, 3), 3).unwrap();

        assert_eq!(order(&chain), vec![11, 10, 12]);
        assert_eq!(chain.permission_holders(), vec![11]);
        assert!(chain.is_linked());
    }

    #[test]
    fn earlier_rank_becomes_head_and_resets_everyone() {
        let mut chain = chain_of(2);
        chain.apply(1, &TaskUpdate::finish()).unwrap();
        chain.apply(2, &TaskUpdate::start()).unwrap();
        chain.take_dirty();

        chain.admit(task(3, 9), 0).unwrap();

        assert_eq!(order(&chain), vec![3, 1, 2]);
        assert_eq!(chain.permission_holders(), vec![3]);
        for task in chain.tasks().skip(1) {
            assert!(!task.start && !task.paused && !task.end && !task.permission);
        }
        assert!(chain.is_linked());
        assert_eq!(chain.take_dirty().len(), 3);
    }

    #[test]
    fn later_rank_restores_head_permission_and_resets_tail() {
        let mut chain = chain_of(2);
        chain.apply(1, &TaskUpdate::finish()).unwrap();
        assert_eq!(chain.permission_holders(), vec![2]);

        chain.admit(task(3, 3), 3).unwrap();

        assert_eq!(chain.permission_holders(), vec![1]);
        assert!(chain.get(1).unwrap().end);
        assert!(!chain.get(2).unwrap().permission);
        assert!(chain.is_linked());
    }

    #[test]
    fn insertion_only_touches_neighbours() {
        let mut chain = Chain::load(FILE, Vec::new());
        chain.admit(task(1, 1), 1).unwrap();
        chain.admit(task(3, 3), 5).unwrap();
        chain.admit(task(4, 4), 7).unwrap();
        chain.take_dirty();

        chain.admit(task(2, 2), 3).unwrap();
        let dirty: Vec<i32> = chain.take_dirty().iter().map(|t| t.id).collect();

        assert_eq!(dirty, vec![1, 2, 3]);
        assert_eq!(order(&chain), vec![1, 2, 3, 4]);
        assert!(chain.is_linked());
    }

    #[test]
    fn foreign_and_duplicate_tasks_are_rejected() {
        let mut chain = chain_of(1);
        let mut other = task(5, 5);
        other.file_id = 2;
        assert_eq!(
            chain.admit(other, 5).unwrap_err(),
            ChainError::ForeignTask {
                file_id: FILE,
                task_id: 5,
                task_file_id: 2
            }
        );
        assert_eq!(
            chain.admit(task(1, 1), 1).unwrap_err(),
            ChainError::AlreadyLinked { file_id: FILE, task_id: 1 }
        );
    }

    #[test]
    fn finishing_passes_permission_forward() {
        let mut chain = chain_of(3);
        let outcome = chain.apply(1, &TaskUpdate::finish()).unwrap();

        match outcome {
            UpdateOutcome::Applied(task) => {
                assert!(task.end);
                assert!(!task.permission);
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
        assert_eq!(chain.permission_holders(), vec![2]);
    }

    #[test]
    fn finishing_the_tail_keeps_permission() {
        let mut chain = chain_of(2);
        chain.apply(1, &TaskUpdate::finish()).unwrap();
        chain.apply(2, &TaskUpdate::finish()).unwrap();

        assert_eq!(chain.permission_holders(), vec![2]);
        assert!(chain.tasks().all(|task| task.end));
    }

    #[test]
    fn update_without_permission_changes_nothing() {
        let mut chain = chain_of(3);
        let before: Vec<task::Model> = chain.tasks().cloned().collect();

        let outcome = chain.apply(2, &TaskUpdate::finish()).unwrap();

        assert_eq!(outcome, UpdateOutcome::PermissionDenied { task_id: 2 });
        let after: Vec<task::Model> = chain.tasks().cloned().collect();
        assert_eq!(before, after);
        assert!(chain.take_dirty().is_empty());
    }

    #[test]
    fn non_finishing_change_restarts_downstream() {
        let mut rows: Vec<(task::Model, i32)> = chain_of(3)
            .tasks()
            .cloned()
            .map(|task| {
                let rank = task.department_id;
                (task, rank)
            })
            .collect();
        rows[2].0.start = true;
        rows[2].0.end = true;

        let mut chain = Chain::load(FILE, rows.clone());
        chain.apply(1, &TaskUpdate::start()).unwrap();
        let third = chain.get(3).unwrap();
        assert!(!third.permission && !third.start && !third.end);
        assert_eq!(chain.permission_holders(), vec![1]);

        let mut chain = Chain::load(FILE, rows);
        chain.apply(1, &TaskUpdate::finish()).unwrap();
        assert!(chain.get(3).unwrap().start);
        assert_eq!(chain.permission_holders(), vec![2]);
    }

    #[test]
    fn unknown_task_is_an_error() {
        let mut chain = chain_of(1);
        assert_eq!(
            chain.apply(9, &TaskUpdate::start()).unwrap_err(),
            ChainError::UnknownTask { file_id: FILE, task_id: 9 }
        );
        assert!(chain.remove(9).is_err());
    }

    #[test]
    fn removing_only_task_leaves_empty_chain() {
        let mut chain = chain_of(1);
        chain.remove(1).unwrap();
        assert!(chain.is_empty());
        assert!(chain.take_dirty().is_empty());
    }

    #[test]
    fn removing_head_promotes_next() {
        let mut chain = chain_of(3);
        chain.remove(1).unwrap();

        assert_eq!(order(&chain), vec![2, 3]);
        assert_eq!(chain.permission_holders(), vec![2]);
        assert_eq!(chain.head().unwrap().previous_task_id, None);
        assert!(chain.is_linked());
    }

    #[test]
    fn removing_tail_clears_next_link() {
        let mut chain = chain_of(3);
        chain.remove(3).unwrap();

        assert_eq!(chain.get(2).unwrap().next_task_id, None);
        assert_eq!(chain.permission_holders(), vec![1]);
        assert!(chain.is_linked());
    }

    #[test]
    fn removing_interior_after_finished_task_skips_forward() {
        let mut chain = chain_of(3);
        chain.apply(1, &TaskUpdate::finish()).unwrap();
        chain.take_dirty();

        chain.remove(2).unwrap();

        assert_eq!(order(&chain), vec![1, 3]);
        assert_eq!(chain.permission_holders(), vec![3]);
        assert!(chain.is_linked());
        let dirty: Vec<i32> = chain.take_dirty().iter().map(|t| t.id).collect();
        assert_eq!(dirty, vec![1, 3]);
    }

    #[test]
    fn removing_interior_before_progress_keeps_permission() {
        let mut chain = chain_of(3);
        chain.remove(2).unwrap();

        assert_eq!(chain.permission_holders(), vec![1]);
        assert!(chain.is_linked());
    }

    #[test]
    fn invariants_hold_through_mixed_operations() {
        let mut chain = Chain::load(FILE, Vec::new());
        let ranks = [(1, 4), (2, 2), (3, 6), (4, 1), (5, 5), (6, 3)];
        for (id, rank) in ranks {
            chain.admit(task(id, id), rank).unwrap();
            assert!(chain.permission_holders().len() <= 1);
            assert!(chain.is_linked());
        }

        let mut holder = chain.permission_holders()[0];
        chain.apply(holder, &TaskUpdate::finish()).unwrap();
        holder = chain.permission_holders()[0];
        chain.apply(holder, &TaskUpdate::finish()).unwrap();
        for id in [5, 4, 2] {
            chain.remove(id).unwrap();
            assert!(chain.permission_holders().len() <= 1);
            assert!(chain.is_linked());
        }
    }
}
