use crate::messages::Message;
use crate::peer::task::{Task, TaskId};
use std::collections::VecDeque;

/// A task that left the queue
pub(crate) struct Removed {
    pub task: Box<dyn Task>,
    pub was_head: bool,
}

/// Outstanding tasks in the order they were queued
///
/// Order decides which task is offered a message first and which task's timeout is
/// monitored. Only the head is ticked.
pub(crate) struct TaskQueue {
    entries: VecDeque<(TaskId, Box<dyn Task>)>,
}

impl TaskQueue {
    pub fn new() -> TaskQueue {
        TaskQueue {
            entries: VecDeque::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, id: TaskId) -> bool {
        self.entries.iter().any(|(task_id, _)| *task_id == id)
    }

    /// Appends a task. Ids are unique per process so no duplicate check is made.
    pub fn push(&mut self, id: TaskId, task: Box<dyn Task>) {
        self.entries.push_back((id, task));
    }

    pub fn head_mut(&mut self) -> Option<&mut Box<dyn Task>> {
        self.entries.front_mut().map(|(_, task)| task)
    }

    /// The most recently queued task
    pub fn last_mut(&mut self) -> Option<&mut Box<dyn Task>> {
        self.entries.back_mut().map(|(_, task)| task)
    }

    /// Removes a task wherever it is in the queue
    pub fn remove(&mut self, id: TaskId) -> Option<Removed> {
        let index = self.entries.iter().position(|(task_id, _)| *task_id == id)?;
        let (_, task) = self.entries.remove(index)?;
        Some(Removed {
            task,
            was_head: index == 0,
        })
    }

    /// Offers a message to each task in order until one claims it
    pub fn offer(&mut self, message: &Message) -> bool {
        self.entries.iter_mut().any(|(_, task)| task.handle(message))
    }

    /// Drops every task without notifying it
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
