use serde::{Deserialize, Serialize};
use std::fmt;

/// Server-assigned task identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(pub i64);

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    pub completed: bool,
}

/// Body of a create or update request.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct TaskDraft {
    pub title: String,
    pub completed: bool,
}

impl TaskDraft {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            completed: false,
        }
    }
}

impl Task {
    pub fn toggled(&self) -> TaskDraft {
        TaskDraft {
            title: self.title.clone(),
            completed: !self.completed,
        }
    }

    pub fn retitled(&self, title: impl Into<String>) -> TaskDraft {
        TaskDraft {
            title: title.into(),
            completed: self.completed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn task_reads_backend_shape() {
        let task: Task =
            serde_json::from_str(r#"{"id":7,"title":"Buy milk","completed":true,"extra":1}"#)
                .expect("decode");
        assert_eq!(
            task,
            Task {
                id: TaskId(7),
                title: "Buy milk".into(),
                completed: true,
            }
        );
    }

    #[test]
    fn new_draft_is_pending() {
        let body = serde_json::to_value(TaskDraft::new("Walk dog")).expect("encode");
        assert_eq!(
            body,
            serde_json::json!({ "title": "Walk dog", "completed": false })
        );
    }

    #[test]
    fn toggled_keeps_title_and_flips_flag() {
        let task = Task {
            id: TaskId(1),
            title: "A".into(),
            completed: false,
        };
        assert_eq!(
            task.toggled(),
            TaskDraft {
                title: "A".into(),
                completed: true,
            }
        );
        assert_eq!(
            task.retitled("B"),
            TaskDraft {
                title: "B".into(),
                completed: false,
            }
        );
    }
}
