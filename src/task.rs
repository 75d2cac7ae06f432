use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A completed task as resolved from the tracker: names are looked up from
/// the project and section ids at fetch time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskRecord {
    pub id: String,
    pub content: String,
    pub completed_at: DateTime<Utc>,
    pub project_id: String,
    #[serde(default)]
    pub section_id: Option<String>,
    #[serde(default)]
    pub project_name: Option<String>,
    #[serde(default)]
    pub section_name: Option<String>,
}

impl TaskRecord {
    /// Section name, treating an empty string as absent.
    pub fn section(&self) -> Option<&str> {
        self.section_name.as_deref().filter(|s| !s.is_empty())
    }
}

#[cfg(test)]
pub(crate) fn sample(id: &str, project: Option<&str>, section: Option<&str>) -> TaskRecord {
    TaskRecord {
        id: id.into(),
        content: format!("task {id}"),
        completed_at: "2026-10-07T09:30:00Z".parse().unwrap(),
        project_id: format!("p-{id}"),
        section_id: section.map(|_| format!("s-{id}")),
        project_name: project.map(str::to_owned),
        section_name: section.map(str::to_owned),
    }
}
