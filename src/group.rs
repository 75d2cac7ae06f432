use crate::task::TaskRecord;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Second-level bucket within a category.
///
/// `Ungrouped` holds tasks with neither a subproject nor a section. It is
/// never equal to `Named("")`. Serializes as a JSON string or `null`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "Option<String>", into = "Option<String>")]
pub enum GroupKey {
    Named(String),
    Ungrouped,
}

impl GroupKey {
    pub fn name(&self) -> Option<&str> {
        match self {
            GroupKey::Named(n) => Some(n),
            GroupKey::Ungrouped => None,
        }
    }
}

impl From<Option<String>> for GroupKey {
    fn from(v: Option<String>) -> Self {
        v.map_or(GroupKey::Ungrouped, GroupKey::Named)
    }
}

impl From<GroupKey> for Option<String> {
    fn from(k: GroupKey) -> Self {
        match k {
            GroupKey::Named(n) => Some(n),
            GroupKey::Ungrouped => None,
        }
    }
}

/// The three configured category names. Construct through
/// `CategoryConfig::resolve`, which refuses a partial list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllowList {
    pub work: String,
    pub personal: String,
    pub tinker: String,
}

impl AllowList {
    pub fn contains(&self, category: &str) -> bool {
        self.work == category || self.personal == category || self.tinker == category
    }
}

impl fmt::Display for AllowList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, {}, {}", self.work, self.personal, self.tinker)
    }
}

/// Split a project name on its first `/`.
///
/// `"A/B/C"` gives `("A", Some("B/C"))`; a name without `/` comes back whole
/// with no subcategory. No trimming or case folding.
pub fn parse_project_name(name: &str) -> (&str, Option<&str>) {
    match name.split_once('/') {
        Some((category, sub)) => (category, Some(sub)),
        None => (name, None),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bucket {
    pub key: GroupKey,
    pub tasks: Vec<TaskRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryGroup {
    pub category: String,
    pub groups: Vec<Bucket>,
}

impl CategoryGroup {
    pub fn get(&self, key: &GroupKey) -> Option<&[TaskRecord]> {
        self.groups
            .iter()
            .find(|b| &b.key == key)
            .map(|b| b.tasks.as_slice())
    }

    pub fn total(&self) -> usize {
        self.groups.iter().map(|b| b.tasks.len()).sum()
    }

    pub fn has_named(&self) -> bool {
        self.groups.iter().any(|b| b.key.name().is_some())
    }

    fn push(&mut self, key: GroupKey, task: TaskRecord) {
        match self.groups.iter_mut().find(|b| b.key == key) {
            Some(bucket) => bucket.tasks.push(task),
            None => self.groups.push(Bucket {
                key,
                tasks: vec![task],
            }),
        }
    }
}

/// Tasks bucketed by category, then by group key. Both levels keep
/// first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Grouped {
    categories: Vec<CategoryGroup>,
}

impl Grouped {
    pub fn get(&self, category: &str) -> Option<&CategoryGroup> {
        self.categories.iter().find(|c| c.category == category)
    }

    pub fn iter(&self) -> impl Iterator<Item = &CategoryGroup> {
        self.categories.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    pub fn total(&self) -> usize {
        self.categories.iter().map(CategoryGroup::total).sum()
    }

    fn push(&mut self, category: &str, key: GroupKey, task: TaskRecord) {
        let idx = match self.categories.iter().position(|c| c.category == category) {
            Some(i) => i,
            None => {
                self.categories.push(CategoryGroup {
                    category: category.to_owned(),
                    groups: Vec::new(),
                });
                self.categories.len() - 1
            }
        };
        self.categories[idx].push(key, task);
    }
}

/// Group key for a task: subproject first, then section, else ungrouped.
fn grouping_key(subcategory: Option<&str>, task: &TaskRecord) -> GroupKey {
    if let Some(sub) = subcategory {
        return GroupKey::Named(sub.to_owned());
    }
    match task.section() {
        Some(section) => GroupKey::Named(section.to_owned()),
        None => GroupKey::Ungrouped,
    }
}

/// Bucket completed tasks by allow-listed category and group key.
///
/// Tasks without a project name, or whose category is not in `allow`, are
/// dropped. Input order is preserved within every bucket.
pub fn group_tasks(tasks: &[TaskRecord], allow: &AllowList) -> Grouped {
    let mut out = Grouped::default();
    for task in tasks {
        let Some(project) = task.project_name.as_deref().filter(|p| !p.is_empty()) else {
            continue;
        };
        let (category, sub) = parse_project_name(project);
        if !allow.contains(category) {
            continue;
        }
        let key = grouping_key(sub, task);
        out.push(category, key, task.clone());
    }
    out
}
