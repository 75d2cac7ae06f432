use crate::config::TodoistConfig;
use crate::http::{self, RetryPolicy};
use crate::task::TaskRecord;
use crate::week::WeekRange;
use crate::TdigestError;
use chrono::{DateTime, Duration, Utc};
use log::{debug, info};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::HashMap;

/// Largest page `completed/get_all` returns.
const COMPLETED_LIMIT: &str = "200";

/// Source of completed tasks for a week.
pub trait TaskSource {
    fn completed_tasks(&mut self, week: &WeekRange) -> Result<Vec<TaskRecord>, TdigestError>;
}

/// Todoist ids arrive as strings from the REST API and as numbers from some
/// Sync endpoints. Normalize both to `String`.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Id(String);

impl<'de> Deserialize<'de> for Id {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        use serde::de;

        struct IdVisitor;
        impl de::Visitor<'_> for IdVisitor {
            type Value = Id;

            fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
                f.write_str("string or integer id")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
                Ok(Id(v.to_owned()))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
                Ok(Id(v.to_string()))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
                Ok(Id(v.to_string()))
            }
        }

        deserializer.deserialize_any(IdVisitor)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Project {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub id: String,
    pub name: String,
}

#[derive(Deserialize)]
struct RawNamed {
    id: Id,
    #[serde(default)]
    name: String,
}

#[derive(Deserialize)]
struct CompletedItem {
    #[serde(default)]
    id: Option<Id>,
    #[serde(default)]
    task_id: Option<Id>,
    #[serde(default)]
    content: String,
    #[serde(default)]
    completed_at: Option<String>,
    #[serde(default)]
    project_id: Option<Id>,
    #[serde(default)]
    section_id: Option<Id>,
}

#[derive(Deserialize)]
struct CompletedResponse {
    #[serde(default)]
    items: Vec<CompletedItem>,
}

/// Client for one run. The project list is fetched once and cached on the
/// client; a new client starts with an empty cache.
pub struct TodoistClient {
    agent: ureq::Agent,
    auth: String,
    rest_url: String,
    sync_url: String,
    retry: RetryPolicy,
    projects_cache: Option<Vec<Project>>,
}

impl TodoistClient {
    pub fn new(config: &TodoistConfig) -> Result<Self, TdigestError> {
        let token = config
            .api_token
            .as_deref()
            .filter(|t| !t.is_empty())
            .ok_or_else(|| {
                TdigestError::Config(
                    "todoist.api_token missing (or set TODOIST_API_TOKEN)".into(),
                )
            })?;
        Ok(Self {
            agent: http::agent(config.timeout_secs),
            auth: format!("Bearer {token}"),
            rest_url: config.rest_url.trim_end_matches('/').to_owned(),
            sync_url: config.sync_url.trim_end_matches('/').to_owned(),
            retry: RetryPolicy::new(config.max_retries, config.backoff_secs),
            projects_cache: None,
        })
    }

    fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, &str)],
    ) -> Result<T, TdigestError> {
        http::with_retry(&self.retry, url, || {
            let mut req = self.agent.get(url).header("Authorization", self.auth.as_str());
            for (k, v) in query {
                req = req.query(*k, *v);
            }
            req.call()?.body_mut().read_json::<T>()
        })
    }

    pub fn projects(&mut self) -> Result<&[Project], TdigestError> {
        if self.projects_cache.is_none() {
            info!("fetching project list");
            let raw: Vec<RawNamed> = self.get_json(&format!("{}/projects", self.rest_url), &[])?;
            let projects: Vec<Project> = raw
                .into_iter()
                .map(|p| Project {
                    id: p.id.0,
                    name: p.name,
                })
                .collect();
            info!("  {} projects found", projects.len());
            self.projects_cache = Some(projects);
        }
        Ok(self.projects_cache.as_deref().unwrap_or_default())
    }

    pub fn sections(&self, project_id: &str) -> Result<Vec<Section>, TdigestError> {
        let raw: Vec<RawNamed> = self.get_json(
            &format!("{}/sections", self.rest_url),
            &[("project_id", project_id)],
        )?;
        Ok(raw
            .into_iter()
            .map(|s| Section {
                id: s.id.0,
                name: s.name,
            })
            .collect())
    }
}

impl TaskSource for TodoistClient {
    fn completed_tasks(&mut self, week: &WeekRange) -> Result<Vec<TaskRecord>, TdigestError> {
        info!("fetching tasks from {} to {}", week.start, week.end);

        let projects: HashMap<String, String> = self
            .projects()?
            .iter()
            .map(|p| (p.id.clone(), p.name.clone()))
            .collect();

        let mut sections = HashMap::new();
        let mut project_ids: Vec<&String> = projects.keys().collect();
        project_ids.sort();
        for pid in project_ids {
            for s in self.sections(pid)? {
                sections.insert(s.id, s.name);
            }
        }

        // Start a day early so late-evening completions in UTC+ zones are not missed.
        let since = format!("{}T00:00:00", week.start - Duration::days(1));
        let resp: CompletedResponse = self.get_json(
            &format!("{}/completed/get_all", self.sync_url),
            &[("since", since.as_str()), ("limit", COMPLETED_LIMIT)],
        )?;

        let tasks = resolve_completed(resp.items, &projects, &sections, week);
        info!("  {} tasks in period", tasks.len());
        Ok(tasks)
    }
}

fn parse_completed_at(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|t| t.with_timezone(&Utc))
}

/// Keep items completed inside `week` (by UTC date) and attach project and
/// section names.
fn resolve_completed(
    items: Vec<CompletedItem>,
    projects: &HashMap<String, String>,
    sections: &HashMap<String, String>,
    week: &WeekRange,
) -> Vec<TaskRecord> {
    let mut out = Vec::new();
    for item in items {
        let Some(raw_at) = item.completed_at.as_deref() else {
            continue;
        };
        let Some(completed_at) = parse_completed_at(raw_at) else {
            debug!("skipping item with unparseable completed_at {raw_at:?}");
            continue;
        };
        if !week.contains(completed_at.date_naive()) {
            continue;
        }
        let project_id = item.project_id.map(|i| i.0).unwrap_or_default();
        let section_id = item.section_id.map(|i| i.0);
        out.push(TaskRecord {
            id: item.id.or(item.task_id).map(|i| i.0).unwrap_or_default(),
            content: item.content,
            completed_at,
            project_name: projects.get(&project_id).cloned(),
            section_name: section_id.as_ref().and_then(|s| sections.get(s)).cloned(),
            project_id,
            section_id,
        });
    }
    out
}
