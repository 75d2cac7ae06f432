use crate::group::Grouped;
use crate::i18n::{fill, Language};
use crate::week::WeekRange;
use crate::TdigestError;
use chrono::{DateTime, Local, NaiveDate};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::fmt::Write;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubprojectStats {
    pub name: String,
    pub tasks: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryStats {
    pub category: String,
    pub tasks: usize,
    /// Named groups only; ungrouped tasks count toward `tasks` alone.
    pub subprojects: Vec<SubprojectStats>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stats {
    pub total_tasks: usize,
    pub by_category: Vec<CategoryStats>,
}

impl Stats {
    pub fn from_grouped(grouped: &Grouped) -> Self {
        let by_category: Vec<CategoryStats> = grouped
            .iter()
            .map(|cat| CategoryStats {
                category: cat.category.clone(),
                tasks: cat.total(),
                subprojects: cat
                    .groups
                    .iter()
                    .filter_map(|b| {
                        b.key.name().map(|name| SubprojectStats {
                            name: name.to_owned(),
                            tasks: b.tasks.len(),
                        })
                    })
                    .collect(),
            })
            .collect();
        Self {
            total_tasks: by_category.iter().map(|c| c.tasks).sum(),
            by_category,
        }
    }
}

/// The JSON document written for each generated summary.
#[derive(Debug, Serialize, Deserialize)]
pub struct SummaryRecord {
    pub generated_at: DateTime<Local>,
    pub week_start: NaiveDate,
    pub week_end: NaiveDate,
    pub summary: String,
    pub tasks: Grouped,
    pub stats: Stats,
}

/// The subset of a stored record that is fed back as prompt context.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PastSummary {
    pub week_start: String,
    pub week_end: String,
    pub summary: String,
}

pub struct Storage {
    dir: PathBuf,
    language: Language,
}

impl Storage {
    /// Open (creating if needed) the summary directory.
    pub fn open(dir: &Path, language: Language) -> Result<Self, TdigestError> {
        std::fs::create_dir_all(dir)?;
        info!("storage directory: {}", dir.display());
        Ok(Self {
            dir: dir.to_path_buf(),
            language,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write the JSON record and its Markdown rendering. Returns both paths.
    pub fn save(
        &self,
        summary: &str,
        grouped: &Grouped,
        week: &WeekRange,
        now: DateTime<Local>,
    ) -> Result<(PathBuf, PathBuf), TdigestError> {
        let stem = format!("summary_{}_{}", week.file_stem(), now.format("%Y%m%d_%H%M%S"));
        let record = SummaryRecord {
            generated_at: now,
            week_start: week.start,
            week_end: week.end,
            summary: summary.to_owned(),
            tasks: grouped.clone(),
            stats: Stats::from_grouped(grouped),
        };

        let json_path = self.dir.join(format!("{stem}.json"));
        std::fs::write(&json_path, serde_json::to_string_pretty(&record)?)?;
        info!("  saved {}", json_path.display());

        let md_path = self.dir.join(format!("{stem}.md"));
        std::fs::write(&md_path, render_markdown(&record, self.language))?;
        info!("  saved {}", md_path.display());

        Ok((json_path, md_path))
    }

    /// Stored JSON records, oldest first by file name.
    pub fn entries(&self) -> Result<Vec<PathBuf>, TdigestError> {
        let mut paths: Vec<PathBuf> = std::fs::read_dir(&self.dir)?
            .filter_map(|e| e.ok().map(|e| e.path()))
            .filter(|p| {
                p.extension().is_some_and(|x| x == "json")
                    && p.file_name()
                        .and_then(|n| n.to_str())
                        .is_some_and(|n| n.starts_with("summary_"))
            })
            .collect();
        paths.sort();
        Ok(paths)
    }

    /// Load up to `weeks` summaries of weeks that started before `before`,
    /// returned oldest to newest. A week saved more than once contributes its
    /// latest record. Unreadable files are skipped with a warning.
    pub fn load_previous(
        &self,
        before: &WeekRange,
        weeks: usize,
    ) -> Result<Vec<PastSummary>, TdigestError> {
        let paths = self.entries()?;
        if paths.is_empty() {
            info!("  no previous summaries found");
            return Ok(Vec::new());
        }
        let mut out: Vec<PastSummary> = Vec::new();
        for path in &paths {
            let past = match read_past_summary(path) {
                Ok(s) => s,
                Err(e) => {
                    warn!("  could not load {}: {e}", path.display());
                    continue;
                }
            };
            let Ok(start) = past.week_start.parse::<NaiveDate>() else {
                warn!("  bad week_start in {}: {}", path.display(), past.week_start);
                continue;
            };
            if start >= before.start {
                continue;
            }
            match out.last_mut() {
                Some(last) if last.week_start == past.week_start => *last = past,
                _ => out.push(past),
            }
        }
        let skip = out.len().saturating_sub(weeks);
        out.drain(..skip);
        info!("  {} previous summaries loaded", out.len());
        Ok(out)
    }
}

pub fn read_past_summary(path: &Path) -> Result<PastSummary, TdigestError> {
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

pub fn render_markdown(record: &SummaryRecord, lang: Language) -> String {
    let t = lang.text();
    let mut md = String::new();
    let title = fill(
        t.md_title,
        &[
            ("start", lang.date(record.week_start).as_str()),
            ("end", lang.date(record.week_end).as_str()),
        ],
    );
    let generated = fill(t.md_generated, &[("date", lang.datetime(&record.generated_at).as_str())]);

    let _ = writeln!(md, "# {title}\n");
    let _ = writeln!(md, "*{generated}*\n");
    let _ = writeln!(md, "---\n");
    let _ = writeln!(md, "## 📝 {}\n", t.md_summary);
    let _ = writeln!(md, "{}\n", record.summary.trim_end());
    let _ = writeln!(md, "---\n");
    let _ = writeln!(md, "## 📊 {}\n", t.md_stats);
    let _ = writeln!(md, "- **{}** : {}", t.md_total, record.stats.total_tasks);
    for cat in &record.stats.by_category {
        let _ = writeln!(md, "- **{}** : {} {}", cat.category, cat.tasks, t.md_tasks_word);
        for sub in &cat.subprojects {
            let _ = writeln!(md, "  - {}: {} {}", sub.name, sub.tasks, t.md_tasks_word);
        }
    }

    let _ = writeln!(md, "\n---\n\n## 📋 {}\n", t.md_detail);
    for cat in record.tasks.iter() {
        let _ = writeln!(md, "### {}\n", cat.category);
        for bucket in &cat.groups {
            if let Some(name) = bucket.key.name() {
                let _ = writeln!(md, "#### {name}\n");
            }
            for task in &bucket.tasks {
                let section = task
                    .section()
                    .map(|s| format!(" *({s})*"))
                    .unwrap_or_default();
                let done = lang.completion(&task.completed_at.with_timezone(&Local));
                let _ = writeln!(md, "- {}{section} - ✓ {done}", task.content);
            }
            md.push('\n');
        }
    }
    md
}
