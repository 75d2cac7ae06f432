use crate::group::Grouped;
use crate::i18n::{fill, Language};
use crate::storage::PastSummary;
use crate::week::WeekRange;
use std::fmt::Write;

/// At most this many previous weeks are quoted back to the model.
const MAX_CONTEXT_WEEKS: usize = 4;

pub fn system_prompt(lang: Language) -> &'static str {
    lang.text().prompt_system
}

/// Render grouped tasks, prior summaries, and output instructions into the
/// user message for the summary model.
pub fn build_prompt(
    grouped: &Grouped,
    week: &WeekRange,
    previous: &[PastSummary],
    lang: Language,
) -> String {
    let t = lang.text();
    let start = lang.date(week.start);
    let end = lang.date(week.end);
    let mut out = String::new();

    let _ = writeln!(out, "{}\n", t.prompt_system);
    let _ = writeln!(out, "{}\n", fill(t.prompt_period, &[("start", start.as_str()), ("end", end.as_str())]));

    if !previous.is_empty() {
        let _ = writeln!(out, "{}", t.prompt_context);
        let skip = previous.len().saturating_sub(MAX_CONTEXT_WEEKS);
        for past in &previous[skip..] {
            let label = fill(
                t.prompt_week_of,
                &[("start", past.week_start.as_str()), ("end", past.week_end.as_str())],
            );
            let _ = writeln!(out, "\n--- {label} ---");
            let _ = writeln!(out, "{}", past.summary.trim_end());
        }
        out.push('\n');
    }

    let _ = writeln!(out, "{}\n", t.prompt_tasks);
    for cat in grouped.iter() {
        let _ = writeln!(out, "=== {} ===", cat.category.to_uppercase());
        for bucket in &cat.groups {
            if let Some(name) = bucket.key.name() {
                let _ = writeln!(out, "\n{}", fill(t.prompt_subproject, &[("name", name)]));
            }
            for task in &bucket.tasks {
                match task.section() {
                    Some(section) => {
                        let _ = writeln!(out, "- {} (section: {section})", task.content);
                    }
                    None => {
                        let _ = writeln!(out, "- {}", task.content);
                    }
                }
            }
            if bucket.key.name().is_none() {
                out.push('\n');
            }
        }
        out.push('\n');
    }

    let _ = writeln!(out, "\n{}:", t.prompt_instructions);
    let _ = writeln!(out, "{}", t.prompt_format);
    for cat in grouped.iter() {
        let _ = writeln!(out, "\n## {}", cat.category);
        if cat.has_named() {
            let _ = writeln!(out, "\n{}", t.prompt_per_subproject);
            for name in cat.groups.iter().filter_map(|b| b.key.name()) {
                let _ = writeln!(out, "### {name}");
                let _ = writeln!(out, "{}\n", t.prompt_subproject_paragraph);
            }
        } else {
            let _ = writeln!(out, "{}\n", t.prompt_paragraph);
        }
    }

    let _ = writeln!(out, "\n{}\n", t.prompt_style);
    let _ = writeln!(out, "{}\n", t.prompt_important);
    let _ = writeln!(out, "{}", t.prompt_request);
    out
}
