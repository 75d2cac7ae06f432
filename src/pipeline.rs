use crate::cli::{HistoryArgs, RunArgs, TasksArgs};
use crate::config::TdigestConfig;
use crate::email::{EmailSender, Notifier};
use crate::group::{group_tasks, AllowList, Grouped};
use crate::i18n::Language;
use crate::prompt::{build_prompt, system_prompt};
use crate::storage::{read_past_summary, PastSummary, Storage};
use crate::summarize::{ChatCompletion, TextGenerator};
use crate::task::TaskRecord;
use crate::todoist::{TaskSource, TodoistClient};
use crate::week::{resolve_week, WeekRange};
use crate::TdigestError;
use chrono::Local;
use log::{info, warn};
use std::path::PathBuf;

const STEPS: u32 = 5;

fn step(n: u32, what: &str) {
    info!("[{n}/{STEPS}] {what}");
}

/// What a run produced. `summary` is `None` when the week had no tasks.
#[derive(Debug)]
pub struct RunOutcome {
    pub week: WeekRange,
    pub tasks_found: usize,
    pub grouped: Grouped,
    pub summary: Option<String>,
    pub saved: Option<(PathBuf, PathBuf)>,
    pub emailed: bool,
}

pub struct RunOptions {
    pub weeks_of_context: usize,
    pub language: Language,
}

fn fetch(week: &WeekRange, source: &mut dyn TaskSource) -> Result<Vec<TaskRecord>, TdigestError> {
    let tasks = source.completed_tasks(week)?;
    info!("  {} completed tasks found", tasks.len());
    Ok(tasks)
}

/// Group tasks and log per-category and per-subproject counts.
fn organize(tasks: &[TaskRecord], allow: &AllowList) -> Grouped {
    let grouped = group_tasks(tasks, allow);
    for cat in grouped.iter() {
        info!("  - {}: {} tasks", cat.category, cat.total());
        for bucket in &cat.groups {
            if let Some(name) = bucket.key.name() {
                info!("    └─ {name}: {} tasks", bucket.tasks.len());
            }
        }
    }
    let dropped = tasks.len() - grouped.total();
    if dropped > 0 {
        info!("  {dropped} tasks outside configured categories ({allow})");
    }
    grouped
}

/// Fetch the week's completed tasks and group them.
pub fn collect(
    week: &WeekRange,
    allow: &AllowList,
    source: &mut dyn TaskSource,
) -> Result<Grouped, TdigestError> {
    let tasks = fetch(week, source)?;
    Ok(organize(&tasks, allow))
}

/// The full weekly pipeline over injected collaborators.
pub fn run_week(
    week: &WeekRange,
    allow: &AllowList,
    source: &mut dyn TaskSource,
    generator: &dyn TextGenerator,
    storage: &Storage,
    notifier: Option<&dyn Notifier>,
    opts: &RunOptions,
) -> Result<RunOutcome, TdigestError> {
    info!("period: {} to {}", week.start, week.end);

    step(1, "fetching completed tasks");
    let tasks = fetch(week, source)?;
    if tasks.is_empty() {
        warn!("no completed tasks this week, nothing to summarize");
        return Ok(RunOutcome {
            week: *week,
            tasks_found: 0,
            grouped: Grouped::default(),
            summary: None,
            saved: None,
            emailed: false,
        });
    }

    step(2, "organizing tasks by category");
    let grouped = organize(&tasks, allow);

    step(3, "generating summary");
    let previous = storage.load_previous(week, opts.weeks_of_context)?;
    let prompt = build_prompt(&grouped, week, &previous, opts.language);
    let summary = generator.generate(system_prompt(opts.language), &prompt)?;
    info!("  summary generated ({} chars)", summary.chars().count());

    step(4, "saving locally");
    let saved = storage.save(&summary, &grouped, week, Local::now())?;

    let emailed = match notifier {
        Some(n) => {
            step(5, "sending email");
            n.send(&summary, week)?;
            true
        }
        None => {
            info!("[5/{STEPS}] email disabled, skipping");
            false
        }
    };

    Ok(RunOutcome {
        week: *week,
        tasks_found: tasks.len(),
        grouped,
        summary: Some(summary),
        saved: Some(saved),
        emailed,
    })
}

fn today() -> chrono::NaiveDate {
    Local::now().date_naive()
}

pub fn handle_run(config: &TdigestConfig, args: &RunArgs) -> Result<(), TdigestError> {
    let allow = config.categories.resolve()?;
    let week = resolve_week(args.week_of.as_deref(), today())?;
    let mut client = TodoistClient::new(&config.todoist)?;
    let storage_dir = config.storage_dir();

    if args.dry_run {
        let grouped = collect(&week, &allow, &mut client)?;
        let previous: Vec<PastSummary> = if storage_dir.exists() {
            Storage::open(&storage_dir, config.language)?
                .load_previous(&week, config.summarization.weeks_of_context)?
        } else {
            Vec::new()
        };
        println!("{}", build_prompt(&grouped, &week, &previous, config.language));
        return Ok(());
    }

    let generator = ChatCompletion::new(&config.summarization)?;
    let sender = if config.email.enabled && !args.no_email {
        Some(EmailSender::new(&config.email, config.language)?)
    } else {
        None
    };
    let storage = Storage::open(&storage_dir, config.language)?;
    let opts = RunOptions {
        weeks_of_context: config.summarization.weeks_of_context,
        language: config.language,
    };

    let outcome = run_week(
        &week,
        &allow,
        &mut client,
        &generator,
        &storage,
        sender.as_ref().map(|s| s as &dyn Notifier),
        &opts,
    )?;

    if let Some((_, md)) = &outcome.saved {
        println!("{}", md.display());
    }
    info!("done");
    Ok(())
}

pub fn handle_tasks(config: &TdigestConfig, args: &TasksArgs) -> Result<(), TdigestError> {
    let allow = config.categories.resolve()?;
    let week = resolve_week(args.week_of.as_deref(), today())?;
    let mut client = TodoistClient::new(&config.todoist)?;
    let grouped = collect(&week, &allow, &mut client)?;
    println!("{}", serde_json::to_string_pretty(&grouped)?);
    Ok(())
}

/// First prose line of a summary, for one-line listings.
fn preview(summary: &str, max: usize) -> String {
    let line = summary
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty() && !l.starts_with('#'))
        .unwrap_or("");
    if line.chars().count() <= max {
        return line.to_owned();
    }
    let mut s: String = line.chars().take(max).collect();
    s.push('…');
    s
}

pub fn handle_history(config: &TdigestConfig, args: &HistoryArgs) -> Result<(), TdigestError> {
    let dir = config.storage_dir();
    if !dir.exists() {
        eprintln!("tdigest: no stored summaries in {}", dir.display());
        return Ok(());
    }
    let storage = Storage::open(&dir, config.language)?;
    let entries = storage.entries()?;
    if entries.is_empty() {
        eprintln!("tdigest: no stored summaries in {}", storage.dir().display());
        return Ok(());
    }
    let skip = entries.len().saturating_sub(args.limit);
    for path in &entries[skip..] {
        let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("?");
        match read_past_summary(path) {
            Ok(p) => println!(
                "{} .. {}  {name}  {}",
                p.week_start,
                p.week_end,
                preview(&p.summary, 60)
            ),
            Err(e) => warn!("could not read {name}: {e}"),
        }
    }
    Ok(())
}
