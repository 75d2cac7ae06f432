//! Localized strings and date formats. English and French are supported.

use chrono::{DateTime, NaiveDate, TimeZone};
use serde::Deserialize;

#[derive(Debug, Deserialize, Default, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Fr,
}

impl Language {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "en" | "english" => Some(Language::En),
            "fr" | "french" | "français" => Some(Language::Fr),
            _ => None,
        }
    }

    /// Full date: 31/12/2026 (fr) or 12/31/2026 (en).
    pub fn date(self, d: NaiveDate) -> String {
        match self {
            Language::Fr => d.format("%d/%m/%Y").to_string(),
            Language::En => d.format("%m/%d/%Y").to_string(),
        }
    }

    /// Day and month only: 31/12 (fr) or 12/31 (en).
    pub fn day_month(self, d: NaiveDate) -> String {
        match self {
            Language::Fr => d.format("%d/%m").to_string(),
            Language::En => d.format("%m/%d").to_string(),
        }
    }

    /// Timestamp for "generated at" lines.
    pub fn datetime<Tz: TimeZone>(self, t: &DateTime<Tz>) -> String
    where
        Tz::Offset: std::fmt::Display,
    {
        match self {
            Language::Fr => t.format("%d/%m/%Y à %H:%M").to_string(),
            Language::En => t.format("%m/%d/%Y at %I:%M %p").to_string(),
        }
    }

    /// Short completion stamp used in the task detail list.
    pub fn completion<Tz: TimeZone>(self, t: &DateTime<Tz>) -> String
    where
        Tz::Offset: std::fmt::Display,
    {
        match self {
            Language::Fr => t.format("%d/%m à %H:%M").to_string(),
            Language::En => t.format("%m/%d at %H:%M").to_string(),
        }
    }

    pub fn text(self) -> &'static Strings {
        match self {
            Language::En => &EN,
            Language::Fr => &FR,
        }
    }
}

pub struct Strings {
    pub prompt_system: &'static str,
    pub prompt_period: &'static str,
    pub prompt_context: &'static str,
    pub prompt_week_of: &'static str,
    pub prompt_tasks: &'static str,
    pub prompt_subproject: &'static str,
    pub prompt_instructions: &'static str,
    pub prompt_format: &'static str,
    pub prompt_per_subproject: &'static str,
    pub prompt_subproject_paragraph: &'static str,
    pub prompt_paragraph: &'static str,
    pub prompt_style: &'static str,
    pub prompt_important: &'static str,
    pub prompt_request: &'static str,
    pub md_title: &'static str,
    pub md_generated: &'static str,
    pub md_summary: &'static str,
    pub md_stats: &'static str,
    pub md_total: &'static str,
    pub md_tasks_word: &'static str,
    pub md_detail: &'static str,
    pub email_subject: &'static str,
    pub email_greeting: &'static str,
    pub email_intro: &'static str,
    pub email_footer: &'static str,
    pub email_generated_at: &'static str,
}

/// Substitute `{start}`, `{end}`, `{name}`, `{date}` placeholders.
pub fn fill(template: &str, vars: &[(&str, &str)]) -> String {
    let mut out = template.to_owned();
    for (k, v) in vars {
        out = out.replace(&format!("{{{k}}}"), v);
    }
    out
}

static EN: Strings = Strings {
    prompt_system: "You are an assistant that writes clear, factual weekly summaries of completed work from a personal task list.",
    prompt_period: "Period: from {start} to {end}.",
    prompt_context: "Summaries of previous weeks, for context and continuity:",
    prompt_week_of: "Week of {start} to {end}",
    prompt_tasks: "Tasks completed this week:",
    prompt_subproject: "Subproject: {name}",
    prompt_instructions: "Instructions",
    prompt_format: "Write a narrative summary in Markdown using exactly this structure:",
    prompt_per_subproject: "For each subproject with tasks:",
    prompt_subproject_paragraph: "[Paragraph describing tasks for this subproject]",
    prompt_paragraph: "[Paragraph describing tasks]",
    prompt_style: "Style:\n- Write in the first person, in a concise and professional tone.\n- Group related tasks into coherent sentences rather than listing them.\n- Mention progress relative to previous weeks when relevant.",
    prompt_important: "Important:\n- Only describe tasks listed above; never invent work.\n- Skip categories and subprojects with no tasks.\n- Do not add a title, preamble, or closing remarks.",
    prompt_request: "Write the summary now.",
    md_title: "Weekly summary - Week of {start} to {end}",
    md_generated: "Generated on {date}",
    md_summary: "Summary",
    md_stats: "Statistics",
    md_total: "Total completed tasks",
    md_tasks_word: "tasks",
    md_detail: "Task details",
    email_subject: "Weekly summary - {start} to {end}",
    email_greeting: "Hello,",
    email_intro: "Here is your summary for the week of {start} to {end}.",
    email_footer: "This summary was generated automatically from your completed Todoist tasks.",
    email_generated_at: "Generated on {date}",
};

static FR: Strings = Strings {
    prompt_system: "Tu es un assistant qui rédige des résumés hebdomadaires clairs et factuels du travail accompli à partir d'une liste de tâches personnelle.",
    prompt_period: "Période : du {start} au {end}.",
    prompt_context: "Résumés des semaines précédentes, pour le contexte et la continuité :",
    prompt_week_of: "Semaine du {start} au {end}",
    prompt_tasks: "Tâches complétées cette semaine :",
    prompt_subproject: "Sous-projet : {name}",
    prompt_instructions: "Instructions",
    prompt_format: "Rédige un résumé narratif en Markdown en suivant exactement cette structure :",
    prompt_per_subproject: "Pour chaque sous-projet ayant des tâches :",
    prompt_subproject_paragraph: "[Paragraphe décrivant les tâches de ce sous-projet]",
    prompt_paragraph: "[Paragraphe décrivant les tâches]",
    prompt_style: "Style :\n- Écris à la première personne, sur un ton concis et professionnel.\n- Regroupe les tâches liées en phrases cohérentes plutôt qu'en liste.\n- Mentionne la progression par rapport aux semaines précédentes si pertinent.",
    prompt_important: "Important :\n- Ne décris que les tâches listées ci-dessus ; n'invente jamais de travail.\n- Ignore les catégories et sous-projets sans tâches.\n- N'ajoute ni titre, ni préambule, ni conclusion.",
    prompt_request: "Rédige le résumé maintenant.",
    md_title: "Résumé hebdomadaire - Semaine du {start} au {end}",
    md_generated: "Généré le {date}",
    md_summary: "Résumé",
    md_stats: "Statistiques",
    md_total: "Total de tâches complétées",
    md_tasks_word: "tâches",
    md_detail: "Détail des tâches",
    email_subject: "Résumé hebdomadaire - {start} au {end}",
    email_greeting: "Bonjour,",
    email_intro: "Voici ton résumé pour la semaine du {start} au {end}.",
    email_footer: "Ce résumé a été généré automatiquement à partir de tes tâches Todoist complétées.",
    email_generated_at: "Généré le {date}",
};

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn parse_language_codes() {
        assert_eq!(Language::parse("fr"), Some(Language::Fr));
        assert_eq!(Language::parse(" EN "), Some(Language::En));
        assert_eq!(Language::parse("de"), None);
    }

    #[test]
    fn date_order_follows_language() {
        let d = NaiveDate::from_ymd_opt(2026, 10, 5).unwrap();
        assert_eq!(Language::Fr.date(d), "05/10/2026");
        assert_eq!(Language::En.date(d), "10/05/2026");
        assert_eq!(Language::Fr.day_month(d), "05/10");
        assert_eq!(Language::En.day_month(d), "10/05");
    }

    #[test]
    fn datetime_formats() {
        let t = Utc.with_ymd_and_hms(2026, 10, 5, 14, 7, 0).unwrap();
        assert_eq!(Language::Fr.datetime(&t), "05/10/2026 à 14:07");
        assert_eq!(Language::En.datetime(&t), "10/05/2026 at 02:07 PM");
        assert_eq!(Language::Fr.completion(&t), "05/10 à 14:07");
    }

    #[test]
    fn fill_replaces_placeholders() {
        let s = fill(EN.prompt_period, &[("start", "a"), ("end", "b")]);
        assert_eq!(s, "Period: from a to b.");
        assert_eq!(fill("{name}", &[]), "{name}");
    }
}
