use crate::config::EmailConfig;
use crate::i18n::{fill, Language};
use crate::week::WeekRange;
use crate::TdigestError;
use chrono::{DateTime, Local};
use lettre::message::{Mailbox, MultiPart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use log::info;

/// Delivery of a finished summary.
pub trait Notifier {
    fn send(&self, summary: &str, week: &WeekRange) -> Result<(), TdigestError>;
}

pub struct EmailSender {
    smtp_server: String,
    smtp_port: u16,
    from: Mailbox,
    to: Mailbox,
    username: String,
    password: String,
    language: Language,
}

impl EmailSender {
    pub fn new(config: &EmailConfig, language: Language) -> Result<Self, TdigestError> {
        let (Some(from), Some(to), Some(password)) = (
            config.from.as_deref().filter(|s| !s.is_empty()),
            config.to.as_deref().filter(|s| !s.is_empty()),
            config.password.as_deref().filter(|s| !s.is_empty()),
        ) else {
            return Err(TdigestError::Config(
                "incomplete email configuration: check EMAIL_FROM, EMAIL_TO and SMTP_PASSWORD"
                    .into(),
            ));
        };
        let from_mailbox: Mailbox = from
            .parse()
            .map_err(|e| TdigestError::Config(format!("invalid from address {from:?}: {e}")))?;
        let to_mailbox: Mailbox = to
            .parse()
            .map_err(|e| TdigestError::Config(format!("invalid to address {to:?}: {e}")))?;
        info!("email configuration: {from} -> {to}");
        Ok(Self {
            smtp_server: config.smtp_server.clone(),
            smtp_port: config.smtp_port,
            username: from_mailbox.email.to_string(),
            from: from_mailbox,
            to: to_mailbox,
            password: password.to_owned(),
            language,
        })
    }

    /// Build the multipart (text + HTML) message without sending it.
    pub fn compose(
        &self,
        summary: &str,
        week: &WeekRange,
        now: DateTime<Local>,
    ) -> Result<Message, TdigestError> {
        let message = Message::builder()
            .from(self.from.clone())
            .to(self.to.clone())
            .subject(subject(week, self.language))
            .date_now()
            .multipart(MultiPart::alternative_plain_html(
                text_body(summary, week, now, self.language),
                html_body(summary, week, now, self.language),
            ))?;
        Ok(message)
    }
}

impl Notifier for EmailSender {
    fn send(&self, summary: &str, week: &WeekRange) -> Result<(), TdigestError> {
        let message = self.compose(summary, week, Local::now())?;
        info!("connecting to {}:{}", self.smtp_server, self.smtp_port);
        let transport = SmtpTransport::starttls_relay(&self.smtp_server)?
            .port(self.smtp_port)
            .credentials(Credentials::new(self.username.clone(), self.password.clone()))
            .build();
        transport.send(&message)?;
        info!("  email sent to {}", self.to);
        Ok(())
    }
}

pub fn subject(week: &WeekRange, lang: Language) -> String {
    fill(
        lang.text().email_subject,
        &[
            ("start", lang.day_month(week.start).as_str()),
            ("end", lang.date(week.end).as_str()),
        ],
    )
}

fn intro(week: &WeekRange, lang: Language) -> String {
    fill(
        lang.text().email_intro,
        &[
            ("start", lang.date(week.start).as_str()),
            ("end", lang.date(week.end).as_str()),
        ],
    )
}

pub fn text_body(summary: &str, week: &WeekRange, now: DateTime<Local>, lang: Language) -> String {
    let t = lang.text();
    let generated = fill(t.email_generated_at, &[("date", lang.datetime(&now).as_str())]);
    format!(
        "{}\n\n{}\n\n{}\n\n---\n{}\n{}\n",
        t.email_greeting,
        intro(week, lang),
        summary,
        t.email_footer,
        generated
    )
}

pub fn html_body(summary: &str, week: &WeekRange, now: DateTime<Local>, lang: Language) -> String {
    let t = lang.text();
    let generated = fill(t.email_generated_at, &[("date", lang.datetime(&now).as_str())]);
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <style>
        body {{ font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Helvetica, Arial, sans-serif; line-height: 1.6; color: #333; max-width: 650px; margin: 0 auto; padding: 20px; }}
        .header {{ background: linear-gradient(135deg, #667eea 0%, #764ba2 100%); color: white; padding: 30px; border-radius: 10px; margin-bottom: 30px; }}
        .header h1 {{ margin: 0 0 10px 0; font-size: 24px; }}
        .header p {{ margin: 0; opacity: 0.9; font-size: 14px; }}
        .content {{ background: #f8f9fa; padding: 25px; border-radius: 8px; margin-bottom: 20px; }}
        .content p {{ margin: 0 0 15px 0; }}
        .footer {{ text-align: center; color: #666; font-size: 12px; padding-top: 20px; border-top: 1px solid #e0e0e0; }}
    </style>
</head>
<body>
    <div class="header">
        <h1>{title}</h1>
        <p>{intro}</p>
    </div>
    <div class="content">
{content}
    </div>
    <div class="footer">
        <p>{footer}</p>
        <p>{generated}</p>
    </div>
</body>
</html>
"#,
        title = escape_html(&subject(week, lang)),
        intro = escape_html(&intro(week, lang)),
        content = markdown_to_html(summary),
        footer = escape_html(t.email_footer),
        generated = escape_html(&generated),
    )
}

pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

fn flush_paragraph(html: &mut String, lines: &mut Vec<String>) {
    if !lines.is_empty() {
        html.push_str(&format!("<p>{}</p>\n", lines.join("<br>")));
        lines.clear();
    }
}

/// Minimal Markdown to HTML for email bodies: `##`/`###` headings and
/// paragraphs separated by blank lines. Everything else is escaped text.
pub fn markdown_to_html(md: &str) -> String {
    let mut html = String::new();
    let mut paragraph: Vec<String> = Vec::new();

    for line in md.lines() {
        let stripped = line.trim();
        if let Some(heading) = stripped.strip_prefix("### ") {
            flush_paragraph(&mut html, &mut paragraph);
            html.push_str(&format!(
                "<h3 style=\"color: #764ba2; margin-top: 20px; margin-bottom: 10px; font-size: 18px;\">{}</h3>\n",
                escape_html(heading.trim())
            ));
        } else if let Some(heading) = stripped.strip_prefix("## ") {
            flush_paragraph(&mut html, &mut paragraph);
            html.push_str(&format!(
                "<h2 style=\"color: #667eea; margin-top: 25px; margin-bottom: 15px; font-size: 20px;\">{}</h2>\n",
                escape_html(heading.trim())
            ));
        } else if stripped.is_empty() {
            flush_paragraph(&mut html, &mut paragraph);
        } else {
            paragraph.push(escape_html(stripped));
        }
    }
    flush_paragraph(&mut html, &mut paragraph);
    html
}
