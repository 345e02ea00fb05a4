use std::collections::BTreeSet;
use std::io::{self, IsTerminal, Write};

use anyhow::anyhow;
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use unicode_width::UnicodeWidthChar;
use unicode_width::UnicodeWidthStr;

use crate::calendar::{DayEmphasis, WeekView};
use crate::config::Config;
use crate::datetime::format_offset_iso;
use crate::model::{Client, Post, PostStatus, PostTemplate};

#[derive(Debug, Clone)]
pub struct Renderer {
    color: bool,
}

impl Renderer {
    pub fn new(cfg: &Config) -> anyhow::Result<Self> {
        let color = match cfg.color.to_ascii_lowercase().as_str() {
            "on" | "yes" | "true" | "1" => true,
            "off" | "no" | "false" | "0" => false,
            other => return Err(anyhow!("invalid color setting: {other}")),
        };

        Ok(Self { color })
    }

    #[tracing::instrument(skip_all)]
    pub fn print_week(&mut self, view: &WeekView<'_>, clients: &[Client], tz: Tz) -> anyhow::Result<()> {
        let mut out = io::stdout().lock();

        let headers = vec![
            "Day".to_string(),
            "Date".to_string(),
            "Posts".to_string(),
            "Schedule".to_string(),
        ];

        let mut rows = Vec::with_capacity(view.days.len());
        for day in &view.days {
            let code = emphasis_code(day.emphasis);
            let name = self.paint_opt(&day.date.format("%a").to_string(), code);
            let date = day.date.format("%Y-%m-%d").to_string();
            let count = day.posts.len().to_string();

            let schedule = day
                .posts
                .iter()
                .map(|post| {
                    let time = post.scheduled_for.with_timezone(&tz).format("%H:%M");
                    let summary = format!("{time} {}", client_label(clients, &post.client_id));
                    self.paint_opt(&summary, status_code(post.status))
                })
                .collect::<Vec<_>>()
                .join(", ");

            rows.push(vec![name, date, count, schedule]);
        }

        write_table(&mut out, headers, rows)?;
        Ok(())
    }

    #[tracing::instrument(skip_all)]
    pub fn print_posts_table(
        &mut self,
        posts: &[&Post],
        clients: &[Client],
        now: DateTime<Utc>,
        tz: Tz,
    ) -> anyhow::Result<()> {
        let mut out = io::stdout().lock();

        let headers = vec![
            "ID".to_string(),
            "When".to_string(),
            "Client".to_string(),
            "Platforms".to_string(),
            "Status".to_string(),
            "Content".to_string(),
        ];

        let mut rows = Vec::with_capacity(posts.len());
        for post in posts {
            let id = self.paint(&post.id, "33");

            let when = post
                .scheduled_for
                .with_timezone(&tz)
                .format("%Y-%m-%d %H:%M")
                .to_string();
            let missed = post.status != PostStatus::Published && post.scheduled_for < now;
            let when = if missed { self.paint(&when, "31") } else { when };

            let platforms = post
                .platforms
                .iter()
                .map(|platform| platform.as_str())
                .collect::<Vec<_>>()
                .join(",");

            let status = self.paint_opt(post.status.as_str(), status_code(post.status));

            rows.push(vec![
                id,
                when,
                client_label(clients, &post.client_id),
                platforms,
                status,
                truncate_cell(&post.content, 48),
            ]);
        }

        write_table(&mut out, headers, rows)?;
        Ok(())
    }

    #[tracing::instrument(skip_all)]
    pub fn print_clients_table(
        &mut self,
        clients: &[Client],
        selection: Option<&BTreeSet<String>>,
    ) -> anyhow::Result<()> {
        let mut out = io::stdout().lock();

        let mut headers = vec![
            "ID".to_string(),
            "Name".to_string(),
            "Industry".to_string(),
            "Color".to_string(),
            "Accounts".to_string(),
        ];
        if selection.is_some() {
            headers.insert(0, "Sel".to_string());
        }

        let mut rows = Vec::with_capacity(clients.len());
        for client in clients {
            let accounts = client
                .social_accounts
                .iter()
                .map(|account| {
                    let entry = format!("{}:{}", account.platform.as_str(), account.handle);
                    if account.connected {
                        entry
                    } else {
                        format!("{entry} (off)")
                    }
                })
                .collect::<Vec<_>>()
                .join(", ");

            let mut row = vec![
                self.paint(&client.id, "33"),
                client.name.clone(),
                client.industry.clone(),
                client.color.clone(),
                accounts,
            ];
            if let Some(selected) = selection {
                let mark = if selected.contains(&client.id) { "*" } else { "" };
                row.insert(0, mark.to_string());
            }
            rows.push(row);
        }

        write_table(&mut out, headers, rows)?;
        Ok(())
    }

    #[tracing::instrument(skip_all)]
    pub fn print_templates_table(&mut self, templates: &[PostTemplate]) -> anyhow::Result<()> {
        let mut out = io::stdout().lock();

        let headers = vec![
            "ID".to_string(),
            "Title".to_string(),
            "Industry".to_string(),
            "Description".to_string(),
        ];

        let mut rows = Vec::with_capacity(templates.len());
        for template in templates {
            rows.push(vec![
                self.paint(&template.id, "33"),
                template.title.clone(),
                template.industry.clone().unwrap_or_default(),
                truncate_cell(&template.description, 48),
            ]);
        }

        write_table(&mut out, headers, rows)?;
        Ok(())
    }

    #[tracing::instrument(skip_all)]
    pub fn print_post_info(&mut self, post: &Post, clients: &[Client]) -> anyhow::Result<()> {
        let mut out = io::stdout().lock();

        writeln!(out, "id         {}", post.id)?;
        writeln!(out, "client     {}", client_label(clients, &post.client_id))?;
        writeln!(out, "status     {}", post.status.as_str())?;
        writeln!(out, "scheduled  {}", format_offset_iso(post.scheduled_for))?;
        writeln!(
            out,
            "platforms  {}",
            post.platforms
                .iter()
                .map(|platform| platform.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        )?;
        for url in &post.media {
            writeln!(out, "media      {url}")?;
        }
        writeln!(out, "created    {}", format_offset_iso(post.created_at))?;
        writeln!(out, "modified   {}", format_offset_iso(post.updated_at))?;
        writeln!(out, "content    {}", post.content)?;

        Ok(())
    }

    fn paint(&self, text: &str, code: &str) -> String {
        if !self.color || !io::stdout().is_terminal() {
            return text.to_string();
        }
        format!("\x1b[{code}m{text}\x1b[0m")
    }

    fn paint_opt(&self, text: &str, code: Option<&str>) -> String {
        match code {
            Some(code) => self.paint(text, code),
            None => text.to_string(),
        }
    }
}

fn emphasis_code(emphasis: DayEmphasis) -> Option<&'static str> {
    match emphasis {
        DayEmphasis::Today => Some("36"),
        DayEmphasis::Multiple => Some("31"),
        DayEmphasis::Single => Some("33"),
        DayEmphasis::Empty => None,
    }
}

fn status_code(status: PostStatus) -> Option<&'static str> {
    match status {
        PostStatus::Scheduled => Some("33"),
        PostStatus::Published => Some("32"),
        PostStatus::Draft => None,
    }
}

fn client_label(clients: &[Client], client_id: &str) -> String {
    clients
        .iter()
        .find(|client| client.id == client_id)
        .map(|client| client.name.clone())
        .unwrap_or_else(|| client_id.to_string())
}

fn truncate_cell(text: &str, max_width: usize) -> String {
    let flat = text.replace(['\n', '\r'], " ");
    if UnicodeWidthStr::width(flat.as_str()) <= max_width {
        return flat;
    }

    let budget = max_width.saturating_sub(3);
    let mut width = 0usize;
    let mut out = String::new();
    for ch in flat.chars() {
        let ch_width = UnicodeWidthChar::width(ch).unwrap_or(0);
        if width + ch_width > budget {
            break;
        }
        width += ch_width;
        out.push(ch);
    }
    out.push_str("...");
    out
}

fn write_table<W: Write>(
    mut writer: W,
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
) -> anyhow::Result<()> {
    let column_count = headers.len();
    let mut widths = vec![0usize; column_count];

    for (idx, header) in headers.iter().enumerate() {
        widths[idx] = widths[idx].max(UnicodeWidthStr::width(header.as_str()));
    }

    for row in &rows {
        for (idx, cell) in row.iter().enumerate() {
            widths[idx] = widths[idx].max(UnicodeWidthStr::width(strip_ansi(cell).as_str()));
        }
    }

    for idx in 0..column_count {
        write!(writer, "{:width$} ", headers[idx], width = widths[idx])?;
    }
    writeln!(writer)?;

    for idx in 0..column_count {
        write!(writer, "{:-<width$} ", "", width = widths[idx])?;
    }
    writeln!(writer)?;

    for row in rows {
        for idx in 0..column_count {
            let cell = &row[idx];
            let visible_width = UnicodeWidthStr::width(strip_ansi(cell).as_str());
            let padding = widths[idx].saturating_sub(visible_width);
            write!(writer, "{}{} ", cell, " ".repeat(padding))?;
        }
        writeln!(writer)?;
    }

    Ok(())
}

fn strip_ansi(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut escaped = false;

    for ch in s.chars() {
        if escaped {
            if ch == 'm' {
                escaped = false;
            }
            continue;
        }

        if ch == '\x1b' {
            escaped = true;
            continue;
        }

        out.push(ch);
    }

    out
}
