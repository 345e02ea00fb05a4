use anyhow::anyhow;
use chrono::{DateTime, FixedOffset, Utc};
use chrono_tz::Tz;
use regex::Regex;
use tracing::{debug, info, instrument, warn};

use crate::calendar::today_in_zone;
use crate::cli::Invocation;
use crate::config::Config;
use crate::datastore::Store;
use crate::datetime::parse_schedule_expr;
use crate::filter::PostFilter;
use crate::model::{
    ClientPatch, NewClient, NewPost, NewTemplate, Platform, Post, PostDraft, PostPatch,
    PostStatus, SocialAccount,
};
use crate::render::Renderer;
use crate::state::{AppState, View};

const DEFAULT_CLIENT_COLOR: &str = "#F97316";

pub fn known_command_names() -> Vec<&'static str> {
    vec![
        "calendar",
        "posts",
        "clients",
        "templates",
        "today",
        "next",
        "prev",
        "select",
        "add",
        "modify",
        "delete",
        "use",
        "client-add",
        "client-modify",
        "client-delete",
        "template-add",
        "template-delete",
        "info",
        "export",
        "_commands",
        "help",
        "version",
    ]
}

pub fn expand_command_abbrev<'a>(token: &'a str, known: &[&'a str]) -> Option<&'a str> {
    if known.contains(&token) {
        return Some(token);
    }

    let mut matches = known.iter().copied().filter(|name| name.starts_with(token));
    let first = matches.next()?;
    if matches.next().is_some() {
        None
    } else {
        Some(first)
    }
}

#[instrument(skip(store, cfg, renderer, inv, state, now, tz))]
pub fn dispatch(
    store: &Store,
    cfg: &Config,
    renderer: &mut Renderer,
    inv: Invocation,
    state: AppState,
    view: View,
    now: DateTime<Utc>,
    tz: Tz,
) -> anyhow::Result<(AppState, View)> {
    let command = inv.command.as_str();

    debug!(
        command,
        filter = ?inv.filter_terms,
        args = ?inv.command_args,
        "dispatching command"
    );

    match command {
        "calendar" => {
            let state = cmd_calendar(cfg, renderer, state, &inv.command_args, now, tz)?;
            Ok((state, View::Calendar))
        }
        "today" => {
            let state = cmd_today(cfg, renderer, state, now, tz)?;
            Ok((state, View::Calendar))
        }
        "next" => {
            let state = cmd_shift_week(cfg, renderer, state, 1, now, tz)?;
            Ok((state, View::Calendar))
        }
        "prev" => {
            let state = cmd_shift_week(cfg, renderer, state, -1, now, tz)?;
            Ok((state, View::Calendar))
        }
        "posts" => {
            cmd_posts(renderer, &state, &inv.filter_terms, &inv.command_args, now, tz)?;
            Ok((state, View::Posts))
        }
        "clients" => {
            cmd_clients(renderer, &state)?;
            Ok((state, View::Clients))
        }
        "templates" => {
            cmd_templates(renderer, &state)?;
            Ok((state, View::Templates))
        }
        "select" => {
            let state = cmd_select(renderer, state, &inv.command_args)?;
            Ok((state, view))
        }
        "add" => {
            let state = cmd_add(store, state, &inv.command_args, now, tz)?;
            Ok((state, view))
        }
        "modify" => {
            let state = cmd_modify(store, state, &inv.command_args, now, tz)?;
            Ok((state, view))
        }
        "delete" => {
            let state = cmd_delete(store, state, &inv.command_args)?;
            Ok((state, view))
        }
        "use" => {
            let state = cmd_use(store, state, &inv.command_args, now, tz)?;
            Ok((state, view))
        }
        "client-add" => {
            let state = cmd_client_add(store, state, &inv.command_args, now, tz)?;
            Ok((state, view))
        }
        "client-modify" => {
            let state = cmd_client_modify(store, state, &inv.command_args, now, tz)?;
            Ok((state, view))
        }
        "client-delete" => {
            let state = cmd_client_delete(store, state, &inv.command_args)?;
            Ok((state, view))
        }
        "template-add" => {
            let state = cmd_template_add(store, state, &inv.command_args, now, tz)?;
            Ok((state, view))
        }
        "template-delete" => {
            let state = cmd_template_delete(store, state, &inv.command_args)?;
            Ok((state, view))
        }
        "info" => {
            cmd_info(renderer, &state, &inv.command_args)?;
            Ok((state, view))
        }
        "export" => {
            cmd_export(&state)?;
            Ok((state, view))
        }
        "_commands" => {
            cmd_commands()?;
            Ok((state, view))
        }
        "help" => {
            cmd_help()?;
            Ok((state, view))
        }
        "version" => {
            println!("{}", env!("CARGO_PKG_VERSION"));
            Ok((state, view))
        }
        other => Err(anyhow!("unknown command: {other}")),
    }
}

#[instrument(skip(cfg, renderer, state, args, now, tz))]
fn cmd_calendar(
    cfg: &Config,
    renderer: &mut Renderer,
    state: AppState,
    args: &[String],
    now: DateTime<Utc>,
    tz: Tz,
) -> anyhow::Result<AppState> {
    info!("command calendar");

    let state = if args.is_empty() {
        state
    } else {
        let expr = args.join(" ");
        let date = parse_schedule_expr(&expr, now, tz)?.date_naive();
        state.with_reference_date(date)
    };

    render_week(cfg, renderer, &state, now, tz)?;
    Ok(state)
}

#[instrument(skip(cfg, renderer, state, now, tz))]
fn cmd_today(
    cfg: &Config,
    renderer: &mut Renderer,
    state: AppState,
    now: DateTime<Utc>,
    tz: Tz,
) -> anyhow::Result<AppState> {
    info!("command today");

    let state = state.with_reference_date(today_in_zone(now, tz));
    render_week(cfg, renderer, &state, now, tz)?;
    Ok(state)
}

#[instrument(skip(cfg, renderer, state, now, tz))]
fn cmd_shift_week(
    cfg: &Config,
    renderer: &mut Renderer,
    state: AppState,
    weeks: i64,
    now: DateTime<Utc>,
    tz: Tz,
) -> anyhow::Result<AppState> {
    info!(weeks, "command next/prev");

    let state = state.with_week_shifted(weeks);
    render_week(cfg, renderer, &state, now, tz)?;
    Ok(state)
}

fn render_week(
    cfg: &Config,
    renderer: &mut Renderer,
    state: &AppState,
    now: DateTime<Utc>,
    tz: Tz,
) -> anyhow::Result<()> {
    let today = today_in_zone(now, tz);
    let week = state.week(today, tz, cfg.week_start_day());
    renderer.print_week(&week, &state.clients, tz)
}

#[instrument(skip(renderer, state, filter_terms, args, now, tz))]
fn cmd_posts(
    renderer: &mut Renderer,
    state: &AppState,
    filter_terms: &[String],
    args: &[String],
    now: DateTime<Utc>,
    tz: Tz,
) -> anyhow::Result<()> {
    info!("command posts");

    let terms: Vec<String> = filter_terms.iter().chain(args).cloned().collect();
    let filter = PostFilter::parse(&terms, now, tz)?;
    let rows: Vec<&Post> = state
        .posts
        .iter()
        .filter(|post| filter.matches(post, &state.clients, tz))
        .collect();

    renderer.print_posts_table(&rows, &state.clients, now, tz)
}

#[instrument(skip(renderer, state))]
fn cmd_clients(renderer: &mut Renderer, state: &AppState) -> anyhow::Result<()> {
    info!("command clients");
    renderer.print_clients_table(&state.clients, None)
}

#[instrument(skip(renderer, state))]
fn cmd_templates(renderer: &mut Renderer, state: &AppState) -> anyhow::Result<()> {
    info!("command templates");
    renderer.print_templates_table(&state.templates)
}

#[instrument(skip(renderer, state, args))]
fn cmd_select(
    renderer: &mut Renderer,
    mut state: AppState,
    args: &[String],
) -> anyhow::Result<AppState> {
    info!("command select");

    if args.is_empty() {
        let selection = state.selection();
        renderer.print_clients_table(&state.clients, Some(&selection))?;
        return Ok(state);
    }

    if args.len() == 1 && args[0] == "all" {
        println!("Selected all clients.");
        return Ok(state.with_selection(None));
    }
    if args.len() == 1 && args[0] == "none" {
        println!("Cleared client selection.");
        return Ok(state.with_selection(Some(Default::default())));
    }

    for token in args {
        let id = match find_client_id(&state, token)? {
            Some(id) => id,
            None => {
                warn!(client = %token, "toggling unknown client id");
                token.clone()
            }
        };
        state = state.with_selection_toggled(&id);
    }

    println!(
        "Selected {} of {} client(s).",
        state.selection().len(),
        state.clients.len()
    );
    Ok(state)
}

#[instrument(skip(store, state, args, now, tz))]
fn cmd_add(
    store: &Store,
    state: AppState,
    args: &[String],
    now: DateTime<Utc>,
    tz: Tz,
) -> anyhow::Result<AppState> {
    info!("command add");

    let (text, mods) = parse_text_and_mods(args, now, tz)?;
    if text.is_empty() {
        return Err(anyhow!("add: post content is required"));
    }

    let mut client_token = None;
    let mut scheduled_for = None;
    let mut platforms = None;
    let mut media = Vec::new();
    let mut status = PostStatus::Scheduled;
    for one_mod in mods {
        match one_mod {
            Mod::Client(token) => client_token = Some(token),
            Mod::At(instant) => scheduled_for = Some(instant),
            Mod::Platforms(list) => platforms = Some(list),
            Mod::Media(urls) => media = urls,
            Mod::Status(value) => status = value,
            other => warn!(modifier = ?other, "modifier not applicable to add"),
        }
    }

    let client_token =
        client_token.ok_or_else(|| anyhow!("add requires client:CLIENT (id or name)"))?;
    let client_id = resolve_client(&state, &client_token)?;

    let platforms = match platforms {
        Some(list) => list,
        None => state
            .client(&client_id)
            .map(|client| client.connected_platforms())
            .unwrap_or_default(),
    };
    if platforms.is_empty() {
        return Err(anyhow!(
            "add: no platforms given and client {client_id} has no connected accounts"
        ));
    }

    let scheduled_for = match scheduled_for {
        Some(instant) => instant,
        None => parse_schedule_expr("today", now, tz)?,
    };

    let draft = PostDraft {
        client_id,
        content: sanitize_content(&text),
        media,
        platforms,
        scheduled_for,
        status,
    };
    let created = store.create_post(&NewPost::from_draft(draft, now.fixed_offset()))?;

    debug!(posts = state.posts.len() + 1, "post added");
    println!("Created post {}.", created.id);
    Ok(state.with_post_added(created))
}

#[instrument(skip(store, state, args, now, tz))]
fn cmd_modify(
    store: &Store,
    state: AppState,
    args: &[String],
    now: DateTime<Utc>,
    tz: Tz,
) -> anyhow::Result<AppState> {
    info!("command modify");

    let Some((id, rest)) = args.split_first() else {
        return Err(anyhow!("modify requires a post id"));
    };
    if state.post(id).is_none() {
        return Err(anyhow!("no post with id {id}"));
    }

    let (text, mods) = parse_text_and_mods(rest, now, tz)?;
    let mut patch = PostPatch::default();
    if !text.is_empty() {
        patch.content = Some(sanitize_content(&text));
    }
    for one_mod in mods {
        match one_mod {
            Mod::Client(token) => patch.client_id = Some(resolve_client(&state, &token)?),
            Mod::At(instant) => patch.scheduled_for = Some(instant),
            Mod::Platforms(list) => patch.platforms = Some(list),
            Mod::Media(urls) => patch.media = Some(urls),
            Mod::Status(value) => patch.status = Some(value),
            Mod::Content(value) => patch.content = Some(sanitize_content(&value)),
            other => warn!(modifier = ?other, "modifier not applicable to modify"),
        }
    }

    if patch.is_empty() {
        return Err(anyhow!("modify: nothing to change"));
    }
    patch.updated_at = Some(now.fixed_offset());

    let updated = store.update_post(id, &patch)?;
    println!("Modified post {id}.");
    Ok(state.with_post_updated(updated))
}

#[instrument(skip(store, state, args))]
fn cmd_delete(store: &Store, state: AppState, args: &[String]) -> anyhow::Result<AppState> {
    info!("command delete");

    let Some(id) = args.first() else {
        return Err(anyhow!("delete requires a post id"));
    };
    store.delete_post(id)?;
    println!("Deleted post {id}.");
    Ok(state.with_post_removed(id))
}

#[instrument(skip(store, state, args, now, tz))]
fn cmd_use(
    store: &Store,
    state: AppState,
    args: &[String],
    now: DateTime<Utc>,
    tz: Tz,
) -> anyhow::Result<AppState> {
    info!("command use");

    let Some((template_id, rest)) = args.split_first() else {
        return Err(anyhow!("use requires a template id"));
    };
    let template = state
        .template(template_id)
        .cloned()
        .ok_or_else(|| anyhow!("no template with id {template_id}"))?;

    let mods = parse_mods(rest, now, tz)?;
    let mut client_token = None;
    let mut scheduled_for = None;
    let mut platforms = None;
    let mut media = Vec::new();
    let mut status = PostStatus::Draft;
    for one_mod in mods {
        match one_mod {
            Mod::Client(token) => client_token = Some(token),
            Mod::At(instant) => scheduled_for = Some(instant),
            Mod::Platforms(list) => platforms = Some(list),
            Mod::Media(urls) => media = urls,
            Mod::Status(value) => status = value,
            other => warn!(modifier = ?other, "modifier not applicable to use"),
        }
    }

    let client_token =
        client_token.ok_or_else(|| anyhow!("use requires client:CLIENT (id or name)"))?;
    let client_id = resolve_client(&state, &client_token)?;

    let platforms = match platforms {
        Some(list) => list,
        None => state
            .client(&client_id)
            .map(|client| client.connected_platforms())
            .unwrap_or_default(),
    };
    if platforms.is_empty() {
        return Err(anyhow!(
            "use: no platforms given and client {client_id} has no connected accounts"
        ));
    }

    let scheduled_for = match scheduled_for {
        Some(instant) => instant,
        None => parse_schedule_expr("today", now, tz)?,
    };

    let draft = PostDraft {
        client_id,
        content: template.content.clone(),
        media,
        platforms,
        scheduled_for,
        status,
    };
    let created = store.create_post(&NewPost::from_draft(draft, now.fixed_offset()))?;

    println!("Created post {} from template {}.", created.id, template.id);
    Ok(state.with_post_added(created))
}

#[instrument(skip(store, state, args, now, tz))]
fn cmd_client_add(
    store: &Store,
    state: AppState,
    args: &[String],
    now: DateTime<Utc>,
    tz: Tz,
) -> anyhow::Result<AppState> {
    info!("command client-add");

    let (name, mods) = parse_text_and_mods(args, now, tz)?;
    if name.is_empty() {
        return Err(anyhow!("client-add requires a name"));
    }

    let mut industry = String::new();
    let mut color = DEFAULT_CLIENT_COLOR.to_string();
    let mut logo = None;
    let mut accounts: Vec<SocialAccount> = Vec::new();
    for one_mod in mods {
        match one_mod {
            Mod::Industry(value) => industry = value,
            Mod::Color(value) => color = value,
            Mod::Logo(value) => logo = Some(value),
            Mod::Account(platform, handle) => accounts.push(SocialAccount {
                id: (accounts.len() + 1).to_string(),
                platform,
                handle,
                connected: true,
                account_name: Some(name.clone()),
            }),
            other => warn!(modifier = ?other, "modifier not applicable to client-add"),
        }
    }

    let draft = NewClient {
        name,
        industry,
        logo,
        color,
        social_accounts: accounts,
    };
    let created = store.create_client(&draft)?;

    println!("Created client {}.", created.id);
    Ok(state.with_client_added(created))
}

#[instrument(skip(store, state, args, now, tz))]
fn cmd_client_modify(
    store: &Store,
    state: AppState,
    args: &[String],
    now: DateTime<Utc>,
    tz: Tz,
) -> anyhow::Result<AppState> {
    info!("command client-modify");

    let Some((token, rest)) = args.split_first() else {
        return Err(anyhow!("client-modify requires a client id or name"));
    };
    let id = resolve_client(&state, token)?;

    let mut patch = ClientPatch::default();
    for one_mod in parse_mods(rest, now, tz)? {
        match one_mod {
            Mod::Name(value) => patch.name = Some(value),
            Mod::Industry(value) => patch.industry = Some(value),
            Mod::Color(value) => patch.color = Some(value),
            Mod::Logo(value) => patch.logo = Some(value),
            other => warn!(modifier = ?other, "modifier not applicable to client-modify"),
        }
    }

    if patch.is_empty() {
        return Err(anyhow!("client-modify: nothing to change"));
    }

    let updated = store.update_client(&id, &patch)?;
    println!("Modified client {id}.");
    Ok(state.with_client_updated(updated))
}

#[instrument(skip(store, state, args))]
fn cmd_client_delete(store: &Store, state: AppState, args: &[String]) -> anyhow::Result<AppState> {
    info!("command client-delete");

    let Some(token) = args.first() else {
        return Err(anyhow!("client-delete requires a client id or name"));
    };
    let id = resolve_client(&state, token)?;

    store.delete_client(&id)?;
    println!("Deleted client {id}.");
    Ok(state.with_client_removed(&id))
}

#[instrument(skip(store, state, args, now, tz))]
fn cmd_template_add(
    store: &Store,
    state: AppState,
    args: &[String],
    now: DateTime<Utc>,
    tz: Tz,
) -> anyhow::Result<AppState> {
    info!("command template-add");

    let (head, trailing) = match args.iter().position(|arg| arg == "--") {
        Some(split) => (&args[..split], Some(args[split + 1..].join(" "))),
        None => (args, None),
    };

    let (title, mods) = parse_text_and_mods(head, now, tz)?;
    if title.is_empty() {
        return Err(anyhow!("template-add requires a title"));
    }

    let mut description = String::new();
    let mut industry = None;
    let mut content = trailing.filter(|text| !text.is_empty());
    for one_mod in mods {
        match one_mod {
            Mod::Desc(value) => description = value,
            Mod::Industry(value) => industry = Some(value),
            Mod::Content(value) => {
                if content.is_none() {
                    content = Some(value);
                }
            }
            other => warn!(modifier = ?other, "modifier not applicable to template-add"),
        }
    }

    let content =
        content.ok_or_else(|| anyhow!("template-add requires content (content:TEXT or -- TEXT)"))?;

    let draft = NewTemplate {
        title,
        description,
        content,
        industry,
    };
    let created = store.create_template(&draft)?;

    println!("Created template {}.", created.id);
    Ok(state.with_template_added(created))
}

#[instrument(skip(store, state, args))]
fn cmd_template_delete(
    store: &Store,
    state: AppState,
    args: &[String],
) -> anyhow::Result<AppState> {
    info!("command template-delete");

    let Some(id) = args.first() else {
        return Err(anyhow!("template-delete requires a template id"));
    };
    store.delete_template(id)?;
    println!("Deleted template {id}.");
    Ok(state.with_template_removed(id))
}

#[instrument(skip(renderer, state, args))]
fn cmd_info(renderer: &mut Renderer, state: &AppState, args: &[String]) -> anyhow::Result<()> {
    info!("command info");

    let Some(id) = args.first() else {
        return Err(anyhow!("info requires a post id"));
    };
    let post = state
        .post(id)
        .ok_or_else(|| anyhow!("no post with id {id}"))?;
    renderer.print_post_info(post, &state.clients)
}

#[instrument(skip(state))]
fn cmd_export(state: &AppState) -> anyhow::Result<()> {
    info!("command export");

    let doc = serde_json::json!({
        "clients": state.clients,
        "posts": state.posts,
        "templates": state.templates,
    });
    let out = serde_json::to_string(&doc)?;
    println!("{out}");
    Ok(())
}

fn cmd_commands() -> anyhow::Result<()> {
    for command in known_command_names() {
        println!("{command}");
    }
    Ok(())
}

fn cmd_help() -> anyhow::Result<()> {
    println!(
        "Implemented commands: calendar, posts, clients, templates, today, next, prev, select, add, modify, delete, use, client-add, client-modify, client-delete, template-add, template-delete, info, export"
    );
    Ok(())
}

fn find_client_id(state: &AppState, token: &str) -> anyhow::Result<Option<String>> {
    if state.clients.iter().any(|client| client.id == token) {
        return Ok(Some(token.to_string()));
    }

    let lowered = token.to_lowercase();
    let mut matches = state
        .clients
        .iter()
        .filter(|client| client.name.to_lowercase() == lowered);
    let Some(first) = matches.next() else {
        return Ok(None);
    };
    if matches.next().is_some() {
        return Err(anyhow!("ambiguous client name: {token}"));
    }
    Ok(Some(first.id.clone()))
}

fn resolve_client(state: &AppState, token: &str) -> anyhow::Result<String> {
    find_client_id(state, token)?.ok_or_else(|| anyhow!("no client matching {token}"))
}

fn sanitize_content(text: &str) -> String {
    match Regex::new(r"<[^>]*>") {
        Ok(re) => re.replace_all(text, "").to_string(),
        Err(_) => text.to_string(),
    }
}

fn validate_url(raw: &str) -> anyhow::Result<String> {
    let url = reqwest::Url::parse(raw).map_err(|err| anyhow!("invalid URL {raw}: {err}"))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(anyhow!("unsupported URL scheme in {raw}"));
    }
    Ok(raw.to_string())
}

fn parse_platform_list(raw: &str) -> anyhow::Result<Vec<Platform>> {
    let mut platforms = Vec::new();
    for token in raw.split(',') {
        let token = token.trim();
        if token.is_empty() {
            continue;
        }
        let platform =
            Platform::parse(token).ok_or_else(|| anyhow!("unknown platform: {token}"))?;
        if !platforms.contains(&platform) {
            platforms.push(platform);
        }
    }
    if platforms.is_empty() {
        return Err(anyhow!("empty platform list"));
    }
    Ok(platforms)
}

fn parse_media_list(raw: &str) -> anyhow::Result<Vec<String>> {
    let mut urls = Vec::new();
    for token in raw.split(',') {
        let token = token.trim();
        if token.is_empty() {
            continue;
        }
        urls.push(validate_url(token)?);
    }
    if urls.is_empty() {
        return Err(anyhow!("empty media list"));
    }
    Ok(urls)
}

fn parse_color(raw: &str) -> anyhow::Result<String> {
    let valid = raw.len() == 7
        && raw.starts_with('#')
        && raw[1..].chars().all(|ch| ch.is_ascii_hexdigit());
    if !valid {
        return Err(anyhow!("invalid color: {raw} (expected #RRGGBB)"));
    }
    Ok(raw.to_string())
}

#[derive(Debug, Clone)]
enum Mod {
    Client(String),
    At(DateTime<FixedOffset>),
    Platforms(Vec<Platform>),
    Media(Vec<String>),
    Status(PostStatus),
    Name(String),
    Industry(String),
    Color(String),
    Logo(String),
    Desc(String),
    Content(String),
    Account(Platform, String),
}

#[instrument(skip(args, now, tz))]
fn parse_text_and_mods(
    args: &[String],
    now: DateTime<Utc>,
    tz: Tz,
) -> anyhow::Result<(String, Vec<Mod>)> {
    let mut text_parts = Vec::new();
    let mut mods = Vec::new();

    let mut literal = false;
    for arg in args {
        if arg == "--" {
            literal = true;
            continue;
        }

        if !literal && let Some(one_mod) = parse_one_mod(arg, now, tz)? {
            mods.push(one_mod);
            continue;
        }

        text_parts.push(arg.clone());
    }

    Ok((text_parts.join(" "), mods))
}

#[instrument(skip(args, now, tz))]
fn parse_mods(args: &[String], now: DateTime<Utc>, tz: Tz) -> anyhow::Result<Vec<Mod>> {
    let mut mods = Vec::new();
    for arg in args {
        if let Some(one_mod) = parse_one_mod(arg, now, tz)? {
            mods.push(one_mod);
        } else {
            warn!(arg = %arg, "unrecognized modifier token ignored");
        }
    }
    Ok(mods)
}

fn parse_one_mod(tok: &str, now: DateTime<Utc>, tz: Tz) -> anyhow::Result<Option<Mod>> {
    let (key, value) = if let Some((k, v)) = tok.split_once(':') {
        (k, v)
    } else if let Some((k, v)) = tok.split_once('=') {
        (k, v)
    } else {
        return Ok(None);
    };

    let key = key.to_ascii_lowercase();

    if let Some(platform) = Platform::parse(&key) {
        return Ok(Some(Mod::Account(platform, value.to_string())));
    }

    match key.as_str() {
        "client" => Ok(Some(Mod::Client(value.to_string()))),
        "at" | "schedule" => Ok(Some(Mod::At(parse_schedule_expr(value, now, tz)?))),
        "platform" | "platforms" => Ok(Some(Mod::Platforms(parse_platform_list(value)?))),
        "media" => Ok(Some(Mod::Media(parse_media_list(value)?))),
        "status" => {
            let status = PostStatus::parse(value)
                .ok_or_else(|| anyhow!("unknown status: {value}"))?;
            Ok(Some(Mod::Status(status)))
        }
        "name" => Ok(Some(Mod::Name(value.to_string()))),
        "industry" => Ok(Some(Mod::Industry(value.to_string()))),
        "color" => Ok(Some(Mod::Color(parse_color(value)?))),
        "logo" => Ok(Some(Mod::Logo(validate_url(value)?))),
        "desc" | "description" => Ok(Some(Mod::Desc(value.to_string()))),
        "content" => Ok(Some(Mod::Content(value.to_string()))),
        _ => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn moscow() -> Tz {
        chrono_tz::Europe::Moscow
    }

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 10, 1, 10, 0, 0)
            .single()
            .expect("valid now")
    }

    #[test]
    fn abbreviations_expand_to_unique_commands() {
        let known = known_command_names();
        assert_eq!(expand_command_abbrev("posts", &known), Some("posts"));
        assert_eq!(expand_command_abbrev("to", &known), Some("today"));
        assert_eq!(expand_command_abbrev("cal", &known), Some("calendar"));
        assert_eq!(expand_command_abbrev("p", &known), None);
        assert_eq!(expand_command_abbrev("client", &known), None);
        assert_eq!(expand_command_abbrev("zzz", &known), None);
    }

    #[test]
    fn text_and_mods_split_on_known_keys() {
        let args: Vec<String> = [
            "Autumn",
            "menu",
            "client:1",
            "at:2025-10-03",
            "platforms:telegram,vk",
            "status:draft",
        ]
        .iter()
        .map(ToString::to_string)
        .collect();

        let (text, mods) = parse_text_and_mods(&args, fixed_now(), moscow()).expect("parsable args");
        assert_eq!(text, "Autumn menu");
        assert_eq!(mods.len(), 4);
        assert!(matches!(&mods[0], Mod::Client(token) if token == "1"));
        assert!(matches!(&mods[1], Mod::At(instant)
            if instant.to_rfc3339() == "2025-10-03T12:00:00+03:00"));
        assert!(matches!(&mods[2], Mod::Platforms(list)
            if *list == vec![Platform::Telegram, Platform::Vk]));
        assert!(matches!(&mods[3], Mod::Status(PostStatus::Draft)));
    }

    #[test]
    fn double_dash_turns_mods_into_text() {
        let args: Vec<String> = ["note", "--", "client:1"]
            .iter()
            .map(ToString::to_string)
            .collect();

        let (text, mods) = parse_text_and_mods(&args, fixed_now(), moscow()).expect("parsable args");
        assert_eq!(text, "note client:1");
        assert!(mods.is_empty());
    }

    #[test]
    fn unknown_keys_fall_back_to_text() {
        let args: Vec<String> = ["read", "https://example.com/page"]
            .iter()
            .map(ToString::to_string)
            .collect();

        let (text, mods) = parse_text_and_mods(&args, fixed_now(), moscow()).expect("parsable args");
        assert_eq!(text, "read https://example.com/page");
        assert!(mods.is_empty());
    }

    #[test]
    fn sanitize_strips_html_tags() {
        assert_eq!(
            sanitize_content("<b>Привет</b> мир<br/>"),
            "Привет мир"
        );
        assert_eq!(sanitize_content("чистый текст"), "чистый текст");
    }

    #[test]
    fn platform_lists_dedupe_and_reject_unknown_names() {
        let parsed = parse_platform_list("telegram, vk,telegram").expect("valid list");
        assert_eq!(parsed, vec![Platform::Telegram, Platform::Vk]);
        assert!(parse_platform_list("myspace").is_err());
        assert!(parse_platform_list(" , ").is_err());
    }

    #[test]
    fn colors_must_be_hex_triplets() {
        assert_eq!(parse_color("#F97316").expect("valid color"), "#F97316");
        assert!(parse_color("F97316").is_err());
        assert!(parse_color("#F973").is_err());
        assert!(parse_color("#F9731G").is_err());
    }
}
