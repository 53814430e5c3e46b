use anyhow::{Context, Result};
use clap::ArgMatches;
use colored::Colorize;
use navtree_core::api::{self, ErrorBody, ItemPayload, TreeView};
use navtree_core::{Database, ItemChanges, LinkType, MenuEditor, MenuError, MenuLocation, ReorderEntry};
use serde::Serialize;
use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

pub const DB_FILE_NAME: &str = "navtree.db";

/// Options shared by every subcommand.
#[derive(Debug, Clone)]
pub struct Session {
    pub db_path: PathBuf,
    pub quiet: bool,
}

impl Session {
    pub fn new(db_arg: &str, quiet: bool) -> Self {
        Session {
            db_path: expand_path(db_arg),
            quiet,
        }
    }

    pub fn open(&self) -> Result<Database> {
        open_database(&self.db_path)
    }

    fn status(&self, msg: &str) {
        if !self.quiet {
            eprintln!("{} {}", "✓".green().bold(), msg);
        }
    }
}

// Helper functions

pub fn init_tracing(verbose: bool) {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

/// Expands `~` and environment variables in a user supplied path
pub fn expand_path(raw: &str) -> PathBuf {
    match shellexpand::full(raw) {
        Ok(expanded) => PathBuf::from(expanded.as_ref()),
        Err(_) => PathBuf::from(shellexpand::tilde(raw).as_ref()),
    }
}

pub fn open_database(path: &Path) -> Result<Database> {
    if !Database::exists(path) {
        anyhow::bail!(
            "No database found at {}. Run `navtree init` first or pass --db.",
            path.display()
        );
    }
    debug!(path = %path.display(), "opening database");
    Database::new(path).with_context(|| format!("Failed to open database {}", path.display()))
}

/// Reads a request body from a file, or from stdin when `source` is `-`
pub fn read_body(source: &str) -> Result<String, String> {
    if source == "-" {
        let mut body = String::new();
        io::stdin()
            .read_to_string(&mut body)
            .map_err(|e| format!("Failed to read stdin: {}", e))?;
        return Ok(body);
    }

    fs::read_to_string(source).map_err(|e| format!("Failed to read {}: {}", source, e))
}

/// Inline JSON is used as-is, `-` and `@path` are read first
pub fn resolve_json_arg(raw: &str) -> Result<String, String> {
    if raw == "-" {
        read_body(raw)
    } else if let Some(path) = raw.strip_prefix('@') {
        read_body(path)
    } else {
        Ok(raw.to_string())
    }
}

pub fn load_reorder_batch(source: &str) -> Result<Vec<ReorderEntry>> {
    let body = read_body(source).map_err(anyhow::Error::msg)?;
    Ok(api::parse_reorder(&body)?)
}

/// Builds a create payload from `item add` flags
pub fn payload_from_args(args: &ArgMatches) -> Result<ItemPayload> {
    if let Some(raw) = args.get_one::<String>("json") {
        let body = resolve_json_arg(raw).map_err(anyhow::Error::msg)?;
        return Ok(api::parse_item(&body)?);
    }

    Ok(ItemPayload {
        label: args.get_one::<String>("label").cloned().unwrap_or_default(),
        link_type: args
            .get_one::<String>("link-type")
            .cloned()
            .unwrap_or_default(),
        target: args.get_one::<String>("target").cloned(),
        parent_id: args.get_one::<i64>("parent").copied(),
        open_new_tab: args.get_flag("new-tab"),
        is_active: !args.get_flag("inactive"),
        sort_order: args.get_one::<i64>("order").copied(),
    })
}

/// Builds a partial edit from `item edit` flags; absent flags leave fields alone
pub fn changes_from_args(args: &ArgMatches) -> Result<ItemChanges, MenuError> {
    let link_type = args
        .get_one::<String>("link-type")
        .map(|raw| raw.parse::<LinkType>())
        .transpose()?;
    let parent_id = if args.get_flag("root") {
        Some(None)
    } else {
        args.get_one::<i64>("parent").map(|id| Some(*id))
    };

    Ok(ItemChanges {
        label: args.get_one::<String>("label").cloned(),
        link_type,
        target: args.get_one::<String>("target").cloned(),
        parent_id,
        open_new_tab: args.get_one::<bool>("new-tab").copied(),
        is_active: args.get_one::<bool>("active").copied(),
        sort_order: args.get_one::<i64>("order").copied(),
    })
}

pub fn render_error(err: &anyhow::Error) -> Option<String> {
    let menu_err = err.downcast_ref::<MenuError>()?;
    serde_json::to_string_pretty(&ErrorBody::from(menu_err)).ok()
}

/// Prints a failed command: the error body on stdout for engine errors, a message on stderr
pub fn report_failure(err: &anyhow::Error) {
    if let Some(body) = render_error(err) {
        println!("{}", body);
    }
    eprintln!("{} {:#}", "✗".red().bold(), err);
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_divider() {
    eprintln!("{}", "═".repeat(60).bright_blue().bold());
}

fn print_prompt(msg: &str) -> Result<String> {
    eprint!("{} ", msg.bright_cyan().bold());
    io::stderr().flush()?;
    let mut response = String::new();
    io::stdin().read_line(&mut response)?;
    Ok(response.trim().to_lowercase())
}

fn parse_location(args: &ArgMatches) -> Result<Option<MenuLocation>> {
    Ok(args
        .get_one::<String>("location")
        .map(|raw| raw.parse::<MenuLocation>())
        .transpose()?)
}

fn required<'a, T: Clone + Send + Sync + 'static>(args: &'a ArgMatches, name: &str) -> Result<&'a T> {
    args.get_one::<T>(name)
        .with_context(|| format!("missing required argument --{}", name))
}

// Command handlers

pub fn handle_init(session: &Session, args: &ArgMatches) -> Result<()> {
    if !session.quiet {
        print_divider();
        eprintln!("{}", "  NAVTREE INITIALIZATION".bright_white().bold());
        print_divider();
        eprintln!();
    }

    let config_dir = expand_path(required::<String>(args, "PATH")?);
    let force = args.get_flag("force");
    let db_path = config_dir.join(DB_FILE_NAME);

    if Database::exists(&db_path) {
        if !force {
            eprintln!("{}", "⚠ WARNING".yellow().bold());
            eprintln!(
                "A database already exists at {}",
                db_path.display().to_string().bright_white()
            );
            let response = print_prompt("Replace it and lose every menu? [y/N]:")?;
            if response != "y" && response != "yes" {
                eprintln!("{} Initialization cancelled.", "✗".red().bold());
                return Ok(());
            }
        }
        Database::drop(&db_path)
            .with_context(|| format!("Failed to remove {}", db_path.display()))?;
        session.status("Removed existing database");
    }

    fs::create_dir_all(&config_dir)
        .with_context(|| format!("Failed to create {}", config_dir.display()))?;
    Database::new(&db_path)
        .with_context(|| format!("Failed to create database {}", db_path.display()))?;

    session.status(&format!("Database created at {}", db_path.display()));
    if !session.quiet && db_path != session.db_path {
        eprintln!(
            "{} Pass {} to use it",
            "→".blue(),
            format!("--db {}", db_path.display()).bright_white()
        );
    }
    Ok(())
}

pub fn handle_menu_create(session: &Session, args: &ArgMatches) -> Result<()> {
    let db = session.open()?;
    let name = required::<String>(args, "name")?;
    let location = parse_location(args)?.unwrap_or(MenuLocation::Header);

    let menu = db.create_menu(name, location)?;
    session.status(&format!("Created menu {} ({})", menu.name, menu.id));
    print_json(&menu)
}

pub fn handle_menu_list(session: &Session) -> Result<()> {
    let db = session.open()?;
    let menus = db.list_menus()?;
    if menus.is_empty() {
        session.status("No menus yet");
    }
    print_json(&menus)
}

pub fn handle_menu_rename(session: &Session, args: &ArgMatches) -> Result<()> {
    let db = session.open()?;
    let menu_id = *required::<i64>(args, "menu")?;
    let name = required::<String>(args, "name")?;

    let menu = db.rename_menu(menu_id, name, parse_location(args)?)?;
    session.status(&format!("Menu {} is now '{}'", menu.id, menu.name));
    print_json(&menu)
}

pub fn handle_menu_delete(session: &Session, args: &ArgMatches) -> Result<()> {
    let mut db = session.open()?;
    let menu_id = *required::<i64>(args, "menu")?;

    let removed = db.delete_menu(menu_id)?;
    session.status(&format!("Deleted menu {} and {} item(s)", menu_id, removed));
    print_json(&serde_json::json!({ "menu_id": menu_id, "removed_items": removed }))
}

pub fn handle_page_add(session: &Session, args: &ArgMatches) -> Result<()> {
    let db = session.open()?;
    let slug = required::<String>(args, "slug")?;
    let title = args.get_one::<String>("title").map(String::as_str).unwrap_or("");

    let page = db.add_page(slug, title)?;
    session.status(&format!("Registered page {}", page.slug));
    print_json(&page)
}

pub fn handle_page_list(session: &Session) -> Result<()> {
    let db = session.open()?;
    print_json(&db.list_pages()?)
}

pub fn handle_item_add(session: &Session, args: &ArgMatches) -> Result<()> {
    let mut db = session.open()?;
    let pages = db.page_registry()?;
    let menu_id = *required::<i64>(args, "menu")?;
    let payload = payload_from_args(args)?;

    let node = api::create_item(&mut db, &pages, menu_id, payload)?;
    session.status(&format!("Created item {} in menu {}", node.id, menu_id));
    print_json(&node)
}

pub fn handle_item_edit(session: &Session, args: &ArgMatches) -> Result<()> {
    let mut db = session.open()?;
    let pages = db.page_registry()?;
    let item_id = *required::<i64>(args, "id")?;

    let node = if let Some(raw) = args.get_one::<String>("json") {
        let body = resolve_json_arg(raw).map_err(anyhow::Error::msg)?;
        api::replace_item(&mut db, &pages, item_id, api::parse_item(&body)?)?
    } else {
        let changes = changes_from_args(args)?;
        if changes.is_empty() {
            session.status("Nothing to change");
            return print_json(&api::fetch_node(&db, item_id)?);
        }
        MenuEditor::new(&mut db, &pages).update(item_id, changes)?;
        api::fetch_node(&db, item_id)?
    };

    session.status(&format!("Updated item {}", item_id));
    print_json(&node)
}

pub fn handle_item_delete(session: &Session, args: &ArgMatches) -> Result<()> {
    let mut db = session.open()?;
    let pages = db.page_registry()?;
    let item_id = *required::<i64>(args, "id")?;

    let removed = api::delete_item(&mut db, &pages, item_id)?;
    session.status(&format!("Deleted {} item(s)", removed.len()));
    print_json(&serde_json::json!({ "deleted": removed }))
}

pub fn handle_item_show(session: &Session, args: &ArgMatches) -> Result<()> {
    let db = session.open()?;
    let item_id = *required::<i64>(args, "id")?;
    print_json(&api::fetch_node(&db, item_id)?)
}

pub fn handle_tree(session: &Session, args: &ArgMatches) -> Result<()> {
    let db = session.open()?;
    let menu_id = *required::<i64>(args, "menu")?;
    let view = if args.get_flag("active-only") {
        TreeView::Public
    } else {
        TreeView::Admin
    };
    print_json(&api::fetch_tree(&db, menu_id, view)?)
}

pub fn handle_reorder(session: &Session, args: &ArgMatches) -> Result<()> {
    let mut db = session.open()?;
    let pages = db.page_registry()?;
    let menu_id = *required::<i64>(args, "menu")?;
    let batch = load_reorder_batch(required::<String>(args, "file")?)?;

    let tree = api::reorder(&mut db, &pages, menu_id, &batch)?;
    session.status(&format!("Applied {} move(s) to menu {}", batch.len(), menu_id));
    print_json(&tree)
}
