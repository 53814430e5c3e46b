// Tests for CLI argument handling and command handlers

use clap::ArgMatches;
use navtree::commands::command_argument_builder;
use navtree::handlers::{self, DB_FILE_NAME, Session};
use navtree_core::api::{self, TreeView};
use navtree_core::{Database, LinkType, MenuError, MenuLocation};
use std::io::Write;
use std::process::Command;
use tempfile::{NamedTempFile, TempDir};

fn matches(args: &[&str]) -> ArgMatches {
    let mut argv = vec!["navtree"];
    argv.extend_from_slice(args);
    command_argument_builder()
        .try_get_matches_from(argv)
        .unwrap()
}

fn sub<'a>(m: &'a ArgMatches, path: &[&str]) -> &'a ArgMatches {
    path.iter()
        .fold(m, |acc, name| acc.subcommand_matches(name).unwrap())
}

fn session_with_db() -> (TempDir, Session) {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join(DB_FILE_NAME);
    Database::new(&db_path).unwrap();
    let session = Session::new(db_path.to_str().unwrap(), true);
    (temp_dir, session)
}

// ============================================================================
// Command Line Parsing Tests
// ============================================================================

#[test]
fn test_global_flags_after_subcommand() {
    let m = matches(&["tree", "--menu", "3", "-q", "--db", "/tmp/menus.db"]);
    assert!(m.get_flag("quiet"));
    assert_eq!(m.get_one::<String>("db").unwrap(), "/tmp/menus.db");
    assert_eq!(*sub(&m, &["tree"]).get_one::<i64>("menu").unwrap(), 3);
}

#[test]
fn test_item_add_requires_label_without_json() {
    let err = command_argument_builder()
        .try_get_matches_from(["navtree", "item", "add", "--menu", "1", "-t", "url"])
        .unwrap_err();
    assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);

    let m = matches(&["item", "add", "--menu", "1", "--json", "{}"]);
    assert!(sub(&m, &["item", "add"]).get_one::<String>("label").is_none());
}

#[test]
fn test_item_add_json_conflicts_with_field_flags() {
    for flag in [
        vec!["--target", "/docs"],
        vec!["--parent", "2"],
        vec!["--order", "1"],
        vec!["--new-tab"],
        vec!["--inactive"],
    ] {
        let mut argv = vec!["navtree", "item", "add", "--menu", "1", "--json", "{}"];
        argv.extend(flag.iter().copied());
        let err = command_argument_builder()
            .try_get_matches_from(argv)
            .unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ArgumentConflict, "{:?}", flag);
    }
}

#[test]
fn test_item_edit_root_conflicts_with_parent() {
    let result = command_argument_builder().try_get_matches_from([
        "navtree", "item", "edit", "--id", "4", "--root", "--parent", "2",
    ]);
    assert!(result.is_err());
}

#[test]
fn test_unknown_location_rejected_by_parser() {
    let result = command_argument_builder()
        .try_get_matches_from(["navtree", "menu", "create", "-n", "Top", "-l", "banner"]);
    assert!(result.is_err());
}

// ============================================================================
// Argument Conversion Tests
// ============================================================================

#[test]
fn test_payload_from_flags() {
    let m = matches(&[
        "item", "add", "--menu", "2", "-l", "Docs", "-t", "url", "--target", "/docs", "-p", "9",
        "--new-tab", "--inactive",
    ]);
    let payload = handlers::payload_from_args(sub(&m, &["item", "add"])).unwrap();

    assert_eq!(payload.label, "Docs");
    assert_eq!(payload.link_type, "url");
    assert_eq!(payload.target.as_deref(), Some("/docs"));
    assert_eq!(payload.parent_id, Some(9));
    assert!(payload.open_new_tab);
    assert!(!payload.is_active);
    assert_eq!(payload.sort_order, None);
}

#[test]
fn test_payload_from_inline_json() {
    let m = matches(&[
        "item",
        "add",
        "--menu",
        "2",
        "--json",
        r#"{"label": "Shop", "link_type": "dropdown", "sort_order": 1}"#,
    ]);
    let payload = handlers::payload_from_args(sub(&m, &["item", "add"])).unwrap();
    assert_eq!(payload.label, "Shop");
    assert_eq!(payload.sort_order, Some(1));
    assert!(payload.is_active);
}

#[test]
fn test_payload_from_json_file() {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, r#"{{"label": "Home", "link_type": "page", "target": "home"}}"#).unwrap();
    let arg = format!("@{}", file.path().display());

    let m = matches(&["item", "add", "--menu", "1", "--json", &arg]);
    let payload = handlers::payload_from_args(sub(&m, &["item", "add"])).unwrap();
    assert_eq!(payload.target.as_deref(), Some("home"));
}

#[test]
fn test_changes_only_touch_given_fields() {
    let m = matches(&["item", "edit", "--id", "5", "-l", "Renamed", "--active", "false"]);
    let changes = handlers::changes_from_args(sub(&m, &["item", "edit"])).unwrap();

    assert_eq!(changes.label.as_deref(), Some("Renamed"));
    assert_eq!(changes.is_active, Some(false));
    assert!(changes.link_type.is_none());
    assert!(changes.parent_id.is_none());
    assert!(!changes.touches_link());
}

#[test]
fn test_changes_move_to_root_and_parent() {
    let m = matches(&["item", "edit", "--id", "5", "--root"]);
    let changes = handlers::changes_from_args(sub(&m, &["item", "edit"])).unwrap();
    assert_eq!(changes.parent_id, Some(None));

    let m = matches(&["item", "edit", "--id", "5", "-p", "8", "-t", "dropdown"]);
    let changes = handlers::changes_from_args(sub(&m, &["item", "edit"])).unwrap();
    assert_eq!(changes.parent_id, Some(Some(8)));
    assert_eq!(changes.link_type, Some(LinkType::Dropdown));
}

// ============================================================================
// Input Loading Tests
// ============================================================================

#[test]
fn test_load_reorder_batch_from_file() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"[{{"id": 1, "parent_id": null, "order": 0}}, {{"id": 2, "parent_id": 1, "order": 0}}]"#
    )
    .unwrap();

    let batch = handlers::load_reorder_batch(file.path().to_str().unwrap()).unwrap();
    assert_eq!(batch.len(), 2);
    assert_eq!(batch[1].parent_id, Some(1));
}

#[test]
fn test_load_reorder_batch_malformed() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "not json").unwrap();

    let err = handlers::load_reorder_batch(file.path().to_str().unwrap()).unwrap_err();
    let menu_err = err.downcast_ref::<MenuError>().unwrap();
    assert_eq!(menu_err.status_code(), 400);
}

#[test]
fn test_read_body_missing_file() {
    let result = handlers::read_body("/nonexistent/batch.json");
    assert!(result.is_err());
    assert!(result.unwrap_err().contains("Failed to read"));
}

#[test]
fn test_resolve_json_arg_inline() {
    assert_eq!(handlers::resolve_json_arg("[]").unwrap(), "[]");
}

#[test]
fn test_expand_path_tilde() {
    let expanded = handlers::expand_path("~/menus.db");
    assert!(!expanded.to_string_lossy().starts_with('~'));
    assert!(expanded.ends_with("menus.db"));
}

#[test]
fn test_open_missing_database() {
    let temp_dir = TempDir::new().unwrap();
    let err = handlers::open_database(&temp_dir.path().join("absent.db")).unwrap_err();
    assert!(err.to_string().contains("navtree init"));
}

// ============================================================================
// Error Rendering Tests
// ============================================================================

#[test]
fn test_render_engine_error_as_body() {
    let err = anyhow::Error::from(MenuError::not_found("Menu", 12));
    let body: serde_json::Value =
        serde_json::from_str(&handlers::render_error(&err).unwrap()).unwrap();
    assert_eq!(body["status"], 404);
    assert_eq!(body["error"], "not_found");
}

#[test]
fn test_render_plain_error_has_no_body() {
    let err = anyhow::anyhow!("disk on fire");
    assert!(handlers::render_error(&err).is_none());
}

// ============================================================================
// Handler Tests
// ============================================================================

#[test]
fn test_init_creates_database() {
    let temp_dir = TempDir::new().unwrap();
    let config_dir = temp_dir.path().join("config");
    let dir_arg = config_dir.to_str().unwrap();
    let session = Session::new(dir_arg, true);

    let m = matches(&["init", dir_arg, "--force"]);
    handlers::handle_init(&session, sub(&m, &["init"])).unwrap();
    assert!(Database::exists(&config_dir.join(DB_FILE_NAME)));

    // Force replaces the existing database
    let db = Database::new(&config_dir.join(DB_FILE_NAME)).unwrap();
    db.create_menu("Old", MenuLocation::Header).unwrap();
    drop(db);
    handlers::handle_init(&session, sub(&m, &["init"])).unwrap();
    let db = Database::new(&config_dir.join(DB_FILE_NAME)).unwrap();
    assert!(db.list_menus().unwrap().is_empty());
}

#[test]
fn test_handlers_edit_a_menu_end_to_end() {
    let (_temp_dir, session) = session_with_db();

    let m = matches(&["menu", "create", "-n", "Main", "-l", "footer"]);
    handlers::handle_menu_create(&session, sub(&m, &["menu", "create"])).unwrap();
    let menu_id = session.open().unwrap().list_menus().unwrap()[0].id;
    let menu = menu_id.to_string();

    let m = matches(&["page", "add", "-s", "home", "-t", "Home"]);
    handlers::handle_page_add(&session, sub(&m, &["page", "add"])).unwrap();

    let m = matches(&["item", "add", "--menu", &menu, "-l", "Company", "-t", "dropdown"]);
    handlers::handle_item_add(&session, sub(&m, &["item", "add"])).unwrap();
    let m = matches(&[
        "item", "add", "--menu", &menu, "-l", "Home", "-t", "page", "--target", "home",
    ]);
    handlers::handle_item_add(&session, sub(&m, &["item", "add"])).unwrap();

    let db = session.open().unwrap();
    let tree = api::fetch_tree(&db, menu_id, TreeView::Admin).unwrap();
    let (company, home) = (tree[0].id, tree[1].id);
    drop(db);

    let mut file = NamedTempFile::new().unwrap();
    write!(
        file,
        r#"[{{"id": {home}, "parent_id": {company}, "order": 0}}]"#
    )
    .unwrap();
    let m = matches(&["reorder", "--menu", &menu, "-f", file.path().to_str().unwrap()]);
    handlers::handle_reorder(&session, sub(&m, &["reorder"])).unwrap();

    let m = matches(&["item", "edit", "--id", &company.to_string(), "--active", "false"]);
    handlers::handle_item_edit(&session, sub(&m, &["item", "edit"])).unwrap();

    let db = session.open().unwrap();
    let admin = api::fetch_tree(&db, menu_id, TreeView::Admin).unwrap();
    assert_eq!(admin.len(), 1);
    assert_eq!(admin[0].children[0].id, home);
    assert!(api::fetch_tree(&db, menu_id, TreeView::Public).unwrap().is_empty());
    drop(db);

    let m = matches(&["item", "delete", "--id", &company.to_string()]);
    handlers::handle_item_delete(&session, sub(&m, &["item", "delete"])).unwrap();
    let db = session.open().unwrap();
    assert!(db.items().list_by_menu(menu_id).unwrap().is_empty());
}

#[test]
fn test_handler_surfaces_engine_error() {
    let (_temp_dir, session) = session_with_db();
    let db = session.open().unwrap();
    let menu_id = db.create_menu("Main", MenuLocation::Header).unwrap().id;
    drop(db);

    let m = matches(&[
        "item",
        "add",
        "--menu",
        &menu_id.to_string(),
        "-l",
        "Home",
        "-t",
        "page",
        "--target",
        "unregistered",
    ]);
    let err = handlers::handle_item_add(&session, sub(&m, &["item", "add"])).unwrap_err();
    let menu_err = err.downcast_ref::<MenuError>().unwrap();
    assert!(matches!(menu_err, MenuError::Validation { field, .. } if field == "target"));
}

#[test]
fn test_rejected_reorder_leaves_menu_untouched() {
    let (_temp_dir, session) = session_with_db();
    let mut db = session.open().unwrap();
    let pages = db.page_registry().unwrap();
    let menu_id = db.create_menu("Main", MenuLocation::Header).unwrap().id;
    let parent = api::create_item(
        &mut db,
        &pages,
        menu_id,
        api::parse_item(r#"{"label": "Parent", "link_type": "dropdown"}"#).unwrap(),
    )
    .unwrap();
    let child = api::create_item(
        &mut db,
        &pages,
        menu_id,
        api::parse_item(&format!(
            r#"{{"label": "Child", "link_type": "dropdown", "parent_id": {}}}"#,
            parent.id
        ))
        .unwrap(),
    )
    .unwrap();
    let before = db.items().list_by_menu(menu_id).unwrap();
    drop(db);

    let mut file = NamedTempFile::new().unwrap();
    write!(
        file,
        r#"[{{"id": {}, "parent_id": {}, "order": 0}}]"#,
        parent.id, child.id
    )
    .unwrap();
    let m = matches(&[
        "reorder",
        "--menu",
        &menu_id.to_string(),
        "-f",
        file.path().to_str().unwrap(),
    ]);
    let err = handlers::handle_reorder(&session, sub(&m, &["reorder"])).unwrap_err();

    let body: serde_json::Value =
        serde_json::from_str(&handlers::render_error(&err).unwrap()).unwrap();
    assert_eq!(body["error"], "reorder_rejected");
    assert_eq!(body["cause"], "cycle_detected");

    let db = session.open().unwrap();
    assert_eq!(db.items().list_by_menu(menu_id).unwrap(), before);
}

#[test]
fn test_item_edit_without_changes_leaves_item_alone() {
    let (_temp_dir, session) = session_with_db();
    let mut db = session.open().unwrap();
    let pages = db.page_registry().unwrap();
    let menu_id = db.create_menu("Main", MenuLocation::Header).unwrap().id;
    let node = api::create_item(
        &mut db,
        &pages,
        menu_id,
        api::parse_item(r#"{"label": "Shop", "link_type": "dropdown"}"#).unwrap(),
    )
    .unwrap();
    let before = db.items().get(node.id).unwrap();
    drop(db);

    let m = matches(&["item", "edit", "--id", &node.id.to_string()]);
    handlers::handle_item_edit(&session, sub(&m, &["item", "edit"])).unwrap();

    let db = session.open().unwrap();
    assert_eq!(db.items().get(node.id).unwrap(), before);
}

// ============================================================================
// Binary Output Tests
// ============================================================================

fn run_navtree(args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_navtree"))
        .args(args)
        .output()
        .unwrap()
}

#[test]
fn test_init_keeps_stdout_clean() {
    let temp_dir = TempDir::new().unwrap();
    let config_dir = temp_dir.path().join("config");
    let db_path = config_dir.join(DB_FILE_NAME);

    let output = run_navtree(&[
        "--db",
        temp_dir.path().join("elsewhere.db").to_str().unwrap(),
        "init",
        config_dir.to_str().unwrap(),
    ]);

    assert!(output.status.success());
    assert!(output.stdout.is_empty());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("NAVTREE INITIALIZATION"));
    assert!(stderr.contains("Pass"));
    assert!(Database::exists(&db_path));
}

#[test]
fn test_empty_edit_reports_once() {
    let (_temp_dir, session) = session_with_db();
    let mut db = session.open().unwrap();
    let pages = db.page_registry().unwrap();
    let menu_id = db.create_menu("Main", MenuLocation::Header).unwrap().id;
    let node = api::create_item(
        &mut db,
        &pages,
        menu_id,
        api::parse_item(r#"{"label": "Shop", "link_type": "dropdown"}"#).unwrap(),
    )
    .unwrap();
    drop(db);

    let output = run_navtree(&[
        "--db",
        session.db_path.to_str().unwrap(),
        "item",
        "edit",
        "--id",
        &node.id.to_string(),
    ]);

    assert!(output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Nothing to change"));
    assert!(!stderr.contains("Updated item"));
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["id"], node.id);
}
