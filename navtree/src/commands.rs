use clap::{arg, command};

pub const DEFAULT_CONFIG_DIR: &str = "~/.config/navtree/";
pub const DEFAULT_DB_PATH: &str = "~/.config/navtree/navtree.db";

pub const CLAP_STYLING: clap::builder::styling::Styles = clap::builder::styling::Styles::styled()
    .header(clap_cargo::style::HEADER)
    .usage(clap_cargo::style::USAGE)
    .literal(clap_cargo::style::LITERAL)
    .placeholder(clap_cargo::style::PLACEHOLDER)
    .error(clap_cargo::style::ERROR)
    .valid(clap_cargo::style::VALID)
    .invalid(clap_cargo::style::INVALID);

fn menu_id_arg() -> clap::Arg {
    arg!(-m --"menu" <MENU_ID>)
        .required(true)
        .help("The id of the menu")
        .value_parser(clap::value_parser!(i64))
}

fn item_id_arg() -> clap::Arg {
    arg!(-i --"id" <ITEM_ID>)
        .required(true)
        .help("The id of the menu item")
        .value_parser(clap::value_parser!(i64))
}

pub fn command_argument_builder() -> clap::Command {
    clap::Command::new("navtree")
        .version(env!("CARGO_PKG_VERSION"))
        .bin_name("navtree")
        .styles(CLAP_STYLING)
        .about("Edit navigation menu trees: items, nesting and drag-and-drop reorders")
        .arg(
            arg!(-q --"quiet" "Suppress non-essential output")
                .required(false)
                .global(true),
        )
        .arg(
            arg!(-v --"verbose" "Log engine activity to stderr")
                .required(false)
                .global(true),
        )
        .arg(
            arg!(--"db" <PATH>)
                .required(false)
                .global(true)
                .help("Location of the navtree database")
                .default_value(DEFAULT_DB_PATH),
        )
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            command!("init")
                .about("Initializes the navtree database on your filesystem")
                .arg(
                    arg!([PATH])
                        .required(false)
                        .help("Directory to store the navtree database in")
                        .default_value(DEFAULT_CONFIG_DIR),
                )
                .arg(
                    arg!(-f --"force")
                        .help("Overwrite any existing database at the specified location.")
                        .required(false),
                ),
        )
        .subcommand(
            command!("menu")
                .about("Manage menus")
                .subcommand_required(true)
                .subcommand(
                    command!("create")
                        .about("Creates a menu")
                        .arg(
                            arg!(-n --"name" <NAME>)
                                .required(true)
                                .help("The name of the menu"),
                        )
                        .arg(
                            arg!(-l --"location" <LOCATION>)
                                .required(false)
                                .help("Where the menu is placed")
                                .value_parser(["header", "footer", "sidebar"])
                                .default_value("header"),
                        ),
                )
                .subcommand(command!("list").about("List all menus"))
                .subcommand(
                    command!("rename")
                        .about("Renames a menu or changes its placement")
                        .arg(menu_id_arg())
                        .arg(
                            arg!(-n --"name" <NAME>)
                                .required(true)
                                .help("The new name of the menu"),
                        )
                        .arg(
                            arg!(-l --"location" <LOCATION>)
                                .required(false)
                                .help("The new placement")
                                .value_parser(["header", "footer", "sidebar"]),
                        ),
                )
                .subcommand(
                    command!("delete")
                        .about("Deletes a menu and all of its items")
                        .arg(menu_id_arg()),
                ),
        )
        .subcommand(
            command!("page")
                .about("Manage the page identifiers that page links may target")
                .subcommand_required(true)
                .subcommand(
                    command!("add")
                        .about("Registers a page identifier")
                        .arg(
                            arg!(-s --"slug" <SLUG>)
                                .required(true)
                                .help("The page identifier"),
                        )
                        .arg(
                            arg!(-t --"title" <TITLE>)
                                .required(false)
                                .help("Human readable page title"),
                        ),
                )
                .subcommand(command!("list").about("List registered pages")),
        )
        .subcommand(
            command!("item")
                .about("Create, edit and delete menu items")
                .subcommand_required(true)
                .subcommand(
                    command!("add")
                        .about("Adds an item to a menu")
                        .arg(menu_id_arg())
                        .arg(
                            arg!(--"json" <BODY>)
                                .required(false)
                                .help("Item payload as JSON, '@FILE', or '-' to read it from stdin")
                                .conflicts_with_all([
                                    "label", "link-type", "target", "parent", "order", "new-tab",
                                    "inactive",
                                ]),
                        )
                        .arg(
                            arg!(-l --"label" <LABEL>)
                                .required_unless_present("json")
                                .help("Display text"),
                        )
                        .arg(
                            arg!(-t --"link-type" <TYPE>)
                                .required_unless_present("json")
                                .help("What the item links to")
                                .value_parser(["page", "url", "dropdown"]),
                        )
                        .arg(
                            arg!(--"target" <TARGET>)
                                .required(false)
                                .help("Page identifier or URL (ignored for dropdowns)"),
                        )
                        .arg(
                            arg!(-p --"parent" <ITEM_ID>)
                                .required(false)
                                .help("Nest the item under this item")
                                .value_parser(clap::value_parser!(i64)),
                        )
                        .arg(
                            arg!(-o --"order" <POSITION>)
                                .required(false)
                                .help("Position among siblings (default: last)")
                                .value_parser(clap::value_parser!(i64)),
                        )
                        .arg(arg!(--"new-tab" "Open the link in a new tab").required(false))
                        .arg(arg!(--"inactive" "Hide the item from the public menu").required(false)),
                )
                .subcommand(
                    command!("edit")
                        .about("Edits an item; only the given fields change")
                        .arg(item_id_arg())
                        .arg(
                            arg!(--"json" <BODY>)
                                .required(false)
                                .help("Full replacement payload as JSON, '@FILE', or '-' for stdin")
                                .conflicts_with_all([
                                    "label", "link-type", "target", "parent", "root", "order",
                                    "new-tab", "active",
                                ]),
                        )
                        .arg(arg!(-l --"label" <LABEL>).required(false).help("Display text"))
                        .arg(
                            arg!(-t --"link-type" <TYPE>)
                                .required(false)
                                .help("What the item links to")
                                .value_parser(["page", "url", "dropdown"]),
                        )
                        .arg(
                            arg!(--"target" <TARGET>)
                                .required(false)
                                .help("Page identifier or URL"),
                        )
                        .arg(
                            arg!(-p --"parent" <ITEM_ID>)
                                .required(false)
                                .help("Move the item under this item")
                                .value_parser(clap::value_parser!(i64))
                                .conflicts_with("root"),
                        )
                        .arg(arg!(--"root" "Move the item to the top level").required(false))
                        .arg(
                            arg!(-o --"order" <POSITION>)
                                .required(false)
                                .help("Position among siblings")
                                .value_parser(clap::value_parser!(i64)),
                        )
                        .arg(
                            arg!(--"new-tab" <BOOL>)
                                .required(false)
                                .help("Open the link in a new tab")
                                .value_parser(clap::value_parser!(bool)),
                        )
                        .arg(
                            arg!(--"active" <BOOL>)
                                .required(false)
                                .help("Show the item in the public menu")
                                .value_parser(clap::value_parser!(bool)),
                        ),
                )
                .subcommand(
                    command!("delete")
                        .about("Deletes an item together with everything nested under it")
                        .arg(item_id_arg()),
                )
                .subcommand(
                    command!("show")
                        .about("Prints an item with its subtree")
                        .arg(item_id_arg()),
                ),
        )
        .subcommand(
            command!("tree")
                .about("Prints the nested tree of a menu as JSON")
                .arg(menu_id_arg())
                .arg(
                    arg!(--"active-only" "Only include items shown on the public site")
                        .required(false),
                ),
        )
        .subcommand(
            command!("reorder")
                .about(
                    "Applies a drag-and-drop reorder batch atomically and prints the \
                resulting tree.",
                )
                .arg(menu_id_arg())
                .arg(
                    arg!(-f --"file" <PATH>)
                        .required(true)
                        .help("JSON array of {id, parent_id, order} entries, or '-' for stdin"),
                ),
        )
}
