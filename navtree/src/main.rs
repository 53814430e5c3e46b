use navtree::commands::{DEFAULT_DB_PATH, command_argument_builder};
use navtree::handlers::{self, Session};

fn main() {
    let cmd = command_argument_builder();
    let chosen_command = cmd.get_matches();
    let quiet = chosen_command.get_flag("quiet");
    handlers::init_tracing(chosen_command.get_flag("verbose"));

    let db_arg = chosen_command
        .get_one::<String>("db")
        .map(String::as_str)
        .unwrap_or(DEFAULT_DB_PATH);
    let session = Session::new(db_arg, quiet);

    let result = match chosen_command.subcommand() {
        Some(("init", primary_command)) => handlers::handle_init(&session, primary_command),
        Some(("menu", primary_command)) => match primary_command.subcommand() {
            Some(("create", secondary_command)) => {
                handlers::handle_menu_create(&session, secondary_command)
            }
            Some(("list", _)) => handlers::handle_menu_list(&session),
            Some(("rename", secondary_command)) => {
                handlers::handle_menu_rename(&session, secondary_command)
            }
            Some(("delete", secondary_command)) => {
                handlers::handle_menu_delete(&session, secondary_command)
            }
            _ => unreachable!("clap should ensure we don't get here"),
        },
        Some(("page", primary_command)) => match primary_command.subcommand() {
            Some(("add", secondary_command)) => handlers::handle_page_add(&session, secondary_command),
            Some(("list", _)) => handlers::handle_page_list(&session),
            _ => unreachable!("clap should ensure we don't get here"),
        },
        Some(("item", primary_command)) => match primary_command.subcommand() {
            Some(("add", secondary_command)) => handlers::handle_item_add(&session, secondary_command),
            Some(("edit", secondary_command)) => {
                handlers::handle_item_edit(&session, secondary_command)
            }
            Some(("delete", secondary_command)) => {
                handlers::handle_item_delete(&session, secondary_command)
            }
            Some(("show", secondary_command)) => {
                handlers::handle_item_show(&session, secondary_command)
            }
            _ => unreachable!("clap should ensure we don't get here"),
        },
        Some(("tree", primary_command)) => handlers::handle_tree(&session, primary_command),
        Some(("reorder", primary_command)) => handlers::handle_reorder(&session, primary_command),
        _ => unreachable!("clap should ensure we don't get here"),
    };

    if let Err(e) = result {
        handlers::report_failure(&e);
        std::process::exit(1);
    }
}
