//! Operator CLI over a SQLite-backed user registry.
//!
//! # Responsibility
//! - Run the same use-cases as the mobile screens against a local store.
//! - Exit non-zero on validation or registry failures.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use usermgr_core::{
    init_logging_from_config, AppConfig, PageWindow, PersistStatus, RemoveOutcome, SqliteKvStore,
    UserDraft, UserService,
};
use uuid::Uuid;

#[derive(Debug, Parser)]
#[command(name = "usermgr", version, about = "Manage the local user list")]
struct Cli {
    /// Store file; defaults to `USERMGR_DB_PATH` or the temp-dir store.
    #[arg(long)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List users whose full name contains QUERY.
    List {
        #[arg(default_value = "")]
        query: String,
        /// Rows to show; defaults to `USERMGR_PAGE_SIZE`.
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Add a user.
    Add {
        first_name: String,
        last_name: String,
        email: String,
    },
    /// Replace a user's fields.
    Edit {
        id: Uuid,
        first_name: String,
        last_name: String,
        email: String,
    },
    /// Delete one user by ID.
    Delete { id: Uuid },
    /// Delete every user.
    DeleteAll,
    /// Seed `First{i} Last{i}` sample users into an empty store.
    Seed {
        #[arg(default_value_t = 100)]
        count: usize,
    },
    /// Add users with random example.com emails.
    Random {
        #[arg(default_value_t = 100)]
        count: usize,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let config = AppConfig::from_env();
    if let Err(err) = init_logging_from_config(&config) {
        eprintln!("warning: logging disabled: {err}");
    }

    let db_path = cli.db.clone().unwrap_or_else(|| config.db_path.clone());
    let store = match SqliteKvStore::open(&db_path) {
        Ok(store) => store,
        Err(err) => {
            eprintln!("error: cannot open `{}`: {err}", db_path.display());
            return ExitCode::FAILURE;
        }
    };
    let mut service = UserService::open(store);

    let code = run(&mut service, cli.command, config.page_size);
    if let PersistStatus::Failed(message) = service.registry().persist_status() {
        eprintln!("warning: changes were not saved: {message}");
        return ExitCode::FAILURE;
    }
    code
}

fn run(service: &mut UserService<SqliteKvStore>, command: Command, page_size: usize) -> ExitCode {
    match command {
        Command::List { query, limit } => {
            let window = PageWindow::new(limit.unwrap_or(page_size));
            let page = service.search(&query, &window);
            if page.items.is_empty() {
                println!("No users found");
            }
            for user in &page.items {
                println!("{}  {}  {}", user.id, user.full_name(), user.email);
            }
            if page.has_more {
                println!("... {} more", page.total_matches - page.items.len());
            }
            ExitCode::SUCCESS
        }
        Command::Add {
            first_name,
            last_name,
            email,
        } => submit(service, None, UserDraft::new(first_name, last_name, email)),
        Command::Edit {
            id,
            first_name,
            last_name,
            email,
        } => submit(service, Some(id), UserDraft::new(first_name, last_name, email)),
        Command::Delete { id } => {
            match service.delete_user(id) {
                RemoveOutcome::Removed(_) => println!("deleted {id}"),
                RemoveOutcome::Absent => println!("no user with id {id}"),
            }
            ExitCode::SUCCESS
        }
        Command::DeleteAll => {
            println!("deleted {} user(s)", service.delete_all());
            ExitCode::SUCCESS
        }
        Command::Seed { count } => {
            println!("seeded {} user(s)", service.seed_sample_users(count));
            ExitCode::SUCCESS
        }
        Command::Random { count } => {
            println!("added {} user(s)", service.add_random_users(count).len());
            ExitCode::SUCCESS
        }
    }
}

fn submit(
    service: &mut UserService<SqliteKvStore>,
    editing: Option<Uuid>,
    draft: UserDraft,
) -> ExitCode {
    match service.submit(editing, &draft) {
        Ok(id) => {
            println!("{id}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}
