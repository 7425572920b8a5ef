//! Command-line front end for the todo service.
//!
//! Every invocation opens the file-backed credential store, so a login in
//! one run is the session of the next.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use todo_core::{App, AuthState, Config, ConfigOverrides, RequestState, TodoState};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "todo", about = "Manage your todo list from the terminal")]
struct Cli {
    /// Base URL of the todo API [env: TODO_API_URL]
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// API key sent with every request [env: TODO_API_KEY]
    #[arg(long, global = true)]
    api_key: Option<String>,

    /// Where the session is stored [env: TODO_CREDENTIALS_PATH]
    #[arg(long, global = true)]
    credentials: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create an account and sign in
    Register {
        name: String,
        email: String,
        password: String,
    },
    /// Sign in to an existing account
    Login { email: String, password: String },
    /// Forget the stored session
    Logout,
    /// Show whether a session is stored
    Status,
    /// List your todos
    List,
    /// Add a todo
    Add { text: String },
    /// Flip a todo between open and done
    Toggle { id: String },
    /// Delete a todo
    Delete { id: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = Config::load(ConfigOverrides {
        base_url: cli.api_url,
        api_key: cli.api_key,
        credentials_path: cli.credentials,
    })?;
    tracing::debug!(?config, "resolved configuration");

    let app = App::from_config(&config)
        .await
        .context("failed to open credential store")?;

    let ok = match cli.command {
        Command::Register {
            name,
            email,
            password,
        } => report_request(app.register(&name, &email, &password).await, &app),
        Command::Login { email, password } => report_request(app.login(&email, &password).await, &app),
        Command::Logout => {
            app.logout().await;
            println!("Logged out.");
            true
        }
        Command::Status => {
            let mut status = app.session().subscribe();
            let state = *status.wait_for(|s| *s != AuthState::Loading).await?;
            match (state, app.store().user_id().await) {
                (AuthState::Authenticated, Some(user_id)) => println!("Signed in as {user_id}."),
                _ => println!("Not signed in."),
            }
            true
        }
        Command::List => {
            app.todos().refresh().await;
            report_todos(&app.todos().state())
        }
        Command::Add { text } => {
            if text.trim().is_empty() {
                bail!("todo text must not be empty");
            }
            app.todos().add(&text).await;
            report_todos(&app.todos().state())
        }
        Command::Toggle { id } => {
            // The list has to be loaded before an item can be looked up.
            app.todos().refresh().await;
            if app.todos().error().is_none() {
                app.todos().toggle_completion(&id).await;
            }
            report_todos(&app.todos().state())
        }
        Command::Delete { id } => {
            app.todos().refresh().await;
            if app.todos().error().is_none() {
                app.todos().delete(&id).await;
            }
            report_todos(&app.todos().state())
        }
    };

    Ok(if ok { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}

fn report_request(state: RequestState, app: &App) -> bool {
    match state {
        RequestState::Success => {
            println!("Signed in.");
            report_todos(&app.todos().state())
        }
        RequestState::Error(message) => {
            eprintln!("{message}");
            false
        }
        RequestState::Idle | RequestState::Loading => true,
    }
}

fn report_todos(state: &TodoState) -> bool {
    if let Some(error) = &state.error {
        eprintln!("{error}");
        return false;
    }
    if state.items.is_empty() {
        println!("No todos.");
    }
    for item in &state.items {
        let mark = if item.completed { "x" } else { " " };
        println!("[{mark}] {}  {}", item.id, item.text);
    }
    true
}
