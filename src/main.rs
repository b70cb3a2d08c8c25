use campus_session::{
    AppState, GuardOutcome, SessionError,
    config::{AppConfig, Env},
    guard,
    routes::{menu, role_label},
};
use clap::{Parser, Subcommand};
use std::process::ExitCode;
use tokio::sync::broadcast::error::TryRecvError;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line front end for the campus events session client.
#[derive(Parser)]
#[command(name = "campus-session", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Sign in and persist the session.
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Sign out and clear the persisted session.
    Logout,
    /// Create an account (does not sign in).
    Register {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        #[arg(long, default_value = "student")]
        role: String,
    },
    /// Show the signed-in identity.
    Whoami,
    /// Run the route guard for a path.
    Check { path: String },
    /// Show the navigation links for the current identity.
    Menu,
    /// List accounts (administrators only).
    Users {
        #[arg(long, default_value_t = 0)]
        skip: u32,
        #[arg(long, default_value_t = 1000)]
        limit: u32,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenv::dotenv().ok();
    let config = AppConfig::load();

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "campus_session=info".into());

    match config.env {
        Env::Local => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty().with_writer(std::io::stderr))
                .init();
        }
        Env::Production => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
    }

    let cli = Cli::parse();

    tracing::debug!(api_url = %config.api_url, "Client starting in {:?} mode", config.env);

    let app = match AppState::build(config).await {
        Ok(app) => app,
        Err(e) => {
            tracing::error!(error = %e, "Could not initialise the API client");
            return ExitCode::FAILURE;
        }
    };

    let mut notifications = app.session.notifier().subscribe();
    let result = run(&app, cli.command).await;

    loop {
        match notifications.try_recv() {
            Ok(n) => println!("[{}] {}", n.title, n.description),
            Err(TryRecvError::Lagged(_)) => continue,
            Err(_) => break,
        }
    }

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::debug!(error = ?e, "Command failed");
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(app: &AppState, command: Command) -> Result<(), SessionError> {
    match command {
        Command::Login { email, password } => {
            let identity = app.session.login(&email, &password).await?;
            println!(
                "Signed in as {} ({}); continue at {}",
                identity.username,
                role_label(&identity),
                guard::post_login_route(&identity)
            );
        }
        Command::Logout => app.session.logout().await?,
        Command::Register {
            name,
            email,
            password,
            role,
        } => app.session.register(&name, &email, &password, &role).await?,
        Command::Whoami => match app.session.identity() {
            Some(identity) => println!(
                "{} <{}> id={} role={}",
                identity.username,
                identity.email,
                identity.id,
                role_label(&identity)
            ),
            None => println!("Not signed in"),
        },
        Command::Check { path } => {
            let navigation = app.navigate(&path);
            match navigation.outcome {
                GuardOutcome::Render => println!("render {:?}", navigation.view),
                GuardOutcome::Redirect { to, reason } => {
                    println!("redirect to {} ({:?})", to, reason)
                }
            }
        }
        Command::Menu => {
            for link in menu(app.session.identity().as_ref()) {
                println!("{:<14} {}", link.label, link.path);
            }
        }
        Command::Users { skip, limit } => {
            for user in app.session.list_users(skip, limit).await? {
                println!(
                    "{:>5}  {:<24} {:<32} {}",
                    user.id,
                    user.username,
                    user.email,
                    user.role()
                );
            }
        }
    }
    Ok(())
}
