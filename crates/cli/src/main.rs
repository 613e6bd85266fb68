//! Comanda CLI - operator tools over the same stores as the server.
//!
//! # Usage
//!
//! ```bash
//! # Print today's orders, newest first
//! comanda orders list --status pending
//!
//! # Place an order for table 5
//! comanda orders add -i Arroz -i Feijão -t 5
//!
//! # Follow the order collection as it changes
//! comanda orders watch
//!
//! # Promote a user to kitchen staff
//! comanda users role uid-123 kitchen
//!
//! # Extract the menu from a photo and save it
//! comanda menu extract cardapio.jpg --save
//! ```
//!
//! Configuration and backend selection are the server's: `COMANDA_*`,
//! `FIREBASE_*` and `GEMINI_*` variables, with `.env` support.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use comanda_core::{OrderStatus, UserRole};
use comanda_server::config::ServerConfig;
use comanda_server::state::AppState;

mod commands;

#[derive(Parser)]
#[command(name = "comanda")]
#[command(author, version, about = "Comanda CLI tools")]
struct Cli {
    /// Override the data directory (`COMANDA_DATA_DIR`)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Inspect and place orders
    Orders {
        #[command(subcommand)]
        action: OrdersAction,
    },
    /// Manage user profiles
    Users {
        #[command(subcommand)]
        action: UsersAction,
    },
    /// Show or extract today's menu
    Menu {
        #[command(subcommand)]
        action: MenuAction,
    },
}

#[derive(Subcommand)]
enum OrdersAction {
    /// Print orders as JSON, newest first
    List {
        /// Match customer, table or id
        #[arg(short, long)]
        query: Option<String>,

        /// Only orders with this status (`pending`, `preparing`, `completed`)
        #[arg(short, long)]
        status: Option<OrderStatus>,
    },
    /// Place an order
    Add {
        /// Item name (repeat for more items)
        #[arg(short, long = "item", required = true)]
        items: Vec<String>,

        /// Table label
        #[arg(short, long)]
        table: Option<String>,

        /// Free-text note for the kitchen
        #[arg(short, long)]
        note: Option<String>,

        /// Customer name
        #[arg(short, long)]
        customer: Option<String>,
    },
    /// Change an order's status
    Status { id: String, status: OrderStatus },
    /// Print every new snapshot until interrupted
    Watch,
}

#[derive(Subcommand)]
enum UsersAction {
    /// Print profiles as JSON
    List {
        /// Match display name or email
        #[arg(short, long)]
        query: Option<String>,
    },
    /// Create or update a profile
    Upsert {
        uid: String,

        #[arg(short, long)]
        email: Option<String>,

        #[arg(short, long)]
        name: Option<String>,

        /// Role (`admin`, `kitchen`, `waiter`, `customer`)
        #[arg(short, long)]
        role: Option<UserRole>,
    },
    /// Change a user's role
    Role { uid: String, role: UserRole },
}

#[derive(Subcommand)]
enum MenuAction {
    /// Print today's menu as JSON
    Show,
    /// Read a menu photo with the extraction model
    Extract {
        image: PathBuf,

        /// Replace today's menu with the result
        #[arg(long)]
        save: bool,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "comanda_server=warn,comanda=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = ServerConfig::from_env()?;
    if let Some(dir) = cli.data_dir {
        config.data_dir = dir;
    }
    let state = AppState::from_config(config).await;
    if let Some(banner) = &state.backend_status().banner {
        tracing::warn!("{banner}");
    }

    match cli.command {
        Commands::Orders { action } => match action {
            OrdersAction::List { query, status } => {
                commands::orders::list(&state, query, status).await?;
            }
            OrdersAction::Add {
                items,
                table,
                note,
                customer,
            } => commands::orders::add(&state, items, table, note, customer).await?,
            OrdersAction::Status { id, status } => {
                commands::orders::set_status(&state, &id, status).await?;
            }
            OrdersAction::Watch => commands::orders::watch(&state).await?,
        },
        Commands::Users { action } => match action {
            UsersAction::List { query } => commands::users::list(&state, query.as_deref()).await?,
            UsersAction::Upsert {
                uid,
                email,
                name,
                role,
            } => commands::users::upsert(&state, &uid, email, name, role).await?,
            UsersAction::Role { uid, role } => commands::users::role(&state, &uid, role).await?,
        },
        Commands::Menu { action } => match action {
            MenuAction::Show => commands::menu::show(&state)?,
            MenuAction::Extract { image, save } => {
                commands::menu::extract(&state, &image, save).await?;
            }
        },
    }
    Ok(())
}
