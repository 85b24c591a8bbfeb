use clap::{Args, Parser, Subcommand};

use chalani::config::AppConfig;
use chalani::seed;
use chalani::store::Store;

use crate::error::ApiError;
use crate::server;

#[derive(Parser, Debug)]
#[command(
    name = "chalani-api",
    about = "Administrative dispatch-registry service",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Populate an empty database with sample records
    Seed,
    /// Create the initial admin account
    CreateAdmin(CreateAdminArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

#[derive(Args, Debug)]
pub(crate) struct CreateAdminArgs {
    /// Admin account email
    #[arg(long, default_value = "masteradmin@gmail.com")]
    email: String,
    /// Admin display name
    #[arg(long, default_value = "Master Admin")]
    name: String,
    /// Initial password (change it after first login)
    #[arg(long, default_value = "masteradmin@12345")]
    password: String,
}

pub(crate) async fn run() -> Result<(), ApiError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Seed => run_seed(),
        Command::CreateAdmin(args) => run_create_admin(args),
    }
}

fn run_seed() -> Result<(), ApiError> {
    let config = AppConfig::load()?;
    let store = Store::open(&config.database.path)?;
    let summary = seed::seed_demo_data(&store)?;
    if summary.is_empty() {
        println!("Database already seeded; nothing to do.");
    } else {
        println!("Seeded sample data:");
        println!("  offices:   {}", summary.offices);
        println!("  branches:  {}", summary.branches);
        println!("  employees: {}", summary.employees);
        println!("  receivers: {}", summary.receivers);
        println!("  products:  {}", summary.products);
        println!("  letters:   {}", summary.letters);
    }
    Ok(())
}

fn run_create_admin(args: CreateAdminArgs) -> Result<(), ApiError> {
    let config = AppConfig::load()?;
    let store = Store::open(&config.database.path)?;
    let (user, created) = seed::ensure_admin(&store, &args.email, &args.name, &args.password)?;
    if created {
        println!("Created admin account '{}'.", user.email);
        println!("Change the password after first login.");
    } else {
        println!("Admin account '{}' already exists.", user.email);
    }
    Ok(())
}
