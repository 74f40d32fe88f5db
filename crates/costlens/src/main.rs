//! costlens - live cloud-cost estimates for infrastructure-as-code workspaces

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use comfy_table::Table;
use costlens_core::watcher::WatcherConfig;
use costlens_core::{
    DisplayRegistry, PricingCli, SaveWatcher, SessionContext, Workspace, WorkspaceEvent,
};
use costlens_views::{StatusBar, TreeProvider};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "costlens",
    version,
    about = "Live cloud-cost estimates for infrastructure-as-code workspaces",
    long_about = "Prices a Terraform workspace with the cloudcost CLI and maps every\n\
                  estimate back to the source block that declared it.\n\
                  \n\
                  Examples:\n\
                    costlens                         # Price the current directory once\n\
                    costlens watch                   # Keep costs updated on every save\n\
                    costlens login                   # Authenticate the pricing CLI\n\
                  \n\
                  Environment Variables:\n\
                    COSTLENS_PRICING_BIN             # Override the pricing binary path\n\
                    RUST_LOG                         # Log filter (e.g. costlens_core=debug)"
)]
struct Cli {
    /// Path to the cloudcost pricing binary
    #[arg(long, env = "COSTLENS_PRICING_BIN", default_value = "cloudcost")]
    pricing_bin: PathBuf,

    /// Workspace root (default: current directory)
    #[arg(long)]
    root: Option<PathBuf>,

    #[command(subcommand)]
    mode: Option<Mode>,
}

#[derive(Subcommand)]
enum Mode {
    /// Price the workspace once and print the cost tree (default)
    Costs,
    /// Price the workspace and re-price affected projects on every save
    Watch,
    /// Authenticate the pricing CLI
    Login,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let root = match cli.root {
        Some(root) => root,
        None => std::env::current_dir().context("could not determine working directory")?,
    };

    let pricing = Arc::new(PricingCli::new(&cli.pricing_bin));
    let context = Arc::new(SessionContext::new());
    let currency = context.detect(&pricing).await;

    let workspace = Arc::new(Workspace::new(
        root,
        pricing,
        context,
        Arc::new(DisplayRegistry::new()),
        currency,
    ));

    match cli.mode.unwrap_or(Mode::Costs) {
        Mode::Costs => run_costs(workspace).await,
        Mode::Watch => run_watch(workspace).await,
        Mode::Login => run_login(workspace).await,
    }
}

async fn run_costs(workspace: Arc<Workspace>) -> Result<()> {
    workspace.init().await;

    if !workspace.context().is_logged_in() {
        println!("Not authenticated. Run `costlens login` to connect the pricing CLI.");
        return Ok(());
    }

    if let Some(error) = workspace.context().last_error() {
        anyhow::bail!(error);
    }

    print_tree(&TreeProvider::new(workspace));
    Ok(())
}

async fn run_watch(workspace: Arc<Workspace>) -> Result<()> {
    workspace.init().await;

    if !workspace.context().is_logged_in() {
        println!("Not authenticated. Run `costlens login` to connect the pricing CLI.");
        return Ok(());
    }

    let tree = TreeProvider::new(Arc::clone(&workspace));
    print_tree(&tree);

    let status = StatusBar::new();
    status.observe(workspace.events());

    let watcher = SaveWatcher::start(Arc::clone(&workspace), WatcherConfig::default())
        .context("failed to start save watcher")?;

    let mut rx = workspace.events().subscribe();
    println!(
        "Watching {} for changes. Press Ctrl-C to exit.",
        workspace.root().display()
    );

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            event = rx.recv() => match event {
                Ok(WorkspaceEvent::LoadingChanged(true)) => eprintln!("{}", status.text()),
                Ok(WorkspaceEvent::LoadingChanged(false)) => print_tree(&tree),
                Ok(WorkspaceEvent::AuthRequired) => {
                    println!("Session expired. Run `costlens login` to reconnect.");
                }
                Ok(WorkspaceEvent::WatcherError(message)) => {
                    eprintln!("watcher error: {message}");
                }
                Ok(_) => {}
                Err(tokio::sync::broadcast::error::RecvError::Lagged(_)) => {}
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            },
        }
    }

    watcher.stop().await;
    Ok(())
}

async fn run_login(workspace: Arc<Workspace>) -> Result<()> {
    workspace.login().await;

    if workspace.context().is_logged_in() {
        println!("Pricing CLI authenticated.");
        print_tree(&TreeProvider::new(workspace));
    } else {
        println!("Login did not complete. Please retry.");
    }

    Ok(())
}

fn print_tree(tree: &TreeProvider) {
    let projects = tree.projects();
    if projects.is_empty() {
        println!("No priced projects found.");
        return;
    }

    let mut table = Table::new();
    table.set_header(vec!["Resource", "Monthly cost"]);

    for project in projects {
        table.add_row(vec![project.label.clone(), project.description.clone()]);

        for file in tree.files(&project.key) {
            table.add_row(vec![format!("  {}", file.label), file.description.clone()]);

            let filename = file
                .key
                .split_once('|')
                .map(|(_, filename)| filename.to_string())
                .unwrap_or_default();
            for block in tree.blocks(&project.key, &filename) {
                table.add_row(vec![format!("    {}", block.label), block.description]);
            }
        }
    }

    println!("{table}");
}
