use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use chrono::Utc;
use clap::{CommandFactory, Parser};
use clap_complete::generate;
use colored::Colorize;
use tracing_subscriber::EnvFilter;

use plugscout_core::catalog::{search_plugins, DiscoveryReport};
use plugscout_core::config::Config;
use plugscout_core::{
    builtin_listing, MarketplaceService, RepoStats, Result, ScoutContext, ScoutError,
};

mod args;
use args::{CacheAction, Cli, Commands, ConfigAction, Shell};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    let base_dir = resolve_base_dir(cli.base_dir);
    tracing::debug!(base_dir = %base_dir.display(), "starting");

    let result = match cli.command {
        Some(Commands::Discover) => handle_discover(&base_dir).await,
        Some(Commands::Plugins { query, limit }) => {
            handle_plugins(&base_dir, query.as_deref(), limit).await
        }
        Some(Commands::Registry) => handle_registry(&base_dir).await,
        Some(Commands::CheckUpdates) => handle_check_updates(&base_dir).await,
        Some(Commands::Stats) => handle_stats(&base_dir).await,
        Some(Commands::Cache { action }) => handle_cache(action, &base_dir),
        Some(Commands::Refresh) => handle_refresh(&base_dir).await,
        Some(Commands::Config { action }) => handle_config(action, &base_dir),
        Some(Commands::Completions { shell }) => {
            handle_completions(shell);
            Ok(())
        }
        None => {
            Cli::command().print_help().ok();
            Ok(())
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", "[ERROR]".red().bold(), e);
            ExitCode::from(e.exit_code() as u8)
        }
    }
}

fn init_logging(verbose: bool, quiet: bool) {
    let level = if verbose {
        "debug"
    } else if quiet {
        "error"
    } else {
        "warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

fn handle_completions(shell: Shell) {
    let mut cmd = Cli::command();
    let shell = match shell {
        Shell::Bash => clap_complete::Shell::Bash,
        Shell::Zsh => clap_complete::Shell::Zsh,
        Shell::Fish => clap_complete::Shell::Fish,
        Shell::PowerShell => clap_complete::Shell::PowerShell,
        Shell::Elvish => clap_complete::Shell::Elvish,
    };
    generate(shell, &mut cmd, "plugscout", &mut io::stdout());
}

fn resolve_base_dir(cli_base: Option<PathBuf>) -> PathBuf {
    if let Some(base) = cli_base {
        return base;
    }

    if let Ok(base) = std::env::var("PLUGSCOUT_BASE") {
        return PathBuf::from(base);
    }

    dirs::home_dir()
        .map(|h| h.join(".plugscout"))
        .unwrap_or_else(|| PathBuf::from(".plugscout"))
}

fn build_context(base_dir: &Path) -> Result<Arc<ScoutContext>> {
    let config = Config::load(base_dir)?;
    ScoutContext::from_config(&config)
}

fn build_service(base_dir: &Path) -> Result<MarketplaceService> {
    Ok(MarketplaceService::new(build_context(base_dir)?))
}

async fn handle_discover(base_dir: &Path) -> Result<()> {
    let service = build_service(base_dir)?;
    let (listing, origin) = service.resolve_with_origin().await;
    let report = service.discover_all_detailed(&listing).await;

    println!();
    println!(
        "{} ({} listed, from {})",
        "Marketplaces:".bold(),
        listing.len(),
        origin
    );
    print_report(&report);

    if report.is_total_failure() {
        return report.into_result().map(|_| ());
    }
    Ok(())
}

async fn handle_plugins(base_dir: &Path, query: Option<&str>, limit: usize) -> Result<()> {
    let service = build_service(base_dir)?;
    let listing = service.resolve_listing().await;
    let discovered = service.discover_all(&listing).await?;

    let mut plugins = search_plugins(&discovered, query.unwrap_or(""));
    let total = plugins.len();
    if limit > 0 {
        plugins.truncate(limit);
    }

    if plugins.is_empty() {
        match query {
            Some(q) => println!("No plugins match '{}'.", q),
            None => println!("No plugins found."),
        }
        return Ok(());
    }

    println!();
    for plugin in &plugins {
        let version = plugin
            .version
            .as_deref()
            .map(|v| format!(" v{}", v))
            .unwrap_or_default();
        let lsp = if plugin.has_lsp_servers {
            format!(" {}", "[LSP]".magenta())
        } else {
            String::new()
        };
        println!("  {}{}{}", plugin.full_id.cyan(), version.dimmed(), lsp);
        if let Some(desc) = &plugin.description {
            println!("      {}", desc);
        }
    }
    println!();

    if plugins.len() < total {
        println!("Showing {} of {} plugins.", plugins.len(), total);
    } else {
        println!("{} plugin(s).", total);
    }
    Ok(())
}

async fn handle_registry(base_dir: &Path) -> Result<()> {
    let service = build_service(base_dir)?;
    let (listing, origin) = service.resolve_with_origin().await;

    println!();
    println!("{} (from {})", "Registry:".bold(), origin);
    for entry in &listing {
        println!("  {} {}", entry.name.cyan(), entry.repository_url.dimmed());
        if entry.title() != entry.name {
            println!("      {}", entry.title());
        }
        if !entry.description.is_empty() {
            println!("      {}", entry.description);
        }
    }
    println!();
    Ok(())
}

async fn handle_check_updates(base_dir: &Path) -> Result<()> {
    let service = build_service(base_dir)?;
    let check = service.check_for_updates(&builtin_listing()).await;

    if check.new_count == 0 {
        println!("{} No new marketplaces.", "[OK]".green());
    } else {
        println!(
            "{} {} new marketplace(s) listed ({} total).",
            "[NEW]".yellow().bold(),
            check.new_count,
            check.listing.len()
        );
    }
    Ok(())
}

async fn handle_stats(base_dir: &Path) -> Result<()> {
    let service = build_service(base_dir)?;
    let listing = service.resolve_listing().await;
    let stats = service.stats(&listing).await;

    println!();
    for entry in &listing {
        match stats.get(&entry.name) {
            Some(s) => println!("  {:<32} {}", entry.name.cyan(), format_stats(s)),
            None => println!("  {:<32} {}", entry.name.cyan(), "no stats".dimmed()),
        }
    }
    println!();
    Ok(())
}

fn format_stats(stats: &RepoStats) -> String {
    let mut line = format!(
        "★ {:>6}  forks {:>5}  issues {:>5}",
        stats.stars, stats.forks, stats.open_issues
    );
    if let Some(pushed) = stats.last_pushed_at {
        let days = (Utc::now() - pushed).num_days().max(0);
        line.push_str(&format!("  pushed {}d ago", days));
    }
    line
}

fn handle_cache(action: CacheAction, base_dir: &Path) -> Result<()> {
    match action {
        CacheAction::Clear => {
            let service = build_service(base_dir)?;
            let removed = service.clear_cache()?;
            println!("{} {} file(s)", "Removed:".green(), removed);
        }
        CacheAction::Path => {
            let ctx = build_context(base_dir)?;
            println!("{}", ctx.cache.root().display());
        }
    }
    Ok(())
}

async fn handle_refresh(base_dir: &Path) -> Result<()> {
    let service = build_service(base_dir)?;
    let report = service.refresh_all_detailed().await?;

    println!();
    println!("{}", "Refreshed:".green().bold());
    print_report(&report);

    if report.is_total_failure() {
        return report.into_result().map(|_| ());
    }
    Ok(())
}

fn print_report(report: &DiscoveryReport) {
    let mut names: Vec<&String> = report.marketplaces.keys().collect();
    names.sort();

    for name in names {
        let Some(found) = report.marketplaces.get(name) else {
            continue;
        };
        println!(
            "  {} {} ({} plugins)",
            name.cyan(),
            found.source.dimmed(),
            found.manifest.plugins.len()
        );
    }

    for failure in &report.failures {
        eprintln!(
            "  {} {}: {}",
            "[WARN]".yellow(),
            failure.name,
            failure.error
        );
    }
    println!();
}

fn handle_config(action: ConfigAction, base_dir: &Path) -> Result<()> {
    match action {
        ConfigAction::Get { key } => {
            let config = Config::load(base_dir)?;
            match config.get(&key) {
                Some(value) => {
                    println!("{}", value);
                }
                None => {
                    return Err(ScoutError::ConfigKeyNotFound { key });
                }
            }
        }
        ConfigAction::Set { key, value } => {
            let mut config = Config::load(base_dir)?;
            config.set(&key, &value)?;
            config.save(base_dir)?;
            println!("{} {} = {}", "Set:".green(), key, value);
        }
        ConfigAction::List => {
            let config = Config::load(base_dir)?;
            println!();
            for (key, value) in config.list() {
                println!("{} = {}", key.cyan(), value);
            }
            println!();
        }
        ConfigAction::Path => {
            println!("{}", Config::path(base_dir).display());
        }
        ConfigAction::Init => {
            let path = Config::init(base_dir)?;
            println!("{} {}", "Initialized:".green(), path.display());
        }
    }

    Ok(())
}
