//! CLI administration tool for shortlink.
//!
//! Works directly against the configured storage backend, without going
//! through the HTTP API.
//!
//! # Usage
//!
//! ```bash
//! # Resolve a short code
//! cargo run --bin admin -- -f links.json links resolve aB3xY9Qz
//!
//! # List a user's links
//! cargo run --bin admin -- -d postgres://localhost/shortlink links list --user 4f1c...
//!
//! # Delete links on behalf of a user
//! cargo run --bin admin -- -f links.json links delete --user 4f1c... aB3xY9Qz Qm7pL2cV
//!
//! # Check that the store answers
//! cargo run --bin admin -- -f links.json store ping
//! ```
//!
//! Storage is selected with the same flags, config file and environment
//! variables as the server.

use shortlink::application::services::{LinkService, ShortenerError};
use shortlink::config::{Config, ServerArgs, StorageBackend};
use shortlink::domain::context::RequestContext;
use shortlink::domain::repositories::StoreError;
use shortlink::server::{build_link_service, build_repository};

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::*;
use dialoguer::Confirm;
use std::time::Duration;

/// CLI tool for managing shortlink storage.
#[derive(Parser)]
#[command(name = "admin")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(flatten)]
    server: ServerArgs,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level command groups.
#[derive(Subcommand)]
enum Commands {
    /// Inspect and delete links
    Links {
        #[command(subcommand)]
        action: LinkAction,
    },

    /// Storage operations
    Store {
        #[command(subcommand)]
        action: StoreAction,
    },
}

/// Link management subcommands.
#[derive(Subcommand)]
enum LinkAction {
    /// Show the original URL behind a short code
    Resolve {
        code: String,
    },

    /// List live links owned by a user
    List {
        #[arg(short, long)]
        user: String,
    },

    /// Soft-delete links owned by a user
    Delete {
        #[arg(short, long)]
        user: String,

        /// Short codes to delete
        #[arg(required = true)]
        codes: Vec<String>,

        /// Skip confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,
    },
}

/// Storage subcommands.
#[derive(Subcommand)]
enum StoreAction {
    /// Check that the store answers
    Ping,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let config = Config::load(&cli.server)?;

    if config.storage() == StorageBackend::Memory {
        println!(
            "{}",
            "⚠️  No file or database configured, using an empty in-memory store".yellow()
        );
    }

    let repository = build_repository(&config).await?;
    let service = build_link_service(&config, repository)?;
    let timeout = config.store_timeout.max(Duration::from_secs(1));

    match cli.command {
        Commands::Links { action } => handle_link_action(action, &service, timeout).await?,
        Commands::Store { action } => handle_store_action(action, &service, timeout).await?,
    }

    Ok(())
}

/// Storage context for one command. The deadline starts now.
fn context(timeout: Duration) -> RequestContext {
    RequestContext::new().timeout(timeout)
}

/// Dispatches link management commands.
async fn handle_link_action(
    action: LinkAction,
    service: &LinkService,
    timeout: Duration,
) -> Result<()> {
    match action {
        LinkAction::Resolve { code } => resolve_link(service, &context(timeout), &code).await,
        LinkAction::List { user } => list_links(service, &context(timeout), &user).await,
        LinkAction::Delete { user, codes, yes } => {
            let confirm = || if yes { Ok(true) } else { confirm_delete() };
            delete_links(service, timeout, &user, &codes, confirm).await
        }
    }
}

fn confirm_delete() -> Result<bool> {
    Ok(Confirm::new()
        .with_prompt("Delete these links?")
        .default(false)
        .interact()?)
}

async fn resolve_link(service: &LinkService, ctx: &RequestContext, code: &str) -> Result<()> {
    match service.get_full_link_by_short_code(ctx, code).await {
        Ok(link) => {
            println!("{}", "🔗 Link".bright_blue().bold());
            println!();
            println!("  Short URL: {}", link.short_url.bright_yellow());
            println!("  Original:  {}", link.original_url.cyan());
            println!("  Owner:     {}", owner_label(&link.user_id));
            println!();
            Ok(())
        }
        Err(ShortenerError::Store(StoreError::KeyNotFound)) => {
            println!("{}", format!("❌ No live link for '{code}'").red());
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

fn owner_label(user_id: &str) -> ColoredString {
    if user_id.is_empty() {
        "anonymous".bright_black()
    } else {
        user_id.normal()
    }
}

/// Lists a user's live links.
///
/// # Output Format
///
/// ```text
/// 📋 Links of 4f1c...
///
///   Code         Original URL
///   ──────────────────────────────────────────────
///   aB3xY9Qz     https://example.com/some/long/path
/// ```
async fn list_links(service: &LinkService, ctx: &RequestContext, user: &str) -> Result<()> {
    println!("{}", format!("📋 Links of {user}").bright_blue().bold());
    println!();

    let links = service.get_user_links(ctx, user).await?;

    if links.is_empty() {
        println!("{}", "  No links found".yellow());
        return Ok(());
    }

    println!(
        "  {:<12} {}",
        "Code".bright_white().bold(),
        "Original URL".bright_white().bold()
    );
    println!("  {}", "─".repeat(60).bright_black());

    for link in &links {
        println!("  {:<12} {}", link.short_code.cyan(), link.original_url);
    }

    println!();
    println!("  Total: {}", links.len().to_string().bright_white().bold());
    println!();

    Ok(())
}

/// Soft-deletes codes owned by `user` once `confirm` agrees.
///
/// The storage deadline starts after `confirm` returns, so a slow answer at
/// the prompt does not use up the store timeout.
async fn delete_links(
    service: &LinkService,
    timeout: Duration,
    user: &str,
    codes: &[String],
    confirm: impl FnOnce() -> Result<bool>,
) -> Result<()> {
    println!("{}", "🗑️  Delete Links".bright_blue().bold());
    println!();
    println!("  User:  {}", user.cyan());
    println!("  Codes: {}", codes.join(", ").bright_yellow());
    println!();

    if !confirm()? {
        println!("{}", "❌ Cancelled".red());
        return Ok(());
    }

    service
        .delete_user_links(&context(timeout), codes, user)
        .await?;

    println!("{}", "✅ Links deleted".green().bold());
    println!(
        "{}",
        "  Codes not owned by this user were left untouched".bright_black()
    );
    println!();

    Ok(())
}

/// Handles storage diagnostic commands.
async fn handle_store_action(
    action: StoreAction,
    service: &LinkService,
    timeout: Duration,
) -> Result<()> {
    match action {
        StoreAction::Ping => {
            println!("{}", "🔍 Checking storage...".bright_blue());

            service.ping(&context(timeout)).await?;

            println!("{}", "✅ Storage OK".green().bold());
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use shortlink::infrastructure::persistence::MemoryLinkRepository;
    use shortlink::utils::code_generator::HashGenerator;
    use std::sync::Arc;

    fn service() -> LinkService {
        LinkService::new(
            Arc::new(MemoryLinkRepository::new()),
            Arc::new(HashGenerator::new(6).unwrap()),
            "http://localhost:8080",
        )
        .unwrap()
    }

    async fn shorten(service: &LinkService, user: &str, url: &str) -> String {
        let outcome = service
            .generate_short_link(&RequestContext::with_user(user), url)
            .await
            .unwrap();
        outcome.short_url().rsplit('/').next().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_delete_after_slow_confirmation() {
        let service = service();
        let code = shorten(&service, "u1", "https://example.com/slow").await;
        let timeout = Duration::from_millis(50);

        delete_links(&service, timeout, "u1", &[code.clone()], || {
            std::thread::sleep(Duration::from_millis(100));
            Ok(true)
        })
        .await
        .unwrap();

        let err = service
            .get_full_link_by_short_code(&RequestContext::new(), &code)
            .await
            .unwrap_err();
        assert!(matches!(err, ShortenerError::Store(StoreError::KeyNotFound)));
    }

    #[tokio::test]
    async fn test_declined_delete_keeps_links() {
        let service = service();
        let code = shorten(&service, "u1", "https://example.com/kept").await;

        delete_links(&service, Duration::from_secs(1), "u1", &[code.clone()], || Ok(false))
            .await
            .unwrap();

        assert!(
            service
                .get_full_link_by_short_code(&RequestContext::new(), &code)
                .await
                .is_ok()
        );
    }
}
