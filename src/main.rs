//! commit-autosuggest - CLI entry point.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use dialoguer::Confirm;
use tracing::warn;
use tracing_subscriber::EnvFilter;

use commit_autosuggest::config::{
    DEFAULT_PROFILE, ProfileStore, default_config_path, resolve_endpoint,
};
use commit_autosuggest::diff::{FilePatch, load_patches};
use commit_autosuggest::git::{CommitOutcome, commit};
use commit_autosuggest::service::{DEFAULT_ENDPOINT, HttpInferenceService, InferenceService};
use commit_autosuggest::suggest::{FileSuggestion, assemble_message, suggest_messages};

/// Suggest a commit message for staged changes.
#[derive(Parser, Debug)]
#[command(name = "commit-autosuggest")]
#[command(about = "Suggest a commit message for staged changes using a remote inference service")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Patch file containing a git diff (e.g. created by `git diff --cached > staged.diff`)
    #[arg(short, long)]
    file: Option<PathBuf>,

    /// Print the full per-file suggestions before the final message
    #[arg(short, long)]
    verbose: bool,

    /// Commit without asking for confirmation
    #[arg(short, long)]
    autocommit: bool,

    /// Number of newlines between the messages generated for each file
    #[arg(short, long, default_value_t = 1)]
    endline: usize,

    /// Profile whose endpoint is used
    #[arg(long, default_value = DEFAULT_PROFILE)]
    profile: String,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Save the inference endpoint for a profile
    Configure {
        /// Unique name for managing each independent setting
        #[arg(long, default_value = DEFAULT_PROFILE)]
        profile: String,

        /// Address of the inference server (e.g. http://127.0.0.1:5000/)
        #[arg(long, default_value = DEFAULT_ENDPOINT)]
        endpoint: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Configure {
            ref profile,
            ref endpoint,
        }) => configure(profile, endpoint),
        None => suggest(&cli).await,
    }
}

/// Generate, display and optionally commit a message for the staged diff.
async fn suggest(cli: &Cli) -> Result<()> {
    // Step 1: Read and split the diff (fails before any request on malformed input)
    let patches = load_patches(cli.file.as_deref()).context(match cli.file {
        Some(_) => "Failed to load patch file",
        None => "Failed to load staged changes. Run from within a git repository.",
    })?;

    if patches.is_empty() {
        println!("No staged changes found. Nothing to commit.");
        return Ok(());
    }

    // Step 2: Resolve the service endpoint
    let store = match default_config_path().and_then(ProfileStore::load) {
        Ok(store) => Some(store),
        Err(e) => {
            warn!("Could not load profiles, using defaults: {}", e);
            None
        }
    };
    let endpoint = resolve_endpoint(store.as_ref(), &cli.profile);
    let service = HttpInferenceService::new(&endpoint)
        .context("Invalid inference endpoint")?;

    println!(
        "Generating commit message for {} file(s) via {}...",
        patches.len(),
        service.base_url()
    );

    generate_and_commit(&patches, &service, cli, |message| {
        commit(message).context("Failed to run git commit")
    })
    .await
}

/// Dispatch every patch, show the assembled message and hand it to `commit_with`
/// once confirmed.
///
/// `commit_with` is only reached after every file has a message.
async fn generate_and_commit<S, F>(
    patches: &[FilePatch],
    service: &S,
    cli: &Cli,
    commit_with: F,
) -> Result<()>
where
    S: InferenceService + ?Sized,
    F: FnOnce(&str) -> Result<CommitOutcome>,
{
    // Step 3: Tokenize and dispatch each file
    let suggestions = suggest_messages(patches, service, |entry| {
        println!("{}", progress_line(entry));
    })
    .await
    .context("Failed to generate commit message")?;

    if cli.verbose {
        let json = suggestions
            .to_json_pretty()
            .context("Failed to format suggestions")?;
        println!("{}\n", json);
    }

    // Step 4: Assemble and show the message
    println!("\x1b[32m[INFO]\x1b[0m The generated message is as follows:");
    let message = assemble_message(&suggestions, cli.endline, |line| {
        println!("  - {}", line);
    });

    if message.trim().is_empty() {
        println!("The service returned an empty message. Nothing to commit.");
        return Ok(());
    }

    // Step 5: Commit
    let confirmed = cli.autocommit
        || Confirm::new()
            .with_prompt("Do you want to commit this message?")
            .default(false)
            .interact()
            .context("Failed to read confirmation")?;

    if !confirmed {
        println!("Commit skipped.");
        return Ok(());
    }

    let outcome = commit_with(&message)?
        .into_result()
        .context("git commit did not succeed")?;

    print!("{}", outcome.stdout);
    println!("✓ Committed");

    Ok(())
}

/// One line of progress output for a file whose message just arrived.
fn progress_line(entry: &FileSuggestion) -> String {
    let path = if entry.path.is_empty() { "(no path)" } else { entry.path.as_str() };
    format!("  [{}] {}: {}", entry.index, path, entry.message.text())
}

/// Persist `endpoint` under `profile` in the per-user profile file.
fn configure(profile: &str, endpoint: &str) -> Result<()> {
    let path = default_config_path()?;
    let mut store = ProfileStore::load(&path).context("Failed to load profiles")?;

    store
        .set_endpoint(profile, endpoint)
        .context("Failed to update profile")?;
    store.save().context("Failed to save profiles")?;

    println!(
        "Profile '{}' of commit-autosuggest is set up in {}.",
        profile,
        store.path().display()
    );
    for (key, value) in store.profile_entries(profile) {
        println!("  \x1b[32m{}\x1b[0m = {}", key, value);
    }

    Ok(())
}
