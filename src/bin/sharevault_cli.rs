//! ShareVault CLI — secure file sharing client
//!
//! Usage:
//!   sharevault-cli login <username> <password>     Sign in
//!   sharevault-cli ls                              List your files
//!   sharevault-cli upload <path>                   Upload a file (10MB limit)
//!   sharevault-cli download <id> [output]          Download a file
//!   sharevault-cli share-link <id> --expires 24    Create a share link
//!
//! The backend URL comes from SHAREVAULT_API_URL or the config file.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::sync::Arc;
use uuid::Uuid;

use sharevault::api::files::ProgressFn;
use sharevault::guard::{self, RouteDecision};
use sharevault::state::{FileAction, FileState, RequestSequence};
use chrono::{DateTime, Utc};
use sharevault::{
    ApiClient, ClientConfig, DateRange, FileKind, FilePreview, FileRecord, RegisterRequest,
    SearchParams, Session, SessionState, SessionStore, ShareExpiration, SizeRange, SortOrder,
};

#[derive(Parser)]
#[command(
    name = "sharevault-cli",
    about = "ShareVault — secure file sharing client",
    version,
    long_about = "Upload, download, tag, version and share files through a ShareVault backend.\nSet SHAREVAULT_API_URL to point at your server."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new account
    Register {
        username: String,
        email: String,
        password: String,
        #[arg(long)]
        first_name: Option<String>,
        #[arg(long)]
        last_name: Option<String>,
    },
    /// Sign in and persist the session
    Login { username: String, password: String },
    /// Sign out and clear the persisted session
    Logout,
    /// Show the current session state
    Status,
    /// Begin two-factor enrollment (prints the TOTP secret)
    MfaSetup,
    /// Verify a TOTP code to complete login
    MfaVerify { code: String },
    /// List your files
    Ls,
    /// List files shared with you
    Shared,
    /// Search and filter your files
    Search {
        /// Substring matched against file and tag names
        query: Option<String>,
        /// Filter by kind (repeatable): document, image, video, audio
        #[arg(long = "type")]
        types: Vec<FileKind>,
        /// Uploaded within: today, week or month
        #[arg(long, conflicts_with_all = ["since", "until"])]
        range: Option<String>,
        /// Uploaded at or after (RFC 3339)
        #[arg(long)]
        since: Option<DateTime<Utc>>,
        /// Uploaded at or before (RFC 3339)
        #[arg(long)]
        until: Option<DateTime<Utc>>,
        /// Size bucket: small (< 1MB), medium (1-10MB), large (> 10MB)
        #[arg(long)]
        size: Option<SizeRange>,
        /// Sort key: uploaded_at, name or size, `-` prefix for descending
        #[arg(long, allow_hyphen_values = true)]
        sort: Option<SortOrder>,
    },
    /// Show a file's preview (text excerpt or thumbnail URL)
    Preview { id: Uuid },
    /// Upload a local file
    Upload { path: PathBuf },
    /// Download a file by id
    Download {
        id: Uuid,
        /// Local destination (default: the file's name)
        output: Option<PathBuf>,
    },
    /// Delete a file by id
    Rm { id: Uuid },
    /// Create a time-limited share link
    ShareLink {
        id: Uuid,
        /// Expiration in hours: 24, 48, 168 or 720
        #[arg(long, default_value = "24")]
        expires: ShareExpiration,
    },
    /// Share a file with another user by email
    ShareUser { id: Uuid, email: String },
    /// Show metadata for a received share link token
    LinkInfo { token: String },
    /// Download a received share link token
    LinkGet {
        token: String,
        output: Option<PathBuf>,
    },
    /// List tags
    Tags,
    /// Create a tag
    TagAdd {
        name: String,
        #[arg(long, default_value = "#3B82F6")]
        color: String,
    },
    /// Delete a tag by id
    TagRm { id: i64 },
    /// Show version history for a file
    Versions { id: Uuid },
    /// Restore a file to a previous version
    Restore { id: Uuid, version: i64 },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();
    let config = ClientConfig::load();
    let session_dir = config
        .session_dir()
        .context("Cannot resolve a config directory for session storage")?;
    let session = Arc::new(Session::rehydrate(SessionStore::in_dir(session_dir)));
    let client = ApiClient::new(&config, session)?;

    match cli.command {
        Commands::Register { username, email, password, first_name, last_name } => {
            let request = RegisterRequest {
                username: username.clone(),
                email,
                password: password.clone(),
                password2: password,
                first_name,
                last_name,
            };
            client.register(&request).await?;
            println!("Registered {username}. Sign in with: sharevault-cli login {username} <password>");
        }
        Commands::Login { username, password } => {
            let state = client.login(&username, &password).await?;
            match state {
                SessionState::MfaPending => {
                    println!("Signed in as {username}. Two-factor verification required:");
                    println!("  sharevault-cli mfa-verify <code>");
                }
                _ => println!("Signed in as {username}."),
            }
        }
        Commands::Logout => {
            client.logout()?;
            println!("Signed out.");
        }
        Commands::Status => {
            let snap = client.session().snapshot();
            let last_error = snap.error.clone();
            match snap.state() {
                SessionState::Anonymous => println!("Not signed in."),
                SessionState::MfaPending => println!(
                    "Signed in as {} (two-factor verification pending)",
                    snap.user.map(|u| u.username).unwrap_or_else(|| "<unknown>".into())
                ),
                SessionState::Authenticated => println!(
                    "Signed in as {}",
                    snap.user.map(|u| u.username).unwrap_or_else(|| "<unknown>".into())
                ),
            }
            if let Some(error) = last_error {
                println!("  last error: {error}");
            }
        }
        Commands::MfaSetup => {
            require_route(&client, guard::MFA_SETUP_ROUTE)?;
            let setup = client.mfa_setup().await?;
            println!("Scan the QR code with your authenticator app, or enter the secret manually:");
            println!("  secret: {}", setup.secret);
            println!("  qr:     {}", setup.qr_code);
        }
        Commands::MfaVerify { code } => {
            require_route(&client, guard::MFA_SETUP_ROUTE)?;
            client.mfa_verify(&code).await?;
            println!("Two-factor verification complete.");
        }
        Commands::Ls => {
            require_route(&client, "/files")?;
            let state = load_files(&client).await;
            render_files(&state, &state.files);
        }
        Commands::Shared => {
            require_route(&client, "/shared")?;
            let seq = RequestSequence::new();
            let generation = seq.next();
            let mut state = FileState::default()
                .apply(FileAction::LoadStarted { generation });
            state = match client.shared_files().await {
                Ok(files) => state.apply(FileAction::SharedLoaded { generation, files }),
                Err(e) => state.apply(FileAction::Failed { generation, message: e.to_string() }),
            };
            render_files(&state, &state.shared_files);
        }
        Commands::Search { query, types, range, since, until, size, sort } => {
            require_route(&client, "/files")?;
            let date_range = match range.as_deref() {
                Some("today") => Some(DateRange::Today),
                Some("week") => Some(DateRange::Week),
                Some("month") => Some(DateRange::Month),
                Some(other) => bail!("Invalid range '{other}' (today, week or month)"),
                None if since.is_some() || until.is_some() => {
                    Some(DateRange::Custom { start: since, end: until })
                }
                None => None,
            };
            let params = SearchParams { search: query, types, date_range, size, sort };
            let seq = RequestSequence::new();
            let generation = seq.next();
            let state = FileState::default().apply(FileAction::LoadStarted { generation });
            let state = match client.search_files(&params).await {
                Ok(files) => state.apply(FileAction::FilesLoaded { generation, files }),
                Err(e) => state.apply(FileAction::Failed { generation, message: e.to_string() }),
            };
            render_files(&state, &state.files);
        }
        Commands::Preview { id } => {
            require_route(&client, "/files")?;
            match client.file_preview(id).await? {
                FilePreview::Text { content } => println!("{content}"),
                FilePreview::Image { url } => println!("Preview image: {url}"),
                FilePreview::None => println!("No preview available for this file type."),
            }
        }
        Commands::Upload { path } => {
            require_route(&client, "/files")?;
            let spinner = ProgressBar::new_spinner();
            spinner.set_message(format!("Uploading {}", path.display()));
            spinner.enable_steady_tick(std::time::Duration::from_millis(100));
            let result = client.upload_file(&path).await;
            spinner.finish_and_clear();
            let record = result?;
            println!("Uploaded {} ({} bytes, id {})", record.name, record.size, record.id);
        }
        Commands::Download { id, output } => {
            require_route(&client, "/files")?;
            let destination = match output {
                Some(path) => path,
                None => {
                    // Resolve the file's name from the list when no
                    // destination is given
                    let files = client.list_files().await?;
                    let record = files
                        .iter()
                        .find(|f| f.id == id)
                        .with_context(|| format!("No file with id {id}"))?;
                    PathBuf::from(&record.name)
                }
            };
            let written = client
                .download_file_to(id, &destination, Some(transfer_bar()))
                .await?;
            println!("Downloaded {written} bytes to {}", destination.display());
        }
        Commands::Rm { id } => {
            require_route(&client, "/files")?;
            let state = load_files(&client).await;
            if let Some(error) = &state.error {
                bail!("{error}");
            }
            client.delete_file(id).await?;
            // Optimistic local removal; next `ls` re-syncs with the server
            let state = state.apply(FileAction::FileRemoved(id));
            println!("Deleted. {} file(s) remaining.", state.files.len());
        }
        Commands::ShareLink { id, expires } => {
            require_route(&client, "/files")?;
            let link = client.create_share_link(id, expires).await?;
            println!("Share link created (expires in {expires}):");
            println!("  token: {}", link.token);
            if let Some(url) = link.share_link {
                println!("  url:   {url}");
            }
            if let Some(at) = link.expires_at {
                println!("  until: {}", at.format("%Y-%m-%d %H:%M UTC"));
            }
        }
        Commands::ShareUser { id, email } => {
            require_route(&client, "/files")?;
            client.share_with_user(id, &email).await?;
            println!("Shared with {email}.");
        }
        Commands::LinkInfo { token } => {
            // Token-addressed routes need no session
            let meta = client.shared_file_by_token(&token).await?;
            println!("{}", meta.name);
            if let Some(size) = meta.size {
                println!("  size:    {size} bytes");
            }
            if let Some(at) = meta.expires_at {
                println!("  expires: {}", at.format("%Y-%m-%d %H:%M UTC"));
            }
        }
        Commands::LinkGet { token, output } => {
            let destination = match output {
                Some(path) => path,
                None => {
                    let meta = client.shared_file_by_token(&token).await?;
                    PathBuf::from(meta.name)
                }
            };
            let written = client
                .download_shared_to(&token, &destination, Some(transfer_bar()))
                .await?;
            println!("Downloaded {written} bytes to {}", destination.display());
        }
        Commands::Tags => {
            require_route(&client, "/files")?;
            let tags = client.tags().await?;
            if tags.is_empty() {
                println!("No tags.");
            }
            for tag in tags {
                println!("{:>4}  {}  {} ({} files)", tag.id, tag.color, tag.name, tag.file_count);
            }
        }
        Commands::TagAdd { name, color } => {
            require_route(&client, "/files")?;
            let tag = client.create_tag(&name, &color).await?;
            println!("Created tag {} (id {})", tag.name, tag.id);
        }
        Commands::TagRm { id } => {
            require_route(&client, "/files")?;
            client.delete_tag(id).await?;
            println!("Tag deleted.");
        }
        Commands::Versions { id } => {
            require_route(&client, "/files")?;
            let versions = client.file_versions(id).await?;
            if versions.is_empty() {
                println!("No versions available.");
            }
            for version in versions {
                print!(
                    "v{}  {}  by {}",
                    version.version_number,
                    version.created_at.format("%Y-%m-%d %H:%M"),
                    version.created_by_username
                );
                match version.comment {
                    Some(comment) => println!("  — {comment}"),
                    None => println!(),
                }
            }
        }
        Commands::Restore { id, version } => {
            require_route(&client, "/files")?;
            client.restore_version(id, version).await?;
            // Reload after restore, like the UI's refresh callback
            let files = client.list_files().await?;
            let restored = files.iter().find(|f| f.id == id);
            match restored {
                Some(record) => println!("Restored {} to version {version}.", record.name),
                None => println!("Restored version {version}."),
            }
        }
    }

    Ok(())
}

/// Gate a protected command on the session, mirroring the route guard.
fn require_route(client: &ApiClient, route: &str) -> Result<()> {
    match guard::evaluate(client.session().state(), route) {
        RouteDecision::Proceed => Ok(()),
        RouteDecision::RedirectToLogin { .. } => {
            bail!("Not signed in. Run: sharevault-cli login <username> <password>")
        }
        RouteDecision::RedirectToMfaSetup { .. } => {
            bail!("Two-factor verification pending. Run: sharevault-cli mfa-verify <code>")
        }
    }
}

/// Fetch the file list through the slice reducer
async fn load_files(client: &ApiClient) -> FileState {
    let seq = RequestSequence::new();
    let generation = seq.next();
    let state = FileState::default().apply(FileAction::LoadStarted { generation });
    match client.list_files().await {
        Ok(files) => state.apply(FileAction::FilesLoaded { generation, files }),
        Err(e) => state.apply(FileAction::Failed { generation, message: e.to_string() }),
    }
}

fn render_files(state: &FileState, files: &[FileRecord]) {
    if let Some(error) = &state.error {
        eprintln!("Error: {error}");
        return;
    }
    if files.is_empty() {
        println!("No files.");
        return;
    }
    for file in files {
        let tags = if file.tags.is_empty() {
            String::new()
        } else {
            let names: Vec<&str> = file.tags.iter().map(|t| t.name.as_str()).collect();
            format!("  [{}]", names.join(", "))
        };
        println!(
            "{}  {:>10}  {}  {}{}",
            file.id,
            file.size,
            file.uploaded_at.format("%Y-%m-%d %H:%M"),
            file.name,
            tags
        );
    }
}

/// Progress bar fed by the streaming download callback
fn transfer_bar() -> ProgressFn {
    let bar = ProgressBar::new(0);
    bar.set_style(
        ProgressStyle::with_template("{bytes}/{total_bytes} {wide_bar} {bytes_per_sec}")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );
    Box::new(move |written, total| {
        if let Some(total) = total {
            bar.set_length(total);
        }
        bar.set_position(written);
        if total == Some(written) {
            bar.finish_and_clear();
        }
    })
}
