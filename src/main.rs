use std::fs;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use comfy_table::Table;
use tracing_subscriber::EnvFilter;

use vendor_cli::api_client::{ApiClient, NewVendor, SearchResult, Vendor};
use vendor_cli::auth::AuthSession;
use vendor_cli::config::ClientConfig;
use vendor_cli::error::ApiError;
use vendor_cli::token_store::TokenStore;
use vendor_cli::vendor_view::{SearchOutcome, VendorView};

fn print_help() {
    println!("vendor-cli - vendor directory client");
    println!();
    println!("Usage:");
    println!("  vendor-cli <command> [args]");
    println!();
    println!("Commands:");
    println!("  login <email> <password>          - Authenticate and save the session token");
    println!("  register <email> <name> <password> - Create an account");
    println!("  logout                            - Drop the saved session token");
    println!("  vendors [filter]                  - List vendors, optionally filtered locally");
    println!("  search <query> [max_results]      - Remote relevance-ranked vendor search");
    println!("  create <name> <category> [description] - Add a vendor");
    println!("  health                            - Backend diagnostics");
    println!();
    println!("Config: ~/.config/vendor-cli/config.toml");
}

fn token_path() -> Result<PathBuf> {
    let config_dir =
        dirs::config_dir().ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;
    Ok(config_dir.join("vendor-cli").join("token"))
}

/// Restore the token saved by a previous `login`, if any. Token persistence
/// across runs lives here in the binary; the library only keeps the
/// in-memory current value.
fn load_saved_token(tokens: &TokenStore) {
    if let Ok(path) = token_path() {
        if let Ok(contents) = fs::read_to_string(&path) {
            let token = contents.trim();
            if !token.is_empty() {
                tokens.set(token);
            }
        }
    }
}

fn save_token(token: &str) -> Result<()> {
    let path = token_path()?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&path, token).with_context(|| format!("failed to write token to {:?}", path))
}

fn forget_token() -> Result<()> {
    let path = token_path()?;
    match fs::remove_file(&path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e).with_context(|| format!("failed to remove token at {:?}", path)),
    }
}

fn describe(e: &ApiError) -> String {
    // Prefer the backend's structured detail when it sent one
    e.detail().unwrap_or_else(|| e.to_string())
}

fn vendor_table(vendors: &[Vendor]) -> Table {
    let mut table = Table::new();
    table.set_header(vec!["ID", "Name", "Category", "Status", "Created"]);
    for v in vendors {
        table.add_row(vec![
            v.id.to_string(),
            v.name.clone(),
            v.category.clone(),
            (if v.is_active { "active" } else { "inactive" }).to_string(),
            v.created_at.format("%Y-%m-%d").to_string(),
        ]);
    }
    table
}

fn result_table(results: &[SearchResult]) -> Table {
    let mut table = Table::new();
    table.set_header(vec!["Vendor", "Category", "Match", "Description"]);
    for r in results {
        table.add_row(vec![
            r.vendor_name.clone(),
            r.category.clone(),
            format!("{:.1}%", r.score * 100.0),
            r.description.clone(),
        ]);
    }
    table
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let command = match args.first() {
        Some(c) => c.as_str(),
        None => {
            print_help();
            return Ok(());
        }
    };

    if matches!(command, "help" | "--help" | "-h") {
        print_help();
        return Ok(());
    }

    let config = ClientConfig::load()?;
    let tokens = TokenStore::new();
    load_saved_token(&tokens);
    let client = ApiClient::from_config(&config, tokens.clone())?;

    match command {
        "login" => {
            let email = args
                .get(1)
                .context("usage: vendor-cli login <email> <password>")?;
            let password = args
                .get(2)
                .context("usage: vendor-cli login <email> <password>")?;

            let session = AuthSession::new(client);
            let response = session
                .login(email, password)
                .await
                .map_err(|e| anyhow::anyhow!("login failed: {}", describe(&e)))?;
            save_token(&response.access_token)?;
            println!("Logged in as {} ({} token saved)", email, response.token_type);
        }
        "register" => {
            let email = args
                .get(1)
                .context("usage: vendor-cli register <email> <name> <password>")?;
            let name = args
                .get(2)
                .context("usage: vendor-cli register <email> <name> <password>")?;
            let password = args
                .get(3)
                .context("usage: vendor-cli register <email> <name> <password>")?;

            let session = AuthSession::new(client);
            let user = session
                .register(email, name, password)
                .await
                .map_err(|e| anyhow::anyhow!("registration failed: {}", describe(&e)))?;
            println!("Registered {} (user id {})", user.email, user.id);
        }
        "logout" => {
            let session = AuthSession::new(client);
            session.logout();
            forget_token()?;
            println!("Logged out");
        }
        "vendors" => {
            let view = VendorView::new(client);
            view.refresh()
                .await
                .map_err(|e| anyhow::anyhow!("failed to fetch vendors: {}", describe(&e)))?;

            let filter = args.get(1).map(String::as_str).unwrap_or("");
            let shown = view.filtered(filter);
            println!("{}", vendor_table(&shown));
            println!("{} of {} vendors", shown.len(), view.vendors().len());
        }
        "search" => {
            let query = args
                .get(1)
                .context("usage: vendor-cli search <query> [max_results]")?;
            let max_results = match args.get(2) {
                Some(raw) => raw.parse().context("max_results must be a number")?,
                None => config.search.max_results,
            };

            let view = VendorView::new(client);
            let outcome = view
                .search(query, max_results)
                .await
                .map_err(|e| anyhow::anyhow!("search failed: {}", describe(&e)))?;
            match outcome {
                SearchOutcome::Applied { count } => {
                    println!("{}", result_table(&view.results()));
                    println!("{} results for \"{}\"", count, query);
                }
                SearchOutcome::EmptyQuery => println!("Empty query; nothing to search."),
                // One search per invocation; nothing can supersede it
                SearchOutcome::Superseded => {}
            }
        }
        "create" => {
            let name = args
                .get(1)
                .context("usage: vendor-cli create <name> <category> [description]")?;
            let category = args
                .get(2)
                .context("usage: vendor-cli create <name> <category> [description]")?;

            let vendor = NewVendor {
                name: name.clone(),
                category: category.clone(),
                description: args.get(3).cloned(),
                website_url: None,
                contact_email: None,
                is_active: true,
            };
            let created = client
                .create_vendor(&vendor)
                .await
                .map_err(|e| anyhow::anyhow!("failed to create vendor: {}", describe(&e)))?;
            println!("Created vendor {} (id {})", created.name, created.id);
        }
        "health" => {
            let diagnostics = client
                .health()
                .await
                .map_err(|e| anyhow::anyhow!("health check failed: {}", describe(&e)))?;
            println!("{}", serde_json::to_string_pretty(&diagnostics)?);
        }
        other => {
            print_help();
            bail!("unknown command: {}", other);
        }
    }

    Ok(())
}
