//! Info command - shows backend, user and deck counts.

use crate::backend::{backend_label, open_library};
use crate::cli::InfoArgs;
use crate::output::{OutputFormat, print_json};

/// Run the info command
pub async fn run(args: &InfoArgs, format: OutputFormat) -> Result<(), Box<dyn std::error::Error>> {
    let library = open_library(&args.backend_config).await?;

    let users = library.list_users().await?;
    let decks = library.backend().count_decks().await?;
    let backend_str = backend_label(&args.backend_config);

    match format {
        OutputFormat::Human => {
            println!("Backend:  {backend_str}");
            println!("Users:    {}", users.len());
            println!("Decks:    {decks}");
        }
        OutputFormat::Json => {
            print_json(&serde_json::json!({
                "backend": backend_str,
                "users": users.len(),
                "decks": decks,
            }))?;
        }
    }

    Ok(())
}
