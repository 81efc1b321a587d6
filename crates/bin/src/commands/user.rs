//! User management commands.

use crate::backend::{open_library, persist};
use crate::cli::{UserAddArgs, UserListArgs};
use crate::output::{OutputFormat, print_json, print_table, short_time};

/// Run the `user add` command
pub async fn add(args: &UserAddArgs, format: OutputFormat) -> Result<(), Box<dyn std::error::Error>> {
    let library = open_library(&args.backend_config).await?;

    let user = library
        .register_user(&args.username, args.display_name.as_deref())
        .await?;
    persist(&library, &args.backend_config).await?;

    match format {
        OutputFormat::Human => {
            println!("Created user {} ({})", user.username, user.id);
        }
        OutputFormat::Json => print_json(&serde_json::to_value(&user)?)?,
    }

    Ok(())
}

/// Run the `user list` command
pub async fn list(
    args: &UserListArgs,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let library = open_library(&args.backend_config).await?;
    let users = library.list_users().await?;

    match format {
        OutputFormat::Human => {
            let rows: Vec<Vec<String>> = users
                .iter()
                .map(|user| {
                    vec![
                        user.username.clone(),
                        user.display_name.clone(),
                        user.id.to_string(),
                        short_time(user.created_at),
                    ]
                })
                .collect();
            print_table(
                &["USERNAME", "DISPLAY NAME", "ID", "CREATED"],
                &rows,
                "No users found.",
            );
        }
        OutputFormat::Json => print_json(&serde_json::to_value(&users)?)?,
    }

    Ok(())
}
