//! Deck inspection and maintenance commands.

use flashdeck::DeckId;

use crate::backend::{open_library, persist};
use crate::cli::{DeckListArgs, DeckShowArgs, PurgeOrphansArgs};
use crate::output::{OutputFormat, print_json, print_table, short_time, yes_no};

/// Run the `deck list` command
pub async fn list(
    args: &DeckListArgs,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let library = open_library(&args.backend_config).await?;
    let user = library.user(&args.as_user).await?;
    let decks = library.decks_for(&user.id).await?;

    match format {
        OutputFormat::Human => {
            let rows: Vec<Vec<String>> = decks
                .iter()
                .map(|deck| {
                    vec![
                        deck.id.to_string(),
                        deck.name.clone(),
                        if deck.is_owned { "owner" } else { "shared" }.to_string(),
                        yes_no(deck.is_private).to_string(),
                        short_time(deck.date_updated),
                    ]
                })
                .collect();
            print_table(
                &["ID", "NAME", "ACCESS", "PRIVATE", "UPDATED"],
                &rows,
                "No decks found.",
            );
        }
        OutputFormat::Json => print_json(&serde_json::to_value(&decks)?)?,
    }

    Ok(())
}

/// Run the `deck show` command
pub async fn show(
    args: &DeckShowArgs,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let library = open_library(&args.backend_config).await?;
    let viewer = match args.as_user {
        Some(ref identifier) => Some(library.user(identifier).await?.id),
        None => None,
    };
    let deck_id = DeckId::new(args.deck_id.as_str());

    let deck = library.deck(viewer.as_ref(), &deck_id).await?;
    let cards = library.cards_in_deck(viewer.as_ref(), &deck_id).await?;

    match format {
        OutputFormat::Human => {
            println!("Deck:      {} ({})", deck.name, deck.id);
            println!("Owner:     {}", deck.owner);
            if !deck.description.is_empty() {
                println!("About:     {}", deck.description);
            }
            println!("Private:   {}", yes_no(deck.is_private));
            println!("Editable:  {}", yes_no(deck.is_editable));
            println!("Likes:     {}", deck.likes);
            println!("Updated:   {}", short_time(deck.date_updated));
            if let Some(ref shares) = deck.shared_to {
                println!();
                let rows: Vec<Vec<String>> = shares
                    .iter()
                    .map(|share| {
                        vec![
                            share.username.clone().unwrap_or_else(|| share.user.to_string()),
                            yes_no(share.editable).to_string(),
                        ]
                    })
                    .collect();
                print_table(&["SHARED WITH", "EDITABLE"], &rows, "Not shared.");
            }
            println!();
            let rows: Vec<Vec<String>> = cards
                .iter()
                .map(|card| {
                    vec![
                        card.id.to_string(),
                        card.question.clone(),
                        card.answer.clone(),
                        card.hint.clone().unwrap_or_default(),
                    ]
                })
                .collect();
            print_table(&["CARD", "QUESTION", "ANSWER", "HINT"], &rows, "No cards.");
        }
        OutputFormat::Json => print_json(&serde_json::json!({
            "deck": serde_json::to_value(&deck)?,
            "cards": serde_json::to_value(&cards)?,
        }))?,
    }

    Ok(())
}

/// Run the `deck purge-orphans` command
pub async fn purge_orphans(
    args: &PurgeOrphansArgs,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let library = open_library(&args.backend_config).await?;
    let removed = library.purge_orphaned_cards().await?;
    persist(&library, &args.backend_config).await?;

    match format {
        OutputFormat::Human => println!("Removed {removed} orphaned card(s)."),
        OutputFormat::Json => print_json(&serde_json::json!({ "removed": removed }))?,
    }

    Ok(())
}
