//! Favorite management commands

use anyhow::{Context, Result};
use clap::Subcommand;

use tunedle::FavoriteRef;

use super::App;

#[derive(Subcommand)]
pub enum FavoriteAction {
    /// Mark a track as favorite
    Add {
        /// Game the track belongs to
        #[arg(long)]
        game: String,
        /// Track title
        #[arg(long)]
        track: String,
    },

    /// Remove a favorite
    Remove {
        #[arg(long)]
        game: String,
        #[arg(long)]
        track: String,
    },

    /// List favorites
    List {
        /// Group by the generation of each game
        #[arg(long)]
        by_generation: bool,
    },
}

pub async fn favorite_command(app: &App, action: FavoriteAction) -> Result<()> {
    let ctx = app.context();
    match action {
        FavoriteAction::Add { game, track } => {
            let stored = app
                .engine
                .add_favorite(&ctx, &FavoriteRef::by_name(game, track))
                .await
                .context("Failed to add favorite")?;
            println!("Added: {}", stored.value.key());
            if stored.value.canonical_id.is_none() && ctx.profile.is_authenticated() {
                println!("(track not found in the catalog, kept by name)");
            }
            if stored.degraded {
                println!("(offline: saved locally)");
            }
        }
        FavoriteAction::Remove { game, track } => {
            let favorite = FavoriteRef::by_name(game, track);
            app.engine
                .remove_favorite(&ctx, &favorite)
                .await
                .context("Failed to remove favorite")?;
            println!("Removed: {}", favorite.key());
        }
        FavoriteAction::List { by_generation } => {
            if by_generation {
                let groups = app.engine.favorites_by_generation(&ctx).await?;
                if groups.is_empty() {
                    println!("No favorites yet.");
                }
                for (generation, favorites) in groups {
                    println!("Generation {}:", generation);
                    for favorite in favorites {
                        println!("  {} - {}", favorite.category, favorite.title);
                    }
                }
            } else {
                let favorites = app.engine.favorites(&ctx)?;
                if favorites.is_empty() {
                    println!("No favorites yet.");
                }
                for favorite in favorites {
                    println!("  {} - {}", favorite.category, favorite.title);
                }
            }
        }
    }
    Ok(())
}
