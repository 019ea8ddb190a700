//! Login and logout commands

use anyhow::{bail, Context, Result};

use tunedle::storage::SavedSession;
use tunedle::AuthTransition;

use super::App;

pub async fn login_command(app: &App, email: &str, password: &str) -> Result<()> {
    let Some(rest) = &app.rest else {
        bail!(
            "Remote store not configured (missing {}).\nRun `tunedle init` and fill in [remote].",
            app.config.missing_remote_settings().join(", ")
        );
    };

    let session = rest.sign_in(email, password).await.context("Sign-in failed")?;
    app.engine.store().local().save_session(&SavedSession {
        user: session.user.clone(),
        access_token: Some(session.access_token),
    })?;

    match app.engine.on_auth_change(Some(session.user.clone())).await? {
        AuthTransition::SignedIn {
            favorites,
            stats,
            degraded,
            ..
        } => {
            println!("Signed in as {}", session.user.email);
            println!("Favorites: {}  Plays: {}", favorites, stats.total_plays);
            if degraded {
                println!("(remote partly unavailable, showing local copy)");
            }
        }
        _ => println!("Already signed in as {}", session.user.email),
    }
    Ok(())
}

pub async fn logout_command(app: &App) -> Result<()> {
    if let Some(rest) = &app.rest {
        rest.sign_out().await?;
    }
    match app.engine.on_auth_change(None).await? {
        AuthTransition::SignedOut { cleared_favorites } => {
            println!("Signed out ({} cached favorites cleared)", cleared_favorites);
        }
        _ => println!("Not signed in."),
    }
    Ok(())
}
