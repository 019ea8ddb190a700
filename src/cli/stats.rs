//! Streak and stats commands

use anyhow::Result;

use super::App;

pub fn streak_command(app: &App) -> Result<()> {
    let state = app.engine.streak(&app.context())?;
    println!("Current streak: {}", state.current_streak);
    println!("Best streak:    {}", state.best_streak);
    println!(
        "Today:          {}",
        if state.daily_completed { "done" } else { "not played yet" }
    );
    println!("Completions:    {}", state.total_completions);
    Ok(())
}

pub async fn stats_command(app: &App) -> Result<()> {
    let ctx = app.context();
    let stats = app.engine.stats(&ctx).await?;
    let s = stats.value;
    println!("Profile:   {}", ctx.profile.storage_key());
    println!("Played:    {}", s.total_plays);
    println!("Correct:   {}", s.correct_answers);
    println!("Accuracy:  {}%", s.accuracy_percent());
    println!("Best:      {}", s.best_streak);
    if stats.degraded {
        println!("(offline: showing local copy)");
    }
    Ok(())
}
