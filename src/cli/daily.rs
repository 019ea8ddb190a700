//! Daily, answer and practice commands

use std::io::{BufRead, Write};

use anyhow::{bail, Result};

use tunedle::{DailyStatus, Error, Question};

use super::App;

/// Typo tolerance when a guess does not name an option exactly
const SIMILARITY_THRESHOLD: f64 = 0.85;

/// How far the best fuzzy match must lead the runner-up
const SIMILARITY_MARGIN: f64 = 0.05;

/// Leading words every option shares, lowercased, with the trailing space
fn shared_prefix(options: &[String]) -> String {
    let mut lowered = options.iter().map(|o| o.to_lowercase());
    let Some(first) = lowered.next() else {
        return String::new();
    };
    let mut words: Vec<&str> = first.split_inclusive(' ').collect();
    for option in lowered {
        let shared = words
            .iter()
            .zip(option.split_inclusive(' '))
            .take_while(|(a, b)| **a == *b && a.ends_with(' '))
            .count();
        words.truncate(shared);
    }
    // a single option shares nothing with anything
    if options.len() < 2 {
        words.clear();
    }
    words.concat()
}

/// Map a typed guess onto one of the answer options.
///
/// Case-insensitive equality wins. Otherwise the words all options share
/// (e.g. "pokemon ") are ignored and the closest option is taken, provided
/// it is above the Jaro-Winkler threshold and clearly ahead of the next one.
pub fn match_guess<'a>(options: &'a [String], guess: &str) -> Option<&'a str> {
    let guess = guess.trim().to_lowercase();
    if let Some(exact) = options.iter().find(|o| o.to_lowercase() == guess) {
        return Some(exact.as_str());
    }

    let prefix = shared_prefix(options);
    let core = guess.strip_prefix(prefix.as_str()).unwrap_or(&guess);
    let mut scored: Vec<(&String, f64)> = options
        .iter()
        .map(|o| {
            let option = o.to_lowercase();
            let option_core = option.strip_prefix(prefix.as_str()).unwrap_or(&option);
            (o, strsim::jaro_winkler(option_core, core))
        })
        .collect();
    scored.sort_by(|a, b| b.1.total_cmp(&a.1));

    match scored.as_slice() {
        [(best, score), rest @ ..]
            if *score >= SIMILARITY_THRESHOLD
                && rest.first().is_none_or(|(_, next)| score - next >= SIMILARITY_MARGIN) =>
        {
            let best: &'a String = *best;
            Some(best.as_str())
        }
        _ => None,
    }
}

fn print_question(question: &Question) {
    println!("Track: {}", question.item.media_ref);
    println!("Which game is it from?");
    for (i, option) in question.options.iter().enumerate() {
        println!("  {:>2}. {}", i + 1, option);
    }
}

/// Resolve a guess typed as an option number or a (fuzzy) name
fn resolve_guess(question: &Question, input: &str) -> Result<String> {
    if let Ok(n) = input.trim().parse::<usize>() {
        if let Some(option) = n.checked_sub(1).and_then(|i| question.options.get(i)) {
            return Ok(option.clone());
        }
    }
    match match_guess(&question.options, input) {
        Some(option) => Ok(option.to_string()),
        None => bail!("'{}' is not one of the options", input.trim()),
    }
}

pub async fn daily_command(app: &App) -> Result<()> {
    let ctx = app.context();
    match app.engine.daily_status(&ctx).await? {
        DailyStatus::Completed {
            current_streak,
            best_streak,
        } => {
            println!("Today's challenge is done. Come back tomorrow!");
            println!("Streak: {} (best {})", current_streak, best_streak);
        }
        DailyStatus::Available { date, question } => {
            println!("Daily challenge for {}\n", date);
            print_question(&question);
            println!("\nAnswer with: tunedle answer <game>");
        }
    }
    Ok(())
}

pub async fn answer_command(app: &App, guess: &str) -> Result<()> {
    let ctx = app.context();
    let question = app.engine.daily_question(ctx.today).await?;
    let guess = resolve_guess(&question, guess)?;

    let outcome = match app.engine.submit_daily_answer(&ctx, &guess).await {
        Ok(outcome) => outcome,
        Err(Error::DuplicateCompletionAttempt { date }) => {
            println!("You already answered the challenge for {}.", date);
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    if outcome.correct {
        println!("Correct! \"{}\" is from {}.", outcome.item.title, outcome.item.category);
    } else {
        println!(
            "Wrong - \"{}\" is from {}.",
            outcome.item.title, outcome.item.category
        );
    }
    println!("{}", outcome.milestone);
    println!(
        "Streak: {} (best {})",
        outcome.streak.current_streak, outcome.streak.best_streak
    );
    if outcome.degraded {
        println!("(offline: progress saved locally)");
    }
    Ok(())
}

pub async fn practice_command(app: &App) -> Result<()> {
    let question = app.engine.practice_question().await?;
    print_question(&question);

    print!("\nYour guess: ");
    std::io::stdout().flush()?;
    let mut line = String::new();
    std::io::stdin().lock().read_line(&mut line)?;

    let guess = resolve_guess(&question, &line)?;
    if question.is_correct(&guess) {
        println!("Correct! \"{}\" is from {}.", question.item.title, question.item.category);
    } else {
        println!(
            "Wrong - \"{}\" is from {}.",
            question.item.title, question.item.category
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options() -> Vec<String> {
        vec![
            "Pokemon Red Blue".to_string(),
            "Pokemon Gold Silver".to_string(),
            "Pokemon Ruby Sapphire".to_string(),
        ]
    }

    #[test]
    fn test_match_guess_case_insensitive() {
        assert_eq!(match_guess(&options(), "pokemon gold silver"), Some("Pokemon Gold Silver"));
    }

    #[test]
    fn test_match_guess_tolerates_typos() {
        assert_eq!(match_guess(&options(), "Pokemon Rubby Saphire"), Some("Pokemon Ruby Sapphire"));
        assert_eq!(match_guess(&options(), "rubby saphire"), Some("Pokemon Ruby Sapphire"));
        assert_eq!(match_guess(&options(), "Zelda"), None);
    }

    #[test]
    fn test_off_list_game_with_shared_prefix_is_rejected() {
        assert_eq!(match_guess(&options(), "Pokemon Crystal"), None);
        assert_eq!(match_guess(&options(), "Pokemon Emerald"), None);
        assert_eq!(match_guess(&options(), "Pokemon"), None);
    }

    #[test]
    fn test_shared_prefix_is_whole_words() {
        assert_eq!(shared_prefix(&options()), "pokemon ");
        let options = vec!["Mario Kart".to_string(), "Mario Party".to_string(), "Metroid".to_string()];
        assert_eq!(shared_prefix(&options), "");
    }
}
