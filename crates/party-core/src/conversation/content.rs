//! Turn Content
//!
//! Chooses the text of one turn from catalog attributes and the pair's
//! history. Always produces something: when every rule is exhausted a filler
//! line is used.

use party_events::{Entity, Turn};
use rand::seq::SliceRandom;
use rand::Rng;

/// Rank gap at or below which two entities celebrate being "top N" together
const TOP_RANK_DELTA: u32 = 3;

const FILLER: &[&str] = &[
    "Great party, isn't it?",
    "What are you working on these days?",
    "Have you tried the snacks?",
    "Nice to meet you!",
    "Busy term so far?",
];

/// Candidate lines `speaker` could say to `listener`, before history filtering.
pub fn candidates(speaker: &Entity, listener: &Entity, history: &[Turn]) -> Vec<String> {
    let mut lines = Vec::new();

    if speaker.rank_delta(listener) <= TOP_RANK_DELTA {
        lines.push(format!(
            "We're both top {}!",
            speaker.rank.max(listener.rank)
        ));
    } else {
        lines.push(format!("Rank #{} meets #{}", speaker.rank, listener.rank));
    }

    if speaker.same_country(listener) {
        lines.push(format!("{} represent! 🎓", speaker.location.country));
    } else {
        lines.push(format!(
            "{} × {}",
            speaker.location.country, listener.location.country
        ));
    }

    for tag in speaker.shared_tags(listener) {
        let line = format!("Both strong in {}", tag);
        if !history.iter().any(|turn| turn.text == line) {
            lines.push(line);
        }
    }

    if !speaker.location.city.is_empty() {
        lines.push(format!("Greetings from {}!", speaker.location.city));
    }

    lines
}

/// Picks the next turn's text.
///
/// Lines already said in this conversation are skipped; the remaining
/// candidates are equally likely.
pub fn compose_turn<R: Rng + ?Sized>(
    speaker: &Entity,
    listener: &Entity,
    history: &[Turn],
    rng: &mut R,
) -> String {
    let fresh: Vec<String> = candidates(speaker, listener, history)
        .into_iter()
        .filter(|line| !history.iter().any(|turn| &turn.text == line))
        .collect();

    if let Some(line) = fresh.choose(rng) {
        return line.clone();
    }
    filler(history, rng)
}

fn filler<R: Rng + ?Sized>(history: &[Turn], rng: &mut R) -> String {
    let unused: Vec<&str> = FILLER
        .iter()
        .copied()
        .filter(|line| !history.iter().any(|turn| turn.text == *line))
        .collect();
    let pool = if unused.is_empty() { FILLER } else { &unused[..] };
    pool.choose(rng).copied().unwrap_or(FILLER[0]).to_string()
}
