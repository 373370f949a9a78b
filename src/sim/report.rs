use crate::sim::*;

use chrono::{DateTime, Utc};

fn percent(votes: u64, total_votes: u64) -> String {
    format!("{:.1}%", vote_share(votes, total_votes))
}

/// Renders the state of the simulation and the rounds of the count as lines
/// of text.
pub fn render_report(
    contest: &str,
    sim: &Simulation,
    result: &CountResult,
    odds_updated: Option<DateTime<Utc>>,
) -> Vec<String> {
    let roster = sim.roster();
    let election = sim.election();
    let mut lines: Vec<String> = vec![
        contest.to_string(),
        format!(
            "Electorate: {}  Turnout: {}%  Valid votes: {}  Quota: {}",
            election.electorate(),
            election.turnout(),
            result.total_votes,
            result.quota
        ),
        String::new(),
        "Candidates:".to_string(),
    ];
    for c in roster.candidates() {
        let party = if c.party.is_empty() {
            String::new()
        } else {
            format!(" ({})", c.party)
        };
        let odds = sim
            .odds()
            .get(&c.key)
            .map(|o| format!(", odds {}", o))
            .unwrap_or_default();
        lines.push(format!("  {}{}{}", c.name, party, odds));
    }
    if let Some(ts) = odds_updated {
        lines.push(format!("  odds updated {}", ts.format("%Y-%m-%d %H:%M:%S UTC")));
    }

    lines.push(String::new());
    lines.push("First preferences:".to_string());
    for (key, pct) in sim.first_preferences().iter() {
        let lock = if sim.locks().is_locked(key) {
            " [locked]"
        } else {
            ""
        };
        lines.push(format!("  {}: {}%{}", roster.short_name(key), pct, lock));
    }

    if sim.hide_transfers() {
        lines.push("No transfers: a candidate holds a majority of first preferences".to_string());
    } else if let Some(focus) = sim.transfer_focus() {
        lines.push(format!("Transfers from {}:", roster.short_name(focus)));
        for (to, pct) in sim.transfers().row(focus).unwrap_or_default() {
            lines.push(format!("  -> {}: {}%", roster.short_name(to), pct));
        }
    }

    for round in result.rounds.iter() {
        lines.push(String::new());
        lines.push(format!("Round {}: {}", round.round, round.description));
        if round.eliminated.is_some() {
            lines.push(format!("  {} votes transferred", round.transferred));
            for (to, gained) in round.transfer_to.iter() {
                lines.push(format!("  {}: +{}", roster.display_name(to), gained));
            }
        }
        for (key, votes) in round.votes.iter() {
            lines.push(format!(
                "  {}: {} ({})",
                roster.display_name(key),
                votes,
                percent(*votes, result.total_votes)
            ));
        }
    }

    lines.push(String::new());
    match &result.winner {
        Some(winner) if first_round_majority(result) => lines.push(format!(
            "Winner: {} (elected on first preferences)",
            roster.display_name(winner)
        )),
        Some(winner) => {
            let tiebreak = if result.runoff_tiebreak {
                ", tie broken by candidate order"
            } else {
                ""
            };
            lines.push(format!(
                "Winner: {} (elected in round {}{})",
                roster.display_name(winner),
                result.rounds.len(),
                tiebreak
            ))
        }
        None => lines.push("No winner".to_string()),
    }
    if result.elimination_tiebreak {
        lines.push("The elimination was decided by candidate order".to_string());
    }
    lines
}
