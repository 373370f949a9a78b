pub mod adjustments;
pub mod config_reader;
pub mod odds;
pub mod report;

use log::{debug, info, warn};

use snafu::{prelude::*, Snafu};
use stv_count::*;

use std::fs;

use serde_json::json;
use serde_json::Map as JSMap;
use serde_json::Value as JSValue;
use text_diff::print_diff;

use crate::args::Args;
use crate::sim::adjustments::apply_adjustments;
use crate::sim::config_reader::*;
use crate::sim::odds::{FileOddsFeed, OddsBoard};
use crate::sim::report::render_report;

#[derive(Debug, Snafu)]
pub enum SimError {
    #[snafu(display("Error opening file {path}"))]
    OpeningJson {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error parsing JSON: {source}"))]
    ParsingJson { source: serde_json::Error },
    #[snafu(display("Error writing the summary to {path}"))]
    WritingSummary {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Invalid contest: {source}"))]
    Voting { source: VotingErrors },

    #[snafu(whatever, display("{message}"))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error>, Some)))]
        source: Option<Box<dyn std::error::Error>>,
    },
}

pub type SimResult<T> = Result<T, SimError>;

fn result_stats_to_json(roster: &Roster, rs: &CountResult) -> Vec<JSValue> {
    let mut l: Vec<JSValue> = Vec::new();
    let num_rounds = rs.rounds.len();
    for (idx, round) in rs.rounds.iter().enumerate() {
        let mut tally: JSMap<String, JSValue> = JSMap::new();
        for (key, count) in round.votes.iter() {
            tally.insert(
                roster.display_name(key).to_string(),
                json!(count.to_string()),
            );
        }

        let mut tally_results: Vec<JSValue> = Vec::new();
        // An eliminated candidate is reported in the last round they appear in.
        if let Some(eliminated) = rs.rounds.get(idx + 1).and_then(|next| {
            next.eliminated.as_ref().map(|key| (key, &next.transfer_to))
        }) {
            let (key, transfer_to) = eliminated;
            let mut transfers: JSMap<String, JSValue> = JSMap::new();
            for (to, count) in transfer_to.iter() {
                transfers.insert(roster.display_name(to).to_string(), json!(count.to_string()));
            }
            tally_results.push(json!({
                "eliminated": roster.display_name(key),
                "transfers": transfers
            }));
        }
        if idx == num_rounds - 1 {
            if let Some(winner) = &rs.winner {
                tally_results.push(json!({
                    "elected": roster.display_name(winner),
                    "transfers": {}
                }));
            }
        }

        let js = json!({
            "round": round.round,
            "description": round.description,
            "tally": tally,
            "tallyResults": tally_results
        });
        l.push(js);
    }
    l
}

fn build_summary_js(config: &ScenarioConfig, sim: &Simulation, rs: &CountResult) -> JSValue {
    let settings = config.output_settings();
    let c = OutputConfig {
        contest: settings.contest_name,
        date: settings.contest_date,
        jurisdiction: settings.contest_jurisdiction,
        office: settings.contest_office,
        threshold: Some(rs.quota.to_string()),
        total_votes: Some(rs.total_votes.to_string()),
        turnout: Some(sim.election().turnout().to_string()),
    };
    let winner = rs
        .winner
        .as_ref()
        .map(|key| sim.roster().display_name(key).to_string());
    json!({
        "config": c,
        "results": result_stats_to_json(sim.roster(), rs),
        "winner": winner
    })
}

pub fn run_simulation(args: &Args) -> SimResult<()> {
    let config = match &args.config {
        Some(path) => read_config(path)?,
        None => ScenarioConfig::default(),
    };
    info!("config: {:?}", config);

    let sim = build_simulation(&config)?;
    let sim = apply_adjustments(&sim, args)?;

    let mut board = OddsBoard::new(sim.odds().clone());
    if let Some(path) = &args.odds {
        board.refresh(&FileOddsFeed::new(path), sim.roster());
    }
    let sim = sim.with_odds(board.odds().clone());

    let result = sim.outcome().context(VotingSnafu {})?;
    debug!("result: {:?}", result);

    // Assemble the final json
    let result_js = build_summary_js(&config, &sim, &result);
    let pretty_js_stats = serde_json::to_string_pretty(&result_js).context(ParsingJsonSnafu {})?;

    match args.out.as_deref() {
        Some("stdout") => println!("{}", pretty_js_stats),
        other => {
            let contest = config.output_settings().contest_name;
            for line in render_report(&contest, &sim, &result, board.last_updated()) {
                println!("{}", line);
            }
            if let Some(path) = other.filter(|p| !p.is_empty()) {
                fs::write(path, &pretty_js_stats).context(WritingSummarySnafu { path })?;
                info!("summary written to {}", path);
            }
        }
    }

    // The reference summary, if provided for comparison
    if let Some(summary_p) = &args.reference {
        check_reference(summary_p, &pretty_js_stats)?;
    }

    Ok(())
}

fn check_reference(summary_p: &str, pretty_js_stats: &str) -> SimResult<()> {
    let summary_ref = read_summary(summary_p)?;
    debug!("summary: {:?}", summary_ref);
    let pretty_js_summary_ref =
        serde_json::to_string_pretty(&summary_ref).context(ParsingJsonSnafu {})?;
    if pretty_js_summary_ref != pretty_js_stats {
        warn!("Found differences with the reference string");
        print_diff(pretty_js_summary_ref.as_str(), pretty_js_stats, "\n");
        whatever!("Difference detected between calculated summary and reference summary")
    }
    Ok(())
}

#[cfg(test)]
fn test_wrapper(test_name: &str) {
    let _ = env_logger::builder().is_test(true).try_init();
    let test_dir = format!("{}/tests/{}", env!("CARGO_MANIFEST_DIR"), test_name);
    info!("Running test {}", test_name);
    let args = Args {
        config: Some(format!("{}/{}_config.json", test_dir, test_name)),
        reference: Some(format!("{}/{}_expected_summary.json", test_dir, test_name)),
        ..Args::default()
    };
    let res = run_simulation(&args);
    if let Err(e) = &res {
        eprintln!("An error occured {}", e);
    }
    assert!(res.is_ok());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_2025() {
        test_wrapper("default_2025");
    }

    #[test]
    fn first_round_majority() {
        test_wrapper("first_round_majority");
    }

    #[test]
    fn runoff_tie_candidate_order() {
        test_wrapper("runoff_tie_candidate_order");
    }

    #[test]
    fn summary_lists_elimination_before_transfer() {
        let config = ScenarioConfig::default();
        let sim = build_simulation(&config).unwrap();
        let rs = sim.outcome().unwrap();
        let js = build_summary_js(&config, &sim, &rs);
        assert_eq!(js["config"]["threshold"], json!("1080001"));
        assert_eq!(js["config"]["totalVotes"], json!("2160000"));
        assert_eq!(js["results"][0]["tally"]["Jim Gavin"], json!("734400"));
        assert_eq!(
            js["results"][0]["tallyResults"][0]["eliminated"],
            json!("Catherine Connolly")
        );
        assert_eq!(
            js["results"][0]["tallyResults"][0]["transfers"]["Heather Humphreys"],
            json!("427680")
        );
        assert_eq!(
            js["results"][1]["description"],
            json!("Connolly eliminated - votes transferred")
        );
        assert_eq!(
            js["results"][1]["tallyResults"][0]["elected"],
            json!("Heather Humphreys")
        );
        assert!(js["results"][1]["tally"].get("Catherine Connolly").is_none());
        assert_eq!(js["winner"], json!("Heather Humphreys"));
    }

    #[test]
    fn adjustments_change_the_summary() {
        let args = Args {
            transfer: vec!["connolly:gavin=80".to_string()],
            ..Args::default()
        };
        let config = ScenarioConfig::default();
        let sim = apply_adjustments(&build_simulation(&config).unwrap(), &args).unwrap();
        let rs = sim.outcome().unwrap();
        let js = build_summary_js(&config, &sim, &rs);
        assert_eq!(js["winner"], json!("Jim Gavin"));
        assert_eq!(js["results"][1]["tally"]["Jim Gavin"], json!("1304640"));
    }

    #[test]
    fn reference_mismatch_is_an_error() {
        let test_dir = format!("{}/tests/default_2025", env!("CARGO_MANIFEST_DIR"));
        let args = Args {
            config: Some(format!("{}/default_2025_config.json", test_dir)),
            reference: Some(format!("{}/default_2025_expected_summary.json", test_dir)),
            turnout: Some("70".to_string()),
            ..Args::default()
        };
        assert!(run_simulation(&args).is_err());
    }

    #[test]
    fn missing_config_file() {
        let args = Args {
            config: Some("/nonexistent/scenario.json".to_string()),
            ..Args::default()
        };
        let res = run_simulation(&args);
        assert!(matches!(res, Err(SimError::OpeningJson { .. })));
    }
}
