mod config;

pub mod balancer;
pub mod builder;
pub mod manual;
pub mod presets;
pub mod state;

use log::{debug, info, warn};

use std::ops::Add;

pub use crate::balancer::{set_preference, set_transfer_split, toggle_lock};
pub use crate::config::*;
pub use crate::state::*;

// **** Private structures ****

// Index of a candidate in the roster.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Ord, PartialOrd)]
struct CandidateId(usize);

#[derive(Eq, PartialEq, Debug, Clone, Copy, PartialOrd, Ord, Hash)]
struct VoteCount(u64);

impl VoteCount {
    const EMPTY: VoteCount = VoteCount(0);
}

impl std::iter::Sum for VoteCount {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        VoteCount(iter.fold(0, |acc: u64, vc| acc.saturating_add(vc.0)))
    }
}

impl Add for VoteCount {
    type Output = VoteCount;
    fn add(self: VoteCount, rhs: VoteCount) -> VoteCount {
        VoteCount(self.0.saturating_add(rhs.0))
    }
}

/// The number of votes needed to win outright: a strict majority.
pub fn quota(total_votes: u64) -> u64 {
    total_votes / 2 + 1
}

/// `round(votes * pct / 100)`, rounding halves up.
///
/// The rounding of each share is independent, so shares of the same total may
/// not add up exactly to that total. The product is taken in 128 bits, so any
/// count of votes is accepted for `pct <= 100`.
pub fn share_of(votes: u64, pct: u32) -> u64 {
    let res = (votes as u128 * pct as u128 + 50) / 100;
    u64::try_from(res).unwrap_or(u64::MAX)
}

/// Runs the count with the default rules.
///
/// Arguments:
/// * `roster` the candidates, in enumeration order
/// * `prefs` the first-preference shares
/// * `transfers` how the votes of an eliminated candidate split
/// * `total_votes` the number of valid votes
pub fn count(
    roster: &Roster,
    prefs: &FirstPreferences,
    transfers: &TransferTable,
    total_votes: u64,
) -> Result<CountResult, VotingErrors> {
    count_with_rules(
        roster,
        prefs,
        transfers,
        total_votes,
        &CountRules::DEFAULT_RULES,
    )
}

/// Runs the count with explicit tie-break rules.
///
/// The result only depends on the arguments: calling it twice with the same
/// inputs gives the same rounds and winner.
pub fn count_with_rules(
    roster: &Roster,
    prefs: &FirstPreferences,
    transfers: &TransferTable,
    total_votes: u64,
    rules: &CountRules,
) -> Result<CountResult, VotingErrors> {
    check_inputs(roster, prefs, transfers)?;

    let vote_threshold = VoteCount(quota(total_votes));
    info!(
        "Counting {} votes, candidates: {:?}, quota: {}",
        total_votes,
        roster.keys().collect::<Vec<_>>(),
        vote_threshold.0
    );

    // Round 1
    let tally: Vec<(CandidateId, VoteCount)> = prefs
        .iter()
        .enumerate()
        .map(|(idx, (_, pct))| (CandidateId(idx), VoteCount(share_of(total_votes, pct))))
        .collect();
    debug!("count: first round tally: {:?}", tally);
    let counted: VoteCount = tally.iter().map(|(_, vc)| *vc).sum();
    let drift = total_votes as i128 - counted.0 as i128;
    if drift != 0 {
        debug!("count: rounding drift in the first round: {}", drift);
    }

    let mut rounds: Vec<Round> = vec![Round {
        round: 1,
        votes: named_tally(roster, &tally),
        eliminated: None,
        transferred: 0,
        transfer_to: Vec::new(),
        description: "First Preference Count".to_string(),
    }];
    log_round(roster, &rounds[0]);

    // Only one candidate can hold a strict majority of a positive total.
    if let Some((cid, vc)) = tally.iter().find(|(_, vc)| *vc >= vote_threshold) {
        let winner = key_of(roster, *cid);
        info!(
            "{} reached the quota in the first round with {} votes",
            winner, vc.0
        );
        return Ok(CountResult {
            rounds,
            winner: Some(winner),
            quota: vote_threshold.0,
            total_votes,
            elimination_tiebreak: false,
            runoff_tiebreak: false,
        });
    }

    // Elimination
    let (eliminated, elimination_tiebreak) =
        find_eliminated_candidate(&tally, rules.elimination_tiebreak);
    let eliminated_key = key_of(roster, eliminated);
    let eliminated_votes = tally
        .iter()
        .find(|(cid, _)| *cid == eliminated)
        .map(|(_, vc)| *vc)
        .unwrap_or(VoteCount::EMPTY);
    if elimination_tiebreak {
        warn!(
            "Several candidates share the lowest count ({} votes), eliminating {}",
            eliminated_votes.0, eliminated_key
        );
    }

    // Transfers
    let transfer_row = transfers
        .row(&eliminated_key)
        .ok_or_else(|| VotingErrors::InvalidTransferRow(eliminated_key.clone()))?;
    let mut transfer_to: Vec<(CandidateId, VoteCount)> = Vec::new();
    for (to, pct) in transfer_row.iter() {
        let cid = CandidateId(roster.position(to)?);
        transfer_to.push((cid, VoteCount(share_of(eliminated_votes.0, *pct))));
    }
    // The transfers are listed in roster order, whatever the order of the row.
    transfer_to.sort_by_key(|(cid, _)| *cid);
    debug!(
        "count: transferring {} votes of {}: {:?}",
        eliminated_votes.0, eliminated_key, transfer_to
    );

    // Round 2
    let second_tally: Vec<(CandidateId, VoteCount)> = tally
        .iter()
        .filter(|(cid, _)| *cid != eliminated)
        .map(|(cid, vc)| {
            let gained = transfer_to
                .iter()
                .find(|(to, _)| to == cid)
                .map(|(_, gained)| *gained)
                .unwrap_or(VoteCount::EMPTY);
            (*cid, *vc + gained)
        })
        .collect();
    debug!("count: second round tally: {:?}", second_tally);

    rounds.push(Round {
        round: 2,
        votes: named_tally(roster, &second_tally),
        eliminated: Some(eliminated_key.clone()),
        transferred: eliminated_votes.0,
        transfer_to: named_tally(roster, &transfer_to),
        description: format!(
            "{} eliminated - votes transferred",
            roster.short_name(&eliminated_key)
        ),
    });
    log_round(roster, &rounds[1]);

    // No quota in the second round: the leader wins.
    let (winner, runoff_tiebreak) = find_runoff_winner(&second_tally, rules.runoff_tiebreak);
    let winner_key = key_of(roster, winner);
    if runoff_tiebreak {
        warn!(
            "Second round is tied, {} wins by tie-break ({:?})",
            winner_key, rules.runoff_tiebreak
        );
    }
    info!("Winner: {}", winner_key);

    Ok(CountResult {
        rounds,
        winner: Some(winner_key),
        quota: vote_threshold.0,
        total_votes,
        elimination_tiebreak,
        runoff_tiebreak,
    })
}

fn check_inputs(
    roster: &Roster,
    prefs: &FirstPreferences,
    transfers: &TransferTable,
) -> Result<(), VotingErrors> {
    prefs.check_roster(roster)?;
    transfers.check_roster(roster)
}

fn key_of(roster: &Roster, cid: CandidateId) -> String {
    roster.candidates()[cid.0].key.clone()
}

fn named_tally(roster: &Roster, tally: &[(CandidateId, VoteCount)]) -> Vec<(String, u64)> {
    tally
        .iter()
        .map(|(cid, vc)| (key_of(roster, *cid), vc.0))
        .collect()
}

fn log_round(roster: &Roster, round: &Round) {
    info!("Round {}: {}", round.round, round.description);
    for (key, votes) in round.votes.iter() {
        match round.transfer_for(key) {
            Some(gained) => info!(
                "{:>12} {} (+{})",
                votes,
                roster.display_name(key),
                gained
            ),
            None => info!("{:>12} {}", votes, roster.display_name(key)),
        }
    }
}

// Picks among the candidates with the same count, which are given in roster order.
fn pick_by_order(tied: &[CandidateId], tiebreak: TieBreakMode) -> Option<CandidateId> {
    match tiebreak {
        TieBreakMode::UseCandidateOrder => tied.first().cloned(),
        TieBreakMode::ReverseCandidateOrder => tied.last().cloned(),
    }
}

/// The candidate with the lowest count, and whether a tie had to be broken.
fn find_eliminated_candidate(
    tally: &[(CandidateId, VoteCount)],
    tiebreak: TieBreakMode,
) -> (CandidateId, bool) {
    let min_count: VoteCount = tally
        .iter()
        .map(|(_, vc)| *vc)
        .min()
        .unwrap_or(VoteCount::EMPTY);
    let all_smallest: Vec<CandidateId> = tally
        .iter()
        .filter_map(|(cid, vc)| if *vc <= min_count { Some(*cid) } else { None })
        .collect();
    debug!("find_eliminated_candidate: all_smallest: {:?}", all_smallest);
    let eliminated = pick_by_order(&all_smallest, tiebreak).unwrap_or(CandidateId(0));
    (eliminated, all_smallest.len() > 1)
}

/// The candidate with the highest count, and whether a tie had to be broken.
fn find_runoff_winner(
    tally: &[(CandidateId, VoteCount)],
    tiebreak: TieBreakMode,
) -> (CandidateId, bool) {
    let max_count: VoteCount = tally
        .iter()
        .map(|(_, vc)| *vc)
        .max()
        .unwrap_or(VoteCount::EMPTY);
    let all_largest: Vec<CandidateId> = tally
        .iter()
        .filter_map(|(cid, vc)| if *vc >= max_count { Some(*cid) } else { None })
        .collect();
    debug!("find_runoff_winner: all_largest: {:?}", all_largest);
    let winner = pick_by_order(&all_largest, tiebreak).unwrap_or(CandidateId(0));
    (winner, all_largest.len() > 1)
}
