//! The application state threaded through the count.
//!
//! A [`Simulation`] is never mutated. Each user action produces a new
//! simulation, and the count is recomputed from scratch from its inputs.

use std::sync::Arc;

use log::debug;

use crate::balancer;
use crate::config::*;

pub const DEFAULT_ELECTORATE: u64 = 3_600_000;
pub const DEFAULT_TURNOUT: u32 = 60;
pub const MIN_TURNOUT: u32 = 40;
pub const MAX_TURNOUT: u32 = 80;

/// The share above which the transfer editor is hidden.
pub const HIDE_TRANSFERS_SHARE: u32 = 51;

/// The size of the electorate and the turnout, from which the number of valid
/// votes and the quota derive.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub struct ElectionState {
    electorate: u64,
    turnout: u32,
}

impl ElectionState {
    /// The turnout is clamped into the range of the turnout slider.
    pub fn new(electorate: u64, turnout: impl Into<SliderValue>) -> ElectionState {
        ElectionState {
            electorate,
            turnout: turnout.into().clamp_to(MIN_TURNOUT, MAX_TURNOUT),
        }
    }

    pub fn electorate(&self) -> u64 {
        self.electorate
    }

    pub fn turnout(&self) -> u32 {
        self.turnout
    }

    /// `round(electorate * turnout / 100)`
    pub fn total_votes(&self) -> u64 {
        crate::share_of(self.electorate, self.turnout)
    }

    pub fn quota(&self) -> u64 {
        crate::quota(self.total_votes())
    }

    pub fn with_turnout(&self, turnout: impl Into<SliderValue>) -> ElectionState {
        ElectionState::new(self.electorate, turnout)
    }
}

impl Default for ElectionState {
    fn default() -> Self {
        ElectionState::new(DEFAULT_ELECTORATE, DEFAULT_TURNOUT)
    }
}

/// Betting odds for each candidate, as display strings such as `34%`.
///
/// Odds are shown next to the candidates and have no effect on the count.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct Odds {
    entries: Vec<(String, String)>,
}

impl Odds {
    pub fn new<S: AsRef<str>>(entries: &[(S, S)]) -> Odds {
        Odds {
            entries: entries
                .iter()
                .map(|(k, v)| (k.as_ref().to_string(), v.as_ref().to_string()))
                .collect(),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// A copy with the odds of one candidate replaced or added.
    pub fn with_entry(&self, key: &str, value: &str) -> Odds {
        let mut entries = self.entries.clone();
        let pos = entries.iter().position(|(k, _)| k == key);
        match pos {
            Some(idx) => entries[idx].1 = value.to_string(),
            None => entries.push((key.to_string(), value.to_string())),
        }
        Odds { entries }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// True when some candidate holds at least 51% of the first preferences.
///
/// This is how the editor decides that no second round will happen, and it
/// is looser than the quota: near the boundary it can disagree with
/// [`first_round_majority`].
pub fn hide_transfers(prefs: &FirstPreferences) -> bool {
    prefs.max_share() >= HIDE_TRANSFERS_SHARE
}

/// True when the count ended in the first round because someone reached the quota.
pub fn first_round_majority(result: &CountResult) -> bool {
    result.rounds.len() == 1 && result.winner.is_some()
}

/// The candidate with the lowest first-preference share, the earliest on ties.
///
/// Only the transfer row of this candidate is edited by the user.
pub fn transfer_focus(prefs: &FirstPreferences) -> Option<&str> {
    let mut res: Option<(&str, u32)> = None;
    for (key, pct) in prefs.iter() {
        if res.map_or(true, |(_, lowest)| pct < lowest) {
            res = Some((key, pct));
        }
    }
    res.map(|(key, _)| key)
}

/// The percentage of the valid votes, or zero when there are no votes.
pub fn vote_share(votes: u64, total_votes: u64) -> f64 {
    if total_votes == 0 {
        0.0
    } else {
        votes as f64 / total_votes as f64 * 100.0
    }
}

/// The full state of a simulated contest.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Simulation {
    roster: Arc<Roster>,
    prefs: FirstPreferences,
    locks: LockState,
    transfers: TransferTable,
    election: ElectionState,
    rules: CountRules,
    odds: Odds,
}

impl Simulation {
    /// Assembles a simulation. The inputs must belong to the roster.
    pub fn new(
        roster: Roster,
        prefs: FirstPreferences,
        transfers: TransferTable,
        election: ElectionState,
    ) -> Result<Simulation, VotingErrors> {
        prefs.check_roster(&roster)?;
        transfers.check_roster(&roster)?;
        let locks = LockState::unlocked(&roster);
        Ok(Simulation {
            roster: Arc::new(roster),
            prefs,
            locks,
            transfers,
            election,
            rules: CountRules::DEFAULT_RULES,
            odds: Odds::default(),
        })
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    pub fn first_preferences(&self) -> &FirstPreferences {
        &self.prefs
    }

    pub fn locks(&self) -> &LockState {
        &self.locks
    }

    pub fn transfers(&self) -> &TransferTable {
        &self.transfers
    }

    pub fn election(&self) -> &ElectionState {
        &self.election
    }

    pub fn rules(&self) -> &CountRules {
        &self.rules
    }

    pub fn odds(&self) -> &Odds {
        &self.odds
    }

    pub fn with_preference(
        &self,
        key: &str,
        raw: impl Into<SliderValue>,
    ) -> Result<Simulation, VotingErrors> {
        let prefs = balancer::set_preference(&self.prefs, &self.locks, key, raw)?;
        Ok(Simulation {
            prefs,
            ..self.clone()
        })
    }

    pub fn with_lock_toggled(&self, key: &str) -> Result<Simulation, VotingErrors> {
        let locks = balancer::toggle_lock(&self.locks, key)?;
        Ok(Simulation {
            locks,
            ..self.clone()
        })
    }

    pub fn with_transfer_split(
        &self,
        from: &str,
        to: &str,
        raw: impl Into<SliderValue>,
    ) -> Result<Simulation, VotingErrors> {
        let transfers = balancer::set_transfer_split(&self.transfers, from, to, raw)?;
        Ok(Simulation {
            transfers,
            ..self.clone()
        })
    }

    pub fn with_turnout(&self, turnout: impl Into<SliderValue>) -> Simulation {
        Simulation {
            election: self.election.with_turnout(turnout),
            ..self.clone()
        }
    }

    pub fn with_rules(&self, rules: CountRules) -> Simulation {
        Simulation {
            rules,
            ..self.clone()
        }
    }

    pub fn with_odds(&self, odds: Odds) -> Simulation {
        Simulation {
            odds,
            ..self.clone()
        }
    }

    /// Runs the count on the current inputs.
    pub fn outcome(&self) -> Result<CountResult, VotingErrors> {
        debug!(
            "outcome: prefs: {:?}, total votes: {}",
            self.prefs,
            self.election.total_votes()
        );
        crate::count_with_rules(
            &self.roster,
            &self.prefs,
            &self.transfers,
            self.election.total_votes(),
            &self.rules,
        )
    }

    pub fn hide_transfers(&self) -> bool {
        hide_transfers(&self.prefs)
    }

    pub fn transfer_focus(&self) -> Option<&str> {
        transfer_focus(&self.prefs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::presets::irish_presidential_2025;

    fn sim() -> Simulation {
        irish_presidential_2025().unwrap()
    }

    #[test]
    fn election_state_derivations() {
        let e = ElectionState::default();
        assert_eq!(e.total_votes(), 2_160_000);
        assert_eq!(e.quota(), 1_080_001);
        assert_eq!(ElectionState::new(3_600_000, 95).turnout(), MAX_TURNOUT);
        assert_eq!(ElectionState::new(3_600_000, "12").turnout(), MIN_TURNOUT);
        assert_eq!(ElectionState::new(3_600_000, "55").total_votes(), 1_980_000);
        assert_eq!(ElectionState::new(1_001, 50).total_votes(), 501);
    }

    #[test]
    fn large_electorate() {
        let e = ElectionState::new(1_000_000_000_000_000_000, 60);
        assert_eq!(e.total_votes(), 600_000_000_000_000_000);
        assert_eq!(e.quota(), 300_000_000_000_000_001);
        assert_eq!(ElectionState::new(u64::MAX, 80).total_votes(), 14_757_395_258_967_641_292);

        let base = sim();
        let s = Simulation::new(
            base.roster().clone(),
            base.first_preferences().clone(),
            base.transfers().clone(),
            e,
        )
        .unwrap();
        assert_eq!(s.outcome().unwrap().winner, Some("humphreys".to_string()));
    }

    #[test]
    fn mismatched_inputs_name_the_candidate() {
        let base = sim();
        let reordered = FirstPreferences::from_shares(vec![
            ("gavin".to_string(), 34),
            ("connolly".to_string(), 33),
            ("humphreys".to_string(), 33),
        ]);
        let res = Simulation::new(
            base.roster().clone(),
            reordered,
            base.transfers().clone(),
            ElectionState::default(),
        );
        assert_eq!(res, Err(VotingErrors::MissingCandidate("connolly".to_string())));

        let other = Roster::new(vec![
            Candidate::new("a", "A"),
            Candidate::new("b", "B"),
            Candidate::new("c", "C"),
        ])
        .unwrap();
        let res = Simulation::new(
            base.roster().clone(),
            base.first_preferences().clone(),
            TransferTable::even(&other),
            ElectionState::default(),
        );
        assert_eq!(res, Err(VotingErrors::InvalidTransferRow("a".to_string())));
    }

    #[test]
    fn hide_transfers_at_51() {
        let s = sim();
        assert!(!s.hide_transfers());
        for v in 51..=100 {
            let s2 = s.with_preference("gavin", v).unwrap();
            assert!(s2.hide_transfers(), "{}", v);
        }
        let s2 = s.with_preference("humphreys", 50).unwrap();
        assert!(!s2.hide_transfers());
    }

    #[test]
    fn share_gate_and_quota_can_disagree() {
        // With 10 votes, 51% of the share rounds to 5 votes, below the quota of 6.
        let base = sim();
        let s = Simulation::new(
            base.roster().clone(),
            base.first_preferences().clone(),
            base.transfers().clone(),
            ElectionState::new(25, 40),
        )
        .unwrap()
        .with_preference("connolly", 51)
        .unwrap();
        assert_eq!(s.election().total_votes(), 10);
        assert!(s.hide_transfers());
        let res = s.outcome().unwrap();
        assert_eq!(res.rounds[0].votes_for("connolly"), Some(5));
        assert!(!first_round_majority(&res));
        assert_eq!(res.rounds.len(), 2);

        let s = base.with_preference("connolly", 51).unwrap();
        assert!(s.hide_transfers());
        assert!(first_round_majority(&s.outcome().unwrap()));
    }

    #[test]
    fn focus_is_lowest_share() {
        let s = sim();
        // 33 / 34 / 33: the first of the tied candidates.
        assert_eq!(s.transfer_focus(), Some("connolly"));
        let s = s.with_preference("gavin", 20).unwrap();
        assert_eq!(s.transfer_focus(), Some("gavin"));
    }

    #[test]
    fn vote_share_of_empty_total() {
        assert_eq!(vote_share(10, 0), 0.0);
        assert_eq!(format!("{:.1}", vote_share(712_800, 2_160_000)), "33.0");
    }

    #[test]
    fn updates_leave_previous_state_alone() {
        let s = sim();
        let s2 = s.with_lock_toggled("gavin").unwrap();
        let s3 = s2.with_preference("connolly", 10).unwrap();
        assert_eq!(s.locks().locked(), None);
        assert_eq!(s2.first_preferences(), s.first_preferences());
        assert_eq!(s3.first_preferences().get("gavin"), Some(34));
        assert_eq!(s3.first_preferences().get("humphreys"), Some(56));
    }

    #[test]
    fn odds_do_not_change_the_count() {
        let s = sim();
        let s2 = s.with_odds(Odds::new(&[("connolly", "90%"), ("gavin", "5%")]));
        assert_eq!(s.outcome().unwrap(), s2.outcome().unwrap());
        assert_eq!(s2.odds().get("connolly"), Some("90%"));
    }

    #[test]
    fn transfer_split_changes_outcome() {
        let s = sim();
        assert_eq!(s.outcome().unwrap().winner, Some("humphreys".to_string()));
        let s2 = s.with_transfer_split("connolly", "gavin", 80).unwrap();
        let res = s2.outcome().unwrap();
        assert_eq!(res.rounds[1].transfer_for("gavin"), Some(570_240));
        assert_eq!(res.winner, Some("gavin".to_string()));
    }

    #[test]
    fn odds_entries() {
        let o = Odds::new(&[("connolly", "34%")]);
        let o2 = o.with_entry("connolly", "40%").with_entry("gavin", "18%");
        assert_eq!(o.get("connolly"), Some("34%"));
        assert_eq!(o2.get("connolly"), Some("40%"));
        assert_eq!(o2.get("gavin"), Some("18%"));
        assert_eq!(o2.get("humphreys"), None);
    }
}
