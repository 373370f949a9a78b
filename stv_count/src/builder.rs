pub use crate::config::*;
use crate::state::*;

/// A builder for setting up a simulation.
///
/// ```
/// pub use stv_count::builder::Builder;
/// pub use stv_count::{Candidate, CountRules};
/// # use stv_count::VotingErrors;
///
/// let mut builder = Builder::new(&CountRules::DEFAULT_RULES)?
///     .candidates(&[
///         Candidate::new("anna", "Anna"),
///         Candidate::new("bob", "Bob"),
///         Candidate::new("clara", "Clara"),
///     ])?
///     .turnout(55);
///
/// builder.first_preference("anna", 45)?;
/// builder.first_preference("bob", 30)?;
/// builder.first_preference("clara", 25)?;
/// builder.transfer_split("clara", "anna", 70)?;
/// builder.transfer_split("clara", "bob", 30)?;
///
/// let simulation = builder.build()?;
/// assert_eq!(simulation.outcome()?.winner, Some("anna".to_string()));
///
/// # Ok::<(), VotingErrors>(())
/// ```
pub struct Builder {
    pub(crate) _rules: CountRules,
    pub(crate) _candidates: Option<Roster>,
    pub(crate) _electorate: u64,
    pub(crate) _turnout: u32,
    pub(crate) _shares: Vec<(String, u32)>,
    pub(crate) _transfers: Vec<(String, String, u32)>,
    pub(crate) _odds: Odds,
}

impl Builder {
    pub fn new(rules: &CountRules) -> Result<Builder, VotingErrors> {
        Ok(Builder {
            _rules: rules.clone(),
            _candidates: None,
            _electorate: DEFAULT_ELECTORATE,
            _turnout: DEFAULT_TURNOUT,
            _shares: Vec::new(),
            _transfers: Vec::new(),
            _odds: Odds::default(),
        })
    }

    /// Sets the candidates. Any value recorded before is dropped.
    pub fn candidates(self, cands: &[Candidate]) -> Result<Builder, VotingErrors> {
        Ok(Builder {
            _candidates: Some(Roster::new(cands.to_vec())?),
            _shares: Vec::new(),
            _transfers: Vec::new(),
            _odds: Odds::default(),
            ..self
        })
    }

    pub fn electorate(self, electorate: u64) -> Builder {
        Builder {
            _electorate: electorate,
            ..self
        }
    }

    /// The turnout is clamped into the range of the turnout slider.
    pub fn turnout(self, turnout: impl Into<SliderValue>) -> Builder {
        Builder {
            _turnout: turnout.into().clamp_to(MIN_TURNOUT, MAX_TURNOUT),
            ..self
        }
    }

    /// Records the first-preference share of a candidate.
    ///
    /// If no share is recorded at all, 100 is split evenly. Otherwise every
    /// candidate needs one and they must add up to 100.
    pub fn first_preference(&mut self, key: &str, pct: u32) -> Result<(), VotingErrors> {
        self.check_candidate(key)?;
        self._shares.retain(|(k, _)| k != key);
        self._shares.push((key.to_string(), pct));
        Ok(())
    }

    /// Records the share of the votes of `from` that goes to `to`.
    ///
    /// A candidate without any recorded transfer splits evenly. Otherwise both
    /// other candidates need a share and they must add up to 100.
    pub fn transfer_split(&mut self, from: &str, to: &str, pct: u32) -> Result<(), VotingErrors> {
        self.check_candidate(from)?;
        self.check_candidate(to)?;
        if from == to {
            return Err(VotingErrors::InvalidTransferRow(from.to_string()));
        }
        self._transfers.retain(|(f, t, _)| !(f == from && t == to));
        self._transfers.push((from.to_string(), to.to_string(), pct));
        Ok(())
    }

    pub fn odds(&mut self, key: &str, value: &str) -> Result<(), VotingErrors> {
        self.check_candidate(key)?;
        self._odds = self._odds.with_entry(key, value);
        Ok(())
    }

    pub fn build(self) -> Result<Simulation, VotingErrors> {
        let roster = self
            ._candidates
            .ok_or(VotingErrors::WrongCandidateCount(0))?;

        let prefs = if self._shares.is_empty() {
            FirstPreferences::even(&roster)
        } else {
            FirstPreferences::new(&roster, &self._shares)?
        };

        let mut entries: Vec<(String, String, u32)> = self._transfers.clone();
        for from in roster.keys() {
            if !entries.iter().any(|(f, _, _)| f == from) {
                for to in roster.keys().filter(|k| *k != from) {
                    entries.push((from.to_string(), to.to_string(), 50));
                }
            }
        }
        let entries: Vec<(&str, &str, u32)> = entries
            .iter()
            .map(|(f, t, pct)| (f.as_str(), t.as_str(), *pct))
            .collect();
        let transfers = TransferTable::new(&roster, &entries)?;

        let election = ElectionState::new(self._electorate, self._turnout);
        let sim = Simulation::new(roster, prefs, transfers, election)?;
        Ok(sim.with_rules(self._rules).with_odds(self._odds))
    }

    fn check_candidate(&self, key: &str) -> Result<(), VotingErrors> {
        match &self._candidates {
            Some(roster) => roster.position(key).map(|_| ()),
            None => Err(VotingErrors::UnknownCandidate(key.to_string())),
        }
    }
}
