// ********* Input data structures ***********

use std::collections::HashSet;
use std::error::Error;
use std::fmt::Display;

/// The number of candidates in a contest. The count is a two-round runoff and
/// only makes sense for exactly three candidates.
pub const NUM_CANDIDATES: usize = 3;

/// A candidate, with the profile fields displayed next to the sliders.
///
/// Only `key` and `short_name` matter for the count. Everything else is
/// carried for display.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Candidate {
    /// Stable identifier, for example `connolly`.
    pub key: String,
    pub name: String,
    pub party: String,
    /// Display color, as a CSS-style hex string.
    pub color: String,
    /// Compact name used in round descriptions.
    pub short_name: String,
    pub constituency: String,
    pub background: String,
    pub key_policies: Vec<String>,
    pub experience: String,
}

impl Candidate {
    /// A candidate with a key and a name and empty profile fields.
    pub fn new(key: &str, name: &str) -> Candidate {
        Candidate {
            key: key.to_string(),
            name: name.to_string(),
            party: String::new(),
            color: String::new(),
            short_name: name.to_string(),
            constituency: String::new(),
            background: String::new(),
            key_policies: Vec::new(),
            experience: String::new(),
        }
    }
}

/// The candidates of a contest, in enumeration order.
///
/// The enumeration order is fixed for the whole session and is the order used
/// to break ties.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Roster {
    candidates: Vec<Candidate>,
}

impl Roster {
    pub fn new(candidates: Vec<Candidate>) -> Result<Roster, VotingErrors> {
        if candidates.len() != NUM_CANDIDATES {
            return Err(VotingErrors::WrongCandidateCount(candidates.len()));
        }
        let mut seen: HashSet<&str> = HashSet::new();
        for c in candidates.iter() {
            if c.key.is_empty() {
                return Err(VotingErrors::EmptyCandidateKey);
            }
            if !seen.insert(c.key.as_str()) {
                return Err(VotingErrors::DuplicateCandidate(c.key.clone()));
            }
        }
        Ok(Roster { candidates })
    }

    pub fn candidates(&self) -> &[Candidate] {
        &self.candidates
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> + '_ {
        self.candidates.iter().map(|c| c.key.as_str())
    }

    pub fn get(&self, key: &str) -> Option<&Candidate> {
        self.candidates.iter().find(|c| c.key == key)
    }

    /// The index of the candidate in enumeration order.
    pub fn position(&self, key: &str) -> Result<usize, VotingErrors> {
        self.candidates
            .iter()
            .position(|c| c.key == key)
            .ok_or_else(|| VotingErrors::UnknownCandidate(key.to_string()))
    }

    pub fn short_name<'a>(&'a self, key: &'a str) -> &'a str {
        self.get(key).map(|c| c.short_name.as_str()).unwrap_or(key)
    }

    pub fn display_name<'a>(&'a self, key: &'a str) -> &'a str {
        self.get(key).map(|c| c.name.as_str()).unwrap_or(key)
    }
}

/// The first-preference share of each candidate, in percent.
///
/// Invariant: one entry per candidate, in roster order, summing to 100.
#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub struct FirstPreferences {
    shares: Vec<(String, u32)>,
}

impl FirstPreferences {
    pub fn new<S: AsRef<str>>(
        roster: &Roster,
        shares: &[(S, u32)],
    ) -> Result<FirstPreferences, VotingErrors> {
        let shares: Vec<(&str, u32)> = shares.iter().map(|(k, pct)| (k.as_ref(), *pct)).collect();
        for (key, _) in shares.iter() {
            roster.position(key)?;
        }
        let mut res: Vec<(String, u32)> = Vec::new();
        for key in roster.keys() {
            let pct = shares
                .iter()
                .find(|(k, _)| *k == key)
                .map(|(_, pct)| *pct)
                .ok_or_else(|| VotingErrors::MissingCandidate(key.to_string()))?;
            res.push((key.to_string(), pct));
        }
        if shares.len() != NUM_CANDIDATES {
            return Err(VotingErrors::InvalidShares {
                total: shares.iter().map(|(_, pct)| *pct).sum(),
            });
        }
        let total: u32 = res.iter().map(|(_, pct)| *pct).sum();
        if total != 100 {
            return Err(VotingErrors::InvalidShares { total });
        }
        Ok(FirstPreferences { shares: res })
    }

    /// Splits 100 evenly, the last candidate taking the remainder.
    pub fn even(roster: &Roster) -> FirstPreferences {
        let per = 100 / NUM_CANDIDATES as u32;
        let shares = roster
            .keys()
            .enumerate()
            .map(|(idx, key)| {
                let pct = if idx == NUM_CANDIDATES - 1 {
                    100 - per * (NUM_CANDIDATES as u32 - 1)
                } else {
                    per
                };
                (key.to_string(), pct)
            })
            .collect();
        FirstPreferences { shares }
    }

    pub(crate) fn from_shares(shares: Vec<(String, u32)>) -> FirstPreferences {
        FirstPreferences { shares }
    }

    pub fn get(&self, key: &str) -> Option<u32> {
        self.shares
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, pct)| *pct)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u32)> + '_ {
        self.shares.iter().map(|(k, pct)| (k.as_str(), *pct))
    }

    pub fn total(&self) -> u32 {
        self.shares.iter().map(|(_, pct)| *pct).sum()
    }

    pub fn max_share(&self) -> u32 {
        self.shares.iter().map(|(_, pct)| *pct).max().unwrap_or(0)
    }

    /// Checks that the shares are keyed by the candidates of this roster, in order.
    ///
    /// A key outside the roster is reported first, then the first candidate
    /// of the roster that is not in its place.
    pub(crate) fn check_roster(&self, roster: &Roster) -> Result<(), VotingErrors> {
        if let Some((key, _)) = self.shares.iter().find(|(k, _)| roster.get(k).is_none()) {
            return Err(VotingErrors::UnknownCandidate(key.clone()));
        }
        for (idx, key) in roster.keys().enumerate() {
            if self.shares.get(idx).map(|(k, _)| k.as_str()) != Some(key) {
                return Err(VotingErrors::MissingCandidate(key.to_string()));
            }
        }
        if self.shares.len() != NUM_CANDIDATES {
            return Err(VotingErrors::WrongCandidateCount(self.shares.len()));
        }
        Ok(())
    }
}

/// Which candidate, if any, is protected from automatic rebalancing.
///
/// Invariant: at most one candidate is locked.
#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub struct LockState {
    locks: Vec<(String, bool)>,
}

impl LockState {
    pub fn unlocked(roster: &Roster) -> LockState {
        LockState {
            locks: roster.keys().map(|k| (k.to_string(), false)).collect(),
        }
    }

    pub(crate) fn from_locks(locks: Vec<(String, bool)>) -> LockState {
        LockState { locks }
    }

    pub fn is_locked(&self, key: &str) -> bool {
        self.locks.iter().any(|(k, locked)| k == key && *locked)
    }

    /// The locked candidate, if there is one.
    pub fn locked(&self) -> Option<&str> {
        self.locks
            .iter()
            .find(|(_, locked)| *locked)
            .map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, bool)> + '_ {
        self.locks.iter().map(|(k, locked)| (k.as_str(), *locked))
    }
}

/// For each candidate that may be eliminated, how their votes split between
/// the two other candidates, in percent.
///
/// Invariant: one row per candidate in roster order, each row naming the two
/// other candidates in roster order with shares summing to 100.
#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub struct TransferTable {
    rows: Vec<(String, Vec<(String, u32)>)>,
}

impl TransferTable {
    /// Builds a table from `(from, to, percent)` entries. Every row must be complete.
    pub fn new<S: AsRef<str>>(
        roster: &Roster,
        entries: &[(S, S, u32)],
    ) -> Result<TransferTable, VotingErrors> {
        let entries: Vec<(&str, &str, u32)> = entries
            .iter()
            .map(|(from, to, pct)| (from.as_ref(), to.as_ref(), *pct))
            .collect();
        for (from, to, _) in entries.iter() {
            roster.position(from)?;
            roster.position(to)?;
            if from == to {
                return Err(VotingErrors::InvalidTransferRow(from.to_string()));
            }
        }
        let mut rows: Vec<(String, Vec<(String, u32)>)> = Vec::new();
        for from in roster.keys() {
            let mut row: Vec<(String, u32)> = Vec::new();
            for to in roster.keys().filter(|k| *k != from) {
                let matching: Vec<u32> = entries
                    .iter()
                    .filter(|(f, t, _)| *f == from && *t == to)
                    .map(|(_, _, pct)| *pct)
                    .collect();
                match matching.as_slice() {
                    [pct] => row.push((to.to_string(), *pct)),
                    _ => return Err(VotingErrors::InvalidTransferRow(from.to_string())),
                }
            }
            if row.iter().map(|(_, pct)| *pct).sum::<u32>() != 100 {
                return Err(VotingErrors::InvalidTransferRow(from.to_string()));
            }
            rows.push((from.to_string(), row));
        }
        Ok(TransferTable { rows })
    }

    /// Every eliminated candidate splits evenly.
    pub fn even(roster: &Roster) -> TransferTable {
        let rows = roster
            .keys()
            .map(|from| {
                let row = roster
                    .keys()
                    .filter(|k| *k != from)
                    .map(|to| (to.to_string(), 50))
                    .collect();
                (from.to_string(), row)
            })
            .collect();
        TransferTable { rows }
    }

    pub(crate) fn from_rows(rows: Vec<(String, Vec<(String, u32)>)>) -> TransferTable {
        TransferTable { rows }
    }

    pub(crate) fn rows(&self) -> &[(String, Vec<(String, u32)>)] {
        &self.rows
    }

    /// The split of the votes of `from` to each of the two other candidates.
    pub fn row(&self, from: &str) -> Option<&[(String, u32)]> {
        self.rows
            .iter()
            .find(|(k, _)| k == from)
            .map(|(_, row)| row.as_slice())
    }

    /// The share of the votes of `from` going to `to`.
    pub fn split(&self, from: &str, to: &str) -> Option<u32> {
        self.row(from)?
            .iter()
            .find(|(k, _)| k == to)
            .map(|(_, pct)| *pct)
    }

    /// Checks that there is one row per candidate of this roster, in order, each
    /// naming the two other candidates. The first offending row is reported.
    pub(crate) fn check_roster(&self, roster: &Roster) -> Result<(), VotingErrors> {
        let mut expected = roster.keys();
        for (from, row) in self.rows.iter() {
            let row_ok = row.len() == NUM_CANDIDATES - 1
                && row
                    .iter()
                    .all(|(to, _)| to != from && roster.get(to).is_some());
            if expected.next() != Some(from.as_str()) || !row_ok {
                return Err(VotingErrors::InvalidTransferRow(from.clone()));
            }
        }
        match expected.next() {
            Some(missing) => Err(VotingErrors::InvalidTransferRow(missing.to_string())),
            None => Ok(()),
        }
    }
}

/// The raw value of a slider. Sliders may report either text or numbers.
#[derive(PartialEq, Debug, Clone)]
pub enum SliderValue {
    Number(f64),
    Text(String),
}

impl SliderValue {
    /// The integer reading of the value, if any.
    ///
    /// Text is read like an integer parse: leading whitespace and a sign are
    /// accepted, then as many decimal digits as follow. Numbers are truncated.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            SliderValue::Number(x) if x.is_finite() => Some(x.trunc() as i64),
            SliderValue::Number(_) => None,
            SliderValue::Text(s) => {
                let s = s.trim_start();
                let (negative, digits) = match s.as_bytes().first() {
                    Some(b'-') => (true, &s[1..]),
                    Some(b'+') => (false, &s[1..]),
                    _ => (false, s),
                };
                let mut value: Option<i64> = None;
                for c in digits.chars() {
                    match c.to_digit(10) {
                        Some(d) => {
                            let v = value.unwrap_or(0);
                            value = Some(v.saturating_mul(10).saturating_add(d as i64));
                        }
                        None => break,
                    }
                }
                value.map(|v| if negative { -v } else { v })
            }
        }
    }

    /// Clamps the value into `[min, max]`. Anything unreadable counts as zero.
    pub fn clamp_to(&self, min: u32, max: u32) -> u32 {
        let v = self.as_integer().unwrap_or(0);
        v.clamp(min as i64, max as i64) as u32
    }

    /// Clamps the value into a percentage.
    pub fn percent(&self) -> u32 {
        self.clamp_to(0, 100)
    }
}

impl From<&str> for SliderValue {
    fn from(s: &str) -> SliderValue {
        SliderValue::Text(s.to_string())
    }
}

impl From<String> for SliderValue {
    fn from(s: String) -> SliderValue {
        SliderValue::Text(s)
    }
}

impl From<f64> for SliderValue {
    fn from(x: f64) -> SliderValue {
        SliderValue::Number(x)
    }
}

impl From<i32> for SliderValue {
    fn from(x: i32) -> SliderValue {
        SliderValue::Number(x as f64)
    }
}

impl From<i64> for SliderValue {
    fn from(x: i64) -> SliderValue {
        SliderValue::Number(x as f64)
    }
}

impl From<u32> for SliderValue {
    fn from(x: u32) -> SliderValue {
        SliderValue::Number(x as f64)
    }
}

// ******** Output data structures *********

/// One round of the count.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Round {
    pub round: u32,
    /// The votes of the candidates still standing in this round, in roster order.
    pub votes: Vec<(String, u64)>,
    /// The candidate eliminated before this round. None for the first round.
    pub eliminated: Option<String>,
    /// The first-round votes of the eliminated candidate.
    pub transferred: u64,
    /// The votes gained by each remaining candidate.
    pub transfer_to: Vec<(String, u64)>,
    pub description: String,
}

impl Round {
    pub fn votes_for(&self, key: &str) -> Option<u64> {
        self.votes.iter().find(|(k, _)| k == key).map(|(_, v)| *v)
    }

    pub fn transfer_for(&self, key: &str) -> Option<u64> {
        self.transfer_to
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| *v)
    }
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct CountResult {
    /// One or two rounds.
    pub rounds: Vec<Round>,
    pub winner: Option<String>,
    pub quota: u64,
    pub total_votes: u64,
    /// The elimination had to pick between candidates with equal votes.
    pub elimination_tiebreak: bool,
    /// The two remaining candidates finished with equal votes.
    pub runoff_tiebreak: bool,
}

/// Errors for inputs that do not describe a valid contest.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum VotingErrors {
    WrongCandidateCount(usize),
    EmptyCandidateKey,
    DuplicateCandidate(String),
    UnknownCandidate(String),
    MissingCandidate(String),
    InvalidShares { total: u32 },
    InvalidTransferRow(String),
}

impl Error for VotingErrors {}

impl Display for VotingErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VotingErrors::WrongCandidateCount(n) => write!(
                f,
                "expected {} candidates, found {}",
                NUM_CANDIDATES, n
            ),
            VotingErrors::EmptyCandidateKey => write!(f, "a candidate has an empty key"),
            VotingErrors::DuplicateCandidate(k) => write!(f, "duplicate candidate key {:?}", k),
            VotingErrors::UnknownCandidate(k) => write!(f, "unknown candidate {:?}", k),
            VotingErrors::MissingCandidate(k) => write!(f, "no value for candidate {:?}", k),
            VotingErrors::InvalidShares { total } => {
                write!(f, "first preferences must sum to 100, not {}", total)
            }
            VotingErrors::InvalidTransferRow(k) => write!(
                f,
                "transfers from {:?} must name the two other candidates and sum to 100",
                k
            ),
        }
    }
}

// ********* Configuration **********

/// How to choose among candidates with equal votes.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum TieBreakMode {
    /// The candidate appearing first in the roster is chosen.
    UseCandidateOrder,
    /// The candidate appearing last in the roster is chosen.
    ReverseCandidateOrder,
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct CountRules {
    /// Which of the lowest candidates is eliminated after the first round.
    pub elimination_tiebreak: TieBreakMode,
    /// Which of the two remaining candidates wins a tied second round.
    pub runoff_tiebreak: TieBreakMode,
}

impl CountRules {
    // The runoff default reproduces the historical behavior of the simulator, where
    // the later candidate won a tied second round.
    pub const DEFAULT_RULES: CountRules = CountRules {
        elimination_tiebreak: TieBreakMode::UseCandidateOrder,
        runoff_tiebreak: TieBreakMode::ReverseCandidateOrder,
    };
}

impl Default for CountRules {
    fn default() -> Self {
        CountRules::DEFAULT_RULES
    }
}
