//! Slider operations on the inputs of the count.
//!
//! All the operations return a new value and leave their inputs untouched.
//! Raw slider values are clamped, never rejected. Unknown candidate keys are
//! an error.

use log::debug;

use crate::config::*;

/// Sets the first-preference share of one candidate and rebalances the others.
///
/// The locked candidate, if it is not the one being edited, keeps its share.
/// What is left of 100 is split evenly between the unlocked candidates, the
/// last of them taking the rounding remainder. The edited value is capped so
/// that it never eats into the locked share, which keeps the sum at 100.
pub fn set_preference(
    prefs: &FirstPreferences,
    locks: &LockState,
    key: &str,
    raw: impl Into<SliderValue>,
) -> Result<FirstPreferences, VotingErrors> {
    if prefs.get(key).is_none() {
        return Err(VotingErrors::UnknownCandidate(key.to_string()));
    }
    let requested = raw.into().percent();

    let locked_ids: Vec<&str> = prefs
        .iter()
        .filter(|(k, _)| *k != key && locks.is_locked(k))
        .map(|(k, _)| k)
        .collect();
    let unlocked_ids: Vec<&str> = prefs
        .iter()
        .filter(|(k, _)| *k != key && !locks.is_locked(k))
        .map(|(k, _)| k)
        .collect();
    let locked_sum: u32 = prefs
        .iter()
        .filter(|(k, _)| locked_ids.contains(k))
        .map(|(_, pct)| pct)
        .sum();

    // With nobody left to absorb the change, the edit is taken as is.
    let value = if unlocked_ids.is_empty() {
        requested
    } else {
        requested.min(100u32.saturating_sub(locked_sum))
    };
    let remaining = 100u32.saturating_sub(value + locked_sum);
    debug!(
        "set_preference: {} -> {} (requested {}), locked: {:?}, unlocked: {:?}, remaining: {}",
        key, value, requested, locked_ids, unlocked_ids, remaining
    );

    let mut shares: Vec<(String, u32)> = prefs
        .iter()
        .map(|(k, pct)| (k.to_string(), pct))
        .collect();
    let num_unlocked = unlocked_ids.len() as u32;
    let per = if num_unlocked > 0 {
        remaining / num_unlocked
    } else {
        0
    };
    for (k, pct) in shares.iter_mut() {
        if k.as_str() == key {
            *pct = value;
        } else if let Some(idx) = unlocked_ids.iter().position(|u| *u == k.as_str()) {
            *pct = if idx as u32 == num_unlocked - 1 {
                remaining - per * (num_unlocked - 1)
            } else {
                per
            };
        }
    }
    Ok(FirstPreferences::from_shares(shares))
}

/// Locks a candidate, or clears all the locks if it was the locked one.
///
/// The new state is built from scratch, so at most one candidate is ever locked.
pub fn toggle_lock(locks: &LockState, key: &str) -> Result<LockState, VotingErrors> {
    if !locks.iter().any(|(k, _)| k == key) {
        return Err(VotingErrors::UnknownCandidate(key.to_string()));
    }
    let unlock_all = locks.locked() == Some(key);
    let res = LockState::from_locks(
        locks
            .iter()
            .map(|(k, _)| (k.to_string(), !unlock_all && k == key))
            .collect(),
    );
    debug!("toggle_lock: {} -> locked: {:?}", key, res.locked());
    Ok(res)
}

/// Sets the share of the votes of `from` that goes to `to`. The other
/// recipient gets the rest.
pub fn set_transfer_split(
    table: &TransferTable,
    from: &str,
    to: &str,
    raw: impl Into<SliderValue>,
) -> Result<TransferTable, VotingErrors> {
    let row = table
        .row(from)
        .ok_or_else(|| VotingErrors::UnknownCandidate(from.to_string()))?;
    if !row.iter().any(|(k, _)| k == to) {
        return Err(VotingErrors::UnknownCandidate(to.to_string()));
    }
    let value = raw.into().percent();
    debug!("set_transfer_split: {} -> {}: {}%", from, to, value);

    let rows = table
        .rows()
        .iter()
        .map(|(f, row)| {
            if f != from {
                return (f.clone(), row.clone());
            }
            let new_row = row
                .iter()
                .map(|(k, _)| {
                    let pct = if k == to { value } else { 100 - value };
                    (k.clone(), pct)
                })
                .collect();
            (f.clone(), new_row)
        })
        .collect();
    Ok(TransferTable::from_rows(rows))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roster() -> Roster {
        Roster::new(vec![
            Candidate::new("connolly", "Catherine Connolly"),
            Candidate::new("gavin", "Jim Gavin"),
            Candidate::new("humphreys", "Heather Humphreys"),
        ])
        .unwrap()
    }

    fn prefs(c: u32, g: u32, h: u32) -> FirstPreferences {
        FirstPreferences::new(&roster(), &[("connolly", c), ("gavin", g), ("humphreys", h)])
            .unwrap()
    }

    fn shares(p: &FirstPreferences) -> Vec<u32> {
        p.iter().map(|(_, pct)| pct).collect()
    }

    #[test]
    fn rebalance_without_lock() {
        let locks = LockState::unlocked(&roster());
        let res = set_preference(&prefs(33, 34, 33), &locks, "connolly", 50).unwrap();
        // 50 left over, split 25/25.
        assert_eq!(shares(&res), vec![50, 25, 25]);
        let res = set_preference(&prefs(33, 34, 33), &locks, "gavin", 41).unwrap();
        // 59 left over: 29 for connolly, the remainder to humphreys.
        assert_eq!(shares(&res), vec![29, 41, 30]);
    }

    #[test]
    fn rebalance_respects_lock() {
        let locks = toggle_lock(&LockState::unlocked(&roster()), "humphreys").unwrap();
        let res = set_preference(&prefs(33, 34, 33), &locks, "connolly", 60).unwrap();
        assert_eq!(shares(&res), vec![60, 7, 33]);
    }

    #[test]
    fn edit_is_capped_by_locked_share() {
        let locks = toggle_lock(&LockState::unlocked(&roster()), "gavin").unwrap();
        let res = set_preference(&prefs(10, 80, 10), &locks, "humphreys", 50).unwrap();
        assert_eq!(shares(&res), vec![0, 80, 20]);
        assert_eq!(res.total(), 100);
    }

    #[test]
    fn editing_the_locked_candidate_moves_the_others() {
        let locks = toggle_lock(&LockState::unlocked(&roster()), "connolly").unwrap();
        let res = set_preference(&prefs(33, 34, 33), &locks, "connolly", 20).unwrap();
        assert_eq!(shares(&res), vec![20, 40, 40]);
    }

    #[test]
    fn raw_values_are_clamped() {
        let locks = LockState::unlocked(&roster());
        let p = prefs(33, 34, 33);
        let set = |raw: SliderValue| shares(&set_preference(&p, &locks, "gavin", raw).unwrap());
        assert_eq!(set(250.into()), vec![0, 100, 0]);
        assert_eq!(set((-4).into()), vec![50, 0, 50]);
        assert_eq!(set("abc".into()), vec![50, 0, 50]);
        assert_eq!(set(" 42px".into()), vec![29, 42, 29]);
        assert_eq!(set(42.9.into()), vec![29, 42, 29]);
        assert_eq!(set(f64::NAN.into()), vec![50, 0, 50]);
    }

    #[test]
    fn sum_stays_at_100() {
        let r = roster();
        let keys = ["connolly", "gavin", "humphreys"];
        let mut locks_options = vec![LockState::unlocked(&r)];
        for k in keys.iter() {
            locks_options.push(toggle_lock(&LockState::unlocked(&r), k).unwrap());
        }
        for locks in locks_options.iter() {
            for start in [prefs(33, 34, 33), prefs(90, 5, 5), prefs(0, 0, 100)].iter() {
                for key in keys.iter() {
                    for v in (0..=100).step_by(7) {
                        let res = set_preference(start, locks, key, v).unwrap();
                        assert_eq!(res.total(), 100, "{:?} {:?} {} {}", locks, start, key, v);
                        if let Some(l) = locks.locked() {
                            if l != *key {
                                assert_eq!(res.get(l), start.get(l));
                            }
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn unknown_candidate() {
        let locks = LockState::unlocked(&roster());
        assert_eq!(
            set_preference(&prefs(33, 34, 33), &locks, "nobody", 10),
            Err(VotingErrors::UnknownCandidate("nobody".to_string()))
        );
        assert!(toggle_lock(&locks, "nobody").is_err());
    }

    #[test]
    fn single_lock() {
        let locks = LockState::unlocked(&roster());
        let l1 = toggle_lock(&locks, "gavin").unwrap();
        assert_eq!(l1.locked(), Some("gavin"));
        let l2 = toggle_lock(&l1, "connolly").unwrap();
        assert_eq!(l2.locked(), Some("connolly"));
        assert_eq!(l2.iter().filter(|(_, l)| *l).count(), 1);
        let l3 = toggle_lock(&l2, "connolly").unwrap();
        assert_eq!(l3, locks);
    }

    #[test]
    fn toggle_twice_clears() {
        let locks = LockState::unlocked(&roster());
        for k in ["connolly", "gavin", "humphreys"] {
            let once = toggle_lock(&locks, k).unwrap();
            let twice = toggle_lock(&once, k).unwrap();
            assert_eq!(twice.locked(), None);
        }
    }

    #[test]
    fn transfer_split_rows_sum_to_100() {
        let table = TransferTable::even(&roster());
        for v in [-10, 0, 1, 37, 99, 100, 180] {
            let res = set_transfer_split(&table, "connolly", "gavin", v).unwrap();
            let gavin = res.split("connolly", "gavin").unwrap();
            let humphreys = res.split("connolly", "humphreys").unwrap();
            assert_eq!(gavin + humphreys, 100);
            assert_eq!(gavin, SliderValue::from(v).percent());
            // Other rows are untouched.
            assert_eq!(res.row("gavin"), table.row("gavin"));
        }
    }

    #[test]
    fn transfer_split_errors() {
        let table = TransferTable::even(&roster());
        assert!(set_transfer_split(&table, "connolly", "connolly", 10).is_err());
        assert!(set_transfer_split(&table, "nobody", "gavin", 10).is_err());
    }
}
