use crate::sim::*;

/// Reads `KEY=VALUE`.
pub fn parse_preference(arg: &str) -> SimResult<(String, String)> {
    match arg.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.to_string()))
        }
        _ => whatever!("invalid preference {:?}, expected KEY=VALUE", arg),
    }
}

/// Reads `FROM:TO=VALUE`.
pub fn parse_transfer(arg: &str) -> SimResult<(String, String, String)> {
    let parsed = arg.split_once('=').and_then(|(pair, value)| {
        pair.split_once(':')
            .map(|(from, to)| (from.trim(), to.trim(), value))
    });
    match parsed {
        Some((from, to, value)) if !from.is_empty() && !to.is_empty() => {
            Ok((from.to_string(), to.to_string(), value.to_string()))
        }
        _ => whatever!("invalid transfer {:?}, expected FROM:TO=VALUE", arg),
    }
}

/// Applies the adjustments of the command line: turnout, then locks, then
/// preferences, then transfers.
///
/// Values go through the same operations as the sliders, so out of range or
/// unreadable values are clamped. Unknown candidates are errors.
pub fn apply_adjustments(sim: &Simulation, args: &Args) -> SimResult<Simulation> {
    let mut sim = sim.clone();
    if let Some(turnout) = &args.turnout {
        sim = sim.with_turnout(turnout.as_str());
        debug!("apply_adjustments: turnout {}", sim.election().turnout());
    }
    for key in args.lock.iter() {
        sim = sim.with_lock_toggled(key).context(VotingSnafu {})?;
        debug!("apply_adjustments: locked {:?}", sim.locks().locked());
    }
    for arg in args.pref.iter() {
        let (key, value) = parse_preference(arg)?;
        sim = sim.with_preference(&key, value).context(VotingSnafu {})?;
        debug!("apply_adjustments: preferences {:?}", sim.first_preferences());
    }
    for arg in args.transfer.iter() {
        let (from, to, value) = parse_transfer(arg)?;
        sim = sim
            .with_transfer_split(&from, &to, value)
            .context(VotingSnafu {})?;
        debug!("apply_adjustments: transfers {:?}", sim.transfers().row(&from));
    }
    Ok(sim)
}
