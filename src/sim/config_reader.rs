use crate::sim::*;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use stv_count::builder::Builder;
use stv_count::presets;

pub const DEFAULT_CONTEST_NAME: &str = "Irish Presidential Election 2025";
pub const DEFAULT_CONTEST_DATE: &str = "2025-10-24";

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct OutputSettings {
    #[serde(rename = "contestName")]
    pub contest_name: String,
    #[serde(rename = "contestDate")]
    pub contest_date: Option<String>,
    #[serde(rename = "contestJurisdiction")]
    pub contest_jurisdiction: Option<String>,
    #[serde(rename = "contestOffice")]
    pub contest_office: Option<String>,
}

impl Default for OutputSettings {
    fn default() -> Self {
        OutputSettings {
            contest_name: DEFAULT_CONTEST_NAME.to_string(),
            contest_date: Some(DEFAULT_CONTEST_DATE.to_string()),
            contest_jurisdiction: None,
            contest_office: None,
        }
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    pub contest: String,
    pub date: Option<String>,
    pub jurisdiction: Option<String>,
    pub office: Option<String>,
    pub threshold: Option<String>,
    #[serde(rename = "totalVotes")]
    pub total_votes: Option<String>,
    pub turnout: Option<String>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioCandidate {
    pub id: String,
    pub name: String,
    pub party: Option<String>,
    pub color: Option<String>,
    #[serde(rename = "shortName")]
    pub short_name: Option<String>,
    pub constituency: Option<String>,
    pub background: Option<String>,
    #[serde(rename = "keyPolicies")]
    pub key_policies: Option<Vec<String>>,
    pub experience: Option<String>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioRules {
    #[serde(rename = "eliminationTiebreakMode")]
    pub elimination_tiebreak_mode: Option<String>,
    #[serde(rename = "runoffTiebreakMode")]
    pub runoff_tiebreak_mode: Option<String>,
}

/// A scenario file. Anything left out comes from the 2025 election.
#[derive(PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScenarioConfig {
    #[serde(rename = "outputSettings")]
    pub output_settings: Option<OutputSettings>,
    pub candidates: Option<Vec<ScenarioCandidate>>,
    pub electorate: Option<u64>,
    /// Number or text, like the turnout slider.
    pub turnout: Option<JSValue>,
    #[serde(rename = "firstPreferences")]
    pub first_preferences: Option<BTreeMap<String, u32>>,
    #[serde(rename = "transferPreferences")]
    pub transfer_preferences: Option<BTreeMap<String, BTreeMap<String, u32>>>,
    pub odds: Option<BTreeMap<String, String>>,
    pub rules: Option<ScenarioRules>,
}

impl ScenarioConfig {
    pub fn output_settings(&self) -> OutputSettings {
        self.output_settings.clone().unwrap_or_default()
    }
}

pub fn read_config(path: &str) -> SimResult<ScenarioConfig> {
    let config_str = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    let config: ScenarioConfig = serde_json::from_str(&config_str).context(ParsingJsonSnafu {})?;
    Ok(config)
}

fn read_tiebreak_mode(mode: &Option<String>, default: TieBreakMode) -> SimResult<TieBreakMode> {
    match mode.as_deref() {
        None => Ok(default),
        Some("useCandidateOrder") => Ok(TieBreakMode::UseCandidateOrder),
        Some("reverseCandidateOrder") => Ok(TieBreakMode::ReverseCandidateOrder),
        Some(x) => whatever!("unknown tiebreak mode: {}", x),
    }
}

fn validate_rules(rules: &Option<ScenarioRules>) -> SimResult<CountRules> {
    let defaults = CountRules::DEFAULT_RULES;
    match rules {
        None => Ok(defaults),
        Some(r) => Ok(CountRules {
            elimination_tiebreak: read_tiebreak_mode(
                &r.elimination_tiebreak_mode,
                defaults.elimination_tiebreak,
            )?,
            runoff_tiebreak: read_tiebreak_mode(&r.runoff_tiebreak_mode, defaults.runoff_tiebreak)?,
        }),
    }
}

fn read_slider(x: &JSValue) -> SimResult<SliderValue> {
    match x {
        JSValue::Number(n) => match n.as_f64() {
            Some(f) => Ok(SliderValue::Number(f)),
            None => whatever!("cannot read number {}", n),
        },
        JSValue::String(s) => Ok(SliderValue::Text(s.clone())),
        _ => whatever!("expected a number or a string, found {}", x),
    }
}

fn to_candidate(c: &ScenarioCandidate) -> Candidate {
    let mut res = Candidate::new(&c.id, &c.name);
    res.party = c.party.clone().unwrap_or_default();
    res.color = c.color.clone().unwrap_or_default();
    if let Some(short_name) = &c.short_name {
        res.short_name = short_name.clone();
    }
    res.constituency = c.constituency.clone().unwrap_or_default();
    res.background = c.background.clone().unwrap_or_default();
    res.key_policies = c.key_policies.clone().unwrap_or_default();
    res.experience = c.experience.clone().unwrap_or_default();
    res
}

/// Builds the simulation described by a scenario.
///
/// When the scenario keeps the 2025 candidates, the preferences, transfers and
/// odds it leaves out are those of the 2025 preset. With other candidates,
/// missing preferences and transfers are split evenly.
pub fn build_simulation(config: &ScenarioConfig) -> SimResult<Simulation> {
    let rules = validate_rules(&config.rules)?;
    let preset = presets::irish_presidential_2025().context(VotingSnafu {})?;
    let custom = config.candidates.is_some();

    let candidates: Vec<Candidate> = match &config.candidates {
        Some(cands) => cands.iter().map(to_candidate).collect(),
        None => preset.roster().candidates().to_vec(),
    };
    let turnout = match &config.turnout {
        Some(x) => read_slider(x)?,
        None => SliderValue::from(DEFAULT_TURNOUT),
    };

    let mut builder = Builder::new(&rules)
        .context(VotingSnafu {})?
        .candidates(&candidates)
        .context(VotingSnafu {})?
        .electorate(config.electorate.unwrap_or(DEFAULT_ELECTORATE))
        .turnout(turnout);

    match &config.first_preferences {
        Some(prefs) => {
            for (key, pct) in prefs.iter() {
                builder.first_preference(key, *pct).context(VotingSnafu {})?;
            }
        }
        None if !custom => {
            for (key, pct) in preset.first_preferences().iter() {
                builder.first_preference(key, pct).context(VotingSnafu {})?;
            }
        }
        None => {}
    }

    let rows = config.transfer_preferences.clone().unwrap_or_default();
    for (from, row) in rows.iter() {
        for (to, pct) in row.iter() {
            builder.transfer_split(from, to, *pct).context(VotingSnafu {})?;
        }
    }
    if !custom {
        for c in candidates.iter() {
            if rows.contains_key(&c.key) {
                continue;
            }
            for (to, pct) in preset.transfers().row(&c.key).unwrap_or_default() {
                builder.transfer_split(&c.key, to, *pct).context(VotingSnafu {})?;
            }
        }
        for (key, value) in preset.odds().iter() {
            builder.odds(key, value).context(VotingSnafu {})?;
        }
    }
    for (key, value) in config.odds.clone().unwrap_or_default().iter() {
        builder.odds(key, value).context(VotingSnafu {})?;
    }

    let sim = builder.build().context(VotingSnafu {})?;
    debug!("build_simulation: {:?}", sim);
    Ok(sim)
}

pub fn read_summary(path: &str) -> SimResult<JSValue> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    let mut js: JSValue = serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu {})?;
    // Order the tally results to ensure stability
    if let Some(results) = js.get_mut("results").and_then(|r| r.as_array_mut()) {
        for res in results.iter_mut() {
            if let Some(tally_results) = res
                .get_mut("tallyResults")
                .and_then(|t| t.as_array_mut())
            {
                tally_results.sort_by_key(|trjs| {
                    trjs.get("elected")
                        .or_else(|| trjs.get("eliminated"))
                        .and_then(|x| x.as_str())
                        .unwrap_or_default()
                        .to_string()
                });
            }
        }
    }
    Ok(js)
}
