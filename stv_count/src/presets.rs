//! Ready-made contests.

use crate::builder::Builder;
use crate::config::*;
use crate::state::*;

fn policies(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// The candidates of the 2025 Irish presidential election, in ballot order.
pub fn candidates_2025() -> Vec<Candidate> {
    vec![
        Candidate {
            party: "Independent".to_string(),
            color: "#f97316".to_string(),
            short_name: "Connolly".to_string(),
            constituency: "Galway West TD".to_string(),
            background: "Independent TD with support from Social Democrats and People Before Profit"
                .to_string(),
            key_policies: policies(&[
                "Human Rights Advocate",
                "Housing Reform",
                "Environmental Justice",
            ]),
            experience: "Served as Galway City Councillor and TD since 2016".to_string(),
            ..Candidate::new("connolly", "Catherine Connolly")
        },
        Candidate {
            party: "Fianna Fáil".to_string(),
            color: "#22c55e".to_string(),
            short_name: "Gavin".to_string(),
            constituency: "Dublin".to_string(),
            background: "Former Dublin GAA manager, Fianna Fáil nominee".to_string(),
            key_policies: policies(&["Constitutional Republican", "Defence Reform", "Leadership"]),
            experience: "Led Dublin to 6 All-Ireland titles, no prior political office".to_string(),
            ..Candidate::new("gavin", "Jim Gavin")
        },
        Candidate {
            party: "Fine Gael".to_string(),
            color: "#3b82f6".to_string(),
            short_name: "Humphreys".to_string(),
            constituency: "Cavan-Monaghan".to_string(),
            background: "Former Cabinet Minister, Fine Gael nominee".to_string(),
            key_policies: policies(&[
                "Rural Ireland",
                "Unity & Community",
                "International Representation",
            ]),
            experience: "Minister for Justice, Arts, Social Protection - 10+ years cabinet experience"
                .to_string(),
            ..Candidate::new("humphreys", "Heather Humphreys")
        },
    ]
}

/// The starting point of the simulator: a three-way split, 60% turnout of a
/// 3.6 million electorate, and the transfer pattern suggested by the polls.
pub fn irish_presidential_2025() -> Result<Simulation, VotingErrors> {
    let mut builder = Builder::new(&CountRules::DEFAULT_RULES)?
        .candidates(&candidates_2025())?
        .electorate(DEFAULT_ELECTORATE)
        .turnout(DEFAULT_TURNOUT);

    builder.first_preference("connolly", 33)?;
    builder.first_preference("gavin", 34)?;
    builder.first_preference("humphreys", 33)?;

    builder.transfer_split("connolly", "gavin", 40)?;
    builder.transfer_split("connolly", "humphreys", 60)?;
    builder.transfer_split("gavin", "connolly", 45)?;
    builder.transfer_split("gavin", "humphreys", 55)?;
    builder.transfer_split("humphreys", "connolly", 50)?;
    builder.transfer_split("humphreys", "gavin", 50)?;

    // Shown until a live refresh succeeds.
    builder.odds("connolly", "34%")?;
    builder.odds("gavin", "18%")?;
    builder.odds("humphreys", "48%")?;

    builder.build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preset_2025() {
        let sim = irish_presidential_2025().unwrap();
        let keys: Vec<&str> = sim.roster().keys().collect();
        assert_eq!(keys, vec!["connolly", "gavin", "humphreys"]);
        assert_eq!(sim.first_preferences().total(), 100);
        assert_eq!(sim.transfers().split("gavin", "humphreys"), Some(55));
        assert_eq!(sim.odds().get("humphreys"), Some("48%"));
        assert_eq!(sim.roster().short_name("gavin"), "Gavin");
        let humphreys = sim.roster().get("humphreys").unwrap();
        assert_eq!(humphreys.party, "Fine Gael");
        assert_eq!(humphreys.key_policies[1], "Unity & Community");
    }

    #[test]
    fn preset_2025_count() {
        let res = irish_presidential_2025().unwrap().outcome().unwrap();
        assert_eq!(res.total_votes, 2_160_000);
        assert_eq!(res.rounds.len(), 2);
        assert_eq!(res.rounds[1].eliminated, Some("connolly".to_string()));
        assert_eq!(res.rounds[1].votes_for("gavin"), Some(1_019_520));
        assert_eq!(res.rounds[1].votes_for("humphreys"), Some(1_140_480));
        assert_eq!(res.winner, Some("humphreys".to_string()));
    }
}
