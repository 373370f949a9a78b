//! Betting odds shown next to the candidates.
//!
//! Odds come from a feed of market events. The first event lists one market
//! per candidate, each with a question naming the candidate and the implied
//! probability. Refreshing the odds never fails: when the feed cannot be
//! read, the odds shown before are kept.

use crate::sim::*;

use chrono::{DateTime, Utc};

/// A source of market events.
pub trait OddsFeed {
    fn fetch(&self) -> SimResult<JSValue>;
}

/// Reads the market events from a JSON file.
pub struct FileOddsFeed {
    path: String,
}

impl FileOddsFeed {
    pub fn new(path: &str) -> FileOddsFeed {
        FileOddsFeed {
            path: path.to_string(),
        }
    }
}

impl OddsFeed for FileOddsFeed {
    fn fetch(&self) -> SimResult<JSValue> {
        let path = self.path.as_str();
        let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
        serde_json::from_str(&contents).context(ParsingJsonSnafu {})
    }
}

/// Applies the markets of the first event to the current odds.
///
/// A market sets the odds of every candidate whose key appears in its question,
/// ignoring case. Markets without a numeric probability are skipped, and so is
/// anything that does not have the expected shape.
pub fn parse_market_odds(data: &JSValue, roster: &Roster, current: &Odds) -> Odds {
    let markets = data
        .as_array()
        .and_then(|events| events.first())
        .and_then(|event| event.get("markets"))
        .and_then(|markets| markets.as_array());

    let mut odds = current.clone();
    for market in markets.into_iter().flatten() {
        let question = market
            .get("question")
            .and_then(|q| q.as_str())
            .map(|q| q.to_lowercase())
            .unwrap_or_default();
        let prob = match market.get("clobProbability").and_then(|p| p.as_f64()) {
            Some(p) => format!("{}%", (p * 100.0 + 0.5).floor() as i64),
            None => continue,
        };
        for key in roster.keys() {
            if question.contains(&key.to_lowercase()) {
                odds = odds.with_entry(key, &prob);
            }
        }
    }
    odds
}

/// The odds on display, with the state of their refresh.
#[derive(Debug, Clone)]
pub struct OddsBoard {
    odds: Odds,
    loading: bool,
    last_updated: Option<DateTime<Utc>>,
}

impl OddsBoard {
    pub fn new(odds: Odds) -> OddsBoard {
        OddsBoard {
            odds,
            loading: false,
            last_updated: None,
        }
    }

    pub fn odds(&self) -> &Odds {
        &self.odds
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// When the last refresh finished, whether it succeeded or not.
    pub fn last_updated(&self) -> Option<DateTime<Utc>> {
        self.last_updated
    }

    /// Marks a refresh as started. Returns false if one is already pending.
    pub fn begin_refresh(&mut self) -> bool {
        if self.loading {
            return false;
        }
        self.loading = true;
        true
    }

    pub fn finish_refresh(&mut self, fetched: SimResult<JSValue>, roster: &Roster) {
        match fetched {
            Ok(data) => {
                self.odds = parse_market_odds(&data, roster, &self.odds);
                debug!("odds refreshed: {:?}", self.odds);
            }
            Err(e) => {
                warn!("Could not refresh the odds, keeping the previous ones: {}", e);
            }
        }
        self.last_updated = Some(Utc::now());
        self.loading = false;
    }

    /// Fetches and applies new odds. Returns false if a refresh was already pending.
    pub fn refresh(&mut self, feed: &dyn OddsFeed, roster: &Roster) -> bool {
        if !self.begin_refresh() {
            warn!("A refresh of the odds is already in progress");
            return false;
        }
        let fetched = feed.fetch();
        self.finish_refresh(fetched, roster);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct StubFeed(Option<JSValue>);

    impl OddsFeed for StubFeed {
        fn fetch(&self) -> SimResult<JSValue> {
            match &self.0 {
                Some(js) => Ok(js.clone()),
                None => whatever!("network unreachable"),
            }
        }
    }

    fn roster() -> Roster {
        Roster::new(stv_count::presets::candidates_2025()).unwrap()
    }

    fn start() -> Odds {
        Odds::new(&[("connolly", "34%"), ("gavin", "18%"), ("humphreys", "48%")])
    }

    #[test]
    fn markets_of_first_event() {
        let data = json!([
            {"markets": [
                {"question": "Will Catherine Connolly win?", "clobProbability": 0.5349},
                {"question": "Will HEATHER HUMPHREYS win?", "clobProbability": 0.176},
                {"question": "Will Jim Gavin win?", "clobProbability": "0.3"},
                {"question": "Will Bertie Ahern win?", "clobProbability": 0.01}
            ]},
            {"markets": [{"question": "gavin", "clobProbability": 0.99}]}
        ]);
        let odds = parse_market_odds(&data, &roster(), &start());
        assert_eq!(odds.get("connolly"), Some("53%"));
        assert_eq!(odds.get("humphreys"), Some("18%"));
        assert_eq!(odds.get("gavin"), Some("18%"));
    }

    #[test]
    fn unexpected_shapes_keep_odds() {
        for data in [json!({}), json!([]), json!([{"markets": 3}]), json!([{}])] {
            assert_eq!(parse_market_odds(&data, &roster(), &start()), start());
        }
    }

    #[test]
    fn failed_refresh_keeps_odds() {
        let mut board = OddsBoard::new(start());
        assert_eq!(board.last_updated(), None);
        assert!(board.refresh(&StubFeed(None), &roster()));
        assert_eq!(board.odds(), &start());
        assert!(board.last_updated().is_some());
        assert!(!board.is_loading());

        let mut board = OddsBoard::new(start());
        assert!(board.refresh(&FileOddsFeed::new("/nonexistent/odds.json"), &roster()));
        assert_eq!(board.odds(), &start());
        assert!(board.last_updated().is_some());
    }

    #[test]
    fn successful_refresh() {
        let data = json!([{"markets": [{"question": "Gavin", "clobProbability": 0.2}]}]);
        let mut board = OddsBoard::new(start());
        assert!(board.refresh(&StubFeed(Some(data)), &roster()));
        assert_eq!(board.odds().get("gavin"), Some("20%"));
        assert_eq!(board.odds().get("connolly"), Some("34%"));
    }

    #[test]
    fn one_refresh_at_a_time() {
        let mut board = OddsBoard::new(start());
        assert!(board.begin_refresh());
        assert!(board.is_loading());
        assert!(!board.begin_refresh());
        assert!(!board.refresh(&StubFeed(None), &roster()));
        assert_eq!(board.last_updated(), None);
        board.finish_refresh(Ok(json!([])), &roster());
        assert!(!board.is_loading());
        assert!(board.begin_refresh());
    }
}
