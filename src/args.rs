use clap::Parser;

/// This is a simulator for the count of the Irish presidential election.
#[derive(Parser, Debug, Clone, Default)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path, optional) The file describing the scenario in JSON. If not provided, the
    /// 2025 presidential election is simulated. See the manual of stv_count for the format.
    #[clap(short, long, value_parser)]
    pub config: Option<String>,
    /// (file path) A reference file containing the outcome of the count in JSON format. If provided,
    /// stvsim will check that the computed summary matches the reference.
    #[clap(short, long, value_parser)]
    pub reference: Option<String>,

    /// (file path, 'stdout' or empty) If specified, the summary of the count will be written in JSON
    /// format to the given location.
    #[clap(short, long, value_parser)]
    pub out: Option<String>,

    /// (file path, optional) A file with betting odds, in the format of the market feed. If the
    /// file cannot be read, the odds of the scenario are kept.
    #[clap(long, value_parser)]
    pub odds: Option<String>,

    // Adjustments, applied in this order.
    /// (number) Sets the turnout in percent. It is clamped between 40 and 80.
    #[clap(long, value_parser)]
    pub turnout: Option<String>,

    /// (candidate id, repeatable) Toggles the lock of a candidate.
    #[clap(long, value_parser)]
    pub lock: Vec<String>,

    /// (KEY=VALUE, repeatable) Sets the first-preference share of a candidate. The other
    /// candidates are rebalanced.
    #[clap(long, value_parser)]
    pub pref: Vec<String>,

    /// (FROM:TO=VALUE, repeatable) Sets the share of the votes of FROM that transfer to TO.
    #[clap(long, value_parser)]
    pub transfer: Vec<String>,

    // Other arguments
    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, takes_value = false)]
    pub verbose: bool,
}
