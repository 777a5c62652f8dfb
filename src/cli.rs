use clap::{ArgAction, Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(author, version, about = "Crawl and summarise the dissertation defence registry")]
pub struct Cli {
    /// Raise log verbosity (-v debug, -vv trace). RUST_LOG takes precedence.
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fetch registry pages that are not cached yet.
    Pull(PullArgs),
    /// Build the record table from the page cache.
    Stats(StatsArgs),
    /// Download dissertation texts for one speciality.
    Download(DownloadArgs),
    Speciality {
        #[command(subcommand)]
        command: ViewCommand,
    },
    #[command(alias = "dissovet")]
    Committee {
        #[command(subcommand)]
        command: ViewCommand,
    },
    Supervisor {
        #[command(subcommand)]
        command: ViewCommand,
    },
    Author {
        #[command(subcommand)]
        command: MatchCommand,
    },
}

#[derive(Debug, Args)]
pub struct NetArgs {
    /// Registry root URL.
    #[arg(long, default_value = "https://dissovet.itmo.ru/")]
    pub base_url: String,

    /// Delay before each request (politeness).
    #[arg(long, default_value_t = 0)]
    pub delay_ms: u64,

    /// Per-request timeout.
    #[arg(long, default_value_t = 60)]
    pub timeout_secs: u64,
}

#[derive(Debug, Args)]
pub struct PullArgs {
    /// Newline-delimited list of dissertation numbers to fetch.
    #[arg(long, default_value = "assets/numbers.txt")]
    pub numbers: String,

    /// Page cache directory.
    #[arg(long, default_value = "assets/pages")]
    pub pages: String,

    #[command(flatten)]
    pub net: NetArgs,
}

#[derive(Debug, Args)]
pub struct StatsArgs {
    /// Page cache directory (filled by `pull`).
    #[arg(long, default_value = "assets/pages")]
    pub pages: String,

    /// Output path for the record table.
    #[arg(long, default_value = "assets/stats.tsv")]
    pub stats: String,
}

#[derive(Debug, Args)]
pub struct DownloadArgs {
    /// Page cache directory (filled by `pull`).
    #[arg(long, default_value = "assets/pages")]
    pub pages: String,

    /// Record table (written by `stats`).
    #[arg(long, default_value = "assets/stats.tsv")]
    pub stats: String,

    /// Output directory for texts, one subdirectory per speciality.
    #[arg(long, default_value = "assets/texts")]
    pub texts: String,

    /// Only records with this speciality code are downloaded.
    #[arg(long, default_value = "05.13.17")]
    pub speciality: String,

    #[command(flatten)]
    pub net: NetArgs,
}

#[derive(Debug, Subcommand)]
pub enum ViewCommand {
    /// Most frequent values with cumulative percentiles.
    Top(TopArgs),
    /// Rows whose value matches a regular expression.
    Match(MatchArgs),
}

#[derive(Debug, Subcommand)]
pub enum MatchCommand {
    /// Rows whose value matches a regular expression.
    Match(MatchArgs),
}

#[derive(Debug, Args)]
pub struct TopArgs {
    /// Number of rows to show.
    #[arg(short, default_value_t = 10)]
    pub n: usize,

    /// Record table (written by `stats`).
    #[arg(long, default_value = "assets/stats.tsv")]
    pub stats: String,

    /// Print JSON lines instead of a table.
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct MatchArgs {
    /// Regular expression searched within the column value.
    #[arg(long, default_value = ".*")]
    pub pattern: String,

    /// Record table (written by `stats`).
    #[arg(long, default_value = "assets/stats.tsv")]
    pub stats: String,

    /// Print JSON lines instead of a table.
    #[arg(long)]
    pub json: bool,
}
