use std::process::ExitCode;

use anyhow::Context as _;
use clap::Parser as _;
use dissovet::cli::{Cli, Command, MatchCommand, ViewCommand};

fn main() -> ExitCode {
    if let Err(err) = try_main() {
        eprintln!("{err:#}");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

fn try_main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    dissovet::logging::init(cli.verbose).context("init logging")?;
    tracing::debug!(?cli, "parsed cli");

    let mut stdout = std::io::stdout().lock();

    match cli.command {
        Command::Pull(args) => {
            let summary = dissovet::crawl::run(args).context("pull")?;
            println!(
                "Added {} pages, {} missing, {} already cached",
                summary.pages_added, summary.pages_missing, summary.pages_skipped
            );
        }
        Command::Stats(args) => {
            let report = dissovet::build::run(args).context("stats")?;
            match report.mean_interval {
                Some(mean) => println!(
                    "Average interval between dissertation upload and defence is {mean:.2} days"
                ),
                None => println!("No records with both upload and defence dates"),
            }
        }
        Command::Download(args) => {
            let summary = dissovet::download::run(args).context("download")?;
            println!(
                "Downloaded {} texts, {} already present, {} failed",
                summary.downloaded, summary.already_present, summary.failed
            );
        }
        Command::Speciality { command } => view("speciality", command, &mut stdout)?,
        Command::Committee { command } => view("committee", command, &mut stdout)?,
        Command::Supervisor { command } => view("supervisor", command, &mut stdout)?,
        Command::Author {
            command: MatchCommand::Match(args),
        } => dissovet::views::matches("author", &args, &mut stdout).context("author match")?,
    }

    Ok(())
}

fn view(column: &str, command: ViewCommand, out: &mut impl std::io::Write) -> anyhow::Result<()> {
    match command {
        ViewCommand::Top(args) => {
            dissovet::views::top(column, &args, out).with_context(|| format!("{column} top"))
        }
        ViewCommand::Match(args) => {
            dissovet::views::matches(column, &args, out).with_context(|| format!("{column} match"))
        }
    }
}
