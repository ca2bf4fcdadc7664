use std::io::Write;
use std::process::ExitCode;

use clap::{CommandFactory, Parser};
use phenocomplete::cli::{Cli, Command, IoPath};
use phenocomplete::runtime::{Runtime, RuntimeBuilder};
use phenocomplete::{error, fuzzy, prompt, script, LogStatus, ResultExt as _};
use thisctx::WithContext;
use tracing::{info, Level};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::prelude::*;

static CONDITIONS: &str = include_str!("./conditions.txt");

fn load_haystack(rt: &mut RuntimeBuilder, input: &[IoPath]) -> error::Result<()> {
    if input.is_empty() {
        info!("Load built-in conditions");
        rt.load_haystack(CONDITIONS);
    }
    for path in input.iter() {
        rt.load_haystack_from(path)?;
    }
    Ok(())
}

fn main_impl(args: Cli) -> error::Result<()> {
    let mut rt = Runtime::builder();
    let mut stdout = std::io::stdout().lock();
    match args.cmd {
        Command::Search {
            input,
            rank,
            ignore_case,
            transform,
            format,
            query,
        } => {
            load_haystack(&mut rt, &input)?;
            let transform =
                transform.or(ignore_case.then_some(fuzzy::Transformer::IgnoreCase));
            rt.build()
                .print_search(&mut stdout, &query, rank, transform, format)?;
        }
        Command::Distance { a, b } => {
            writeln!(stdout, "{}", fuzzy::distance(&a, &b)).context(error::Output)?;
        }
        Command::Replay { script, format } => {
            let content = script.read_to_string()?;
            let parsed = script::parse(&content, &script.to_string())?;
            info!("Replay {} step(s) from '{}'", parsed.events.len(), script);
            script::print_replay(&mut stdout, &parsed, format)?;
        }
        Command::Pick { input, rank } => {
            load_haystack(&mut rt, &input)?;
            let completer = rt.build().completer(rank);
            if let Some(item) = prompt::prompt_pick(&completer).ignore_interrupted()?.flatten() {
                writeln!(stdout, "{item}").context(error::Output)?;
            }
        }
        Command::Completions { shell } => {
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_owned();
            clap_complete::generate(shell, &mut cmd, name, &mut stdout);
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    let args = Cli::parse();

    let level = match (args.quiet, args.verbose) {
        (true, _) => Level::ERROR,
        (_, 0) => Level::WARN,
        (_, 1) => Level::INFO,
        (_, 2) => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .without_time()
                .with_filter(LevelFilter::from_level(level)),
        )
        .with(LogStatus)
        .init();

    main_impl(args).log_error();
    if LogStatus::has_error() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
