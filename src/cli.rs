//! Command line arguments parser.

use std::io::{BufRead, BufReader, Read};
use std::{fmt, fs, io, str::FromStr};

use camino::Utf8PathBuf;
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use thisctx::WithContext;

use crate::error;
use crate::fuzzy::Transformer;

const V_PATH: &str = "PATH";
const V_QUERY: &str = "QUERY";

#[derive(Debug, Parser)]
#[command(version, about)]
pub struct Cli {
    /// Increase log verbosity, may be repeated.
    #[arg(short, long, action(ArgAction::Count), global(true))]
    pub verbose: u8,
    /// Only log errors.
    #[arg(short, long, global(true), conflicts_with("verbose"))]
    pub quiet: bool,
    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fuzzy search the haystack for a query.
    Search {
        /// Path(s) to load haystack items from, one per line.
        #[arg(short, long, value_name(V_PATH))]
        input: Vec<IoPath>,
        /// Sort matches by edit distance to the query.
        #[arg(short, long)]
        rank: bool,
        /// Match case-insensitively, same as '--transform=ignore-case'.
        #[arg(short('I'), long, conflicts_with("transform"))]
        ignore_case: bool,
        /// Transform the query and every item before matching.
        #[arg(short, long, value_enum)]
        transform: Option<Transformer>,
        /// Format of the results.
        #[arg(long, value_enum, default_value_t)]
        format: OutputFormat,
        /// Text to search for.
        #[arg(value_name(V_QUERY), default_value(""))]
        query: String,
    },
    /// Print the edit distance between two strings.
    Distance { a: String, b: String },
    /// Replay a scripted autocomplete session.
    Replay {
        /// Path to the script, or '-' to read from STDIN.
        #[arg(value_name(V_PATH))]
        script: IoPath,
        /// Format of the session trace.
        #[arg(long, value_enum, default_value_t)]
        format: OutputFormat,
    },
    /// Pick an item interactively with autocompletion.
    Pick {
        /// Path(s) to load haystack items from, one per line.
        #[arg(short, long, value_name(V_PATH))]
        input: Vec<IoPath>,
        /// Sort suggestions by edit distance to the input.
        #[arg(short, long)]
        rank: bool,
    },
    /// Generate shell completions for your shell to stdout.
    Completions {
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, ValueEnum)]
pub enum OutputFormat {
    /// Human readable plain text.
    #[default]
    Console,
    /// One JSON object per line.
    Json,
}

/// A file path, or STDIO when given as '-'.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum IoPath {
    Stdio,
    Path(Utf8PathBuf),
}

impl FromStr for IoPath {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "-" => Self::Stdio,
            _ => Self::Path(s.into()),
        })
    }
}

impl fmt::Display for IoPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stdio => f.write_str("STDIO"),
            Self::Path(path) => write!(f, "{path}"),
        }
    }
}

impl IoPath {
    pub fn open(&self) -> error::Result<Box<dyn BufRead>> {
        Ok(match self {
            Self::Stdio => Box::new(io::stdin().lock()),
            Self::Path(path) => Box::new(BufReader::new(
                fs::File::open(path).context(error::Io(self.to_string()))?,
            )),
        })
    }

    pub fn read_to_string(&self) -> error::Result<String> {
        let mut content = String::new();
        self.open()?
            .read_to_string(&mut content)
            .context(error::Io(self.to_string()))?;
        Ok(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_io_path() {
        assert_eq!("-".parse::<IoPath>().unwrap(), IoPath::Stdio);
        assert_eq!(
            "tests/haystack.txt".parse::<IoPath>().unwrap(),
            IoPath::Path("tests/haystack.txt".into())
        );
        assert_eq!(IoPath::Stdio.to_string(), "STDIO");
    }

    #[test]
    fn parse_cli() {
        let cli = Cli::try_parse_from(["phenocomplete", "-vv", "search", "-rI", "asth"]).unwrap();
        assert_eq!(cli.verbose, 2);
        match cli.cmd {
            Command::Search {
                rank,
                ignore_case,
                query,
                format,
                ..
            } => {
                assert!(rank && ignore_case);
                assert_eq!(query, "asth");
                assert_eq!(format, OutputFormat::Console);
            }
            cmd => panic!("unexpected command {cmd:?}"),
        }
    }
}
