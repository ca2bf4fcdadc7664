use std::io::Write;
use std::rc::Rc;

use indexmap::{IndexMap, IndexSet};
use thisctx::WithContext;
use tracing::{info, trace, warn};

use crate::cli::{IoPath, OutputFormat};
use crate::error;
use crate::fuzzy::{self, SearchResults, Transform, Transformer};
use crate::prompt::FuzzyCompleter;

#[derive(Default)]
pub struct Runtime {
    haystack: Rc<Vec<String>>,
}

#[derive(Default)]
pub struct RuntimeBuilder {
    haystack: IndexSet<String>,
}

impl RuntimeBuilder {
    pub fn load_haystack_from(&mut self, input: &IoPath) -> error::Result<()> {
        info!("Load haystack from '{}'", input);
        let content = input.read_to_string()?;
        self.load_haystack(&content);
        Ok(())
    }

    /// Adds one item per non-blank line, keeping the first of any duplicates.
    pub fn load_haystack(&mut self, content: &str) {
        for line in content.lines() {
            let item = line.trim_end_matches('\r');
            if item.trim().is_empty() {
                trace!("Skip blank line");
                continue;
            }
            if !self.haystack.insert(item.to_owned()) {
                warn!("Skip duplicate item '{}'", item);
            }
        }
    }

    pub fn build(self) -> Runtime {
        Runtime {
            haystack: Rc::new(self.haystack.into_iter().collect()),
        }
    }
}

impl Runtime {
    pub fn builder() -> RuntimeBuilder {
        RuntimeBuilder::default()
    }

    pub fn haystack(&self) -> &[String] {
        &self.haystack
    }

    pub fn search(
        &self,
        query: &str,
        rank: bool,
        transform: Option<Transformer>,
    ) -> SearchResults {
        fuzzy::search(
            self.haystack.as_slice(),
            query,
            rank,
            transform.as_ref().map(|t| t as &dyn Transform),
        )
    }

    pub fn print_search(
        &self,
        writer: &mut dyn Write,
        query: &str,
        rank: bool,
        transform: Option<Transformer>,
        format: OutputFormat,
    ) -> error::Result<()> {
        let results = self.search(query, rank, transform);
        if results.is_empty() {
            info!("No item matches '{}'", query);
        } else {
            info!("Found {} item(s) for '{}'", results.len(), query);
        }
        for m in results.into_matches() {
            let written = match format {
                OutputFormat::Console => match m.score {
                    Some(score) => writeln!(writer, "{}\t{}", m.item, score),
                    None => writeln!(writer, "{}", m.item),
                },
                OutputFormat::Json => {
                    writeln!(writer, "{}", serde_json::to_string(&m).unwrap())
                }
            };
            written.context(error::Output)?;
        }
        Ok(())
    }

    /// Creates a completer over the haystack for interactive prompts.
    pub fn completer(&self, rank: bool) -> FuzzyCompleter {
        let index = self
            .haystack
            .iter()
            .fold(IndexMap::new(), |mut index, item| {
                index
                    .entry(Transformer::IgnoreCase.apply(item))
                    .or_insert_with(|| item.clone());
                index
            });
        FuzzyCompleter {
            haystack: self.haystack.clone(),
            index: Rc::new(index),
            rank,
            last: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn runtime(content: &str) -> Runtime {
        let mut builder = Runtime::builder();
        builder.load_haystack(content);
        builder.build()
    }

    #[test]
    fn load_skips_blank_and_duplicate_lines() {
        let rt = runtime("Asthma\n\n  \nCOPD\r\nAsthma\nasthma\n");
        assert_eq!(rt.haystack(), ["Asthma", "COPD", "asthma"]);
    }

    #[test]
    fn print_ranked_search() {
        let rt = runtime("Type 2 diabetes\nType 1 diabetes\nDepression\n");
        let mut out = Vec::new();
        rt.print_search(
            &mut out,
            "type 1",
            true,
            Some(Transformer::IgnoreCase),
            OutputFormat::Console,
        )
        .unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "type 1 diabetes\t9\n");

        let mut out = Vec::new();
        rt.print_search(&mut out, "Dep", false, None, OutputFormat::Json)
            .unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "{\"item\":\"Depression\"}\n");
    }

    #[test]
    fn completer_maps_back_to_original_case() {
        let rt = runtime("Asthma\nCOPD\n");
        let completer = rt.completer(false);
        assert_eq!(completer.index.get("copd").map(String::as_str), Some("COPD"));
    }
}
