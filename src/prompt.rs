//! Interactive picking with fuzzy autocompletion.

use std::rc::Rc;

use indexmap::IndexMap;
use inquire::{Autocomplete, InquireError};
use itertools::Itertools;
use thisctx::IntoError;

use crate::error;
use crate::fuzzy::{self, Transform, Transformer};

const MAX_SUGGESTIONS: usize = 30;

#[derive(Clone)]
pub struct FuzzyCompleter {
    pub(crate) haystack: Rc<Vec<String>>,
    /// Case-folded item to the item as loaded.
    pub(crate) index: Rc<IndexMap<String, String>>,
    pub(crate) rank: bool,
    pub(crate) last: Option<String>,
}

impl Autocomplete for FuzzyCompleter {
    fn get_suggestions(&mut self, input: &str) -> Result<Vec<String>, inquire::CustomUserError> {
        let suggestions = self.suggest(input);
        self.last = suggestions.first().cloned();
        Ok(suggestions)
    }

    fn get_completion(
        &mut self,
        _: &str,
        highlighted_suggestion: Option<String>,
    ) -> Result<inquire::autocompletion::Replacement, inquire::CustomUserError> {
        Ok(highlighted_suggestion.or_else(|| self.last.clone()))
    }
}

impl FuzzyCompleter {
    /// Searches case-insensitively, reporting items as they were loaded.
    pub fn suggest(&self, input: &str) -> Vec<String> {
        fuzzy::search(
            self.haystack.as_slice(),
            input,
            self.rank,
            Some(&Transformer::IgnoreCase),
        )
        .into_items()
        .into_iter()
        .map(|item| self.index.get(&item).cloned().unwrap_or(item))
        .unique()
        .take(MAX_SUGGESTIONS)
        .collect_vec()
    }

    /// Resolves user input to a known item, ignoring case.
    pub fn resolve(&self, input: &str) -> error::Result<String> {
        let key = Transformer::IgnoreCase.apply(input.trim());
        match self.index.get(&key) {
            Some(item) => Ok(item.clone()),
            None => error::InvalidInput.fail(),
        }
    }
}

pub fn prompt_pick(completer: &FuzzyCompleter) -> error::Result<Option<String>> {
    Ok(loop {
        let prompt = inquire::Text::new("Pick an item:")
            .with_help_message("(Tab) to autocomplete, (Esc) to cancel, (Ctrl_C) to abort")
            .with_autocomplete(completer.clone());
        let input = match prompt.prompt() {
            Ok(t) => t,
            Err(InquireError::OperationCanceled) => break None,
            Err(InquireError::OperationInterrupted) => return Err(error::Interrupted.build()),
            Err(e) => return Err(error::Prompt.into_error(e)),
        };
        let item = match completer.resolve(&input) {
            Ok(t) => t,
            Err(error::Error::InvalidInput) => {
                msgerror!("# '{}' is not a known item!", input);
                continue;
            }
            Err(e) => return Err(e),
        };
        msginfo!("# Your input: {}", item);
        break Some(item);
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::Runtime;

    fn completer(rank: bool) -> FuzzyCompleter {
        let mut builder = Runtime::builder();
        builder.load_haystack("Type 2 diabetes\nType 1 diabetes\nHypertension\nHypothyroidism\n");
        builder.build().completer(rank)
    }

    #[test]
    fn suggestions_keep_original_case() {
        let mut completer = completer(false);
        assert_eq!(
            completer.get_suggestions("hypot").unwrap(),
            ["Hypothyroidism"]
        );
        assert_eq!(completer.last.as_deref(), Some("Hypothyroidism"));
        assert_eq!(completer.get_suggestions("").unwrap().len(), 4);
    }

    #[test]
    fn ranked_suggestions() {
        let completer = completer(true);
        assert_eq!(
            completer.suggest("type"),
            ["Type 2 diabetes", "Type 1 diabetes"]
        );
        assert_eq!(completer.suggest("hyp"), ["Hypertension", "Hypothyroidism"]);
    }

    #[test]
    fn completion_falls_back_to_top_suggestion() {
        let mut completer = completer(false);
        completer.get_suggestions("t1").unwrap();
        assert_eq!(
            completer.get_completion("t1", None).unwrap(),
            Some("Type 1 diabetes".to_owned())
        );
        assert_eq!(
            completer
                .get_completion("t1", Some("Hypertension".to_owned()))
                .unwrap(),
            Some("Hypertension".to_owned())
        );
    }

    #[test]
    fn resolve_ignores_case() {
        let completer = completer(false);
        assert_eq!(completer.resolve(" hypertension ").unwrap(), "Hypertension");
        assert!(matches!(
            completer.resolve("asthma"),
            Err(error::Error::InvalidInput)
        ));
    }
}
