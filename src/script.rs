//! Scripted autocomplete sessions against an in-memory document.

use std::cell::RefCell;
use std::fmt;
use std::io::Write;
use std::rc::Rc;

use itertools::Itertools;
use miette::{Diagnostic, NamedSource, SourceOffset, SourceSpan};
use serde::{Deserialize, Serialize};
use thisctx::{IntoError, WithContext};
use thiserror::Error;
use tracing::{debug, warn};

use crate::autocomplete::Autocomplete;
use crate::cli::OutputFormat;
use crate::dom::{Document, Dom, Event, Key, NodeId};
use crate::error;
use crate::fuzzy::{self, Transform, Transformer};
use crate::utils::parse_jsonc;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Script {
    pub haystack: Vec<String>,
    #[serde(default)]
    pub rank: bool,
    #[serde(default)]
    pub ignore_case: bool,
    #[serde(default)]
    pub auto_select: bool,
    /// Value of the input's `aria-autocomplete` attribute.
    #[serde(default)]
    pub aria_autocomplete: Option<String>,
    /// Initial text of the input.
    #[serde(default)]
    pub value: String,
    pub events: Vec<Step>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Step {
    Focus,
    /// Presses a key for each char.
    Type { text: String },
    /// Presses a key: keydown, the edit it makes, then keyup.
    Key { key: String },
    Keydown { key: String },
    Keyup { key: String },
    Click { target: ClickTarget },
}

#[derive(Clone, Debug, Deserialize)]
#[serde(untagged)]
pub enum ClickTarget {
    Named(NamedTarget),
    Item { item: usize },
}

#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NamedTarget {
    Input,
    Root,
    Results,
    Outside,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Notification {
    Show,
    Hide,
}

/// State of the page after one step.
#[derive(Debug, Serialize)]
pub struct Snapshot {
    pub step: usize,
    pub event: String,
    pub value: String,
    /// Char range of the input selected by inline completion.
    pub selection: Option<(usize, usize)>,
    pub active: Option<usize>,
    pub shown: bool,
    pub results: Vec<String>,
    pub notified: Vec<Notification>,
}

#[derive(Debug, Diagnostic, Error)]
#[error("{message}")]
#[diagnostic(code(phenocomplete::script))]
pub struct ScriptDiagnostic {
    message: String,
    #[source_code]
    src: NamedSource<String>,
    #[label("here")]
    span: SourceSpan,
}

/// Parses a script, allowing comments.
pub fn parse(source: &str, name: &str) -> error::Result<Script> {
    parse_jsonc(source).map_err(|e| {
        let offset = SourceOffset::from_location(source, e.line(), e.column());
        error::Script.into_error(Box::new(ScriptDiagnostic {
            message: e.to_string(),
            src: NamedSource::new(name, source.to_owned()),
            span: SourceSpan::new(offset, 0),
        }))
    })
}

/// Runs every step of a script, returning the page state after each.
pub fn replay(script: &Script) -> Vec<Snapshot> {
    let mut page = Page::new(script);
    let snapshots = script
        .events
        .iter()
        .enumerate()
        .map(|(i, step)| {
            page.apply(step);
            page.snapshot(i + 1, step)
        })
        .collect_vec();
    page.autocomplete.dispose(&mut page.doc);
    debug_assert_eq!(page.doc.listeners().count(), 0);
    snapshots
}

/// Replays a script, writing each snapshot as it is taken.
pub fn print_replay(
    writer: &mut dyn Write,
    script: &Script,
    format: OutputFormat,
) -> error::Result<()> {
    for snapshot in replay(script) {
        let written = match format {
            OutputFormat::Console => write!(writer, "{snapshot}"),
            OutputFormat::Json => {
                writeln!(writer, "{}", serde_json::to_string(&snapshot).unwrap())
            }
        };
        written.context(error::Output)?;
    }
    Ok(())
}

struct Page {
    doc: Document,
    root: NodeId,
    input: NodeId,
    results: NodeId,
    outside: NodeId,
    autocomplete: Autocomplete,
    notified: Rc<RefCell<Vec<Notification>>>,
}

impl Page {
    fn new(script: &Script) -> Self {
        let mut doc = Document::new();
        let body = doc.create_element("body");
        let root = doc.create_element("div");
        let input = doc.create_element("input");
        let results = doc.create_element("ul");
        let outside = doc.create_element("p");
        doc.append_child(body, root);
        doc.append_child(body, outside);
        doc.append_child(root, input);
        doc.append_child(root, results);
        doc.set_value(input, &script.value);
        if let Some(value) = &script.aria_autocomplete {
            doc.set_attribute(input, "aria-autocomplete", value);
        }

        let haystack = script.haystack.clone();
        let (rank, ignore_case) = (script.rank, script.ignore_case);
        let search = move |query: &str| {
            let transform = Transformer::IgnoreCase;
            fuzzy::search(
                haystack.as_slice(),
                query,
                rank,
                ignore_case.then_some(&transform as &dyn Transform),
            )
            .into_items()
        };

        let notified = Rc::new(RefCell::new(Vec::new()));
        let (shown, hidden) = (notified.clone(), notified.clone());
        let autocomplete = Autocomplete::builder(root, input, results, search)
            .auto_select(script.auto_select)
            .on_show(move || shown.borrow_mut().push(Notification::Show))
            .on_hide(move || hidden.borrow_mut().push(Notification::Hide))
            .build(&mut doc);

        Self {
            doc,
            root,
            input,
            results,
            outside,
            autocomplete,
            notified,
        }
    }

    fn apply(&mut self, step: &Step) {
        debug!("Replay {}", step);
        let input = self.input;
        match step {
            Step::Focus => {
                self.dispatch(Event::Focus { target: input });
            }
            Step::Type { text } => {
                for ch in text.chars() {
                    self.press(Key::Char(ch));
                }
            }
            Step::Key { key } => self.press(parse_key(key)),
            Step::Keydown { key } => {
                self.dispatch(Event::KeyDown {
                    target: input,
                    key: parse_key(key),
                });
            }
            Step::Keyup { key } => {
                self.dispatch(Event::KeyUp {
                    target: input,
                    key: parse_key(key),
                });
            }
            Step::Click { target } => {
                let node = match target {
                    ClickTarget::Named(NamedTarget::Input) => input,
                    ClickTarget::Named(NamedTarget::Root) => self.root,
                    ClickTarget::Named(NamedTarget::Results) => self.results,
                    ClickTarget::Named(NamedTarget::Outside) => self.outside,
                    ClickTarget::Item { item } => {
                        match self.autocomplete.item_at(&self.doc, *item) {
                            Some(node) => node,
                            None => {
                                warn!("No result rendered at index {}", item);
                                return;
                            }
                        }
                    }
                };
                self.dispatch(Event::Click { target: node });
            }
        }
    }

    /// Tab moves focus away, so its keyup never reaches the input.
    fn press(&mut self, key: Key) {
        let input = self.input;
        let prevented = self.dispatch(Event::KeyDown {
            target: input,
            key: key.clone(),
        });
        if !prevented {
            match key {
                Key::Char(ch) => self.doc.type_char(input, ch),
                Key::Backspace => self.doc.backspace(input),
                Key::Tab => return,
                _ => {}
            }
        }
        self.dispatch(Event::KeyUp { target: input, key });
    }

    fn dispatch(&mut self, event: Event) -> bool {
        self.autocomplete.handle_event(&mut self.doc, &event)
    }

    fn snapshot(&self, step: usize, event: &Step) -> Snapshot {
        let results = self
            .doc
            .children(self.results)
            .into_iter()
            .map(|node| self.doc.text(node))
            .collect();
        Snapshot {
            step,
            event: event.to_string(),
            value: self.doc.value(self.input),
            selection: self.doc.selection(self.input),
            active: self.autocomplete.active_index(),
            shown: self.autocomplete.is_shown(),
            results,
            notified: std::mem::take(&mut *self.notified.borrow_mut()),
        }
    }
}

fn parse_key(s: &str) -> Key {
    match s.parse() {
        Ok(key) => key,
        Err(never) => match never {},
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Focus => write!(f, "focus"),
            Self::Type { text } => write!(f, "type {text:?}"),
            Self::Key { key } => write!(f, "key {key}"),
            Self::Keydown { key } => write!(f, "keydown {key}"),
            Self::Keyup { key } => write!(f, "keyup {key}"),
            Self::Click { target } => write!(f, "click {target}"),
        }
    }
}

impl fmt::Display for ClickTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Named(NamedTarget::Input) => write!(f, "input"),
            Self::Named(NamedTarget::Root) => write!(f, "root"),
            Self::Named(NamedTarget::Results) => write!(f, "results"),
            Self::Named(NamedTarget::Outside) => write!(f, "outside"),
            Self::Item { item } => write!(f, "item {item}"),
        }
    }
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Show => write!(f, "show"),
            Self::Hide => write!(f, "hide"),
        }
    }
}

impl fmt::Display for Snapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}. {}", self.step, self.event)?;
        match self.selection {
            Some((start, end)) => {
                writeln!(f, "   value: {:?} (selected {start}..{end})", self.value)?
            }
            None => writeln!(f, "   value: {:?}", self.value)?,
        }
        if self.shown {
            let results = self
                .results
                .iter()
                .enumerate()
                .map(|(i, item)| {
                    if self.active == Some(i) {
                        format!("[{item}]")
                    } else {
                        item.clone()
                    }
                })
                .join(", ");
            writeln!(f, "   results: {results}")?;
        } else {
            writeln!(f, "   results: (hidden)")?;
        }
        if !self.notified.is_empty() {
            writeln!(f, "   notified: {}", self.notified.iter().join(", "))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const INLINE: &str = r#"
// Inline autocomplete over a few conditions.
{
  "haystack": ["Asthma", "Atrial fibrillation", "COPD", "Hypertension"],
  "ignoreCase": true,
  "autoSelect": true,
  "ariaAutocomplete": "both", // complete while typing
  "events": [
    { "type": "focus" },
    { "type": "type", "text": "a" },
    { "type": "key", "key": "ArrowDown" },
    { "type": "key", "key": "Enter" },
    { "type": "click", "target": "outside" }
  ]
}
"#;

    #[test]
    fn parse_with_comments() {
        let script = parse(INLINE, "inline.jsonc").unwrap();
        assert_eq!(script.haystack.len(), 4);
        assert!(script.ignore_case && script.auto_select);
        assert!(!script.rank);
        assert_eq!(script.aria_autocomplete.as_deref(), Some("both"));
        assert_eq!(script.events.len(), 5);
    }

    #[test]
    fn replay_inline_session() {
        let script = parse(INLINE, "inline.jsonc").unwrap();
        let snapshots = replay(&script);
        let values = snapshots.iter().map(|s| s.value.as_str()).collect_vec();
        assert_eq!(
            values,
            [
                "",
                "asthma",
                "atrial fibrillation",
                "atrial fibrillation",
                "atrial fibrillation"
            ]
        );
        assert_eq!(snapshots[0].results, ["Asthma", "Atrial fibrillation", "COPD", "Hypertension"]);
        assert_eq!(snapshots[1].results, ["asthma", "atrial fibrillation"]);
        assert_eq!(snapshots[1].selection, Some((1, 6)));
        assert_eq!(snapshots[2].active, Some(1));
        assert_eq!(snapshots[2].selection, None);
        assert!(snapshots[2].notified.is_empty());
        assert!(!snapshots[3].shown);
        assert_eq!(snapshots[3].notified, [Notification::Hide]);
        assert_eq!(
            snapshots[0].to_string(),
            "1. focus\n   value: \"\"\n   results: [Asthma], Atrial fibrillation, COPD, Hypertension\n   notified: hide, show\n"
        );
    }

    #[test]
    fn replay_arrow_navigation() {
        let script = parse(
            jsonstr!({
                "haystack": ["x", "y", "z"],
                "events": [
                    { "type": "focus" },
                    { "type": "key", "key": "ArrowDown" },
                    { "type": "key", "key": "ArrowDown" },
                    { "type": "key", "key": "ArrowUp" }
                ]
            }),
            "arrows.json",
        )
        .unwrap();
        let active = replay(&script).iter().map(|s| s.active).collect_vec();
        assert_eq!(active, [None, Some(0), Some(1), Some(0)]);
    }

    #[test]
    fn replay_click_item() {
        let script = parse(
            jsonstr!({
                "haystack": ["asthma", "copd"],
                "value": "c",
                "events": [
                    { "type": "focus" },
                    { "type": "click", "target": "results" },
                    { "type": "click", "target": { "item": 0 } },
                    { "type": "click", "target": { "item": 3 } }
                ]
            }),
            "click.json",
        )
        .unwrap();
        let snapshots = replay(&script);
        assert_eq!(snapshots[0].results, ["copd"]);
        assert!(snapshots[1].shown);
        assert_eq!(snapshots[1].value, "c");
        assert!(snapshots[1].notified.is_empty());
        assert_eq!(snapshots[2].value, "copd");
        assert!(!snapshots[2].shown);
        assert_eq!(snapshots[3].event, "click item 3");
        assert!(snapshots[3].notified.is_empty());
    }

    #[test]
    fn print_replay_as_json() {
        let script = parse(
            jsonstr!({
                "haystack": ["asthma", "copd"],
                "events": [{ "type": "key", "key": "Escape" }]
            }),
            "escape.json",
        )
        .unwrap();
        let mut out = Vec::new();
        print_replay(&mut out, &script, OutputFormat::Json).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            concat!(
                r#"{"step":1,"event":"key Escape","value":"","selection":null,"#,
                r#""active":null,"shown":false,"results":[],"notified":["hide"]}"#,
                "\n"
            )
        );
    }

    #[test]
    fn invalid_script_points_at_error() {
        let source = "{\n  \"haystack\": [1],\n  \"events\": []\n}\n";
        match parse(source, "bad.json") {
            Err(error::Error::Script(diag)) => {
                assert!(diag.message.contains("invalid type"), "{}", diag.message);
                let offset = diag.span.offset();
                assert!((2..20).contains(&offset), "{offset}");
            }
            other => panic!("unexpected result {other:?}"),
        }
    }
}
