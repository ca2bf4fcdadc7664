//! Keyboard and mouse driven autocomplete over a text input.
//!
//! The controller binds three elements: a root container, the text input and
//! the results list. What matches is decided entirely by the search callback;
//! the controller renders whatever it returns and tracks the highlighted
//! item.
//!
//! A controller built with [`Autocomplete::deferred`] does not search by
//! itself: input events queue a [`PendingSearch`] for the embedder to answer
//! through [`Autocomplete::complete_search`], and only the answer to the
//! newest request is rendered.

use tracing::{debug, trace};

use crate::dom::{Dom, Event, EventKind, Key, ListenerId, NodeId, Target};
use crate::request::{PendingSearch, RequestSequencer, RequestToken};

pub const RESULT_ID_PREFIX: &str = "autocomplete-result-";
pub const RESULT_CLASS: &str = "autocomplete-result";
pub const SELECTED_CLASS: &str = "selected";
pub const HIDDEN_CLASS: &str = "hidden";

pub type SearchFn = Box<dyn FnMut(&str) -> Vec<String>>;
pub type Callback = Box<dyn FnMut()>;

enum SearchMode {
    Immediate(SearchFn),
    Deferred,
}

/// Returns the element id of the result rendered at `index`.
pub fn result_id(index: usize) -> String {
    format!("{RESULT_ID_PREFIX}{index}")
}

pub struct AutocompleteBuilder {
    root: NodeId,
    input: NodeId,
    results: NodeId,
    search: SearchMode,
    auto_select: bool,
    on_show: Option<Callback>,
    on_hide: Option<Callback>,
}

impl AutocompleteBuilder {
    /// Highlights the first result whenever results are rendered.
    pub fn auto_select(mut self, auto_select: bool) -> Self {
        self.auto_select = auto_select;
        self
    }

    pub fn on_show(mut self, f: impl 'static + FnMut()) -> Self {
        self.on_show = Some(Box::new(f));
        self
    }

    pub fn on_hide(mut self, f: impl 'static + FnMut()) -> Self {
        self.on_hide = Some(Box::new(f));
        self
    }

    /// Reads `aria-autocomplete` off the input and registers the listeners.
    pub fn build<D: Dom + ?Sized>(self, dom: &mut D) -> Autocomplete {
        let Self {
            root,
            input,
            results,
            search,
            auto_select,
            on_show,
            on_hide,
        } = self;
        let inline = matches!(
            dom.attribute(input, "aria-autocomplete"),
            Some("both" | "inline")
        );
        let listeners = [
            (Target::Document, EventKind::Click),
            (Target::Node(results), EventKind::Click),
            (Target::Node(input), EventKind::Focus),
            (Target::Node(input), EventKind::KeyUp),
            (Target::Node(input), EventKind::KeyDown),
        ]
        .into_iter()
        .map(|(target, kind)| Listener {
            id: dom.add_listener(target, kind),
            target,
            kind,
        })
        .collect();
        debug!(inline, auto_select, "Bind autocomplete to input {}", input);
        Autocomplete {
            root,
            input,
            results,
            search,
            auto_select,
            on_show,
            on_hide,
            inline,
            active_index: None,
            results_count: 0,
            shown: false,
            listeners,
            sequencer: RequestSequencer::new(),
            pending: None,
            complete_inline: false,
        }
    }
}

#[derive(Clone, Copy, Debug)]
struct Listener {
    id: ListenerId,
    target: Target,
    kind: EventKind,
}

pub struct Autocomplete {
    root: NodeId,
    input: NodeId,
    results: NodeId,
    search: SearchMode,
    auto_select: bool,
    on_show: Option<Callback>,
    on_hide: Option<Callback>,
    inline: bool,
    active_index: Option<usize>,
    results_count: usize,
    shown: bool,
    listeners: Vec<Listener>,
    sequencer: RequestSequencer,
    pending: Option<PendingSearch>,
    /// Whether the newest request came from typing with inline completion.
    complete_inline: bool,
}

impl Autocomplete {
    pub fn builder(
        root: NodeId,
        input: NodeId,
        results: NodeId,
        search: impl 'static + FnMut(&str) -> Vec<String>,
    ) -> AutocompleteBuilder {
        AutocompleteBuilder {
            root,
            input,
            results,
            search: SearchMode::Immediate(Box::new(search)),
            auto_select: false,
            on_show: None,
            on_hide: None,
        }
    }

    /// Starts a controller whose searches are answered out of band, see
    /// [`take_pending_search`](Self::take_pending_search).
    pub fn deferred(root: NodeId, input: NodeId, results: NodeId) -> AutocompleteBuilder {
        AutocompleteBuilder {
            root,
            input,
            results,
            search: SearchMode::Deferred,
            auto_select: false,
            on_show: None,
            on_hide: None,
        }
    }

    pub fn active_index(&self) -> Option<usize> {
        self.active_index
    }

    pub fn results_count(&self) -> usize {
        self.results_count
    }

    pub fn is_shown(&self) -> bool {
        self.shown
    }

    pub fn has_inline_autocomplete(&self) -> bool {
        self.inline
    }

    /// Dispatches an event to every live listener it reaches, innermost
    /// first. Returns whether the default action was prevented.
    pub fn handle_event<D: Dom + ?Sized>(&mut self, dom: &mut D, event: &Event) -> bool {
        let mut reached = self
            .listeners
            .iter()
            .filter(|l| l.kind == event.kind())
            .filter(|l| match l.target {
                Target::Document => true,
                Target::Node(node) => dom.contains(node, event.target()),
            })
            .copied()
            .collect::<Vec<_>>();
        reached.sort_by_key(|l| matches!(l.target, Target::Document));
        trace!("Dispatch {} to {} listener(s)", event.kind(), reached.len());

        let mut prevented = false;
        for listener in reached {
            prevented |= match (listener.target, event) {
                (Target::Document, Event::Click { target }) => {
                    self.on_document_click(dom, *target);
                    false
                }
                (Target::Node(_), Event::Click { target }) => {
                    self.on_results_click(dom, *target);
                    false
                }
                (_, Event::Focus { .. }) => {
                    self.update_results(dom);
                    false
                }
                (_, Event::KeyUp { key, .. }) => self.on_key_up(dom, key),
                (_, Event::KeyDown { key, .. }) => self.on_key_down(dom, key),
            };
        }
        prevented
    }

    /// Looks up the rendered result at `index`.
    pub fn item_at<D: Dom + ?Sized>(&self, dom: &D, index: usize) -> Option<NodeId> {
        let id = result_id(index);
        dom.children(self.results)
            .into_iter()
            .find(|&node| dom.attribute(node, "id") == Some(id.as_str()))
    }

    /// Copies the text of `item` into the input and closes the results.
    pub fn select_item<D: Dom + ?Sized>(&mut self, dom: &mut D, item: Option<NodeId>) {
        if let Some(item) = item {
            let text = dom.text(item);
            debug!("Select '{}'", text);
            dom.set_value(self.input, &text);
            self.hide_results(dom);
        }
    }

    /// Commits the highlighted item, if any.
    pub fn check_selection<D: Dom + ?Sized>(&mut self, dom: &mut D) {
        if let Some(index) = self.active_index {
            let item = self.item_at(&*dom, index);
            self.select_item(dom, item);
        }
    }

    /// Fills the input with the highlighted result and selects the completed
    /// suffix so further typing replaces it.
    pub fn autocomplete_item<D: Dom + ?Sized>(&mut self, dom: &mut D) {
        let Some(item) = dom
            .children(self.results)
            .into_iter()
            .find(|&node| dom.has_class(node, SELECTED_CLASS))
        else {
            return;
        };
        let input = dom.value(self.input);
        if input.is_empty() {
            return;
        }
        let completion = dom.text(item);
        if input != completion {
            trace!("Complete '{}' to '{}'", input, completion);
            dom.set_value(self.input, &completion);
            dom.set_selection_range(
                self.input,
                input.chars().count(),
                completion.chars().count(),
            );
        }
    }

    /// Runs the search callback against the current input and renders the
    /// results, superseding every pending search. A deferred controller
    /// queues a request instead.
    pub fn update_results<D: Dom + ?Sized>(&mut self, dom: &mut D) {
        self.refresh(dom, false);
    }

    /// Issues a search to be answered later through
    /// [`complete_search`](Self::complete_search).
    pub fn begin_search<D: Dom + ?Sized>(&mut self, dom: &D) -> PendingSearch {
        self.complete_inline = false;
        PendingSearch {
            token: self.sequencer.issue(),
            query: dom.value(self.input),
        }
    }

    /// Takes the newest search queued by input events on a deferred
    /// controller.
    pub fn take_pending_search(&mut self) -> Option<PendingSearch> {
        self.pending.take()
    }

    /// Renders results for a search started with
    /// [`begin_search`](Self::begin_search). Returns `false` and leaves the
    /// list untouched if a newer search has been issued since.
    pub fn complete_search<D: Dom + ?Sized>(
        &mut self,
        dom: &mut D,
        token: RequestToken,
        results: &[String],
    ) -> bool {
        if !self.sequencer.accept(token) {
            return false;
        }
        self.render(dom, results);
        if self.complete_inline {
            self.autocomplete_item(dom);
        }
        true
    }

    pub fn hide_results<D: Dom + ?Sized>(&mut self, dom: &mut D) {
        dom.clear_children(self.results);
        self.active_index = None;
        self.results_count = 0;
        dom.add_class(self.results, HIDDEN_CLASS);
        dom.set_attribute(self.root, "aria-expanded", "false");
        dom.remove_attribute(self.input, "aria-activedescendant");
        self.shown = false;
        if let Some(f) = self.on_hide.as_mut() {
            f();
        }
    }

    /// Unregisters every listener, newest first.
    pub fn dispose<D: Dom + ?Sized>(&mut self, dom: &mut D) {
        for listener in self.listeners.drain(..).rev() {
            trace!(
                "Remove {} for {} on {}",
                listener.id,
                listener.kind,
                listener.target
            );
            dom.remove_listener(listener.id);
        }
        debug!("Dispose autocomplete on input {}", self.input);
    }

    fn refresh<D: Dom + ?Sized>(&mut self, dom: &mut D, complete_inline: bool) {
        let query = dom.value(self.input);
        let results = match &mut self.search {
            SearchMode::Immediate(search) => Some(search(&query)),
            SearchMode::Deferred => None,
        };
        let Some(results) = results else {
            let pending = self.begin_search(&*dom);
            self.complete_inline = complete_inline;
            debug!("Queue {} for '{}'", pending.token, pending.query);
            self.pending = Some(pending);
            return;
        };
        self.sequencer.supersede();
        self.render(dom, &results);
        if complete_inline {
            self.autocomplete_item(dom);
        }
    }

    fn render<D: Dom + ?Sized>(&mut self, dom: &mut D, results: &[String]) {
        self.hide_results(dom);
        if results.is_empty() {
            return;
        }
        for (i, text) in results.iter().enumerate() {
            let item = dom.create_element("li");
            dom.set_attribute(item, "id", &result_id(i));
            dom.set_attribute(item, "role", "option");
            dom.add_class(item, RESULT_CLASS);
            if self.auto_select && i == 0 {
                dom.add_class(item, SELECTED_CLASS);
                dom.set_attribute(item, "aria-selected", "true");
            }
            dom.set_text(item, text);
            dom.append_child(self.results, item);
        }
        if self.auto_select {
            self.active_index = Some(0);
            dom.set_attribute(self.input, "aria-activedescendant", &result_id(0));
        }
        dom.remove_class(self.results, HIDDEN_CLASS);
        dom.set_attribute(self.root, "aria-expanded", "true");
        self.results_count = results.len();
        self.shown = true;
        debug!(count = self.results_count, "Show results");
        if let Some(f) = self.on_show.as_mut() {
            f();
        }
    }

    fn on_document_click<D: Dom + ?Sized>(&mut self, dom: &mut D, target: NodeId) {
        if target == self.input || dom.contains(self.root, target) {
            return;
        }
        self.hide_results(dom);
    }

    fn on_results_click<D: Dom + ?Sized>(&mut self, dom: &mut D, target: NodeId) {
        if dom.tag(target).eq_ignore_ascii_case("li") {
            self.select_item(dom, Some(target));
        }
    }

    fn on_key_up<D: Dom + ?Sized>(&mut self, dom: &mut D, key: &Key) -> bool {
        trace!("keyup {}", key);
        if matches!(key, Key::ArrowUp | Key::ArrowDown | Key::Escape | Key::Enter) {
            return true;
        }
        self.refresh(dom, self.inline && *key != Key::Backspace);
        false
    }

    fn on_key_down<D: Dom + ?Sized>(&mut self, dom: &mut D, key: &Key) -> bool {
        trace!("keydown {}", key);
        if *key == Key::Escape {
            self.hide_results(dom);
            dom.set_value(self.input, "");
            return false;
        }
        if self.results_count < 1 {
            if self.inline && matches!(key, Key::ArrowUp | Key::ArrowDown) {
                self.update_results(dom);
            } else {
                return false;
            }
        }
        let count = self.results_count;
        if count < 1 {
            return false;
        }

        let prev = self.active_index;
        let next = match key {
            Key::ArrowUp => match prev {
                Some(i) if i > 0 => i - 1,
                _ => count - 1,
            },
            Key::ArrowDown => match prev {
                Some(i) if i + 1 < count => i + 1,
                _ => 0,
            },
            Key::Enter => {
                let item = prev.and_then(|i| self.item_at(&*dom, i));
                let committed = item.is_some();
                self.select_item(dom, item);
                return committed;
            }
            Key::Tab => {
                self.check_selection(dom);
                self.hide_results(dom);
                return false;
            }
            _ => return false,
        };

        if let Some(item) = prev.and_then(|i| self.item_at(&*dom, i)) {
            dom.remove_class(item, SELECTED_CLASS);
            dom.set_attribute(item, "aria-selected", "false");
        }
        self.active_index = Some(next);
        match self.item_at(&*dom, next) {
            Some(item) => {
                dom.set_attribute(self.input, "aria-activedescendant", &result_id(next));
                dom.add_class(item, SELECTED_CLASS);
                dom.set_attribute(item, "aria-selected", "true");
                if self.inline {
                    let text = dom.text(item);
                    dom.set_value(self.input, &text);
                }
            }
            None => dom.remove_attribute(self.input, "aria-activedescendant"),
        }
        true
    }
}
