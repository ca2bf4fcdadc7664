//! A minimal element model the autocomplete controller is written against.
//!
//! [`Dom`] is the capability surface: values, attributes, classes, children
//! and listener registration. [`Document`] implements it in memory.

use std::fmt;
use std::str::FromStr;

use derive_more::Display;
use indexmap::{IndexMap, IndexSet};

#[derive(Clone, Copy, Debug, Display, Eq, PartialEq, Hash, PartialOrd, Ord)]
#[display("#{_0}")]
pub struct NodeId(usize);

#[derive(Clone, Copy, Debug, Display, Eq, PartialEq, Hash, PartialOrd, Ord)]
#[display("listener#{_0}")]
pub struct ListenerId(usize);

/// Where a listener is attached.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum Target {
    Document,
    Node(NodeId),
}

#[derive(Clone, Copy, Debug, Display, Eq, PartialEq, Hash)]
pub enum EventKind {
    #[display("click")]
    Click,
    #[display("focus")]
    Focus,
    #[display("keyup")]
    KeyUp,
    #[display("keydown")]
    KeyDown,
}

/// A keyboard key, named as the DOM names it.
#[derive(Clone, Debug, Display, Eq, PartialEq, Hash)]
pub enum Key {
    ArrowUp,
    ArrowDown,
    Escape,
    Enter,
    Tab,
    Backspace,
    #[display("{_0}")]
    Char(char),
    #[display("{_0}")]
    Other(String),
}

impl FromStr for Key {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.chars();
        Ok(match s {
            "ArrowUp" => Self::ArrowUp,
            "ArrowDown" => Self::ArrowDown,
            "Escape" => Self::Escape,
            "Enter" => Self::Enter,
            "Tab" => Self::Tab,
            "Backspace" => Self::Backspace,
            _ => match (chars.next(), chars.next()) {
                (Some(c), None) => Self::Char(c),
                _ => Self::Other(s.to_owned()),
            },
        })
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Event {
    Click { target: NodeId },
    Focus { target: NodeId },
    KeyUp { target: NodeId, key: Key },
    KeyDown { target: NodeId, key: Key },
}

impl Event {
    pub fn kind(&self) -> EventKind {
        match self {
            Self::Click { .. } => EventKind::Click,
            Self::Focus { .. } => EventKind::Focus,
            Self::KeyUp { .. } => EventKind::KeyUp,
            Self::KeyDown { .. } => EventKind::KeyDown,
        }
    }

    pub fn target(&self) -> NodeId {
        match self {
            Self::Click { target }
            | Self::Focus { target }
            | Self::KeyUp { target, .. }
            | Self::KeyDown { target, .. } => *target,
        }
    }
}

pub trait Dom {
    fn value(&self, node: NodeId) -> String;
    fn set_value(&mut self, node: NodeId, value: &str);
    /// Rendered text of the node and its descendants.
    fn text(&self, node: NodeId) -> String;
    fn set_text(&mut self, node: NodeId, text: &str);
    fn tag(&self, node: NodeId) -> &str;

    fn attribute(&self, node: NodeId, name: &str) -> Option<&str>;
    fn set_attribute(&mut self, node: NodeId, name: &str, value: &str);
    fn remove_attribute(&mut self, node: NodeId, name: &str);

    fn has_class(&self, node: NodeId, class: &str) -> bool;
    fn add_class(&mut self, node: NodeId, class: &str);
    fn remove_class(&mut self, node: NodeId, class: &str);

    fn create_element(&mut self, tag: &str) -> NodeId;
    fn append_child(&mut self, parent: NodeId, child: NodeId);
    fn clear_children(&mut self, node: NodeId);
    fn children(&self, node: NodeId) -> Vec<NodeId>;
    /// Whether `node` is `ancestor` or one of its descendants.
    fn contains(&self, ancestor: NodeId, node: NodeId) -> bool;

    /// Selects the chars `start..end` of an input's value.
    fn set_selection_range(&mut self, node: NodeId, start: usize, end: usize);

    fn add_listener(&mut self, target: Target, kind: EventKind) -> ListenerId;
    fn remove_listener(&mut self, id: ListenerId);
}

#[derive(Debug, Default)]
struct Node {
    tag: String,
    text: String,
    value: String,
    attributes: IndexMap<String, String>,
    classes: IndexSet<String>,
    children: Vec<NodeId>,
    parent: Option<NodeId>,
    selection: Option<(usize, usize)>,
}

#[derive(Debug, Default)]
pub struct Document {
    nodes: Vec<Node>,
    listeners: IndexMap<ListenerId, (Target, EventKind)>,
    next_listener: usize,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn listeners(&self) -> impl '_ + Iterator<Item = (ListenerId, Target, EventKind)> {
        self.listeners.iter().map(|(&id, &(t, k))| (id, t, k))
    }

    pub fn selection(&self, node: NodeId) -> Option<(usize, usize)> {
        self.node(node).selection
    }

    /// Types one char into an input, replacing the current selection.
    pub fn type_char(&mut self, node: NodeId, ch: char) {
        let (start, end) = self.edit_range(node);
        let mut chars = self.node(node).value.chars().collect::<Vec<_>>();
        chars.drain(start..end);
        chars.insert(start, ch);
        let node = self.node_mut(node);
        node.value = chars.into_iter().collect();
        node.selection = None;
    }

    /// Deletes the current selection, or the last char if nothing is
    /// selected.
    pub fn backspace(&mut self, node: NodeId) {
        let (start, end) = self.edit_range(node);
        let mut chars = self.node(node).value.chars().collect::<Vec<_>>();
        if start < end {
            chars.drain(start..end);
        } else {
            chars.pop();
        }
        let node = self.node_mut(node);
        node.value = chars.into_iter().collect();
        node.selection = None;
    }

    fn edit_range(&self, node: NodeId) -> (usize, usize) {
        let len = self.node(node).value.chars().count();
        match self.node(node).selection {
            Some((start, end)) => (start.min(len), end.min(len)),
            None => (len, len),
        }
    }

    fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0]
    }
}

impl Dom for Document {
    fn value(&self, node: NodeId) -> String {
        self.node(node).value.clone()
    }

    fn set_value(&mut self, node: NodeId, value: &str) {
        let node = self.node_mut(node);
        node.value = value.to_owned();
        node.selection = None;
    }

    fn text(&self, node: NodeId) -> String {
        let node = self.node(node);
        let mut text = node.text.clone();
        for &child in node.children.iter() {
            text.push_str(&self.text(child));
        }
        text
    }

    fn set_text(&mut self, node: NodeId, text: &str) {
        self.node_mut(node).text = text.to_owned();
    }

    fn tag(&self, node: NodeId) -> &str {
        &self.node(node).tag
    }

    fn attribute(&self, node: NodeId, name: &str) -> Option<&str> {
        self.node(node).attributes.get(name).map(String::as_str)
    }

    fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) {
        self.node_mut(node)
            .attributes
            .insert(name.to_owned(), value.to_owned());
    }

    fn remove_attribute(&mut self, node: NodeId, name: &str) {
        self.node_mut(node).attributes.shift_remove(name);
    }

    fn has_class(&self, node: NodeId, class: &str) -> bool {
        self.node(node).classes.contains(class)
    }

    fn add_class(&mut self, node: NodeId, class: &str) {
        self.node_mut(node).classes.insert(class.to_owned());
    }

    fn remove_class(&mut self, node: NodeId, class: &str) {
        self.node_mut(node).classes.shift_remove(class);
    }

    fn create_element(&mut self, tag: &str) -> NodeId {
        self.nodes.push(Node {
            tag: tag.to_owned(),
            ..Default::default()
        });
        NodeId(self.nodes.len() - 1)
    }

    fn append_child(&mut self, parent: NodeId, child: NodeId) {
        if let Some(old) = self.node(child).parent {
            self.node_mut(old).children.retain(|&c| c != child);
        }
        self.node_mut(child).parent = Some(parent);
        self.node_mut(parent).children.push(child);
    }

    fn clear_children(&mut self, node: NodeId) {
        for child in std::mem::take(&mut self.node_mut(node).children) {
            self.node_mut(child).parent = None;
        }
    }

    fn children(&self, node: NodeId) -> Vec<NodeId> {
        self.node(node).children.clone()
    }

    fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.node(id).parent;
        }
        false
    }

    fn set_selection_range(&mut self, node: NodeId, start: usize, end: usize) {
        self.node_mut(node).selection = Some((start, end));
    }

    fn add_listener(&mut self, target: Target, kind: EventKind) -> ListenerId {
        let id = ListenerId(self.next_listener);
        self.next_listener += 1;
        self.listeners.insert(id, (target, kind));
        id
    }

    fn remove_listener(&mut self, id: ListenerId) {
        self.listeners.shift_remove(&id);
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Document => write!(f, "document"),
            Self::Node(id) => write!(f, "{id}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_names() {
        assert_eq!("ArrowDown".parse::<Key>().unwrap(), Key::ArrowDown);
        assert_eq!("a".parse::<Key>().unwrap(), Key::Char('a'));
        assert_eq!("F5".parse::<Key>().unwrap(), Key::Other("F5".into()));
        assert_eq!(Key::Escape.to_string(), "Escape");
        assert_eq!(Key::Char('x').to_string(), "x");
    }

    #[test]
    fn tree_and_text() {
        let mut doc = Document::new();
        let root = doc.create_element("div");
        let list = doc.create_element("ul");
        let item = doc.create_element("li");
        doc.set_text(item, "asthma");
        let other = doc.create_element("span");
        doc.append_child(root, list);
        doc.append_child(list, item);
        assert!(doc.contains(root, item));
        assert!(doc.contains(item, item));
        assert!(!doc.contains(root, other));
        assert_eq!(doc.text(root), "asthma");

        doc.clear_children(list);
        assert!(doc.children(list).is_empty());
        assert!(!doc.contains(root, item));
    }

    #[test]
    fn attributes_and_classes() {
        let mut doc = Document::new();
        let node = doc.create_element("li");
        doc.set_attribute(node, "role", "option");
        assert_eq!(doc.attribute(node, "role"), Some("option"));
        doc.remove_attribute(node, "role");
        assert_eq!(doc.attribute(node, "role"), None);

        doc.add_class(node, "selected");
        doc.add_class(node, "selected");
        assert!(doc.has_class(node, "selected"));
        doc.remove_class(node, "selected");
        assert!(!doc.has_class(node, "selected"));
    }

    #[test]
    fn typing_replaces_selection() {
        let mut doc = Document::new();
        let input = doc.create_element("input");
        doc.type_char(input, 'a');
        doc.type_char(input, 's');
        assert_eq!(doc.value(input), "as");

        doc.set_value(input, "asthma");
        doc.set_selection_range(input, 2, 6);
        doc.type_char(input, 'p');
        assert_eq!(doc.value(input), "asp");

        doc.set_value(input, "asthma");
        doc.set_selection_range(input, 2, 6);
        doc.backspace(input);
        assert_eq!(doc.value(input), "as");
        doc.backspace(input);
        assert_eq!(doc.value(input), "a");
    }

    #[test]
    fn listener_registration() {
        let mut doc = Document::new();
        let a = doc.add_listener(Target::Document, EventKind::Click);
        let b = doc.add_listener(Target::Document, EventKind::Focus);
        assert_ne!(a, b);
        doc.remove_listener(a);
        assert_eq!(
            doc.listeners().collect::<Vec<_>>(),
            [(b, Target::Document, EventKind::Focus)]
        );
    }
}
