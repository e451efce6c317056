use std::fmt::Write as _;

use smallvec::SmallVec;

use crate::events::{Event, Handler};
use crate::runtime::MountId;
use crate::unit::Element;

#[derive(Clone)]
pub enum NodeKind {
    Element { tag: String },
    Text(String),
    Fragment,
    /// A unit to mount at this position.
    Component(Element),
    /// A component position after commit, pointing at the child mount.
    Mount(MountId),
}

impl std::fmt::Debug for NodeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NodeKind::Element { tag } => f.debug_struct("Element").field("tag", tag).finish(),
            NodeKind::Text(text) => f.debug_tuple("Text").field(text).finish(),
            NodeKind::Fragment => write!(f, "Fragment"),
            NodeKind::Component(el) => f
                .debug_struct("Component")
                .field("name", &el.name())
                .field("key", &el.key())
                .finish(),
            NodeKind::Mount(id) => f.debug_tuple("Mount").field(id).finish(),
        }
    }
}

/// One node of render output.
#[derive(Clone)]
pub struct Node {
    pub kind: NodeKind,
    pub attrs: SmallVec<[(String, String); 2]>,
    pub handlers: SmallVec<[(String, Handler); 1]>,
    pub children: Vec<Node>,
}

impl std::fmt::Debug for Node {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let handlers: Vec<&str> = self.handlers.iter().map(|(e, _)| e.as_str()).collect();
        f.debug_struct("Node")
            .field("kind", &self.kind)
            .field("attrs", &self.attrs)
            .field("handlers", &handlers)
            .field("children", &self.children)
            .finish()
    }
}

impl Node {
    fn with_kind(kind: NodeKind) -> Self {
        Self {
            kind,
            attrs: SmallVec::new(),
            handlers: SmallVec::new(),
            children: Vec::new(),
        }
    }

    pub fn element(tag: impl Into<String>) -> Self {
        Self::with_kind(NodeKind::Element { tag: tag.into() })
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self::with_kind(NodeKind::Text(text.into()))
    }

    pub fn fragment(children: impl IntoIterator<Item = Node>) -> Self {
        Self::with_kind(NodeKind::Fragment).with_children(children)
    }

    pub fn attr(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.attrs.push((name.into(), value.to_string()));
        self
    }

    /// Shorthand for the `id` attribute, used by `Host::dispatch`.
    pub fn id(self, id: impl ToString) -> Self {
        self.attr("id", id)
    }

    pub fn on(mut self, event: impl Into<String>, handler: impl Fn(&Event) + 'static) -> Self {
        self.handlers.push((event.into(), std::rc::Rc::new(handler)));
        self
    }

    pub fn child(mut self, child: impl Into<Node>) -> Self {
        self.children.push(child.into());
        self
    }

    pub fn with_children(mut self, children: impl IntoIterator<Item = Node>) -> Self {
        self.children.extend(children);
        self
    }

    pub fn get_attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn handler(&self, event: &str) -> Option<Handler> {
        self.handlers
            .iter()
            .find(|(e, _)| e == event)
            .map(|(_, h)| h.clone())
    }

    /// Serialises this node. Mount positions are expanded by `resolve`.
    pub(crate) fn write_markup(&self, out: &mut String, resolve: &dyn Fn(MountId, &mut String)) {
        match &self.kind {
            NodeKind::Element { tag } => {
                let _ = write!(out, "<{tag}");
                for (k, v) in &self.attrs {
                    let _ = write!(out, " {k}=\"{}\"", escape(v));
                }
                out.push('>');
                for child in &self.children {
                    child.write_markup(out, resolve);
                }
                let _ = write!(out, "</{tag}>");
            }
            NodeKind::Text(text) => out.push_str(&escape(text)),
            NodeKind::Fragment => {
                for child in &self.children {
                    child.write_markup(out, resolve);
                }
            }
            NodeKind::Component(el) => {
                // Only seen on uncommitted trees.
                let _ = write!(out, "<{}/>", el.name());
            }
            NodeKind::Mount(id) => resolve(*id, out),
        }
    }
}

impl From<Element> for Node {
    fn from(el: Element) -> Self {
        Node::with_kind(NodeKind::Component(el))
    }
}

impl From<&str> for Node {
    fn from(text: &str) -> Self {
        Node::text(text)
    }
}

impl From<String> for Node {
    fn from(text: String) -> Self {
        Node::text(text)
    }
}

fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            c => out.push(c),
        }
    }
    out
}
