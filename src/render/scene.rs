use std::fmt::Write as _;

use indexmap::IndexMap;

/// One retained SVG element.
///
/// Nodes are addressed by stable keys so repeated draw passes update
/// attributes in place instead of destroying and recreating elements. Every
/// actual mutation bumps a counter; a draw pass over unchanged inputs leaves
/// the recursive [`SceneNode::mutation_count`] untouched, which is how
/// render idempotence is observed.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneNode {
    tag: String,
    attrs: IndexMap<String, String>,
    children: IndexMap<String, SceneNode>,
    text: Option<String>,
    mutations: u64,
}

impl SceneNode {
    #[must_use]
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_owned(),
            attrs: IndexMap::new(),
            children: IndexMap::new(),
            text: None,
            mutations: 0,
        }
    }

    #[must_use]
    pub fn tag(&self) -> &str {
        &self.tag
    }

    #[must_use]
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs.get(name).map(String::as_str)
    }

    #[must_use]
    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    /// Sets an attribute; returns `true` when the stored value changed.
    pub fn set_attr(&mut self, name: &str, value: impl Into<String>) -> bool {
        let value = value.into();
        match self.attrs.get(name) {
            Some(current) if *current == value => false,
            _ => {
                self.attrs.insert(name.to_owned(), value);
                self.mutations += 1;
                true
            }
        }
    }

    /// Numeric attribute convenience with deterministic formatting.
    pub fn set_number_attr(&mut self, name: &str, value: f64) -> bool {
        self.set_attr(name, format_number(value))
    }

    pub fn remove_attr(&mut self, name: &str) -> bool {
        if self.attrs.shift_remove(name).is_some() {
            self.mutations += 1;
            true
        } else {
            false
        }
    }

    pub fn set_text(&mut self, text: Option<&str>) -> bool {
        if self.text.as_deref() == text {
            return false;
        }
        self.text = text.map(str::to_owned);
        self.mutations += 1;
        true
    }

    #[must_use]
    pub fn child(&self, key: &str) -> Option<&SceneNode> {
        self.children.get(key)
    }

    #[must_use]
    pub fn child_mut(&mut self, key: &str) -> Option<&mut SceneNode> {
        self.children.get_mut(key)
    }

    #[must_use]
    pub fn child_count(&self) -> usize {
        self.children.len()
    }

    pub fn children(&self) -> impl Iterator<Item = (&str, &SceneNode)> {
        self.children.iter().map(|(key, node)| (key.as_str(), node))
    }

    /// Returns the child under `key`, creating it when absent.
    ///
    /// A key that exists with a different tag is replaced; keyed reuse is
    /// only valid between elements of the same kind.
    pub fn ensure_child(&mut self, key: &str, tag: &str) -> &mut SceneNode {
        let recreate = match self.children.get(key) {
            Some(existing) => existing.tag != tag,
            None => true,
        };
        if recreate {
            self.children.insert(key.to_owned(), SceneNode::new(tag));
            self.mutations += 1;
        }
        self.children.get_mut(key).expect("child just ensured")
    }

    pub fn remove_child(&mut self, key: &str) -> bool {
        if self.children.shift_remove(key).is_some() {
            self.mutations += 1;
            true
        } else {
            false
        }
    }

    /// Keyed enter/update/exit pass over all children of this node.
    ///
    /// Items matched by key are updated in place, new keys enter at the end,
    /// and children whose key no longer appears are removed. The node must
    /// be dedicated to this collection.
    pub fn sync_keyed_children<T>(
        &mut self,
        tag: &str,
        items: &[T],
        key_of: impl Fn(&T) -> String,
        mut update: impl FnMut(&mut SceneNode, &T),
    ) {
        let keys: Vec<String> = items.iter().map(&key_of).collect();

        let stale: Vec<String> = self
            .children
            .keys()
            .filter(|key| !keys.contains(*key))
            .cloned()
            .collect();
        for key in stale {
            self.remove_child(&key);
        }

        for (item, key) in items.iter().zip(&keys) {
            let node = self.ensure_child(key, tag);
            update(node, item);
        }
    }

    /// Total number of mutations applied to this node and its subtree.
    #[must_use]
    pub fn mutation_count(&self) -> u64 {
        self.mutations
            + self
                .children
                .values()
                .map(SceneNode::mutation_count)
                .sum::<u64>()
    }

    /// Serializes the subtree to SVG markup.
    #[must_use]
    pub fn to_svg(&self) -> String {
        let mut out = String::new();
        self.write_svg(&mut out);
        out
    }

    fn write_svg(&self, out: &mut String) {
        let _ = write!(out, "<{}", self.tag);
        for (name, value) in &self.attrs {
            let _ = write!(out, " {}=\"{}\"", name, escape_xml(value));
        }
        if self.text.is_none() && self.children.is_empty() {
            out.push_str("/>");
            return;
        }
        out.push('>');
        if let Some(text) = &self.text {
            out.push_str(&escape_xml(text));
        }
        for child in self.children.values() {
            child.write_svg(out);
        }
        let _ = write!(out, "</{}>", self.tag);
    }
}

/// Deterministic number formatting for SVG attribute values.
#[must_use]
pub fn format_number(value: f64) -> String {
    if value == value.trunc() && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{value}")
    }
}

fn escape_xml(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}
