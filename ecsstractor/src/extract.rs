use indexmap::IndexSet;
use pug::Node;

/// Unique class names in the order they were first seen.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassTokenSet {
    tokens: IndexSet<String>,
}

impl ClassTokenSet {
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.tokens.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn contains(&self, token: &str) -> bool {
        self.tokens.contains(token)
    }

    pub fn to_vec(&self) -> Vec<String> {
        self.tokens.iter().cloned().collect()
    }

    /// Returns `false` if the token was already present.
    fn insert(&mut self, token: &str) -> bool {
        if self.tokens.contains(token) {
            return false;
        }
        self.tokens.insert(token.to_string())
    }
}

impl<S: AsRef<str>> FromIterator<S> for ClassTokenSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut set = ClassTokenSet::default();
        for token in iter {
            set.insert(token.as_ref());
        }
        set
    }
}

/// Collect every class named by a `class` attribute in the tree.
pub fn extract(root: &Node) -> ClassTokenSet {
    let mut classes = ClassTokenSet::default();
    collect(root, &mut classes);
    classes
}

fn collect(node: &Node, classes: &mut ClassTokenSet) {
    for attribute in node.attributes() {
        if attribute.name != "class" {
            continue;
        }
        if let Some(value) = attribute.value.as_deref() {
            for token in class_tokens(value) {
                classes.insert(&token);
            }
        }
    }

    for child in node.children() {
        collect(child, classes);
    }
}

/// Split a raw attribute value into class names. Quote characters are
/// dropped wherever they appear before splitting on whitespace, so `'a b'`
/// yields `a`, `b` and `'a'b` yields `ab`.
fn class_tokens(value: &str) -> Vec<String> {
    let unquoted: String = value.chars().filter(|c| !matches!(c, '\'' | '"')).collect();
    unquoted.split_whitespace().map(str::to_string).collect()
}
