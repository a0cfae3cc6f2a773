use indexmap::IndexMap;

use crate::extract::ClassTokenSet;

/// Blocks in first-encounter order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Hierarchy {
    blocks: IndexMap<String, Block>,
}

impl Hierarchy {
    pub fn blocks(&self) -> impl Iterator<Item = &Block> {
        self.blocks.values()
    }

    pub fn block(&self, name: &str) -> Option<&Block> {
        self.blocks.get(name)
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    fn block_mut(&mut self, name: &str) -> &mut Block {
        self.blocks
            .entry(name.to_string())
            .or_insert_with(|| Block::new(name))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub name: String,
    /// Block-level modifiers in recorded order; repeats are kept.
    pub modifiers: Vec<String>,
    elements: IndexMap<String, Element>,
}

impl Block {
    fn new(name: &str) -> Self {
        Block {
            name: name.to_string(),
            modifiers: Vec::new(),
            elements: IndexMap::new(),
        }
    }

    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.elements.values()
    }

    pub fn element(&self, name: &str) -> Option<&Element> {
        self.elements.get(name)
    }

    fn element_mut(&mut self, name: &str) -> &mut Element {
        self.elements
            .entry(name.to_string())
            .or_insert_with(|| Element {
                name: name.to_string(),
                modifiers: Vec::new(),
            })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub name: String,
    /// Element-level modifiers in recorded order; repeats are kept.
    pub modifiers: Vec<String>,
}

/// Sort class names into blocks, elements and modifiers.
///
/// Each token is tried against the element separator first, then the
/// modifier separator, and is otherwise a bare block name. Only the first
/// two segments of any split are used: `a__b__c` is element `b` of block
/// `a`, and `a--b--c` is modifier `b` of block `a`.
pub fn classify(
    tokens: &ClassTokenSet,
    element_separator: &str,
    modifier_separator: &str,
) -> Hierarchy {
    let mut hierarchy = Hierarchy::default();

    for token in tokens.iter() {
        if let (block_name, Some(element_part)) = split_pair(token, element_separator) {
            let (element_name, modifier) = split_pair(element_part, modifier_separator);
            let element = hierarchy.block_mut(block_name).element_mut(element_name);
            if let Some(modifier) = modifier {
                element.modifiers.push(modifier.to_string());
            }
        } else if let (block_name, Some(modifier)) = split_pair(token, modifier_separator) {
            hierarchy
                .block_mut(block_name)
                .modifiers
                .push(modifier.to_string());
        } else {
            hierarchy.block_mut(token);
        }
    }

    hierarchy
}

/// The first two segments of `token` split on `separator`. An empty
/// separator never splits.
fn split_pair<'t>(token: &'t str, separator: &str) -> (&'t str, Option<&'t str>) {
    if separator.is_empty() {
        return (token, None);
    }
    let mut segments = token.split(separator);
    let head = segments.next().unwrap_or(token);
    (head, segments.next())
}
