//! Dotted-path lookup over a record tree.

use log::debug;
use taxform_common::model::record::Node;

/// Separator between the keys of a path.
pub const PATH_DELIMITER: char = '.';

/// Outcome of a path lookup.
///
/// `Found(Node::Null)` is a legitimate result (the field exists and is empty) and is kept apart
/// from `NotFound` (some key on the way does not exist).
#[derive(Clone, Copy, Debug)]
pub enum Resolution<'a> {
    Found(Node<'a>),
    NotFound,
}

impl<'a> Resolution<'a> {
    pub fn is_found(&self) -> bool {
        matches!(self, Resolution::Found(_))
    }

    pub fn node(self) -> Option<Node<'a>> {
        match self {
            Resolution::Found(node) => Some(node),
            Resolution::NotFound => None,
        }
    }
}

/// Walks `path` from `root`, one key at a time.
///
/// Each step asks the current node for its accessor (keyed container or named fields) and looks
/// the key up through it. A leaf, a `null`, or a missing key ends the walk with
/// [`Resolution::NotFound`]; nothing here fails.
pub fn resolve<'a>(root: Node<'a>, path: &str) -> Resolution<'a> {
    let mut current = root;
    for key in path.split(PATH_DELIMITER) {
        match current.child(key) {
            Some(next) => current = next,
            None => {
                debug!("path '{}' stops at key '{}'", path, key);
                return Resolution::NotFound;
            }
        }
    }
    Resolution::Found(current)
}
