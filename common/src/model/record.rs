//! Generic view over a declaration record.
//!
//! The context engine never looks at concrete record types. It walks a tree of [`Node`]s,
//! where every interior node is reached through one of two field accessors:
//!
//! - a **keyed container** (a JSON object), where children are looked up by key, and
//! - a **named-field** node (a typed struct implementing [`NamedFields`]), where children are
//!   looked up by field name.
//!
//! Both kinds may be mixed at any depth: a typed `Declaration` exposes its free-form `revenue`
//! object as a keyed container, and a JSON payload that was never validated is a tree of keyed
//! containers only.

use serde_json::{Map, Value};
use std::fmt;

const I64_BOUND: f64 = 9_223_372_036_854_775_808.0;

/// A borrowed node of a record tree.
#[derive(Clone, Copy, Debug)]
pub enum Node<'a> {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(&'a str),
    List(&'a [Value]),
    Keyed(&'a Map<String, Value>),
    Named(&'a dyn NamedFields),
}

/// Capability of a node to hand out children.
#[derive(Clone, Copy)]
pub enum Accessor<'a> {
    Keyed(&'a Map<String, Value>),
    Named(&'a dyn NamedFields),
}

/// Named-field access for typed record structs.
///
/// `field` returns `None` when the struct has no field with that name, which is different from
/// a field that exists and holds `None` (that one is `Some(Node::Null)`).
pub trait NamedFields: Sync + fmt::Debug {
    fn field(&self, name: &str) -> Option<Node<'_>>;

    /// Owned JSON rendition of the struct, used when a whole struct has to be printed.
    fn snapshot(&self) -> Value;
}

/// Conversion of a record field into a [`Node`].
pub trait AsNode {
    fn as_node(&self) -> Node<'_>;
}

impl<'a> Node<'a> {
    /// Returns the accessor matching this node's capability, or `None` for leaves.
    pub fn accessor(self) -> Option<Accessor<'a>> {
        match self {
            Node::Keyed(map) => Some(Accessor::Keyed(map)),
            Node::Named(fields) => Some(Accessor::Named(fields)),
            _ => None,
        }
    }

    /// Looks up a direct child through whichever accessor this node supports.
    pub fn child(self, key: &str) -> Option<Node<'a>> {
        self.accessor().and_then(|accessor| accessor.get(key))
    }

    pub fn as_i64(self) -> Option<i64> {
        match self {
            Node::Integer(v) => Some(v),
            // 2^63 is representable as f64 but not as i64.
            Node::Float(v) if v.fract() == 0.0 && v >= i64::MIN as f64 && v < I64_BOUND => {
                Some(v as i64)
            }
            _ => None,
        }
    }

    pub fn as_str(self) -> Option<&'a str> {
        match self {
            Node::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_numeric(self) -> bool {
        matches!(self, Node::Integer(_) | Node::Float(_))
    }

    /// Truthiness in the template sense: null, `false`, zero, empty text and empty
    /// containers are falsy.
    pub fn is_truthy(self) -> bool {
        match self {
            Node::Null => false,
            Node::Bool(b) => b,
            Node::Integer(v) => v != 0,
            Node::Float(v) => v != 0.0,
            Node::Text(s) => !s.is_empty(),
            Node::List(items) => !items.is_empty(),
            Node::Keyed(map) => !map.is_empty(),
            Node::Named(_) => true,
        }
    }

    /// Owned JSON copy of the node.
    pub fn to_value(self) -> Value {
        match self {
            Node::Null => Value::Null,
            Node::Bool(b) => Value::Bool(b),
            Node::Integer(v) => Value::from(v),
            Node::Float(v) => Value::from(v),
            Node::Text(s) => Value::from(s),
            Node::List(items) => Value::Array(items.to_vec()),
            Node::Keyed(map) => Value::Object(map.clone()),
            Node::Named(fields) => fields.snapshot(),
        }
    }
}

impl<'a> From<&'a Value> for Node<'a> {
    fn from(value: &'a Value) -> Self {
        match value {
            Value::Null => Node::Null,
            Value::Bool(b) => Node::Bool(*b),
            Value::Number(n) => match n.as_i64() {
                Some(v) => Node::Integer(v),
                None => n.as_f64().map(Node::Float).unwrap_or(Node::Null),
            },
            Value::String(s) => Node::Text(s),
            Value::Array(items) => Node::List(items),
            Value::Object(map) => Node::Keyed(map),
        }
    }
}

impl<'a> Accessor<'a> {
    pub fn get(self, key: &str) -> Option<Node<'a>> {
        match self {
            Accessor::Keyed(map) => map.get(key).map(Node::from),
            Accessor::Named(fields) => fields.field(key),
        }
    }
}

impl AsNode for Value {
    fn as_node(&self) -> Node<'_> {
        Node::from(self)
    }
}

impl AsNode for Map<String, Value> {
    fn as_node(&self) -> Node<'_> {
        Node::Keyed(self)
    }
}

impl AsNode for String {
    fn as_node(&self) -> Node<'_> {
        Node::Text(self)
    }
}

impl AsNode for bool {
    fn as_node(&self) -> Node<'_> {
        Node::Bool(*self)
    }
}

macro_rules! integer_as_node {
    ($($t:ty),*) => {
        $(
            impl AsNode for $t {
                fn as_node(&self) -> Node<'_> {
                    Node::Integer(i64::from(*self))
                }
            }
        )*
    };
}

integer_as_node!(u8, u16, u32, i32, i64);

impl<T: AsNode> AsNode for Option<T> {
    fn as_node(&self) -> Node<'_> {
        match self {
            Some(inner) => inner.as_node(),
            None => Node::Null,
        }
    }
}

/// Implements [`NamedFields`] and [`AsNode`] for a serializable struct, exposing the listed
/// fields by their Rust names. A field can be exposed under a different name with
/// `field as "name"`.
#[macro_export]
macro_rules! named_fields {
    (@name $field:ident $alias:literal) => { $alias };
    (@name $field:ident) => { stringify!($field) };
    ($ty:ty { $($field:ident $(as $alias:literal)?),* $(,)? }) => {
        impl $crate::model::record::NamedFields for $ty {
            fn field(&self, name: &str) -> Option<$crate::model::record::Node<'_>> {
                use $crate::model::record::AsNode;
                match name {
                    $( $crate::named_fields!(@name $field $($alias)?) => Some(self.$field.as_node()), )*
                    _ => None,
                }
            }

            fn snapshot(&self) -> $crate::serde_json::Value {
                $crate::serde_json::to_value(self).unwrap_or($crate::serde_json::Value::Null)
            }
        }

        impl $crate::model::record::AsNode for $ty {
            fn as_node(&self) -> $crate::model::record::Node<'_> {
                $crate::model::record::Node::Named(self)
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Serialize;
    use serde_json::json;

    #[derive(Debug, Serialize)]
    struct Inner {
        code: String,
        count: Option<u32>,
    }

    #[derive(Debug, Serialize)]
    struct Outer {
        inner: Inner,
        extra: Map<String, Value>,
    }

    named_fields!(Inner { code, count });
    named_fields!(Outer { inner, extra });

    #[test]
    fn keyed_and_named_children_interleave() {
        let mut extra = Map::new();
        extra.insert("nested".into(), json!({ "deep": 7 }));
        let outer = Outer {
            inner: Inner {
                code: "A1".into(),
                count: None,
            },
            extra,
        };
        let root = outer.as_node();

        let code = root.child("inner").and_then(|n| n.child("code"));
        assert_eq!(code.and_then(Node::as_str), Some("A1"));

        let deep = root
            .child("extra")
            .and_then(|n| n.child("nested"))
            .and_then(|n| n.child("deep"));
        assert_eq!(deep.and_then(Node::as_i64), Some(7));
    }

    #[test]
    fn present_none_is_null_not_missing() {
        let inner = Inner {
            code: String::new(),
            count: None,
        };
        assert!(matches!(inner.field("count"), Some(Node::Null)));
        assert!(inner.field("missing").is_none());
    }

    #[test]
    fn leaves_have_no_accessor() {
        let value = json!(5);
        assert!(Node::from(&value).accessor().is_none());
        assert!(Node::from(&value).child("x").is_none());
    }

    #[test]
    fn truthiness_follows_template_rules() {
        let empty = json!({});
        assert!(!Node::from(&empty).is_truthy());
        assert!(!Node::Integer(0).is_truthy());
        assert!(!Node::Text("").is_truthy());
        assert!(Node::Integer(3).is_truthy());
    }

    #[test]
    fn integral_floats_convert_only_within_i64_range() {
        assert_eq!(Node::Float(1_500_000.0).as_i64(), Some(1_500_000));
        assert_eq!(Node::Float(i64::MIN as f64).as_i64(), Some(i64::MIN));
        assert_eq!(Node::Float(9_223_372_036_854_775_808.0).as_i64(), None);
        assert_eq!(Node::Float(1e19).as_i64(), None);
        assert_eq!(Node::Float(2.5).as_i64(), None);
    }

    #[test]
    fn snapshot_serializes_named_struct() {
        let inner = Inner {
            code: "X".into(),
            count: Some(2),
        };
        assert_eq!(
            inner.as_node().to_value(),
            json!({ "code": "X", "count": 2 })
        );
    }
}
