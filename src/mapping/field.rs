//! Field descriptor tree.

use super::tag::FieldOptions;
use crate::models::ValueKind;

/// One node of a record's field tree.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDescriptor {
    /// Member name as declared in the struct
    pub ident: &'static str,
    /// Storage name: the tag name if present, else `ident`
    pub name: String,
    pub options: FieldOptions,
    /// Member indices from the root record down to this field
    pub path: Vec<usize>,
    pub kind: FieldKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FieldKind {
    /// Maps to exactly one column
    Leaf(ValueKind),
    /// Reachable only through its children (an embedded record)
    Branch {
        type_name: &'static str,
        children: Vec<FieldDescriptor>,
    },
}

impl FieldDescriptor {
    pub fn is_leaf(&self) -> bool {
        matches!(self.kind, FieldKind::Leaf(_))
    }

    pub fn value_kind(&self) -> Option<ValueKind> {
        match self.kind {
            FieldKind::Leaf(kind) => Some(kind),
            FieldKind::Branch { .. } => None,
        }
    }

    pub fn children(&self) -> &[FieldDescriptor] {
        match &self.kind {
            FieldKind::Leaf(_) => &[],
            FieldKind::Branch { children, .. } => children,
        }
    }

    pub fn depth(&self) -> usize {
        self.path.len()
    }

    /// Leaves below (or at) this node, depth first in declaration order.
    pub fn leaves(&self) -> Vec<&FieldDescriptor> {
        let mut out = Vec::new();
        self.collect_leaves(&mut out);
        out
    }

    pub(crate) fn collect_leaves<'a>(&'a self, out: &mut Vec<&'a FieldDescriptor>) {
        match &self.kind {
            FieldKind::Leaf(_) => out.push(self),
            FieldKind::Branch { children, .. } => {
                for child in children {
                    child.collect_leaves(out);
                }
            }
        }
    }
}
