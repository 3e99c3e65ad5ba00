//! Per-type field trees, built once and cached for the life of the process.

use super::column::{ScanTarget, ToValue};
use super::field::{FieldDescriptor, FieldKind};
use super::record::{Member, MemberShape, Record, Reflect, Slot, SlotMut};
use super::tag::Tag;
use crate::error::{DbError, DbResult};
use std::any::TypeId;
use std::collections::HashMap;
use std::sync::{Arc, LazyLock, PoisonError, RwLock};
use tracing::debug;

static CACHE: LazyLock<RwLock<HashMap<TypeId, Arc<TypeMap>>>> =
    LazyLock::new(|| RwLock::new(HashMap::new()));

/// The field tree of one record type.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeMap {
    type_name: &'static str,
    fields: Vec<FieldDescriptor>,
    /// Leaves in depth-first declaration order
    leaves: Vec<FieldDescriptor>,
    /// Storage name to leaf index; the shallowest leaf wins
    by_name: HashMap<String, usize>,
}

impl TypeMap {
    /// Field tree for `T`, built on first use.
    ///
    /// The cache lock is never held while a tree is built. Two threads racing
    /// on a new type both build it and the first insert wins.
    pub fn resolve<T: Record>() -> DbResult<Arc<TypeMap>> {
        let id = TypeId::of::<T>();

        if let Some(map) = CACHE
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&id)
        {
            return Ok(Arc::clone(map));
        }

        let built = Arc::new(Self::build(std::any::type_name::<T>(), T::members())?);
        debug!(
            type_name = built.type_name,
            leaves = built.leaves.len(),
            "Resolved record type map"
        );

        let mut cache = CACHE.write().unwrap_or_else(PoisonError::into_inner);
        Ok(Arc::clone(cache.entry(id).or_insert(built)))
    }

    /// Build a tree from member metadata without touching the cache.
    pub fn build(type_name: &'static str, members: Vec<Member>) -> DbResult<Self> {
        let mut stack = vec![type_name];
        let fields = build_fields(members, &[], &mut stack)?;

        let mut leaves = Vec::new();
        for field in &fields {
            field.collect_leaves(&mut leaves);
        }
        if leaves.is_empty() {
            return Err(DbError::NoMappableFields { type_name });
        }
        let leaves: Vec<FieldDescriptor> = leaves.into_iter().cloned().collect();

        // Level order is depth order with declaration order kept within a level,
        // so a stable sort by depth over the depth-first list gives it.
        let mut order: Vec<usize> = (0..leaves.len()).collect();
        order.sort_by_key(|&i| leaves[i].depth());

        let mut by_name = HashMap::with_capacity(leaves.len());
        for i in order {
            by_name.entry(leaves[i].name.clone()).or_insert(i);
        }

        Ok(Self {
            type_name,
            fields,
            leaves,
            by_name,
        })
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Top-level descriptors in declaration order.
    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    /// All leaves, depth first in declaration order.
    pub fn leaves(&self) -> &[FieldDescriptor] {
        &self.leaves
    }

    /// Leaf bound to a column name (exact, case-sensitive).
    pub fn leaf(&self, name: &str) -> Option<&FieldDescriptor> {
        self.by_name.get(name).map(|&i| &self.leaves[i])
    }

    pub fn path_of(&self, name: &str) -> Option<&[usize]> {
        self.leaf(name).map(|leaf| leaf.path.as_slice())
    }

    /// Leaves tagged `auto_increment`, in traversal order.
    pub fn auto_increment_leaves(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.leaves
            .iter()
            .filter(|leaf| leaf.options.is_auto_increment())
    }
}

fn build_fields(
    members: Vec<Member>,
    prefix: &[usize],
    stack: &mut Vec<&'static str>,
) -> DbResult<Vec<FieldDescriptor>> {
    let mut fields = Vec::with_capacity(members.len());

    for (index, member) in members.into_iter().enumerate() {
        let tag = Tag::parse_opt(member.tag);
        if tag.options.is_ignored() {
            continue;
        }

        let mut path = prefix.to_vec();
        path.push(index);

        let kind = match member.shape {
            MemberShape::Ignored => continue,
            MemberShape::Leaf(kind) => FieldKind::Leaf(kind),
            MemberShape::Embedded { type_name, members } => {
                if stack.contains(&type_name) {
                    return Err(DbError::invalid_input(format!(
                        "{} embeds itself through field '{}'",
                        type_name, member.ident
                    )));
                }
                stack.push(type_name);
                let children = build_fields(members(), &path, stack)?;
                stack.pop();
                FieldKind::Branch {
                    type_name,
                    children,
                }
            }
        };

        fields.push(FieldDescriptor {
            ident: member.ident,
            name: tag.name.unwrap_or_else(|| member.ident.to_string()),
            options: tag.options,
            path,
            kind,
        });
    }

    Ok(fields)
}

/// Read access to the leaf at `path`. `None` when the path crosses an unset
/// embedded pointer.
pub(crate) fn leaf_ref<'a>(root: &'a dyn Reflect, path: &[usize]) -> Option<&'a dyn ToValue> {
    let (last, parents) = path.split_last()?;
    let mut current = root;
    for &index in parents {
        current = match current.slot(index)? {
            Slot::Branch(Some(next)) => next,
            Slot::Branch(None) | Slot::Leaf(_) => return None,
        };
    }
    match current.slot(*last)? {
        Slot::Leaf(value) => Some(value),
        Slot::Branch(_) => None,
    }
}

/// Write access to the leaf at `path`, allocating unset embedded pointers.
pub(crate) fn leaf_mut<'a>(
    root: &'a mut dyn Reflect,
    path: &[usize],
) -> Option<&'a mut dyn ScanTarget> {
    let (last, parents) = path.split_last()?;
    let mut current = root;
    for &index in parents {
        current = match current.slot_mut(index)? {
            SlotMut::Branch(next) => next,
            SlotMut::Leaf(_) => return None,
        };
    }
    match current.slot_mut(*last)? {
        SlotMut::Leaf(target) => Some(target),
        SlotMut::Branch(_) => None,
    }
}
