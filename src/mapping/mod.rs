//! Record introspection: tags, field trees and leaf conversions.
//!
//! - `record`: traits emitted by `#[derive(Record)]`
//! - `column`: leaf column types and the `Value` conversions
//! - `tag`: `#[db("name,options")]` parsing
//! - `field` / `type_map`: the cached field tree of a record type

pub mod column;
pub mod field;
pub mod record;
pub mod tag;
pub mod type_map;

pub use column::{Cell, Column, ScanTarget, ToValue};
pub use field::{FieldDescriptor, FieldKind};
pub use record::{Element, Embedded, Member, MemberShape, Record, Reflect, Slot, SlotMut};
pub use tag::{FieldOptions, Tag};
pub use type_map::TypeMap;

pub(crate) use type_map::{leaf_mut, leaf_ref};
