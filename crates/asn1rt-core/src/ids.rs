use std::collections::BTreeSet;

use crate::constraints::ConstraintId;
use crate::schema::{TypeModule, TypeNode};
use crate::types::TypeKind;

/// Distance between consecutive ids. Each type owns a block of five codes,
/// the first of which is its constraint id; the rest are left to codecs.
pub const ID_STRIDE: u32 = 5;

/// First id handed out in a module.
pub const FIRST_ID: u32 = 1;

/// Allocates constraint ids for a compilation unit.
#[derive(Debug, Clone)]
pub struct ConstraintIdAllocator {
    next: u32,
    used: BTreeSet<u32>,
}

impl ConstraintIdAllocator {
    /// Allocator that will never hand out an id already present in `module`.
    pub fn for_module(module: &TypeModule) -> Self {
        let mut used = BTreeSet::new();
        for assignment in &module.types {
            collect_ids(&assignment.ty, &mut used);
        }
        Self {
            next: FIRST_ID,
            used,
        }
    }

    pub fn allocate(&mut self) -> ConstraintId {
        while self.used.contains(&self.next) {
            self.next += ID_STRIDE;
        }
        let id = self.next;
        self.used.insert(id);
        self.next += ID_STRIDE;
        ConstraintId(id)
    }
}

/// Number every unnumbered node of the module.
///
/// Type assignments are visited in declaration order and each one
/// post-order, so a composite is numbered after all of its components.
/// Returns how many ids were assigned.
pub fn assign_constraint_ids(module: &mut TypeModule) -> usize {
    let mut allocator = ConstraintIdAllocator::for_module(module);
    let mut assigned = 0;
    for assignment in &mut module.types {
        assigned += assign_node(&mut assignment.ty, &mut allocator);
    }
    assigned
}

fn assign_node(node: &mut TypeNode, allocator: &mut ConstraintIdAllocator) -> usize {
    let mut assigned = 0;
    match &mut node.kind {
        TypeKind::Reference(_) => return 0,
        TypeKind::SequenceOf(sequence_of) => {
            assigned += assign_node(&mut sequence_of.element, allocator);
        }
        TypeKind::Sequence(sequence) => {
            for field in &mut sequence.fields {
                assigned += assign_node(&mut field.ty, allocator);
            }
        }
        TypeKind::Choice(choice) => {
            for alternative in &mut choice.alternatives {
                assigned += assign_node(&mut alternative.ty, allocator);
            }
        }
        _ => {}
    }

    if node.id.is_none() {
        node.id = allocator.allocate();
        assigned += 1;
    }
    assigned
}

fn collect_ids(node: &TypeNode, used: &mut BTreeSet<u32>) {
    if !node.id.is_none() {
        used.insert(node.id.get());
    }
    match &node.kind {
        TypeKind::SequenceOf(sequence_of) => collect_ids(&sequence_of.element, used),
        TypeKind::Sequence(sequence) => {
            for field in &sequence.fields {
                collect_ids(&field.ty, used);
            }
        }
        TypeKind::Choice(choice) => {
            for alternative in &choice.alternatives {
                collect_ids(&alternative.ty, used);
            }
        }
        _ => {}
    }
}
