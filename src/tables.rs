//! Variable and constant tables built up during compilation and
//! consumed read-only by the VM.

use crate::address::{Address, ConstType, Segment, VarType};
use crate::constants::SEGMENT_WIDTH;
use crate::value::ConstValue;
use std::collections::HashMap;

/// Bumps per-segment allocation counters and turns them into addresses.
///
/// One `SegmentCounters` is shared by variable declarations *and*
/// temporary allocation for the `int`/`float`/`bool` segments, since
/// spec §3 defines those as combined "var/temp" segments: a variable
/// and a temporary draw from the same counter.
#[derive(Default)]
pub struct SegmentCounters {
    next: HashMap<Segment, u32>,
}

/// A segment has no room left for another address.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct SegmentExhausted(pub Segment);

impl SegmentCounters {
    pub fn new() -> SegmentCounters {
        SegmentCounters::default()
    }

    pub fn alloc(&mut self, segment: Segment) -> Result<Address, SegmentExhausted> {
        let offset = self.next.entry(segment).or_insert(0);
        if *offset >= SEGMENT_WIDTH {
            return Err(SegmentExhausted(segment));
        }
        let address = Address::new(segment, *offset);
        *offset += 1;
        Ok(address)
    }

    /// Number of addresses handed out from `segment` so far -- its used size.
    pub fn used(&self, segment: Segment) -> u32 {
        *self.next.get(&segment).unwrap_or(&0)
    }
}

/// A variable-table entry, modeled as the sum type spec §9 recommends
/// rather than the original's `{type: None | ..., memory_dir: None | ...}`
/// dictionary: a variable is either still awaiting the type annotation
/// that closes its declaration list, or fully resolved.
#[derive(Clone, Copy, Debug)]
enum VarSlot {
    Pending,
    Resolved { ty: VarType, address: Address },
}

/// Name -> `{type, address}` table for declared variables (spec §4.1).
#[derive(Default)]
pub struct VariableTable {
    entries: HashMap<String, VarSlot>,
    /// Preserves first-seen order for `--print-ir` / diagnostics, though
    /// spec §3 notes insertion order is not semantically significant.
    order: Vec<String>,
}

/// Returned by [`VariableTable::declare`] when the name was already present.
#[derive(Clone, Copy, Debug)]
pub struct DuplicateDeclaration;

impl VariableTable {
    pub fn new() -> VariableTable {
        VariableTable::default()
    }

    /// Inserts `name` as `Pending`. Returns `Err(DuplicateDeclaration)` if
    /// the name already exists; the existing entry is left untouched
    /// (spec §4.1: "a duplicate name is a non-fatal semantic error...
    /// the original entry is preserved unchanged").
    pub fn declare(&mut self, name: &str) -> Result<(), DuplicateDeclaration> {
        if self.entries.contains_key(name) {
            return Err(DuplicateDeclaration);
        }
        self.entries.insert(name.to_owned(), VarSlot::Pending);
        self.order.push(name.to_owned());
        Ok(())
    }

    /// Assigns `ty` and the next address in `ty`'s segment to every
    /// entry still `Pending`, in declaration order (spec §4.1: "every
    /// table entry still carrying `type = None` is assigned the
    /// annotated type and the next address...").
    pub fn resolve_pending(
        &mut self,
        ty: VarType,
        counters: &mut SegmentCounters,
    ) -> Result<(), SegmentExhausted> {
        for name in &self.order {
            if let Some(slot @ VarSlot::Pending) = self.entries.get_mut(name) {
                let address = counters.alloc(ty.segment())?;
                *slot = VarSlot::Resolved { ty, address };
            }
        }
        Ok(())
    }

    /// Looks up a declared, resolved variable's type and address.
    pub fn lookup(&self, name: &str) -> Option<(VarType, Address)> {
        match self.entries.get(name) {
            Some(VarSlot::Resolved { ty, address }) => Some((*ty, *address)),
            _ => None,
        }
    }

    /// True if every entry has been resolved (no `Pending` left). Spec
    /// §3: "After parsing completes, no entry has `type == None`."
    pub fn all_resolved(&self) -> bool {
        self.entries
            .values()
            .all(|slot| matches!(slot, VarSlot::Resolved { .. }))
    }

    /// Iterates resolved `(name, type, address)` triples, in declaration
    /// order. Used by `--print-ir` and by the VM's address-compaction pass.
    pub fn iter_resolved(&self) -> impl Iterator<Item = (&str, VarType, Address)> {
        self.order.iter().filter_map(move |name| match self.entries.get(name) {
            Some(VarSlot::Resolved { ty, address }) => Some((name.as_str(), *ty, *address)),
            _ => None,
        })
    }
}

/// Literal value -> `{type, address}` table, with interning (spec §4.1,
/// invariants C1/C2).
#[derive(Default)]
pub struct ConstantTable {
    ints: HashMap<i64, Address>,
    floats: HashMap<u64, Address>,
    strings: HashMap<String, Address>,
    order: Vec<Address>,
}

impl ConstantTable {
    pub fn new() -> ConstantTable {
        ConstantTable::default()
    }

    pub fn intern_int(
        &mut self,
        value: i64,
        counters: &mut SegmentCounters,
    ) -> Result<Address, SegmentExhausted> {
        if let Some(address) = self.ints.get(&value) {
            return Ok(*address);
        }
        let address = counters.alloc(ConstType::Int.segment())?;
        self.ints.insert(value, address);
        self.order.push(address);
        Ok(address)
    }

    pub fn intern_float(
        &mut self,
        value: f64,
        counters: &mut SegmentCounters,
    ) -> Result<Address, SegmentExhausted> {
        let key = value.to_bits();
        if let Some(address) = self.floats.get(&key) {
            return Ok(*address);
        }
        let address = counters.alloc(ConstType::Float.segment())?;
        self.floats.insert(key, address);
        self.order.push(address);
        Ok(address)
    }

    pub fn intern_string(
        &mut self,
        value: &str,
        counters: &mut SegmentCounters,
    ) -> Result<Address, SegmentExhausted> {
        if let Some(address) = self.strings.get(value) {
            return Ok(*address);
        }
        let address = counters.alloc(ConstType::String.segment())?;
        self.strings.insert(value.to_owned(), address);
        self.order.push(address);
        Ok(address)
    }

    /// Iterates every interned constant and its resolved value, in the
    /// order each literal was first interned. Used to initialize VM
    /// memory (spec §4.9: "For each constant-table entry, store its
    /// literal value at its translated address.").
    pub fn iter(&self) -> impl Iterator<Item = (Address, ConstValue)> + '_ {
        let ints = self.ints.iter().map(|(v, a)| (*a, ConstValue::Int(*v)));
        let floats = self
            .floats
            .iter()
            .map(|(bits, a)| (*a, ConstValue::Float(f64::from_bits(*bits))));
        let strings = self
            .strings
            .iter()
            .map(|(v, a)| (*a, ConstValue::Str(v.clone())));
        ints.chain(floats).chain(strings)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn duplicate_declaration_keeps_original() {
        let mut table = VariableTable::new();
        let mut counters = SegmentCounters::new();
        table.declare("a").unwrap();
        assert!(table.declare("a").is_err());
        table.resolve_pending(VarType::Int, &mut counters).unwrap();
        let (ty, addr) = table.lookup("a").unwrap();
        assert_eq!(ty, VarType::Int);
        assert_eq!(addr, Address::new(Segment::Int, 0));
    }

    #[test]
    fn resolve_pending_only_closes_current_batch() {
        let mut table = VariableTable::new();
        let mut counters = SegmentCounters::new();
        table.declare("a").unwrap();
        table.resolve_pending(VarType::Int, &mut counters).unwrap();
        table.declare("b").unwrap();
        table.resolve_pending(VarType::Float, &mut counters).unwrap();

        assert_eq!(table.lookup("a").unwrap().0, VarType::Int);
        assert_eq!(table.lookup("b").unwrap().0, VarType::Float);
    }

    #[test]
    fn constant_interning_dedupes() {
        let mut table = ConstantTable::new();
        let mut counters = SegmentCounters::new();
        let a1 = table.intern_int(42, &mut counters).unwrap();
        let a2 = table.intern_int(42, &mut counters).unwrap();
        let a3 = table.intern_int(7, &mut counters).unwrap();
        assert_eq!(a1, a2);
        assert_ne!(a1, a3);
        assert_eq!(table.iter().count(), 2);
    }

    #[test]
    fn segment_exhaustion_is_reported() {
        let mut counters = SegmentCounters::new();
        for _ in 0..SEGMENT_WIDTH {
            counters.alloc(Segment::Int).unwrap();
        }
        assert_eq!(
            counters.alloc(Segment::Int),
            Err(SegmentExhausted(Segment::Int))
        );
    }
}
