//! The VM's flat memory image and the address-compaction pass that
//! builds it from a compiled program's tables.
//!
//! Spec §4.9 describes computing, from the addresses actually in use,
//! how large each segment's *used* portion is, then concatenating those
//! used portions in segment order into one flat array, with a
//! translation function from logical (segmented) address to flat
//! offset. Here the "how many cells does a segment use" question is
//! answered directly by the allocation counters recorded during
//! compilation (see [`crate::tables::SegmentCounters`]) rather than by
//! re-deriving it from a scan over tables and quadruples: the counters
//! already know the exact high-water mark for each segment, since every
//! address handed out came from them.

use crate::address::{Address, Segment};
use crate::error::RuntimeError;
use crate::output::CompileOutput;
use crate::value::Cell;

/// Basic read/write access to a flat, segment-compacted memory image.
///
/// A trait at this seam (rather than exposing `Vec<Cell>` directly)
/// keeps [`crate::interpreter::execute`] independent of how cells are
/// physically stored, mirroring the teacher's `Storage` trait seam
/// between the byte-addressed CPU core and its backing memory.
pub trait Storage {
    fn read(&self, address: Address) -> Result<&Cell, RuntimeError>;
    fn write(&mut self, address: Address, value: Cell) -> Result<(), RuntimeError>;
}

/// The VM's compacted flat memory.
pub struct Memory {
    cells: Vec<Cell>,
    flat_base: [u32; 6],
    used: [u32; 6],
}

fn segment_index(segment: Segment) -> usize {
    Segment::ALL.iter().position(|s| *s == segment).unwrap()
}

impl Memory {
    /// Builds the flat memory image for `output`: computes per-segment
    /// flat bases from the segments' used sizes, allocates a
    /// `Cell::Empty`-filled array of the total used size, then stores
    /// every constant's value at its translated address (spec §4.9
    /// "Initialization"). Variable and temporary cells are left
    /// `Cell::Empty`; reading one before it is written is undefined for
    /// the source program, as spec §4.9 allows.
    pub fn build(output: &CompileOutput) -> Memory {
        let mut used = [0u32; 6];
        for (i, segment) in Segment::ALL.iter().enumerate() {
            used[i] = output.segment_usage.used(*segment);
        }

        let mut flat_base = [0u32; 6];
        let mut acc = 0u32;
        for i in 0..6 {
            flat_base[i] = acc;
            acc += used[i];
        }

        let mut memory = Memory {
            cells: vec![Cell::Empty; acc as usize],
            flat_base,
            used,
        };

        for (address, value) in output.constants.iter() {
            // Constants are always in range: they were allocated through
            // the very counters `used` is built from.
            memory.write(address, Cell::from(value)).expect("constant address in range");
        }

        memory
    }

    fn flat_offset(&self, address: Address) -> Result<usize, RuntimeError> {
        let i = segment_index(address.segment);
        if address.offset >= self.used[i] {
            return Err(RuntimeError::AddressOutOfRange(address));
        }
        Ok((self.flat_base[i] + address.offset) as usize)
    }

    /// The whole flat image, for `--dump-memory`-style diagnostics
    /// (mirroring `Virtual_Machine.print_memory` in
    /// original_source/Virtual_Machine.py).
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }
}

impl Storage for Memory {
    fn read(&self, address: Address) -> Result<&Cell, RuntimeError> {
        let offset = self.flat_offset(address)?;
        Ok(&self.cells[offset])
    }

    fn write(&mut self, address: Address, value: Cell) -> Result<(), RuntimeError> {
        let offset = self.flat_offset(address)?;
        self.cells[offset] = value;
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::output::{CompileOutput, SegmentUsage};
    use crate::tables::{ConstantTable, SegmentCounters, VariableTable};
    use crate::quad::Quadruples;

    #[test]
    fn compaction_places_segments_contiguously() {
        let mut counters = SegmentCounters::new();
        let mut constants = ConstantTable::new();
        constants.intern_int(42, &mut counters).unwrap();
        constants.intern_float(2.5, &mut counters).unwrap();

        let mut variables = VariableTable::new();
        variables.declare("a").unwrap();
        variables.resolve_pending(crate::address::VarType::Int, &mut counters).unwrap();

        let output = CompileOutput {
            quadruples: Quadruples::new(),
            variables,
            constants,
            segment_usage: SegmentUsage::from_counters(&counters),
        };

        let memory = Memory::build(&output);
        // const-int(1) + const-float(1) + const-string(0) + int(1) + float(0) + bool(0)
        assert_eq!(memory.cells.len(), 3);
        assert_eq!(*memory.read(Address::new(Segment::ConstInt, 0)).unwrap(), Cell::Int(42));
        assert_eq!(
            *memory.read(Address::new(Segment::ConstFloat, 0)).unwrap(),
            Cell::Float(2.5)
        );
    }

    #[test]
    fn out_of_range_address_is_an_error() {
        let output = CompileOutput {
            quadruples: Quadruples::new(),
            variables: VariableTable::new(),
            constants: ConstantTable::new(),
            segment_usage: SegmentUsage::from_counters(&SegmentCounters::new()),
        };
        let memory = Memory::build(&output);
        assert!(memory.read(Address::new(Segment::Int, 0)).is_err());
    }
}
