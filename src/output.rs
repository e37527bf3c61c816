//! The artifact handed from the compiler to the VM.

use crate::address::Segment;
use crate::quad::Quadruples;
use crate::tables::{ConstantTable, SegmentCounters, VariableTable};

/// How many cells of each segment are actually in use, taken directly
/// from the allocation counters recorded while compiling (see
/// [`crate::memory::Memory::build`] for why this replaces scanning the
/// tables/quadruples for the highest referenced address).
pub struct SegmentUsage([u32; 6]);

impl SegmentUsage {
    pub fn from_counters(counters: &SegmentCounters) -> SegmentUsage {
        let mut used = [0u32; 6];
        for (i, segment) in Segment::ALL.iter().enumerate() {
            used[i] = counters.used(*segment);
        }
        SegmentUsage(used)
    }

    pub fn used(&self, segment: Segment) -> u32 {
        let i = Segment::ALL.iter().position(|s| *s == segment).unwrap();
        self.0[i]
    }
}

/// The triple spec §2 calls out as handed from parsing to the VM: the
/// quadruple list plus the variable and constant tables it references.
pub struct CompileOutput {
    pub quadruples: Quadruples,
    pub variables: VariableTable,
    pub constants: ConstantTable,
    pub segment_usage: SegmentUsage,
}
