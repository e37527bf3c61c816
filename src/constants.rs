//! Layout constants for the segmented virtual address space.
//!
//! The space is `[0, ADDRESS_LIMIT)` split into six contiguous, equally
//! sized segments. See [`crate::address::Segment`] for the segment order.

/// Width, in addresses, of a single segment.
pub const SEGMENT_WIDTH: u32 = 1000;

/// Number of segments that make up the address space.
pub const SEGMENT_COUNT: u32 = 6;

/// One past the highest valid logical address.
pub const ADDRESS_LIMIT: u32 = SEGMENT_WIDTH * SEGMENT_COUNT;
