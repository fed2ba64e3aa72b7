//! One-bit slots and the replicated write/read loops over them.
//!
//! A codec exposes its carrier as `slot_count()` addressable bits. The
//! channel visits slots through a location sequence of `replica_len * d`
//! entries; location `p` carries bit `p % replica_len` of replica
//! `p / replica_len`.

pub trait SlotReader {
    fn slot_count(&self) -> usize;

    fn read_slot(&self, slot: usize) -> u8;
}

pub trait SlotWriter: SlotReader {
    fn write_slot(&mut self, slot: usize, bit: u8);
}

/// Write `bits` at the head of every replica. Locations past `bits.len()`
/// inside a replica are left as they are.
pub fn spread<W, I>(slots: &mut W, locations: I, bits: &[u8], replica_len: usize) -> usize
where
    W: SlotWriter + ?Sized,
    I: IntoIterator<Item = usize>,
{
    if replica_len == 0 {
        return 0;
    }

    let mut written = 0;
    for (position, slot) in locations.into_iter().enumerate() {
        if let Some(&bit) = bits.get(position % replica_len) {
            slots.write_slot(slot, bit);
            written += 1;
        }
    }
    written
}

/// Read one bit per location, in location order.
pub fn gather<R, I>(slots: &R, locations: I) -> Vec<u8>
where
    R: SlotReader + ?Sized,
    I: IntoIterator<Item = usize>,
{
    locations
        .into_iter()
        .map(|slot| slots.read_slot(slot))
        .collect()
}
