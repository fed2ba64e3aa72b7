//! Single bit-plane access on 8-bit samples.

use crate::carrier::{SlotReader, SlotWriter};
use crate::error::ChannelError;

/// A bit position inside an 8-bit sample, `0` being the least significant.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct BitPlane(u8);

impl BitPlane {
    pub const LSB: BitPlane = BitPlane(0);

    pub fn position(self) -> u8 {
        self.0
    }
}

impl Default for BitPlane {
    fn default() -> Self {
        BitPlane::LSB
    }
}

impl TryFrom<u8> for BitPlane {
    type Error = ChannelError;

    fn try_from(v: u8) -> Result<Self, Self::Error> {
        if v < 8 {
            Ok(BitPlane(v))
        } else {
            Err(ChannelError::InvalidConfig(format!(
                "bit plane {} is outside 0..=7",
                v
            )))
        }
    }
}

impl From<BitPlane> for u8 {
    fn from(plane: BitPlane) -> u8 {
        plane.0
    }
}

pub fn write_bit(sample: u8, plane: BitPlane, bit: u8) -> u8 {
    let p = plane.0;
    (sample & !(1 << p)) | ((bit & 0x01) << p)
}

pub fn read_bit(sample: u8, plane: BitPlane) -> u8 {
    (sample >> plane.0) & 0x01
}

/// One bit-plane of a sample buffer, addressed by flat sample index.
///
/// Borrow the buffer immutably to read, mutably to write.
pub struct PlaneSlots<S> {
    samples: S,
    plane: BitPlane,
}

impl<S> PlaneSlots<S> {
    pub fn new(samples: S, plane: BitPlane) -> Self {
        Self { samples, plane }
    }
}

impl<S: AsRef<[u8]>> SlotReader for PlaneSlots<S> {
    fn slot_count(&self) -> usize {
        self.samples.as_ref().len()
    }

    fn read_slot(&self, slot: usize) -> u8 {
        read_bit(self.samples.as_ref()[slot], self.plane)
    }
}

impl<S: AsRef<[u8]> + AsMut<[u8]>> SlotWriter for PlaneSlots<S> {
    fn write_slot(&mut self, slot: usize, bit: u8) {
        let sample = &mut self.samples.as_mut()[slot];
        *sample = write_bit(*sample, self.plane, bit);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plane(p: u8) -> BitPlane {
        BitPlane::try_from(p).expect("valid plane")
    }

    #[test]
    fn test_write_bit_lsb() {
        assert_eq!(0xFF, write_bit(0xFE, BitPlane::LSB, 1));
        assert_eq!(0xFE, write_bit(0xFF, BitPlane::LSB, 0));
        assert_eq!(0xF7, write_bit(0xF7, BitPlane::LSB, 1));
        assert_eq!(0x00, write_bit(0x01, BitPlane::LSB, 0));
    }

    #[test]
    fn test_write_bit_higher_planes() {
        assert_eq!(0x84, write_bit(0x80, plane(2), 1));
        assert_eq!(0x7F, write_bit(0xFF, plane(7), 0));
        assert_eq!(0xF7, write_bit(0xFF, plane(3), 0));
    }

    #[test]
    fn test_only_target_plane_changes() {
        for s in 0..=255u8 {
            for p in 0..8 {
                for b in 0..=1 {
                    let out = write_bit(s, plane(p), b);
                    assert_eq!(s & !(1 << p), out & !(1 << p));
                    assert_eq!(b, read_bit(out, plane(p)));
                }
            }
        }
    }

    #[test]
    fn test_plane_bounds() {
        assert!(BitPlane::try_from(7).is_ok());
        assert!(BitPlane::try_from(8).is_err());
    }

    #[test]
    fn test_plane_slots() {
        let mut samples = vec![0x10u8, 0x11, 0x12];
        {
            let mut slots = PlaneSlots::new(&mut samples[..], plane(1));
            slots.write_slot(0, 1);
            slots.write_slot(2, 0);
        }
        assert_eq!(vec![0x12, 0x11, 0x10], samples);

        let slots = PlaneSlots::new(&samples[..], BitPlane::LSB);
        assert_eq!(3, slots.slot_count());
        assert_eq!(1, slots.read_slot(1));
    }
}
