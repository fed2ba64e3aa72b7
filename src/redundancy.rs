//! Replica geometry and hard majority voting.
//!
//! `d` copies of a replica of `m` bits are laid out back to back: copy `j` of
//! bit `i` sits at position `j * m + i`. Decoding counts ones per position
//! and keeps `1` when `ones >= zeros`, so an even split resolves to `1`.
//! Trailing bits that do not make a whole replica are dropped.

/// Bits per replica when `slots` carriers are shared by `duplicate_count` copies.
pub fn replica_len(slots: usize, duplicate_count: usize) -> usize {
    if duplicate_count == 0 {
        return 0;
    }
    slots / duplicate_count
}

/// Signal quality of a vote.
#[derive(Debug, Clone, PartialEq)]
pub struct VoteQuality {
    /// Whole replicas that took part.
    pub replicas: usize,
    /// Share of individual votes that agreed with the elected bit, 0.0..=1.0.
    pub agreement: f64,
}

pub fn collapse(raw: &[u8], replica_len: usize) -> Vec<u8> {
    collapse_with_quality(raw, replica_len).0
}

/// Majority vote plus agreement statistics.
pub fn collapse_with_quality(raw: &[u8], replica_len: usize) -> (Vec<u8>, VoteQuality) {
    if replica_len == 0 || raw.len() < replica_len {
        return (
            Vec::new(),
            VoteQuality {
                replicas: 0,
                agreement: 0.0,
            },
        );
    }

    let replicas = raw.len() / replica_len;
    let mut voted = Vec::with_capacity(replica_len);
    let mut agreeing = 0usize;

    for i in 0..replica_len {
        let ones = (0..replicas)
            .filter(|copy| raw[copy * replica_len + i] & 0x01 == 1)
            .count();
        let zeros = replicas - ones;

        if ones >= zeros {
            voted.push(1);
            agreeing += ones;
        } else {
            voted.push(0);
            agreeing += zeros;
        }
    }

    let agreement = agreeing as f64 / (replicas * replica_len) as f64;

    (
        voted,
        VoteQuality {
            replicas,
            agreement,
        },
    )
}
