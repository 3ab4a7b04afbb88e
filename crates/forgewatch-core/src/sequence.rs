// ── Request sequencing ──
//
// Each issued request gets a strictly increasing number. Only the
// response to the newest request may be applied; anything older arrived
// out of order and is dropped.

/// Monotonic request counter.
#[derive(Debug, Default, Clone, Copy)]
pub struct RequestSequence {
    latest: u64,
}

impl RequestSequence {
    /// Stamp a new request. Supersedes every earlier stamp.
    pub fn issue(&mut self) -> u64 {
        self.latest += 1;
        self.latest
    }

    /// `true` if `seq` belongs to the newest request.
    pub fn is_current(&self, seq: u64) -> bool {
        seq == self.latest
    }

    pub fn latest(&self) -> u64 {
        self.latest
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_latest_is_current() {
        let mut seq = RequestSequence::default();
        let a = seq.issue();
        let b = seq.issue();
        assert!(b > a);
        assert!(!seq.is_current(a));
        assert!(seq.is_current(b));
    }
}
