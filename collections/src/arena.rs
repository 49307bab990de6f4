//! Append-only, segment-doubling byte storage: values are written
//! once and their returned pointer/offset stays valid for the life of
//! the arena, even as later writes allocate new segments. Rust can't
//! hand out raw pointers into a growing `Vec<Vec<u8>>` and stay safe, so
//! `write` returns an opaque [`ArenaPtr`] (segment, offset, len) instead
//! of a `&[u8]`; callers dereference it through [`SegmentedArena::get`].

/// Points at a previously written byte range. Only valid for the arena
/// that produced it.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct ArenaPtr {
    segment: u32,
    offset: u32,
    len: u32,
}

/// Segmented arena with a doubling growth strategy, capped at
/// `max_segment_bytes`. Takes separate initial/maximum bytes-per-segment
/// parameters so fixed- and variable-size payloads can share the same
/// implementation instead of two parallel byte-buffer types.
pub struct SegmentedArena {
    segments: Vec<Vec<u8>>,
    segment_bytes: usize,
    max_segment_bytes: usize,
}

impl SegmentedArena {
    pub fn new(initial_segment_bytes: usize, max_segment_bytes: usize) -> Self {
        SegmentedArena {
            segments: Vec::new(),
            segment_bytes: initial_segment_bytes,
            max_segment_bytes,
        }
    }

    /// Writes `bytes` into the arena, allocating a new segment if the
    /// current one does not have enough room. Fatal if a single value is
    /// larger than `max_segment_bytes`.
    pub fn write(&mut self, bytes: &[u8]) -> ArenaPtr {
        if bytes.len() > self.max_segment_bytes {
            panic!(
                "SegmentedArena::write: value of {} bytes exceeds max segment capacity of {} bytes",
                bytes.len(),
                self.max_segment_bytes
            );
        }
        let needs_new_segment = match self.segments.last() {
            Some(seg) => seg.len() + bytes.len() > seg.capacity(),
            None => true,
        };
        if needs_new_segment {
            self.segment_bytes = (self.segment_bytes.max(bytes.len()) * 2).min(self.max_segment_bytes);
            self.segments.push(Vec::with_capacity(self.segment_bytes));
        }
        let segment = (self.segments.len() - 1) as u32;
        let seg = self.segments.last_mut().unwrap();
        let offset = seg.len() as u32;
        seg.extend_from_slice(bytes);
        ArenaPtr {
            segment,
            offset,
            len: bytes.len() as u32,
        }
    }

    pub fn get(&self, ptr: ArenaPtr) -> &[u8] {
        let seg = &self.segments[ptr.segment as usize];
        &seg[ptr.offset as usize..ptr.offset as usize + ptr.len as usize]
    }

    pub fn num_segments(&self) -> usize {
        self.segments.len()
    }

    pub fn size(&self) -> usize {
        self.segments.iter().map(|s| s.len()).sum()
    }

    pub fn clear(&mut self) {
        self.segments.clear();
    }
}

impl Default for SegmentedArena {
    fn default() -> Self {
        // 1KiB initial segment, 1MiB cap.
        Self::new(1024, 1024 * 1024)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_then_read_back() {
        let mut arena = SegmentedArena::new(8, 64);
        let a = arena.write(b"hello");
        let b = arena.write(b"world!!");
        assert_eq!(arena.get(a), b"hello");
        assert_eq!(arena.get(b), b"world!!");
    }

    #[test]
    fn grows_across_segments() {
        let mut arena = SegmentedArena::new(4, 64);
        let mut ptrs = Vec::new();
        for i in 0..20u8 {
            ptrs.push(arena.write(&[i, i, i, i]));
        }
        assert!(arena.num_segments() > 1);
        for (i, ptr) in ptrs.into_iter().enumerate() {
            assert_eq!(arena.get(ptr), &[i as u8; 4]);
        }
    }

    #[test]
    #[should_panic]
    fn value_larger_than_cap_is_fatal() {
        let mut arena = SegmentedArena::new(4, 8);
        arena.write(&[0u8; 9]);
    }
}
