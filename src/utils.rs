use core::{num::NonZeroUsize, ops::Range};

pub(crate) trait RangeSegments {
    /// Split into at most `max_parts` contiguous, disjoint segments, each at
    /// least `min_width` wide except possibly the last one.
    fn segments(&self, max_parts: NonZeroUsize, min_width: NonZeroUsize) -> Segments;
}

impl RangeSegments for Range<usize> {
    #[inline]
    fn segments(&self, max_parts: NonZeroUsize, min_width: NonZeroUsize) -> Segments {
        let width = self.len().div_ceil(max_parts.get()).max(min_width.get());
        Segments {
            next: self.start,
            end: self.end.max(self.start),
            width,
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct Segments {
    next: usize,
    end: usize,
    width: usize,
}

impl Iterator for Segments {
    type Item = Range<usize>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.end {
            return None;
        }
        let start = self.next;
        let end = start.saturating_add(self.width).min(self.end);
        self.next = end;
        Some(start..end)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let len = (self.end - self.next).div_ceil(self.width);
        (len, Some(len))
    }
}

impl ExactSizeIterator for Segments {}
