//! Fixed-capacity double-ended rolling window
//!
//! Circular storage over a plain array with a logical start and size. Both
//! ends push and pop in O(1); eviction on overflow always happens at the end
//! opposite the insertion:
//!
//! - `push_back` on a full window drops the oldest element (front)
//! - `push_front` on a full window drops the newest element (back)
//!
//! Range access returns a [`SplitView`]: up to two borrowed slices that
//! together cover the logical range, so reading history never copies.

/// Zero-copy view of a logical range; `tail` is non-empty only when the
/// range wraps past the end of physical storage.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SplitView<'a, T> {
    pub head: &'a [T],
    pub tail: &'a [T],
}

impl<'a, T> SplitView<'a, T> {
    pub fn len(&self) -> usize {
        self.head.len() + self.tail.len()
    }

    pub fn is_empty(&self) -> bool {
        self.head.is_empty() && self.tail.is_empty()
    }

    /// Elements in logical order.
    pub fn iter(&self) -> impl Iterator<Item = &'a T> + 'a {
        let (head, tail): (&'a [T], &'a [T]) = (self.head, self.tail);
        head.iter().chain(tail.iter())
    }

    pub fn to_vec(&self) -> Vec<T>
    where
        T: Clone,
    {
        self.iter().cloned().collect()
    }
}

/// Bounded ring buffer with capacity `N`.
#[derive(Debug, Clone)]
pub struct RollingWindow<T, const N: usize> {
    slots: [T; N],
    start: usize,
    len: usize,
}

impl<T: Copy + Default, const N: usize> RollingWindow<T, N> {
    /// # Panics
    /// If `N` is zero.
    pub fn new() -> Self {
        assert!(N > 0, "rolling window capacity must be non-zero");
        Self {
            slots: [T::default(); N],
            start: 0,
            len: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        N
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn is_full(&self) -> bool {
        self.len == N
    }

    /// Append at the back; when full, the front element is overwritten.
    pub fn push_back(&mut self, value: T) {
        if self.len < N {
            let slot = self.physical(self.len);
            self.slots[slot] = value;
            self.len += 1;
        } else {
            self.slots[self.start] = value;
            self.start = (self.start + 1) % N;
        }
    }

    /// Prepend at the front; when full, the back element is overwritten.
    pub fn push_front(&mut self, value: T) {
        // Stepping the start back lands on the old back slot when full.
        self.start = (self.start + N - 1) % N;
        self.slots[self.start] = value;
        if self.len < N {
            self.len += 1;
        }
    }

    /// # Panics
    /// If the window is empty.
    pub fn pop_front(&mut self) -> T {
        assert!(self.len > 0, "pop_front on empty rolling window");
        let value = self.slots[self.start];
        self.start = (self.start + 1) % N;
        self.len -= 1;
        value
    }

    /// # Panics
    /// If the window is empty.
    pub fn pop_back(&mut self) -> T {
        assert!(self.len > 0, "pop_back on empty rolling window");
        self.len -= 1;
        self.slots[self.physical(self.len)]
    }

    pub fn front(&self) -> Option<&T> {
        self.get(0)
    }

    pub fn back(&self) -> Option<&T> {
        self.len.checked_sub(1).and_then(|i| self.get(i))
    }

    /// Element at logical position `index` (0 = front).
    pub fn get(&self, index: usize) -> Option<&T> {
        if index < self.len {
            Some(&self.slots[self.physical(index)])
        } else {
            None
        }
    }

    /// The whole logical content.
    pub fn span(&self) -> SplitView<'_, T> {
        self.subspan(0, self.len)
    }

    /// The `count` most recent elements, or all of them if fewer are held.
    pub fn last(&self, count: usize) -> SplitView<'_, T> {
        let count = count.min(self.len);
        self.subspan(self.len - count, count)
    }

    /// `count` elements starting at logical position `offset`.
    ///
    /// # Panics
    /// If the range reaches past the logical size.
    pub fn subspan(&self, offset: usize, count: usize) -> SplitView<'_, T> {
        assert!(
            offset + count <= self.len,
            "subspan {}..{} out of range for length {}",
            offset,
            offset + count,
            self.len
        );
        if count == 0 {
            return SplitView { head: &[], tail: &[] };
        }
        let begin = self.physical(offset);
        if begin + count <= N {
            SplitView {
                head: &self.slots[begin..begin + count],
                tail: &[],
            }
        } else {
            SplitView {
                head: &self.slots[begin..],
                tail: &self.slots[..count - (N - begin)],
            }
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> + '_ {
        self.span().iter()
    }

    pub fn clear(&mut self) {
        self.start = 0;
        self.len = 0;
    }

    #[inline]
    fn physical(&self, logical: usize) -> usize {
        (self.start + logical) % N
    }
}

impl<T: Copy + Default, const N: usize> Default for RollingWindow<T, N> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_push_back_until_full() {
        let mut w: RollingWindow<u32, 4> = RollingWindow::new();
        for v in 1..=4 {
            w.push_back(v);
        }
        assert!(w.is_full());
        assert_eq!(w.span().to_vec(), vec![1, 2, 3, 4]);
        assert_eq!(w.front(), Some(&1));
        assert_eq!(w.back(), Some(&4));
    }

    #[test]
    fn test_push_back_overflow_drops_oldest() {
        let mut w: RollingWindow<u32, 3> = RollingWindow::new();
        for v in 1..=5 {
            w.push_back(v);
        }
        assert_eq!(w.len(), 3);
        assert_eq!(w.span().to_vec(), vec![3, 4, 5]);
    }

    #[test]
    fn test_push_front_overflow_drops_newest() {
        let mut w: RollingWindow<u32, 3> = RollingWindow::new();
        w.push_back(1);
        w.push_back(2);
        w.push_back(3);
        w.push_front(0);
        assert_eq!(w.span().to_vec(), vec![0, 1, 2]);
        w.push_front(9);
        assert_eq!(w.span().to_vec(), vec![9, 0, 1]);
    }

    #[test]
    fn test_push_front_not_full() {
        let mut w: RollingWindow<u32, 4> = RollingWindow::new();
        w.push_front(2);
        w.push_front(1);
        w.push_back(3);
        assert_eq!(w.span().to_vec(), vec![1, 2, 3]);
        assert_eq!(w.len(), 3);
    }

    #[test]
    fn test_pops_from_both_ends() {
        let mut w: RollingWindow<u32, 4> = RollingWindow::new();
        for v in 1..=6 {
            w.push_back(v);
        }
        assert_eq!(w.pop_front(), 3);
        assert_eq!(w.pop_back(), 6);
        assert_eq!(w.span().to_vec(), vec![4, 5]);
        assert_eq!(w.pop_back(), 5);
        assert_eq!(w.pop_front(), 4);
        assert!(w.is_empty());
        assert_eq!(w.front(), None);
        assert_eq!(w.back(), None);
    }

    #[test]
    #[should_panic(expected = "pop_front on empty")]
    fn test_pop_front_empty_panics() {
        let mut w: RollingWindow<u8, 2> = RollingWindow::new();
        w.pop_front();
    }

    #[test]
    #[should_panic(expected = "pop_back on empty")]
    fn test_pop_back_empty_panics() {
        let mut w: RollingWindow<u8, 2> = RollingWindow::new();
        w.pop_back();
    }

    #[test]
    fn test_split_view_wraps() {
        let mut w: RollingWindow<u32, 4> = RollingWindow::new();
        for v in 1..=6 {
            w.push_back(v);
        }
        // Physical [5, 6, 3, 4], start at 2
        let view = w.span();
        assert_eq!(view.head, &[3, 4]);
        assert_eq!(view.tail, &[5, 6]);
        assert_eq!(view.len(), 4);
    }

    #[test]
    fn test_last_and_subspan() {
        let mut w: RollingWindow<u32, 5> = RollingWindow::new();
        for v in 1..=7 {
            w.push_back(v);
        }
        assert_eq!(w.last(2).to_vec(), vec![6, 7]);
        assert_eq!(w.last(50).to_vec(), vec![3, 4, 5, 6, 7]);
        assert_eq!(w.subspan(1, 3).to_vec(), vec![4, 5, 6]);
        assert!(w.subspan(5, 0).is_empty());
        assert_eq!(w.get(4), Some(&7));
        assert_eq!(w.get(5), None);
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn test_subspan_out_of_range_panics() {
        let mut w: RollingWindow<u32, 3> = RollingWindow::new();
        w.push_back(1);
        let _ = w.subspan(0, 2);
    }

    #[test]
    fn test_clear_keeps_capacity() {
        let mut w: RollingWindow<f64, 8> = RollingWindow::default();
        w.push_back(1.0);
        w.clear();
        assert!(w.is_empty());
        assert_eq!(w.capacity(), 8);
    }

    proptest! {
        #[test]
        fn prop_push_back_keeps_most_recent(
            values in prop::collection::vec(any::<i32>(), 0..64)
        ) {
            let mut w: RollingWindow<i32, 8> = RollingWindow::new();
            for v in &values {
                w.push_back(*v);
            }
            let keep = values.len().min(8);
            prop_assert_eq!(w.len(), keep);
            prop_assert_eq!(w.span().to_vec(), values[values.len() - keep..].to_vec());
        }

        #[test]
        fn prop_pop_then_push_never_exceeds_capacity(
            ops in prop::collection::vec(any::<u16>(), 1..128)
        ) {
            let mut w: RollingWindow<u16, 5> = RollingWindow::new();
            for v in ops {
                if !w.is_empty() && v % 3 == 0 {
                    w.pop_front();
                }
                w.push_back(v);
                prop_assert!(w.len() <= w.capacity());
            }
        }

        #[test]
        fn prop_front_pushes_reverse_order(
            values in prop::collection::vec(any::<u8>(), 1..20)
        ) {
            let mut w: RollingWindow<u8, 32> = RollingWindow::new();
            for v in &values {
                w.push_front(*v);
            }
            let mut expected = values.clone();
            expected.reverse();
            prop_assert_eq!(w.span().to_vec(), expected);
        }
    }
}
