use std::fmt;
use std::num::NonZeroU64;

/// Driver-side object name.
///
/// Handles are only meaningful to the driver that issued them.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct RawHandle(NonZeroU64);

impl RawHandle {
    #[inline]
    pub(crate) fn new(value: NonZeroU64) -> Self {
        Self(value)
    }

    #[inline]
    pub fn get(self) -> u64 {
        self.0.get()
    }
}

impl fmt::Display for RawHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Monotonic handle allocator shared by driver implementations.
#[derive(Debug, Default)]
pub(crate) struct HandleAllocator {
    last: u64,
}

impl HandleAllocator {
    pub(crate) fn next(&mut self) -> RawHandle {
        self.last += 1;
        // `last` starts at 0 and only grows, so it is never zero here.
        RawHandle::new(NonZeroU64::MIN.saturating_add(self.last - 1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocator_starts_at_one_and_increments() {
        let mut a = HandleAllocator::default();
        assert_eq!(a.next().get(), 1);
        assert_eq!(a.next().get(), 2);
        assert_eq!(a.next().to_string(), "#3");
    }
}
