use std::collections::HashSet;
use std::fmt;
use std::sync::LazyLock;

use parking_lot::Mutex;
use rand::RngExt;

/// Opaque 64-bit identifier naming a registry entry or a context.
///
/// `Uuid::INVALID` is reserved and never handed out by a generator.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct Uuid(u64);

impl Uuid {
    /// Sentinel meaning "no identifier".
    pub const INVALID: Uuid = Uuid(u64::MAX);

    /// Wraps a raw value without registering it anywhere.
    ///
    /// Useful for lookups with identifiers received from elsewhere (files, tools).
    #[inline]
    pub const fn from_raw(value: u64) -> Self {
        Self(value)
    }

    #[inline]
    pub const fn value(self) -> u64 {
        self.0
    }

    #[inline]
    pub const fn is_valid(self) -> bool {
        self.0 != Self::INVALID.0
    }
}

impl Default for Uuid {
    fn default() -> Self {
        Self::INVALID
    }
}

impl fmt::Display for Uuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

/// Generates identifiers that are unique among everything this generator has issued.
///
/// The seen-set is pre-seeded with [`Uuid::INVALID`], so the sentinel can never be
/// produced and `exists(Uuid::INVALID)` is always true.
#[derive(Debug)]
pub struct UuidGenerator {
    seen: HashSet<u64>,
}

impl UuidGenerator {
    pub fn new() -> Self {
        let mut seen = HashSet::new();
        seen.insert(Uuid::INVALID.0);
        Self { seen }
    }

    /// Draws uniformly from the full `u64` range until an unseen value comes up.
    pub fn generate(&mut self) -> Uuid {
        let mut rng = rand::rng();
        self.generate_from(|| rng.random::<u64>())
    }

    /// Same as [`generate`](Self::generate) with a caller-supplied value source.
    ///
    /// `draw` is called until it yields a value that has not been seen.
    pub fn generate_from<F>(&mut self, mut draw: F) -> Uuid
    where
        F: FnMut() -> u64,
    {
        loop {
            let candidate = draw();
            if self.seen.insert(candidate) {
                return Uuid(candidate);
            }
            log::trace!("uuid collision on {candidate:016x}; redrawing");
        }
    }

    /// Returns true if `id` was issued by this generator (or is the sentinel).
    pub fn exists(&self, id: Uuid) -> bool {
        self.seen.contains(&id.0)
    }

    /// Number of identifiers issued so far, excluding the sentinel.
    pub fn issued(&self) -> usize {
        self.seen.len() - 1
    }
}

impl Default for UuidGenerator {
    fn default() -> Self {
        Self::new()
    }
}

static PROCESS_GENERATOR: LazyLock<Mutex<UuidGenerator>> =
    LazyLock::new(|| Mutex::new(UuidGenerator::new()));

/// Generates a process-unique identifier.
pub fn generate() -> Uuid {
    PROCESS_GENERATOR.lock().generate()
}

/// Returns true if `id` was generated in this process (or is the sentinel).
pub fn exists(id: Uuid) -> bool {
    PROCESS_GENERATOR.lock().exists(id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentinel_is_preseeded() {
        let g = UuidGenerator::new();
        assert!(g.exists(Uuid::INVALID));
        assert_eq!(g.issued(), 0);
    }

    #[test]
    fn never_returns_sentinel_across_many_draws() {
        let mut g = UuidGenerator::new();
        let mut ids = HashSet::new();
        for _ in 0..10_000 {
            let id = g.generate();
            assert!(id.is_valid());
            assert!(ids.insert(id), "duplicate id {id}");
        }
        assert_eq!(g.issued(), 10_000);
    }

    #[test]
    fn collisions_and_sentinel_are_redrawn() {
        let mut g = UuidGenerator::new();
        let mut values = [5, u64::MAX, 5, 7].into_iter();
        let mut draw = move || values.next().unwrap_or(42);

        assert_eq!(g.generate_from(&mut draw), Uuid::from_raw(5));
        assert_eq!(g.generate_from(&mut draw), Uuid::from_raw(7));
        assert!(g.exists(Uuid::from_raw(5)));
        assert!(g.exists(Uuid::from_raw(7)));
        assert!(!g.exists(Uuid::from_raw(42)));
    }

    #[test]
    fn process_generator_tracks_issued_ids() {
        let a = generate();
        let b = generate();
        assert_ne!(a, b);
        assert!(exists(a));
        assert!(exists(b));
        assert!(exists(Uuid::INVALID));
    }

    #[test]
    fn display_is_fixed_width_hex() {
        assert_eq!(Uuid::from_raw(0xab).to_string(), "00000000000000ab");
        assert_eq!(Uuid::default(), Uuid::INVALID);
    }
}
