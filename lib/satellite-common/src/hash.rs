//! Hashing.

/// A fast, non-cryptographic [`BuildHasher`][std::hash::BuildHasher] that is optimized for quality.
///
/// Suitable for hash tables keyed by externally-controlled data, such as service and instance names, where some degree
/// of collision resistance matters.
///
/// Currently, [`foldhash`][foldhash] is used as the underlying implementation.
///
/// [foldhash]: http://github.com/orlp/foldhash
pub type FastBuildHasher = foldhash::quality::RandomState;
