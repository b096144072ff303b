use core::fmt;
use core::num::NonZeroU32;

use crate::error::{CoreError, CoreResult};

/// Compact, stable handle into an append-only arena.
///
/// - `u32` keeps memory small
/// - `NonZero` enables `Option<Id>` to be pointer-optimized
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Id(NonZeroU32);

impl Id {
    /// Create an Id from a 0-based arena index by storing index+1.
    pub fn from_index(index: usize) -> CoreResult<Self> {
        u32::try_from(index)
            .ok()
            .and_then(|i| i.checked_add(1))
            .and_then(NonZeroU32::new)
            .map(Self)
            .ok_or(CoreError::IndexOob {
                what: "arena index exceeds u32 range",
                index,
                len: u32::MAX as usize,
            })
    }

    /// Recover the 0-based index.
    pub fn index(self) -> usize {
        (self.0.get() - 1) as usize
    }
}

impl fmt::Debug for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Id({})", self.index())
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.index())
    }
}

/// Handle of a loaded component descriptor in the component store.
pub type ComponentId = Id;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_round_trip_index() {
        for i in [0_usize, 1, 2, 42, 10_000] {
            let id = Id::from_index(i).unwrap();
            assert_eq!(id.index(), i);
        }
    }

    #[test]
    fn id_rejects_out_of_range_index() {
        let err = Id::from_index(u32::MAX as usize).unwrap_err();
        assert!(matches!(err, CoreError::IndexOob { .. }));
    }

    #[test]
    fn option_id_is_small() {
        assert_eq!(
            core::mem::size_of::<Id>(),
            core::mem::size_of::<Option<Id>>()
        );
    }
}
