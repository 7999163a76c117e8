use core::fmt;
use core::num::NonZeroU32;

/// Compact, stable identifier used across the diagram.
///
/// - `u32` keeps memory small
/// - `NonZero` enables `Option<Id>` to be pointer-optimized
///
/// Program files store the raw 0-based index, so ids survive a save/load cycle
/// unchanged.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Id(NonZeroU32);

impl Id {
    /// Largest representable 0-based index.
    pub const MAX_INDEX: u32 = u32::MAX - 1;

    /// Create an Id from a 0-based index by storing index+1.
    pub fn from_index(index: u32) -> Self {
        Self(NonZeroU32::MIN.saturating_add(index))
    }

    /// Recover the 0-based index.
    pub fn index(self) -> u32 {
        self.0.get() - 1
    }

    /// The id that follows this one in allocation order.
    pub fn next(self) -> Option<Self> {
        self.0.checked_add(1).map(Self)
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

impl std::str::FromStr for Id {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse::<u32>().map(Self::from_index)
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for Id {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u32(self.index())
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for Id {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let index = u32::deserialize(deserializer)?;
        if index > Self::MAX_INDEX {
            return Err(serde::de::Error::custom("block id out of range"));
        }
        Ok(Self::from_index(index))
    }
}

/// Domain-specific ID alias for clarity (no runtime cost).
pub type BlockId = Id;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_round_trip_index() {
        for i in [0_u32, 1, 2, 42, 10_000] {
            let id = Id::from_index(i);
            assert_eq!(id.index(), i);
        }
    }

    #[test]
    fn option_id_is_small() {
        assert_eq!(
            core::mem::size_of::<Id>(),
            core::mem::size_of::<Option<Id>>()
        );
    }

    #[test]
    fn next_is_monotonic() {
        let a = Id::from_index(7);
        assert_eq!(a.next().unwrap().index(), 8);
        assert!(Some(a) < a.next());
    }

    #[test]
    fn last_id_has_no_successor() {
        let last = Id::from_index(Id::MAX_INDEX);
        assert_eq!(last.index(), Id::MAX_INDEX);
        assert_eq!(last.next(), None);
        assert_eq!(Id::from_index(Id::MAX_INDEX - 1).next(), Some(last));
    }

    #[test]
    fn parse_from_string_key() {
        let id: Id = "12".parse().unwrap();
        assert_eq!(id, Id::from_index(12));
        assert!("twelve".parse::<Id>().is_err());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn serializes_as_raw_index() {
        let id = Id::from_index(3);
        assert_eq!(serde_json::to_string(&id).unwrap(), "3");
        let back: Id = serde_json::from_str("3").unwrap();
        assert_eq!(back, id);
        assert!(serde_json::from_str::<Id>(&u32::MAX.to_string()).is_err());
    }
}
