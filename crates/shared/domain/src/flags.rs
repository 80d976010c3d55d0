//! Badge bitset attached to every account.

use std::fmt;
use std::ops::{BitAnd, BitOr, BitOrAssign};

use serde::{Deserialize, Serialize};

/// Earned badges and platform roles, one independent bit each.
///
/// Serialized as the raw integer so stored rows and API payloads stay
/// compatible when new bits are appended.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(transparent)]
pub struct UserFlags(u32);

impl UserFlags {
    pub const FOUNDER: UserFlags = UserFlags(1 << 0);
    pub const PLATFORM_ADMIN: UserFlags = UserFlags(1 << 1);
    pub const PLATFORM_MOD: UserFlags = UserFlags(1 << 2);
    pub const CONTRIBUTOR: UserFlags = UserFlags(1 << 3);
    pub const TRANSLATOR: UserFlags = UserFlags(1 << 4);
    pub const BUG_REPORTER: UserFlags = UserFlags(1 << 5);
    pub const EARLY_SUPPORTER: UserFlags = UserFlags(1 << 6);
    pub const SUPPORTER: UserFlags = UserFlags(1 << 7);
    pub const EARLY_ADOPTER: UserFlags = UserFlags(1 << 8);
    pub const BOT_DEVELOPER: UserFlags = UserFlags(1 << 9);

    const NAMED: &'static [(&'static str, UserFlags)] = &[
        ("FOUNDER", Self::FOUNDER),
        ("PLATFORM_ADMIN", Self::PLATFORM_ADMIN),
        ("PLATFORM_MOD", Self::PLATFORM_MOD),
        ("CONTRIBUTOR", Self::CONTRIBUTOR),
        ("TRANSLATOR", Self::TRANSLATOR),
        ("BUG_REPORTER", Self::BUG_REPORTER),
        ("EARLY_SUPPORTER", Self::EARLY_SUPPORTER),
        ("SUPPORTER", Self::SUPPORTER),
        ("EARLY_ADOPTER", Self::EARLY_ADOPTER),
        ("BOT_DEVELOPER", Self::BOT_DEVELOPER),
    ];

    pub const fn empty() -> Self {
        UserFlags(0)
    }

    /// Every defined bit set.
    pub fn all() -> Self {
        Self::NAMED
            .iter()
            .fold(Self::empty(), |acc, (_, flag)| acc | *flag)
    }

    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Keep only defined bits.
    pub fn from_bits_truncate(bits: u32) -> Self {
        UserFlags(bits & Self::all().0)
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// True if every bit in `other` is set.
    pub const fn contains(self, other: UserFlags) -> bool {
        self.0 & other.0 == other.0
    }

    /// True if any bit in `other` is set.
    pub const fn intersects(self, other: UserFlags) -> bool {
        self.0 & other.0 != 0
    }

    pub fn insert(&mut self, other: UserFlags) {
        self.0 |= other.0;
    }

    pub fn remove(&mut self, other: UserFlags) {
        self.0 &= !other.0;
    }

    pub fn toggle(&mut self, other: UserFlags) {
        self.0 ^= other.0;
    }

    /// Names of the set bits, in bit order.
    pub fn names(self) -> Vec<&'static str> {
        Self::NAMED
            .iter()
            .filter(|(_, flag)| self.contains(*flag))
            .map(|(name, _)| *name)
            .collect()
    }
}

impl BitOr for UserFlags {
    type Output = UserFlags;

    fn bitor(self, rhs: Self) -> Self::Output {
        UserFlags(self.0 | rhs.0)
    }
}

impl BitOrAssign for UserFlags {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for UserFlags {
    type Output = UserFlags;

    fn bitand(self, rhs: Self) -> Self::Output {
        UserFlags(self.0 & rhs.0)
    }
}

impl fmt::Display for UserFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.names().join(" | "))
    }
}
