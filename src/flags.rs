//! Run configuration flags.
//!
//! A plain bitmask: warning categories, intrinsic switches, the rendering
//! mode, and the error state bit the caller inspects after a parse.

use std::fmt;
use std::ops::{BitAnd, BitOr, BitOrAssign};
use std::str::FromStr;

use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub struct Flags(u32);

impl Flags {
    pub const NONE: Flags = Flags(0);

    pub const WARN_PARAM_SHADOW_VAR: Flags = Flags(0b0000_0000_0001);
    pub const WARN_PARAM_SHADOW_PARAM: Flags = Flags(0b0000_0000_0010);
    pub const WARN_FUNC_REDEFINED: Flags = Flags(0b0000_0000_0100);
    pub const WARN_VAR_REDEFINED: Flags = Flags(0b0000_0000_1000);
    pub const WARN_DEEP_RECURSION: Flags = Flags(0b0000_0001_0000);
    pub const WARN_EXTRA_ARGS: Flags = Flags(0b0000_0010_0000);
    pub const WARN_ALL: Flags = Flags(0b0000_0011_1111);
    pub const WARN_USEFUL: Flags = Flags(0b0000_0000_0111);

    pub const DISABLE_RUN: Flags = Flags(0b0001_0000_0000);
    pub const DISABLE_FILE: Flags = Flags(0b0010_0000_0000);
    pub const INLINE_REPORTS: Flags = Flags(0b0100_0000_0000);
    pub const INTERNAL_ERROR: Flags = Flags(0b1000_0000_0000);

    pub const fn bits(self) -> u32 {
        self.0
    }

    /// True when every bit of `other` is set.
    pub const fn contains(self, other: Flags) -> bool {
        self.0 & other.0 == other.0
    }

    /// True when any bit of `other` is set.
    pub const fn intersects(self, other: Flags) -> bool {
        self.0 & other.0 != 0
    }

    pub fn insert(&mut self, other: Flags) {
        self.0 |= other.0;
    }

    pub fn remove(&mut self, other: Flags) {
        self.0 &= !other.0;
    }
}

impl BitOr for Flags {
    type Output = Flags;

    fn bitor(self, rhs: Flags) -> Flags {
        Flags(self.0 | rhs.0)
    }
}

impl BitOrAssign for Flags {
    fn bitor_assign(&mut self, rhs: Flags) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for Flags {
    type Output = Flags;

    fn bitand(self, rhs: Flags) -> Flags {
        Flags(self.0 & rhs.0)
    }
}

// ============================================================================
// WARNING CATEGORIES
// ============================================================================

/// A single warning category, as named on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum WarningKind {
    ParamShadowsVar,
    ParamShadowsParam,
    FuncRedefined,
    VarRedefined,
    DeepRecursion,
    ExtraArgs,
}

impl WarningKind {
    pub const ALL: [WarningKind; 6] = [
        WarningKind::ParamShadowsVar,
        WarningKind::ParamShadowsParam,
        WarningKind::FuncRedefined,
        WarningKind::VarRedefined,
        WarningKind::DeepRecursion,
        WarningKind::ExtraArgs,
    ];

    pub const fn flag(self) -> Flags {
        match self {
            WarningKind::ParamShadowsVar => Flags::WARN_PARAM_SHADOW_VAR,
            WarningKind::ParamShadowsParam => Flags::WARN_PARAM_SHADOW_PARAM,
            WarningKind::FuncRedefined => Flags::WARN_FUNC_REDEFINED,
            WarningKind::VarRedefined => Flags::WARN_VAR_REDEFINED,
            WarningKind::DeepRecursion => Flags::WARN_DEEP_RECURSION,
            WarningKind::ExtraArgs => Flags::WARN_EXTRA_ARGS,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            WarningKind::ParamShadowsVar => "param-shadows-var",
            WarningKind::ParamShadowsParam => "param-shadows-param",
            WarningKind::FuncRedefined => "func-redefined",
            WarningKind::VarRedefined => "var-redefined",
            WarningKind::DeepRecursion => "deep-recursion",
            WarningKind::ExtraArgs => "extra-args",
        }
    }
}

impl fmt::Display for WarningKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown warning category '{0}'")]
pub struct UnknownWarning(pub String);

/// A warning selector: one category or one of the aggregate groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WarningSet(pub Flags);

impl FromStr for WarningSet {
    type Err = UnknownWarning;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => return Ok(WarningSet(Flags::WARN_ALL)),
            "useful" => return Ok(WarningSet(Flags::WARN_USEFUL)),
            "none" => return Ok(WarningSet(Flags::NONE)),
            _ => {}
        }

        WarningKind::ALL
            .iter()
            .find(|kind| kind.as_str() == s)
            .map(|kind| WarningSet(kind.flag()))
            .ok_or_else(|| UnknownWarning(s.to_string()))
    }
}
