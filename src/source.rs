//! The input to a compilation request: a pattern string, its flag set, and
//! the syntax flavor it was written in.

use std::fmt;

/// The flag set attached to a pattern, in ECMAScript terms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct RegexFlags {
    /// `i` — case-insensitive matching.
    pub case_insensitive: bool,
    /// `m` — `^`/`$` match at line boundaries, not just the whole input.
    pub multiline: bool,
    /// `s` — `.` also matches line terminators.
    pub dotall: bool,
    /// `u` — Unicode mode.
    pub unicode: bool,
    /// `y` — sticky matching (anchored at `lastIndex`).
    pub sticky: bool,
}

impl RegexFlags {
    /// Parses an ECMAScript flag string (e.g. `"gimsuy"`). Unknown
    /// characters are ignored; `g` (global) is accepted but has no effect at
    /// this layer since it only concerns the find-iteration protocol.
    pub fn parse(flags: &str) -> Self {
        let mut out = Self::default();
        for c in flags.chars() {
            match c {
                'i' => out.case_insensitive = true,
                'm' => out.multiline = true,
                's' => out.dotall = true,
                'u' => out.unicode = true,
                'y' => out.sticky = true,
                _ => {}
            }
        }
        out
    }
}

impl fmt::Display for RegexFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.case_insensitive {
            write!(f, "i")?;
        }
        if self.multiline {
            write!(f, "m")?;
        }
        if self.dotall {
            write!(f, "s")?;
        }
        if self.unicode {
            write!(f, "u")?;
        }
        if self.sticky {
            write!(f, "y")?;
        }
        Ok(())
    }
}

/// The syntax flavor a pattern was written in. Non-ECMAScript flavors are
/// rewritten to ECMAScript by a `FlavorProcessor` before parsing; see
/// [`crate::flavor`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub enum Flavor {
    /// No translation is performed; the pattern is parsed as-is.
    #[default]
    Ecmascript,
    /// A PCRE-flavored pattern, translated to ECMAScript before parsing.
    Pcre,
}

/// The immutable input of a compilation request: identity of a compilation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RegexSource {
    pattern: String,
    flags: RegexFlags,
    flavor: Flavor,
}

impl RegexSource {
    /// Creates a new source with the default (ECMAScript) flavor.
    pub fn new(pattern: impl Into<String>, flags: RegexFlags) -> Self {
        Self {
            pattern: pattern.into(),
            flags,
            flavor: Flavor::Ecmascript,
        }
    }

    /// Creates a new source with an explicit flavor.
    pub fn with_flavor(pattern: impl Into<String>, flags: RegexFlags, flavor: Flavor) -> Self {
        Self {
            pattern: pattern.into(),
            flags,
            flavor,
        }
    }

    /// The pattern string as written by the caller (before any flavor
    /// translation).
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// The flag set.
    pub fn flags(&self) -> RegexFlags {
        self.flags
    }

    /// The syntax flavor.
    pub fn flavor(&self) -> Flavor {
        self.flavor
    }
}

impl fmt::Display for RegexSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}/{}", self.pattern, self.flags)
    }
}
