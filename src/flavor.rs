//! Flavor translation: rewriting a foreign-syntax pattern into equivalent
//! ECMAScript source before the Parser Frontend Adapter ever sees it. The
//! `Pcre` flavor here demonstrates the seam without attempting a full PCRE
//! grammar — it strips an inline `(?i)` flag group, which this pipeline's
//! own parser does not understand, into the equivalent `RegexFlags`.

use crate::errors::{RegexError, Result};
use crate::source::{Flavor, RegexFlags, RegexSource};

/// Produces a `FlavorProcessor` for the flavor recorded on `source`.
pub struct FlavorDispatch;

impl FlavorDispatch {
    /// Picks the processor for `source`'s recorded flavor.
    pub fn for_regex(source: &RegexSource) -> Box<dyn FlavorProcessor + '_> {
        match source.flavor() {
            Flavor::Ecmascript => Box::new(Passthrough(source)),
            Flavor::Pcre => Box::new(PcreProcessor(source)),
        }
    }
}

/// Rewrites a foreign-flavored pattern into an equivalent ECMAScript
/// `RegexSource`, or raises `Unsupported` if the translation cannot be
/// performed.
pub trait FlavorProcessor {
    /// `FlavorProcessor::toECMAScript() -> RegexSource | Unsupported`.
    fn to_ecmascript(&self) -> Result<RegexSource>;
}

struct Passthrough<'a>(&'a RegexSource);

impl FlavorProcessor for Passthrough<'_> {
    fn to_ecmascript(&self) -> Result<RegexSource> {
        Ok(self.0.clone())
    }
}

struct PcreProcessor<'a>(&'a RegexSource);

impl FlavorProcessor for PcreProcessor<'_> {
    fn to_ecmascript(&self) -> Result<RegexSource> {
        let pattern = self.0.pattern();
        let mut flags = self.0.flags();
        let rewritten = if let Some(rest) = pattern.strip_prefix("(?i)") {
            flags.case_insensitive = true;
            rest
        } else {
            pattern
        };
        if rewritten.contains("(?P<") {
            return Err(RegexError::unsupported(
                "PCRE named-group syntax '(?P<...>...)' is not translated; use '(?<...>...)'",
            ));
        }
        Ok(RegexSource::new(rewritten, flags))
    }
}
