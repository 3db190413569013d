//! The Feature Gate: a pure function of `RegexProperties` that rejects
//! patterns outside the supported subset.

use crate::ast::RegexProperties;
use crate::errors::{RegexError, Result};

/// Checks `properties` against the supported feature set, in a fixed order
/// so the reason string is stable: first match wins.
pub struct FeatureGate;

impl FeatureGate {
    /// Returns `Ok(())` if `properties` is within the supported subset, or
    /// `Err(Unsupported(reason))` naming the first unsupported feature
    /// found.
    pub fn check(properties: &RegexProperties) -> Result<()> {
        if properties.has_back_references {
            return Err(RegexError::unsupported("backreferences not supported"));
        }
        if properties.has_large_counted_repetitions {
            return Err(RegexError::unsupported(
                "bounds of range quantifier too high",
            ));
        }
        if properties.has_negative_look_ahead {
            return Err(RegexError::unsupported(
                "negative lookahead assertions not supported",
            ));
        }
        if properties.has_non_literal_look_behind {
            return Err(RegexError::unsupported(
                "body of lookbehind assertion too complex",
            ));
        }
        if properties.has_negative_look_behind {
            return Err(RegexError::unsupported(
                "negative lookbehind assertions not supported",
            ));
        }
        Ok(())
    }

    /// The same check, as a boolean predicate.
    pub fn is_supported(properties: &RegexProperties) -> bool {
        Self::check(properties).is_ok()
    }
}
