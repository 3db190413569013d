#![forbid(missing_docs)]
//! # `tregex`
//! A regular-expression compilation pipeline: given a pattern source and a
//! flavor, it parses, feature-gates, and compiles down to one of a small set
//! of matcher variants (a dead matcher, a literal scanner, an NFA
//! interpreter, a lazily-compiled DFA search bundle, or a single eager DFA),
//! picking the cheapest variant the pattern's features allow.
//!
//! The crate does not execute matches itself: walking a compiled matcher
//! against input text is the embedding engine's job. What this crate owns is
//! the compilation request — from a `RegexSource` in, to a `CompiledMatcher`
//! out — together with the observability hooks (phase timing, automaton-size
//! records, automaton dumps) a production compiler needs around that core.

/// Module with the parse-tree representation, the Parser Frontend Adapter,
/// and the derived boolean feature summary.
pub mod ast;

/// Module with the per-request scratch arena shared across pipeline stages.
mod buffer;
pub use buffer::CompilationBuffer;

/// Module that owns a compilation request end to end.
pub mod coordinator;
pub use coordinator::{HostRoot, RequestCoordinator};

/// Module with the DFA Builder Adapter (subset construction).
pub mod dfa;

/// Module with error definitions.
mod errors;
pub use errors::{RegexError, RegexErrorKind, Result};

/// Module with the Feature Gate.
mod feature_gate;
pub use feature_gate::FeatureGate;

/// Module with flavor translation (foreign syntax to ECMAScript).
pub mod flavor;

/// Module with ID newtypes used across the AST, NFA, and DFA layers.
mod ids;
pub use ids::{CaptureGroupID, CharClassID, StateID};

/// Module with the compiled matcher variants and the Literal Engine.
pub mod matcher;
pub use matcher::{CompiledMatcher, LazyDfaSearch, LiteralEngine, LiteralMatcher};

/// Module with the NFA Builder Adapter (Thompson construction) and the
/// TraceFinder Builder.
pub mod nfa;

/// Module with the observability hooks: phase timing, automaton-size
/// records, and automaton dump writers.
pub mod observability;

/// Module with static, read-only request configuration.
mod options;
pub use options::RegexOptions;

/// Module with the compilation request's input: pattern, flags, flavor.
mod source;
pub use source::{Flavor, RegexFlags, RegexSource};
