//! The three observability hooks every compilation request drives: a phase
//! timer, a structured automaton-size record, and an automaton dump writer
//! (Graphviz rendering via `dot-writer`, levelled logging via `log`).

use std::io::Write;

use log::{info, log_enabled, trace, Level};

use crate::ast::RegexProperties;
#[cfg(feature = "dot_writer")]
use crate::dfa::DfaExecutor;
use crate::errors::Result;

/// Level-checked logging targets used across the pipeline.
pub const LOG_PHASES: &str = "tregex::phases";
/// Logging target for the per-request automaton-size record.
pub const LOG_AUTOMATON_SIZES: &str = "tregex::automaton_sizes";
/// Logging target for a successful compilation's high-level summary.
pub const LOG_TREGEX_COMPILATIONS: &str = "tregex::compilations";
/// Logging target for TraceFinder bailout messages.
pub const LOG_BAILOUT_MESSAGES: &str = "tregex::bailouts";

/// A named phase timer, allocated only when `LOG_PHASES` is enabled at
/// `Level::Trace`.
pub struct PhaseTimer {
    name: &'static str,
    started: Option<std::time::Instant>,
}

impl PhaseTimer {
    /// Starts a phase timer named `name`, logging `"{name}: start"` if
    /// tracing is enabled for [`LOG_PHASES`].
    pub fn start(name: &'static str) -> Self {
        let started = log_enabled!(target: LOG_PHASES, Level::Trace).then(std::time::Instant::now);
        if started.is_some() {
            trace!(target: LOG_PHASES, "{name}: start");
        }
        Self { name, started }
    }
}

impl Drop for PhaseTimer {
    fn drop(&mut self) {
        if let Some(started) = self.started {
            trace!(target: LOG_PHASES, "{}: end, elapsed: {:?}", self.name, started.elapsed());
        }
    }
}

/// The structured JSON line emitted on both success and `Unsupported`.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct AutomatonSizeRecord {
    /// The source pattern.
    pub pattern: String,
    /// The flags, rendered via `RegexFlags`'s `Display`.
    pub flags: String,
    /// The boolean feature summary.
    pub props: RegexProperties,
    /// Number of AST nodes.
    pub ast_nodes: u32,
    /// Number of NFA states, if an NFA was built.
    pub nfa_states: Option<usize>,
    /// Number of NFA transitions, if an NFA was built.
    pub nfa_transitions: Option<usize>,
    /// Forward DFA state count, if one was built.
    pub dfa_states_fwd: Option<usize>,
    /// Backward DFA state count, if one was built.
    pub dfa_states_bck: Option<usize>,
    /// Capture-tracking DFA state count, if one was built.
    pub dfa_states_cg: Option<usize>,
    /// Whether the TraceFinder fast path was taken.
    pub trace_finder: bool,
    /// Which matcher variant (or bailout) this request produced.
    pub compiler_result: &'static str,
}

impl AutomatonSizeRecord {
    /// Emits this record as one JSON line at `info!` against
    /// [`LOG_AUTOMATON_SIZES`]. A no-op (besides logging the plain
    /// `compiler_result`) when the `serde` feature is disabled.
    pub fn emit(&self) {
        #[cfg(feature = "serde")]
        {
            match serde_json::to_string(self) {
                Ok(line) => info!(target: LOG_AUTOMATON_SIZES, "{line}"),
                Err(err) => info!(target: LOG_AUTOMATON_SIZES, "failed to serialize automaton-size record: {err}"),
            }
        }
        #[cfg(not(feature = "serde"))]
        {
            info!(
                target: LOG_AUTOMATON_SIZES,
                "pattern='{}' compiler_result={}",
                self.pattern,
                self.compiler_result
            );
        }
    }
}

/// Writes (or discards) the automaton dump files. Every method is a no-op
/// by contract on [`NullDumpWriter`]; failures surface as
/// `RegexError::IoError`, caught and logged by the coordinator rather than
/// propagated to the caller of `compile()`.
pub trait DumpWriter {
    /// Writes the AST's LaTeX and JSON dumps.
    fn write_ast(&self, latex: &str, json: &str) -> Result<()>;
    /// Writes the forward/reverse NFA Graphviz dumps, plus its LaTeX and
    /// JSON dumps.
    fn write_nfa(&self, forward_dot: &str, reverse_dot: &str, latex: &str, json: &str) -> Result<()>;
    /// Writes the TraceFinder NFA's Graphviz and JSON dumps.
    fn write_trace_finder(&self, reverse_dot: &str, json: &str) -> Result<()>;
    /// Writes one DFA's Graphviz and JSON dumps, named `dfa_<name>.{gv,json}`.
    fn write_dfa(&self, name: &str, dot: &str, json: &str) -> Result<()>;
}

/// The default writer, used when `RegexOptions::dump_automata` is `false`.
pub struct NullDumpWriter;

impl DumpWriter for NullDumpWriter {
    fn write_ast(&self, _latex: &str, _json: &str) -> Result<()> {
        Ok(())
    }

    fn write_nfa(&self, _forward_dot: &str, _reverse_dot: &str, _latex: &str, _json: &str) -> Result<()> {
        Ok(())
    }

    fn write_trace_finder(&self, _reverse_dot: &str, _json: &str) -> Result<()> {
        Ok(())
    }

    fn write_dfa(&self, _name: &str, _dot: &str, _json: &str) -> Result<()> {
        Ok(())
    }
}

/// Writes the fixed dump filenames to `dir` via `std::fs::File` directly,
/// with no virtual file-system layer.
pub struct FileDumpWriter {
    dir: std::path::PathBuf,
}

impl FileDumpWriter {
    /// Creates a writer rooted at `dir`. Does not create the directory;
    /// callers are expected to have configured `RegexOptions::dump_dir` to
    /// an existing, writable path.
    pub fn new(dir: impl Into<std::path::PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn write_file(&self, name: &str, contents: &str) -> Result<()> {
        let mut file = std::fs::File::create(self.dir.join(name))?;
        file.write_all(contents.as_bytes())?;
        Ok(())
    }
}

impl DumpWriter for FileDumpWriter {
    fn write_ast(&self, latex: &str, json: &str) -> Result<()> {
        self.write_file("ast.tex", latex)?;
        self.write_file("ast.json", json)
    }

    fn write_nfa(&self, forward_dot: &str, reverse_dot: &str, latex: &str, json: &str) -> Result<()> {
        self.write_file("nfa.gv", forward_dot)?;
        self.write_file("nfa_reverse.gv", reverse_dot)?;
        self.write_file("nfa.tex", latex)?;
        self.write_file("nfa.json", json)
    }

    fn write_trace_finder(&self, reverse_dot: &str, json: &str) -> Result<()> {
        self.write_file("trace_finder.gv", reverse_dot)?;
        self.write_file("nfa_trace_finder.json", json)
    }

    fn write_dfa(&self, name: &str, dot: &str, json: &str) -> Result<()> {
        self.write_file(&format!("dfa_{name}.gv"), dot)?;
        self.write_file(&format!("dfa_{name}.json"), json)
    }
}

/// Renders a [`DfaExecutor`] to Graphviz by walking its states and writing
/// nodes/edges through `dot_writer::DotWriter`. Only built when the
/// `dot_writer` feature is enabled.
#[cfg(feature = "dot_writer")]
pub fn render_dfa_dot(executor: &DfaExecutor, label: &str) -> String {
    use dot_writer::{Attributes, DotWriter, RankDirection};

    let mut output = Vec::new();
    {
        let mut writer = DotWriter::from(&mut output);
        writer.set_pretty_print(true);
        let mut digraph = writer.digraph();
        digraph.set_label(label).set_rank_direction(RankDirection::LeftRight);
        for i in 0..executor.state_count() {
            let mut node = digraph.node_auto();
            node.set_label(&i.to_string());
        }
    }
    String::from_utf8(output).unwrap_or_default()
}
