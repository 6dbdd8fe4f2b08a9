//! Snip Shell - a reference incremental execution backend.
//!
//! A small Java-flavoured statement language executed one snippet at a
//! time. Top-level declarations persist across snippets within a session,
//! and every executed snippet yields a [`FragmentOutcome`] with its status,
//! value, exception, diagnostics and unresolved dependencies.
//!
//! # Architecture
//!
//! - `lexer`/`parser`: one snippet into one [`ast::Stmt`]
//! - `completion`: finds complete top-level units for the splitter
//! - `registry`: builtin and host classes; type introspection
//! - `session`: static resolution, then execution through `interp`
//! - `output`: where `System.out` goes
//!
//! [`ShellBackend`] plugs all of this into [`snip_bridge::ScriptEngine`].
//!
//! [`FragmentOutcome`]: snip_bridge::FragmentOutcome

pub mod ast;
mod completion;
mod interp;
pub mod lexer;
pub mod output;
pub mod parser;
pub mod registry;
mod session;
mod stack;
pub mod value;

use std::sync::Arc;

use snip_bridge::{Backend, ScriptEngine, ScriptResult, ValueChannel};

pub use output::{buffer_output, silent_output, stdout_output, OutputSink, SharedOutput};
pub use registry::{ClassId, Primitive, TypeRef, TypeRegistry};
pub use session::ShellSession;
pub use value::{Object, Value};

/// Backend factory: a class registry and an output sink shared by every
/// session it opens.
#[derive(Clone, Debug)]
pub struct ShellBackend {
    registry: Arc<TypeRegistry>,
    output: SharedOutput,
}

impl ShellBackend {
    /// Backend with only the builtin classes, printing to stdout.
    pub fn new() -> Self {
        ShellBackend::builder().build()
    }

    pub fn builder() -> ShellBackendBuilder {
        ShellBackendBuilder::default()
    }

    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    pub fn output(&self) -> &SharedOutput {
        &self.output
    }

    /// Scripting engine over this backend.
    pub fn engine(self) -> ScriptEngine<ShellBackend> {
        ScriptEngine::new(self)
    }
}

impl Default for ShellBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl Backend for ShellBackend {
    type Value = Value;
    type Types = TypeRegistry;
    type Session = ShellSession;

    fn open_session(&self, channel: ValueChannel<Value>) -> ScriptResult<ShellSession> {
        tracing::trace!("opening shell session");
        Ok(ShellSession::new(
            Arc::clone(&self.registry),
            Arc::clone(&self.output),
            channel,
        ))
    }

    fn types(&self) -> &TypeRegistry {
        &self.registry
    }
}

/// Builder for [`ShellBackend`].
///
/// Host classes are registered on a [`TypeRegistry`] before it is handed
/// over; the registry is immutable once the backend exists.
#[derive(Default)]
pub struct ShellBackendBuilder {
    registry: Option<TypeRegistry>,
    print_handler: Option<SharedOutput>,
}

impl ShellBackendBuilder {
    #[must_use]
    pub fn registry(mut self, registry: TypeRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Destination for `System.out`; stdout by default.
    #[must_use]
    pub fn print_handler(mut self, output: SharedOutput) -> Self {
        self.print_handler = Some(output);
        self
    }

    pub fn build(self) -> ShellBackend {
        ShellBackend {
            registry: Arc::new(self.registry.unwrap_or_default()),
            output: self.print_handler.unwrap_or_else(stdout_output),
        }
    }
}
