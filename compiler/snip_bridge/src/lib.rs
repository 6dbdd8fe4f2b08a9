//! Snip Bridge - host scripting contract over incremental backends.
//!
//! Adapts a backend that executes source fragments one at a time (keeping
//! declarations alive between fragments) to a compile-once,
//! evaluate-many scripting contract with host-supplied variables.
//!
//! # Architecture
//!
//! - `splitter`: cuts source into complete top-level units at compile time
//! - `types`: names a host value's type so it can be declared in a session
//! - `channel`: per-evaluation relay for values the fragment text cannot embed
//! - `bindings`: the two host scopes, merged for reads and routed for writes
//! - `driver`: runs one evaluation in a fresh session
//! - `outcome`: folds backend fragment reports into [`ScriptError`]
//!
//! Backends plug in through [`Backend`] and [`Session`].

mod backend;
mod bindings;
mod channel;
mod driver;
mod error;
pub mod fragments;
mod outcome;
mod script;
pub mod splitter;
mod types;

#[cfg(test)]
mod test_helpers;

pub use backend::{
    Backend, Completeness, Completion, Diag, FragmentOutcome, Session, SnippetKind,
    SnippetStatus, ThrownException, CHANNEL_HANDLE,
};
pub use bindings::{choose_write_scope, merge_for_read, Bindings, Scope, ScriptContext};
pub use channel::ValueChannel;
pub use error::{ScriptError, ScriptResult};
pub use outcome::{translate, Outcome};
pub use script::{CompiledScript, ScriptEngine};
pub use types::{describe, is_accessible, TypeIntrospect, Visibility};

use std::sync::Once;

static TRACING_INIT: Once = Once::new();

/// Initialize tracing for debug output.
///
/// Safe to call multiple times. Only installs a subscriber when `RUST_LOG`
/// is set, e.g. `RUST_LOG=snip_bridge=debug` or `RUST_LOG=snip_shell=trace`.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        if std::env::var("RUST_LOG").is_ok() {
            let filter = EnvFilter::from_default_env();
            // Another subscriber may already be installed by the host.
            let _ = tracing_subscriber::registry()
                .with(fmt::layer().with_target(true).with_level(true))
                .with(filter)
                .try_init();
        }
    });
}
