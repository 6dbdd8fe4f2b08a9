//! Evaluation driver: one evaluation of a compiled unit sequence.
//!
//! Each call opens a fresh session and channel, declares every host
//! variable in the session, runs the units in order, then pulls every
//! declared variable back out and writes it into the host scopes. Host
//! scopes are only touched once all of that has succeeded.
//!
//! The session and channel are owned by an [`OpenSession`] guard, so they
//! are released on every exit path, including early returns through `?`.

use crate::backend::{Backend, Session};
use crate::bindings::{choose_write_scope, merge_for_read, ScriptContext};
use crate::channel::ValueChannel;
use crate::error::{ScriptError, ScriptResult};
use crate::fragments;
use crate::outcome::translate;
use crate::types::describe;

/// RAII guard over a live session and its channel.
///
/// Dropping the guard closes the session and clears the channel.
pub(crate) struct OpenSession<S: Session> {
    session: S,
    channel: ValueChannel<S::Value>,
}

impl<S: Session> OpenSession<S> {
    pub(crate) fn open<B>(backend: &B) -> ScriptResult<Self>
    where
        B: Backend<Session = S, Value = S::Value>,
    {
        let channel = ValueChannel::new();
        let session = backend.open_session(channel.clone())?;
        Ok(OpenSession { session, channel })
    }

    pub(crate) fn session(&self) -> &S {
        &self.session
    }

    /// Execute `fragment`, failing on the first non-successful snippet.
    ///
    /// Returns the value of the last snippet reported for the fragment.
    pub(crate) fn execute(&mut self, fragment: &str) -> ScriptResult<Option<S::Value>> {
        let mut value = None;
        for outcome in self.session.execute(fragment) {
            value = translate(outcome).into_result()?;
        }
        Ok(value)
    }
}

impl<S: Session> Drop for OpenSession<S> {
    fn drop(&mut self) {
        self.session.close();
        self.channel.clear();
    }
}

/// Run `units` against the host variables in `ctx`.
///
/// Returns the value of the last unit; a unit without a value leaves the
/// result absent.
#[tracing::instrument(level = "debug", skip_all, fields(units = units.len()))]
pub(crate) fn evaluate<B: Backend>(
    backend: &B,
    units: &[String],
    ctx: &mut ScriptContext<B::Value>,
) -> ScriptResult<Option<B::Value>> {
    let mut open = OpenSession::open(backend)?;

    project(&mut open, backend, ctx)?;

    let mut result = None;
    for unit in units {
        tracing::trace!(%unit, "executing unit");
        result = open.execute(unit).inspect_err(|err| {
            tracing::debug!(%err, "unit failed, skipping remaining units");
        })?;
    }

    let retrieved = retrieve(&mut open)?;
    drop(open);

    for (name, value) in retrieved {
        let scope = choose_write_scope(&name, &ctx.global, &ctx.engine);
        let bindings = ctx.bindings_mut(scope);
        match value {
            Some(value) => {
                bindings.put(name, value);
            }
            None => {
                bindings.remove(&name);
            }
        }
    }

    Ok(result)
}

/// Declare every host variable in the session.
///
/// Fails without running anything if a name is not an identifier.
fn project<B: Backend>(
    open: &mut OpenSession<B::Session>,
    backend: &B,
    ctx: &ScriptContext<B::Value>,
) -> ScriptResult<()> {
    let merged = merge_for_read(&ctx.global, &ctx.engine);
    tracing::debug!(count = merged.len(), "projecting host variables");

    let names = merged.names();
    if let Some(name) = names.iter().find(|name| !fragments::is_identifier(name)) {
        return Err(ScriptError::InvalidName {
            name: (*name).to_string(),
        });
    }

    for name in names {
        let Some(value) = merged.get(name) else {
            continue;
        };
        open.channel.set(name, value.clone());
        let type_name = describe(backend.types(), value);
        open.execute(&fragments::declaration(type_name, name))?;
    }
    Ok(())
}

/// Pull every declared variable out of the session through the channel.
///
/// A variable the backend did not store comes back as `None`: it has no
/// value, and its host binding is removed rather than left stale.
fn retrieve<S: Session>(
    open: &mut OpenSession<S>,
) -> ScriptResult<Vec<(String, Option<S::Value>)>> {
    let names = open.session().declared_variables();
    tracing::debug!(count = names.len(), "retrieving session variables");

    // Values left over from projection must not stand in for retrieved ones.
    open.channel.clear();

    let mut retrieved = Vec::with_capacity(names.len());
    for name in names {
        open.execute(&fragments::retrieval(&name))?;
        let value = open.channel.take(&name);
        if value.is_none() {
            tracing::warn!(%name, "backend did not store retrieved variable");
        }
        retrieved.push((name, value));
    }
    Ok(retrieved)
}

#[cfg(test)]
mod tests;
