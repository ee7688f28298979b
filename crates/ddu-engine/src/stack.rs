//! Per-name session stacks.

use std::collections::HashMap;
use std::sync::Arc;

use ddu_core::options::overlay;
use ddu_core::{Host, UserOptions};
use ddu_ext::{AliasTable, ExtensionRegistry};
use tracing::debug;

use crate::ddu::Ddu;

/// Result of [`SessionStacks::pop`].
pub enum Popped {
    /// Nothing was ever started under the name
    Empty,
    /// The only session; it stays in place and should be terminated there
    Last(Ddu),
    /// `removed` left the stack and `top` is the session below it
    Resume { removed: Ddu, top: Ddu },
}

/// Stacks of sessions keyed by instance name.
///
/// Once a name has been accessed its stack is never empty: popping the last
/// session leaves it in place, and [`SessionStacks::get`] swaps a quitted
/// top for a fresh session.
pub struct SessionStacks {
    host: Arc<dyn Host>,
    registry: Arc<ExtensionRegistry>,
    aliases: Arc<AliasTable>,
    stacks: HashMap<String, Vec<Ddu>>,
}

impl SessionStacks {
    pub fn new(
        host: Arc<dyn Host>,
        registry: Arc<ExtensionRegistry>,
        aliases: Arc<AliasTable>,
    ) -> Self {
        Self {
            host,
            registry,
            aliases,
            stacks: HashMap::new(),
        }
    }

    fn new_session(&self) -> Ddu {
        Ddu::new(self.host.clone(), self.registry.clone(), self.aliases.clone())
    }

    /// Top session of `name`, creating one if the stack is empty or its top
    /// has quit.
    pub fn get(&mut self, name: &str) -> Ddu {
        let stack = self.stacks.entry(name.to_string()).or_default();
        if let Some(top) = stack.last() {
            if !top.is_quitted() {
                return top.clone();
            }
            debug!(name, "Replacing quitted session");
            stack.pop();
        }

        let session = self.new_session();
        self.stacks
            .entry(name.to_string())
            .or_default()
            .push(session.clone());
        session
    }

    /// Push a new session for `name`.
    ///
    /// Returns it with `user_options` extended by the previous top's
    /// recorded user options: earlier values act as defaults, the ones
    /// given here win.
    pub fn push(&mut self, name: &str, user_options: &UserOptions) -> (Ddu, UserOptions) {
        let mut extended = self.get(name).user_options();
        overlay(&mut extended, user_options);

        let session = self.new_session();
        let stack = self.stacks.entry(name.to_string()).or_default();
        stack.push(session.clone());
        debug!(name, depth = stack.len(), "Pushed session");
        (session, extended)
    }

    /// Pop the top session of `name`.
    pub fn pop(&mut self, name: &str) -> Popped {
        let Some(stack) = self.stacks.get_mut(name) else {
            return Popped::Empty;
        };

        match stack.len() {
            0 => Popped::Empty,
            1 => Popped::Last(stack[0].clone()),
            _ => {
                let removed = stack.pop();
                let top = stack.last().cloned();
                debug!(name, depth = stack.len(), "Popped session");
                match (removed, top) {
                    (Some(removed), Some(top)) => Popped::Resume { removed, top },
                    _ => Popped::Empty,
                }
            }
        }
    }

    /// Number of sessions stacked under `name`.
    pub fn depth(&self, name: &str) -> usize {
        self.stacks.get(name).map_or(0, Vec::len)
    }
}
