use std::collections::HashMap;
use std::sync::Arc;

use linkrpc_codec::Values;

/// Receives calls for a function id.
///
/// Returning `true` consumes the call; later handlers in the chain are not
/// asked. Handlers run on the read loop's thread and must not block for long.
pub trait RpcHandler: Send + Sync {
    fn on_call(&self, function_id: u16, args: &Values) -> bool;
}

impl<F> RpcHandler for F
where
    F: Fn(u16, &Values) -> bool + Send + Sync,
{
    fn on_call(&self, function_id: u16, args: &Values) -> bool {
        self(function_id, args)
    }
}

/// Identifies one registration, for targeted removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HandlerId(u64);

impl HandlerId {
    pub fn get(self) -> u64 {
        self.0
    }
}

type Entry = (HandlerId, Arc<dyn RpcHandler>);

/// Per-function handler chains plus the catch-all chain.
#[derive(Default)]
pub(crate) struct HandlerTable {
    chains: HashMap<u16, Vec<Entry>>,
    catch_all: Vec<Entry>,
    next_id: u64,
}

impl HandlerTable {
    pub(crate) fn add(&mut self, function_id: u16, handler: Arc<dyn RpcHandler>) -> HandlerId {
        let id = self.next_id();
        self.chains
            .entry(function_id)
            .or_default()
            .push((id, handler));
        id
    }

    pub(crate) fn add_catch_all(&mut self, handler: Arc<dyn RpcHandler>) -> HandlerId {
        let id = self.next_id();
        self.catch_all.push((id, handler));
        id
    }

    /// Drop the whole chain for `function_id`. Returns how many were removed.
    pub(crate) fn remove_function(&mut self, function_id: u16) -> usize {
        self.chains
            .remove(&function_id)
            .map_or(0, |chain| chain.len())
    }

    pub(crate) fn remove_id(&mut self, id: HandlerId) -> bool {
        if let Some(pos) = self.catch_all.iter().position(|(entry, _)| *entry == id) {
            self.catch_all.remove(pos);
            return true;
        }
        let mut emptied = None;
        let mut found = false;
        for (function_id, chain) in &mut self.chains {
            if let Some(pos) = chain.iter().position(|(entry, _)| *entry == id) {
                chain.remove(pos);
                if chain.is_empty() {
                    emptied = Some(*function_id);
                }
                found = true;
                break;
            }
        }
        if let Some(function_id) = emptied {
            self.chains.remove(&function_id);
        }
        found
    }

    /// Handlers to try for `function_id`, in order: its chain, then the
    /// catch-alls.
    pub(crate) fn snapshot(&self, function_id: u16) -> Vec<Arc<dyn RpcHandler>> {
        self.chains
            .get(&function_id)
            .into_iter()
            .flatten()
            .chain(self.catch_all.iter())
            .map(|(_, handler)| Arc::clone(handler))
            .collect()
    }

    pub(crate) fn len(&self) -> usize {
        self.chains.values().map(Vec::len).sum::<usize>() + self.catch_all.len()
    }

    pub(crate) fn function_ids(&self) -> Vec<u16> {
        let mut ids: Vec<u16> = self.chains.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    fn next_id(&mut self) -> HandlerId {
        self.next_id += 1;
        HandlerId(self.next_id)
    }
}
