//! Registry of top-level stacks
//!
//! Provides [`StackRegistry`], created once per deployment run and injected
//! where top-level stacks are looked up.

use crate::error::StackError;
use crate::stack::StackNode;
use cairn_core::Lifecycle;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::Arc;

/// Top-level stacks by name
#[derive(Debug, Default)]
pub struct StackRegistry {
    stacks: DashMap<String, Arc<StackNode>>,
}

impl StackRegistry {
    /// Create new empty registry
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            stacks: DashMap::new(),
        }
    }

    /// Register a root stack under its name
    ///
    /// # Errors
    /// - [`StackError::NotTopLevel`] if the stack has a parent
    /// - [`StackError::DuplicateStack`] if the name is taken
    pub fn register(&self, stack: Arc<StackNode>) -> Result<(), StackError> {
        if !stack.is_root() {
            return Err(StackError::NotTopLevel(stack.name().to_string()));
        }

        match self.stacks.entry(stack.name().to_string()) {
            Entry::Occupied(entry) => Err(StackError::DuplicateStack(entry.key().clone())),
            Entry::Vacant(entry) => {
                tracing::debug!("Registered top-level stack {}", stack.name());
                entry.insert(stack);
                Ok(())
            }
        }
    }

    /// Get stack by name
    #[inline]
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Arc<StackNode>> {
        self.stacks.get(name).map(|entry| Arc::clone(entry.value()))
    }

    /// Check if a stack is registered
    #[inline]
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.stacks.contains_key(name)
    }

    /// Remove stack
    #[inline]
    pub fn remove(&self, name: &str) -> Option<Arc<StackNode>> {
        self.stacks.remove(name).map(|(_, stack)| stack)
    }

    /// Remove every stack (end of the deployment run)
    #[inline]
    pub fn clear(&self) {
        self.stacks.clear();
    }

    /// Registered names, sorted
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.stacks.iter().map(|entry| entry.key().clone()).collect();
        names.sort();
        names
    }

    /// Get number of registered stacks
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.stacks.len()
    }

    /// Check if registry is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stacks.is_empty()
    }

    /// Activate every registered stack that has not started yet
    ///
    /// Top-level stacks are independent, so they are activated concurrently.
    /// Every activation runs to completion before this returns, including
    /// the siblings of a failed stack.
    ///
    /// # Errors
    /// Returns the first [`StackError::Lifecycle`] failure, in name order
    pub async fn activate_all(&self) -> Result<(), StackError> {
        let mut pending: Vec<Arc<StackNode>> = self
            .stacks
            .iter()
            .filter(|entry| !entry.value().object().is_started())
            .map(|entry| Arc::clone(entry.value()))
            .collect();
        pending.sort_by(|a, b| a.name().cmp(b.name()));

        tracing::info!("Activating {} top-level stacks", pending.len());

        let outcomes =
            futures::future::join_all(pending.iter().map(|stack| stack.activate())).await;

        let failed = outcomes.iter().filter(|outcome| outcome.is_err()).count();
        if failed > 0 {
            tracing::warn!("{} of {} top-level stacks failed to activate", failed, outcomes.len());
        }

        outcomes.into_iter().collect::<Result<(), _>>()?;
        Ok(())
    }
}
