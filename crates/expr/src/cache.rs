//! Memoization of compiled expressions.
//!
//! Expressions are cached by their exact source string. Callers that prefer
//! not to keep strings around can ask for a numeric [`ExprId`] instead and
//! resolve it later.

use std::collections::HashMap;
use std::sync::{Arc, LazyLock, Mutex, PoisonError};

use crate::Expression;
use crate::error::Result;

/// Handle to an expression registered in an [`ExpressionCache`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ExprId(pub u32);

/// Source-keyed store of compiled expressions.
#[derive(Debug, Default)]
pub struct ExpressionCache {
    by_source: HashMap<String, Arc<Expression>>,
    ids: HashMap<String, ExprId>,
    by_id: Vec<Arc<Expression>>,
}

impl ExpressionCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the compiled expression for `source`, compiling it on first use.
    ///
    /// Compilation errors are returned and nothing is cached for that source.
    pub fn get_or_compile(&mut self, source: &str) -> Result<Arc<Expression>> {
        if let Some(expr) = self.by_source.get(source) {
            return Ok(Arc::clone(expr));
        }

        let expr = Arc::new(Expression::compile(source)?);
        self.by_source.insert(source.to_string(), Arc::clone(&expr));
        Ok(expr)
    }

    /// Returns the handle for `source`, compiling and numbering it on first use.
    ///
    /// An empty source has no handle.
    pub fn id_for(&mut self, source: &str) -> Result<Option<ExprId>> {
        if source.is_empty() {
            return Ok(None);
        }
        if let Some(id) = self.ids.get(source) {
            return Ok(Some(*id));
        }

        let expr = self.get_or_compile(source)?;
        let id = ExprId(self.by_id.len() as u32);
        self.by_id.push(expr);
        self.ids.insert(source.to_string(), id);
        Ok(Some(id))
    }

    /// Resolves a handle returned by [`ExpressionCache::id_for`].
    pub fn get(&self, id: ExprId) -> Option<Arc<Expression>> {
        self.by_id.get(id.0 as usize).cloned()
    }

    /// Number of distinct sources compiled so far.
    pub fn len(&self) -> usize {
        self.by_source.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_source.is_empty()
    }
}

static GLOBAL: LazyLock<Mutex<ExpressionCache>> =
    LazyLock::new(|| Mutex::new(ExpressionCache::new()));

fn with_global<T>(f: impl FnOnce(&mut ExpressionCache) -> T) -> T {
    let mut cache = GLOBAL.lock().unwrap_or_else(PoisonError::into_inner);
    f(&mut cache)
}

/// Process-wide [`ExpressionCache::get_or_compile`].
pub fn cached(source: &str) -> Result<Arc<Expression>> {
    with_global(|cache| cache.get_or_compile(source))
}

/// Process-wide [`ExpressionCache::id_for`].
pub fn cached_id(source: &str) -> Result<Option<ExprId>> {
    with_global(|cache| cache.id_for(source))
}

/// Process-wide [`ExpressionCache::get`].
pub fn by_id(id: ExprId) -> Option<Arc<Expression>> {
    with_global(|cache| cache.get(id))
}
