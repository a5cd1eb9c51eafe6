use crate::pattern::compiler;
use crate::pattern::expr::Expr;
use crate::*;
use moka::sync::Cache;
use std::sync::Arc;

/// Bounded map from pattern text to its compiled expression.
///
/// Purely an optimisation: every lookup either returns an expression equal
/// to a fresh `compile` of the same text, or the compile error itself.
/// Reads are safe from any thread; the store evicts on its own once
/// capacity is reached.
#[derive(Clone)]
pub struct ExprCache {
    inner: Cache<String, Arc<Expr>>,
}

impl ExprCache {
    pub fn new(capacity: u64) -> Self {
        Self {
            inner: Cache::builder().max_capacity(capacity).build(),
        }
    }

    /// Fetch the compiled form of `pattern`, compiling and storing it on a
    /// miss. Compile errors are never cached; a corrected pattern string is
    /// a different key anyway.
    pub fn get_or_compile(&self, pattern: &str) -> Result<Arc<Expr>> {
        if let Some(expr) = self.inner.get(pattern) {
            trace!(pattern, "pattern cache hit");
            return Ok(expr);
        }
        trace!(pattern, "pattern cache miss");
        let expr = Arc::new(compiler::compile(pattern)?);
        self.inner.insert(pattern.to_string(), expr.clone());
        Ok(expr)
    }

    /// Drop every entry. Searches running concurrently are unaffected; they
    /// hold their own `Arc` to the expression.
    pub fn clear(&self) {
        self.inner.invalidate_all();
    }
}

impl Default for ExprCache {
    fn default() -> Self {
        Self::new(config().cache_capacity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn caches_compiled_patterns() {
        let cache = ExprCache::new(16);
        let first = cache.get_or_compile("SelectStmt").unwrap();
        let second = cache.get_or_compile("SelectStmt").unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn clearing_recompiles_equal_expressions() {
        let cache = ExprCache::new(16);
        let first = cache.get_or_compile("(relname _)").unwrap();
        cache.clear();
        let second = cache.get_or_compile("(relname _)").unwrap();
        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(*first, *second);
    }

    #[test]
    fn compile_errors_pass_through() {
        let cache = ExprCache::new(16);
        assert!(matches!(
            cache.get_or_compile("("),
            Err(Error::Compile { .. })
        ));
    }
}
