use confique::Config as _;
use std::sync::OnceLock;

#[derive(confique::Config)]
pub struct Config {
    /// Upper bound on cached compiled patterns.
    #[config(env = "SQLGREP_CACHE_CAPACITY", default = 1000)]
    pub cache_capacity: u64,
    /// Node type treated as a procedural-language block whose body holds
    /// nested SQL (searched through the embedded bridge).
    #[config(env = "SQLGREP_BLOCK_TYPE", default = "DoStmt")]
    pub procedural_block_type: String,
    /// Whether searches descend into procedural-block bodies at all.
    #[config(env = "SQLGREP_EMBEDDED_SQL", default = true)]
    pub embedded_sql: bool,
    /// Prefer the PL/pgSQL parser for extracting nested statements; the
    /// keyword-based splitter is the fallback either way.
    #[config(env = "SQLGREP_PLPGSQL_JSON", default = true)]
    pub plpgsql_json: bool,
    /// Lines shown around each highlighted line in context mode.
    #[config(env = "SQLGREP_CONTEXT_LINES", default = 2)]
    pub context_lines: usize,
    /// Comma-separated additions to the built-in attribute field catalog,
    /// for schema versions this build does not know about.
    #[config(env = "SQLGREP_EXTRA_FIELDS", default = "")]
    pub extra_fields: String,
}

pub fn config() -> &'static Config {
    static CONFIG: OnceLock<Config> = OnceLock::new();
    CONFIG.get_or_init(|| {
        Config::builder()
            .env()
            .load()
            .expect("Failed to load one or more value configuration from the current environment")
    })
}
