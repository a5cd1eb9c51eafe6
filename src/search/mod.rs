//! Search orchestration.
//!
//! Modules:
//! - `driver`   : the tree walk applying a compiled pattern at every node.
//! - `embedded` : nested-SQL extraction from procedural blocks.
//! - `keyword`  : statement-head keywords for the body splitter.

pub mod driver;
pub mod embedded;
pub mod keyword;

pub use driver::{CancelToken, Hit, Origin, Searcher};
pub use keyword::StatementKeyword;
