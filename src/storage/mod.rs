//! Per-user file storage
//!
//! Maps identities to private roots, resolves client paths inside them, and performs
//! the file operations of the API.

pub mod identity;
pub mod lister;
pub mod operations;
pub mod resolver;
pub mod results;

pub use identity::{Identity, decode_identity, encode_identity};
pub use lister::{DirectoryLister, is_stl_name};
pub use resolver::{PathResolver, is_within, resolve_within};
pub use results::{ActionResult, Entry, ListResult, UserSummary};
