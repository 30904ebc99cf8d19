mod cache;
pub use self::cache::*;

mod resolver;
