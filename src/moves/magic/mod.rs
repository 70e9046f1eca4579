pub mod attacks;
pub mod loader;
pub mod precompute;
pub mod search;
pub mod structs;

pub use loader::magic_tables;
pub use structs::{BishopMagicTables, MagicEntry, MagicTables, RookMagicTables};
