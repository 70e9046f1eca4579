pub mod context;
pub mod eval;
pub mod ordering;
pub mod pawns;
pub mod pesto;
pub mod picker;
pub mod search;
pub mod see;
pub mod time;
pub mod tt;
