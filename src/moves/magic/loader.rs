use super::precompute::generate_magic_tables;
use super::structs::MagicTables;
use once_cell::sync::OnceCell;
use tracing::debug;

/// Fixed seed: the tables (and their construction time) are identical on
/// every run.
const MAGIC_SEED: u64 = 0x4D45_5249_4449_414E;

/// Process-wide attack tables, built on first use and read-only afterwards.
pub fn magic_tables() -> &'static MagicTables {
    static TABLES: OnceCell<MagicTables> = OnceCell::new();
    TABLES.get_or_init(|| {
        let tables = generate_magic_tables(MAGIC_SEED);
        debug!("magic attack tables initialized");
        tables
    })
}
