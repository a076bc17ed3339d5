pub mod attacks;
pub mod precompute;
pub mod search;
pub mod structs;

pub use structs::{BishopMagicTables, MagicEntry, MagicTables, RookMagicTables};

use once_cell::sync::OnceCell;

// Fixed seed so every process builds byte-identical tables.
const MAGIC_SEED: u64 = 0x45;

/// Process-wide magic tables, generated and verified on first use and
/// shared read-only by every engine instance afterwards. Generation
/// failure is unrecoverable, so it panics at init rather than limping on.
pub fn tables() -> &'static MagicTables {
    static TABLES: OnceCell<MagicTables> = OnceCell::new();
    TABLES.get_or_init(|| {
        precompute::generate_magic_tables(MAGIC_SEED).expect("magic table generation failed")
    })
}
