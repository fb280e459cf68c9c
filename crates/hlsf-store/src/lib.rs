pub mod error;
pub mod memory;
pub mod paths;
pub mod schema;
pub mod store;
pub mod traits;

pub use error::{Result, StoreError};
pub use memory::MemoryStore;
pub use paths::{DB_FILE, default_base_dir, open_in};
pub use store::Store;
pub use traits::{CooccurrenceStore, GlyphBankStore, StateStore, load_or_generate_bank, record_run};
