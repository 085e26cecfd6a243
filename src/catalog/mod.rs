//! Technology registry and barcode whitelists.
//!
//! The registry holds the read layout of every known single-cell technology.
//! An embedded catalog is compiled into the binary, but custom registries can
//! also be loaded from JSON files with the same schema.
//!
//! ## Embedded Catalog
//!
//! - **10x Genomics**: `10xv1`, `10xv2`, `10xv3` (whitelists, BAM tags)
//! - **inDrops**: `indropsv1`, `indropsv3` (whitelist for v3)
//! - **Drop-seq**: `dropseq`
//!
//! ## Example
//!
//! ```rust,no_run
//! use tech_solver::TechnologyRegistry;
//! use std::path::Path;
//!
//! // Process-wide embedded registry
//! let registry = TechnologyRegistry::embedded();
//! for technology in registry.technologies() {
//!     println!("{} ({} files)", technology.name, technology.file_count);
//! }
//!
//! // Export, edit and load a custom registry
//! let json = registry.to_json().unwrap();
//! let custom = TechnologyRegistry::load_from_file(Path::new("my_registry.json")).unwrap();
//! ```

pub mod store;
pub mod whitelist;
