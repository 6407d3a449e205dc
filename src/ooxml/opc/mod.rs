/// Open Packaging Conventions (OPC) writing support.
///
/// This module holds the package-level machinery the spreadsheet writer sits on:
///
/// - Part names (`packuri`) and relationship tables (`rel`)
/// - Assembled parts with spill-to-disk storage (`part`)
/// - Content type registry and archive layout (`pkgwriter`)
/// - ZIP-based physical packaging and atomic output (`phys_pkg`)
pub mod constants;
pub mod packuri;
pub mod part;
pub mod phys_pkg;
pub mod pkgwriter;
pub mod rel;

// Re-export commonly used types
pub use packuri::PackURI;
pub use part::{Part, PartBuffer};
pub use phys_pkg::{ArchiveOptions, Compression};
pub use pkgwriter::PackageWriter;
pub use rel::{Relationship, RelationshipManager, Relationships};
