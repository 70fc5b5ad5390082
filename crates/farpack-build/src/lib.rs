//! farpack build infrastructure
//!
//! Resolves what a packaging run is made of and stages its binaries:
//! - Project root and build unit resolution from directory conventions
//! - Resource discovery under an extension allow-list
//! - VCS provenance (branch and short commit)
//! - Binary assembly: precompiled copy or toolchain build, optionally cross-compiled

pub mod assembler;
pub mod error;
pub mod fs_util;
pub mod project;
pub mod resources;
pub mod targets;
pub mod toolchain;
pub mod vcs;

// Re-export main types
pub use assembler::{AssemblyRequest, BinaryAssembler};
pub use error::{BuildError, BuildResult};
pub use project::{PathResolver, ProjectLayout};
pub use resources::ResourceScanner;
pub use targets::{AssembledBinary, BinaryOrigin, BuildUnit, TargetPlatform};
pub use toolchain::{execute_shell, BuildRequest, CommandOutput, Toolchain};
pub use vcs::{GitMetadataReader, VcsError, VcsInfo, VcsInfoReader};
