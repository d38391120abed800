//! Prelude module for convenient imports.
//!
//! ```rust,ignore
//! use membra::prelude::*;
//! ```

// Core types
pub use crate::{BitMask, Error, IhcImage, LabelMap, Plane, Result};

// Configuration
pub use crate::{Config, Connectivity, Normalization, SeedPolarity};

// Pipeline - main API
pub use crate::{CellRecord, CellSegmenter, Diagnostics, PipelineOutput, QcArtifacts, run};
