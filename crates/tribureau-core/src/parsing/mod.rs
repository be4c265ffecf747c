//! Report-text parsing passes: format detection, account segmentation,
//! per-bureau column extraction and score/profile parsing.

pub mod columns;
pub mod format;
pub mod scores;
pub mod segment;
pub mod table;
