//! Synthetic chart history and range assembly

pub mod assembler;
pub mod path;
pub mod range;
pub mod session;

pub use assembler::{Chart, ChartPoint, RangeStats, assemble, assemble_at};
pub use path::generate_path;
pub use range::{RangeKey, RangeSpec, StartRule};
pub use session::{ChartSession, HistoricalPath};
