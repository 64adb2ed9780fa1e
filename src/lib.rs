//! dirbackup: mirrors a directory tree into a backup location.
//!
//! Only new or modified files are copied; a destination whose modification
//! time is at least the source's is considered backed up. Copies keep their
//! permission bits and timestamps and can be gzip-compressed in place.

pub mod application;
pub mod commands;
pub mod compress;
pub mod constants;
pub mod entry;
pub mod error;
pub mod file_util;
pub mod path_util;
pub mod report;
pub mod sync;
pub mod sysexits;

pub use compress::{BuiltinGzip, Compressor, ExternalCompressor};
pub use report::{CopyReason, Event, Report};
pub use sync::{Backup, Options};
