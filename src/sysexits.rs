//! Exit status codes of the `dbk` binary.
//!
//! The first three are the historical codes of the backup command, the rest
//! are legacy exit status codes for system programs.
//! reference: [SYSEXITS](https://man.freebsd.org/cgi/man.cgi?query=sysexits&apropos=0&sektion=0&manpath=FreeBSD+11.2-stable&arch=default&format=html)

/// value: 0 <br>
/// The backup finished. Individual entries may still have failed; see the output.
pub const EX_OK: i32 = 0;

/// value: 1 <br>
/// A file-to-file backup failed.
pub const EX_COPY_FAILED: i32 = 1;

/// value: -1 (255 as seen by the shell) <br>
/// Unsupported source/destination combination, or a directory backup could
/// not open or create its top-level directories.
pub const EX_FAILURE: i32 = -1;

/// value: 66 <br>
/// An input file (not a system file) did not exist or was not readable.
pub const EX_NOINPUT: i32 = 66;

/// value: 74 <br>
/// An error occurred while doing I/O on some file.
pub const EX_IOERR: i32 = 74;

/// value: 78 <br>
/// Something was found in an unconfigured or misconfigured state.
pub const EX_CONFIG: i32 = 78;
