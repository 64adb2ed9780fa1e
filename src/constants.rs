/// Package name.
pub(crate) const PKG_NAME: &str = env!("CARGO_PKG_NAME");
/// Default configuration file name.
pub(crate) const CONFIG_NAME: &str = "config.toml";
/// Size of the buffer used to copy file contents.
pub const BUF_SIZE: usize = 8192;
/// Suffix carried by compressed backup artifacts.
pub const GZ_SUFFIX: &str = ".gz";
/// Permission bits propagated from a source entry to its backup.
pub const MODE_MASK: u32 = 0o777;
