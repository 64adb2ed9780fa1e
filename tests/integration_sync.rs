use dirbackup::error::CompressError;
use dirbackup::path_util::compressed_path;
use dirbackup::{Backup, BuiltinGzip, Compressor, CopyReason, Options};
use filetime::FileTime;
use flate2::read::GzDecoder;
use std::fs::{self, File};
use std::io::Read;
use std::path::{Path, PathBuf};
use tempfile::tempdir;

/// Stands in for gzip: renames `path` to `path.gz` and keeps its times.
struct RenameCompressor;

impl Compressor for RenameCompressor {
    fn compress(&self, path: &Path) -> Result<PathBuf, CompressError> {
        let gz = compressed_path(path);
        fs::rename(path, &gz).map_err(|source| CompressError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(gz)
    }
}

fn engine(compress: bool, compressor: Box<dyn Compressor>) -> Backup {
    let options = Options {
        compress,
        ..Options::default()
    };
    Backup::new(options, compressor)
}

fn plain() -> Backup {
    engine(false, Box::new(RenameCompressor))
}

fn set_mtime(path: &Path, secs: i64) {
    filetime::set_file_mtime(path, FileTime::from_unix_time(secs, 0)).unwrap();
}

fn mtime(path: &Path) -> FileTime {
    FileTime::from_last_modification_time(&fs::metadata(path).unwrap())
}

#[test]
fn test_new_modified_and_up_to_date_runs() {
    let src = tempdir().unwrap();
    let dst = tempdir().unwrap();
    let x = src.path().join("x.txt");
    fs::write(&x, "version one").unwrap();
    set_mtime(&x, 1_000_000);
    fs::create_dir(src.path().join("sub")).unwrap();
    fs::write(src.path().join("sub").join("y.txt"), "why").unwrap();

    let backup = plain();

    let run1 = backup.run(src.path(), dst.path()).unwrap();
    assert_eq!(run1.copied_for(CopyReason::New), 2);
    assert_eq!(run1.dirs_created(), 1);
    assert_eq!(fs::read_to_string(dst.path().join("x.txt")).unwrap(), "version one");
    assert_eq!(fs::read_to_string(dst.path().join("sub").join("y.txt")).unwrap(), "why");

    let run2 = backup.run(src.path(), dst.path()).unwrap();
    assert_eq!(run2.copied(), 0);
    assert_eq!(run2.up_to_date(), 2);
    assert_eq!(run2.bytes_copied(), 0);

    fs::write(&x, "version two").unwrap();
    set_mtime(&x, 2_000_000);
    let run3 = backup.run(src.path(), dst.path()).unwrap();
    assert_eq!(run3.copied_for(CopyReason::Modified), 1);
    assert_eq!(run3.copied_for(CopyReason::New), 0);
    assert_eq!(run3.up_to_date(), 1);
    assert_eq!(fs::read_to_string(dst.path().join("x.txt")).unwrap(), "version two");
    assert_eq!(mtime(&dst.path().join("x.txt")), FileTime::from_unix_time(2_000_000, 0));
}

#[test]
fn test_equal_mtime_skips_even_when_content_differs() {
    let src = tempdir().unwrap();
    let dst = tempdir().unwrap();
    let s = src.path().join("same.txt");
    let d = dst.path().join("same.txt");
    fs::write(&s, "source").unwrap();
    fs::write(&d, "older backup").unwrap();
    set_mtime(&s, 5_000);
    set_mtime(&d, 5_000);

    let report = plain().run(src.path(), dst.path()).unwrap();

    assert_eq!(report.up_to_date(), 1);
    assert_eq!(fs::read_to_string(&d).unwrap(), "older backup");
}

#[test]
fn test_sub_second_newer_source_is_up_to_date() {
    let src = tempdir().unwrap();
    let dst = tempdir().unwrap();
    let s = src.path().join("coarse.txt");
    let d = dst.path().join("coarse.txt");
    fs::write(&s, "source").unwrap();
    fs::write(&d, "backup").unwrap();
    filetime::set_file_mtime(&s, FileTime::from_unix_time(1_000_000, 500_000_000)).unwrap();
    filetime::set_file_mtime(&d, FileTime::from_unix_time(1_000_000, 0)).unwrap();

    let report = plain().run(src.path(), dst.path()).unwrap();

    assert_eq!(report.up_to_date(), 1);
    assert_eq!(report.copied(), 0);
    assert_eq!(fs::read_to_string(&d).unwrap(), "backup");
}

#[test]
fn test_newer_destination_is_kept() {
    let src = tempdir().unwrap();
    let dst = tempdir().unwrap();
    let s = src.path().join("f");
    let d = dst.path().join("f");
    fs::write(&s, "source").unwrap();
    fs::write(&d, "newer").unwrap();
    set_mtime(&s, 5_000);
    set_mtime(&d, 6_000);

    let report = plain().run(src.path(), dst.path()).unwrap();
    assert_eq!(report.copied(), 0);
    assert_eq!(fs::read_to_string(&d).unwrap(), "newer");
}

#[test]
fn test_recursion_covers_all_depths() {
    let root = tempdir().unwrap();
    let a = root.path().join("a");
    fs::create_dir_all(a.join("b").join("c")).unwrap();
    fs::write(a.join("b").join("c").join("file.txt"), "deep").unwrap();
    let dest = root.path().join("dest");

    let report = plain().run(&a, &dest).unwrap();

    let copied = dest.join("b").join("c").join("file.txt");
    assert_eq!(fs::read_to_string(copied).unwrap(), "deep");
    assert_eq!(report.copied(), 1);
    // dest, dest/b and dest/b/c
    assert_eq!(report.dirs_created(), 3);
    assert_eq!(report.failures().count(), 0);
}

#[test]
fn test_compression_leaves_only_gz() {
    let src = tempdir().unwrap();
    let dst = tempdir().unwrap();
    fs::write(src.path().join("f.txt"), "compress me ".repeat(50)).unwrap();
    fs::create_dir(src.path().join("docs")).unwrap();
    fs::write(src.path().join("docs").join("g.md"), "# title").unwrap();

    let backup = engine(true, Box::new(BuiltinGzip::default()));
    let report = backup.run(src.path(), dst.path()).unwrap();

    assert_eq!(report.copied(), 2);
    assert!(!dst.path().join("f.txt").exists());
    assert!(dst.path().join("f.txt.gz").is_file());
    assert!(dst.path().join("docs").is_dir());
    assert!(!dst.path().join("docs.gz").exists());
    assert!(dst.path().join("docs").join("g.md.gz").is_file());

    let mut decoded = String::new();
    GzDecoder::new(File::open(dst.path().join("f.txt.gz")).unwrap())
        .read_to_string(&mut decoded)
        .unwrap();
    assert_eq!(decoded, "compress me ".repeat(50));

    let again = backup.run(src.path(), dst.path()).unwrap();
    assert_eq!(again.copied(), 0);
    assert_eq!(again.up_to_date(), 2);
}

#[test]
fn test_modified_file_replaces_stale_gz() {
    let src = tempdir().unwrap();
    let dst = tempdir().unwrap();
    let s = src.path().join("log.txt");
    fs::write(&s, "first").unwrap();
    set_mtime(&s, 10_000);

    let backup = engine(true, Box::new(RenameCompressor));
    backup.run(src.path(), dst.path()).unwrap();
    assert_eq!(mtime(&dst.path().join("log.txt.gz")), FileTime::from_unix_time(10_000, 0));

    fs::write(&s, "second").unwrap();
    set_mtime(&s, 20_000);
    let report = backup.run(src.path(), dst.path()).unwrap();

    assert_eq!(report.copied_for(CopyReason::Modified), 1);
    let gz = dst.path().join("log.txt.gz");
    assert_eq!(fs::read_to_string(&gz).unwrap(), "second");
    assert!(!dst.path().join("log.txt").exists());
}

#[test]
fn test_enabling_compression_recopies_plain_backup() {
    let src = tempdir().unwrap();
    let dst = tempdir().unwrap();
    fs::write(src.path().join("a.txt"), "a").unwrap();

    plain().run(src.path(), dst.path()).unwrap();
    assert!(dst.path().join("a.txt").is_file());

    let report = engine(true, Box::new(RenameCompressor))
        .run(src.path(), dst.path())
        .unwrap();

    assert_eq!(report.copied_for(CopyReason::New), 1);
    assert!(dst.path().join("a.txt.gz").is_file());
    assert!(!dst.path().join("a.txt").exists());
}

#[test]
fn test_disabling_compression_keeps_gz_backup() {
    let src = tempdir().unwrap();
    let dst = tempdir().unwrap();
    fs::write(src.path().join("a.txt"), "a").unwrap();

    engine(true, Box::new(RenameCompressor))
        .run(src.path(), dst.path())
        .unwrap();
    let report = plain().run(src.path(), dst.path()).unwrap();

    assert_eq!(report.copied_for(CopyReason::New), 1);
    assert!(dst.path().join("a.txt").is_file());
    assert!(dst.path().join("a.txt.gz").is_file());
}

#[test]
fn test_failed_compression_is_entry_failure() {
    struct Refuse;
    impl Compressor for Refuse {
        fn compress(&self, path: &Path) -> Result<PathBuf, CompressError> {
            Err(CompressError::ChildExit {
                path: path.to_path_buf(),
                code: Some(1),
            })
        }
    }

    let src = tempdir().unwrap();
    let dst = tempdir().unwrap();
    fs::write(src.path().join("a.txt"), "a").unwrap();
    fs::write(src.path().join("b.txt"), "b").unwrap();

    let report = engine(true, Box::new(Refuse))
        .run(src.path(), dst.path())
        .unwrap();

    assert_eq!(report.failures().count(), 2);
    assert_eq!(report.copied(), 0);
}

#[cfg(unix)]
#[test]
fn test_permissions_and_times_preserved() {
    use std::os::unix::fs::PermissionsExt;

    let src = tempdir().unwrap();
    let dst = tempdir().unwrap();
    let s = src.path().join("run.sh");
    fs::write(&s, "#!/bin/sh\necho hi\n").unwrap();
    fs::set_permissions(&s, fs::Permissions::from_mode(0o750)).unwrap();
    let atime = FileTime::from_unix_time(1_500_000_000, 0);
    let mtime = FileTime::from_unix_time(1_500_000_100, 0);
    filetime::set_file_times(&s, atime, mtime).unwrap();
    fs::create_dir(src.path().join("private")).unwrap();
    fs::set_permissions(src.path().join("private"), fs::Permissions::from_mode(0o700)).unwrap();

    plain().run(src.path(), dst.path()).unwrap();

    let meta = fs::metadata(dst.path().join("run.sh")).unwrap();
    assert_eq!(meta.permissions().mode() & 0o777, 0o750);
    assert_eq!(FileTime::from_last_modification_time(&meta), mtime);
    assert_eq!(FileTime::from_last_access_time(&meta), atime);
    let meta = fs::metadata(dst.path().join("private")).unwrap();
    assert_eq!(meta.permissions().mode() & 0o777, 0o700);
}

#[cfg(unix)]
#[test]
fn test_read_only_backup_is_replaced_when_modified() {
    use std::os::unix::fs::PermissionsExt;

    let src = tempdir().unwrap();
    let dst = tempdir().unwrap();
    let s = src.path().join("ro.txt");
    fs::write(&s, "one").unwrap();
    fs::set_permissions(&s, fs::Permissions::from_mode(0o444)).unwrap();
    set_mtime(&s, 100);
    plain().run(src.path(), dst.path()).unwrap();

    fs::set_permissions(&s, fs::Permissions::from_mode(0o644)).unwrap();
    fs::write(&s, "two").unwrap();
    fs::set_permissions(&s, fs::Permissions::from_mode(0o444)).unwrap();
    set_mtime(&s, 200);
    let report = plain().run(src.path(), dst.path()).unwrap();

    assert_eq!(report.copied_for(CopyReason::Modified), 1);
    assert_eq!(fs::read_to_string(dst.path().join("ro.txt")).unwrap(), "two");
}
