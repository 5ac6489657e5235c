use rocksdb::{DBWithThreadMode, MultiThreaded, Options};
use std::path::Path;
use std::sync::Arc;

pub type DB = DBWithThreadMode<MultiThreaded>;

pub fn open_db(path: &Path) -> Result<Arc<DB>, rocksdb::Error> {
    let mut opts = Options::default();
    opts.create_if_missing(true);
    Ok(Arc::new(DB::open(&opts, path)?))
}

/// Keeps the backing temp directory alive for as long as the test DB is used.
pub struct TempDbLifetime {
    _tempdir: tempfile::TempDir,
}

pub fn create_temp_db() -> (TempDbLifetime, Arc<DB>) {
    let tempdir = tempfile::tempdir().expect("creating a temp dir for the test db");
    let db = open_db(tempdir.path()).expect("opening the test db");
    (TempDbLifetime { _tempdir: tempdir }, db)
}
