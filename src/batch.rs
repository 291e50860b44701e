//! Parallel compilation of independent containers.
//!
//! Each root gets its own write session; sessions only share the catalog,
//! whose registration path is synchronized. Rayon's work-stealing pool
//! spreads the sessions across cores.

use crate::catalog::TypeCatalog;
use crate::content::Content;
use crate::error::Result;
use crate::options::XnbOptions;
use rayon::prelude::*;
use std::path::{Path, PathBuf};

/// Compiles every root into its own container, in input order.
///
/// Every root is attempted; the result of each is reported separately.
pub fn compile_batch<T: Content>(
    catalog: &TypeCatalog,
    options: &XnbOptions,
    roots: &[T],
) -> Vec<Result<Vec<u8>>> {
    log::debug!("compiling {} containers", roots.len());
    roots
        .par_iter()
        .map(|root| options.serialize(catalog, root))
        .collect()
}

/// Compiles and saves `(path, root)` pairs, stopping at the first failure.
///
/// A failed root never produces a file; roots that completed before the
/// failure keep theirs.
pub fn save_batch<T, P>(catalog: &TypeCatalog, options: &XnbOptions, jobs: &[(P, T)]) -> Result<Vec<PathBuf>>
where
    T: Content,
    P: AsRef<Path> + Sync,
{
    jobs.par_iter()
        .map(|(path, root)| {
            options.save(catalog, path, root)?;
            Ok(path.as_ref().to_path_buf())
        })
        .collect()
}
