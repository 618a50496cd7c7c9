//! Traversals over the nested catalog tree.
//!
//! Both walks are lazy: a nested catalog is fetched only when the walk
//! reaches it. Both keep an explicit stack, so arbitrarily deep chains of
//! nested catalogs do not grow the call stack.

use std::iter::FusedIterator;
use std::sync::Arc;

use stratum_catalog::{Catalog, DirectoryEntry, NestedCatalogRef};

use crate::error::{RepoError, RepoResult};
use crate::repository::Repository;

// ---------------------------------------------------------------------------
// DirentWalk
// ---------------------------------------------------------------------------

struct Frame {
    catalog: Arc<Catalog>,
    cursor: usize,
}

/// Every directory entry below a starting catalog, as `(path, entry)`.
///
/// Nested catalog boundaries are crossed transparently: a mountpoint entry
/// in the parent is replaced by the child catalog's own entries, starting
/// with the child's root directory. Each catalog's entries come in path
/// order.
///
/// The walk ends after the first error.
pub struct DirentWalk<'r> {
    repo: &'r Repository,
    stack: Vec<Frame>,
}

impl<'r> DirentWalk<'r> {
    pub(crate) fn new(repo: &'r Repository, start: Arc<Catalog>) -> Self {
        Self {
            repo,
            stack: vec![Frame {
                catalog: start,
                cursor: 0,
            }],
        }
    }

    /// Number of catalogs currently open on the stack.
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    fn fail(&mut self, error: RepoError) -> Option<RepoResult<(String, DirectoryEntry)>> {
        self.stack.clear();
        Some(Err(error))
    }
}

impl Iterator for DirentWalk<'_> {
    type Item = RepoResult<(String, DirectoryEntry)>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let frame = self.stack.last_mut()?;
            let Some(entry) = frame.catalog.entry_at(frame.cursor).cloned() else {
                self.stack.pop();
                continue;
            };
            frame.cursor += 1;

            if !entry.is_nested_mountpoint() {
                return Some(Ok((entry.path.clone(), entry)));
            }

            let reference = frame.catalog.find_nested_at(&entry.path).cloned();
            let owner = frame.catalog.hash();
            let Some(reference) = reference else {
                return self.fail(RepoError::NestedCatalogNotFound {
                    path: entry.path,
                    catalog: owner,
                });
            };
            match self.repo.retrieve_nested(&reference) {
                Ok(child) => self.stack.push(Frame {
                    catalog: child,
                    cursor: 0,
                }),
                Err(e) => return self.fail(e),
            }
        }
    }
}

impl FusedIterator for DirentWalk<'_> {}

// ---------------------------------------------------------------------------
// CatalogTreeWalk
// ---------------------------------------------------------------------------

enum Pending {
    Loaded(Arc<Catalog>),
    Reference(NestedCatalogRef),
}

/// Every catalog in the tree below a starting catalog, parents before
/// their children. Sibling order is unspecified.
///
/// The walk ends after the first error.
pub struct CatalogTreeWalk<'r> {
    repo: &'r Repository,
    pending: Vec<Pending>,
}

impl<'r> CatalogTreeWalk<'r> {
    pub(crate) fn new(repo: &'r Repository, start: Arc<Catalog>) -> Self {
        Self {
            repo,
            pending: vec![Pending::Loaded(start)],
        }
    }
}

impl Iterator for CatalogTreeWalk<'_> {
    type Item = RepoResult<Arc<Catalog>>;

    fn next(&mut self) -> Option<Self::Item> {
        let catalog = match self.pending.pop()? {
            Pending::Loaded(catalog) => catalog,
            Pending::Reference(reference) => match self.repo.retrieve_nested(&reference) {
                Ok(catalog) => catalog,
                Err(e) => {
                    self.pending.clear();
                    return Some(Err(e));
                }
            },
        };
        self.pending.extend(
            catalog
                .list_nested()
                .iter()
                .rev()
                .cloned()
                .map(Pending::Reference),
        );
        Some(Ok(catalog))
    }
}

impl FusedIterator for CatalogTreeWalk<'_> {}
