//! # Container Discovery
//!
//! Tree walks over the secret store. [`SecretPathResolver::walk`] visits a
//! folder and everything beneath it; [`SecretPathResolver::find_container_paths`]
//! uses the walk to locate containers of a store type by field-name suffix.
//!
//! Walks never abort on a single bad node: listing or read failures become
//! warnings and the rest of the tree is still visited.

use futures::stream::{self, StreamExt};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::config::StoreType;
use crate::errors::{CertStoreError, Result};
use crate::secrets::{paths, SecretEntry, SecretStore};

/// Maximum listings or reads in flight during a walk.
pub const MAX_CONCURRENT_REQUESTS: usize = 8;

/// Immediate contents of one folder, as full paths.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FolderListing {
    pub path: String,
    pub entries: Vec<String>,
    pub subfolders: Vec<String>,
}

/// Every folder reached by a walk plus the failures met on the way.
#[derive(Debug, Clone, Default)]
pub struct TreeWalk {
    pub folders: Vec<FolderListing>,
    pub warnings: Vec<String>,
}

impl TreeWalk {
    /// Listing for `path`, if it was visited.
    pub fn folder(&self, path: &str) -> Option<&FolderListing> {
        self.folders.iter().find(|f| f.path == path)
    }

    /// All non-folder entries, folder by folder.
    pub fn entries(&self) -> impl Iterator<Item = (&FolderListing, &String)> {
        self.folders.iter().flat_map(|folder| folder.entries.iter().map(move |entry| (folder, entry)))
    }
}

/// Resolves folder listings and container locations on a secret store.
#[derive(Clone)]
pub struct SecretPathResolver {
    store: Arc<dyn SecretStore>,
}

impl SecretPathResolver {
    pub fn new(store: Arc<dyn SecretStore>) -> Self {
        Self { store }
    }

    /// List `path` once and split the names into entries and subfolders.
    pub async fn list_children(&self, path: &str) -> Result<FolderListing> {
        let names = self.store.list_paths(path).await?;
        let mut listing = FolderListing { path: path.to_string(), ..Default::default() };
        for name in names {
            let full = paths::join_path(path, &name);
            if paths::is_folder(&name) {
                listing.subfolders.push(full);
            } else {
                listing.entries.push(full);
            }
        }
        Ok(listing)
    }

    /// Visit `root` and every folder below it.
    ///
    /// Folders are listed level by level from an explicit work stack, at most
    /// [`MAX_CONCURRENT_REQUESTS`] at a time. The result is sorted by path.
    pub async fn walk(&self, root: &str) -> TreeWalk {
        let mut walk = TreeWalk::default();
        let mut pending = vec![root.to_string()];
        let mut seen = BTreeSet::new();

        while !pending.is_empty() {
            let batch: Vec<String> =
                pending.drain(..).filter(|path| seen.insert(path.clone())).collect();

            let results: Vec<(String, Result<FolderListing>)> = stream::iter(batch)
                .map(|path| async move {
                    let result = self.list_children(&path).await;
                    (path, result)
                })
                .buffer_unordered(MAX_CONCURRENT_REQUESTS)
                .collect()
                .await;

            for (path, result) in results {
                match result {
                    Ok(listing) => {
                        pending.extend(listing.subfolders.iter().cloned());
                        walk.folders.push(listing);
                    }
                    Err(e) => {
                        warn!(path = %path, error = %e, "Unable to list folder");
                        walk.warnings.push(format!("Unable to list '{}': {}", path, e));
                    }
                }
            }
        }

        walk.folders.sort_by(|a, b| a.path.cmp(&b.path));
        debug!(root = %root, folders = walk.folders.len(), warnings = walk.warnings.len(), "Walked secret tree");
        walk
    }

    /// Read many secrets with bounded concurrency, in input order.
    pub async fn read_all(&self, secret_paths: &[String]) -> Vec<(String, Result<SecretEntry>)> {
        let mut results: Vec<(usize, String, Result<SecretEntry>)> =
            stream::iter(secret_paths.iter().cloned().enumerate())
                .map(|(index, path)| async move {
                    let result = self.store.read_secret(&path).await;
                    (index, path, result)
                })
                .buffer_unordered(MAX_CONCURRENT_REQUESTS)
                .collect()
                .await;
        results.sort_by_key(|(index, _, _)| *index);
        results.into_iter().map(|(_, path, result)| (path, result)).collect()
    }

    /// Find every container of `store_type` under `root`.
    ///
    /// A secret matches when one of its field names ends with the store
    /// type's suffix. Binary formats report the secret's own path; bare PEM
    /// reports the folder holding it. Returns sorted, de-duplicated matches
    /// plus one warning per node that could not be listed or read.
    ///
    /// # Errors
    ///
    /// - [`CertStoreError::NotSupported`] for the PKI engine
    pub async fn find_container_paths(
        &self,
        root: &str,
        store_type: StoreType,
    ) -> Result<(Vec<String>, Vec<String>)> {
        let suffix = store_type
            .discovery_suffix()
            .ok_or_else(|| CertStoreError::not_supported("Discovery", store_type.as_str()))?;

        let walk = self.walk(root).await;
        let mut warnings = walk.warnings.clone();

        let entries: Vec<String> = walk.entries().map(|(_, entry)| entry.clone()).collect();
        let reads = self.read_all(&entries).await;

        let mut matches = BTreeSet::new();
        for (path, result) in reads {
            match result {
                Ok(fields) => {
                    if fields.keys().any(|name| name.ends_with(suffix)) {
                        let found = match store_type {
                            StoreType::BarePem => parent_folder(&walk, &path),
                            _ => path.clone(),
                        };
                        debug!(path = %path, container = %found, "Found container");
                        matches.insert(found);
                    }
                }
                Err(e) => {
                    warn!(path = %path, error = %e, "Unable to read secret during discovery");
                    warnings.push(format!("Unable to read '{}': {}", path, e));
                }
            }
        }

        info!(
            root = %root,
            store_type = %store_type,
            matches = matches.len(),
            warnings = warnings.len(),
            "Discovery complete"
        );
        Ok((matches.into_iter().collect(), warnings))
    }
}

fn parent_folder(walk: &TreeWalk, entry: &str) -> String {
    walk.entries()
        .find(|(_, candidate)| candidate.as_str() == entry)
        .map(|(folder, _)| folder.path.clone())
        .unwrap_or_else(|| entry.to_string())
}
