// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2026 Vallés Puig, Ramon

//! JSON retrieval collaborator.
//!
//! Earth orientation records and XYS chunks are consumed through
//! [`JsonFetcher`]. Transport is the embedder's business: a browser build
//! wraps `fetch`, a native build reads files. Two implementations ship here:
//!
//! - [`DirectoryFetcher`] resolves URLs relative to a directory on disk.
//! - [`MemoryFetcher`] serves pre-registered documents and records every
//!   request, which is what the polling tests assert against.
//!
//! Futures are `'static` and not `Send`; everything runs on one thread.

use futures::future::{self, LocalBoxFuture};
use futures::FutureExt;
use serde_json::Value;
use std::cell::RefCell;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::FetchError;

/// Asynchronous source of JSON documents keyed by URL.
pub trait JsonFetcher {
    fn fetch_json(&self, url: &str) -> LocalBoxFuture<'static, Result<Value, FetchError>>;
}

/// Reads `<root>/<url>` from the local filesystem.
#[derive(Debug, Clone)]
pub struct DirectoryFetcher {
    root: PathBuf,
}

impl DirectoryFetcher {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn read(&self, url: &str) -> Result<Value, FetchError> {
        let path = self.root.join(url);
        let text =
            std::fs::read_to_string(&path).map_err(|e| FetchError::new(url, e.to_string()))?;
        serde_json::from_str(&text).map_err(|e| FetchError::new(url, e.to_string()))
    }
}

impl JsonFetcher for DirectoryFetcher {
    fn fetch_json(&self, url: &str) -> LocalBoxFuture<'static, Result<Value, FetchError>> {
        tracing::debug!(url, root = %self.root.display(), "reading JSON asset");
        future::ready(self.read(url)).boxed_local()
    }
}

/// In-memory document store that logs each request it receives.
#[derive(Debug, Default)]
pub struct MemoryFetcher {
    documents: RefCell<HashMap<String, Value>>,
    requests: RefCell<Vec<String>>,
}

impl MemoryFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the document served for `url`.
    pub fn insert(&self, url: impl Into<String>, document: Value) {
        self.documents.borrow_mut().insert(url.into(), document);
    }

    /// Builder form of [`insert`](Self::insert).
    pub fn with(self, url: impl Into<String>, document: Value) -> Self {
        self.insert(url, document);
        self
    }

    /// Every URL requested so far, in request order.
    pub fn requests(&self) -> Vec<String> {
        self.requests.borrow().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.borrow().len()
    }
}

impl JsonFetcher for MemoryFetcher {
    fn fetch_json(&self, url: &str) -> LocalBoxFuture<'static, Result<Value, FetchError>> {
        self.requests.borrow_mut().push(url.to_owned());
        let result = self
            .documents
            .borrow()
            .get(url)
            .cloned()
            .ok_or_else(|| FetchError::new(url, "not found"));
        future::ready(result).boxed_local()
    }
}
