//! Loads ACVP vector files and indexes them by group and case id.

use crate::error::{HarnessError, Result};
use crate::model::{DocumentKind, TestFamily, TestGroup, VectorDocument};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// ----------------------------------------------------------------
/// One parsed vector file plus O(1) lookup by `tgId`
/// ----------------------------------------------------------------
#[derive(Debug, Clone)]
pub struct VectorIndex {
    path: PathBuf,
    document: VectorDocument,
    groups_by_id: HashMap<u64, usize>,
}

impl VectorIndex {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|source| HarnessError::VectorRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json, path)
    }

    /// Parse an in-memory document. `origin` is only used in diagnostics.
    pub fn from_json_str(json: &str, origin: impl Into<PathBuf>) -> Result<Self> {
        let path = origin.into();
        let document: VectorDocument =
            serde_json::from_str(json).map_err(|source| HarnessError::VectorParse {
                path: path.clone(),
                source,
            })?;
        Ok(Self::from_document(document, path))
    }

    pub fn from_document(mut document: VectorDocument, path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let mut groups_by_id = HashMap::with_capacity(document.groups.len());

        for (position, group) in document.groups.iter_mut().enumerate() {
            for case_id in group.build_case_index() {
                warn!(
                    path = %path.display(),
                    group_id = group.group_id,
                    case_id,
                    "duplicate tcId, keeping the first occurrence"
                );
            }
            if groups_by_id.contains_key(&group.group_id) {
                warn!(
                    path = %path.display(),
                    group_id = group.group_id,
                    "duplicate tgId, keeping the first occurrence"
                );
                continue;
            }
            groups_by_id.insert(group.group_id, position);
        }

        debug!(
            path = %path.display(),
            groups = document.groups.len(),
            "indexed vector file"
        );
        Self {
            path,
            document,
            groups_by_id,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn document(&self) -> &VectorDocument {
        &self.document
    }

    /// Groups in file order
    pub fn groups(&self) -> impl Iterator<Item = &TestGroup> {
        self.document.groups.iter()
    }

    pub fn find_group(&self, group_id: u64) -> Option<&TestGroup> {
        self.groups_by_id
            .get(&group_id)
            .and_then(|&position| self.document.groups.get(position))
    }

    pub fn case_count(&self) -> usize {
        self.document.groups.iter().map(|g| g.tests.len()).sum()
    }
}

/// ----------------------------------------------------------------
/// Where a family's files live on disk
/// ----------------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FamilyFiles {
    pub family: TestFamily,
    pub prompt: PathBuf,
    pub expected_results: PathBuf,
    /// Only signature verification has one
    pub internal_projection: Option<PathBuf>,
}

impl FamilyFiles {
    /// Resolve `<vectors_dir>/<family dir>/<file>` for every file the family needs.
    pub fn locate(vectors_dir: &Path, family: TestFamily) -> Self {
        let dir = vectors_dir.join(family.directory());
        let internal_projection = family
            .documents()
            .contains(&DocumentKind::InternalProjection)
            .then(|| dir.join(DocumentKind::InternalProjection.file_name()));
        Self {
            family,
            prompt: dir.join(DocumentKind::Prompt.file_name()),
            expected_results: dir.join(DocumentKind::ExpectedResults.file_name()),
            internal_projection,
        }
    }
}

/// ----------------------------------------------------------------
/// Every indexed file of one family, ready for reconciliation
/// ----------------------------------------------------------------
#[derive(Debug, Clone)]
pub struct FamilyDocuments {
    pub family: TestFamily,
    pub prompt: VectorIndex,
    pub expected_results: VectorIndex,
    pub internal_projection: Option<VectorIndex>,
}

impl FamilyDocuments {
    pub fn load(files: &FamilyFiles) -> Result<Self> {
        let internal_projection = files
            .internal_projection
            .as_ref()
            .map(VectorIndex::load)
            .transpose()?;
        Ok(Self {
            family: files.family,
            prompt: VectorIndex::load(&files.prompt)?,
            expected_results: VectorIndex::load(&files.expected_results)?,
            internal_projection,
        })
    }
}
