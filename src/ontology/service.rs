use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
    sync::{Arc, RwLock},
};

use crate::{
    config::SitemapSettings,
    ontology::{
        document::{DocumentError, OntologyDocument},
        entities::Ontology,
        repositories::OntologyRepository,
        value_objects::Iri,
    },
    sitemap::Sitemap,
};

/// Type alias simplifying repository trait object usage inside the service.
pub type RepositoryHandle =
    dyn OntologyRepository<Error = OntologyServiceError> + Send + Sync + 'static;

/// Errors raised by ontology infrastructure components.
#[derive(Debug, thiserror::Error)]
pub enum OntologyServiceError {
    /// Attempted to store an ontology that already exists.
    #[error("ontology `{ontology}` already exists")]
    Duplicate { ontology: Iri },
    /// Referenced ontology was not found.
    #[error("ontology `{ontology}` missing")]
    Missing { ontology: Iri },
    /// Reading an ontology document failed.
    #[error("failed to read ontology document `{path}`: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    /// An ontology document is not valid YAML for the document format.
    #[error("failed to parse ontology document `{path}`: {source}")]
    Yaml {
        path: PathBuf,
        source: serde_yaml::Error,
    },
    /// An ontology document has invalid content.
    #[error("invalid ontology document `{path}`: {source}")]
    Document {
        path: PathBuf,
        source: DocumentError,
    },
    /// A document mapped to one ontology declares another.
    #[error("document `{path}` declares ontology `{found}` instead of `{expected}`")]
    Mismatch {
        path: PathBuf,
        expected: Iri,
        found: Iri,
    },
}

impl OntologyServiceError {
    fn duplicate(ontology: &Iri) -> Self {
        Self::Duplicate {
            ontology: ontology.clone(),
        }
    }

    fn missing(ontology: &Iri) -> Self {
        Self::Missing {
            ontology: ontology.clone(),
        }
    }
}

/// Repository holding ontologies in memory.
#[derive(Default)]
pub struct InMemoryOntologyRepository {
    ontologies: RwLock<BTreeMap<Iri, Ontology>>,
}

impl InMemoryOntologyRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a new ontology.
    ///
    /// # Errors
    ///
    /// Rejects an ontology whose identifier is already stored.
    pub fn insert(&self, ontology: Ontology) -> Result<(), OntologyServiceError> {
        let mut guard = self
            .ontologies
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let id = ontology.id().clone();
        if guard.contains_key(&id) {
            return Err(OntologyServiceError::duplicate(&id));
        }
        guard.insert(id, ontology);
        Ok(())
    }

    /// Replaces a stored ontology.
    ///
    /// # Errors
    ///
    /// Fails when the ontology is not stored yet.
    pub fn update(&self, ontology: Ontology) -> Result<(), OntologyServiceError> {
        let mut guard = self
            .ontologies
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let id = ontology.id().clone();
        if !guard.contains_key(&id) {
            return Err(OntologyServiceError::missing(&id));
        }
        guard.insert(id, ontology);
        Ok(())
    }

    /// # Errors
    ///
    /// Fails when the ontology is not stored.
    pub fn remove(&self, iri: &Iri) -> Result<Ontology, OntologyServiceError> {
        self.ontologies
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .remove(iri)
            .ok_or_else(|| OntologyServiceError::missing(iri))
    }
}

impl FromIterator<Ontology> for InMemoryOntologyRepository {
    fn from_iter<T: IntoIterator<Item = Ontology>>(iter: T) -> Self {
        Self {
            ontologies: RwLock::new(
                iter.into_iter()
                    .map(|ontology| (ontology.id().clone(), ontology))
                    .collect(),
            ),
        }
    }
}

impl OntologyRepository for InMemoryOntologyRepository {
    type Error = OntologyServiceError;

    fn get(&self, iri: &Iri) -> Result<Option<Ontology>, Self::Error> {
        let guard = self
            .ontologies
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        Ok(guard.get(iri).cloned())
    }
}

/// Repository reading YAML ontology documents from mapped file locations.
#[derive(Clone, Debug, Default)]
pub struct LocationMapper {
    locations: BTreeMap<Iri, PathBuf>,
}

impl LocationMapper {
    #[must_use]
    pub fn new(locations: BTreeMap<Iri, PathBuf>) -> Self {
        Self { locations }
    }

    /// Maps `ontology` to the document at `path`.
    #[must_use]
    pub fn with_location(mut self, ontology: Iri, path: impl Into<PathBuf>) -> Self {
        self.locations.insert(ontology, path.into());
        self
    }

    #[must_use]
    pub fn location(&self, ontology: &Iri) -> Option<&Path> {
        self.locations.get(ontology).map(PathBuf::as_path)
    }
}

impl OntologyRepository for LocationMapper {
    type Error = OntologyServiceError;

    fn get(&self, iri: &Iri) -> Result<Option<Ontology>, Self::Error> {
        let Some(path) = self.location(iri) else {
            return Ok(None);
        };
        tracing::debug!(ontology = %iri, path = %path.display(), "reading ontology document");

        let content = fs::read_to_string(path).map_err(|source| OntologyServiceError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let document: OntologyDocument =
            serde_yaml::from_str(&content).map_err(|source| OntologyServiceError::Yaml {
                path: path.to_path_buf(),
                source,
            })?;
        if document.id != *iri {
            return Err(OntologyServiceError::Mismatch {
                path: path.to_path_buf(),
                expected: iri.clone(),
                found: document.id,
            });
        }
        document
            .into_ontology()
            .map(Some)
            .map_err(|source| OntologyServiceError::Document {
                path: path.to_path_buf(),
                source,
            })
    }
}

/// Read-through cache of compiled sitemaps, keyed by root ontology.
///
/// Sitemaps are immutable once compiled and shared as `Arc`s. With caching
/// disabled every call recompiles from the repository.
#[derive(Clone)]
pub struct SitemapService {
    root: Iri,
    repository: Arc<RepositoryHandle>,
    cache: moka::sync::Cache<Iri, Arc<Sitemap>>,
    caching: bool,
}

impl SitemapService {
    #[must_use]
    pub fn new(
        root: Iri,
        repository: Arc<RepositoryHandle>,
        caching: bool,
        max_capacity: u64,
    ) -> Self {
        Self {
            root,
            repository,
            cache: moka::sync::Cache::new(max_capacity),
            caching,
        }
    }

    /// Builds a service reading documents from the configured locations.
    #[must_use]
    pub fn from_config(settings: &SitemapSettings) -> Self {
        Self::new(
            settings.ontology.clone(),
            Arc::new(LocationMapper::new(settings.locations.clone())),
            settings.cache,
            settings.max_capacity,
        )
    }

    /// Returns a clone of the repository handle.
    #[must_use]
    pub fn repository(&self) -> Arc<RepositoryHandle> {
        Arc::clone(&self.repository)
    }

    /// The application's root ontology.
    #[must_use]
    pub fn root(&self) -> &Iri {
        &self.root
    }

    /// The sitemap of the root ontology.
    ///
    /// # Errors
    ///
    /// See [`SitemapService::load`].
    pub fn sitemap(&self) -> crate::Result<Arc<Sitemap>> {
        self.load(&self.root)
    }

    /// Returns the sitemap rooted at `ontology`, compiling it on a cache miss.
    ///
    /// # Errors
    ///
    /// Fails when an ontology of the import closure cannot be read or a
    /// template is misconfigured. Failures are not cached.
    pub fn load(&self, ontology: &Iri) -> crate::Result<Arc<Sitemap>> {
        if self.caching {
            if let Some(sitemap) = self.cache.get(ontology) {
                return Ok(sitemap);
            }
        }
        let sitemap = Arc::new(Sitemap::load(ontology, self.repository.as_ref())?);
        if self.caching {
            self.cache.insert(ontology.clone(), Arc::clone(&sitemap));
            tracing::debug!(ontology = %ontology, "cached sitemap");
        }
        Ok(sitemap)
    }

    /// Drops the cached sitemap of `ontology`.
    pub fn invalidate(&self, ontology: &Iri) {
        self.cache.invalidate(ontology);
    }

    pub fn invalidate_all(&self) {
        self.cache.invalidate_all();
    }
}
