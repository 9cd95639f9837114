use std::sync::Arc;

use crate::forms::artifacts::ArtifactStore;
use crate::forms::secret::SecretHasher;
use crate::forms::store::FormStore;

/// Shared application state injected into all route handlers via Axum extractors.
/// The collaborators are trait objects so tests can swap backends without
/// touching handler code.
#[derive(Clone)]
pub struct AppState {
    pub forms: Arc<dyn FormStore>,
    pub artifacts: Arc<dyn ArtifactStore>,
    pub hasher: Arc<SecretHasher>,
}
