//! Auto Gateway Recommendation Engine
//!
//! Personalized vehicle-listing recommendations from observed interaction
//! history. Collaborative filtering over a user-listing score matrix and
//! content-based filtering over TF-IDF listing features, combined by a
//! hybrid interleaver, with popularity ranking as the universal fallback.
//!
//! Every recommendation request recomputes from a fresh snapshot of the
//! store: no cross-request caching, no trained state.

pub mod collaborative;
pub mod content_based;
pub mod diversity;
pub mod hybrid;
pub mod popularity;
pub mod postgres;
pub mod profile;
pub mod scoring;
pub mod service;
pub mod store;
pub mod tfidf;

// Re-export key types
pub use collaborative::CollaborativeFiltering;
pub use content_based::ContentBasedFiltering;
pub use hybrid::HybridRecommender;
pub use popularity::PopularityRanker;
pub use postgres::PostgresStore;
pub use profile::{PreferenceProfile, RangeStats};
pub use service::{Algorithm, Recommender};
pub use store::{InteractionFilter, ListingFilter, ListingStore, MemoryStore};
pub use tfidf::TfidfVectorizer;

/// Engine configuration
#[derive(Debug, Clone)]
pub struct RecoConfig {
    /// System-wide interaction count below which collaborative filtering
    /// delegates to content-based filtering (default: 10)
    pub min_interactions_for_collaborative: usize,
    /// Candidate-pool size below which content-based filtering delegates to
    /// the popularity ranker (default: 5)
    pub min_content_candidates: usize,
    /// Maximum listings per brand admitted by the diversity re-ranker
    /// (default: 4)
    pub max_per_brand: usize,
    /// Lower bound on the nearest-neighbor count (default: 5)
    pub min_neighbors: usize,
    /// Upper bound on the nearest-neighbor count (default: 20)
    pub max_neighbors: usize,
    /// Result count the filtering engines work with internally (default: 24)
    pub engine_limit: usize,
    /// Result count returned to callers that do not specify one (default: 12)
    pub default_limit: usize,
}

impl Default for RecoConfig {
    fn default() -> Self {
        Self {
            min_interactions_for_collaborative: 10,
            min_content_candidates: 5,
            max_per_brand: 4,
            min_neighbors: 5,
            max_neighbors: 20,
            engine_limit: 24,
            default_limit: 12,
        }
    }
}
