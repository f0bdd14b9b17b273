//! Exercise resolution
//!
//! Maps a weak item's content id to something the client can display.

use async_trait::async_trait;
use dashmap::DashMap;
use uuid::Uuid;

use recall_common::{ExerciseRef, StoreError, WeakItem};

/// Trait for exercise lookups
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ExerciseResolver: Send + Sync {
    /// Resolve a review exercise for a weak item, `None` when the content is gone
    async fn resolve(&self, item: &WeakItem) -> Result<Option<ExerciseRef>, StoreError>;
}

/// Catalog-backed resolver holding one review exercise per content id
#[derive(Default)]
pub struct StaticExerciseResolver {
    by_content: DashMap<Uuid, ExerciseRef>,
}

impl StaticExerciseResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the review exercise for its content id
    pub fn register(&self, exercise: ExerciseRef) {
        self.by_content.insert(exercise.content_id, exercise);
    }

    pub fn len(&self) -> usize {
        self.by_content.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_content.is_empty()
    }
}

#[async_trait]
impl ExerciseResolver for StaticExerciseResolver {
    async fn resolve(&self, item: &WeakItem) -> Result<Option<ExerciseRef>, StoreError> {
        Ok(self.by_content.get(&item.item_id).map(|e| e.clone()))
    }
}
