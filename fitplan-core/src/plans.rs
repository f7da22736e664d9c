//! Shared workout plan documents.

use automerge::AutoCommit;
use std::sync::Arc;
use uuid::Uuid;

use crate::automerge::{load_or_create, read_plan, write_plan};
use crate::error::RepositoryError;
use crate::models::{PlanUpdate, SharedWorkoutPlan};
use crate::share_id::ShareId;
use crate::storage::{DocKey, DocKind, DocumentStore};

/// Stores each plan as its own document, keyed by plan id.
#[derive(Clone)]
pub struct PlanRepository {
    store: Arc<dyn DocumentStore>,
}

impl PlanRepository {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    async fn load_doc(&self, key: &DocKey) -> Result<AutoCommit, RepositoryError> {
        let bytes = self.store.load(key).await?;
        Ok(load_or_create(bytes.as_deref())?)
    }

    pub async fn get(&self, plan_id: Uuid) -> Result<Option<SharedWorkoutPlan>, RepositoryError> {
        let doc = self.load_doc(&DocKey::plan(plan_id)).await?;
        Ok(read_plan(&doc)?)
    }

    /// Creates or overwrites a plan.
    pub async fn put(&self, plan: &SharedWorkoutPlan) -> Result<(), RepositoryError> {
        let key = DocKey::plan(plan.id);
        let mut doc = self.load_doc(&key).await?;
        write_plan(&mut doc, plan)?;
        self.store.save(&key, &doc.save()).await?;

        tracing::debug!(plan = %plan.id, title = %plan.title, "saved plan");
        Ok(())
    }

    /// Applies a partial update to a stored plan and returns the result.
    pub async fn merge(
        &self,
        plan_id: Uuid,
        update: PlanUpdate,
    ) -> Result<SharedWorkoutPlan, RepositoryError> {
        let key = DocKey::plan(plan_id);
        let mut doc = self.load_doc(&key).await?;
        let mut plan = read_plan(&doc)?.ok_or(RepositoryError::NotFound(plan_id))?;

        plan.apply_update(update);
        write_plan(&mut doc, &plan)?;
        self.store.save(&key, &doc.save()).await?;

        tracing::debug!(plan = %plan_id, "merged plan update");
        Ok(plan)
    }

    /// Deletes a plan. Returns false if it didn't exist.
    pub async fn delete(&self, plan_id: Uuid) -> Result<bool, RepositoryError> {
        Ok(self.store.delete(&DocKey::plan(plan_id)).await?)
    }

    /// All stored plans, sorted by title.
    pub async fn list(&self) -> Result<Vec<SharedWorkoutPlan>, RepositoryError> {
        let mut plans = Vec::new();
        for key in self.store.list(DocKind::Plan).await? {
            let doc = self.load_doc(&key).await?;
            match read_plan(&doc)? {
                Some(plan) => plans.push(plan),
                None => tracing::warn!("Skipping empty plan document {}", key),
            }
        }

        plans.sort_by(|a, b| a.title.cmp(&b.title).then(a.id.cmp(&b.id)));
        Ok(plans)
    }

    pub async fn find_by_share_id(
        &self,
        share_id: &ShareId,
    ) -> Result<Option<SharedWorkoutPlan>, RepositoryError> {
        Ok(self
            .list()
            .await?
            .into_iter()
            .find(|plan| &plan.share_id == share_id))
    }
}

impl std::fmt::Debug for PlanRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlanRepository").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DailyWorkout, Difficulty, Visibility, WeekdayIndex};
    use crate::storage::MemoryStore;
    use pretty_assertions::assert_eq;

    fn repo() -> PlanRepository {
        PlanRepository::new(Arc::new(MemoryStore::new()))
    }

    fn day(i: u8) -> WeekdayIndex {
        WeekdayIndex::new(i).unwrap()
    }

    fn sample_plan(title: &str) -> SharedWorkoutPlan {
        SharedWorkoutPlan::new(title, "coach")
            .with_difficulty(Difficulty::Intermediate)
            .with_workout(day(0), DailyWorkout::new("Push"))
            .with_workout(day(2), DailyWorkout::new("Pull"))
    }

    #[tokio::test]
    async fn test_put_and_get() {
        let repo = repo();
        let plan = sample_plan("PPL");
        repo.put(&plan).await.unwrap();

        let loaded = repo.get(plan.id).await.unwrap().unwrap();
        assert_eq!(loaded.title, "PPL");
        assert_eq!(loaded.share_id, plan.share_id);
        assert_eq!(loaded.schedule, plan.schedule);
        assert!(repo.get(Uuid::new_v4()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_merge_partial_update() {
        let repo = repo();
        let plan = sample_plan("PPL");
        repo.put(&plan).await.unwrap();

        let mut update = PlanUpdate::visibility(Visibility::Public);
        update.clear.push(day(2));
        update.workouts.insert(day(4), DailyWorkout::new("Legs"));
        let merged = repo.merge(plan.id, update).await.unwrap();

        assert_eq!(merged.visibility, Visibility::Public);
        assert_eq!(merged.title, "PPL");
        assert_eq!(
            merged.schedule.keys().copied().collect::<Vec<_>>(),
            vec![day(0), day(4)]
        );
        assert!(merged.updated_at >= plan.updated_at);
        assert_eq!(repo.get(plan.id).await.unwrap().unwrap(), merged);
    }

    #[tokio::test]
    async fn test_merge_missing_plan() {
        let repo = repo();
        let missing = Uuid::new_v4();
        let result = repo.merge(missing, PlanUpdate::default()).await;
        assert!(matches!(result, Err(RepositoryError::NotFound(id)) if id == missing));
    }

    #[tokio::test]
    async fn test_list_sorted_by_title() {
        let repo = repo();
        for title in ["Upper/Lower", "Full Body", "PPL"] {
            repo.put(&sample_plan(title)).await.unwrap();
        }

        let titles: Vec<_> = repo
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.title)
            .collect();
        assert_eq!(titles, vec!["Full Body", "PPL", "Upper/Lower"]);
    }

    #[tokio::test]
    async fn test_find_by_share_id() {
        let repo = repo();
        let plan = sample_plan("PPL");
        repo.put(&sample_plan("Other")).await.unwrap();
        repo.put(&plan).await.unwrap();

        let found = repo.find_by_share_id(&plan.share_id).await.unwrap();
        assert_eq!(found.map(|p| p.id), Some(plan.id));
        assert!(repo
            .find_by_share_id(&ShareId::new())
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_delete() {
        let repo = repo();
        let plan = sample_plan("PPL");
        repo.put(&plan).await.unwrap();

        assert!(repo.delete(plan.id).await.unwrap());
        assert!(!repo.delete(plan.id).await.unwrap());
        assert!(repo.list().await.unwrap().is_empty());
    }
}
