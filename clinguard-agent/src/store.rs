//! Run persistence

use crate::error::StoreError;
use crate::types::{AgentRun, AgentStep};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use uuid::Uuid;

/// Persistence for runs and their steps
///
/// Store failures never change a run's outcome; the runner logs them and
/// carries on.
#[async_trait]
pub trait RunStore: Send + Sync {
    async fn create_run(&self, run: &AgentRun) -> Result<(), StoreError>;

    async fn append_step(&self, step: &AgentStep) -> Result<(), StoreError>;

    async fn update_run(&self, run: &AgentRun) -> Result<(), StoreError>;
}

/// In-process store for tests and demos
#[derive(Debug, Default)]
pub struct MemoryRunStore {
    runs: Mutex<HashMap<Uuid, AgentRun>>,
    steps: Mutex<Vec<AgentStep>>,
}

impl MemoryRunStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn run(&self, id: Uuid) -> Option<AgentRun> {
        self.runs.lock().get(&id).cloned()
    }

    /// All runs, oldest first
    pub fn runs(&self) -> Vec<AgentRun> {
        let mut runs: Vec<AgentRun> = self.runs.lock().values().cloned().collect();
        runs.sort_by_key(|r| r.started_at);
        runs
    }

    /// Steps of one run ordered by `(iteration, seq)`
    pub fn steps(&self, run_id: Uuid) -> Vec<AgentStep> {
        let mut steps: Vec<AgentStep> = self
            .steps
            .lock()
            .iter()
            .filter(|s| s.run_id == run_id)
            .cloned()
            .collect();
        steps.sort_by_key(AgentStep::position);
        steps
    }
}

#[async_trait]
impl RunStore for MemoryRunStore {
    async fn create_run(&self, run: &AgentRun) -> Result<(), StoreError> {
        self.runs.lock().insert(run.id, run.clone());
        Ok(())
    }

    async fn append_step(&self, step: &AgentStep) -> Result<(), StoreError> {
        if !self.runs.lock().contains_key(&step.run_id) {
            return Err(StoreError::NotFound(step.run_id));
        }
        self.steps.lock().push(step.clone());
        Ok(())
    }

    async fn update_run(&self, run: &AgentRun) -> Result<(), StoreError> {
        let mut runs = self.runs.lock();
        match runs.get_mut(&run.id) {
            Some(existing) => {
                *existing = run.clone();
                Ok(())
            }
            None => Err(StoreError::NotFound(run.id)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{RunStatus, StepKind};

    #[tokio::test]
    async fn test_create_append_update() {
        let store = MemoryRunStore::new();
        let mut run = AgentRun::new(Uuid::new_v4(), "patient_monitor", "check");
        store.create_run(&run).await.unwrap();

        store
            .append_step(&AgentStep::new(run.id, 2, 0, StepKind::Reasoning))
            .await
            .unwrap();
        store
            .append_step(&AgentStep::new(run.id, 1, 1, StepKind::ToolCall))
            .await
            .unwrap();
        store
            .append_step(&AgentStep::new(run.id, 1, 0, StepKind::Reasoning))
            .await
            .unwrap();

        let positions: Vec<_> = store.steps(run.id).iter().map(AgentStep::position).collect();
        assert_eq!(positions, vec![(1, 0), (1, 1), (2, 0)]);

        run.iterations = 2;
        run.finish(RunStatus::Completed, "done");
        store.update_run(&run).await.unwrap();

        let stored = store.run(run.id).unwrap();
        assert_eq!(stored.status, RunStatus::Completed);
        assert_eq!(stored.iterations, 2);
        assert_eq!(store.runs().len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_run_rejected() {
        let store = MemoryRunStore::new();
        let run = AgentRun::new(Uuid::new_v4(), "a", "t");

        assert!(matches!(
            store.update_run(&run).await,
            Err(StoreError::NotFound(id)) if id == run.id
        ));
        assert!(store
            .append_step(&AgentStep::new(run.id, 1, 0, StepKind::Reasoning))
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_concurrent_writers_all_land() {
        let store = std::sync::Arc::new(MemoryRunStore::new());
        let run = AgentRun::new(Uuid::new_v4(), "patient_monitor", "check");
        store.create_run(&run).await.unwrap();

        let mut tasks = tokio::task::JoinSet::new();
        for iteration in 1..=50u32 {
            let store = store.clone();
            let run_id = run.id;
            tasks.spawn(async move {
                store
                    .append_step(&AgentStep::new(run_id, iteration, 0, StepKind::Reasoning))
                    .await
            });
        }
        while let Some(joined) = tasks.join_next().await {
            joined.unwrap().unwrap();
        }

        let steps = store.steps(run.id);
        assert_eq!(steps.len(), 50);
        assert_eq!(steps.first().map(AgentStep::position), Some((1, 0)));
        assert_eq!(steps.last().map(AgentStep::position), Some((50, 0)));
    }
}
