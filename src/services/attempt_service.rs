use crate::dto::attempt_dto::SaveAttemptRequest;
use crate::error::Result;
use crate::models::attempt::{AttemptRecord, AttemptResult};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tokio::sync::Mutex;
use uuid::Uuid;

pub const ATTEMPTS_FILE: &str = "attempts.json";

/// Attempt history kept as a JSON array on disk.
#[derive(Clone)]
pub struct AttemptService {
    path: PathBuf,
    write_lock: Arc<Mutex<()>>,
}

impl AttemptService {
    pub fn new(data_dir: impl AsRef<Path>) -> Self {
        Self {
            path: data_dir.as_ref().join(ATTEMPTS_FILE),
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn save_attempt(&self, payload: SaveAttemptRequest) -> Result<AttemptRecord> {
        let record = AttemptRecord {
            id: Uuid::new_v4(),
            result: AttemptResult::from_selection(payload.selected_option, payload.correct_option),
            question: payload.question,
            options: payload.options,
            selected_option: payload.selected_option,
            correct_option: payload.correct_option,
            explanation: payload.explanation.unwrap_or_default(),
            subject: payload.subject,
            recorded_at: crate::utils::time::now(),
        };

        let _guard = self.write_lock.lock().await;
        let mut history = self.read_history().await?;
        history.push(record.clone());

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).await?;
        }
        let body = serde_json::to_vec_pretty(&history)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, body).await?;
        fs::rename(&tmp, &self.path).await?;

        tracing::info!(
            attempt_id = %record.id,
            subject = %record.subject,
            result = record.result.as_str(),
            "Attempt saved"
        );
        Ok(record)
    }

    pub async fn list_attempts(&self) -> Result<Vec<AttemptRecord>> {
        self.read_history().await
    }

    pub async fn list_by_subject(&self, subject: &str) -> Result<Vec<AttemptRecord>> {
        Ok(self
            .read_history()
            .await?
            .into_iter()
            .filter(|a| a.subject == subject)
            .collect())
    }

    async fn read_history(&self) -> Result<Vec<AttemptRecord>> {
        let content = match fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        if content.trim().is_empty() {
            return Ok(Vec::new());
        }

        match serde_json::from_str(&content) {
            Ok(history) => Ok(history),
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "Attempt history unreadable, starting fresh");
                Ok(Vec::new())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::assert_ok;

    fn scratch_dir() -> PathBuf {
        std::env::temp_dir().join(format!("mcq-attempts-{}", Uuid::new_v4()))
    }

    fn attempt(subject: &str, selected: usize, correct: usize) -> SaveAttemptRequest {
        SaveAttemptRequest {
            question: "Which structure is LIFO?".into(),
            options: vec!["Queue".into(), "Stack".into(), "Heap".into(), "Tree".into()],
            selected_option: selected,
            correct_option: correct,
            explanation: Some("A stack is last-in first-out.".into()),
            subject: subject.into(),
        }
    }

    #[tokio::test]
    async fn missing_file_reads_as_empty_history() {
        let svc = AttemptService::new(scratch_dir());
        assert!(svc.list_attempts().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn saves_and_filters_by_subject() {
        let dir = scratch_dir();
        let svc = AttemptService::new(&dir);

        let first = assert_ok!(svc.save_attempt(attempt("Data Structures", 1, 1)).await);
        assert_ok!(svc.save_attempt(attempt("DBMS", 0, 1)).await);
        assert_ok!(svc.save_attempt(attempt("Data Structures", 2, 1)).await);

        assert_eq!(first.result, AttemptResult::Correct);

        let all = svc.list_attempts().await.unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(all[0].id, first.id);

        let ds = svc.list_by_subject("Data Structures").await.unwrap();
        assert_eq!(ds.len(), 2);
        assert_eq!(ds[1].result, AttemptResult::Wrong);

        let _ = fs::remove_dir_all(dir).await;
    }

    #[tokio::test]
    async fn corrupt_file_is_replaced_on_next_save() {
        let dir = scratch_dir();
        fs::create_dir_all(&dir).await.unwrap();
        let svc = AttemptService::new(&dir);
        fs::write(svc.path(), "{ not json").await.unwrap();

        assert!(svc.list_attempts().await.unwrap().is_empty());
        svc.save_attempt(attempt("DBMS", 3, 3)).await.unwrap();
        assert_eq!(svc.list_attempts().await.unwrap().len(), 1);

        let _ = fs::remove_dir_all(dir).await;
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_saves_are_not_lost() {
        let dir = scratch_dir();
        let svc = AttemptService::new(&dir);

        let mut handles = Vec::new();
        for i in 0..10 {
            let svc = svc.clone();
            handles.push(tokio::spawn(async move {
                svc.save_attempt(attempt("Algorithms", i % 4, 0)).await
            }));
        }
        for h in handles {
            h.await.unwrap().unwrap();
        }

        assert_eq!(svc.list_attempts().await.unwrap().len(), 10);
        let _ = fs::remove_dir_all(dir).await;
    }
}
