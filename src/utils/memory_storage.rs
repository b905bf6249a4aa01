//! In-memory storage implementation for testing

use async_trait::async_trait;
use bigdecimal::BigDecimal;
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::traits::*;
use crate::types::*;

#[derive(Debug, Clone, Default)]
struct LineTable {
    lines: HashMap<String, (u64, MoveLine)>,
    next_seq: u64,
}

impl LineTable {
    fn insert(&mut self, line: MoveLine) {
        let seq = match self.lines.get(&line.id) {
            Some((seq, _)) => *seq,
            None => {
                self.next_seq += 1;
                self.next_seq
            }
        };
        self.lines.insert(line.id.clone(), (seq, line));
    }

    fn move_balance(&self, move_id: &str) -> BigDecimal {
        self.lines
            .values()
            .filter(|(_, line)| line.move_id == move_id)
            .map(|(_, line)| &line.balance)
            .sum()
    }
}

/// In-memory storage implementation for testing and development
#[derive(Debug, Clone)]
pub struct MemoryStorage {
    table: Arc<RwLock<LineTable>>,
    snapshot: Arc<RwLock<Option<LineTable>>>,
}

impl MemoryStorage {
    /// Create a new memory storage instance
    pub fn new() -> Self {
        Self {
            table: Arc::new(RwLock::new(LineTable::default())),
            snapshot: Arc::new(RwLock::new(None)),
        }
    }

    /// Clear all data (useful for testing)
    pub fn clear(&self) -> EditResult<()> {
        *self.write()? = LineTable::default();
        *self
            .snapshot
            .write()
            .map_err(|_| poisoned("snapshot"))? = None;
        Ok(())
    }

    /// Sum of debit - credit over all lines of an entry
    pub fn move_balance(&self, move_id: &str) -> EditResult<BigDecimal> {
        Ok(self.read()?.move_balance(move_id))
    }

    /// Number of stored lines
    pub fn len(&self) -> EditResult<usize> {
        Ok(self.read()?.lines.len())
    }

    /// Whether the storage holds no lines
    pub fn is_empty(&self) -> EditResult<bool> {
        Ok(self.len()? == 0)
    }

    fn read(&self) -> EditResult<RwLockReadGuard<'_, LineTable>> {
        self.table.read().map_err(|_| poisoned("move line table"))
    }

    fn write(&self) -> EditResult<RwLockWriteGuard<'_, LineTable>> {
        self.table.write().map_err(|_| poisoned("move line table"))
    }
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

fn poisoned(what: &str) -> EditError {
    EditError::Storage(format!("{what} lock poisoned"))
}

#[async_trait]
impl MoveLineStorage for MemoryStorage {
    async fn save_line(&mut self, line: &MoveLine) -> EditResult<()> {
        self.write()?.insert(line.clone());
        Ok(())
    }

    async fn get_line(&self, line_id: &str) -> EditResult<Option<MoveLine>> {
        Ok(self
            .read()?
            .lines
            .get(line_id)
            .map(|(_, line)| line.clone()))
    }

    async fn search_lines(&self, line_ids: &[String]) -> EditResult<Vec<MoveLine>> {
        let table = self.read()?;
        let mut found: Vec<MoveLine> = Vec::with_capacity(line_ids.len());
        for line_id in line_ids {
            if found.iter().any(|l| &l.id == line_id) {
                continue;
            }
            if let Some((_, line)) = table.lines.get(line_id) {
                found.push(line.clone());
            }
        }
        Ok(found)
    }

    async fn list_move_lines(&self, move_id: &str) -> EditResult<Vec<MoveLine>> {
        let table = self.read()?;
        let mut lines: Vec<&(u64, MoveLine)> = table
            .lines
            .values()
            .filter(|(_, line)| line.move_id == move_id)
            .collect();
        lines.sort_by_key(|(seq, _)| *seq);
        Ok(lines.into_iter().map(|(_, line)| line.clone()).collect())
    }

    async fn create_line(
        &mut self,
        values: &MoveLineValues,
        check_move_validity: bool,
    ) -> EditResult<MoveLine> {
        let line = values
            .clone()
            .into_move_line(uuid::Uuid::new_v4().to_string());
        let mut table = self.write()?;
        table.insert(line.clone());

        if check_move_validity {
            let balance = table.move_balance(&line.move_id);
            if balance != BigDecimal::from(0) {
                table.lines.remove(&line.id);
                return Err(EditError::UnbalancedMove {
                    move_id: line.move_id,
                    balance,
                });
            }
        }

        Ok(line)
    }

    async fn update_line(&mut self, line: &MoveLine) -> EditResult<()> {
        let mut table = self.write()?;
        if !table.lines.contains_key(&line.id) {
            return Err(EditError::MoveLineNotFound(line.id.clone()));
        }
        let mut updated = line.clone();
        updated.updated_at = chrono::Utc::now().naive_utc();
        table.insert(updated);
        Ok(())
    }

    async fn unlink_lines(&mut self, line_ids: &[String], force: bool) -> EditResult<()> {
        let mut table = self.write()?;

        // Check everything first so a refused delete removes nothing
        for line_id in line_ids {
            match table.lines.get(line_id) {
                None => return Err(EditError::MoveLineNotFound(line_id.clone())),
                Some((_, line)) if line.posted && !force => {
                    return Err(EditError::LockedLine(line_id.clone()))
                }
                Some(_) => {}
            }
        }

        for line_id in line_ids {
            table.lines.remove(line_id);
        }
        Ok(())
    }
}

#[async_trait]
impl UnitOfWork for MemoryStorage {
    async fn begin(&mut self) -> EditResult<()> {
        let current = self.read()?.clone();
        let mut snapshot = self.snapshot.write().map_err(|_| poisoned("snapshot"))?;
        if snapshot.is_some() {
            return Err(EditError::Storage(
                "a unit of work is already open".to_string(),
            ));
        }
        *snapshot = Some(current);
        Ok(())
    }

    async fn commit(&mut self) -> EditResult<()> {
        let mut snapshot = self.snapshot.write().map_err(|_| poisoned("snapshot"))?;
        snapshot
            .take()
            .map(|_| ())
            .ok_or_else(|| EditError::Storage("no unit of work open".to_string()))
    }

    async fn rollback(&mut self) -> EditResult<()> {
        let saved = self
            .snapshot
            .write()
            .map_err(|_| poisoned("snapshot"))?
            .take()
            .ok_or_else(|| EditError::Storage("no unit of work open".to_string()))?;
        *self.write()? = saved;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn line(id: &str, debit: i64, credit: i64) -> MoveLine {
        let mut line = MoveLine::new(id.into(), "m1".into(), "a1".into(), "j1".into());
        line.debit = BigDecimal::from(debit);
        line.credit = BigDecimal::from(credit);
        line.refresh_balance();
        line
    }

    #[tokio::test]
    async fn test_search_keeps_requested_order() {
        let mut storage = MemoryStorage::new();
        storage.save_line(&line("l1", 10, 0)).await.unwrap();
        storage.save_line(&line("l2", 0, 10)).await.unwrap();

        let ids = vec!["l2".to_string(), "missing".to_string(), "l1".to_string()];
        let found = storage.search_lines(&ids).await.unwrap();
        let found_ids: Vec<&str> = found.iter().map(|l| l.id.as_str()).collect();
        assert_eq!(found_ids, vec!["l2", "l1"]);
    }

    #[tokio::test]
    async fn test_create_checks_move_validity_when_asked() {
        let mut storage = MemoryStorage::new();
        let source = line("l1", 10, 0);
        storage.save_line(&source).await.unwrap();
        storage.save_line(&line("l2", 0, 10)).await.unwrap();

        let due = NaiveDate::from_ymd_opt(2024, 1, 1);
        let values = MoveLineValues::on_side(&source, EntrySide::Debit, BigDecimal::from(5), due);

        let err = storage.create_line(&values, true).await.unwrap_err();
        assert!(matches!(err, EditError::UnbalancedMove { .. }));
        assert_eq!(storage.len().unwrap(), 2);

        let created = storage.create_line(&values, false).await.unwrap();
        assert_eq!(storage.len().unwrap(), 3);
        assert_eq!(storage.move_balance("m1").unwrap(), BigDecimal::from(5));
        assert!(!created.id.is_empty());
    }

    #[tokio::test]
    async fn test_unlink_respects_posted_guard() {
        let mut storage = MemoryStorage::new();
        let mut posted = line("l1", 10, 0);
        posted.posted = true;
        storage.save_line(&posted).await.unwrap();
        storage.save_line(&line("l2", 0, 10)).await.unwrap();

        let ids = vec!["l2".to_string(), "l1".to_string()];
        assert!(matches!(
            storage.unlink_lines(&ids, false).await,
            Err(EditError::LockedLine(ref id)) if id == "l1"
        ));
        assert_eq!(storage.len().unwrap(), 2);

        storage.unlink_lines(&ids, true).await.unwrap();
        assert!(storage.is_empty().unwrap());
    }

    #[tokio::test]
    async fn test_rollback_restores_snapshot() {
        let mut storage = MemoryStorage::new();
        storage.save_line(&line("l1", 10, 0)).await.unwrap();

        storage.begin().await.unwrap();
        storage.save_line(&line("l2", 0, 10)).await.unwrap();
        storage
            .unlink_lines(&["l1".to_string()], false)
            .await
            .unwrap();
        storage.rollback().await.unwrap();

        assert!(storage.get_line("l1").await.unwrap().is_some());
        assert!(storage.get_line("l2").await.unwrap().is_none());
        assert!(storage.commit().await.is_err());
    }

    #[tokio::test]
    async fn test_list_move_lines_in_insertion_order() {
        let mut storage = MemoryStorage::new();
        for id in ["c", "a", "b"] {
            storage.save_line(&line(id, 1, 0)).await.unwrap();
        }
        let lines = storage.list_move_lines("m1").await.unwrap();
        let ids: Vec<&str> = lines.iter().map(|l| l.id.as_str()).collect();
        assert_eq!(ids, vec!["c", "a", "b"]);
    }
}
