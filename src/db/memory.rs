//! In-memory case store.

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use std::collections::HashMap;
use uuid::Uuid;

use super::{CaseStore, StoreError};
use crate::case::model::{Case, CasePatch, CaseStatus, NewCase};

#[derive(Default)]
struct Inner {
    cases: HashMap<Uuid, Case>,
    /// Highest case number ever issued, kept across deletions.
    last_case_number: i64,
}

#[derive(Default)]
pub struct InMemoryCaseStore {
    inner: RwLock<Inner>,
}

impl InMemoryCaseStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store with existing records, e.g. in tests.
    pub fn with_cases(cases: impl IntoIterator<Item = Case>) -> Self {
        let store = Self::new();
        {
            let mut inner = store.inner.write();
            for case in cases {
                inner.last_case_number = inner.last_case_number.max(case.case_number);
                inner.cases.insert(case.id, case);
            }
        }
        store
    }
}

#[async_trait]
impl CaseStore for InMemoryCaseStore {
    async fn list(&self) -> Result<Vec<Case>, StoreError> {
        let inner = self.inner.read();
        let mut cases: Vec<Case> = inner.cases.values().cloned().collect();
        cases.sort_by(|a, b| {
            b.intake_at
                .cmp(&a.intake_at)
                .then(b.case_number.cmp(&a.case_number))
        });
        Ok(cases)
    }

    async fn get_by_id(&self, id: &Uuid) -> Result<Option<Case>, StoreError> {
        Ok(self.inner.read().cases.get(id).cloned())
    }

    async fn create(&self, new_case: NewCase) -> Result<Case, StoreError> {
        let mut inner = self.inner.write();
        let highest_existing = inner.cases.values().map(|c| c.case_number).max().unwrap_or(0);
        let case_number = highest_existing.max(inner.last_case_number) + 1;
        let now = Utc::now();

        let case = Case {
            id: Uuid::new_v4(),
            case_number,
            reference: new_case.reference,
            client_name: new_case.client_name,
            client_tax_id: new_case.client_tax_id,
            phone: new_case.phone,
            notes: new_case.notes,
            intake_at: now,
            delivered_at: None,
            status: CaseStatus::Pending,
            status_changed_at: now,
            resolution_note: None,
            process_note: None,
        };

        inner.last_case_number = case_number;
        inner.cases.insert(case.id, case.clone());
        Ok(case)
    }

    async fn update(&self, id: &Uuid, patch: CasePatch) -> Result<Option<Case>, StoreError> {
        let mut inner = self.inner.write();
        Ok(inner.cases.get_mut(id).map(|case| {
            patch.apply_to(case);
            case.clone()
        }))
    }

    async fn delete(&self, id: &Uuid) -> Result<bool, StoreError> {
        Ok(self.inner.write().cases.remove(id).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_case(reference: &str) -> NewCase {
        NewCase {
            reference: reference.to_string(),
            client_name: "Ana Ruiz".to_string(),
            client_tax_id: "123".to_string(),
            phone: "3000000000".to_string(),
            notes: None,
        }
    }

    #[tokio::test]
    async fn test_first_case_is_number_one() {
        let store = InMemoryCaseStore::new();
        let case = store.create(new_case("HP M404dn")).await.unwrap();
        assert_eq!(case.case_number, 1);
        assert_eq!(case.status, CaseStatus::Pending);
        assert_eq!(case.intake_at, case.status_changed_at);
    }

    #[tokio::test]
    async fn test_deleting_newest_does_not_reuse_number() {
        let store = InMemoryCaseStore::new();
        store.create(new_case("a")).await.unwrap();
        let second = store.create(new_case("b")).await.unwrap();
        assert!(store.delete(&second.id).await.unwrap());

        let third = store.create(new_case("c")).await.unwrap();
        assert_eq!(third.case_number, 3);
    }

    #[tokio::test]
    async fn test_numbering_continues_after_seeded_cases() {
        let store = InMemoryCaseStore::new();
        let seeded = store.create(new_case("seed")).await.unwrap();
        let store = InMemoryCaseStore::with_cases(vec![Case {
            case_number: 41,
            ..seeded
        }]);
        let next = store.create(new_case("next")).await.unwrap();
        assert_eq!(next.case_number, 42);
    }

    #[tokio::test]
    async fn test_update_unknown_returns_none() {
        let store = InMemoryCaseStore::new();
        let result = store
            .update(&Uuid::new_v4(), CasePatch::default())
            .await
            .unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_delete_is_false_when_absent() {
        let store = InMemoryCaseStore::new();
        assert!(!store.delete(&Uuid::new_v4()).await.unwrap());
    }

    #[tokio::test]
    async fn test_list_newest_first() {
        let store = InMemoryCaseStore::new();
        store.create(new_case("first")).await.unwrap();
        store.create(new_case("second")).await.unwrap();

        let listed = store.list().await.unwrap();
        assert_eq!(listed[0].reference, "second");
        assert_eq!(listed[1].reference, "first");
    }
}
