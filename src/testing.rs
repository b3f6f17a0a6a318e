//! In-memory collaborators shared by unit tests.

use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use crate::api::{ListEnvelope, ListingService, MutationOp, MutationReply, MutationService};
use crate::error::ListError;
use crate::filters::FilterCriteria;
use crate::paging::PageRequest;

/// Paginates a fixed dataset the way the dashboard does: filters are applied
/// server-side by exact match on the row field of the same name.
#[derive(Default)]
pub struct MemoryListing {
    rows: Vec<Value>,
    calls: AtomicUsize,
    failure: Mutex<Option<ListError>>,
    delays: Mutex<HashMap<u32, Duration>>,
    mutations: Mutex<Vec<(String, MutationOp, Value)>>,
    reject_mutations: Mutex<Option<String>>,
}

impl MemoryListing {
    pub fn new(rows: Vec<Value>) -> Self {
        Self {
            rows,
            ..Default::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Every following call fails with `err` until cleared.
    pub fn fail_with(&self, err: Option<ListError>) {
        *self.failure.lock().unwrap() = err;
    }

    /// Delay replies for one page number.
    pub fn delay_page(&self, page: u32, delay: Duration) {
        self.delays.lock().unwrap().insert(page, delay);
    }

    pub fn reject_mutations(&self, message: Option<&str>) {
        *self.reject_mutations.lock().unwrap() = message.map(str::to_string);
    }

    pub fn mutations(&self) -> Vec<(String, MutationOp, Value)> {
        self.mutations.lock().unwrap().clone()
    }

    fn matches(row: &Value, criteria: &FilterCriteria) -> bool {
        criteria.iter().all(|(field, value)| match row.get(field) {
            Some(Value::String(s)) => *s == value.to_query_value(),
            Some(Value::Number(n)) => n.to_string() == value.to_query_value(),
            // Fields the rows do not carry (dates, status) are not filtered here.
            _ => true,
        })
    }
}

impl ListingService for MemoryListing {
    async fn list_page(
        &self,
        _resource: &str,
        criteria: &FilterCriteria,
        request: PageRequest,
    ) -> Result<ListEnvelope, ListError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let delay = self.delays.lock().unwrap().get(&request.page).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        let failure = self.failure.lock().unwrap().clone();
        if let Some(err) = failure {
            return Err(err);
        }

        let matching: Vec<Value> = self
            .rows
            .iter()
            .filter(|row| Self::matches(row, criteria))
            .cloned()
            .collect();
        let total = matching.len() as u64;
        let items = matching
            .into_iter()
            .skip(request.offset() as usize)
            .take(request.page_size as usize)
            .collect();
        Ok(ListEnvelope::new(items, total))
    }
}

impl MutationService for MemoryListing {
    async fn mutate(
        &self,
        resource: &str,
        op: MutationOp,
        payload: &Value,
    ) -> Result<MutationReply, ListError> {
        let rejection = self.reject_mutations.lock().unwrap().clone();
        if let Some(message) = rejection {
            return Err(ListError::Server(message));
        }
        self.mutations
            .lock()
            .unwrap()
            .push((resource.to_string(), op, payload.clone()));
        Ok(MutationReply {
            message: Some("ok".into()),
            data: Value::Null,
        })
    }
}
