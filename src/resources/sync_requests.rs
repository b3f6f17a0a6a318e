//! Sync requests screen (`requisicoes_sync`).
//!
//! Shows the branch sync jobs queued on the dashboard. Failed jobs can be
//! retried (reset to pending) or deleted; both go through the mutation
//! endpoint and re-fetch the page afterwards.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::opt_display;
use crate::api::{MutationOp, MutationService};
use crate::controller::{FetchTicket, ListController};
use crate::error::ListError;
use crate::filters::FilterCriteria;
use crate::render::{Column, Identified, RowActionKind};
use crate::wire::{lenient_opt_i64, lenient_u64, RecordId};

pub const RESOURCE: &str = "requisicoes_sync";
pub const ROW_ACTIONS: &[RowActionKind] = &[
    RowActionKind::ViewDetail,
    RowActionKind::Retry,
    RowActionKind::Delete,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncStatus {
    Pendente,
    Processando,
    Concluido,
    Erro,
    #[serde(other)]
    Desconhecido,
}

impl SyncStatus {
    pub fn label(&self) -> &'static str {
        match self {
            SyncStatus::Pendente => "Pendente",
            SyncStatus::Processando => "Processando",
            SyncStatus::Concluido => "Concluído",
            SyncStatus::Erro => "Erro",
            SyncStatus::Desconhecido => "Desconhecido",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SyncStatus::Pendente => "pendente",
            SyncStatus::Processando => "processando",
            SyncStatus::Concluido => "concluido",
            SyncStatus::Erro => "erro",
            SyncStatus::Desconhecido => "desconhecido",
        }
    }

    /// Only finished or failed jobs may be retried.
    pub fn is_retryable(&self) -> bool {
        matches!(self, SyncStatus::Erro | SyncStatus::Concluido)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncRequest {
    pub id: RecordId,
    #[serde(rename = "filial", default, deserialize_with = "lenient_opt_i64")]
    pub branch_id: Option<i64>,
    #[serde(rename = "caixa", default, deserialize_with = "lenient_opt_i64")]
    pub register_id: Option<i64>,
    #[serde(rename = "tipo", default)]
    pub kind: String,
    pub status: SyncStatus,
    #[serde(rename = "tentativas", default, deserialize_with = "lenient_u64")]
    pub attempts: u64,
    #[serde(rename = "criado_em", default)]
    pub created_at: Option<String>,
    #[serde(rename = "mensagem", default)]
    pub message: Option<String>,
}

impl Identified for SyncRequest {
    fn record_id(&self) -> RecordId {
        self.id.clone()
    }
}

pub fn controller(page_size: u32) -> ListController<SyncRequest> {
    ListController::new(RESOURCE, FilterCriteria::new(), page_size)
}

pub fn columns() -> Vec<Column<SyncRequest>> {
    vec![
        Column::new("ID", |r: &SyncRequest| r.id.to_string()),
        Column::new("Filial", |r: &SyncRequest| opt_display(r.branch_id)),
        Column::new("Caixa", |r: &SyncRequest| opt_display(r.register_id)),
        Column::new("Tipo", |r: &SyncRequest| r.kind.clone()),
        Column::new("Status", |r: &SyncRequest| r.status.label().to_string()),
        Column::new("Tentativas", |r: &SyncRequest| r.attempts.to_string()),
        Column::new("Criado em", |r: &SyncRequest| opt_display(r.created_at.as_deref())),
        Column::new("Mensagem", |r: &SyncRequest| opt_display(r.message.as_deref())),
    ]
}

pub fn retry_payload(id: &RecordId) -> Value {
    json!({ "id": id, "status": SyncStatus::Pendente.as_str(), "tentativas": 0 })
}

pub fn delete_payload(id: &RecordId) -> Value {
    json!({ "id": id })
}

/// Reset a job to pending. Jobs still pending or running are refused
/// client-side.
pub async fn retry<S: MutationService>(
    ctl: &mut ListController<SyncRequest>,
    service: &S,
    id: &RecordId,
) -> Result<FetchTicket, ListError> {
    if let Some(request) = ctl.items().iter().find(|r| &r.id == id) {
        if !request.status.is_retryable() {
            return Err(ListError::Validation(format!(
                "Sync request {id} is {} and cannot be retried",
                request.status.as_str()
            )));
        }
    }
    ctl.submit_mutation(service, MutationOp::Update, &retry_payload(id))
        .await
}

pub async fn delete<S: MutationService>(
    ctl: &mut ListController<SyncRequest>,
    service: &S,
    id: &RecordId,
) -> Result<FetchTicket, ListError> {
    ctl.submit_mutation(service, MutationOp::Delete, &delete_payload(id))
        .await
}
