//! Single-record enrichment pipeline.
//!
//! prompt → completion → parse → category re-score → summaries → embeddings →
//! upsert keyed by `uid`. Every failure is caught once, at the boundary of
//! [`EnrichmentPipeline::enrich`], and reported in the outcome.

use std::fmt;
use std::sync::Arc;

use licensee_llm::LanguageModel;
use licensee_shared::{AppConfig, LicenseeInput, Result, normalize_website};
use licensee_storage::{RecordStore, ROW_ID_COLUMN, row_id};
use serde::Serialize;
use tracing::{info, instrument, warn};

use crate::embedding::generate_embeddings;
use crate::fields::EnrichmentFields;
use crate::prompt::build_prompt;
use crate::record::PersistedRecord;
use crate::response::parse_response;
use crate::scoring::CategoryMatcher;
use crate::summary::SummarySet;

/// Key column for upserts.
const UID_COLUMN: &str = "uid";

/// Per-run settings for the pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineOptions {
    /// Destination table.
    pub table: String,
    /// Completion sampling temperature.
    pub temperature: f32,
    /// Completion output cap.
    pub max_output_tokens: u32,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            table: "licensees".into(),
            temperature: 0.7,
            max_output_tokens: 500,
        }
    }
}

impl From<&AppConfig> for PipelineOptions {
    fn from(config: &AppConfig) -> Self {
        Self {
            table: config.store.table.clone(),
            temperature: config.openai.temperature,
            max_output_tokens: config.openai.max_output_tokens,
        }
    }
}

/// What the upsert did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpsertAction {
    /// An existing row was updated through its backend id.
    UpdatedById(String),
    /// An existing row without an id was updated through its uid.
    UpdatedByUid(String),
    /// A new row was inserted.
    Inserted(String),
}

impl fmt::Display for UpsertAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UpdatedById(id) => write!(f, "Updated existing record with ID: {id}"),
            Self::UpdatedByUid(uid) => write!(f, "Updated existing record with UID: {uid}"),
            Self::Inserted(uid) => write!(f, "Added new record with UID: {uid}"),
        }
    }
}

/// Result of enriching one licensee.
#[derive(Debug, Clone, Serialize)]
pub struct EnrichmentOutcome {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record: Option<PersistedRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<EnrichmentFields>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summaries: Option<SummarySet>,
}

impl EnrichmentOutcome {
    fn failed(message: String) -> Self {
        Self {
            success: false,
            message,
            record: None,
            fields: None,
            summaries: None,
        }
    }
}

struct Enriched {
    record: PersistedRecord,
    fields: EnrichmentFields,
    action: UpsertAction,
}

/// Enriches licensee submissions and upserts them into a [`RecordStore`].
pub struct EnrichmentPipeline {
    model: Arc<dyn LanguageModel>,
    store: Arc<dyn RecordStore>,
    options: PipelineOptions,
}

impl EnrichmentPipeline {
    pub fn new(
        model: Arc<dyn LanguageModel>,
        store: Arc<dyn RecordStore>,
        options: PipelineOptions,
    ) -> Self {
        Self {
            model,
            store,
            options,
        }
    }

    pub fn options(&self) -> &PipelineOptions {
        &self.options
    }

    /// Enrich `input` and upsert the result. Never returns an error; failures
    /// come back as `success: false` with the error text as the message.
    pub async fn enrich(&self, input: LicenseeInput, taxonomy: &[String]) -> EnrichmentOutcome {
        self.enrich_with(input, &CategoryMatcher::new(taxonomy)).await
    }

    /// [`enrich`](Self::enrich) with category patterns compiled ahead of time.
    #[instrument(skip_all, fields(uid = %input.uid, brand = %input.brand_name))]
    pub async fn enrich_with(
        &self,
        input: LicenseeInput,
        categories: &CategoryMatcher,
    ) -> EnrichmentOutcome {
        match self.try_enrich(&input, categories).await {
            Ok(Enriched {
                record,
                fields,
                action,
            }) => {
                let message = action.to_string();
                info!(%message, "licensee enriched");
                EnrichmentOutcome {
                    success: true,
                    message,
                    summaries: Some(record.summaries.clone()),
                    record: Some(record),
                    fields: Some(fields),
                }
            }
            Err(e) => {
                warn!(error = %e, "enrichment failed");
                EnrichmentOutcome::failed(e.to_string())
            }
        }
    }

    async fn try_enrich(
        &self,
        input: &LicenseeInput,
        categories: &CategoryMatcher,
    ) -> Result<Enriched> {
        let website = normalize_website(&input.website);
        let prompt = build_prompt(&website, &input.brand_name);

        let raw = self
            .model
            .complete(
                &prompt,
                self.options.temperature,
                self.options.max_output_tokens,
            )
            .await?;

        let mut fields = parse_response(&raw);
        categories.apply(&mut fields);

        let summaries = SummarySet::generate(&fields, &input.brand_name);
        let embeddings = generate_embeddings(self.model.as_ref(), &summaries).await;

        let record = PersistedRecord::build(input, &fields, summaries, embeddings);
        let action = self.upsert(&record).await?;

        Ok(Enriched {
            record,
            fields,
            action,
        })
    }

    /// Update the row with the same uid if one exists, otherwise insert.
    #[instrument(skip_all, fields(uid = %record.uid, table = %self.options.table))]
    async fn upsert(&self, record: &PersistedRecord) -> Result<UpsertAction> {
        let table = self.options.table.as_str();
        let row = record.to_row()?;

        let existing = self
            .store
            .find_by_key(table, UID_COLUMN, &record.uid)
            .await?;

        match existing {
            Some(found) => match row_id(&found) {
                Some(id) => {
                    self.store.update(table, ROW_ID_COLUMN, &id, &row).await?;
                    Ok(UpsertAction::UpdatedById(id))
                }
                None => {
                    self.store
                        .update(table, UID_COLUMN, &record.uid, &row)
                        .await?;
                    Ok(UpsertAction::UpdatedByUid(record.uid.clone()))
                }
            },
            None => {
                self.store.insert(table, &row).await?;
                Ok(UpsertAction::Inserted(record.uid.clone()))
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::fields::{PRIMARY_CATEGORY, SECONDARY_CATEGORY};
    use async_trait::async_trait;
    use licensee_shared::LicenseeError;
    use licensee_storage::{LocalStore, StoredRow};
    use serde_json::Value;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use uuid::Uuid;

    pub(crate) const COMPLETION: &str = include_str!("../../../../fixtures/llm/completion.txt");

    /// Scripted model: fixed completion, embeddings fail when the text contains `fail_embed_on`.
    pub(crate) struct FakeModel {
        pub completion: std::result::Result<String, String>,
        pub fail_embed_on: Option<&'static str>,
        pub prompts: Mutex<Vec<String>>,
        pub embed_calls: AtomicUsize,
    }

    impl FakeModel {
        pub fn replying(text: &str) -> Self {
            Self {
                completion: Ok(text.to_string()),
                fail_embed_on: None,
                prompts: Mutex::new(Vec::new()),
                embed_calls: AtomicUsize::new(0),
            }
        }

        pub fn failing(message: &str) -> Self {
            Self {
                completion: Err(message.to_string()),
                ..Self::replying("")
            }
        }
    }

    #[async_trait]
    impl LanguageModel for FakeModel {
        async fn complete(&self, prompt: &str, _t: f32, _max: u32) -> Result<String> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            self.completion.clone().map_err(LicenseeError::Model)
        }

        async fn embed(&self, text: &str) -> Result<Vec<f32>> {
            self.embed_calls.fetch_add(1, Ordering::SeqCst);
            match self.fail_embed_on {
                Some(needle) if text.contains(needle) => {
                    Err(LicenseeError::Model("embedding quota exceeded".into()))
                }
                _ => Ok(vec![0.25; 4]),
            }
        }
    }

    /// In-memory store. `with_ids: false` mimics a table without an id column.
    #[derive(Default)]
    pub(crate) struct MemoryStore {
        pub rows: Mutex<Vec<StoredRow>>,
        pub with_ids: bool,
        pub fail_writes: Option<&'static str>,
        pub writes: AtomicUsize,
    }

    impl MemoryStore {
        pub fn new() -> Self {
            Self {
                with_ids: true,
                ..Default::default()
            }
        }

        fn matches(row: &StoredRow, key: &str, value: &str) -> bool {
            match row.get(key) {
                Some(Value::String(s)) => s == value,
                Some(other) => other.to_string() == value,
                None => false,
            }
        }
    }

    #[async_trait]
    impl RecordStore for MemoryStore {
        async fn find_by_key(&self, _table: &str, key: &str, value: &str) -> Result<Option<StoredRow>> {
            let rows = self.rows.lock().unwrap();
            Ok(rows.iter().find(|r| Self::matches(r, key, value)).cloned())
        }

        async fn insert(&self, _table: &str, row: &StoredRow) -> Result<StoredRow> {
            self.writes.fetch_add(1, Ordering::SeqCst);
            if let Some(message) = self.fail_writes {
                return Err(LicenseeError::Store(message.into()));
            }
            let mut rows = self.rows.lock().unwrap();
            let mut stored = row.clone();
            if self.with_ids {
                stored.insert(ROW_ID_COLUMN.into(), Value::from(rows.len() as i64 + 1));
            }
            rows.push(stored.clone());
            Ok(stored)
        }

        async fn update(&self, _table: &str, key: &str, value: &str, row: &StoredRow) -> Result<StoredRow> {
            self.writes.fetch_add(1, Ordering::SeqCst);
            if let Some(message) = self.fail_writes {
                return Err(LicenseeError::Store(message.into()));
            }
            let mut rows = self.rows.lock().unwrap();
            let existing = rows
                .iter_mut()
                .find(|r| Self::matches(r, key, value))
                .ok_or_else(|| LicenseeError::Store("no match".into()))?;
            for (column, val) in row {
                existing.insert(column.clone(), val.clone());
            }
            Ok(existing.clone())
        }
    }

    pub(crate) fn input(uid: &str, website: &str) -> LicenseeInput {
        LicenseeInput {
            uid: uid.into(),
            brand_name: "Stride".into(),
            contact: Some("Jane Doe".into()),
            email: None,
            website: website.into(),
            headquarters: None,
        }
    }

    fn taxonomy() -> Vec<String> {
        crate::taxonomy::default_taxonomy()
    }

    fn pipeline(model: Arc<FakeModel>, store: Arc<dyn RecordStore>) -> EnrichmentPipeline {
        EnrichmentPipeline::new(model, store, PipelineOptions::default())
    }

    #[tokio::test]
    async fn new_uid_is_inserted() {
        let model = Arc::new(FakeModel::replying(COMPLETION));
        let store = Arc::new(MemoryStore::new());
        let outcome = pipeline(model.clone(), store.clone())
            .enrich(input("lic-001", "stride.example"), &taxonomy())
            .await;

        assert!(outcome.success, "{}", outcome.message);
        assert_eq!(outcome.message, "Added new record with UID: lic-001");
        assert_eq!(store.rows.lock().unwrap().len(), 1);

        let record = outcome.record.unwrap();
        assert_eq!(record.website, "https://stride.example");
        assert_eq!(record.embeddings.present(), 6);
        assert_eq!(model.embed_calls.load(Ordering::SeqCst), 6);
        assert!(model.prompts.lock().unwrap()[0].contains("Brand website: https://stride.example"));
        assert!(outcome.summaries.is_some());
    }

    #[tokio::test]
    async fn keyword_scores_override_model_categories() {
        let model = Arc::new(FakeModel::replying(COMPLETION));
        let outcome = pipeline(model, Arc::new(MemoryStore::new()))
            .enrich(input("lic-001", "stride.example"), &taxonomy())
            .await;

        // baseball caps, backpacks and footwear each appear once; taxonomy order breaks the tie

        let fields = outcome.fields.unwrap();
        assert_eq!(fields.get(PRIMARY_CATEGORY), Some("Baseball Caps"));
        assert_eq!(fields.get(SECONDARY_CATEGORY), Some("Backpacks"));
        assert_eq!(outcome.record.unwrap().primary_licensing_category, "Baseball Caps");
    }

    #[tokio::test]
    async fn shared_matcher_serves_every_record() {
        let model = Arc::new(FakeModel::replying(COMPLETION));
        let store = Arc::new(MemoryStore::new());
        let pipeline = pipeline(model, store.clone());
        let categories = CategoryMatcher::new(&taxonomy());

        for uid in ["lic-001", "lic-002"] {
            let outcome = pipeline
                .enrich_with(input(uid, "stride.example"), &categories)
                .await;
            assert!(outcome.success, "{}", outcome.message);
            let fields = outcome.fields.unwrap();
            assert_eq!(fields.get(PRIMARY_CATEGORY), Some("Baseball Caps"));
            assert_eq!(fields.get(SECONDARY_CATEGORY), Some("Backpacks"));
        }
        assert_eq!(store.rows.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn resubmission_updates_by_id() {
        let model = Arc::new(FakeModel::replying(COMPLETION));
        let store = Arc::new(MemoryStore::new());
        let pipeline = pipeline(model, store.clone());

        let first = pipeline.enrich(input("lic-001", "stride.example"), &taxonomy()).await;
        let second = pipeline.enrich(input("lic-001", "stride.example"), &taxonomy()).await;

        assert_eq!(first.message, "Added new record with UID: lic-001");
        assert_eq!(second.message, "Updated existing record with ID: 1");
        assert_eq!(store.rows.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn resubmission_without_ids_updates_by_uid() {
        let model = Arc::new(FakeModel::replying(COMPLETION));
        let store = Arc::new(MemoryStore::default());
        let pipeline = pipeline(model, store.clone());

        pipeline.enrich(input("lic-001", "stride.example"), &taxonomy()).await;
        let second = pipeline.enrich(input("lic-001", "stride.example"), &taxonomy()).await;

        assert!(second.success);
        assert_eq!(second.message, "Updated existing record with UID: lic-001");
        assert_eq!(store.rows.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn resubmission_keeps_one_local_row() {
        let path = std::env::temp_dir().join(format!("licensee_test_{}.db", Uuid::now_v7()));
        let store = Arc::new(LocalStore::open(&path).await.unwrap());
        let model = Arc::new(FakeModel::replying(COMPLETION));
        let pipeline = pipeline(model, store.clone());

        let first = pipeline.enrich(input("lic-001", "stride.example"), &taxonomy()).await;
        let mut changed = input("lic-001", "https://stride.example");
        changed.brand_name = "Stride Athletics".into();
        let second = pipeline.enrich(changed, &taxonomy()).await;

        assert!(first.success && second.success, "{}", second.message);
        assert!(second.message.starts_with("Updated existing record with ID: "));
        assert_eq!(store.count_rows("licensees").await.unwrap(), 1);

        let stored = store
            .find_by_key("licensees", "uid", "lic-001")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored["brand_name"], "Stride Athletics");
    }

    #[tokio::test]
    async fn completion_failure_leaves_store_untouched() {
        let model = Arc::new(FakeModel::failing("HTTP 401: invalid api key"));
        let store = Arc::new(MemoryStore::new());
        let outcome = pipeline(model.clone(), store.clone())
            .enrich(input("lic-001", "stride.example"), &taxonomy())
            .await;

        assert!(!outcome.success);
        assert_eq!(outcome.message, "model error: HTTP 401: invalid api key");
        assert!(outcome.record.is_none());
        assert!(outcome.fields.is_none());
        assert_eq!(store.writes.load(Ordering::SeqCst), 0);
        assert_eq!(model.embed_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn embedding_failure_is_not_fatal() {
        let model = Arc::new(FakeModel {
            fail_embed_on: Some("demonstrates market readiness"),
            ..FakeModel::replying(COMPLETION)
        });
        let store = Arc::new(MemoryStore::new());
        let outcome = pipeline(model, store.clone())
            .enrich(input("lic-001", "stride.example"), &taxonomy())
            .await;

        assert!(outcome.success);
        let record = outcome.record.unwrap();
        assert!(record.embeddings.market_readiness_commentary_embedding.is_none());
        assert_eq!(record.embeddings.present(), 5);
        assert!(!record.summaries.market_readiness_commentary.is_empty());

        let rows = store.rows.lock().unwrap();
        assert_eq!(rows[0]["market_readiness_commentary_embedding"], Value::Null);
    }

    #[tokio::test]
    async fn store_error_is_reported_verbatim() {
        let model = Arc::new(FakeModel::replying(COMPLETION));
        let store = Arc::new(MemoryStore {
            fail_writes: Some("duplicate key value violates unique constraint"),
            ..MemoryStore::new()
        });
        let outcome = pipeline(model, store)
            .enrich(input("lic-001", "stride.example"), &taxonomy())
            .await;

        assert!(!outcome.success);
        assert_eq!(outcome.message, "duplicate key value violates unique constraint");
        assert!(outcome.record.is_none());
    }

    #[test]
    fn options_follow_config() {
        let mut config = AppConfig::default();
        config.store.table = "brands".into();
        config.openai.max_output_tokens = 800;
        let options = PipelineOptions::from(&config);
        assert_eq!(options.table, "brands");
        assert_eq!(options.max_output_tokens, 800);
        assert_eq!(options.temperature, 0.7);
    }
}
