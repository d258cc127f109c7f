//! Pipeline coordinator - main harvest orchestration logic
//!
//! This module drives a run through its phases:
//! - Resolving the entity index (the only step allowed to fail the run)
//! - Partitioning entities into batches, processed strictly one after another
//! - Processing the entities of a batch concurrently
//! - Processing the sub-items of an entity concurrently, behind a detail gate
//! - Pausing between batches and collecting records and statistics

use crate::config::{validate, Config, SiteConfig};
use crate::crawler::details::{parse_details, FieldExtractor, LabelPatternExtractor};
use crate::crawler::entity::{choose_entity_name, parse_entity};
use crate::crawler::fetcher::{build_http_client, DocumentFetcher, ReqwestTransport, Transport};
use crate::crawler::index::resolve_index;
use crate::crawler::retry::{retry, RetryPolicy, Sleeper, TokioSleeper};
use crate::crawler::scheduler::{partition_batches, Batch, BatchPacer, DetailGate};
use crate::model::{EntityReference, ExtractedFields, Record, SubItemReference};
use crate::output::{BatchStats, EntityStatus, EntitySummary, RunStatistics};
use crate::state::RunPhase;
use crate::HarvestError;
use std::sync::Arc;
use tokio::task::JoinSet;
use url::Url;

/// What a finished run hands to the output layer
#[derive(Debug, Clone)]
pub struct HarvestReport {
    /// Every gathered record; entity groups appear in completion order
    pub records: Vec<Record>,

    pub statistics: RunStatistics,
}

impl HarvestReport {
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Main pipeline coordinator structure
pub struct Coordinator {
    config: Config,
    fetcher: DocumentFetcher,
    sleeper: Arc<dyn Sleeper>,
    extractor: Arc<dyn FieldExtractor>,
    phase: RunPhase,
}

impl Coordinator {
    /// Creates a coordinator that talks HTTP through a shared reqwest client
    ///
    /// # Arguments
    ///
    /// * `config` - The harvest configuration, assumed validated
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Ready to run
    /// * `Err(HarvestError)` - The configuration is invalid, or the HTTP client
    ///   or field patterns could not be built
    pub fn new(config: Config) -> Result<Self, HarvestError> {
        let timeout = config.crawler.request_timeout();
        let client = build_http_client(&config.user_agent, timeout)?;
        let transport = Arc::new(ReqwestTransport::new(client, timeout));
        Self::with_transport(config, transport)
    }

    /// Creates a coordinator that sends every request through `transport`
    ///
    /// Fails with `HarvestError::Config` when the configuration does not validate.
    pub fn with_transport(config: Config, transport: Arc<dyn Transport>) -> Result<Self, HarvestError> {
        validate(&config)?;
        let fetcher = DocumentFetcher::new(transport, config.crawler.request_timeout());
        let extractor = LabelPatternExtractor::new()?;

        Ok(Self {
            config,
            fetcher,
            sleeper: Arc::new(TokioSleeper),
            extractor: Arc::new(extractor),
            phase: RunPhase::Start,
        })
    }

    /// Replaces the sleeper used for backoff waits and batch pauses
    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    /// Replaces the strategy that reads fields off detail pages
    pub fn with_extractor(mut self, extractor: Arc<dyn FieldExtractor>) -> Self {
        self.extractor = extractor;
        self
    }

    pub fn phase(&self) -> RunPhase {
        self.phase
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Runs the harvest to completion
    ///
    /// # Returns
    ///
    /// * `Ok(HarvestReport)` - Every batch was processed; the report may hold
    ///   zero records
    /// * `Err(HarvestError::IndexUnavailable)` - No entity list, no work
    pub async fn run(&mut self) -> Result<HarvestReport, HarvestError> {
        let mut statistics = RunStatistics::new();
        let policy = RetryPolicy::from_config(&self.config.crawler);

        self.transition(RunPhase::ResolvingIndex)?;
        tracing::info!(url = %self.config.site.base_url, "Resolving entity index");

        let entities = match resolve_index(
            &self.fetcher,
            &policy,
            self.sleeper.as_ref(),
            &self.config.site,
        )
        .await
        {
            Ok(entities) => entities,
            Err(e) => {
                tracing::error!(error = %e, "Entity index unavailable, aborting run");
                self.transition(RunPhase::Failed)?;
                return Err(e);
            }
        };

        self.transition(RunPhase::Batching)?;
        statistics.entities_total = entities.len();

        let batches = partition_batches(entities, self.config.crawler.batch_size);
        let batch_count = batches.len();
        tracing::info!(
            entities = statistics.entities_total,
            batches = batch_count,
            batch_size = self.config.crawler.batch_size,
            "Entities partitioned into batches"
        );

        let pipeline = Arc::new(Pipeline {
            fetcher: self.fetcher.clone(),
            sleeper: Arc::clone(&self.sleeper),
            extractor: Arc::clone(&self.extractor),
            policy,
            site: self.config.site.clone(),
            max_concurrent_details: self.config.crawler.max_concurrent_details,
        });
        let pacer = BatchPacer::from_config(&self.config.crawler);
        let mut records = Vec::new();

        for batch in batches {
            self.transition(RunPhase::ProcessingBatch(batch.index))?;

            let mut batch_stats = BatchStats::new(batch.index, batch.len());
            tracing::info!(
                batch = batch.index,
                of = batch_count,
                size = batch.len(),
                "Starting batch"
            );

            for outcome in process_batch(&pipeline, batch).await {
                batch_stats.record_entity(&outcome.summary);
                records.extend(outcome.records);
                statistics.entities.push(outcome.summary);
            }

            tracing::info!(
                batch = batch_stats.index,
                size = batch_stats.size,
                completed = batch_stats.entities_completed,
                absent = batch_stats.entities_absent,
                failed = batch_stats.entities_failed,
                records = batch_stats.records,
                "Batch complete"
            );

            if batch_stats.index < batch_count {
                let pause = pacer.pause_duration();
                tracing::debug!(pause_ms = pause.as_millis() as u64, "Pausing before next batch");
                self.sleeper.sleep(pause).await;
                batch_stats.pause = Some(pause);
            }

            statistics.batches.push(batch_stats);
        }

        self.transition(RunPhase::Done)?;
        statistics.finish();

        tracing::info!(
            records = records.len(),
            entities = statistics.entities_total,
            "Harvest completed"
        );

        Ok(HarvestReport {
            records,
            statistics,
        })
    }

    fn transition(&mut self, next: RunPhase) -> Result<(), HarvestError> {
        if !self.phase.can_transition_to(next) {
            return Err(HarvestError::InvalidTransition {
                from: self.phase,
                to: next,
            });
        }
        tracing::debug!(from = %self.phase, to = %next, "Run phase transition");
        self.phase = next;
        Ok(())
    }
}

/// Everything a task needs, shared read-only by every task of a run
struct Pipeline {
    fetcher: DocumentFetcher,
    sleeper: Arc<dyn Sleeper>,
    extractor: Arc<dyn FieldExtractor>,
    policy: RetryPolicy,
    site: SiteConfig,
    max_concurrent_details: usize,
}

impl Pipeline {
    /// Fetches one detail page through the retrier; an absent page yields empty fields
    async fn fetch_details(&self, url: &Url) -> Result<ExtractedFields, HarvestError> {
        let fields = retry(&self.policy, self.sleeper.as_ref(), "detail page", || {
            parse_details(&self.fetcher, url, self.extractor.as_ref())
        })
        .await?;

        Ok(fields.unwrap_or_default())
    }
}

/// Result of one entity task
struct EntityOutcome {
    summary: EntitySummary,
    records: Vec<Record>,
}

/// Processes every entity of a batch concurrently and waits for all of them
///
/// Outcomes are returned in completion order. An entity whose task aborted
/// is reported as failed.
async fn process_batch(pipeline: &Arc<Pipeline>, batch: Batch) -> Vec<EntityOutcome> {
    let mut tasks = JoinSet::new();
    let mut unfinished: Vec<Option<String>> = batch
        .entities
        .iter()
        .map(|entity| Some(entity.display_name.clone()))
        .collect();

    for (position, entity) in batch.entities.into_iter().enumerate() {
        let pipeline = Arc::clone(pipeline);
        tasks.spawn(async move { (position, process_entity(pipeline, entity).await) });
    }

    let mut outcomes = Vec::with_capacity(unfinished.len());

    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((position, outcome)) => {
                unfinished[position] = None;
                outcomes.push(outcome);
            }
            Err(join_err) => {
                tracing::error!(batch = batch.index, error = %join_err, "Entity task aborted");
            }
        }
    }

    for display_name in unfinished.into_iter().flatten() {
        outcomes.push(EntityOutcome {
            summary: EntitySummary::new(&display_name, EntityStatus::Failed),
            records: Vec::new(),
        });
    }

    outcomes
}

/// Processes one entity: its page first, then all of its sub-items
async fn process_entity(pipeline: Arc<Pipeline>, entity: EntityReference) -> EntityOutcome {
    let page = retry(&pipeline.policy, pipeline.sleeper.as_ref(), "entity page", || {
        parse_entity(&pipeline.fetcher, &entity.url, &pipeline.site)
    })
    .await;

    let page = match page {
        Ok(Some(page)) => page,
        Ok(None) => {
            tracing::info!(entity = %entity.display_name, url = %entity.url, "Entity page not found");
            return EntityOutcome {
                summary: EntitySummary::new(&entity.display_name, EntityStatus::Absent),
                records: Vec::new(),
            };
        }
        Err(e) => {
            tracing::warn!(entity = %entity.display_name, error = %e, "Entity page unreachable, skipping");
            return EntityOutcome {
                summary: EntitySummary::new(&entity.display_name, EntityStatus::Failed),
                records: Vec::new(),
            };
        }
    };

    let name = choose_entity_name(&page.canonical_name, &entity.display_name, &pipeline.site);
    let discovered = page.sub_items.len();
    tracing::info!(entity = %name, discovered, "Discovered sub-items");

    let records = process_sub_items(&pipeline, &name, page.sub_items).await;
    let processed = records.len();

    tracing::info!(
        entity = %name,
        discovered,
        processed,
        failed = discovered - processed,
        "Entity processed"
    );

    EntityOutcome {
        summary: EntitySummary {
            name,
            discovered,
            processed,
            failed: discovered - processed,
            ..EntitySummary::new(&entity.display_name, EntityStatus::Completed)
        },
        records,
    }
}

/// Fetches the details of every sub-item, at most `max_concurrent_details` at a time
///
/// Records come back in page order. A sub-item whose retries ran out, or
/// whose task aborted, contributes nothing.
async fn process_sub_items(
    pipeline: &Arc<Pipeline>,
    entity_name: &str,
    sub_items: Vec<SubItemReference>,
) -> Vec<Record> {
    let gate = DetailGate::new(pipeline.max_concurrent_details);
    let mut tasks = JoinSet::new();

    for (position, sub_item) in sub_items.into_iter().enumerate() {
        let pipeline = Arc::clone(pipeline);
        let gate = gate.clone();
        let entity_name = entity_name.to_string();

        tasks.spawn(async move {
            let _permit = gate.acquire().await?;
            let fields = pipeline.fetch_details(&sub_item.url).await?;
            Ok::<_, HarvestError>((position, Record::new(entity_name, sub_item.label, fields)))
        });
    }

    let mut completed = Vec::new();

    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(Ok(record)) => completed.push(record),
            Ok(Err(e)) => {
                tracing::warn!(entity = %entity_name, error = %e, "Dropping sub-item");
            }
            Err(join_err) => {
                tracing::error!(entity = %entity_name, error = %join_err, "Sub-item task aborted");
            }
        }
    }

    completed.sort_by_key(|(position, _)| *position);
    completed.into_iter().map(|(_, record)| record).collect()
}
