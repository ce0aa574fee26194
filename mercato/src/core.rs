use std::sync::{Arc, Mutex};
use std::time::Instant;

use tracing::{debug, info, warn};

use mercato_cache::{Cache, CacheConfig, CacheStats};
use mercato_core::{
    AdapterConfig, AdapterStatus, DataKind, DataRequest, DataResponse, MercatoError,
    OrchestratorConfig, ProviderAdapter, RetrievalStrategy,
};
use mercato_fusion::{FusionConfig, FusionEngine};

use crate::health::AdapterHealth;
use crate::report::{AdapterInfo, HealthReport};
use crate::selection::{ScoreInputs, score};

pub(crate) struct Registered {
    pub(crate) adapter: Arc<dyn ProviderAdapter>,
    pub(crate) config: AdapterConfig,
    pub(crate) health: Mutex<AdapterHealth>,
}

/// Orchestrator that routes requests across registered adapters.
///
/// Holds all mutable health state itself; adapters stay stateless from the
/// orchestrator's point of view and are shared as `Arc<dyn ProviderAdapter>`.
pub struct Orchestrator {
    pub(crate) adapters: Vec<Registered>,
    pub(crate) cfg: OrchestratorConfig,
    pub(crate) fusion: FusionEngine,
    pub(crate) cache: Option<Cache>,
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field(
                "adapters",
                &self
                    .adapters
                    .iter()
                    .map(|r| r.adapter.name())
                    .collect::<Vec<_>>(),
            )
            .field("cfg", &self.cfg)
            .finish_non_exhaustive()
    }
}

/// Builder for constructing an [`Orchestrator`].
pub struct OrchestratorBuilder {
    adapters: Vec<(Arc<dyn ProviderAdapter>, AdapterConfig)>,
    cfg: OrchestratorConfig,
    fusion_cfg: FusionConfig,
    cache_cfg: Option<CacheConfig>,
}

impl Default for OrchestratorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl OrchestratorBuilder {
    /// Builder with default configuration, no adapters, and no cache.
    #[must_use]
    pub fn new() -> Self {
        Self {
            adapters: Vec::new(),
            cfg: OrchestratorConfig::default(),
            fusion_cfg: FusionConfig::default(),
            cache_cfg: None,
        }
    }

    /// Register an adapter with its settings. Registration order is the
    /// tie-break of last resort; priorities steer ordinary selection.
    #[must_use]
    pub fn with_adapter(mut self, adapter: Arc<dyn ProviderAdapter>, config: AdapterConfig) -> Self {
        self.adapters.push((adapter, config));
        self
    }

    /// Replace the whole orchestrator configuration.
    #[must_use]
    pub fn config(mut self, cfg: OrchestratorConfig) -> Self {
        self.cfg = cfg;
        self
    }

    /// Default retrieval strategy for calls that do not pick one.
    #[must_use]
    pub const fn strategy(mut self, strategy: RetrievalStrategy) -> Self {
        self.cfg.strategy = strategy;
        self
    }

    /// Timeout applied to each individual adapter call.
    #[must_use]
    pub const fn adapter_timeout(mut self, timeout: std::time::Duration) -> Self {
        self.cfg.adapter_timeout = timeout;
        self
    }

    /// Tunables of the fusion engine used by `ParallelMerge`.
    #[must_use]
    pub fn fusion_config(mut self, cfg: FusionConfig) -> Self {
        self.fusion_cfg = cfg;
        self
    }

    /// Enable the tiered response cache.
    #[must_use]
    pub fn with_cache(mut self, cfg: CacheConfig) -> Self {
        self.cache_cfg = Some(cfg);
        self
    }

    /// Build the orchestrator, probing and initializing every adapter.
    ///
    /// An adapter whose `initialize` fails is kept registered with status
    /// `Error` so reports show it; it is skipped by selection until an
    /// operator resets it.
    ///
    /// # Errors
    /// Returns `InvalidRequest` when no adapters are registered, or a
    /// `Cache` error when the cache cannot be opened.
    pub async fn build(self) -> Result<Orchestrator, MercatoError> {
        if self.adapters.is_empty() {
            return Err(MercatoError::invalid_request(
                "no adapters registered; add at least one via with_adapter(...)",
            ));
        }
        let cache = match self.cache_cfg {
            Some(cfg) => Some(Cache::new(cfg)?),
            None => None,
        };

        let mut registered = Vec::with_capacity(self.adapters.len());
        for (adapter, config) in self.adapters {
            let status = match adapter.initialize().await {
                Ok(()) => adapter.check_availability().await,
                Err(e) => {
                    warn!(adapter = adapter.name(), error = %e, "adapter failed to initialize");
                    AdapterStatus::Error
                }
            };
            info!(adapter = adapter.name(), status = %status, priority = config.priority, "adapter registered");
            registered.push(Registered {
                adapter,
                config,
                health: Mutex::new(AdapterHealth::new(status)),
            });
        }

        Ok(Orchestrator {
            adapters: registered,
            cfg: self.cfg,
            fusion: FusionEngine::new(self.fusion_cfg),
            cache,
        })
    }
}

impl Orchestrator {
    /// Start building a new orchestrator.
    #[must_use]
    pub fn builder() -> OrchestratorBuilder {
        OrchestratorBuilder::new()
    }

    /// Retrieve data using the configured default strategy.
    ///
    /// # Errors
    /// Only `InvalidRequest` is returned as `Err`; every provider-side
    /// failure comes back as `Ok` with `success == false` and an error
    /// message enumerating each adapter attempted.
    pub async fn get(&self, request: &DataRequest) -> Result<DataResponse, MercatoError> {
        self.get_with(request, self.cfg.strategy).await
    }

    /// Retrieve data with an explicit strategy.
    ///
    /// # Errors
    /// See [`get`](Self::get).
    pub async fn get_with(
        &self,
        request: &DataRequest,
        strategy: RetrievalStrategy,
    ) -> Result<DataResponse, MercatoError> {
        request.validate()?;

        if let Some(cache) = &self.cache
            && let Some(hit) = cache.get(request)
        {
            debug!(kind = %request.kind, "served from cache");
            return Ok(hit);
        }

        let ranked = self.select_ranked(request.kind);
        if ranked.is_empty() {
            return Ok(DataResponse::failed(
                "orchestrator",
                request.kind,
                format!("no operational adapter supports {}", request.kind),
            ));
        }
        debug!(
            kind = %request.kind,
            strategy = ?strategy,
            order = ?ranked.iter().map(|&i| self.adapters[i].adapter.name()).collect::<Vec<_>>(),
            "selection order"
        );

        let response = match strategy {
            RetrievalStrategy::FirstSuccess => self.first_success(request, &ranked).await,
            RetrievalStrategy::ParallelMerge => self.parallel_merge(request, &ranked).await,
            RetrievalStrategy::CrossValidate => self.cross_validate(request, &ranked).await,
        };

        if response.has_data()
            && let Some(cache) = &self.cache
            && let Err(e) = cache.put(request, &response)
        {
            warn!(error = %e, "failed to cache response");
        }
        Ok(response)
    }

    /// Eligible adapter indices for `kind`, best score first.
    ///
    /// The order is computed once per request; strategies never re-rank
    /// mid-flight. Ties break on adapter name for determinism.
    pub(crate) fn select_ranked(&self, kind: DataKind) -> Vec<usize> {
        let now = Instant::now();
        let window = self.cfg.rate_window;

        let mut eligible: Vec<(usize, usize)> = Vec::new(); // (index, recent)
        for (i, reg) in self.adapters.iter().enumerate() {
            if !reg.adapter.supports(kind) {
                continue;
            }
            let mut health = reg.health.lock().expect("mutex poisoned");
            if !health.status.is_operational() {
                continue;
            }
            eligible.push((i, health.recent_requests(now, window)));
        }

        #[allow(clippy::cast_precision_loss)]
        let total_recent: f64 = eligible.iter().map(|&(_, n)| n as f64).sum();

        let mut scored: Vec<(usize, f64, &'static str)> = eligible
            .into_iter()
            .map(|(i, recent)| {
                let reg = &self.adapters[i];
                let health = reg.health.lock().expect("mutex poisoned");
                #[allow(clippy::cast_precision_loss)]
                let usage_share = if total_recent > 0.0 {
                    recent as f64 / total_recent
                } else {
                    0.0
                };
                let at_rate_limit = reg
                    .config
                    .rate_limit_per_minute
                    .is_some_and(|limit| recent >= limit as usize);
                let s = score(ScoreInputs {
                    success_rate: health.success_rate,
                    priority: reg.config.priority,
                    usage_share,
                    in_cooldown: health.in_cooldown(now),
                    at_rate_limit,
                });
                (i, s, reg.adapter.name())
            })
            .collect();

        scored.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.2.cmp(b.2)));
        scored.into_iter().map(|(i, _, _)| i).collect()
    }

    /// One bounded adapter call with full health bookkeeping.
    pub(crate) async fn attempt(
        &self,
        idx: usize,
        request: &DataRequest,
    ) -> Result<DataResponse, MercatoError> {
        let reg = &self.adapters[idx];
        let name = reg.adapter.name();
        {
            let mut health = reg.health.lock().expect("mutex poisoned");
            health.record_attempt(Instant::now(), self.cfg.rate_window);
        }

        let result = tokio::time::timeout(self.cfg.adapter_timeout, reg.adapter.fetch(request))
            .await
            .unwrap_or_else(|_| Err(MercatoError::timeout(name, request.kind.as_str())));

        let now = Instant::now();
        let mut health = reg.health.lock().expect("mutex poisoned");
        match &result {
            Ok(resp) => {
                health.record_outcome(name, resp.success, &self.cfg, now);
            }
            Err(e) => {
                health.record_outcome(name, false, &self.cfg, now);
                match e {
                    MercatoError::RateLimited { .. } => {
                        // Upstream said stop; back off immediately instead of
                        // waiting for the EWMA to sink.
                        health.force_cooldown(name, now, self.cfg.cooldown);
                        health.status = AdapterStatus::Limited;
                    }
                    MercatoError::Unauthenticated { .. } => {
                        warn!(adapter = name, "credentials rejected, disabling until reset");
                        health.status = AdapterStatus::Error;
                    }
                    _ => {}
                }
            }
        }
        result
    }

    /// Re-probe one adapter and wipe its health state.
    ///
    /// Returns false when no adapter carries that name.
    pub async fn reset_adapter(&self, name: &str) -> bool {
        for reg in &self.adapters {
            if reg.adapter.name() == name {
                let status = reg.adapter.check_availability().await;
                info!(adapter = name, status = %status, "adapter reset");
                reg.health.lock().expect("mutex poisoned").reset(status);
                return true;
            }
        }
        false
    }

    /// Snapshot of every registered adapter, in registration order.
    #[must_use]
    pub fn adapter_info(&self) -> Vec<AdapterInfo> {
        let now = Instant::now();
        self.adapters
            .iter()
            .map(|reg| {
                let mut health = reg.health.lock().expect("mutex poisoned");
                AdapterInfo {
                    name: reg.adapter.name().to_owned(),
                    description: reg.adapter.description().to_owned(),
                    status: health.status,
                    priority: reg.config.priority,
                    success_rate: health.success_rate,
                    usage_count: health.usage_count,
                    recent_requests: health.recent_requests(now, self.cfg.rate_window),
                    in_cooldown: health.in_cooldown(now),
                    supported_kinds: reg
                        .adapter
                        .supported_kinds()
                        .iter()
                        .map(|k| k.as_str().to_owned())
                        .collect(),
                }
            })
            .collect()
    }

    /// Aggregated health snapshot.
    #[must_use]
    pub fn health_report(&self) -> HealthReport {
        let adapters = self.adapter_info();
        let operational = adapters
            .iter()
            .filter(|a| a.status.is_operational())
            .count();
        HealthReport {
            generated_at: chrono::Utc::now(),
            operational,
            total: adapters.len(),
            adapters,
        }
    }

    /// Drop cached entries; `Some(kind)` restricts to one kind. No-op
    /// without a cache.
    ///
    /// # Errors
    /// Returns `Cache` errors from the durable tiers.
    pub fn clear_cache(&self, kind: Option<DataKind>) -> Result<(), MercatoError> {
        match &self.cache {
            Some(cache) => cache.clear(kind),
            None => Ok(()),
        }
    }

    /// Entry counts per cache tier, when a cache is configured.
    #[must_use]
    pub fn cache_stats(&self) -> Option<CacheStats> {
        self.cache.as_ref().map(Cache::stats)
    }

    /// Shut down every adapter.
    pub async fn close(&self) {
        for reg in &self.adapters {
            reg.adapter.close().await;
        }
    }
}
