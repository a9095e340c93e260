//! # Discovery Orchestrator
//!
//! One pass lists the gateway's services and plugins, then fans out per
//! service and, inside each service, per route. Both levels run on bounded
//! pools sized from configuration. Every route ends in one
//! [`UnitOutcome`]; failures stay local to the unit that hit them.
//!
//! ```text
//! Start → ListServices → per service: Filter → ListRoutes → AcquireSpec
//!       → per route: ResolvePlugins → DeriveEndpoints → BuildDescriptor
//!                    → CheckCache → [Publish] → PassComplete
//! ```

use futures::stream::{self, StreamExt};
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn, Instrument};
use uuid::Uuid;

use super::cache::ChangeCache;
use super::descriptor::{build_descriptor, DescriptorParts};
use super::endpoints::{derive_endpoints, EndpointSettings};
use super::plugins::{require_global_acl, PluginResolver, RouteSecurity};
use super::spec::SpecChain;
use crate::catalog::CatalogPublisher;
use crate::config::AgentConfig;
use crate::domain::{Route, Service, SpecDocument};
use crate::errors::Result;
use crate::filter::TagFilter;
use crate::gateway::GatewayAdminClient;
use crate::observability::{MetricsRecorder, UnitOutcome};

/// Counts describing one finished pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PassSummary {
    pub pass_id: String,
    pub services: usize,
    pub services_filtered: usize,
    pub services_without_spec: usize,
    pub service_errors: usize,
    pub routes: usize,
    pub published: usize,
    pub unchanged: usize,
    pub no_endpoints: usize,
    pub route_errors: usize,
}

impl PassSummary {
    fn new(pass_id: String) -> Self {
        Self { pass_id, ..Default::default() }
    }

    fn add_service(&mut self, report: &ServiceReport) {
        self.services += 1;
        match report.outcome {
            UnitOutcome::Filtered => self.services_filtered += 1,
            UnitOutcome::NoSpec => self.services_without_spec += 1,
            UnitOutcome::Error => self.service_errors += 1,
            _ => {}
        }

        for outcome in &report.routes {
            self.routes += 1;
            match outcome {
                UnitOutcome::Published => self.published += 1,
                UnitOutcome::Unchanged => self.unchanged += 1,
                UnitOutcome::NoEndpoints => self.no_endpoints += 1,
                UnitOutcome::Error => self.route_errors += 1,
                UnitOutcome::NoSpec | UnitOutcome::Filtered => {}
            }
        }
    }
}

#[derive(Debug)]
struct ServiceReport {
    outcome: UnitOutcome,
    routes: Vec<UnitOutcome>,
}

impl ServiceReport {
    fn skipped(outcome: UnitOutcome) -> Self {
        Self { outcome, routes: Vec::new() }
    }
}

/// Drives discovery passes against a gateway and publishes to a catalog
pub struct DiscoveryAgent {
    gateway: Arc<dyn GatewayAdminClient>,
    publisher: Arc<dyn CatalogPublisher>,
    filter: TagFilter,
    specs: SpecChain,
    endpoints: EndpointSettings,
    cache: ChangeCache,
    metrics: MetricsRecorder,
    poll_interval: Duration,
    service_concurrency: usize,
    route_concurrency: usize,
}

impl DiscoveryAgent {
    /// Build the agent and run the startup precondition gate.
    ///
    /// Fails when the filter expression is malformed, or when an enabled
    /// global ACL plugin is required but absent. No pass runs in either case.
    pub async fn new(
        config: AgentConfig,
        gateway: Arc<dyn GatewayAdminClient>,
        publisher: Arc<dyn CatalogPublisher>,
    ) -> Result<Self> {
        let specs = SpecChain::from_config(&config.spec, gateway.clone());
        Self::with_spec_chain(config, gateway, publisher, specs).await
    }

    /// Like [`DiscoveryAgent::new`], with an explicitly constructed source chain
    pub async fn with_spec_chain(
        config: AgentConfig,
        gateway: Arc<dyn GatewayAdminClient>,
        publisher: Arc<dyn CatalogPublisher>,
        specs: SpecChain,
    ) -> Result<Self> {
        let filter = TagFilter::new(&config.discovery.filter)?;

        if config.discovery.acl_required {
            let plugins = gateway.list_plugins().await?;
            require_global_acl(&plugins, true)?;
        } else {
            info!("Global ACL requirement disabled by configuration");
        }

        info!(
            filter = %filter.expression(),
            sources = ?specs.source_names(),
            service_concurrency = config.discovery.service_concurrency,
            route_concurrency = config.discovery.route_concurrency,
            "Discovery agent initialized"
        );

        Ok(Self {
            gateway,
            publisher,
            filter,
            specs,
            endpoints: EndpointSettings::from(&config.proxy),
            cache: ChangeCache::new(),
            metrics: MetricsRecorder::new(),
            poll_interval: config.discovery.poll_interval(),
            service_concurrency: config.discovery.service_concurrency.max(1),
            route_concurrency: config.discovery.route_concurrency.max(1),
        })
    }

    /// The change-detection cache shared by all passes
    pub fn cache(&self) -> &ChangeCache {
        &self.cache
    }

    /// Run one complete discovery pass.
    ///
    /// Only failing to list services or plugins fails the pass; everything
    /// below that is counted in the summary instead.
    pub async fn run_pass(&self) -> Result<PassSummary> {
        let pass_id = Uuid::new_v4().to_string();
        let span = crate::discovery_span!(pass_id.as_str());
        let started = Instant::now();

        let result = self.run_pass_inner(pass_id).instrument(span).await;

        self.metrics.record_pass(result.is_ok(), started.elapsed().as_secs_f64());
        self.metrics.update_cache_entries(self.cache.len());
        result
    }

    async fn run_pass_inner(&self, pass_id: String) -> Result<PassSummary> {
        let services = self.gateway.list_services().await?;
        let resolver = PluginResolver::new(self.gateway.list_plugins().await?);
        tracing::Span::current().record("services", services.len() as u64);

        debug!(
            services = services.len(),
            plugins = resolver.inventory().len(),
            "Fetched gateway inventory"
        );

        let reports: Vec<ServiceReport> = stream::iter(services)
            .map(|service| self.process_service(service, &resolver))
            .buffer_unordered(self.service_concurrency)
            .collect()
            .await;

        let mut summary = PassSummary::new(pass_id);
        for report in &reports {
            summary.add_service(report);
        }

        info!(
            services = summary.services,
            routes = summary.routes,
            published = summary.published,
            unchanged = summary.unchanged,
            errors = summary.service_errors + summary.route_errors,
            "Discovery pass complete"
        );

        Ok(summary)
    }

    async fn process_service(&self, service: Service, resolver: &PluginResolver) -> ServiceReport {
        let span = crate::unit_span!("service", service.id, name = %service.name);
        let report = self.process_service_inner(&service, resolver).instrument(span).await;
        self.metrics.record_service(report.outcome);
        report
    }

    async fn process_service_inner(
        &self,
        service: &Service,
        resolver: &PluginResolver,
    ) -> ServiceReport {
        if !self.filter.evaluate(&service.tag_map()) {
            debug!(service_id = %service.id, "Service excluded by tag filter");
            return ServiceReport::skipped(UnitOutcome::Filtered);
        }

        let routes = match self.gateway.list_routes_for_service(&service.id).await {
            Ok(routes) => routes,
            Err(e) => {
                warn!(service_id = %service.id, error = %e, "Failed to list routes; skipping service");
                return ServiceReport::skipped(UnitOutcome::Error);
            }
        };

        if routes.is_empty() {
            debug!(service_id = %service.id, "Service has no routes");
            return ServiceReport::skipped(UnitOutcome::Unchanged);
        }

        let Some(spec) = self.specs.acquire(service).await else {
            info!(
                service_id = %service.id,
                routes = routes.len(),
                "No specification found; skipping service routes"
            );
            return ServiceReport::skipped(UnitOutcome::NoSpec);
        };

        let outcomes: Vec<UnitOutcome> = stream::iter(routes.iter())
            .map(|route| self.process_route(service, route, &spec, resolver))
            .buffer_unordered(self.route_concurrency)
            .collect()
            .await;

        let outcome = if outcomes.contains(&UnitOutcome::Published) {
            UnitOutcome::Published
        } else {
            UnitOutcome::Unchanged
        };
        ServiceReport { outcome, routes: outcomes }
    }

    async fn process_route(
        &self,
        service: &Service,
        route: &Route,
        spec: &SpecDocument,
        resolver: &PluginResolver,
    ) -> UnitOutcome {
        let span = crate::unit_span!("route", route.id, service_id = %service.id);
        let outcome = self.process_route_inner(service, route, spec, resolver).instrument(span).await;
        self.metrics.record_route(outcome);
        outcome
    }

    async fn process_route_inner(
        &self,
        service: &Service,
        route: &Route,
        spec: &SpecDocument,
        resolver: &PluginResolver,
    ) -> UnitOutcome {
        let plugins = resolver.effective(&route.id, &service.id);

        let endpoints = derive_endpoints(route, &self.endpoints);
        if endpoints.is_empty() {
            info!(route_id = %route.id, protocols = ?route.protocols, "No reachable endpoints; not publishing");
            return UnitOutcome::NoEndpoints;
        }

        let security = RouteSecurity::from_plugins(&plugins, &endpoints);
        let descriptor = match build_descriptor(DescriptorParts {
            service,
            route,
            spec,
            endpoints,
            plugins: &plugins,
            security,
        }) {
            Ok(descriptor) => descriptor,
            Err(e) => {
                warn!(route_id = %route.id, error = %e, "Failed to build descriptor");
                return UnitOutcome::Error;
            }
        };

        let (published, checksum) = match self.cache.is_published(&descriptor) {
            Ok(result) => result,
            Err(e) => {
                warn!(route_id = %route.id, error = %e, "Failed to checksum descriptor");
                return UnitOutcome::Error;
            }
        };

        if published {
            let recorded_at = self.cache.get(&checksum).map(|entry| entry.recorded_at);
            debug!(
                route_id = %route.id,
                checksum = %checksum,
                recorded_at = ?recorded_at,
                "Unchanged since last publish"
            );
            return UnitOutcome::Unchanged;
        }

        if let Err(e) = self.publisher.publish(&descriptor).await {
            warn!(
                route_id = %route.id,
                retryable = e.is_retryable(),
                error = %e,
                "Failed to publish descriptor"
            );
            return UnitOutcome::Error;
        }

        info!(route_id = %route.id, name = %descriptor.name, checksum = %checksum, "Published API");
        self.cache.record(checksum, descriptor);
        UnitOutcome::Published
    }

    /// Run passes on the polling interval until `shutdown` resolves.
    ///
    /// A failed pass is logged and the next one runs on schedule; only fatal
    /// errors end the loop early. An in-flight pass finishes before shutdown
    /// is observed.
    pub async fn run<F>(&self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send,
    {
        let mut interval = tokio::time::interval(self.poll_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tokio::pin!(shutdown);

        info!(poll_interval_secs = self.poll_interval.as_secs(), "Starting discovery loop");

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("Shutdown signal received, stopping discovery loop");
                    return Ok(());
                }
                _ = interval.tick() => {
                    match self.run_pass().await {
                        Ok(_) => {}
                        Err(e) if e.is_fatal() => {
                            error!(error = %e, "Fatal error during discovery pass");
                            return Err(e);
                        }
                        Err(e) => {
                            error!(error = %e, "Discovery pass failed; retrying next interval");
                        }
                    }
                }
            }
        }
    }
}

impl std::fmt::Debug for DiscoveryAgent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiscoveryAgent")
            .field("filter", &self.filter.expression())
            .field("specs", &self.specs)
            .field("endpoints", &self.endpoints)
            .field("cache_entries", &self.cache.len())
            .finish()
    }
}
