//! Execution engine
//!
//! Lists every registered scanner unit, filters what it finds, and removes the rest
//! layer by layer so that a type is only removed once everything it depends on is gone.

use std::collections::{BTreeMap, BTreeSet};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use log::{debug, error, info, warn};
use tokio_util::sync::CancellationToken;

use crate::config::{Filters, GLOBAL_FILTER_KEY};
use crate::error::{CompositionError, Error, Result};
use crate::registry::{Registry, Scope, dependency};
use crate::resource::Resource;
use crate::scanner::ScannerUnit;

mod item;
mod parallel;

pub use item::{Item, ItemState, Tally};
use parallel::run_bounded;

/// Concurrent list / remove calls
pub const DEFAULT_PARALLELISM: usize = 16;

/// Removal sweeps per layer before pending items are marked failed
pub const DEFAULT_MAX_PASSES: usize = 10;

/// Seconds to wait before removing when the prompt is skipped
pub const DEFAULT_FORCE_SLEEP: u64 = 10;
pub const MIN_FORCE_SLEEP: u64 = 3;

/// Run options
#[derive(Debug, Clone)]
pub struct Parameters {
    /// Skip the confirmation prompt
    pub force: bool,
    pub force_sleep: u64,
    /// Hide filtered instances from the listing
    pub quiet: bool,
    pub no_dry_run: bool,
    pub includes: Vec<String>,
    pub excludes: Vec<String>,
    /// Re-list after each layer until removed instances are gone
    pub wait_on_dependencies: bool,
    pub max_passes: usize,
    pub parallelism: usize,
}

impl Default for Parameters {
    fn default() -> Self {
        Self {
            force: false,
            force_sleep: DEFAULT_FORCE_SLEEP,
            quiet: false,
            no_dry_run: false,
            includes: Vec::new(),
            excludes: Vec::new(),
            wait_on_dependencies: false,
            max_passes: DEFAULT_MAX_PASSES,
            parallelism: DEFAULT_PARALLELISM,
        }
    }
}

/// Confirmation hook run before anything is removed; an error aborts the run.
pub type Prompt = Box<dyn Fn() -> Result<()> + Send + Sync>;

/// Everything listed in one run.
#[derive(Default)]
struct Scan {
    items: Vec<Item>,
    /// Types whose listing failed in at least one unit
    failed_types: BTreeSet<String>,
    /// Units with at least one failed listing; nothing they found is touched
    failed_units: BTreeSet<usize>,
    unit_failures: usize,
}

pub struct Nuke {
    params: Parameters,
    filters: Filters,
    registry: Arc<Registry>,
    version: Option<String>,
    prompt: Option<Arc<dyn Fn() -> Result<()> + Send + Sync>>,
    units: Vec<ScannerUnit>,
    run_sleep: Duration,
}

impl Nuke {
    pub fn new(params: Parameters, filters: Filters, registry: Arc<Registry>) -> Self {
        Self {
            params,
            filters,
            registry,
            version: None,
            prompt: None,
            units: Vec::new(),
            run_sleep: Duration::from_secs(5),
        }
    }

    /// Banner printed at the start of `run`.
    pub fn register_version(&mut self, version: impl Into<String>) {
        self.version = Some(version.into());
    }

    pub fn register_prompt(&mut self, prompt: Prompt) {
        self.prompt = Some(Arc::from(prompt));
    }

    /// Pause between removal passes and absence checks.
    pub fn set_run_sleep(&mut self, run_sleep: Duration) {
        self.run_sleep = run_sleep;
    }

    pub fn units(&self) -> &[ScannerUnit] {
        &self.units
    }

    /// Add a scanner unit, rejecting types that cannot be listed at `scope`.
    pub fn register_scanner(&mut self, scope: Scope, mut unit: ScannerUnit) -> Result<()> {
        if unit.scope != scope {
            return Err(Error::Other(format!(
                "scanner {} was built for scope {} but registered at {}",
                unit.owner, unit.scope, scope
            )));
        }

        let mut canonical = Vec::with_capacity(unit.resource_types.len());
        for name in &unit.resource_types {
            let registration = self
                .registry
                .lookup(name)
                .ok_or_else(|| CompositionError::UnknownResourceType(name.clone()))?;
            if registration.lister.is_none() {
                return Err(CompositionError::MissingLister(name.clone()).into());
            }
            if registration.scope != scope {
                return Err(Error::Other(format!(
                    "resource type {} is listed at scope {}, not {}",
                    registration.name, registration.scope, scope
                )));
            }
            canonical.push(registration.name.to_string());
        }
        unit.resource_types = canonical;

        debug!(
            "scope={} owner={} registered {} resource types",
            scope,
            unit.owner,
            unit.resource_types.len()
        );
        self.units.push(unit);
        Ok(())
    }

    /// List, filter and (unless dry-run) remove.
    ///
    /// Returns [`Error::RunFailed`] when any listing or removal did not succeed.
    pub async fn run(&self, cancel: &CancellationToken) -> Result<()> {
        if let Some(version) = &self.version {
            println!("{}", version);
        }
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }

        let mut scan = self.scan(cancel).await?;
        self.print_items(&scan.items);
        let tally = Tally::of(&scan.items);
        println!("{}", tally);

        if !self.params.no_dry_run {
            println!(
                "The above resources would be deleted with the supplied configuration. \
                 Provide --no-dry-run to actually destroy resources."
            );
            return outcome(&scan);
        }

        if tally.pending == 0 {
            println!("No resource to delete.");
            return outcome(&scan);
        }

        self.confirm(cancel).await?;
        self.remove_all(&mut scan, cancel).await?;

        println!("{}", Tally::of(&scan.items));
        outcome(&scan)
    }

    async fn scan(&self, cancel: &CancellationToken) -> Result<Scan> {
        let jobs: Vec<(usize, &str)> = self
            .units
            .iter()
            .enumerate()
            .flat_map(|(index, unit)| {
                unit.resource_types
                    .iter()
                    .map(move |name| (index, name.as_str()))
            })
            .collect();
        info!(
            "listing {} resource types across {} scanner units",
            jobs.len(),
            self.units.len()
        );

        let listings = run_bounded(
            jobs.clone(),
            |(index, resource_type)| self.list_type(index, resource_type, cancel),
            self.params.parallelism,
        )
        .await;

        let mut scan = Scan::default();
        for ((index, resource_type), listing) in jobs.into_iter().zip(listings) {
            let owner = &self.units[index].owner;
            match listing {
                Err(Error::Cancelled) => return Err(Error::Cancelled),
                Err(e) => {
                    error!("{} - {} - listing failed: {}", owner, resource_type, e);
                    scan.unit_failures += 1;
                    scan.failed_types.insert(resource_type.to_string());
                    scan.failed_units.insert(index);
                }
                Ok(resources) => {
                    debug!("{} - {} - found {}", owner, resource_type, resources.len());
                    for resource in resources {
                        let mut item = Item::new(index, resource_type, owner, resource);
                        item.state = self.evaluate(&item);
                        scan.items.push(item);
                    }
                }
            }
        }

        for item in scan
            .items
            .iter_mut()
            .filter(|item| scan.failed_units.contains(&item.unit) && item.state.is_pending())
        {
            item.state = ItemState::Blocked("listing failed in this unit".to_string());
        }

        Ok(scan)
    }

    async fn list_type(
        &self,
        index: usize,
        resource_type: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<Box<dyn Resource>>> {
        let unit = &self.units[index];
        let lister = self
            .registry
            .lookup(resource_type)
            .and_then(|registration| registration.lister.clone())
            .ok_or_else(|| CompositionError::MissingLister(resource_type.to_string()))?;

        debug!("r={} owner={} listing", resource_type, unit.owner);
        cancellable(cancel, lister.list(&unit.opts)).await
    }

    /// Pre-filter first, then the global and per-type config filters.
    fn evaluate(&self, item: &Item) -> ItemState {
        let pre_filter = self
            .registry
            .lookup(&item.resource_type)
            .and_then(|registration| registration.pre_filter);
        if let Some(pre_filter) = pre_filter {
            if let Err(reason) = pre_filter(&item.properties) {
                debug!("{} - skipped: {}", item, reason);
                return ItemState::Filtered(reason);
            }
        }

        let label = item.resource.to_string();
        let matched = [GLOBAL_FILTER_KEY, item.resource_type.as_str()]
            .iter()
            .filter_map(|key| self.filters.get(*key))
            .flatten()
            .find(|filter| filter.matches(&label, &item.properties));

        match matched {
            Some(filter) => ItemState::Filtered(filter.to_string()),
            None => ItemState::New,
        }
    }

    fn print_items(&self, items: &[Item]) {
        let dry_run = !self.params.no_dry_run;
        for item in items {
            if self.params.quiet && matches!(item.state, ItemState::Filtered(_)) {
                continue;
            }
            println!("{}", item.line(dry_run));
        }
    }

    /// Run the prompt off the async runtime; cancellation wins over a pending answer.
    async fn confirm(&self, cancel: &CancellationToken) -> Result<()> {
        let Some(prompt) = self.prompt.clone() else {
            return Ok(());
        };

        let answer = tokio::task::spawn_blocking(move || prompt());
        tokio::select! {
            _ = cancel.cancelled() => Err(Error::Cancelled),
            joined = answer => joined.map_err(|e| Error::Other(format!("prompt failed: {}", e)))?,
        }
    }

    async fn remove_all(&self, scan: &mut Scan, cancel: &CancellationToken) -> Result<()> {
        let types: Vec<String> = scan
            .items
            .iter()
            .map(|item| item.resource_type.clone())
            .chain(scan.failed_types.iter().cloned())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let layers = dependency::layers(&self.registry, &types)?;
        for (depth, layer) in layers.iter().enumerate() {
            debug!("layer {}: {}", depth, layer.join(", "));
            for resource_type in layer {
                self.block_unfinished(scan, resource_type);
            }

            self.remove_layer(scan, layer, cancel).await?;

            if self.params.wait_on_dependencies {
                self.await_absence(scan, layer, cancel).await?;
            }
        }

        Ok(())
    }

    /// Block pending items of `resource_type` when a dependency failed or could not be listed.
    fn block_unfinished(&self, scan: &mut Scan, resource_type: &str) {
        let Some(registration) = self.registry.lookup(resource_type) else {
            return;
        };

        let unfinished = registration.depends_on.iter().copied().find(|dependency| {
            scan.failed_types.contains(*dependency)
                || scan
                    .items
                    .iter()
                    .any(|item| item.resource_type == *dependency && item.state.is_unfinished())
        });
        let Some(dependency) = unfinished else {
            return;
        };

        for item in scan
            .items
            .iter_mut()
            .filter(|item| item.resource_type == resource_type && item.state.is_pending())
        {
            item.state = ItemState::Blocked(format!("dependency {} did not finish", dependency));
            warn!("{}", item.line(false));
        }
    }

    /// Remove pending items of one layer, retrying for up to `max_passes` sweeps.
    async fn remove_layer(
        &self,
        scan: &mut Scan,
        layer: &[String],
        cancel: &CancellationToken,
    ) -> Result<()> {
        let in_layer = |item: &Item| item.state.is_pending() && layer.contains(&item.resource_type);
        let mut last_errors: BTreeMap<usize, String> = BTreeMap::new();

        for pass in 1..=self.params.max_passes.max(1) {
            let pending: Vec<usize> = scan
                .items
                .iter()
                .enumerate()
                .filter(|(_, item)| in_layer(*item))
                .map(|(index, _)| index)
                .collect();
            if pending.is_empty() {
                return Ok(());
            }

            if pass > 1 {
                info!("pass {}: retrying {} resources", pass, pending.len());
                pause(cancel, self.run_sleep).await?;
            }

            let items = &scan.items;
            let results = run_bounded(
                pending.clone(),
                |index| cancellable(cancel, items[index].resource.remove()),
                self.params.parallelism,
            )
            .await;

            for (index, result) in pending.into_iter().zip(results) {
                let item = &mut scan.items[index];
                match result {
                    Ok(()) => {
                        item.state = ItemState::Removed;
                        println!("{}", item.line(false));
                    }
                    Err(Error::Cancelled) => return Err(Error::Cancelled),
                    Err(e) => {
                        warn!("{} - pass {} - {}", item, pass, e);
                        last_errors.insert(index, e.to_string());
                    }
                }
            }
        }

        for (index, item) in scan.items.iter_mut().enumerate() {
            if in_layer(item) {
                let reason = last_errors
                    .remove(&index)
                    .unwrap_or_else(|| "not removed".to_string());
                item.state = ItemState::Failed(reason);
                println!("{}", item.line(false));
            }
        }

        Ok(())
    }

    /// Re-list the layer until removed instances no longer show up.
    async fn await_absence(
        &self,
        scan: &mut Scan,
        layer: &[String],
        cancel: &CancellationToken,
    ) -> Result<()> {
        let mut waiting: BTreeSet<usize> = scan
            .items
            .iter()
            .enumerate()
            .filter(|(_, item)| {
                item.state == ItemState::Removed && layer.contains(&item.resource_type)
            })
            .map(|(index, _)| index)
            .collect();

        for attempt in 1..=self.params.max_passes.max(1) {
            if waiting.is_empty() {
                return Ok(());
            }
            pause(cancel, self.run_sleep).await?;

            let jobs: Vec<(usize, String)> = waiting
                .iter()
                .map(|&index| (scan.items[index].unit, scan.items[index].resource_type.clone()))
                .collect::<BTreeSet<_>>()
                .into_iter()
                .collect();

            let listings = run_bounded(
                jobs.clone(),
                |(unit, resource_type)| async move {
                    self.list_type(unit, &resource_type, cancel).await
                },
                self.params.parallelism,
            )
            .await;

            let mut present: BTreeSet<(usize, String)> = BTreeSet::new();
            let mut unknown: BTreeSet<(usize, String)> = BTreeSet::new();
            for ((unit, resource_type), listing) in jobs.into_iter().zip(listings) {
                match listing {
                    Ok(resources) => {
                        present.extend(resources.iter().map(|r| (unit, r.id().to_lowercase())));
                    }
                    Err(Error::Cancelled) => return Err(Error::Cancelled),
                    Err(e) => {
                        warn!("r={} re-listing failed: {}", resource_type, e);
                        unknown.insert((unit, resource_type));
                    }
                }
            }

            waiting.retain(|&index| {
                let item = &scan.items[index];
                unknown.contains(&(item.unit, item.resource_type.clone()))
                    || present.contains(&(item.unit, item.resource.id().to_lowercase()))
            });
            debug!(
                "attempt {}: {} removed resources still present",
                attempt,
                waiting.len()
            );
        }

        for index in waiting {
            let item = &mut scan.items[index];
            item.state = ItemState::Failed("still present after removal".to_string());
            println!("{}", item.line(false));
        }

        Ok(())
    }
}

fn outcome(scan: &Scan) -> Result<()> {
    let tally = Tally::of(&scan.items);
    if tally.failed > 0 || tally.blocked > 0 || scan.unit_failures > 0 {
        return Err(Error::RunFailed {
            failed: tally.failed,
            blocked: tally.blocked,
            unit_failures: scan.unit_failures,
        });
    }
    Ok(())
}

/// Race `fut` against the cancellation token.
async fn cancellable<T>(
    cancel: &CancellationToken,
    fut: impl Future<Output = Result<T>>,
) -> Result<T> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(Error::Cancelled),
        result = fut => result,
    }
}

async fn pause(cancel: &CancellationToken, duration: Duration) -> Result<()> {
    if duration.is_zero() {
        return Ok(());
    }
    cancellable(cancel, async {
        tokio::time::sleep(duration).await;
        Ok(())
    })
    .await
}
