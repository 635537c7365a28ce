use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use arc_swap::ArcSwap;
use parking_lot::Mutex;
use tracing::{debug, info, warn};
use tscat_core::{
    Catalog, CatalogIndex, FallbackChain, LocaleTag, Resolution, TranslationQuery,
    expand_locale_order, substitute_count,
};

use crate::error::{RuntimeError, RuntimeResult};
use crate::loader::{load_catalog, load_catalog_verified};
use crate::manifest::load_manifest;

/// Why observers are asked to re-resolve their strings.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RetranslateReason {
    Installed(LocaleTag),
    Uninstalled(LocaleTag),
    Reordered,
    ManifestApplied,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RetranslateEvent {
    pub generation: u64,
    pub reason: RetranslateReason,
}

/// Handle returned by [`CatalogManager::on_retranslate`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Subscription(u64);

type Observer = Arc<dyn Fn(&RetranslateEvent) + Send + Sync>;

#[derive(Clone, Debug)]
struct InstalledCatalog {
    index: Arc<CatalogIndex>,
    sequence: u64,
}

#[derive(Clone, Debug, Default)]
struct CatalogSet {
    installed: BTreeMap<String, InstalledCatalog>,
    order: Option<Vec<LocaleTag>>,
    next_sequence: u64,
}

impl CatalogSet {
    fn insert(&mut self, index: Arc<CatalogIndex>) {
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        self.installed.insert(
            index.locale().normalized().to_string(),
            InstalledCatalog { index, sequence },
        );
    }

    fn links(&self) -> Vec<Arc<CatalogIndex>> {
        match &self.order {
            Some(order) => expand_locale_order(order)
                .iter()
                .filter_map(|tag| self.installed.get(tag.normalized()))
                .map(|installed| Arc::clone(&installed.index))
                .collect(),
            None => {
                let mut installed: Vec<&InstalledCatalog> = self.installed.values().collect();
                installed.sort_by(|a, b| b.sequence.cmp(&a.sequence));

                // Languages keep most-recent-first order; inside a language a
                // tag always precedes its truncations.
                let mut languages: Vec<(&str, Vec<&InstalledCatalog>)> = Vec::new();
                for catalog in installed {
                    let language = catalog.index.locale().language();
                    match languages.iter_mut().find(|(name, _)| *name == language) {
                        Some((_, members)) => members.push(catalog),
                        None => languages.push((language, vec![catalog])),
                    }
                }
                languages
                    .into_iter()
                    .flat_map(|(_, mut members)| {
                        members.sort_by_key(|member| {
                            std::cmp::Reverse(member.index.locale().match_subtags().len())
                        });
                        members
                    })
                    .map(|installed| Arc::clone(&installed.index))
                    .collect()
            }
        }
    }
}

/// One published state of a [`CatalogManager`]. A snapshot never changes;
/// every lookup made through the same snapshot sees the same catalogs.
#[derive(Debug)]
pub struct ChainSnapshot {
    generation: u64,
    chain: FallbackChain,
    catalogs: CatalogSet,
}

impl ChainSnapshot {
    fn assemble(generation: u64, catalogs: CatalogSet) -> Self {
        Self {
            generation,
            chain: FallbackChain::new(catalogs.links()),
            catalogs,
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn chain(&self) -> &FallbackChain {
        &self.chain
    }

    /// The order set with [`CatalogManager::set_locale_order`], before
    /// expansion. `None` means languages most recently installed first, each
    /// tag ahead of its truncations.
    pub fn locale_order(&self) -> Option<&[LocaleTag]> {
        self.catalogs.order.as_deref()
    }

    pub fn installed(&self) -> impl Iterator<Item = &LocaleTag> {
        self.catalogs
            .installed
            .values()
            .map(|installed| installed.index.locale())
    }

    pub fn catalog(&self, locale: &LocaleTag) -> Option<&Arc<CatalogIndex>> {
        self.catalogs
            .installed
            .get(locale.normalized())
            .map(|installed| &installed.index)
    }

    pub fn translate(
        &self,
        context: &str,
        source: &str,
        disambiguation: Option<&str>,
        count: Option<i64>,
    ) -> String {
        self.chain.lookup(context, source, disambiguation, count)
    }

    pub fn translate_n(
        &self,
        context: &str,
        source: &str,
        disambiguation: Option<&str>,
        count: i64,
    ) -> String {
        let text = self.chain.lookup(context, source, disambiguation, Some(count));
        substitute_count(&text, count)
    }

    pub fn resolve<'a>(&'a self, query: &TranslationQuery<'a>) -> Resolution<'a> {
        self.chain.resolve(query)
    }
}

/// Owns the installed catalogs and the fallback chain built from them.
///
/// Lookups read the current [`ChainSnapshot`] without taking a lock.
/// Writers build a new snapshot under a mutex and publish it with a single
/// atomic store, then notify retranslate observers outside every lock.
pub struct CatalogManager {
    current: ArcSwap<ChainSnapshot>,
    writer: Mutex<()>,
    observers: Mutex<Vec<(Subscription, Observer)>>,
    next_subscription: AtomicU64,
}

impl Default for CatalogManager {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for CatalogManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CatalogManager")
            .field("generation", &self.generation())
            .field("observers", &self.observers.lock().len())
            .finish()
    }
}

impl CatalogManager {
    pub fn new() -> Self {
        Self {
            current: ArcSwap::from_pointee(ChainSnapshot::assemble(0, CatalogSet::default())),
            writer: Mutex::new(()),
            observers: Mutex::new(Vec::new()),
            next_subscription: AtomicU64::new(0),
        }
    }

    pub fn from_manifest(path: &Path) -> RuntimeResult<Self> {
        let manager = Self::new();
        manager.apply_manifest(path)?;
        Ok(manager)
    }

    /// Loads every catalog a manifest lists, verifying content hashes where
    /// given, and publishes them together with the manifest's order. Any
    /// failure leaves the current chain as it was.
    pub fn apply_manifest(&self, path: &Path) -> RuntimeResult<()> {
        let manifest = load_manifest(path)?;
        let mut seen = BTreeSet::new();
        let mut indexes = Vec::with_capacity(manifest.catalogs.len());
        for entry in &manifest.catalogs {
            let locale = LocaleTag::parse(&entry.locale)?;
            if !seen.insert(locale.normalized().to_string()) {
                return Err(RuntimeError::DuplicateLocale {
                    locale: locale.to_string(),
                });
            }
            let catalog_path = entry.resolve_path(path);
            let catalog = load_catalog_verified(&catalog_path, entry.sha256.as_deref())
                .inspect_err(|err| {
                    if matches!(err, RuntimeError::HashMismatch(_)) {
                        warn!(locale = %locale, path = %catalog_path.display(), "catalog hash mismatch");
                    }
                })?;
            indexes.push(build_index(locale, catalog));
        }
        let order = parse_order(manifest.locale_order.as_slice())?;

        let count = indexes.len();
        let generation = self.publish(|catalogs| {
            for index in indexes {
                catalogs.insert(index);
            }
            if let Some(order) = order {
                catalogs.order = Some(order);
            }
            Some(RetranslateReason::ManifestApplied)
        });
        if let Some(generation) = generation {
            info!(manifest = %path.display(), catalogs = count, generation, "manifest applied");
        }
        Ok(())
    }

    /// Installs `catalog` under `locale`, replacing any catalog already
    /// installed for that locale.
    pub fn install(&self, locale: LocaleTag, catalog: Catalog) {
        let index = build_index(locale.clone(), catalog);
        let entries = index.len();
        let reason = RetranslateReason::Installed(locale.clone());
        let generation = self.publish(move |catalogs| {
            catalogs.insert(index);
            Some(reason)
        });
        if let Some(generation) = generation {
            info!(locale = %locale, entries, generation, "catalog installed");
        }
    }

    /// Reads and parses a `.ts` file, then installs it. Nothing is published
    /// when reading or parsing fails.
    pub fn install_catalog_from_file(&self, path: impl AsRef<Path>, locale: &str) -> RuntimeResult<()> {
        let locale = LocaleTag::parse(locale)?;
        let catalog = load_catalog(path.as_ref())?;
        self.install(locale, catalog);
        Ok(())
    }

    /// Returns `false`, without notifying anyone, when `locale` is not
    /// installed.
    pub fn uninstall_catalog(&self, locale: &str) -> bool {
        let Ok(locale) = LocaleTag::parse(locale) else {
            return false;
        };
        let generation = self.publish(|catalogs| {
            catalogs.installed.remove(locale.normalized())?;
            Some(RetranslateReason::Uninstalled(locale.clone()))
        });
        match generation {
            Some(generation) => {
                info!(locale = %locale, generation, "catalog uninstalled");
                true
            }
            None => false,
        }
    }

    /// Sets the preferred locales, most preferred first. Each is followed by
    /// its truncations during lookup, and locales not reachable this way are
    /// skipped. An empty list restores the default order.
    pub fn set_locale_order<S: AsRef<str>>(&self, locales: &[S]) -> RuntimeResult<()> {
        let order = parse_order(locales)?;
        let requested = order.as_ref().map_or(0, Vec::len);
        let generation = self.publish(move |catalogs| {
            catalogs.order = order;
            Some(RetranslateReason::Reordered)
        });
        if let Some(generation) = generation {
            let snapshot = self.snapshot();
            let chain: Vec<&str> = snapshot.chain().locales().map(LocaleTag::normalized).collect();
            info!(requested, chain = ?chain, generation, "locale order set");
        }
        Ok(())
    }

    pub fn on_retranslate<F>(&self, observer: F) -> Subscription
    where
        F: Fn(&RetranslateEvent) + Send + Sync + 'static,
    {
        let subscription = Subscription(self.next_subscription.fetch_add(1, Ordering::Relaxed));
        self.observers.lock().push((subscription, Arc::new(observer)));
        subscription
    }

    pub fn remove_observer(&self, subscription: Subscription) -> bool {
        let mut observers = self.observers.lock();
        let before = observers.len();
        observers.retain(|(id, _)| *id != subscription);
        observers.len() != before
    }

    /// The current state. Holding the returned `Arc` keeps that state alive
    /// across later installs.
    pub fn snapshot(&self) -> Arc<ChainSnapshot> {
        self.current.load_full()
    }

    pub fn generation(&self) -> u64 {
        self.current.load().generation
    }

    pub fn translate(
        &self,
        context: &str,
        source: &str,
        disambiguation: Option<&str>,
        count: Option<i64>,
    ) -> String {
        self.current
            .load()
            .translate(context, source, disambiguation, count)
    }

    /// Like [`translate`](Self::translate), with `%n` replaced by `count`.
    pub fn translate_n(
        &self,
        context: &str,
        source: &str,
        disambiguation: Option<&str>,
        count: i64,
    ) -> String {
        self.current
            .load()
            .translate_n(context, source, disambiguation, count)
    }

    /// Applies `update` to a copy of the current catalogs and publishes the
    /// result as the next generation. `update` returning `None` means
    /// nothing changed.
    fn publish<F>(&self, update: F) -> Option<u64>
    where
        F: FnOnce(&mut CatalogSet) -> Option<RetranslateReason>,
    {
        let event = {
            let _writer = self.writer.lock();
            let current = self.current.load_full();
            let mut catalogs = current.catalogs.clone();
            let reason = update(&mut catalogs)?;
            let generation = current.generation + 1;
            self.current
                .store(Arc::new(ChainSnapshot::assemble(generation, catalogs)));
            RetranslateEvent { generation, reason }
        };
        self.notify(&event);
        Some(event.generation)
    }

    // Observers may run concurrently with a later writer, so the generation
    // in the event is the only ordering they can rely on.
    fn notify(&self, event: &RetranslateEvent) {
        let observers: Vec<Observer> = self
            .observers
            .lock()
            .iter()
            .map(|(_, observer)| Arc::clone(observer))
            .collect();
        debug!(generation = event.generation, observers = observers.len(), "retranslate");
        for observer in observers {
            observer(event);
        }
    }
}

fn build_index(locale: LocaleTag, catalog: Catalog) -> Arc<CatalogIndex> {
    if let Some(declared) = catalog.language()
        && declared.normalized() != locale.normalized()
    {
        warn!(locale = %locale, declared = %declared, "catalog language differs from install locale");
    }
    Arc::new(CatalogIndex::build(locale, catalog))
}

fn parse_order<S: AsRef<str>>(locales: &[S]) -> RuntimeResult<Option<Vec<LocaleTag>>> {
    if locales.is_empty() {
        return Ok(None);
    }
    let order = locales
        .iter()
        .map(|locale| LocaleTag::parse(locale.as_ref()))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Some(order))
}
