//! The offer manager.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tracing::{debug, info};

use berth_metrics::{Counter, MetricsRegistry};
use berth_resources::ResourceSlot;
use berth_state::{HostAttributes, HostId, HostOffer, OfferId, TaskGroupKey};

use crate::error::{LaunchError, LaunchResult};
use crate::index::HostOffers;

/// Counter names exported by the offer manager.
const OFFER_RACES: &str = "offer_accept_races";
const OUTSTANDING_OFFERS: &str = "outstanding_offers";

/// The launchable unit handed to the driver. Building one from a
/// `TaskConfig` is the assigner's job, not this crate's.
#[derive(Debug, Clone)]
pub struct TaskLaunch {
    pub task_id: String,
    pub resources: ResourceSlot,
}

/// Integration with the cluster resource manager.
pub trait OfferDriver: Send + Sync {
    /// Returns an offer to the resource manager.
    fn decline(&self, offer_id: &OfferId);

    /// Launches a task against an offer.
    fn launch(&self, offer_id: &OfferId, task: &TaskLaunch) -> anyhow::Result<()>;
}

/// Computes the hold time for each received offer; may be fixed or derived
/// from the offer itself.
pub type ReturnDelay = Box<dyn Fn(&HostOffer) -> Duration + Send + Sync>;

/// Offer manager settings.
pub struct OfferSettings {
    pub return_delay: ReturnDelay,
}

impl OfferSettings {
    /// Settings holding every offer for the same fixed delay.
    pub fn fixed_return_delay(delay: Duration) -> Self {
        Self {
            return_delay: Box::new(move |_| delay),
        }
    }
}

/// Tracks the offers the scheduler is currently holding.
///
/// Cloning is cheap and yields a handle to the same state; timer-deferred
/// declines hold such a clone, so the manager must be created inside a tokio
/// runtime.
#[derive(Clone)]
pub struct OfferManager {
    inner: Arc<Inner>,
}

struct Inner {
    driver: Arc<dyn OfferDriver>,
    settings: OfferSettings,
    offers: Mutex<HostOffers>,
    races: Counter,
}

impl OfferManager {
    pub fn new(
        driver: Arc<dyn OfferDriver>,
        settings: OfferSettings,
        metrics: &MetricsRegistry,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                driver,
                settings,
                offers: Mutex::new(HostOffers::new(metrics.counter(OUTSTANDING_OFFERS))),
                races: metrics.counter(OFFER_RACES),
            }),
        }
    }

    /// Accepts a new offer.
    ///
    /// A host may hold at most one live offer. When a second offer arrives
    /// for a host we decline both so the resource manager can merge them
    /// into a single offer and resend. A concurrent add for the same host
    /// can briefly leave two offers live; the return-delay pass declines the
    /// extras.
    pub fn add_offer(&self, offer: HostOffer) {
        let existing = {
            let offers = self.inner.offers.lock().unwrap();
            offers.get_by_host(&offer.host_id)
        };

        if let Some(existing) = existing {
            info!(host = %offer.hostname, "returning same-host offers for compaction");
            self.inner.driver.decline(&offer.id);
            self.remove_and_decline(&existing.id);
            return;
        }

        let delay = (self.inner.settings.return_delay)(&offer);
        let id = offer.id.clone();
        self.inner.offers.lock().unwrap().add(offer);

        let manager = self.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            manager.remove_and_decline(&id);
        });
    }

    /// Invalidates an offer without declining it; the resource manager
    /// already reclaimed it.
    pub fn cancel_offer(&self, offer_id: &OfferId) {
        let removed = self.inner.offers.lock().unwrap().remove(offer_id);
        if removed.is_some() {
            debug!(%offer_id, "offer cancelled");
        }
    }

    /// Excludes an offer from future matching attempts by one equivalence
    /// class. Cleared automatically when the offer is removed.
    pub fn ban_offer(&self, offer_id: &OfferId, group_key: TaskGroupKey) {
        self.inner
            .offers
            .lock()
            .unwrap()
            .add_static_ban(offer_id, group_key);
    }

    /// Snapshot of all held offers, best placement candidates first.
    pub fn get_offers(&self) -> Vec<Arc<HostOffer>> {
        self.inner.offers.lock().unwrap().snapshot()
    }

    /// Snapshot of offers eligible for `group_key` (static bans filtered).
    pub fn get_offers_for_group(&self, group_key: &TaskGroupKey) -> Vec<Arc<HostOffer>> {
        self.inner.offers.lock().unwrap().snapshot_for_group(group_key)
    }

    /// The live offer for a host, if any.
    pub fn get_offer(&self, host_id: &HostId) -> Option<Arc<HostOffer>> {
        self.inner.offers.lock().unwrap().get_by_host(host_id)
    }

    /// Atomically claims an offer and launches a task against it.
    ///
    /// If the offer was already removed by a concurrent cancel or expiry,
    /// returns `LaunchError::OfferGone` and counts the race; no state is
    /// mutated for the task, which stays pending and will be retried.
    pub fn launch_task(&self, offer_id: &OfferId, task: &TaskLaunch) -> LaunchResult<()> {
        let removed = self.inner.offers.lock().unwrap().remove(offer_id);
        match removed {
            Some(_) => {
                debug!(%offer_id, task_id = %task.task_id, "launching task");
                self.inner
                    .driver
                    .launch(offer_id, task)
                    .map_err(LaunchError::Driver)
            }
            None => {
                self.inner.races.increment();
                Err(LaunchError::OfferGone(offer_id.clone()))
            }
        }
    }

    /// Re-indexes a host's live offer after an attribute change so the
    /// maintenance-preference ordering stays correct.
    pub fn host_attributes_changed(&self, attributes: &HostAttributes) {
        self.inner
            .offers
            .lock()
            .unwrap()
            .update_host_attributes(attributes);
    }

    /// Flushes every held offer; they are all invalid once the driver
    /// connection is lost.
    pub fn driver_disconnected(&self) {
        info!("clearing stale offers, driver disconnected");
        self.inner.offers.lock().unwrap().clear();
    }

    fn remove_and_decline(&self, offer_id: &OfferId) {
        let removed = self.inner.offers.lock().unwrap().remove(offer_id);
        if removed.is_some() {
            debug!(%offer_id, "declining offer");
            self.inner.driver.decline(offer_id);
        }
    }
}
