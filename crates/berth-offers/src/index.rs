//! The internal offer store.
//!
//! One instance per `OfferManager`, always accessed under the manager's
//! mutex. Keeps an offer reachable by id, host id, and hostname, plus the
//! static per-group bans. Snapshots are copied out so iteration never holds
//! the lock.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use berth_metrics::Counter;
use berth_state::{HostAttributes, HostId, HostOffer, OfferId, TaskGroupKey};

struct IndexedOffer {
    offer: Arc<HostOffer>,
    /// Insertion sequence; breaks ordering ties deterministically within a
    /// process run.
    seq: u64,
}

pub(crate) struct HostOffers {
    by_id: HashMap<OfferId, IndexedOffer>,
    id_by_host: HashMap<HostId, OfferId>,
    id_by_hostname: HashMap<String, OfferId>,
    banned: HashMap<OfferId, HashSet<TaskGroupKey>>,
    next_seq: u64,
    outstanding: Counter,
}

impl HostOffers {
    pub fn new(outstanding: Counter) -> Self {
        Self {
            by_id: HashMap::new(),
            id_by_host: HashMap::new(),
            id_by_hostname: HashMap::new(),
            banned: HashMap::new(),
            next_seq: 0,
            outstanding,
        }
    }

    pub fn get_by_host(&self, host_id: &HostId) -> Option<Arc<HostOffer>> {
        let id = self.id_by_host.get(host_id)?;
        self.by_id.get(id).map(|e| e.offer.clone())
    }

    pub fn contains(&self, id: &OfferId) -> bool {
        self.by_id.contains_key(id)
    }

    pub fn add(&mut self, offer: HostOffer) {
        let offer = Arc::new(offer);
        self.id_by_host.insert(offer.host_id.clone(), offer.id.clone());
        self.id_by_hostname
            .insert(offer.hostname.clone(), offer.id.clone());
        let seq = self.next_seq;
        self.next_seq += 1;
        self.by_id
            .insert(offer.id.clone(), IndexedOffer { offer, seq });
        self.outstanding.increment();
    }

    /// Removes an offer from every index, dropping its bans with it.
    pub fn remove(&mut self, id: &OfferId) -> Option<Arc<HostOffer>> {
        let removed = self.by_id.remove(id)?;
        self.id_by_host.remove(&removed.offer.host_id);
        self.id_by_hostname.remove(&removed.offer.hostname);
        self.banned.remove(id);
        self.outstanding.decrement();
        Some(removed.offer)
    }

    /// Records a static ban, but only for an offer that is still live.
    pub fn add_static_ban(&mut self, id: &OfferId, group_key: TaskGroupKey) {
        if self.by_id.contains_key(id) {
            self.banned.entry(id.clone()).or_default().insert(group_key);
        }
    }

    /// Re-indexes a host's live offer under new attributes so preference
    /// ordering stays correct.
    pub fn update_host_attributes(&mut self, attributes: &HostAttributes) {
        let Some(id) = self.id_by_hostname.get(&attributes.host).cloned() else {
            return;
        };
        if let Some(previous) = self.remove(&id) {
            let mut offer = (*previous).clone();
            offer.attributes = attributes.clone();
            self.add(offer);
        }
    }

    /// Point-in-time snapshot sorted by maintenance preference (active hosts
    /// first), ties broken by insertion order.
    pub fn snapshot(&self) -> Vec<Arc<HostOffer>> {
        let mut entries: Vec<_> = self.by_id.values().collect();
        entries.sort_by_key(|e| (e.offer.attributes.mode.preference_rank(), e.seq));
        entries.into_iter().map(|e| e.offer.clone()).collect()
    }

    /// Snapshot with offers statically banned for `group_key` filtered out.
    pub fn snapshot_for_group(&self, group_key: &TaskGroupKey) -> Vec<Arc<HostOffer>> {
        self.snapshot()
            .into_iter()
            .filter(|offer| {
                !self
                    .banned
                    .get(&offer.id)
                    .is_some_and(|groups| groups.contains(group_key))
            })
            .collect()
    }

    pub fn clear(&mut self) {
        self.by_id.clear();
        self.id_by_host.clear();
        self.id_by_hostname.clear();
        self.banned.clear();
        self.outstanding.set(0);
    }
}
