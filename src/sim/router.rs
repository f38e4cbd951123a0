//! Collision routing
//!
//! The physics world only knows body handles. The router keeps a table from
//! handle to owning entity so a contact can be turned into "this map point
//! and that wavefront point were hit".

use std::collections::{BTreeMap, HashMap};

use super::map::Map;
use super::wavefront::{Wavefront, WavefrontKey};
use crate::physics::{BodyHandle, CollisionPair};

/// Who a body belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyOwner {
    /// Index into `Map::points`
    MapPoint(usize),
    /// A point of this wavefront
    Wavefront(WavefrontKey),
}

/// Handle -> owner index, kept in sync with body creation and release
#[derive(Debug, Clone, Default)]
pub struct CollisionRouter {
    index: HashMap<BodyHandle, BodyOwner>,
}

impl CollisionRouter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, handle: BodyHandle, owner: BodyOwner) {
        if let Some(previous) = self.index.insert(handle, owner) {
            log::warn!("Handle {:?} re-registered ({:?} -> {:?})", handle, previous, owner);
        }
    }

    pub fn forget(&mut self, handle: BodyHandle) {
        self.index.remove(&handle);
    }

    pub fn owner(&self, handle: BodyHandle) -> Option<BodyOwner> {
        self.index.get(&handle).copied()
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Mark both sides of every pair as collided
    ///
    /// Returns how many entities were marked. A handle nobody owns is
    /// skipped; so is a handle whose owner has already let go of it.
    pub fn route(
        &self,
        pairs: &[CollisionPair],
        map: &mut Map,
        wavefronts: &mut BTreeMap<WavefrontKey, Wavefront>,
    ) -> usize {
        let mut marked = 0;
        for pair in pairs {
            for handle in [pair.0, pair.1] {
                if self.mark(handle, map, wavefronts) {
                    marked += 1;
                }
            }
        }
        marked
    }

    fn mark(
        &self,
        handle: BodyHandle,
        map: &mut Map,
        wavefronts: &mut BTreeMap<WavefrontKey, Wavefront>,
    ) -> bool {
        let found = match self.owner(handle) {
            Some(BodyOwner::MapPoint(i)) => match map.points.get_mut(i) {
                Some(point) if point.handle == handle => {
                    point.mark_collided();
                    true
                }
                _ => false,
            },
            Some(BodyOwner::Wavefront(key)) => {
                match wavefronts.get_mut(&key).and_then(|wf| wf.point_mut(handle)) {
                    Some(point) => {
                        point.mark_collided();
                        true
                    }
                    None => false,
                }
            }
            None => false,
        };
        if !found {
            log::trace!("Ignoring contact for unknown handle {:?}", handle);
        }
        found
    }
}
