use std::{collections::HashMap, hash::Hash};

use vesper_shared::{ObserverKey, Point3D, Serial, ShardId};

use super::visibility_index::VisibilityIndex;

type SectorKey = (ShardId, i32, i32);

struct Sector<K> {
    members: Vec<(K, Point3D)>,
}

impl<K: Copy + Eq> Sector<K> {
    fn new() -> Self {
        Self {
            members: Vec::new(),
        }
    }

    fn remove(&mut self, key: &K) {
        self.members.retain(|(member, _)| member != key);
    }
}

/// Positions of one kind of occupant, bucketed into square sectors
struct SectorGrid<K: Copy + Eq + Hash> {
    sector_size: i32,
    sectors: HashMap<SectorKey, Sector<K>>,
    positions: HashMap<K, (ShardId, Point3D)>,
}

impl<K: Copy + Eq + Hash> SectorGrid<K> {
    fn new(sector_size: i32) -> Self {
        Self {
            sector_size: sector_size.max(1),
            sectors: HashMap::new(),
            positions: HashMap::new(),
        }
    }

    fn sector_of(&self, shard: ShardId, location: &Point3D) -> SectorKey {
        (
            shard,
            location.x.div_euclid(self.sector_size),
            location.y.div_euclid(self.sector_size),
        )
    }

    fn place(&mut self, key: K, shard: ShardId, location: Point3D) {
        self.remove(&key);
        let sector_key = self.sector_of(shard, &location);
        self.sectors
            .entry(sector_key)
            .or_insert_with(Sector::new)
            .members
            .push((key, location));
        self.positions.insert(key, (shard, location));
    }

    fn remove(&mut self, key: &K) {
        let Some((shard, location)) = self.positions.remove(key) else {
            return;
        };
        let sector_key = self.sector_of(shard, &location);
        if let Some(sector) = self.sectors.get_mut(&sector_key) {
            sector.remove(key);
            if sector.members.is_empty() {
                self.sectors.remove(&sector_key);
            }
        }
    }

    fn contains(&self, key: &K) -> bool {
        self.positions.contains_key(key)
    }

    fn query(&self, shard: ShardId, center: Point3D, radius: i32, out: &mut Vec<K>) {
        let radius = radius.max(0);
        let low = self.sector_of(shard, &Point3D::new(center.x - radius, center.y - radius, 0));
        let high = self.sector_of(shard, &Point3D::new(center.x + radius, center.y + radius, 0));
        for sector_x in low.1..=high.1 {
            for sector_y in low.2..=high.2 {
                let Some(sector) = self.sectors.get(&(shard, sector_x, sector_y)) else {
                    continue;
                };
                for (key, location) in &sector.members {
                    if location.in_range(&center, radius) {
                        out.push(*key);
                    }
                }
            }
        }
    }
}

/// Default [`VisibilityIndex`]: a fixed-size sector grid per shard
pub struct SectorIndex {
    observers: SectorGrid<ObserverKey>,
    entities: SectorGrid<Serial>,
}

impl SectorIndex {
    pub fn new(sector_size: i32) -> Self {
        Self {
            observers: SectorGrid::new(sector_size),
            entities: SectorGrid::new(sector_size),
        }
    }

    pub fn observers_count(&self) -> usize {
        self.observers.positions.len()
    }

    pub fn entities_count(&self) -> usize {
        self.entities.positions.len()
    }
}

impl VisibilityIndex for SectorIndex {
    fn place_observer(&mut self, key: ObserverKey, shard: ShardId, location: Point3D) {
        self.observers.place(key, shard, location);
    }

    fn remove_observer(&mut self, key: ObserverKey) {
        self.observers.remove(&key);
    }

    fn place_entity(&mut self, serial: Serial, shard: ShardId, location: Point3D) {
        self.entities.place(serial, shard, location);
    }

    fn remove_entity(&mut self, serial: Serial) {
        self.entities.remove(&serial);
    }

    fn contains_entity(&self, serial: Serial) -> bool {
        self.entities.contains(&serial)
    }

    fn observers_in_range(
        &self,
        shard: ShardId,
        center: Point3D,
        radius: i32,
        out: &mut Vec<ObserverKey>,
    ) {
        self.observers.query(shard, center, radius, out);
    }

    fn entities_in_range(&self, shard: ShardId, center: Point3D, radius: i32, out: &mut Vec<Serial>) {
        self.entities.query(shard, center, radius, out);
    }
}
