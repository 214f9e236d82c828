use vesper_shared::{ObserverKey, Point3D, Serial, ShardId};

/// Spatial lookup of who and what is near a point. Only root entities are
/// placed here; contained entities are found through their root.
pub trait VisibilityIndex {
    fn place_observer(&mut self, key: ObserverKey, shard: ShardId, location: Point3D);

    fn remove_observer(&mut self, key: ObserverKey);

    fn place_entity(&mut self, serial: Serial, shard: ShardId, location: Point3D);

    fn remove_entity(&mut self, serial: Serial);

    fn contains_entity(&self, serial: Serial) -> bool;

    /// Appends every observer whose position is within the inclusive square
    /// `radius` of `center` to `out`. The buffer is owned by the caller and
    /// reused across queries.
    fn observers_in_range(
        &self,
        shard: ShardId,
        center: Point3D,
        radius: i32,
        out: &mut Vec<ObserverKey>,
    );

    fn entities_in_range(&self, shard: ShardId, center: Point3D, radius: i32, out: &mut Vec<Serial>);
}
