use uuid::Uuid;

/// Identifies entities that expose a stable unique identifier.
pub trait Identifiable {
    fn id(&self) -> Uuid;
}

/// Index of the first entity carrying `id`.
pub fn position_by_id<T: Identifiable>(entities: &[T], id: Uuid) -> Option<usize> {
    entities.iter().position(|entity| entity.id() == id)
}
