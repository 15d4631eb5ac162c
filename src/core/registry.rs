use crate::domain::vehicle::Vehicle;
use crate::utils::error::{RegistryError, Result};
use std::collections::BTreeMap;

/// In-memory vehicle registry keyed by id. Iteration is in ascending id order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VehicleDatabase {
    vehicles: BTreeMap<u64, Vehicle>,
}

impl VehicleDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, vehicle: Vehicle) -> Result<()> {
        self.insert(vehicle.id(), vehicle)
    }

    /// Inserts under an explicit key; used by import where the entry key is authoritative.
    pub(crate) fn insert(&mut self, id: u64, vehicle: Vehicle) -> Result<()> {
        if self.vehicles.contains_key(&id) {
            return Err(RegistryError::DuplicateId(id));
        }
        tracing::debug!("Adding vehicle #{} ({})", id, vehicle.tag());
        self.vehicles.insert(id, vehicle);
        Ok(())
    }

    pub fn get(&self, id: u64) -> Result<&Vehicle> {
        self.vehicles.get(&id).ok_or(RegistryError::NotFound(id))
    }

    /// Replaces the whole record stored under `id`.
    ///
    /// The replacement's own id is not checked against `id`, so the key and
    /// `vehicle.id()` can end up different.
    pub fn update(&mut self, id: u64, vehicle: Vehicle) -> Result<()> {
        let slot = self
            .vehicles
            .get_mut(&id)
            .ok_or(RegistryError::NotFound(id))?;

        if vehicle.id() != id {
            tracing::warn!(
                "Vehicle stored under #{} now reports id {}",
                id,
                vehicle.id()
            );
        }
        tracing::debug!("Updating vehicle #{}", id);
        *slot = vehicle;
        Ok(())
    }

    pub fn remove(&mut self, id: u64) -> Result<Vehicle> {
        let removed = self
            .vehicles
            .remove(&id)
            .ok_or(RegistryError::NotFound(id))?;
        tracing::debug!("Removed vehicle #{}", id);
        Ok(removed)
    }

    pub fn contains(&self, id: u64) -> bool {
        self.vehicles.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.vehicles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vehicles.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = u64> + '_ {
        self.vehicles.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (u64, &Vehicle)> {
        self.vehicles.iter().map(|(id, vehicle)| (*id, vehicle))
    }

    pub fn clear(&mut self) {
        self.vehicles.clear();
    }
}
