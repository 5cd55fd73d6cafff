//! Light registry — the in-memory population of lights and groups.
//!
//! Every read or mutation of a light happens inside one short critical
//! section that never spans an `.await`, so readers always see whole field
//! updates. Group membership is answered from a secondary index keyed by
//! [`GroupId`], kept in step with the light table under the same lock.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use glowhub_domain::error::{GlowHubError, NotFoundError};
use glowhub_domain::group::Group;
use glowhub_domain::id::{DeviceAddress, GroupId, GroupKey};
use glowhub_domain::light::{LightDevice, LightState};

#[derive(Debug, Default)]
struct Inner {
    lights: BTreeMap<DeviceAddress, LightDevice>,
    by_group: HashMap<GroupId, BTreeSet<DeviceAddress>>,
    groups: BTreeMap<GroupKey, Group>,
}

impl Inner {
    fn reindex(&mut self, address: &DeviceAddress, old: Option<GroupId>, new: Option<GroupId>) {
        if let Some(old) = old.filter(|old| Some(old) != new.as_ref()) {
            if let Some(members) = self.by_group.get_mut(&old) {
                members.remove(address);
            }
        }
        if let Some(new) = new {
            self.by_group.entry(new).or_default().insert(address.clone());
        }
    }
}

/// Shared, cheaply cloneable registry of lights and groups.
#[derive(Debug, Clone, Default)]
pub struct LightRegistry {
    inner: Arc<RwLock<Inner>>,
}

fn light_not_found(address: &DeviceAddress) -> GlowHubError {
    NotFoundError {
        entity: "Light",
        id: address.to_string(),
    }
    .into()
}

impl LightRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a light, replacing any previous one at the same address.
    ///
    /// Returns `true` when the address was not known before.
    ///
    /// # Errors
    ///
    /// Returns [`GlowHubError::Validation`] if the light breaks an invariant.
    pub fn insert_light(&self, light: LightDevice) -> Result<bool, GlowHubError> {
        light.validate()?;
        let mut inner = self.write();
        let address = light.address().clone();
        let group = light.group().cloned();
        let previous = inner.lights.insert(address.clone(), light);
        let old_group = previous.as_ref().and_then(LightDevice::group).cloned();
        inner.reindex(&address, old_group, group);
        Ok(previous.is_none())
    }

    /// Move a known light to `group`, keeping the membership index in step.
    ///
    /// Returns `true` when the light changed group.
    ///
    /// # Errors
    ///
    /// Returns [`GlowHubError::NotFound`] for unknown addresses.
    pub fn move_to_group(&self, address: &DeviceAddress, group: GroupId) -> Result<bool, GlowHubError> {
        let mut inner = self.write();
        let light = inner
            .lights
            .get_mut(address)
            .ok_or_else(|| light_not_found(address))?;
        let old_group = light.group().cloned();
        if !light.move_to_group(group.clone()) {
            return Ok(false);
        }
        inner.reindex(address, old_group, Some(group));
        Ok(true)
    }

    /// Register a group unless one with the same key exists.
    ///
    /// Returns `true` when the group was added.
    pub fn insert_group(&self, group: Group) -> bool {
        let mut inner = self.write();
        if inner.groups.contains_key(&group.key) {
            return false;
        }
        inner.groups.insert(group.key.clone(), group);
        true
    }

    #[must_use]
    pub fn contains(&self, address: &DeviceAddress) -> bool {
        self.read().lights.contains_key(address)
    }

    /// Clone of the light at `address`.
    ///
    /// # Errors
    ///
    /// Returns [`GlowHubError::NotFound`] for unknown addresses.
    pub fn get(&self, address: &DeviceAddress) -> Result<LightDevice, GlowHubError> {
        self.inspect(address, Clone::clone)
    }

    /// Run `f` against the light at `address` under the read lock.
    ///
    /// # Errors
    ///
    /// Returns [`GlowHubError::NotFound`] for unknown addresses.
    pub fn inspect<R>(
        &self,
        address: &DeviceAddress,
        f: impl FnOnce(&LightDevice) -> R,
    ) -> Result<R, GlowHubError> {
        self.read()
            .lights
            .get(address)
            .map(f)
            .ok_or_else(|| light_not_found(address))
    }

    /// Run `f` against the light at `address` under the write lock.
    ///
    /// # Errors
    ///
    /// Returns [`GlowHubError::NotFound`] for unknown addresses.
    pub fn update<R>(
        &self,
        address: &DeviceAddress,
        f: impl FnOnce(&mut LightDevice) -> R,
    ) -> Result<R, GlowHubError> {
        self.write()
            .lights
            .get_mut(address)
            .map(f)
            .ok_or_else(|| light_not_found(address))
    }

    /// Run a fallible `f` against the light at `address` under the write
    /// lock. When `f` fails the light is restored to its state before the
    /// call.
    ///
    /// # Errors
    ///
    /// Returns [`GlowHubError::NotFound`] for unknown addresses, or the
    /// error of `f`.
    pub fn try_update<R>(
        &self,
        address: &DeviceAddress,
        f: impl FnOnce(&mut LightDevice) -> Result<R, GlowHubError>,
    ) -> Result<R, GlowHubError> {
        let mut inner = self.write();
        let light = inner
            .lights
            .get_mut(address)
            .ok_or_else(|| light_not_found(address))?;
        let before = light.clone();
        let result = f(light);
        if result.is_err() {
            *light = before;
        }
        result
    }

    #[must_use]
    pub fn addresses(&self) -> Vec<DeviceAddress> {
        self.read().lights.keys().cloned().collect()
    }

    #[must_use]
    pub fn states(&self) -> Vec<LightState> {
        self.read().lights.values().map(LightDevice::state).collect()
    }

    #[must_use]
    pub fn groups(&self) -> Vec<Group> {
        self.read().groups.values().cloned().collect()
    }

    /// Current members of the group with `key`, in address order.
    ///
    /// Computed on every call; nothing is cached.
    ///
    /// # Errors
    ///
    /// Returns [`GlowHubError::NotFound`] for unknown group keys.
    pub fn members(&self, key: &GroupKey) -> Result<Vec<DeviceAddress>, GlowHubError> {
        let inner = self.read();
        let group = inner.groups.get(key).ok_or_else(|| NotFoundError {
            entity: "Group",
            id: key.to_string(),
        })?;
        Ok(inner
            .by_group
            .get(&group.id)
            .map(|members| members.iter().cloned().collect())
            .unwrap_or_default())
    }

    fn read(&self) -> RwLockReadGuard<'_, Inner> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Inner> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }
}
