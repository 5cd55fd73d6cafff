//! Direct light control — power and whole-light color changes that bypass
//! the staged edit.

use glowhub_domain::color::{ColorPreset, Hsbk};
use glowhub_domain::command::CommandKind;
use glowhub_domain::error::GlowHubError;
use glowhub_domain::id::{CommandId, DeviceAddress};
use glowhub_domain::transition::TransitionTime;

use crate::queue::CommandQueue;
use crate::registry::LightRegistry;

pub struct ControlService {
    registry: LightRegistry,
    queue: CommandQueue,
}

impl ControlService {
    pub fn new(registry: LightRegistry, queue: CommandQueue) -> Self {
        Self { registry, queue }
    }

    /// # Errors
    ///
    /// Returns [`GlowHubError::NotFound`] for unknown addresses.
    pub fn power_on(&self, address: &DeviceAddress) -> Result<CommandId, GlowHubError> {
        self.power(address, CommandKind::PowerOn)
    }

    /// # Errors
    ///
    /// Returns [`GlowHubError::NotFound`] for unknown addresses.
    pub fn power_off(&self, address: &DeviceAddress) -> Result<CommandId, GlowHubError> {
        self.power(address, CommandKind::PowerOff)
    }

    /// Set the light to `color`, dropping any staged edit. A multi-zone
    /// light is painted on its selected zone only, or on every zone when
    /// all are selected.
    ///
    /// `raw_duration` falls back to zero when it does not parse; the value
    /// is remembered as the light's transition time. The light is left as it
    /// was when the write cannot be queued.
    ///
    /// # Errors
    ///
    /// Returns [`GlowHubError::Disconnected`] for an offline light,
    /// [`GlowHubError::NotFound`] for unknown addresses or
    /// [`GlowHubError::QueueClosed`] when the worker has stopped.
    #[tracing::instrument(skip(self, address), fields(address = %address))]
    pub fn set_color(
        &self,
        address: &DeviceAddress,
        color: Hsbk,
        raw_duration: &str,
    ) -> Result<CommandId, GlowHubError> {
        let duration = TransitionTime::parse_lenient(raw_duration);
        self.registry.try_update(address, |light| {
            let kind = light.prepare_color(color, duration)?;
            self.queue.submit(address.clone(), kind)
        })
    }

    /// Apply one of the named colors, keeping the light's transition time.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::UnknownPreset`](glowhub_domain::error::ValidationError::UnknownPreset)
    /// for an index outside the palette, otherwise as [`set_color`](Self::set_color).
    pub fn set_preset(&self, address: &DeviceAddress, index: u8) -> Result<CommandId, GlowHubError> {
        let preset = ColorPreset::from_index(index)?;
        tracing::debug!(address = %address, preset = preset.name(), "applying preset");
        self.registry.try_update(address, |light| {
            let kind = light.prepare_color(preset.hsbk(), light.duration())?;
            self.queue.submit(address.clone(), kind)
        })
    }

    fn power(&self, address: &DeviceAddress, kind: CommandKind) -> Result<CommandId, GlowHubError> {
        self.registry.inspect(address, |_| ())?;
        self.queue.submit(address.clone(), kind)
    }
}
