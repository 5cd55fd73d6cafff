//! Staged edits — merge bursts of single-field changes into one commit.
//!
//! Each snapshot mutation and the write it produces are handled inside the
//! same registry critical section, so writes for one light reach the queue in
//! the order the snapshot changed. When the write cannot be queued the light
//! is left as it was before the call.

use glowhub_domain::color::Hsbk;
use glowhub_domain::command::CommandKind;
use glowhub_domain::error::GlowHubError;
use glowhub_domain::event::HubEvent;
use glowhub_domain::id::{CommandId, DeviceAddress};
use glowhub_domain::light::LightDevice;
use glowhub_domain::staging::{Field, FieldEdit, StagedSnapshot};
use glowhub_domain::transition::TransitionTime;

use crate::ports::EventPublisher;
use crate::queue::CommandQueue;
use crate::registry::LightRegistry;

pub struct EditService<P> {
    registry: LightRegistry,
    queue: CommandQueue,
    publisher: P,
}

impl<P: EventPublisher> EditService<P> {
    pub fn new(registry: LightRegistry, queue: CommandQueue, publisher: P) -> Self {
        Self {
            registry,
            queue,
            publisher,
        }
    }

    /// Open an edit burst on the light, or return the one already open.
    ///
    /// # Errors
    ///
    /// Returns [`GlowHubError::NotFound`] for unknown addresses.
    pub fn begin_or_continue_edit(
        &self,
        address: &DeviceAddress,
    ) -> Result<StagedSnapshot, GlowHubError> {
        self.registry
            .update(address, |light| light.begin_or_continue_edit().clone())
    }

    /// Parse `raw`, stage it into `field` and queue the matching write.
    ///
    /// A duration that does not parse is staged as zero.
    ///
    /// # Errors
    ///
    /// Returns [`GlowHubError::Validation`] for an unparseable color or zone
    /// value, [`GlowHubError::Disconnected`] for an offline light, or
    /// [`GlowHubError::NotFound`] for unknown addresses.
    #[tracing::instrument(skip(self, address), fields(address = %address))]
    pub fn edit_field(
        &self,
        address: &DeviceAddress,
        field: Field,
        raw: &str,
    ) -> Result<CommandId, GlowHubError> {
        let edit = FieldEdit::parse(field, raw)?;
        self.stage(address, |light| light.edit_field(edit))
    }

    /// Stage a whole color for `zone` (`0` for all zones) on a multi-zone
    /// light and queue the matching write. The zone selection is unchanged.
    ///
    /// # Errors
    ///
    /// Same as [`edit_field`](Self::edit_field), plus
    /// [`ValidationError::ZonesUnsupported`](glowhub_domain::error::ValidationError::ZonesUnsupported)
    /// for single-zone lights.
    pub fn stage_zone_color(
        &self,
        address: &DeviceAddress,
        zone: u16,
        color: Hsbk,
        raw_duration: &str,
    ) -> Result<CommandId, GlowHubError> {
        let duration = TransitionTime::parse_lenient(raw_duration);
        self.stage(address, |light| light.stage_zone_color(zone, color, duration))
    }

    /// Make the staged snapshot the live state and queue its final write.
    ///
    /// Returns `None` without queueing anything when no edit is open, so a
    /// repeated commit is harmless.
    ///
    /// # Errors
    ///
    /// Returns [`GlowHubError::NotFound`] for unknown addresses or
    /// [`GlowHubError::QueueClosed`] when the worker has stopped.
    #[tracing::instrument(skip(self, address), fields(address = %address))]
    pub async fn commit(&self, address: &DeviceAddress) -> Result<Option<CommandId>, GlowHubError> {
        let committed = self.registry.try_update(address, |light| {
            light
                .commit()
                .map(|kind| {
                    self.queue
                        .submit(address.clone(), kind)
                        .map(|id| (id, light.state()))
                })
                .transpose()
        })?;

        let Some((id, state)) = committed else {
            tracing::debug!("nothing staged, commit ignored");
            return Ok(None);
        };
        tracing::debug!(command = %id, "edit committed");
        self.publisher.publish(HubEvent::LightChanged(state)).await;
        Ok(Some(id))
    }

    /// Throw the staged snapshot away. Returns whether one was open.
    ///
    /// # Errors
    ///
    /// Returns [`GlowHubError::NotFound`] for unknown addresses.
    pub fn discard(&self, address: &DeviceAddress) -> Result<bool, GlowHubError> {
        self.registry.update(address, LightDevice::discard)
    }

    fn stage(
        &self,
        address: &DeviceAddress,
        mutate: impl FnOnce(&mut LightDevice) -> Result<CommandKind, GlowHubError>,
    ) -> Result<CommandId, GlowHubError> {
        self.registry.try_update(address, |light| {
            let kind = mutate(light)?;
            self.queue.submit(address.clone(), kind)
        })
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::medium::SharedMedium;
    use crate::queue::Worker;
    use crate::testing::{FakeTransport, RecordingPublisher};
    use glowhub_domain::color::ColorState;
    use glowhub_domain::error::ValidationError;
    use glowhub_domain::time::now;

    struct Harness {
        edits: EditService<RecordingPublisher>,
        queue: CommandQueue,
        fake: FakeTransport,
        registry: LightRegistry,
    }

    fn harness(colors: ColorState) -> Harness {
        let address = addr();
        let fake = FakeTransport::default();
        fake.add_light(&address, colors.clone());
        let registry = LightRegistry::new();
        registry
            .insert_light(
                LightDevice::builder()
                    .address(address)
                    .label("Desk")
                    .colors(colors)
                    .build()
                    .unwrap(),
            )
            .unwrap();
        let publisher = RecordingPublisher::default();
        let (queue, receiver) = CommandQueue::channel();
        Worker::new(
            receiver,
            SharedMedium::new(fake.clone(), Duration::from_secs(1)),
            registry.clone(),
            publisher.clone(),
        )
        .spawn();
        Harness {
            edits: EditService::new(registry.clone(), queue.clone(), publisher),
            queue,
            fake,
            registry,
        }
    }

    fn addr() -> DeviceAddress {
        DeviceAddress::from_mac("d0:73:d5:00:00:01")
    }

    #[tokio::test]
    async fn should_queue_full_color_for_each_field_edit() {
        let h = harness(ColorState::Single(Hsbk::new(0, 0, 100, 3500)));

        h.edits.edit_field(&addr(), Field::Hue, "120").unwrap();
        h.edits.edit_field(&addr(), Field::Duration, "300").unwrap();
        h.edits.edit_field(&addr(), Field::Brightness, "900").unwrap();
        h.queue.flush().await.unwrap();

        assert_eq!(
            h.fake.writes(),
            vec![
                "write_color d073d5000001 120 0ms",
                "write_color d073d5000001 120 300ms",
                "write_color d073d5000001 120 300ms",
            ]
        );
        let light = h.registry.get(&addr()).unwrap();
        assert!(light.is_pending());
        assert_eq!(light.colors(), &ColorState::Single(Hsbk::new(0, 0, 100, 3500)));
    }

    #[tokio::test]
    async fn should_commit_once_and_ignore_repeated_commit() {
        let h = harness(ColorState::Single(Hsbk::default()));
        h.edits.edit_field(&addr(), Field::Kelvin, "2700").unwrap();

        let first = h.edits.commit(&addr()).await.unwrap();
        let submitted = h.queue.stats().submitted;
        let second = h.edits.commit(&addr()).await.unwrap();

        assert!(first.is_some());
        assert!(second.is_none());
        assert_eq!(h.queue.stats().submitted, submitted);
        let light = h.registry.get(&addr()).unwrap();
        assert!(!light.is_pending());
        assert_eq!(light.colors(), &ColorState::Single(Hsbk::new(0, 0, 0, 2700)));
    }

    #[tokio::test]
    async fn should_stage_zero_duration_for_garbage() {
        let h = harness(ColorState::Single(Hsbk::default()));

        h.edits.edit_field(&addr(), Field::Duration, "soon").unwrap();

        let staged = h.edits.begin_or_continue_edit(&addr()).unwrap();
        assert_eq!(staged.duration(), TransitionTime::ZERO);
    }

    #[tokio::test]
    async fn should_reject_malformed_color_without_staging() {
        let h = harness(ColorState::Single(Hsbk::default()));

        let result = h.edits.edit_field(&addr(), Field::Hue, "red");

        assert!(matches!(
            result,
            Err(GlowHubError::Validation(ValidationError::MalformedField { .. }))
        ));
        assert!(!h.registry.get(&addr()).unwrap().is_pending());
        assert_eq!(h.queue.stats().submitted, 0);
    }

    #[tokio::test]
    async fn should_write_edited_zone_only() {
        let h = harness(ColorState::Zones(vec![Hsbk::default(); 4]));

        h.edits.edit_field(&addr(), Field::Zone, "2").unwrap();
        h.edits.edit_field(&addr(), Field::Hue, "77").unwrap();
        h.edits.commit(&addr()).await.unwrap();
        h.queue.flush().await.unwrap();

        let writes = h.fake.writes();
        assert_eq!(writes[1], "write_zone_color d073d5000001 1..=1 77 0ms");
        assert_eq!(writes[2], "write_zone_colors d073d5000001 4 0ms");
        let light = h.registry.get(&addr()).unwrap();
        assert_eq!(light.colors().as_slice()[1].hue, 77);
        assert_eq!(light.colors().as_slice()[0].hue, 0);
        assert_eq!(light.projected_color().hue, 77);
    }

    #[tokio::test]
    async fn should_stage_zone_color_without_moving_selection() {
        let h = harness(ColorState::Zones(vec![Hsbk::default(); 3]));

        h.edits
            .stage_zone_color(&addr(), 3, Hsbk::new(5, 5, 5, 5), "50")
            .unwrap();

        let staged = h.edits.begin_or_continue_edit(&addr()).unwrap();
        assert!(staged.zone().is_all());
        assert_eq!(staged.colors().as_slice()[2], Hsbk::new(5, 5, 5, 5));
        assert_eq!(staged.duration(), TransitionTime::from_millis(50));
    }

    #[tokio::test]
    async fn should_refuse_edit_on_offline_light() {
        let h = harness(ColorState::Single(Hsbk::default()));
        h.registry
            .update(&addr(), |l| l.record_poll_failure(now(), Duration::from_secs(60)))
            .unwrap();

        let result = h.edits.edit_field(&addr(), Field::Hue, "1");

        assert!(matches!(result, Err(GlowHubError::Disconnected(_))));
    }

    #[tokio::test]
    async fn should_keep_staged_edit_when_commit_cannot_be_queued() {
        let h = harness(ColorState::Single(Hsbk::default()));
        h.edits.edit_field(&addr(), Field::Kelvin, "2700").unwrap();
        let (closed, receiver) = CommandQueue::channel();
        drop(receiver);
        let edits = EditService::new(h.registry.clone(), closed, RecordingPublisher::default());

        let result = edits.commit(&addr()).await;

        assert!(matches!(result, Err(GlowHubError::QueueClosed)));
        let light = h.registry.get(&addr()).unwrap();
        assert!(light.is_pending());
        assert_eq!(light.staged().unwrap().colors().as_slice()[0].kelvin, 2700);
        assert_eq!(light.colors(), &ColorState::Single(Hsbk::default()));
    }

    #[tokio::test]
    async fn should_not_open_edit_when_write_cannot_be_queued() {
        let h = harness(ColorState::Single(Hsbk::default()));
        let (closed, receiver) = CommandQueue::channel();
        drop(receiver);
        let edits = EditService::new(h.registry.clone(), closed, RecordingPublisher::default());

        let result = edits.edit_field(&addr(), Field::Hue, "10");

        assert!(matches!(result, Err(GlowHubError::QueueClosed)));
        assert!(!h.registry.get(&addr()).unwrap().is_pending());
    }

    #[tokio::test]
    async fn should_discard_open_edit() {
        let h = harness(ColorState::Single(Hsbk::default()));
        h.edits.edit_field(&addr(), Field::Hue, "1").unwrap();

        assert!(h.edits.discard(&addr()).unwrap());
        assert!(h.edits.commit(&addr()).await.unwrap().is_none());
    }
}
