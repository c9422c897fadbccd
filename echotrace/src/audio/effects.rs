use crate::acoustics::{AcousticAggregator, EffectSlot, ReverbEffectParams};
use crate::audio::backend::{AudioBackend, EffectId};
use crate::error::Result;

/// Backend reverb effects, one per aggregator slot.
#[derive(Debug, Default)]
pub struct EffectBank {
    listener: Option<EffectId>,
    outside: Option<EffectId>,
    grouped: Vec<Option<EffectId>>,
}

impl EffectBank {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot_mut(&mut self, slot: EffectSlot) -> &mut Option<EffectId> {
        match slot {
            EffectSlot::Listener => &mut self.listener,
            EffectSlot::Outside => &mut self.outside,
            EffectSlot::Grouped(index) => {
                if self.grouped.len() <= index {
                    self.grouped.resize(index + 1, None);
                }
                &mut self.grouped[index]
            }
        }
    }

    /// Pushes every dirty aggregator slot to the backend, creating effects
    /// on first use and deleting effects for evicted outside or grouped zones.
    /// Returns the number of effects touched.
    pub fn sync(
        &mut self,
        aggregator: &mut AcousticAggregator,
        backend: &mut dyn AudioBackend,
    ) -> usize {
        if aggregator.state(EffectSlot::Outside).is_none() {
            if let Some(effect) = self.outside.take() {
                backend.delete_reverb_effect(effect);
                log::debug!("Deleted reverb effect {} of evicted outside zone", effect);
            }
        }
        while self.grouped.len() > aggregator.grouped_count() {
            if let Some(effect) = self.grouped.pop().flatten() {
                backend.delete_reverb_effect(effect);
                log::debug!("Deleted reverb effect {} of evicted grouped zone", effect);
            }
        }

        let mut touched = 0;
        for (slot, params) in aggregator.drain_dirty() {
            let entry = self.slot_mut(slot);
            match *entry {
                Some(effect) => {
                    backend.update_reverb_effect(effect, &params);
                    touched += 1;
                }
                None => match backend.create_reverb_effect(&params) {
                    Ok(effect) => {
                        *entry = Some(effect);
                        log::debug!("Created reverb effect {} for {:?}", effect, slot);
                        touched += 1;
                    }
                    Err(err) => {
                        log::error!("Failed to create reverb effect for {:?}: {}", slot, err);
                    }
                },
            }
        }
        touched
    }

    /// Creates the listener effect ahead of the first result after a device
    /// comes back. Other slots are recreated lazily by [`sync`](Self::sync).
    pub fn recreate_listener(
        &mut self,
        params: &ReverbEffectParams,
        backend: &mut dyn AudioBackend,
    ) -> Result<EffectId> {
        if let Some(effect) = self.listener {
            return Ok(effect);
        }
        let effect = backend.create_reverb_effect(params)?;
        self.listener = Some(effect);
        Ok(effect)
    }

    /// Forgets every effect without touching the backend; the device that
    /// owned them is gone.
    pub fn invalidate(&mut self) {
        self.listener = None;
        self.outside = None;
        self.grouped.clear();
    }

    /// Deletes every live effect.
    pub fn release(&mut self, backend: &mut dyn AudioBackend) {
        let effects = self
            .listener
            .take()
            .into_iter()
            .chain(self.outside.take())
            .chain(self.grouped.drain(..).flatten());
        for effect in effects {
            backend.delete_reverb_effect(effect);
        }
    }

    pub fn effect_for(&self, slot: EffectSlot) -> Option<EffectId> {
        match slot {
            EffectSlot::Listener => self.listener,
            EffectSlot::Outside => self.outside,
            EffectSlot::Grouped(index) => self.grouped.get(index).copied().flatten(),
        }
    }

    pub fn len(&self) -> usize {
        self.listener.iter().count()
            + self.outside.iter().count()
            + self.grouped.iter().flatten().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::acoustics::{ReverbResults, ZoneResult};
    use crate::math::Vec3;
    use crate::test_support::{BackendCall, RecordingBackend};

    fn results(grouped: usize) -> ReverbResults {
        ReverbResults {
            grouped: vec![ZoneResult::default(); grouped],
            ..Default::default()
        }
    }

    #[test]
    fn test_sync_creates_then_updates() {
        let mut aggregator = AcousticAggregator::new(8.0, 3);
        let mut backend = RecordingBackend::default();
        let mut bank = EffectBank::new();

        aggregator.update(&results(2), Vec3::ZERO, 0.016);
        assert_eq!(bank.sync(&mut aggregator, &mut backend), 3);
        assert_eq!(bank.len(), 3);
        assert_eq!(backend.live_effects(), 3);

        aggregator.update(&results(2), Vec3::ZERO, 0.016);
        bank.sync(&mut aggregator, &mut backend);
        assert_eq!(backend.live_effects(), 3);
        let updates = backend
            .calls
            .iter()
            .filter(|c| matches!(c, BackendCall::UpdateEffect(_)))
            .count();
        assert_eq!(updates, 3);
    }

    #[test]
    fn test_sync_deletes_evicted_grouped_effects() {
        let mut aggregator = AcousticAggregator::new(8.0, 3);
        let mut backend = RecordingBackend::default();
        let mut bank = EffectBank::new();

        aggregator.update(&results(3), Vec3::ZERO, 0.016);
        bank.sync(&mut aggregator, &mut backend);
        let stale = bank.effect_for(EffectSlot::Grouped(2)).unwrap();

        aggregator.update(&results(1), Vec3::ZERO, 0.016);
        bank.sync(&mut aggregator, &mut backend);
        assert!(bank.effect_for(EffectSlot::Grouped(1)).is_none());
        assert!(backend.calls.contains(&BackendCall::DeleteEffect(stale)));
        assert_eq!(backend.live_effects(), 2);
    }

    #[test]
    fn test_sync_deletes_outside_effect_once_unreported() {
        let mut aggregator = AcousticAggregator::new(8.0, 3);
        let mut backend = RecordingBackend::default();
        let mut bank = EffectBank::new();

        let mut input = results(0);
        input.outside = Some(ZoneResult::default());
        aggregator.update(&input, Vec3::ZERO, 0.016);
        bank.sync(&mut aggregator, &mut backend);
        let stale = bank.effect_for(EffectSlot::Outside).unwrap();

        aggregator.update(&results(0), Vec3::ZERO, 0.016);
        bank.sync(&mut aggregator, &mut backend);
        assert!(bank.effect_for(EffectSlot::Outside).is_none());
        assert!(backend.calls.contains(&BackendCall::DeleteEffect(stale)));
        assert_eq!(backend.live_effects(), 1);
    }

    #[test]
    fn test_invalidate_and_recreate_listener() {
        let mut aggregator = AcousticAggregator::new(8.0, 3);
        let mut backend = RecordingBackend::default();
        let mut bank = EffectBank::new();
        aggregator.update(&results(0), Vec3::ZERO, 0.016);
        bank.sync(&mut aggregator, &mut backend);
        let calls = backend.calls.len();

        bank.invalidate();
        assert!(bank.is_empty());
        assert_eq!(backend.calls.len(), calls);

        let effect = bank
            .recreate_listener(&ReverbEffectParams::default(), &mut backend)
            .unwrap();
        assert_eq!(bank.effect_for(EffectSlot::Listener), Some(effect));
        assert!(bank.effect_for(EffectSlot::Outside).is_none());
    }
}
