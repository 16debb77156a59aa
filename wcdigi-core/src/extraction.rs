//! Per-event hit extraction.

use crate::aggregation::EventAccumulator;
use crate::hit::Subsystem;
use crate::source::EventSource;

/// Extracts event `index` from `source` into `acc`.
///
/// The accumulator is reset first. Both subsystem views are loaded for the
/// same index and every trigger of each is folded in, inner detector first.
///
/// # Errors
/// Propagates any error raised by the source while loading the event.
pub fn extract_event<S: EventSource>(
    source: &mut S,
    index: usize,
    acc: &mut EventAccumulator,
) -> Result<(), S::Error> {
    acc.reset(index);

    for subsystem in Subsystem::ALL {
        let event = source.load_event(subsystem, index)?;
        log::trace!(
            "event {index} {subsystem:?}: {} trigger(s), {} digi hit(s)",
            event.n_triggers(),
            event.n_digi_hits()
        );
        for trigger in &event.triggers {
            acc.fold_trigger(subsystem, trigger);
        }
    }

    Ok(())
}
