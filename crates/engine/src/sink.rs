use tracing::{debug, info, warn};

use crate::event::EngineEvent;

pub fn consume(events: Vec<EngineEvent>) {
    for e in events {
        match e {
            EngineEvent::ConfigSubstituted(err) => {
                warn!("config: {}", err);
            }
            EngineEvent::RescanTriggered { reason } => {
                info!("rescan ({:?})", reason);
            }
            EngineEvent::InsufficientData { have, need } => {
                warn!("insufficient data: have {} bars, need {}", have, need);
            }
            EngineEvent::LevelAccepted(level) => {
                debug!("accepted {}", level);
            }
            EngineEvent::LevelRejected(r) => {
                debug!(
                    "rejected {:?}@{} touches={} strength={:.4} ({:?})",
                    r.kind, r.price, r.touch_count, r.strength, r.reason
                );
            }
            EngineEvent::Transition { from, cause, to } => {
                info!("transition: {:?} --({:?})-> {:?}", from, cause, to);
            }
            EngineEvent::ApproachAlert {
                level,
                price,
                distance,
            } => {
                info!("approach: price {} is {:.5} from {}", price, distance, level);
            }
            EngineEvent::HourlyStats {
                hour,
                accepted,
                rejected,
            } => {
                info!("hour {}: accepted={} rejected={}", hour, accepted, rejected);
            }
        }
    }
}
