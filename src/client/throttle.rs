use crate::api::message::Position;

pub const DEFAULT_FRAME_INTERVAL: u32 = 3;
pub const DEFAULT_MIN_DISPLACEMENT: f64 = 0.05;

#[derive(Debug, Clone)]
pub struct MovementThrottle {
    frame_interval: u32,
    min_displacement: f64,
    frames: u32,
    last_sent: Option<Position>,
}

impl Default for MovementThrottle {
    fn default() -> Self {
        Self::new(DEFAULT_FRAME_INTERVAL, DEFAULT_MIN_DISPLACEMENT)
    }
}

impl MovementThrottle {
    pub fn new(frame_interval: u32, min_displacement: f64) -> Self {
        Self {
            frame_interval: frame_interval.max(1),
            min_displacement,
            frames: 0,
            last_sent: None,
        }
    }

    pub fn on_frame(&mut self, position: Position) -> Option<Position> {
        self.frames += 1;
        if self.frames < self.frame_interval {
            return None;
        }
        self.frames = 0;

        if let Some(last) = self.last_sent
            && last.distance(&position) <= self.min_displacement
        {
            return None;
        }
        self.last_sent = Some(position);
        Some(position)
    }
}
