use engine::Vec2;
use thiserror::Error;

use super::grid::{step_toward, Direction};

pub(crate) const DWELL_SECONDS: f32 = 2.0;
pub(crate) const NPC_SPEED: f32 = 60.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum NpcPhase {
    Walking,
    /// Parked on the current waypoint for `elapsed` seconds.
    Dwelling { elapsed: f32 },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub(crate) enum PatrolError {
    #[error("npc '{npc_type}' patrol needs at least 2 waypoints, got {count}")]
    TooFewWaypoints { npc_type: String, count: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PatrolEvent {
    Arrived { waypoint: usize },
    Departed { waypoint: usize },
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct NpcState {
    waypoints: Vec<Vec2>,
    index: usize,
    phase: NpcPhase,
    npc_type: String,
    position: Vec2,
    facing: Direction,
}

impl NpcState {
    /// Starts parked on the first waypoint with a fresh dwell.
    pub(crate) fn new(npc_type: &str, waypoints: Vec<Vec2>) -> Result<Self, PatrolError> {
        if waypoints.len() < 2 {
            return Err(PatrolError::TooFewWaypoints {
                npc_type: npc_type.to_string(),
                count: waypoints.len(),
            });
        }
        let position = waypoints[0];
        Ok(Self {
            waypoints,
            index: 0,
            phase: NpcPhase::Dwelling { elapsed: 0.0 },
            npc_type: npc_type.to_string(),
            position,
            facing: Direction::Down,
        })
    }

    pub(crate) fn npc_type(&self) -> &str {
        &self.npc_type
    }

    pub(crate) fn position(&self) -> Vec2 {
        self.position
    }

    pub(crate) fn facing(&self) -> Direction {
        self.facing
    }

    #[cfg(test)]
    pub(crate) fn phase(&self) -> NpcPhase {
        self.phase
    }

    #[cfg(test)]
    pub(crate) fn waypoint_index(&self) -> usize {
        self.index
    }

    pub(crate) fn is_moving(&self) -> bool {
        self.phase == NpcPhase::Walking
    }
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct NpcPatrol {
    pub(crate) speed: f32,
    pub(crate) dwell_seconds: f32,
}

impl Default for NpcPatrol {
    fn default() -> Self {
        Self {
            speed: NPC_SPEED,
            dwell_seconds: DWELL_SECONDS,
        }
    }
}

impl NpcPatrol {
    /// Dwell is counted per NPC from tick deltas, so it stays exact however
    /// long the room has been running.
    pub(crate) fn update(&self, npc: &mut NpcState, dt: f32) -> Option<PatrolEvent> {
        match npc.phase {
            NpcPhase::Dwelling { elapsed } => {
                let elapsed = elapsed + dt.max(0.0);
                if elapsed < self.dwell_seconds {
                    npc.phase = NpcPhase::Dwelling { elapsed };
                    return None;
                }
                npc.index = (npc.index + 1) % npc.waypoints.len();
                let target = npc.waypoints[npc.index];
                if let Some(facing) =
                    Direction::from_delta(target.x - npc.position.x, target.y - npc.position.y)
                {
                    npc.facing = facing;
                }
                npc.phase = NpcPhase::Walking;
                Some(PatrolEvent::Departed { waypoint: npc.index })
            }
            NpcPhase::Walking => {
                let target = npc.waypoints[npc.index];
                let (position, arrived) = step_toward(npc.position, target, self.speed, dt);
                npc.position = position;
                if !arrived {
                    return None;
                }
                npc.phase = NpcPhase::Dwelling { elapsed: 0.0 };
                Some(PatrolEvent::Arrived { waypoint: npc.index })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DT: f32 = 1.0 / 60.0;
    /// Two seconds of 60 Hz ticks.
    const DWELL_TICKS: usize = 120;

    fn triangle() -> NpcState {
        NpcState::new(
            "player2",
            vec![
                Vec2::new(112.0, 112.0),
                Vec2::new(240.0, 112.0),
                Vec2::new(240.0, 80.0),
            ],
        )
        .expect("npc")
    }

    /// Ticks until the npc leaves its waypoint; returns the ticks spent.
    fn dwell_out(patrol: &NpcPatrol, npc: &mut NpcState) -> usize {
        for tick in 1..=10_000 {
            if let Some(PatrolEvent::Departed { .. }) = patrol.update(npc, DT) {
                return tick;
            }
        }
        panic!("npc never departed");
    }

    #[test]
    fn rejects_single_waypoint() {
        let error = NpcState::new("player3", vec![Vec2::new(0.0, 0.0)]).unwrap_err();
        assert_eq!(
            error,
            PatrolError::TooFewWaypoints {
                npc_type: "player3".to_string(),
                count: 1
            }
        );
    }

    #[test]
    fn waypoints_wrap_and_dwell_at_least_two_seconds() {
        let patrol = NpcPatrol::default();
        let mut npc = triangle();
        let mut since_arrival = Some((0, 0_usize));
        let mut visited = Vec::new();

        for _ in 0..(60 * 30) {
            if let Some((_, ticks)) = since_arrival.as_mut() {
                *ticks += 1;
            }
            match patrol.update(&mut npc, DT) {
                Some(PatrolEvent::Arrived { waypoint }) => {
                    assert_eq!(npc.position(), npc.waypoints[waypoint]);
                    since_arrival = Some((waypoint, 0));
                    visited.push(waypoint);
                }
                Some(PatrolEvent::Departed { waypoint }) => {
                    let (from, ticks) = since_arrival.take().expect("departure follows arrival");
                    assert_eq!(waypoint, (from + 1) % 3);
                    assert!(ticks >= DWELL_TICKS, "left after {ticks} ticks");
                }
                None => {}
            }
        }

        assert!(visited.len() >= 4, "visited {visited:?}");
        assert_eq!(&visited[..4], &[1, 2, 0, 1]);
    }

    #[test]
    fn facing_follows_horizontal_sign_then_vertical() {
        let patrol = NpcPatrol::default();
        let mut npc = triangle();
        dwell_out(&patrol, &mut npc);
        assert_eq!(npc.facing(), Direction::Right);
        assert!(npc.is_moving());

        while npc.waypoint_index() == 1 && npc.is_moving() {
            patrol.update(&mut npc, DT);
        }
        // Idle at B keeps the last walking facing.
        assert_eq!(npc.facing(), Direction::Right);
        dwell_out(&patrol, &mut npc);
        assert_eq!(npc.facing(), Direction::Up);
    }

    #[test]
    fn dwelling_npc_holds_still() {
        let patrol = NpcPatrol::default();
        let mut npc = triangle();
        for _ in 1..100 {
            assert_eq!(patrol.update(&mut npc, DT), None);
        }
        assert_eq!(npc.position(), Vec2::new(112.0, 112.0));
        assert!(matches!(npc.phase(), NpcPhase::Dwelling { elapsed } if elapsed > 1.5));
    }

    #[test]
    fn dwell_length_is_stable_across_many_laps() {
        let patrol = NpcPatrol::default();
        let mut npc = triangle();
        for leg in 0..60 {
            let ticks = dwell_out(&patrol, &mut npc);
            assert!(
                (DWELL_TICKS..DWELL_TICKS + 2).contains(&ticks),
                "leg {leg} dwelt {ticks} ticks"
            );
            while npc.is_moving() {
                patrol.update(&mut npc, DT);
            }
        }
        assert_eq!(npc.waypoint_index(), 0);
    }
}
