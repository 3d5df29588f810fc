//! Identity assignment across frames.

use crate::constants::MARKER_COUNT;
use crate::fusion::FusedPoint;
use log::debug;

/// One tracked identity
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct IdentitySlot {
    pub id: usize,
    /// Position from the last frame this identity was resolved in
    pub last_position: Option<(f64, f64)>,
}

impl IdentitySlot {
    #[must_use]
    pub fn is_seeded(&self) -> bool {
        self.last_position.is_some()
    }
}

/// A point bound to an identity for the current frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Assignment {
    pub id: usize,
    pub point: FusedPoint,
    /// The identity lost its previous track and restarts at `point`
    pub reseeded: bool,
}

/// Bounded nearest-neighbour tracker over a fixed set of identities
#[derive(Debug, Clone)]
pub struct IdentityTracker {
    slots: [IdentitySlot; MARKER_COUNT],
    max_jump: f64,
}

impl IdentityTracker {
    #[must_use]
    pub fn new(max_jump: f64) -> Self {
        let mut slots = [IdentitySlot::default(); MARKER_COUNT];
        for (id, slot) in slots.iter_mut().enumerate() {
            slot.id = id;
        }
        Self { slots, max_jump }
    }

    #[must_use]
    pub fn slots(&self) -> &[IdentitySlot; MARKER_COUNT] {
        &self.slots
    }

    /// Forget every identity
    pub fn reset(&mut self) {
        for slot in &mut self.slots {
            slot.last_position = None;
        }
    }

    /// Bind this frame's points to identities
    ///
    /// Seeded slots, in id order, each claim their nearest unclaimed point
    /// closer than the maximum jump. Leftover points, in x order, go to the
    /// slots that found no match, never-seeded slots first. Points beyond the
    /// slot count are dropped. The result is ordered by id.
    pub fn associate(&mut self, points: &[FusedPoint]) -> Vec<Assignment> {
        let mut sorted = points.to_vec();
        sorted.sort_by(|a, b| a.x.total_cmp(&b.x));

        let mut claimed = vec![false; sorted.len()];
        let mut matched: [Option<usize>; MARKER_COUNT] = [None; MARKER_COUNT];

        for slot in &self.slots {
            let Some((last_x, last_y)) = slot.last_position else {
                continue;
            };

            let nearest = sorted
                .iter()
                .enumerate()
                .filter(|(index, _)| !claimed[*index])
                .map(|(index, point)| (index, point.distance_to(last_x, last_y)))
                .filter(|(_, distance)| *distance < self.max_jump)
                .min_by(|a, b| a.1.total_cmp(&b.1));

            if let Some((index, _)) = nearest {
                claimed[index] = true;
                matched[slot.id] = Some(index);
            }
        }

        let mut free_slots: Vec<usize> = self
            .slots
            .iter()
            .filter(|slot| matched[slot.id].is_none() && !slot.is_seeded())
            .map(|slot| slot.id)
            .collect();
        free_slots.extend(
            self.slots
                .iter()
                .filter(|slot| matched[slot.id].is_none() && slot.is_seeded())
                .map(|slot| slot.id),
        );

        let mut reseeded = [false; MARKER_COUNT];
        let leftovers = (0..sorted.len()).filter(|index| !claimed[*index]);
        for (id, index) in free_slots.into_iter().zip(leftovers) {
            if self.slots[id].is_seeded() {
                debug!("Identity {id} re-seeded at ({:.1}, {:.1})", sorted[index].x, sorted[index].y);
                reseeded[id] = true;
            }
            matched[id] = Some(index);
        }

        let mut assignments = Vec::with_capacity(MARKER_COUNT);
        for (id, index) in matched.iter().enumerate() {
            if let Some(index) = *index {
                let point = sorted[index];
                self.slots[id].last_position = Some((point.x, point.y));
                assignments.push(Assignment {
                    id,
                    point,
                    reseeded: reseeded[id],
                });
            }
        }

        assignments
    }
}
