use crate::domain::state::Entity;
use glam::Vec2;
use tracing::debug;

/// Runs one brute-force collision pass (O(n²) over live entities).
///
/// Each entity takes part in at most one collision per pass: once a pair
/// overlaps, both sides are flagged and skipped for the rest of the pass,
/// whether or not an impulse ends up being applied. Returns the ids of every
/// pair that received an impulse.
pub fn resolve_collisions(entities: &mut [Entity]) -> Vec<(u64, u64)> {
    for e in entities.iter_mut() {
        e.in_collision = false;
    }

    let mut resolved = Vec::new();
    for i in 0..entities.len() {
        for j in (i + 1)..entities.len() {
            let (head, tail) = entities.split_at_mut(j);
            let a = &mut head[i];
            let b = &mut tail[0];

            if a.in_collision {
                break;
            }
            if b.in_collision || !overlaps(a, b) {
                continue;
            }

            a.in_collision = true;
            b.in_collision = true;
            if resolve_pair(a, b) {
                resolved.push((a.id, b.id));
            }
        }
    }
    resolved
}

/// Circle overlap between the two bodies' centers.
pub fn overlaps(a: &Entity, b: &Entity) -> bool {
    a.center().distance(b.center()) < (a.size + b.size) / 2.0
}

// Impulse exchange along the contact normal; size stands in for mass.
fn resolve_pair(a: &mut Entity, b: &mut Entity) -> bool {
    // The normal runs between positions, not centers. Coincident positions
    // have no direction; push along +X.
    let normal = (b.position - a.position).try_normalize().unwrap_or(Vec2::X);
    let speed = (a.velocity - b.velocity).dot(normal);
    if speed < 0.0 {
        // Already separating.
        return false;
    }

    let impulse = 2.0 * speed / (a.size + b.size);
    a.velocity -= normal * (impulse * b.size);
    b.velocity += normal * (impulse * a.size);

    if a.is_player() || b.is_player() {
        a.health -= 1;
        b.health -= 1;
        debug!(
            a_id = a.id,
            b_id = b.id,
            a_health = a.health,
            b_health = b.health,
            "player collision"
        );
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::HashSet;

    fn body(id: u64, position: Vec2, velocity: Vec2) -> Entity {
        Entity::generic(id, position, velocity, 10.0, 10)
    }

    fn player(id: u64, position: Vec2, velocity: Vec2) -> Entity {
        let mut e = Entity::player(id, position, 10.0, 100);
        e.velocity = velocity;
        e
    }

    #[test]
    fn when_equal_bodies_meet_head_on_then_velocities_swap() {
        let mut entities = vec![
            body(1, Vec2::new(100.0, 100.0), Vec2::new(10.0, 0.0)),
            body(2, Vec2::new(105.0, 100.0), Vec2::new(-10.0, 0.0)),
        ];

        let resolved = resolve_collisions(&mut entities);

        assert_eq!(resolved, vec![(1, 2)]);
        assert_eq!(entities[0].velocity, Vec2::new(-10.0, 0.0));
        assert_eq!(entities[1].velocity, Vec2::new(10.0, 0.0));
        assert!(entities[0].in_collision && entities[1].in_collision);
    }

    #[test]
    fn when_neither_is_a_player_then_health_is_unchanged() {
        let mut entities = vec![
            body(1, Vec2::new(100.0, 100.0), Vec2::new(10.0, 0.0)),
            body(2, Vec2::new(105.0, 100.0), Vec2::new(-10.0, 0.0)),
        ];

        resolve_collisions(&mut entities);

        assert_eq!(entities[0].health, 10);
        assert_eq!(entities[1].health, 10);
    }

    #[test]
    fn when_player_hits_generic_body_then_both_lose_one_health() {
        let mut entities = vec![
            player(1_000_000, Vec2::new(100.0, 100.0), Vec2::new(10.0, 0.0)),
            body(2, Vec2::new(105.0, 100.0), Vec2::new(-10.0, 0.0)),
        ];

        resolve_collisions(&mut entities);

        assert_eq!(entities[0].health, 99);
        assert_eq!(entities[1].health, 9);
    }

    #[test]
    fn when_health_is_already_zero_then_it_goes_negative() {
        let mut entities = vec![
            player(1_000_000, Vec2::new(100.0, 100.0), Vec2::new(10.0, 0.0)),
            body(2, Vec2::new(105.0, 100.0), Vec2::new(-10.0, 0.0)),
        ];
        entities[1].health = 0;

        resolve_collisions(&mut entities);

        assert_eq!(entities[1].health, -1);
    }

    #[test]
    fn when_overlapping_bodies_separate_then_no_impulse_but_both_are_flagged() {
        let mut entities = vec![
            player(1_000_000, Vec2::new(100.0, 100.0), Vec2::new(-10.0, 0.0)),
            body(2, Vec2::new(105.0, 100.0), Vec2::new(10.0, 0.0)),
        ];

        let resolved = resolve_collisions(&mut entities);

        assert!(resolved.is_empty());
        assert_eq!(entities[0].velocity, Vec2::new(-10.0, 0.0));
        assert_eq!(entities[1].velocity, Vec2::new(10.0, 0.0));
        assert_eq!(entities[0].health, 100);
        assert!(entities[0].in_collision && entities[1].in_collision);
    }

    #[test]
    fn when_bodies_only_touch_then_no_collision() {
        // Centers exactly one diameter apart.
        let mut entities = vec![
            body(1, Vec2::new(100.0, 100.0), Vec2::new(10.0, 0.0)),
            body(2, Vec2::new(110.0, 100.0), Vec2::new(-10.0, 0.0)),
        ];

        let resolved = resolve_collisions(&mut entities);

        assert!(resolved.is_empty());
        assert!(!entities[0].in_collision && !entities[1].in_collision);
    }

    #[test]
    fn when_three_bodies_overlap_then_only_the_first_pair_resolves() {
        let mut entities = vec![
            body(1, Vec2::new(100.0, 100.0), Vec2::new(10.0, 0.0)),
            body(2, Vec2::new(104.0, 100.0), Vec2::new(-10.0, 0.0)),
            body(3, Vec2::new(102.0, 103.0), Vec2::new(0.0, -10.0)),
        ];

        let resolved = resolve_collisions(&mut entities);

        assert_eq!(resolved, vec![(1, 2)]);
        assert_eq!(entities[2].velocity, Vec2::new(0.0, -10.0));
        assert!(!entities[2].in_collision);
    }

    #[test]
    fn when_flags_are_stale_from_last_pass_then_they_are_reset() {
        let mut entities = vec![
            body(1, Vec2::new(0.0, 0.0), Vec2::ZERO),
            body(2, Vec2::new(500.0, 500.0), Vec2::ZERO),
        ];
        entities[0].in_collision = true;
        entities[1].in_collision = true;

        resolve_collisions(&mut entities);

        assert!(!entities[0].in_collision && !entities[1].in_collision);
    }

    #[test]
    fn when_positions_coincide_then_resolution_stays_finite() {
        let mut entities = vec![
            body(1, Vec2::new(100.0, 100.0), Vec2::new(5.0, 0.0)),
            body(2, Vec2::new(100.0, 100.0), Vec2::new(-5.0, 0.0)),
        ];

        resolve_collisions(&mut entities);

        assert!(!entities[0].velocity.is_nan());
        assert!(!entities[1].velocity.is_nan());
    }

    #[test]
    fn when_partner_is_larger_then_smaller_body_receives_larger_change() {
        let mut small = body(1, Vec2::new(100.0, 100.0), Vec2::new(0.0, -10.0));
        small.size = 10.0;
        let mut large = body(2, Vec2::new(90.0, 80.0), Vec2::new(0.0, 0.0));
        large.size = 30.0;
        let mut entities = vec![small, large];

        resolve_collisions(&mut entities);

        let small_dv = (entities[0].velocity - Vec2::new(0.0, -10.0)).length();
        let large_dv = entities[1].velocity.length();
        assert!(large_dv > 0.0);
        assert!(small_dv > large_dv);
    }

    #[test]
    fn when_sizes_differ_then_normal_follows_positions_not_centers() {
        let mut entities = vec![
            player(1_000_000, Vec2::new(0.0, 0.0), Vec2::new(10.0, 0.0)),
            body(2, Vec2::new(15.0, 5.0), Vec2::ZERO),
        ];
        entities[0].size = 20.0;

        let resolved = resolve_collisions(&mut entities);

        assert_eq!(resolved, vec![(1_000_000, 2)]);
        assert!((entities[0].velocity - Vec2::new(4.0, -2.0)).length() < 1e-4);
        assert!((entities[1].velocity - Vec2::new(12.0, 4.0)).length() < 1e-4);
    }

    proptest! {
        #[test]
        fn each_entity_takes_part_in_at_most_one_resolution(
            bodies in prop::collection::vec(
                (0.0f32..40.0, 0.0f32..40.0, -20.0f32..20.0, -20.0f32..20.0),
                2..24,
            )
        ) {
            let mut entities: Vec<Entity> = bodies
                .iter()
                .enumerate()
                .map(|(i, &(x, y, vx, vy))| body(i as u64, Vec2::new(x, y), Vec2::new(vx, vy)))
                .collect();
            let before: Vec<Vec2> = entities.iter().map(|e| e.velocity).collect();

            let resolved = resolve_collisions(&mut entities);

            let mut seen = HashSet::new();
            for (a, b) in &resolved {
                prop_assert!(seen.insert(*a));
                prop_assert!(seen.insert(*b));
            }
            for (i, e) in entities.iter().enumerate() {
                if !seen.contains(&e.id) {
                    prop_assert_eq!(e.velocity, before[i]);
                }
            }
        }
    }
}
