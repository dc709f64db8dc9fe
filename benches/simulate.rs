use std::hint::black_box;

use criterion::{criterion_group, criterion_main, BatchSize, Criterion};
use serde_json::json;

use puzzle_harness::games::cellularena::ArenaCase;
use puzzle_harness::games::mars_lander::{step, LandingZone, LanderState, Surface, Thrust};
use puzzle_harness::{Catalog, Cellularena, Model, PlayerId};

fn surface() -> Surface {
    let points = vec![(0.0, 1500.0), (1000.0, 100.0), (6000.0, 100.0), (6999.0, 1500.0)];
    let landing_zone = LandingZone { x1: 1000, x2: 6000, y: 100 };
    Surface { points, landing_zone }
}

fn bench_mars(c: &mut Criterion) {
    let surface = surface();
    c.bench_function("mars_lander/descent_100", |b| {
        b.iter(|| {
            let mut state = LanderState::new(2500, 2700, 0, 0, 550, 0, 0);
            for turn in 0..100 {
                let thrust = Thrust { rotate: if turn % 10 < 5 { -15 } else { 15 }, power: 3 };
                let (next, result) = step(&state, thrust, &surface);
                state = next;
                if result.is_terminal() {
                    break;
                }
            }
            black_box(state)
        })
    });
}

/// 24x12 arena with a full column of organs per player.
fn arena() -> Cellularena {
    let mut entities = vec![
        json!({ "x": 0, "y": 0, "type": "ROOT", "owner": 0,
                "organId": 1, "organDir": "E", "organRootId": 1 }),
        json!({ "x": 23, "y": 0, "type": "ROOT", "owner": 1,
                "organId": 2, "organDir": "W", "organRootId": 2 }),
    ];
    let mut id = 3;
    for y in 1..12 {
        for (x, owner, root) in [(0, 0, 1), (23, 1, 2)] {
            entities.push(json!({
                "x": x, "y": y, "type": "BASIC", "owner": owner, "organId": id,
                "organParentId": id - 2, "organRootId": root
            }));
            id += 1;
        }
    }
    for y in 0..12 {
        entities.push(json!({ "x": 12, "y": y, "type": if y % 2 == 0 { "A" } else { "C" } }));
    }
    let case: ArenaCase = serde_json::from_value(json!({
        "width": 24,
        "height": 12,
        "entities": entities,
        "proteins": { "0": { "A": 500 }, "1": { "A": 500 } }
    }))
    .expect("bench arena");
    Cellularena::new(Catalog::new().with("bench", case))
}

fn bench_cellularena(c: &mut Criterion) {
    let model = arena();
    let (env, initial) = model.load_test_case("bench").expect("bench case");
    c.bench_function("cellularena/grow_turns_10", |b| {
        b.iter_batched(
            || initial.clone(),
            |mut state| {
                for column in 1..=10 {
                    let orders: Vec<_> = (0..12)
                        .flat_map(|y| {
                            [
                                (PlayerId(0), format!("GROW {} {column} {y} BASIC E", 1 + 2 * y)),
                                (
                                    PlayerId(1),
                                    format!("GROW {} {} {y} BASIC W", 2 + 2 * y, 23 - column),
                                ),
                            ]
                        })
                        .filter_map(|(player, line)| model.parse_output(&line, player).ok())
                        .collect();
                    let (next, _) = model.simulate(&state, &orders, &env);
                    state = next;
                }
                black_box(state)
            },
            BatchSize::SmallInput,
        )
    });
}

criterion_group!(benches, bench_mars, bench_cellularena);
criterion_main!(benches);
