use worldsim::{
    config::SimulationConstants,
    engine::{Engine, EngineBuilder, EngineSettings, RunControl, TurnReport},
    scenario::{Scenario, ScenarioLoader},
    systems::InvariantCheckSystem,
    world::PopulationView,
};

fn tiny_continent() -> Scenario {
    ScenarioLoader::new(env!("CARGO_MANIFEST_DIR"))
        .load("scenarios/tiny_continent.yaml")
        .expect("scenario parses")
}

fn engine_for(scenario: &Scenario, seed: u64) -> Engine {
    let settings = EngineSettings {
        scenario_name: scenario.name.clone(),
        seed,
    };
    EngineBuilder::new(settings)
        .with_system(InvariantCheckSystem::new())
        .build(&scenario.constants)
        .expect("engine builds")
}

fn run_collecting(seed: u64, ticks: u64) -> (Vec<TurnReport>, Vec<PopulationView>) {
    let scenario = tiny_continent();
    let mut world = scenario.build_world().unwrap();
    let mut engine = engine_for(&scenario, seed);
    let mut reports = Vec::new();
    engine
        .run_with_hook(&mut world, ticks, |report, _| reports.push(report.clone()))
        .unwrap();
    (reports, world.population_views())
}

fn desert_scenario(reseed: bool) -> Scenario {
    Scenario {
        name: "dust".into(),
        description: None,
        seed: 3,
        ticks: None,
        map: vec!["ddd".into(), "ddd".into(), "ddd".into()],
        biome_capacities: Default::default(),
        founders: Vec::new(),
        constants: {
            let mut constants = SimulationConstants::default();
            constants.population.initial_health = 1.0;
            constants.attrition.pool_size = 0;
            constants.reseed_on_extinction = reseed;
            constants
        },
    }
}

#[test]
fn scenario_fixture_describes_the_continent() {
    let scenario = tiny_continent();
    assert_eq!(scenario.name, "tiny_continent");
    assert_eq!(scenario.map.len(), 15);
    assert!(scenario.map.iter().all(|row| row.chars().count() == 24));
    assert_eq!(scenario.founders.len(), 2);
    assert_eq!(scenario.constants.max_populations, 400);
    assert_eq!(scenario.ticks(None), 300);

    let world = scenario.build_world().unwrap();
    assert_eq!(world.population_count(), 2);
    world.check_invariants().unwrap();
}

#[test]
fn invariants_hold_over_a_long_run() {
    let scenario = tiny_continent();
    let mut world = scenario.build_world().unwrap();
    let mut engine = engine_for(&scenario, scenario.seed);
    let mut peak = 0;
    engine
        .run_with_hook(&mut world, 150, |report, world| {
            peak = peak.max(report.populations);
            assert!(report.populations <= world.constants().max_populations);
            assert_eq!(world.grid().occupancy().count(), world.population_count());
        })
        .unwrap();
    world.check_invariants().unwrap();
    assert!(peak > 2, "founders should bud at least once");
}

#[test]
fn equal_seeds_produce_identical_runs() {
    let (reports_a, views_a) = run_collecting(11, 80);
    let (reports_b, views_b) = run_collecting(11, 80);
    assert_eq!(reports_a, reports_b);
    assert_eq!(views_a, views_b);
}

#[test]
fn different_seeds_diverge() {
    let (_, views_a) = run_collecting(1, 60);
    let (_, views_b) = run_collecting(2, 60);
    assert_ne!(views_a, views_b);
}

#[test]
fn pause_and_continue_resume_on_whole_ticks() {
    let scenario = tiny_continent();
    let mut world = scenario.build_world().unwrap();
    let mut engine = engine_for(&scenario, scenario.seed);

    let control = RunControl::new().with_stop_after(5);
    let ran = engine.run_until_paused(&mut world, &control, |_, _| {}).unwrap();
    assert_eq!(ran, 5);
    assert_eq!(world.turn(), 5);
    assert!(control.is_paused());

    // still paused: nothing happens
    let ran = engine.run_until_paused(&mut world, &control, |_, _| {}).unwrap();
    assert_eq!(ran, 0);

    control.set_stop_after(Some(12));
    control.resume();
    let mut seen = Vec::new();
    engine
        .run_until_paused(&mut world, &control, |report, _| seen.push(report.turn))
        .unwrap();
    assert_eq!(seen, (6..=12).collect::<Vec<_>>());
    world.check_invariants().unwrap();
}

#[test]
fn paused_run_matches_uninterrupted_run() {
    let scenario = tiny_continent();

    let mut straight = scenario.build_world().unwrap();
    engine_for(&scenario, 9).run(&mut straight, 20).unwrap();

    let mut split = scenario.build_world().unwrap();
    let mut engine = engine_for(&scenario, 9);
    let control = RunControl::new().with_stop_after(8);
    engine.run_until_paused(&mut split, &control, |_, _| {}).unwrap();
    control.set_stop_after(Some(20));
    control.resume();
    engine.run_until_paused(&mut split, &control, |_, _| {}).unwrap();

    assert_eq!(straight.population_views(), split.population_views());
}

#[test]
fn extinct_world_is_reseeded() {
    let scenario = desert_scenario(true);
    let mut world = scenario.build_world().unwrap();
    let mut engine = engine_for(&scenario, 5);

    let first = engine.step(&mut world).unwrap();
    assert_eq!(first.deaths, 1);
    assert_eq!(first.populations, 0);
    assert!(!first.reseeded);

    let second = engine.step(&mut world).unwrap();
    assert!(second.reseeded);
    assert_eq!(second.populations, 1);
    assert_eq!(second.deaths, 0);
    assert_eq!(world.total_deaths(), 1);
    world.check_invariants().unwrap();
}

#[test]
fn extinction_is_final_without_reseeding() {
    let scenario = desert_scenario(false);
    let mut world = scenario.build_world().unwrap();
    let mut engine = engine_for(&scenario, 5);
    engine.run(&mut world, 4).unwrap();
    assert_eq!(world.population_count(), 0);
    assert_eq!(world.total_deaths(), 1);
}
