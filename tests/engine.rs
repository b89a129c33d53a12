mod common;

use std::sync::Arc;

use chokepoint_impact::{
    infra::CachedSolver, util::assets, EmissionsAggregator, ImpactStatus, ProductFilter,
    ProductRouteAggregator, Restriction, RouteSolver, Scenario, ScenarioComparator, StaticConfig,
    KM_TO_NM,
};
use common::*;

#[test]
fn iron_ore_to_qingdao_takes_the_shorter_origin() {
    let config = bundled();
    let qingdao = coords(&config, QINGDAO);

    for (tubarao_km, ponta_km, expected) in [(20_000.0, 21_000.0, TUBARAO), (22_000.0, 19_500.0, PONTA)] {
        let solver = route_solver(
            ScriptedSolver::new()
                .default_km(15_000.0)
                .lane(coords(&config, TUBARAO), qingdao, tubarao_km)
                .lane(coords(&config, PONTA), qingdao, ponta_km),
        );
        let routes = ProductRouteAggregator::new(&config, &solver).aggregate(
            IRON_ORE,
            &baseline_restrictions(),
            config.origins(),
        );

        let lane = routes.iter().find(|r| r.dest_name == QINGDAO).unwrap();
        assert_eq!(lane.origin_name, expected);
        assert_eq!(lane.distance_km, tubarao_km.min(ponta_km));
        assert_eq!(lane.distance_nm, tubarao_km.min(ponta_km) * KM_TO_NM);
        assert_eq!(lane.volume_kg, 279_000_000_000);
        assert_eq!(lane.volume_tons, 279_000_000.0);

        let summary = EmissionsAggregator::new(&config).summarize(&routes, IRON_ORE);
        let record = summary.records.iter().find(|r| r.destination == QINGDAO).unwrap();
        assert_eq!(record.co2_kg, lane.distance_nm * 0.0025 * lane.volume_tons);
    }
}

#[test]
fn selection_is_minimal_among_successful_candidates() {
    let config = bundled();
    let qingdao = coords(&config, QINGDAO);
    let solver = route_solver(
        ScriptedSolver::new()
            .default_km(15_000.0)
            .failing(coords(&config, PONTA), qingdao, "graph not loaded")
            .lane(coords(&config, TUBARAO), qingdao, 30_000.0),
    );
    let routes = ProductRouteAggregator::new(&config, &solver).aggregate(
        IRON_ORE,
        &baseline_restrictions(),
        config.origins(),
    );

    for route in &routes {
        for candidate in route.candidates.iter().filter(|c| c.success) {
            assert!(route.distance_nm <= candidate.distance_nm.unwrap());
        }
    }
    let lane = routes.iter().find(|r| r.dest_name == QINGDAO).unwrap();
    assert_eq!(lane.origin_name, TUBARAO);
    let failed = lane.candidates.iter().find(|c| c.origin_name == PONTA).unwrap();
    assert!(!failed.success);
    assert_eq!(failed.error.as_deref(), Some("solver backend error: graph not loaded"));
}

#[test]
fn closing_passages_never_improves_a_selection() {
    let config = bundled();
    let qingdao = coords(&config, QINGDAO);
    let tubarao = coords(&config, TUBARAO);
    let ponta = coords(&config, PONTA);
    let solver = route_solver(
        ScriptedSolver::new()
            .default_km(15_000.0)
            .lane(tubarao, qingdao, 20_000.0)
            .detour(tubarao, qingdao, Restriction::Suez, Detour::Adds(3_500.0))
            .lane(ponta, qingdao, 21_000.0)
            .detour(ponta, qingdao, Restriction::Panama, Detour::Blocks),
    );
    let aggregator = ProductRouteAggregator::new(&config, &solver);

    let before = aggregator.aggregate(IRON_ORE, &baseline_restrictions(), config.origins());
    let closed = baseline_restrictions()
        .with(Restriction::Suez)
        .with(Restriction::Panama);
    let after = aggregator.aggregate(IRON_ORE, &closed, config.origins());

    for route in &after {
        let earlier = before.iter().find(|r| r.dest_name == route.dest_name).unwrap();
        assert!(route.distance_nm >= earlier.distance_nm);
    }
    let lane = after.iter().find(|r| r.dest_name == QINGDAO).unwrap();
    assert_eq!(lane.origin_name, TUBARAO);
    assert_eq!(lane.distance_km, 23_500.0);
}

#[test]
fn destination_disappears_when_every_origin_is_blocked() {
    let config = bundled();
    let qingdao = coords(&config, QINGDAO);
    let tubarao = coords(&config, TUBARAO);
    let ponta = coords(&config, PONTA);
    let solver = route_solver(
        ScriptedSolver::new()
            .default_km(15_000.0)
            .lane(tubarao, qingdao, 20_000.0)
            .detour(tubarao, qingdao, Restriction::Malacca, Detour::Blocks)
            .lane(ponta, qingdao, 21_000.0)
            .detour(ponta, qingdao, Restriction::Malacca, Detour::Blocks),
    );

    let routes = ProductRouteAggregator::new(&config, &solver).aggregate(
        IRON_ORE,
        &baseline_restrictions().with(Restriction::Malacca),
        config.origins(),
    );
    assert_eq!(routes.len(), 4);
    assert!(routes.iter().all(|r| r.dest_name != QINGDAO));
}

#[test]
fn full_outage_empties_the_product_and_partial_outage_keeps_unaffected_lanes() {
    let config = bundled();
    let qingdao = coords(&config, QINGDAO);
    let solver = route_solver(
        ScriptedSolver::new()
            .default_km(15_000.0)
            .lane(coords(&config, TUBARAO), qingdao, 21_000.0)
            .lane(coords(&config, PONTA), qingdao, 20_000.0),
    );
    let comparator = ScenarioComparator::new(&config, &solver);
    let baseline = config.baseline_scenario();

    let full = baseline.derive("iron-blackout").offline(TUBARAO).offline(PONTA).build();
    let (routes, summary) = comparator.evaluate(IRON_ORE, &full);
    assert!(routes.is_empty());
    assert_eq!(summary.total_volume_kg, 0);
    assert_eq!(summary.weighted_intensity, 0.0);

    let (before, _) = comparator.evaluate(IRON_ORE, baseline);
    let partial = config.scenario("port-blackout").unwrap();
    let (after, _) = comparator.evaluate(IRON_ORE, partial);
    assert_eq!(after.len(), before.len());
    assert!(after.iter().all(|r| r.origin_name == PONTA));

    let kept = |routes: &[chokepoint_impact::SelectedRoute]| {
        routes.iter().find(|r| r.dest_name == QINGDAO).map(|r| (r.origin_name.clone(), r.distance_nm))
    };
    assert_eq!(kept(&before), kept(&after));
}

#[test]
fn comparison_totals_are_exact_sums() {
    let config = bundled();
    let solver = route_solver(ScriptedSolver::new().default_km(17_250.5));
    let result = ScenarioComparator::new(&config, &solver).compare(
        &ProductFilter::All,
        config.scenario("port-blackout").unwrap(),
        config.baseline_scenario(),
    );

    let co2: f64 = result.emissions.iter().map(|r| r.co2_kg).fold(0.0, |a, b| a + b);
    let volume: u64 = result.emissions.iter().map(|r| r.volume_kg).sum();
    let per_product_co2: f64 = result
        .products
        .iter()
        .map(|p| p.active.total_co2_kg)
        .fold(0.0, |a, b| a + b);

    assert_eq!(result.products.len(), 5);
    assert_eq!(result.active.total_volume_kg, volume);
    assert!((result.active.total_co2_kg - co2).abs() <= co2 * 1e-12);
    assert!((result.active.total_co2_kg - per_product_co2).abs() <= co2 * 1e-12);
    assert_eq!(result.active_vectors(), result.routes.len());
    // Every lane still has an online origin, so volume is unchanged.
    assert_eq!(result.volume_impact.status, ImpactStatus::Stable);
}

#[test]
fn doubling_a_volume_doubles_only_that_lane() {
    let json = assets::default_config_json().unwrap();
    let mut raw: serde_json::Value = serde_json::from_str(&json).unwrap();
    let volume = raw["products"][0]["export_volumes_kg"][QINGDAO].as_u64().unwrap();
    raw["products"][0]["export_volumes_kg"][QINGDAO] = serde_json::json!(volume * 2);

    let original = bundled();
    let doubled = StaticConfig::from_json_str(&raw.to_string()).unwrap();
    let solver = route_solver(ScriptedSolver::new().default_km(18_000.0));

    let emissions = |config: &StaticConfig| {
        let (_, summary) =
            ScenarioComparator::new(config, &solver).evaluate(IRON_ORE, config.baseline_scenario());
        summary.records
    };
    let before = emissions(&original);
    let after = emissions(&doubled);

    assert_eq!(before.len(), after.len());
    for (b, a) in before.iter().zip(&after) {
        if a.destination == QINGDAO {
            assert_eq!(a.co2_kg, 2.0 * b.co2_kg);
        } else {
            assert_eq!(a.co2_kg, b.co2_kg);
        }
    }
}

#[test]
fn business_as_usual_matches_the_baseline() {
    let config = bundled();
    let solver = route_solver(ScriptedSolver::new().default_km(12_000.0));
    let result = ScenarioComparator::new(&config, &solver).compare(
        &ProductFilter::All,
        config.scenario("business-as-usual").unwrap(),
        config.baseline_scenario(),
    );

    assert_eq!(result.co2_delta_pct, 0.0);
    assert_eq!(result.volume_delta_pct, 0.0);
    assert_eq!(result.efficiency_delta, 0.0);
    assert_eq!(result.co2_impact.status, ImpactStatus::Stable);
    assert_eq!(result.volume_impact.status, ImpactStatus::Stable);
    assert_eq!(result.efficiency_impact.status, ImpactStatus::Stable);
}

#[test]
fn canal_detours_read_as_worse_emissions() {
    let config = bundled();
    let qingdao = coords(&config, QINGDAO);
    let tubarao = coords(&config, TUBARAO);
    let solver = route_solver(
        ScriptedSolver::new()
            .default_km(15_000.0)
            .lane(tubarao, qingdao, 20_000.0)
            .detour(tubarao, qingdao, Restriction::Suez, Detour::Adds(4_000.0))
            .lane(coords(&config, PONTA), qingdao, 21_000.0)
            .detour(coords(&config, PONTA), qingdao, Restriction::Suez, Detour::Adds(4_000.0)),
    );
    let result = ScenarioComparator::new(&config, &solver).compare(
        &ProductFilter::parse(IRON_ORE),
        config.scenario("canal-collapse").unwrap(),
        config.baseline_scenario(),
    );

    assert!(result.co2_delta_pct > 0.0);
    assert_eq!(result.co2_impact.status, ImpactStatus::Worsened);
    assert_eq!(result.efficiency_impact.status, ImpactStatus::Worsened);
    assert_eq!(result.volume_impact.status, ImpactStatus::Stable);
}

#[test]
fn unknown_product_and_dead_solver_yield_empty_results() {
    let config = bundled();
    let solver = route_solver(ScriptedSolver::new());
    let comparator = ScenarioComparator::new(&config, &solver);

    let unknown = comparator.compare(
        &ProductFilter::parse("Lumber"),
        config.scenario("canal-collapse").unwrap(),
        config.baseline_scenario(),
    );
    assert!(unknown.routes.is_empty());
    assert_eq!(unknown.co2_delta_pct, 0.0);

    let unreachable = comparator.compare(
        &ProductFilter::All,
        config.scenario("canal-collapse").unwrap(),
        config.baseline_scenario(),
    );
    assert!(unreachable.routes.is_empty());
    assert_eq!(unreachable.active.total_volume_kg, 0);
    assert_eq!(unreachable.volume_delta_pct, 0.0);
    assert_eq!(unreachable.efficiency_delta_pct, 0.0);
}

#[test]
fn memoized_solver_gives_identical_results_with_fewer_calls() {
    let config = bundled();
    let scenario = config.scenario("atlantic-blockade").unwrap();

    let plain = Arc::new(ScriptedSolver::new().default_km(16_000.0));
    let uncached = RouteSolver::new(plain.clone());
    let expected = ScenarioComparator::new(&config, &uncached).compare(
        &ProductFilter::All,
        scenario,
        config.baseline_scenario(),
    );

    let inner = Arc::new(ScriptedSolver::new().default_km(16_000.0));
    let cached = RouteSolver::new(Arc::new(CachedSolver::new(inner.clone())));
    let comparator = ScenarioComparator::new(&config, &cached);
    let first = comparator.compare(&ProductFilter::All, scenario, config.baseline_scenario());
    let second = comparator.compare(&ProductFilter::All, scenario, config.baseline_scenario());

    assert_eq!(first, expected);
    assert_eq!(second, expected);
    assert!(inner.call_count() < plain.call_count());
}

#[test]
fn scenarios_are_built_from_the_baseline() {
    let config = bundled();
    let canal: &Scenario = config.scenario("canal-collapse").unwrap();
    assert!(canal.restrictions().is_superset(config.baseline_scenario().restrictions()));
    assert!(canal.restrictions().contains(Restriction::Suez));
    assert!(canal.restrictions().contains(Restriction::Panama));
    assert!(!config.baseline_scenario().restrictions().contains(Restriction::Suez));
}
