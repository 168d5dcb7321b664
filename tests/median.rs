use geo::{polygon, Geometry};
use ndarray::{array, Array2};
use spopt_locate::{
    BaseOutput, DistanceMetric, GeoFrame, HighsSolver, KNearestPMedian, LocateError,
    LocateSolver, Lscp, PCenter, PDispersion, PMedian,
};

fn line_costs(clients: &[f64], facilities: &[f64]) -> Array2<f64> {
    Array2::from_shape_fn((clients.len(), facilities.len()), |(i, j)| {
        (clients[i] - facilities[j]).abs()
    })
}

fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-6
}

fn knearest_layers() -> (GeoFrame, GeoFrame) {
    let demand = GeoFrame::from_points(Some("EPSG:4326"), &[[0.5, 1.0], [1.5, 1.0]])
        .with_attribute("demand", vec![1.0, 1.0])
        .unwrap();
    let facility = GeoFrame::from_points(Some("EPSG:4326"), &[[1.0, 1.0], [0.0, 2.0], [2.0, 0.0]])
        .with_attribute("capacity", vec![1.0, 1.0, 1.0])
        .unwrap();
    (demand, facility)
}

fn knearest(
    demand: &GeoFrame,
    facility: &GeoFrame,
    k: &[usize],
) -> Result<KNearestPMedian, LocateError> {
    KNearestPMedian::from_geodataframe(
        demand,
        facility,
        "geometry",
        "geometry",
        "demand",
        2,
        Some("capacity"),
        Some(k),
        None,
        DistanceMetric::Euclidean,
        KNearestPMedian::DEFAULT_NAME,
    )
}

#[test]
fn p_median_assigns_to_nearest_open_site() {
    let cost = line_costs(&[0.0, 1.0, 10.0, 11.0], &[0.5, 10.5, 5.0]);
    let weights = [1.0, 1.0, 1.0, 1.0];
    let mut pm =
        PMedian::from_cost_matrix(&cost, &weights, 2, None, None, PMedian::DEFAULT_NAME).unwrap();
    pm.solve(&HighsSolver::new(), true).unwrap();

    assert_eq!(pm.selected_facilities().unwrap(), vec![0, 1]);
    assert!(approx(pm.objective_value().unwrap(), 2.0));
    assert!(approx(pm.mean_dist().unwrap(), 0.5));
    assert_eq!(pm.fac2cli().unwrap(), &[vec![0, 1], vec![2, 3], vec![]]);
    assert_eq!(pm.cli2fac().unwrap(), &[vec![0], vec![0], vec![1], vec![1]]);
}

#[test]
fn p_median_capacity_below_demand_is_a_specification_error() {
    let cost = line_costs(&[0.0, 1.0], &[0.5, 1.5, 3.0]);
    let caps = [1.0, 1.0, 1.0];
    let err = PMedian::from_cost_matrix(&cost, &[2.0, 2.0], 1, Some(&caps), None, "P-Median")
        .unwrap_err();
    match err {
        LocateError::Specification(msg) => assert!(msg.starts_with("Problem is infeasible")),
        other => panic!("unexpected error {other:?}"),
    }
}

#[test]
fn knearest_matches_the_two_client_instance() {
    let (demand, facility) = knearest_layers();
    let mut model = knearest(&demand, &facility, &[1, 1]).unwrap();
    model.solve(&HighsSolver::new(), true).unwrap();

    // Both clients want site 0 but it holds one unit; either may be moved out.
    assert!(approx(model.mean_dist().unwrap(), 0.8090169943749475));
    let fac2cli = model.fac2cli().unwrap().to_vec();
    let cli2fac = model.cli2fac().unwrap().to_vec();
    assert!(
        (fac2cli == vec![vec![1], vec![0], vec![]] && cli2fac == vec![vec![1], vec![0]])
            || (fac2cli == vec![vec![0], vec![], vec![1]] && cli2fac == vec![vec![0], vec![2]]),
        "fac2cli = {fac2cli:?}, cli2fac = {cli2fac:?}"
    );
    assert_eq!(model.k_array().iter().sum::<usize>(), 3);
}

#[test]
fn knearest_widens_clients_other_than_the_saturated_one() {
    let cost = array![[10.0, 1.0], [0.0, 5.0]];
    let mut model = KNearestPMedian::from_cost_matrix(
        &cost,
        &[2.0, 1.0],
        2,
        Some(&[2.0, 1.0]),
        Some(&[2, 1]),
        None,
        KNearestPMedian::DEFAULT_NAME,
    )
    .unwrap();
    model.solve(&HighsSolver::new(), true).unwrap();

    // Client 0 already sees both sites; only client 1 moving to site 1 frees room.
    assert_eq!(model.k_array(), &[2, 2]);
    assert_eq!(model.fac2cli().unwrap(), &[vec![0], vec![1]]);
    assert!(approx(model.objective_value().unwrap(), 25.0));
    assert!(approx(model.mean_dist().unwrap(), 25.0 / 3.0));
}

#[test]
fn knearest_placeholder_at_full_width_is_infeasible() {
    let cost = array![[1.0, 2.0], [2.0, 1.0], [1.0, 1.0]];
    let mut model =
        KNearestPMedian::from_cost_matrix(&cost, &[2.0; 3], 2, Some(&[3.0, 3.0]), None, None, "k")
            .unwrap();
    // Total capacity matches demand, but each site holds only one client.
    match model.solve(&HighsSolver::new(), true).unwrap_err() {
        LocateError::Specification(msg) => {
            assert!(msg.starts_with("Problem is infeasible. Client"), "{msg}")
        }
        other => panic!("unexpected error {other:?}"),
    }
    assert_eq!(model.k_array(), &[2, 2, 2]);
}

#[test]
fn knearest_capacity_precheck_uses_the_p_largest_sites() {
    let (_, facility) = knearest_layers();
    let demand = GeoFrame::from_points(Some("EPSG:4326"), &[[0.5, 1.0], [1.5, 1.0]])
        .with_attribute("demand", vec![10.0, 10.0])
        .unwrap();
    let err = KNearestPMedian::from_geodataframe(
        &demand,
        &facility,
        "geometry",
        "geometry",
        "demand",
        1,
        Some("capacity"),
        Some(&[1, 1]),
        None,
        DistanceMetric::Euclidean,
        KNearestPMedian::DEFAULT_NAME,
    )
    .unwrap_err();
    match err {
        LocateError::Specification(msg) => {
            let expected = "Problem is infeasible. The highest possible capacity";
            assert!(msg.starts_with(expected), "{msg}")
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[test]
fn knearest_without_results_keeps_arrays_unset() {
    let (demand, facility) = knearest_layers();
    let mut model = knearest(&demand, &facility, &[1, 1]).unwrap();
    model.solve(&HighsSolver::new(), false).unwrap();
    assert!(matches!(model.fac2cli(), Err(LocateError::ResultsUnavailable(_))));
    assert!(matches!(model.cli2fac(), Err(LocateError::ResultsUnavailable(_))));
    assert!(matches!(model.mean_dist(), Err(LocateError::ResultsUnavailable(_))));
}

#[test]
fn knearest_rejects_out_of_range_k() {
    let (demand, facility) = knearest_layers();
    for k in [[10, 10], [1, 4], [0, 1]] {
        let err = knearest(&demand, &facility, &k).unwrap_err();
        assert!(err.to_string().starts_with("The value of k should be"), "{err}");
    }
}

#[test]
fn knearest_requires_crs_on_both_layers() {
    let (demand, facility) = knearest_layers();
    let bare_demand = GeoFrame::from_points(None, &[[0.5, 1.0], [1.5, 1.0]])
        .with_attribute("demand", vec![1.0, 1.0])
        .unwrap();
    let err = knearest(&bare_demand, &facility, &[1, 1]).unwrap_err();
    assert!(err.to_string().starts_with("GeoDataFrame gdf_demand "));

    let bare_facility = GeoFrame::from_points(None, &[[1.0, 1.0], [0.0, 2.0], [2.0, 0.0]])
        .with_attribute("capacity", vec![1.0, 1.0, 1.0])
        .unwrap();
    let err = knearest(&demand, &bare_facility, &[1, 1]).unwrap_err();
    assert!(err.to_string().starts_with("GeoDataFrame gdf_facility "));
}

#[test]
fn crs_mismatch_fails_before_any_solve() {
    let demand = GeoFrame::from_points(Some("EPSG:4326"), &[[0.0, 0.0]]);
    let facility = GeoFrame::from_points(Some("EPSG:3857"), &[[1.0, 0.0]]);
    let err = Lscp::from_geodataframe(
        &demand,
        &facility,
        "geometry",
        "geometry",
        5.0,
        None,
        DistanceMetric::Euclidean,
        "LSCP",
    )
    .unwrap_err();
    assert!(matches!(err, LocateError::CrsMismatch { .. }));
}

#[test]
fn polygon_demand_is_reduced_to_centroids() {
    let square = |x: f64| {
        Geometry::Polygon(polygon![
            (x: x, y: 0.0),
            (x: x + 1.0, y: 0.0),
            (x: x + 1.0, y: 1.0),
            (x: x, y: 1.0),
        ])
    };
    let demand = GeoFrame::new(Some("EPSG:3857"), vec![square(0.0), square(10.0)]);
    let facility = GeoFrame::from_points(Some("EPSG:3857"), &[[0.5, 0.5], [10.5, 0.5], [5.0, 5.0]]);
    let mut lscp = Lscp::from_geodataframe(
        &demand,
        &facility,
        "geometry",
        "geometry",
        0.1,
        None,
        DistanceMetric::Euclidean,
        "LSCP",
    )
    .unwrap();
    lscp.solve(&HighsSolver::new(), true).unwrap();
    assert_eq!(lscp.selected_facilities().unwrap(), vec![0, 1]);
    assert_eq!(lscp.fac2cli().unwrap(), &[vec![0], vec![1], vec![]]);
}

#[test]
fn p_center_minimizes_the_worst_assignment() {
    let cost = line_costs(&[0.0, 4.0, 10.0], &[2.0, 10.0, 5.0]);
    let mut pc = PCenter::from_cost_matrix(&cost, 2, None, PCenter::DEFAULT_NAME).unwrap();
    pc.solve(&HighsSolver::new(), true).unwrap();

    assert_eq!(pc.selected_facilities().unwrap(), vec![0, 1]);
    assert!(approx(pc.max_distance().unwrap(), 2.0));
    assert_eq!(pc.fac2cli().unwrap(), &[vec![0, 1], vec![2], vec![]]);
}

#[test]
fn p_dispersion_spreads_selected_sites() {
    let sites = [0.0, 1.0, 3.0, 7.0];
    let cost = line_costs(&sites, &sites);
    let mut pd = PDispersion::from_cost_matrix(&cost, 3, None, PDispersion::DEFAULT_NAME).unwrap();
    pd.solve(&HighsSolver::new(), true).unwrap();

    assert_eq!(pd.selected_facilities().unwrap(), vec![0, 2, 3]);
    assert!(approx(pd.min_distance().unwrap(), 3.0));
    assert!(approx(pd.objective_value().unwrap(), 3.0));
}

#[test]
fn p_dispersion_from_a_facility_layer() {
    let sites = [[0.0, 0.0], [1.0, 0.0], [0.0, 5.0], [8.0, 0.0]];
    let facility = GeoFrame::from_points(Some("EPSG:3857"), &sites)
        .with_attribute("fixed", vec![0.0, 1.0, 0.0, 0.0])
        .unwrap();
    let mut pd = PDispersion::from_geodataframe(
        &facility,
        "geometry",
        2,
        Some("fixed"),
        DistanceMetric::Manhattan,
        "P-Dispersion",
    )
    .unwrap();
    pd.solve(&HighsSolver::new(), true).unwrap();

    // Site 1 is forced open; its farthest partner is site 3 (distance 7).
    assert_eq!(pd.selected_facilities().unwrap(), vec![1, 3]);
    assert!(approx(pd.min_distance().unwrap(), 7.0));
}

#[test]
fn p_dispersion_zero_sites_fails() {
    let cost = array![[0.0, 2.0], [2.0, 0.0]];
    let mut pd = PDispersion::from_cost_matrix(&cost, 0, None, "P-Dispersion").unwrap();
    assert!(matches!(
        pd.solve(&HighsSolver::new(), true),
        Err(LocateError::NoFacilitiesRequested(_))
    ));
}
