//! Hierarchical procedural map generation: major/minor urban centers
//! connected by a highway backbone, each center filled with a locally dense
//! road cluster, scattered rural infrastructure filling the remainder of the
//! map, and Site/Parking/GasStation placement driven by per-km2 rates.
//!
//! Not part of the tick-critical path — this runs once, between simulation
//! runs, and never touches agent state directly.

use std::f64::consts::PI;

use dt_agent::{Building, BuildingStore, GasStation, Parking, Site};
use dt_core::{BuildingId, BuildingKind, GeoPoint, NodeId, RoadClass, RoadMode, SimRng, SiteId};
use dt_spatial::RoadGraph;

use crate::params::GenerationParams;

const CENTER_RADIUS_KM: f64 = 2.0;
const KM_TO_M: f64 = 1000.0;
const PARKING_CAPACITY_RANGE: (u32, u32) = (3, 10);
const MAX_PLACEMENT_ATTEMPTS: u32 = 200;

/// The product of a generation run: a populated graph and the buildings
/// attached to it, ready to hand to `World::new`/`World::add_building`.
pub struct GeneratedMap {
    pub graph: RoadGraph,
    pub buildings: BuildingStore,
}

struct Center {
    pos: GeoPoint,
    is_major: bool,
    nodes: Vec<NodeId>,
}

impl Center {
    fn gateway(&self) -> NodeId {
        self.nodes[0]
    }
}

/// Run one generation pass. Deterministic for a given `params.seed`.
pub fn generate(params: &GenerationParams) -> GeneratedMap {
    let mut rng = SimRng::new(params.seed);
    let mut graph = RoadGraph::new();
    let mut buildings = BuildingStore::new();

    let width_m = params.map_width_km * KM_TO_M;
    let height_m = params.map_height_km * KM_TO_M;
    let radius_m = CENTER_RADIUS_KM * KM_TO_M;

    let mut centers = place_centers(params, width_m, height_m, &mut rng);
    for center in &mut centers {
        populate_center_cluster(params, center, radius_m, &mut graph, &mut rng);
    }
    for center in &centers {
        connect_cluster_interior(params, center, &mut graph, &mut rng);
    }
    connect_centers(params, &centers, &mut graph, &mut rng);

    let rural_nodes = scatter_rural_nodes(params, &centers, width_m, height_m, radius_m, &mut graph, &mut rng);

    let urban_nodes: Vec<NodeId> = centers.iter().flat_map(|c| c.nodes.iter().copied()).collect();
    place_buildings(params, &urban_nodes, &rural_nodes, width_m, height_m, centers.len(), &mut graph, &mut buildings, &mut rng);

    GeneratedMap { graph, buildings }
}

/// Rejection-sample major center positions at least `center_separation_km`
/// apart, then scatter `minor_per_major` minor centers within `urban_sprawl_km`
/// of each major one.
fn place_centers(params: &GenerationParams, width_m: f64, height_m: f64, rng: &mut SimRng) -> Vec<Center> {
    let separation_m = params.center_separation_km * KM_TO_M;
    let sprawl_m = params.urban_sprawl_km * KM_TO_M;
    let mut positions: Vec<GeoPoint> = Vec::new();
    let mut majors: Vec<usize> = Vec::new();

    for _ in 0..params.num_major_centers {
        let mut candidate = GeoPoint::new(rng.gen_range(0.0..width_m), rng.gen_range(0.0..height_m));
        for _ in 0..MAX_PLACEMENT_ATTEMPTS {
            if positions.iter().all(|p| p.distance_m(candidate) >= separation_m) {
                break;
            }
            candidate = GeoPoint::new(rng.gen_range(0.0..width_m), rng.gen_range(0.0..height_m));
        }
        majors.push(positions.len());
        positions.push(candidate);
    }

    let mut centers: Vec<Center> = positions.iter().map(|&pos| Center { pos, is_major: true, nodes: Vec::new() }).collect();

    for &major_idx in &majors {
        let major_pos = centers[major_idx].pos;
        for _ in 0..params.minor_per_major {
            let angle = rng.gen_range(0.0..(2.0 * PI));
            let radius = rng.gen_range(0.0..sprawl_m);
            let pos = GeoPoint::new(
                (major_pos.x + radius * angle.cos()).clamp(0.0, width_m),
                (major_pos.y + radius * angle.sin()).clamp(0.0, height_m),
            );
            centers.push(Center { pos, is_major: false, nodes: Vec::new() });
        }
    }
    centers
}

/// Scatter `local_density` nodes (per km²) within a center's radius.
fn populate_center_cluster(params: &GenerationParams, center: &mut Center, radius_m: f64, graph: &mut RoadGraph, rng: &mut SimRng) {
    let area_km2 = PI * CENTER_RADIUS_KM * CENTER_RADIUS_KM;
    let node_count = poisson_like_count(params.local_density * area_km2, rng).max(3);
    for _ in 0..node_count {
        let angle = rng.gen_range(0.0..(2.0 * PI));
        let r = radius_m * rng.gen_range(0.0_f64..1.0).sqrt();
        let pos = GeoPoint::new(center.pos.x + r * angle.cos(), center.pos.y + r * angle.sin());
        center.nodes.push(graph.add_node(pos));
    }
}

/// Connect a center's nodes: a spanning chain for guaranteed connectivity,
/// plus shortcut edges gated by `intra_connectivity`.
fn connect_cluster_interior(params: &GenerationParams, center: &Center, graph: &mut RoadGraph, rng: &mut SimRng) {
    let nodes = &center.nodes;
    for pair in nodes.windows(2) {
        add_local_edge(params, graph, pair[0], pair[1], true, rng);
    }
    for i in 0..nodes.len() {
        for skip in [2usize, 3] {
            if i + skip >= nodes.len() {
                continue;
            }
            let p = params.intra_connectivity / skip as f64;
            if rng.gen_bool(p) {
                add_local_edge(params, graph, nodes[i], nodes[i + skip], false, rng);
            }
        }
    }
}

/// Add one intra-cluster road: bidirectional with probability 0.95 (always
/// for spanning edges), otherwise one-way; arterial vs local by
/// `arterial_ratio`, lane count nudged up by `gridness`.
fn add_local_edge(params: &GenerationParams, graph: &mut RoadGraph, a: NodeId, b: NodeId, force_bidirectional: bool, rng: &mut SimRng) {
    let pos_a = graph.node(a).expect("node just inserted").pos;
    let pos_b = graph.node(b).expect("node just inserted").pos;
    let length_m = pos_a.distance_m(pos_b).max(1.0);
    let road_class = if rng.gen_bool(params.arterial_ratio) { RoadClass::Arterial } else { RoadClass::Local };
    let lanes: u8 = if rng.gen_bool(params.gridness) { 2 } else { 1 };
    let max_speed_kph = if road_class == RoadClass::Arterial { 60.0 } else { 40.0 };

    let _ = graph.add_edge(a, b, length_m, max_speed_kph, road_class, lanes, RoadMode::Road);
    if force_bidirectional || rng.gen_bool(0.95) {
        let _ = graph.add_edge(b, a, length_m, max_speed_kph, road_class, lanes, RoadMode::Road);
    }
}

/// Connect every center's gateway node into one backbone (minimum spanning
/// tree over inter-center distance), then thicken the mesh with extra edges
/// gated by `inter_connectivity`, and optionally close a ring road over the
/// major centers.
fn connect_centers(params: &GenerationParams, centers: &[Center], graph: &mut RoadGraph, rng: &mut SimRng) {
    if centers.len() < 2 {
        return;
    }
    let mut pairs: Vec<(usize, usize, f64)> = Vec::new();
    for i in 0..centers.len() {
        for j in (i + 1)..centers.len() {
            pairs.push((i, j, centers[i].pos.distance_m(centers[j].pos)));
        }
    }
    pairs.sort_by(|a, b| a.2.total_cmp(&b.2));

    let mut parent: Vec<usize> = (0..centers.len()).collect();
    fn find(parent: &mut [usize], x: usize) -> usize {
        if parent[x] != x {
            parent[x] = find(parent, parent[x]);
        }
        parent[x]
    }

    let mut in_backbone = vec![false; pairs.len()];
    for (idx, &(a, b, _)) in pairs.iter().enumerate() {
        let (ra, rb) = (find(&mut parent, a), find(&mut parent, b));
        if ra != rb {
            parent[ra] = rb;
            in_backbone[idx] = true;
            add_highway_edge(params, graph, centers[a].gateway(), centers[b].gateway(), pairs[idx].2, rng);
        }
    }
    for (idx, &(a, b, dist)) in pairs.iter().enumerate() {
        if in_backbone[idx] {
            continue;
        }
        if rng.gen_bool(params.inter_connectivity) {
            add_highway_edge(params, graph, centers[a].gateway(), centers[b].gateway(), dist, rng);
        }
    }

    if rng.gen_bool(params.ring_road_prob) {
        let mut major_idx: Vec<usize> = (0..centers.len()).filter(|&i| centers[i].is_major).collect();
        if major_idx.len() >= 3 {
            let centroid_x: f64 = major_idx.iter().map(|&i| centers[i].pos.x).sum::<f64>() / major_idx.len() as f64;
            let centroid_y: f64 = major_idx.iter().map(|&i| centers[i].pos.y).sum::<f64>() / major_idx.len() as f64;
            major_idx.sort_by(|&a, &b| {
                let angle_a = (centers[a].pos.y - centroid_y).atan2(centers[a].pos.x - centroid_x);
                let angle_b = (centers[b].pos.y - centroid_y).atan2(centers[b].pos.x - centroid_x);
                angle_a.total_cmp(&angle_b)
            });
            for window in major_idx.windows(2) {
                add_ring_edge(graph, centers[window[0]].gateway(), centers[window[1]].gateway());
            }
            add_ring_edge(graph, centers[*major_idx.last().unwrap()].gateway(), centers[major_idx[0]].gateway());
        }
    }
}

fn add_highway_edge(params: &GenerationParams, graph: &mut RoadGraph, a: NodeId, b: NodeId, straight_m: f64, rng: &mut SimRng) {
    let jitter = rng.gen_range(0.0..0.5) * params.highway_curviness;
    let length_m = (straight_m * (1.0 + jitter)).max(1.0);
    let _ = graph.add_edge(a, b, length_m, 100.0, RoadClass::Highway, 2, RoadMode::Road);
    let _ = graph.add_edge(b, a, length_m, 100.0, RoadClass::Highway, 2, RoadMode::Road);
}

fn add_ring_edge(graph: &mut RoadGraph, a: NodeId, b: NodeId) {
    let pos_a = graph.node(a).expect("node exists").pos;
    let pos_b = graph.node(b).expect("node exists").pos;
    let length_m = pos_a.distance_m(pos_b).max(1.0);
    let _ = graph.add_edge(a, b, length_m, 90.0, RoadClass::Ring, 2, RoadMode::Road);
    let _ = graph.add_edge(b, a, length_m, 90.0, RoadClass::Ring, 2, RoadMode::Road);
}

/// Scatter standalone rural nodes over the map, outside every center's
/// radius, each stitched to its nearest existing node by a local road.
fn scatter_rural_nodes(
    params: &GenerationParams,
    centers: &[Center],
    width_m: f64,
    height_m: f64,
    radius_m: f64,
    graph: &mut RoadGraph,
    rng: &mut SimRng,
) -> Vec<NodeId> {
    let map_area_km2 = params.map_width_km * params.map_height_km;
    let centers_area_km2 = (centers.len() as f64 * PI * CENTER_RADIUS_KM * CENTER_RADIUS_KM).min(map_area_km2);
    let rural_area_km2 = (map_area_km2 - centers_area_km2).max(0.0);
    let count = poisson_like_count(params.rural_density * rural_area_km2, rng);

    let mut rural_nodes = Vec::with_capacity(count);
    for _ in 0..count {
        let mut candidate = GeoPoint::new(rng.gen_range(0.0..width_m), rng.gen_range(0.0..height_m));
        for _ in 0..MAX_PLACEMENT_ATTEMPTS {
            if centers.iter().all(|c| c.pos.distance_m(candidate) > radius_m) {
                break;
            }
            candidate = GeoPoint::new(rng.gen_range(0.0..width_m), rng.gen_range(0.0..height_m));
        }
        let node = graph.add_node(candidate);

        let nearest = centers
            .iter()
            .flat_map(|c| c.nodes.iter().copied())
            .chain(rural_nodes.iter().copied())
            .min_by(|&a, &b| {
                let da = graph.node(a).unwrap().pos.distance_m(candidate);
                let db = graph.node(b).unwrap().pos.distance_m(candidate);
                da.total_cmp(&db)
            });
        if let Some(nearest) = nearest {
            let nearest_pos = graph.node(nearest).unwrap().pos;
            let length_m = nearest_pos.distance_m(candidate).max(1.0);
            let _ = graph.add_edge(node, nearest, length_m, 40.0, RoadClass::Local, 1, RoadMode::Road);
            let _ = graph.add_edge(nearest, node, length_m, 40.0, RoadClass::Local, 1, RoadMode::Road);
        }
        rural_nodes.push(node);
    }
    rural_nodes
}

/// Place sites, parkings, and gas stations across urban and rural nodes at
/// their configured per-km² rates. Rural facility counts are additionally
/// scaled by `rural_settlement_prob` (a rural node only gets built up if a
/// "settlement" forms there).
#[allow(clippy::too_many_arguments)]
fn place_buildings(
    params: &GenerationParams,
    urban_nodes: &[NodeId],
    rural_nodes: &[NodeId],
    width_m: f64,
    height_m: f64,
    center_count: usize,
    graph: &mut RoadGraph,
    buildings: &mut BuildingStore,
    rng: &mut SimRng,
) {
    let map_area_km2 = (width_m / KM_TO_M) * (height_m / KM_TO_M);
    let urban_area_km2 = (center_count as f64 * PI * CENTER_RADIUS_KM * CENTER_RADIUS_KM).min(map_area_km2);
    let rural_area_km2 = (map_area_km2 - urban_area_km2).max(0.0);

    let mut seq = 0u64;

    let urban_site_count = poisson_like_count(params.urban_sites_per_km2 * urban_area_km2, rng);
    let rural_site_count = poisson_like_count(params.rural_sites_per_km2 * rural_area_km2 * params.rural_settlement_prob, rng);
    place_sites(urban_nodes, urban_site_count, params.urban_activity_rate_range, &mut seq, graph, buildings, rng);
    place_sites(rural_nodes, rural_site_count, params.rural_activity_rate_range, &mut seq, graph, buildings, rng);

    let urban_parking_count = poisson_like_count(params.urban_parkings_per_km2 * urban_area_km2, rng);
    let rural_parking_count = poisson_like_count(params.rural_parkings_per_km2 * rural_area_km2 * params.rural_settlement_prob, rng);
    place_parkings(urban_nodes, urban_parking_count, &mut seq, graph, buildings, rng);
    place_parkings(rural_nodes, rural_parking_count, &mut seq, graph, buildings, rng);

    let urban_gas_count = poisson_like_count(params.urban_gas_stations_per_km2 * urban_area_km2, rng);
    let rural_gas_count = poisson_like_count(params.rural_gas_stations_per_km2 * rural_area_km2 * params.rural_settlement_prob, rng);
    place_gas_stations(urban_nodes, urban_gas_count, params.gas_station_capacity_range, params.gas_station_cost_factor_range, &mut seq, graph, buildings, rng);
    place_gas_stations(rural_nodes, rural_gas_count, params.gas_station_capacity_range, params.gas_station_cost_factor_range, &mut seq, graph, buildings, rng);
}

fn place_sites(
    candidates: &[NodeId],
    count: usize,
    activity_range: (f64, f64),
    seq: &mut u64,
    graph: &mut RoadGraph,
    buildings: &mut BuildingStore,
    rng: &mut SimRng,
) {
    if candidates.is_empty() {
        return;
    }
    for _ in 0..count {
        let node = candidates[rng.gen_range(0..candidates.len())];
        *seq += 1;
        let id = SiteId::new(format!("site-{seq}"));
        let activity_rate = rng.gen_range(activity_range.0..=activity_range.1);
        let site = Site::new(id.clone(), format!("Site {seq}"), activity_rate);
        if graph.attach_building(node, BuildingKind::Site, id.as_building_id()).is_ok() {
            buildings.insert(Building::Site(site));
        }
    }
}

fn place_parkings(candidates: &[NodeId], count: usize, seq: &mut u64, graph: &mut RoadGraph, buildings: &mut BuildingStore, rng: &mut SimRng) {
    if candidates.is_empty() {
        return;
    }
    for _ in 0..count {
        let node = candidates[rng.gen_range(0..candidates.len())];
        *seq += 1;
        let id = BuildingId::new(format!("parking-{seq}"));
        let capacity = rng.gen_range(PARKING_CAPACITY_RANGE.0..=PARKING_CAPACITY_RANGE.1);
        let parking = Parking::new(id.clone(), capacity);
        if graph.attach_building(node, BuildingKind::Parking, id).is_ok() {
            buildings.insert(Building::Parking(parking));
        }
    }
}

fn place_gas_stations(
    candidates: &[NodeId],
    count: usize,
    capacity_range: (u32, u32),
    cost_factor_range: (f64, f64),
    seq: &mut u64,
    graph: &mut RoadGraph,
    buildings: &mut BuildingStore,
    rng: &mut SimRng,
) {
    if candidates.is_empty() {
        return;
    }
    for _ in 0..count {
        let node = candidates[rng.gen_range(0..candidates.len())];
        *seq += 1;
        let id = BuildingId::new(format!("gas-{seq}"));
        let capacity = rng.gen_range(capacity_range.0..=capacity_range.1);
        let cost_factor = rng.gen_range(cost_factor_range.0..=cost_factor_range.1);
        let gas_station = GasStation::new(id.clone(), capacity, cost_factor);
        if graph.attach_building(node, BuildingKind::GasStation, id).is_ok() {
            buildings.insert(Building::GasStation(gas_station));
        }
    }
}

/// Expected-count rounding that keeps fractional rates meaningful in
/// aggregate: the integer part always materializes, the fractional part
/// materializes with matching probability.
fn poisson_like_count(expected: f64, rng: &mut SimRng) -> usize {
    if expected <= 0.0 {
        return 0;
    }
    let whole = expected.floor();
    let frac = expected - whole;
    whole as usize + usize::from(rng.gen_bool(frac))
}
