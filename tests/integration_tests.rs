use netscout::errors::NetworkDiscoveryError;
use netscout::model::{DeviceStatus, DeviceType};
use netscout::topology::GATEWAY_NODE_ID;
use netscout::{NetworkDiscovery, ScanConfig, ScanMode};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use test_utils::{
    fake_engine, ip, FakeLiveness, FakeNeighbors, FakePorts, FakeResolver, FakeRoutes, OnceNeighbors, SlowLiveness,
    SlowPorts,
};


#[tokio::test]
async fn test_small_subnet_with_single_router() {
    let liveness = Arc::new(FakeLiveness::new(&["192.168.1.1"]));
    let ports = Arc::new(FakePorts::default().with("192.168.1.1", &[80, 22]));
    let engine = fake_engine(
        liveness.clone(),
        ports,
        FakeResolver::default().with("192.168.1.1", "router-gw"),
        FakeNeighbors::default().with("192.168.1.1", "3c-07-54-aa-bb-cc"),
        Some("192.168.1.1"),
    );

    let devices = engine.scan("192.168.1.0/30", ScanMode::Detailed).await.unwrap();

    // .1 and .2 are the only usable hosts in a /30
    assert_eq!(liveness.calls.load(Ordering::SeqCst), 2);
    assert_eq!(devices.len(), 1);
    let router = &devices[0];
    assert_eq!(router.address, ip("192.168.1.1"));
    assert_eq!(router.hostname.as_deref(), Some("router-gw"));
    assert_eq!(router.device_type(), DeviceType::Router);
    assert_eq!(router.operating_system(), "Embedded/Router OS");
    assert_eq!(router.open_ports(), vec![22, 80]);
    assert_eq!(router.mac_address.as_deref(), Some("3C:07:54:AA:BB:CC"));
    assert_eq!(router.vendor(), "AVM (FritzBox)");
    assert_eq!(router.services().get(&22).map(String::as_str), Some("SSH"));

    let history = engine.registry().history().await;
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].range, "192.168.1.0/30");
    assert_eq!(history[0].devices_found, 1);
}

#[tokio::test]
async fn test_quiet_host_stays_online_and_unknown() {
    let engine = fake_engine(
        Arc::new(FakeLiveness::new(&["10.0.0.7"])),
        Arc::new(FakePorts::default()),
        FakeResolver::default(),
        FakeNeighbors::default(),
        None,
    );

    let devices = engine.scan("10.0.0.7", ScanMode::Detailed).await.unwrap();

    assert_eq!(devices.len(), 1);
    let device = &devices[0];
    assert_eq!(device.status, DeviceStatus::Online);
    assert_eq!(device.hostname_or_unknown(), "unknown");
    assert_eq!(device.device_type(), DeviceType::Unknown);
    assert_eq!(device.operating_system(), "Unknown");
    assert_eq!(device.vendor(), "Unknown");
    assert!(device.open_ports().is_empty());
    assert!(device.mac_address.is_none());
}

#[tokio::test]
async fn test_sweep_results_are_a_subset_of_the_range() {
    let liveness = Arc::new(FakeLiveness::new(&["10.1.0.3", "10.1.0.9", "10.2.0.1"]));
    let engine = fake_engine(
        liveness.clone(),
        Arc::new(FakePorts::default()),
        FakeResolver::default(),
        FakeNeighbors::default(),
        None,
    );

    let mut hosts = engine.sweep("10.1.0.0/28").await.unwrap();
    hosts.sort_by_key(|h| h.address);

    let addresses: Vec<_> = hosts.iter().map(|h| h.address).collect();
    assert_eq!(addresses, vec![ip("10.1.0.3"), ip("10.1.0.9")]);
    assert_eq!(liveness.calls.load(Ordering::SeqCst), 14);
}

#[tokio::test]
async fn test_liveness_only_scan_skips_port_probes() {
    let ports = Arc::new(FakePorts::default().with("10.0.0.2", &[22]));
    let engine = fake_engine(
        Arc::new(FakeLiveness::new(&["10.0.0.2"])),
        ports.clone(),
        FakeResolver::default(),
        FakeNeighbors::default(),
        None,
    );

    let devices = engine.scan("10.0.0.1-10.0.0.4", ScanMode::LivenessOnly).await.unwrap();

    assert_eq!(devices.len(), 1);
    assert!(devices[0].profile.is_none());
    assert_eq!(ports.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_invalid_range_fails_before_probing() {
    let liveness = Arc::new(FakeLiveness::new(&["10.0.0.1"]));
    let engine = fake_engine(
        liveness.clone(),
        Arc::new(FakePorts::default()),
        FakeResolver::default(),
        FakeNeighbors::default(),
        None,
    );

    for range in ["not-a-range", "10.0.0.0/8", "10.0.0.9-10.0.0.1"] {
        let err = engine.scan(range, ScanMode::Detailed).await.unwrap_err();
        assert!(matches!(err, NetworkDiscoveryError::Configuration(_)), "{}: {}", range, err);
        assert!(err.is_fatal());
    }
    assert_eq!(liveness.calls.load(Ordering::SeqCst), 0);
    assert!(engine.registry().history().await.is_empty());
}

#[tokio::test]
async fn test_rescan_updates_registry_in_place() {
    let ports = Arc::new(FakePorts::default().with("10.0.0.5", &[22]));
    let engine = fake_engine(
        Arc::new(FakeLiveness::new(&["10.0.0.5"])),
        ports,
        FakeResolver::default().with("10.0.0.5", "box"),
        FakeNeighbors::default(),
        None,
    );

    engine.scan("10.0.0.4/30", ScanMode::Detailed).await.unwrap();
    engine.scan("10.0.0.4/30", ScanMode::LivenessOnly).await.unwrap();

    let registry = engine.registry();
    assert_eq!(registry.len().await, 1);
    let device = registry.get(ip("10.0.0.5")).await.unwrap();
    assert_eq!(device.device_type(), DeviceType::LinuxServer);
    assert_eq!(device.open_ports(), vec![22]);
    assert_eq!(registry.history().await.len(), 2);
}

#[tokio::test]
async fn test_topology_star_around_detected_gateway() {
    let engine = fake_engine(
        Arc::new(FakeLiveness::new(&["192.168.1.1", "192.168.1.10", "192.168.1.20"])),
        Arc::new(FakePorts::default().with("192.168.1.10", &[631, 9100])),
        FakeResolver::default(),
        FakeNeighbors::default(),
        Some("192.168.1.1"),
    );
    engine.scan("192.168.1.0/27", ScanMode::Detailed).await.unwrap();

    let first = engine.topology().await;
    let second = engine.topology().await;

    assert_eq!(first.nodes, second.nodes);
    assert_eq!(first.edges, second.edges);
    assert_eq!(first.nodes.len(), 4);
    assert_eq!(first.edges.len(), 2);
    assert!(first.edges.iter().all(|e| e.to == GATEWAY_NODE_ID && e.kind == "ethernet"));
    let printer = first.nodes.iter().find(|n| n.id == "192.168.1.10").unwrap();
    assert_eq!(printer.category, DeviceType::Printer);
}

#[tokio::test]
async fn test_gateway_falls_back_to_conventional_candidates() {
    let engine = fake_engine(
        Arc::new(FakeLiveness::new(&["10.0.0.1", "10.0.0.5"])),
        Arc::new(FakePorts::default()),
        FakeResolver::default(),
        FakeNeighbors::default(),
        None,
    );
    engine.scan("10.0.0.0/29", ScanMode::LivenessOnly).await.unwrap();

    assert_eq!(engine.detect_gateway().await, Some(ip("10.0.0.1")));
    let topology = engine.topology().await;
    assert_eq!(topology.edges.len(), 1);
    assert_eq!(topology.edges[0].from, "10.0.0.5");
}

#[tokio::test]
async fn test_no_gateway_means_no_edges() {
    let engine = fake_engine(
        Arc::new(FakeLiveness::new(&["10.9.0.5"])),
        Arc::new(FakePorts::default()),
        FakeResolver::default(),
        FakeNeighbors::default(),
        None,
    );
    engine.scan("10.9.0.4/30", ScanMode::LivenessOnly).await.unwrap();

    assert_eq!(engine.detect_gateway().await, None);
    let topology = engine.topology().await;
    assert_eq!(topology.nodes.len(), 1);
    assert!(topology.edges.is_empty());
}

#[tokio::test]
async fn test_export_to_file_and_bad_path() {
    let engine = fake_engine(
        Arc::new(FakeLiveness::new(&["192.168.1.1"])),
        Arc::new(FakePorts::default().with("192.168.1.1", &[80, 22])),
        FakeResolver::default().with("192.168.1.1", "router-gw"),
        FakeNeighbors::default(),
        Some("192.168.1.1"),
    );
    engine.scan("192.168.1.0/30", ScanMode::Detailed).await.unwrap();

    let path = std::env::temp_dir().join(format!("netscout_export_{}.json", std::process::id()));
    let written = engine.export_to_file(Some(&path)).await.unwrap();
    assert_eq!(written, path);

    let content = tokio::fs::read_to_string(&path).await.unwrap();
    let json: serde_json::Value = serde_json::from_str(&content).unwrap();
    assert_eq!(json["summary"]["totalDevices"], 1);
    assert_eq!(json["devices"][0]["deviceType"], "router");
    assert_eq!(json["devices"][0]["openPorts"], serde_json::json!([22, 80]));
    assert_eq!(json["scanHistory"][0]["devicesFound"], 1);
    tokio::fs::remove_file(&path).await.unwrap();

    let bad = std::env::temp_dir().join("netscout-no-such-dir").join("out.json");
    let err = engine.export_to_file(Some(&bad)).await.unwrap_err();
    assert!(matches!(err, NetworkDiscoveryError::ExportIo { .. }));
    assert_eq!(engine.registry().len().await, 1);
}

#[tokio::test]
async fn test_detailed_rescan_with_neighbor_miss_keeps_mac_and_vendor() {
    let engine = fake_engine(
        Arc::new(FakeLiveness::new(&["10.0.0.5"])),
        Arc::new(FakePorts::default().with("10.0.0.5", &[22])),
        FakeResolver::default(),
        FakeNeighbors::default(),
        None,
    )
    .with_neighbor_table(Arc::new(OnceNeighbors::default().with("10.0.0.5", "00:50:56:01:02:03")));

    let first = engine.scan("10.0.0.4/30", ScanMode::Detailed).await.unwrap();
    assert_eq!(first[0].vendor(), "VMware");
    let second = engine.scan("10.0.0.4/30", ScanMode::Detailed).await.unwrap();
    assert_eq!(second[0].mac_address, None);

    let device = engine.registry().get(ip("10.0.0.5")).await.unwrap();
    assert_eq!(device.mac_address.as_deref(), Some("00:50:56:01:02:03"));
    assert_eq!(device.vendor(), "VMware");

    let snapshot = engine.export_snapshot().await;
    assert_eq!(snapshot.devices[0].mac_address, "00:50:56:01:02:03");
    assert_eq!(snapshot.devices[0].vendor, "VMware");
}

#[tokio::test(start_paused = true)]
async fn test_fan_out_stays_within_worker_bounds() {
    let config = ScanConfig::default();
    let (liveness_workers, port_workers) = (config.liveness_workers, config.port_workers);
    let max_connects = config.max_in_flight_connects();

    let liveness = Arc::new(SlowLiveness::default());
    let ports = Arc::new(SlowPorts::default());
    let engine = NetworkDiscovery::new(config)
        .unwrap()
        .with_liveness_probe(liveness.clone())
        .with_port_probe(ports.clone())
        .with_resolver(Arc::new(FakeResolver::default()))
        .with_neighbor_table(Arc::new(FakeNeighbors::default()))
        .with_route_table(Arc::new(FakeRoutes(None)));

    let devices = engine.scan("10.0.0.0/24", ScanMode::Detailed).await.unwrap();

    assert_eq!(devices.len(), 254);
    assert!(devices.iter().all(|d| d.open_ports() == vec![22]));

    let live_peak = liveness.gauge.peak();
    assert!(live_peak > 1 && live_peak <= liveness_workers, "liveness peak {}", live_peak);

    let port_peak = ports.gauge.peak();
    assert!(port_peak > port_workers && port_peak <= max_connects, "port peak {}", port_peak);

    let per_host_peak = ports.per_host_peak.load(Ordering::SeqCst);
    assert!(per_host_peak > 1 && per_host_peak <= port_workers, "per-host peak {}", per_host_peak);
}
