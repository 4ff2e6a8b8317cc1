//! End-to-end status assembly against mock upstream clients.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::{Arc, Once};
use std::time::{Duration, SystemTime};

use chrono::{DateTime, TimeDelta, Utc};
use tg_status::{ExitNode, ManualClock, StatusAssembler, SubnetRoute};
use tg_tailscale::{ExitNodeStatus, MockTailscaleClient, Prefs, UserProfile};
use tg_wireguard::{MockWireGuardClient, WireGuardPeer};
use tokio::time::Instant;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

static INIT: Once = Once::new();

fn init_test_tracing() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("info,tg_status=debug"));
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_test_writer().compact())
            .init();
    });
}

fn now() -> DateTime<Utc> {
    DateTime::from_timestamp(1_717_243_200, 0).unwrap()
}

fn caller() -> SocketAddr {
    "100.64.0.7:52000".parse().unwrap()
}

fn deadline() -> Instant {
    Instant::now() + Duration::from_secs(5)
}

struct Harness {
    tailscale: MockTailscaleClient,
    wireguard: MockWireGuardClient,
    clock: Arc<ManualClock>,
    assembler: StatusAssembler,
}

/// A gateway advertising an approved IPv4 exit route and a pending subnet,
/// with one handshaked and one idle WireGuard peer.
async fn gateway() -> Harness {
    init_test_tracing();

    let tailscale = MockTailscaleClient::new();
    let mut self_node = MockTailscaleClient::mock_self_node(
        "nSelf",
        "gateway",
        &[
            "100.64.0.1".parse().unwrap(),
            "fd7a:115c:a1e0::1".parse().unwrap(),
        ],
    );
    self_node
        .allowed_ips
        .get_or_insert_with(Vec::new)
        .push("0.0.0.0/0".parse().unwrap());
    self_node.user_id = 42;
    self_node.tags = Some(vec!["tag:gateway".to_string()]);
    self_node.key_expiry = Some(now() + TimeDelta::days(90));
    tailscale.set_self_node(self_node).await;
    tailscale
        .add_user(UserProfile {
            id: 42,
            login_name: "alice@example.com".to_string(),
            display_name: "Alice".to_string(),
        })
        .await;
    tailscale
        .set_prefs(Some(Prefs {
            advertise_routes: vec!["0.0.0.0/0".parse().unwrap(), "192.168.1.0/24".parse().unwrap()],
            ..Prefs::default()
        }))
        .await;

    let wireguard = MockWireGuardClient::new();
    wireguard
        .set_device(MockWireGuardClient::mock_device(
            "wg0",
            vec![
                WireGuardPeer {
                    endpoint: Some("198.51.100.7:51820".parse().unwrap()),
                    allowed_ips: vec!["10.8.0.2/32".parse().unwrap()],
                    ..MockWireGuardClient::mock_peer(
                        "cGVlci1vbmU=",
                        Some(SystemTime::from(now() - TimeDelta::seconds(332))),
                        1536,
                        512,
                    )
                },
                MockWireGuardClient::mock_peer("cGVlci10d28=", Some(SystemTime::UNIX_EPOCH), 0, 0),
            ],
        ))
        .await;

    let clock = Arc::new(ManualClock::new(now()));
    let assembler = StatusAssembler::new(
        Arc::new(tailscale.clone()),
        Arc::new(wireguard.clone()),
        "wg0",
    )
    .with_clock(clock.clone());

    Harness {
        tailscale,
        wireguard,
        clock,
        assembler,
    }
}

#[tokio::test]
async fn healthy_gateway_reports_both_sections() {
    let h = gateway().await;

    let report = h.assembler.compute_status(deadline(), caller()).await;

    let ts = report.tailscale.unwrap();
    assert_eq!(ts.id, "nSelf");
    assert_eq!(ts.state, "Running");
    assert_eq!(ts.device_name, "gateway");
    assert_eq!(ts.tailnet_name, "tailnet.ts.net");
    assert_eq!(ts.domain_name, "mock-tailnet");
    assert_eq!(ts.ipv4, Some(Ipv4Addr::new(100, 64, 0, 1)));
    assert_eq!(ts.ipv6, Some("fd7a:115c:a1e0::1".parse().unwrap()));
    assert_eq!(ts.operating_system, "linux");
    assert_eq!(ts.version, "1.80.2");
    assert_eq!(ts.user_profile.login_name, "alice@example.com");
    assert!(ts.is_tagged);
    assert_eq!(ts.tags, ["tag:gateway"]);
    assert_eq!(ts.key_expiry.as_deref(), Some("2024-08-30T12:00:00Z"));
    assert!(!ts.key_expired);

    let routes = ts.route_info.unwrap();
    assert!(routes.advertising_exit_node);
    assert!(routes.advertising_exit_node_approved);
    assert_eq!(
        routes.advertised_routes,
        [SubnetRoute {
            prefix: "192.168.1.0/24".parse().unwrap(),
            approved: false,
        }]
    );
    assert_eq!(routes.using_exit_node, None);

    let wg = report.wireguard.unwrap();
    assert_eq!(wg.device_name, "wg0");
    assert_eq!(wg.listen_port, Some(51820));
    assert_eq!(wg.peers.len(), 2);

    let active = &wg.peers[0];
    assert_eq!(active.endpoint.as_deref(), Some("198.51.100.7:51820"));
    assert_eq!(active.last_handshake_time.as_deref(), Some("2024-06-01T11:54:28Z"));
    assert_eq!(active.last_handshake_ago.as_deref(), Some("5m32s"));
    assert_eq!(active.receive_bytes.formatted, "1.50 KiB");
    assert_eq!(active.transmit_bytes.formatted, "512 B");
    assert_eq!(active.allowed_prefixes, ["10.8.0.2/32"]);

    let idle = &wg.peers[1];
    assert_eq!(idle.last_handshake_time, None);
    assert_eq!(idle.last_handshake_ago, None);
}

#[tokio::test]
async fn untagged_node_without_user_entry_gets_defaults() {
    let h = gateway().await;
    let mut node =
        MockTailscaleClient::mock_self_node("nSelf", "plain", &["100.64.0.1".parse().unwrap()]);
    node.user_id = 7;
    h.tailscale.set_self_node(node).await;

    let ts = h
        .assembler
        .compute_status(deadline(), caller())
        .await
        .tailscale
        .unwrap();
    assert!(!ts.is_tagged);
    assert!(ts.tags.is_empty());
    assert_eq!(ts.user_profile, UserProfile::default());
    assert_eq!(ts.key_expiry, None);
    assert_eq!(ts.ipv6, None);
}

#[tokio::test]
async fn sharee_caller_sees_masquerade_address() {
    let h = gateway().await;
    let sharee: SocketAddr = "203.0.113.9:41641".parse().unwrap();
    h.tailscale
        .set_whois(
            sharee.ip(),
            MockTailscaleClient::mock_whois(Some(Ipv4Addr::new(100, 100, 100, 5)), None),
        )
        .await;

    let shared = h.assembler.compute_status(deadline(), sharee).await;
    let own = h.assembler.compute_status(deadline(), caller()).await;

    let shared = shared.tailscale.unwrap();
    assert_eq!(shared.ipv4, Some(Ipv4Addr::new(100, 100, 100, 5)));
    assert_eq!(shared.ipv6, Some("fd7a:115c:a1e0::1".parse().unwrap()));
    assert_eq!(own.tailscale.unwrap().ipv4, Some(Ipv4Addr::new(100, 64, 0, 1)));
}

#[tokio::test]
async fn dual_stack_listener_caller_sees_masquerade_address() {
    let h = gateway().await;
    h.tailscale
        .set_whois(
            "203.0.113.9".parse().unwrap(),
            MockTailscaleClient::mock_whois(Some(Ipv4Addr::new(100, 100, 100, 5)), None),
        )
        .await;

    let mapped: SocketAddr = "[::ffff:203.0.113.9]:41641".parse().unwrap();
    let report = h.assembler.compute_status(deadline(), mapped).await;
    assert_eq!(
        report.tailscale.unwrap().ipv4,
        Some(Ipv4Addr::new(100, 100, 100, 5))
    );
}

#[tokio::test]
async fn exit_node_in_use_is_named_from_peer_list() {
    let h = gateway().await;
    h.tailscale
        .add_peer(MockTailscaleClient::mock_peer(
            "nExit",
            "exit-sfo",
            IpAddr::from([100, 64, 0, 9]),
            &[],
        ))
        .await;
    h.tailscale
        .set_exit_node_status(Some(ExitNodeStatus {
            id: "nExit".to_string(),
            online: false,
            tailscale_ips: vec!["100.64.0.9/32".parse().unwrap()],
        }))
        .await;

    let routes = h
        .assembler
        .compute_status(deadline(), caller())
        .await
        .tailscale
        .unwrap()
        .route_info
        .unwrap();
    assert_eq!(
        routes.using_exit_node,
        Some(ExitNode {
            id: "nExit".to_string(),
            name: "exit-sfo.tailnet.ts.net.".to_string(),
            online: false,
        })
    );

    h.tailscale.remove_peer("nExit").await;
    let routes = h
        .assembler
        .compute_status(deadline(), caller())
        .await
        .tailscale
        .unwrap()
        .route_info
        .unwrap();
    assert_eq!(routes.using_exit_node.unwrap().name, "100.64.0.9");
}

#[tokio::test]
async fn missing_wireguard_device_keeps_tailscale_section() {
    let h = gateway().await;
    h.wireguard.remove_device("wg0").await;

    let report = h.assembler.compute_status(deadline(), caller()).await;

    assert!(report.tailscale.is_ok());
    let err = report.wireguard.unwrap_err();
    assert!(err.contains("wg0"), "{err}");
}

#[tokio::test]
async fn unreachable_tailscale_keeps_wireguard_section() {
    init_test_tracing();
    let wireguard = MockWireGuardClient::new();
    wireguard
        .set_device(MockWireGuardClient::mock_device("wg0", Vec::new()))
        .await;
    let assembler = StatusAssembler::new(
        Arc::new(MockTailscaleClient::disconnected()),
        Arc::new(wireguard),
        "wg0",
    );

    let report = assembler.compute_status(deadline(), caller()).await;

    assert_eq!(
        report.tailscale.unwrap_err(),
        "tailscale: node is not connected to tailnet"
    );
    assert_eq!(report.wireguard.unwrap().peers.len(), 0);
}

#[tokio::test]
async fn unavailable_prefs_only_drops_route_info() {
    let h = gateway().await;
    h.tailscale.set_prefs(None).await;

    let ts = h
        .assembler
        .compute_status(deadline(), caller())
        .await
        .tailscale
        .unwrap();
    assert_eq!(ts.route_info, None);
    assert_eq!(ts.device_name, "gateway");
}

#[tokio::test]
async fn logged_out_node_is_a_section_error() {
    let h = gateway().await;
    h.tailscale.clear_self_node().await;
    h.tailscale.set_backend_state("NeedsLogin").await;

    let report = h.assembler.compute_status(deadline(), caller()).await;
    assert_eq!(
        report.tailscale.unwrap_err(),
        "tailscale status has no self node"
    );
    assert!(report.wireguard.is_ok());
}

#[tokio::test(start_paused = true)]
async fn slow_driver_times_out_without_blocking_tailscale() {
    let h = gateway().await;
    h.wireguard.set_latency(Some(Duration::from_secs(30))).await;

    let deadline = Instant::now() + Duration::from_secs(2);
    let report = h.assembler.compute_status(deadline, caller()).await;

    assert!(report.tailscale.is_ok());
    assert_eq!(report.wireguard.unwrap_err(), "wireguard device timed out");
}

#[tokio::test(start_paused = true)]
async fn slow_tailscale_times_out_without_blocking_wireguard() {
    let h = gateway().await;
    h.tailscale.set_latency(Some(Duration::from_secs(30))).await;

    let deadline = Instant::now() + Duration::from_secs(2);
    let report = h.assembler.compute_status(deadline, caller()).await;

    assert_eq!(report.tailscale.unwrap_err(), "tailscale status timed out");
    assert!(report.wireguard.is_ok());
}

#[tokio::test]
async fn repeated_requests_differ_only_in_handshake_age() {
    let h = gateway().await;

    let first = h.assembler.compute_status(deadline(), caller()).await;
    let again = h.assembler.compute_status(deadline(), caller()).await;
    assert_eq!(first, again);

    h.clock.advance(TimeDelta::seconds(30));
    let later = h.assembler.compute_status(deadline(), caller()).await;
    assert_eq!(first.tailscale, later.tailscale);

    let (before, after) = (first.wireguard.unwrap(), later.wireguard.unwrap());
    assert_eq!(before.peers[0].last_handshake_ago.as_deref(), Some("5m32s"));
    assert_eq!(after.peers[0].last_handshake_ago.as_deref(), Some("6m2s"));

    let mut after_without_age = after.clone();
    for (peer, earlier) in after_without_age.peers.iter_mut().zip(&before.peers) {
        peer.last_handshake_ago.clone_from(&earlier.last_handshake_ago);
    }
    assert_eq!(before, after_without_age);
}
