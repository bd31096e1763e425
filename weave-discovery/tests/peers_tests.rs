use std::net::IpAddr;
use std::time::Duration;

use weave_discovery::{DiscoveryEvent, Peer, Peers};
use weave_types::ReplicaId;

fn sample_peer(replica_id: ReplicaId) -> Peer {
    Peer {
        replica_id,
        display_name: "alice".to_string(),
        address: IpAddr::from([192, 168, 1, 42]),
        service_port: 12345,
        protocol_version: "1.0".to_string(),
    }
}

#[tokio::test]
async fn upsert_of_a_new_peer_fires_a_discovered_event() {
    let peers = Peers::new();
    let mut events = peers.subscribe();
    let peer = sample_peer(ReplicaId::new());

    peers.upsert(peer.clone()).await;

    let event = events.recv().await.unwrap();
    match event {
        DiscoveryEvent::Discovered(p) => assert_eq!(p.replica_id, peer.replica_id),
        DiscoveryEvent::Lost(_) => panic!("expected Discovered"),
    }
    assert_eq!(peers.snapshot().await.len(), 1);
}

#[tokio::test]
async fn repeated_upsert_of_the_same_replica_does_not_refire_discovered() {
    let peers = Peers::new();
    let mut events = peers.subscribe();
    let peer = sample_peer(ReplicaId::new());

    peers.upsert(peer.clone()).await;
    peers.upsert(peer.clone()).await;
    peers.upsert(peer).await;

    // Exactly one Discovered event, no matter how many times last_seen refreshes.
    let first = events.recv().await.unwrap();
    assert!(matches!(first, DiscoveryEvent::Discovered(_)));
    assert!(tokio::time::timeout(Duration::from_millis(50), events.recv()).await.is_err());
}

#[tokio::test]
async fn reap_expired_removes_stale_peers_and_fires_lost() {
    let peers = Peers::new();
    let mut events = peers.subscribe();
    let peer = sample_peer(ReplicaId::new());
    peers.upsert(peer.clone()).await;
    let _ = events.recv().await.unwrap(); // drain Discovered

    tokio::time::sleep(Duration::from_millis(20)).await;
    let lost = peers.reap_expired(Duration::from_millis(5)).await;

    assert_eq!(lost.len(), 1);
    assert_eq!(lost[0].replica_id, peer.replica_id);
    assert!(peers.snapshot().await.is_empty());
    let event = events.recv().await.unwrap();
    assert!(matches!(event, DiscoveryEvent::Lost(_)));
}

#[tokio::test]
async fn reap_expired_keeps_fresh_peers() {
    let peers = Peers::new();
    peers.upsert(sample_peer(ReplicaId::new())).await;

    let lost = peers.reap_expired(Duration::from_secs(30)).await;

    assert!(lost.is_empty());
    assert_eq!(peers.snapshot().await.len(), 1);
}

#[tokio::test]
async fn stats_reports_compatible_and_incompatible_peers() {
    let peers = Peers::new();
    let mut compatible = sample_peer(ReplicaId::new());
    compatible.protocol_version = "1.0".to_string();
    let mut incompatible = sample_peer(ReplicaId::new());
    incompatible.protocol_version = "0.9".to_string();

    peers.upsert(compatible).await;
    peers.upsert(incompatible).await;

    let stats = peers.stats().await;
    assert_eq!(stats.total_peers, 2);
    assert_eq!(stats.compatible_peers, 1);
}
