//! A node bootstraps its identity, serves, and another node dials it.

use std::sync::Arc;
use std::time::Duration;

use fly_core::{CredentialStore, Fingerprint, FlyError, StaticCredentials, MIN_KEY_BITS};
use fly_node::{server, KnownHosts, NodeClient, NodeConfig, RunningServer, TrustPolicy};

async fn start_node(dir: &std::path::Path) -> RunningServer {
    let config = NodeConfig {
        listen: "127.0.0.1:0".parse().unwrap(),
        ..NodeConfig::default()
    };
    let store = CredentialStore::new(dir).with_key_bits(MIN_KEY_BITS);
    server::start(&config, Arc::new(store)).await.unwrap()
}

fn client(server: &RunningServer, policy: TrustPolicy) -> NodeClient {
    NodeClient::builder(policy)
        .port(server.local_addr().port())
        .timeout(Duration::from_secs(10))
        .build()
}

#[tokio::test]
async fn test_fresh_node_serves_greeting() {
    let dir = tempfile::tempdir().unwrap();
    let server = start_node(dir.path()).await;

    // Exactly the certificate and the key, nothing else.
    let mut names: Vec<_> = std::fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().into_string().unwrap())
        .collect();
    names.sort();
    assert_eq!(names, ["cert.pem", "key.pem"]);

    let response = client(&server, TrustPolicy::Insecure)
        .get("127.0.0.1", "/abc")
        .await
        .unwrap();
    assert_eq!(response.status, 200);
    assert_eq!(response.body, "Hi from abc");
    assert_eq!(response.peer_fingerprint, Some(server.fingerprint()));

    let root = client(&server, TrustPolicy::Insecure)
        .dial("127.0.0.1")
        .await
        .unwrap();
    assert_eq!(root.body, "Hi from ");

    server.shutdown();
    server.wait().await.unwrap();
}

#[tokio::test]
async fn test_pinned_fingerprint() {
    let dir = tempfile::tempdir().unwrap();
    let server = start_node(dir.path()).await;
    let expected = Fingerprint::of_pem_file(&dir.path().join("cert.pem")).unwrap();

    let response = client(&server, TrustPolicy::Pinned(expected))
        .get("127.0.0.1", "/pinned")
        .await
        .unwrap();
    assert_eq!(response.body, "Hi from pinned");

    let wrong = Fingerprint::of_der(b"some other node");
    let err = client(&server, TrustPolicy::Pinned(wrong))
        .dial("127.0.0.1")
        .await
        .unwrap_err();
    match err {
        FlyError::UntrustedPeer { host, expected } => {
            assert_eq!(host, "127.0.0.1");
            assert_eq!(expected, wrong.to_string());
        }
        other => panic!("expected UntrustedPeer, got {other:?}"),
    }

    server.shutdown();
    server.wait().await.unwrap();
}

#[tokio::test]
async fn test_trust_on_first_use_then_pin() {
    let dir = tempfile::tempdir().unwrap();
    let server = start_node(dir.path()).await;
    let mut known = KnownHosts::default();

    let first = client(&server, known.policy_for("127.0.0.1"))
        .dial("127.0.0.1")
        .await
        .unwrap();
    known.insert("127.0.0.1", first.peer_fingerprint.unwrap());

    assert_eq!(
        known.policy_for("127.0.0.1"),
        TrustPolicy::Pinned(server.fingerprint())
    );
    let second = client(&server, known.policy_for("127.0.0.1"))
        .dial("127.0.0.1")
        .await
        .unwrap();
    assert_eq!(second.status, 200);

    server.shutdown();
    server.wait().await.unwrap();
}

#[tokio::test]
async fn test_restart_reuses_identity() {
    let dir = tempfile::tempdir().unwrap();

    let first = start_node(dir.path()).await;
    let fingerprint = first.fingerprint();
    first.shutdown();
    first.wait().await.unwrap();

    let second = start_node(dir.path()).await;
    assert_eq!(second.fingerprint(), fingerprint);
    second.shutdown();
    second.wait().await.unwrap();
}

#[tokio::test]
async fn test_encoded_path_is_decoded() {
    let dir = tempfile::tempdir().unwrap();
    let server = start_node(dir.path()).await;

    let response = client(&server, TrustPolicy::Insecure)
        .get("127.0.0.1", "/a%20b")
        .await
        .unwrap();
    assert_eq!(response.status, 200);
    assert_eq!(response.body, "Hi from a b");

    server.shutdown();
    server.wait().await.unwrap();
}

#[tokio::test]
async fn test_serves_pre_made_credentials() {
    let dir = tempfile::tempdir().unwrap();
    let paths = CredentialStore::new(dir.path())
        .with_key_bits(MIN_KEY_BITS)
        .ensure()
        .unwrap();
    let expected = Fingerprint::of_pem_file(&paths.certificate).unwrap();

    let config = NodeConfig {
        listen: "127.0.0.1:0".parse().unwrap(),
        ..NodeConfig::default()
    };
    let server = server::start(&config, Arc::new(StaticCredentials(paths)))
        .await
        .unwrap();
    assert_eq!(server.fingerprint(), expected);

    let response = client(&server, TrustPolicy::Pinned(expected))
        .get("127.0.0.1", "/static")
        .await
        .unwrap();
    assert_eq!(response.body, "Hi from static");

    server.shutdown();
    server.wait().await.unwrap();
}
