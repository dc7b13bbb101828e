//! Router tests against a scripted host.
//!
//! Every request goes through the full axum router; the `ip` and tool
//! invocations it causes are answered by `ScriptedRunner`, so these tests
//! need neither root nor the real tools.

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use nfvtest::api::{AppState, router};
use nfvtest::config::RanConfig;
use nfvtest::lab::ScriptedRunner;
use nfvtest::{Config, Host};
use serde_json::{Value, json};
use tempfile::TempDir;
use tower::ServiceExt;

const NETNS_LIST: [&str; 5] = ["ip", "-j", "-details", "netns", "list-id"];

const VETH0: &str = r#"[{
    "ifindex": 7,
    "ifname": "veth0",
    "flags": ["BROADCAST", "MULTICAST", "UP", "LOWER_UP"],
    "mtu": 1500,
    "operstate": "UP",
    "link_type": "ether",
    "address": "6a:1f:7e:28:51:c2",
    "linkinfo": {"info_kind": "veth"},
    "addr_info": [
        {"family": "inet", "local": "192.168.10.2", "prefixlen": 24, "scope": "global"}
    ]
}]"#;

fn app(runner: &Arc<ScriptedRunner>) -> Router {
    app_with(runner, Config::default())
}

fn app_with(runner: &Arc<ScriptedRunner>, config: Config) -> Router {
    let host = Host::new(runner.clone());
    router(AppState::new(host, &config))
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string())),
        None => builder.body(Body::empty()),
    }
    .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

mod namespaces {
    use super::*;

    #[tokio::test]
    async fn test_list() {
        let runner = Arc::new(ScriptedRunner::new());
        runner.on_stdout(&NETNS_LIST, r#"[{"nsid": 0, "name": "blue"}, {"nsid": 1}]"#);

        let (status, body) = send(&app(&runner), "GET", "/api/v2/namespaces", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!([{"name": "blue", "ns_id": 0}, {"name": null, "ns_id": 1}])
        );
    }

    #[tokio::test]
    async fn test_create() {
        let runner = Arc::new(ScriptedRunner::new());
        runner
            .on_stdout(&NETNS_LIST, "")
            .on_stdout(&NETNS_LIST, r#"[{"nsid": 4, "name": "blue"}]"#);

        let (status, body) = send(
            &app(&runner),
            "POST",
            "/api/v2/namespaces",
            Some(json!({"name": "blue"})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body, json!({"name": "blue", "ns_id": 4}));
        assert_eq!(
            runner.mutations(),
            vec!["ip netns add blue", "ip netns set blue auto"]
        );
    }

    #[tokio::test]
    async fn test_create_conflict() {
        let runner = Arc::new(ScriptedRunner::new());
        runner.on_stdout(&NETNS_LIST, r#"[{"nsid": 0, "name": "blue"}]"#);
        let app = app(&runner);

        let (status, body) = send(&app, "POST", "/api/v2/namespaces", Some(json!({"name": "blue"}))).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert!(body["message"].as_str().unwrap().contains("blue"));

        let (status, _) = send(
            &app,
            "POST",
            "/api/v2/namespaces",
            Some(json!({"name": "red", "ns_id": 0})),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert!(runner.mutations().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_body() {
        let runner = Arc::new(ScriptedRunner::new());
        let app = app(&runner);

        let (status, body) = send(
            &app,
            "POST",
            "/api/v2/namespaces",
            Some(json!({"name": "not a valid name"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["message"].is_string());
        assert!(runner.calls().is_empty());
    }

    #[tokio::test]
    async fn test_get_missing_and_update() {
        let runner = Arc::new(ScriptedRunner::new());
        runner.on_stdout(&NETNS_LIST, "[]");
        let app = app(&runner);

        let (status, _) = send(&app, "GET", "/api/v2/namespaces/blue", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = send(&app, "PATCH", "/api/v2/namespaces/blue", None).await;
        assert_eq!(status, StatusCode::NOT_IMPLEMENTED);
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let runner = Arc::new(ScriptedRunner::new());
        runner.on_stdout(&NETNS_LIST, "[]");

        let (status, _) = send(&app(&runner), "DELETE", "/api/v2/namespaces/blue", None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(runner.mutations().is_empty());
    }
}

mod interfaces {
    use super::*;

    const SHOW_VETH0: [&str; 6] = ["ip", "-j", "-details", "addr", "show", "veth0"];

    #[tokio::test]
    async fn test_get_one() {
        let runner = Arc::new(ScriptedRunner::new());
        runner.on_stdout(&SHOW_VETH0, VETH0);

        let (status, body) = send(&app(&runner), "GET", "/api/v2/interfaces/veth0", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["if_name"], "veth0");
        assert_eq!(body["mtu"], 1500);
    }

    #[tokio::test]
    async fn test_get_missing() {
        let runner = Arc::new(ScriptedRunner::new());
        runner.on_stderr(
            &["ip", "-j", "-details", "addr", "show", "veth9"],
            "Device \"veth9\" does not exist.\n",
        );

        let (status, _) = send(&app(&runner), "GET", "/api/v2/interfaces/veth9", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_invalid_path_name() {
        let runner = Arc::new(ScriptedRunner::new());
        let (status, _) = send(
            &app(&runner),
            "GET",
            "/api/v2/interfaces/a234567890123456789",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(runner.calls().is_empty());
    }

    #[tokio::test]
    async fn test_update_converges_addresses() {
        let runner = Arc::new(ScriptedRunner::new());
        runner.on_stdout(&SHOW_VETH0, VETH0);
        let app = app(&runner);

        let update = json!({"mtu": 1400, "addresses": ["192.168.20.2/24"]});
        let (status, _) = send(&app, "PATCH", "/api/v2/interfaces/veth0", Some(update)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            runner.mutations(),
            vec![
                "ip link set dev veth0 mtu 1400",
                "ip address del 192.168.10.2/24 dev veth0",
                "ip address add 192.168.20.2/24 dev veth0",
            ]
        );

        runner.clear_calls();
        let update = json!({"addresses": ["192.168.10.2/24"]});
        let (status, _) = send(&app, "PATCH", "/api/v2/interfaces/veth0", Some(update)).await;
        assert_eq!(status, StatusCode::OK);
        assert!(runner.mutations().is_empty());
    }

    #[tokio::test]
    async fn test_update_stops_at_first_failure() {
        let runner = Arc::new(ScriptedRunner::new());
        runner
            .on_stdout(&SHOW_VETH0, VETH0)
            .on_stderr(
                &["ip", "link", "set", "dev", "veth0", "mtu", "20"],
                "Error: mtu less than device minimum.",
            );

        let update = json!({"mtu": 20, "addresses": []});
        let (status, body) =
            send(&app(&runner), "PATCH", "/api/v2/interfaces/veth0", Some(update)).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(
            body["message"]
                .as_str()
                .unwrap()
                .contains("mtu less than device minimum")
        );
        assert_eq!(runner.mutations(), vec!["ip link set dev veth0 mtu 20"]);
    }

    #[tokio::test]
    async fn test_move_into_current_namespace_is_a_no_op() {
        let runner = Arc::new(ScriptedRunner::new());
        runner
            .on_stdout(&NETNS_LIST, r#"[{"nsid": 0, "name": "blue"}]"#)
            .on_stdout(
                &["ip", "netns", "exec", "blue", "ip", "-j", "-details", "addr", "show", "veth0"],
                VETH0,
            );
        let app = app(&runner);

        let update = json!({"netns": "blue", "addresses": ["192.168.10.2/24"]});
        for _ in 0..2 {
            let (status, body) = send(
                &app,
                "PATCH",
                "/api/v2/interfaces/ns/blue/veth0",
                Some(update.clone()),
            )
            .await;
            assert_eq!(status, StatusCode::OK, "{}", body);
            assert_eq!(body["if_name"], "veth0");
        }
        assert!(runner.mutations().is_empty());
    }

    #[tokio::test]
    async fn test_rename_and_move_by_id() {
        let runner = Arc::new(ScriptedRunner::new());
        let show_in_blue = [
            "ip", "netns", "exec", "blue", "ip", "-j", "-details", "addr", "show", "veth1",
        ];
        runner
            .on_stdout(&SHOW_VETH0, VETH0)
            .on_stdout(&NETNS_LIST, r#"[{"nsid": 0, "name": "red"}, {"nsid": 4, "name": "blue"}]"#)
            .on_stdout(&show_in_blue, "")
            .on_stdout(&show_in_blue, &VETH0.replace("veth0", "veth1"));

        let update = json!({"name": "veth1", "netns": 4});
        let (status, body) =
            send(&app(&runner), "PATCH", "/api/v2/interfaces/veth0", Some(update)).await;
        assert_eq!(status, StatusCode::OK, "{}", body);
        assert_eq!(body["if_name"], "veth1");
        assert_eq!(
            runner.mutations(),
            vec![
                "ip link set dev veth0 down",
                "ip link set dev veth0 name veth1",
                "ip link set dev veth1 netns blue",
                "ip netns exec blue ip link set dev veth1 up",
            ]
        );
    }

    #[tokio::test]
    async fn test_rename_to_taken_name() {
        let runner = Arc::new(ScriptedRunner::new());
        runner
            .on_stdout(&SHOW_VETH0, VETH0)
            .on_stdout(
                &["ip", "-j", "-details", "addr", "show", "veth1"],
                &VETH0.replace("veth0", "veth1"),
            );

        let update = json!({"name": "veth1", "mtu": 1400});
        let (status, body) =
            send(&app(&runner), "PATCH", "/api/v2/interfaces/veth0", Some(update)).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert!(body["message"].as_str().unwrap().contains("veth1"));
        assert!(runner.mutations().is_empty());
    }

    #[tokio::test]
    async fn test_move_to_unknown_namespace() {
        let runner = Arc::new(ScriptedRunner::new());
        runner
            .on_stdout(&SHOW_VETH0, VETH0)
            .on_stdout(&NETNS_LIST, r#"[{"nsid": 0, "name": "blue"}]"#);
        let app = app(&runner);

        for target in [json!("red"), json!(7)] {
            let update = json!({"netns": target, "mtu": 1400});
            let (status, _) = send(&app, "PATCH", "/api/v2/interfaces/veth0", Some(update)).await;
            assert_eq!(status, StatusCode::NOT_FOUND);
        }
        assert!(runner.mutations().is_empty());
    }

    #[tokio::test]
    async fn test_create_bond_keeps_name_out_of_the_shell() {
        let runner = Arc::new(ScriptedRunner::new());
        let show_bond = ["ip", "-j", "-details", "addr", "show", "b$x"];
        runner
            .on_stdout(&["ip", "-j", "-details", "addr", "show", "eth1"], VETH0)
            .on_stdout(&show_bond, "")
            .on_stdout(
                &show_bond,
                r#"[{"ifindex": 11, "ifname": "b$x", "flags": ["BROADCAST", "MASTER", "UP"],
                     "mtu": 1500, "operstate": "UP", "linkinfo": {"info_kind": "bond"}}]"#,
            );

        let body = json!({"name": "b$x", "type": "bond", "slave_interfaces": ["eth1"]});
        let (status, body) = send(&app(&runner), "POST", "/api/v2/interfaces", Some(body)).await;
        assert_eq!(status, StatusCode::CREATED, "{}", body);
        assert_eq!(body["if_name"], "b$x");

        let mode: Vec<String> = [
            "sh",
            "-c",
            "echo 4 > /sys/class/net/\"$1\"/bonding/mode",
            "sh",
            "b$x",
        ]
        .map(String::from)
        .to_vec();
        assert!(runner.calls().contains(&mode));
        assert_eq!(
            runner.mutations().last().map(String::as_str),
            Some("ip link set dev b$x up")
        );
    }

    #[tokio::test]
    async fn test_namespace_must_exist() {
        let runner = Arc::new(ScriptedRunner::new());
        runner.on_stdout(&NETNS_LIST, r#"[{"nsid": 0, "name": "blue"}]"#);
        let app = app(&runner);

        let (status, _) = send(&app, "GET", "/api/v2/interfaces/ns/red", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, body) = send(&app, "GET", "/api/v2/interfaces/ns/blue", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!([]));
        assert!(
            runner
                .commands()
                .contains(&"ip netns exec blue ip -j -details addr".to_string())
        );
    }

    #[tokio::test]
    async fn test_create_vlan() {
        let runner = Arc::new(ScriptedRunner::new());
        let show = ["ip", "-j", "-details", "addr", "show", "eth0.100"];
        runner
            .on_stdout(&["ip", "-j", "-details", "addr", "show", "eth0"], VETH0)
            .on_stdout(&show, "")
            .on_stdout(
                &show,
                r#"[{"ifindex": 9, "ifname": "eth0.100", "flags": ["BROADCAST", "MULTICAST"],
                     "mtu": 1500, "operstate": "DOWN", "linkinfo": {"info_kind": "vlan"}}]"#,
            );

        let body = json!({"name": "eth0.100", "parent_dev": "eth0", "type": "vlan"});
        let (status, body) = send(&app(&runner), "POST", "/api/v2/interfaces", Some(body)).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["if_name"], "eth0.100");
        assert_eq!(
            runner.mutations(),
            vec!["ip link add name eth0.100 link eth0 type vlan id 100"]
        );
    }

    #[tokio::test]
    async fn test_create_vlan_checks_name() {
        let runner = Arc::new(ScriptedRunner::new());
        runner.on_stdout(&["ip", "-j", "-details", "addr", "show", "eth0"], VETH0);

        let body = json!({"name": "eth1.100", "parent_dev": "eth0", "type": "vlan"});
        let (status, _) = send(&app(&runner), "POST", "/api/v2/interfaces", Some(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(runner.mutations().is_empty());
    }
}

mod routes {
    use super::*;

    #[tokio::test]
    async fn test_get_default_route() {
        let runner = Arc::new(ScriptedRunner::new());
        runner.on_stdout(
            &["ip", "-j", "-details", "route", "show", "default"],
            r#"[{"type": "unicast", "dst": "default", "gateway": "10.0.0.1", "dev": "eth0", "protocol": "boot", "scope": "global", "flags": []}]"#,
        );

        let (status, body) = send(&app(&runner), "GET", "/api/v2/routes/default", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["dst"], "default");
    }

    #[tokio::test]
    async fn test_prefix_rules() {
        let runner = Arc::new(ScriptedRunner::new());
        let app = app(&runner);

        let (status, _) = send(&app, "GET", "/api/v2/routes/10.0.0.0", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let (status, _) = send(&app, "GET", "/api/v2/routes/default/0", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let (status, _) = send(&app, "GET", "/api/v2/routes/10.0.0.0/abc", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(runner.calls().is_empty());
    }

    #[tokio::test]
    async fn test_missing_route() {
        let runner = Arc::new(ScriptedRunner::new());
        let (status, _) = send(&app(&runner), "GET", "/api/v2/routes/10.1.0.0/16", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(
            runner.commands(),
            vec!["ip -j -details route show 10.1.0.0/16"]
        );
    }

    #[tokio::test]
    async fn test_delete_missing_route() {
        let runner = Arc::new(ScriptedRunner::new());
        let (status, _) = send(&app(&runner), "DELETE", "/api/v2/routes/10.1.0.0/16", None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(runner.mutations().is_empty());
    }
}

mod actions {
    use super::*;

    const PING_OUTPUT: &str = "\
PING 10.0.0.2 (10.0.0.2) 56(84) bytes of data.
64 bytes from 10.0.0.2: icmp_seq=1 ttl=64 time=0.051 ms
64 bytes from 10.0.0.2: icmp_seq=2 ttl=64 time=0.062 ms

--- 10.0.0.2 ping statistics ---
2 packets transmitted, 2 received, 0% packet loss, time 1001ms
rtt min/avg/max/mdev = 0.051/0.056/0.062/0.005 ms
";

    #[tokio::test]
    async fn test_ping() {
        let runner = Arc::new(ScriptedRunner::new());
        runner.on_stdout(
            &["ping", "-c", "2", "-w", "8", "-i", "0.5", "10.0.0.2"],
            PING_OUTPUT,
        );

        let (status, body) = send(
            &app(&runner),
            "POST",
            "/api/v2/actions/ping",
            Some(json!({"destination": "10.0.0.2", "count": 2})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["packet_transmit"], 2);
        assert_eq!(body["packet_receive"], 2);
        assert_eq!(body["packet_loss_count"], 0);
    }

    #[tokio::test]
    async fn test_ping_in_namespace() {
        let runner = Arc::new(ScriptedRunner::new());
        runner
            .on_stdout(&NETNS_LIST, r#"[{"nsid": 0, "name": "blue"}]"#)
            .on_stdout(
                &[
                    "ip", "netns", "exec", "blue", "ping", "-c", "2", "-w", "8", "-i", "0.5",
                    "10.0.0.2",
                ],
                PING_OUTPUT,
            );

        let (status, body) = send(
            &app(&runner),
            "POST",
            "/api/v2/actions/ns/blue/ping",
            Some(json!({"destination": "10.0.0.2", "count": 2})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["destination"], "10.0.0.2");
    }

    #[tokio::test]
    async fn test_ping_rejects_bad_destination() {
        let runner = Arc::new(ScriptedRunner::new());
        let (status, _) = send(
            &app(&runner),
            "POST",
            "/api/v2/actions/ping",
            Some(json!({"destination": "-f 10.0.0.2"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(runner.calls().is_empty());
    }

    #[tokio::test]
    async fn test_bandwidth_needs_a_server() {
        let runner = Arc::new(ScriptedRunner::new());
        let (status, _) = send(&app(&runner), "POST", "/api/v2/actions/bandwidth", Some(json!({}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_bandwidth_uses_configured_server() {
        let runner = Arc::new(ScriptedRunner::new());
        runner.on_stdout(
            &["iperf3", "-c", "10.0.0.9", "-t", "5", "-J"],
            r#"{"end": {"sum_received": {"bits_per_second": 941000000.0}}}"#,
        );
        let config = Config {
            iperf3_server: Some("10.0.0.9".into()),
            ..Config::default()
        };

        let (status, body) = send(
            &app_with(&runner, config),
            "POST",
            "/api/v2/actions/bandwidth",
            Some(json!({})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["server"], "10.0.0.9");
        assert_eq!(body["bandwidth_bits_per_sec"], 941000000.0);
    }
}

mod status {
    use super::*;

    #[tokio::test]
    async fn test_cross_origin_requests_are_allowed() {
        let runner = Arc::new(ScriptedRunner::new());
        let app = app(&runner);

        let request = Request::builder()
            .method("GET")
            .uri("/api/v2/status/routes")
            .header("origin", "http://dashboard.example")
            .body(Body::empty())
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["access-control-allow-origin"], "*");

        let preflight = Request::builder()
            .method("OPTIONS")
            .uri("/api/v2/interfaces/veth0")
            .header("origin", "http://dashboard.example")
            .header("access-control-request-method", "PATCH")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(preflight).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(runner.mutations().is_empty());
    }

    #[tokio::test]
    async fn test_raw_status() {
        let runner = Arc::new(ScriptedRunner::new());
        runner.on_stdout(&["ip", "-details", "route"], "default via 10.0.0.1 dev eth0\n");
        let app = app(&runner);

        let (status, body) = send(&app, "GET", "/api/v2/status/routes", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["command"], json!(["ip", "-details", "route"]));
        assert_eq!(body["stdout"], "default via 10.0.0.1 dev eth0\n");

        let (status, _) = send(&app, "GET", "/api/v2/status/bridges", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}

mod ran {
    use super::*;

    fn gnodeb() -> Value {
        json!({
            "mcc": "208",
            "mnc": "93",
            "nci": "0x000000010",
            "idLength": 32,
            "tac": 1,
            "linkIp": "127.0.0.1",
            "ngapIp": "127.0.0.1",
            "gtpIp": "127.0.0.1",
            "amfConfigs": [{"address": "127.0.0.5", "port": 38412}],
            "slices": [{"sst": 1}],
            "ignoreStreamIds": true
        })
    }

    fn config(dir: &TempDir) -> Config {
        Config {
            ran: RanConfig {
                gnb_config_folder: dir.path().join("etc"),
                gnb_log_folder: dir.path().join("log"),
                ..RanConfig::default()
            },
            ..Config::default()
        }
    }

    #[tokio::test]
    async fn test_gnodeb_configs() {
        let dir = TempDir::new().unwrap();
        let runner = Arc::new(ScriptedRunner::new());
        let app = app_with(&runner, config(&dir));

        let (status, body) = send(&app, "GET", "/api/v2/gnodeb", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!([]));

        let (status, body) = send(&app, "POST", "/api/v2/gnodeb", Some(gnodeb())).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["nci"], "0x000000010");

        let (status, _) = send(&app, "POST", "/api/v2/gnodeb", Some(gnodeb())).await;
        assert_eq!(status, StatusCode::CONFLICT);

        let mut changed = gnodeb();
        changed["tac"] = json!(7);
        let (status, body) = send(&app, "PUT", "/api/v2/gnodeb/0x000000010", Some(changed)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["tac"], 7);

        let (status, body) = send(&app, "GET", "/api/v2/gnodeb", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 1);

        let (status, _) = send(&app, "POST", "/api/v2/gnodeb/0x000000010/stop", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _) = send(&app, "GET", "/api/v2/gnodeb/0x000000010/status", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = send(&app, "DELETE", "/api/v2/gnodeb/0x000000010", None).await;
        assert_eq!(status, StatusCode::OK);
        let (status, _) = send(&app, "GET", "/api/v2/gnodeb/0x000000010", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_invalid_identifiers() {
        let dir = TempDir::new().unwrap();
        let runner = Arc::new(ScriptedRunner::new());
        let app = app_with(&runner, config(&dir));

        for uri in [
            "/api/v2/gnodeb/10",
            "/api/v2/ue/imsi-123",
            "/api/v2/enodeb/0xZZ",
            "/api/v2/ue-4g/12345",
        ] {
            let (status, body) = send(&app, "GET", uri, None).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{}", uri);
            assert!(body["message"].is_string());
        }
    }

    #[tokio::test]
    async fn test_put_mismatch() {
        let dir = TempDir::new().unwrap();
        let runner = Arc::new(ScriptedRunner::new());
        let app = app_with(&runner, config(&dir));

        let (status, _) = send(&app, "PUT", "/api/v2/gnodeb/0x000000020", Some(gnodeb())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
