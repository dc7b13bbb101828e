//! Action integration tests.

use nfvtest::Result;
use nfvtest::actions::{ActionSettings, ActionsService};
use nfvtest::types::PingRequest;

use crate::common::TestNamespace;

#[tokio::test]
async fn test_ping_between_namespaces() -> Result<()> {
    require_root!();

    let left = TestNamespace::new("pgl")?;
    let right = TestNamespace::new("pgr")?;
    left.connect_to(&right, "veth0", "veth1")?;
    left.ip(&["addr", "add", "10.50.0.1/24", "dev", "veth0"])?;
    left.ip(&["link", "set", "veth0", "up"])?;
    right.ip(&["addr", "add", "10.50.0.2/24", "dev", "veth1"])?;
    right.ip(&["link", "set", "veth1", "up"])?;

    let actions = ActionsService::new(&left.host(), ActionSettings::default());
    let req: PingRequest = serde_json::from_value(serde_json::json!({
        "destination": "10.50.0.2",
        "count": 2,
        "interval": 0.2,
        "timeout": 4
    }))?;
    let ping = actions.ping(&req).await?;
    assert_eq!(ping.packet_transmit, 2);
    assert_eq!(ping.packet_receive, 2);
    assert!(ping.rtt_avg.is_some());
    Ok(())
}
