//! Interface integration tests.
//!
//! Each test works in its own namespace through a namespaced host.

use ipnet::IpNet;
use nfvtest::Result;
use nfvtest::ip::InterfaceService;
use nfvtest::types::{AdminState, InterfaceCreate, InterfaceUpdate, LinkKind, NetnsRef, SafeName};

use crate::common::TestNamespace;

fn name(s: &str) -> SafeName {
    SafeName::new(s).unwrap()
}

fn net(s: &str) -> IpNet {
    s.parse().unwrap()
}

#[tokio::test]
async fn test_create_and_delete_dummy() -> Result<()> {
    require_root!();

    let ns = TestNamespace::new("lnk")?;
    let interfaces = InterfaceService::new(&ns.host());

    let mut req = InterfaceCreate::new(name("dummy0"), LinkKind::Dummy);
    req.mtu = Some(1400);
    let dummy = interfaces.create(&req).await?;
    assert_eq!(dummy.name(), "dummy0");
    assert_eq!(dummy.mtu, 1400);
    assert_eq!(dummy.kind(), Some(&LinkKind::Dummy));

    assert!(interfaces.create(&req).await.unwrap_err().is_conflict());

    interfaces.delete("dummy0").await?;
    assert!(interfaces.get_one("dummy0").await.unwrap_err().is_not_found());
    interfaces.delete("dummy0").await?;
    Ok(())
}

#[tokio::test]
async fn test_update_is_idempotent() -> Result<()> {
    require_root!();

    let ns = TestNamespace::new("upd")?;
    ns.add_dummy("dummy0")?;
    let interfaces = InterfaceService::new(&ns.host());

    let update = InterfaceUpdate {
        state: Some(AdminState::Up),
        mtu: Some(1300),
        addresses: Some(vec![net("10.10.0.1/24"), net("10.10.1.1/24")]),
        ..Default::default()
    };
    let dummy = interfaces.update("dummy0", &update).await?;
    assert!(dummy.is_admin_up());
    assert_eq!(dummy.mtu, 1300);
    let addresses = dummy.addresses();
    assert!(addresses.contains(&net("10.10.0.1/24")));
    assert!(addresses.contains(&net("10.10.1.1/24")));

    // The kernel may have added an IPv6 link-local address meanwhile
    let plan = interfaces.plan("dummy0", &update).await?;
    assert!(plan.addresses_to_add.is_empty());
    assert!(plan.addresses_to_remove.iter().all(|a| a.addr().is_ipv6()));

    let update = InterfaceUpdate {
        addresses: Some(vec![net("10.10.1.1/24")]),
        ..Default::default()
    };
    let dummy = interfaces.update("dummy0", &update).await?;
    assert_eq!(
        dummy
            .addresses()
            .into_iter()
            .filter(|a| a.addr().is_ipv4())
            .collect::<Vec<_>>(),
        vec![net("10.10.1.1/24")]
    );
    Ok(())
}

#[tokio::test]
async fn test_rename_keeps_link_up() -> Result<()> {
    require_root!();

    let ns = TestNamespace::new("ren")?;
    ns.add_dummy("dummy0")?;
    let interfaces = InterfaceService::new(&ns.host());
    interfaces.set_state("dummy0", AdminState::Up).await?;

    let update = InterfaceUpdate {
        name: Some(name("uplink0")),
        ..Default::default()
    };
    let renamed = interfaces.update("dummy0", &update).await?;
    assert_eq!(renamed.name(), "uplink0");
    assert!(renamed.is_admin_up());
    assert!(interfaces.get_one_or_default("dummy0").await?.is_none());
    Ok(())
}

#[tokio::test]
async fn test_move_to_namespace() -> Result<()> {
    require_root!();

    let from = TestNamespace::new("mvf")?;
    let to = TestNamespace::new("mvt")?;
    from.add_dummy("dummy0")?;
    let interfaces = InterfaceService::new(&from.host());

    let update = InterfaceUpdate {
        state: Some(AdminState::Up),
        addresses: Some(vec![net("10.20.0.1/24")]),
        netns: Some(NetnsRef::Name(name(to.name()))),
        ..Default::default()
    };
    let moved = interfaces.update("dummy0", &update).await?;
    assert!(moved.is_admin_up());
    assert!(interfaces.get_one_or_default("dummy0").await?.is_none());
    assert!(InterfaceService::new(&to.host()).get_one("dummy0").await.is_ok());

    let missing = InterfaceUpdate {
        netns: Some(NetnsRef::Name(name("nfv-missing-ns"))),
        ..Default::default()
    };
    let err = InterfaceService::new(&to.host())
        .update("dummy0", &missing)
        .await
        .unwrap_err();
    assert!(err.is_not_found());
    Ok(())
}

#[tokio::test]
async fn test_create_vlan() -> Result<()> {
    require_root!();

    let ns = TestNamespace::new("vln")?;
    ns.add_dummy("eth0")?;
    let interfaces = InterfaceService::new(&ns.host());

    let mut req = InterfaceCreate::new(name("eth0.100"), LinkKind::Vlan);
    req.parent_dev = Some(name("eth0"));
    let vlan = interfaces.create(&req).await?;
    assert_eq!(vlan.kind(), Some(&LinkKind::Vlan));

    let mut bad = InterfaceCreate::new(name("eth0.x"), LinkKind::Vlan);
    bad.parent_dev = Some(name("eth0"));
    assert!(interfaces.create(&bad).await.unwrap_err().is_invalid_input());
    Ok(())
}

#[tokio::test]
async fn test_create_bond() -> Result<()> {
    require_root!();

    let ns = TestNamespace::new("bnd")?;
    ns.add_dummy("dummy0")?;
    ns.add_dummy("dummy1")?;
    let interfaces = InterfaceService::new(&ns.host());

    let mut req = InterfaceCreate::new(name("bond0"), LinkKind::Bond);
    req.slave_interfaces = Some(vec![name("dummy0"), name("dummy1")]);
    let bond = interfaces.create(&req).await?;
    assert!(bond.is_admin_up());

    let member = interfaces.get_one("dummy0").await?;
    assert_eq!(member.master.as_ref().map(SafeName::as_str), Some("bond0"));
    Ok(())
}
