//! Route integration tests.

use nfvtest::Result;
use nfvtest::ip::RouteService;
use nfvtest::types::{RouteCreate, RouteDst, RouteUpdate, SafeName};

use crate::common::TestNamespace;

#[tokio::test]
async fn test_route_lifecycle() -> Result<()> {
    require_root!();

    let ns = TestNamespace::new("rt")?;
    ns.add_dummy("dummy0")?;
    ns.ip(&["link", "set", "dummy0", "up"])?;
    ns.ip(&["addr", "add", "10.30.0.1/24", "dev", "dummy0"])?;
    let routes = RouteService::new(&ns.host());

    let dst = RouteDst::from_parts("10.40.0.0", Some(16))?;
    assert!(routes.get_one(&dst).await.unwrap_err().is_not_found());

    let req = RouteCreate {
        dst: dst.clone(),
        gateway: Some("10.30.0.254".parse().unwrap()),
        dev: SafeName::new("dummy0")?,
    };
    let route = routes.create(&req).await?;
    assert_eq!(route.dst, dst);
    assert_eq!(route.gateway, req.gateway);
    assert!(routes.create(&req).await.unwrap_err().is_conflict());

    let update = RouteUpdate {
        gateway: Some("10.30.0.253".parse().unwrap()),
        dev: SafeName::new("dummy0")?,
    };
    let route = routes.update(&dst, &update).await?;
    assert_eq!(route.gateway, update.gateway);

    routes.delete(&dst).await?;
    assert!(routes.get_one_or_default(&dst).await?.is_none());
    routes.delete(&dst).await?;
    Ok(())
}
