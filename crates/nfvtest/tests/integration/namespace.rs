//! Namespace integration tests.

use nfvtest::ip::NamespaceService;
use nfvtest::types::{NamespaceCreate, SafeName};
use nfvtest::{Host, Result};

use crate::common::{TestNamespace, unique_ns_name};

#[tokio::test]
async fn test_namespace_lifecycle() -> Result<()> {
    require_root!();

    let service = NamespaceService::new(&Host::system());
    let name = SafeName::new(unique_ns_name("ns"))?;
    let req = NamespaceCreate {
        name: name.clone(),
        ns_id: None,
    };

    let created = service.create(&req).await?;
    assert_eq!(created.name.as_ref(), Some(&name));
    assert!(created.ns_id >= 0);

    let err = service.create(&req).await.unwrap_err();
    assert!(err.is_conflict());

    let taken = NamespaceCreate {
        name: SafeName::new(unique_ns_name("ns"))?,
        ns_id: Some(created.ns_id as u32),
    };
    assert!(service.create(&taken).await.unwrap_err().is_conflict());

    service.delete(name.as_str()).await?;
    assert!(service.get_one(name.as_str()).await.unwrap_err().is_not_found());

    // Deleting again is not an error
    service.delete(name.as_str()).await?;
    Ok(())
}

#[tokio::test]
async fn test_resolve_by_id() -> Result<()> {
    require_root!();

    let ns = TestNamespace::new("ns")?;
    let service = NamespaceService::new(&Host::system());
    let found = service.get_one(ns.name()).await?;

    let target = nfvtest::types::NetnsRef::Id(found.ns_id);
    assert_eq!(service.resolve(&target).await?, ns.name());

    let status = service.status().await?;
    assert!(status.stdout.contains(ns.name()));
    Ok(())
}
