//! Application manager tests against the in-memory store.

use std::sync::Arc;

use appreg::permissions::{endpoints, grant_types, scopes};
use appreg::{
    AbsoluteUri, AppError, ApplicationDescriptor, ApplicationManager, ApplicationRecord,
    RegistryConfig, SecretConfig, Violation,
};
use appreg_memory::{Collation, InMemoryApplicationStore};
use tokio_util::sync::CancellationToken;

const COLLATIONS: [Collation; 2] = [Collation::Ordinal, Collation::CaseInsensitive];

fn setup(collation: Collation) -> (Arc<InMemoryApplicationStore>, ApplicationManager) {
    let store = Arc::new(InMemoryApplicationStore::with_collation(collation));
    let config = RegistryConfig {
        secrets: SecretConfig {
            memory_cost_kib: 8,
            iterations: 1,
            parallelism: 1,
            ..SecretConfig::default()
        },
    };
    let manager = ApplicationManager::with_config(store.clone(), &config).unwrap();
    (store, manager)
}

fn uri(value: &str) -> AbsoluteUri {
    AbsoluteUri::parse(value).unwrap()
}

#[tokio::test]
async fn type_predicates_are_exclusive() {
    let (_, manager) = setup(Collation::Ordinal);

    let mut record = ApplicationRecord::default();
    assert!(manager.is_public(&record).unwrap());

    for client_type in ["public", "confidential", "hybrid"] {
        record.client_type = Some(client_type.to_string());
        let public = manager.is_public(&record).unwrap();
        let confidential = manager.is_confidential(&record).unwrap();
        let hybrid = manager.is_hybrid(&record).unwrap();
        assert_eq!(public, !confidential && !hybrid, "type {client_type}");
    }
}

#[tokio::test]
async fn confidential_application_lifecycle() {
    for collation in COLLATIONS {
        let (store, manager) = setup(collation);
        let cancel = CancellationToken::new();

        let descriptor = ApplicationDescriptor::new("backend")
            .with_client_type(appreg::ClientType::Confidential)
            .with_permissions([endpoints::TOKEN, grant_types::CLIENT_CREDENTIALS]);
        let err = manager
            .create_from_descriptor(&descriptor, &cancel)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidState { .. }));
        assert!(store.is_empty());

        let record = manager
            .create_from_descriptor(&descriptor.with_secret("s3cr3t"), &cancel)
            .await
            .unwrap();

        let stored = store.snapshot();
        assert_eq!(stored.len(), 1);
        assert_ne!(stored[0].client_secret.as_deref(), Some("s3cr3t"));
        assert!(
            manager
                .validate_client_secret(&stored[0], "s3cr3t", &cancel)
                .await
                .unwrap()
        );
        assert!(
            !manager
                .validate_client_secret(&record, "S3CR3T", &cancel)
                .await
                .unwrap()
        );
    }
}

#[tokio::test]
async fn endpoint_permissions_open_until_listed() {
    let (_, manager) = setup(Collation::Ordinal);
    let cancel = CancellationToken::new();

    let open = manager
        .create_from_descriptor(&ApplicationDescriptor::new("open"), &cancel)
        .await
        .unwrap();
    assert!(manager.has_permission(&open, endpoints::TOKEN).unwrap());
    assert!(manager.has_permission(&open, grant_types::PASSWORD).unwrap());
    assert!(manager.has_permission(&open, scopes::PROFILE).unwrap());

    let restricted = manager
        .create_from_descriptor(
            &ApplicationDescriptor::new("restricted").with_permission(endpoints::AUTHORIZATION),
            &cancel,
        )
        .await
        .unwrap();
    assert!(!manager.has_permission(&restricted, endpoints::TOKEN).unwrap());
    assert!(manager.has_permission(&restricted, grant_types::IMPLICIT).unwrap());
    assert!(!manager.has_permission(&restricted, grant_types::AUTHORIZATION_CODE).unwrap());
    assert!(manager.has_permission(&restricted, scopes::EMAIL).unwrap());
}

#[tokio::test]
async fn update_without_changes_is_idempotent() {
    for collation in COLLATIONS {
        let (store, manager) = setup(collation);
        let cancel = CancellationToken::new();

        let record = manager
            .create_from_descriptor(
                &ApplicationDescriptor::new("backend").with_secret("s3cr3t"),
                &cancel,
            )
            .await
            .unwrap();

        manager.update(&record, &cancel).await.unwrap();
        manager.update(&record, &cancel).await.unwrap();

        let stored = store.snapshot();
        assert_eq!(stored, vec![record]);
    }
}

#[tokio::test]
async fn noop_transform_preserves_every_field() {
    for collation in COLLATIONS {
        let (store, manager) = setup(collation);
        let cancel = CancellationToken::new();

        let descriptor = ApplicationDescriptor::new("portal")
            .with_secret("s3cr3t")
            .with_client_type(appreg::ClientType::Hybrid)
            .with_consent_type(appreg::consent_types::SYSTEMATIC)
            .with_display_name("Portal")
            .with_permissions([endpoints::AUTHORIZATION, endpoints::TOKEN, endpoints::LOGOUT])
            .with_redirect_uri(uri("HTTPS://Portal.Example.com:443/cb?x=1"))
            .with_post_logout_redirect_uri(uri("https://portal.example.com/bye"));
        let mut record = manager
            .create_from_descriptor(&descriptor, &cancel)
            .await
            .unwrap();
        let before = record.clone();

        manager.update_with(&mut record, |_| {}, &cancel).await.unwrap();

        assert_eq!(record, before);
        assert_eq!(record.redirect_uris, vec!["HTTPS://Portal.Example.com:443/cb?x=1"]);
        assert_eq!(store.snapshot(), vec![before]);
    }
}

#[tokio::test]
async fn client_id_lookup_is_ordinal() {
    for collation in COLLATIONS {
        let (_, manager) = setup(collation);
        let cancel = CancellationToken::new();

        manager
            .create_from_descriptor(&ApplicationDescriptor::new("alice"), &cancel)
            .await
            .unwrap();

        assert!(manager.find_by_client_id("Alice", &cancel).await.unwrap().is_none());
        assert!(manager.find_by_client_id("alice", &cancel).await.unwrap().is_some());
    }
}

#[tokio::test]
async fn redirect_uri_lookup_is_ordinal() {
    for collation in COLLATIONS {
        let (_, manager) = setup(collation);
        let cancel = CancellationToken::new();

        for client_id in ["one", "two"] {
            manager
                .create_from_descriptor(
                    &ApplicationDescriptor::new(client_id)
                        .with_redirect_uri(uri("https://app.example.com/cb")),
                    &cancel,
                )
                .await
                .unwrap();
        }

        let found = manager
            .find_by_redirect_uri("https://app.example.com/cb", &cancel)
            .await
            .unwrap();
        let ids: Vec<_> = found.iter().filter_map(|r| r.client_id()).collect();
        assert_eq!(ids, ["one", "two"]);

        assert!(
            manager
                .find_by_redirect_uri("https://APP.example.com/cb", &cancel)
                .await
                .unwrap()
                .is_empty()
        );
    }
}

#[tokio::test]
async fn repeated_uri_returns_application_once() {
    let (_, manager) = setup(Collation::Ordinal);
    let cancel = CancellationToken::new();
    let cb = "https://app.example.com/cb";
    let bye = "https://app.example.com/bye";

    let mut record = ApplicationRecord {
        client_id: Some("repeat".to_string()),
        redirect_uris: vec![cb.to_string(), cb.to_string()],
        post_logout_redirect_uris: vec![bye.to_string(), bye.to_string()],
        ..Default::default()
    };
    manager.create(&mut record, None, &cancel).await.unwrap();

    let found = manager.find_by_redirect_uri(cb, &cancel).await.unwrap();
    assert_eq!(found, vec![record.clone()]);

    let found = manager
        .find_by_post_logout_redirect_uri(bye, &cancel)
        .await
        .unwrap();
    assert_eq!(found, vec![record]);
}

#[tokio::test]
async fn missing_authorization_endpoint_is_the_only_violation() {
    let (_, manager) = setup(Collation::Ordinal);
    let cancel = CancellationToken::new();

    let record = ApplicationRecord {
        client_id: Some("spa".to_string()),
        client_type: Some("public".to_string()),
        permissions: [grant_types::AUTHORIZATION_CODE, endpoints::TOKEN]
            .into_iter()
            .map(String::from)
            .collect(),
        ..Default::default()
    };

    let violations = manager.validate(&record, &cancel).await.unwrap();
    assert_eq!(violations.len(), 1);
    assert!(
        violations[0]
            .to_string()
            .contains("requires adding the authorization endpoint permission")
    );
}

#[tokio::test]
async fn fragment_redirect_uri_is_rejected() {
    let (store, manager) = setup(Collation::Ordinal);
    let cancel = CancellationToken::new();

    let descriptor = ApplicationDescriptor::new("spa")
        .with_redirect_uri(uri("https://spa.example.com/cb#section"));
    let err = manager
        .create_from_descriptor(&descriptor, &cancel)
        .await
        .unwrap_err();

    assert_eq!(
        err.violation(),
        Some(&Violation::RedirectUriFragment(
            "https://spa.example.com/cb#section".to_string()
        ))
    );
    assert!(store.is_empty());
}

#[tokio::test]
async fn duplicate_client_id_is_rejected() {
    for collation in COLLATIONS {
        let (store, manager) = setup(collation);
        let cancel = CancellationToken::new();

        manager
            .create_from_descriptor(&ApplicationDescriptor::new("portal"), &cancel)
            .await
            .unwrap();
        let err = manager
            .create_from_descriptor(&ApplicationDescriptor::new("portal"), &cancel)
            .await
            .unwrap_err();
        assert_eq!(err.violation(), Some(&Violation::DuplicateClientId));

        // Differs only by case: distinct under ordinal comparison.
        manager
            .create_from_descriptor(&ApplicationDescriptor::new("Portal"), &cancel)
            .await
            .unwrap();
        assert_eq!(store.len(), 2);

        let err = manager
            .create_from_descriptor(&ApplicationDescriptor::new("Portal"), &cancel)
            .await
            .unwrap_err();
        assert_eq!(err.violation(), Some(&Violation::DuplicateClientId));
        assert_eq!(store.len(), 2);
    }
}

#[tokio::test]
async fn exact_client_id_found_among_case_variants() {
    for collation in COLLATIONS {
        let (store, manager) = setup(collation);
        let cancel = CancellationToken::new();

        for client_id in ["Alice", "alice"] {
            manager
                .create_from_descriptor(&ApplicationDescriptor::new(client_id), &cancel)
                .await
                .unwrap();
        }

        let err = manager
            .create_from_descriptor(&ApplicationDescriptor::new("alice"), &cancel)
            .await
            .unwrap_err();
        assert_eq!(err.violation(), Some(&Violation::DuplicateClientId));
        assert_eq!(store.len(), 2);

        let found = manager.find_by_client_id("alice", &cancel).await.unwrap();
        assert_eq!(found.unwrap().client_id(), Some("alice"));
        assert!(manager.find_by_client_id("ALICE", &cancel).await.unwrap().is_none());
    }
}

#[tokio::test]
async fn logout_redirect_requires_logout_endpoint() {
    let (_, manager) = setup(Collation::CaseInsensitive);
    let cancel = CancellationToken::new();
    let bye = "https://spa.example.com/bye";

    let mut record = manager
        .create_from_descriptor(
            &ApplicationDescriptor::new("spa")
                .with_permission(endpoints::AUTHORIZATION)
                .with_post_logout_redirect_uri(uri(bye)),
            &cancel,
        )
        .await
        .unwrap();
    assert!(!manager.validate_post_logout_redirect_uri(bye, &cancel).await.unwrap());

    manager
        .update_with(
            &mut record,
            |d| {
                d.permissions.insert(endpoints::LOGOUT.to_string());
            },
            &cancel,
        )
        .await
        .unwrap();
    assert!(manager.validate_post_logout_redirect_uri(bye, &cancel).await.unwrap());
    assert!(
        !manager
            .validate_post_logout_redirect_uri("https://SPA.example.com/bye", &cancel)
            .await
            .unwrap()
    );
}

#[tokio::test]
async fn delete_and_count() {
    let (_, manager) = setup(Collation::Ordinal);
    let cancel = CancellationToken::new();

    let first = manager
        .create_from_descriptor(&ApplicationDescriptor::new("first"), &cancel)
        .await
        .unwrap();
    manager
        .create_from_descriptor(&ApplicationDescriptor::new("second"), &cancel)
        .await
        .unwrap();
    assert_eq!(manager.count(&cancel).await.unwrap(), 2);

    manager.delete(&first, &cancel).await.unwrap();
    assert_eq!(manager.count(&cancel).await.unwrap(), 1);
    assert!(
        manager
            .find_by_id(first.id().unwrap(), &cancel)
            .await
            .unwrap()
            .is_none()
    );

    let listed = manager.list(None, None, &cancel).await.unwrap();
    assert_eq!(listed[0].client_id(), Some("second"));
}
