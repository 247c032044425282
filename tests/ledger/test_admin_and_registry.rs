// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use super::support::*;
use ethers::types::U256;
use fabstir_escrow::registry::{
    FineTuningService, InferenceService, Quota, VerifiabilityMode,
};
use fabstir_escrow::{EscrowError, EscrowEvent, ServiceKind};

fn inference_service(url: &str) -> InferenceService {
    InferenceService {
        service_type: "chatbot".to_string(),
        url: url.to_string(),
        model: "llama-3-8b-instruct".to_string(),
        input_price: U256::from(1),
        output_price: U256::from(2),
        verifiability: VerifiabilityMode::ZkML,
        additional_info: String::new(),
    }
}

#[tokio::test]
async fn test_only_owner_updates_parameters() {
    let (service, _clock) = create_service();

    assert!(matches!(
        service.update_lock_time(addr(1), 5).await,
        Err(EscrowError::Unauthorized(_))
    ));
    assert!(matches!(
        service.update_penalty_percentage(addr(1), 50).await,
        Err(EscrowError::Unauthorized(_))
    ));

    service.update_lock_time(owner(), 5).await.unwrap();
    service.update_penalty_percentage(owner(), 50).await.unwrap();
    assert_eq!(
        service.update_penalty_percentage(owner(), 101).await,
        Err(EscrowError::InvalidPenaltyPercentage(101))
    );

    let params = service.params().await;
    assert_eq!(params.lock_time_secs, 5);
    assert_eq!(params.penalty_percentage, 50);
}

#[tokio::test]
async fn test_inference_service_lifecycle_emits_events() {
    let (service, _clock) = create_service();
    let mut events = service.subscribe_to_events().await;
    let provider = addr(10);

    service
        .add_or_update_inference_service(provider, inference_service("https://p.example/v1"))
        .await
        .unwrap();
    service
        .add_or_update_inference_service(provider, inference_service("https://q.example/v1"))
        .await
        .unwrap();
    service.remove_inference_service(provider).await.unwrap();

    assert_eq!(
        events.recv().await.unwrap(),
        EscrowEvent::ServiceUpdated {
            provider,
            kind: ServiceKind::Inference,
            url: "https://p.example/v1".to_string()
        }
    );
    assert!(matches!(
        events.recv().await.unwrap(),
        EscrowEvent::ServiceUpdated { ref url, .. } if url == "https://q.example/v1"
    ));
    assert_eq!(
        events.recv().await.unwrap(),
        EscrowEvent::ServiceRemoved {
            provider,
            kind: ServiceKind::Inference
        }
    );
    assert!(service.get_all_inference_services().await.is_empty());
}

#[tokio::test]
async fn test_provider_only_touches_own_service() {
    let (service, _clock) = create_service();
    service
        .add_or_update_inference_service(addr(10), inference_service("https://p.example"))
        .await
        .unwrap();

    // Another provider removing has nothing of its own to remove
    assert!(matches!(
        service.remove_inference_service(addr(11)).await,
        Err(EscrowError::ServiceNotFound { .. })
    ));
    assert_eq!(
        service.get_inference_service(addr(10)).await.unwrap().descriptor.url,
        "https://p.example"
    );
}

#[tokio::test]
async fn test_fine_tuning_service_occupied_flag() {
    let (service, _clock) = create_service();
    let provider = addr(20);
    service
        .add_or_update_fine_tuning_service(
            provider,
            FineTuningService {
                url: "https://ft.example".to_string(),
                quota: Quota {
                    cpu_count: 8,
                    node_memory: 64,
                    gpu_count: 1,
                    node_storage: 500,
                    gpu_type: "H100".to_string(),
                },
                price_per_token: U256::from(3),
                occupied: false,
                models: vec!["qwen-2.5-7b".to_string()],
                verifiability: VerifiabilityMode::TeeML,
            },
        )
        .await
        .unwrap();

    service.mark_service_occupied(provider, true).await.unwrap();
    assert!(service
        .get_fine_tuning_service(provider)
        .await
        .unwrap()
        .descriptor
        .occupied);
    assert!(service.mark_service_occupied(addr(21), true).await.is_err());
}
