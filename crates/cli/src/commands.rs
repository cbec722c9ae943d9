use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};
use ua_client::ua_types::service::attribute::{ReadValueId, TimestampsToReturn};
use ua_client::ua_types::service::discovery::UserTokenType;
use ua_client::ua_types::service::subscription::{
    CreateMonitoredItemsRequest, CreateSubscriptionRequest, MonitoredItemCreateRequest,
    MonitoringMode, MonitoringParameters, PublishRequest, PublishResult,
    SubscriptionAcknowledgement,
};
use ua_client::ua_types::service::view::{
    BrowseDescription, BrowseDirection, BrowseRequest, BrowseResult,
};
use ua_client::ua_types::NodeId;
use ua_client::{Client, ClientConfig};

/// Publish requests kept queued at the server.
const OUTSTANDING_PUBLISHES: usize = 2;

/// How often the publish queue is topped up. Publish responses with a bad
/// status never reach the callback, so they are replaced here.
const REFILL_INTERVAL: Duration = Duration::from_secs(1);

/// All `ReferenceDescription` fields.
const BROWSE_RESULT_MASK: u32 = 0x3F;

pub(crate) async fn endpoints(config: ClientConfig) -> Result<()> {
    let client = Client::connect(config).await.context("connecting")?;
    client.open_secure_channel().await?;

    let result = client.get_endpoints().await;

    client.close_secure_channel().await;
    client.shutdown().await;

    for endpoint in result? {
        println!("{}", endpoint.endpoint_url);
        println!("  security policy: {}", endpoint.security_policy_uri);
        println!("  security mode:   {:?}", endpoint.security_mode);
        for policy in &endpoint.user_identity_tokens {
            println!("  user token:      {} ({:?})", policy.policy_id, policy.token_type);
        }
    }
    Ok(())
}

pub(crate) async fn browse(config: ClientConfig, node: NodeId) -> Result<()> {
    let client = open_session(config).await?;

    let result = browse_all(&client, node).await;

    close(&client).await;
    result
}

async fn browse_all(client: &Client, node: NodeId) -> Result<()> {
    let request = BrowseRequest {
        nodes_to_browse: vec![BrowseDescription {
            node_id: node,
            browse_direction: BrowseDirection::Forward,
            reference_type_id: NodeId::HIERARCHICAL_REFERENCES,
            include_subtypes: true,
            node_class_mask: 0,
            result_mask: BROWSE_RESULT_MASK,
        }],
        ..Default::default()
    };

    print_references(&client.browse(request).await?);
    while !client.continuation_points().is_empty() {
        print_references(&client.browse_next().await?);
    }
    Ok(())
}

fn print_references(results: &[BrowseResult]) {
    for result in results {
        if !result.status_code.is_good() {
            println!("browse failed: {}", result.status_code);
            continue;
        }
        for reference in &result.references {
            println!(
                "{:<32} {:<24} {:?}",
                reference.node_id.node_id.to_string(),
                reference.browse_name.name,
                reference.node_class
            );
        }
    }
}

pub(crate) async fn read(config: ClientConfig, nodes: Vec<NodeId>) -> Result<()> {
    let client = open_session(config).await?;

    let result = client.read_values(nodes.clone()).await;

    close(&client).await;

    for (node, value) in nodes.iter().zip(result?) {
        match &value.value {
            Some(variant) => println!("{node}: {variant} ({})", value.status()),
            None => println!("{node}: <no value> ({})", value.status()),
        }
    }
    Ok(())
}

pub(crate) async fn subscribe(
    config: ClientConfig,
    nodes: Vec<NodeId>,
    interval_ms: u32,
    duration_secs: u64,
) -> Result<()> {
    let client = open_session(config).await?;

    let result = watch(&client, nodes, interval_ms, Duration::from_secs(duration_secs)).await;

    close(&client).await;
    result
}

async fn watch(
    client: &Client,
    nodes: Vec<NodeId>,
    interval_ms: u32,
    duration: Duration,
) -> Result<()> {
    let (tx, rx) = flume::unbounded::<PublishResult>();

    let subscription = client
        .create_subscription(
            CreateSubscriptionRequest {
                requested_publishing_interval: f64::from(interval_ms),
                requested_lifetime_count: 60,
                requested_max_keep_alive_count: 10,
                publishing_enabled: true,
                ..Default::default()
            },
            move |result| {
                let _ = tx.send(result);
            },
        )
        .await?;
    let subscription_id = subscription.subscription_id;

    let items_to_create = (0u32..)
        .zip(&nodes)
        .map(|(client_handle, node)| MonitoredItemCreateRequest {
            item_to_monitor: ReadValueId::value_of(node.clone()),
            monitoring_mode: MonitoringMode::Reporting,
            requested_parameters: MonitoringParameters {
                client_handle,
                sampling_interval: f64::from(interval_ms),
                queue_size: 1,
                discard_oldest: true,
                ..Default::default()
            },
        })
        .collect();
    let created = client
        .create_monitored_items(CreateMonitoredItemsRequest {
            subscription_id,
            timestamps_to_return: TimestampsToReturn::Both,
            items_to_create,
            ..Default::default()
        })
        .await?;
    for (node, item) in nodes.iter().zip(&created) {
        if !item.status_code.is_good() {
            warn!("Cannot monitor {}: {}", node, item.status_code);
        }
    }

    let deadline = tokio::time::sleep(duration);
    tokio::pin!(deadline);
    let mut refill = tokio::time::interval(REFILL_INTERVAL);
    refill.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            () = &mut deadline => break,
            _ = refill.tick() => {
                // Only publish requests are pending while watching.
                for _ in 0..missing_publishes(client.in_flight()) {
                    client.publish(PublishRequest::default()).await?;
                }
            }
            received = rx.recv_async() => {
                let result = received.map_err(|_| anyhow!("notification delivery stopped"))?;
                print_changes(&nodes, &result);

                // Acknowledge and keep the queue at the server full.
                let acknowledgement = SubscriptionAcknowledgement {
                    subscription_id: result.subscription_id,
                    sequence_number: result.notification_message.sequence_number,
                };
                let keep_alive = result.notification_message.notification_data.is_empty();
                client
                    .publish(PublishRequest {
                        subscription_acknowledgements: if keep_alive {
                            Vec::new()
                        } else {
                            vec![acknowledgement]
                        },
                        ..Default::default()
                    })
                    .await?;
            }
        }
    }

    client.delete_subscriptions(vec![subscription_id]).await?;
    Ok(())
}

const fn missing_publishes(in_flight: usize) -> usize {
    OUTSTANDING_PUBLISHES.saturating_sub(in_flight)
}

fn print_changes(nodes: &[NodeId], result: &PublishResult) {
    for change in result.data_changes() {
        let node = usize::try_from(change.client_handle)
            .ok()
            .and_then(|index| nodes.get(index));
        let Some(node) = node else {
            warn!("Data change for unknown handle {}", change.client_handle);
            continue;
        };
        match &change.value.value {
            Some(variant) => println!("{node}: {variant} ({})", change.value.status()),
            None => println!("{node}: <no value> ({})", change.value.status()),
        }
    }
}

/// Connect, open a channel and activate an anonymous session.
async fn open_session(config: ClientConfig) -> Result<Client> {
    let client = Client::connect(config).await.context("connecting")?;

    if let Err(e) = establish(&client).await {
        client.shutdown().await;
        return Err(e);
    }
    Ok(client)
}

async fn establish(client: &Client) -> Result<()> {
    client.open_secure_channel().await?;

    let endpoints = client.get_endpoints().await?;
    let policy_id = endpoints
        .iter()
        .find_map(|endpoint| endpoint.find_token_policy(UserTokenType::Anonymous))
        .map(|policy| policy.policy_id.clone())
        .ok_or_else(|| anyhow!("server offers no anonymous user token policy"))?;

    let session = client.create_session().await?;
    client.activate_session_anonymous(policy_id).await?;
    info!("Session {} active", session.session_id);
    Ok(())
}

/// Best-effort teardown.
async fn close(client: &Client) {
    if let Err(e) = client.close_session().await {
        warn!("Failed to close session: {}", e);
    }
    client.close_secure_channel().await;
    client.shutdown().await;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_refill_replaces_dropped_publishes() {
        assert_eq!(missing_publishes(0), OUTSTANDING_PUBLISHES);
        assert_eq!(missing_publishes(1), OUTSTANDING_PUBLISHES - 1);
        assert_eq!(missing_publishes(OUTSTANDING_PUBLISHES), 0);
        assert_eq!(missing_publishes(OUTSTANDING_PUBLISHES + 3), 0);
    }
}
