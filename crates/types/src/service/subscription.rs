//! Subscription and monitored item services, and notification payloads.

use crate::encoding::DateTime;
use crate::error::Result;
use crate::header::{RequestHeader, ResponseHeader};
use crate::service::attribute::{ReadValueId, TimestampsToReturn};
use crate::status_code::StatusCode;
use crate::variant::{DataValue, DiagnosticInfo, ExtensionObject, Variant};

/// Binary encoding id of [`DataChangeNotification`].
pub const DATA_CHANGE_NOTIFICATION_ID: u32 = 811;

/// Binary encoding id of [`StatusChangeNotification`].
pub const STATUS_CHANGE_NOTIFICATION_ID: u32 = 820;

/// Binary encoding id of [`EventNotificationList`].
pub const EVENT_NOTIFICATION_LIST_ID: u32 = 916;

binary_enum! {
    /// Sampling and reporting state of a monitored item.
    pub enum MonitoringMode {
        /// Neither sampled nor reported.
        Disabled = 0,
        /// Sampled, not reported.
        Sampling = 1,
        /// Sampled and reported.
        #[default]
        Reporting = 2,
    }
}

binary_struct! {
    /// Sampling parameters of a monitored item.
    pub struct MonitoringParameters {
        /// Handle echoed in notifications.
        pub client_handle: u32,
        /// Sampling interval in milliseconds, negative for the publishing interval.
        pub sampling_interval: f64,
        /// Filter, null for the default.
        pub filter: ExtensionObject,
        /// Queue size.
        pub queue_size: u32,
        /// Discard the oldest value when the queue is full.
        pub discard_oldest: bool,
    }
}

binary_struct! {
    /// A monitored item to create.
    pub struct MonitoredItemCreateRequest {
        /// Attribute to monitor.
        pub item_to_monitor: ReadValueId,
        /// Initial mode.
        pub monitoring_mode: MonitoringMode,
        /// Requested parameters.
        pub requested_parameters: MonitoringParameters,
    }
}

binary_struct! {
    /// Outcome of creating one monitored item.
    pub struct MonitoredItemCreateResult {
        /// Result.
        pub status_code: StatusCode,
        /// Server assigned id.
        pub monitored_item_id: u32,
        /// Granted sampling interval.
        pub revised_sampling_interval: f64,
        /// Granted queue size.
        pub revised_queue_size: u32,
        /// Filter result.
        pub filter_result: ExtensionObject,
    }
}

binary_struct! {
    /// Creates monitored items in a subscription.
    pub struct CreateMonitoredItemsRequest {
        /// Common request header.
        pub request_header: RequestHeader,
        /// Owning subscription.
        pub subscription_id: u32,
        /// Timestamps to report.
        pub timestamps_to_return: TimestampsToReturn,
        /// Items to create.
        pub items_to_create: Vec<MonitoredItemCreateRequest>,
    }
}

binary_struct! {
    /// Reply to [`CreateMonitoredItemsRequest`].
    pub struct CreateMonitoredItemsResponse {
        /// Common response header.
        pub response_header: ResponseHeader,
        /// One result per item.
        pub results: Vec<MonitoredItemCreateResult>,
        /// Per item diagnostics.
        pub diagnostic_infos: Vec<DiagnosticInfo>,
    }
}

binary_struct! {
    /// Deletes monitored items.
    pub struct DeleteMonitoredItemsRequest {
        /// Common request header.
        pub request_header: RequestHeader,
        /// Owning subscription.
        pub subscription_id: u32,
        /// Items to delete.
        pub monitored_item_ids: Vec<u32>,
    }
}

binary_struct! {
    /// Reply to [`DeleteMonitoredItemsRequest`].
    pub struct DeleteMonitoredItemsResponse {
        /// Common response header.
        pub response_header: ResponseHeader,
        /// One status per item.
        pub results: Vec<StatusCode>,
        /// Per item diagnostics.
        pub diagnostic_infos: Vec<DiagnosticInfo>,
    }
}

binary_struct! {
    /// Creates a subscription.
    pub struct CreateSubscriptionRequest {
        /// Common request header.
        pub request_header: RequestHeader,
        /// Publishing interval in milliseconds.
        pub requested_publishing_interval: f64,
        /// Intervals without a publish before the subscription expires.
        pub requested_lifetime_count: u32,
        /// Intervals without notifications before a keep-alive is sent.
        pub requested_max_keep_alive_count: u32,
        /// Limit per publish, zero for none.
        pub max_notifications_per_publish: u32,
        /// Start publishing immediately.
        pub publishing_enabled: bool,
        /// Relative priority.
        pub priority: u8,
    }
}

binary_struct! {
    /// Reply to [`CreateSubscriptionRequest`].
    pub struct CreateSubscriptionResponse {
        /// Common response header.
        pub response_header: ResponseHeader,
        /// Server assigned id.
        pub subscription_id: u32,
        /// Granted publishing interval.
        pub revised_publishing_interval: f64,
        /// Granted lifetime count.
        pub revised_lifetime_count: u32,
        /// Granted keep-alive count.
        pub revised_max_keep_alive_count: u32,
    }
}

binary_struct! {
    /// Acknowledges a received notification message.
    pub struct SubscriptionAcknowledgement {
        /// Subscription.
        pub subscription_id: u32,
        /// Sequence number being acknowledged.
        pub sequence_number: u32,
    }
}

binary_struct! {
    /// Asks the server for the next notification message.
    pub struct PublishRequest {
        /// Common request header.
        pub request_header: RequestHeader,
        /// Acknowledgements for earlier messages.
        pub subscription_acknowledgements: Vec<SubscriptionAcknowledgement>,
    }
}

binary_struct! {
    /// Notifications sent in one publish cycle.
    pub struct NotificationMessage {
        /// Sequence number of the message.
        pub sequence_number: u32,
        /// Time the message was sent.
        pub publish_time: DateTime,
        /// Encoded notifications.
        pub notification_data: Vec<ExtensionObject>,
    }
}

binary_struct! {
    /// Reply to [`PublishRequest`].
    pub struct PublishResponse {
        /// Common response header.
        pub response_header: ResponseHeader,
        /// Subscription the message belongs to.
        pub subscription_id: u32,
        /// Sequence numbers available for republish.
        pub available_sequence_numbers: Vec<u32>,
        /// More notifications are waiting.
        pub more_notifications: bool,
        /// The notifications.
        pub notification_message: NotificationMessage,
        /// Per acknowledgement results.
        pub results: Vec<StatusCode>,
        /// Per acknowledgement diagnostics.
        pub diagnostic_infos: Vec<DiagnosticInfo>,
    }
}

binary_struct! {
    /// Asks for a notification message to be sent again.
    pub struct RepublishRequest {
        /// Common request header.
        pub request_header: RequestHeader,
        /// Subscription.
        pub subscription_id: u32,
        /// Sequence number to resend.
        pub retransmit_sequence_number: u32,
    }
}

binary_struct! {
    /// Reply to [`RepublishRequest`].
    pub struct RepublishResponse {
        /// Common response header.
        pub response_header: ResponseHeader,
        /// The resent message.
        pub notification_message: NotificationMessage,
    }
}

binary_struct! {
    /// Deletes subscriptions.
    pub struct DeleteSubscriptionsRequest {
        /// Common request header.
        pub request_header: RequestHeader,
        /// Subscriptions to delete.
        pub subscription_ids: Vec<u32>,
    }
}

binary_struct! {
    /// Reply to [`DeleteSubscriptionsRequest`].
    pub struct DeleteSubscriptionsResponse {
        /// Common response header.
        pub response_header: ResponseHeader,
        /// One status per subscription.
        pub results: Vec<StatusCode>,
        /// Per subscription diagnostics.
        pub diagnostic_infos: Vec<DiagnosticInfo>,
    }
}

binary_struct! {
    /// A changed value of one monitored item.
    pub struct MonitoredItemNotification {
        /// Client handle of the item.
        pub client_handle: u32,
        /// The new value.
        pub value: DataValue,
    }
}

binary_struct! {
    /// Data changes of monitored items.
    pub struct DataChangeNotification {
        /// Changed values.
        pub monitored_items: Vec<MonitoredItemNotification>,
        /// Per item diagnostics.
        pub diagnostic_infos: Vec<DiagnosticInfo>,
    }
}

binary_struct! {
    /// Fields of one event.
    pub struct EventFieldList {
        /// Client handle of the item.
        pub client_handle: u32,
        /// Selected event fields.
        pub event_fields: Vec<Variant>,
    }
}

binary_struct! {
    /// Events reported by monitored items.
    pub struct EventNotificationList {
        /// The events.
        pub events: Vec<EventFieldList>,
    }
}

binary_struct! {
    /// State change of the subscription itself.
    pub struct StatusChangeNotification {
        /// New status.
        pub status: StatusCode,
        /// Diagnostics.
        pub diagnostic_info: DiagnosticInfo,
    }
}

/// A decoded entry of [`NotificationMessage::notification_data`].
#[derive(Debug, Clone, PartialEq)]
pub enum Notification {
    /// Data changes.
    DataChange(DataChangeNotification),
    /// Events.
    Event(EventNotificationList),
    /// Subscription status change.
    StatusChange(StatusChangeNotification),
    /// Any other encoding, kept as received.
    Other(ExtensionObject),
}

impl Notification {
    /// Decode one notification by its encoding id.
    ///
    /// # Errors
    ///
    /// Returns an error if a known notification body fails to decode.
    pub fn from_extension_object(object: &ExtensionObject) -> Result<Self> {
        let decoded = match object.type_id.as_numeric() {
            Some(DATA_CHANGE_NOTIFICATION_ID) => object.decode_inner()?.map(Self::DataChange),
            Some(EVENT_NOTIFICATION_LIST_ID) => object.decode_inner()?.map(Self::Event),
            Some(STATUS_CHANGE_NOTIFICATION_ID) => object.decode_inner()?.map(Self::StatusChange),
            _ => None,
        };
        Ok(decoded.unwrap_or_else(|| Self::Other(object.clone())))
    }
}

impl NotificationMessage {
    /// Decode every entry of the message.
    ///
    /// # Errors
    ///
    /// Returns the first decode error.
    pub fn notifications(&self) -> Result<Vec<Notification>> {
        self.notification_data
            .iter()
            .map(Notification::from_extension_object)
            .collect()
    }

    /// A message with no notifications is a keep-alive.
    #[must_use]
    pub fn is_keep_alive(&self) -> bool {
        self.notification_data.is_empty()
    }
}

/// A publish response as delivered to a subscription callback.
#[derive(Debug, Clone, PartialEq)]
pub struct PublishResult {
    /// Subscription the notifications belong to.
    pub subscription_id: u32,
    /// Sequence numbers available for republish.
    pub available_sequence_numbers: Vec<u32>,
    /// More notifications are waiting on the server.
    pub more_notifications: bool,
    /// The notifications.
    pub notification_message: NotificationMessage,
}

impl PublishResult {
    /// Decode the notifications carried by this result.
    ///
    /// # Errors
    ///
    /// Returns the first decode error.
    pub fn notifications(&self) -> Result<Vec<Notification>> {
        self.notification_message.notifications()
    }

    /// Data change notifications only, with undecodable entries skipped.
    #[must_use]
    pub fn data_changes(&self) -> Vec<MonitoredItemNotification> {
        self.notification_message
            .notification_data
            .iter()
            .filter_map(|object| match Notification::from_extension_object(object) {
                Ok(Notification::DataChange(change)) => Some(change.monitored_items),
                _ => None,
            })
            .flatten()
            .collect()
    }
}

impl From<PublishResponse> for PublishResult {
    fn from(response: PublishResponse) -> Self {
        Self {
            subscription_id: response.subscription_id,
            available_sequence_numbers: response.available_sequence_numbers,
            more_notifications: response.more_notifications,
            notification_message: response.notification_message,
        }
    }
}

service_pair!(
    CreateMonitoredItemsRequest => CreateMonitoredItemsResponse,
    request_id = 751,
    response_id = 754,
);
service_pair!(
    DeleteMonitoredItemsRequest => DeleteMonitoredItemsResponse,
    request_id = 781,
    response_id = 784,
);
service_pair!(
    CreateSubscriptionRequest => CreateSubscriptionResponse,
    request_id = 787,
    response_id = 790,
);
service_pair!(PublishRequest => PublishResponse, request_id = 826, response_id = 829);
service_pair!(RepublishRequest => RepublishResponse, request_id = 832, response_id = 835);
service_pair!(
    DeleteSubscriptionsRequest => DeleteSubscriptionsResponse,
    request_id = 847,
    response_id = 850,
);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoding::BinaryEncodable;

    #[test]
    fn decodes_data_change_notification() {
        let change = DataChangeNotification {
            monitored_items: vec![MonitoredItemNotification {
                client_handle: 3,
                value: DataValue::new(21.5f64),
            }],
            diagnostic_infos: Vec::new(),
        };
        let message = NotificationMessage {
            sequence_number: 1,
            publish_time: DateTime(1),
            notification_data: vec![ExtensionObject::from_message(
                DATA_CHANGE_NOTIFICATION_ID,
                &change,
            )],
        };
        assert_eq!(
            message.notifications().unwrap(),
            vec![Notification::DataChange(change.clone())]
        );

        let result = PublishResult {
            subscription_id: 42,
            available_sequence_numbers: vec![1],
            more_notifications: false,
            notification_message: message,
        };
        assert_eq!(result.data_changes(), change.monitored_items);
    }

    #[test]
    fn unknown_notification_is_kept_raw() {
        let object = ExtensionObject::from_message(9999, &7u32);
        assert_eq!(
            Notification::from_extension_object(&object).unwrap(),
            Notification::Other(object)
        );
    }

    #[test]
    fn status_change_encodes_after_header() {
        let notification = StatusChangeNotification {
            status: StatusCode::BAD_TIMEOUT,
            diagnostic_info: DiagnosticInfo::default(),
        };
        assert_eq!(notification.byte_len(), 5);
    }
}
