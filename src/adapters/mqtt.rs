//! ESP-IDF MQTT client adapter.
//!
//! Implements [`BrokerPort`] on top of `EspMqttClient`. The client runs
//! its own task; its callback translates connection and message events
//! into [`BrokerEvent`]s on a channel that the main loop drains through
//! `broker_poll`, so no domain code ever runs on the MQTT task.

use std::sync::mpsc::{self, Receiver, SyncSender, TrySendError};

use embedded_svc::mqtt::client::{Details, EventPayload, QoS};
use esp_idf_svc::mqtt::client::{EspMqttClient, MqttClientConfiguration};
use log::{info, warn};

use crate::app::ports::{BrokerEvent, BrokerPort, InboundMessage};
use crate::config::SystemConfig;
use crate::error::TransientError;

/// Events buffered between the MQTT task and the main loop.
const EVENT_QUEUE: usize = 32;
const MAX_PAYLOAD: usize = 512;
const BUFFER_SIZE: usize = 2048;

pub struct EspBroker {
    url: String,
    username: String,
    password: String,
    client: Option<EspMqttClient<'static>>,
    events: Option<Receiver<BrokerEvent>>,
}

impl EspBroker {
    pub fn new(config: &SystemConfig) -> Self {
        Self {
            url: format!("mqtt://{}:{}", config.broker_host, config.broker_port),
            username: config.broker_user.clone(),
            password: config.broker_pass.clone(),
            client: None,
            events: None,
        }
    }
}

fn forward(tx: &SyncSender<BrokerEvent>, event: BrokerEvent) {
    if let Err(TrySendError::Full(dropped)) = tx.try_send(event) {
        warn!("MQTT: event queue full, dropping {:?}", dropped);
    }
}

impl BrokerPort for EspBroker {
    fn broker_connect(&mut self, client_id: &str) -> Result<(), TransientError> {
        self.broker_disconnect();

        let conf = MqttClientConfiguration {
            client_id: Some(client_id),
            username: (!self.username.is_empty()).then_some(self.username.as_str()),
            password: (!self.password.is_empty()).then_some(self.password.as_str()),
            buffer_size: BUFFER_SIZE,
            out_buffer_size: BUFFER_SIZE,
            ..Default::default()
        };

        let (tx, rx) = mpsc::sync_channel(EVENT_QUEUE);
        let client = EspMqttClient::new_cb(&self.url, &conf, move |event| match event.payload() {
            EventPayload::Connected(_) => forward(&tx, BrokerEvent::Connected),
            EventPayload::Disconnected => forward(&tx, BrokerEvent::Disconnected),
            EventPayload::Received { topic: Some(topic), data, details, .. } => {
                if !matches!(details, Details::Complete) || data.len() > MAX_PAYLOAD {
                    warn!("MQTT: dropping fragmented/oversized message on {}", topic);
                    return;
                }
                forward(
                    &tx,
                    BrokerEvent::Message(InboundMessage {
                        topic: topic.to_owned(),
                        payload: data.to_vec(),
                    }),
                );
            }
            EventPayload::Error(e) => warn!("MQTT: {:?}", e),
            _ => {}
        })
        .map_err(|e| {
            warn!("MQTT: client create failed ({e})");
            TransientError::BrokerUnreachable
        })?;

        info!("MQTT: connecting to {} as {}", self.url, client_id);
        self.client = Some(client);
        self.events = Some(rx);
        Ok(())
    }

    fn broker_disconnect(&mut self) {
        // Dropping the client stops its task and closes the socket.
        if self.client.take().is_some() {
            info!("MQTT: client stopped");
        }
        self.events = None;
    }

    fn broker_poll(&mut self) -> Option<BrokerEvent> {
        self.events.as_ref()?.try_recv().ok()
    }

    fn subscribe(&mut self, topic: &str) -> Result<(), TransientError> {
        let client = self.client.as_mut().ok_or(TransientError::BrokerUnreachable)?;
        client
            .subscribe(topic, QoS::AtMostOnce)
            .map(|_| ())
            .map_err(|_| TransientError::BrokerSubscribeFailed)
    }

    fn publish(&mut self, topic: &str, payload: &[u8], retain: bool) -> Result<(), TransientError> {
        let client = self.client.as_mut().ok_or(TransientError::BrokerUnreachable)?;
        client
            .enqueue(topic, QoS::AtLeastOnce, retain, payload)
            .map(|_| ())
            .map_err(|_| TransientError::BrokerPublishFailed)
    }
}
