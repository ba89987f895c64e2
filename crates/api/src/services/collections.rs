//! Published resource collections.
//!
//! Each collection lives in its own `watch` channel. Publishing is a full
//! replace, so readers always see either the previous or the new collection
//! and subscribers are notified of every publish.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::watch;
use tracing::warn;
use validator::Validate;

use domain::models::{
    Calendar, Device, Driver, FuelRequest, Geofence, Group, Maintenance, Position, Resource,
};

use super::resource_fetcher::FetchError;

pub type Collection<T> = Arc<Vec<T>>;

/// Runs `$body` with `$tx` bound to the channel for `$resource`.
macro_rules! with_channel {
    ($store:expr, $resource:expr, $tx:ident => $body:expr) => {
        match $resource {
            Resource::Devices => {
                let $tx = &$store.devices;
                $body
            }
            Resource::Positions => {
                let $tx = &$store.positions;
                $body
            }
            Resource::Geofences => {
                let $tx = &$store.geofences;
                $body
            }
            Resource::Groups => {
                let $tx = &$store.groups;
                $body
            }
            Resource::Drivers => {
                let $tx = &$store.drivers;
                $body
            }
            Resource::Maintenance => {
                let $tx = &$store.maintenance;
                $body
            }
            Resource::Calendars => {
                let $tx = &$store.calendars;
                $body
            }
            Resource::FuelRequests => {
                let $tx = &$store.fuel_requests;
                $body
            }
        }
    };
}

pub struct CollectionStore {
    devices: watch::Sender<Collection<Device>>,
    positions: watch::Sender<Collection<Position>>,
    geofences: watch::Sender<Collection<Geofence>>,
    groups: watch::Sender<Collection<Group>>,
    drivers: watch::Sender<Collection<Driver>>,
    maintenance: watch::Sender<Collection<Maintenance>>,
    calendars: watch::Sender<Collection<Calendar>>,
    fuel_requests: watch::Sender<Collection<FuelRequest>>,
}

impl CollectionStore {
    /// Creates a store with every collection empty.
    pub fn new() -> Self {
        Self {
            devices: empty_channel(),
            positions: empty_channel(),
            geofences: empty_channel(),
            groups: empty_channel(),
            drivers: empty_channel(),
            maintenance: empty_channel(),
            calendars: empty_channel(),
            fuel_requests: empty_channel(),
        }
    }

    /// Decodes `items` and replaces the collection.
    ///
    /// Nothing is published when any item fails to decode. Items that decode
    /// but fail validation are kept and logged.
    pub fn publish(&self, resource: Resource, items: Vec<Value>) -> Result<usize, FetchError> {
        match resource {
            Resource::Positions => {
                let positions: Vec<Position> = decode(items)?;
                warn_invalid(resource, &positions);
                Ok(replace(&self.positions, positions))
            }
            Resource::FuelRequests => {
                let requests: Vec<FuelRequest> = decode(items)?;
                warn_invalid(resource, &requests);
                Ok(replace(&self.fuel_requests, requests))
            }
            _ => with_channel!(self, resource, tx => {
                let decoded = decode(items)?;
                Ok(replace(tx, decoded))
            }),
        }
    }

    /// Replaces the collection with an empty one.
    pub fn clear(&self, resource: Resource) {
        with_channel!(self, resource, tx => {
            tx.send_replace(Arc::new(Vec::new()));
        })
    }

    pub fn len(&self, resource: Resource) -> usize {
        with_channel!(self, resource, tx => tx.borrow().len())
    }

    /// The current collection as JSON, in wire format.
    pub fn to_json(&self, resource: Resource) -> Result<Value, serde_json::Error> {
        with_channel!(self, resource, tx => {
            let current = tx.borrow().clone();
            serde_json::to_value(current.as_slice())
        })
    }

    pub fn devices(&self) -> Collection<Device> {
        self.devices.borrow().clone()
    }

    pub fn positions(&self) -> Collection<Position> {
        self.positions.borrow().clone()
    }

    pub fn fuel_requests(&self) -> Collection<FuelRequest> {
        self.fuel_requests.borrow().clone()
    }

    pub fn subscribe_devices(&self) -> watch::Receiver<Collection<Device>> {
        self.devices.subscribe()
    }

    pub fn subscribe_positions(&self) -> watch::Receiver<Collection<Position>> {
        self.positions.subscribe()
    }

    pub fn subscribe_fuel_requests(&self) -> watch::Receiver<Collection<FuelRequest>> {
        self.fuel_requests.subscribe()
    }

    pub fn replace_devices(&self, devices: Vec<Device>) {
        replace(&self.devices, devices);
    }

    pub fn replace_positions(&self, positions: Vec<Position>) {
        replace(&self.positions, positions);
    }

    pub fn replace_fuel_requests(&self, requests: Vec<FuelRequest>) {
        replace(&self.fuel_requests, requests);
    }
}

impl Default for CollectionStore {
    fn default() -> Self {
        Self::new()
    }
}

fn empty_channel<T>() -> watch::Sender<Collection<T>> {
    watch::channel(Arc::new(Vec::new())).0
}

fn decode<T: DeserializeOwned>(items: Vec<Value>) -> Result<Vec<T>, FetchError> {
    serde_json::from_value(Value::Array(items)).map_err(|e| FetchError::Decode(e.to_string()))
}

fn replace<T>(tx: &watch::Sender<Collection<T>>, items: Vec<T>) -> usize {
    let count = items.len();
    tx.send_replace(Arc::new(items));
    count
}

fn warn_invalid<T: Validate>(resource: Resource, items: &[T]) {
    for (index, item) in items.iter().enumerate() {
        if let Err(errors) = item.validate() {
            warn!(
                resource = %resource,
                index,
                errors = %errors,
                "Collection item failed validation"
            );
        }
    }
}
