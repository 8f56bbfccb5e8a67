//! Normalization of a decoded feed into the flat consumer schema.
//!
//! Total by construction: every field of [`VehicleRecord`] has a default,
//! so a record is always produced even from a maximally sparse entity.
//! Missing sub-records are never an error.

use serde::Serialize;

use crate::gtfs_rt::{FeedEntity, FeedMessage, trip_descriptor::ScheduleRelationship};

/// One vehicle, flattened from a feed entity.
///
/// `latitude`/`longitude`/`speed` are physically meaningful, so an absent
/// value is `None` (serialized as `null`) rather than zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct VehicleRecord {
    pub entity_id: String,
    pub trip_id: String,
    pub route_id: String,
    pub start_time: String,
    pub start_date: String,
    pub schedule_relationship: String,
    pub latitude: Option<f32>,
    pub longitude: Option<f32>,
    pub speed: Option<f32>,
    pub vehicle_id: String,
    pub vehicle_label: String,
    pub timestamp: u64,
}

/// The unit stored in and returned by the cache. Vehicles keep the exact
/// order of the source feed's entities.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FeedSnapshot {
    pub header_timestamp: u64,
    pub vehicles: Vec<VehicleRecord>,
}

/// Projects a decoded [`FeedMessage`] into a [`FeedSnapshot`].
///
/// Pure and infallible: ambiguous or absent fields degrade to their
/// documented defaults instead of failing the whole snapshot.
pub fn normalize(feed: &FeedMessage) -> FeedSnapshot {
    FeedSnapshot {
        header_timestamp: feed.header.timestamp.unwrap_or(0),
        vehicles: feed.entity.iter().map(normalize_entity).collect(),
    }
}

fn normalize_entity(entity: &FeedEntity) -> VehicleRecord {
    let veh = entity.vehicle.as_ref();
    let trip = veh.and_then(|v| v.trip.as_ref());
    let pos = veh.and_then(|v| v.position.as_ref());
    let desc = veh.and_then(|v| v.vehicle.as_ref());

    VehicleRecord {
        entity_id: entity.id.clone(),
        trip_id: trip.map(|t| t.trip_id().to_owned()).unwrap_or_default(),
        route_id: trip.map(|t| t.route_id().to_owned()).unwrap_or_default(),
        start_time: trip.map(|t| t.start_time().to_owned()).unwrap_or_default(),
        start_date: trip.map(|t| t.start_date().to_owned()).unwrap_or_default(),
        schedule_relationship: trip
            .and_then(|t| t.schedule_relationship)
            .map(relationship_name)
            .unwrap_or_default(),
        latitude: pos.map(|p| p.latitude),
        longitude: pos.map(|p| p.longitude),
        speed: pos.and_then(|p| p.speed),
        vehicle_id: desc.map(|d| d.id().to_owned()).unwrap_or_default(),
        vehicle_label: desc.map(|d| d.label().to_owned()).unwrap_or_default(),
        timestamp: veh.and_then(|v| v.timestamp).unwrap_or(0),
    }
}

/// String form of a schedule relationship. Values outside the known enum
/// range keep their numeric representation instead of being dropped.
fn relationship_name(raw: i32) -> String {
    ScheduleRelationship::try_from(raw)
        .map(|r| r.as_str_name().to_owned())
        .unwrap_or_else(|_| raw.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gtfs_rt::{
        FeedHeader, Position, TripDescriptor, VehicleDescriptor, VehiclePosition,
    };

    fn feed_with(entity: Vec<FeedEntity>) -> FeedMessage {
        FeedMessage {
            header: FeedHeader {
                gtfs_realtime_version: "2.0".to_string(),
                incrementality: None,
                timestamp: Some(1_700_000_000),
            },
            entity,
        }
    }

    fn bare_entity(id: &str) -> FeedEntity {
        FeedEntity {
            id: id.to_string(),
            is_deleted: None,
            vehicle: None,
        }
    }

    #[test]
    fn test_normalize_empty_feed() {
        let snapshot = normalize(&feed_with(vec![]));
        assert_eq!(snapshot.header_timestamp, 1_700_000_000);
        assert!(snapshot.vehicles.is_empty());
    }

    #[test]
    fn test_missing_header_timestamp_defaults_to_zero() {
        let mut feed = feed_with(vec![]);
        feed.header.timestamp = None;
        assert_eq!(normalize(&feed).header_timestamp, 0);
    }

    #[test]
    fn test_sparse_entity_gets_all_defaults() {
        let snapshot = normalize(&feed_with(vec![bare_entity("e1")]));
        let v = &snapshot.vehicles[0];
        assert_eq!(
            *v,
            VehicleRecord {
                entity_id: "e1".to_string(),
                ..Default::default()
            }
        );
        assert_eq!(v.latitude, None);
        assert_eq!(v.timestamp, 0);
    }

    #[test]
    fn test_empty_vehicle_sub_record_is_not_an_error() {
        let entity = FeedEntity {
            id: "e1".to_string(),
            is_deleted: None,
            vehicle: Some(VehiclePosition::default()),
        };
        let snapshot = normalize(&feed_with(vec![entity]));
        let v = &snapshot.vehicles[0];
        assert_eq!(v.trip_id, "");
        assert_eq!(v.schedule_relationship, "");
        assert_eq!(v.speed, None);
    }

    #[test]
    fn test_full_entity_is_fully_populated() {
        let entity = FeedEntity {
            id: "e1".to_string(),
            is_deleted: None,
            vehicle: Some(VehiclePosition {
                trip: Some(TripDescriptor {
                    trip_id: Some("trip-1".to_string()),
                    start_time: Some("08:15:00".to_string()),
                    start_date: Some("20231114".to_string()),
                    schedule_relationship: Some(ScheduleRelationship::Added as i32),
                    route_id: Some("route-9".to_string()),
                    direction_id: None,
                }),
                position: Some(Position {
                    latitude: 28.6,
                    longitude: 77.2,
                    bearing: None,
                    odometer: None,
                    speed: Some(12.5),
                }),
                timestamp: Some(1_700_000_100),
                vehicle: Some(VehicleDescriptor {
                    id: Some("bus-42".to_string()),
                    label: Some("42".to_string()),
                    license_plate: None,
                }),
            }),
        };

        let snapshot = normalize(&feed_with(vec![entity]));
        let v = &snapshot.vehicles[0];
        assert_eq!(v.entity_id, "e1");
        assert_eq!(v.trip_id, "trip-1");
        assert_eq!(v.route_id, "route-9");
        assert_eq!(v.start_time, "08:15:00");
        assert_eq!(v.start_date, "20231114");
        assert_eq!(v.schedule_relationship, "ADDED");
        assert_eq!(v.latitude, Some(28.6));
        assert_eq!(v.longitude, Some(77.2));
        assert_eq!(v.speed, Some(12.5));
        assert_eq!(v.vehicle_id, "bus-42");
        assert_eq!(v.vehicle_label, "42");
        assert_eq!(v.timestamp, 1_700_000_100);
    }

    #[test]
    fn test_unknown_schedule_relationship_keeps_numeric_form() {
        assert_eq!(relationship_name(0), "SCHEDULED");
        assert_eq!(relationship_name(3), "CANCELED");
        assert_eq!(relationship_name(99), "99");
    }

    #[test]
    fn test_entity_order_is_preserved() {
        for ids in [vec![], vec!["a"], vec!["c", "a", "b", "a"]] {
            let entities = ids.iter().map(|id| bare_entity(id)).collect();
            let snapshot = normalize(&feed_with(entities));
            let out: Vec<&str> = snapshot
                .vehicles
                .iter()
                .map(|v| v.entity_id.as_str())
                .collect();
            assert_eq!(out, ids);
        }
    }

    #[test]
    fn test_json_shape_matches_consumer_contract() {
        let sparse = normalize(&feed_with(vec![bare_entity("e1")]));
        let json = serde_json::to_value(&sparse).unwrap();
        assert_eq!(json["header_timestamp"], 1_700_000_000u64);
        assert_eq!(json["vehicles"][0]["entity_id"], "e1");
        assert_eq!(json["vehicles"][0]["latitude"], serde_json::Value::Null);
        assert_eq!(json["vehicles"][0]["speed"], serde_json::Value::Null);
        assert_eq!(json["vehicles"][0]["timestamp"], 0);
        assert_eq!(json["vehicles"][0]["schedule_relationship"], "");
    }
}
