//! Aggregation pipeline joining journals with their user and location.

use mongodb::bson::{doc, Bson, Document};

use crate::constants::{LOCATIONS_COLLECTION, USERS_COLLECTION};
use crate::cursor::SyncCursor;

/// Finished journals only; with a cursor, only ids after it.
pub fn match_filter(cursor: Option<SyncCursor>) -> Document {
    let mut filter = doc! { "end_time": { "$ne": Bson::Null } };
    if let Some(cursor) = cursor {
        filter.insert("_id", doc! { "$gt": cursor.object_id() });
    }
    filter
}

fn lookup_by_id(from: &str, local: &str, var: &str, alias: &str) -> Vec<Document> {
    vec![
        doc! {
            "$lookup": {
                "from": from,
                "let": { var: local },
                "pipeline": [
                    { "$match": { "$expr": { "$eq": ["$_id", format!("$${var}")] } } }
                ],
                "as": alias,
            }
        },
        doc! {
            "$unwind": { "path": format!("${alias}"), "preserveNullAndEmptyArrays": true }
        },
    ]
}

fn to_object_id(field: &str) -> Document {
    doc! {
        "$convert": { "input": field, "to": "objectId", "onError": Bson::Null, "onNull": Bson::Null }
    }
}

fn geojson_coordinate(index: i32) -> Document {
    doc! {
        "$cond": [
            { "$eq": [{ "$type": "$loc.coordinates.coordinates" }, "array"] },
            { "$arrayElemAt": ["$loc.coordinates.coordinates", index] },
            Bson::Null
        ]
    }
}

pub fn journal_pipeline(cursor: Option<SyncCursor>) -> Vec<Document> {
    let state = doc! { "$ifNull": ["$loc.stateInitials", { "$ifNull": ["$loc.state", ""] }] };

    let mut stages = vec![
        doc! { "$match": match_filter(cursor) },
        doc! {
            "$addFields": {
                "uid_obj": to_object_id("$uid"),
                "loc_obj": to_object_id("$locationId"),
            }
        },
    ];
    stages.extend(lookup_by_id(USERS_COLLECTION, "$uid_obj", "u", "u"));
    stages.extend(lookup_by_id(LOCATIONS_COLLECTION, "$loc_obj", "l", "loc"));
    stages.push(doc! {
        "$addFields": {
            // GeoJSON points are [lng, lat]
            "lng_from_geojson": geojson_coordinate(0),
            "lat_from_geojson": geojson_coordinate(1),
        }
    });
    stages.push(doc! {
        "$project": {
            "_id": 0,
            "journal_id": { "$toString": "$_id" },
            "start_time": "$start_time",
            "end_time": "$end_time",
            "user_name": { "$ifNull": ["$u.name", ""] },
            "user_email": { "$ifNull": ["$u.email", ""] },
            "location_name": { "$ifNull": ["$loc.name", ""] },
            "city": { "$ifNull": ["$loc.city", ""] },
            "state": state.clone(),
            "zip": { "$ifNull": ["$loc.zip", ""] },
            "location_country": { "$ifNull": ["$loc.country", ""] },
            "address": { "$ifNull": ["$loc.address", ""] },
            "place": {
                "$concat": [
                    { "$ifNull": ["$loc.name", ""] }, ", ",
                    { "$ifNull": ["$loc.city", ""] }, " ",
                    state
                ]
            },
            "latitude": {
                "$ifNull": ["$loc.coordinates.lat",
                    { "$ifNull": ["$loc.coordinates.latitude", "$lat_from_geojson"] }]
            },
            "longitude": {
                "$ifNull": ["$loc.coordinates.lng",
                    { "$ifNull": ["$loc.coordinates.longitude", "$lng_from_geojson"] }]
            },
            "park_number": {
                "$ifNull": ["$loc.parkNumber", { "$arrayElemAt": ["$loc.category", 0] }]
            },
        }
    });
    stages.push(doc! { "$sort": { "journal_id": 1 } });
    stages
}
