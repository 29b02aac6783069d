//! JSON endpoints over the greeting index, and the random card redirect.

use crate::index::{request_filters, Greeting, FIELDS};
use crate::params::{parse_int, QueryParams};
use crate::state::SharedState;
use axum::extract::State;
use axum::http::header::{CONTENT_TYPE, LOCATION};
use axum::http::{StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use serde_json::{Map, Value};
use std::collections::HashMap;
use uuid::Uuid;

pub const JSON_CONTENT_TYPE: &str = "application/json; charset=UTF-8";

/// Array-valued fields counted by `/stats`.
const STAT_ARRAY_FIELDS: [&str; 3] = ["titles", "categories", "sources"];

fn json_response(value: Value) -> Response {
    ([(CONTENT_TYPE, JSON_CONTENT_TYPE)], value.to_string()).into_response()
}

/// `GET /get`: selected fields of one card (`id`) or of a filtered page of cards
/// (`count`, `offset`).
pub async fn get_greetings(State(state): State<SharedState>, uri: Uri) -> Response {
    let params = QueryParams::from_uri(&uri);
    let mut fields: Vec<&str> = params
        .get_all("field")
        .filter(|field| FIELDS.contains(field))
        .collect();
    if fields.is_empty() {
        fields = FIELDS.to_vec();
    }

    let mut list = Map::new();
    if let Some(id) = params.get("id") {
        if let Some(greeting) = state.greetings.valid(id) {
            list.insert(id.to_string(), select_fields(greeting, &fields));
        }
    } else {
        let count = params.get("count").and_then(parse_int).unwrap_or(0);
        let offset = params.get("offset").and_then(parse_int).unwrap_or(0);
        if count > 0 {
            let filters = request_filters(params.pairs());
            for (id, greeting) in state
                .greetings
                .matching(&filters)
                .skip(offset.max(0) as usize)
                .take(count as usize)
            {
                list.insert(id.to_string(), select_fields(greeting, &fields));
            }
        }
    }
    json_response(Value::Object(list))
}

fn select_fields(greeting: &Greeting, fields: &[&str]) -> Value {
    let mut entry = Map::new();
    for field in fields {
        if let Some(value) = greeting.field(field) {
            entry.insert(field.to_string(), value);
        }
    }
    Value::Object(entry)
}

/// Occurrence counts in first-seen order.
#[derive(Debug, Default)]
struct StatCounts {
    entries: Vec<(String, u64)>,
    positions: HashMap<String, usize>,
}

impl StatCounts {
    fn increment(&mut self, key: &str) {
        match self.positions.get(key) {
            Some(&i) => self.entries[i].1 += 1,
            None => {
                self.positions.insert(key.to_string(), self.entries.len());
                self.entries.push((key.to_string(), 1));
            }
        }
    }

    /// JSON object sorted by descending count; ties keep first-seen order.
    fn into_json(mut self) -> Value {
        self.entries.sort_by(|a, b| b.1.cmp(&a.1));
        let map: Map<String, Value> = self
            .entries
            .into_iter()
            .map(|(key, count)| (key, Value::from(count)))
            .collect();
        Value::Object(map)
    }
}

#[derive(Debug, Default)]
struct Stats {
    total: i64,
    titles: StatCounts,
    categories: StatCounts,
    sources: StatCounts,
    types: StatCounts,
}

impl Stats {
    fn array_field(&mut self, field: &str) -> &mut StatCounts {
        match field {
            "titles" => &mut self.titles,
            "categories" => &mut self.categories,
            _ => &mut self.sources,
        }
    }

    fn into_json(self) -> Value {
        let mut map = Map::new();
        map.insert("total".to_string(), Value::from(self.total));
        map.insert("titles".to_string(), self.titles.into_json());
        map.insert("categories".to_string(), self.categories.into_json());
        map.insert("sources".to_string(), self.sources.into_json());
        map.insert("types".to_string(), self.types.into_json());
        Value::Object(map)
    }
}

fn array_values<'g>(greeting: &'g Greeting, field: &str) -> &'g [String] {
    match field {
        "titles" => &greeting.titles,
        "categories" => &greeting.categories,
        _ => &greeting.sources,
    }
}

/// `GET /stats`: value counts shared with one card (`id`), or counts over filtered cards.
pub async fn stats(State(state): State<SharedState>, uri: Uri) -> Response {
    let params = QueryParams::from_uri(&uri);
    let mut stats = Stats {
        total: -1,
        ..Stats::default()
    };

    if let Some(id) = params.get("id") {
        let compare = parse_int(id).and_then(|n| state.greetings.valid(&n.to_string()));
        if let Some(compare) = compare {
            for (_, greeting) in state.greetings.iter_valid() {
                for field in STAT_ARRAY_FIELDS {
                    let shared = array_values(compare, field);
                    for value in array_values(greeting, field) {
                        if shared.contains(value) {
                            stats.array_field(field).increment(value);
                        }
                    }
                }
                if compare.kind == greeting.kind {
                    stats.types.increment(&greeting.kind);
                }
            }
        }
    } else {
        let filters = request_filters(params.pairs());
        stats.total = 0;
        for (_, greeting) in state.greetings.matching(&filters) {
            for value in &greeting.categories {
                stats.categories.increment(value);
            }
            for value in &greeting.sources {
                stats.sources.increment(value);
            }
            stats.types.increment(&greeting.kind);
            stats.total += 1;
        }
    }
    json_response(stats.into_json())
}

/// `GET /random`: redirect to a random card matching the query's filters.
pub async fn random(State(state): State<SharedState>, uri: Uri) -> Response {
    let params = QueryParams::from_uri(&uri);
    let filters = request_filters(params.pairs());
    let ids: Vec<&str> = state.greetings.matching(&filters).map(|(id, _)| id).collect();

    let location = if ids.is_empty() {
        "/".to_string()
    } else {
        let pick = (Uuid::new_v4().as_u128() % ids.len() as u128) as usize;
        let id: String = url::form_urlencoded::byte_serialize(ids[pick].as_bytes()).collect();
        format!("/?id={}", id)
    };
    (StatusCode::FOUND, [(LOCATION, location)]).into_response()
}
