//! Distribution reductions over a filtered event batch

use chrono::Timelike;
use chrono_tz::Tz;
use indexmap::IndexMap;

use super::counter::OrderedCounter;
use super::types::{
    EventRecord, EventTypeCount, EventValue, PageViewCount, ProductInteraction, TimelineBucket,
};

const PAGE_VIEW_TYPES: &[&str] = &["page_view", "pageview"];
const ADD_TO_CART: &str = "add_to_cart";
const CLICK: &str = "click";
const ADD_TO_CART_LABEL: &str = "Add to Cart";

const PRODUCT_NAME_KEYS: &[&str] = &["productName", "product_name", "product", "name"];
const PRODUCT_PRICE_KEYS: &[&str] = &["price", "productPrice", "product_price"];
const PRODUCT_CATEGORY_KEYS: &[&str] = &["category", "productCategory", "product_category"];

/// Events per type, descending
pub fn event_type_counts(events: &[EventRecord]) -> Vec<EventTypeCount> {
    events
        .iter()
        .map(|event| event.event_type.as_str())
        .collect::<OrderedCounter<&str>>()
        .into_ranked()
        .into_iter()
        .map(|(event_type, count)| EventTypeCount {
            event_type: event_type.to_string(),
            count,
        })
        .collect()
}

/// Events per wall-clock minute in `tz`, ascending by minute of day
pub fn timeline(events: &[EventRecord], tz: Tz) -> Vec<TimelineBucket> {
    let counter: OrderedCounter<u16> = events
        .iter()
        .map(|event| {
            let local = event.created_at.with_timezone(&tz);
            (local.hour() * 60 + local.minute()) as u16
        })
        .collect();

    let mut buckets: Vec<TimelineBucket> = counter
        .into_entries()
        .into_iter()
        .map(|(minute_of_day, count)| TimelineBucket {
            time: format!("{:02}:{:02}", minute_of_day / 60, minute_of_day % 60),
            minute_of_day,
            count,
        })
        .collect();
    buckets.sort_by_key(|bucket| bucket.minute_of_day);
    buckets
}

/// Page views per URL, descending. Views without a URL are left out.
pub fn page_view_counts(events: &[EventRecord]) -> Vec<PageViewCount> {
    events
        .iter()
        .filter(|event| PAGE_VIEW_TYPES.contains(&event.event_type.as_str()))
        .filter_map(EventRecord::page)
        .collect::<OrderedCounter<&str>>()
        .into_ranked()
        .into_iter()
        .map(|(page_url, count)| PageViewCount {
            page_url: page_url.to_string(),
            count,
        })
        .collect()
}

/// Add-to-cart interactions per product, descending.
///
/// Price and category come from the first event naming the product.
pub fn product_interactions(events: &[EventRecord]) -> Vec<ProductInteraction> {
    let mut products: IndexMap<String, ProductInteraction> = IndexMap::new();

    for event in events.iter().filter(|event| is_add_to_cart(event)) {
        let Some(name) = product_name(event) else {
            tracing::trace!(event_id = event.id, "Add-to-cart event without product name");
            continue;
        };
        products
            .entry(name.clone())
            .and_modify(|product| product.count += 1)
            .or_insert_with(|| ProductInteraction {
                product_name: name,
                price: lookup(event, PRODUCT_PRICE_KEYS).and_then(EventValue::as_f64),
                category: lookup(event, PRODUCT_CATEGORY_KEYS)
                    .and_then(EventValue::as_str)
                    .map(str::to_string),
                count: 1,
            });
    }

    let mut ranked: Vec<ProductInteraction> = products.into_values().collect();
    ranked.sort_by(|a, b| b.count.cmp(&a.count));
    ranked
}

fn is_add_to_cart(event: &EventRecord) -> bool {
    match event.event_type.as_str() {
        ADD_TO_CART => true,
        CLICK => event
            .data("text")
            .and_then(EventValue::as_str)
            .is_some_and(|text| text.trim() == ADD_TO_CART_LABEL),
        _ => false,
    }
}

fn product_name(event: &EventRecord) -> Option<String> {
    lookup(event, PRODUCT_NAME_KEYS)
        .and_then(EventValue::as_str)
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
}

/// First matching key at the top level, then inside a nested `product` object
fn lookup<'a>(event: &'a EventRecord, keys: &[&str]) -> Option<&'a EventValue> {
    let top = keys
        .iter()
        .filter_map(|key| event.data(key))
        .find(|value| !matches!(value, EventValue::Null | EventValue::Object(_)));
    if top.is_some() {
        return top;
    }

    let nested = event.data("product").and_then(EventValue::as_object)?;
    keys.iter()
        .filter_map(|key| nested.get(*key))
        .find(|value| !matches!(value, EventValue::Null | EventValue::Object(_)))
}
