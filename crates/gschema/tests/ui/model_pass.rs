use gschema::prelude::*;

#[model]
#[derive(Clone)]
pub struct Order {
    pub id: u64,
    #[serde(rename = "itemCount")]
    pub item_count: u32,
    pub note: Option<String>,
    #[serde(skip)]
    pub cached: bool,
}

#[model(name = "LineItem", deny_unknown_fields = false)]
#[derive(Debug)]
pub struct LineItem {
    pub sku: String,
    #[serde(default)]
    pub quantity: u32,
}

#[model(derive_extras = false)]
pub struct Gauge {
    pub level: std::sync::Mutex<i64>,
}

fn main() {
    assert_eq!(Gauge::FIELDS, ["level"]);
    assert_eq!(Order::NAME, "Order");
    assert_eq!(Order::FIELDS, ["id", "itemCount", "note"]);
    assert_eq!(Order::REQUIRED, ["id", "itemCount"]);
    assert_eq!(LineItem::NAME, "LineItem");
    assert_eq!(LineItem::REQUIRED, ["sku"]);

    let _ = GenericSchema::<Order>::define("OrderSchema").field("id", Field::integer());
}
