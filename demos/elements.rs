//! Example building and reading element trees by hand.

use xml_marshal::{Document, Element, Timestamp, WriteOptions, NIL_ATTRIBUTE};

fn main() {
    let mut root = Element::new("reading");
    root.add_value_child("sensor", "north-2", &[("unit", "celsius")], None);
    root.add_value_child("value", 21.456, &[], Some(2));
    root.add_value_child("taken", Timestamp::from_epoch_seconds(1_442_400_000.0), &[], None);
    root.add_optional_value_child("note", None::<&str>, &[], None);
    let history = root.add_child(Element::new("history"));
    for v in [20.1, 20.9, 21.3] {
        history.add_value_child("arrItem", v, &[], Some(1));
    }

    let doc = Document::new(root);
    let xml = doc.to_string_with(&WriteOptions::pretty()).expect("Failed to write");
    println!("Built document:");
    println!("{}", xml);
    println!();

    let parsed = Document::from_str(&xml).expect("Failed to parse");
    let root = parsed.root();

    let sensor = &root["sensor"];
    println!(
        "sensor = {} ({})",
        sensor.get_text().expect("sensor text"),
        sensor.attribute("unit").unwrap_or("?")
    );
    println!("value = {}", root["value"].get_float().expect("value"));
    let taken = root["taken"].get_timestamp().expect("timestamp");
    println!("taken = {:?}", taken.to_datetime());
    println!(
        "note = {:?} (isNil={:?})",
        root["note"].get_optional(Element::get_text).expect("note"),
        root["note"].attribute(NIL_ATTRIBUTE)
    );

    let history: Vec<f64> = root["history"]
        .children()
        .iter()
        .filter_map(|item| item.get_float().ok())
        .collect();
    println!("history = {:?}", history);

    // Missing elements are reported, never invented.
    match root["calibration"]["offset"].get_float() {
        Ok(v) => println!("offset = {}", v),
        Err(err) => println!("offset: {}", err),
    }
}
