//! Basic example: save a value to an XML file and load it back.
//!
//! Run with `RUST_LOG=xml_marshal=debug` to see file and parse logging.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing_subscriber::EnvFilter;
use xml_marshal::{Retrievable, Savable, Timestamp};

#[derive(Debug, Serialize, Deserialize)]
#[allow(non_snake_case)]
struct InternalStruct {
    a: i64,
    b: String,
    c: bool,
    d: f64,
    e: Timestamp,
    optA: Option<i64>,
    optB: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[allow(non_snake_case)]
struct MyClass {
    internalStruct: InternalStruct,
    arr: Vec<String>,
    dict: HashMap<String, i64>,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let value = MyClass {
        internalStruct: InternalStruct {
            a: 100,
            b: "bbb".to_string(),
            c: false,
            d: 200.232,
            e: Timestamp::now(),
            optA: None,
            optB: Some("optB_new".to_string()),
        },
        arr: vec!["aaa".to_string(), "bbb".to_string(), "ccc".to_string()],
        dict: [("a", 1), ("b", 10), ("c", 100)]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect(),
    };

    let xml = value
        .to_xml_string(None, false)
        .expect("Failed to serialize");
    println!("Serialized XML:");
    println!("{}", xml);
    println!();

    let path = std::env::temp_dir().join("xml_marshal_basic.xml");
    value
        .to_xml_file(None, false, &path)
        .expect("Failed to write file");
    let loaded = MyClass::from_xml_file(&path).expect("Failed to read file");
    println!("Loaded from {}:", path.display());
    println!("  a = {}", loaded.internalStruct.a);
    println!("  optA = {:?}", loaded.internalStruct.optA);
    println!("  optB = {:?}", loaded.internalStruct.optB);
    println!("  arr = {:?}", loaded.arr);
    println!("  dict[c] = {}", loaded.dict["c"]);

    assert!(loaded
        .internalStruct
        .e
        .approx_eq(value.internalStruct.e, 0.01));
    println!();
    println!("Roundtrip successful!");
}
