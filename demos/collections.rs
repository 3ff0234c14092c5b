//! Example demonstrating sequences, sets, maps and tuples.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use xml_marshal::{from_str, to_string_pretty, Set};

#[derive(Debug, Serialize, Deserialize, PartialEq)]
struct Task {
    title: String,
    done: bool,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
struct Board {
    name: String,
    tasks: Vec<Task>,
    #[serde(with = "xml_marshal::set")]
    labels: BTreeSet<String>,
    estimates: BTreeMap<String, f64>,
    owners: BTreeMap<String, Set<BTreeSet<String>>>,
    window: (u32, u32),
    archived: Vec<Task>,
}

fn main() {
    let board = Board {
        name: "Weekend".to_string(),
        tasks: vec![
            Task {
                title: "Buy groceries".to_string(),
                done: false,
            },
            Task {
                title: "Clean house".to_string(),
                done: true,
            },
        ],
        labels: ["home".to_string(), "errands".to_string()].into(),
        estimates: [
            ("groceries".to_string(), 1.5),
            ("cleaning".to_string(), 2.25),
        ]
        .into(),
        owners: [
            ("groceries".to_string(), Set(["sam".to_string()].into())),
            ("cleaning".to_string(), Set(["sam".to_string(), "lee".to_string()].into())),
        ]
        .into(),
        window: (9, 17),
        archived: Vec::new(),
    };

    let xml = to_string_pretty(&board).expect("Failed to serialize");
    println!("Serialized Board:");
    println!("{}", xml);
    println!();

    let parsed: Board = from_str(&xml).expect("Failed to deserialize");
    println!("Board: {}", parsed.name);
    for task in &parsed.tasks {
        let status = if task.done { "x" } else { " " };
        println!("  [{}] {}", status, task.title);
    }
    println!("  labels: {:?}", parsed.labels);
    println!("  estimates: {:?}", parsed.estimates);
    for (task, people) in &parsed.owners {
        println!("  owners of {}: {:?}", task, people.0);
    }
    println!("  window: {}-{}", parsed.window.0, parsed.window.1);
    println!("  archived: {}", parsed.archived.len());
    assert_eq!(board, parsed);
    println!();

    // Duplicate set items collapse on decode.
    let xml = r#"<Board>
        <name>dups</name>
        <tasks/>
        <labels><setItem>a</setItem><setItem>a</setItem><setItem>b</setItem></labels>
        <estimates/>
        <owners/>
        <window><arrItem>0</arrItem><arrItem>1</arrItem></window>
        <archived/>
    </Board>"#;
    let parsed: Board = from_str(xml).expect("Failed to deserialize");
    println!("Labels after decoding duplicates: {:?}", parsed.labels);
}
