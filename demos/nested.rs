//! Example demonstrating nested structures, enums and decode errors.

use serde::{Deserialize, Serialize};
use xml_marshal::{from_str, to_string_pretty};

#[derive(Debug, Serialize, Deserialize, PartialEq)]
enum Role {
    Engineer,
    Manager { reports: u32 },
    Contractor(String),
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
struct Address {
    city: String,
    country: String,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
struct Employee {
    id: u32,
    name: String,
    role: Role,
    address: Address,
    phone: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
struct Company {
    name: String,
    headquarters: Address,
    employees: Vec<Employee>,
}

fn main() {
    let company = Company {
        name: "Northwind".to_string(),
        headquarters: Address {
            city: "Seattle".to_string(),
            country: "US".to_string(),
        },
        employees: vec![
            Employee {
                id: 1,
                name: "Ines".to_string(),
                role: Role::Manager { reports: 4 },
                address: Address {
                    city: "Tacoma".to_string(),
                    country: "US".to_string(),
                },
                phone: Some("555-0142".to_string()),
            },
            Employee {
                id: 2,
                name: "Tomas".to_string(),
                role: Role::Contractor("Acme Staffing".to_string()),
                address: Address {
                    city: "Spokane".to_string(),
                    country: "US".to_string(),
                },
                phone: None,
            },
            Employee {
                id: 3,
                name: "Carol".to_string(),
                role: Role::Engineer,
                address: Address {
                    city: "Lyon".to_string(),
                    country: "France".to_string(),
                },
                phone: None,
            },
        ],
    };

    let xml = to_string_pretty(&company).expect("Failed to serialize");
    println!("Serialized XML:");
    println!("{}", xml);
    println!();

    let parsed: Company = from_str(&xml).expect("Failed to deserialize");
    println!("Company: {} ({})", parsed.name, parsed.headquarters.city);
    for emp in &parsed.employees {
        println!(
            "  #{} {} - {:?} ({}, {})",
            emp.id,
            emp.name,
            emp.role,
            emp.address.city,
            emp.phone.as_deref().unwrap_or("no phone")
        );
    }
    assert_eq!(company, parsed);
    println!();

    // Break the second employee's id and look at where the error points.
    let broken = xml.replacen("<id>2</id>", "<id>two</id>", 1);
    match from_str::<Company>(&broken) {
        Ok(_) => println!("unexpectedly decoded broken input"),
        Err(err) => println!("Decode error: {}", err),
    }
}
