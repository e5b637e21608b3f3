//! Unmarshal a label map into a record and marshal it back.
//!
//! Run with: cargo run --example simple

use labeler::{labeled, labels, marshal, unmarshal, Labels};
use std::error::Error;
use std::time::Duration;

labeled! {
    #[derive(Debug, Default)]
    pub struct Probe {
        #[label = "probe.path,default:/healthz"]
        pub path: String,
        #[label = "probe.interval"]
        pub interval: Duration,
    }
}

labeled! {
    #[derive(Debug, Default)]
    pub struct Service {
        #[label = "app,required"]
        pub app: String,
        #[label = "replicas,default:1"]
        pub replicas: u32,
        #[label = "ports,split:|"]
        pub ports: Vec<u16>,
        pub probe: Option<Probe>,
        #[label = "*"]
        pub labels: Labels,
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let input = labels! {
        "app" => "checkout",
        "ports" => "80|443",
        "probe.interval" => "15s",
        "team" => "payments",
    };

    let mut service = Service::default();
    unmarshal(&input, &mut service)?;
    println!("Unmarshaled:\n{:#?}\n", service);

    let output = marshal(&service)?;
    println!("Marshaled:");
    for (key, value) in &output {
        println!("  {} = {}", key, value);
    }

    assert_eq!(output.get("replicas"), Some("1"));
    assert_eq!(output.get("probe.path"), Some("/healthz"));
    println!("\n✓ Round-trip successful");

    Ok(())
}
