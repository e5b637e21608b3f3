//! Customizing the tag vocabulary and global policies with Options.
//!
//! Run with: cargo run --example custom_options

use chrono::{DateTime, Utc};
use labeler::{labeled, labels, Error, Labeler, Options, Token};
use std::collections::BTreeMap;

labeled! {
    #[derive(Debug, Default)]
    pub struct Build {
        #[env = "COMMIT;must"]
        pub commit: String,
        #[env = "STARTED;timeformat=%Y-%m-%d %H:%M"]
        pub started: DateTime<Utc>,
        #[env = "JOBS;base=16"]
        pub jobs: u32,
        #[env = "RATIO;floatformat=e"]
        pub ratio: f64,
        #[env = "*"]
        pub env: BTreeMap<String, String>,
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let options = Options::new()
        .with_tag("env")
        .with_separator(";")
        .with_assignment("=")
        .with_token(Token::Required, "must")
        .case_sensitive()
        .discard_labels();
    let labeler = Labeler::with_options(options)?;

    let input = labels! {
        "COMMIT" => "4f2a9c1",
        "STARTED" => "2024-03-01 09:30",
        "JOBS" => "1f",
        "RATIO" => "0.25",
        "HOME" => "/home/ci",
    };

    let mut build = Build::default();
    labeler.unmarshal(&input, &mut build)?;
    println!("Unmarshaled:\n{:#?}\n", build);

    println!("Marshaled:");
    for (key, value) in &labeler.marshal(&build)? {
        println!("  {}={}", key, value);
    }

    // keys are matched exactly, so a lowercase commit does not count
    println!("\nMissing required label:");
    let mut broken = Build::default();
    match labeler.unmarshal(&labels! { "commit" => "4f2a9c1" }, &mut broken) {
        Err(Error::Parsing(err)) => {
            for field in &err.errors {
                println!("  {}", field);
            }
        }
        other => println!("  unexpected: {:?}", other),
    }

    // an empty modifier name is rejected before anything is parsed
    println!("\nInvalid options:");
    if let Err(err) = Labeler::with_options(Options::new().with_token(Token::Split, "")) {
        println!("  {}", err);
    }

    Ok(())
}
