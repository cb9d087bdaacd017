//! Demonstration of the Investigation Agent pipeline.
//!
//! This example shows how to:
//! 1. Start a location provider on a fixed coordinate
//! 2. Collect photo metadata from an image folder
//! 3. Read device details and installed apps
//! 4. Save the JSON bundle and print it
//!
//! Run with: cargo run --example collect_demo -- <photos-dir>

use chrono::{Duration, Utc};
use investigation_agent::{
    collector::{
        Coordinate, DirectoryPhotoLibrary, FixedLocationService, HostDevice, PathSchemeProbe,
        PhotoQuery, SortOrder,
    },
    export::BundleStore,
    transparency::ActivityLog,
    InvestigationAgent, COLLECTION_DECLARATION,
};
use std::sync::Arc;

#[tokio::main]
async fn main() {
    println!("Investigation Agent - Collect Demo");
    println!("==================================");
    println!();
    println!("{COLLECTION_DECLARATION}");

    let photos_dir = std::env::args()
        .nth(1)
        .unwrap_or_else(|| ".".to_string());
    let output_dir = std::env::temp_dir().join("investigation-agent-demo");

    let activity = Arc::new(ActivityLog::new());
    let mut agent = InvestigationAgent::new(
        FixedLocationService::new(Some(Coordinate::new(48.8584, 2.2945))),
        DirectoryPhotoLibrary::new(&photos_dir),
        BundleStore::in_dir(&output_dir),
        activity.clone(),
    );
    agent.refresh_device(&HostDevice, &PathSchemeProbe::from_env());

    let mut location = agent.location_provider().subscribe();
    let _ = location.wait_for(|c| c.is_some()).await;

    let end = Utc::now();
    let query = match PhotoQuery::new(5, end - Duration::days(30), end, SortOrder::Descending) {
        Ok(query) => query,
        Err(e) => {
            eprintln!("Invalid query: {e}");
            return;
        }
    };

    println!("Collecting up to 5 photos from {photos_dir}...");
    match agent.collect_photos(query).await {
        Ok(report) => println!("Collected {} photo(s) ({:?})", report.published, report.status),
        Err(e) => eprintln!("Collection failed: {e}"),
    }

    match agent.save() {
        Ok(bundle) => {
            println!();
            println!("Bundle written to {:?}:", agent.store().path());
            println!("{}", bundle.to_json().unwrap_or_default());
        }
        Err(e) => eprintln!("Save failed: {e}"),
    }

    println!();
    println!("{}", activity.summary());
}
