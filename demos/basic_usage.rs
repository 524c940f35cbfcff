use vidrec::*;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    println!("vidrec basic usage");

    // 1. Everything in memory: catalog store and response cache.
    let state = AppState::in_memory();

    // 2. Load the six-video demo catalog and one user's history.
    demo::seed(&state.ingest_service, demo::DEMO_USER).await?;
    let catalog = state.store.list_catalog().await?;
    println!("Catalog has {} videos", catalog.len());

    // 3. Personalized recommendations for the seeded user.
    let response = state
        .recommendation_service
        .recommend(demo::DEMO_USER, 4)
        .await?;
    println!("\nRecommendations for {}:", response.user_id);
    for item in &response.items {
        println!(
            "  {} score={:.4} source={:?}",
            item.video_id, item.score, item.source
        );
        for reason in &item.reasons {
            println!("    - {}", reason);
        }
    }

    // 4. A user without history falls back to catalog picks.
    let newcomer = state.recommendation_service.recommend("newcomer", 3).await?;
    println!("\nCold-start picks for newcomer:");
    for item in &newcomer.items {
        println!("  {} score={:.4} ({})", item.video_id, item.score, item.reasons.join("; "));
    }

    // 5. The second identical request is served from the cache.
    state
        .recommendation_service
        .recommend(demo::DEMO_USER, 4)
        .await?;
    let stats = state.recommendation_service.get_serving_stats();
    println!("\nServing stats: {:?}", stats);

    // 6. A new interaction invalidates that user's cached responses.
    state
        .ingest_service
        .record_interaction(InteractionCreate {
            user_id: demo::DEMO_USER.to_string(),
            video_id: "VID_ML_005".to_string(),
            event_type: EventType::Skip,
            watch_seconds: None,
            timestamp: None,
            metadata: None,
        })
        .await?;
    let refreshed = state
        .recommendation_service
        .recommend(demo::DEMO_USER, 4)
        .await?;
    println!(
        "\nAfter skipping VID_ML_005: {:?}",
        refreshed.items.iter().map(|i| &i.video_id).collect::<Vec<_>>()
    );

    println!("\n{}", serde_json::to_string_pretty(&refreshed)?);
    Ok(())
}
