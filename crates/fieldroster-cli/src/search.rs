//! Location search handler: geocode, classify, match, print.

use sqlx::PgPool;

use fieldroster_core::AppConfig;
use fieldroster_geo::{classify, match_technicians, GeocodeClient, SearchArea};

pub async fn run(pool: &PgPool, config: &AppConfig, query: &str, limit: usize) -> anyhow::Result<()> {
    let client = GeocodeClient::new(
        &config.geocoder_base_url,
        config.geocoder_timeout_secs,
        &config.geocoder_user_agent,
        config.geocoder_delay_ms,
        config.geocoder_max_retries,
        config.geocoder_backoff_base_secs,
    )?;

    let Some(geocoded) = client.search(query).await? else {
        println!("location not found: {query}");
        return Ok(());
    };

    let scope = classify(&geocoded);
    let Some(area) = SearchArea::from_geocode(scope, &geocoded) else {
        println!("location not found: {query}");
        return Ok(());
    };

    tracing::debug!(%scope, lat = area.coordinate.latitude, lng = area.coordinate.longitude, "query classified");

    let rows = fieldroster_db::list_active_technicians(pool).await?;
    let technicians: Vec<_> = rows.into_iter().map(Into::into).collect();
    if technicians.is_empty() {
        println!("no active technicians on file");
        return Ok(());
    }

    let matches = match_technicians(&area, &technicians);
    let shown = matches.len().min(limit);

    println!(
        "{} match(es) for \"{query}\" ({scope} search){}",
        matches.len(),
        if matches.first().is_some_and(|m| m.is_fallback) {
            ", nearest shown"
        } else {
            ""
        }
    );
    for m in matches.iter().take(limit) {
        let tech = &m.technician;
        println!(
            "  {} - {}, {} - {:.1} mi{}{}",
            tech.name,
            tech.city,
            tech.state,
            m.distance_miles,
            if tech.is_new { " [new]" } else { "" },
            if m.is_fallback { " [nearest]" } else { "" },
        );
    }
    if matches.len() > shown {
        println!("  ... and {} more", matches.len() - shown);
    }

    Ok(())
}
