use crate::db::connection::Database;
use crate::domain::EnrichedListing;
use crate::errors::PipelineError;
use crate::scraper::Source;
use chrono::Utc;
use rusqlite::params;
use tracing::info;

/// Destination of a run's enriched listings. Writes are upserts on the
/// listing key, so repeated runs refresh rows instead of duplicating them.
pub trait ListingSink {
    fn upsert(&self, source: Source, listings: &[EnrichedListing]) -> Result<usize, PipelineError>;
}

fn upsert_sql(table: &str) -> String {
    format!(
        r#"
        INSERT INTO {table} (
            identifier, property_type, address, state, city, neighborhood, url,
            description, title, rent_currency, rent_value, expenses_currency,
            expenses_value, total_rent, usable_area, rooms, bedrooms, bathrooms,
            garages, agency, photo_count, photo_urls, listing_score, contact_link,
            captured_at, latitude, longitude,
            distance_km_1, distance_km_2, distance_km_3, distance_km_4, distance_km_5,
            first_seen_at, last_seen_at
        ) VALUES (
            ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16,
            ?17, ?18, ?19, ?20, ?21, ?22, ?23, ?24, ?25, ?26, ?27, ?28, ?29, ?30,
            ?31, ?32, ?33, ?33
        )
        ON CONFLICT(identifier, property_type, address) DO UPDATE SET
            state = excluded.state,
            city = excluded.city,
            neighborhood = excluded.neighborhood,
            url = excluded.url,
            description = excluded.description,
            title = excluded.title,
            rent_currency = excluded.rent_currency,
            rent_value = excluded.rent_value,
            expenses_currency = excluded.expenses_currency,
            expenses_value = excluded.expenses_value,
            total_rent = excluded.total_rent,
            usable_area = excluded.usable_area,
            rooms = excluded.rooms,
            bedrooms = excluded.bedrooms,
            bathrooms = excluded.bathrooms,
            garages = excluded.garages,
            agency = excluded.agency,
            photo_count = excluded.photo_count,
            photo_urls = excluded.photo_urls,
            listing_score = excluded.listing_score,
            contact_link = excluded.contact_link,
            captured_at = excluded.captured_at,
            latitude = excluded.latitude,
            longitude = excluded.longitude,
            distance_km_1 = excluded.distance_km_1,
            distance_km_2 = excluded.distance_km_2,
            distance_km_3 = excluded.distance_km_3,
            distance_km_4 = excluded.distance_km_4,
            distance_km_5 = excluded.distance_km_5,
            last_seen_at = excluded.last_seen_at
        "#
    )
}

impl ListingSink for Database {
    fn upsert(&self, source: Source, listings: &[EnrichedListing]) -> Result<usize, PipelineError> {
        let now = Utc::now().naive_utc();
        let sql = upsert_sql(source.table_name());

        let written = self.with_conn(|conn| {
            let tx = conn.transaction()?;
            let mut written = 0;
            {
                let mut stmt = tx.prepare(&sql)?;
                for item in listings {
                    let l = &item.listing;
                    let photo_urls = serde_json::to_string(&l.photo_urls)?;
                    let d = &item.distances_km;
                    written += stmt.execute(params![
                        l.identifier,
                        l.property_type,
                        l.address,
                        l.state,
                        l.city,
                        l.neighborhood,
                        l.url,
                        l.description,
                        l.title,
                        l.rent_currency,
                        l.rent_value,
                        l.expenses_currency,
                        l.expenses_value,
                        l.total_rent,
                        l.usable_area,
                        l.rooms,
                        l.bedrooms,
                        l.bathrooms,
                        l.garages,
                        l.agency,
                        l.photo_count,
                        photo_urls,
                        l.listing_score,
                        l.contact_link,
                        l.captured_at,
                        item.latitude(),
                        item.longitude(),
                        d[0],
                        d[1],
                        d[2],
                        d[3],
                        d[4],
                        now,
                    ])?;
                }
            }
            tx.commit()?;
            Ok(written)
        })?;

        info!(%source, rows = written, "listings upserted");
        Ok(written)
    }
}

pub fn count_listings(db: &Database, source: Source) -> Result<i64, PipelineError> {
    let sql = format!("SELECT COUNT(*) FROM {}", source.table_name());
    db.with_conn(|conn| Ok(conn.query_row(&sql, [], |r| r.get(0))?))
}
