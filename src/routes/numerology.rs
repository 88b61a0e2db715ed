//! Numerology route — life-path lookup for the heritage pages.

#[cfg(test)]
#[path = "numerology_test.rs"]
mod tests;

use axum::extract::Query;
use axum::response::Json;
use serde::Deserialize;
use time::Date;
use time::format_description::well_known::Iso8601;

use crate::error::ApiError;
use crate::numerology;

#[derive(Deserialize)]
pub struct LifePathQuery {
    pub birth_date: String,
}

pub(crate) fn parse_birth_date(raw: &str) -> Result<Date, ApiError> {
    Date::parse(raw, &Iso8601::DATE).map_err(|_| ApiError::Validation(format!("invalid birth_date: {raw}")))
}

/// `GET /api/numerology/life-path?birth_date=YYYY-MM-DD`
pub async fn life_path(Query(query): Query<LifePathQuery>) -> Result<Json<serde_json::Value>, ApiError> {
    let date = parse_birth_date(&query.birth_date)?;

    let year = u32::try_from(date.year()).map_err(|_| ApiError::Validation("birth_date year out of range".into()))?;
    let life_path = numerology::life_path_number(year, u32::from(u8::from(date.month())), u32::from(date.day()));

    Ok(Json(serde_json::json!({
        "lifePath": life_path.value,
        "master": life_path.master,
    })))
}
